use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use dotenv::dotenv;

use crate::chudnovsky::split::Tuning;
use crate::chudnovsky::{stack_depth, terms_for, DEFAULT_GUARD_DIGITS};
use crate::error::{Error, Result};

pub const DEFAULT_DIGITS: u64 = 100;

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub digits: u64,
    /// None writes to stdout.
    pub output: Option<PathBuf>,
    pub json: bool,
    pub guard_digits: u64,
    pub tuning: Tuning,
}

/// What the command line asked for.
#[derive(Debug, PartialEq)]
pub enum Invocation {
    Run(Config),
    Help,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            digits: DEFAULT_DIGITS,
            output: None,
            json: false,
            guard_digits: DEFAULT_GUARD_DIGITS,
            tuning: Tuning::default(),
        }
    }
}

impl Config {
    /// Defaults overridden by `.env` and the process environment.
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut cfg = Config::default();
        if let Some(v) = var("PI_DIGITS") {
            cfg.digits = parse_value("PI_DIGITS", &v)?;
        }
        if let Some(v) = var("PI_OUTPUT") {
            cfg.output = Some(PathBuf::from(v));
        }
        if let Some(v) = var("PI_GUARD_DIGITS") {
            cfg.guard_digits = parse_value("PI_GUARD_DIGITS", &v)?;
        }
        if let Some(v) = var("PI_SPLIT_RATIO") {
            cfg.tuning.split_ratio = parse_value("PI_SPLIT_RATIO", &v)?;
        }
        if let Some(v) = var("PI_GCD_LEVEL") {
            cfg.tuning.gcd_level = parse_value("PI_GCD_LEVEL", &v)?;
        }
        if let Some(v) = var("PI_PARALLEL_DEPTH") {
            cfg.tuning.parallel_depth = parse_value("PI_PARALLEL_DEPTH", &v)?;
        }
        Ok(cfg)
    }

    /// Applies `-digits <n>`, `-f <file>`, `-json`, `-h`/`-?`, or a lone
    /// positional digit count.
    pub fn with_args<I>(mut self, args: I) -> Result<Invocation>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-digits" | "--digits" => {
                    let v = args
                        .next()
                        .ok_or_else(|| Error::Config("Missing value for '-digits'".into()))?;
                    self.digits = parse_value("-digits", &v)?;
                }
                "-f" => {
                    let v = args
                        .next()
                        .ok_or_else(|| Error::Config("Missing value for '-f'".into()))?;
                    self.output = Some(PathBuf::from(v));
                }
                "-json" | "--json" => self.json = true,
                "-h" | "-?" | "--help" => return Ok(Invocation::Help),
                other if other.starts_with('-') => {
                    return Err(Error::Config(format!("Unknown argument '{}'", other)));
                }
                other => self.digits = parse_value("digits", other)?,
            }
        }
        self.validate()?;
        Ok(Invocation::Run(self))
    }

    pub fn validate(&self) -> Result<()> {
        if self.digits < 1 {
            return Err(Error::InvalidDigits(self.digits));
        }
        let terms = terms_for(self.digits.saturating_add(self.guard_digits));
        self.tuning.validate(stack_depth(terms))
    }
}

fn parse_value<T: FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.parse::<T>()
        .map_err(|_| Error::Config(format!("Invalid value for '{}': {}", name, raw)))
}
