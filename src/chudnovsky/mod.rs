pub mod factor;
pub mod float;
pub mod newton;
pub mod sieve;
pub mod split;

use std::f64::consts::LOG10_2;
use std::time::Duration;

use num_bigint::BigInt;
use rug::Float;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::utils::{hash::digest_digits, text::format_pi, time::{millis, timestamp, Stopwatch}};

use self::sieve::Sieve;
use self::split::{SplitStats, Splitter, Tuning};

pub const A: u64 = 13_591_409;
pub const B: u64 = 545_140_134;
pub const C: u64 = 640_320;
pub const D: u64 = 12;

pub const BITS_PER_DIGIT: f64 = 3.321_928_094_887_362_3;
pub const DIGITS_PER_TERM: f64 = 14.181_647_462_725_477;

pub const DEFAULT_GUARD_DIGITS: u64 = 8;

/// Series terms needed for `digits` correct digits.
pub fn terms_for(digits: u64) -> u64 {
    (digits as f64 / DIGITS_PER_TERM) as u64 + 1
}

/// Frame slots needed for `terms`; the stack still grows if the split
/// ratio sends the recursion deeper.
pub fn stack_depth(terms: u64) -> usize {
    let mut depth = 1;
    while (1u64 << depth) < terms {
        depth += 1;
    }
    depth + 1
}

/// Every leaf factors 2b-1, 6b-1, 6b-5 and 10005.
pub fn sieve_bound(terms: u64) -> u64 {
    (3 * 5 * 23 * 29 + 1).max(6 * terms)
}

pub fn working_precision(digits: u64) -> u64 {
    ((digits as f64 * BITS_PER_DIGIT) as u64).saturating_add(16)
}

#[derive(Clone, Debug, Default)]
pub struct Timings {
    pub sieve: Duration,
    pub split: Duration,
    pub gcd: Duration,
    pub div: Duration,
    pub sqrt: Duration,
    pub mul: Duration,
    pub convert: Duration,
    pub total: Duration,
}

/// What one run cost, and how big P and Q grew.
#[derive(Clone, Debug)]
pub struct Report {
    pub digits: u64,
    pub terms: u64,
    pub depth: usize,
    pub precision_bits: u64,
    pub p_digits: u64,
    pub q_digits: u64,
    pub gcd_calls: u64,
    pub timings: Timings,
    pub sha256: String,
    pub finished_at: u64,
}

impl Report {
    pub fn to_json(&self) -> Value {
        let t = &self.timings;
        json!({
            "digits": self.digits,
            "algo": "chudnovsky-binary-splitting",
            "terms": self.terms,
            "depth": self.depth,
            "precision_bits": self.precision_bits,
            "p_digits": self.p_digits,
            "q_digits": self.q_digits,
            "gcd_calls": self.gcd_calls,
            "elapsed_ms": {
                "sieve": millis(t.sieve),
                "bs": millis(t.split),
                "gcd": millis(t.gcd),
                "div": millis(t.div),
                "sqrt": millis(t.sqrt),
                "mul": millis(t.mul),
                "convert": millis(t.convert),
                "total": millis(t.total),
            },
            "sha256": self.sha256,
            "finished_at": self.finished_at,
        })
    }
}

/// The digits of one run plus its report. Kept by the caller so a failed
/// write can be retried elsewhere without recomputing.
#[derive(Clone, Debug)]
pub struct Computation {
    pub digits: String,
    pub report: Report,
}

impl Computation {
    /// "3.<rest>\n"
    pub fn formatted(&self) -> String {
        let mut out = format_pi(&self.digits);
        out.push('\n');
        out
    }
}

pub struct Chudnovsky {
    digits: u64,
    guard_digits: u64,
    tuning: Tuning,
}

impl Chudnovsky {
    pub fn new(digits: u64) -> Self {
        Chudnovsky { digits, guard_digits: DEFAULT_GUARD_DIGITS, tuning: Tuning::default() }
    }

    pub fn from_config(config: &Config) -> Self {
        Chudnovsky { digits: config.digits, guard_digits: config.guard_digits, tuning: config.tuning }
    }

    pub fn with_tuning(mut self, tuning: Tuning) -> Self {
        self.tuning = tuning;
        self
    }

    pub fn with_guard_digits(mut self, guard_digits: u64) -> Self {
        self.guard_digits = guard_digits;
        self
    }

    pub fn run(&self) -> Result<Computation> {
        if self.digits < 1 {
            return Err(Error::InvalidDigits(self.digits));
        }

        let work_digits = self.digits.saturating_add(self.guard_digits);
        let terms = terms_for(work_digits);
        let depth = stack_depth(terms);
        let prec = u32::try_from(working_precision(work_digits))
            .ok()
            .filter(|&p| p <= rug::float::prec_max())
            .ok_or(Error::PrecisionTooLarge(self.digits))?;
        self.tuning.validate(depth)?;
        debug!(terms, depth, prec, "starting binary splitting");

        let mut clock = Stopwatch::start();

        let sieve = Sieve::new(sieve_bound(terms));
        let sieve_time = clock.lap();
        info!(bound = sieve.bound(), elapsed_ms = millis(sieve_time), "sieve");

        let stats = SplitStats::new(terms);
        let mut splitter = Splitter::new(&sieve, &stats, self.tuning, depth);
        splitter.run(terms)?;
        let root = splitter.into_root();
        let split_time = clock.lap();
        info!(
            elapsed_ms = millis(split_time),
            gcd_ms = millis(stats.gcd_time()),
            gcd_calls = stats.gcd_calls(),
            "bs"
        );
        drop(sieve);

        let p_digits = decimal_digits(&root.p);
        let q_digits = decimal_digits(&root.q);

        //           p*(C/D)*sqrt(C)
        //     pi = -----------------
        //              (q+A*p)
        let q = root.q + &root.p * A;
        let p = root.p * (C / D);
        let num = float::from_bigint(&p, prec);
        let den = float::from_bigint(&q, prec);

        let quotient = newton::div(&num, &den, prec);
        let div_time = clock.lap();
        info!(elapsed_ms = millis(div_time), "div");

        let root_c = newton::sqrt_u64(C, prec);
        let sqrt_time = clock.lap();
        info!(elapsed_ms = millis(sqrt_time), "sqrt");

        let pi = Float::with_val(prec, &quotient * &root_c);
        let mul_time = clock.lap();
        info!(elapsed_ms = millis(mul_time), "mul");

        let digits = float::to_digit_string(&pi, self.digits)?;
        let convert_time = clock.lap();
        let total = clock.total();
        info!(elapsed_ms = millis(total), "total");
        info!(
            p_digits,
            q_digits,
            p_ratio = p_digits as f64 / self.digits as f64,
            q_ratio = q_digits as f64 / self.digits as f64,
            "sizes"
        );

        let report = Report {
            digits: self.digits,
            terms,
            depth,
            precision_bits: u64::from(prec),
            p_digits,
            q_digits,
            gcd_calls: stats.gcd_calls(),
            timings: Timings {
                sieve: sieve_time,
                split: split_time,
                gcd: stats.gcd_time(),
                div: div_time,
                sqrt: sqrt_time,
                mul: mul_time,
                convert: convert_time,
                total,
            },
            sha256: digest_digits(&digits),
            finished_at: timestamp(),
        };

        Ok(Computation { digits, report })
    }
}

/// Decimal length of |x|, possibly one too many.
fn decimal_digits(x: &BigInt) -> u64 {
    (x.bits() as f64 * LOG10_2).floor() as u64 + 1
}
