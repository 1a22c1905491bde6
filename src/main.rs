use std::env;
use std::process;

use chudnovsky_pi::{
    utils::{file::write_output, text::usage},
    Chudnovsky, Config, Invocation,
};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let invocation = Config::from_env().and_then(|cfg| cfg.with_args(env::args().skip(1)));
    let config = match invocation {
        Ok(Invocation::Run(cfg)) => cfg,
        Ok(Invocation::Help) => {
            println!("{}", usage());
            return;
        }
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("{}", usage());
            process::exit(1);
        }
    };

    let computation = match Chudnovsky::from_config(&config).run() {
        Ok(c) => c,
        Err(e) => {
            error!("computation failed: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = write_output(config.output.as_deref(), &computation.formatted()) {
        error!("{}", e);
        process::exit(1);
    }

    if config.json {
        println!("{}", computation.report.to_json());
    }
}
