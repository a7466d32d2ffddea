//! `trepl` entry point.
//!
//! Usage:
//!   trepl                      # Interactive REPL
//!   trepl -e '<line>'...       # Evaluate lines and exit
//!   trepl script.js            # Compile and run a file

use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context as _, Result};
use argh::FromArgs;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use transpile_repl::Completion;
use transpile_repl::repl::{self, Outcome, ReplConfig};
use transpile_repl::script::Context;

#[derive(FromArgs)]
/// Compile and run extended script, one line at a time.
struct Args {
    /// option patch applied at startup, e.g. "+exponentiation -arrowFunctions"
    #[argh(option)]
    opts: Option<String>,

    /// report runtime errors as escalations and reset the context
    #[argh(switch)]
    supervised: bool,

    /// file to load and save interactive history
    #[argh(option)]
    history: Option<PathBuf>,

    /// interactive prompt
    #[argh(option)]
    prompt: Option<String>,

    /// evaluate a line and exit; may be repeated
    #[argh(option, short = 'e')]
    eval: Vec<String>,

    /// script file to compile and run
    #[argh(positional)]
    file: Option<PathBuf>,
}

impl Args {
    fn config(&self) -> ReplConfig {
        let defaults = ReplConfig::default();
        ReplConfig {
            prompt: self.prompt.clone().unwrap_or(defaults.prompt),
            history_file: self.history.clone(),
            supervised: self.supervised,
            initial_options: self.opts.clone(),
            ..defaults
        }
    }
}

fn main() -> ExitCode {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let args: Args = argh::from_env();
    match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<ExitCode> {
    let config = args.config();
    let mut interp = config.interpreter();

    if args.eval.is_empty() && args.file.is_none() {
        repl::run_interactive(&mut interp, &config).context("interactive session failed")?;
        return Ok(ExitCode::SUCCESS);
    }

    let mut ctx = Context::new();
    for line in &args.eval {
        let completion = interp.evaluate(line, &mut ctx, &config.source_label);
        if !succeeded(completion)? {
            return Ok(ExitCode::FAILURE);
        }
    }
    if let Some(path) = &args.file {
        let source = fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        let completion = interp.execute(&source, &mut ctx, &path.display().to_string());
        if !succeeded(completion)? {
            return Ok(ExitCode::FAILURE);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn succeeded(completion: Completion) -> Result<bool> {
    let outcome = repl::report(completion, &mut io::stdout(), &mut io::stderr())?;
    Ok(outcome == Outcome::Success)
}
