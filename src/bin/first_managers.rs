//! first-managers
//!
//! Prints the immediate managers of one employee, one per line as
//! `<id> <name> <positionId>`.

use std::path::PathBuf;
use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use orgpolicy::{
    EmployeeSource, IdFilter, InMemoryStores, OrgPolicyConfig, PolicyManager, PolicySources,
    QueryContext,
};

/// Command-line options.
#[derive(Default)]
struct Args {
    /// Directory snapshot; the built-in seed when absent.
    data: Option<PathBuf>,
    /// JSON config file.
    config: Option<PathBuf>,
    /// Employee to query; the second employee in source order when absent.
    employee_id: Option<String>,
}

const USAGE: &str = "\
first-managers - print the immediate managers of an employee

USAGE:
    first-managers [OPTIONS] [EMPLOYEE_ID]

OPTIONS:
    -d, --data <FILE>       Directory snapshot (JSON) [default: built-in seed]
    -c, --config <FILE>     Config file (JSON)
    -h, --help              Print help information

Set RUST_LOG (e.g. RUST_LOG=debug) to see resolver logs.";

fn parse_args() -> Result<Option<Args>, String> {
    let mut args = Args::default();
    let mut iter = std::env::args().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--data" | "-d" => {
                let value = iter.next().ok_or("--data requires a value")?;
                args.data = Some(PathBuf::from(value));
            }
            "--config" | "-c" => {
                let value = iter.next().ok_or("--config requires a value")?;
                args.config = Some(PathBuf::from(value));
            }
            "--help" | "-h" => return Ok(None),
            flag if flag.starts_with('-') && flag.len() > 1 => {
                return Err(format!("unknown argument: {flag}"));
            }
            id => {
                if args.employee_id.is_some() {
                    return Err(format!("unexpected extra argument: {id}"));
                }
                args.employee_id = Some(id.to_string());
            }
        }
    }

    Ok(Some(args))
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => OrgPolicyConfig::load(path)?,
        None => OrgPolicyConfig::default(),
    };

    let stores = match &args.data {
        Some(path) => {
            info!(path = %path.display(), "loading directory snapshot");
            InMemoryStores::load(path)?
        }
        None => InMemoryStores::demo(),
    };

    let ctx = QueryContext::background();
    let employee_id = match args.employee_id {
        Some(id) => id,
        None => stores
            .employees
            .list_employees(&ctx, &IdFilter::All)?
            .get(1)
            .map(|e| e.id.clone())
            .ok_or("directory has fewer than two employees; pass an EMPLOYEE_ID")?,
    };

    let manager = PolicyManager::with_config(PolicySources::from(&stores), config.policy)?;
    let managers = manager.first_managers(&ctx, &employee_id)?;
    info!(employee_id = %employee_id, count = managers.len(), "query complete");

    for m in managers {
        println!("{m}");
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = match parse_args() {
        Ok(Some(args)) => args,
        Ok(None) => {
            println!("{USAGE}");
            return ExitCode::SUCCESS;
        }
        Err(msg) => {
            eprintln!("error: {msg}");
            eprintln!();
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "query failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
