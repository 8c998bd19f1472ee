mod demo;

use argspec_core::{ParseOutcome, parse};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use demo::{Command, Invocation};

fn main() {
    init_tracing();

    let schema = demo::build_schema();
    let result = match parse(&schema, std::env::args().skip(1)) {
        Ok(ParseOutcome::Parsed(result)) => result,
        Ok(ParseOutcome::Help(text)) => {
            print!("{text}");
            return;
        }
        Ok(ParseOutcome::Version(version)) => {
            println!("{version}");
            return;
        }
        Err(err) => {
            eprint!("{}", err.report());
            std::process::exit(err.exit_code());
        }
    };
    debug!(result = %result.to_json(), "parsed command line");

    match Invocation::from_result(&result) {
        Ok(invocation) => run(&invocation),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

fn run(invocation: &Invocation) {
    match &invocation.command {
        Some(Command::Train(args)) => {
            info!(batchsize = args.batchsize, lr = %args.lr, "train selected");
        }
        Some(Command::Valid(args)) => {
            info!(batchsize = args.batchsize, out = %args.out.display(), "valid selected");
        }
        None => info!("no subcommand selected"),
    }
    println!("{}", invocation.model);
}

/// Log output goes to stderr so stdout carries only program output.
/// `RUST_LOG` overrides the default `warn` level.
fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
