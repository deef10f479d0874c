mod error;
mod order;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use saga_command::{CommandComponent, CommandRegistry, DispatchError};
use saga_config::PatternConfig;
use saga_orchestrator::Orchestrator;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::error::{CliError, Result};
use crate::order::{
    OrderStep, PlaceOrder, PlaceOrderError, PlaceOrderHandler, StepOptions, order_steps,
};

#[derive(Parser)]
#[command(name = "saga-demo")]
#[command(about = "Place an order through a compensating saga", long_about = None)]
struct Cli {
    /// Path to a TOML file with `[pattern.saga]` / `[pattern.cqrs]` settings
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Number of items to order
    #[arg(long, short = 'q', default_value_t = 3)]
    quantity: u32,

    /// Make the given step fail to trigger compensation
    #[arg(long, value_enum)]
    fail_at: Option<OrderStep>,

    /// Artificial delay before each step, in milliseconds
    #[arg(long, default_value_t = 0)]
    delay_ms: u64,

    /// Time budget for the whole saga (default: from configuration)
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Log at debug level unless `RUST_LOG` says otherwise
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        print_error(&e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => PatternConfig::load(path)?,
        None => PatternConfig::default(),
    };
    if !config.saga().enabled() {
        return Err(CliError::PatternDisabled("saga"));
    }
    if !config.cqrs().enabled() {
        return Err(CliError::PatternDisabled("cqrs"));
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    let orchestrator = Orchestrator::new(config.saga().orchestrator_config());
    let timeout = cli
        .timeout_ms
        .map_or(orchestrator.config().default_timeout(), Duration::from_millis);
    let options = StepOptions {
        fail_at: cli.fail_at,
        delay: Duration::from_millis(cli.delay_ms),
    };
    debug!(?timeout, ?options, "configured order saga");

    let components: Vec<Arc<dyn CommandComponent>> = vec![Arc::new(PlaceOrderHandler::new(
        orchestrator,
        order_steps(options),
        runtime,
        timeout,
    ))];
    let mut builder =
        CommandRegistry::builder().with_duplicate_policy(config.cqrs().duplicate_commands());
    builder.scan(components)?;
    let registry = builder.build();

    match registry.dispatch(PlaceOrder {
        quantity: cli.quantity,
    }) {
        Ok(placed) => {
            println!("order placed");
            println!("{}", placed.receipt);
            println!("{}", placed.audit);
            Ok(())
        }
        Err(e) => {
            if let DispatchError::Handler {
                source: PlaceOrderError::Saga { audit, .. },
                ..
            } = &e
            {
                eprintln!("{audit}");
            }
            Err(e.into())
        }
    }
}

fn print_error(error: &CliError) {
    eprintln!("error: {error}");

    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        eprintln!("caused by: {cause}");
        source = std::error::Error::source(cause);
    }
}
