use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use xrate::core::log::init_logging;
use xrate::service::ConversionRequest;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Convert an amount between two currencies
    Convert {
        /// Amount in the source currency (default from config)
        amount: Option<String>,
        /// Source currency code
        #[arg(short, long)]
        from: Option<String>,
        /// Destination currency code
        #[arg(short, long)]
        to: Option<String>,
        /// Reference date (YYYY-MM-DD), most recent when omitted
        #[arg(short, long)]
        date: Option<String>,
        /// Download the rate document again before converting
        #[arg(short, long)]
        refresh: bool,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Display the rates of a reference date
    Rates {
        /// Reference date (YYYY-MM-DD), most recent when omitted
        #[arg(short, long)]
        date: Option<String>,
    },
    /// List the available reference dates
    Dates,
    /// Serve conversions over HTTP
    Serve {
        /// Address to listen on (default from config)
        #[arg(short, long)]
        bind: Option<String>,
    },
}

impl From<Commands> for xrate::AppCommand {
    fn from(cmd: Commands) -> xrate::AppCommand {
        match cmd {
            Commands::Convert {
                amount,
                from,
                to,
                date,
                refresh,
                json,
            } => xrate::AppCommand::Convert {
                request: ConversionRequest {
                    amount,
                    source_currency: from,
                    destination_currency: to,
                    reference_date: date,
                    force_refresh: refresh,
                },
                json,
            },
            Commands::Rates { date } => xrate::AppCommand::Rates {
                reference_date: date,
            },
            Commands::Dates => xrate::AppCommand::Dates,
            Commands::Serve { bind } => xrate::AppCommand::Serve { bind },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let serving = matches!(cli.command, Some(Commands::Serve { .. }));
    init_logging(cli.verbose, serving);

    let result = match cli.command {
        Some(Commands::Setup) => xrate::cli::setup::setup(),
        Some(cmd) => xrate::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
