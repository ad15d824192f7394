use anyhow::Result;
use clap::{Parser, Subcommand};
use whatif::core::EndDatePolicy;
use whatif::core::log::{LogStyle, init_logging};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    /// Day used as "now": today or previous_day
    #[arg(long, global = true)]
    end_date: Option<EndDatePolicy>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Serve the HTTP endpoints (default)
    Serve {
        /// Address to listen on, overriding the config file
        #[arg(long)]
        bind: Option<String>,
    },
    /// Prompt for an investment and print its outcome
    Calc,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Serve { bind: None });

    let style = match command {
        Commands::Serve { .. } => LogStyle::Service,
        _ => LogStyle::Console,
    };
    init_logging(cli.verbose, style);

    let mut overrides = whatif::Overrides {
        end_date: cli.end_date,
        ..Default::default()
    };

    let result = match command {
        Commands::Setup => whatif::cli::setup::setup().map(|path| {
            println!("Created default configuration at {}", path.display());
        }),
        Commands::Serve { bind } => {
            overrides.bind = bind;
            whatif::run_command(whatif::AppCommand::Serve, cli.config_path.as_deref(), &overrides)
                .await
        }
        Commands::Calc => {
            whatif::run_command(whatif::AppCommand::Calc, cli.config_path.as_deref(), &overrides)
                .await
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
