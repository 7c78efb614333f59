use clap::{Parser, Subcommand};
use dotenv::dotenv;
use env_logger::Env;
use log::{error, info};
use std::process;

use sabjaano_auth::{api::AppState, cli, config, database, server};

/// Sabjaano account and session service
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// Sets the configuration file
    #[clap(short, long, value_name = "FILE", default_value = "config.toml")]
    config: String,

    /// Turn debugging information on
    #[clap(short, long, action = clap::ArgAction::Count)]
    debug: u8,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve,

    /// Create an account; the password is read from stdin
    CreateUser {
        /// Account email
        #[clap(short, long)]
        email: String,

        /// Role (advertiser, owner, admin)
        #[clap(short, long, default_value = "advertiser")]
        role: String,
    },

    /// Change the role of an existing account
    SetRole {
        /// Account email
        #[clap(short, long)]
        email: String,

        /// New role (advertiser, owner, admin)
        #[clap(short, long)]
        role: String,
    },

    /// Show recent audit events
    Audit {
        /// Number of events to show
        #[clap(short, long, default_value_t = 20)]
        limit: usize,
    },
}

#[actix_web::main]
async fn main() {
    // Load environment variables from .env file
    dotenv().ok();

    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.debug {
        0 => log::set_max_level(log::LevelFilter::Info),
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    let mut config = match config::load_config(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            error!("Failed to load configuration: {:#}", err);
            process::exit(1);
        }
    };

    if let Err(err) = config.apply_env_overrides().and_then(|_| config.validate()) {
        error!("Invalid configuration: {:#}", err);
        process::exit(1);
    }
    info!("Configuration loaded from {}", cli.config);

    let pool = match database::initialize(&config.database) {
        Ok(pool) => pool,
        Err(err) => {
            error!("Failed to initialize database: {:#}", err);
            process::exit(1);
        }
    };

    let result = match &cli.command {
        Commands::Serve => server::run(config, pool).await,
        Commands::CreateUser { email, role } => {
            let state = AppState::from_config(&config, pool);
            cli::accounts::create_user(&state.auth, email, role)
        }
        Commands::SetRole { email, role } => {
            let state = AppState::from_config(&config, pool);
            cli::accounts::set_role(&state.auth, email, role)
        }
        Commands::Audit { limit } => cli::audit::show_recent(&pool, *limit),
    };

    if let Err(err) = result {
        error!("{:#}", err);
        process::exit(1);
    }
}
