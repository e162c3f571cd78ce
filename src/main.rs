use clap::Parser;

mod cli;
mod config;
mod database;
mod error;
mod filesystem;
mod services;

use cli::Cli;
use config::AppConfig;
use error::AppError;
use photo_store::PhotoWallet;
use services::settings_service;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        log::error!("{}", e);
        eprintln!("{}", e.user_message());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config_path = cli.config.unwrap_or_else(AppConfig::default_path);
    let config = AppConfig::load(&config_path)?;

    let conn = database::init_database(&config)?;

    // The only wallet instance; every command borrows it
    let mut wallet = PhotoWallet::new(conn, config.store_config())?;
    wallet.load().await?;

    {
        let conn = wallet.connection().await;
        if !settings_service::has_seen_welcome(&conn)? {
            println!(
                "Welcome to your photo wallet. It keeps up to {} photos on this device.",
                config.max_photos
            );
            settings_service::mark_welcome_seen(&conn)?;
        }
    }

    cli::execute(cli.command, &mut wallet, &config).await
}
