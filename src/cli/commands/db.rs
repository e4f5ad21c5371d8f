use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::store::ResourceStore;

#[derive(Subcommand)]
pub enum DbCommands {
    #[command(about = "Create the documents table and indexes")]
    Migrate,

    #[command(about = "Check the database is reachable")]
    Ping,
}

pub async fn handle(cmd: DbCommands, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let store = connect_store(config).await?;
    let target = config.redacted_database_url().unwrap_or_default();

    let result = match cmd {
        DbCommands::Migrate => {
            store.migrate().await?;
            output_success(&output_format, "Schema is up to date", Some(json!({ "database": target })))
        }
        DbCommands::Ping => {
            store.ping().await?;
            output_success(&output_format, "Database is reachable", Some(json!({ "database": target })))
        }
    };

    store.close().await;
    result
}
