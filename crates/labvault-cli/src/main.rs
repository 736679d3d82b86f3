//! LabVault CLI - Main entry point

use clap::Parser;
use labvault_cli::{commands, Cli, Commands};
use labvault_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use labvault_common::types::SearchFilters;
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Verbose mode logs debug to the console; otherwise only warnings
    let log_config = LogConfig::builder()
        .level(if cli.verbose {
            LogLevel::Debug
        } else {
            LogLevel::Warn
        })
        .output(LogOutput::Console)
        .log_file_prefix("labvault-cli")
        .build();

    // Environment variables take precedence
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);

    // The CLI works without logging
    let _log_guard = init_logging(&log_config).ok();

    if let Err(e) = execute_command(cli).await {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn execute_command(cli: Cli) -> labvault_cli::Result<()> {
    let server_url = cli.server_url;

    match cli.command {
        Commands::Status => commands::status::run(server_url).await,

        Commands::Upload {
            file,
            metadata,
            content_type,
        } => commands::upload::run(server_url, file, metadata, content_type).await,

        Commands::UploadFolder { archive, metadata } => {
            commands::upload_folder::run(server_url, archive, metadata).await
        },

        Commands::Search {
            project_id,
            author,
            file_type,
            experiment_type,
            tags,
            after,
            before,
            file_id,
            limit,
            json,
        } => {
            let filters = SearchFilters {
                file_id,
                project_id,
                author,
                file_type,
                experiment_type,
                tags_contain: tags,
                date_after: after,
                date_before: before,
                limit,
            };
            commands::search::run(server_url, filters, json).await
        },

        Commands::Download { file_id, output } => {
            commands::download::run(server_url, file_id, output).await
        },

        Commands::Orphans {
            prefix,
            limit,
            json,
        } => commands::orphans::run(server_url, prefix, limit, json).await,
    }
}
