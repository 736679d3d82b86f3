//! LabVault CLI Library
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//!
//! Command-line client for the LabVault gateway.
//!
//! # Overview
//!
//! - **Status**: check the gateway and its catalog (`labvault status`)
//! - **Upload**: send a file or a zipped folder with YAML metadata
//!   (`labvault upload`, `labvault upload-folder`)
//! - **Search**: query the catalog and print a table or JSON (`labvault search`)
//! - **Download**: stream a stored file to disk (`labvault download`)
//! - **Orphans**: list stored objects with no catalog row (`labvault orphans`)

pub mod api;
pub mod commands;
pub mod error;

pub use error::{CliError, Result};

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use labvault_common::types::parse_date;
use std::path::PathBuf;
use uuid::Uuid;

/// LabVault - research data upload, search and download
#[derive(Parser, Debug)]
#[command(name = "labvault")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Gateway URL
    #[arg(
        long,
        env = "LABVAULT_SERVER_URL",
        default_value = api::client::DEFAULT_SERVER_URL,
        global = true
    )]
    pub server_url: String,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check that the gateway and its catalog database are reachable
    Status,

    /// Upload one file with a YAML metadata document
    Upload {
        /// File to upload
        file: PathBuf,

        /// YAML metadata document (project_id, author, experiment_type,
        /// date_conducted, custom_tags)
        #[arg(short, long)]
        metadata: PathBuf,

        /// Content type recorded for the file
        #[arg(long, default_value = "application/octet-stream")]
        content_type: String,
    },

    /// Upload a ZIP archive; every file inside gets the same metadata
    UploadFolder {
        /// ZIP archive to upload
        archive: PathBuf,

        /// YAML metadata document applied to every file
        #[arg(short, long)]
        metadata: PathBuf,
    },

    /// Search the catalog
    Search {
        /// Project identifier (substring, case-insensitive)
        #[arg(long)]
        project_id: Option<String>,

        #[arg(long)]
        author: Option<String>,

        /// File extension, e.g. CSV
        #[arg(long)]
        file_type: Option<String>,

        #[arg(long)]
        experiment_type: Option<String>,

        /// Substring of the custom tags
        #[arg(long)]
        tags: Option<String>,

        /// Conducted on or after this date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        after: Option<NaiveDate>,

        /// Conducted on or before this date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        before: Option<NaiveDate>,

        /// Exact file ID
        #[arg(long)]
        file_id: Option<Uuid>,

        /// Maximum number of results (1-100)
        #[arg(short, long)]
        limit: Option<u32>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Download a stored file
    Download {
        /// File ID returned by an upload or a search
        file_id: Uuid,

        /// Output file or directory (defaults to the stored file name in the
        /// current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List stored objects that no catalog row references
    Orphans {
        /// Only scan keys starting with this prefix
        #[arg(long)]
        prefix: Option<String>,

        /// Maximum number of keys to scan (1-10000)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Print JSON instead of a list
        #[arg(long)]
        json: bool,
    },
}
