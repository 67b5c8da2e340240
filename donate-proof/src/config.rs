//! donate-proof configuration
//!
//! Command-line arguments and environment variables (via `clap`) override
//! the TOML config file, which overrides compiled defaults.

use clap::Parser;
use donate_common::config::{resolve_data_folder, TomlConfig};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
pub const DEFAULT_SESSION_TTL_MINUTES: u32 = 15;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const DATA_FOLDER_ENV: &str = "DONATE_DATA_FOLDER";

/// Command-line arguments for donate-proof
#[derive(Parser, Debug, Default)]
#[command(name = "donate-proof")]
#[command(about = "Proof-of-work upload validation and live notification service")]
#[command(version)]
pub struct Args {
    /// Explicit config file (otherwise DONATE_CONFIG or the standard locations)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "DONATE_PROOF_PORT")]
    pub port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "DONATE_PROOF_BIND")]
    pub bind_address: Option<String>,

    /// Folder holding the database and uploads (env: DONATE_DATA_FOLDER)
    #[arg(short, long)]
    pub data_folder: Option<PathBuf>,

    /// SQLite database file (default: <data folder>/donate.db)
    #[arg(long, env = "DONATE_DATABASE_PATH")]
    pub database_path: Option<PathBuf>,

    /// Upload directory (default: <data folder>/uploads)
    #[arg(long, env = "DONATE_UPLOADS_DIR")]
    pub uploads_dir: Option<PathBuf>,

    /// Advisory lifetime of a proof session, in minutes
    #[arg(long)]
    pub session_ttl_minutes: Option<u32>,

    /// Maximum accepted upload request size in bytes
    #[arg(long)]
    pub max_upload_bytes: Option<usize>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub data_folder: PathBuf,
    pub database_path: PathBuf,
    pub uploads_dir: PathBuf,
    pub session_ttl_minutes: u32,
    pub max_upload_bytes: usize,
    pub listener_buffer: usize,
}

impl Config {
    /// Merge arguments over file values over defaults
    pub fn resolve(args: &Args, file: &TomlConfig) -> donate_common::Result<Self> {
        let port = args.port.or(file.port).unwrap_or(DEFAULT_PORT);
        let bind_address = args
            .bind_address
            .clone()
            .or_else(|| file.bind_address.clone())
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());
        let ip: IpAddr = bind_address.parse().map_err(|e| {
            donate_common::Error::Config(format!("Invalid bind address '{}': {}", bind_address, e))
        })?;

        let data_folder = resolve_data_folder(
            args.data_folder.as_deref(),
            DATA_FOLDER_ENV,
            file.data_folder.as_deref(),
        );
        let database_path = args
            .database_path
            .clone()
            .or_else(|| file.database_path.clone())
            .unwrap_or_else(|| data_folder.join("donate.db"));
        let uploads_dir = args
            .uploads_dir
            .clone()
            .or_else(|| file.uploads_dir.clone())
            .unwrap_or_else(|| data_folder.join("uploads"));

        let listener_buffer = file
            .listener_buffer
            .unwrap_or(crate::hub::DEFAULT_LISTENER_BUFFER);
        if listener_buffer == 0 {
            return Err(donate_common::Error::Config(
                "listener_buffer must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            bind_addr: SocketAddr::new(ip, port),
            data_folder,
            database_path,
            uploads_dir,
            session_ttl_minutes: args
                .session_ttl_minutes
                .or(file.session_ttl_minutes)
                .unwrap_or(DEFAULT_SESSION_TTL_MINUTES),
            max_upload_bytes: args
                .max_upload_bytes
                .or(file.max_upload_bytes)
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            listener_buffer,
        })
    }
}
