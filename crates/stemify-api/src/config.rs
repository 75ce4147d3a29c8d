//! Service configuration
//!
//! Every setting is a CLI flag backed by an environment variable, so a
//! `.env` file or the deployment environment configure the service
//! without flags.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::error::ConfigError;
use crate::provider::SieveConfig;
use crate::storage::SupabaseConfig;

/// Placeholder shipped in sample `.env` files
const PLACEHOLDER_SERVICE_KEY: &str = "your_service_role_key_here";

#[derive(Debug, Clone, Parser)]
#[command(name = "stemify-api", version, about = "Stem separation relay: Sieve in, Supabase Storage out")]
pub struct Args {
    /// Interface to bind
    #[arg(long, default_value = "0.0.0.0", env = "HOST")]
    pub host: String,

    /// Port to listen on
    #[arg(long, default_value_t = 8000, env = "PORT")]
    pub port: u16,

    /// Sieve API key
    #[arg(long, env = "SIEVE_API_KEY", hide_env_values = true)]
    pub sieve_api_key: Option<String>,

    /// Sieve API base URL
    #[arg(long, default_value = "https://mango.sievedata.com", env = "SIEVE_API_URL")]
    pub sieve_api_url: String,

    /// Sieve function running the separation
    #[arg(long, default_value = "sieve/demucs", env = "SIEVE_FUNCTION")]
    pub sieve_function: String,

    /// Delay between job status polls, in milliseconds
    #[arg(long, default_value_t = 2000, env = "SIEVE_POLL_INTERVAL_MS")]
    pub sieve_poll_interval_ms: u64,

    /// Supabase project URL
    #[arg(long, env = "SUPABASE_URL")]
    pub supabase_url: Option<String>,

    /// Supabase service-role key (uploads fail without it)
    #[arg(long, env = "SUPABASE_SERVICE_ROLE_KEY", hide_env_values = true)]
    pub supabase_service_role_key: Option<String>,

    /// Storage bucket; also the URL segment preceding the owner id
    #[arg(long, default_value = "audio-files", env = "STORAGE_BUCKET")]
    pub storage_bucket: String,

    /// Directory for downloaded stems (defaults to <tmp>/stemify)
    #[arg(long, env = "STEMIFY_WORK_DIR")]
    pub work_dir: Option<PathBuf>,
}

/// Validated configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub listen_addr: SocketAddr,
    pub sieve: SieveConfig,
    /// `None` when storage credentials are absent
    pub storage: Option<SupabaseConfig>,
    pub bucket: String,
}

impl ServiceConfig {
    /// Load `.env`, parse flags/environment, validate
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_args(Args::parse())
    }

    pub fn from_args(args: Args) -> Result<Self, ConfigError> {
        let ip: IpAddr = args.host.parse().map_err(|e| ConfigError::Invalid {
            name: "HOST",
            reason: format!("{}: {e}", args.host),
        })?;
        let listen_addr = SocketAddr::new(ip, args.port);

        let api_key = args
            .sieve_api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::Missing { name: "SIEVE_API_KEY" })?;

        if args.sieve_poll_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                name: "SIEVE_POLL_INTERVAL_MS",
                reason: "must be greater than zero".into(),
            });
        }

        let work_dir = args
            .work_dir
            .unwrap_or_else(|| std::env::temp_dir().join("stemify"));

        let sieve = SieveConfig {
            api_url: args.sieve_api_url,
            api_key,
            function: args.sieve_function,
            poll_interval: Duration::from_millis(args.sieve_poll_interval_ms),
            work_dir,
        };

        let service_key = args
            .supabase_service_role_key
            .filter(|k| !k.trim().is_empty() && k != PLACEHOLDER_SERVICE_KEY);

        let storage = match (args.supabase_url, service_key) {
            (Some(url), Some(service_key)) if !url.trim().is_empty() => Some(SupabaseConfig {
                url,
                service_key,
                bucket: args.storage_bucket.clone(),
            }),
            _ => None,
        };

        Ok(Self {
            listen_addr,
            sieve,
            storage,
            bucket: args.storage_bucket,
        })
    }
}
