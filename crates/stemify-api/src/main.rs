use std::sync::Arc;

use stemify_api::config::ServiceConfig;
use stemify_api::logging::init_tracing;
use stemify_api::provider::{SeparationProvider, SieveClient};
use stemify_api::server::run_server;
use stemify_api::storage::{ObjectStore, SupabaseStorage};
use stemify_api::Separator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = ServiceConfig::load()?;
    init_tracing();

    tracing::info!(
        listen_addr = %cfg.listen_addr,
        sieve_function = %cfg.sieve.function,
        bucket = %cfg.bucket,
        "Stemify boot"
    );

    let provider: Arc<dyn SeparationProvider> = Arc::new(SieveClient::new(cfg.sieve.clone())?);

    let store: Option<Arc<dyn ObjectStore>> = match cfg.storage.clone() {
        Some(storage_cfg) => {
            let store: Arc<dyn ObjectStore> = Arc::new(SupabaseStorage::new(storage_cfg)?);
            Some(store)
        }
        None => {
            tracing::warn!("SUPABASE_URL / SUPABASE_SERVICE_ROLE_KEY not set, stem uploads will fail");
            None
        }
    };

    let separator = Separator::new(provider, store, cfg.bucket.clone());
    run_server(cfg.listen_addr, separator).await?;
    Ok(())
}
