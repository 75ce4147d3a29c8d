//! # Stemify API
//!
//! HTTP relay for stem separation:
//! - resolves the caller's model / stem selection / quality tier into
//!   Demucs parameters
//! - runs the separation on a hosted provider (Sieve)
//! - uploads every produced stem to object storage (Supabase Storage)
//!   under the owner's path and returns public URLs
//!
//! Provider and store sit behind [`provider::SeparationProvider`] and
//! [`storage::ObjectStore`] so the orchestrator runs against fakes in tests.

pub mod cleanup;
pub mod config;
pub mod logging;
pub mod orchestrator;
pub mod params;
pub mod provider;
pub mod server;
pub mod stems;
pub mod storage;

mod error;

pub use error::{ConfigError, ProviderError, SeparationError, StorageError};
pub use orchestrator::{owner_from_url, SeparationResult, Separator, StemFile};
pub use params::{resolve, QualityTier, ResolvedParameters, SeparationRequest};
pub use stems::name_for;
