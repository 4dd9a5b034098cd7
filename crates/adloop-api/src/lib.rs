// adloop-api: Async Rust client for the AdLoop signage backend

pub mod branches;
pub mod client;
pub mod devices;
pub mod error;
pub mod media_url;
pub mod models;
pub mod transport;

pub use client::SignageClient;
pub use error::Error;
pub use media_url::MediaUrlResolver;
pub use models::{Branch, BranchSummary, CacheStats, VideoItem, VideoKey};
pub use transport::TransportConfig;
