pub mod config;
pub mod endpoints;
pub mod finalize;
pub mod http_client;
pub mod input;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod parser;
pub mod proxy_pool;
pub mod site_scraper;

// Exporting types for convenience
pub use config::{HttpConfig, RunConfig};
pub use http_client::{FetchError, HttpClient, ReqwestTransport, Transport};
pub use models::Job;
pub use orchestrator::{Orchestrator, ProgressState, RunError};
pub use proxy_pool::ProxyPool;
pub use site_scraper::SiteScraper;
