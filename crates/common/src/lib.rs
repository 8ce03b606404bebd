//! CoachTree Common Library
//!
//! Shared code for the CoachTree crates including:
//! - Error types and handling
//! - Configuration management
//! - In-memory read-through caching
//! - Metrics and observability

pub mod cache;
pub mod config;
pub mod errors;
pub mod metrics;

// Re-export commonly used types
pub use errors::{AppError, Result};
pub use config::AppConfig;
pub use cache::MemoryCache;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Population tag used for rankings computed over every sport
pub const ALL_SPORTS_TAG: &str = "all";
