//! Shared types, error model, and configuration for DraftDeck.
//!
//! This crate is the foundation depended on by all other DraftDeck crates.
//! It provides:
//! - [`DraftDeckError`] — the unified error type
//! - Domain types ([`Project`], [`Section`], [`RefinementEntry`], [`Feedback`])
//! - Configuration ([`AppConfig`], [`GatewayConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DatabaseConfig, GatewayConfig, ServerConfig, config_dir, config_file_path,
    expand_home, gateway_api_key, init_config, load_config, load_config_from,
};
pub use error::{DraftDeckError, Result};
pub use types::{
    DocumentKind, Feedback, Project, ProjectStatus, ProjectWithSections, RefinementEntry, Section,
    User, new_id,
};
