//! Core engine for the contrastverify security gate.
//!
//! The flow is strictly sequential: resolve configuration, open a
//! TeamServer client, verify connectivity, resolve the application,
//! evaluate the gate (server-side policy first, open-count threshold
//! fallback second), and report the outcome. Every network failure is
//! terminal; there are no retries.

pub mod client;
pub mod config;
pub mod evaluate;
pub mod inputs;
pub mod output;
pub mod render;
pub mod resolver;

pub use client::{ApiError, TeamServerApi, TeamServerClient};
pub use config::{resolve_config, Config, ConfigError, Trust};
pub use evaluate::verify_application;
pub use inputs::{included_severities, lookup, EnvSource, InputSource};
pub use output::OutputHelper;
pub use render::render_summary_markdown;
pub use resolver::{AppResolver, ResolveError};
