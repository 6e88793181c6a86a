//! SectionWiki Core Business Logic Layer
//!
//! This crate provides the data management, access control, and service
//! orchestration for a section-gated wiki with threaded comments.
//!
//! # Architecture
//!
//! - **One document table**: pages and comments share a single flat table,
//!   discriminated by `kind` and linked by explicit `parent_id`/`page_id`
//! - **Section gating**: the reserved `all` section is public; every other
//!   section is readable and writable per the account's profile rights
//! - **libsql/Turso**: Embedded SQLite-compatible database, local file or
//!   hosted, unlocked by a passphrase-encrypted access key
//! - **Silent degradation**: identity resolution never fails; a broken auth
//!   check downgrades the session to anonymous and says why
//!
//! # Modules
//!
//! - [`models`] - Data structures (Document, Identity, Profile)
//! - [`auth`] - Credential bootstrap, sessions, auth provider seam
//! - [`services`] - Business services (documents, comments, identity, profiles)
//! - [`db`] - Database layer with libsql integration
//! - [`utils`] - Content rendering and excerpt helpers
//! - [`config`] - Environment-driven runtime settings

pub mod auth;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::{init_tracing, WikiConfig};
pub use models::*;
pub use services::*;
