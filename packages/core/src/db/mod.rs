//! Database Layer
//!
//! This module handles all database interactions using libsql/Turso:
//!
//! - Database initialization and connection management (local file or hosted)
//! - Flat `documents` table shared by wiki pages and comment nodes
//! - `profiles` table for per-account section rights
//!
//! # Architecture
//!
//! The `WikiStore` trait sits between the services (business logic) and the
//! backend. `TursoStore` is the libsql implementation; it delegates SQL to
//! `DatabaseService` and converts rows into models.

mod database;
mod error;
mod turso_store;
mod wiki_store;

pub use database::{
    DatabaseLocation, DatabaseService, DbCreateDocumentParams, DbUpsertProfileParams,
};
pub use error::DatabaseError;
pub use turso_store::TursoStore;
pub use wiki_store::WikiStore;
