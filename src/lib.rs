//! Sitekeeper - content store for a team website
//!
//! This library keeps the site's content (team members, projects, services and
//! contact submissions) in a hosted document store, mirrors every collection
//! into a local key-value cache, and falls back to that cache whenever the
//! remote store cannot be reached. Reads and writes never fail from the
//! caller's point of view; they report where their result came from.
//!
//! # Modules
//!
//! * [`models`] - Content types and record identifiers
//! * [`backend`] - Remote document stores (Firestore, REST, in-memory)
//! * [`storage`] - Local key-value cache
//! * [`sync`] - Write-through repositories with local fallback
//! * [`connectivity`] - Reachability probe and connection diagnostics
//! * [`migration`] - Local cache to remote store copy
//! * [`config`] - Application configuration management

/// Remote store abstraction layer
pub mod backend;

/// Configuration module for managing application settings
pub mod config;

/// Remote reachability tracking and diagnostics
pub mod connectivity;

/// Application constants and default values
pub mod constants;

/// SeaORM entity models for the local cache tables
pub mod entities;

/// Logging setup and in-memory log buffer
pub mod logger;

/// One-shot local-to-remote migration
pub mod migration;

/// Content model
pub mod models;

/// Contact submission notifications
pub mod notify;

/// Repository layer for database operations
pub mod repositories;

/// Local key-value storage and the typed cache adapter
pub mod storage;

/// Repositories combining the remote store and the local cache
pub mod sync;

pub use models::{Collection, ContactSubmission, Project, Record, RecordId, Service, TeamMember};
pub use sync::{Outcome, Origin, Repository, SiteData};
