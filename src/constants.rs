//! Constants used throughout the application
//!
//! This module centralizes storage keys, collection names, default timings and
//! the log/advisory strings shared by the data layer.

// Local cache keys (identical to the remote collection names)
pub const KEY_TEAM_MEMBERS: &str = "teamMembers";
pub const KEY_PROJECTS: &str = "projects";
pub const KEY_SERVICES: &str = "services";
pub const KEY_CONTACT_SUBMISSIONS: &str = "contactSubmissions";

/// Scratch collection used by the connection diagnostics.
pub const CONNECTION_TEST_COLLECTION: &str = "_connection_test";

/// Field that carries the server-assigned write time on every remote document.
pub const TIMESTAMP_FIELD: &str = "timestamp";

// Connectivity
/// Default delay between two reachability probes, in seconds
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
/// Default deadline for a single reachability probe, in seconds
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 5;
/// Default HTTP timeout for remote store calls, in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
/// Upper bound accepted for the poll interval (one day)
pub const MAX_POLL_INTERVAL_SECS: u64 = 86_400;

// Remote store defaults
pub const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";
pub const FIRESTORE_DEFAULT_DATABASE: &str = "(default)";
pub const FIRESTORE_PAGE_SIZE: u32 = 300;
pub const FIRESTORE_AUTO_ID_LEN: usize = 20;
pub const DEFAULT_API_KEY_ENV: &str = "SITEKEEPER_API_KEY";

// Logging
/// Number of log lines kept in memory for the admin debug view
pub const LOG_BUFFER_CAPACITY: usize = 500;
pub const LOG_FILE_NAME: &str = "sitekeeper.log";
pub const APP_DIR_NAME: &str = "sitekeeper";

// Advisory messages
pub const ADVISORY_SAVED_LOCALLY: &str = "Saved locally; changes may not sync to the remote store";
pub const ADVISORY_SHOWING_CACHED: &str = "Showing cached data; the remote store could not be reached";
pub const ADVISORY_WORKING_OFFLINE: &str = "Working offline";

// Log Messages
pub const LOG_REMOTE_UNREACHABLE: &str = "⚠️  Remote store unreachable, using local cache";
pub const LOG_CACHE_CORRUPT: &str = "⚠️  Ignoring malformed local cache value";

// UI Messages
pub const CONFIG_GENERATED: &str = "✅ Generated default configuration file";
