//! HTTP server for the notary.
//!
//! Exposes submission, verification, audit history, statistics and
//! download of retained documents over a JSON API.

pub mod auth;
pub mod config;
pub mod content;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use auth::{Action, AuthProvider, Credentials, Identity, TrustedHeaderAuth, ACTOR_HEADER};
pub use config::{ArchiveBackend, LedgerBackend, ServerConfig};
pub use content::ContentStore;
pub use error::{ServerError, ServerResult};
pub use server::NotaryServer;
pub use state::AppState;
