//! Parity Check - deployment parity verifier
//!
//! Confirms that a "preview" deployment exposes the same data and behavior
//! as its "published" deployment by running a fixed battery of read-only
//! HTTP checks against a running instance and aggregating pass/fail verdicts.
//!
//! ## Architecture
//! Orchestrator -> CheckTransport (HTTP GET) -> JSON body -> predicate -> CheckResult
//!
//! The identity side (`auth`, `identity`, `api`) is the server-side gate in
//! front of `/api/auth/user`, with the demo bypass fallback.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use parity_check::{HttpTransport, ParityConfig, ParityOrchestrator};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ParityConfig::new("http://localhost:5000")?;
//! let orchestrator = ParityOrchestrator::new(HttpTransport::new(&config)?);
//! let state = orchestrator.run_all().await?;
//! println!("{} passed, {} failed", state.pass_count(), state.fail_count());
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;

// Explicit configuration threaded into components at construction
pub mod config;

// Check roster and pass predicates
pub mod checks;

// Orchestrator and run state
pub mod engine;

// HTTP transport used by the orchestrator
pub mod transport;

// Stored identities and lazy materialization
pub mod identity;

// Rendering of run state (text / JSON)
pub mod report;

// Identity gate (strict / bypass)
#[cfg(feature = "server")]
pub mod auth;

// REST routes
#[cfg(feature = "server")]
pub mod api;

pub use checks::{CheckDefinition, Credentials, Endpoint};
pub use config::{AuthConfig, ParityConfig};
pub use engine::orchestrator::ParityOrchestrator;
pub use engine::result::{CheckResult, CheckStatus, RunState, RunSummary};
pub use error::{CheckFailure, ConfigError, ParityError, StoreError};
pub use identity::{Identity, IdentityResolver, IdentityStore, InMemoryIdentityStore};
pub use transport::{CheckTransport, HttpTransport};
