//! # awx-client - typed client for the AWX REST API
//!
//! A blocking Rust client for the AWX job orchestration API. It takes care
//! of token authentication, request path construction, status validation
//! and turning error responses into a single error type. Resource payloads
//! are plain serde types owned by the caller.
//!
//! ## Features
//!
//! - Lazy token acquisition: credentials are exchanged for a bearer token on
//!   the first resource call and the token is reused afterwards
//! - Generic `get`/`list`/`create`/`update`/`delete` operations over any
//!   `serde` type
//! - Uniform errors: rejected responses carry the status code and the
//!   server's messages
//! - Per-call deadlines through [`CallContext`]
//! - Pluggable [`Transport`] for tests and custom HTTP stacks
//! - Request logging through `tracing` (install a subscriber to see it)
//!
//! ## Basic Usage
//!
//! ```no_run
//! use awx_client::{CallContext, Client, Config, ListEnvelope, ResourceKey};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Deserialize)]
//! struct Job {
//!     id: i64,
//!     name: String,
//!     status: String,
//! }
//!
//! #[derive(Serialize)]
//! struct ListJobsInput {
//!     status: String,
//! }
//!
//! fn main() -> Result<(), awx_client::AwxError> {
//!     let client = Client::new(
//!         Config::new("https://awx.example.com/api/v2/").with_credentials("admin", "secret"),
//!     )?;
//!     let ctx = CallContext::background();
//!
//!     let job: Job = client.get(&ctx, &ResourceKey::new("jobs").id(42), &[])?;
//!     println!("{} is {}", job.name, job.status);
//!
//!     let failed: ListEnvelope<Job> = client.list(
//!         &ctx,
//!         &ResourceKey::new("jobs"),
//!         &ListJobsInput { status: "failed".into() },
//!         &[],
//!     )?;
//!     println!("{} failed jobs", failed.count);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! ```no_run
//! use awx_client::{AwxError, CallContext, Client, Config, ResourceKey};
//!
//! let client = Client::new(Config::new("https://awx.example.com/api/v2/").with_token("t0k3n"))?;
//! match client.delete(&CallContext::background(), &ResourceKey::new("schedules").id(1), &[]) {
//!     Ok(()) => println!("deleted"),
//!     Err(err) if err.is_not_found() => println!("already gone"),
//!     Err(AwxError::Request(api)) => eprintln!("{}", api),
//!     Err(err) => return Err(err),
//! }
//! # Ok::<(), AwxError>(())
//! ```

pub mod client;
pub mod context;
pub mod error;
pub mod key;
pub mod query;
pub mod response;
pub mod rest;
pub mod token;
pub mod transport;

// Re-export main types for convenience
pub use client::Config;
pub use context::CallContext;
pub use error::{ApiError, AuthError, AwxError, Result};
pub use key::{locate, ResourceKey};
pub use response::{normalize_error, ErrorEnvelope, ListEnvelope, PingOutput};
pub use rest::Client;
pub use token::{AuthToken, Authenticator, Credentials};
pub use transport::{ReqwestTransport, Transport, TransportRequest, TransportResponse};

// Re-export the HTTP method type used by `Client::dispatch`
pub use reqwest::Method;
