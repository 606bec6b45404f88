//! # cm-client
//!
//! Typed client for the construction-management REST API.
//!
//! Every operation returns `CmResult<ApiResponse<T>>`: non-2xx responses
//! come back as `Ok(ApiResponse { data: None, error: Some(..) })`, while
//! transport failures (network, undecodable 2xx body) and rejected
//! parameters come back as `Err`.
//!
//! Networking sits behind the [`Transport`] trait so views can run against
//! [`mock::ScriptedTransport`] instead of a live backend.

pub mod transport;
pub mod http;
pub mod session;
pub mod client;
pub mod mock;

pub use client::ApiClient;
pub use http::HttpTransport;
pub use session::{MemorySession, Session, SessionProvider};
pub use transport::{ApiRequest, Method, RawResponse, Transport};
