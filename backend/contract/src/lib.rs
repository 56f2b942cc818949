//! # Contract
//!
//! Shared wire types between the board frontend, the backend server and the command line tester.
//!
//! ## Envelope
//!
//! Every `/api/v1/auth` response is wrapped in an [`ApiResponse`]:
//! ```json
//! { "success": true, "data": { ... }, "error": null }
//! { "success": false, "data": null, "error": { "code": "INVALID_INPUT", "message": "..." } }
//! ```
//!
//! The health check is the exception and returns a bare [`HealthResponse`].
//!
//! ## Client
//!
//! [`AuthClient`] posts requests and unwraps the envelope, turning `success: false` into
//! [`ClientError::Api`] carrying the server message. [`Session`] holds the logged in user on the client
//! and [`ThemeState`] the colour scheme preference.

pub mod client;
pub mod envelope;
pub mod payloads;
pub mod session;
pub mod theme;

pub use client::{AuthClient, ClientError};
pub use envelope::{ApiResponse, ErrorBody};
pub use payloads::{
    HealthResponse, LoginRequest, LoginResponse, Role, SignUpRequest, SignUpResponse, Violation,
};
pub use session::{Session, UserInfo};
pub use theme::{Theme, ThemeState};

pub const API_PREFIX: &str = "/api/v1";
pub const AUTH_PREFIX: &str = "/api/v1/auth";
