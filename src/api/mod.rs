//! REST API client module for the remote task service.
//!
//! This module provides the `ApiClient` for authenticating and for
//! reading and writing tasks.
//!
//! The API uses JWT bearer authentication: short-lived access tokens
//! attached to every protected request, with a transparent single
//! refresh-and-retry when the server answers 401.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
