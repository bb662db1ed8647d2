//! REST API client module for the quiz backend.
//!
//! This module provides the `HttpClient` for communicating with the quiz
//! API. Requests carry the stored JWT as a bearer token; an authentication
//! failure clears the stored session so the next navigation goes back to
//! the login page.

pub mod client;
pub mod endpoints;
pub mod error;
pub mod transport;
pub mod url;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{HttpClient, RequestDescriptor, DEFAULT_TIMEOUT_SECS};
pub use error::RequestError;
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError};
