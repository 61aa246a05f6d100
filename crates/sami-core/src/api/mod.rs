//! REST API client module for the SAMI backend.
//!
//! This module provides the `ApiClient` for communicating with the
//! SAMI REST API: employees, assets, projects, events, fuel, GPS, voice,
//! camera, RFID and reports.
//!
//! The API uses bearer token authentication. Tokens are obtained from
//! `/auth/login` and read from `TokenStorage` on every request.

pub mod client;
pub mod endpoints;
pub mod error;
pub mod params;

pub use client::{ApiClient, DEFAULT_API_URL};
pub use endpoints::{Resource, LOGOUT_TIMEOUT};
pub use error::{ApiError, ApiResult};
pub use params::QueryParams;
