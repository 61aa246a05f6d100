//! Core library for the SAMI operations dashboard.
//!
//! - `api`: the authenticated REST client and its endpoint functions
//! - `auth`: session store, token storage and session events
//! - `models`: identity and system status types
//! - `dashboard`: stat cards, recent activity and service status
//! - `poll`: non-overlapping periodic re-fetch
//! - `config`: persisted settings and backend URL resolution

pub mod api;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod models;
pub mod poll;
pub mod utils;

pub use api::{ApiClient, ApiError, ApiResult, QueryParams, Resource};
pub use auth::{SessionError, SessionEvent, SessionStore, TokenStorage};
pub use config::Config;
pub use models::{SystemStatus, User};
