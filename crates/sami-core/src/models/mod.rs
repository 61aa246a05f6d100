//! Data models for the SAMI dashboard.
//!
//! Most endpoints return their JSON body untouched, so only the shapes the
//! client itself reasons about are typed here:
//!
//! - `User`, `TokenResponse`: identity and credentials from `/auth/*`
//! - `SystemStatus`, `ServiceState`: the per-subsystem view of `/status`

pub mod status;
pub mod user;

pub use status::{ServiceState, ServiceStatus, SystemStatus};
pub use user::{TokenResponse, User};
