//! Authentication module for managing the user session.
//!
//! This module provides:
//! - `SessionStore`: login, logout, restore and the current identity
//! - `TokenStorage`: durable holders for the bearer token (file, keychain, memory)
//! - `SessionEvents`: notifications the hosting application reacts to
//!
//! The token and the loaded identity are the only state shared across call
//! sites. All of them recover the same way: delete the token, clear the
//! identity, then treat the session as gone.

pub mod events;
pub mod session;
pub mod storage;

pub use events::{SessionEvent, SessionEvents};
pub use session::{SessionError, SessionStore};
pub use storage::{FileTokenStorage, KeyringTokenStorage, MemoryTokenStorage, TokenStorage, TOKEN_KEY};
