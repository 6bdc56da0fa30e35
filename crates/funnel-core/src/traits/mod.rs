//! Store and identity abstractions
//!
//! The core depends only on these traits; concrete stores live in
//! `funnel-store` and are injected at composition time.
//!
//! - [`RemoteStore`] - authoritative CRUD over templates, tokens and usage
//! - [`RemoteProcedures`] - named server-side procedures
//! - [`LocalCache`] - synchronous, best-effort on-device persistence
//! - [`AuthSignal`] - current identity and sign-in/sign-out events

pub mod auth;
pub mod cache;
pub mod remote;

pub use auth::{AuthEvent, AuthSignal};
pub use cache::LocalCache;
pub use remote::{NoProcedures, RemoteProcedures, RemoteStore};
