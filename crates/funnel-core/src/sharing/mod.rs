//! Share Token Lifecycle
//!
//! A share token hands a frozen snapshot of one user's template to another
//! user, who may not be signed in yet when they open it.
//!
//! - [`TokenIssuer`] - mint a token bound to a snapshot; owner management
//! - [`TokenValidator`] - resolve a token (direct read, then procedure)
//! - [`TokenRedeemer`] - materialize an owned copy (atomic procedure, then
//!   manual rebuild) and flag incomplete copies
//! - [`ConsistencyAuditor`] - repair empty copies and report inconsistencies
//!
//! Apart from issuance arguments, nothing here returns an error to the
//! caller: outcomes are plain result values carrying a message.

mod auditor;
mod generator;
mod issuer;
mod redeemer;
mod validator;

pub use auditor::{ConsistencyAuditor, RepairReport};
pub use generator::{RandomTokenGenerator, TokenGenerator};
pub use issuer::TokenIssuer;
pub use redeemer::{Redemption, TokenRedeemer};
pub use validator::{TokenValidation, TokenValidator};
