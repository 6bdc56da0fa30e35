//! Funnel template persistence and sharing core
//!
//! Two concerns live here:
//!
//! - **Dual-store sync** ([`sync`]): one logical template store over an
//!   authoritative remote store and an on-device cache, with a one-shot
//!   migration of cache-only templates on every sign-in.
//! - **Share tokens** ([`sharing`]): issue a token bound to a snapshot,
//!   validate it, redeem it into an owned copy, repair copies that lost
//!   their steps.
//!
//! Stores and identity are injected through the traits in [`traits`];
//! `funnel-store` provides concrete implementations.

pub mod backends;
pub mod clock;
pub mod error;
pub mod fallback;
pub mod funnel_core;
pub mod logging;
pub mod session;
pub mod sharing;
pub mod sync;
pub mod traits;
pub mod types;

pub use backends::Backends;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CacheError, CacheResult, RemoteError, RemoteResult, SharingError, SharingResult};
pub use funnel_core::FunnelCore;
pub use session::SessionAuth;
pub use sharing::{Redemption, RepairReport, TokenValidation};
pub use sync::{AuthState, MigrationReport, SyncCoordinator};
pub use traits::{AuthEvent, AuthSignal, LocalCache, NoProcedures, RemoteProcedures, RemoteStore};
pub use types::{
    ConsistencyIssue, CopyOutcome, FunnelStep, FunnelTemplate, OwnerId, RepairOutcome,
    ResolvedToken, ShareToken, TemplateId, TemplateSnapshot, TokenUsageRecord, UsageAction,
};
