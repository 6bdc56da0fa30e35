//! Dual-Store Synchronization
//!
//! [`SyncCoordinator`] presents one logical template store over two physical
//! ones:
//!
//! - the **remote store**, authoritative whenever an identity is present and
//!   the store answers
//! - the **local cache**, always available, used when anonymous and as the
//!   fallback whenever a remote call fails
//!
//! Reconciliation is opportunistic: on each Anonymous -> Authenticated
//! transition the coordinator copies cache-only templates into the remote
//! store (see [`migration`]). Nothing is transactional and no public
//! operation returns an error; callers always get a best-effort result.

mod coordinator;
pub mod migration;

pub use coordinator::{AuthState, SyncCoordinator};
pub use migration::MigrationReport;
