//! Concrete stores for funnel-core
//!
//! - [`MemoryRemote`] - in-process authoritative store with every remote
//!   procedure, fault injection and call statistics
//! - [`JsonFileCache`] - the local cache as one JSON blob on disk
//! - [`MemoryCache`] - the local cache held in memory

mod cache;
mod error;
mod remote;

pub use cache::{JsonFileCache, MemoryCache};
pub use error::{StoreError, StoreResult};
pub use remote::{MemoryRemote, MemoryRemoteStats, RemoteOp};
