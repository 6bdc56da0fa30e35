//! Shared collaborators injected into every component

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::{Clock, SystemClock};
use crate::error::{RemoteError, RemoteResult};
use crate::traits::{AuthSignal, LocalCache, RemoteProcedures, RemoteStore};
use crate::types::OwnerId;

const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(10);

/// The stores, identity source and clock a component works against
///
/// Cheap to clone; every field is shared.
#[derive(Clone)]
pub struct Backends {
    pub remote: Arc<dyn RemoteStore>,
    pub procedures: Arc<dyn RemoteProcedures>,
    pub cache: Arc<dyn LocalCache>,
    pub auth: Arc<dyn AuthSignal>,
    pub clock: Arc<dyn Clock>,
    remote_timeout: Duration,
}

impl Backends {
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        procedures: Arc<dyn RemoteProcedures>,
        cache: Arc<dyn LocalCache>,
        auth: Arc<dyn AuthSignal>,
    ) -> Self {
        Self {
            remote,
            procedures,
            cache,
            auth,
            clock: Arc::new(SystemClock),
            remote_timeout: DEFAULT_REMOTE_TIMEOUT,
        }
    }

    /// Builder-style: replace the clock
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Builder-style: bound every remote call
    #[must_use]
    pub fn with_remote_timeout(mut self, timeout: Duration) -> Self {
        self.remote_timeout = timeout;
        self
    }

    pub fn remote_timeout(&self) -> Duration {
        self.remote_timeout
    }

    pub fn identity(&self) -> Option<OwnerId> {
        self.auth.current_identity()
    }

    /// Run a remote call under the configured timeout
    ///
    /// A timeout is reported as [`RemoteError::Timeout`] and takes the same
    /// fallback paths as any other remote failure.
    pub async fn call<T, F>(&self, request: F) -> RemoteResult<T>
    where
        F: Future<Output = RemoteResult<T>>,
    {
        match tokio::time::timeout(self.remote_timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(RemoteError::Timeout {
                duration_ms: u64::try_from(self.remote_timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}
