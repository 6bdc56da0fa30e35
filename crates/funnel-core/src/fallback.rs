//! Ordered fallback strategies
//!
//! Operations that can be satisfied from more than one place (remote then
//! local cache, direct read then procedure, procedure then manual rebuild)
//! declare their precedence as a [`FallbackChain`]: a list of named
//! strategies evaluated in order until one resolves.
//!
//! Strategies are futures, so nothing runs until the chain reaches them.
//!
//! ```ignore
//! let outcome = FallbackChain::new("get_template")
//!     .strategy("remote", async { Attempt::from_lookup(remote_lookup().await) })
//!     .strategy("local", async { Attempt::from_lookup(local_lookup()) })
//!     .resolve()
//!     .await;
//! ```

use std::future::Future;

use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::error::RemoteResult;

/// Result of running one strategy
#[derive(Debug, Clone, PartialEq)]
pub enum Attempt<T> {
    /// Done; later strategies are not run
    Resolved(T),

    /// The strategy ran and had nothing to offer
    Miss(String),

    /// The strategy could not run, typically a backend failure
    Failed(String),
}

impl<T> Attempt<T> {
    pub fn miss(reason: impl Into<String>) -> Self {
        Self::Miss(reason.into())
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }

    /// Map a remote lookup: found resolves, absent misses, error fails
    pub fn from_lookup(result: RemoteResult<Option<T>>) -> Self {
        match result {
            Ok(Some(value)) => Self::Resolved(value),
            Ok(None) => Self::miss("not found"),
            Err(e) => Self::failed(e.to_string()),
        }
    }
}

/// A strategy that did not resolve
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub strategy: &'static str,
    pub reason: String,
    pub failed: bool,
}

/// Result of running a whole chain
#[derive(Debug)]
pub enum ChainOutcome<T> {
    Resolved { strategy: &'static str, value: T },
    Exhausted { skipped: Vec<Skipped> },
}

impl<T> ChainOutcome<T> {
    pub fn value(self) -> Option<T> {
        match self {
            Self::Resolved { value, .. } => Some(value),
            Self::Exhausted { .. } => None,
        }
    }

    /// Name of the strategy that resolved
    pub fn strategy(&self) -> Option<&'static str> {
        match self {
            Self::Resolved { strategy, .. } => Some(*strategy),
            Self::Exhausted { .. } => None,
        }
    }

    /// Exhausted and every strategy failed rather than missed
    pub fn all_failed(&self) -> bool {
        match self {
            Self::Resolved { .. } => false,
            Self::Exhausted { skipped } => !skipped.is_empty() && skipped.iter().all(|s| s.failed),
        }
    }

    /// Reasons joined for a user-facing message
    pub fn reasons(&self) -> String {
        match self {
            Self::Resolved { .. } => String::new(),
            Self::Exhausted { skipped } => skipped
                .iter()
                .map(|s| format!("{}: {}", s.strategy, s.reason))
                .collect::<Vec<_>>()
                .join("; "),
        }
    }
}

/// Named strategies evaluated in declaration order
pub struct FallbackChain<'a, T> {
    operation: &'static str,
    strategies: Vec<(&'static str, BoxFuture<'a, Attempt<T>>)>,
}

impl<'a, T> FallbackChain<'a, T> {
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            strategies: Vec::new(),
        }
    }

    /// Append a strategy with lower precedence than those already added
    #[must_use]
    pub fn strategy<F>(mut self, name: &'static str, attempt: F) -> Self
    where
        F: Future<Output = Attempt<T>> + Send + 'a,
    {
        self.strategies.push((name, Box::pin(attempt)));
        self
    }

    pub async fn resolve(self) -> ChainOutcome<T> {
        let operation = self.operation;
        let mut skipped = Vec::new();

        for (strategy, attempt) in self.strategies {
            match attempt.await {
                Attempt::Resolved(value) => {
                    if !skipped.is_empty() {
                        debug!(
                            operation,
                            strategy,
                            fallbacks = skipped.len(),
                            "Resolved by fallback"
                        );
                    }
                    return ChainOutcome::Resolved { strategy, value };
                }
                Attempt::Miss(reason) => {
                    debug!(operation, strategy, %reason, "Strategy missed");
                    skipped.push(Skipped {
                        strategy,
                        reason,
                        failed: false,
                    });
                }
                Attempt::Failed(reason) => {
                    warn!(operation, strategy, %reason, "Strategy failed, falling back");
                    skipped.push(Skipped {
                        strategy,
                        reason,
                        failed: true,
                    });
                }
            }
        }

        ChainOutcome::Exhausted { skipped }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_first_resolving_strategy_wins() {
        let outcome = FallbackChain::new("test")
            .strategy("a", async { Attempt::<u32>::miss("empty") })
            .strategy("b", async { Attempt::Resolved(2) })
            .strategy("c", async { Attempt::Resolved(3) })
            .resolve()
            .await;
        assert_eq!(outcome.strategy(), Some("b"));
        assert_eq!(outcome.value(), Some(2));
    }

    #[tokio::test]
    async fn test_later_strategies_do_not_run() {
        let runs = AtomicUsize::new(0);
        let outcome = FallbackChain::new("test")
            .strategy("first", async { Attempt::Resolved("ok") })
            .strategy("second", async {
                runs.fetch_add(1, Ordering::SeqCst);
                Attempt::Resolved("late")
            })
            .resolve()
            .await;
        assert_eq!(outcome.value(), Some("ok"));
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_exhausted_distinguishes_failure_from_miss() {
        let failed = FallbackChain::new("test")
            .strategy("a", async { Attempt::<()>::failed("down") })
            .strategy("b", async { Attempt::<()>::failed("timeout") })
            .resolve()
            .await;
        assert!(failed.all_failed());
        assert_eq!(failed.reasons(), "a: down; b: timeout");

        let mixed = FallbackChain::new("test")
            .strategy("a", async { Attempt::<()>::failed("down") })
            .strategy("b", async { Attempt::<()>::miss("nothing") })
            .resolve()
            .await;
        assert!(!mixed.all_failed());
        assert!(mixed.value().is_none());
    }

    #[test]
    fn test_from_lookup() {
        assert_eq!(Attempt::from_lookup(Ok(Some(1))), Attempt::Resolved(1));
        assert!(matches!(
            Attempt::<i32>::from_lookup(Ok(None)),
            Attempt::Miss(_)
        ));
        assert!(matches!(
            Attempt::<i32>::from_lookup(Err(RemoteError::unavailable("x"))),
            Attempt::Failed(_)
        ));
    }
}
