//! Shared fixture for integration tests
//!
//! One [`MemoryRemote`] and one [`ManualClock`] play the backend; each user
//! gets a device of their own (session, cache and core).

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use funnel_config::FunnelConfig;
use funnel_core::{
    Backends, FunnelCore, FunnelStep, FunnelTemplate, ManualClock, SessionAuth,
};
use funnel_store::{MemoryCache, MemoryRemote};

/// A user's device
pub struct Device {
    pub session: Arc<SessionAuth>,
    pub cache: Arc<MemoryCache>,
    pub core: FunnelCore,
}

/// The shared backend
pub struct Harness {
    pub remote: MemoryRemote,
    pub clock: Arc<ManualClock>,
    pub config: FunnelConfig,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(FunnelConfig::default())
    }

    pub fn with_config(config: FunnelConfig) -> Self {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let remote = MemoryRemote::new().with_clock(clock.clone());
        Self {
            remote,
            clock,
            config,
        }
    }

    pub fn anonymous_device(&self) -> Device {
        self.device(SessionAuth::anonymous())
    }

    pub fn device_for(&self, owner: &str) -> Device {
        self.device(SessionAuth::signed_in(owner))
    }

    fn device(&self, session: SessionAuth) -> Device {
        let session = Arc::new(session);
        let cache = Arc::new(MemoryCache::new());
        let backends = Backends::new(
            Arc::new(self.remote.clone()),
            Arc::new(self.remote.clone()),
            cache.clone(),
            session.clone(),
        )
        .with_clock(self.clock.clone());

        Device {
            core: FunnelCore::new(&self.config, backends),
            session,
            cache,
        }
    }
}

pub fn steps(n: usize) -> Vec<FunnelStep> {
    (1..=n)
        .map(|i| {
            FunnelStep::new("email", format!("Step {}", i))
                .with_field("position", serde_json::json!(i))
        })
        .collect()
}

pub fn template(title: &str, n: usize) -> FunnelTemplate {
    FunnelTemplate::new(title)
        .with_description(format!("{} description", title))
        .with_kind("lead-magnet")
        .with_steps(steps(n))
}
