//! Sync coordinator

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::backends::Backends;
use crate::error::RemoteResult;
use crate::fallback::{Attempt, FallbackChain};
use crate::sync::migration::{self, MigrationReport};
use crate::traits::AuthEvent;
use crate::types::{FunnelTemplate, OwnerId};

/// Authentication linkage as last observed by the coordinator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Authenticated(OwnerId),
}

/// Single logical template store over the remote store and the local cache
pub struct SyncCoordinator {
    backends: Backends,
    state: Mutex<AuthState>,
}

impl SyncCoordinator {
    /// The initial state mirrors the current identity; it does not count as
    /// a sign-in transition.
    pub fn new(backends: Backends) -> Self {
        let state = match backends.identity() {
            Some(owner) => AuthState::Authenticated(owner),
            None => AuthState::Anonymous,
        };
        Self {
            backends,
            state: Mutex::new(state),
        }
    }

    pub fn backends(&self) -> &Backends {
        &self.backends
    }

    pub fn auth_state(&self) -> AuthState {
        self.state.lock().clone()
    }

    /// Templates of the current identity
    ///
    /// Remote when signed in and reachable, otherwise the cache. The two
    /// sources are never merged, so cache-only templates are invisible while
    /// the remote answers until a migration copies them over.
    pub async fn list_templates(&self) -> Vec<FunnelTemplate> {
        let owner = self.backends.identity();

        FallbackChain::new("list_templates")
            .strategy("remote", async {
                let Some(owner) = owner.as_deref() else {
                    return Attempt::miss("anonymous");
                };
                match self
                    .backends
                    .call(self.backends.remote.list_templates(owner))
                    .await
                {
                    Ok(templates) => Attempt::Resolved(
                        templates
                            .into_iter()
                            .filter(|t| t.owner_id.as_deref() == Some(owner))
                            .collect(),
                    ),
                    Err(e) => Attempt::failed(e.to_string()),
                }
            })
            .strategy("local", async {
                Attempt::Resolved(self.cached_for(owner.as_deref()))
            })
            .resolve()
            .await
            .value()
            .unwrap_or_default()
    }

    /// Remote-first lookup scoped to the current owner, then a cache scan
    pub async fn get_template(&self, id: &str) -> Option<FunnelTemplate> {
        let owner = self.backends.identity();

        FallbackChain::new("get_template")
            .strategy("remote", async {
                let Some(owner) = owner.as_deref() else {
                    return Attempt::miss("anonymous");
                };
                Attempt::from_lookup(
                    self.backends
                        .call(self.backends.remote.get_template(id, Some(owner)))
                        .await,
                )
            })
            .strategy("local", async {
                match self.backends.cache.find(id) {
                    Ok(Some(t)) if owner.as_deref().map_or(true, |o| t.visible_to(o)) => {
                        Attempt::Resolved(t)
                    }
                    Ok(_) => Attempt::miss("not cached"),
                    Err(e) => Attempt::failed(e.to_string()),
                }
            })
            .resolve()
            .await
            .value()
    }

    /// Persist a template and return it with its final id and timestamps
    ///
    /// Assigns an id when missing, keeps `created_at` once set and always
    /// bumps `last_modified_at`. Signed in, the remote store is written
    /// (update if the id exists for this owner, insert otherwise); any remote
    /// failure, or no identity, writes the cache instead. The returned value
    /// is what was written, so an immediate `get_template` agrees with it.
    pub async fn save_template(&self, template: FunnelTemplate) -> FunnelTemplate {
        let template = self.prepare(template);
        match self.write(&template).await {
            Some(saved) => saved,
            None => {
                error!(template_id = %template.id, "Template could not be persisted to any store");
                template
            }
        }
    }

    /// [`Self::save_template`] that yields `None` when no store accepted it
    pub(crate) async fn persist(&self, template: FunnelTemplate) -> Option<FunnelTemplate> {
        let template = self.prepare(template);
        self.write(&template).await
    }

    fn prepare(&self, mut template: FunnelTemplate) -> FunnelTemplate {
        if !template.has_id() {
            template.id = Uuid::new_v4().to_string();
        }
        let now = self.backends.clock.now();
        template.created_at.get_or_insert(now);
        template.last_modified_at = Some(now);

        if let Some(owner) = self.backends.identity() {
            template.owner_id = Some(owner);
        }
        template
    }

    async fn write(&self, template: &FunnelTemplate) -> Option<FunnelTemplate> {
        let owner = self.backends.identity();

        FallbackChain::new("save_template")
            .strategy("remote", async {
                let Some(owner) = owner.as_deref() else {
                    return Attempt::miss("anonymous");
                };
                match self.write_remote(template, owner).await {
                    Ok(written) => Attempt::Resolved(written),
                    Err(e) => Attempt::failed(e.to_string()),
                }
            })
            .strategy("local", async {
                match self.backends.cache.upsert(template) {
                    Ok(()) => Attempt::Resolved(template.clone()),
                    Err(e) => Attempt::failed(e.to_string()),
                }
            })
            .resolve()
            .await
            .value()
    }

    async fn write_remote(
        &self,
        template: &FunnelTemplate,
        owner: &str,
    ) -> RemoteResult<FunnelTemplate> {
        let existing = self
            .backends
            .call(self.backends.remote.get_template(&template.id, Some(owner)))
            .await?;

        match existing {
            Some(existing) => {
                let mut updated = template.clone();
                updated.created_at = existing.created_at.or(template.created_at);
                self.backends
                    .call(self.backends.remote.update_template(&updated))
                    .await?;
                debug!(template_id = %updated.id, "Updated remote template");
                Ok(updated)
            }
            None => {
                self.backends
                    .call(self.backends.remote.insert_template(template))
                    .await?;
                debug!(template_id = %template.id, "Inserted remote template");
                Ok(template.clone())
            }
        }
    }

    /// Remove a template from both stores
    ///
    /// The remote delete is best-effort. Returns true once the cache no
    /// longer holds `id`, whatever happened remotely.
    pub async fn delete_template(&self, id: &str) -> bool {
        if let Some(owner) = self.backends.identity() {
            match self
                .backends
                .call(self.backends.remote.delete_template(id, &owner))
                .await
            {
                Ok(removed) => debug!(template_id = %id, removed, "Remote delete finished"),
                Err(e) => {
                    warn!(
                        template_id = %id,
                        error = %e,
                        "Remote delete failed, deleting locally only"
                    )
                }
            }
        }

        match self.backends.cache.remove(id) {
            Ok(_) => true,
            Err(e) => {
                error!(template_id = %id, error = %e, "Local delete failed");
                false
            }
        }
    }

    /// Copy cache-only templates of the current identity into the remote store
    pub async fn migrate_on_sign_in(&self) -> MigrationReport {
        match self.backends.identity() {
            Some(owner) => self.migrate_for(&owner).await,
            None => {
                debug!("Migration requested without an identity");
                MigrationReport::default()
            }
        }
    }

    /// Sequential inserts; a failed insert leaves its id for the next pass.
    /// Inserted entries are re-cached under `owner`.
    async fn migrate_for(&self, owner: &str) -> MigrationReport {
        let cached = match self.backends.cache.load() {
            Ok(cached) => cached,
            Err(e) => {
                warn!(owner, error = %e, "Cache unreadable, migration skipped");
                return MigrationReport::default();
            }
        };
        if cached.is_empty() {
            return MigrationReport::default();
        }

        let remote = match self
            .backends
            .call(self.backends.remote.list_templates(owner))
            .await
        {
            Ok(remote) => remote,
            Err(e) => {
                warn!(owner, error = %e, "Remote unavailable, migration deferred");
                return MigrationReport::default();
            }
        };

        let (candidates, skipped) = migration::plan(cached, &remote, owner);
        let mut report = MigrationReport {
            skipped,
            ..MigrationReport::default()
        };

        for template in candidates {
            match self
                .backends
                .call(self.backends.remote.insert_template(&template))
                .await
            {
                Ok(()) => {
                    // The cache copy now belongs to `owner`, not to whoever signs in next
                    if let Err(e) = self.backends.cache.upsert(&template) {
                        warn!(
                            owner,
                            template_id = %template.id,
                            error = %e,
                            "Cache owner not updated"
                        );
                    }
                    report.inserted.push(template.id);
                }
                Err(e) => {
                    warn!(owner, template_id = %template.id, error = %e, "Migration insert failed");
                    report.failed.push(template.id);
                }
            }
        }

        info!(
            owner,
            inserted = report.inserted.len(),
            failed = report.failed.len(),
            skipped = report.skipped,
            "Migrated cached templates"
        );
        report
    }

    /// Apply an auth transition
    ///
    /// A sign-in that changes the identity runs exactly one migration. A
    /// sign-out moves no data.
    pub async fn handle_auth_event(&self, event: &AuthEvent) -> Option<MigrationReport> {
        match event {
            AuthEvent::SignedIn(owner) => {
                let transitioned = {
                    let mut state = self.state.lock();
                    let already = matches!(
                        &*state,
                        AuthState::Authenticated(current) if current == owner
                    );
                    *state = AuthState::Authenticated(owner.clone());
                    !already
                };
                if transitioned {
                    Some(self.migrate_for(owner).await)
                } else {
                    None
                }
            }
            AuthEvent::SignedOut => {
                *self.state.lock() = AuthState::Anonymous;
                None
            }
        }
    }

    /// Feed the auth signal's events into [`Self::handle_auth_event`]
    ///
    /// Subscribes before returning, so events published after this call are
    /// not missed. The task ends when the signal's sender is dropped.
    pub fn spawn_auth_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let mut events = self.backends.auth.subscribe();
        let coordinator = Arc::clone(self);

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        coordinator.handle_auth_event(&event).await;
                    }
                    Err(RecvError::Lagged(missed)) => {
                        warn!(missed, "Auth listener lagged behind");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    fn cached_for(&self, owner: Option<&str>) -> Vec<FunnelTemplate> {
        match self.backends.cache.load() {
            Ok(templates) => match owner {
                Some(owner) => templates.into_iter().filter(|t| t.visible_to(owner)).collect(),
                None => templates,
            },
            Err(e) => {
                warn!(error = %e, "Cache unreadable");
                Vec::new()
            }
        }
    }
}
