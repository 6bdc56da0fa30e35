//! Funnel Data Model
//!
//! Records shared by both stores and by the sharing subsystem:
//!
//! - [`FunnelTemplate`] - a named, ordered pipeline definition
//! - [`TemplateSnapshot`] - the write-once copy embedded in a share token
//! - [`ShareToken`] - capability granting read-and-copy access to a snapshot
//! - [`TokenUsageRecord`] - append-only audit event
//!
//! Field names serialize in camelCase so the local blob and the remote rows
//! share one shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque template identifier
pub type TemplateId = String;

/// Identity of an authenticated user
pub type OwnerId = String;

// ============================================================================
// Templates
// ============================================================================

/// One step of a funnel
///
/// Steps are opaque structured records; only the type tag and display name
/// are interpreted. Everything else rides along in `config` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelStep {
    /// Step type tag
    #[serde(rename = "type")]
    pub kind: String,

    /// Display name
    pub name: String,

    /// Remaining step fields, preserved verbatim
    #[serde(flatten)]
    pub config: Map<String, Value>,
}

impl FunnelStep {
    /// Create a step with no extra configuration
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            config: Map::new(),
        }
    }

    /// Builder-style: attach an extra field
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.config.insert(key.into(), value);
        self
    }
}

/// A saved, reusable funnel definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunnelTemplate {
    /// Empty until the first save assigns one
    #[serde(default)]
    pub id: TemplateId,

    /// `None` for cache-only templates that were never synced
    #[serde(default)]
    pub owner_id: Option<OwnerId>,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Category tag
    #[serde(default, rename = "type")]
    pub kind: String,

    /// Symbolic icon name
    #[serde(default = "default_icon")]
    pub icon: String,

    /// Order is significant
    #[serde(default)]
    pub steps: Vec<FunnelStep>,

    /// Template this one was copied from by redemption
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_funnel_id: Option<TemplateId>,

    /// Immutable once set
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub last_modified_at: Option<DateTime<Utc>>,
}

fn default_icon() -> String {
    "funnel".to_string()
}

impl FunnelTemplate {
    /// Create an unsaved template with placeholder metadata
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Builder-style: set the id
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Builder-style: set the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder-style: set the category tag
    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    /// Builder-style: set the steps
    #[must_use]
    pub fn with_steps(mut self, steps: Vec<FunnelStep>) -> Self {
        self.steps = steps;
        self
    }

    /// Builder-style: set the owner
    #[must_use]
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner_id = Some(owner.into());
        self
    }

    /// Whether a save has assigned an id
    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }

    /// Whether `owner` may see this template
    ///
    /// Cache-only templates with no owner are visible to everyone on the device.
    pub fn visible_to(&self, owner: &str) -> bool {
        self.owner_id.as_deref().map_or(true, |o| o == owner)
    }

    /// Build a template from a snapshot, owned by `owner`
    pub fn from_snapshot(
        snapshot: &TemplateSnapshot,
        owner: Option<OwnerId>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            id: String::new(),
            owner_id: owner,
            title: snapshot.title.clone(),
            description: snapshot.description.clone(),
            kind: snapshot.kind.clone(),
            icon: snapshot.icon.clone(),
            steps: snapshot.steps.clone(),
            source_funnel_id: Some(source.into()),
            created_at: None,
            last_modified_at: None,
        }
    }
}

impl Default for FunnelTemplate {
    fn default() -> Self {
        Self {
            id: String::new(),
            owner_id: None,
            title: String::new(),
            description: String::new(),
            kind: String::new(),
            icon: default_icon(),
            steps: Vec::new(),
            source_funnel_id: None,
            created_at: None,
            last_modified_at: None,
        }
    }
}

// ============================================================================
// Sharing
// ============================================================================

/// Immutable copy of a template's content, captured at issuance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSnapshot {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default = "default_icon")]
    pub icon: String,
    #[serde(default)]
    pub steps: Vec<FunnelStep>,
}

impl From<&FunnelTemplate> for TemplateSnapshot {
    fn from(template: &FunnelTemplate) -> Self {
        Self {
            title: template.title.clone(),
            description: template.description.clone(),
            kind: template.kind.clone(),
            icon: template.icon.clone(),
            steps: template.steps.clone(),
        }
    }
}

/// A capability granting read-and-copy access to a frozen snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareToken {
    /// Storage-internal id
    pub id: String,

    /// Lookup key handed to recipients
    pub token_value: String,

    /// Source template at issuance time
    pub funnel_id: TemplateId,

    pub created_by: OwnerId,
    pub created_at: DateTime<Utc>,

    /// `None` means the token never expires
    pub expires_at: Option<DateTime<Utc>>,

    /// Once false, permanently invalid
    pub is_active: bool,

    /// Write-once
    pub snapshot: TemplateSnapshot,
}

impl ShareToken {
    /// Whether the token is past its expiry at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }

    /// Whether the token can currently be honoured
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && !self.is_expired_at(now)
    }
}

/// What a token was used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageAction {
    View,
    Copy,
}

/// Append-only token usage event, used for audit only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsageRecord {
    pub token_id: String,

    /// `None` when the token was used before signing in
    pub used_by: Option<OwnerId>,

    pub used_at: DateTime<Utc>,
    pub action: UsageAction,
}

// ============================================================================
// Remote procedure results
// ============================================================================

/// A token resolved to its bound snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedToken {
    pub token_id: String,
    pub funnel_id: TemplateId,
    pub snapshot: TemplateSnapshot,
}

impl From<&ShareToken> for ResolvedToken {
    fn from(token: &ShareToken) -> Self {
        Self {
            token_id: token.id.clone(),
            funnel_id: token.funnel_id.clone(),
            snapshot: token.snapshot.clone(),
        }
    }
}

/// Result of the atomic copy-from-token procedure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyOutcome {
    pub funnel_id: TemplateId,
    pub steps_copied: usize,
}

/// Result of the empty-copy repair procedure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairOutcome {
    pub steps_count: usize,
}

/// A template whose copied content is missing relative to its source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsistencyIssue {
    pub funnel_id: TemplateId,
    pub issue: String,
}
