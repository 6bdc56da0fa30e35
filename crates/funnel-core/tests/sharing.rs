//! Share-token issuance, validation and redemption

mod common;

use std::sync::Arc;

use chrono::Duration;
use common::{template, Harness};
use funnel_core::sharing::TokenGenerator;
use funnel_core::{
    Backends, FunnelCore, LocalCache, RemoteStore, SessionAuth, SharingError, UsageAction,
};
use funnel_store::{MemoryCache, RemoteOp};
use parking_lot::Mutex;

/// Hands out a fixed sequence of values, then repeats the last one
struct ScriptedGenerator {
    values: Mutex<Vec<&'static str>>,
}

impl ScriptedGenerator {
    fn new(mut values: Vec<&'static str>) -> Self {
        values.reverse();
        Self {
            values: Mutex::new(values),
        }
    }
}

impl TokenGenerator for ScriptedGenerator {
    fn generate(&self, _length: usize) -> String {
        let mut values = self.values.lock();
        if values.len() > 1 {
            values.pop().unwrap_or_default().to_string()
        } else {
            values.last().copied().unwrap_or_default().to_string()
        }
    }
}

fn scripted_core(harness: &Harness, owner: &str, values: Vec<&'static str>) -> FunnelCore {
    let backends = Backends::new(
        Arc::new(harness.remote.clone()),
        Arc::new(harness.remote.clone()),
        Arc::new(MemoryCache::new()),
        Arc::new(SessionAuth::signed_in(owner)),
    )
    .with_clock(harness.clock.clone());
    FunnelCore::with_generator(
        &harness.config,
        backends,
        Arc::new(ScriptedGenerator::new(values)),
    )
}

#[tokio::test]
async fn test_issue_validate_expire_redeem() {
    let harness = Harness::new();
    let alice = harness.device_for("alice");
    let bob = harness.device_for("bob");
    let source = alice.core.save_template(template("Webinar", 3)).await;

    let token = alice.core.issue_token(&source.id, Some(1)).await.unwrap();
    assert_eq!(token.len(), harness.config.sharing.token_length);

    let validation = bob.core.validate_token(&token).await;
    assert!(validation.valid);
    assert_eq!(validation.funnel_id.as_deref(), Some(source.id.as_str()));
    assert_eq!(validation.snapshot.as_ref().map(|s| s.steps.len()), Some(3));

    let redemption = bob.core.redeem(&token).await;
    assert!(redemption.success, "{}", redemption.message);
    assert!(!redemption.needs_repair);
    assert_eq!(redemption.steps_copied, 3);

    let copy_id = redemption.funnel_id.unwrap();
    let copy = bob.core.get_template(&copy_id).await.unwrap();
    assert_eq!(copy.owner_id.as_deref(), Some("bob"));
    assert_eq!(copy.steps, source.steps);
    assert_eq!(copy.source_funnel_id.as_deref(), Some(source.id.as_str()));

    harness.clock.advance(Duration::days(1) + Duration::seconds(1));
    let validation = bob.core.validate_token(&token).await;
    assert!(!validation.valid);
    assert!(validation.message.unwrap().contains("expired"));
    assert_eq!(validation.error, Some(SharingError::Expired));
}

#[tokio::test]
async fn test_snapshot_is_immutable() {
    let harness = Harness::new();
    let alice = harness.device_for("alice");
    let source = alice.core.save_template(template("Original", 2)).await;
    let token = alice.core.issue_token(&source.id, None).await.unwrap();

    let mut edited = source.clone();
    edited.title = "Rewritten".to_string();
    edited.steps.truncate(1);
    alice.core.save_template(edited).await;

    let snapshot = alice.core.validate_token(&token).await.snapshot.unwrap();
    assert_eq!(snapshot.title, "Original");
    assert_eq!(snapshot.steps, source.steps);
}

#[tokio::test]
async fn test_expired_active_token_never_validates() {
    let harness = Harness::new();
    let alice = harness.device_for("alice");
    let source = alice.core.save_template(template("Short lived", 1)).await;
    let token = alice.core.issue_token(&source.id, Some(2)).await.unwrap();

    harness.clock.advance(Duration::days(3));
    assert!(harness.remote.tokens()[0].is_active);
    assert!(!alice.core.validate_token(&token).await.valid);

    // The procedure path applies expiry too
    harness.remote.fail_op(RemoteOp::FindToken);
    assert!(!alice.core.validate_token(&token).await.valid);

    let redemption = alice.core.redeem(&token).await;
    assert!(!redemption.success);
}

#[tokio::test]
async fn test_issue_rejects_bad_arguments() {
    let harness = Harness::new();
    let alice = harness.device_for("alice");
    let source = alice.core.save_template(template("Launch", 1)).await;

    for days in [Some(0), Some(-3), Some(366)] {
        let err = alice.core.issue_token(&source.id, days).await.unwrap_err();
        assert!(matches!(err, SharingError::InvalidArgument(_)), "{:?}", days);
    }
    let err = alice.core.issue_token("  ", None).await.unwrap_err();
    assert!(matches!(err, SharingError::InvalidArgument(_)));

    let err = alice.core.issue_token("missing", None).await.unwrap_err();
    assert!(matches!(err, SharingError::NotFound(_)));

    let anonymous = harness.anonymous_device();
    let err = anonymous.core.issue_token(&source.id, None).await.unwrap_err();
    assert!(matches!(err, SharingError::Unauthenticated(_)));

    assert!(harness.remote.tokens().is_empty());
}

#[tokio::test]
async fn test_token_write_failure_is_fatal() {
    let harness = Harness::new();
    let alice = harness.device_for("alice");
    let source = alice.core.save_template(template("Launch", 1)).await;

    harness.remote.fail_op(RemoteOp::InsertShareToken);
    let err = alice.core.issue_token(&source.id, None).await.unwrap_err();
    assert!(matches!(err, SharingError::TransientBackendFailure(_)));
    assert!(harness.remote.tokens().is_empty());
}

#[tokio::test]
async fn test_colliding_token_value_is_regenerated() {
    let harness = Harness::new();
    let first = scripted_core(&harness, "alice", vec!["TAKENVALUE01"]);
    let source = first.save_template(template("Launch", 1)).await;
    assert_eq!(first.issue_token(&source.id, None).await.unwrap(), "TAKENVALUE01");

    let retrying = scripted_core(&harness, "alice", vec!["TAKENVALUE01", "FRESHVALUE02"]);
    assert_eq!(
        retrying.issue_token(&source.id, None).await.unwrap(),
        "FRESHVALUE02"
    );

    let stuck = scripted_core(&harness, "alice", vec!["TAKENVALUE01"]);
    let err = stuck.issue_token(&source.id, None).await.unwrap_err();
    assert!(matches!(err, SharingError::TransientBackendFailure(_)));
    assert_eq!(harness.remote.tokens().len(), 2);
}

#[tokio::test]
async fn test_validation_falls_back_to_procedure() {
    let harness = Harness::new();
    let alice = harness.device_for("alice");
    let source = alice.core.save_template(template("Launch", 2)).await;
    let token = alice.core.issue_token(&source.id, None).await.unwrap();

    harness.remote.fail_op(RemoteOp::FindToken);
    let validation = alice.core.validate_token(&token).await;
    assert!(validation.valid);
    assert_eq!(validation.snapshot.unwrap().steps.len(), 2);
}

#[tokio::test]
async fn test_validation_failure_classes() {
    let harness = Harness::new();
    let alice = harness.device_for("alice");

    let unknown = alice.core.validate_token("doesnotexist").await;
    assert!(!unknown.valid);
    assert!(unknown.message.unwrap().contains("invalid or expired"));
    assert!(matches!(unknown.error, Some(SharingError::NotFound(_))));

    let empty = alice.core.validate_token("   ").await;
    assert!(!empty.valid);

    harness.remote.set_unavailable(Some("outage"));
    let outage = alice.core.validate_token("doesnotexist").await;
    assert!(!outage.valid);
    assert!(matches!(
        outage.error,
        Some(SharingError::TransientBackendFailure(_))
    ));
}

#[tokio::test]
async fn test_usage_is_recorded_best_effort() {
    let harness = Harness::new();
    let alice = harness.device_for("alice");
    let bob = harness.device_for("bob");
    let source = alice.core.save_template(template("Launch", 1)).await;
    let token = alice.core.issue_token(&source.id, None).await.unwrap();

    assert!(bob.core.validate_token(&token).await.valid);
    assert!(bob.core.redeem(&token).await.success);

    let token_id = harness.remote.tokens()[0].id.clone();
    let usage = alice.core.token_usage(&token_id).await;
    let actions: Vec<UsageAction> = usage.iter().map(|r| r.action).collect();
    assert_eq!(
        actions,
        [UsageAction::View, UsageAction::View, UsageAction::Copy]
    );
    assert!(usage.iter().all(|r| r.used_by.as_deref() == Some("bob")));

    harness.remote.fail_op(RemoteOp::AppendUsage);
    assert!(bob.core.validate_token(&token).await.valid);
    assert!(bob.core.redeem(&token).await.success);
}

#[tokio::test]
async fn test_anonymous_redemption_lands_in_cache() {
    let harness = Harness::new();
    let alice = harness.device_for("alice");
    let source = alice.core.save_template(template("Launch", 4)).await;
    let token = alice.core.issue_token(&source.id, None).await.unwrap();

    let guest = harness.anonymous_device();
    let redemption = guest.core.redeem(&token).await;
    assert!(redemption.success);
    assert_eq!(redemption.steps_copied, 4);

    let copy_id = redemption.funnel_id.unwrap();
    let cached = guest.cache.find(&copy_id).unwrap().unwrap();
    assert_eq!(cached.owner_id, None);
    assert_eq!(cached.steps, source.steps);

    guest.session.sign_in("carol");
    let report = guest.core.migrate_on_sign_in().await;
    assert_eq!(report.inserted, vec![copy_id.clone()]);
    let migrated = harness.remote.get_template(&copy_id, Some("carol")).await.unwrap();
    assert_eq!(migrated.map(|t| t.steps.len()), Some(4));
}

#[tokio::test]
async fn test_redemption_fails_when_copy_cannot_be_saved() {
    let harness = Harness::new();
    let alice = harness.device_for("alice");
    let source = alice.core.save_template(template("Launch", 2)).await;
    let token = alice.core.issue_token(&source.id, None).await.unwrap();

    let guest = harness.anonymous_device();
    guest.cache.set_fail_writes(true);
    let redemption = guest.core.redeem(&token).await;
    assert!(!redemption.success);
    assert_eq!(redemption.funnel_id, None);
    assert!(guest.cache.templates().is_empty());
    assert_eq!(harness.remote.templates().len(), 1);
    assert!(harness
        .remote
        .usage()
        .iter()
        .all(|r| r.action != UsageAction::Copy));

    guest.cache.set_fail_writes(false);
    assert!(guest.core.redeem(&token).await.success);
}

#[tokio::test]
async fn test_empty_snapshot_is_flagged_not_lost() {
    let harness = Harness::new();
    let alice = harness.device_for("alice");
    let bob = harness.device_for("bob");
    let source = alice.core.save_template(template("Launch", 3)).await;

    harness.remote.set_drop_snapshot_steps(true);
    let token = alice.core.issue_token(&source.id, None).await.unwrap();
    harness.remote.set_drop_snapshot_steps(false);

    // The atomic procedure copies the empty snapshot as-is
    let redemption = bob.core.redeem(&token).await;
    assert!(redemption.success);
    assert!(redemption.needs_repair);
    assert_eq!(redemption.steps_copied, 0);
    assert_eq!(redemption.steps_expected, 3);
    assert_eq!(
        redemption.incomplete(),
        Some(SharingError::IncompleteCopy {
            copied: 0,
            expected: 3
        })
    );
}

#[tokio::test]
async fn test_manual_copy_recovers_steps_from_source() {
    let harness = Harness::new();
    let alice = harness.device_for("alice");
    let bob = harness.device_for("bob");
    let source = alice.core.save_template(template("Launch", 3)).await;

    harness.remote.set_drop_snapshot_steps(true);
    let token = alice.core.issue_token(&source.id, None).await.unwrap();
    harness.remote.set_procedures_enabled(false);

    let redemption = bob.core.redeem(&token).await;
    assert!(redemption.success);
    assert!(!redemption.needs_repair);
    assert_eq!(redemption.steps_copied, 3);

    let copy = bob
        .core
        .get_template(&redemption.funnel_id.unwrap())
        .await
        .unwrap();
    assert_eq!(copy.steps, source.steps);
    assert_eq!(copy.owner_id.as_deref(), Some("bob"));
}

#[tokio::test]
async fn test_manual_copy_without_procedures_keeps_order() {
    let harness = Harness::new();
    let alice = harness.device_for("alice");
    let bob = harness.device_for("bob");
    let source = alice.core.save_template(template("Ordered", 5)).await;
    let token = alice.core.issue_token(&source.id, Some(30)).await.unwrap();

    harness.remote.set_procedures_enabled(false);
    let redemption = bob.core.redeem(&token).await;
    let copy = bob
        .core
        .get_template(&redemption.funnel_id.unwrap())
        .await
        .unwrap();
    let names: Vec<&str> = copy.steps.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["Step 1", "Step 2", "Step 3", "Step 4", "Step 5"]);
}

#[tokio::test]
async fn test_deactivation() {
    let harness = Harness::new();
    let alice = harness.device_for("alice");
    let bob = harness.device_for("bob");
    let source = alice.core.save_template(template("Launch", 1)).await;
    let token = alice.core.issue_token(&source.id, None).await.unwrap();

    let err = bob.core.deactivate_token(&token).await.unwrap_err();
    assert!(matches!(err, SharingError::InvalidArgument(_)));

    alice.core.deactivate_token(&token).await.unwrap();
    assert!(!bob.core.validate_token(&token).await.valid);
    assert!(!bob.core.redeem(&token).await.success);

    // Already inactive is fine
    alice.core.deactivate_token(&token).await.unwrap();

    let issued = alice.core.list_issued_tokens(&source.id).await.unwrap();
    assert_eq!(issued.len(), 1);
    assert!(!issued[0].is_active);
    assert!(bob.core.list_issued_tokens(&source.id).await.unwrap().is_empty());

    let err = alice.core.deactivate_token("unknown").await.unwrap_err();
    assert!(matches!(err, SharingError::NotFound(_)));
}
