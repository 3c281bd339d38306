//! Timeline store integration tests
//!
//! - Create/audit pairing and the concrete create scenario
//! - Locked types reject edits and deletes without side effects
//! - No-op edits write nothing
//! - Edit + undo round trip, forward-only history
//! - Notifications follow commit order
//! - On-disk databases survive reopen

use pretty_assertions::assert_eq;
use rstest::rstest;
use tempfile::TempDir;

use lookout_core::change::{Change, ChangePayload};
use lookout_core::entities::AuditSnapshot;
use lookout_core::enums::{ChangeSource, EventType, MutationKind};
use lookout_core::ids::{PREFIX_AUDIT, PREFIX_EVENT, has_prefix};
use lookout_db::repos::audit::AuditQuery;
use lookout_db::service::TimelineStore;
use lookout_feed::ChangeFeed;

async fn test_store() -> TimelineStore {
    TimelineStore::new_local(":memory:", None).await.unwrap()
}

async fn test_store_with_feed() -> (TimelineStore, ChangeFeed) {
    let feed = ChangeFeed::default();
    let store = TimelineStore::new_local(":memory:", Some(feed.clone()))
        .await
        .unwrap();
    (store, feed)
}

async fn audit_count(store: &TimelineStore, group_id: &str) -> usize {
    store
        .list_audit(group_id, &AuditQuery::default())
        .await
        .unwrap()
        .entries
        .len()
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_report_missing_scenario() {
    let store = test_store().await;
    let e1 = store
        .create_event("g1", "u1", EventType::Missing, "Report Missing", None)
        .await
        .unwrap();

    assert!(has_prefix(&e1.id, PREFIX_EVENT));
    assert_eq!(e1.details, None);

    let events = store.list_by_group("g1").await.unwrap();
    assert_eq!(events, vec![e1.clone()]);

    let page = store.list_audit("g1", &AuditQuery::default()).await.unwrap();
    assert_eq!(page.entries.len(), 1);
    let entry = &page.entries[0];
    assert_eq!(entry.action, MutationKind::Insert);
    assert!(has_prefix(&entry.id, PREFIX_AUDIT));
    assert_eq!(entry.event_id, e1.id);
    assert_eq!(entry.old_data, None);
    assert_eq!(page.next_cursor, None);
}

#[tokio::test]
async fn every_create_pairs_with_one_insert_entry() {
    let store = test_store().await;
    let mut ids = Vec::new();
    for event_type in EventType::ALL {
        let event = store
            .create_event("g1", "u1", event_type, event_type.default_label(), Some("note"))
            .await
            .unwrap();
        ids.push(event.id);
    }

    let entries = store
        .list_audit("g1", &AuditQuery::default())
        .await
        .unwrap()
        .entries;
    assert_eq!(entries.len(), ids.len());
    for id in &ids {
        let matching: Vec<_> = entries.iter().filter(|e| &e.event_id == id).collect();
        assert_eq!(matching.len(), 1, "exactly one entry for {id}");
        assert_eq!(matching[0].action, MutationKind::Insert);
    }
}

#[tokio::test]
async fn list_is_most_recent_first() {
    let store = test_store().await;
    let first = store
        .create_event("g1", "u1", EventType::Missing, "Report Missing", None)
        .await
        .unwrap();
    let second = store
        .create_event("g1", "u2", EventType::Spotted, "Spotted At...", Some("Mall"))
        .await
        .unwrap();
    let ids: Vec<_> = store
        .list_by_group("g1")
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(ids, vec![second.id, first.id]);
}

#[tokio::test]
async fn interleaved_creates_stay_paired() {
    let store = test_store().await;
    let create = |actor: &'static str| {
        let store = &store;
        async move {
            store
                .create_event("g1", actor, EventType::Custom, "Custom", None)
                .await
                .unwrap()
        }
    };
    let (a, b, c, d) = tokio::join!(create("u1"), create("u2"), create("u3"), create("u4"));

    let events = store.list_by_group("g1").await.unwrap();
    assert_eq!(events.len(), 4);
    assert_eq!(audit_count(&store, "g1").await, 4);
    let mut stamps = vec![a.created_at, b.created_at, c.created_at, d.created_at];
    stamps.sort();
    stamps.dedup();
    assert_eq!(stamps.len(), 4, "commit timestamps are unique per group");
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

#[rstest]
#[case(EventType::Missing)]
#[case(EventType::Found)]
#[case(EventType::PoliceContacted)]
#[tokio::test]
async fn locked_types_reject_edits(#[case] event_type: EventType) {
    let store = test_store().await;
    let event = store
        .create_event("g1", "u1", event_type, event_type.default_label(), None)
        .await
        .unwrap();

    let err = store
        .update_details(&event.id, Some("u2"), "new text")
        .await
        .unwrap_err();
    assert!(err.is_policy(), "expected policy error, got {err}");

    assert_eq!(store.list_by_group("g1").await.unwrap(), vec![event]);
    assert_eq!(audit_count(&store, "g1").await, 1);
}

#[rstest]
#[case(EventType::Spotted)]
#[case(EventType::Contacted)]
#[case(EventType::Custom)]
#[tokio::test]
async fn mutable_types_accept_edits(#[case] event_type: EventType) {
    let store = test_store().await;
    let event = store
        .create_event("g1", "u1", event_type, event_type.default_label(), None)
        .await
        .unwrap();
    let updated = store
        .update_details(&event.id, Some("u2"), "Neighbour called")
        .await
        .unwrap();
    assert_eq!(updated.details.as_deref(), Some("Neighbour called"));
    assert_eq!(updated.created_at, event.created_at);
    assert_eq!(updated.label, event.label);
}

// ---------------------------------------------------------------------------
// No-op edits
// ---------------------------------------------------------------------------

#[tokio::test]
async fn same_details_write_nothing() {
    let (store, feed) = test_store_with_feed().await;
    let event = store
        .create_event("g1", "u1", EventType::Spotted, "Spotted At...", Some("Mall"))
        .await
        .unwrap();
    let mut sub = feed.subscribe("g1").unwrap();

    let unchanged = store
        .update_details(&event.id, Some("u1"), "Mall")
        .await
        .unwrap();

    assert_eq!(unchanged, event);
    assert_eq!(audit_count(&store, "g1").await, 1);
    assert!(sub.try_recv().unwrap().is_none(), "no-op must not notify");
}

// ---------------------------------------------------------------------------
// Undo
// ---------------------------------------------------------------------------

#[tokio::test]
async fn edit_and_undo_scenario() {
    let store = test_store().await;
    let e2 = store
        .create_event("g1", "u1", EventType::Spotted, "Spotted At...", Some("Mall"))
        .await
        .unwrap();

    let edited = store
        .update_details(&e2.id, Some("u1"), "Downtown")
        .await
        .unwrap();
    assert_eq!(edited.details.as_deref(), Some("Downtown"));

    let edit_entry = store.list_audit_for_event(&e2.id).await.unwrap().remove(0);
    assert_eq!(edit_entry.action, MutationKind::Update);
    assert_eq!(edit_entry.old_data, Some(AuditSnapshot::details(Some("Mall"))));
    assert_eq!(edit_entry.new_data, Some(AuditSnapshot::details(Some("Downtown"))));
    assert!(edit_entry.is_undoable());

    let restored = store.undo(Some("u1"), &edit_entry).await.unwrap();
    assert_eq!(restored.details.as_deref(), Some("Mall"));
    assert_eq!(store.get_event(&e2.id).await.unwrap().details.as_deref(), Some("Mall"));

    let history = store.list_audit_for_event(&e2.id).await.unwrap();
    assert_eq!(history.len(), 3);
    let undo_entry = &history[0];
    assert_eq!(undo_entry.action, MutationKind::Update);
    assert_eq!(undo_entry.old_data, Some(AuditSnapshot::details(Some("Downtown"))));
    assert_eq!(undo_entry.new_data, Some(AuditSnapshot::details(Some("Mall"))));
    // The original edit entry is untouched.
    assert_eq!(history[1], edit_entry);
}

#[tokio::test]
async fn undo_restores_value_before_that_edit() {
    let store = test_store().await;
    let event = store
        .create_event("g1", "u1", EventType::Contacted, "Contacted...", Some("A"))
        .await
        .unwrap();
    store.update_details(&event.id, Some("u1"), "B").await.unwrap();
    store.update_details(&event.id, Some("u2"), "X").await.unwrap();

    let x_entry = store.list_audit_for_event(&event.id).await.unwrap().remove(0);
    let restored = store.undo_by_id(Some("u1"), &x_entry.id).await.unwrap();
    assert_eq!(restored.details.as_deref(), Some("B"));
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[tokio::test]
async fn delete_keeps_full_row_in_audit() {
    let store = test_store().await;
    let event = store
        .create_event("g1", "u1", EventType::Custom, "Checked hospitals", Some("None found"))
        .await
        .unwrap();
    store.delete_event(&event.id, None).await.unwrap();

    assert!(store.list_by_group("g1").await.unwrap().is_empty());
    assert!(store.get_event(&event.id).await.unwrap_err().is_not_found());

    let entry = store.list_audit_for_event(&event.id).await.unwrap().remove(0);
    assert_eq!(entry.action, MutationKind::Delete);
    assert_eq!(entry.actor_id, None);
    assert_eq!(entry.old_data, Some(AuditSnapshot::Event(event)));
    assert_eq!(entry.new_data, None);
    assert!(!entry.is_undoable());
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[tokio::test]
async fn mutations_publish_event_then_audit_change() {
    let (store, feed) = test_store_with_feed().await;
    let mut sub = feed.subscribe("g1").unwrap();

    let event = store
        .create_event("g1", "u1", EventType::Spotted, "Spotted At...", Some("Mall"))
        .await
        .unwrap();
    store
        .update_details(&event.id, Some("u2"), "Downtown")
        .await
        .unwrap();

    let changes: Vec<Change> = std::iter::from_fn(|| sub.try_recv().unwrap()).collect();
    let kinds: Vec<_> = changes.iter().map(|c| (c.source(), c.op())).collect();
    assert_eq!(
        kinds,
        vec![
            (ChangeSource::Events, MutationKind::Insert),
            (ChangeSource::Audit, MutationKind::Insert),
            (ChangeSource::Events, MutationKind::Update),
            (ChangeSource::Audit, MutationKind::Insert),
        ]
    );
    match &changes[2].payload {
        ChangePayload::Events { old, new, .. } => {
            assert_eq!(old.as_ref().and_then(|e| e.details.as_deref()), Some("Mall"));
            assert_eq!(new.as_ref().and_then(|e| e.details.as_deref()), Some("Downtown"));
        }
        other => panic!("expected events payload, got {other:?}"),
    }
}

#[tokio::test]
async fn failed_mutation_publishes_nothing() {
    let (store, feed) = test_store_with_feed().await;
    let event = store
        .create_event("g1", "u1", EventType::Found, "Found", None)
        .await
        .unwrap();
    let mut sub = feed.subscribe("g1").unwrap();

    assert!(store.update_details(&event.id, Some("u1"), "x").await.is_err());
    assert!(store.delete_event(&event.id, Some("u1")).await.is_err());
    assert!(sub.try_recv().unwrap().is_none());
}

#[tokio::test]
async fn other_groups_are_not_notified() {
    let (store, feed) = test_store_with_feed().await;
    let mut g2 = feed.subscribe("g2").unwrap();
    store
        .create_event("g1", "u1", EventType::Missing, "Report Missing", None)
        .await
        .unwrap();
    assert!(g2.try_recv().unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[tokio::test]
async fn file_database_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("timeline.db");
    let path = path.to_str().unwrap();

    let created = {
        let store = TimelineStore::new_local(path, None).await.unwrap();
        store
            .create_event("g1", "u1", EventType::Spotted, "Spotted At...", Some("Mall"))
            .await
            .unwrap()
    };

    let store = TimelineStore::new_local(path, None).await.unwrap();
    assert_eq!(store.list_by_group("g1").await.unwrap(), vec![created.clone()]);

    let later = store
        .create_event("g1", "u1", EventType::Found, "Found", None)
        .await
        .unwrap();
    assert!(later.created_at > created.created_at);
}
