use chrono::{DateTime, Duration, TimeZone, Utc};
use std::cell::Cell;
use taskflow_core::{
    KeyValueStorage, LoadOutcome, ManualClock, MemoryStorage, RestoreOutcome,
    SequentialIdGenerator, StorageError, StorageResult, StoreConfig, Task, TaskEvent, TaskId,
    TaskIdGenerator, TaskStore, TaskStoreError, DEFAULT_STORAGE_KEY, MAX_TASKS,
};

type TestStore<'s> = TaskStore<&'s MemoryStorage, SequentialIdGenerator, ManualClock>;

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 4, 12, 0, 0).unwrap()
}

fn open_store<'s>(storage: &'s MemoryStorage, clock: &ManualClock) -> TestStore<'s> {
    TaskStore::open(
        storage,
        StoreConfig::default(),
        SequentialIdGenerator::new("t"),
        clock.clone(),
    )
    .unwrap()
}

fn persisted(storage: &MemoryStorage) -> Vec<Task> {
    let raw = storage.get(DEFAULT_STORAGE_KEY).unwrap().unwrap();
    serde_json::from_str(&raw).unwrap()
}

#[test]
fn add_trims_capitalizes_and_persists() {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(start());
    let mut store = open_store(&storage, &clock);

    assert!(store.add("  buy milk").unwrap());

    assert_eq!(store.count(), 1);
    let task = &store.tasks()[0];
    assert_eq!(task.text, "Buy milk");
    assert_eq!(task.id.as_str(), "t-1");
    assert!(!task.completed);
    assert_eq!(task.created_at, start());
    assert_eq!(persisted(&storage), store.tasks());
}

#[test]
fn add_emits_notification_with_final_text() {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(start());
    let mut store = open_store(&storage, &clock);

    store.add("call mom").unwrap();

    let events = store.take_events();
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], TaskEvent::Added { task } if task.text == "Call mom"));
    assert!(store.take_events().is_empty());
}

#[test]
fn add_rejects_blank_text_without_writing() {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(start());
    let mut store = open_store(&storage, &clock);

    assert!(!store.add("").unwrap());
    assert!(!store.add(" \n\t ").unwrap());

    assert_eq!(store.count(), 0);
    assert_eq!(storage.write_count(), 0);
    assert!(store.take_events().is_empty());
}

#[test]
fn add_stops_at_task_limit() {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(start());
    let mut store = open_store(&storage, &clock);

    for n in 0..MAX_TASKS {
        assert!(store.add(&format!("task {n}")).unwrap());
        clock.advance(Duration::milliseconds(1));
    }
    assert!(store.is_at_limit());
    let writes = storage.write_count();

    assert!(!store.add("anything").unwrap());
    assert_eq!(store.count(), 10);
    assert_eq!(store.max(), 10);
    assert_eq!(storage.write_count(), writes);
}

#[test]
fn toggle_twice_restores_original_state() {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(start());
    let mut store = open_store(&storage, &clock);
    store.add("x").unwrap();
    let before = store.tasks()[0].clone();

    store.toggle(&before.id).unwrap();
    let toggled = store.get(&before.id).unwrap().clone();
    assert!(toggled.completed);
    assert_eq!(toggled.text, before.text);
    assert_eq!(toggled.created_at, before.created_at);
    assert!(persisted(&storage)[0].completed);

    store.toggle(&before.id).unwrap();
    assert_eq!(store.get(&before.id).unwrap(), &before);
}

#[test]
fn toggle_unknown_id_is_a_silent_noop() {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(start());
    let mut store = open_store(&storage, &clock);
    store.add("x").unwrap();
    let writes = storage.write_count();

    store.toggle(&TaskId::new("missing")).unwrap();

    assert!(!store.tasks()[0].completed);
    assert_eq!(storage.write_count(), writes);
}

#[test]
fn edit_changes_only_target_text() {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(start());
    let mut store = open_store(&storage, &clock);
    store.add("first").unwrap();
    store.add("second").unwrap();
    let untouched = store.tasks()[0].clone();
    let target = store.tasks()[1].clone();

    assert!(store.edit(&target.id, "  rewritten ").unwrap());

    let edited = store.get(&target.id).unwrap();
    assert_eq!(edited.text, "Rewritten");
    assert_eq!(edited.completed, target.completed);
    assert_eq!(edited.created_at, target.created_at);
    assert_eq!(store.get(&untouched.id).unwrap(), &untouched);
    assert_eq!(persisted(&storage), store.tasks());
}

#[test]
fn edit_rejects_blank_text_and_unknown_ids() {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(start());
    let mut store = open_store(&storage, &clock);
    store.add("keep me").unwrap();
    store.take_events();
    let id = store.tasks()[0].id.clone();
    let writes = storage.write_count();

    assert!(!store.edit(&id, "   ").unwrap());
    assert!(!store.edit(&TaskId::new("missing"), "new text").unwrap());

    assert_eq!(store.tasks()[0].text, "Keep me");
    assert_eq!(storage.write_count(), writes);
    assert!(store.take_events().is_empty());
}

#[test]
fn remove_drops_exactly_one_task() {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(start());
    let mut store = open_store(&storage, &clock);
    store.add("a").unwrap();
    store.add("b").unwrap();
    store.add("c").unwrap();
    let victim = store.tasks()[1].id.clone();

    store.remove(&victim).unwrap();

    assert_eq!(store.count(), 2);
    assert!(store.get(&victim).is_none());
    let texts: Vec<&str> = store.tasks().iter().map(|t| t.text.as_str()).collect();
    assert_eq!(texts, ["A", "C"]);
    assert_eq!(persisted(&storage).len(), 2);
}

#[test]
fn remove_unknown_id_leaves_collection_unchanged() {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(start());
    let mut store = open_store(&storage, &clock);
    store.add("a").unwrap();
    store.take_events();
    let writes = storage.write_count();

    store.remove(&TaskId::new("missing")).unwrap();

    assert_eq!(store.count(), 1);
    assert_eq!(storage.write_count(), writes);
    assert!(store.take_events().is_empty());
}

#[test]
fn remove_emits_undo_deadline_from_config() {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(start());
    let mut store = open_store(&storage, &clock);
    store.add("x").unwrap();
    store.take_events();
    let id = store.tasks()[0].id.clone();

    store.remove(&id).unwrap();

    let events = store.take_events();
    match &events[..] {
        [TaskEvent::Removed {
            task,
            undoable_until,
        }] => {
            assert_eq!(task.id, id);
            assert_eq!(*undoable_until, start() + Duration::seconds(5));
        }
        other => panic!("unexpected events: {other:?}"),
    }
}

#[test]
fn restore_within_window_reinserts_identical_task() {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(start());
    let mut store = open_store(&storage, &clock);
    store.add("x").unwrap();
    let id = store.tasks()[0].id.clone();
    store.toggle(&id).unwrap();
    let original = store.tasks()[0].clone();

    store.remove(&id).unwrap();
    clock.advance(Duration::seconds(4));
    assert_eq!(store.latest_undoable().map(|(t, _)| &t.id), Some(&id));

    assert_eq!(store.restore(&id).unwrap(), RestoreOutcome::Restored);
    assert_eq!(store.tasks(), &[original.clone()]);
    assert_eq!(persisted(&storage), vec![original]);
    assert_eq!(store.restore(&id).unwrap(), RestoreOutcome::NotPending);
}

#[test]
fn restore_appends_after_tasks_added_meanwhile() {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(start());
    let mut store = open_store(&storage, &clock);
    store.add("old").unwrap();
    let id = store.tasks()[0].id.clone();

    store.remove(&id).unwrap();
    store.add("new").unwrap();
    store.restore(&id).unwrap();

    let texts: Vec<&str> = store.tasks().iter().map(|t| t.text.as_str()).collect();
    assert_eq!(texts, ["New", "Old"]);
}

#[test]
fn restore_after_window_is_expired_and_permanent() {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(start());
    let mut store = open_store(&storage, &clock);
    store.add("x").unwrap();
    let id = store.tasks()[0].id.clone();

    store.remove(&id).unwrap();
    clock.advance(Duration::seconds(5) + Duration::milliseconds(1));

    assert!(store.latest_undoable().is_none());
    assert_eq!(store.restore(&id).unwrap(), RestoreOutcome::Expired);
    assert_eq!(store.restore(&id).unwrap(), RestoreOutcome::NotPending);
    assert_eq!(store.count(), 0);
}

#[test]
fn restore_never_exceeds_task_limit() {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(start());
    let mut store = open_store(&storage, &clock);
    for n in 0..MAX_TASKS {
        store.add(&format!("task {n}")).unwrap();
    }
    let id = store.tasks()[0].id.clone();
    store.remove(&id).unwrap();
    store.add("replacement").unwrap();

    assert_eq!(store.restore(&id).unwrap(), RestoreOutcome::AtLimit);
    assert_eq!(store.count(), MAX_TASKS);

    let other = store.tasks()[0].id.clone();
    store.remove(&other).unwrap();
    assert_eq!(store.restore(&id).unwrap(), RestoreOutcome::Restored);
    assert_eq!(store.count(), MAX_TASKS);
}

#[test]
fn expire_undo_drops_only_closed_windows() {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(start());
    let mut store = open_store(&storage, &clock);
    store.add("first").unwrap();
    store.add("second").unwrap();
    let first = store.tasks()[0].id.clone();
    let second = store.tasks()[1].id.clone();

    store.remove(&first).unwrap();
    clock.advance(Duration::seconds(3));
    store.remove(&second).unwrap();
    clock.advance(Duration::seconds(3));

    store.expire_undo();

    assert_eq!(store.restore(&first).unwrap(), RestoreOutcome::NotPending);
    assert_eq!(store.latest_undoable().map(|(t, _)| &t.id), Some(&second));
    assert_eq!(store.restore(&second).unwrap(), RestoreOutcome::Restored);
}

#[test]
fn load_forgets_pending_removals_and_queued_events() {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(start());
    let mut store = open_store(&storage, &clock);
    store.add("x").unwrap();
    let id = store.tasks()[0].id.clone();
    store.remove(&id).unwrap();

    assert_eq!(store.load().unwrap(), LoadOutcome::Loaded(0));

    assert!(store.latest_undoable().is_none());
    assert!(store.take_events().is_empty());
    assert_eq!(store.restore(&id).unwrap(), RestoreOutcome::NotPending);
    assert_eq!(store.count(), 0);
}

#[test]
fn tasks_newest_first_orders_by_creation_time() {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(start());
    let mut store = open_store(&storage, &clock);
    store.add("first").unwrap();
    clock.advance(Duration::seconds(1));
    store.add("second").unwrap();
    clock.advance(Duration::seconds(1));
    store.add("third").unwrap();

    let view: Vec<&str> = store
        .tasks_newest_first()
        .into_iter()
        .map(|t| t.text.as_str())
        .collect();
    assert_eq!(view, ["Third", "Second", "First"]);
    assert_eq!(store.tasks()[0].text, "First");
}

#[test]
fn persist_then_reload_yields_equal_collection() {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(start());
    let expected = {
        let mut store = open_store(&storage, &clock);
        store.add("alpha").unwrap();
        clock.advance(Duration::milliseconds(250));
        store.add("beta").unwrap();
        let id = store.tasks()[1].id.clone();
        store.toggle(&id).unwrap();
        store.tasks().to_vec()
    };

    let mut reopened = open_store(&storage, &clock);
    assert_eq!(reopened.tasks(), expected.as_slice());
    assert_eq!(reopened.load().unwrap(), LoadOutcome::Loaded(2));
}

#[test]
fn load_without_slot_starts_empty() {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(start());
    let mut store = open_store(&storage, &clock);

    assert_eq!(store.load().unwrap(), LoadOutcome::Empty);
    assert_eq!(store.count(), 0);
}

#[test]
fn load_discards_malformed_payloads() {
    let payloads = [
        "not json",
        "{\"id\":\"1\"}",
        r#"[{"id":"1","text":"","completed":false,"createdAt":"2026-01-01T00:00:00Z"}]"#,
        r#"[{"id":"1","text":"A","completed":false,"createdAt":"yesterday"}]"#,
    ];

    for payload in payloads {
        let storage = MemoryStorage::with_slot(DEFAULT_STORAGE_KEY, payload);
        let clock = ManualClock::new(start());
        let mut store = open_store(&storage, &clock);

        assert_eq!(store.count(), 0, "payload: {payload}");
        assert_eq!(store.load().unwrap(), LoadOutcome::Discarded);
        assert_eq!(storage.write_count(), 0);
    }
}

#[test]
fn load_discards_oversized_lists() {
    let tasks: Vec<serde_json::Value> = (0..MAX_TASKS + 1)
        .map(|n| {
            serde_json::json!({
                "id": n.to_string(),
                "text": "T",
                "completed": false,
                "createdAt": "2026-01-01T00:00:00Z"
            })
        })
        .collect();
    let storage = MemoryStorage::with_slot(
        DEFAULT_STORAGE_KEY,
        serde_json::to_string(&tasks).unwrap(),
    );
    let clock = ManualClock::new(start());
    let store = open_store(&storage, &clock);

    assert_eq!(store.count(), 0);
}

#[test]
fn mutation_after_discard_overwrites_slot() {
    let storage = MemoryStorage::with_slot(DEFAULT_STORAGE_KEY, "[broken");
    let clock = ManualClock::new(start());
    let mut store = open_store(&storage, &clock);

    store.add("fresh start").unwrap();

    assert_eq!(persisted(&storage).len(), 1);
}

#[test]
fn custom_storage_key_is_used() {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(start());
    let mut store = TaskStore::open(
        &storage,
        StoreConfig::default().with_storage_key("work-tasks"),
        SequentialIdGenerator::new("t"),
        clock,
    )
    .unwrap();

    store.add("x").unwrap();

    assert!(storage.get(DEFAULT_STORAGE_KEY).unwrap().is_none());
    assert!(storage.get("work-tasks").unwrap().is_some());
}

struct RepeatingIds {
    calls: usize,
}

impl TaskIdGenerator for RepeatingIds {
    fn next_id(&mut self, _now: DateTime<Utc>) -> TaskId {
        self.calls += 1;
        if self.calls <= 2 {
            TaskId::new("dup")
        } else {
            TaskId::new(format!("id-{}", self.calls))
        }
    }
}

#[test]
fn colliding_generator_output_is_redrawn() {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(start());
    let mut store = TaskStore::open(
        &storage,
        StoreConfig::default(),
        RepeatingIds { calls: 0 },
        clock,
    )
    .unwrap();

    store.add("a").unwrap();
    store.add("b").unwrap();

    assert_eq!(store.tasks()[0].id.as_str(), "dup");
    assert_eq!(store.tasks()[1].id.as_str(), "id-3");
}

struct StuckIds;

impl TaskIdGenerator for StuckIds {
    fn next_id(&mut self, _now: DateTime<Utc>) -> TaskId {
        TaskId::new("same")
    }
}

#[test]
fn stuck_generator_reports_exhaustion() {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(start());
    let mut store =
        TaskStore::open(&storage, StoreConfig::default(), StuckIds, clock).unwrap();
    store.add("a").unwrap();

    let err = store.add("b").unwrap_err();
    assert!(matches!(err, TaskStoreError::IdExhausted { .. }));
    assert_eq!(store.count(), 1);
}

struct FailingWrites {
    fail: Cell<bool>,
    inner: MemoryStorage,
}

impl KeyValueStorage for FailingWrites {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        if self.fail.get() {
            return Err(StorageError::Unavailable("quota exceeded".to_string()));
        }
        self.inner.set(key, value)
    }
}

#[test]
fn failed_write_leaves_memory_state_untouched() {
    let storage = FailingWrites {
        fail: Cell::new(false),
        inner: MemoryStorage::new(),
    };
    let clock = ManualClock::new(start());
    let mut store = TaskStore::open(
        &storage,
        StoreConfig::default(),
        SequentialIdGenerator::new("t"),
        clock,
    )
    .unwrap();
    store.add("keep").unwrap();
    store.take_events();
    let id = store.tasks()[0].id.clone();

    storage.fail.set(true);
    assert!(matches!(
        store.add("lost").unwrap_err(),
        TaskStoreError::Storage(StorageError::Unavailable(_))
    ));
    assert!(store.toggle(&id).is_err());
    assert!(store.remove(&id).is_err());

    assert_eq!(store.count(), 1);
    assert!(!store.tasks()[0].completed);
    assert!(store.latest_undoable().is_none());
    assert!(store.take_events().is_empty());
}
