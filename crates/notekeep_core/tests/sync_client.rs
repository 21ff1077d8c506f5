use async_trait::async_trait;
use notekeep_core::{
    FileLegacyStore, LegacyStore, MigrationOutcome, MigrationPolicy, Note, NoteAction, NoteStore,
    NotesApi, NotesSession, StoreConfig, StoreNotesApi, SyncClient, SyncPhase, SyncStatus,
    TransportError,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn note(id: &str, title: &str) -> Note {
    Note::with_id(id, title, "", 1_700_000_000_000)
}

fn ids(notes: &[Note]) -> HashSet<String> {
    notes.iter().map(|note| note.id.clone()).collect()
}

#[derive(Default)]
struct RecordingApi {
    server: Mutex<Vec<Note>>,
    pushes: Mutex<Vec<Vec<Note>>>,
    fail_fetch: AtomicBool,
    fail_push: AtomicBool,
    push_delay: Duration,
}

impl RecordingApi {
    fn with_delay(push_delay: Duration) -> Self {
        Self {
            push_delay,
            ..Self::default()
        }
    }

    fn pushes(&self) -> Vec<Vec<Note>> {
        self.pushes.lock().unwrap().clone()
    }

    fn server(&self) -> Vec<Note> {
        self.server.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotesApi for RecordingApi {
    async fn fetch_notes(&self) -> Result<Vec<Note>, TransportError> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(TransportError::Status {
                status: 500,
                detail: "read failed".to_string(),
            });
        }
        Ok(self.server())
    }

    async fn push_notes(&self, notes: &[Note]) -> Result<(), TransportError> {
        if !self.push_delay.is_zero() {
            tokio::time::sleep(self.push_delay).await;
        }
        self.pushes.lock().unwrap().push(notes.to_vec());
        if self.fail_push.load(Ordering::SeqCst) {
            return Err(TransportError::Request("connection refused".to_string()));
        }
        *self.server.lock().unwrap() = notes.to_vec();
        Ok(())
    }
}

fn store_backed() -> (Arc<NoteStore>, Arc<StoreNotesApi>) {
    let store = Arc::new(NoteStore::new(StoreConfig::in_memory()));
    let api = Arc::new(StoreNotesApi::new(Arc::clone(&store)));
    (store, api)
}

#[tokio::test]
async fn migration_into_empty_store_imports_legacy_and_clears_it() {
    let dir = tempfile::tempdir().unwrap();
    let legacy = FileLegacyStore::new(dir.path());
    legacy.save(&[note("A", "a"), note("B", "b")]).unwrap();
    let (store, api) = store_backed();

    let mut client = SyncClient::new(api, Box::new(legacy.clone()));
    let outcome = client.init().await;

    assert_eq!(outcome, MigrationOutcome::Migrated { count: 2 });
    assert_eq!(client.phase(), SyncPhase::Ready);
    assert_eq!(ids(&store.read_all().unwrap()), ids(&[note("A", ""), note("B", "")]));
    assert_eq!(ids(client.notes()), ids(&store.read_all().unwrap()));
    assert!(legacy.load().unwrap().is_empty());
    assert!(!legacy.path().exists());
}

#[tokio::test]
async fn empty_legacy_performs_no_push() {
    let dir = tempfile::tempdir().unwrap();
    let api = Arc::new(RecordingApi::default());
    *api.server.lock().unwrap() = vec![note("S", "server")];

    let mut client = SyncClient::new(api.clone(), Box::new(FileLegacyStore::new(dir.path())));
    let outcome = client.init().await;
    client.flush().await;

    assert_eq!(outcome, MigrationOutcome::NothingToMigrate);
    assert!(api.pushes().is_empty());
    assert_eq!(api.server(), vec![note("S", "server")]);
    assert_eq!(client.notes(), &[note("S", "server")]);
}

#[tokio::test]
async fn merge_migration_keeps_existing_server_notes() {
    let dir = tempfile::tempdir().unwrap();
    let legacy = FileLegacyStore::new(dir.path());
    legacy
        .save(&[note("S", "stale local copy"), note("L", "local")])
        .unwrap();
    let (store, api) = store_backed();
    store.replace_all(&[note("S", "server")]).unwrap();

    let mut client = SyncClient::new(api, Box::new(legacy));
    client.init().await;

    let stored = store.read_all().unwrap();
    assert_eq!(stored, vec![note("S", "server"), note("L", "local")]);
}

#[tokio::test]
async fn replace_migration_pushes_exactly_the_legacy_set() {
    let dir = tempfile::tempdir().unwrap();
    let legacy = FileLegacyStore::new(dir.path());
    legacy.save(&[note("L", "local")]).unwrap();
    let (store, api) = store_backed();
    store.replace_all(&[note("S", "server")]).unwrap();

    let mut client =
        SyncClient::new(api, Box::new(legacy)).with_migration_policy(MigrationPolicy::Replace);
    client.init().await;

    assert_eq!(store.read_all().unwrap(), vec![note("L", "local")]);
}

#[tokio::test]
async fn failed_migration_leaves_legacy_intact_and_still_loads() {
    let dir = tempfile::tempdir().unwrap();
    let legacy = FileLegacyStore::new(dir.path());
    legacy.save(&[note("L", "local")]).unwrap();
    let api = Arc::new(RecordingApi::default());
    *api.server.lock().unwrap() = vec![note("S", "server")];
    api.fail_push.store(true, Ordering::SeqCst);

    let mut client = SyncClient::new(api.clone(), Box::new(legacy.clone()));
    let outcome = client.init().await;

    assert!(matches!(outcome, MigrationOutcome::Failed(_)));
    assert_eq!(legacy.load().unwrap(), vec![note("L", "local")]);
    assert_eq!(client.notes(), &[note("S", "server")]);
    assert_eq!(client.phase(), SyncPhase::Ready);
}

#[tokio::test]
async fn merge_migration_aborts_without_push_when_server_read_fails() {
    let dir = tempfile::tempdir().unwrap();
    let legacy = FileLegacyStore::new(dir.path());
    legacy.save(&[note("L", "local")]).unwrap();
    let api = Arc::new(RecordingApi::default());
    api.fail_fetch.store(true, Ordering::SeqCst);

    let mut client = SyncClient::new(api.clone(), Box::new(legacy.clone()));
    let outcome = client.init().await;

    assert!(matches!(outcome, MigrationOutcome::Failed(_)));
    assert!(api.pushes().is_empty());
    assert_eq!(legacy.load().unwrap(), vec![note("L", "local")]);
    assert!(client.notes().is_empty());
}

#[tokio::test]
async fn mutations_before_init_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let api = Arc::new(RecordingApi::default());
    *api.server.lock().unwrap() = vec![note("S", "server")];

    let mut client = SyncClient::new(api.clone(), Box::new(FileLegacyStore::new(dir.path())));
    client.create_note();
    assert!(!client.delete_note("S"));
    assert!(client.notes().is_empty());

    client.init().await;
    client.flush().await;

    assert_eq!(client.notes(), &[note("S", "server")]);
    assert!(api.pushes().is_empty());
}

#[tokio::test]
async fn malformed_legacy_data_is_left_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let legacy = FileLegacyStore::new(dir.path());
    std::fs::write(legacy.path(), "[{\"id\": 1").unwrap();
    let api = Arc::new(RecordingApi::default());

    let mut client = SyncClient::new(api.clone(), Box::new(legacy.clone()));
    let outcome = client.init().await;

    assert!(matches!(outcome, MigrationOutcome::Failed(_)));
    assert!(legacy.path().exists());
    assert!(api.pushes().is_empty());
}

#[tokio::test]
async fn read_failure_degrades_to_empty_collection() {
    let dir = tempfile::tempdir().unwrap();
    let api = Arc::new(RecordingApi::default());
    *api.server.lock().unwrap() = vec![note("S", "server")];
    api.fail_fetch.store(true, Ordering::SeqCst);

    let mut client = SyncClient::new(api, Box::new(FileLegacyStore::new(dir.path())));
    client.init().await;

    assert!(client.notes().is_empty());
    assert_eq!(client.phase(), SyncPhase::Ready);
}

#[tokio::test]
async fn create_then_delete_restores_collection_and_store() {
    let dir = tempfile::tempdir().unwrap();
    let (store, api) = store_backed();
    store.replace_all(&[note("S", "server")]).unwrap();

    let mut client = SyncClient::new(api, Box::new(FileLegacyStore::new(dir.path())));
    client.init().await;
    let before = client.notes().to_vec();

    let created = client.create_note();
    assert_eq!(client.notes()[0], created);
    assert!(client.session().is_editing());
    assert!(client.delete_note(&created.id));
    client.flush().await;

    assert_eq!(client.notes(), before.as_slice());
    assert_eq!(store.read_all().unwrap(), before);
}

#[tokio::test]
async fn deleting_last_note_pushes_empty_collection() {
    let dir = tempfile::tempdir().unwrap();
    let (store, api) = store_backed();
    store.replace_all(&[note("only", "only")]).unwrap();

    let mut client = SyncClient::new(api, Box::new(FileLegacyStore::new(dir.path())));
    client.init().await;
    client.delete_note("only");
    client.flush().await;

    assert!(store.read_all().unwrap().is_empty());
}

#[tokio::test]
async fn selection_and_unknown_saves_do_not_push() {
    let dir = tempfile::tempdir().unwrap();
    let api = Arc::new(RecordingApi::default());
    *api.server.lock().unwrap() = vec![note("S", "server")];

    let mut client = SyncClient::new(api.clone(), Box::new(FileLegacyStore::new(dir.path())));
    client.init().await;
    client.select_note(note("S", "server"));
    client.begin_edit();
    assert!(client.session().is_editing());
    client.cancel_edit();
    assert!(!client.save_note(note("missing", "x")));
    client.flush().await;

    assert!(api.pushes().is_empty());
}

#[tokio::test]
async fn push_failure_keeps_local_state_and_reports_status() {
    let dir = tempfile::tempdir().unwrap();
    let api = Arc::new(RecordingApi::default());
    api.fail_push.store(true, Ordering::SeqCst);

    let mut client = SyncClient::new(api.clone(), Box::new(FileLegacyStore::new(dir.path())));
    client.init().await;
    let status = client.status();
    assert_eq!(*status.borrow(), SyncStatus::Idle);

    let created = client.create_note();
    client.flush().await;

    assert_eq!(client.notes(), &[created]);
    assert!(api.server().is_empty());
    assert!(matches!(&*status.borrow(), SyncStatus::Failed(_)));
}

#[tokio::test]
async fn overlapping_pushes_never_send_an_older_snapshot_last() {
    let dir = tempfile::tempdir().unwrap();
    let api = Arc::new(RecordingApi::with_delay(Duration::from_millis(20)));

    let mut client = SyncClient::new(api.clone(), Box::new(FileLegacyStore::new(dir.path())));
    client.init().await;
    for _ in 0..5 {
        client.create_note();
    }
    client.flush().await;

    let pushes = api.pushes();
    assert!(!pushes.is_empty());
    assert!(pushes.len() <= 5);
    let sizes = pushes.iter().map(Vec::len).collect::<Vec<_>>();
    assert!(sizes.windows(2).all(|pair| pair[0] < pair[1]), "{sizes:?}");
    assert_eq!(api.server(), client.notes());
    assert_eq!(*client.status().borrow(), SyncStatus::Synced);
}

#[tokio::test]
async fn shutdown_flushes_pending_push() {
    let dir = tempfile::tempdir().unwrap();
    let api = Arc::new(RecordingApi::with_delay(Duration::from_millis(10)));

    let mut client = SyncClient::new(api.clone(), Box::new(FileLegacyStore::new(dir.path())));
    client.init().await;
    let created = client.create_note();
    client.shutdown().await;

    assert_eq!(api.server(), vec![created]);
}

#[test]
fn replaying_actions_is_deterministic() {
    let actions = vec![
        NoteAction::Create(note("1", "New Note")),
        NoteAction::Create(note("2", "New Note")),
        NoteAction::Save(note("1", "groceries").edited("groceries", "milk")),
        NoteAction::Select(note("2", "New Note")),
        NoteAction::Delete("2".to_string()),
        NoteAction::Create(note("3", "New Note")),
        NoteAction::Save(note("404", "ghost")),
    ];

    let replay = |actions: &[NoteAction]| {
        let mut session = NotesSession::new();
        for action in actions {
            session.apply(action.clone());
        }
        session
    };

    let first = replay(&actions);
    let second = replay(&actions);
    assert_eq!(first, second);
    let titles = first
        .notes()
        .iter()
        .map(|n| n.title.as_str())
        .collect::<Vec<_>>();
    assert_eq!(titles, vec!["New Note", "groceries"]);
}
