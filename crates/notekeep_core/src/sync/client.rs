//! Sync client: reconciles in-memory notes with the Note Store.
//!
//! # Responsibility
//! - On `init`, migrate legacy local notes once, then adopt the server set.
//! - After every collection change, push the full collection in the
//!   background (full replace, never incremental).
//! - Expose push progress as an observable `SyncStatus`.
//!
//! # Invariants
//! - Mutations are synchronous and never wait for persistence.
//! - Mutations are only accepted once Ready; before that they are dropped.
//! - Pushes run one at a time on a single background task and always send
//!   the newest snapshot; an older snapshot is never sent after a newer one.
//! - A failed push is logged and reported through `SyncStatus`; in-memory
//!   state is never rolled back.
//! - A failed migration leaves the legacy notes in place for the next run.

use super::api::NotesApi;
use super::legacy::LegacyStore;
use super::session::{NoteAction, NotesSession};
use crate::model::note::Note;
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Session lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Init,
    Ready,
}

/// Progress of background pushes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    /// Nothing pushed yet.
    Idle,
    Pushing,
    /// The last push succeeded.
    Synced,
    /// The last push failed with this detail.
    Failed(String),
}

/// How legacy notes are combined with the server collection on migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MigrationPolicy {
    /// Keep every server note and append legacy notes with unseen ids.
    #[default]
    MergeById,
    /// Push exactly the legacy set, replacing whatever the server holds.
    Replace,
}

/// Result of the one-time legacy migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    NothingToMigrate,
    Migrated { count: usize },
    /// Legacy notes were left in place.
    Failed(String),
}

#[derive(Debug, Clone, Default)]
struct Snapshot {
    generation: u64,
    notes: Arc<Vec<Note>>,
}

struct Pusher {
    snapshots: watch::Sender<Snapshot>,
    completed: watch::Receiver<u64>,
    task: JoinHandle<()>,
}

/// In-memory note state holder bound to one Note Store.
pub struct SyncClient {
    api: Arc<dyn NotesApi>,
    legacy: Box<dyn LegacyStore>,
    policy: MigrationPolicy,
    session: NotesSession,
    phase: SyncPhase,
    generation: u64,
    status_tx: watch::Sender<SyncStatus>,
    pusher: Option<Pusher>,
}

impl SyncClient {
    pub fn new(api: Arc<dyn NotesApi>, legacy: Box<dyn LegacyStore>) -> Self {
        let (status_tx, _) = watch::channel(SyncStatus::Idle);
        Self {
            api,
            legacy,
            policy: MigrationPolicy::default(),
            session: NotesSession::new(),
            phase: SyncPhase::Init,
            generation: 0,
            status_tx,
            pusher: None,
        }
    }

    pub fn with_migration_policy(mut self, policy: MigrationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    pub fn session(&self) -> &NotesSession {
        &self.session
    }

    pub fn notes(&self) -> &[Note] {
        self.session.notes()
    }

    /// Subscribes to background push progress.
    pub fn status(&self) -> watch::Receiver<SyncStatus> {
        self.status_tx.subscribe()
    }

    /// Runs the Init phase: migrate legacy notes, load the server set, and
    /// start the background pusher. Must run inside a Tokio runtime.
    ///
    /// Calling it again once Ready does nothing.
    pub async fn init(&mut self) -> MigrationOutcome {
        if self.phase == SyncPhase::Ready {
            warn!("event=sync_init module=sync status=skipped reason=already_ready");
            return MigrationOutcome::NothingToMigrate;
        }

        let outcome = self.migrate_legacy().await;
        let notes = load_notes(self.api.as_ref()).await;
        info!(
            "event=sync_init module=sync status=ok loaded={} migration={:?}",
            notes.len(),
            outcome
        );
        self.session.replace_notes(notes);
        self.pusher = Some(spawn_pusher(Arc::clone(&self.api), self.status_tx.clone()));
        self.phase = SyncPhase::Ready;
        outcome
    }

    /// Applies one action; schedules a push when the collection changed.
    ///
    /// Actions are rejected until `init` has finished, since `init` replaces
    /// the whole collection with the server set.
    pub fn dispatch(&mut self, action: NoteAction) -> bool {
        if self.phase == SyncPhase::Init {
            warn!("event=sync_dispatch module=sync status=rejected reason=not_ready");
            return false;
        }
        let changed = self.session.apply(action);
        if changed {
            self.schedule_push();
        }
        changed
    }

    pub fn create_note(&mut self) -> Note {
        let note = Note::new();
        self.dispatch(NoteAction::Create(note.clone()));
        note
    }

    pub fn select_note(&mut self, note: Note) {
        self.dispatch(NoteAction::Select(note));
    }

    /// Returns `false` (and pushes nothing) when no note shares the id.
    pub fn save_note(&mut self, updated: Note) -> bool {
        self.dispatch(NoteAction::Save(updated))
    }

    /// Returns `false` (and pushes nothing) when no note has this id.
    pub fn delete_note(&mut self, id: &str) -> bool {
        self.dispatch(NoteAction::Delete(id.to_string()))
    }

    pub fn begin_edit(&mut self) {
        self.dispatch(NoteAction::BeginEdit);
    }

    pub fn cancel_edit(&mut self) {
        self.dispatch(NoteAction::CancelEdit);
    }

    /// Waits until the newest scheduled snapshot has been attempted.
    pub async fn flush(&self) {
        let Some(pusher) = self.pusher.as_ref() else {
            return;
        };
        let target = self.generation;
        let mut completed = pusher.completed.clone();
        if completed.wait_for(|done| *done >= target).await.is_err() {
            warn!("event=sync_flush module=sync status=error reason=pusher_stopped");
        }
    }

    /// Flushes pending pushes and stops the background task.
    pub async fn shutdown(mut self) {
        self.flush().await;
        if let Some(pusher) = self.pusher.take() {
            drop(pusher.snapshots);
            if let Err(err) = pusher.task.await {
                error!("event=sync_shutdown module=sync status=error error={err}");
            }
        }
    }

    fn schedule_push(&mut self) {
        let Some(pusher) = self.pusher.as_ref() else {
            debug!("event=sync_push module=sync status=skipped reason=not_ready");
            return;
        };
        self.generation += 1;
        pusher.snapshots.send_replace(Snapshot {
            generation: self.generation,
            notes: Arc::new(self.session.notes().to_vec()),
        });
    }

    async fn migrate_legacy(&self) -> MigrationOutcome {
        let legacy = match self.legacy.load() {
            Ok(notes) => notes,
            Err(err) => {
                warn!("event=legacy_migrate module=sync status=error stage=load error={err}");
                return MigrationOutcome::Failed(err.to_string());
            }
        };
        if legacy.is_empty() {
            return MigrationOutcome::NothingToMigrate;
        }

        let payload = match self.policy {
            MigrationPolicy::Replace => legacy.clone(),
            MigrationPolicy::MergeById => match self.api.fetch_notes().await {
                Ok(server) => merge_by_id(server, legacy.clone()),
                Err(err) => {
                    warn!(
                        "event=legacy_migrate module=sync status=error stage=fetch error={err}"
                    );
                    return MigrationOutcome::Failed(err.to_string());
                }
            },
        };

        if let Err(err) = self.api.push_notes(&payload).await {
            warn!("event=legacy_migrate module=sync status=error stage=push error={err}");
            return MigrationOutcome::Failed(err.to_string());
        }
        if let Err(err) = self.legacy.clear() {
            // The notes already reached the store.
            warn!("event=legacy_migrate module=sync status=warn stage=clear error={err}");
        }

        info!(
            "event=legacy_migrate module=sync status=ok count={} policy={:?}",
            legacy.len(),
            self.policy
        );
        MigrationOutcome::Migrated {
            count: legacy.len(),
        }
    }
}

/// Fetches the server collection, degrading to empty on failure.
pub async fn load_notes(api: &dyn NotesApi) -> Vec<Note> {
    match api.fetch_notes().await {
        Ok(notes) => notes,
        Err(err) => {
            error!("event=notes_load module=sync status=error error={err}");
            Vec::new()
        }
    }
}

/// Keeps every `primary` note in order, then appends `incoming` notes whose
/// id has not been seen yet.
pub fn merge_by_id(primary: Vec<Note>, incoming: Vec<Note>) -> Vec<Note> {
    let mut seen = HashSet::new();
    let mut merged = Vec::with_capacity(primary.len() + incoming.len());
    for note in primary.into_iter().chain(incoming) {
        if seen.insert(note.id.clone()) {
            merged.push(note);
        }
    }
    merged
}

fn spawn_pusher(api: Arc<dyn NotesApi>, status_tx: watch::Sender<SyncStatus>) -> Pusher {
    let (snapshots, mut pending) = watch::channel(Snapshot::default());
    let (completed_tx, completed) = watch::channel(0_u64);

    let task = tokio::spawn(async move {
        while pending.changed().await.is_ok() {
            let snapshot = pending.borrow_and_update().clone();
            status_tx.send_replace(SyncStatus::Pushing);
            match api.push_notes(&snapshot.notes).await {
                Ok(()) => {
                    debug!(
                        "event=sync_push module=sync status=ok generation={} count={}",
                        snapshot.generation,
                        snapshot.notes.len()
                    );
                    status_tx.send_replace(SyncStatus::Synced);
                }
                Err(err) => {
                    error!(
                        "event=sync_push module=sync status=error generation={} count={} error={}",
                        snapshot.generation,
                        snapshot.notes.len(),
                        err
                    );
                    status_tx.send_replace(SyncStatus::Failed(err.to_string()));
                }
            }
            completed_tx.send_replace(snapshot.generation);
        }
    });

    Pusher {
        snapshots,
        completed,
        task,
    }
}
