//! Terminal commands driving one sync session.
//!
//! # Responsibility
//! - Run Init (migration + load), apply one mutation, and wait for its push.
//! - Render notes as plain text.
//!
//! # Invariants
//! - Every run flushes pending pushes before returning.
//! - A failed push is reported as an error after the local change was made.

use anyhow::{anyhow, bail};
use clap::Subcommand;
use log::{info, warn};
use notekeep_core::{
    format_created_at, LegacyStore, MigrationOutcome, Note, NotesApi, SyncClient, SyncStatus,
};
use std::io::Write;
use std::sync::Arc;

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List all notes
    List,
    /// Print one note
    Show { id: String },
    /// Create a note
    New {
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
    },
    /// Replace the title and/or content of a note
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
    },
    /// Delete a note
    Delete { id: String },
    /// Only run the legacy migration and report the outcome
    Migrate,
}

/// Runs `command` in a fresh session against `api`.
pub async fn run_session<W: Write>(
    api: Arc<dyn NotesApi>,
    legacy: Box<dyn LegacyStore>,
    command: Command,
    out: &mut W,
) -> anyhow::Result<()> {
    let mut client = SyncClient::new(api, legacy);
    let outcome = client.init().await;
    report_migration(&outcome, &command, out)?;

    let result = execute(&mut client, command, out);
    client.flush().await;
    let status = client.status().borrow().clone();
    client.shutdown().await;
    result?;

    if let SyncStatus::Failed(detail) = status {
        bail!("changes were kept locally but not saved to the server: {detail}");
    }
    Ok(())
}

fn report_migration<W: Write>(
    outcome: &MigrationOutcome,
    command: &Command,
    out: &mut W,
) -> anyhow::Result<()> {
    match (outcome, command) {
        (MigrationOutcome::Migrated { count }, _) => {
            info!("event=cli_migration module=cli status=ok migrated={count}");
            writeln!(out, "Migrated {count} legacy note(s)")?;
        }
        (MigrationOutcome::NothingToMigrate, Command::Migrate) => {
            writeln!(out, "No legacy notes to migrate")?;
        }
        (MigrationOutcome::NothingToMigrate, _) => {}
        (MigrationOutcome::Failed(detail), Command::Migrate) => {
            warn!("event=cli_migration module=cli status=error error={detail}");
            bail!("migration failed, legacy notes kept: {detail}");
        }
        (MigrationOutcome::Failed(detail), _) => {
            warn!("event=cli_migration module=cli status=error error={detail}");
            writeln!(out, "warning: legacy notes not migrated, kept for the next run: {detail}")?;
        }
    }
    Ok(())
}

fn execute<W: Write>(client: &mut SyncClient, command: Command, out: &mut W) -> anyhow::Result<()> {
    match command {
        Command::List => {
            if client.notes().is_empty() {
                writeln!(out, "No notes yet.")?;
            }
            for note in client.notes() {
                writeln!(
                    out,
                    "{}  {}  {}",
                    note.id,
                    format_created_at(note.created_at),
                    note.title
                )?;
            }
        }
        Command::Show { id } => {
            let note = find(client, &id)?;
            writeln!(out, "{}", note.title)?;
            writeln!(out, "{}", format_created_at(note.created_at))?;
            writeln!(out)?;
            writeln!(out, "{}", note.content)?;
        }
        Command::New { title, content } => {
            let draft = client.create_note();
            let id = draft.id.clone();
            if title.is_some() || content.is_some() {
                let edited = apply_edits(&draft, title, content);
                client.save_note(edited);
            }
            writeln!(out, "Created {id}")?;
        }
        Command::Edit { id, title, content } => {
            let existing = find(client, &id)?;
            client.select_note(existing.clone());
            client.begin_edit();
            client.save_note(apply_edits(&existing, title, content));
            writeln!(out, "Saved {id}")?;
        }
        Command::Delete { id } => {
            if !client.delete_note(&id) {
                bail!("note not found: {id}");
            }
            writeln!(out, "Deleted {id}")?;
        }
        Command::Migrate => {}
    }
    Ok(())
}

fn find(client: &SyncClient, id: &str) -> anyhow::Result<Note> {
    client
        .session()
        .find(id)
        .cloned()
        .ok_or_else(|| anyhow!("note not found: {id}"))
}

fn apply_edits(note: &Note, title: Option<String>, content: Option<String>) -> Note {
    note.edited(
        title.unwrap_or_else(|| note.title.clone()),
        content.unwrap_or_else(|| note.content.clone()),
    )
}
