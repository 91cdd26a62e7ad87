//! The storage collaborator.
//!
//! A single worker thread owns the sqlite connection and serves the four
//! boundary operations over channels: persist, remove, fetch-all, and the
//! inbound note-list event. The editor never waits on it; persist and remove
//! are fire-and-forget, and only [`StorageEvent::Notes`] flows back.
//!
//! Requests are handled strictly in channel order, so a `Persist` followed by
//! a `FetchAll` always reports the freshly saved note.

use std::path::Path;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, unbounded};
use rusqlite::{Connection, params};
use tracing::error;

use crate::error::Result;
use crate::models::Note;

#[derive(Debug)]
pub enum StorageRequest {
    Persist(Note),
    Remove(Note),
    FetchAll,
    Shutdown,
}

#[derive(Debug)]
pub enum StorageEvent {
    /// The full note list, serialized to JSON. Opaque to the transport; the
    /// editor decodes it.
    Notes(String),
}

pub struct Database {
    connection: Connection,
}

impl Database {
    pub fn open(db_path: &Path) -> Result<Database> {
        let conn = Connection::open(db_path)?;

        // `id` orders rows and picks the victim on delete; it never leaves
        // this module. Notes are identified by their full value.
        conn.execute(
            "CREATE TABLE IF NOT EXISTS notes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                font TEXT NOT NULL DEFAULT 'Arial'
            )",
            [],
        )?;

        Ok(Database { connection: conn })
    }

    pub fn add_note(&self, note: &Note) -> Result<()> {
        self.connection.execute(
            "INSERT INTO notes (title, content, font) VALUES (?1, ?2, ?3)",
            params![note.title, note.content, note.font],
        )?;

        Ok(())
    }

    /// Delete the oldest row matching the note's (title, content, font)
    /// triple. Duplicates beyond the first survive; a miss is a no-op.
    pub fn delete_note(&self, note: &Note) -> Result<()> {
        self.connection.execute(
            "DELETE FROM notes WHERE id = (
                SELECT id FROM notes
                WHERE title = ?1 AND content = ?2 AND font = ?3
                ORDER BY id LIMIT 1
            )",
            params![note.title, note.content, note.font],
        )?;

        Ok(())
    }

    pub fn get_all_notes(&self) -> Result<Vec<Note>> {
        let mut query = self
            .connection
            .prepare("SELECT title, content, font FROM notes ORDER BY id")?;

        let notes = query
            .query_map([], |row| {
                Ok(Note {
                    title: row.get(0)?,
                    content: row.get(1)?,
                    font: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<Note>>>()?;

        Ok(notes)
    }

    fn all_notes_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.get_all_notes()?)?)
    }
}

/// Start the worker thread. Returns the request sender, the event receiver,
/// and the join handle; send [`StorageRequest::Shutdown`] before joining.
pub fn spawn(db: Database) -> (Sender<StorageRequest>, Receiver<StorageEvent>, JoinHandle<()>) {
    let (request_tx, request_rx) = unbounded();
    let (event_tx, event_rx) = unbounded();
    let handle = thread::spawn(move || run(db, request_rx, event_tx));
    (request_tx, event_rx, handle)
}

fn run(db: Database, requests: Receiver<StorageRequest>, events: Sender<StorageEvent>) {
    while let Ok(request) = requests.recv() {
        match request {
            StorageRequest::Persist(note) => {
                if let Err(err) = db.add_note(&note) {
                    error!("failed to persist note '{}': {err}", note.title);
                }
            }
            StorageRequest::Remove(note) => {
                if let Err(err) = db.delete_note(&note) {
                    error!("failed to delete note '{}': {err}", note.title);
                }
            }
            StorageRequest::FetchAll => match db.all_notes_json() {
                Ok(json) => {
                    // The editor may already be gone during shutdown.
                    let _ = events.send(StorageEvent::Notes(json));
                }
                Err(err) => error!("failed to load notes: {err}"),
            },
            StorageRequest::Shutdown => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::editor::decode_notes;

    fn memory_db() -> Database {
        Database::open(Path::new(":memory:")).unwrap()
    }

    #[test]
    fn notes_come_back_in_insertion_order() {
        let db = memory_db();
        db.add_note(&Note::new("first", "1", "Arial")).unwrap();
        db.add_note(&Note::new("second", "2", "Georgia")).unwrap();

        let notes = db.get_all_notes().unwrap();
        assert_eq!(
            notes,
            vec![Note::new("first", "1", "Arial"), Note::new("second", "2", "Georgia")]
        );
    }

    #[test]
    fn delete_removes_one_duplicate_at_a_time() {
        let db = memory_db();
        let dup = Note::new("same", "same", "Arial");
        db.add_note(&dup).unwrap();
        db.add_note(&dup).unwrap();

        db.delete_note(&dup).unwrap();
        assert_eq!(db.get_all_notes().unwrap(), vec![dup.clone()]);

        db.delete_note(&dup).unwrap();
        assert!(db.get_all_notes().unwrap().is_empty());
    }

    #[test]
    fn delete_of_a_missing_note_is_a_no_op() {
        let db = memory_db();
        db.add_note(&Note::new("keep", "me", "Arial")).unwrap();

        db.delete_note(&Note::new("not", "there", "Arial")).unwrap();

        assert_eq!(db.get_all_notes().unwrap().len(), 1);
    }

    #[test]
    fn delete_matches_the_full_triple() {
        let db = memory_db();
        db.add_note(&Note::new("A", "B", "Georgia")).unwrap();

        // Same title and content, different font: not the same note.
        db.delete_note(&Note::new("A", "B", "Arial")).unwrap();

        assert_eq!(db.get_all_notes().unwrap().len(), 1);
    }

    #[test]
    fn worker_round_trip_persists_and_reports_json() {
        let (tx, rx, handle) = spawn(memory_db());

        tx.send(StorageRequest::Persist(Note::new("A", "B", "Tahoma")))
            .unwrap();
        tx.send(StorageRequest::FetchAll).unwrap();

        let StorageEvent::Notes(json) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        let notes = decode_notes(&json).unwrap();
        assert_eq!(notes, vec![Note::new("A", "B", "Tahoma")]);

        tx.send(StorageRequest::Shutdown).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn worker_serves_requests_in_channel_order() {
        let (tx, rx, handle) = spawn(memory_db());
        let note = Note::new("X", "Y", "Arial");

        // Persist, fetch, remove, fetch: the two reports must straddle the
        // delete even though nothing here waits on the worker.
        tx.send(StorageRequest::Persist(note.clone())).unwrap();
        tx.send(StorageRequest::FetchAll).unwrap();
        tx.send(StorageRequest::Remove(note.clone())).unwrap();
        tx.send(StorageRequest::FetchAll).unwrap();

        let StorageEvent::Notes(first) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        let StorageEvent::Notes(second) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(decode_notes(&first).unwrap(), vec![note]);
        assert!(decode_notes(&second).unwrap().is_empty());

        tx.send(StorageRequest::Shutdown).unwrap();
        handle.join().unwrap();
    }
}
