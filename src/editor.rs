//! The editor state machine.
//!
//! `update` is the only place the [`Model`] changes: the runtime feeds it a
//! [`Msg`] per input or storage event and executes whatever [`Effect`]s come
//! back. Nothing in here blocks or touches the outside world, which is what
//! keeps the whole transition table unit-testable.

use tracing::warn;

use crate::models::{DEFAULT_FONT, Note};

/// Filename used by `Msg::Download` when the draft title is empty.
pub const FALLBACK_FILENAME: &str = "notea-file.txt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    EditTitle(String),
    EditContent(String),
    SelectFont(String),
    Save,
    Download,
    /// Raw JSON payload from the storage collaborator, carrying the full
    /// note list.
    NotesArrived(String),
    LoadNote(Note),
    DeleteNote(Note),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Persist(Note),
    Remove(Note),
    FetchAll,
    Download {
        filename: String,
        mime: &'static str,
        content: String,
    },
}

/// The whole application state: the draft being edited plus a cached mirror
/// of whatever the storage collaborator last reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    pub title: String,
    pub content: String,
    pub selected_font: String,
    pub saved_notes: Vec<Note>,
    /// Feedback for the status line. Cleared on every message, set on the
    /// failure paths (rejected save, undecodable note list).
    pub status: Option<String>,
}

impl Model {
    /// Initial state plus the startup effect: the note list is never assumed,
    /// it is always requested from storage.
    pub fn init() -> (Model, Vec<Effect>) {
        let model = Model {
            title: String::new(),
            content: String::new(),
            selected_font: DEFAULT_FONT.to_string(),
            saved_notes: Vec::new(),
            status: None,
        };
        (model, vec![Effect::FetchAll])
    }

    fn draft(&self) -> Note {
        Note::new(
            self.title.clone(),
            self.content.clone(),
            self.selected_font.clone(),
        )
    }
}

pub fn update(model: &mut Model, msg: Msg) -> Vec<Effect> {
    model.status = None;

    match msg {
        Msg::EditTitle(title) => {
            model.title = title;
            vec![]
        }
        Msg::EditContent(content) => {
            model.content = content;
            vec![]
        }
        Msg::SelectFont(font) => {
            model.selected_font = font;
            vec![]
        }
        Msg::Save => {
            if model.title.is_empty() || model.content.is_empty() {
                model.status = Some("title and content are both required".to_string());
                return vec![];
            }
            // The draft is not cleared: storage echoes the full list back
            // via FetchAll and the user keeps editing where they were.
            vec![Effect::Persist(model.draft()), Effect::FetchAll]
        }
        Msg::Download => {
            let filename = download_filename(&model.title);
            vec![Effect::Download {
                filename,
                mime: "text/plain",
                content: model.content.clone(),
            }]
        }
        Msg::NotesArrived(raw) => {
            match decode_notes(&raw) {
                // Whatever storage reports replaces the cache wholesale,
                // in storage order.
                Ok(notes) => model.saved_notes = notes,
                Err(err) => {
                    warn!("discarding undecodable note list: {err}");
                    model.status = Some("could not read saved notes".to_string());
                }
            }
            vec![]
        }
        Msg::LoadNote(note) => {
            model.title = note.title;
            model.content = note.content;
            model.selected_font = note.font;
            vec![]
        }
        Msg::DeleteNote(note) => {
            if let Some(pos) = model.saved_notes.iter().position(|n| *n == note) {
                model.saved_notes.remove(pos);
            }
            vec![Effect::Remove(note), Effect::FetchAll]
        }
    }
}

/// The exported filename is derived from the title alone. Titles are used
/// verbatim, path characters included; see DESIGN.md.
pub fn download_filename(title: &str) -> String {
    if title.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        format!("{title}.txt")
    }
}

/// Decode a note list received from storage. Strict and atomic: the payload
/// must be an array of objects with string `title` and `content` (and a
/// string `font` when present); any mismatch fails the whole list.
pub fn decode_notes(raw: &str) -> serde_json::Result<Vec<Note>> {
    serde_json::from_str(raw)
}
