use serde::{Deserialize, Serialize};

pub const DEFAULT_FONT: &str = "Arial";

/// Fonts offered by the form's font selector. Notes loaded from storage may
/// carry any string; the renderer only ever displays the name.
pub const FONTS: [&str; 10] = [
    "Arial",
    "Courier New",
    "Georgia",
    "Times New Roman",
    "Verdana",
    "Sans-serif",
    "Serif",
    "Helvetica",
    "Tahoma",
    "Trebuchet MS",
];

/// A saved note. Identity is structural: two notes are the same note iff
/// title, content and font all match. There is no id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub title: String,
    pub content: String,
    #[serde(default = "default_font")]
    pub font: String,
}

fn default_font() -> String {
    DEFAULT_FONT.to_string()
}

impl Note {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        font: impl Into<String>,
    ) -> Self {
        Note {
            title: title.into(),
            content: content.into(),
            font: font.into(),
        }
    }
}

/// The font after `current` in [`FONTS`], wrapping around. Unrecognized
/// fonts (possible on notes decoded from storage) restart at the first entry.
pub fn next_font(current: &str) -> &'static str {
    match FONTS.iter().position(|f| *f == current) {
        Some(i) => FONTS[(i + 1) % FONTS.len()],
        None => FONTS[0],
    }
}
