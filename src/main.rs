mod editor;
mod error;
mod export;
mod models;
mod storage;

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use clap::Parser;
use crossbeam_channel::{Receiver, Sender};
use crossterm::event::{Event, KeyCode, KeyModifiers};
use ratatui::{
    DefaultTerminal, Frame,
    layout::{Constraint, Direction, Layout},
    style::{Style, Stylize},
    symbols::border,
    text::{Line, ToSpan},
    widgets::{Block, List, ListItem, Paragraph},
};
use tracing::{Level, warn};
use tui_input::{Input, backend::crossterm::EventHandler};

use crate::editor::{Effect, Model, Msg, update};
use crate::models::{DEFAULT_FONT, next_font};
use crate::storage::{Database, StorageEvent, StorageRequest};

#[derive(Parser)]
#[command(name = "notea", about = "A terminal note editor")]
struct Cli {
    /// Sqlite database holding the saved notes
    #[arg(long, default_value = "notes.db")]
    db: PathBuf,
    /// Log file (the terminal belongs to the UI)
    #[arg(long, default_value = "notea.log")]
    log: PathBuf,
    /// Log at debug level
    #[arg(long)]
    debug: bool,
}

enum Screen {
    List,
    Form,
}

enum FocusedInput {
    Title,
    Content,
}

struct App {
    model: Model,
    storage_tx: Sender<StorageRequest>,
    storage_rx: Receiver<StorageEvent>,
    export_dir: PathBuf,
    current_screen: Screen,
    list_index: usize,
    title_input: Input,
    content_input: Input,
    focused_input: FocusedInput,
}

fn main() -> color_eyre::Result<()> {
    let cli = Cli::parse();
    color_eyre::install()?;
    init_logging(&cli)?;

    let db = Database::open(&cli.db)?;
    let (storage_tx, storage_rx, storage_thread) = storage::spawn(db);

    let (model, startup_effects) = Model::init();
    let mut app = App {
        model,
        storage_tx: storage_tx.clone(),
        storage_rx,
        export_dir: dirs::download_dir().unwrap_or_else(|| PathBuf::from(".")),
        list_index: 0,
        current_screen: Screen::Form,
        title_input: Input::default(),
        content_input: Input::default(),
        focused_input: FocusedInput::Title,
    };
    for effect in startup_effects {
        app.run_effect(effect);
    }

    let result = ratatui::run(|t| app.run(t));

    let _ = storage_tx.send(StorageRequest::Shutdown);
    let _ = storage_thread.join();
    result?;

    Ok(())
}

fn init_logging(cli: &Cli) -> color_eyre::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(&cli.log)?;
    let level = if cli.debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

impl App {
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> std::io::Result<()> {
        loop {
            self.drain_storage_events();
            self.list_index = self
                .list_index
                .min(self.model.saved_notes.len().saturating_sub(1));
            terminal.draw(|f| self.draw(f))?;

            if !crossterm::event::poll(Duration::from_millis(50))? {
                continue;
            }
            let event = crossterm::event::read()?;
            let Event::Key(key) = event else { continue };

            match self.current_screen {
                Screen::List => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => {
                        return Ok(());
                    }
                    KeyCode::Char('j') | KeyCode::Down
                        if !self.model.saved_notes.is_empty() =>
                    {
                        if self.list_index == self.model.saved_notes.len() - 1 {
                            self.list_index = 0;
                        } else {
                            self.list_index += 1;
                        }
                    }
                    KeyCode::Char('k') | KeyCode::Up
                        if !self.model.saved_notes.is_empty() =>
                    {
                        if self.list_index == 0 {
                            self.list_index = self.model.saved_notes.len() - 1;
                        } else {
                            self.list_index -= 1;
                        }
                    }
                    KeyCode::Enter | KeyCode::Char('e') => {
                        if let Some(note) = self.model.saved_notes.get(self.list_index).cloned() {
                            self.apply(Msg::LoadNote(note));
                            self.sync_inputs();
                            self.focused_input = FocusedInput::Title;
                            self.current_screen = Screen::Form;
                        }
                    }
                    KeyCode::Char('a') => {
                        self.apply(Msg::EditTitle(String::new()));
                        self.apply(Msg::EditContent(String::new()));
                        self.apply(Msg::SelectFont(DEFAULT_FONT.to_string()));
                        self.title_input.reset();
                        self.content_input.reset();
                        self.focused_input = FocusedInput::Title;
                        self.current_screen = Screen::Form;
                    }
                    KeyCode::Char('d') => {
                        if let Some(note) = self.model.saved_notes.get(self.list_index).cloned() {
                            self.apply(Msg::DeleteNote(note));
                            if self.list_index != 0 {
                                self.list_index -= 1;
                            }
                        }
                    }
                    _ => {}
                },
                Screen::Form => match (key.modifiers, key.code) {
                    (KeyModifiers::CONTROL, KeyCode::Char('s')) => {
                        self.apply(Msg::Save);
                    }
                    (KeyModifiers::CONTROL, KeyCode::Char('d')) => {
                        self.apply(Msg::Download);
                    }
                    (KeyModifiers::CONTROL, KeyCode::Char('f')) => {
                        let font = next_font(&self.model.selected_font).to_string();
                        self.apply(Msg::SelectFont(font));
                    }
                    (_, KeyCode::Tab) => {
                        self.toggle_input();
                    }
                    (_, KeyCode::Esc) => self.current_screen = Screen::List,
                    _ => {
                        // The widget handles the keystroke, the model gets
                        // the resulting value; the model stays authoritative.
                        match self.focused_input {
                            FocusedInput::Title => {
                                self.title_input.handle_event(&event);
                                self.apply(Msg::EditTitle(self.title_input.value().to_string()));
                            }
                            FocusedInput::Content => {
                                self.content_input.handle_event(&event);
                                self.apply(Msg::EditContent(
                                    self.content_input.value().to_string(),
                                ));
                            }
                        };
                    }
                },
            }
        }
    }

    fn apply(&mut self, msg: Msg) {
        for effect in update(&mut self.model, msg) {
            self.run_effect(effect);
        }
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::Persist(note) => {
                let _ = self.storage_tx.send(StorageRequest::Persist(note));
            }
            Effect::Remove(note) => {
                let _ = self.storage_tx.send(StorageRequest::Remove(note));
            }
            Effect::FetchAll => {
                let _ = self.storage_tx.send(StorageRequest::FetchAll);
            }
            Effect::Download {
                filename,
                mime,
                content,
            } => match export::download_string(&self.export_dir, &filename, mime, &content) {
                Ok(path) => {
                    self.model.status = Some(format!("exported to {}", path.display()));
                }
                Err(err) => {
                    warn!("export of '{filename}' failed: {err}");
                    self.model.status = Some(format!("export failed: {err}"));
                }
            },
        }
    }

    fn drain_storage_events(&mut self) {
        while let Ok(StorageEvent::Notes(raw)) = self.storage_rx.try_recv() {
            self.apply(Msg::NotesArrived(raw));
        }
    }

    fn sync_inputs(&mut self) {
        self.title_input = self
            .title_input
            .clone()
            .with_value(self.model.title.clone());
        self.content_input = self
            .content_input
            .clone()
            .with_value(self.model.content.clone());
    }

    fn draw(&self, frame: &mut Frame) {
        match self.current_screen {
            Screen::List => {
                self.render_list(frame);
            }
            Screen::Form => {
                self.render_form(frame);
            }
        }
    }

    fn render_form(&self, frame: &mut Frame) {
        let layout = Layout::default()
            .direction(ratatui::layout::Direction::Vertical)
            .constraints(vec![Constraint::Max(4), Constraint::Min(1)])
            .split(frame.area());

        let inner_content_layout = Layout::default()
            .direction(ratatui::layout::Direction::Vertical)
            .constraints(vec![
                Constraint::Min(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(layout[1]);

        let help_message = Line::from_iter([
            "Esc".bold().yellow(),
            " list, ".to_span(),
            "Ctrl+S".bold().yellow(),
            " save, ".to_span(),
            "Ctrl+D".bold().yellow(),
            " export, ".to_span(),
            "Ctrl+F".bold().yellow(),
            " font, ".to_span(),
            "Tab".bold().yellow(),
            " switch input focus.".to_span(),
        ])
        .centered();

        let font_line = Line::from_iter([
            "Font: ".to_span(),
            self.model.selected_font.as_str().bold().cyan(),
        ])
        .centered();

        let mut title_input =
            Paragraph::new(self.title_input.value()).style(Style::default().bold());

        let mut content_input = Paragraph::new(self.content_input.value());
        let mut input_block = Block::bordered().title("Title");
        let mut content_block = Block::bordered().title("Content");

        match self.focused_input {
            FocusedInput::Title => {
                input_block = input_block.border_style(Style::new().yellow());
                let width = layout[0].width.max(3) - 3;
                let scroll = self.title_input.visual_scroll(width as usize);
                title_input = title_input.scroll((0, scroll as u16));

                let x = self.title_input.visual_cursor().max(scroll) - scroll + 1;
                frame.set_cursor_position((layout[0].x + x as u16, layout[0].y + 1));
            }
            FocusedInput::Content => {
                content_block = content_block.border_style(Style::new().yellow());
                let width = layout[1].width.max(3) - 3;
                let scroll = self.content_input.visual_scroll(width as usize);
                content_input = content_input.scroll((0, scroll as u16));

                let x = self.content_input.visual_cursor().max(scroll) - scroll + 1;
                frame.set_cursor_position((layout[1].x + x as u16, layout[1].y + 1));
            }
        }

        frame.render_widget(title_input.block(input_block), layout[0]);
        frame.render_widget(content_input.block(content_block), inner_content_layout[0]);
        frame.render_widget(font_line, inner_content_layout[1]);
        frame.render_widget(self.footer(help_message), inner_content_layout[2]);
    }

    fn render_list(&self, frame: &mut Frame) {
        let layout = Layout::default()
            .direction(ratatui::layout::Direction::Horizontal)
            .constraints(vec![Constraint::Percentage(30), Constraint::Min(1)])
            .split(frame.area());

        let inner_list_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(vec![Constraint::Min(1), Constraint::Length(1)])
            .split(layout[0]);

        let block = Block::bordered()
            .title("My Notes")
            .border_set(border::THICK);

        let notes_list_items = self.model.saved_notes.iter().enumerate().map(|(i, note)| {
            let item = ListItem::new(Line::from(note.title.as_str())).bold();

            if i == self.list_index {
                item.black().on_white()
            } else {
                item
            }
        });
        let note_details = self.model.saved_notes.get(self.list_index).map(|n| {
            Paragraph::new(n.content.as_str())
                .block(Block::bordered().title(format!("{} ({})", n.title, n.font)))
        });

        let help_message = Line::from_iter([
            "Esc/q".bold().yellow(),
            " exit, ".to_span(),
            "e".bold().yellow(),
            " edit, ".to_span(),
            "a".bold().yellow(),
            " add, ".to_span(),
            "d".bold().red(),
            " delete".to_span(),
        ])
        .centered();

        frame.render_widget(self.footer(help_message), inner_list_layout[1]);
        frame.render_widget(
            List::new(notes_list_items).block(block),
            inner_list_layout[0],
        );
        frame.render_widget(note_details, layout[1]);
    }

    /// The bottom line doubles as the notification area.
    fn footer<'a>(&'a self, help: Line<'a>) -> Line<'a> {
        match &self.model.status {
            Some(status) => Line::from(status.as_str().yellow()).centered(),
            None => help,
        }
    }

    fn toggle_input(&mut self) {
        self.focused_input = match self.focused_input {
            FocusedInput::Title => FocusedInput::Content,
            FocusedInput::Content => FocusedInput::Title,
        };
    }
}
