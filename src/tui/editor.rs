use super::history::History;
use super::input::InputBuffer;
use crate::core::session::{EditStep, LineEditor};
use crate::domain::error::{LinkTermError, LinkTermResult};
use async_trait::async_trait;
use crossterm::{
    cursor::MoveToColumn,
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    queue,
    style::Print,
    terminal::{self, disable_raw_mode, enable_raw_mode, ClearType},
};
use futures::StreamExt;
use std::collections::VecDeque;
use std::io::{self, Stdout, Write};
use tracing::debug;

fn editor_error(e: impl std::fmt::Display) -> LinkTermError {
    LinkTermError::Editor(e.to_string())
}

/// Raw-mode line editor on the controlling terminal.
///
/// Raw mode is only held while a line is being edited and visible, so
/// received lines printed between [`hide`](LineEditor::hide) and
/// [`show`](LineEditor::show) get normal newline translation.
pub struct TerminalEditor {
    events: EventStream,
    pending: VecDeque<Event>,
    input: InputBuffer,
    history: History,
    browse: Option<usize>,
    draft: String,
    prompt: String,
    editing: bool,
    hidden: bool,
    exhausted: bool,
    out: Stdout,
}

impl TerminalEditor {
    pub fn new(history: History) -> Self {
        Self {
            events: EventStream::new(),
            pending: VecDeque::new(),
            input: InputBuffer::new(),
            history,
            browse: None,
            draft: String::new(),
            prompt: String::new(),
            editing: false,
            hidden: false,
            exhausted: false,
            out: io::stdout(),
        }
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn into_history(mut self) -> History {
        std::mem::replace(&mut self.history, History::new(0))
    }

    fn redraw(&mut self) -> LinkTermResult<()> {
        if !self.editing || self.hidden {
            return Ok(());
        }
        let column = self.prompt.chars().count() + self.input.cursor_position();
        queue!(
            self.out,
            MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            Print(&self.prompt),
            Print(self.input.content()),
            MoveToColumn(u16::try_from(column).unwrap_or(u16::MAX)),
        )
        .map_err(editor_error)?;
        self.out.flush().map_err(editor_error)
    }

    fn recall(&mut self, older: bool) -> bool {
        let next = match (self.browse, older) {
            (None, true) => 0,
            (None, false) => return false,
            (Some(i), true) => i + 1,
            (Some(0), false) => {
                self.browse = None;
                let draft = std::mem::take(&mut self.draft);
                self.input.set(&draft);
                return true;
            }
            (Some(i), false) => i - 1,
        };
        let Some(entry) = self.history.recent(next).map(str::to_string) else {
            return false;
        };
        if self.browse.is_none() {
            self.draft = self.input.content().to_string();
        }
        self.browse = Some(next);
        self.input.set(&entry);
        true
    }

    fn on_key(&mut self, key: KeyEvent) -> LinkTermResult<EditStep> {
        if key.kind != KeyEventKind::Press {
            return Ok(EditStep::More);
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Enter => {
                self.browse = None;
                self.draft.clear();
                let line = self.input.content().to_string();
                return Ok(EditStep::LineComplete(line));
            }
            KeyCode::Esc => return Ok(EditStep::CancelLine),
            KeyCode::Char('c') if ctrl => return Ok(EditStep::EofOrError),
            KeyCode::Char('d') if ctrl && self.input.is_empty() => {
                return Ok(EditStep::EofOrError)
            }
            KeyCode::Up => {
                if self.recall(true) {
                    self.redraw()?;
                }
            }
            KeyCode::Down => {
                if self.recall(false) {
                    self.redraw()?;
                }
            }
            _ => {
                if self.input.handle_key(key) {
                    self.redraw()?;
                }
            }
        }
        Ok(EditStep::More)
    }
}

#[async_trait(?Send)]
impl LineEditor for TerminalEditor {
    async fn input_ready(&mut self) -> LinkTermResult<()> {
        if !self.pending.is_empty() || self.exhausted {
            return Ok(());
        }
        match self.events.next().await {
            Some(Ok(event)) => self.pending.push_back(event),
            Some(Err(e)) => return Err(editor_error(e)),
            None => {
                debug!("Terminal event stream ended");
                self.exhausted = true;
            }
        }
        Ok(())
    }

    fn feed_edit_step(&mut self) -> LinkTermResult<EditStep> {
        let Some(event) = self.pending.pop_front() else {
            return Ok(if self.exhausted {
                EditStep::EofOrError
            } else {
                EditStep::More
            });
        };
        match event {
            Event::Key(key) => self.on_key(key),
            Event::Paste(text) => {
                self.input.insert_str(&text);
                self.redraw()?;
                Ok(EditStep::More)
            }
            Event::Resize(_, _) => {
                self.redraw()?;
                Ok(EditStep::More)
            }
            _ => Ok(EditStep::More),
        }
    }

    fn start_edit(&mut self, prompt: &str) -> LinkTermResult<()> {
        self.prompt = prompt.to_string();
        self.input.clear();
        self.browse = None;
        self.draft.clear();
        enable_raw_mode().map_err(editor_error)?;
        self.editing = true;
        self.hidden = false;
        self.redraw()
    }

    fn stop_edit(&mut self) -> LinkTermResult<()> {
        if !self.editing {
            return Ok(());
        }
        self.editing = false;
        if !self.hidden {
            queue!(self.out, Print("\r\n")).map_err(editor_error)?;
            self.out.flush().map_err(editor_error)?;
        }
        self.hidden = false;
        disable_raw_mode().map_err(editor_error)
    }

    fn hide(&mut self) -> LinkTermResult<()> {
        if !self.editing || self.hidden {
            return Ok(());
        }
        queue!(
            self.out,
            MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine)
        )
        .map_err(editor_error)?;
        self.out.flush().map_err(editor_error)?;
        self.hidden = true;
        disable_raw_mode().map_err(editor_error)
    }

    fn show(&mut self) -> LinkTermResult<()> {
        if !self.editing || !self.hidden {
            return Ok(());
        }
        enable_raw_mode().map_err(editor_error)?;
        self.hidden = false;
        self.redraw()
    }

    fn history_add(&mut self, line: &str) {
        self.history.push(line);
    }
}

impl Drop for TerminalEditor {
    fn drop(&mut self) {
        if self.editing && !self.hidden {
            let _ = disable_raw_mode();
        }
    }
}
