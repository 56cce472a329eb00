use crate::domain::error::LinkTermResult;
use async_trait::async_trait;

/// Outcome of feeding one input event to the line editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditStep {
    /// Input consumed, nothing for the session to do.
    More,
    /// End of input or an interrupt key: the session ends.
    EofOrError,
    /// The operator abandoned the current line.
    CancelLine,
    /// The operator pressed enter on this line.
    LineComplete(String),
}

/// Interactive line editor driven by the session loop.
///
/// The session never reads the local console itself. It waits on
/// [`input_ready`](LineEditor::input_ready) and then feeds exactly one step.
#[async_trait(?Send)]
pub trait LineEditor {
    /// Resolves when local input (or its end) is available. Must be cancel-safe:
    /// the loop drops this future whenever the transport becomes ready first.
    async fn input_ready(&mut self) -> LinkTermResult<()>;

    fn feed_edit_step(&mut self) -> LinkTermResult<EditStep>;

    /// Begin a fresh line with `prompt` and draw it.
    fn start_edit(&mut self, prompt: &str) -> LinkTermResult<()>;

    /// Finish the current line and restore the terminal. Safe to call when no
    /// line is being edited.
    fn stop_edit(&mut self) -> LinkTermResult<()>;

    /// Remove the in-progress line from the screen so output can be printed.
    fn hide(&mut self) -> LinkTermResult<()>;

    /// Redraw the in-progress line after [`hide`](LineEditor::hide).
    fn show(&mut self) -> LinkTermResult<()>;

    fn history_add(&mut self, line: &str);
}
