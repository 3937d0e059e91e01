// Session event loop - debounced pointer and edit events applied in order
use crate::application::debounce::debounce;
use crate::application::highlight::Highlight;
use crate::application::mark_persister::MarkPersister;
use crate::application::mark_store::{AddOutcome, EditOutcome};
use crate::application::session::{ChartSession, HoverView, Pointer};
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Move(Pointer),
    Leave,
}

/// Channels feeding one session.
pub struct SessionInputs {
    pub pointer: mpsc::Receiver<PointerEvent>,
    pub clicks: mpsc::Receiver<Pointer>,
    pub edits: mpsc::Receiver<String>,
    pub saves: mpsc::Receiver<()>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    Hover(HoverView),
    Idle(Highlight),
    MarkAdded(AddOutcome),
    MarksEdited(EditOutcome),
    /// Save requested while the marks do not fit the budget.
    SaveBlocked(String),
}

#[derive(Debug, Clone, Copy)]
pub struct DebounceWindows {
    pub pointer: Duration,
    pub edit: Duration,
}

impl Default for DebounceWindows {
    fn default() -> Self {
        Self {
            pointer: Duration::from_millis(30),
            edit: Duration::from_millis(300),
        }
    }
}

/// Runs until every input channel is closed. Pointer moves and edits are
/// collapsed to the last event of each burst; clicks and saves are applied
/// as they come.
pub async fn run(
    session: &mut ChartSession,
    inputs: SessionInputs,
    updates: mpsc::Sender<SessionUpdate>,
    persister: MarkPersister,
    windows: DebounceWindows,
) {
    let pointer = debounce(ReceiverStream::new(inputs.pointer), windows.pointer).fuse();
    let edits = debounce(ReceiverStream::new(inputs.edits), windows.edit).fuse();
    let mut clicks = ReceiverStream::new(inputs.clicks).fuse();
    let mut saves = ReceiverStream::new(inputs.saves).fuse();
    futures::pin_mut!(pointer, edits);

    loop {
        let update = tokio::select! {
            Some(event) = pointer.next() => match event {
                PointerEvent::Move(p) => session.hover(p).map(SessionUpdate::Hover),
                PointerEvent::Leave => Some(SessionUpdate::Idle(session.leave())),
            },
            Some(p) = clicks.next() => session.click(p).map(SessionUpdate::MarkAdded),
            Some(text) = edits.next() => Some(SessionUpdate::MarksEdited(session.edit_marks(&text))),
            Some(()) = saves.next() => match session.marks().persist_payload() {
                Some(payload) => {
                    persister.submit(payload);
                    None
                }
                None => session.marks().warning().map(|w| SessionUpdate::SaveBlocked(w.to_string())),
            },
            else => break,
        };
        if let Some(update) = update {
            if updates.send(update).await.is_err() {
                tracing::debug!("Session update receiver dropped, stopping");
                break;
            }
        }
    }
}
