//! Page session actor.
//!
//! One [`PageSession`] task runs per page. It owns the lifecycle state
//! machine, the current [`OverlayInstance`], the location watcher feed and
//! the store subscription, and handles all of them from a single
//! `tokio::select!` loop. All overlay work is therefore serialized; store
//! calls are the only suspension points inside a handler.
//!
//! Callers talk to the task through a cloneable [`SessionHandle`].

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use ytnote_core::types::NoteId;
use ytnote_core::{Note, PageSnapshot};
use ytnote_events::EntryChange;
use ytnote_store::{AnnotationStore, StorageBackend, StoreError};

use crate::bridge::{self, Propagation};
use crate::config::OverlayConfig;
use crate::error::SessionError;
use crate::host::{HostPage, MediaPlayer};
use crate::lifecycle::{AttachPolicy, Lifecycle, LifecycleAction, LifecycleState};
use crate::markers::{player_container, seek_or_open, MarkerSpec};
use crate::overlay::{OverlayEvent, OverlayInstance};
use crate::panel::PanelView;
use crate::watcher::{LocationChange, LocationWatcher, PollPolicy};

/// Buffer for commands sent to a session.
const COMMAND_CHANNEL_CAPACITY: usize = 32;

type Reply<T> = oneshot::Sender<Result<T, SessionError>>;

/// Requests handled by the session task.
#[derive(Debug)]
pub enum SessionCommand {
    /// Open or close the panel. Replies with the new open state.
    TogglePanel { reply: Reply<bool> },
    /// The pointer entered (`true`) or left the panel.
    SetHovered(bool),
    /// A click landed outside both the panel and its button.
    DismissPanel,
    /// Save a note at the current playback position.
    SaveNote { text: String, reply: Reply<Option<Note>> },
    EditNote {
        note_id: NoteId,
        text: String,
        reply: Reply<Option<Note>>,
    },
    DeleteNote { note_id: NoteId, reply: Reply<Note> },
    /// A marker or list row was clicked. Replies `false` if the note is gone.
    SeekToNote { note_id: NoteId, reply: Reply<bool> },
    Snapshot { reply: oneshot::Sender<SessionSnapshot> },
}

/// Diagnostic view of a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub lifecycle: LifecycleState,
    pub location: Option<String>,
    pub panel: Option<PanelView>,
    pub panel_ticking: bool,
    pub markers: Vec<MarkerSpec>,
    pub awaiting_metadata: bool,
}

impl SessionSnapshot {
    pub fn attached_video(&self) -> Option<&str> {
        match &self.lifecycle {
            LifecycleState::Attached { video_id } => Some(video_id),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionHandle
// ---------------------------------------------------------------------------

/// Cloneable handle to a running [`PageSession`].
///
/// The session stops when [`SessionHandle::shutdown`] is called or when
/// every handle has been dropped.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    cancel: CancellationToken,
}

impl SessionHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(make(tx))
            .await
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    pub async fn toggle_panel(&self) -> Result<bool, SessionError> {
        self.request(|reply| SessionCommand::TogglePanel { reply }).await?
    }

    pub async fn set_hovered(&self, hovered: bool) -> Result<(), SessionError> {
        self.commands
            .send(SessionCommand::SetHovered(hovered))
            .await
            .map_err(|_| SessionError::Closed)
    }

    /// Close the panel, as a click anywhere else on the page does.
    pub async fn dismiss_panel(&self) -> Result<(), SessionError> {
        self.commands
            .send(SessionCommand::DismissPanel)
            .await
            .map_err(|_| SessionError::Closed)
    }

    /// Save `text` at the current playback position. Blank text saves
    /// nothing and yields `Ok(None)`.
    pub async fn save_note(&self, text: impl Into<String>) -> Result<Option<Note>, SessionError> {
        let text = text.into();
        self.request(|reply| SessionCommand::SaveNote { text, reply })
            .await?
    }

    pub async fn edit_note(
        &self,
        note_id: impl Into<NoteId>,
        text: impl Into<String>,
    ) -> Result<Option<Note>, SessionError> {
        let (note_id, text) = (note_id.into(), text.into());
        self.request(|reply| SessionCommand::EditNote {
            note_id,
            text,
            reply,
        })
        .await?
    }

    pub async fn delete_note(&self, note_id: impl Into<NoteId>) -> Result<Note, SessionError> {
        let note_id = note_id.into();
        self.request(|reply| SessionCommand::DeleteNote { note_id, reply })
            .await?
    }

    pub async fn seek_to_note(&self, note_id: impl Into<NoteId>) -> Result<bool, SessionError> {
        let note_id = note_id.into();
        self.request(|reply| SessionCommand::SeekToNote { note_id, reply })
            .await?
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        self.request(|reply| SessionCommand::Snapshot { reply }).await
    }

    /// Stop the session and tear the overlay down.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}

// ---------------------------------------------------------------------------
// PageSession
// ---------------------------------------------------------------------------

pub struct PageSession<H: HostPage, B: StorageBackend> {
    host: Arc<H>,
    store: Arc<AnnotationStore<B>>,
    config: OverlayConfig,
    lifecycle: Lifecycle,
    overlay: Option<OverlayInstance<H>>,
    location: Option<String>,
    attach_deadline: Option<Instant>,
    locations: mpsc::Receiver<LocationChange>,
    changes: broadcast::Receiver<EntryChange>,
    changes_open: bool,
    commands: mpsc::Receiver<SessionCommand>,
    cancel: CancellationToken,
}

impl<H: HostPage, B: StorageBackend> PageSession<H, B> {
    /// Start a session for `host`.
    pub fn spawn(
        host: Arc<H>,
        store: Arc<AnnotationStore<B>>,
        config: OverlayConfig,
    ) -> (SessionHandle, JoinHandle<()>) {
        let cancel = CancellationToken::new();
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);

        let changes = store.subscribe();
        let locations = LocationWatcher::spawn(
            Arc::clone(&host),
            PollPolicy::from(&config),
            cancel.clone(),
        );

        let session = Self {
            lifecycle: Lifecycle::new(AttachPolicy::from(&config)),
            host,
            store,
            config,
            overlay: None,
            location: None,
            attach_deadline: None,
            locations,
            changes,
            changes_open: true,
            commands: command_rx,
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(session.run());

        let handle = SessionHandle {
            commands: command_tx,
            cancel,
        };
        (handle, task)
    }

    async fn run(mut self) {
        tracing::info!("Page session started");

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                Some(change) = self.locations.recv() => self.on_location(change).await,
                _ = sleep_until(self.attach_deadline) => {
                    self.attach_deadline = None;
                    self.on_attach_due().await;
                }
                received = self.changes.recv(), if self.changes_open => {
                    self.on_store_change(received).await;
                }
                event = next_overlay_event(self.overlay.as_mut()) => {
                    self.on_overlay_event(event).await;
                }
                command = self.commands.recv() => match command {
                    Some(command) => self.on_command(command).await,
                    None => break,
                },
            }
        }

        self.cancel.cancel();
        self.overlay = None;
        tracing::info!("Page session stopped");
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    async fn on_location(&mut self, change: LocationChange) {
        tracing::debug!(url = %change.url, video_id = ?change.video_id, "Location observed");
        self.location = Some(change.url);
        let actions = self.lifecycle.on_location(change.video_id);
        self.apply(actions).await;
    }

    async fn on_attach_due(&mut self) {
        let found = player_container(self.host.as_ref()).is_some();
        let actions = self.lifecycle.on_attach_due(found);
        self.apply(actions).await;
    }

    async fn apply(&mut self, actions: Vec<LifecycleAction>) {
        for action in actions {
            match action {
                LifecycleAction::Detach { video_id } => {
                    tracing::debug!(%video_id, "Detaching overlay");
                    self.overlay = None;
                }
                LifecycleAction::ScheduleAttach { video_id, after } => {
                    tracing::debug!(
                        %video_id,
                        after_ms = after.as_millis() as u64,
                        "Attach scheduled"
                    );
                    self.attach_deadline = Some(Instant::now() + after);
                }
                LifecycleAction::CancelAttach => {
                    self.attach_deadline = None;
                }
                LifecycleAction::Attach { video_id } => {
                    // Never two overlays at once.
                    self.overlay = None;
                    let mut overlay =
                        OverlayInstance::attach(Arc::clone(&self.host), &video_id, &self.config);
                    bridge::refresh(&mut overlay, &self.store).await;
                    self.overlay = Some(overlay);
                }
                LifecycleAction::GiveUp { video_id, attempts } => {
                    tracing::info!(%video_id, attempts, "Player not found, overlay not attached");
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Store and overlay events
    // -----------------------------------------------------------------------

    async fn on_store_change(
        &mut self,
        received: Result<EntryChange, broadcast::error::RecvError>,
    ) {
        match bridge::classify(&received, self.lifecycle.attached_video()) {
            Propagation::Refresh => self.refresh().await,
            Propagation::Ignore => {}
            Propagation::Closed => {
                tracing::warn!("Store change channel closed, live updates stopped");
                self.changes_open = false;
            }
        }
    }

    async fn on_overlay_event(&mut self, event: OverlayEvent) {
        let Some(overlay) = self.overlay.as_mut() else {
            return;
        };
        if overlay.handle(event) {
            bridge::refresh(overlay, &self.store).await;
        }
    }

    async fn refresh(&mut self) {
        if let Some(overlay) = self.overlay.as_mut() {
            bridge::refresh(overlay, &self.store).await;
        }
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    async fn on_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::TogglePanel { reply } => {
                let result = match self.overlay.as_mut() {
                    Some(overlay) => Ok(overlay.toggle_panel()),
                    None => Err(SessionError::NotAttached),
                };
                let _ = reply.send(result);
            }
            SessionCommand::SetHovered(hovered) => {
                if let Some(overlay) = self.overlay.as_mut() {
                    overlay.set_hovered(hovered);
                }
            }
            SessionCommand::DismissPanel => {
                if let Some(overlay) = self.overlay.as_mut() {
                    if overlay.dismiss_panel() {
                        tracing::debug!("Panel dismissed");
                    }
                }
            }
            SessionCommand::SaveNote { text, reply } => {
                let result = self.save_note(&text).await;
                let _ = reply.send(result);
            }
            SessionCommand::EditNote {
                note_id,
                text,
                reply,
            } => {
                let result = match self.attached_video() {
                    Ok(video_id) => self.store.update_note(&video_id, &note_id, &text).await,
                    Err(e) => {
                        let _ = reply.send(Err(e));
                        return;
                    }
                };
                let _ = reply.send(self.after_mutation(result).await);
            }
            SessionCommand::DeleteNote { note_id, reply } => {
                let result = match self.attached_video() {
                    Ok(video_id) => self.store.delete_note(&video_id, &note_id).await,
                    Err(e) => {
                        let _ = reply.send(Err(e));
                        return;
                    }
                };
                let _ = reply.send(self.after_mutation(result).await);
            }
            SessionCommand::SeekToNote { note_id, reply } => {
                let result = self.seek_to_note(&note_id).await;
                let _ = reply.send(result);
            }
            SessionCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    fn attached_video(&self) -> Result<String, SessionError> {
        self.lifecycle
            .attached_video()
            .map(str::to_string)
            .ok_or(SessionError::NotAttached)
    }

    async fn save_note(&mut self, text: &str) -> Result<Option<Note>, SessionError> {
        let video_id = self.attached_video()?;
        let time = match self.host.player() {
            Some(player) => player.current_time(),
            None => {
                tracing::warn!(%video_id, "No active player, saving note at 0:00");
                0.0
            }
        };
        let page = PageSnapshot::new(self.host.title(), self.host.location());
        let result = self.store.add_note(&video_id, time, text, &page).await;
        self.after_mutation(result).await
    }

    /// Re-render after a write, whether it landed or raced with another.
    async fn after_mutation<T>(
        &mut self,
        result: Result<T, StoreError>,
    ) -> Result<T, SessionError> {
        match &result {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {
                tracing::debug!(error = %e, "Note vanished before the write, re-rendering");
            }
            Err(e) => {
                tracing::error!(error = %e, "Note write failed");
            }
        }
        self.refresh().await;
        Ok(result?)
    }

    async fn seek_to_note(&mut self, note_id: &str) -> Result<bool, SessionError> {
        let video_id = self.attached_video()?;
        let entry = self.store.get_entry(&video_id).await;
        match entry.as_ref().and_then(|e| e.note(note_id).map(|n| (n.time, &e.url))) {
            Some((time, url)) => {
                seek_or_open(self.host.as_ref(), time, url);
                Ok(true)
            }
            None => {
                self.refresh().await;
                Ok(false)
            }
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        let overlay = self.overlay.as_ref();
        SessionSnapshot {
            lifecycle: self.lifecycle.state().clone(),
            location: self.location.clone(),
            panel: overlay.and_then(|o| o.panel()).map(|p| p.view().clone()),
            panel_ticking: overlay
                .and_then(|o| o.panel())
                .is_some_and(|p| p.is_ticking()),
            markers: overlay.map(|o| o.markers().to_vec()).unwrap_or_default(),
            awaiting_metadata: overlay.is_some_and(|o| o.awaiting_metadata()),
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn next_overlay_event<H: HostPage>(overlay: Option<&mut OverlayInstance<H>>) -> OverlayEvent {
    match overlay {
        Some(overlay) => overlay.next_event().await,
        None => std::future::pending().await,
    }
}
