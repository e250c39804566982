//! # Player Controller
//!
//! UI-facing entry point for playback. Queue edits go straight to the
//! [`Queue`]; transport actions (play/pause, seeking, repeat, shuffle, "play
//! the item at index") are published as [`PlayerCommand`]s for the player
//! connection to execute. State reported back by the player is kept in a
//! `watch` channel.
//!
//! Failures of user-triggered actions (liking, radio) are reported as
//! messages on [`PlayerController::subscribe_messages`]; they never abort
//! playback.

use bridge_traits::playback::RepeatMode;
use core_extension::{ExtensionRegistry, RadioSeed, SharedExtension, StreamableAudio, Track};
use core_playback::{PlaybackError, Queue, QueueEntry};
use core_runtime::events::{CoreEvent, EventBus, LibraryEvent, PlaybackEvent};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, instrument, warn};

const CHANNEL_CAPACITY: usize = 64;

// =============================================================================
// Commands, state and errors
// =============================================================================

/// Transport action for the connected player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerCommand {
    /// `true` plays, `false` pauses.
    PlayPause(bool),
    SeekTo(Duration),
    SeekToNext,
    SeekToPrevious,
    /// Start the queue item at this absolute index.
    PlayIndex(usize),
    SetRepeat(RepeatMode),
    SetShuffle(bool),
}

/// Player state as last reported by the host player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub is_playing: bool,
    pub buffering: bool,
    pub shuffle: bool,
    pub repeat: RepeatMode,
    pub position: Duration,
    pub buffered_position: Duration,
    pub total_duration: Duration,
    pub next_enabled: bool,
    pub previous_enabled: bool,
}

/// A playback failure tied to what was playing when it happened.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct PlayerException {
    pub message: String,
    pub entry: Option<Arc<QueueEntry>>,
    pub current_audio: Option<StreamableAudio>,
}

// =============================================================================
// Controller
// =============================================================================

pub struct PlayerController {
    queue: Arc<Queue>,
    registry: Arc<ExtensionRegistry>,
    event_bus: EventBus,
    commands: broadcast::Sender<PlayerCommand>,
    messages: broadcast::Sender<String>,
    exceptions: broadcast::Sender<PlayerException>,
    list_updates: broadcast::Sender<Vec<Arc<QueueEntry>>>,
    state: watch::Sender<PlayerState>,
    repeat_enabled: AtomicBool,
}

impl PlayerController {
    pub fn new(queue: Arc<Queue>, registry: Arc<ExtensionRegistry>, event_bus: EventBus) -> Self {
        Self {
            queue,
            registry,
            event_bus,
            commands: broadcast::channel(CHANNEL_CAPACITY).0,
            messages: broadcast::channel(CHANNEL_CAPACITY).0,
            exceptions: broadcast::channel(CHANNEL_CAPACITY).0,
            list_updates: broadcast::channel(CHANNEL_CAPACITY).0,
            state: watch::channel(PlayerState::default()).0,
            repeat_enabled: AtomicBool::new(false),
        }
    }

    pub fn queue(&self) -> Arc<Queue> {
        Arc::clone(&self.queue)
    }

    fn send(&self, command: PlayerCommand) {
        debug!(?command, "Player command");
        let _ = self.commands.send(command);
    }

    fn message(&self, text: impl Into<String>) {
        let text = text.into();
        debug!(message = %text, "User message");
        let _ = self.messages.send(text);
    }

    fn emit(&self, event: CoreEvent) {
        let _ = self.event_bus.emit(event);
    }

    // -------------------------------------------------------------------------
    // Queue
    // -------------------------------------------------------------------------

    /// Append `tracks` and, when `play_index` is given, start the track at
    /// that offset within them. Returns the inserted range.
    pub fn play(
        &self,
        client_id: &str,
        tracks: Vec<Track>,
        play_index: Option<usize>,
    ) -> (usize, usize) {
        let (start, count) = self.queue.add_tracks(client_id, tracks, None);
        if let Some(offset) = play_index {
            self.send(PlayerCommand::PlayIndex(start + offset));
        }
        (start, count)
    }

    /// Enqueue `tracks` at the end, or at the front when `end` is `false`.
    pub fn add_to_queue(&self, client_id: &str, tracks: Vec<Track>, end: bool) -> (usize, usize) {
        let index = if end { None } else { Some(0) };
        self.queue.add_tracks(client_id, tracks, index)
    }

    pub fn move_queue_item(&self, from: usize, to: usize) -> bool {
        self.queue.move_track(from, to)
    }

    pub fn remove_queue_item(&self, index: usize) -> bool {
        self.queue.remove_track(index).is_some()
    }

    pub fn clear_queue(&self) {
        self.queue.clear_queue();
    }

    /// Re-synchronise with the list the player holds and its current index.
    pub fn update_list<S: AsRef<str>>(&self, media_ids: &[S], index: Option<usize>) {
        self.queue.update_queue(media_ids);
        self.queue.set_current_index(index);
        let _ = self.list_updates.send(self.queue.entries());
    }

    pub fn current(&self) -> Option<Arc<QueueEntry>> {
        self.queue.current()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.queue.current_index()
    }

    // -------------------------------------------------------------------------
    // Transport
    // -------------------------------------------------------------------------

    pub fn play_pause(&self, play: bool) {
        self.send(PlayerCommand::PlayPause(play));
    }

    pub fn seek_to(&self, position: Duration) {
        self.send(PlayerCommand::SeekTo(position));
    }

    pub fn seek_to_next(&self) {
        self.send(PlayerCommand::SeekToNext);
    }

    pub fn seek_to_previous(&self) {
        self.send(PlayerCommand::SeekToPrevious);
    }

    /// Repeat changes are only forwarded once the UI has enabled repeat.
    pub fn set_repeat_enabled(&self, enabled: bool) {
        self.repeat_enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn set_repeat(&self, mode: RepeatMode) -> bool {
        if !self.repeat_enabled.load(Ordering::SeqCst) {
            debug!(?mode, "Repeat change ignored while disabled");
            return false;
        }
        self.state.send_modify(|state| state.repeat = mode);
        self.send(PlayerCommand::SetRepeat(mode));
        true
    }

    pub fn set_shuffle(&self, enabled: bool) {
        self.state.send_modify(|state| state.shuffle = enabled);
        self.send(PlayerCommand::SetShuffle(enabled));
    }

    // -------------------------------------------------------------------------
    // Library actions
    // -------------------------------------------------------------------------

    /// Ask the owning extension to like or unlike `entry`'s track and return
    /// the resulting like state.
    ///
    /// Nothing happens when the state already matches or the extension has
    /// no library capability. On failure the previous state is kept and
    /// re-published.
    #[instrument(skip(self, entry), fields(track_id = entry.id(), client_id = entry.client_id()))]
    pub async fn like_track(&self, entry: &QueueEntry, liked: bool) -> bool {
        let previous = entry.is_liked();
        if previous == liked {
            return previous;
        }

        let Some(extension) = self.registry.get_client(entry.client_id()) else {
            self.message(PlaybackError::NoClientAvailable(entry.client_id().to_string()).to_string());
            return previous;
        };
        let Some(library) = extension.as_library_client() else {
            debug!("Extension has no library capability");
            return previous;
        };

        let loaded = entry.loaded();
        let track = loaded.as_deref().unwrap_or(entry.unloaded());

        match library.like_track(track, liked).await {
            Ok(now) => {
                entry.set_liked(now);
                self.emit(CoreEvent::Library(LibraryEvent::TrackLiked {
                    client_id: entry.client_id().to_string(),
                    track_id: entry.id().to_string(),
                    liked: now,
                }));
                now
            }
            Err(error) => {
                warn!(error = %error, "Like failed");
                entry.set_liked(previous);
                self.message(error.to_string());
                self.emit(CoreEvent::Library(LibraryEvent::LikeFailed {
                    client_id: entry.client_id().to_string(),
                    track_id: entry.id().to_string(),
                    message: error.to_string(),
                }));
                previous
            }
        }
    }

    /// Build a radio around `seed` with extension `client_id`, enqueue it and
    /// start its first track. Returns the index of that track.
    #[instrument(skip(self, seed), fields(seed = seed.title()))]
    pub async fn radio(&self, client_id: &str, seed: RadioSeed) -> Option<usize> {
        let extension = match self.registry.get_client(client_id) {
            Some(extension) => extension,
            None => {
                self.radio_failed(client_id, PlaybackError::NoClientAvailable(client_id.to_string()));
                return None;
            }
        };
        let Some(radio) = extension.as_radio_client() else {
            self.radio_failed(
                client_id,
                PlaybackError::capability_unsupported(extension.name(), "radio"),
            );
            return None;
        };

        let playlist = match radio.radio(&seed).await {
            Ok(playlist) => playlist,
            Err(error) => {
                self.radio_failed(client_id, PlaybackError::from(error));
                return None;
            }
        };

        if playlist.tracks.is_empty() {
            self.radio_failed(client_id, PlaybackError::EmptyRadio(playlist.title));
            return None;
        }

        let title = playlist.title.clone();
        let (start, count) = self.queue.add_tracks(client_id, playlist.tracks, None);
        self.send(PlayerCommand::PlayIndex(start));
        info!(client_id, title = %title, count, "Radio started");
        self.emit(CoreEvent::Playback(PlaybackEvent::RadioStarted {
            client_id: client_id.to_string(),
            title,
            track_count: count,
        }));
        Some(start)
    }

    fn radio_failed(&self, client_id: &str, error: PlaybackError) {
        warn!(client_id, error = %error, "Radio failed");
        self.message(error.to_string());
        self.emit(CoreEvent::Playback(PlaybackEvent::RadioFailed {
            client_id: client_id.to_string(),
            message: error.to_string(),
        }));
    }

    // -------------------------------------------------------------------------
    // Tracking
    // -------------------------------------------------------------------------

    /// Report that the player started `media_id`.
    pub async fn started_playing(&self, media_id: &str) {
        self.track_media(media_id, TrackerCall::StartedPlaying).await;
    }

    /// Report that `media_id` counts as played.
    pub async fn marked_as_played(&self, media_id: &str) {
        self.track_media(media_id, TrackerCall::MarkedAsPlayed).await;
    }

    /// Notify the owning extension (when it tracks) and every registered
    /// tracker. Each call runs in its own task and this returns once they are
    /// spawned; a failure or panic in one is logged and does not affect the
    /// others.
    async fn track_media(&self, media_id: &str, call: TrackerCall) {
        let Some(entry) = self.queue.get_track(media_id) else {
            debug!(media_id, "Tracking skipped, track not in queue");
            return;
        };
        let Some(owner) = self.registry.get_client(entry.client_id()) else {
            debug!(media_id, "Tracking skipped, owning extension missing");
            return;
        };

        let client_id = owner.id().to_string();
        let track = entry
            .loaded()
            .unwrap_or_else(|| Arc::new(entry.unloaded().clone()));

        self.emit(CoreEvent::Playback(call.event(&track.id, &client_id)));

        let mut targets: Vec<SharedExtension> = Vec::new();
        if owner.as_tracker_client().is_some() {
            targets.push(owner);
        }
        targets.extend(
            self.registry
                .trackers()
                .into_iter()
                .filter(|tracker| tracker.as_tracker_client().is_some()),
        );

        let tasks: Vec<_> = targets
            .into_iter()
            .map(|tracker| {
                let client_id = client_id.clone();
                let track = Arc::clone(&track);
                tokio::spawn(async move {
                    let Some(client) = tracker.as_tracker_client() else {
                        return;
                    };
                    let result = match call {
                        TrackerCall::StartedPlaying => client.on_started_playing(&client_id, &track).await,
                        TrackerCall::MarkedAsPlayed => client.on_marked_as_played(&client_id, &track).await,
                    };
                    if let Err(error) = result {
                        warn!(tracker = tracker.id(), error = %error, "Tracker call failed");
                    }
                })
            })
            .collect();

        // Trackers may be slow or hang; callers never wait on them.
        tokio::spawn(async move {
            for task in tasks {
                if let Err(error) = task.await {
                    warn!(error = %error, "Tracker task aborted");
                }
            }
        });
    }

    // -------------------------------------------------------------------------
    // Errors
    // -------------------------------------------------------------------------

    /// Record a playback failure together with the current entry and audio.
    pub fn create_exception(&self, cause: impl fmt::Display) -> PlayerException {
        let exception = PlayerException {
            message: cause.to_string(),
            entry: self.queue.current(),
            current_audio: self.queue.current_audio(),
        };
        warn!(
            message = %exception.message,
            track_id = exception.entry.as_ref().map(|e| e.id()),
            "Playback error"
        );
        self.emit(CoreEvent::Playback(PlaybackEvent::Error {
            track_id: exception.entry.as_ref().map(|e| e.id().to_string()),
            message: exception.message.clone(),
        }));
        let _ = self.exceptions.send(exception.clone());
        exception
    }

    // -------------------------------------------------------------------------
    // Player state
    // -------------------------------------------------------------------------

    /// Apply a state report from the player.
    pub fn update_state(&self, update: impl FnOnce(&mut PlayerState)) {
        self.state.send_modify(update);
    }

    pub fn state(&self) -> PlayerState {
        self.state.borrow().clone()
    }

    // -------------------------------------------------------------------------
    // Subscriptions
    // -------------------------------------------------------------------------

    pub fn subscribe_commands(&self) -> broadcast::Receiver<PlayerCommand> {
        self.commands.subscribe()
    }

    pub fn subscribe_messages(&self) -> broadcast::Receiver<String> {
        self.messages.subscribe()
    }

    pub fn subscribe_exceptions(&self) -> broadcast::Receiver<PlayerException> {
        self.exceptions.subscribe()
    }

    pub fn subscribe_list_updates(&self) -> broadcast::Receiver<Vec<Arc<QueueEntry>>> {
        self.list_updates.subscribe()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<PlayerState> {
        self.state.subscribe()
    }
}

impl fmt::Debug for PlayerController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerController")
            .field("queue", &self.queue)
            .field("state", &*self.state.borrow())
            .finish()
    }
}

#[derive(Debug, Clone, Copy)]
enum TrackerCall {
    StartedPlaying,
    MarkedAsPlayed,
}

impl TrackerCall {
    fn event(self, track_id: &str, client_id: &str) -> PlaybackEvent {
        let (track_id, client_id) = (track_id.to_string(), client_id.to_string());
        match self {
            TrackerCall::StartedPlaying => PlaybackEvent::StartedPlaying { track_id, client_id },
            TrackerCall::MarkedAsPlayed => PlaybackEvent::MarkedAsPlayed { track_id, client_id },
        }
    }
}
