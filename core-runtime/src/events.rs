//! # Event Bus System
//!
//! Provides an event-driven architecture for the Echo playback core using
//! `tokio::sync::broadcast`. Core modules publish host-facing summaries of what
//! they did; hosts and UI layers subscribe without the modules knowing about
//! them.
//!
//! ## Overview
//!
//! - **Event Types**: Strongly-typed enum hierarchies per domain
//! - **EventBus**: Central broadcast channel for publishing events
//! - **EventStream**: Wrapper for consuming events with filtering
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────┐   emit   ┌───────────┐
//! │ Extension Registry├─────────>│           │
//! └───────────────────┘          │           │   subscribe   ┌────────────┐
//! ┌───────────────────┐   emit   │ EventBus  ├──────────────>│ Host / UI  │
//! │ Playback Queue    ├─────────>│ (broadcast│               └────────────┘
//! └───────────────────┘          │  channel) │   subscribe   ┌────────────┐
//! ┌───────────────────┐   emit   │           ├──────────────>│ Telemetry  │
//! │ Player Controller ├─────────>│           │               └────────────┘
//! └───────────────────┘          └───────────┘
//! ```
//!
//! The queue's structural change stream (entry handles for the host player)
//! is a separate typed channel owned by the queue; the events here are plain
//! serialisable summaries.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, ExtensionEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Extension(ExtensionEvent::Selected {
//!         extension_id: "echo_offline".to_string(),
//!     }))
//!     .ok();
//!
//! let event = stream.recv().await.unwrap();
//! assert_eq!(event.description(), "Extension selected");
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: Subscriber was too slow and missed `n` events.
//!   Non-fatal; the subscriber keeps receiving new events.
//! - **`RecvError::Closed`**: All senders have been dropped. Treat as shutdown.
//!
//! Emitting with no subscribers returns an error; publishers ignore it.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Subscribers that can't keep up will receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Extension registry events
    Extension(ExtensionEvent),
    /// Playback queue events
    Queue(QueueEvent),
    /// Resolution and player events
    Playback(PlaybackEvent),
    /// Library mutations performed through extensions
    Library(LibraryEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Extension(e) => e.description(),
            CoreEvent::Queue(e) => e.description(),
            CoreEvent::Playback(e) => e.description(),
            CoreEvent::Library(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Playback(PlaybackEvent::Error { .. }) => EventSeverity::Error,
            CoreEvent::Playback(PlaybackEvent::RadioFailed { .. }) => EventSeverity::Warning,
            CoreEvent::Library(LibraryEvent::LikeFailed { .. }) => EventSeverity::Warning,
            CoreEvent::Extension(ExtensionEvent::Selected { .. }) => EventSeverity::Info,
            CoreEvent::Playback(PlaybackEvent::RadioStarted { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Extension Events
// ============================================================================

/// Events related to the set of available extensions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum ExtensionEvent {
    /// The whole extension list was replaced.
    ListChanged {
        /// Ids of the extensions now available, in registry order.
        extension_ids: Vec<String>,
    },
    /// A single extension was added or replaced.
    Registered { extension_id: String, name: String },
    /// An extension was removed.
    Unregistered { extension_id: String },
    /// The current extension changed.
    Selected { extension_id: String },
    /// The current selection was cleared (no extensions left).
    SelectionCleared,
    /// The tracker list was replaced.
    TrackersChanged {
        /// Number of registered trackers.
        count: usize,
    },
}

impl ExtensionEvent {
    fn description(&self) -> &str {
        match self {
            ExtensionEvent::ListChanged { .. } => "Extension list changed",
            ExtensionEvent::Registered { .. } => "Extension registered",
            ExtensionEvent::Unregistered { .. } => "Extension unregistered",
            ExtensionEvent::Selected { .. } => "Extension selected",
            ExtensionEvent::SelectionCleared => "Extension selection cleared",
            ExtensionEvent::TrackersChanged { .. } => "Tracker list changed",
        }
    }
}

// ============================================================================
// Queue Events
// ============================================================================

/// Summaries of playback queue mutations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum QueueEvent {
    /// Tracks were inserted starting at `index`.
    TracksAdded {
        client_id: String,
        index: usize,
        count: usize,
    },
    /// The entry at `from` now sits at `to`.
    TrackMoved { from: usize, to: usize },
    /// The entry at `index` was removed.
    TrackRemoved { index: usize },
    /// Every entry was removed.
    Cleared,
    /// The queue was re-synchronised with the player's observed list.
    ListUpdated { len: usize },
    /// The current index changed.
    CurrentIndexChanged { index: Option<usize> },
}

impl QueueEvent {
    fn description(&self) -> &str {
        match self {
            QueueEvent::TracksAdded { .. } => "Tracks added to queue",
            QueueEvent::TrackMoved { .. } => "Queue track moved",
            QueueEvent::TrackRemoved { .. } => "Queue track removed",
            QueueEvent::Cleared => "Queue cleared",
            QueueEvent::ListUpdated { .. } => "Queue synchronised with player",
            QueueEvent::CurrentIndexChanged { .. } => "Current queue index changed",
        }
    }
}

// ============================================================================
// Playback Events
// ============================================================================

/// Events related to stream resolution and player reporting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// A playable stream was resolved for a queued track.
    StreamResolved {
        track_id: String,
        client_id: String,
        /// `true` when the loaded track came from the cache or the queue entry.
        from_cache: bool,
    },
    /// The player reported that a track started playing.
    StartedPlaying { track_id: String, client_id: String },
    /// The player reported that a track counts as played.
    MarkedAsPlayed { track_id: String, client_id: String },
    /// A radio playlist was built and enqueued.
    RadioStarted {
        client_id: String,
        title: String,
        track_count: usize,
    },
    /// Building a radio playlist failed.
    RadioFailed { client_id: String, message: String },
    /// Playback failed.
    Error {
        /// Track id of the current entry, if any.
        track_id: Option<String>,
        message: String,
    },
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::StreamResolved { .. } => "Stream resolved",
            PlaybackEvent::StartedPlaying { .. } => "Track started playing",
            PlaybackEvent::MarkedAsPlayed { .. } => "Track marked as played",
            PlaybackEvent::RadioStarted { .. } => "Radio started",
            PlaybackEvent::RadioFailed { .. } => "Radio failed",
            PlaybackEvent::Error { .. } => "Playback error",
        }
    }
}

// ============================================================================
// Library Events
// ============================================================================

/// Library mutations performed through an extension's library capability.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum LibraryEvent {
    /// A like/unlike call completed; `liked` is the extension's answer.
    TrackLiked {
        client_id: String,
        track_id: String,
        liked: bool,
    },
    /// A like/unlike call failed; the previous like state was kept.
    LikeFailed {
        client_id: String,
        track_id: String,
        message: String,
    },
    /// An extension finished loading its library.
    LibraryLoaded { client_id: String, track_count: usize },
    PlaylistCreated {
        client_id: String,
        playlist_id: String,
        title: String,
    },
    PlaylistDeleted { client_id: String, playlist_id: String },
    PlaylistUpdated { client_id: String, playlist_id: String },
}

impl LibraryEvent {
    fn description(&self) -> &str {
        match self {
            LibraryEvent::TrackLiked { .. } => "Track like state changed",
            LibraryEvent::LikeFailed { .. } => "Track like failed",
            LibraryEvent::LibraryLoaded { .. } => "Library loaded",
            LibraryEvent::PlaylistCreated { .. } => "Playlist created",
            LibraryEvent::PlaylistDeleted { .. } => "Playlist deleted",
            LibraryEvent::PlaylistUpdated { .. } => "Playlist updated",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central broadcast channel for core events.
///
/// Cheap to clone; all clones publish into the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// When a subscriber falls behind by more than `capacity` events it
    /// receives `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// if there are no active subscribers.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let event_bus = EventBus::new(100);
/// let queue_only = EventStream::new(event_bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Queue(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` will be returned.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive a matching event without waiting.
    ///
    /// Returns `None` if no matching event is currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
