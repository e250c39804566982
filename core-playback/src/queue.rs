//! # Playback Queue
//!
//! Ordered list of [`QueueEntry`] values shared with the host player.
//!
//! Every structural mutation (add, move, remove, clear) is applied and then
//! published as a [`QueueChange`] while the queue lock is still held, so a
//! subscriber replaying the changes in order always reconstructs the same
//! list. The player adapter mirrors these changes 1:1 onto its own playlist.
//!
//! ## Current index
//!
//! The queue also tracks the index of the playing entry. Structural edits
//! remap it so it keeps pointing at the same entry:
//!
//! - inserting at or before the current index shifts it forward
//! - removing an entry before it shifts it back
//! - removing the current entry keeps the index, so the following entry
//!   becomes current; past the end it clamps to the last entry, and an empty
//!   queue has no current index
//! - moving follows the moved entry
//! - clearing resets it to `None`

use bridge_traits::playback::PlayerMediaItem;
use core_extension::{StreamableAudio, Track};
use core_runtime::events::{CoreEvent, EventBus, QueueEvent};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::{debug, trace};
use uuid::Uuid;

/// Capacity of the structural change channel.
pub const DEFAULT_CHANGE_BUFFER_SIZE: usize = 256;

/// `PlayerMediaItem::extra` key holding the entry key.
pub const ENTRY_KEY_EXTRA: &str = "echo.entry_key";
/// `PlayerMediaItem::extra` key holding the owning client id.
pub const CLIENT_ID_EXTRA: &str = "echo.client_id";

// =============================================================================
// Queue entry
// =============================================================================

/// One queued track: the light reference it was enqueued with plus its
/// lazily resolved full form and like state.
///
/// Entries are shared as `Arc<QueueEntry>`; moving an entry inside the queue
/// moves the same allocation.
pub struct QueueEntry {
    key: String,
    client_id: String,
    unloaded: Track,
    loaded: watch::Sender<Option<Arc<Track>>>,
    liked: watch::Sender<bool>,
}

impl QueueEntry {
    pub fn new(client_id: impl Into<String>, unloaded: Track) -> Self {
        let liked = unloaded.liked;
        Self {
            key: Uuid::new_v4().to_string(),
            client_id: client_id.into(),
            unloaded,
            loaded: watch::channel(None).0,
            liked: watch::channel(liked).0,
        }
    }

    /// Unique key of this entry; distinct even when the same track is queued
    /// twice.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Id of the extension that owns the track.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Track id. This is also the media id handed to the player.
    pub fn id(&self) -> &str {
        &self.unloaded.id
    }

    pub fn unloaded(&self) -> &Track {
        &self.unloaded
    }

    pub fn loaded(&self) -> Option<Arc<Track>> {
        self.loaded.borrow().clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.borrow().is_some()
    }

    /// Record the loaded track. Only the first call has an effect; it also
    /// copies the track's like state. Returns `true` if this call set it.
    pub fn set_loaded(&self, track: Arc<Track>) -> bool {
        let liked = track.liked;
        let first = self.loaded.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(track);
            true
        });
        if first {
            self.liked.send_replace(liked);
        }
        first
    }

    pub fn subscribe_loaded(&self) -> watch::Receiver<Option<Arc<Track>>> {
        self.loaded.subscribe()
    }

    pub fn is_liked(&self) -> bool {
        *self.liked.borrow()
    }

    pub fn set_liked(&self, liked: bool) {
        self.liked.send_replace(liked);
    }

    pub fn subscribe_liked(&self) -> watch::Receiver<bool> {
        self.liked.subscribe()
    }

    /// Player-facing description, built from the loaded track when present.
    pub fn to_media_item(&self) -> PlayerMediaItem {
        let loaded = self.loaded();
        let track = loaded.as_deref().unwrap_or(&self.unloaded);

        let mut item = PlayerMediaItem::new(self.id(), track.title.as_str());
        item.artist = track.first_artist_name().map(str::to_string);
        item.album = track.album.as_ref().map(|album| album.title.clone());
        item.artwork_uri = track.cover.clone();
        item.duration_ms = track.duration_ms;
        item.with_extra(ENTRY_KEY_EXTRA, self.key.as_str())
            .with_extra(CLIENT_ID_EXTRA, self.client_id.as_str())
    }
}

impl fmt::Debug for QueueEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueEntry")
            .field("key", &self.key)
            .field("client_id", &self.client_id)
            .field("track_id", &self.unloaded.id)
            .field("loaded", &self.is_loaded())
            .field("liked", &self.is_liked())
            .finish()
    }
}

// =============================================================================
// Change notifications
// =============================================================================

/// Structural change applied to the queue, in the order it happened.
#[derive(Debug, Clone)]
pub enum QueueChange {
    Added {
        index: usize,
        entries: Vec<Arc<QueueEntry>>,
    },
    Moved {
        from: usize,
        to: usize,
    },
    Removed {
        index: usize,
    },
    Cleared,
}

// =============================================================================
// Queue
// =============================================================================

pub struct Queue {
    entries: Mutex<Vec<Arc<QueueEntry>>>,
    changes: broadcast::Sender<QueueChange>,
    current_index: watch::Sender<Option<usize>>,
    current_audio: watch::Sender<Option<StreamableAudio>>,
    event_bus: Option<EventBus>,
}

impl Queue {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANGE_BUFFER_SIZE)
    }

    /// `capacity` bounds how far a change subscriber may fall behind before
    /// it observes `Lagged`.
    pub fn with_capacity(capacity: usize) -> Self {
        let (changes, _) = broadcast::channel(capacity.max(1));
        Self {
            entries: Mutex::new(Vec::new()),
            changes,
            current_index: watch::channel(None).0,
            current_audio: watch::channel(None).0,
            event_bus: None,
        }
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    fn emit(&self, event: QueueEvent) {
        if let Some(bus) = &self.event_bus {
            let _ = bus.emit(CoreEvent::Queue(event));
        }
    }

    fn publish(&self, change: QueueChange) {
        // Nobody listening is fine; the change is already applied.
        let _ = self.changes.send(change);
    }

    fn update_current_index(&self, index: Option<usize>) {
        let changed = self.current_index.send_if_modified(|current| {
            if *current == index {
                return false;
            }
            *current = index;
            true
        });
        if changed {
            trace!(?index, "Current queue index changed");
            self.emit(QueueEvent::CurrentIndexChanged { index });
        }
    }

    // -------------------------------------------------------------------------
    // Structural mutations
    // -------------------------------------------------------------------------

    /// Wrap `tracks` in new entries owned by `client_id` and insert them at
    /// `at_index` (clamped to the queue length; `None` appends).
    ///
    /// Returns the inserted range as `(start, count)`.
    pub fn add_tracks(
        &self,
        client_id: &str,
        tracks: Vec<Track>,
        at_index: Option<usize>,
    ) -> (usize, usize) {
        let mut entries = self.entries.lock();
        let index = at_index.map_or(entries.len(), |index| index.min(entries.len()));
        let count = tracks.len();
        if count == 0 {
            return (index, 0);
        }

        let added: Vec<Arc<QueueEntry>> = tracks
            .into_iter()
            .map(|track| Arc::new(QueueEntry::new(client_id, track)))
            .collect();
        entries.splice(index..index, added.iter().cloned());

        let current = *self.current_index.borrow();
        self.update_current_index(index_after_add(current, index, count));
        self.publish(QueueChange::Added {
            index,
            entries: added,
        });
        debug!(client_id, index, count, len = entries.len(), "Tracks added to queue");
        self.emit(QueueEvent::TracksAdded {
            client_id: client_id.to_string(),
            index,
            count,
        });

        (index, count)
    }

    /// Move the entry at `from` to `to`. Out-of-range indexes are ignored
    /// and publish nothing. Returns whether the queue changed.
    pub fn move_track(&self, from: usize, to: usize) -> bool {
        let mut entries = self.entries.lock();
        if from >= entries.len() || to >= entries.len() {
            trace!(from, to, len = entries.len(), "Ignoring out-of-range move");
            return false;
        }

        let entry = entries.remove(from);
        entries.insert(to, entry);

        let current = *self.current_index.borrow();
        self.update_current_index(index_after_move(current, from, to));
        self.publish(QueueChange::Moved { from, to });
        debug!(from, to, "Queue track moved");
        self.emit(QueueEvent::TrackMoved { from, to });
        true
    }

    /// Remove the entry at `index`. Out-of-range indexes are ignored and
    /// publish nothing.
    pub fn remove_track(&self, index: usize) -> Option<Arc<QueueEntry>> {
        let mut entries = self.entries.lock();
        if index >= entries.len() {
            trace!(index, len = entries.len(), "Ignoring out-of-range remove");
            return None;
        }

        let removed = entries.remove(index);

        let current = *self.current_index.borrow();
        self.update_current_index(index_after_remove(current, index, entries.len()));
        self.publish(QueueChange::Removed { index });
        debug!(index, track_id = removed.id(), "Queue track removed");
        self.emit(QueueEvent::TrackRemoved { index });
        Some(removed)
    }

    pub fn clear_queue(&self) {
        let mut entries = self.entries.lock();
        entries.clear();

        self.update_current_index(None);
        self.publish(QueueChange::Cleared);
        debug!("Queue cleared");
        self.emit(QueueEvent::Cleared);
    }

    /// Reconcile the queue with the order the player actually holds.
    ///
    /// `ids` are media ids (track ids) as reported by the player. Entries are
    /// matched in order, each entry used at most once, so duplicated tracks
    /// keep their identity. Entries the player no longer lists are dropped,
    /// as are ids with no matching entry. The current index follows its entry
    /// when that entry survives.
    ///
    /// No [`QueueChange`] is published: the player already has this state.
    pub fn update_queue<S: AsRef<str>>(&self, ids: &[S]) {
        let mut entries = self.entries.lock();
        let current_key = self
            .current_index
            .borrow()
            .and_then(|index| entries.get(index))
            .map(|entry| entry.key.clone());

        let mut pool: Vec<Option<Arc<QueueEntry>>> = entries.drain(..).map(Some).collect();
        let mut reordered = Vec::with_capacity(ids.len());
        for id in ids {
            let id = id.as_ref();
            let slot = pool
                .iter_mut()
                .find(|slot| matches!(slot, Some(entry) if entry.id() == id));
            match slot.and_then(Option::take) {
                Some(entry) => reordered.push(entry),
                None => debug!(track_id = id, "Player lists a track the queue does not know"),
            }
        }
        *entries = reordered;

        let current = current_key
            .and_then(|key| entries.iter().position(|entry| entry.key == key))
            .or_else(|| {
                let index = (*self.current_index.borrow())?;
                (!entries.is_empty()).then(|| index.min(entries.len() - 1))
            });
        self.update_current_index(current);

        debug!(len = entries.len(), "Queue synchronised with player");
        self.emit(QueueEvent::ListUpdated { len: entries.len() });
    }

    // -------------------------------------------------------------------------
    // Lookups
    // -------------------------------------------------------------------------

    /// First entry whose track id is `id`.
    pub fn get_track(&self, id: &str) -> Option<Arc<QueueEntry>> {
        self.entries
            .lock()
            .iter()
            .find(|entry| entry.id() == id)
            .cloned()
    }

    pub fn get_entry(&self, key: &str) -> Option<Arc<QueueEntry>> {
        self.entries
            .lock()
            .iter()
            .find(|entry| entry.key == key)
            .cloned()
    }

    pub fn entry_at(&self, index: usize) -> Option<Arc<QueueEntry>> {
        self.entries.lock().get(index).cloned()
    }

    /// Snapshot of the current entries.
    pub fn entries(&self) -> Vec<Arc<QueueEntry>> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Subscribe to structural changes from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<QueueChange> {
        self.changes.subscribe()
    }

    /// Subscribe to structural changes together with the entries they apply
    /// to. Replaying the changes on top of the snapshot reproduces the queue.
    pub fn snapshot_and_subscribe(&self) -> (Vec<Arc<QueueEntry>>, broadcast::Receiver<QueueChange>) {
        let entries = self.entries.lock();
        (entries.clone(), self.changes.subscribe())
    }

    // -------------------------------------------------------------------------
    // Current index / audio
    // -------------------------------------------------------------------------

    /// Set the playing index. An index past the end is ignored.
    pub fn set_current_index(&self, index: Option<usize>) -> bool {
        let entries = self.entries.lock();
        if let Some(index) = index {
            if index >= entries.len() {
                trace!(index, len = entries.len(), "Ignoring out-of-range current index");
                return false;
            }
        }
        self.update_current_index(index);
        true
    }

    pub fn current_index(&self) -> Option<usize> {
        *self.current_index.borrow()
    }

    pub fn subscribe_current_index(&self) -> watch::Receiver<Option<usize>> {
        self.current_index.subscribe()
    }

    /// Entry at the current index.
    pub fn current(&self) -> Option<Arc<QueueEntry>> {
        let entries = self.entries.lock();
        self.current_index
            .borrow()
            .and_then(|index| entries.get(index).cloned())
    }

    /// Audio most recently handed to the player.
    pub fn current_audio(&self) -> Option<StreamableAudio> {
        self.current_audio.borrow().clone()
    }

    pub fn set_current_audio(&self, audio: StreamableAudio) {
        self.current_audio.send_replace(Some(audio));
    }

    pub fn subscribe_current_audio(&self) -> watch::Receiver<Option<StreamableAudio>> {
        self.current_audio.subscribe()
    }
}

impl Default for Queue {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queue")
            .field("len", &self.len())
            .field("current_index", &self.current_index())
            .finish()
    }
}

// =============================================================================
// Index remapping
// =============================================================================

fn index_after_add(current: Option<usize>, index: usize, count: usize) -> Option<usize> {
    current.map(|current| if index <= current { current + count } else { current })
}

fn index_after_move(current: Option<usize>, from: usize, to: usize) -> Option<usize> {
    current.map(|current| {
        if current == from {
            to
        } else if from < current && to >= current {
            current - 1
        } else if from > current && to <= current {
            current + 1
        } else {
            current
        }
    })
}

fn index_after_remove(current: Option<usize>, removed: usize, new_len: usize) -> Option<usize> {
    let current = current?;
    if new_len == 0 {
        return None;
    }
    if removed < current {
        Some(current - 1)
    } else {
        Some(current.min(new_len - 1))
    }
}
