//! Integration tests for the player controller and player connection

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::playback::{PlayerAdapter, PlayerMediaItem, RepeatMode};
use core_extension::{
    Extension, ExtensionError, ExtensionMetadata, ExtensionRegistry, Genre, LibraryClient,
    MediaItemsContainer, PagedData, Playlist, RadioClient, RadioSeed, Result, StreamableAudio,
    Track, TrackerClient,
};
use core_playback::Queue;
use core_runtime::events::{CoreEvent, EventBus, LibraryEvent, PlaybackEvent};
use core_service::{connect_player, PlayerCommand, PlayerController};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

// ============================================================================
// Test Extensions
// ============================================================================

/// Extension with library, radio and tracker capabilities.
struct LibraryExtension {
    metadata: ExtensionMetadata,
    fail_like: bool,
    fail_radio: bool,
    radio_tracks: Vec<Track>,
    like_calls: AtomicUsize,
    tracked: Arc<Mutex<Vec<String>>>,
}

impl LibraryExtension {
    fn new(id: &str) -> Self {
        Self {
            metadata: ExtensionMetadata::new(id, format!("{id} extension")),
            fail_like: false,
            fail_radio: false,
            radio_tracks: tracks(&["r1", "r2", "r3"]),
            like_calls: AtomicUsize::new(0),
            tracked: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl LibraryClient for LibraryExtension {
    async fn library_genres(&self) -> Result<Vec<Genre>> {
        Ok(Vec::new())
    }

    fn library_feed(&self, _genre: Option<&Genre>) -> PagedData<MediaItemsContainer> {
        PagedData::empty()
    }

    async fn library_tracks(&self) -> Result<Vec<Track>> {
        Ok(Vec::new())
    }

    async fn like_track(&self, _track: &Track, liked: bool) -> Result<bool> {
        self.like_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_like {
            return Err(ExtensionError::Unavailable("likes".to_string()));
        }
        Ok(liked)
    }

    async fn create_playlist(&self, title: &str, _description: Option<&str>) -> Result<Playlist> {
        Ok(Playlist::new(title, title))
    }

    async fn delete_playlist(&self, _playlist: &Playlist) -> Result<()> {
        Ok(())
    }

    async fn add_tracks_to_playlist(&self, _playlist: &Playlist, _tracks: &[Track]) -> Result<()> {
        Ok(())
    }

    async fn remove_tracks_from_playlist(
        &self,
        _playlist: &Playlist,
        _indexes: &[usize],
    ) -> Result<()> {
        Ok(())
    }

    async fn move_track_in_playlist(
        &self,
        _playlist: &Playlist,
        _from: usize,
        _to: usize,
    ) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl RadioClient for LibraryExtension {
    async fn radio(&self, seed: &RadioSeed) -> Result<Playlist> {
        if self.fail_radio {
            return Err(ExtensionError::Unavailable("radio".to_string()));
        }
        Ok(Playlist::new("", format!("{} Radio", seed.title())).with_tracks(self.radio_tracks.clone()))
    }
}

#[async_trait]
impl TrackerClient for LibraryExtension {
    async fn on_started_playing(&self, client_id: &str, track: &Track) -> Result<()> {
        self.tracked
            .lock()
            .push(format!("{}:started:{client_id}:{}", self.metadata.id, track.id));
        Ok(())
    }

    async fn on_marked_as_played(&self, client_id: &str, track: &Track) -> Result<()> {
        self.tracked
            .lock()
            .push(format!("{}:played:{client_id}:{}", self.metadata.id, track.id));
        Ok(())
    }
}

#[async_trait]
impl Extension for LibraryExtension {
    fn metadata(&self) -> &ExtensionMetadata {
        &self.metadata
    }

    fn as_library_client(&self) -> Option<&dyn LibraryClient> {
        Some(self)
    }

    fn as_radio_client(&self) -> Option<&dyn RadioClient> {
        Some(self)
    }

    fn as_tracker_client(&self) -> Option<&dyn TrackerClient> {
        Some(self)
    }
}

/// Tracker that fails or panics on every call.
struct BrokenTracker {
    metadata: ExtensionMetadata,
    panic: bool,
}

#[async_trait]
impl TrackerClient for BrokenTracker {
    async fn on_started_playing(&self, _client_id: &str, _track: &Track) -> Result<()> {
        if self.panic {
            panic!("tracker exploded");
        }
        Err(ExtensionError::Unavailable("scrobbler".to_string()))
    }

    async fn on_marked_as_played(&self, _client_id: &str, _track: &Track) -> Result<()> {
        Err(ExtensionError::Unavailable("scrobbler".to_string()))
    }
}

#[async_trait]
impl Extension for BrokenTracker {
    fn metadata(&self) -> &ExtensionMetadata {
        &self.metadata
    }

    fn as_tracker_client(&self) -> Option<&dyn TrackerClient> {
        Some(self)
    }
}

/// Tracker whose calls never complete.
struct HangingTracker {
    metadata: ExtensionMetadata,
}

#[async_trait]
impl TrackerClient for HangingTracker {
    async fn on_started_playing(&self, _client_id: &str, _track: &Track) -> Result<()> {
        std::future::pending().await
    }

    async fn on_marked_as_played(&self, _client_id: &str, _track: &Track) -> Result<()> {
        std::future::pending().await
    }
}

#[async_trait]
impl Extension for HangingTracker {
    fn metadata(&self) -> &ExtensionMetadata {
        &self.metadata
    }

    fn as_tracker_client(&self) -> Option<&dyn TrackerClient> {
        Some(self)
    }
}

/// Extension without any capability.
struct PlainExtension {
    metadata: ExtensionMetadata,
}

#[async_trait]
impl Extension for PlainExtension {
    fn metadata(&self) -> &ExtensionMetadata {
        &self.metadata
    }
}

/// Poll `tracked` until it holds at least `count` records.
async fn wait_for_records(tracked: &Mutex<Vec<String>>, count: usize) -> Vec<String> {
    tokio::time::timeout(Duration::from_secs(1), async {
        loop {
            let records = tracked.lock().clone();
            if records.len() >= count {
                return records;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("tracker records")
}

fn tracks(ids: &[&str]) -> Vec<Track> {
    ids.iter().map(|id| Track::new(*id, format!("Song {id}"))).collect()
}

// ============================================================================
// Recording Player
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Add(usize, Vec<String>),
    Move(usize, usize),
    Remove(usize),
    Clear,
    Prepare,
    Play,
    Pause,
    Stop,
    PlayWhenReady(bool),
    SeekTo(Duration),
    SeekToDefault(usize),
    Next,
    Previous,
    Repeat(RepeatMode),
    Shuffle(bool),
}

/// Player that keeps a playlist of media ids and reports every call.
struct RecordingPlayer {
    playlist: Mutex<Vec<String>>,
    calls: mpsc::UnboundedSender<Call>,
}

impl RecordingPlayer {
    fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Call>) {
        let (calls, rx) = mpsc::unbounded_channel();
        let player = Arc::new(Self {
            playlist: Mutex::new(Vec::new()),
            calls,
        });
        (player, rx)
    }

    fn record(&self, call: Call) -> BridgeResult<()> {
        let _ = self.calls.send(call);
        Ok(())
    }

    fn playlist(&self) -> Vec<String> {
        self.playlist.lock().clone()
    }
}

#[async_trait]
impl PlayerAdapter for RecordingPlayer {
    async fn add_media_items(&self, index: usize, items: Vec<PlayerMediaItem>) -> BridgeResult<()> {
        let ids: Vec<String> = items.into_iter().map(|item| item.media_id).collect();
        {
            let mut playlist = self.playlist.lock();
            for (offset, id) in ids.iter().enumerate() {
                playlist.insert(index + offset, id.clone());
            }
        }
        self.record(Call::Add(index, ids))
    }

    async fn move_media_item(&self, from: usize, to: usize) -> BridgeResult<()> {
        {
            let mut playlist = self.playlist.lock();
            let id = playlist.remove(from);
            playlist.insert(to, id);
        }
        self.record(Call::Move(from, to))
    }

    async fn remove_media_item(&self, index: usize) -> BridgeResult<()> {
        self.playlist.lock().remove(index);
        self.record(Call::Remove(index))
    }

    async fn clear_media_items(&self) -> BridgeResult<()> {
        self.playlist.lock().clear();
        self.record(Call::Clear)
    }

    async fn media_item_count(&self) -> BridgeResult<usize> {
        Ok(self.playlist.lock().len())
    }

    async fn prepare(&self) -> BridgeResult<()> {
        self.record(Call::Prepare)
    }

    async fn play(&self) -> BridgeResult<()> {
        self.record(Call::Play)
    }

    async fn pause(&self) -> BridgeResult<()> {
        self.record(Call::Pause)
    }

    async fn stop(&self) -> BridgeResult<()> {
        self.record(Call::Stop)
    }

    async fn set_play_when_ready(&self, play_when_ready: bool) -> BridgeResult<()> {
        self.record(Call::PlayWhenReady(play_when_ready))
    }

    async fn seek_to(&self, position: Duration) -> BridgeResult<()> {
        self.record(Call::SeekTo(position))
    }

    async fn seek_to_default_position(&self, index: usize) -> BridgeResult<()> {
        self.record(Call::SeekToDefault(index))
    }

    async fn seek_to_next(&self) -> BridgeResult<()> {
        self.record(Call::Next)
    }

    async fn seek_to_previous(&self) -> BridgeResult<()> {
        self.record(Call::Previous)
    }

    async fn set_repeat_mode(&self, mode: RepeatMode) -> BridgeResult<()> {
        self.record(Call::Repeat(mode))
    }

    async fn set_shuffle_mode(&self, enabled: bool) -> BridgeResult<()> {
        self.record(Call::Shuffle(enabled))
    }
}

async fn next_calls(rx: &mut mpsc::UnboundedReceiver<Call>, count: usize) -> Vec<Call> {
    let mut calls = Vec::with_capacity(count);
    for _ in 0..count {
        let call = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("player call timed out")
            .expect("player channel closed");
        calls.push(call);
    }
    calls
}

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

// ============================================================================
// Fixture
// ============================================================================

struct Fixture {
    registry: Arc<ExtensionRegistry>,
    queue: Arc<Queue>,
    controller: PlayerController,
    events: tokio::sync::broadcast::Receiver<CoreEvent>,
}

impl Fixture {
    fn new() -> Self {
        Self::with_queue(Queue::new())
    }

    fn with_queue(queue: Queue) -> Self {
        let event_bus = EventBus::new(64);
        let events = event_bus.subscribe();
        let registry = Arc::new(ExtensionRegistry::new());
        let queue = Arc::new(queue);
        let controller = PlayerController::new(Arc::clone(&queue), Arc::clone(&registry), event_bus);
        Self {
            registry,
            queue,
            controller,
            events,
        }
    }

    fn drain_events(&mut self) -> Vec<CoreEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    fn queue_ids(&self) -> Vec<String> {
        self.queue.entries().iter().map(|e| e.id().to_string()).collect()
    }
}

// ============================================================================
// Controller
// ============================================================================

#[tokio::test]
async fn test_play_appends_and_requests_absolute_index() {
    let fixture = Fixture::new();
    let mut commands = fixture.controller.subscribe_commands();

    fixture.controller.play("ext", tracks(&["a", "b"]), None);
    let (start, count) = fixture.controller.play("ext", tracks(&["c", "d", "e"]), Some(1));

    assert_eq!((start, count), (2, 3));
    assert_eq!(fixture.queue_ids(), ids(&["a", "b", "c", "d", "e"]));
    assert_eq!(commands.try_recv().unwrap(), PlayerCommand::PlayIndex(3));
    assert!(commands.try_recv().is_err());
}

#[tokio::test]
async fn test_add_to_queue_front_or_end() {
    let fixture = Fixture::new();
    fixture.controller.add_to_queue("ext", tracks(&["a"]), true);
    fixture.controller.add_to_queue("ext", tracks(&["b"]), true);
    let (index, _) = fixture.controller.add_to_queue("ext", tracks(&["c"]), false);

    assert_eq!(index, 0);
    assert_eq!(fixture.queue_ids(), ids(&["c", "a", "b"]));

    assert!(fixture.controller.move_queue_item(0, 2));
    assert!(fixture.controller.remove_queue_item(0));
    assert!(!fixture.controller.remove_queue_item(5));
    assert_eq!(fixture.queue_ids(), ids(&["b", "c"]));

    fixture.controller.clear_queue();
    assert!(fixture.queue.is_empty());
}

#[tokio::test]
async fn test_repeat_forwarded_only_when_enabled() {
    let fixture = Fixture::new();
    let mut commands = fixture.controller.subscribe_commands();

    assert!(!fixture.controller.set_repeat(RepeatMode::All));
    assert!(commands.try_recv().is_err());
    assert_eq!(fixture.controller.state().repeat, RepeatMode::Off);

    fixture.controller.set_repeat_enabled(true);
    assert!(fixture.controller.set_repeat(RepeatMode::One));
    assert_eq!(
        commands.try_recv().unwrap(),
        PlayerCommand::SetRepeat(RepeatMode::One)
    );
    assert_eq!(fixture.controller.state().repeat, RepeatMode::One);

    fixture.controller.set_shuffle(true);
    assert_eq!(commands.try_recv().unwrap(), PlayerCommand::SetShuffle(true));
    assert!(fixture.controller.state().shuffle);
}

#[tokio::test]
async fn test_update_state_is_observable() {
    let fixture = Fixture::new();
    let mut state = fixture.controller.subscribe_state();

    fixture.controller.update_state(|s| {
        s.is_playing = true;
        s.position = Duration::from_secs(42);
        s.next_enabled = true;
    });

    assert!(state.has_changed().unwrap());
    let current = state.borrow_and_update().clone();
    assert!(current.is_playing);
    assert_eq!(current.position, Duration::from_secs(42));
    assert!(current.next_enabled);
    assert!(!current.previous_enabled);
}

#[tokio::test]
async fn test_like_track_updates_entry_and_emits_event() {
    let mut fixture = Fixture::new();
    let extension = Arc::new(LibraryExtension::new("ext"));
    fixture.registry.register(extension.clone()).await.unwrap();
    fixture.drain_events();

    fixture.controller.add_to_queue("ext", tracks(&["a"]), true);
    let entry = fixture.queue.get_track("a").unwrap();
    let mut liked = entry.subscribe_liked();

    assert!(fixture.controller.like_track(&entry, true).await);
    assert!(entry.is_liked());
    assert!(liked.has_changed().unwrap());

    // Already liked: no extension call.
    assert!(fixture.controller.like_track(&entry, true).await);
    assert_eq!(extension.like_calls.load(Ordering::SeqCst), 1);

    let events = fixture.drain_events();
    assert!(events.contains(&CoreEvent::Library(LibraryEvent::TrackLiked {
        client_id: "ext".to_string(),
        track_id: "a".to_string(),
        liked: true,
    })));
}

#[tokio::test]
async fn test_like_failure_keeps_state_and_reports_message() {
    let fixture = Fixture::new();
    let extension = LibraryExtension {
        fail_like: true,
        ..LibraryExtension::new("ext")
    };
    fixture.registry.register(Arc::new(extension)).await.unwrap();
    let mut messages = fixture.controller.subscribe_messages();

    fixture.controller.add_to_queue("ext", tracks(&["a"]), true);
    let entry = fixture.queue.get_track("a").unwrap();
    let mut liked = entry.subscribe_liked();

    assert!(!fixture.controller.like_track(&entry, true).await);
    assert!(!entry.is_liked());
    // The old state is re-published so views can revert.
    assert!(liked.has_changed().unwrap());
    assert!(messages.try_recv().unwrap().contains("likes"));
}

#[tokio::test]
async fn test_like_without_library_capability_is_noop() {
    let fixture = Fixture::new();
    fixture
        .registry
        .register(Arc::new(PlainExtension {
            metadata: ExtensionMetadata::new("plain", "Plain"),
        }))
        .await
        .unwrap();

    fixture.controller.add_to_queue("plain", tracks(&["a"]), true);
    let entry = fixture.queue.get_track("a").unwrap();

    assert!(!fixture.controller.like_track(&entry, true).await);
    assert!(!entry.is_liked());
}

#[tokio::test]
async fn test_radio_enqueues_and_plays_first_track() {
    let mut fixture = Fixture::new();
    fixture
        .registry
        .register(Arc::new(LibraryExtension::new("ext")))
        .await
        .unwrap();
    fixture.controller.add_to_queue("ext", tracks(&["a"]), true);
    let mut commands = fixture.controller.subscribe_commands();
    fixture.drain_events();

    let index = fixture
        .controller
        .radio("ext", RadioSeed::Track(Track::new("a", "Song a")))
        .await;

    assert_eq!(index, Some(1));
    assert_eq!(fixture.queue_ids(), ids(&["a", "r1", "r2", "r3"]));
    assert_eq!(commands.try_recv().unwrap(), PlayerCommand::PlayIndex(1));
    assert!(fixture.drain_events().iter().any(|event| matches!(
        event,
        CoreEvent::Playback(PlaybackEvent::RadioStarted { track_count: 3, .. })
    )));
}

#[tokio::test]
async fn test_radio_failures_become_messages() {
    let fixture = Fixture::new();
    fixture
        .registry
        .register(Arc::new(LibraryExtension {
            fail_radio: true,
            ..LibraryExtension::new("broken")
        }))
        .await
        .unwrap();
    fixture
        .registry
        .register(Arc::new(LibraryExtension {
            radio_tracks: Vec::new(),
            ..LibraryExtension::new("empty")
        }))
        .await
        .unwrap();
    fixture
        .registry
        .register(Arc::new(PlainExtension {
            metadata: ExtensionMetadata::new("plain", "Plain"),
        }))
        .await
        .unwrap();
    let mut messages = fixture.controller.subscribe_messages();
    let seed = RadioSeed::Track(Track::new("a", "Song a"));

    assert_eq!(fixture.controller.radio("broken", seed.clone()).await, None);
    assert_eq!(fixture.controller.radio("empty", seed.clone()).await, None);
    assert_eq!(fixture.controller.radio("plain", seed.clone()).await, None);
    assert_eq!(fixture.controller.radio("missing", seed).await, None);

    assert!(fixture.queue.is_empty());
    let received: Vec<String> = (0..4).filter_map(|_| messages.try_recv().ok()).collect();
    assert_eq!(received.len(), 4);
    assert!(received[0].starts_with("Extension call failed"));
    assert_eq!(received[1], "Radio has no tracks: Song a Radio");
    assert_eq!(received[2], "Plain does not support radio");
}

#[tokio::test]
async fn test_trackers_are_isolated_from_each_other() {
    let fixture = Fixture::new();
    let owner = Arc::new(LibraryExtension::new("ext"));
    let scrobbler = Arc::new(LibraryExtension::new("scrobbler"));
    fixture.registry.register(owner.clone()).await.unwrap();
    fixture.registry.set_trackers(vec![
        Arc::new(BrokenTracker {
            metadata: ExtensionMetadata::new("panicky", "Panicky"),
            panic: true,
        }) as Arc<dyn Extension>,
        Arc::new(BrokenTracker {
            metadata: ExtensionMetadata::new("failing", "Failing"),
            panic: false,
        }) as Arc<dyn Extension>,
        scrobbler.clone() as Arc<dyn Extension>,
    ]);

    fixture.controller.add_to_queue("ext", tracks(&["a"]), true);
    fixture.controller.started_playing("a").await;
    fixture.controller.marked_as_played("a").await;
    fixture.controller.started_playing("not-queued").await;

    let mut owner_records = wait_for_records(&owner.tracked, 2).await;
    owner_records.sort();
    assert_eq!(
        owner_records,
        vec!["ext:played:ext:a".to_string(), "ext:started:ext:a".to_string()]
    );
    let mut scrobbler_records = wait_for_records(&scrobbler.tracked, 2).await;
    scrobbler_records.sort();
    assert_eq!(
        scrobbler_records,
        vec![
            "scrobbler:played:ext:a".to_string(),
            "scrobbler:started:ext:a".to_string()
        ]
    );
}

#[tokio::test]
async fn test_hanging_tracker_does_not_block_playback_reports() {
    let fixture = Fixture::new();
    let owner = Arc::new(LibraryExtension::new("ext"));
    fixture.registry.register(owner.clone()).await.unwrap();
    fixture.registry.set_trackers(vec![Arc::new(HangingTracker {
        metadata: ExtensionMetadata::new("stuck", "Stuck"),
    }) as Arc<dyn Extension>]);
    fixture.controller.add_to_queue("ext", tracks(&["a"]), true);

    tokio::time::timeout(Duration::from_secs(1), async {
        fixture.controller.started_playing("a").await;
        fixture.controller.marked_as_played("a").await;
    })
    .await
    .expect("tracking must not wait for trackers");

    assert_eq!(wait_for_records(&owner.tracked, 2).await.len(), 2);
}

#[tokio::test]
async fn test_update_list_follows_player_order() {
    let fixture = Fixture::new();
    let mut updates = fixture.controller.subscribe_list_updates();
    fixture.controller.add_to_queue("ext", tracks(&["a", "b", "c"]), true);

    fixture.controller.update_list(&["c", "a", "gone"], Some(1));

    assert_eq!(fixture.queue_ids(), ids(&["c", "a"]));
    assert_eq!(fixture.controller.current_index(), Some(1));
    assert_eq!(fixture.controller.current().unwrap().id(), "a");
    let published: Vec<String> = updates
        .try_recv()
        .unwrap()
        .iter()
        .map(|e| e.id().to_string())
        .collect();
    assert_eq!(published, ids(&["c", "a"]));
}

#[tokio::test]
async fn test_create_exception_captures_current_playback() {
    let mut fixture = Fixture::new();
    let mut exceptions = fixture.controller.subscribe_exceptions();
    fixture.controller.add_to_queue("ext", tracks(&["a", "b"]), true);
    fixture.queue.set_current_index(Some(1));
    fixture
        .queue
        .set_current_audio(StreamableAudio::from_uri("https://cdn.example/b.mp3"));
    fixture.drain_events();

    let exception = fixture.controller.create_exception("decoder failed");

    assert_eq!(exception.to_string(), "decoder failed");
    assert_eq!(exception.entry.as_ref().unwrap().id(), "b");
    assert!(exception.current_audio.as_ref().unwrap().is_remote());
    assert_eq!(exceptions.try_recv().unwrap().message, "decoder failed");
    assert!(fixture
        .drain_events()
        .contains(&CoreEvent::Playback(PlaybackEvent::Error {
            track_id: Some("b".to_string()),
            message: "decoder failed".to_string(),
        })));
}

// ============================================================================
// Player connection
// ============================================================================

#[tokio::test]
async fn test_connection_mirrors_queue_changes_in_order() {
    let fixture = Fixture::new();
    let (player, mut calls) = RecordingPlayer::new();
    let connection = connect_player(&fixture.controller, player.clone());

    fixture.controller.play("ext", tracks(&["a", "b"]), Some(1));
    assert_eq!(
        next_calls(&mut calls, 4).await,
        vec![
            Call::Add(0, ids(&["a", "b"])),
            Call::Prepare,
            Call::PlayWhenReady(true),
            Call::SeekToDefault(1),
        ]
    );

    fixture.controller.add_to_queue("ext", tracks(&["c"]), false);
    fixture.controller.move_queue_item(0, 2);
    fixture.controller.remove_queue_item(1);
    assert_eq!(
        next_calls(&mut calls, 5).await,
        vec![
            Call::Add(0, ids(&["c"])),
            Call::Prepare,
            Call::PlayWhenReady(true),
            Call::Move(0, 2),
            Call::Remove(1),
        ]
    );
    assert_eq!(player.playlist(), ids(&["a", "c"]));
    assert_eq!(player.playlist(), fixture.queue_ids());

    fixture.controller.clear_queue();
    assert_eq!(
        next_calls(&mut calls, 3).await,
        vec![Call::Pause, Call::Clear, Call::Stop]
    );

    connection.abort();
}

#[tokio::test]
async fn test_connection_executes_transport_commands() {
    let fixture = Fixture::new();
    let (player, mut calls) = RecordingPlayer::new();
    let connection = connect_player(&fixture.controller, player);

    fixture.controller.play_pause(true);
    fixture.controller.play_pause(false);
    fixture.controller.seek_to(Duration::from_secs(30));
    fixture.controller.seek_to_next();
    fixture.controller.seek_to_previous();
    fixture.controller.set_shuffle(true);

    assert_eq!(
        next_calls(&mut calls, 8).await,
        vec![
            Call::Play,
            Call::Pause,
            Call::SeekTo(Duration::from_secs(30)),
            Call::Next,
            Call::PlayWhenReady(true),
            Call::Previous,
            Call::PlayWhenReady(true),
            Call::Shuffle(true),
        ]
    );

    connection.abort();
}

#[tokio::test]
async fn test_clearing_an_empty_player_makes_no_calls() {
    let fixture = Fixture::new();
    let (player, mut calls) = RecordingPlayer::new();
    let connection = connect_player(&fixture.controller, player);

    fixture.controller.clear_queue();
    fixture.controller.play_pause(true);

    assert_eq!(next_calls(&mut calls, 1).await, vec![Call::Play]);
    connection.abort();
}

#[tokio::test]
async fn test_connection_starts_from_existing_queue() {
    let fixture = Fixture::new();
    fixture.controller.add_to_queue("ext", tracks(&["a", "b"]), true);
    let (player, mut calls) = RecordingPlayer::new();

    let connection = connect_player(&fixture.controller, player.clone());

    assert_eq!(
        next_calls(&mut calls, 2).await,
        vec![Call::Add(0, ids(&["a", "b"])), Call::Prepare]
    );
    assert_eq!(player.playlist(), ids(&["a", "b"]));
    connection.abort();
}

#[tokio::test]
async fn test_lagging_connection_resyncs_from_snapshot() {
    let fixture = Fixture::with_queue(Queue::with_capacity(2));
    let (player, mut calls) = RecordingPlayer::new();
    let connection = connect_player(&fixture.controller, player.clone());

    // The connection task has not run yet on this single-threaded runtime,
    // so these overflow its change buffer.
    for id in ["a", "b", "c", "d", "e"] {
        fixture.controller.add_to_queue("ext", tracks(&[id]), true);
    }
    fixture.controller.play_pause(true);

    assert_eq!(
        next_calls(&mut calls, 3).await,
        vec![
            Call::Add(0, ids(&["a", "b", "c", "d", "e"])),
            Call::Prepare,
            Call::Play,
        ]
    );
    assert_eq!(player.playlist(), fixture.queue_ids());
    connection.abort();
}

#[tokio::test]
async fn test_connection_ends_with_controller() {
    let fixture = Fixture::new();
    let (player, _calls) = RecordingPlayer::new();
    let connection = connect_player(&fixture.controller, player);

    drop(fixture);

    tokio::time::timeout(Duration::from_secs(2), connection)
        .await
        .expect("connection did not stop")
        .unwrap();
}
