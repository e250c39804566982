//! # Track Resolver
//!
//! Turns a player's data request for a queued track into playable audio.
//!
//! ## Resolution steps
//!
//! 1. A request that already carries audio is a replay: the audio is reused.
//! 2. The queue entry is found by the request's media id (the track id).
//! 3. The owning extension is looked up in the registry and must expose
//!    track loading.
//! 4. The loaded track comes from the entry, the cache, or a fresh load
//!    (which is persisted).
//! 5. A stream descriptor is chosen by the stream-quality preference.
//! 6. The extension resolves that descriptor into audio.
//! 7. The audio becomes the queue's current audio and is attached to the
//!    request.
//!
//! Every failure aborts this one resolution. Nothing is retried here.

use bridge_traits::storage::SettingsStore;
use core_extension::{ExtensionRegistry, StreamableAudio, Track, TrackClient};
use core_runtime::config::STREAM_QUALITY_KEY;
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use std::fmt;
use std::sync::Arc;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::{debug, instrument, warn};

use crate::cache::TrackCache;
use crate::error::{PlaybackError, Result};
use crate::quality::{select_stream, StreamQuality};
use crate::queue::{Queue, QueueEntry};

/// Opaque playback request issued by the player for one media item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRequest {
    /// Media id the player was given, i.e. the track id.
    pub media_id: String,
    /// Audio from an earlier resolution of this request.
    pub audio: Option<StreamableAudio>,
}

impl DataRequest {
    pub fn new(media_id: impl Into<String>) -> Self {
        Self {
            media_id: media_id.into(),
            audio: None,
        }
    }

    pub fn with_audio(mut self, audio: StreamableAudio) -> Self {
        self.audio = Some(audio);
        self
    }
}

pub struct TrackResolver {
    queue: Arc<Queue>,
    registry: Arc<ExtensionRegistry>,
    cache: Arc<TrackCache>,
    settings: Arc<dyn SettingsStore>,
    default_quality: StreamQuality,
    event_bus: Option<EventBus>,
}

impl TrackResolver {
    pub fn new(
        queue: Arc<Queue>,
        registry: Arc<ExtensionRegistry>,
        cache: Arc<TrackCache>,
        settings: Arc<dyn SettingsStore>,
        default_quality: StreamQuality,
    ) -> Self {
        Self {
            queue,
            registry,
            cache,
            settings,
            default_quality,
            event_bus: None,
        }
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Resolve `request` into audio, returning the request with the audio
    /// attached.
    #[instrument(skip(self, request), fields(media_id = %request.media_id))]
    pub async fn resolve(&self, request: DataRequest) -> Result<DataRequest> {
        if let Some(audio) = &request.audio {
            debug!(audio = %audio.redacted(), "Reusing audio attached to request");
            self.queue.set_current_audio(audio.clone());
            return Ok(request);
        }

        let entry = self
            .queue
            .get_track(&request.media_id)
            .ok_or_else(|| PlaybackError::TrackNotFound(request.media_id.clone()))?;

        let extension = self
            .registry
            .get_client(entry.client_id())
            .ok_or_else(|| PlaybackError::NoClientAvailable(entry.client_id().to_string()))?;

        let client = extension
            .as_track_client()
            .ok_or_else(|| PlaybackError::capability_unsupported(extension.name(), "track loading"))?;

        let (track, from_cache) = self.loaded_track(&entry, client).await?;

        let quality = self.stream_quality().await;
        let streamable = select_stream(&track.audio_streamables, &quality)
            .ok_or_else(|| PlaybackError::NoStreamsFound(track.id.clone()))?;
        debug!(
            streamable = %streamable.id,
            quality = streamable.quality,
            preference = %quality,
            "Selected stream"
        );

        let audio = client.get_streamable_audio(streamable).await?;
        self.queue.set_current_audio(audio.clone());

        debug!(
            remote = audio.is_remote(),
            audio = %audio.redacted(),
            from_cache,
            "Stream resolved"
        );
        self.emit(PlaybackEvent::StreamResolved {
            track_id: entry.id().to_string(),
            client_id: entry.client_id().to_string(),
            from_cache,
        });

        Ok(request.with_audio(audio))
    }

    /// Blocking form of [`resolve`](Self::resolve) for player engines that
    /// fetch data on their own threads.
    ///
    /// From a thread outside the runtime this blocks on `handle`. From a
    /// worker of a multi-threaded runtime the worker is handed off first.
    /// A current-thread runtime cannot block and gets an error.
    pub fn resolve_blocking(&self, handle: &Handle, request: DataRequest) -> Result<DataRequest> {
        match Handle::try_current() {
            Err(_) => handle.block_on(self.resolve(request)),
            Ok(current) if current.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(self.resolve(request)))
            }
            Ok(_) => Err(PlaybackError::Internal(
                "blocking resolution is not possible on a current-thread runtime".to_string(),
            )),
        }
    }

    /// The stream-quality preference, re-read on every call.
    pub async fn stream_quality(&self) -> StreamQuality {
        match self.settings.get_string(STREAM_QUALITY_KEY).await {
            Ok(Some(value)) => StreamQuality::from(value.as_str()),
            Ok(None) => self.default_quality.clone(),
            Err(error) => {
                warn!(error = %error, "Failed to read stream quality, using default");
                self.default_quality.clone()
            }
        }
    }

    /// Loaded form of `entry` plus whether it avoided an extension call.
    async fn loaded_track(
        &self,
        entry: &QueueEntry,
        client: &dyn TrackClient,
    ) -> Result<(Arc<Track>, bool)> {
        if let Some(track) = entry.loaded() {
            self.cache.remember(track.clone());
            return Ok((track, true));
        }

        let id = entry.id();
        let (track, from_cache) = match self.cache.get(id).await {
            Some(track) => (track, true),
            None => {
                debug!(track_id = id, client_id = entry.client_id(), "Loading track");
                let track = Arc::new(client.load_track(entry.unloaded()).await?);
                if let Err(error) = self.cache.put(id, &track).await {
                    warn!(track_id = id, error = %error, "Failed to cache loaded track");
                }
                (track, false)
            }
        };

        entry.set_loaded(track.clone());
        self.cache.remember(track.clone());
        Ok((track, from_cache))
    }

    fn emit(&self, event: PlaybackEvent) {
        if let Some(bus) = &self.event_bus {
            let _ = bus.emit(CoreEvent::Playback(event));
        }
    }
}

impl fmt::Debug for TrackResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackResolver")
            .field("default_quality", &self.default_quality)
            .field("queue", &self.queue)
            .field("cache", &self.cache)
            .finish()
    }
}
