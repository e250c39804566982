//! Core service façade and bootstrap helpers.
//!
//! Wires the host-provided stores and clock from a [`CoreConfig`] into the
//! playback core: extension registry, playback queue, track cache, track
//! resolver, radio expansion, and the player and search controllers. Desktop
//! hosts typically enable the `desktop-shims` feature and call
//! [`bootstrap_desktop`], which fills in SQLite-backed stores.
//!
//! ```no_run
//! # async fn example(player: std::sync::Arc<dyn bridge_traits::PlayerAdapter>) -> core_service::Result<()> {
//! use core_runtime::config::CoreConfig;
//! use core_service::bootstrap_desktop;
//!
//! let core = bootstrap_desktop(CoreConfig::builder()).await?;
//! let _connection = core.connect_player(player);
//! core.player().seek_to_next();
//! # Ok(())
//! # }
//! ```

pub mod connect;
pub mod error;
pub mod player;
pub mod search;

pub use connect::connect_player;
pub use error::{CoreError, Result};
pub use player::{PlayerCommand, PlayerController, PlayerException, PlayerState};
pub use search::SearchController;

use std::sync::Arc;

use bridge_traits::PlayerAdapter;
use core_extension::ExtensionRegistry;
use core_playback::{Queue, RadioExpansion, StreamQuality, TrackCache, TrackResolver};
use core_runtime::config::CoreConfig;
#[cfg(feature = "desktop-shims")]
use core_runtime::config::CoreConfigBuilder;
use core_runtime::events::EventBus;
#[cfg(feature = "offline")]
use provider_offline::{LibraryScanner, OfflineExtension};
use tokio::task::JoinHandle;
use tracing::info;

struct CoreComponents {
    config: CoreConfig,
    event_bus: EventBus,
    registry: Arc<ExtensionRegistry>,
    queue: Arc<Queue>,
    cache: Arc<TrackCache>,
    resolver: Arc<TrackResolver>,
    radio: RadioExpansion,
    player: Arc<PlayerController>,
    search: Arc<SearchController>,
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    inner: Arc<CoreComponents>,
}

impl CoreService {
    /// Build the playback core from a validated configuration.
    pub fn new(config: CoreConfig) -> Result<Self> {
        config.validate()?;

        let event_bus = EventBus::new(config.event_buffer_size);
        let registry = Arc::new(ExtensionRegistry::new().with_event_bus(event_bus.clone()));
        let queue = Arc::new(Queue::new().with_event_bus(event_bus.clone()));
        let cache = Arc::new(TrackCache::new(
            Arc::clone(&config.track_cache_store),
            Arc::clone(&config.clock),
            config.recent_track_capacity,
        ));
        let resolver = Arc::new(
            TrackResolver::new(
                Arc::clone(&queue),
                Arc::clone(&registry),
                Arc::clone(&cache),
                Arc::clone(&config.settings_store),
                StreamQuality::from(config.default_stream_quality.as_str()),
            )
            .with_event_bus(event_bus.clone()),
        );
        let radio = RadioExpansion::new(config.radio_sample_size);
        let player = Arc::new(PlayerController::new(
            Arc::clone(&queue),
            Arc::clone(&registry),
            event_bus.clone(),
        ));
        let search = Arc::new(SearchController::new(Arc::clone(&registry)));

        info!(
            default_quality = %config.default_stream_quality,
            radio_sample_size = config.radio_sample_size,
            recent_track_capacity = config.recent_track_capacity,
            "Core service initialized"
        );

        Ok(Self {
            inner: Arc::new(CoreComponents {
                config,
                event_bus,
                registry,
                queue,
                cache,
                resolver,
                radio,
                player,
                search,
            }),
        })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.inner.config
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.inner.event_bus
    }

    pub fn registry(&self) -> Arc<ExtensionRegistry> {
        Arc::clone(&self.inner.registry)
    }

    pub fn queue(&self) -> Arc<Queue> {
        Arc::clone(&self.inner.queue)
    }

    pub fn cache(&self) -> Arc<TrackCache> {
        Arc::clone(&self.inner.cache)
    }

    pub fn resolver(&self) -> Arc<TrackResolver> {
        Arc::clone(&self.inner.resolver)
    }

    /// Radio expansion configured with the service's library sample size,
    /// for extensions that build radios from their own catalogue.
    pub fn radio(&self) -> &RadioExpansion {
        &self.inner.radio
    }

    /// Register the on-device library extension with this service's radio
    /// sample size and event bus. The scan runs once it becomes selected.
    #[cfg(feature = "offline")]
    pub async fn register_offline(
        &self,
        scanner: Arc<dyn LibraryScanner>,
    ) -> Result<Arc<OfflineExtension>> {
        let offline = Arc::new(
            OfflineExtension::new(scanner)
                .with_radio(self.inner.radio.clone())
                .with_event_bus(self.inner.event_bus.clone()),
        );
        self.inner.registry.register(offline.clone()).await?;
        info!(
            sample_size = self.inner.radio.sample_size(),
            "Offline library registered"
        );
        Ok(offline)
    }

    pub fn player(&self) -> Arc<PlayerController> {
        Arc::clone(&self.inner.player)
    }

    pub fn search(&self) -> Arc<SearchController> {
        Arc::clone(&self.inner.search)
    }

    /// Mirror the queue and player commands onto `adapter`.
    pub fn connect_player(&self, adapter: Arc<dyn PlayerAdapter>) -> JoinHandle<()> {
        connect_player(&self.inner.player, adapter)
    }
}

impl std::fmt::Debug for CoreService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreService")
            .field("config", &self.inner.config)
            .field("registry", &self.inner.registry)
            .field("queue", &self.inner.queue)
            .finish()
    }
}

/// Build a service for desktop hosts, opening SQLite-backed settings and
/// track-cache stores for whichever the builder does not provide.
#[cfg(feature = "desktop-shims")]
pub async fn bootstrap_desktop(builder: CoreConfigBuilder) -> Result<CoreService> {
    let config = builder
        .build_with_desktop_defaults()
        .await
        .map_err(|err| CoreError::InitializationFailed(err.to_string()))?;
    CoreService::new(config)
}
