//! Extension Registry
//!
//! Holds the ordered list of available extensions, the currently selected
//! one and the trackers that receive play reports.
//!
//! The selection is published through a `watch` channel. Components never
//! keep their own copy: they call [`ExtensionRegistry::current`] or
//! [`ExtensionRegistry::get_client`] on every operation so a switch takes
//! effect on the next call.

use core_runtime::events::{CoreEvent, EventBus, ExtensionEvent};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::error::{ExtensionError, Result};
use crate::extension::Extension;

pub type SharedExtension = Arc<dyn Extension>;

pub struct ExtensionRegistry {
    extensions: RwLock<Vec<SharedExtension>>,
    trackers: RwLock<Vec<SharedExtension>>,
    current: watch::Sender<Option<SharedExtension>>,
    event_bus: Option<EventBus>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self {
            extensions: RwLock::new(Vec::new()),
            trackers: RwLock::new(Vec::new()),
            current,
            event_bus: None,
        }
    }

    /// Publish registry changes on `event_bus`.
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    fn emit(&self, event: ExtensionEvent) {
        if let Some(bus) = &self.event_bus {
            // No subscribers is fine.
            let _ = bus.emit(CoreEvent::Extension(event));
        }
    }

    /// Replace the whole extension list.
    ///
    /// Later duplicates of an id are dropped. The selection is kept when its
    /// id is still present (pointing at the new instance); otherwise the
    /// first extension is selected, or the selection is cleared when the
    /// list is empty.
    #[instrument(skip_all, fields(count = extensions.len()))]
    pub async fn set_extensions(&self, extensions: Vec<SharedExtension>) -> Result<()> {
        let mut seen = HashSet::new();
        let extensions: Vec<SharedExtension> = extensions
            .into_iter()
            .filter(|ext| {
                let fresh = seen.insert(ext.id().to_string());
                if !fresh {
                    warn!(extension_id = ext.id(), "Dropping duplicate extension id");
                }
                fresh
            })
            .collect();

        let ids: Vec<String> = extensions.iter().map(|ext| ext.id().to_string()).collect();
        *self.extensions.write() = extensions;
        info!(extensions = ?ids, "Extension list replaced");
        self.emit(ExtensionEvent::ListChanged {
            extension_ids: ids.clone(),
        });

        let current_id = self.current_id();
        match current_id {
            Some(id) if ids.contains(&id) => {
                // Same id, possibly a new instance.
                if let Some(ext) = self.get_client(&id) {
                    self.current.send_replace(Some(ext));
                }
                Ok(())
            }
            _ => match ids.first() {
                Some(first) => self.select(first).await,
                None => {
                    self.clear_selection();
                    Ok(())
                }
            },
        }
    }

    /// Add an extension, replacing any existing one with the same id.
    ///
    /// The first extension registered into an empty selection becomes the
    /// current one.
    pub async fn register(&self, extension: SharedExtension) -> Result<()> {
        let id = extension.id().to_string();
        let name = extension.name().to_string();

        let replaced = {
            let mut extensions = self.extensions.write();
            match extensions.iter().position(|ext| ext.id() == id) {
                Some(position) => {
                    extensions[position] = Arc::clone(&extension);
                    true
                }
                None => {
                    extensions.push(Arc::clone(&extension));
                    false
                }
            }
        };

        debug!(
            extension_id = %id,
            replaced,
            capabilities = ?extension.capabilities(),
            "Registered extension"
        );
        self.emit(ExtensionEvent::Registered {
            extension_id: id.clone(),
            name,
        });

        match self.current_id() {
            None => self.select(&id).await,
            Some(current) if current == id => {
                self.current.send_replace(Some(extension));
                Ok(())
            }
            Some(_) => Ok(()),
        }
    }

    /// Remove the extension with `id`. Returns `false` if it was unknown.
    ///
    /// Removing the selected extension selects the first remaining one.
    pub async fn unregister(&self, id: &str) -> Result<bool> {
        let removed = {
            let mut extensions = self.extensions.write();
            let before = extensions.len();
            extensions.retain(|ext| ext.id() != id);
            extensions.len() != before
        };

        if !removed {
            return Ok(false);
        }

        debug!(extension_id = id, "Unregistered extension");
        self.emit(ExtensionEvent::Unregistered {
            extension_id: id.to_string(),
        });

        if self.current_id().as_deref() == Some(id) {
            let first = self.extensions.read().first().map(|ext| ext.id().to_string());
            match first {
                Some(first) => self.select(&first).await?,
                None => self.clear_selection(),
            }
        }

        Ok(true)
    }

    /// Look up an extension by client id.
    pub fn get_client(&self, id: &str) -> Option<SharedExtension> {
        self.extensions
            .read()
            .iter()
            .find(|ext| ext.id() == id)
            .cloned()
    }

    pub fn list(&self) -> Vec<SharedExtension> {
        self.extensions.read().clone()
    }

    pub fn len(&self) -> usize {
        self.extensions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.read().is_empty()
    }

    /// Make `id` the current extension.
    ///
    /// The extension's selection hook runs first; if it fails the previous
    /// selection stays in place and the error is returned.
    #[instrument(skip(self))]
    pub async fn select(&self, id: &str) -> Result<()> {
        let extension = self
            .get_client(id)
            .ok_or_else(|| ExtensionError::not_found("Extension", id))?;

        if let Err(error) = extension.on_extension_selected().await {
            warn!(extension_id = id, error = %error, "Extension selection hook failed");
            return Err(error);
        }

        self.current.send_replace(Some(extension));
        info!(extension_id = id, "Extension selected");
        self.emit(ExtensionEvent::Selected {
            extension_id: id.to_string(),
        });
        Ok(())
    }

    fn clear_selection(&self) {
        if self.current.send_replace(None).is_some() {
            info!("Extension selection cleared");
            self.emit(ExtensionEvent::SelectionCleared);
        }
    }

    /// The currently selected extension.
    pub fn current(&self) -> Option<SharedExtension> {
        self.current.borrow().clone()
    }

    fn current_id(&self) -> Option<String> {
        self.current
            .borrow()
            .as_ref()
            .map(|ext| ext.id().to_string())
    }

    /// Observe selection changes. The receiver starts with the current value.
    pub fn subscribe_current(&self) -> watch::Receiver<Option<SharedExtension>> {
        self.current.subscribe()
    }

    /// Replace the tracker list.
    ///
    /// Entries without a tracker capability are kept but skipped when
    /// reporting.
    pub fn set_trackers(&self, trackers: Vec<SharedExtension>) {
        let count = trackers.len();
        *self.trackers.write() = trackers;
        debug!(count, "Tracker list replaced");
        self.emit(ExtensionEvent::TrackersChanged { count });
    }

    pub fn trackers(&self) -> Vec<SharedExtension> {
        self.trackers.read().clone()
    }
}

impl Default for ExtensionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<String> = self
            .extensions
            .read()
            .iter()
            .map(|ext| ext.id().to_string())
            .collect();
        f.debug_struct("ExtensionRegistry")
            .field("extensions", &ids)
            .field("current", &self.current_id())
            .field("trackers", &self.trackers.read().len())
            .finish()
    }
}
