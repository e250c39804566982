//! # Player Connection
//!
//! Mirrors the playback queue and the controller's transport commands onto a
//! host [`PlayerAdapter`]. Each queue change becomes exactly one structural
//! player call (plus the follow-up transport calls listed below), applied in
//! the order the queue produced them:
//!
//! | Queue change / command | Player calls                                   |
//! |------------------------|------------------------------------------------|
//! | `Added`                | `add_media_items`, `prepare`, play when ready  |
//! | `Moved`                | `move_media_item`                              |
//! | `Removed`              | `remove_media_item`                            |
//! | `Cleared`              | `pause`, `clear_media_items`, `stop` (if any)  |
//! | `PlayPause`            | `play` / `pause`                               |
//! | `SeekToNext/Previous`  | the seek, then play when ready                 |
//! | `PlayIndex`            | `seek_to_default_position`                     |
//!
//! Queue changes are always drained before commands, so a command issued
//! right after a queue edit sees the edited playlist. If the connection
//! falls behind the queue's change buffer, the player playlist is rebuilt
//! from a fresh snapshot.
//!
//! Player call failures are logged; the connection keeps running until the
//! controller or the queue goes away.

use bridge_traits::error::Result as BridgeResult;
use bridge_traits::playback::{PlayerAdapter, PlayerMediaItem};
use core_playback::{Queue, QueueChange, QueueEntry};
use std::sync::{Arc, Weak};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::player::{PlayerCommand, PlayerController};

/// Start mirroring `controller` onto `player`.
///
/// Must be called from within a tokio runtime. The returned task ends when
/// the controller or its queue is dropped; aborting it disconnects the
/// player.
pub fn connect_player(controller: &PlayerController, player: Arc<dyn PlayerAdapter>) -> JoinHandle<()> {
    let queue = controller.queue();
    let (snapshot, changes) = queue.snapshot_and_subscribe();
    let commands = controller.subscribe_commands();
    let connection = Connection {
        queue: Arc::downgrade(&queue),
        player,
    };
    drop(queue);

    tokio::spawn(connection.run(snapshot, changes, commands))
}

struct Connection {
    queue: Weak<Queue>,
    player: Arc<dyn PlayerAdapter>,
}

impl Connection {
    async fn run(
        self,
        snapshot: Vec<Arc<QueueEntry>>,
        mut changes: broadcast::Receiver<QueueChange>,
        mut commands: broadcast::Receiver<PlayerCommand>,
    ) {
        info!(entries = snapshot.len(), "Player connected");
        self.log_failure("initial sync", self.replace_playlist(snapshot).await);

        loop {
            tokio::select! {
                biased;
                change = changes.recv() => match change {
                    Ok(change) => {
                        debug!(?change, "Mirroring queue change");
                        self.log_failure("queue change", self.apply_change(change).await);
                    }
                    Err(RecvError::Lagged(missed)) => {
                        warn!(missed, "Player fell behind the queue, resyncing");
                        let Some(queue) = self.queue.upgrade() else {
                            break;
                        };
                        let (snapshot, fresh) = queue.snapshot_and_subscribe();
                        drop(queue);
                        changes = fresh;
                        self.log_failure("resync", self.replace_playlist(snapshot).await);
                    }
                    Err(RecvError::Closed) => break,
                },
                command = commands.recv() => match command {
                    Ok(command) => {
                        debug!(?command, "Executing player command");
                        self.log_failure("player command", self.apply_command(command).await);
                    }
                    Err(RecvError::Lagged(missed)) => {
                        warn!(missed, "Player commands dropped");
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }

        info!("Player disconnected");
    }

    async fn apply_change(&self, change: QueueChange) -> BridgeResult<()> {
        let player = self.player.as_ref();
        match change {
            QueueChange::Added { index, entries } => {
                player.add_media_items(index, media_items(&entries)).await?;
                player.prepare().await?;
                player.set_play_when_ready(true).await
            }
            QueueChange::Moved { from, to } => player.move_media_item(from, to).await,
            QueueChange::Removed { index } => player.remove_media_item(index).await,
            QueueChange::Cleared => {
                if player.media_item_count().await? == 0 {
                    return Ok(());
                }
                player.pause().await?;
                player.clear_media_items().await?;
                player.stop().await
            }
        }
    }

    async fn apply_command(&self, command: PlayerCommand) -> BridgeResult<()> {
        let player = self.player.as_ref();
        match command {
            PlayerCommand::PlayPause(true) => player.play().await,
            PlayerCommand::PlayPause(false) => player.pause().await,
            PlayerCommand::SeekTo(position) => player.seek_to(position).await,
            PlayerCommand::SeekToNext => {
                player.seek_to_next().await?;
                player.set_play_when_ready(true).await
            }
            PlayerCommand::SeekToPrevious => {
                player.seek_to_previous().await?;
                player.set_play_when_ready(true).await
            }
            PlayerCommand::PlayIndex(index) => player.seek_to_default_position(index).await,
            PlayerCommand::SetRepeat(mode) => player.set_repeat_mode(mode).await,
            PlayerCommand::SetShuffle(enabled) => player.set_shuffle_mode(enabled).await,
        }
    }

    /// Make the player playlist equal to `entries` without starting playback.
    async fn replace_playlist(&self, entries: Vec<Arc<QueueEntry>>) -> BridgeResult<()> {
        let player = self.player.as_ref();
        if player.media_item_count().await? > 0 {
            player.clear_media_items().await?;
        }
        if entries.is_empty() {
            return Ok(());
        }
        player.add_media_items(0, media_items(&entries)).await?;
        player.prepare().await
    }

    fn log_failure(&self, action: &str, result: BridgeResult<()>) {
        if let Err(error) = result {
            warn!(action, error = %error, "Player call failed");
        }
    }
}

fn media_items(entries: &[Arc<QueueEntry>]) -> Vec<PlayerMediaItem> {
    entries.iter().map(|entry| entry.to_media_item()).collect()
}
