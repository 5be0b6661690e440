/// Broadcast hubs for the realtime fan-out.
pub mod channels;

use std::sync::Arc;

use tokio::sync::{RwLock, mpsc, watch};
use tracing::warn;

use crate::{
    config::AppConfig, dao::contest_store::ContestStore, error::ServiceError,
    services::events::ContestEvent,
};

pub use self::channels::SseHub;
use self::channels::{ChannelState, TeamChannels};

/// Cheaply cloneable handle to the application state.
pub type SharedState = Arc<AppState>;

/// Central application state storing the storage backend slot, broadcast
/// hubs, and the event outbox.
pub struct AppState {
    contest_store: RwLock<Option<Arc<dyn ContestStore>>>,
    channels: ChannelState,
    degraded: watch::Sender<bool>,
    events: mpsc::UnboundedSender<ContestEvent>,
    config: AppConfig,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`], along with the
    /// receiving end of the event outbox the dispatcher task drains.
    ///
    /// The application starts in degraded mode until a storage backend is
    /// installed.
    pub fn new(config: AppConfig) -> (SharedState, mpsc::UnboundedReceiver<ContestEvent>) {
        let (degraded_tx, _rx) = watch::channel(true);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let state = Arc::new(Self {
            contest_store: RwLock::new(None),
            channels: ChannelState::new(
                config.global_channel_capacity(),
                config.team_channel_capacity(),
            ),
            degraded: degraded_tx,
            events: events_tx,
            config,
        });
        (state, events_rx)
    }

    /// Obtain a handle to the current contest store, if one is installed.
    pub async fn contest_store(&self) -> Option<Arc<dyn ContestStore>> {
        let guard = self.contest_store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the contest store or fail with a degraded-mode error.
    pub async fn require_contest_store(&self) -> Result<Arc<dyn ContestStore>, ServiceError> {
        self.contest_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new contest store implementation and leave degraded mode.
    pub async fn set_contest_store(&self, store: Arc<dyn ContestStore>) {
        {
            let mut guard = self.contest_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Remove the current contest store and enter degraded mode.
    pub async fn clear_contest_store(&self) {
        {
            let mut guard = self.contest_store.write().await;
            guard.take();
        }
        self.update_degraded(true).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        let guard = self.contest_store.read().await;
        guard.is_none()
    }

    /// Update and broadcast the degraded flag.
    pub async fn update_degraded(&self, value: bool) {
        let _ = self.degraded.send(value);
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Broadcast hub used for the global leaderboard channel.
    pub fn global_hub(&self) -> &SseHub {
        self.channels.global()
    }

    /// Registry of per-team broadcast hubs.
    pub fn team_channels(&self) -> &TeamChannels {
        self.channels.teams()
    }

    /// Push a contest event into the outbox. Fire-and-forget: the
    /// authoritative write has already committed, so a full or closed
    /// dispatcher never fails or rolls back the caller.
    pub fn publish(&self, event: ContestEvent) {
        if self.events.send(event).is_err() {
            warn!("event dispatcher is gone; dropping realtime notification");
        }
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
