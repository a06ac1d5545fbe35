/// Turn and round progression for a single debate.
pub mod debate;

use std::sync::Arc;

use axum::extract::ws::Message;
use dashmap::{DashMap, DashSet};
use tokio::sync::{Mutex, RwLock, mpsc};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::debate_store::DebateStore,
    error::ServiceError,
    judge::{Judge, fallback::FallbackJudge},
};

/// Shared handle to the application state.
pub type SharedState = Arc<AppState>;

#[derive(Clone)]
/// Handle used to push messages to a connected client.
pub struct ClientConnection {
    /// Opaque identifier assigned at connection time.
    pub id: Uuid,
    /// User bound to this connection via `authenticate`; reset on every
    /// physical reconnect.
    pub user_id: Option<Uuid>,
    /// Debate the connection subscribed to, if any.
    pub debate_id: Option<Uuid>,
    /// Writer-task channel for outbound frames.
    pub tx: mpsc::UnboundedSender<Message>,
}

/// Central application state storing connection registries, gates, the
/// storage handle, and the judge chain.
///
/// Created once at server start and dropped at shutdown; nothing here lives
/// at module level.
pub struct AppState {
    config: AppConfig,
    store: RwLock<Option<Arc<dyn DebateStore>>>,
    connections: DashMap<Uuid, ClientConnection>,
    matchmaking_subscribers: DashSet<Uuid>,
    matchmaking_gate: Mutex<()>,
    submission_gates: DashMap<Uuid, Arc<Mutex<()>>>,
    primary_judge: Option<Arc<dyn Judge>>,
    fallback_judge: Arc<FallbackJudge>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is
    /// installed. `primary_judge` is optional; the fallback judge is always
    /// present so every debate can be completed.
    pub fn new(config: AppConfig, primary_judge: Option<Arc<dyn Judge>>) -> SharedState {
        Arc::new(Self {
            config,
            store: RwLock::new(None),
            connections: DashMap::new(),
            matchmaking_subscribers: DashSet::new(),
            matchmaking_gate: Mutex::new(()),
            submission_gates: DashMap::new(),
            primary_judge,
            fallback_judge: Arc::new(FallbackJudge::new()),
        })
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current storage backend, if one is installed.
    pub async fn store(&self) -> Option<Arc<dyn DebateStore>> {
        let guard = self.store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the storage backend or fail with a degraded-mode error.
    pub async fn require_store(&self) -> Result<Arc<dyn DebateStore>, ServiceError> {
        self.store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a storage backend and leave degraded mode.
    pub async fn install_store(&self, store: Arc<dyn DebateStore>) {
        let mut guard = self.store.write().await;
        *guard = Some(store);
    }

    /// Remove the current storage backend and enter degraded mode.
    pub async fn clear_store(&self) {
        let mut guard = self.store.write().await;
        guard.take();
    }

    /// Registry of active client sockets keyed by connection identifier.
    pub fn connections(&self) -> &DashMap<Uuid, ClientConnection> {
        &self.connections
    }

    /// Connections subscribed to matchmaking queue-size broadcasts.
    pub fn matchmaking_subscribers(&self) -> &DashSet<Uuid> {
        &self.matchmaking_subscribers
    }

    /// Gate serializing queue pairing so two concurrent joins cannot pop
    /// overlapping entries.
    pub fn matchmaking_gate(&self) -> &Mutex<()> {
        &self.matchmaking_gate
    }

    /// Gate serializing argument submissions for one debate.
    pub fn submission_gate(&self, debate_id: Uuid) -> Arc<Mutex<()>> {
        self.submission_gates
            .entry(debate_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop the submission gate of a completed debate.
    pub fn release_submission_gate(&self, debate_id: Uuid) {
        self.submission_gates.remove(&debate_id);
    }

    /// Primary verdict provider, when one is configured.
    pub fn primary_judge(&self) -> Option<&Arc<dyn Judge>> {
        self.primary_judge.as_ref()
    }

    /// Verdict provider of last resort; never fails.
    pub fn fallback_judge(&self) -> &FallbackJudge {
        &self.fallback_judge
    }
}
