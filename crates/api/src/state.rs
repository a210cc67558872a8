use std::sync::Arc;

use presensi_db::DbPool;
use presensi_engine::{AttendanceEngine, LeaveWorkflow, RosterCache, SubstituteMatcher};
use presensi_events::EventBus;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: the engines hold a pool handle and `Arc`s.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: DbPool,
    /// Server configuration (JWT secret is read by the auth extractor).
    pub config: Arc<ServerConfig>,
    /// Domain events published after commits; drained by the notification
    /// dispatcher.
    pub event_bus: Arc<EventBus>,
    /// Eligible-substitute roster shared with the invalidation listener.
    pub roster: Arc<RosterCache>,
    pub attendance: AttendanceEngine,
    pub leaves: LeaveWorkflow,
    pub matcher: SubstituteMatcher,
}

impl AppState {
    pub fn new(
        pool: DbPool,
        config: Arc<ServerConfig>,
        event_bus: Arc<EventBus>,
        roster: Arc<RosterCache>,
    ) -> Self {
        let attendance =
            AttendanceEngine::new(pool.clone(), Arc::clone(&event_bus), config.engine.clone());
        let leaves = LeaveWorkflow::new(pool.clone(), Arc::clone(&event_bus));
        let matcher = SubstituteMatcher::new(pool.clone(), Arc::clone(&roster));
        Self {
            pool,
            config,
            event_bus,
            roster,
            attendance,
            leaves,
            matcher,
        }
    }
}
