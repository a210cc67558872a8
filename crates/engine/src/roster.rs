//! Read-through cache of the eligible-substitute roster.
//!
//! The roster changes rarely and is read on every substitute lookup. It is
//! loaded on first use and dropped on invalidation; there is no TTL. The
//! `users` table fires `pg_notify('roster_changed', ...)` on every write, and
//! [`listen_for_roster_changes`] turns those notifications into
//! [`RosterCache::invalidate`] calls.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use presensi_db::models::user::TeacherRef;
use presensi_db::repositories::UserRepo;
use presensi_db::DbPool;
use sqlx::postgres::PgListener;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

/// PostgreSQL notification channel raised by the `users` trigger.
pub const ROSTER_CHANNEL: &str = "roster_changed";

/// Pause before reconnecting after the listener connection fails.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

#[derive(Default)]
pub struct RosterCache {
    entries: RwLock<Option<Arc<Vec<TeacherRef>>>>,
    /// Bumped by every invalidation so a load that raced with one is not
    /// stored.
    generation: AtomicU64,
}

impl RosterCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Active teaching-role users, ordered by name, loading them on a miss.
    pub async fn get_or_load(&self, pool: &DbPool) -> Result<Arc<Vec<TeacherRef>>, sqlx::Error> {
        if let Some(cached) = self.entries.read().await.as_ref() {
            return Ok(Arc::clone(cached));
        }

        let generation = self.generation.load(Ordering::Acquire);
        let loaded = Arc::new(UserRepo::list_eligible_substitutes(pool).await?);

        let mut entries = self.entries.write().await;
        if self.generation.load(Ordering::Acquire) == generation {
            *entries = Some(Arc::clone(&loaded));
            tracing::debug!(teachers = loaded.len(), "Roster cache loaded");
        }
        Ok(loaded)
    }

    pub async fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        *self.entries.write().await = None;
    }

    pub async fn is_loaded(&self) -> bool {
        self.entries.read().await.is_some()
    }
}

/// Keep the cache coherent with the `users` table until `cancel` fires.
///
/// The cache is also invalidated whenever the listener connection drops,
/// since notifications may be lost while reconnecting.
pub async fn listen_for_roster_changes(
    pool: DbPool,
    cache: Arc<RosterCache>,
    cancel: CancellationToken,
) {
    loop {
        let mut listener = match connect(&pool).await {
            Ok(listener) => listener,
            Err(e) => {
                tracing::error!(error = %e, "Roster listener failed to connect");
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(RECONNECT_DELAY) => continue,
                }
            }
        };
        // Anything written before LISTEN took effect is unseen.
        cache.invalidate().await;
        tracing::info!(channel = ROSTER_CHANNEL, "Roster listener started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Roster listener stopping");
                    return;
                }
                received = listener.recv() => match received {
                    Ok(notification) => {
                        tracing::debug!(operation = notification.payload(), "Roster changed, invalidating cache");
                        cache.invalidate().await;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Roster listener connection lost");
                        cache.invalidate().await;
                        break;
                    }
                },
            }
        }
    }
}

async fn connect(pool: &DbPool) -> Result<PgListener, sqlx::Error> {
    let mut listener = PgListener::connect_with(pool).await?;
    listener.listen(ROSTER_CHANNEL).await?;
    Ok(listener)
}
