//! Read-through response cache backed by Redis.
//!
//! Stores serialized response bodies keyed by request path+query under the
//! `cache:` namespace. Tracks backend connectivity in a process-wide state
//! machine so the HTTP layer can bypass the cache instead of stalling on a
//! dead backend, and supports SCAN-based pattern invalidation (no blocking
//! KEYS).

mod error;
mod metrics;
mod state;

pub use error::{CacheError, CacheResult};
pub use metrics::CacheMetrics;
pub use state::{Connectivity, ConnectivityState};

use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Namespace prefix for all response-cache keys
pub const KEY_PREFIX: &str = "cache:";

const RECONNECT_BASE_DELAY_MS: u64 = 100;
const RECONNECT_MAX_DELAY: Duration = Duration::from_secs(10);

/// Shared optional connection manager; `None` until the backend is reachable
type SharedRedis = Arc<Mutex<Option<ConnectionManager>>>;

/// Reconnect budget for the supervisor task
#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    /// Attempts per outage before the cache is disabled for the process
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self { max_attempts: 10 }
    }
}

/// Build a cache key from a request path + query string
pub fn response_key(path_and_query: &str) -> String {
    format!("{}{}", KEY_PREFIX, path_and_query)
}

/// Redis-backed response cache.
///
/// All operations degrade rather than block: when the backend is not in the
/// `Connected` state they return `CacheError::Unavailable` immediately, and
/// any transport error flips the state to `Reconnecting` and wakes the
/// supervisor.
pub struct ResponseCache {
    redis: SharedRedis,
    state: Arc<ConnectivityState>,
    wake_reconnect: Arc<Notify>,
    metrics: CacheMetrics,
    _supervisor: ReconnectSupervisor,
}

impl ResponseCache {
    /// Connect to Redis and spawn the reconnect supervisor.
    ///
    /// An unreachable backend is not a startup failure: the cache comes up in
    /// the `Reconnecting` state and the supervisor keeps trying within its
    /// budget. Only an unparsable URL is an error.
    pub async fn connect(url: &str, policy: ReconnectPolicy) -> CacheResult<Arc<Self>> {
        let client = Client::open(url)?;
        let redis: SharedRedis = Arc::new(Mutex::new(None));
        let state = Arc::new(ConnectivityState::new());
        let wake_reconnect = Arc::new(Notify::new());

        match ConnectionManager::new(client.clone()).await {
            Ok(manager) => {
                *redis.lock().await = Some(manager);
                state.mark_connected();
                info!("response cache connected to Redis");
            }
            Err(e) => {
                warn!(error = %e, "initial Redis connection failed, response cache starting in reconnecting state");
                state.mark_reconnecting();
                wake_reconnect.notify_one();
            }
        }

        let supervisor = ReconnectSupervisor::spawn(
            client,
            redis.clone(),
            state.clone(),
            wake_reconnect.clone(),
            policy,
        );

        Ok(Arc::new(Self {
            redis,
            state,
            wake_reconnect,
            metrics: CacheMetrics::default(),
            _supervisor: supervisor,
        }))
    }

    pub fn connectivity(&self) -> Connectivity {
        self.state.current()
    }

    pub fn is_available(&self) -> bool {
        self.state.is_available()
    }

    /// Look up a stored response body.
    pub async fn fetch(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let Some(mut conn) = self.manager().await else {
            return Err(CacheError::Unavailable);
        };

        match conn.get::<_, Option<Vec<u8>>>(key).await {
            Ok(Some(body)) => {
                debug!(key = %key, "cache hit");
                self.metrics.record_hit();
                Ok(Some(body))
            }
            Ok(None) => {
                debug!(key = %key, "cache miss");
                self.metrics.record_miss();
                Ok(None)
            }
            Err(e) => {
                self.note_transport_error(&e);
                self.metrics.record_error("read");
                Err(CacheError::Redis(e))
            }
        }
    }

    /// Store a response body under `key` with a TTL.
    pub async fn store(&self, key: &str, body: Vec<u8>, ttl_secs: u64) -> CacheResult<()> {
        let Some(mut conn) = self.manager().await else {
            return Err(CacheError::Unavailable);
        };

        conn.set_ex::<_, _, ()>(key, body, ttl_secs)
            .await
            .map_err(|e| {
                self.note_transport_error(&e);
                self.metrics.record_error("write");
                CacheError::Redis(e)
            })?;

        debug!(key = %key, ttl_secs, "cache store");
        self.metrics.record_write();
        Ok(())
    }

    /// Delete every key matching `pattern`.
    ///
    /// Keys are enumerated with cursor-based SCAN, looping until the cursor
    /// returns to 0, then removed in a single batched DEL; a scan failure
    /// aborts before anything is deleted. An empty pattern, or one outside
    /// the `cache:` namespace, is a warned no-op.
    pub async fn invalidate(&self, pattern: &str) -> CacheResult<usize> {
        if pattern.is_empty() {
            warn!("no pattern provided for cache invalidation");
            return Ok(0);
        }
        if !pattern.starts_with(KEY_PREFIX) {
            warn!(pattern = %pattern, "invalidation pattern outside the cache namespace, refusing");
            return Ok(0);
        }

        let Some(mut conn) = self.manager().await else {
            return Err(CacheError::Unavailable);
        };

        let mut cursor: u64 = 0;
        let mut keys: Vec<String> = Vec::new();

        loop {
            let (next_cursor, page): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await
                .map_err(|e| {
                    self.note_transport_error(&e);
                    self.metrics.record_error("scan");
                    CacheError::Redis(e)
                })?;

            keys.extend(page);
            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        if keys.is_empty() {
            debug!(pattern = %pattern, "no cache keys matched invalidation pattern");
            return Ok(0);
        }

        let deleted = keys.len();
        conn.del::<_, ()>(keys).await.map_err(|e| {
            self.note_transport_error(&e);
            self.metrics.record_error("delete");
            CacheError::Redis(e)
        })?;

        info!(pattern = %pattern, deleted, "cache invalidated");
        self.metrics.record_invalidation(deleted);
        Ok(deleted)
    }

    async fn manager(&self) -> Option<ConnectionManager> {
        if !self.state.is_available() {
            return None;
        }
        self.redis.lock().await.clone()
    }

    fn note_transport_error(&self, err: &redis::RedisError) {
        warn!(error = %err, "Redis transport error, marking response cache reconnecting");
        if self.state.mark_reconnecting() {
            self.wake_reconnect.notify_one();
        }
    }
}

struct ReconnectSupervisor {
    shutdown_tx: watch::Sender<()>,
    handle: JoinHandle<()>,
}

impl ReconnectSupervisor {
    fn spawn(
        client: Client,
        redis: SharedRedis,
        state: Arc<ConnectivityState>,
        wake: Arc<Notify>,
        policy: ReconnectPolicy,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(());

        let handle = tokio::spawn(async move {
            reconnect_loop(client, redis, state, wake, policy, shutdown_rx).await;
        });

        Self {
            shutdown_tx,
            handle,
        }
    }
}

impl Drop for ReconnectSupervisor {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(());
        self.handle.abort();
    }
}

async fn reconnect_loop(
    client: Client,
    redis: SharedRedis,
    state: Arc<ConnectivityState>,
    wake: Arc<Notify>,
    policy: ReconnectPolicy,
    mut shutdown: watch::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = wake.notified() => {}
        }

        match state.current() {
            Connectivity::Disabled => break,
            Connectivity::Connected => continue,
            _ => {}
        }

        let mut attempt: u32 = 0;
        loop {
            if attempt >= policy.max_attempts {
                state.disable();
                warn!(
                    attempts = attempt,
                    "reconnect budget exhausted, response cache disabled for the rest of the process"
                );
                return;
            }

            let delay = reconnect_delay(attempt);
            tokio::select! {
                _ = shutdown.changed() => return,
                _ = tokio::time::sleep(delay) => {}
            }

            match ConnectionManager::new(client.clone()).await {
                Ok(mut manager) => {
                    match redis::cmd("PING").query_async::<_, String>(&mut manager).await {
                        Ok(_) => {
                            *redis.lock().await = Some(manager);
                            state.mark_connected();
                            info!(attempts = attempt + 1, "response cache reconnected to Redis");
                            break;
                        }
                        Err(e) => {
                            warn!(attempt, error = %e, "Redis ping failed during reconnect");
                            attempt += 1;
                        }
                    }
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Redis reconnect attempt failed");
                    attempt += 1;
                }
            }
        }
    }
}

/// Exponential backoff: 100ms * 2^attempt, capped at 10s
fn reconnect_delay(attempt: u32) -> Duration {
    let millis = RECONNECT_BASE_DELAY_MS.saturating_mul(1u64 << attempt.min(16));
    Duration::from_millis(millis).min(RECONNECT_MAX_DELAY)
}
