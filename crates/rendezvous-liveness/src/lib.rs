//! Liveness supervision for Rendezvous connections.
//!
//! Every connection is swept on a fixed interval. A connection that was
//! seen alive since the previous sweep is marked unconfirmed and sent a
//! transport-level probe; one that stayed silent for a whole interval is
//! closed. Closing goes through the connection's own task, so an evicted
//! connection leaves its room exactly like one that hung up.
//!
//! # Integration
//!
//! The tracker is shared between the supervisor and every connection
//! task:
//!
//! ```ignore
//! let tracker = Arc::new(Mutex::new(LivenessTracker::new()));
//! let supervisor = LivenessSupervisor::spawn(tracker.clone(), config);
//!
//! // per connection
//! tracker.lock().await.register(handle.clone());
//! // on every inbound frame
//! tracker.lock().await.mark_alive(conn_id);
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rendezvous_session::ConnectionHandle;
use rendezvous_transport::ConnectionId;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Liveness sweep settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivenessConfig {
    /// Time between sweeps. A silent connection is closed after at most
    /// two of these.
    pub interval: Duration,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            interval: Self::DEFAULT_INTERVAL,
        }
    }
}

impl LivenessConfig {
    /// Default sweep interval.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(15);

    /// Shortest interval accepted.
    pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

    /// A config sweeping every `interval`.
    pub fn with_interval(interval: Duration) -> Self {
        Self { interval }
    }

    /// Clamps out-of-range values so the config is safe to use.
    ///
    /// Called by [`LivenessSupervisor::spawn`]. An interval below
    /// [`Self::MIN_INTERVAL`] (including zero) becomes the minimum.
    pub fn validated(mut self) -> Self {
        if self.interval < Self::MIN_INTERVAL {
            warn!(
                interval_ms = self.interval.as_millis() as u64,
                "liveness interval below minimum, clamping"
            );
            self.interval = Self::MIN_INTERVAL;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Tracked {
    handle: ConnectionHandle,
    alive: bool,
}

/// What one sweep did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Connections that were alive and have now been probed.
    pub probed: Vec<ConnectionId>,
    /// Connections that stayed silent and were told to close.
    pub evicted: Vec<ConnectionId>,
}

/// Per-connection alive marks.
#[derive(Debug, Default)]
pub struct LivenessTracker {
    connections: HashMap<ConnectionId, Tracked>,
}

impl LivenessTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking a connection. It counts as alive until the next
    /// sweep.
    pub fn register(&mut self, handle: ConnectionHandle) {
        self.connections.insert(
            handle.id(),
            Tracked {
                handle,
                alive: true,
            },
        );
    }

    /// Stops tracking a connection.
    pub fn unregister(&mut self, id: ConnectionId) {
        self.connections.remove(&id);
    }

    /// Records that something arrived from the connection.
    pub fn mark_alive(&mut self, id: ConnectionId) {
        if let Some(tracked) = self.connections.get_mut(&id) {
            tracked.alive = true;
        }
    }

    /// Whether the connection has been seen since the last sweep.
    /// Untracked connections are not alive.
    pub fn is_alive(&self, id: ConnectionId) -> bool {
        self.connections.get(&id).is_some_and(|t| t.alive)
    }

    /// Number of tracked connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Returns `true` if nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Runs one sweep.
    ///
    /// Silent connections are told to close and dropped from the tracker.
    /// The rest are marked unconfirmed and probed.
    pub fn sweep(&mut self) -> SweepReport {
        let mut report = SweepReport::default();

        self.connections.retain(|id, tracked| {
            if !tracked.alive {
                warn!(conn_id = %id, "no sign of life since last sweep, closing");
                if let Err(e) = tracked.handle.close() {
                    debug!(conn_id = %id, error = %e, "close request not delivered");
                }
                report.evicted.push(*id);
                return false;
            }

            tracked.alive = false;
            if let Err(e) = tracked.handle.probe() {
                debug!(conn_id = %id, error = %e, "probe not delivered");
            }
            report.probed.push(*id);
            true
        });

        report.probed.sort();
        report.evicted.sort();
        report
    }
}

// ---------------------------------------------------------------------------
// Supervisor
// ---------------------------------------------------------------------------

/// Background task that sweeps a shared tracker on a fixed interval.
///
/// The task stops when this value is dropped.
#[derive(Debug)]
pub struct LivenessSupervisor {
    task: JoinHandle<()>,
}

impl LivenessSupervisor {
    /// Spawns the sweep loop. The first sweep runs one interval from now.
    pub fn spawn(
        tracker: Arc<Mutex<LivenessTracker>>,
        config: LivenessConfig,
    ) -> Self {
        let config = config.validated();
        let period = config.interval;

        let task = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            // No catch-up bursts: every probe gets a full interval.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                let report = tracker.lock().await.sweep();
                trace!(
                    probed = report.probed.len(),
                    evicted = report.evicted.len(),
                    "liveness sweep"
                );
            }
        });

        debug!(interval_ms = period.as_millis() as u64, "liveness supervisor started");
        Self { task }
    }
}

impl Drop for LivenessSupervisor {
    fn drop(&mut self) {
        self.task.abort();
    }
}
