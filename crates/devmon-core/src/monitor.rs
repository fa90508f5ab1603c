// ── Polling engine ──
//
// Owns the device registry and a single polling thread. Each cycle builds
// a fresh `Snapshot` and publishes it with one atomic pointer swap, so
// readers never see a cycle half-applied and never take a lock.
//
// Each run publishes into its own slot. `start()` installs a fresh slot, so
// a loop left over from an earlier run can never overwrite a newer one.
//
// Administrative operations (register/start/stop) are serialized by one
// mutex that the data path never touches.

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use arc_swap::{ArcSwap, ArcSwapOption};
use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::config::MonitorConfig;
use crate::device::{Device, DeviceId};
use crate::error::{DeviceError, MonitorError};
use crate::snapshot::{Snapshot, StatusMap};
use crate::value::Status;

type Registry = BTreeMap<DeviceId, Arc<dyn Device>>;

/// Where one run publishes its snapshots.
type Slot = ArcSwapOption<Snapshot>;

type LoopBody = Box<dyn FnOnce() + Send>;

// ── Monitor ──────────────────────────────────────────────────────────

/// Periodically polls every registered device and publishes the results.
///
/// Starts stopped. [`start()`](Self::start) and [`stop()`](Self::stop) are
/// idempotent and may be called any number of times from any thread;
/// [`get_statuses()`](Self::get_statuses) is lock-free and safe at any
/// time. Dropping a running monitor stops it.
pub struct Monitor {
    config: MonitorConfig,
    shared: Arc<Shared>,
    running: AtomicBool,
    admin: Mutex<Admin>,
}

/// State read by the polling thread.
struct Shared {
    registry: ArcSwap<Registry>,
    /// Slot of the current (or most recent) run.
    published: ArcSwap<Slot>,
}

/// State only touched under the administrative lock.
struct Admin {
    next_id: DeviceId,
    worker: Option<Worker>,
    /// Loop stopped from its own thread and not yet joined.
    orphan: Option<JoinHandle<()>>,
}

struct Worker {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Monitor {
    /// Create a stopped monitor polling every `interval`.
    pub fn new(interval: Duration) -> Self {
        Self::with_config(MonitorConfig::new(interval))
    }

    pub fn with_config(config: MonitorConfig) -> Self {
        Self {
            config,
            shared: Arc::new(Shared {
                registry: ArcSwap::from_pointee(Registry::new()),
                published: ArcSwap::from_pointee(Slot::empty()),
            }),
            running: AtomicBool::new(false),
            admin: Mutex::new(Admin {
                next_id: DeviceId::new(0),
                worker: None,
                orphan: None,
            }),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn interval(&self) -> Duration {
        self.config.interval
    }

    // ── Registration ─────────────────────────────────────────────

    /// Register a device built by `build` from its freshly assigned id.
    ///
    /// Ids start at 0 and are never reused. The returned handle stays valid
    /// for as long as the caller keeps it. A monitor that is already running
    /// picks the device up from its next cycle.
    ///
    /// `build` runs under the administrative lock and must not call back
    /// into this monitor.
    pub fn register_device<D, F>(&self, build: F) -> Arc<D>
    where
        D: Device + 'static,
        F: FnOnce(DeviceId) -> D,
    {
        let mut admin = self.lock_admin();
        let id = admin.next_id;
        admin.next_id = id.next();

        let device = Arc::new(build(id));
        debug_assert_eq!(device.id(), id, "device must report the id it was built with");

        let mut registry = Registry::clone(&self.shared.registry.load());
        registry.insert(id, Arc::clone(&device) as Arc<dyn Device>);
        self.shared.registry.store(Arc::new(registry));

        debug!(device = %id, "device registered");
        device
    }

    /// Number of registered devices.
    pub fn device_count(&self) -> usize {
        self.shared.registry.load().len()
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Start polling. No-op if already running.
    ///
    /// Clears the published snapshot, so [`get_statuses()`](Self::get_statuses)
    /// returns `None` until the first cycle of this run completes. If a loop
    /// stopped from its own thread is still finishing a fetch, waits for it
    /// first. On error the monitor stays stopped and the previous snapshot
    /// remains readable.
    pub fn start(&self) -> Result<(), MonitorError> {
        self.start_with(|builder, body| builder.spawn(body))
    }

    fn start_with<S>(&self, spawn: S) -> Result<(), MonitorError>
    where
        S: FnOnce(thread::Builder, LoopBody) -> io::Result<JoinHandle<()>>,
    {
        let mut admin = self.lock_admin();
        if admin.worker.is_some() {
            return Ok(());
        }

        let interval = self.config.interval;
        if interval.is_zero() {
            return Err(MonitorError::InvalidInterval);
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(MonitorError::Runtime)?;

        reap_orphan(&mut admin);

        let slot = Arc::new(Slot::empty());
        let cancel = CancellationToken::new();
        let body: LoopBody = {
            let shared = Arc::clone(&self.shared);
            let slot = Arc::clone(&slot);
            let token = cancel.clone();
            Box::new(move || runtime.block_on(poll_loop(&shared, &slot, interval, &token)))
        };
        let builder = thread::Builder::new().name(self.config.thread_name.clone());
        let handle = spawn(builder, body).map_err(|source| MonitorError::Spawn {
            name: self.config.thread_name.clone(),
            source,
        })?;

        self.shared.published.store(slot);
        admin.worker = Some(Worker { cancel, handle });
        self.running.store(true, Ordering::Release);
        info!(?interval, devices = self.device_count(), "monitor started");
        Ok(())
    }

    /// Stop polling. No-op if already stopped.
    ///
    /// Blocks until the polling thread has exited, which may take as long as
    /// one in-flight device fetch. The last published snapshot stays readable.
    ///
    /// Called from a device fetch, it cannot wait for its own thread: the
    /// loop is cancelled, publishes nothing further, and is joined by the
    /// next `start()` or `stop()`.
    pub fn stop(&self) {
        let mut admin = self.lock_admin();
        let Some(worker) = admin.worker.take() else {
            reap_orphan(&mut admin);
            return;
        };
        self.running.store(false, Ordering::Release);
        worker.cancel.cancel();

        if worker.handle.thread().id() == thread::current().id() {
            debug!("monitor stopped from its own polling thread; joining later");
            admin.orphan = Some(worker.handle);
            return;
        }
        if worker.handle.join().is_err() {
            warn!("polling thread terminated by panic");
        }
        info!("monitor stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    // ── Readers ──────────────────────────────────────────────────

    /// The most recently published snapshot, or `None` if no cycle has
    /// completed since the last [`start()`](Self::start).
    ///
    /// Never blocks and never takes the administrative lock.
    pub fn get_statuses(&self) -> Option<Arc<Snapshot>> {
        self.shared.published.load().load_full()
    }

    fn lock_admin(&self) -> MutexGuard<'_, Admin> {
        self.admin.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Join a loop that was stopped from its own thread, unless that thread is
/// the caller.
fn reap_orphan(admin: &mut Admin) {
    let Some(handle) = admin.orphan.take() else {
        return;
    };
    if handle.thread().id() == thread::current().id() {
        admin.orphan = Some(handle);
        return;
    }
    if handle.join().is_err() {
        warn!("polling thread terminated by panic");
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for Monitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitor")
            .field("interval", &self.config.interval)
            .field("running", &self.is_running())
            .field("devices", &self.device_count())
            .finish_non_exhaustive()
    }
}

// ── Polling loop ─────────────────────────────────────────────────────

/// Runs on the dedicated polling thread until `cancel` fires.
///
/// Ticks are anchored to the previous deadline rather than to cycle
/// completion. When a cycle overruns, the next one starts immediately and
/// the schedule re-anchors from there, so there are no catch-up bursts.
async fn poll_loop(shared: &Shared, slot: &Slot, period: Duration, cancel: &CancellationToken) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut cycle: u64 = 0;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        cycle += 1;
        let started = Instant::now();
        let Some(snapshot) = shared.poll_once(cycle, cancel) else {
            break;
        };
        let published = snapshot.len();
        slot.store(Some(Arc::new(snapshot)));

        let elapsed = started.elapsed();
        if elapsed > period {
            warn!(cycle, ?elapsed, ?period, "polling cycle overran its interval");
        } else {
            trace!(cycle, published, ?elapsed, "polling cycle complete");
        }
    }

    debug!(cycles = cycle, "polling loop exiting");
}

impl Shared {
    /// Fetch every registered device once and assemble the results.
    ///
    /// Devices that fail are left out of the snapshot entirely. Returns
    /// `None` if `cancel` fires during the cycle; the remaining devices are
    /// not fetched.
    fn poll_once(&self, cycle: u64, cancel: &CancellationToken) -> Option<Snapshot> {
        let registry = self.registry.load_full();
        let mut statuses = StatusMap::new();

        for (&id, device) in registry.iter() {
            let result = fetch(device.as_ref());
            if cancel.is_cancelled() {
                debug!(cycle, "stop requested mid-cycle; discarding readings");
                return None;
            }
            match result {
                Ok(status) => {
                    statuses.insert(id, status);
                }
                Err(e) => debug!(device = %id, error = %e, "device fetch failed"),
            }
        }

        Some(Snapshot::new(cycle, Utc::now(), statuses))
    }
}

/// Fetch one device, treating a panic like any other failure.
fn fetch(device: &dyn Device) -> Result<Status, DeviceError> {
    panic::catch_unwind(AssertUnwindSafe(|| device.fetch_current_state()))
        .unwrap_or_else(|_| Err(DeviceError::failed("device panicked during fetch")))
}
