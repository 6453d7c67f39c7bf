//! Background tick loop.
//!
//! A [`TickScheduler`] owns a worker thread that ticks a shared session at a
//! fixed cadence. Every tick holds the session lock for its whole run, and
//! so does every player action going through [`lock_session`], so the two
//! never interleave.
//!
//! The worker sleeps on the stop channel with a timeout of one tick
//! interval. A timeout means "tick"; a stop message or a dropped sender
//! means "exit". The elapsed time handed to each tick is measured wall time
//! since the previous tick, so a late tick simulates a longer interval.

use crate::session::Session;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// A session shared between the scheduler thread and player actions.
///
/// Event listeners run while the lock is held, so they must not call
/// [`lock_session`] on the same session; that deadlocks.
pub type SharedSession = Arc<Mutex<Session>>;

/// Wrap a session for use with a [`TickScheduler`].
pub fn shared(session: Session) -> SharedSession {
    Arc::new(Mutex::new(session))
}

/// Lock a shared session, recovering from poisoning.
pub fn lock_session(session: &SharedSession) -> MutexGuard<'_, Session> {
    session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Ticks per second when nothing else is configured.
pub const DEFAULT_TICK_RATE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Ticks per second. Zero is treated as one.
    pub tick_rate: u32,
}

impl SchedulerConfig {
    pub fn with_tick_rate(tick_rate: u32) -> Self {
        Self { tick_rate }
    }

    /// Time between ticks.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(1) / self.tick_rate.max(1)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    #[error("tick scheduler already running")]
    AlreadyRunning,
    #[error("tick scheduler not running")]
    NotRunning,
    #[error("failed to spawn tick thread: {reason}")]
    ThreadSpawnFailed { reason: String },
    #[error("failed to join tick thread")]
    ThreadJoinFailed,
}

// ---------------------------------------------------------------------------
// TickScheduler
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct TickScheduler {
    config: SchedulerConfig,
    session: SharedSession,
    running: Arc<AtomicBool>,
    stop_tx: Option<mpsc::Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl TickScheduler {
    pub fn new(config: SchedulerConfig, session: SharedSession) -> Self {
        Self {
            config,
            session,
            running: Arc::new(AtomicBool::new(false)),
            stop_tx: None,
            worker: None,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// The session this scheduler ticks.
    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Spawn the worker thread.
    pub fn start(&mut self) -> Result<(), SchedulerError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(SchedulerError::AlreadyRunning);
        }

        let interval = self.config.interval();
        let running = Arc::clone(&self.running);
        let session = Arc::clone(&self.session);
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let worker = thread::Builder::new()
            .name("insitu-tick".to_string())
            .spawn(move || {
                let mut last = Instant::now();
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Ok(()) => break,
                        Err(mpsc::RecvTimeoutError::Timeout) => {
                            let now = Instant::now();
                            let elapsed = now.duration_since(last).as_secs_f64();
                            last = now;
                            lock_session(&session).tick(elapsed);
                        }
                        Err(mpsc::RecvTimeoutError::Disconnected) => break,
                    }
                }
                running.store(false, Ordering::SeqCst);
            })
            .map_err(|err| {
                self.running.store(false, Ordering::SeqCst);
                SchedulerError::ThreadSpawnFailed {
                    reason: err.to_string(),
                }
            })?;

        self.stop_tx = Some(stop_tx);
        self.worker = Some(worker);
        Ok(())
    }

    /// Signal the worker to exit and wait for it. A tick already in progress
    /// completes first.
    pub fn stop(&mut self) -> Result<(), SchedulerError> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(SchedulerError::NotRunning);
        }
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(worker) = self.worker.take() {
            worker
                .join()
                .map_err(|_| SchedulerError::ThreadJoinFailed)?;
        }
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }
}

impl Drop for TickScheduler {
    fn drop(&mut self) {
        if !self.running.load(Ordering::SeqCst) {
            return;
        }
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        self.running.store(false, Ordering::SeqCst);
    }
}
