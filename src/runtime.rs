use std::sync::atomic::{AtomicBool, Ordering};
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent};
use tracing::{debug, error, warn};

use crate::clock::Clock;
use crate::detection::{DetectionAdapter, DetectionResult};
use crate::error::DetectionError;

/// Events a producer may have posted but the runner not yet taken.
/// A detection cycle blocks on posting once this many are waiting.
pub const EVENT_QUEUE_BOUND: usize = 1;

const MIN_RETRY_DELAY: Duration = Duration::from_millis(1);
const HANDOFF_POLL: Duration = Duration::from_millis(5);

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    Tick,
    /// A detection result and the clock reading taken when the frame was
    /// analysed.
    Detection { at_ms: u64, result: DetectionResult },
}

/// Bounded channel shared by every event producer.
pub fn event_channel() -> (SyncSender<AppEvent>, Receiver<AppEvent>) {
    mpsc::sync_channel(EVENT_QUEUE_BOUND)
}

/// Source of app events (keyboard, resize, detection results, etc.)
pub trait AppEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError>;
}

/// Production event source using crossterm. Other producers (the
/// detection loop) post into the same channel through [`sender`](Self::sender).
pub struct CrosstermEventSource {
    tx: SyncSender<AppEvent>,
    rx: Receiver<AppEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = event_channel();
        let key_tx = tx.clone();

        thread::spawn(move || loop {
            match event::read() {
                Ok(CtEvent::Key(key)) => {
                    if key_tx.send(AppEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if key_tx.send(AppEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(%err, "terminal input closed");
                    break;
                }
            }
        });

        Self { tx, rx }
    }

    pub fn sender(&self) -> SyncSender<AppEvent> {
        self.tx.clone()
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AppEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<AppEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }
}

impl AppEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event/tick at a time.
///
/// Ticks are scheduled against a deadline so a steady stream of events
/// (detection runs at frame rate) cannot starve them.
pub struct Runner<E: AppEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
    next_tick: Instant,
}

impl<E: AppEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        let next_tick = Instant::now() + ticker.interval();
        Self {
            event_source,
            ticker,
            next_tick,
        }
    }

    /// Blocks until the next tick is due and returns the next event, or Tick
    /// once the deadline passes
    pub fn step(&mut self) -> AppEvent {
        let now = Instant::now();
        if now >= self.next_tick {
            return self.tick(now);
        }

        match self.event_source.recv_timeout(self.next_tick - now) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                self.tick(Instant::now())
            }
        }
    }

    fn tick(&mut self, now: Instant) -> AppEvent {
        self.next_tick = now + self.ticker.interval();
        AppEvent::Tick
    }
}

/// Background loop pulling frames from a [`DetectionAdapter`] and posting
/// the results as [`AppEvent::Detection`], stamped with `clock`.
///
/// The next frame is requested only once the previous result has been
/// accepted by the bounded event channel, so a slow consumer holds the loop
/// back instead of letting results pile up. A transient failure backs off
/// for `retry_delay` (at least 1ms) before the next attempt; a fatal one is
/// posted and ends the loop. An adapter panic is reported as a fatal
/// [`DetectionError::Crashed`]. Stopping is cooperative: the active flag is
/// checked before each cycle and while waiting to hand off a result, so a
/// frame already in flight still completes.
pub struct DetectionLoop {
    active: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl DetectionLoop {
    pub fn start<A, C>(
        mut adapter: A,
        clock: C,
        tx: SyncSender<AppEvent>,
        retry_delay: Duration,
    ) -> Self
    where
        A: DetectionAdapter,
        C: Clock + Send + 'static,
    {
        let active = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&active);
        let retry_delay = retry_delay.max(MIN_RETRY_DELAY);

        let handle = thread::spawn(move || {
            while flag.load(Ordering::SeqCst) {
                let result = panic::catch_unwind(AssertUnwindSafe(|| adapter.detect_frame()))
                    .unwrap_or_else(|payload| {
                        let msg = panic_message(payload.as_ref());
                        error!(%msg, "detection adapter panicked");
                        Err(DetectionError::Crashed(msg))
                    });
                let at_ms = clock.now_ms();
                let (fatal, transient) = match &result {
                    Ok(_) => (false, false),
                    Err(err) => (err.is_fatal(), !err.is_fatal()),
                };

                if !post(&tx, &flag, AppEvent::Detection { at_ms, result }) {
                    break;
                }
                if fatal {
                    break;
                }
                if transient {
                    thread::sleep(retry_delay);
                }
            }
            flag.store(false, Ordering::SeqCst);
            debug!("detection loop finished");
        });

        Self {
            active,
            handle: Some(handle),
        }
    }

    /// False once stopped, or once the loop ended on its own.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Ask the loop to stop and wait for the current cycle to finish.
    pub fn stop(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("detection loop panicked");
            }
        }
    }
}

/// Hand one event to the runner, waiting while the channel is full.
/// False when the runner is gone or the loop was stopped meanwhile.
fn post(tx: &SyncSender<AppEvent>, active: &AtomicBool, mut event: AppEvent) -> bool {
    loop {
        match tx.try_send(event) {
            Ok(()) => return true,
            Err(TrySendError::Disconnected(_)) => return false,
            Err(TrySendError::Full(back)) => {
                if !active.load(Ordering::SeqCst) {
                    return false;
                }
                event = back;
                thread::sleep(HANDOFF_POLL);
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl Drop for DetectionLoop {
    fn drop(&mut self) {
        // don't block on a frame in flight, the thread exits at the next check
        self.active.store(false, Ordering::SeqCst);
    }
}
