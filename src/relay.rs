//! Lossy single-slot frame relay between a capture callback and a consumer thread.
//!
//! The capture source pushes raw preview frames through a [`FrameProducer`].
//! A dedicated consumer thread owned by the [`FrameRelay`] hands the newest
//! frame to a [`FrameConsumer`]. There is exactly one frame buffer:
//!
//! - a frame arriving while another is pending overwrites it (latest wins);
//! - a frame arriving while the consumer is processing is dropped;
//! - nothing is ever queued.
//!
//! ```text
//!            submit                 wake + copy out          callback returns
//!   ARMED ───────────▶ FRAME_PENDING ──────────────▶ PROCESSING ─────────────▶ ARMED
//!     ▲                  │   ▲                           │
//!     │                  └───┘ submit (overwrite)        └─ submit: dropped
//!     └──────── stop() from any state ──────▶ IDLE
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::mpsc;
//! use previewfit::{FrameRelay, PreviewFormat, Size};
//!
//! let (tx, rx) = mpsc::channel();
//! let mut relay = FrameRelay::start(PreviewFormat::Nv21, Size::new(4, 2), move |frame: previewfit::Frame<'_>| {
//!     tx.send(frame.data[0]).unwrap();
//! })
//! .unwrap();
//!
//! let producer = relay.producer();
//! producer.submit(&[7u8; 12]);
//! assert_eq!(rx.recv().unwrap(), 7);
//! relay.stop();
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle, ThreadId};

use tracing::{debug, trace, warn};

use crate::error::{PreviewError, Result};
use crate::format::PreviewFormat;
use crate::geometry::Size;

/// Default name of the consumer thread.
pub const DEFAULT_THREAD_NAME: &str = "preview-frame-relay";

/// Relay configuration.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RelayConfig {
    pub thread_name: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            thread_name: DEFAULT_THREAD_NAME.into(),
        }
    }
}

impl RelayConfig {
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }
}

/// Observable state of a relay.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RelayState {
    /// Stopped; no consumer thread, no buffer.
    Idle,
    /// Running with no pending frame.
    Armed,
    /// A frame waits in the slot.
    FramePending,
    /// The consumer is handling a frame; new frames are dropped.
    Processing,
}

/// Outcome of [`FrameProducer::submit`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Submission {
    /// Written into an empty slot.
    Accepted,
    /// Written over a pending frame the consumer had not claimed yet.
    Overwrote,
    /// The consumer is busy; the frame was discarded.
    DroppedBusy,
    /// The relay is stopped.
    Stopped,
}

impl Submission {
    /// Whether the frame landed in the slot.
    pub fn is_admitted(self) -> bool {
        matches!(self, Self::Accepted | Self::Overwrote)
    }
}

/// Frame counters.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct RelayStats {
    /// Frames offered while running, including dropped ones.
    pub produced: u64,
    /// Frames handed to the consumer.
    pub delivered: u64,
    /// Frames discarded because the consumer was busy.
    pub dropped_busy: u64,
    /// Pending frames replaced by a newer one before delivery.
    pub overwritten: u64,
    /// Pending frames thrown away when the relay stopped.
    pub discarded: u64,
}

/// A frame handed to the consumer.
#[derive(Debug)]
pub struct Frame<'a> {
    pub format: PreviewFormat,
    pub data: &'a [u8],
    pub size: Size,
    /// Production index. Strictly increasing across deliveries, with gaps
    /// where frames were dropped or overwritten.
    pub sequence: u64,
    shared: &'a Arc<Shared>,
}

impl Frame<'_> {
    /// Keep the relay busy after the callback returns.
    ///
    /// Consumers that hand the frame off to another thread take a hold and
    /// drop it when that work finishes. Frames keep being dropped until every
    /// hold is released.
    pub fn hold(&self) -> ProcessingHold {
        self.shared.lock().holds += 1;
        ProcessingHold {
            shared: Arc::clone(self.shared),
        }
    }
}

/// Keeps the relay in [`RelayState::Processing`] until dropped.
#[must_use = "the relay stays busy only while the hold is alive"]
#[derive(Debug)]
pub struct ProcessingHold {
    shared: Arc<Shared>,
}

impl Drop for ProcessingHold {
    fn drop(&mut self) {
        let mut slot = self.shared.lock();
        slot.holds = slot.holds.saturating_sub(1);
        drop(slot);
        self.shared.ready.notify_all();
    }
}

/// Receives admitted frames on the relay's consumer thread.
pub trait FrameConsumer: Send + 'static {
    fn on_frame(&mut self, frame: Frame<'_>);
}

impl<F> FrameConsumer for F
where
    F: FnMut(Frame<'_>) + Send + 'static,
{
    fn on_frame(&mut self, frame: Frame<'_>) {
        self(frame)
    }
}

#[derive(Debug)]
struct Slot {
    buffer: Vec<u8>,
    pending: bool,
    pending_sequence: u64,
    processing: bool,
    holds: usize,
    running: bool,
}

impl Slot {
    fn busy(&self) -> bool {
        self.processing || self.holds > 0
    }

    /// Mark the slot stopped and release the buffer. Returns whether a
    /// pending frame was thrown away.
    fn shut(&mut self) -> bool {
        let discarded = self.running && self.pending;
        self.running = false;
        self.pending = false;
        self.buffer = Vec::new();
        discarded
    }
}

#[derive(Debug)]
struct Shared {
    slot: Mutex<Slot>,
    ready: Condvar,
    next_sequence: AtomicU64,
    delivered: AtomicU64,
    dropped_busy: AtomicU64,
    overwritten: AtomicU64,
    discarded: AtomicU64,
}

impl Shared {
    // Slot invariants hold between every pair of statements that touch it,
    // so a panic elsewhere never leaves it torn.
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait<'a>(&self, guard: MutexGuard<'a, Slot>) -> MutexGuard<'a, Slot> {
        self.ready
            .wait(guard)
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Cloneable handle the capture source uses to push frames.
#[derive(Clone, Debug)]
pub struct FrameProducer {
    shared: Arc<Shared>,
}

impl FrameProducer {
    /// Offer a raw frame.
    ///
    /// Copies at most the buffer capacity; a longer frame is truncated and a
    /// shorter one fills only a prefix. Never blocks on the consumer.
    pub fn submit(&self, data: &[u8]) -> Submission {
        let mut slot = self.shared.lock();
        if !slot.running {
            return Submission::Stopped;
        }
        // Assigned under the lock so slot order and index order agree.
        let sequence = self.shared.next_sequence.fetch_add(1, Ordering::Relaxed);
        if slot.busy() {
            drop(slot);
            self.shared.dropped_busy.fetch_add(1, Ordering::Relaxed);
            trace!(sequence, "preview frame dropped while processing");
            return Submission::DroppedBusy;
        }

        let n = data.len().min(slot.buffer.len());
        slot.buffer[..n].copy_from_slice(&data[..n]);
        let overwrote = slot.pending;
        slot.pending = true;
        slot.pending_sequence = sequence;
        drop(slot);
        self.shared.ready.notify_all();

        if overwrote {
            self.shared.overwritten.fetch_add(1, Ordering::Relaxed);
            Submission::Overwrote
        } else {
            Submission::Accepted
        }
    }
}

/// Owner of the consumer thread and the single frame buffer.
#[derive(Debug)]
pub struct FrameRelay {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
    worker_id: Option<ThreadId>,
    format: PreviewFormat,
    size: Size,
}

impl FrameRelay {
    /// Start a relay with the default configuration.
    pub fn start<C: FrameConsumer>(format: PreviewFormat, size: Size, consumer: C) -> Result<Self> {
        Self::start_with(&RelayConfig::default(), format, size, consumer)
    }

    /// Allocate the frame buffer for `format` at `size` and spawn the consumer thread.
    pub fn start_with<C: FrameConsumer>(
        config: &RelayConfig,
        format: PreviewFormat,
        size: Size,
        consumer: C,
    ) -> Result<Self> {
        let capacity = format.frame_len(size);
        if capacity == 0 {
            return Err(PreviewError::ZeroDimension);
        }
        let shared = Arc::new(Shared {
            slot: Mutex::new(Slot {
                buffer: vec![0; capacity],
                pending: false,
                pending_sequence: 0,
                processing: false,
                holds: 0,
                running: true,
            }),
            ready: Condvar::new(),
            next_sequence: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            dropped_busy: AtomicU64::new(0),
            overwritten: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || consume_loop(worker_shared, format, size, capacity, consumer))
            .map_err(PreviewError::Spawn)?;
        let worker_id = worker.thread().id();

        debug!(?format, width = size.width, height = size.height, capacity, "frame relay started");
        Ok(Self {
            shared,
            worker: Some(worker),
            worker_id: Some(worker_id),
            format,
            size,
        })
    }

    /// A new handle for pushing frames.
    pub fn producer(&self) -> FrameProducer {
        FrameProducer {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn format(&self) -> PreviewFormat {
        self.format
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Byte capacity of the frame buffer; zero once stopped.
    pub fn capacity(&self) -> usize {
        self.shared.lock().buffer.len()
    }

    pub fn state(&self) -> RelayState {
        let slot = self.shared.lock();
        if !slot.running {
            RelayState::Idle
        } else if slot.busy() {
            RelayState::Processing
        } else if slot.pending {
            RelayState::FramePending
        } else {
            RelayState::Armed
        }
    }

    pub fn stats(&self) -> RelayStats {
        let s = &self.shared;
        RelayStats {
            produced: s.next_sequence.load(Ordering::Relaxed),
            delivered: s.delivered.load(Ordering::Relaxed),
            dropped_busy: s.dropped_busy.load(Ordering::Relaxed),
            overwritten: s.overwritten.load(Ordering::Relaxed),
            discarded: s.discarded.load(Ordering::Relaxed),
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared.lock().running
    }

    /// Stop the relay and release the buffer. Idempotent.
    ///
    /// Waits for an in-flight callback to return, so no callback runs after
    /// `stop` returns. Called from inside the consumer callback it only
    /// signals the thread, which exits once the callback returns.
    pub fn stop(&mut self) {
        if self.shared.lock().shut() {
            self.shared.discarded.fetch_add(1, Ordering::Relaxed);
        }
        self.shared.ready.notify_all();

        let on_worker = self.worker_id == Some(thread::current().id());
        if let Some(worker) = self.worker.take() {
            if on_worker {
                return;
            }
            if worker.join().is_err() {
                debug!("frame consumer panicked");
            }
            debug!("frame relay stopped");
        }
    }
}

impl Drop for FrameRelay {
    fn drop(&mut self) {
        self.stop();
    }
}

fn consume_loop<C: FrameConsumer>(
    shared: Arc<Shared>,
    format: PreviewFormat,
    size: Size,
    capacity: usize,
    mut consumer: C,
) {
    let mut scratch = vec![0u8; capacity];
    loop {
        let sequence = {
            let mut slot = shared.lock();
            while slot.running && !(slot.pending && !slot.busy()) {
                slot = shared.wait(slot);
            }
            if !slot.running {
                break;
            }
            scratch.copy_from_slice(&slot.buffer);
            slot.pending = false;
            slot.processing = true;
            slot.pending_sequence
        };

        shared.delivered.fetch_add(1, Ordering::Relaxed);
        let done = CallbackDone { shared: &shared };
        consumer.on_frame(Frame {
            format,
            data: &scratch,
            size,
            sequence,
            shared: &shared,
        });
        trace!(sequence, "preview frame processed");
        drop(done);

        if !shared.lock().running {
            break;
        }
    }
}

/// Clears `processing` when the callback returns or unwinds. An unwinding
/// callback also stops the relay so producers see `Stopped`.
struct CallbackDone<'a> {
    shared: &'a Shared,
}

impl Drop for CallbackDone<'_> {
    fn drop(&mut self) {
        let mut slot = self.shared.lock();
        slot.processing = false;
        if thread::panicking() {
            if slot.shut() {
                self.shared.discarded.fetch_add(1, Ordering::Relaxed);
            }
            warn!("frame consumer panicked, relay stopped");
        }
        drop(slot);
        self.shared.ready.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    const SIZE: Size = Size::new(4, 2);
    // NV21 4×2 = 12 bytes

    fn wait_for(relay: &FrameRelay, state: RelayState) {
        for _ in 0..2000 {
            if relay.state() == state {
                return;
            }
            thread::sleep(Duration::from_millis(1));
        }
        panic!("relay never reached {state:?}, stuck in {:?}", relay.state());
    }

    #[test]
    fn buffer_sized_from_format() {
        let relay = FrameRelay::start(PreviewFormat::Nv21, SIZE, |_: Frame<'_>| {}).unwrap();
        assert_eq!(relay.capacity(), 12);
        assert_eq!(relay.state(), RelayState::Armed);
    }

    #[test]
    fn zero_size_rejected() {
        let err = FrameRelay::start(PreviewFormat::Nv21, Size::new(0, 2), |_: Frame<'_>| {})
            .unwrap_err();
        assert!(matches!(err, PreviewError::ZeroDimension));
    }

    #[test]
    fn delivers_frame_contents() {
        let (tx, rx) = mpsc::channel();
        let relay = FrameRelay::start(PreviewFormat::Nv21, SIZE, move |f: Frame<'_>| {
            tx.send((f.data.to_vec(), f.size, f.format, f.sequence)).unwrap();
        })
        .unwrap();
        let data: Vec<u8> = (0..12).collect();
        assert_eq!(relay.producer().submit(&data), Submission::Accepted);
        let (got, size, format, seq) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(got, data);
        assert_eq!(size, SIZE);
        assert_eq!(format, PreviewFormat::Nv21);
        assert_eq!(seq, 0);
    }

    #[test]
    fn oversized_frame_truncated() {
        let (tx, rx) = mpsc::channel();
        let relay = FrameRelay::start(PreviewFormat::Nv21, SIZE, move |f: Frame<'_>| {
            tx.send(f.data.len()).unwrap();
        })
        .unwrap();
        relay.producer().submit(&[1u8; 100]);
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 12);
    }

    #[test]
    fn busy_consumer_drops_frames() {
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let relay = FrameRelay::start(PreviewFormat::Nv21, SIZE, move |_: Frame<'_>| {
            started_tx.send(()).unwrap();
            let _ = release_rx.recv();
        })
        .unwrap();
        let producer = relay.producer();

        producer.submit(&[0; 12]);
        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(relay.state(), RelayState::Processing);
        assert_eq!(producer.submit(&[1; 12]), Submission::DroppedBusy);
        assert_eq!(producer.submit(&[2; 12]), Submission::DroppedBusy);

        release_tx.send(()).unwrap();
        wait_for(&relay, RelayState::Armed);
        let stats = relay.stats();
        assert_eq!(stats.produced, 3);
        assert_eq!(stats.delivered, 1);
        assert_eq!(stats.dropped_busy, 2);
    }

    #[test]
    fn hold_keeps_relay_busy() {
        let (tx, rx) = mpsc::channel();
        let relay = FrameRelay::start(PreviewFormat::Nv21, SIZE, move |f: Frame<'_>| {
            tx.send(f.hold()).unwrap();
        })
        .unwrap();
        let producer = relay.producer();
        producer.submit(&[0; 12]);
        let hold = rx.recv_timeout(Duration::from_secs(5)).unwrap();

        wait_for(&relay, RelayState::Processing);
        assert_eq!(producer.submit(&[1; 12]), Submission::DroppedBusy);
        drop(hold);
        wait_for(&relay, RelayState::Armed);
        assert_eq!(producer.submit(&[2; 12]), Submission::Accepted);
        let _next = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    }

    #[test]
    fn stop_is_idempotent_and_releases_buffer() {
        let mut relay = FrameRelay::start(PreviewFormat::Nv21, SIZE, |_: Frame<'_>| {}).unwrap();
        let producer = relay.producer();
        relay.stop();
        relay.stop();
        assert_eq!(relay.state(), RelayState::Idle);
        assert_eq!(relay.capacity(), 0);
        assert_eq!(producer.submit(&[0; 12]), Submission::Stopped);
    }

    #[test]
    fn panicking_consumer_stops_relay() {
        let mut relay = FrameRelay::start(PreviewFormat::Nv21, SIZE, |_: Frame<'_>| {
            panic!("consumer failure");
        })
        .unwrap();
        let producer = relay.producer();
        assert_eq!(producer.submit(&[0; 12]), Submission::Accepted);

        wait_for(&relay, RelayState::Idle);
        assert!(!relay.is_running());
        assert_eq!(producer.submit(&[1; 12]), Submission::Stopped);
        let stats = relay.stats();
        assert_eq!(stats.produced, 1);
        assert_eq!(stats.dropped_busy, 0);
        relay.stop();
    }

    #[test]
    fn custom_thread_name() {
        let (tx, rx) = mpsc::channel();
        let config = RelayConfig::default().thread_name("relay-under-test");
        let relay = FrameRelay::start_with(&config, PreviewFormat::Nv21, SIZE, move |_: Frame<'_>| {
            tx.send(thread::current().name().map(str::to_owned)).unwrap();
        })
        .unwrap();
        relay.producer().submit(&[0; 12]);
        let name = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(name.as_deref(), Some("relay-under-test"));
    }
}
