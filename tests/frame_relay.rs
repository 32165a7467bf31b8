//! Frame relay under load: a producer that outpaces its consumer.
//!
//! Every frame carries its production index in its first eight bytes, so
//! ordering, duplication and staleness errors all show up as index
//! mismatches on the consumer side.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use previewfit::*;

const SIZE: Size = Size::new(16, 8);
// NV21 16×8 = 192 bytes
const FRAME_LEN: usize = 192;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn frame(index: u64) -> Vec<u8> {
    let mut data = vec![0u8; FRAME_LEN];
    data[..8].copy_from_slice(&index.to_le_bytes());
    data
}

fn index_of(data: &[u8]) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&data[..8]);
    u64::from_le_bytes(bytes)
}

fn wait_until(mut done: impl FnMut() -> bool) {
    for _ in 0..5000 {
        if done() {
            return;
        }
        thread::sleep(Duration::from_millis(1));
    }
    panic!("condition never reached");
}

/// (sequence, index carried in the payload) for each delivered frame.
type Log = Arc<Mutex<Vec<(u64, u64)>>>;

fn slow_relay(delay: Duration) -> (FrameRelay, Log) {
    let log: Log = Arc::default();
    let sink = Arc::clone(&log);
    let relay = FrameRelay::start(PreviewFormat::Nv21, SIZE, move |f: Frame<'_>| {
        sink.lock().unwrap().push((f.sequence, index_of(f.data)));
        thread::sleep(delay);
    })
    .unwrap();
    (relay, log)
}

#[test]
fn fast_producer_sees_increasing_subsequence() {
    init_tracing();
    let (mut relay, log) = slow_relay(Duration::from_millis(2));
    let producer = relay.producer();

    let mut outcomes = Vec::new();
    for i in 0..400 {
        outcomes.push(producer.submit(&frame(i)));
        if i % 16 == 0 {
            thread::yield_now();
        }
    }
    wait_until(|| relay.state() == RelayState::Armed);

    let delivered = log.lock().unwrap().clone();
    assert!(!delivered.is_empty());
    assert!(delivered.len() < 400, "a slow consumer cannot keep up");
    for &(sequence, index) in &delivered {
        assert_eq!(sequence, index, "payload and sequence disagree");
    }
    for pair in delivered.windows(2) {
        assert!(pair[0].0 < pair[1].0, "out of order or duplicate: {pair:?}");
    }

    // The newest admitted frame always makes it through once the consumer frees up.
    let last_admitted = outcomes.iter().rposition(|s| s.is_admitted()).unwrap() as u64;
    assert_eq!(delivered.last().unwrap().0, last_admitted);

    let stats = relay.stats();
    assert_eq!(stats.produced, 400);
    assert_eq!(stats.delivered, delivered.len() as u64);
    assert_eq!(
        stats.produced,
        stats.delivered + stats.dropped_busy + stats.overwritten + stats.discarded,
        "{stats:?}"
    );
    assert!(stats.dropped_busy > 0);

    relay.stop();
}

#[test]
fn producer_on_its_own_thread() {
    init_tracing();
    let (mut relay, log) = slow_relay(Duration::from_millis(1));
    let producer = relay.producer();

    let camera = thread::spawn(move || {
        for i in 0..200 {
            producer.submit(&frame(i));
            thread::sleep(Duration::from_micros(200));
        }
    });
    camera.join().unwrap();
    wait_until(|| relay.state() == RelayState::Armed);
    relay.stop();

    let delivered = log.lock().unwrap();
    for pair in delivered.windows(2) {
        assert!(pair[0].0 < pair[1].0);
    }
}

#[test]
fn nothing_delivered_after_stop() {
    init_tracing();
    let (mut relay, log) = slow_relay(Duration::from_millis(5));
    let producer = relay.producer();

    for i in 0..50 {
        producer.submit(&frame(i));
    }
    relay.stop();
    let at_stop = log.lock().unwrap().len();

    let before = relay.stats();
    assert_eq!(producer.submit(&frame(50)), Submission::Stopped);
    thread::sleep(Duration::from_millis(30));
    assert_eq!(log.lock().unwrap().len(), at_stop);
    assert_eq!(relay.state(), RelayState::Idle);
    assert!(!relay.is_running());

    // Refused frames are not counted.
    let stats = relay.stats();
    assert_eq!(stats, before);
    assert_eq!(stats.produced, 50);
    assert_eq!(
        stats.produced,
        stats.delivered + stats.dropped_busy + stats.overwritten + stats.discarded,
        "{stats:?}"
    );
}

#[test]
fn stop_waits_for_running_callback() {
    init_tracing();
    let (entered_tx, entered_rx) = mpsc::channel();
    let finished = Arc::new(Mutex::new(false));
    let flag = Arc::clone(&finished);
    let mut relay = FrameRelay::start(PreviewFormat::Nv21, SIZE, move |_: Frame<'_>| {
        entered_tx.send(()).unwrap();
        thread::sleep(Duration::from_millis(50));
        *flag.lock().unwrap() = true;
    })
    .unwrap();

    relay.producer().submit(&frame(0));
    entered_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    relay.stop();
    assert!(*finished.lock().unwrap());
}

#[test]
fn consumer_can_stop_its_own_relay() {
    init_tracing();
    let slot: Arc<Mutex<Option<FrameRelay>>> = Arc::default();
    let inner = Arc::clone(&slot);
    let (done_tx, done_rx) = mpsc::channel();
    let relay = FrameRelay::start(PreviewFormat::Nv21, SIZE, move |_: Frame<'_>| {
        if let Some(relay) = inner.lock().unwrap().as_mut() {
            relay.stop();
        }
        let _ = done_tx.send(());
    })
    .unwrap();
    let producer = relay.producer();
    *slot.lock().unwrap() = Some(relay);

    producer.submit(&frame(0));
    done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(producer.submit(&frame(1)), Submission::Stopped);
    assert_eq!(slot.lock().unwrap().as_ref().unwrap().state(), RelayState::Idle);
}

#[test]
fn short_frame_fills_prefix() {
    let (tx, rx) = mpsc::channel();
    let relay = FrameRelay::start(PreviewFormat::Nv21, SIZE, move |f: Frame<'_>| {
        tx.send(f.data.to_vec()).unwrap();
    })
    .unwrap();
    let producer = relay.producer();

    producer.submit(&[9u8; FRAME_LEN]);
    assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), vec![9u8; FRAME_LEN]);
    wait_until(|| relay.state() == RelayState::Armed);

    producer.submit(&[1u8; 4]);
    let data = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(data.len(), FRAME_LEN);
    assert_eq!(&data[..4], &[1, 1, 1, 1]);
    // the rest still holds the previous frame
    assert!(data[4..].iter().all(|&b| b == 9));
}
