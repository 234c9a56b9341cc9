//! Integration tests for the animation queue and its worker thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use foosboard::adapters::time::StdDelay;
use foosboard::animation::{AnimationQueue, IDLE_SLEEP_MS, LedCommand, LedKind, QUEUE_CAPACITY};
use foosboard::drivers::led_patterns::{GREEN, LedRenderer, MemoryStrip, RED, StripRenderer};

use crate::mock_hw::NoDelay;

/// Renderer that records when each command started.
#[derive(Clone, Default)]
struct Recorder {
    seen: Arc<Mutex<Vec<(LedKind, Instant)>>>,
}

impl Recorder {
    fn kinds(&self) -> Vec<LedKind> {
        self.seen.lock().unwrap().iter().map(|(k, _)| *k).collect()
    }
}

impl LedRenderer for Recorder {
    fn render(&mut self, cmd: &LedCommand) {
        self.seen.lock().unwrap().push((cmd.kind(), Instant::now()));
    }
}

#[test]
fn full_queue_drops_newest() {
    let queue = AnimationQueue::new();
    for _ in 0..QUEUE_CAPACITY {
        assert!(queue.enqueue(LedCommand::clear()));
    }
    assert!(!queue.enqueue(LedCommand::solid(&[(0, 9)], RED)));
    assert_eq!(queue.len(), QUEUE_CAPACITY);
    assert_eq!(queue.dropped(), 1);
    // The dropped command is the one that never made it in.
    assert!(std::iter::from_fn(|| queue.pop()).all(|c| c.kind() == LedKind::Clear));
}

#[test]
fn commands_run_in_fifo_order() {
    let queue = AnimationQueue::new();
    let mut rec = Recorder::default();
    queue.enqueue(LedCommand::solid(&[(0, 4)], GREEN));
    queue.enqueue(LedCommand::new(LedKind::Blink, &[(0, 4)], 0, RED));
    queue.enqueue(LedCommand::clear());

    while queue.run_once(&mut rec) {}

    assert_eq!(rec.kinds(), [LedKind::Solid, LedKind::Blink, LedKind::Clear]);
    assert!(!queue.run_once(&mut rec));
}

#[test]
fn strip_renderer_paints_memory_strip() {
    let queue = AnimationQueue::new();
    let mut renderer = StripRenderer::new(MemoryStrip::new(10), NoDelay);
    queue.enqueue(LedCommand::solid(&[(2, 4)], GREEN));
    queue.run_once(&mut renderer);

    let pixels = renderer.strip().pixels();
    assert_eq!(&pixels[2..=4], &[GREEN; 3]);
    assert!(pixels[..2].iter().chain(&pixels[5..]).all(|p| *p == (0, 0, 0)));

    queue.enqueue(LedCommand::clear());
    queue.run_once(&mut renderer);
    assert!(renderer.strip().pixels().iter().all(|p| *p == (0, 0, 0)));
}

#[test]
fn idle_worker_wakes_within_sleep_bound() {
    let queue = Arc::new(AnimationQueue::new());
    let running = Arc::new(AtomicBool::new(true));
    let rec = Recorder::default();

    let worker = {
        let (queue, running, mut rec) = (queue.clone(), running.clone(), rec.clone());
        thread::spawn(move || queue.run(&mut rec, &mut StdDelay, &running))
    };

    // Let the worker fall into its idle sleep.
    thread::sleep(Duration::from_millis(250));
    let sent = Instant::now();
    queue.enqueue(LedCommand::clear());

    let deadline = sent + Duration::from_secs(2);
    while rec.kinds().is_empty() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    running.store(false, Ordering::Release);
    worker.join().unwrap();

    let seen = rec.seen.lock().unwrap();
    let (kind, started) = seen.first().copied().expect("worker never ran the command");
    assert_eq!(kind, LedKind::Clear);
    // One idle sleep plus scheduling slack.
    let latency = started.duration_since(sent);
    assert!(
        latency < Duration::from_millis(u64::from(IDLE_SLEEP_MS) + 150),
        "wake latency {latency:?}"
    );
}

#[test]
fn worker_stops_when_flag_clears() {
    let queue = Arc::new(AnimationQueue::new());
    let running = Arc::new(AtomicBool::new(true));
    let worker = {
        let (queue, running) = (queue.clone(), running.clone());
        thread::spawn(move || queue.run(&mut Recorder::default(), &mut StdDelay, &running))
    };
    running.store(false, Ordering::Release);
    let start = Instant::now();
    worker.join().unwrap();
    assert!(start.elapsed() < Duration::from_secs(1));
}
