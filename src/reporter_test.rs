// Tests for the buffering/flush engine, the scheduler, and the Stats
// dispatch.  These drive Reporter::push directly with scripted sinks; the
// scheduler and context tests run the real flush loop on a short cadence.

use crate::batch::Batch;
use crate::point::{Point, Value};
use crate::reporter::{offer, Reporter};
use crate::scheduler;
use crate::sink::SinkClient;
use crate::stats::Stats;

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crossbeam::channel;

// A sink that records the measurement names of every batch it is asked to
// write - including batches whose write it then fails - and fails the first
// `fail_first` writes.

struct ScriptedSink {
    attempts: Arc<Mutex<Vec<Vec<String>>>>,
    fail_first: usize,
    writes: usize,
}

impl ScriptedSink {
    fn new(fail_first: usize) -> (ScriptedSink, Arc<Mutex<Vec<Vec<String>>>>) {
        let attempts = Arc::new(Mutex::new(Vec::new()));
        (
            ScriptedSink {
                attempts: attempts.clone(),
                fail_first,
                writes: 0,
            },
            attempts,
        )
    }
}

impl SinkClient for ScriptedSink {
    fn write(&mut self, batch: &Batch) -> Result<(), String> {
        self.attempts.lock().unwrap().push(names_of(batch));
        self.writes += 1;
        if self.writes <= self.fail_first {
            Err("Synthetic failure".to_string())
        } else {
            Ok(())
        }
    }
}

fn names_of(batch: &Batch) -> Vec<String> {
    batch
        .lines()
        .iter()
        .map(|l| l.split(' ').next().unwrap().to_string())
        .collect()
}

fn reporter_with(
    capacity: usize,
    fail_first: usize,
) -> (
    Reporter,
    channel::Sender<Point>,
    Arc<Mutex<Vec<Vec<String>>>>,
) {
    let (sender, receiver) = channel::bounded(capacity);
    let (sink, attempts) = ScriptedSink::new(fail_first);
    (
        Reporter::new(Box::new(sink), "testdb", receiver),
        sender,
        attempts,
    )
}

fn point(name: &str) -> Point {
    Point::new(name, Value::Int(1))
}

#[test]
pub fn test_ordering_preserved() {
    let (mut r, sender, attempts) = reporter_with(100, 0);
    for name in ["a", "b", "c", "d", "e"] {
        offer(&sender, point(name));
    }
    assert!(r.push(1000).is_ok());
    let attempts = attempts.lock().unwrap();
    assert!(attempts.len() == 1);
    assert!(attempts[0] == vec!["a", "b", "c", "d", "e"]);
}

// The capacity-2 scenario: C finds the queue full and is the one dropped;
// the flush delivers [A, B] and leaves nothing behind.
#[test]
pub fn test_full_queue_drops_newest() {
    let (mut r, sender, attempts) = reporter_with(2, 0);
    offer(&sender, point("a"));
    offer(&sender, point("b"));
    offer(&sender, point("c"));
    assert!(r.push(10).is_ok());
    {
        let attempts = attempts.lock().unwrap();
        assert!(attempts.len() == 1);
        assert!(attempts[0] == vec!["a", "b"]);
    }
    // The backlog was confirmed and cleared: nothing left to write.
    assert!(r.push(10).is_ok());
    assert!(attempts.lock().unwrap().len() == 1);
}

// A failed batch reappears in full as the prefix of the next attempt, with
// newly ingested points after it; success then empties the backlog.
#[test]
pub fn test_failed_batch_is_retried_first() {
    let (mut r, sender, attempts) = reporter_with(100, 1);
    offer(&sender, point("a"));
    offer(&sender, point("b"));
    assert!(r.push(1000).is_err());
    offer(&sender, point("c"));
    assert!(r.push(1000).is_ok());
    {
        let attempts = attempts.lock().unwrap();
        assert!(attempts.len() == 2);
        assert!(attempts[0] == vec!["a", "b"]);
        assert!(attempts[1] == vec!["a", "b", "c"]);
    }
    assert!(r.push(1000).is_ok());
    assert!(attempts.lock().unwrap().len() == 2);
}

#[test]
pub fn test_batch_cap_respected() {
    let (mut r, sender, attempts) = reporter_with(100, 0);
    for name in ["a", "b", "c", "d", "e"] {
        offer(&sender, point(name));
    }
    assert!(r.push(3).is_ok());
    assert!(r.push(3).is_ok());
    let attempts = attempts.lock().unwrap();
    assert!(attempts.len() == 2);
    assert!(attempts[0] == vec!["a", "b", "c"]);
    assert!(attempts[1] == vec!["d", "e"]);
}

// The cap counts backlog and queue points together: a two-point backlog plus
// a three-point queue under a cap of four leaves one point for the next
// cycle.
#[test]
pub fn test_batch_cap_spans_backlog_and_queue() {
    let (mut r, sender, attempts) = reporter_with(100, 1);
    offer(&sender, point("a"));
    offer(&sender, point("b"));
    assert!(r.push(1000).is_err());
    for name in ["c", "d", "e"] {
        offer(&sender, point(name));
    }
    assert!(r.push(4).is_ok());
    assert!(r.push(4).is_ok());
    let attempts = attempts.lock().unwrap();
    assert!(attempts.len() == 3);
    assert!(attempts[0] == vec!["a", "b"]);
    assert!(attempts[1] == vec!["a", "b", "c", "d"]);
    assert!(attempts[2] == vec!["e"]);
}

#[test]
pub fn test_empty_cycle_writes_nothing() {
    let (mut r, _sender, attempts) = reporter_with(10, 0);
    assert!(r.push(1000).is_ok());
    assert!(attempts.lock().unwrap().is_empty());
}

// A malformed value is dropped at batch construction and never comes back,
// while well-formed points around it are batched and retried normally.
#[test]
pub fn test_malformed_value_is_dropped_not_retried() {
    let (mut r, sender, attempts) = reporter_with(10, 1);
    offer(&sender, point("a"));
    offer(&sender, Point::new("broken", Value::Float(f64::NAN)));
    offer(&sender, point("b"));
    assert!(r.push(1000).is_err());
    assert!(r.push(1000).is_ok());
    let attempts = attempts.lock().unwrap();
    assert!(attempts.len() == 2);
    assert!(attempts[0] == vec!["a", "b"]);
    assert!(attempts[1] == vec!["a", "b"]);
}

#[test]
pub fn test_scheduler_flushes_and_stops_on_cancel() {
    let (sender, receiver) = channel::bounded(100);
    let (sink, attempts) = ScriptedSink::new(0);
    let reporter = Reporter::new(Box::new(sink), "testdb", receiver);
    let (cancel_sender, cancel_receiver) = channel::bounded::<()>(1);

    offer(&sender, point("a"));
    let flush_loop = thread::spawn(move || {
        scheduler::run(reporter, Duration::from_millis(10), cancel_receiver);
    });
    thread::sleep(Duration::from_millis(100));
    let _ = cancel_sender.send(());
    flush_loop.join().unwrap();

    let flushed = attempts.lock().unwrap().len();
    assert!(flushed >= 1);
    assert!(attempts.lock().unwrap()[0] == vec!["a"]);

    // No cycle may start after cancellation.
    offer(&sender, point("b"));
    thread::sleep(Duration::from_millis(50));
    assert!(attempts.lock().unwrap().len() == flushed);
}

#[test]
pub fn test_scheduler_stops_when_cancel_sender_is_dropped() {
    let (_sender, receiver) = channel::bounded::<Point>(10);
    let (sink, _attempts) = ScriptedSink::new(0);
    let reporter = Reporter::new(Box::new(sink), "testdb", receiver);
    let (cancel_sender, cancel_receiver) = channel::bounded::<()>(1);

    let flush_loop = thread::spawn(move || {
        scheduler::run(reporter, Duration::from_millis(10), cancel_receiver);
    });
    drop(cancel_sender);
    flush_loop.join().unwrap();
}

// Points logged against a Disabled context vanish; after registration the
// same context delivers.
#[test]
pub fn test_stats_context_disabled_then_live() {
    let stats = Arc::new(Stats::new());
    stats.log("lost", 1);

    let (sink, attempts) = ScriptedSink::new(0);
    let (cancel_sender, cancel_receiver) = channel::bounded::<()>(1);
    let registration = {
        let stats = Arc::clone(&stats);
        thread::spawn(move || {
            stats.register_with_sink(
                cancel_receiver,
                Duration::from_millis(10),
                Box::new(sink),
                "testdb",
            );
        })
    };
    // Give registration a moment to swap the dispatch to Live.
    thread::sleep(Duration::from_millis(50));
    stats.log("kept", 2);
    thread::sleep(Duration::from_millis(100));
    let _ = cancel_sender.send(());
    registration.join().unwrap();

    let attempts = attempts.lock().unwrap();
    assert!(!attempts.is_empty());
    assert!(attempts.iter().flatten().any(|n| n.as_str() == "kept"));
    assert!(!attempts.iter().flatten().any(|n| n.as_str() == "lost"));
}
