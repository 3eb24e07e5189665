use crate::batch::{Batch, BatchConfig, Precision};
use crate::point::Point;
use crate::sink::SinkClient;

use crossbeam::channel;

// The buffering/flush engine.  Producers drop points into a bounded queue
// through offer() and never block; the scheduler periodically calls push(),
// which assembles a batch from the retry backlog plus whatever the queue
// holds and submits it to the sink.
//
// The backlog holds every point of the most recent unconfirmed batch.  It is
// cleared exactly when a write succeeds; while a write keeps failing, the
// same points are re-submitted as the prefix of every subsequent batch.
// Delivery is best effort: a full queue drops new points, and nothing is
// drained at shutdown.

pub const DEFAULT_QUEUE_SIZE: usize = 10_000;
pub const DEFAULT_PUSH_BATCH_SIZE: usize = 1_000;

// The producers' half of the queue.  If we cannot buffer any more points,
// silently drop this one; callers must never block or see an error here.
// Also covers the disconnected case after the scheduler has stopped.

pub fn offer(queue: &channel::Sender<Point>, point: Point) {
    let _ignored = queue.try_send(point);
}

pub struct Reporter {
    sink: Box<dyn SinkClient>,
    database: String,
    queue: channel::Receiver<Point>,
    backlog: Vec<Point>,
}

impl Reporter {
    pub fn new(
        sink: Box<dyn SinkClient>,
        database: &str,
        queue: channel::Receiver<Point>,
    ) -> Reporter {
        Reporter {
            sink,
            database: database.to_string(),
            queue,
            backlog: Vec::with_capacity(DEFAULT_PUSH_BATCH_SIZE),
        }
    }

    // One flush cycle.  Never runs concurrently with itself - the scheduler
    // waits for it to return before another tick can fire.
    pub fn push(&mut self, max_points: usize) -> Result<(), String> {
        let mut batch = Batch::new(BatchConfig {
            database: self.database.clone(),
            precision: Precision::Micro,
        });

        // The backlog goes in first, in its original order.  A point that
        // cannot be encoded is malformed and is dropped for good, without
        // failing the cycle.
        self.backlog.retain(|p| {
            match batch.add_point(&p.name, p.timestamp, &p.value) {
                Ok(()) => true,
                Err(e) => {
                    log::warn!("Skipping point {}: {e}", p.name);
                    false
                }
            }
        });

        // Then drain the queue up to the batch cap.  Everything pulled joins
        // the backlog immediately: until the write is confirmed, these points
        // count as unconfirmed and must survive a failure.
        while batch.len() < max_points {
            match self.queue.try_recv() {
                Ok(p) => match batch.add_point(&p.name, p.timestamp, &p.value) {
                    Ok(()) => self.backlog.push(p),
                    Err(e) => {
                        log::warn!("Skipping point {}: {e}", p.name);
                    }
                },
                Err(_) => {
                    // No more buffered points; push what we have right now.
                    break;
                }
            }
        }

        if batch.is_empty() {
            return Ok(());
        }

        self.sink.write(&batch)?;
        self.backlog.clear();
        Ok(())
    }
}
