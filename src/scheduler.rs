use crate::reporter::{Reporter, DEFAULT_PUSH_BATCH_SIZE};

use std::time::Duration;

use crossbeam::{channel, select};

// The flush loop.  Owns the reporter for its whole lifetime, so exactly one
// flush can ever be in flight: the next tick is not looked at until push()
// has returned.  The tick channel holds at most one pending tick, so ticks
// that fire while a slow write is in progress coalesce instead of queueing
// up.
//
// The loop exits when the cancel channel yields a message or is
// disconnected.  Whatever is still queued or backlogged at that point is
// abandoned - there is no drain on shutdown.

pub fn run(mut reporter: Reporter, push_interval: Duration, cancel: channel::Receiver<()>) {
    let ticker = channel::tick(push_interval);
    loop {
        select! {
            recv(cancel) -> _ => {
                break;
            }
            recv(ticker) -> _ => {
                if let Err(e) = reporter.push(DEFAULT_PUSH_BATCH_SIZE) {
                    // Non-fatal: the backlog is intact and the next tick
                    // retries at the normal cadence.
                    log::error!("Error pushing stats: {e}");
                }
            }
        }
    }
}
