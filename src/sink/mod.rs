pub mod http;
pub mod stdio;

use crate::batch::Batch;

// The SinkClient hides the specific time-series sink we write to.  It
// receives one complete batch per write() call and must report whether the
// sink accepted it; the reporter decides what to retry.  An implementation
// owns its own network timeout - the caller never imposes one.

pub trait SinkClient: Send {
    // Write the whole batch, or fail the whole batch.
    fn write(&mut self, batch: &Batch) -> Result<(), String>;
}
