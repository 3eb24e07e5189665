use crate::batch::Batch;
use crate::sink::SinkClient;

// Trivial sink.  This dumps each batch's line protocol on stdout and accepts
// every write; useful when developing locally without a sink to write to.

pub struct StdoutSink {}

impl StdoutSink {
    pub fn new() -> StdoutSink {
        StdoutSink {}
    }
}

impl SinkClient for StdoutSink {
    fn write(&mut self, batch: &Batch) -> Result<(), String> {
        print!("{}", batch.to_line_protocol());
        Ok(())
    }
}
