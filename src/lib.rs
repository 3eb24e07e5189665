//! A basic buffering stats logger, pushing points to an InfluxDB-style sink.
//!
//! Logging is fire and forget: [`Stats::log`] never blocks and never fails,
//! and under sustained overload or a long sink outage points are silently
//! dropped.  Delivery is best effort - batches that the sink rejects are
//! retried on the next push cycle, nothing is spooled to disk, and nothing
//! is drained at shutdown.
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::thread;
//! use std::time::Duration;
//!
//! use crossbeam::channel;
//! use statsink::Stats;
//!
//! let stats = Arc::new(Stats::new());
//! let (cancel, cancelled) = channel::bounded(1);
//! {
//!     let stats = Arc::clone(&stats);
//!     thread::spawn(move || {
//!         stats.register(
//!             cancelled,
//!             Duration::from_secs(10),
//!             "http://influx.example.com:8086",
//!             "metricsdb",
//!             "metricsdbuser",
//!             "metricsdbpass",
//!         );
//!     });
//! }
//!
//! stats.log("counter", 1);
//!
//! // On shutdown:
//! let _ = cancel.send(());
//! ```

pub mod batch;
pub mod point;
pub mod reporter;
pub mod scheduler;
pub mod sink;
pub mod stats;
pub mod time;

#[cfg(test)]
mod reporter_test;

pub use crate::batch::{Batch, BatchConfig, Precision};
pub use crate::point::{Point, Value};
pub use crate::reporter::{Reporter, DEFAULT_PUSH_BATCH_SIZE, DEFAULT_QUEUE_SIZE};
pub use crate::sink::http::{HttpConfig, HttpSink};
pub use crate::sink::stdio::StdoutSink;
pub use crate::sink::SinkClient;
pub use crate::stats::Stats;
