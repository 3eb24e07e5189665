use crate::point::{Point, Value};
use crate::reporter::{self, Reporter, DEFAULT_QUEUE_SIZE};
use crate::scheduler;
use crate::sink::http::{HttpConfig, HttpSink};
use crate::sink::SinkClient;

use std::sync::RwLock;
use std::time::Duration;

use crossbeam::channel;

const DEFAULT_SINK_TIMEOUT_SECS: u64 = 30;

// The handle callers log through.  A Stats context starts out Disabled and
// discards everything; register() swaps the dispatch to Live exactly once
// and from then on log() feeds the reporter's queue.  Embedders share the
// context via Arc.

enum Dispatch {
    Disabled,
    Live(channel::Sender<Point>),
}

pub struct Stats {
    dispatch: RwLock<Dispatch>,
}

impl Stats {
    pub fn new() -> Stats {
        Stats {
            dispatch: RwLock::new(Dispatch::Disabled),
        }
    }

    // Fire and forget.  Never blocks, never fails: points logged while the
    // context is disabled, while the queue is full, or after the scheduler
    // has stopped are silently discarded.
    pub fn log<V: Into<Value>>(&self, name: &str, value: V) {
        if let Ok(dispatch) = self.dispatch.read() {
            if let Dispatch::Live(ref queue) = *dispatch {
                reporter::offer(queue, Point::new(name, value.into()));
            }
        }
    }

    // Start reporting to an InfluxDB-style sink at `url`, database
    // `database`, pushing every `push_interval`.  Blocks the calling thread
    // for the lifetime of the flush loop, so it is meant to be run from a
    // spawned thread; dropping or signalling `cancel` stops the loop.
    //
    // An unreachable sink does not fail registration: the probe failure is
    // logged and every flush retries until the sink comes up.
    pub fn register(
        &self,
        cancel: channel::Receiver<()>,
        push_interval: Duration,
        url: &str,
        database: &str,
        username: &str,
        password: &str,
    ) {
        let sink = HttpSink::new(HttpConfig {
            url: url.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            curl_cmd: None,
            timeout_secs: DEFAULT_SINK_TIMEOUT_SECS,
        });
        if let Err(e) = sink.probe() {
            log::error!("Cannot reach the stats sink at {url}: {e}");
        }
        self.register_with_sink(cancel, push_interval, Box::new(sink), database);
    }

    // As register(), but with a caller-supplied sink.  This is the seam for
    // embedders with their own transport.
    pub fn register_with_sink(
        &self,
        cancel: channel::Receiver<()>,
        push_interval: Duration,
        sink: Box<dyn SinkClient>,
        database: &str,
    ) {
        let (sender, receiver) = channel::bounded(DEFAULT_QUEUE_SIZE);
        {
            let mut dispatch = match self.dispatch.write() {
                Ok(d) => d,
                Err(_) => {
                    return;
                }
            };
            if let Dispatch::Live(_) = *dispatch {
                log::error!("Stats reporter already registered");
                return;
            }
            *dispatch = Dispatch::Live(sender);
        }
        let reporter = Reporter::new(sink, database, receiver);
        scheduler::run(reporter, push_interval, cancel);
        // The reporter and its queue receiver are gone now; log() keeps
        // accepting calls but try_send fails disconnected and the points are
        // discarded, same as before registration.
    }
}
