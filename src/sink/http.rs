// SinkClient for an InfluxDB v1 endpoint, writing line protocol to
// {url}/write over HTTP.
//
// For the time being, we farm the actual transfer out to curl: it handles
// TLS, redirects, and proxy settings from the environment, and it is present
// on every host this library is deployed to.  The body is fed to curl on
// stdin so no temporary files are involved.

use crate::batch::Batch;
use crate::sink::SinkClient;

use subprocess::{Exec, ExitStatus, Redirection};

pub struct HttpConfig {
    // Base address of the sink, e.g. "http://influx.example.com:8086".
    pub url: String,
    // Empty username means anonymous writes; the password is then unused.
    pub username: String,
    pub password: String,
    // Override for the curl binary, for hosts where it is not on PATH.
    pub curl_cmd: Option<String>,
    // Per-request ceiling handed to curl.  This is the sink's own timeout,
    // not the flush scheduler's: a request that hits it fails the write and
    // the batch is retried on the next cycle.
    pub timeout_secs: u64,
}

pub struct HttpSink {
    url: String,
    username: String,
    password: String,
    curl_cmd: String,
    timeout_secs: u64,
}

impl HttpSink {
    pub fn new(config: HttpConfig) -> HttpSink {
        HttpSink {
            url: config.url.trim_end_matches('/').to_string(),
            username: config.username,
            password: config.password,
            curl_cmd: config.curl_cmd.unwrap_or_else(|| "curl".to_string()),
            timeout_secs: config.timeout_secs,
        }
    }

    // Check that the sink is reachable.  Registration treats a failure here
    // as informational only: flush-time writes are retried at the push
    // cadence regardless, so an endpoint that is down now can come up later
    // without anyone having to re-register.
    pub fn probe(&self) -> Result<(), String> {
        self.run_curl(&[format!("{}/ping", self.url)], None)
    }

    fn run_curl(&self, extra_args: &[String], body: Option<&str>) -> Result<(), String> {
        let mut args = vec![
            "-sS".to_string(),
            "--fail".to_string(),
            "--max-time".to_string(),
            format!("{}", self.timeout_secs),
        ];
        if self.username != "" {
            args.push("-u".to_string());
            args.push(format!("{}:{}", self.username, self.password));
        }
        args.extend_from_slice(extra_args);

        let mut p = match Exec::cmd(&self.curl_cmd)
            .args(&args[..])
            .stdin(Redirection::Pipe)
            .stdout(Redirection::Pipe)
            .stderr(Redirection::Pipe)
            .popen()
        {
            Ok(p) => p,
            Err(e) => {
                return Err(format!("Could not start {}: {e}", self.curl_cmd));
            }
        };

        // communicate() feeds the body, closes stdin, and drains both output
        // pipes, so the child cannot wedge on a full pipe; --max-time bounds
        // how long the drain can take.
        let outputs = p.communicate(body);
        let status = p.wait();
        let stderr = match outputs {
            Ok((_, Some(e))) => e.trim().to_string(),
            _ => "".to_string(),
        };
        match status {
            Ok(ExitStatus::Exited(0)) => Ok(()),
            Ok(s) => Err(format!("curl failed with {s:?}: {stderr:.500}")),
            Err(e) => Err(format!("curl did not exit cleanly: {e}")),
        }
    }
}

impl SinkClient for HttpSink {
    fn write(&mut self, batch: &Batch) -> Result<(), String> {
        let write_url = format!(
            "{}/write?db={}&precision={}",
            self.url,
            batch.database(),
            batch.precision().wire_param(),
        );
        let args = vec![
            "--data-binary".to_string(),
            "@-".to_string(),
            "-H".to_string(),
            "Content-Type: text/plain; charset=utf-8".to_string(),
            write_url,
        ];
        self.run_curl(&args, Some(&batch.to_line_protocol()))
    }
}
