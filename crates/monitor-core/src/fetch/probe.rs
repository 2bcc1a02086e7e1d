//! TCP reachability probe adapter.
//!
//! Produces the service-health shape: one `{name, target, status,
//! latency_ms, detail}` object per target. An unreachable target is data,
//! not a fetch failure; only the scheduler's overall timeout fails a probe.

use std::time::Duration;

use futures::future::join_all;
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio::time::{Instant, timeout};

use crate::fetch::{FetchError, FetchFuture, ResourceFetcher};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    pub name: String,
    pub address: String,
}

impl ProbeTarget {
    /// Parse `name=host:port` or bare `host:port`.
    pub fn parse(spec: &str) -> Result<Self, FetchError> {
        let spec = spec.trim();
        let (name, address) = match spec.split_once('=') {
            Some((name, address)) => (name.trim(), address.trim()),
            None => (spec, spec),
        };

        let valid_port = address
            .rsplit_once(':')
            .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok());
        if name.is_empty() || !valid_port {
            return Err(FetchError::adapter(format!(
                "invalid probe target '{}', expected name=host:port",
                spec
            )));
        }

        Ok(Self {
            name: name.to_string(),
            address: address.to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct TcpProbeFetcher {
    targets: Vec<ProbeTarget>,
    connect_timeout: Duration,
}

impl TcpProbeFetcher {
    pub fn new(targets: Vec<ProbeTarget>, connect_timeout: Duration) -> Self {
        Self {
            targets,
            connect_timeout,
        }
    }

    pub fn targets(&self) -> &[ProbeTarget] {
        &self.targets
    }
}

async fn probe(target: ProbeTarget, connect_timeout: Duration) -> Value {
    let started = Instant::now();
    let (status, detail) = match timeout(connect_timeout, TcpStream::connect(&target.address)).await {
        Ok(Ok(_stream)) => ("healthy", None),
        Ok(Err(e)) => ("unreachable", Some(e.to_string())),
        Err(_) => ("timeout", Some(format!("no answer within {}ms", connect_timeout.as_millis()))),
    };

    json!({
        "name": target.name,
        "target": target.address,
        "status": status,
        "latency_ms": started.elapsed().as_millis() as u64,
        "detail": detail,
    })
}

impl ResourceFetcher for TcpProbeFetcher {
    fn fetch(&self, _key: &str) -> FetchFuture<Value> {
        let targets = self.targets.clone();
        let connect_timeout = self.connect_timeout;
        Box::pin(async move {
            let results = join_all(
                targets
                    .into_iter()
                    .map(|target| probe(target, connect_timeout)),
            )
            .await;
            Ok(Value::Array(results))
        })
    }
}
