//! Resource fetchers: the seam between the dashboard engine and transports.
//!
//! The engine only knows [`ResourceFetcher`]. The two adapters shipped here
//! ([`command::CommandFetcher`] and [`probe::TcpProbeFetcher`]) are ordinary
//! implementations of it; closures work too.

pub mod command;
pub mod errors;
pub mod probe;

use std::future::Future;
use std::time::Duration;

use futures::future::BoxFuture;
use serde_json::Value;

use crate::config::{AdapterKind, DashboardConfig};

pub use errors::FetchError;

pub type FetchFuture<T = Value> = BoxFuture<'static, Result<T, FetchError>>;

/// Asynchronous `resource key → value` function owned by the scheduler.
pub trait ResourceFetcher<T = Value>: Send + Sync + 'static {
    fn fetch(&self, key: &str) -> FetchFuture<T>;
}

impl<T, F, Fut> ResourceFetcher<T> for F
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
{
    fn fetch(&self, key: &str) -> FetchFuture<T> {
        Box::pin(self(key.to_string()))
    }
}

/// Timeout class of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceClass {
    /// Network probes and HTTP-style calls.
    Http,
    /// Commands that usually hop through ssh/ssm to a remote host.
    RemoteShell,
}

impl ResourceClass {
    pub fn for_adapter(adapter: AdapterKind) -> Self {
        match adapter {
            AdapterKind::Tcp => ResourceClass::Http,
            AdapterKind::Command => ResourceClass::RemoteShell,
        }
    }

    pub fn default_timeout(&self, config: &DashboardConfig) -> Duration {
        match self {
            ResourceClass::Http => config.http_timeout(),
            ResourceClass::RemoteShell => config.shell_timeout(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceClass::Http => "http",
            ResourceClass::RemoteShell => "remote_shell",
        }
    }
}
