//! Reachability capability used by the `active_url` rule.

use std::collections::HashSet;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::lookup::LookupError;
use crate::config::ValidatorConfig;

/// Injected host resolution check.
#[async_trait]
pub trait UrlProbe: Send + Sync {
    /// Whether `host` resolves to at least one address.
    async fn resolves(&self, host: &str) -> Result<bool, LookupError>;
}

/// Single name resolution attempt, without timeout or retry.
#[async_trait]
pub trait HostResolver: Send + Sync {
    /// `Ok(false)` when the name definitively does not exist; `Err` when
    /// the resolver could not answer.
    async fn lookup(&self, host: &str) -> io::Result<bool>;
}

/// Resolver backed by the system's `getaddrinfo` via `tokio::net::lookup_host`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[async_trait]
impl HostResolver for SystemResolver {
    async fn lookup(&self, host: &str) -> io::Result<bool> {
        match tokio::net::lookup_host((host, 80)).await {
            Ok(mut addrs) => Ok(addrs.next().is_some()),
            Err(err) if is_missing_host(&err) => Ok(false),
            Err(err) => Err(err),
        }
    }
}

/// `getaddrinfo` reasons meaning the name has no addresses, as worded by
/// glibc, musl and the BSDs. Anything else (`EAI_AGAIN`, `EAI_FAIL`, I/O)
/// is treated as a resolver failure.
const MISSING_HOST_REASONS: &[&str] = &[
    "Name or service not known",
    "No address associated with hostname",
    "nodename nor servname provided, or not known",
    "Name does not resolve",
    "No such host is known",
];

/// Windows `WSAHOST_NOT_FOUND`.
const WSAHOST_NOT_FOUND: i32 = 11001;

fn is_missing_host(err: &io::Error) -> bool {
    if cfg!(windows) && err.raw_os_error() == Some(WSAHOST_NOT_FOUND) {
        return true;
    }
    let message = err.to_string();
    MISSING_HOST_REASONS
        .iter()
        .any(|reason| message.contains(reason))
}

/// DNS-backed probe with a per-attempt timeout and a bounded retry count.
///
/// A missing name is an answer, not a failure: it returns `Ok(false)` at
/// once. Timeouts and resolver errors are retried, and the last one is
/// returned when every attempt fails.
#[derive(Clone)]
pub struct DnsProbe {
    resolver: Arc<dyn HostResolver>,
    timeout: Duration,
    attempts: u32,
}

impl std::fmt::Debug for DnsProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DnsProbe")
            .field("timeout", &self.timeout)
            .field("attempts", &self.attempts)
            .finish_non_exhaustive()
    }
}

impl DnsProbe {
    pub fn new(timeout: Duration, attempts: u32) -> Self {
        Self::with_resolver(Arc::new(SystemResolver), timeout, attempts)
    }

    pub fn with_resolver(resolver: Arc<dyn HostResolver>, timeout: Duration, attempts: u32) -> Self {
        Self {
            resolver,
            timeout,
            attempts: attempts.max(1),
        }
    }

    pub fn from_config(config: &ValidatorConfig) -> Self {
        Self::new(config.probe_timeout, config.probe_attempts)
    }
}

#[async_trait]
impl UrlProbe for DnsProbe {
    async fn resolves(&self, host: &str) -> Result<bool, LookupError> {
        let mut last_error = LookupError::Unavailable("DNS resolver");

        for attempt in 1..=self.attempts {
            let started = Instant::now();
            match tokio::time::timeout(self.timeout, self.resolver.lookup(host)).await {
                Ok(Ok(found)) => {
                    tracing::debug!(host, attempt, found, "DNS lookup answered");
                    return Ok(found);
                }
                Ok(Err(err)) => {
                    tracing::debug!(host, attempt, error = %err, "DNS lookup failed");
                    last_error = LookupError::Backend(err.to_string());
                }
                Err(_) => {
                    let elapsed_ms = started.elapsed().as_millis() as u64;
                    tracing::debug!(host, attempt, elapsed_ms, "DNS lookup timed out");
                    last_error = LookupError::Timeout { elapsed_ms };
                }
            }
        }

        Err(last_error)
    }
}

/// Probe answering from a fixed host list. Useful offline and in tests.
#[derive(Debug, Clone, Default)]
pub struct KnownHosts {
    hosts: HashSet<String>,
}

impl KnownHosts {
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            hosts: hosts
                .into_iter()
                .map(|h| h.into().to_ascii_lowercase())
                .collect(),
        }
    }
}

#[async_trait]
impl UrlProbe for KnownHosts {
    async fn resolves(&self, host: &str) -> Result<bool, LookupError> {
        Ok(self.hosts.contains(&host.to_ascii_lowercase()))
    }
}
