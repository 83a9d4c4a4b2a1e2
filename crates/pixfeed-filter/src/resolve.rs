//! Connect-time address filtering for source fetches
//!
//! `UrlPolicy::check` resolves the host once to reject obvious private
//! targets early, but the HTTP client resolves again when it connects. This
//! resolver is what the client actually connects through, so a host whose
//! answer changes between the two lookups is still refused.

use crate::url_policy::is_private_ip;
use async_trait::async_trait;
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

/// Name resolution behind `PublicOnlyResolver`
#[async_trait]
pub trait HostLookup: Send + Sync {
    async fn lookup(&self, host: &str) -> io::Result<Vec<SocketAddr>>;
}

/// The system resolver via `tokio::net::lookup_host`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLookup;

#[async_trait]
impl HostLookup for SystemLookup {
    async fn lookup(&self, host: &str) -> io::Result<Vec<SocketAddr>> {
        // The connector sets the real port on every address
        Ok(tokio::net::lookup_host((host, 0)).await?.collect())
    }
}

/// Host resolved to an address the service must not connect to
#[derive(Debug, thiserror::Error)]
#[error("host '{host}' resolves to a private address: {addr}")]
pub struct PrivateAddressRefused {
    pub host: String,
    pub addr: SocketAddr,
}

/// All of `addrs`, or an error if any of them is private
pub fn public_addrs(
    host: &str,
    addrs: Vec<SocketAddr>,
) -> Result<Vec<SocketAddr>, PrivateAddressRefused> {
    if let Some(addr) = addrs.iter().find(|addr| is_private_ip(&addr.ip())) {
        return Err(PrivateAddressRefused {
            host: host.to_string(),
            addr: *addr,
        });
    }
    Ok(addrs)
}

/// reqwest resolver that refuses hosts with any private address
#[derive(Clone)]
pub struct PublicOnlyResolver {
    lookup: Arc<dyn HostLookup>,
}

impl PublicOnlyResolver {
    pub fn new(lookup: Arc<dyn HostLookup>) -> Self {
        Self { lookup }
    }
}

impl Default for PublicOnlyResolver {
    fn default() -> Self {
        Self::new(Arc::new(SystemLookup))
    }
}

impl Resolve for PublicOnlyResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let lookup = self.lookup.clone();
        let host = name.as_str().to_string();
        Box::pin(async move {
            let addrs = lookup.lookup(&host).await?;
            let addrs = public_addrs(&host, addrs).map_err(|e| {
                tracing::warn!(host = %e.host, addr = %e.addr, "Refused private source address");
                e
            })?;
            let addrs: Addrs = Box::new(addrs.into_iter());
            Ok::<_, Box<dyn std::error::Error + Send + Sync>>(addrs)
        })
    }
}
