//! Which source URLs the service is willing to fetch
//!
//! The service downloads whatever `image_url` names, so without a policy it
//! is an open proxy into the network it runs in. Private, loopback and
//! link-local targets are refused unless explicitly allowed, both by literal
//! address and after DNS resolution. The fetcher enforces the same rule again
//! at connect time (see `resolve`).

use crate::error::FilterError;
use reqwest::Url;
use std::net::{IpAddr, Ipv6Addr};
use tokio::net::lookup_host;

#[derive(Debug, Clone, Default)]
pub struct UrlPolicy {
    allow_private: bool,
    /// Exact hosts or parent domains; `None` allows every public host
    allowlist: Option<Vec<String>>,
}

impl UrlPolicy {
    pub fn new(allow_private: bool, allowlist: Option<Vec<String>>) -> Self {
        let allowlist =
            allowlist.map(|hosts| hosts.into_iter().map(|h| h.to_lowercase()).collect());
        Self {
            allow_private,
            allowlist,
        }
    }

    /// Parse `raw` and check it against the policy
    pub async fn check(&self, raw: &str) -> Result<Url, FilterError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(FilterError::InvalidUrl("image_url is required".to_string()));
        }

        let url = Url::parse(raw).map_err(|e| FilterError::InvalidUrl(e.to_string()))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(FilterError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }

        let host = url
            .host_str()
            .ok_or_else(|| FilterError::InvalidUrl("URL must have a host".to_string()))?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_lowercase();

        if let Some(allowed) = &self.allowlist {
            let listed = allowed
                .iter()
                .any(|a| host == *a || host.ends_with(&format!(".{}", a)));
            if !listed {
                return Err(FilterError::UrlNotAllowed(format!(
                    "host '{}' is not in the allowlist",
                    host
                )));
            }
        }

        if self.allow_private {
            return Ok(url);
        }

        if let Ok(ip) = host.parse::<IpAddr>() {
            if is_private_ip(&ip) {
                return Err(FilterError::UrlNotAllowed(
                    "private or loopback addresses are not allowed".to_string(),
                ));
            }
            return Ok(url);
        }

        if host == "localhost" || host.ends_with(".localhost") || host.ends_with(".local") {
            return Err(FilterError::UrlNotAllowed(
                "internal hostnames are not allowed".to_string(),
            ));
        }

        let port = url.port_or_known_default().unwrap_or(80);
        match lookup_host((host.as_str(), port)).await {
            Ok(addrs) => {
                for addr in addrs {
                    if is_private_ip(&addr.ip()) {
                        return Err(FilterError::UrlNotAllowed(format!(
                            "host resolves to a private address: {}",
                            addr.ip()
                        )));
                    }
                }
            }
            Err(e) => {
                // The fetch itself will fail and report it
                tracing::warn!(host = %host, error = %e, "Failed to resolve source host");
            }
        }

        Ok(url)
    }
}

pub(crate) fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_multicast()
                || v4.is_unspecified()
                || v4.octets()[0] == 0
        }
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || v6.is_unspecified()
                || v6.is_multicast()
                || is_ipv6_link_local(v6)
                || is_ipv6_unique_local(v6)
                || v6.to_ipv4_mapped().map(|v4| is_private_ip(&IpAddr::V4(v4))).unwrap_or(false)
        }
    }
}

// fe80::/10
fn is_ipv6_link_local(ip: &Ipv6Addr) -> bool {
    ip.segments()[0] & 0xffc0 == 0xfe80
}

// fc00::/7
fn is_ipv6_unique_local(ip: &Ipv6Addr) -> bool {
    ip.segments()[0] & 0xfe00 == 0xfc00
}
