//! Client identification for anonymous form traffic.
//!
//! # Responsibilities
//! - Derive a stable rate-limit key from headers and connection info
//!
//! # Design Decisions
//! - First X-Forwarded-For entry wins, then X-Real-IP, then the peer address
//! - Forwarded headers are only honoured when configured as trusted
//! - Never fails: the sentinel "unknown" is the last resort

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Extensions, HeaderMap, Request},
};
use std::fmt;
use std::net::SocketAddr;

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
pub const X_REAL_IP: &str = "x-real-ip";
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Key identifying a caller for rate limiting and logs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientKey(String);

impl ClientKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Resolve the key from request headers and connection info.
    pub fn from_parts(headers: &HeaderMap, extensions: &Extensions, trust_forwarded: bool) -> Self {
        if trust_forwarded {
            if let Some(ip) = header_str(headers, X_FORWARDED_FOR)
                .and_then(|v| v.split(',').map(str::trim).find(|s| !s.is_empty()))
            {
                return Self(ip.to_string());
            }
            if let Some(ip) = header_str(headers, X_REAL_IP).map(str::trim).filter(|s| !s.is_empty()) {
                return Self(ip.to_string());
            }
        }

        if let Some(ConnectInfo(addr)) = extensions.get::<ConnectInfo<SocketAddr>>() {
            return Self(addr.ip().to_string());
        }

        Self(UNKNOWN_CLIENT.to_string())
    }

    /// Resolve the key for a full request, reusing one already attached by middleware.
    pub fn from_request(request: &Request<Body>, trust_forwarded: bool) -> Self {
        if let Some(key) = request.extensions().get::<ClientKey>() {
            return key.clone();
        }
        Self::from_parts(request.headers(), request.extensions(), trust_forwarded)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    fn with_peer(addr: &str) -> Extensions {
        let mut ext = Extensions::new();
        ext.insert(ConnectInfo(addr.parse::<SocketAddr>().unwrap()));
        ext
    }

    #[test]
    fn test_first_forwarded_address_wins() {
        let h = headers(&[(X_FORWARDED_FOR, " 203.0.113.7 , 10.0.0.1"), (X_REAL_IP, "10.0.0.2")]);
        let key = ClientKey::from_parts(&h, &with_peer("127.0.0.1:5000"), true);
        assert_eq!(key.as_str(), "203.0.113.7");
    }

    #[test]
    fn test_real_ip_then_peer_fallback() {
        let h = headers(&[(X_REAL_IP, "198.51.100.4")]);
        assert_eq!(ClientKey::from_parts(&h, &Extensions::new(), true).as_str(), "198.51.100.4");

        let h = headers(&[(X_FORWARDED_FOR, " , ")]);
        let key = ClientKey::from_parts(&h, &with_peer("192.0.2.9:443"), true);
        assert_eq!(key.as_str(), "192.0.2.9");
    }

    #[test]
    fn test_untrusted_forwarded_headers_are_ignored() {
        let h = headers(&[(X_FORWARDED_FOR, "203.0.113.7")]);
        let key = ClientKey::from_parts(&h, &with_peer("192.0.2.9:443"), false);
        assert_eq!(key.as_str(), "192.0.2.9");
    }

    #[test]
    fn test_unknown_sentinel() {
        let key = ClientKey::from_parts(&HeaderMap::new(), &Extensions::new(), true);
        assert_eq!(key.as_str(), UNKNOWN_CLIENT);
    }
}
