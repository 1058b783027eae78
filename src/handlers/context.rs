//! Who is calling: actor, client IP and request id for audit logs.

use crate::{
    errors::AppError,
    services::path_sanitizer::{base_name, is_malicious},
};
use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, request::Parts},
};
use std::{
    convert::Infallible,
    net::{IpAddr, SocketAddr},
};
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientContext {
    /// Authenticated user as forwarded by the auth proxy (`x-user-id`).
    pub actor: Option<String>,
    /// Socket peer address; `unknown` when the server runs without connect info.
    pub ip: String,
    /// Client-supplied `x-forwarded-for` chain (or `x-real-ip`), unverified.
    pub forwarded_for: Option<String>,
    pub request_id: String,
}

impl ClientContext {
    pub fn from_headers(headers: &HeaderMap, socket: Option<SocketAddr>) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
        };

        Self {
            actor: header("x-user-id").map(str::to_string),
            ip: socket
                .map(|addr| addr.ip().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            forwarded_for: header("x-forwarded-for")
                .or_else(|| header("x-real-ip"))
                .map(str::to_string),
            request_id: header("x-request-id")
                .map(str::to_string)
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
        }
    }

    /// Address requests are attributed to. The forwarded chain is only believed
    /// when the socket peer is one of `trusted_proxies`.
    pub fn client_ip(&self, trusted_proxies: &[IpAddr]) -> String {
        let peer_is_trusted = self
            .ip
            .parse::<IpAddr>()
            .is_ok_and(|peer| trusted_proxies.contains(&peer));
        if peer_is_trusted {
            let first_hop = self
                .forwarded_for
                .as_deref()
                .and_then(|chain| chain.split(',').next())
                .map(str::trim)
                .filter(|hop| !hop.is_empty());
            if let Some(hop) = first_hop {
                return hop.to_string();
            }
        }
        self.ip.clone()
    }

    /// Reject and audit-log a path that looks like a traversal or injection attempt.
    pub fn reject_malicious(&self, field: &str, value: &str) -> Result<(), AppError> {
        if !is_malicious(value) {
            return Ok(());
        }
        Err(self.audit_rejection(field, value))
    }

    /// Upload file names only become the stem of a generated key, so dots are
    /// fine; backslash paths and NUL bytes are not.
    pub fn reject_unsafe_file_name(&self, value: &str) -> Result<(), AppError> {
        let name = base_name(value);
        if !name.trim().is_empty() && !name.contains(['\\', '\0']) {
            return Ok(());
        }
        Err(self.audit_rejection("file_name", value))
    }

    fn audit_rejection(&self, field: &str, value: &str) -> AppError {
        warn!(
            field,
            original_path = value,
            actor = self.actor.as_deref().unwrap_or("anonymous"),
            ip = %self.ip,
            forwarded_for = self.forwarded_for.as_deref().unwrap_or("-"),
            request_id = %self.request_id,
            "malicious path rejected"
        );
        AppError::validation(format!("Invalid {} provided.", field.replace('_', " ")))
    }
}

impl<S> FromRequestParts<S> for ClientContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let socket = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Ok(Self::from_headers(&parts.headers, socket))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn forwarded(chain: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(chain));
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        headers.insert("x-user-id", HeaderValue::from_static("42"));
        headers.insert("x-request-id", HeaderValue::from_static("req-1"));
        headers
    }

    #[test]
    fn ip_is_the_socket_peer_even_with_forwarded_headers() {
        let ctx = ClientContext::from_headers(
            &forwarded("203.0.113.9, 10.0.0.1"),
            Some("198.51.100.4:9000".parse().unwrap()),
        );
        assert_eq!(ctx.ip, "198.51.100.4");
        assert_eq!(ctx.forwarded_for.as_deref(), Some("203.0.113.9, 10.0.0.1"));
        assert_eq!(ctx.actor.as_deref(), Some("42"));
        assert_eq!(ctx.request_id, "req-1");
        assert_eq!(ctx.client_ip(&[]), "198.51.100.4");
    }

    #[test]
    fn forwarded_chain_is_trusted_only_from_known_proxies() {
        let proxy: IpAddr = "10.0.0.1".parse().unwrap();
        let behind_proxy = ClientContext::from_headers(
            &forwarded("203.0.113.9, 10.0.0.1"),
            Some("10.0.0.1:443".parse().unwrap()),
        );
        assert_eq!(behind_proxy.client_ip(&[proxy]), "203.0.113.9");

        let direct = ClientContext::from_headers(
            &forwarded("203.0.113.9"),
            Some("198.51.100.4:443".parse().unwrap()),
        );
        assert_eq!(direct.client_ip(&[proxy]), "198.51.100.4");
    }

    #[test]
    fn falls_back_to_socket_and_generated_id() {
        let ctx = ClientContext::from_headers(&HeaderMap::new(), Some("192.0.2.7:5000".parse().unwrap()));
        assert_eq!(ctx.ip, "192.0.2.7");
        assert_eq!(ctx.forwarded_for, None);
        assert_eq!(ctx.actor, None);
        assert!(Uuid::parse_str(&ctx.request_id).is_ok());
    }

    #[test]
    fn rejects_malicious_paths() {
        let ctx = ClientContext::from_headers(&HeaderMap::new(), None);
        assert!(ctx.reject_malicious("file_path", "docs/a.txt").is_ok());
        let err = ctx.reject_malicious("file_path", "../../etc/passwd").unwrap_err();
        assert_eq!(err.error_type, "validation");
        assert_eq!(err.message, "Invalid file path provided.");
    }

    #[test]
    fn file_names_may_contain_dots_but_not_backslashes() {
        let ctx = ClientContext::from_headers(&HeaderMap::new(), None);
        assert!(ctx.reject_unsafe_file_name("report..final.pdf").is_ok());
        assert!(ctx.reject_unsafe_file_name("scans/report.pdf").is_ok());
        let err = ctx.reject_unsafe_file_name("C:\\fakepath\\x.pdf").unwrap_err();
        assert_eq!(err.message, "Invalid file name provided.");
        assert!(ctx.reject_unsafe_file_name("a\0.pdf").is_err());
        assert!(ctx.reject_unsafe_file_name("").is_err());
    }
}
