use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::{HeaderMap, request::Parts};

use crate::location_resolver::is_private;

/// Best guess of the caller's address.
///
/// `X-Forwarded-For` / `X-Real-IP` are only honored when the socket peer is a
/// loopback or private address (a reverse proxy on the same host or network).
/// Public peers are taken at face value so they cannot choose the address
/// that gets looked up. `None` when no address is available.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClientIp(pub Option<IpAddr>);

impl<S: Send + Sync> FromRequestParts<S> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_canonical());

        let trusted_proxy = peer.is_none_or(|ip| ip.is_loopback() || is_private(&ip));
        if !trusted_proxy {
            return Ok(ClientIp(peer));
        }

        Ok(ClientIp(forwarded_ip(&parts.headers).or(peer)))
    }
}

fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let forwarded_for = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .and_then(|first| first.trim().parse().ok());

    forwarded_for.or_else(|| {
        headers
            .get("x-real-ip")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse().ok())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> ClientIp {
        let (mut parts, _) = request.into_parts();
        ClientIp::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn test_prefers_first_forwarded_for_entry() {
        let mut request = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .header("x-real-ip", "198.51.100.1")
            .body(())
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));

        let ClientIp(ip) = extract(request).await;
        assert_eq!(ip, Some("203.0.113.7".parse().unwrap()));
    }

    #[tokio::test]
    async fn test_falls_back_to_real_ip_then_socket() {
        let request = Request::builder()
            .header("x-real-ip", "198.51.100.1")
            .body(())
            .unwrap();
        assert_eq!(extract(request).await.0, Some("198.51.100.1".parse().unwrap()));

        let mut request = Request::builder()
            .header("x-forwarded-for", "not-an-ip")
            .body(())
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 4], 4000))));
        assert_eq!(extract(request).await.0, Some("192.0.2.4".parse().unwrap()));
    }

    #[tokio::test]
    async fn test_public_peer_cannot_spoof_headers() {
        let mut request = Request::builder()
            .header("x-forwarded-for", "10.0.0.5")
            .header("x-real-ip", "8.8.8.8")
            .body(())
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([203, 0, 113, 50], 4000))));

        let ClientIp(ip) = extract(request).await;
        assert_eq!(ip, Some("203.0.113.50".parse().unwrap()));
    }

    #[tokio::test]
    async fn test_private_proxy_peer_is_trusted() {
        let mut request = Request::builder()
            .header("x-real-ip", "198.51.100.1")
            .body(())
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([10, 0, 0, 2], 4000))));

        assert_eq!(extract(request).await.0, Some("198.51.100.1".parse().unwrap()));
    }

    #[tokio::test]
    async fn test_none_without_any_source() {
        let request = Request::builder().body(()).unwrap();
        assert_eq!(extract(request).await, ClientIp(None));
    }
}
