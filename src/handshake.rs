//! # Handshake
//!
//! The server side of the opening handshake ([RFC 6455 Section 4.2](https://datatracker.ietf.org/doc/html/rfc6455#section-4.2)).
//!
//! ```http
//! GET /ws HTTP/1.1
//! Host: server.example.com
//! Upgrade: websocket
//! Connection: Upgrade
//! Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==
//! Sec-WebSocket-Version: 13
//! ```
//!
//! is answered with
//!
//! ```http
//! HTTP/1.1 101 Switching Protocols
//! Upgrade: websocket
//! Connection: Upgrade
//! Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=
//! ```
//!
//! The key is opaque and is not checked for being well-formed base64.
use base64::prelude::*;
use bytes::Bytes;
use http_body_util::Empty;
use hyper::{header, HeaderMap, Response, StatusCode};
use sha1::{Digest, Sha1};

use crate::{Result, WebSocketError};

/// Appended to the client key before hashing.
pub const MAGIC_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Type alias for HTTP responses used during WebSocket upgrade.
///
/// The body is always empty: once the response is sent the connection stops speaking HTTP.
pub type HttpResponse = Response<Empty<Bytes>>;

/// Derives the `Sec-WebSocket-Accept` value for a client's `Sec-WebSocket-Key`.
///
/// The result is the base64 encoding of the SHA-1 digest of `key` followed by [`MAGIC_GUID`],
/// so it is always 28 characters long. `key` is hashed as raw bytes whatever its length or
/// charset.
///
/// ```rust
/// use wsframe::derive_accept_token;
///
/// let accept = derive_accept_token("dGhlIHNhbXBsZSBub25jZQ==");
/// assert_eq!(accept, "s3pPLMBiTxaQ9kYGzzhZRbK+xOo=");
/// ```
pub fn derive_accept_token(key: impl AsRef<[u8]>) -> String {
    let mut sha1 = Sha1::new();
    sha1.update(key.as_ref());
    sha1.update(MAGIC_GUID.as_bytes());
    BASE64_STANDARD.encode(sha1.finalize())
}

/// Returns the raw bytes of the `Sec-WebSocket-Key` sent by the client.
///
/// # Errors
/// `MalformedHeader` if the header is absent.
pub fn sec_websocket_key(headers: &HeaderMap) -> Result<&[u8]> {
    headers
        .get(header::SEC_WEBSOCKET_KEY)
        .map(|value| value.as_bytes())
        .ok_or(WebSocketError::MalformedHeader("Sec-WebSocket-Key"))
}

/// Derives the accept token straight from the request headers.
pub fn accept_token_from_headers(headers: &HeaderMap) -> Result<String> {
    sec_websocket_key(headers).map(derive_accept_token)
}

/// Checks the headers that mark a request as a WebSocket upgrade.
///
/// # Errors
/// - `InvalidUpgradeHeader` unless `Upgrade` is `websocket` (any case).
/// - `InvalidConnectionHeader` unless `Connection` lists the `upgrade` token.
/// - `InvalidSecWebsocketVersion` unless `Sec-WebSocket-Version` is `13`.
pub fn validate_upgrade_request(headers: &HeaderMap) -> Result<()> {
    if !headers
        .get(header::UPGRADE)
        .and_then(|h| h.to_str().ok())
        .map(|h| h.trim().eq_ignore_ascii_case("websocket"))
        .unwrap_or(false)
    {
        return Err(WebSocketError::InvalidUpgradeHeader);
    }

    // browsers may send e.g. `keep-alive, Upgrade`
    if !headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(','))
        .any(|token| token.trim().eq_ignore_ascii_case("upgrade"))
    {
        return Err(WebSocketError::InvalidConnectionHeader);
    }

    if headers
        .get(header::SEC_WEBSOCKET_VERSION)
        .map(|v| v.as_bytes())
        != Some(b"13")
    {
        return Err(WebSocketError::InvalidSecWebsocketVersion);
    }

    Ok(())
}

/// Validates an upgrade request and builds its `101 Switching Protocols` response.
pub fn switching_protocols(headers: &HeaderMap) -> Result<HttpResponse> {
    validate_upgrade_request(headers)?;
    let accept = accept_token_from_headers(headers)?;

    #[cfg(feature = "logging")]
    log::debug!("Accepting websocket upgrade (accept={accept})");

    Ok(Response::builder()
        .status(StatusCode::SWITCHING_PROTOCOLS)
        .header(header::CONNECTION, "Upgrade")
        .header(header::UPGRADE, "websocket")
        .header(header::SEC_WEBSOCKET_ACCEPT, accept)
        .body(Empty::new())
        .expect("bug: failed to build response"))
}
