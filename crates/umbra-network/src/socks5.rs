//! SOCKS5 client handshake
//!
//! The subset of RFC 1928 the node needs for outbound connections: no
//! authentication, CONNECT only, and the target always sent as a
//! domain name so the proxy does the resolving. The caller supplies a
//! stream that is already connected to the proxy; every failure path
//! consumes and thereby closes it.

use std::fmt;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::error::{NetError, NetResult};

const SOCKS_VERSION: u8 = 0x05;
const METHOD_NO_AUTH: u8 = 0x00;
const CMD_CONNECT: u8 = 0x01;
const ATYP_IPV4: u8 = 0x01;
const ATYP_DOMAIN: u8 = 0x03;
const ATYP_IPV6: u8 = 0x04;

/// The length field for the target host is a single byte.
const MAX_TARGET_LEN: usize = 255;

/// Server reply code from the connect request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Socks5Reply {
    GeneralFailure,
    NotAllowed,
    NetworkUnreachable,
    HostUnreachable,
    ConnectionRefused,
    TtlExpired,
    ProtocolError,
    AddressTypeUnsupported,
    Unknown(u8),
}

impl Socks5Reply {
    pub fn from_code(code: u8) -> Self {
        match code {
            0x01 => Self::GeneralFailure,
            0x02 => Self::NotAllowed,
            0x03 => Self::NetworkUnreachable,
            0x04 => Self::HostUnreachable,
            0x05 => Self::ConnectionRefused,
            0x06 => Self::TtlExpired,
            0x07 => Self::ProtocolError,
            0x08 => Self::AddressTypeUnsupported,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for Socks5Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::GeneralFailure => "general failure",
            Self::NotAllowed => "connection not allowed",
            Self::NetworkUnreachable => "network unreachable",
            Self::HostUnreachable => "host unreachable",
            Self::ConnectionRefused => "connection refused",
            Self::TtlExpired => "TTL expired",
            Self::ProtocolError => "protocol error",
            Self::AddressTypeUnsupported => "address type not supported",
            Self::Unknown(_) => "unknown",
        };
        f.write_str(text)
    }
}

/// Drives the SOCKS5 handshake on `stream`, asking the proxy to
/// connect to `host:port`. Returns the stream ready for payload
/// traffic.
pub async fn socks5_handshake<S>(mut stream: S, host: &str, port: u16) -> NetResult<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    if host.len() > MAX_TARGET_LEN {
        return Err(NetError::InvalidAddress(format!("hostname too long: {host}")));
    }
    debug!(host, port, "SOCKS5 connecting");

    stream
        .write_all(&[SOCKS_VERSION, 1, METHOD_NO_AUTH])
        .await?;

    let mut method = [0u8; 2];
    stream.read_exact(&mut method).await?;
    if method != [SOCKS_VERSION, METHOD_NO_AUTH] {
        return Err(NetError::ProxyProtocol("proxy failed to initialize"));
    }

    let mut request = Vec::with_capacity(7 + host.len());
    request.extend_from_slice(&[
        SOCKS_VERSION,
        CMD_CONNECT,
        0x00,
        ATYP_DOMAIN,
        host.len() as u8,
    ]);
    request.extend_from_slice(host.as_bytes());
    request.extend_from_slice(&port.to_be_bytes());
    stream.write_all(&request).await?;

    let mut header = [0u8; 4];
    stream.read_exact(&mut header).await?;
    if header[0] != SOCKS_VERSION {
        return Err(NetError::ProxyProtocol("proxy failed to accept request"));
    }
    if header[1] != 0x00 {
        let reply = Socks5Reply::from_code(header[1]);
        debug!(host, code = header[1], %reply, "SOCKS5 connect rejected");
        return Err(NetError::ProxyRejected(reply));
    }
    if header[2] != 0x00 {
        return Err(NetError::ProxyProtocol("malformed proxy response"));
    }

    // the bound address is reported but carries no information we use
    match header[3] {
        ATYP_IPV4 => {
            let mut bound = [0u8; 4];
            stream.read_exact(&mut bound).await?;
        }
        ATYP_IPV6 => {
            let mut bound = [0u8; 16];
            stream.read_exact(&mut bound).await?;
        }
        ATYP_DOMAIN => {
            let mut len = [0u8; 1];
            stream.read_exact(&mut len).await?;
            let mut name = vec![0u8; len[0] as usize];
            stream.read_exact(&mut name).await?;
        }
        _ => return Err(NetError::ProxyProtocol("malformed proxy response")),
    }
    let mut bound_port = [0u8; 2];
    stream.read_exact(&mut bound_port).await?;

    debug!(host, "SOCKS5 connected");
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn scripted_server(
        mut server: tokio::io::DuplexStream,
        reply: &'static [u8],
    ) -> tokio::io::DuplexStream {
        let mut greeting = [0u8; 3];
        server.read_exact(&mut greeting).await.unwrap();
        assert_eq!(greeting, [5, 1, 0]);
        server.write_all(&[5, 0]).await.unwrap();

        let mut head = [0u8; 5];
        server.read_exact(&mut head).await.unwrap();
        assert_eq!(&head[..4], &[5, 1, 0, 3]);
        let mut rest = vec![0u8; head[4] as usize + 2];
        server.read_exact(&mut rest).await.unwrap();

        server.write_all(reply).await.unwrap();
        server
    }

    #[test]
    fn test_reply_code_mapping() {
        assert_eq!(Socks5Reply::from_code(1), Socks5Reply::GeneralFailure);
        assert_eq!(Socks5Reply::from_code(5), Socks5Reply::ConnectionRefused);
        assert_eq!(Socks5Reply::from_code(8), Socks5Reply::AddressTypeUnsupported);
        assert_eq!(Socks5Reply::from_code(0x42), Socks5Reply::Unknown(0x42));

        assert_eq!(Socks5Reply::ConnectionRefused.to_string(), "connection refused");
        assert_eq!(Socks5Reply::TtlExpired.to_string(), "TTL expired");
        assert_eq!(Socks5Reply::Unknown(0x42).to_string(), "unknown");
    }

    #[tokio::test]
    async fn test_handshake_happy_path() {
        let (client, server) = tokio::io::duplex(1024);
        let server_task = tokio::spawn(async move {
            let mut server = server;
            let mut greeting = [0u8; 3];
            server.read_exact(&mut greeting).await.unwrap();
            assert_eq!(greeting, [5, 1, 0]);
            server.write_all(&[5, 0]).await.unwrap();

            let mut head = [0u8; 5];
            server.read_exact(&mut head).await.unwrap();
            assert_eq!(head, [5, 1, 0, 3, 11]);
            let mut rest = [0u8; 13];
            server.read_exact(&mut rest).await.unwrap();
            assert_eq!(&rest[..11], b"example.com");
            // port 8443
            assert_eq!(&rest[11..], &[0x20, 0xFB]);

            server
                .write_all(&[5, 0, 0, 1, 127, 0, 0, 1, 0x1F, 0x90])
                .await
                .unwrap();
            server
        });

        socks5_handshake(client, "example.com", 8443).await.unwrap();
        server_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_handshake_accepts_domain_bound_address() {
        let (client, server) = tokio::io::duplex(1024);
        let reply: &[u8] = &[5, 0, 0, 3, 4, b'n', b'o', b'd', b'e', 0, 80];
        let server_task = tokio::spawn(scripted_server(server, reply));

        socks5_handshake(client, "example.com", 80).await.unwrap();
        server_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_handshake_maps_rejection_codes() {
        let (client, server) = tokio::io::duplex(1024);
        let reply: &[u8] = &[5, 5, 0, 1, 0, 0, 0, 0, 0, 0];
        let server_task = tokio::spawn(scripted_server(server, reply));

        let err = socks5_handshake(client, "example.com", 80).await.unwrap_err();
        assert!(matches!(
            err,
            NetError::ProxyRejected(Socks5Reply::ConnectionRefused)
        ));
        server_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_handshake_rejects_nonzero_reserved() {
        let (client, server) = tokio::io::duplex(1024);
        let reply: &[u8] = &[5, 0, 7, 1, 0, 0, 0, 0, 0, 0];
        let server_task = tokio::spawn(scripted_server(server, reply));

        let err = socks5_handshake(client, "example.com", 80).await.unwrap_err();
        assert!(matches!(
            err,
            NetError::ProxyProtocol("malformed proxy response")
        ));
        server_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_handshake_rejects_unknown_bound_type() {
        let (client, server) = tokio::io::duplex(1024);
        let reply: &[u8] = &[5, 0, 0, 9];
        let server_task = tokio::spawn(scripted_server(server, reply));

        let err = socks5_handshake(client, "example.com", 80).await.unwrap_err();
        assert!(matches!(
            err,
            NetError::ProxyProtocol("malformed proxy response")
        ));
        server_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_handshake_rejects_bad_greeting() {
        let (client, mut server) = tokio::io::duplex(1024);
        let server_task = tokio::spawn(async move {
            let mut greeting = [0u8; 3];
            server.read_exact(&mut greeting).await.unwrap();
            server.write_all(&[5, 0xFF]).await.unwrap();
            server
        });

        let err = socks5_handshake(client, "example.com", 80).await.unwrap_err();
        assert!(matches!(
            err,
            NetError::ProxyProtocol("proxy failed to initialize")
        ));
        server_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_handshake_rejects_wrong_reply_version() {
        let (client, server) = tokio::io::duplex(1024);
        let reply: &[u8] = &[4, 0, 0, 1, 0, 0, 0, 0, 0, 0];
        let server_task = tokio::spawn(scripted_server(server, reply));

        let err = socks5_handshake(client, "example.com", 80).await.unwrap_err();
        assert!(matches!(
            err,
            NetError::ProxyProtocol("proxy failed to accept request")
        ));
        server_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_overlong_hostname_fails_before_io() {
        let (client, _server) = tokio::io::duplex(16);
        let host = "a".repeat(256);
        let err = socks5_handshake(client, &host, 80).await.unwrap_err();
        assert!(matches!(err, NetError::InvalidAddress(_)));
    }
}
