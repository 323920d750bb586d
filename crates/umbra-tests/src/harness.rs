//! Test harness for integration tests.
//!
//! Provides a scriptable one-shot SOCKS5 server and builders for the
//! dialer under test.

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use umbra_netaddr::Endpoint;
use umbra_network::{Dialer, NetContext, NoSession, ProxyRegistry, Resolver};

/// What the fake proxy answers once the request arrives.
#[derive(Clone, Copy, Debug)]
pub enum ProxyScript {
    /// Accept the request, reporting an IPv4 bound address.
    Accept,
    /// Refuse every authentication method.
    NoAcceptableMethod,
    /// Answer the request with the given SOCKS5 reply code.
    Reject(u8),
    /// Close the stream right after the greeting.
    Hangup,
}

/// One-shot SOCKS5 server for exercising the dialer.
pub struct FakeSocksServer {
    /// Where the server listens; feed this to the proxy registry.
    pub endpoint: Endpoint,
    handle: JoinHandle<Option<(String, u16)>>,
}

impl FakeSocksServer {
    /// Binds a local listener and serves exactly one connection.
    pub async fn spawn(script: ProxyScript) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("local addr").port();
        let endpoint = format!("127.0.0.1:{port}").parse().expect("endpoint");
        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.ok()?;
            serve(stream, script).await
        });
        Self { endpoint, handle }
    }

    /// Waits for the server and returns the target the client asked
    /// for, when the handshake got that far.
    pub async fn requested_target(self) -> Option<(String, u16)> {
        self.handle.await.expect("server task")
    }
}

async fn serve(mut stream: TcpStream, script: ProxyScript) -> Option<(String, u16)> {
    let mut greeting = [0u8; 3];
    stream.read_exact(&mut greeting).await.ok()?;
    assert_eq!(greeting, [5, 1, 0]);

    match script {
        ProxyScript::NoAcceptableMethod => {
            stream.write_all(&[5, 0xFF]).await.ok()?;
            return None;
        }
        ProxyScript::Hangup => return None,
        _ => stream.write_all(&[5, 0]).await.ok()?,
    }

    let mut head = [0u8; 5];
    stream.read_exact(&mut head).await.ok()?;
    assert_eq!(&head[..4], &[5, 1, 0, 3]);
    let len = head[4] as usize;
    let mut rest = vec![0u8; len + 2];
    stream.read_exact(&mut rest).await.ok()?;
    let host = String::from_utf8(rest[..len].to_vec()).ok()?;
    let port = u16::from_be_bytes([rest[len], rest[len + 1]]);

    let code = match script {
        ProxyScript::Accept => 0,
        ProxyScript::Reject(code) => code,
        _ => return None,
    };
    // the client may close before consuming the whole reply
    let _ = stream
        .write_all(&[5, code, 0, 1, 0, 0, 0, 0, 0, 0])
        .await;
    Some((host, port))
}

/// Dialer wired with the given registry and no overlay session.
pub fn dialer_with(registry: Arc<ProxyRegistry>) -> Dialer {
    init_tracing();
    Dialer::new(
        NetContext::default(),
        registry,
        Arc::new(NoSession),
        Resolver::without_overlay(),
    )
}

/// Installs a test subscriber honoring `RUST_LOG`. Safe to call from
/// every test; only the first call wins.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
