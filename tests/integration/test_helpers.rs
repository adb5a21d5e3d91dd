// tests/integration/test_helpers.rs

//! Test helpers and utilities for integration tests

use async_trait::async_trait;
use pupok::config::Config;
use pupok::core::socks::{SessionEngine, Socks5Engine, StaticCredentials};
use pupok::core::state::ServerState;
use pupok::server::{Acceptor, BoxedStream, serve_connections};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

pub const LOGIN: &str = "user";
pub const PASSWORD: &str = "pass";

/// Installs a quiet test subscriber once per binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("warn"))
        .with_test_writer()
        .try_init();
}

pub fn test_config(idle_timeout: Option<u64>) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 1080,
        login: LOGIN.to_string(),
        password: PASSWORD.to_string(),
        idle_timeout,
        ..Config::default()
    }
}

/// A running accept loop with its shared state and a way to stop it.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub state: Arc<ServerState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TestGateway {
    /// Starts the accept loop on an ephemeral port with the bundled SOCKS5 engine.
    pub async fn start(config: Config) -> Self {
        let engine = Arc::new(Socks5Engine::new(StaticCredentials::new(
            config.login.clone(),
            config.password.clone(),
        )));
        Self::start_with_engine(config, engine).await
    }

    pub async fn start_with_engine(config: Config, engine: Arc<dyn SessionEngine>) -> Self {
        init_tracing();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = ServerState::new(config);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(serve_connections(listener, state.clone(), engine, async move {
            shutdown_rx.await.ok();
        }));

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
            handle,
        }
    }

    /// Stops accepting, aborts in-flight sessions and waits for the loop to exit.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        tokio::time::timeout(Duration::from_secs(5), &mut self.handle)
            .await
            .expect("accept loop should stop")
            .unwrap();
    }
}

/// An acceptor fed by a channel, so tests can inject accept errors.
pub struct ScriptedAcceptor {
    rx: mpsc::UnboundedReceiver<io::Result<(BoxedStream, SocketAddr)>>,
}

impl ScriptedAcceptor {
    pub fn channel() -> (
        Self,
        mpsc::UnboundedSender<io::Result<(BoxedStream, SocketAddr)>>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { rx }, tx)
    }
}

#[async_trait]
impl Acceptor for ScriptedAcceptor {
    async fn accept(&mut self) -> io::Result<(BoxedStream, SocketAddr)> {
        match self.rx.recv().await {
            Some(next) => next,
            // Behave like an idle listener once the script runs out.
            None => std::future::pending().await,
        }
    }
}

/// Spawns a TCP server that echoes every byte back.
pub async fn spawn_echo_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let (mut reader, mut writer) = socket.split();
                let _ = tokio::io::copy(&mut reader, &mut writer).await;
            });
        }
    });
    addr
}

/// Performs the SOCKS5 greeting and username/password sub-negotiation.
/// Returns the auth status byte.
pub async fn socks5_login(stream: &mut TcpStream, login: &str, password: &str) -> u8 {
    stream.write_all(&[0x05, 0x01, 0x02]).await.unwrap();
    let mut selection = [0u8; 2];
    stream.read_exact(&mut selection).await.unwrap();
    assert_eq!(selection, [0x05, 0x02]);

    let mut auth = vec![0x01, login.len() as u8];
    auth.extend_from_slice(login.as_bytes());
    auth.push(password.len() as u8);
    auth.extend_from_slice(password.as_bytes());
    stream.write_all(&auth).await.unwrap();

    let mut status = [0u8; 2];
    stream.read_exact(&mut status).await.unwrap();
    status[1]
}

/// Sends a CONNECT for an IPv4 target and returns the reply code.
pub async fn socks5_connect(stream: &mut TcpStream, target: SocketAddr) -> u8 {
    let SocketAddr::V4(v4) = target else {
        panic!("tests only connect to IPv4 targets");
    };
    let mut request = vec![0x05, 0x01, 0x00, 0x01];
    request.extend_from_slice(&v4.ip().octets());
    request.extend_from_slice(&v4.port().to_be_bytes());
    stream.write_all(&request).await.unwrap();

    let mut reply = [0u8; 10];
    stream.read_exact(&mut reply).await.unwrap();
    reply[1]
}

/// Polls `condition` every 10ms until it holds or `timeout` passes.
pub async fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
