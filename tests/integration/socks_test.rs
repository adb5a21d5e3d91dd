// tests/integration/socks_test.rs

use super::test_helpers::{
    LOGIN, PASSWORD, TestGateway, socks5_connect, socks5_login, spawn_echo_server, test_config,
    wait_until,
};
use pupok::core::ConnectionState;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

#[tokio::test]
async fn test_connect_and_relay_through_gateway() {
    let echo = spawn_echo_server().await;
    let gateway = TestGateway::start(test_config(None)).await;

    let mut client = TcpStream::connect(gateway.addr).await.unwrap();
    let key = client.local_addr().unwrap().to_string();

    assert_eq!(socks5_login(&mut client, LOGIN, PASSWORD).await, 0x00);
    assert_eq!(socks5_connect(&mut client, echo).await, 0x00);
    assert_eq!(gateway.state.registry.snapshot(), vec![key.clone()]);

    client.write_all(b"hello through socks").await.unwrap();
    let mut buf = [0u8; 19];
    client.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf, b"hello through socks");

    drop(client);
    assert!(
        wait_until(Duration::from_secs(2), || {
            gateway.state.registry.state_of(&key) == Some(ConnectionState::Closed)
        })
        .await
    );
    assert_eq!(gateway.state.stats.get_failed_sessions(), 0);

    gateway.stop().await;
}

#[tokio::test]
async fn test_bad_credentials_are_rejected_and_unregistered() {
    let gateway = TestGateway::start(test_config(None)).await;

    let mut client = TcpStream::connect(gateway.addr).await.unwrap();
    let key = client.local_addr().unwrap().to_string();

    assert_eq!(socks5_login(&mut client, LOGIN, "wrong").await, 0x01);

    // The gateway hangs up after a failed login.
    let mut buf = [0u8; 1];
    let read = tokio::time::timeout(Duration::from_secs(2), client.read(&mut buf))
        .await
        .unwrap();
    assert!(matches!(read, Ok(0) | Err(_)));

    assert!(
        wait_until(Duration::from_secs(2), || {
            gateway.state.registry.state_of(&key) == Some(ConnectionState::Closed)
                && gateway.state.stats.get_failed_sessions() == 1
        })
        .await
    );

    gateway.stop().await;
}

#[tokio::test]
async fn test_multiple_clients_are_tracked_independently() {
    let echo = spawn_echo_server().await;
    let gateway = TestGateway::start(test_config(None)).await;

    let mut first = TcpStream::connect(gateway.addr).await.unwrap();
    let mut second = TcpStream::connect(gateway.addr).await.unwrap();
    let first_key = first.local_addr().unwrap().to_string();
    let second_key = second.local_addr().unwrap().to_string();

    for client in [&mut first, &mut second] {
        assert_eq!(socks5_login(client, LOGIN, PASSWORD).await, 0x00);
        assert_eq!(socks5_connect(client, echo).await, 0x00);
    }
    assert_eq!(gateway.state.registry.active_count(), 2);

    drop(first);
    assert!(
        wait_until(Duration::from_secs(2), || {
            gateway.state.registry.state_of(&first_key) == Some(ConnectionState::Closed)
        })
        .await
    );
    assert_eq!(gateway.state.registry.snapshot(), vec![second_key]);

    gateway.state.registry.reclaim();
    assert_eq!(gateway.state.registry.len(), 1);

    drop(second);
    gateway.stop().await;
}
