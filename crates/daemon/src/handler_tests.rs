use std::time::Duration;

use tokio::io::duplex;

use tracker_core::WorkerId;
use tracker_wire::FramingError;

use super::*;

#[tokio::test]
async fn version_mismatch_is_a_framing_fault() {
    let (client, server) = duplex(64);
    let job = Arc::new(Job::new(1, Duration::from_secs(5)));
    let handle = tokio::spawn(handle_connection(server, job, WorkerId::new(0)));

    let mut client = FramedStream::new(client);
    client.write_version(99).await.unwrap();
    client.flush().await.unwrap();

    let result = handle.await.unwrap();
    assert!(matches!(
        result,
        Err(DaemonConnError::Framing(FramingError::VersionMismatch { got: 99, expected: 1 }))
    ));
}

#[tokio::test]
async fn unknown_command_is_a_protocol_fault() {
    let (client, server) = duplex(4096);
    let job = Arc::new(Job::new(1, Duration::from_secs(5)));
    let handle = tokio::spawn(handle_connection(server, job, WorkerId::new(0)));

    let mut client = FramedStream::new(client);
    client.write_version(PROTOCOL_VERSION).await.unwrap();
    client.send_string("bogus").await.unwrap();
    client.flush().await.unwrap();

    let result = handle.await.unwrap();
    match result {
        Err(DaemonConnError::Protocol(ProtocolFault::UnknownCommand(verb))) => {
            assert_eq!(verb, "bogus")
        }
        other => panic!("expected UnknownCommand, got {other:?}"),
    }
}

#[tokio::test]
async fn register_before_start_is_a_protocol_fault() {
    let (client, server) = duplex(4096);
    let job = Arc::new(Job::new(1, Duration::from_secs(5)));
    let handle = tokio::spawn(handle_connection(server, job, WorkerId::new(0)));

    let mut client = FramedStream::new(client);
    client.write_version(PROTOCOL_VERSION).await.unwrap();
    client.send_string("register").await.unwrap();
    client.send_string("g").await.unwrap();
    client.flush().await.unwrap();

    let result = handle.await.unwrap();
    assert!(matches!(result, Err(DaemonConnError::Protocol(ProtocolFault::NotStarted))));
}

#[tokio::test]
async fn checkpoint_before_start_is_a_protocol_fault() {
    let (client, server) = duplex(4096);
    let job = Arc::new(Job::new(1, Duration::from_secs(5)));
    let handle = tokio::spawn(handle_connection(server, job, WorkerId::new(0)));

    let mut client = FramedStream::new(client);
    client.write_version(PROTOCOL_VERSION).await.unwrap();
    client.send_string("checkpoint").await.unwrap();
    client.send_bytes(&[1, 2, 3]).await.unwrap();
    client.flush().await.unwrap();

    let result = handle.await.unwrap();
    assert!(matches!(result, Err(DaemonConnError::Protocol(ProtocolFault::NotStarted))));
}

#[tokio::test]
async fn shutdown_ends_the_loop_cleanly() {
    let (client, server) = duplex(4096);
    let job = Arc::new(Job::new(1, Duration::from_secs(5)));
    let handle = tokio::spawn(handle_connection(server, job, WorkerId::new(0)));

    let mut client = FramedStream::new(client);
    client.write_version(PROTOCOL_VERSION).await.unwrap();
    client.send_string("shutdown").await.unwrap();
    client.flush().await.unwrap();

    let result = handle.await.unwrap();
    assert!(result.is_ok());
}
