//! End-to-end tests over real TCP sockets.
//!
//! Spins the listener up on an ephemeral port and speaks the wire protocol
//! exactly as a client binary would, one frame per write.

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_test::assert_ok;
use wordduel_core::{decode_message, encode_message, Message};
use wordduel_server::application::engine::{Engine, EngineConfig};
use wordduel_server::infrastructure::network;

async fn start_server() -> std::net::SocketAddr {
    let engine = Arc::new(Mutex::new(Engine::new(EngineConfig::default())));
    let listener = tokio_test::assert_ok!(network::bind("127.0.0.1:0").await);
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(network::serve(listener, engine));
    addr
}

async fn send(stream: &mut TcpStream, msg: &Message) {
    stream
        .write_all(&encode_message(msg))
        .await
        .expect("write frame");
}

async fn recv(stream: &mut TcpStream) -> Message {
    let mut buf = [0u8; 512];
    let n = stream.read(&mut buf).await.expect("read frame");
    assert!(n > 0, "connection closed while a frame was expected");
    decode_message(&buf[..n]).expect("decode frame")
}

#[tokio::test]
async fn test_handshake_over_a_real_socket() {
    let addr = start_server().await;
    let mut stream = TcpStream::connect(addr).await.expect("connect");

    send(&mut stream, &Message::Init).await;
    assert_eq!(recv(&mut stream).await, Message::Init);

    send(
        &mut stream,
        &Message::PasswordResponse("secret".to_string()),
    )
    .await;
    assert_eq!(recv(&mut stream).await, Message::AssignId(1));
}

#[tokio::test]
async fn test_wrong_password_gets_error_then_disconnect() {
    let addr = start_server().await;
    let mut stream = TcpStream::connect(addr).await.expect("connect");

    send(&mut stream, &Message::Init).await;
    assert_eq!(recv(&mut stream).await, Message::Init);

    send(&mut stream, &Message::PasswordResponse("nope".to_string())).await;
    assert_eq!(
        recv(&mut stream).await,
        Message::Error("Invalid password".to_string())
    );

    // The server closes the socket after the error frame.
    let mut buf = [0u8; 16];
    let n = stream.read(&mut buf).await.expect("read after error");
    assert_eq!(n, 0, "server must close the connection");
}

#[tokio::test]
async fn test_two_clients_see_each_other_in_the_opponents_list() {
    let addr = start_server().await;

    let mut first = TcpStream::connect(addr).await.expect("connect");
    send(&mut first, &Message::Init).await;
    let _ = recv(&mut first).await;
    send(&mut first, &Message::PasswordResponse("secret".to_string())).await;
    assert_eq!(recv(&mut first).await, Message::AssignId(1));

    let mut second = TcpStream::connect(addr).await.expect("connect");
    send(&mut second, &Message::Init).await;
    let _ = recv(&mut second).await;
    send(&mut second, &Message::PasswordResponse("secret".to_string())).await;
    assert_eq!(recv(&mut second).await, Message::AssignId(2));

    send(&mut second, &Message::RequestOpponents).await;
    assert_eq!(
        recv(&mut second).await,
        Message::OpponentsResponse(vec![1])
    );
}
