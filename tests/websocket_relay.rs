use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use actix_web::dev::ServerHandle;
use actix_web::{web, App, HttpServer};
use anyhow::{anyhow, Result};
use chat_relay_server::websocket::{ConnectionRegistry, DEPARTURE_ANNOUNCEMENT};
use chat_relay_server::{web::configure, AppState, Settings};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::protocol::frame::coding::{Data, OpCode};
use tokio_tungstenite::tungstenite::protocol::frame::Frame;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const POLL_INTERVAL: Duration = Duration::from_millis(20);
const RECV_TIMEOUT: Duration = Duration::from_secs(2);

struct TestServer {
    addr: SocketAddr,
    registry: Arc<ConnectionRegistry>,
    handle: ServerHandle,
}

impl TestServer {
    fn start() -> Result<Self> {
        let state = web::Data::new(AppState::new(Settings::new_for_test()?));
        let registry = state.registry.clone();

        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;

        let server = HttpServer::new(move || {
            App::new()
                .app_data(state.clone())
                .configure(configure)
        })
        .listen(listener)?
        .workers(1)
        .run();

        let handle = server.handle();
        actix_rt::spawn(server);

        Ok(Self { addr, registry, handle })
    }

    async fn connect(&self) -> Result<Client> {
        let (client, _) = connect_async(format!("ws://{}/ws", self.addr)).await?;
        Ok(client)
    }

    async fn wait_for_connections(&self, expected: usize) -> Result<()> {
        timeout(RECV_TIMEOUT, async {
            while self.registry.connection_count().await != expected {
                sleep(POLL_INTERVAL).await;
            }
        })
        .await
        .map_err(|_| anyhow!("registry never reached {} connections", expected))
    }

    /// Clients may still be connected, so skip the graceful drain.
    async fn stop(self) {
        self.handle.stop(false).await;
    }
}

async fn recv_text(client: &mut Client) -> Result<String> {
    loop {
        let frame = timeout(RECV_TIMEOUT, client.next())
            .await?
            .ok_or_else(|| anyhow!("connection closed"))??;
        if let Message::Text(text) = frame {
            return Ok(text);
        }
    }
}

#[actix_web::test]
async fn test_message_reaches_all_clients() -> Result<()> {
    let server = TestServer::start()?;
    let mut alice = server.connect().await?;
    let mut bob = server.connect().await?;
    server.wait_for_connections(2).await?;

    alice.send(Message::Text("hello everyone".into())).await?;

    assert_eq!(recv_text(&mut alice).await?, "hello everyone");
    assert_eq!(recv_text(&mut bob).await?, "hello everyone");

    server.stop().await;
    Ok(())
}

#[actix_web::test]
async fn test_empty_message_is_broadcast() -> Result<()> {
    let server = TestServer::start()?;
    let mut alice = server.connect().await?;
    server.wait_for_connections(1).await?;

    alice.send(Message::Text(String::new())).await?;
    assert_eq!(recv_text(&mut alice).await?, "");

    server.stop().await;
    Ok(())
}

#[actix_web::test]
async fn test_departure_is_announced() -> Result<()> {
    let server = TestServer::start()?;
    let mut alice = server.connect().await?;
    let mut bob = server.connect().await?;
    server.wait_for_connections(2).await?;

    bob.close(None).await?;

    assert_eq!(recv_text(&mut alice).await?, DEPARTURE_ANNOUNCEMENT);
    server.wait_for_connections(1).await?;

    server.stop().await;
    Ok(())
}

#[actix_web::test]
async fn test_fragmented_text_is_relayed_as_one_message() -> Result<()> {
    let server = TestServer::start()?;
    let mut alice = server.connect().await?;
    let mut bob = server.connect().await?;
    server.wait_for_connections(2).await?;

    alice
        .send(Message::Frame(Frame::message(b"hel".to_vec(), OpCode::Data(Data::Text), false)))
        .await?;
    alice
        .send(Message::Frame(Frame::message(b"lo".to_vec(), OpCode::Data(Data::Continue), false)))
        .await?;
    alice
        .send(Message::Frame(Frame::message(b" there".to_vec(), OpCode::Data(Data::Continue), true)))
        .await?;

    assert_eq!(recv_text(&mut bob).await?, "hello there");
    assert_eq!(recv_text(&mut alice).await?, "hello there");

    server.stop().await;
    Ok(())
}
