use std::sync::Arc;
use actix::prelude::*;
use actix_http::ws::Item;
use actix_web_actors::ws;
use async_trait::async_trait;
use futures::channel::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::ChannelError;
use super::channel::{Channel, ChannelId};
use super::driver::ConnectionDriver;
use super::registry::ConnectionRegistry;

type InboundSender = mpsc::UnboundedSender<Result<String, ChannelError>>;

/// Reassembly state for a message split over continuation frames.
#[derive(Debug, Default)]
enum Fragments {
    #[default]
    Idle,
    Text(Vec<u8>),
    /// Binary payloads are not relayed, so their bytes are not kept.
    Binary,
}

impl Fragments {
    /// Returns the whole text once its final fragment arrives.
    fn push(&mut self, item: Item) -> Result<Option<String>, ChannelError> {
        match (std::mem::take(self), item) {
            (Fragments::Idle, Item::FirstText(bytes)) => {
                *self = Fragments::Text(bytes.to_vec());
                Ok(None)
            }
            (Fragments::Idle, Item::FirstBinary(_)) => {
                *self = Fragments::Binary;
                Ok(None)
            }
            (Fragments::Text(mut buf), Item::Continue(bytes)) => {
                buf.extend_from_slice(&bytes);
                *self = Fragments::Text(buf);
                Ok(None)
            }
            (Fragments::Text(mut buf), Item::Last(bytes)) => {
                buf.extend_from_slice(&bytes);
                String::from_utf8(buf)
                    .map(Some)
                    .map_err(|e| ChannelError::Protocol(format!("invalid UTF-8 in text message: {}", e)))
            }
            (Fragments::Binary, Item::Continue(_)) => {
                *self = Fragments::Binary;
                Ok(None)
            }
            (Fragments::Binary, Item::Last(_)) => Ok(None),
            (Fragments::Idle, _) => Err(ChannelError::Protocol(
                "continuation frame without a message start".to_string(),
            )),
            (_, _) => Err(ChannelError::Protocol(
                "new message started before the previous one finished".to_string(),
            )),
        }
    }
}

/// Text frame to write to the session's socket.
#[derive(Message)]
#[rtype(result = "()")]
pub struct OutboundText(pub String);

/// [`Channel`] backed by a running [`WebSocketSession`].
pub struct WsChannel {
    id: ChannelId,
    recipient: Recipient<OutboundText>,
}

impl WsChannel {
    pub fn new(id: ChannelId, recipient: Recipient<OutboundText>) -> Self {
        Self { id, recipient }
    }
}

#[async_trait]
impl Channel for WsChannel {
    fn id(&self) -> ChannelId {
        self.id
    }

    async fn send_text(&self, text: &str) -> Result<(), ChannelError> {
        self.recipient
            .send(OutboundText(text.to_owned()))
            .await
            .map_err(|e| match e {
                MailboxError::Closed => ChannelError::Closed,
                MailboxError::Timeout => ChannelError::Send(e.to_string()),
            })
    }
}

/// WebSocket session actor. Feeds inbound text frames to a
/// [`ConnectionDriver`] and writes [`OutboundText`] messages to the socket.
pub struct WebSocketSession {
    id: ChannelId,
    peer_addr: String,
    registry: Arc<ConnectionRegistry>,
    inbound: Option<InboundSender>,
    fragments: Fragments,
}

impl WebSocketSession {
    pub fn new(registry: Arc<ConnectionRegistry>, peer_addr: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            peer_addr,
            registry,
            inbound: None,
            fragments: Fragments::Idle,
        }
    }

    fn forward(&self, item: Result<String, ChannelError>) {
        if let Some(inbound) = &self.inbound {
            if inbound.unbounded_send(item).is_err() {
                warn!("Driver for connection {} is gone, dropping inbound message", self.id);
            }
        }
    }
}

impl Actor for WebSocketSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!("WebSocket connection established with {} (id: {})", self.peer_addr, self.id);

        let (tx, rx) = mpsc::unbounded();
        self.inbound = Some(tx);

        let channel = Arc::new(WsChannel::new(self.id, ctx.address().recipient()));
        let driver = ConnectionDriver::new(self.registry.clone(), channel);
        actix_rt::spawn(driver.run(rx));
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        // Ends the driver's inbound stream.
        self.inbound.take();
        info!("WebSocket connection closed with {} (id: {})", self.peer_addr, self.id);
    }
}

impl Handler<OutboundText> for WebSocketSession {
    type Result = ();

    fn handle(&mut self, msg: OutboundText, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

impl StreamHandler<std::result::Result<ws::Message, ws::ProtocolError>> for WebSocketSession {
    fn handle(&mut self, msg: std::result::Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {}
            Ok(ws::Message::Text(text)) => {
                self.forward(Ok(text.to_string()));
            }
            Ok(ws::Message::Binary(bin)) => {
                warn!("Ignoring binary message from {} of {} bytes", self.peer_addr, bin.len());
            }
            Ok(ws::Message::Close(reason)) => {
                info!("WebSocket closed from {}: {:?}", self.peer_addr, reason);
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(item)) => {
                if let Item::FirstBinary(_) = item {
                    warn!("Ignoring fragmented binary message from {}", self.peer_addr);
                }
                match self.fragments.push(item) {
                    Ok(Some(text)) => self.forward(Ok(text)),
                    Ok(None) => {}
                    Err(e) => {
                        error!("Bad fragmented message from {}: {}", self.peer_addr, e);
                        self.forward(Err(e));
                        ctx.stop();
                    }
                }
            }
            Ok(ws::Message::Nop) => {}
            Err(e) => {
                error!("Error handling WebSocket message from {}: {}", self.peer_addr, e);
                self.forward(Err(ChannelError::Protocol(e.to_string())));
                ctx.stop();
            }
        }
    }
}
