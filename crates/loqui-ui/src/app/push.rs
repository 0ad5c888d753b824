//! Push socket over the browser WebSocket.

use async_trait::async_trait;
use futures_util::{StreamExt, future};
use gloo_net::websocket::futures::WebSocket;
use gloo_net::websocket::{Message, WebSocketError};
use loqui_sync::push::PushError;
use loqui_sync::push::listener::{PushConnector, PushStream};

pub(crate) struct WsConnector {
    url: String,
}

impl WsConnector {
    pub(crate) const fn new(url: String) -> Self {
        Self { url }
    }
}

#[async_trait(?Send)]
impl PushConnector for WsConnector {
    async fn connect(&self) -> Result<PushStream, PushError> {
        let socket =
            WebSocket::open(&self.url).map_err(|err| PushError::Connect(err.to_string()))?;
        let frames = socket.filter_map(|message| {
            future::ready(match message {
                Ok(Message::Text(text)) => Some(Ok(text)),
                Ok(Message::Bytes(bytes)) => String::from_utf8(bytes).ok().map(Ok),
                Err(WebSocketError::ConnectionClose(event)) if event.was_clean => None,
                Err(err) => Some(Err(PushError::Socket(err.to_string()))),
            })
        });
        Ok(frames.boxed_local())
    }
}
