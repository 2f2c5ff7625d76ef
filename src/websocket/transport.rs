use awc::ws;
use futures::future::{self, LocalBoxFuture};
use futures::stream::LocalBoxStream;
use futures::{FutureExt, Sink, SinkExt, StreamExt};
use log::debug;
use std::pin::Pin;

use crate::error::TransportError;

/// Frames the client reads off the socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    Text(String),
    Ping(Vec<u8>),
    Close,
}

/// Frames the client writes to the socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    Text(String),
    Pong(Vec<u8>),
    Close,
}

pub type FrameSink = Pin<Box<dyn Sink<OutboundFrame, Error = TransportError>>>;
pub type FrameStream = LocalBoxStream<'static, Result<InboundFrame, TransportError>>;

/// An open socket, split into its two halves. The stream ending means the
/// peer went away.
pub struct Connection {
    pub sink: FrameSink,
    pub stream: FrameStream,
}

/// Opens connections to the relay.
pub trait Connector {
    fn connect(&self, url: &str) -> LocalBoxFuture<'static, Result<Connection, TransportError>>;
}

/// WebSocket connector on top of the actix client.
#[derive(Debug, Clone, Copy, Default)]
pub struct AwcConnector;

impl Connector for AwcConnector {
    fn connect(&self, url: &str) -> LocalBoxFuture<'static, Result<Connection, TransportError>> {
        let request = awc::Client::new().ws(url);

        async move {
            let (response, framed) = request
                .connect()
                .await
                .map_err(|e| TransportError::Connect(e.to_string()))?;
            debug!("Handshake answered with {}", response.status());

            let (sink, stream) = framed.split::<ws::Message>();
            let sink = sink
                .sink_map_err(|e| TransportError::Send(e.to_string()))
                .with(|frame: OutboundFrame| future::ready(Ok::<_, TransportError>(to_message(frame))));
            let stream = stream.filter_map(|frame| {
                future::ready(match frame {
                    Ok(frame) => from_frame(frame),
                    Err(e) => Some(Err(TransportError::Receive(e.to_string()))),
                })
            });

            Ok(Connection {
                sink: Box::pin(sink),
                stream: stream.boxed_local(),
            })
        }
        .boxed_local()
    }
}

fn to_message(frame: OutboundFrame) -> ws::Message {
    match frame {
        OutboundFrame::Text(text) => ws::Message::Text(text.into()),
        OutboundFrame::Pong(data) => ws::Message::Pong(data.into()),
        OutboundFrame::Close => ws::Message::Close(None),
    }
}

fn from_frame(frame: ws::Frame) -> Option<Result<InboundFrame, TransportError>> {
    match frame {
        ws::Frame::Text(bytes) => Some(
            String::from_utf8(bytes.to_vec())
                .map(InboundFrame::Text)
                .map_err(|e| TransportError::Receive(e.to_string())),
        ),
        ws::Frame::Ping(bytes) => Some(Ok(InboundFrame::Ping(bytes.to_vec()))),
        ws::Frame::Close(reason) => {
            debug!("Server closed the socket: {:?}", reason);
            Some(Ok(InboundFrame::Close))
        }
        // Binary and continuation frames are not part of the protocol
        _ => None,
    }
}
