//! In-memory relay for actor tests.

use futures::channel::mpsc;
use futures::future::{self, LocalBoxFuture};
use futures::{FutureExt, SinkExt, StreamExt};
use std::cell::RefCell;
use std::rc::Rc;

use super::transport::{Connection, Connector, InboundFrame, OutboundFrame};
use crate::error::TransportError;

struct Peer {
    to_client: Option<mpsc::UnboundedSender<Result<InboundFrame, TransportError>>>,
    from_client: mpsc::UnboundedReceiver<OutboundFrame>,
}

#[derive(Default)]
struct Inner {
    attempts: usize,
    refuse: bool,
    peers: Vec<Peer>,
}

/// Each accepted connection becomes a peer the test can push frames into
/// and read frames from. Helpers act on the latest connection.
#[derive(Clone, Default)]
pub struct MockConnector {
    inner: Rc<RefCell<Inner>>,
}

impl MockConnector {
    pub fn refusing() -> Self {
        let connector = Self::default();
        connector.set_refuse(true);
        connector
    }

    pub fn set_refuse(&self, refuse: bool) {
        self.inner.borrow_mut().refuse = refuse;
    }

    pub fn attempts(&self) -> usize {
        self.inner.borrow().attempts
    }

    pub fn push(&self, frame: Result<InboundFrame, TransportError>) {
        let inner = self.inner.borrow();
        let peer = inner.peers.last().expect("no connection yet");
        peer.to_client
            .as_ref()
            .expect("connection already hung up")
            .unbounded_send(frame)
            .expect("client dropped the connection");
    }

    pub fn push_text(&self, text: &str) {
        self.push(Ok(InboundFrame::Text(text.to_string())));
    }

    /// Server side hangs up.
    pub fn hang_up(&self) {
        let mut inner = self.inner.borrow_mut();
        if let Some(peer) = inner.peers.last_mut() {
            peer.to_client = None;
        }
    }

    /// Frames written by the client since the last call.
    pub fn received(&self) -> Vec<OutboundFrame> {
        let mut inner = self.inner.borrow_mut();
        let mut frames = Vec::new();
        if let Some(peer) = inner.peers.last_mut() {
            while let Ok(Some(frame)) = peer.from_client.try_next() {
                frames.push(frame);
            }
        }
        frames
    }
}

impl Connector for MockConnector {
    fn connect(&self, _url: &str) -> LocalBoxFuture<'static, Result<Connection, TransportError>> {
        let mut inner = self.inner.borrow_mut();
        inner.attempts += 1;
        if inner.refuse {
            return future::ready(Err(TransportError::Connect("refused".to_string()))).boxed_local();
        }

        let (to_client, inbound) = mpsc::unbounded();
        let (outbound, from_client) = mpsc::unbounded();
        inner.peers.push(Peer {
            to_client: Some(to_client),
            from_client,
        });
        let sink = outbound.sink_map_err(|e| TransportError::Send(e.to_string()));
        future::ready(Ok(Connection {
            sink: Box::pin(sink),
            stream: inbound.boxed_local(),
        }))
        .boxed_local()
    }
}
