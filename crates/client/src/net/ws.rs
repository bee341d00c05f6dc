use futures_util::{SinkExt, StreamExt};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use winit::event_loop::EventLoopProxy;

use super::TransportError;
use super::connection::{Attempt, Connector, Link, TransportEvent, TransportEventKind};

/// Delivers transport events to whoever drives the session.
pub trait EventSink: Clone + Send + 'static {
    fn emit(&self, event: TransportEvent);
}

impl EventSink for EventLoopProxy<TransportEvent> {
    fn emit(&self, event: TransportEvent) {
        if self.send_event(event).is_err() {
            log::debug!("Event loop closed, dropping transport event");
        }
    }
}

impl EventSink for mpsc::UnboundedSender<TransportEvent> {
    fn emit(&self, event: TransportEvent) {
        let _ = self.send(event);
    }
}

enum Outbound {
    Text(String),
    Close,
}

/// WebSocket connector; every attempt runs as its own task on `runtime`.
pub struct WsConnector<S: EventSink> {
    runtime: Handle,
    sink: S,
}

impl<S: EventSink> WsConnector<S> {
    pub fn new(runtime: Handle, sink: S) -> Self {
        Self { runtime, sink }
    }
}

impl<S: EventSink> Connector for WsConnector<S> {
    type Link = WsLink;

    fn open(&mut self, endpoint: &str, attempt: Attempt) -> WsLink {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let task = self.runtime.spawn(run_connection(
            endpoint.to_owned(),
            attempt,
            outbound_rx,
            self.sink.clone(),
        ));

        WsLink {
            outbound: outbound_tx,
            task,
        }
    }
}

pub struct WsLink {
    outbound: mpsc::UnboundedSender<Outbound>,
    task: JoinHandle<()>,
}

impl Link for WsLink {
    fn send(&mut self, text: String) -> Result<(), TransportError> {
        self.outbound
            .send(Outbound::Text(text))
            .map_err(|_| TransportError::Closed)
    }

    fn close(&mut self) {
        if self.outbound.send(Outbound::Close).is_err() {
            self.task.abort();
        }
    }
}

impl Drop for WsLink {
    fn drop(&mut self) {
        let _ = self.outbound.send(Outbound::Close);
    }
}

async fn run_connection<S: EventSink>(
    endpoint: String,
    attempt: Attempt,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    sink: S,
) {
    let emit = move |kind: TransportEventKind| sink.emit(TransportEvent::new(attempt, kind));

    let stream = match connect_async(endpoint.as_str()).await {
        Ok((stream, _response)) => stream,
        Err(e) => {
            emit(TransportEventKind::Error(TransportError::from(e).to_string()));
            emit(TransportEventKind::Closed);
            return;
        }
    };
    emit(TransportEventKind::Opened);

    let (mut write, mut read) = stream.split();

    loop {
        tokio::select! {
            outgoing = outbound.recv() => match outgoing {
                Some(Outbound::Text(text)) => {
                    if let Err(e) = write.send(Message::Text(text.into())).await {
                        emit(TransportEventKind::Error(TransportError::from(e).to_string()));
                        break;
                    }
                }
                Some(Outbound::Close) | None => {
                    let _ = write.close().await;
                    break;
                }
            },
            incoming = read.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    emit(TransportEventKind::Text(text.as_str().to_owned()));
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    emit(TransportEventKind::Error(TransportError::from(e).to_string()));
                    break;
                }
            },
        }
    }

    emit(TransportEventKind::Closed);
}
