//! Push-channel transport capability and its HTTP implementation.
//!
//! A [`PushTransport`] opens [`Subscription`]s; a subscription yields
//! [`TransportSignal`]s until it is closed. The stream manager only depends on
//! these traits, so tests drive it with a scripted transport.
//!
//! [`HttpEventSource`] follows browser `EventSource` semantics: network errors
//! are reported as recoverable and followed by an automatic reconnect that
//! resumes with `Last-Event-ID`; an HTTP error status or a non-event-stream
//! response closes the subscription for good.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::sse::SseDecoder;

/// Lifecycle signal delivered by a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportSignal {
    /// The connection is open.
    Open,
    /// A message arrived on the named channel.
    Message { event: String, data: String },
    /// The connection failed. `closed` means the transport gave up; otherwise
    /// it is reconnecting on its own.
    Error { closed: bool },
}

/// Factory for push subscriptions.
pub trait PushTransport: Send + Sync {
    /// Start subscribing to `url`. Connection happens lazily while signals are
    /// pulled.
    fn open(&self, url: &str) -> Box<dyn Subscription>;
}

/// A live push subscription.
#[async_trait]
pub trait Subscription: Send {
    /// Wait for the next signal. `None` once the subscription is closed.
    ///
    /// Must be cancel-safe: dropping the future loses no signal.
    async fn next_signal(&mut self) -> Option<TransportSignal>;

    /// Close the subscription and release the connection. Idempotent.
    fn close(&mut self);
}

/// Server-sent events over a streaming HTTP GET.
#[derive(Debug, Clone)]
pub struct HttpEventSource {
    client: reqwest::Client,
    reconnect_delay: Duration,
}

impl HttpEventSource {
    /// Create a transport. The client must not carry a total request timeout,
    /// since event streams stay open indefinitely.
    pub fn new(client: reqwest::Client, reconnect_delay: Duration) -> Self {
        Self {
            client,
            reconnect_delay,
        }
    }
}

impl PushTransport for HttpEventSource {
    fn open(&self, url: &str) -> Box<dyn Subscription> {
        info!(url = %url, "Opening event stream");
        Box::new(HttpSubscription {
            client: self.client.clone(),
            url: url.to_string(),
            retry: self.reconnect_delay,
            last_event_id: None,
            state: ConnState::Connecting { not_before: None },
            decoder: SseDecoder::new(),
            pending: VecDeque::new(),
        })
    }
}

type ByteStream = BoxStream<'static, reqwest::Result<Vec<u8>>>;

enum ConnState {
    /// Waiting to (re)connect, optionally not before the given instant.
    Connecting { not_before: Option<Instant> },
    Streaming(ByteStream),
    Closed,
}

enum ConnectError {
    /// Network-level failure; try again later.
    Retry(reqwest::Error),
    /// The server refused the stream; do not reconnect.
    Fatal(String),
}

struct HttpSubscription {
    client: reqwest::Client,
    url: String,
    retry: Duration,
    last_event_id: Option<String>,
    state: ConnState,
    decoder: SseDecoder,
    /// Decoded signals not yet handed out, oldest first.
    pending: VecDeque<TransportSignal>,
}

async fn connect(
    client: &reqwest::Client,
    url: &str,
    last_event_id: Option<&str>,
) -> Result<ByteStream, ConnectError> {
    let mut request = client
        .get(url)
        .header(ACCEPT, "text/event-stream")
        .header(CACHE_CONTROL, "no-cache");
    if let Some(id) = last_event_id {
        request = request.header("Last-Event-ID", id);
    }

    let response = request.send().await.map_err(ConnectError::Retry)?;

    let status = response.status();
    if !status.is_success() {
        return Err(ConnectError::Fatal(format!("HTTP {}", status.as_u16())));
    }

    let is_event_stream = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("text/event-stream"));
    if !is_event_stream {
        return Err(ConnectError::Fatal("unexpected content type".to_string()));
    }

    Ok(response
        .bytes_stream()
        .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
        .boxed())
}

impl HttpSubscription {
    fn schedule_reconnect(&mut self) {
        self.decoder = SseDecoder::new();
        self.state = ConnState::Connecting {
            not_before: Some(Instant::now() + self.retry),
        };
    }

    fn absorb(&mut self, chunk: &[u8]) {
        for frame in self.decoder.push(chunk) {
            if let Some(id) = &frame.id {
                self.last_event_id = Some(id.clone());
            }
            if let Some(ms) = frame.retry {
                self.retry = Duration::from_millis(ms);
            }
            if frame.has_data() {
                self.pending.push_back(TransportSignal::Message {
                    event: frame.event_name().to_string(),
                    data: frame.data,
                });
            }
        }
    }
}

#[async_trait]
impl Subscription for HttpSubscription {
    async fn next_signal(&mut self) -> Option<TransportSignal> {
        loop {
            if let Some(signal) = self.pending.pop_front() {
                return Some(signal);
            }

            match &mut self.state {
                ConnState::Closed => return None,
                ConnState::Connecting { not_before } => {
                    if let Some(at) = *not_before {
                        tokio::time::sleep_until(at).await;
                    }
                    match connect(&self.client, &self.url, self.last_event_id.as_deref()).await {
                        Ok(stream) => {
                            debug!(url = %self.url, "Event stream open");
                            self.state = ConnState::Streaming(stream);
                            return Some(TransportSignal::Open);
                        }
                        Err(ConnectError::Retry(e)) => {
                            warn!(url = %self.url, error = %e, retry_in = ?self.retry, "Event stream connect failed");
                            self.schedule_reconnect();
                            return Some(TransportSignal::Error { closed: false });
                        }
                        Err(ConnectError::Fatal(reason)) => {
                            warn!(url = %self.url, reason = %reason, "Event stream refused");
                            self.state = ConnState::Closed;
                            return Some(TransportSignal::Error { closed: true });
                        }
                    }
                }
                ConnState::Streaming(stream) => match stream.next().await {
                    Some(Ok(chunk)) => self.absorb(&chunk),
                    Some(Err(e)) => {
                        warn!(url = %self.url, error = %e, "Event stream interrupted");
                        self.schedule_reconnect();
                        return Some(TransportSignal::Error { closed: false });
                    }
                    None => {
                        debug!(url = %self.url, "Event stream ended by server");
                        self.schedule_reconnect();
                        return Some(TransportSignal::Error { closed: false });
                    }
                },
            }
        }
    }

    fn close(&mut self) {
        if !matches!(self.state, ConnState::Closed) {
            debug!(url = %self.url, "Closing event stream");
        }
        self.state = ConnState::Closed;
        self.pending.clear();
    }
}
