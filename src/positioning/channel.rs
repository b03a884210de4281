use std::sync::Mutex;

use futures::future::BoxFuture;
use futures::stream;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tracing::debug;

use crate::error::LocationError;
use crate::positioning::{PositionEvent, PositionOptions, PositionSource, PositionWatch};

/// A position source fed from outside the process, e.g. by a browser that
/// relays its geolocation samples over a socket.
///
/// The source is single-use: the first `watch` or `current` call takes the
/// receiving end. Later calls report `PositionUnavailable`.
pub struct ChannelPositionSource {
    receiver: Mutex<Option<mpsc::Receiver<PositionEvent>>>,
}

#[derive(Debug, Clone)]
pub struct PositionFeed {
    sender: mpsc::Sender<PositionEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedOutcome {
    Delivered,
    /// The buffer is full; the event was dropped.
    Dropped,
    /// Nobody listens anymore: the subscription was cancelled or finished.
    Closed,
}

impl ChannelPositionSource {
    pub fn new(buffer: usize) -> (Self, PositionFeed) {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        (
            Self {
                receiver: Mutex::new(Some(receiver)),
            },
            PositionFeed { sender },
        )
    }

    fn take_receiver(&self) -> Option<mpsc::Receiver<PositionEvent>> {
        self.receiver
            .lock()
            .map(|mut receiver| receiver.take())
            .unwrap_or(None)
    }
}

impl PositionSource for ChannelPositionSource {
    fn watch(&self, options: PositionOptions) -> PositionWatch {
        let Some(receiver) = self.take_receiver() else {
            return PositionWatch::new(stream::once(async {
                Err(LocationError::PositionUnavailable)
            }));
        };

        let events = ReceiverStream::new(receiver)
            .timeout(options.timeout)
            .map(|item| item.unwrap_or(Err(LocationError::Timeout)));

        PositionWatch::new(events).on_cancel(|| debug!("channel position watch cancelled"))
    }

    fn current(&self, options: PositionOptions) -> BoxFuture<'_, PositionEvent> {
        let receiver = self.take_receiver();
        Box::pin(async move {
            let mut receiver = receiver.ok_or(LocationError::PositionUnavailable)?;
            match tokio::time::timeout(options.timeout, receiver.recv()).await {
                Ok(Some(event)) => event,
                Ok(None) => Err(LocationError::PositionUnavailable),
                Err(_) => Err(LocationError::Timeout),
            }
        })
    }
}

impl PositionFeed {
    pub fn push(&self, event: PositionEvent) -> FeedOutcome {
        match self.sender.try_send(event) {
            Ok(()) => FeedOutcome::Delivered,
            Err(TrySendError::Full(_)) => FeedOutcome::Dropped,
            Err(TrySendError::Closed(_)) => FeedOutcome::Closed,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
