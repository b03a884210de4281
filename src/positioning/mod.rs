//! Device positioning seam.
//!
//! A [`PositionSource`] stands in for the device location API: it can open a
//! continuous [`PositionWatch`] or answer a single one-shot request. Errors
//! are reported as [`LocationError`] so the acquisition loop never deals with
//! raw device codes.

pub mod channel;
pub mod scripted;

use std::fmt;
use std::pin::Pin;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::stream::{Stream, StreamExt};

use crate::error::LocationError;
use crate::models::location::Coordinate;

pub use channel::{ChannelPositionSource, PositionFeed};
pub use scripted::ScriptedPositionSource;

pub type PositionEvent = Result<Coordinate, LocationError>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest cached fix the device may hand back. Zero forces a fresh fix.
    pub maximum_age: Duration,
}

pub trait PositionSource: Send + Sync {
    fn watch(&self, options: PositionOptions) -> PositionWatch;

    fn current(&self, options: PositionOptions) -> BoxFuture<'_, PositionEvent>;
}

type CancelHook = Box<dyn FnOnce() + Send>;

/// A live position subscription.
///
/// Cancelling runs the source's hook exactly once. Dropping an uncancelled
/// watch cancels it too, so an abandoned acquisition never leaks a device
/// subscription.
pub struct PositionWatch {
    events: Pin<Box<dyn Stream<Item = PositionEvent> + Send>>,
    on_cancel: Option<CancelHook>,
}

impl PositionWatch {
    pub fn new<S>(events: S) -> Self
    where
        S: Stream<Item = PositionEvent> + Send + 'static,
    {
        Self {
            events: Box::pin(events),
            on_cancel: None,
        }
    }

    pub fn on_cancel<F>(mut self, hook: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_cancel = Some(Box::new(hook));
        self
    }

    pub async fn next(&mut self) -> Option<PositionEvent> {
        self.events.next().await
    }

    pub fn cancel(mut self) {
        self.run_cancel_hook();
    }

    fn run_cancel_hook(&mut self) {
        if let Some(hook) = self.on_cancel.take() {
            hook();
        }
    }
}

impl Drop for PositionWatch {
    fn drop(&mut self) {
        self.run_cancel_hook();
    }
}

impl fmt::Debug for PositionWatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PositionWatch")
            .field("cancellable", &self.on_cancel.is_some())
            .finish_non_exhaustive()
    }
}
