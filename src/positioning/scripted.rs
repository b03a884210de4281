use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};
use tokio::time::{sleep_until, Instant};

use crate::positioning::{PositionEvent, PositionOptions, PositionSource, PositionWatch};

/// Replays a fixed timeline of position events.
///
/// Each entry is an offset from the moment the subscription was opened.
/// Once the script runs out the device stays silent. Useful for simulations
/// and for driving acquisition under a paused tokio clock.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPositionSource {
    script: Vec<(Duration, PositionEvent)>,
    delivered: Arc<AtomicUsize>,
    cancelled: Arc<AtomicBool>,
    opened_with: Arc<Mutex<Option<PositionOptions>>>,
}

impl ScriptedPositionSource {
    pub fn new(script: Vec<(Duration, PositionEvent)>) -> Self {
        Self {
            script,
            ..Self::default()
        }
    }

    pub fn delivered(&self) -> usize {
        self.delivered.load(Ordering::SeqCst)
    }

    pub fn was_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn opened_with(&self) -> Option<PositionOptions> {
        self.opened_with.lock().map(|options| *options).unwrap_or(None)
    }

    fn record_options(&self, options: PositionOptions) {
        if let Ok(mut slot) = self.opened_with.lock() {
            *slot = Some(options);
        }
    }
}

impl PositionSource for ScriptedPositionSource {
    fn watch(&self, options: PositionOptions) -> PositionWatch {
        self.record_options(options);

        let opened_at = Instant::now();
        let queue: VecDeque<_> = self.script.iter().cloned().collect();
        let delivered = self.delivered.clone();

        let events = stream::unfold(queue, move |mut queue| {
            let delivered = delivered.clone();
            async move {
                let (offset, event) = queue.pop_front()?;
                sleep_until(opened_at + offset).await;
                delivered.fetch_add(1, Ordering::SeqCst);
                Some((event, queue))
            }
        })
        .chain(stream::pending());

        let cancelled = self.cancelled.clone();
        PositionWatch::new(events).on_cancel(move || cancelled.store(true, Ordering::SeqCst))
    }

    fn current(&self, options: PositionOptions) -> BoxFuture<'_, PositionEvent> {
        self.record_options(options);

        let opened_at = Instant::now();
        Box::pin(async move {
            match self.script.first() {
                Some((offset, event)) => {
                    sleep_until(opened_at + *offset).await;
                    self.delivered.fetch_add(1, Ordering::SeqCst);
                    *event
                }
                None => std::future::pending().await,
            }
        })
    }
}
