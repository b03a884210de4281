use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::error::LocationError;
use crate::models::location::Coordinate;
use crate::positioning::{PositionOptions, PositionSource, PositionWatch};

#[derive(Debug, Clone, PartialEq)]
pub struct AcquireConfig {
    pub acceptable_accuracy_m: f64,
    pub max_wait: Duration,
    pub per_sample_timeout: Duration,
    pub use_cache: bool,
}

impl Default for AcquireConfig {
    fn default() -> Self {
        Self {
            acceptable_accuracy_m: 100.0,
            max_wait: Duration::from_millis(10_000),
            per_sample_timeout: Duration::from_millis(8_000),
            use_cache: false,
        }
    }
}

impl AcquireConfig {
    pub fn position_options(&self) -> PositionOptions {
        PositionOptions {
            high_accuracy: true,
            timeout: self.per_sample_timeout,
            maximum_age: if self.use_cache {
                Duration::MAX
            } else {
                Duration::ZERO
            },
        }
    }

    fn is_acceptable(&self, sample: &Coordinate) -> bool {
        sample.accuracy_or_worst() <= self.acceptable_accuracy_m
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixQuality {
    /// A sample met the accuracy threshold.
    Accurate,
    /// The time budget ran out; this is the best sample seen.
    BestEffort,
}

impl FixQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            FixQuality::Accurate => "accurate",
            FixQuality::BestEffort => "best_effort",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fix {
    pub coordinate: Coordinate,
    pub quality: FixQuality,
    pub samples: usize,
}

/// Tracks the best sample of one acquisition. Owned by that acquisition only.
#[derive(Debug, Default)]
struct BestSample {
    best: Option<Coordinate>,
    seen: usize,
}

impl BestSample {
    fn offer(&mut self, sample: Coordinate) {
        self.seen += 1;
        let improves = self
            .best
            .is_none_or(|best| sample.accuracy_or_worst() < best.accuracy_or_worst());
        if improves {
            self.best = Some(sample);
        }
    }

    fn into_fix(self) -> Option<Fix> {
        let seen = self.seen;
        self.best.map(|coordinate| Fix {
            coordinate,
            quality: FixQuality::BestEffort,
            samples: seen,
        })
    }
}

/// Samples the source until a fix is accurate enough or `max_wait` runs out.
///
/// The subscription is cancelled on every exit path and never polled after
/// the outcome is decided, so a late sample cannot change the result.
pub async fn acquire_location<S>(source: &S, config: &AcquireConfig) -> Result<Fix, LocationError>
where
    S: PositionSource + ?Sized,
{
    let deadline = Instant::now() + config.max_wait;
    let mut watch = source.watch(config.position_options());
    let mut samples = BestSample::default();

    let timer = sleep_until(deadline);
    tokio::pin!(timer);

    loop {
        tokio::select! {
            biased;

            event = watch.next() => match event {
                Some(Ok(sample)) => {
                    samples.offer(sample);
                    debug!(accuracy_m = ?sample.accuracy, seen = samples.seen, "position sample");

                    if config.is_acceptable(&sample) {
                        watch.cancel();
                        info!(
                            accuracy_m = ?sample.accuracy,
                            samples = samples.seen,
                            "location acquired"
                        );
                        return Ok(Fix {
                            coordinate: sample,
                            quality: FixQuality::Accurate,
                            samples: samples.seen,
                        });
                    }
                }
                Some(Err(LocationError::Timeout)) if samples.best.is_some() => {
                    debug!("subscription timeout after samples; waiting for better fix");
                }
                Some(Err(err)) => return settle(watch, samples, err),
                None => return settle(watch, samples, LocationError::PositionUnavailable),
            },

            () = &mut timer => {
                watch.cancel();
                return match samples.into_fix() {
                    Some(fix) => {
                        warn!(
                            accuracy_m = ?fix.coordinate.accuracy,
                            samples = fix.samples,
                            "location wait expired; using best sample"
                        );
                        Ok(fix)
                    }
                    None => {
                        warn!("location wait expired without any sample");
                        Err(LocationError::Timeout)
                    }
                };
            }
        }
    }
}

/// The subscription ended early. Falls back to the best sample when there is
/// one, otherwise surfaces the device error.
fn settle(
    watch: PositionWatch,
    samples: BestSample,
    err: LocationError,
) -> Result<Fix, LocationError> {
    watch.cancel();
    match samples.into_fix() {
        Some(fix) => {
            warn!(
                error = %err,
                samples = fix.samples,
                "position subscription ended; using best sample"
            );
            Ok(fix)
        }
        None => {
            warn!(error = %err, "location acquisition failed");
            Err(err)
        }
    }
}

/// Single request fallback with weaker accuracy guarantees. Not suitable for
/// emergency dispatch.
pub async fn acquire_location_once<S>(
    source: &S,
    config: &AcquireConfig,
) -> Result<Fix, LocationError>
where
    S: PositionSource + ?Sized,
{
    let outcome = tokio::time::timeout(
        config.per_sample_timeout,
        source.current(config.position_options()),
    )
    .await;

    match outcome {
        Ok(Ok(coordinate)) => {
            let quality = if config.is_acceptable(&coordinate) {
                FixQuality::Accurate
            } else {
                FixQuality::BestEffort
            };
            info!(
                accuracy_m = ?coordinate.accuracy,
                quality = quality.as_str(),
                "single-shot location acquired"
            );
            Ok(Fix {
                coordinate,
                quality,
                samples: 1,
            })
        }
        Ok(Err(err)) => {
            warn!(error = %err, "single-shot location failed");
            Err(err)
        }
        Err(_) => {
            warn!("single-shot location timed out");
            Err(LocationError::Timeout)
        }
    }
}
