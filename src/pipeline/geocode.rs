//! Reverse geocoding of building centroids through a small pool of worker
//! threads sharing one rate limiter.
//!
//! Each lookup is isolated: a failure is logged and recorded as
//! [`AddressLookup::Error`], a lookup without result as
//! [`AddressLookup::Unknown`]. Neither stops the other lookups.

use geo::Point;
use indicatif::ProgressBar;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crate::api::ReverseGeocoder;
use crate::config::GeocoderConfig;
use crate::domain::AddressLookup;

#[derive(Debug, Clone, Copy)]
pub struct GeocodeOptions {
    pub concurrency: usize,
    pub min_interval: Duration,
}

impl Default for GeocodeOptions {
    fn default() -> Self {
        Self::from(&GeocoderConfig::default())
    }
}

impl From<&GeocoderConfig> for GeocodeOptions {
    fn from(config: &GeocoderConfig) -> Self {
        Self {
            concurrency: config.concurrency.max(1),
            min_interval: Duration::from_millis(config.min_interval_ms),
        }
    }
}

/// Spaces out request starts by at least `interval`, across threads.
pub struct RateLimiter {
    interval: Duration,
    next_slot: Mutex<Instant>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(Instant::now()),
        }
    }

    /// Block until the caller may start its request.
    pub fn acquire(&self) {
        let wait = {
            let mut next = self.next_slot.lock();
            let now = Instant::now();
            let start = (*next).max(now);
            *next = start + self.interval;
            start - now
        };

        if !wait.is_zero() {
            thread::sleep(wait);
        }
    }
}

/// Look up one point, folding every failure into a sentinel.
pub fn lookup_address(geocoder: &dyn ReverseGeocoder, point: Point<f64>) -> AddressLookup {
    match geocoder.reverse(point) {
        Ok(Some(address)) => AddressLookup::resolved(address),
        Ok(None) => AddressLookup::Unknown,
        Err(e) => {
            tracing::warn!(
                "Reverse geocoding error at ({}, {}): {}",
                point.y(),
                point.x(),
                e
            );
            AddressLookup::Error
        }
    }
}

/// Resolve an address for every point, preserving input order.
///
/// Points that are `None` (no centroid) resolve to `Unknown` without a
/// request. At most `options.concurrency` lookups run at once.
pub fn resolve_addresses(
    geocoder: &dyn ReverseGeocoder,
    points: &[Option<Point<f64>>],
    options: &GeocodeOptions,
    progress: &ProgressBar,
) -> Vec<AddressLookup> {
    // Anything a panicking worker leaves unfilled reads as a failed lookup.
    let mut lookups = vec![AddressLookup::Error; points.len()];
    if points.is_empty() {
        return lookups;
    }

    let workers = options.concurrency.clamp(1, points.len());
    let limiter = RateLimiter::new(options.min_interval);
    let next = AtomicUsize::new(0);

    thread::scope(|scope| {
        let (limiter, next) = (&limiter, &next);

        let handles: Vec<_> = (0..workers)
            .map(|_| {
                scope.spawn(move || {
                    let mut done = Vec::new();
                    loop {
                        let index = next.fetch_add(1, Ordering::Relaxed);
                        let Some(point) = points.get(index) else {
                            break;
                        };

                        let lookup = match point {
                            Some(point) => {
                                limiter.acquire();
                                lookup_address(geocoder, *point)
                            }
                            None => AddressLookup::Unknown,
                        };
                        progress.inc(1);
                        done.push((index, lookup));
                    }
                    done
                })
            })
            .collect();

        for handle in handles {
            match handle.join() {
                Ok(done) => {
                    for (index, lookup) in done {
                        lookups[index] = lookup;
                    }
                }
                Err(_) => {
                    tracing::error!("Geocoding worker panicked; its lookups are recorded as errors")
                }
            }
        }
    });

    lookups
}
