//! Network-adjusted time
//!
//! Tracks the median clock offset reported by peers and exposes a
//! corrected view of the system clock. Each peer address contributes
//! at most one sample, and the adjustment is capped so a cluster of
//! lying peers cannot drag the clock arbitrarily far.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use tracing::{debug, warn};
use umbra_netaddr::NetAddress;

use crate::session::NotifySink;

/// Samples kept by the rolling filter.
const MAX_SAMPLES: usize = 200;
/// Largest median offset we are willing to adopt, in seconds.
const MAX_OFFSET_SECS: i64 = 35 * 60;
/// A sample this close to zero counts as agreeing with our clock.
const WARN_MATCH_SECS: i64 = 5 * 60;

/// Rolling median over the most recent samples.
#[derive(Debug)]
pub struct MedianFilter {
    values: Vec<i64>,
    capacity: usize,
}

impl MedianFilter {
    /// Seeds the filter with one initial value, so the very first
    /// sample cannot set the median on its own.
    pub fn new(capacity: usize, initial: i64) -> Self {
        let mut values = Vec::with_capacity(capacity);
        values.push(initial);
        Self { values, capacity }
    }

    pub fn input(&mut self, value: i64) {
        if self.values.len() == self.capacity {
            self.values.remove(0);
        }
        self.values.push(value);
    }

    /// Median of the held samples: middle element for odd counts,
    /// average of the two middle elements for even counts.
    pub fn median(&self) -> i64 {
        let sorted = self.sorted();
        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 1 {
            sorted[mid]
        } else {
            (sorted[mid - 1] + sorted[mid]) / 2
        }
    }

    pub fn sorted(&self) -> Vec<i64> {
        let mut sorted = self.values.clone();
        sorted.sort_unstable();
        sorted
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

struct TimeDataInner {
    known: HashSet<NetAddress>,
    filter: MedianFilter,
    offset: i64,
    warned: bool,
}

/// Peer-derived clock adjustment shared across the node.
pub struct TimeData {
    inner: Mutex<TimeDataInner>,
    notify: Arc<dyn NotifySink>,
}

impl TimeData {
    pub fn new(notify: Arc<dyn NotifySink>) -> Self {
        Self {
            inner: Mutex::new(TimeDataInner {
                known: HashSet::new(),
                filter: MedianFilter::new(MAX_SAMPLES, 0),
                offset: 0,
                warned: false,
            }),
            notify,
        }
    }

    /// Feeds one peer's clock reading. Repeat samples from the same
    /// address are ignored.
    pub fn add_sample(&self, peer: &NetAddress, peer_time: i64) {
        let sample = peer_time - unix_time();
        let mut inner = self.inner.lock();

        if !inner.known.insert(peer.clone()) {
            return;
        }
        inner.filter.input(sample);
        debug!(
            samples = inner.filter.len(),
            offset_secs = sample,
            "added time sample"
        );

        // Re-evaluate on odd counts only, so the median is an actual
        // reported sample rather than an average.
        if inner.filter.len() >= 5 && inner.filter.len() % 2 == 1 {
            let median = inner.filter.median();
            if median.abs() < MAX_OFFSET_SECS {
                inner.offset = median;
            } else {
                inner.offset = 0;
                if !inner.warned {
                    // If no peer loosely agrees with our clock, the
                    // clock itself is the likely culprit.
                    let near_agreement = inner
                        .filter
                        .sorted()
                        .iter()
                        .any(|&o| o != 0 && o.abs() < WARN_MATCH_SECS);
                    if !near_agreement {
                        inner.warned = true;
                        let message = "Please check that your computer's date and time are correct! If your clock is wrong, Umbra will not work properly.";
                        warn!("{}", message);
                        self.notify.warn(message);
                    }
                }
            }
            debug!(offset_secs = inner.offset, "network time offset");
        }
    }

    /// Current consensus offset in seconds.
    pub fn offset(&self) -> i64 {
        self.inner.lock().offset
    }

    /// System time corrected by the network median offset.
    pub fn adjusted_time(&self) -> i64 {
        self.offset() + unix_time()
    }
}

/// Seconds since the Unix epoch by the system clock.
pub fn unix_time() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
