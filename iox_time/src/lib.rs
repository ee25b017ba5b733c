//! Time functionality for the ingest core.
//!
//! The ingest state machine needs a wall clock for rows that arrive without
//! an explicit timestamp, and tests need to control that clock precisely.
//! [`TimeProvider`] is the seam: production code is handed a
//! [`SystemProvider`], tests a [`MockProvider`].

#![deny(rustdoc::broken_intra_doc_links, rust_2018_idioms)]
#![warn(missing_docs, missing_debug_implementations, clippy::use_self)]

use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use std::{fmt::Debug, time::Duration};

/// A point in time, represented as nanoseconds since the Unix epoch.
///
/// Line-protocol timestamps are microseconds; [`Time::timestamp_micros`]
/// truncates down to that resolution when needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Time(DateTime<Utc>);

impl Time {
    /// The current wall-clock time, per [`Utc::now`].
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Construct from a nanosecond Unix timestamp.
    pub fn from_timestamp_nanos(nanos: i64) -> Self {
        Self(Utc.timestamp_nanos(nanos))
    }

    /// Construct from a microsecond Unix timestamp.
    pub fn from_timestamp_micros(micros: i64) -> Self {
        Self::from_timestamp_nanos(micros.saturating_mul(1_000))
    }

    /// Construct from a millisecond Unix timestamp.
    pub fn from_timestamp_millis(millis: i64) -> Self {
        Self::from_timestamp_nanos(millis.saturating_mul(1_000_000))
    }

    /// Nanoseconds since the Unix epoch.
    pub fn timestamp_nanos(&self) -> i64 {
        self.0.timestamp_nanos()
    }

    /// Microseconds since the Unix epoch, the resolution the ingest core
    /// writes rows at.
    pub fn timestamp_micros(&self) -> i64 {
        self.0.timestamp_nanos() / 1_000
    }

    /// Milliseconds since the Unix epoch.
    pub fn timestamp_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// Returns `self + duration`, or `None` on overflow.
    pub fn checked_add(&self, duration: Duration) -> Option<Self> {
        chrono::Duration::from_std(duration)
            .ok()
            .and_then(|d| self.0.checked_add_signed(d))
            .map(Self)
    }

    /// Returns `self - duration`, or `None` on overflow.
    pub fn checked_sub(&self, duration: Duration) -> Option<Self> {
        chrono::Duration::from_std(duration)
            .ok()
            .and_then(|d| self.0.checked_sub_signed(d))
            .map(Self)
    }
}

/// Something that can report the current time.
///
/// Implemented by [`SystemProvider`] for production use and [`MockProvider`]
/// for tests that need deterministic timestamps.
pub trait TimeProvider: Debug + Send + Sync + 'static {
    /// The current time, per this provider.
    fn now(&self) -> Time;
}

/// A [`TimeProvider`] backed by the operating system's wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProvider {}

impl SystemProvider {
    /// Create a new provider backed by [`Utc::now`].
    pub fn new() -> Self {
        Self {}
    }
}

impl TimeProvider for SystemProvider {
    fn now(&self) -> Time {
        Time(Utc::now())
    }
}

/// A [`TimeProvider`] with a settable, non-advancing clock, for tests.
#[derive(Debug)]
pub struct MockProvider {
    now: Mutex<Time>,
}

impl MockProvider {
    /// Create a provider that reports `start` until told otherwise.
    pub fn new(start: Time) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Overwrite the current time.
    pub fn set(&self, time: Time) {
        *self.now.lock() = time;
    }

    /// Advance the clock by `duration` and return the new time.
    pub fn inc(&self, duration: Duration) -> Time {
        let mut guard = self.now.lock();
        let next = guard
            .checked_add(duration)
            .expect("mock time overflowed");
        *guard = next;
        next
    }
}

impl TimeProvider for MockProvider {
    fn now(&self) -> Time {
        *self.now.lock()
    }
}
