//! Debounce of track records against the last published one.
//!
//! The detector's lock is also the publish lock: every downstream pair (track
//! update or placeholder) is sent while holding it, so pairs from the poller
//! and the listener never interleave and a record read under an old authority
//! cannot land after the placeholder for the new one.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use crate::error::Result;
use crate::publisher::{Publisher, Transport};
use crate::track::TrackRecord;

#[derive(Debug, Default)]
pub struct ChangeDetector {
    last_published: Mutex<Option<TrackRecord>>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `record` if it is complete and differs from the last accepted
    /// one. Accepting updates the last published record.
    pub fn consider(&self, record: &TrackRecord) -> bool {
        self.accept_with(record, || Ok(true)).unwrap_or(false)
    }

    /// Publish `record` if it is complete, differs from the last published
    /// one and `still_current` confirms it was read under the current
    /// authority.
    ///
    /// The last published record only changes after a successful send.
    pub fn publish_if_changed<T: Transport>(
        &self,
        record: &TrackRecord,
        publisher: &Publisher<T>,
        still_current: impl FnOnce() -> bool,
    ) -> Result<bool> {
        self.accept_with(record, || {
            if !still_current() {
                debug!("Discarding '{}': authority changed during read", record);
                return Ok(false);
            }
            publisher.publish(record)?;
            info!("Now playing: {}", record);
            Ok(true)
        })
    }

    /// Run `deliver` under the lock for a new complete record and remember
    /// the record if `deliver` reports it as delivered.
    fn accept_with(
        &self,
        record: &TrackRecord,
        deliver: impl FnOnce() -> Result<bool>,
    ) -> Result<bool> {
        let mut last = self.lock();
        if !is_new(&last, record) || !deliver()? {
            return Ok(false);
        }
        *last = Some(record.clone());
        Ok(true)
    }

    /// Forget the last published record and run `send` under the publish
    /// lock. Used for the placeholder on authority changes: the next complete
    /// record is published even if it matches the one before the change.
    pub fn reset_with(&self, send: impl FnOnce() -> Result<()>) -> Result<()> {
        let mut last = self.lock();
        *last = None;
        send()
    }

    pub fn last_published(&self) -> Option<TrackRecord> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Option<TrackRecord>> {
        self.last_published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn is_new(last: &Option<TrackRecord>, record: &TrackRecord) -> bool {
    record.is_valid() && last.as_ref().map(TrackRecord::key) != Some(record.key())
}
