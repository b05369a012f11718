//! Fixed-interval sampling of the authoritative deck.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use crate::authority::AuthorityState;
use crate::detector::ChangeDetector;
use crate::error::Result;
use crate::publisher::{Publisher, Transport};
use crate::reader::ReaderPort;
use crate::shutdown::ShutdownSignal;
use crate::supervisor::ConnectionSupervisor;

pub struct Poller<R, T> {
    supervisor: ConnectionSupervisor<R>,
    authority: Arc<AuthorityState>,
    detector: Arc<ChangeDetector>,
    publisher: Arc<Publisher<T>>,
    interval: Duration,
}

impl<R: ReaderPort, T: Transport> Poller<R, T> {
    pub fn new(
        supervisor: ConnectionSupervisor<R>,
        authority: Arc<AuthorityState>,
        detector: Arc<ChangeDetector>,
        publisher: Arc<Publisher<T>>,
        interval: Duration,
    ) -> Self {
        Self {
            supervisor,
            authority,
            detector,
            publisher,
            interval,
        }
    }

    pub fn supervisor(&self) -> &ConnectionSupervisor<R> {
        &self.supervisor
    }

    /// Sample the authoritative deck once.
    ///
    /// Returns `Ok(true)` if a new record was published. An unavailable
    /// reader or an unchanged/incomplete record is `Ok(false)`.
    pub fn tick(&mut self) -> Result<bool> {
        let snapshot = self.authority.snapshot();
        let Some(record) = self.supervisor.read(snapshot.deck) else {
            return Ok(false);
        };

        let authority = &self.authority;
        self.detector
            .publish_if_changed(&record, &self.publisher, || authority.is_current(snapshot))
    }

    /// Tick every interval until shutdown. A failed or panicking tick is
    /// logged and the next tick runs as scheduled.
    pub fn run(&mut self, shutdown: &ShutdownSignal) {
        info!("Polling deck text every {:?}", self.interval);

        loop {
            let started = Instant::now();

            match panic::catch_unwind(AssertUnwindSafe(|| self.tick())) {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => error!("Poll tick failed: {}", e),
                Err(_) => {
                    error!("Poll tick panicked, resetting reader connection");
                    self.supervisor.reset();
                }
            }

            let remaining = self.interval.saturating_sub(started.elapsed());
            if shutdown.wait(remaining) {
                break;
            }
        }

        debug!("Poller stopped");
    }
}
