//! Wiring of the listener and the poller.
//!
//! ```ignore
//! let bridge = Bridge::bind(config)?;
//! let reader = UiaReader::new(bridge.config().reader.clone());
//! bridge.run(reader, shutdown)?;
//! ```

use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;
use std::thread;

use tracing::{error, info};

use crate::authority::AuthorityState;
use crate::config::BridgeConfig;
use crate::detector::ChangeDetector;
use crate::error::Result;
use crate::listener::{self, EventListener};
use crate::osc::OscTransport;
use crate::poller::Poller;
use crate::publisher::Publisher;
use crate::reader::ReaderPort;
use crate::shutdown::ShutdownSignal;
use crate::supervisor::ConnectionSupervisor;

/// Bound sockets plus the state shared by the two activities.
pub struct Bridge {
    config: BridgeConfig,
    socket: UdpSocket,
    authority: Arc<AuthorityState>,
    detector: Arc<ChangeDetector>,
    publisher: Arc<Publisher<OscTransport>>,
}

impl Bridge {
    /// Validate the configuration and bind both sockets.
    pub fn bind(config: BridgeConfig) -> Result<Self> {
        config.validate()?;

        let socket = UdpSocket::bind(config.listen.bind)?;
        let transport = OscTransport::bind(config.output.bind, config.output.destination)?;
        let publisher = Arc::new(Publisher::new(
            transport,
            &config.output,
            &config.placeholder,
        ));

        Ok(Self {
            authority: Arc::new(AuthorityState::new(config.deck_count())),
            detector: Arc::new(ChangeDetector::new()),
            config,
            socket,
            publisher,
        })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Run until `shutdown` is triggered.
    ///
    /// The listener gets its own thread so a slow UI read never delays a
    /// deck change; the poller runs on the calling thread, which must be the
    /// one allowed to use `reader`.
    pub fn run<R: ReaderPort>(self, reader: R, shutdown: Arc<ShutdownSignal>) -> Result<()> {
        let Bridge {
            config,
            socket,
            authority,
            detector,
            publisher,
        } = self;

        info!(
            "Bridging {} decks: {} -> {}",
            config.deck_count(),
            socket.local_addr()?,
            publisher.transport().destination()
        );
        if !config.placeholder.enabled {
            info!("Placeholder on deck change is disabled");
        }

        let event_listener = EventListener::new(
            config.listen.address.clone(),
            Arc::clone(&authority),
            Arc::clone(&detector),
            Arc::clone(&publisher),
            config.placeholder.enabled,
        );
        let listener_shutdown = Arc::clone(&shutdown);
        let listener_handle = thread::Builder::new()
            .name("deck-listener".into())
            .spawn(move || listener::serve(&event_listener, &socket, &listener_shutdown))?;

        let mut poller = Poller::new(
            ConnectionSupervisor::new(reader, &config),
            authority,
            detector,
            publisher,
            config.poll_interval(),
        );
        poller.run(&shutdown);

        shutdown.trigger();
        if listener_handle.join().is_err() {
            error!("Listener thread panicked");
        }

        info!("Bridge stopped");
        Ok(())
    }
}
