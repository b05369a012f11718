//! Authority-change notifications from the upstream.

use std::io::ErrorKind;
use std::net::UdpSocket;
use std::sync::Arc;
use std::time::Duration;

use rosc::{OscMessage, OscPacket};
use tracing::{debug, error, info, warn};

use crate::authority::AuthorityState;
use crate::deck::DeckIndex;
use crate::detector::ChangeDetector;
use crate::error::Result;
use crate::osc;
use crate::publisher::{Publisher, Transport};
use crate::shutdown::ShutdownSignal;

/// How often a blocked receive wakes up to check for shutdown
const RECV_TIMEOUT: Duration = Duration::from_millis(250);

/// Largest datagram accepted
const MAX_PACKET_SIZE: usize = 1536;

/// Outcome of handling one notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    /// Authority moved to a new deck.
    Switched { from: DeckIndex, to: DeckIndex },
    /// The deck was already authoritative.
    Unchanged(DeckIndex),
    /// Wrong address, missing or malformed argument, or deck out of range.
    Ignored,
}

pub struct EventListener<T> {
    address: String,
    authority: Arc<AuthorityState>,
    detector: Arc<ChangeDetector>,
    publisher: Arc<Publisher<T>>,
    placeholder: bool,
}

impl<T: Transport> EventListener<T> {
    pub fn new(
        address: impl Into<String>,
        authority: Arc<AuthorityState>,
        detector: Arc<ChangeDetector>,
        publisher: Arc<Publisher<T>>,
        placeholder: bool,
    ) -> Self {
        Self {
            address: address.into(),
            authority,
            detector,
            publisher,
            placeholder,
        }
    }

    /// Receive and handle notifications until shutdown.
    ///
    /// Only socket setup can fail; receive errors are logged and skipped.
    pub fn run(&self, socket: &UdpSocket, shutdown: &ShutdownSignal) -> Result<()> {
        socket.set_read_timeout(Some(RECV_TIMEOUT))?;
        info!("Listening for deck changes on {}", socket.local_addr()?);

        let mut buf = [0u8; MAX_PACKET_SIZE];
        while !shutdown.is_shutdown() {
            match socket.recv_from(&mut buf) {
                Ok((len, from)) => match osc::decode_packet(&buf[..len]) {
                    Ok(packet) => {
                        self.handle_packet(&packet);
                    }
                    Err(e) => debug!("Dropping undecodable packet from {}: {}", from, e),
                },
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
                // Windows reports ICMP port-unreachable for earlier sends here
                Err(e) if e.kind() == ErrorKind::ConnectionReset => {
                    debug!("Ignoring connection reset on notification socket");
                }
                // Oversized datagrams and queued ICMP errors land here; the
                // socket stays usable, so keep receiving.
                Err(e) => {
                    warn!("Receive on notification socket failed: {}", e);
                    shutdown.wait(RECV_TIMEOUT);
                }
            }
        }

        debug!("Listener stopped");
        Ok(())
    }

    pub fn handle_packet(&self, packet: &OscPacket) -> Vec<Notification> {
        osc::messages(packet)
            .into_iter()
            .map(|message| self.handle_message(message))
            .collect()
    }

    pub fn handle_message(&self, message: &OscMessage) -> Notification {
        if message.addr != self.address {
            debug!("Ignoring message for {}", message.addr);
            return Notification::Ignored;
        }

        let Some(raw) = message.args.first().and_then(osc::integer_argument) else {
            debug!("Ignoring {} with unusable argument {:?}", message.addr, message.args);
            return Notification::Ignored;
        };

        let Some(deck) = DeckIndex::new(raw, self.authority.deck_count()) else {
            debug!("Ignoring out-of-range deck {}", raw);
            return Notification::Ignored;
        };

        self.apply(deck)
    }

    /// Make `deck` authoritative, sending the placeholder if enabled.
    pub fn apply(&self, deck: DeckIndex) -> Notification {
        let Some(previous) = self.authority.set(deck) else {
            return Notification::Unchanged(deck);
        };

        info!("Master switched {} -> {}", previous, deck);

        if self.placeholder
            && let Err(e) = self
                .detector
                .reset_with(|| self.publisher.publish_placeholder())
        {
            warn!("Failed to send placeholder: {}", e);
        }

        Notification::Switched {
            from: previous,
            to: deck,
        }
    }
}

/// Run `listener` until shutdown, logging a socket setup failure instead of
/// propagating it so the poller keeps running.
pub fn serve<T: Transport>(
    listener: &EventListener<T>,
    socket: &UdpSocket,
    shutdown: &ShutdownSignal,
) {
    if let Err(e) = listener.run(socket, shutdown) {
        error!("Notification listener failed: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_DECK_ADDRESS, OutputConfig, PlaceholderConfig};
    use crate::publisher::recording::RecordingTransport;
    use crate::track::TrackRecord;
    use rosc::OscType;
    use std::thread;

    struct Fixture {
        authority: Arc<AuthorityState>,
        detector: Arc<ChangeDetector>,
        publisher: Arc<Publisher<RecordingTransport>>,
        listener: EventListener<RecordingTransport>,
    }

    fn fixture(deck_count: usize, placeholder: bool) -> Fixture {
        let authority = Arc::new(AuthorityState::new(deck_count));
        let detector = Arc::new(ChangeDetector::new());
        let publisher = Arc::new(Publisher::new(
            RecordingTransport::new(),
            &OutputConfig::default(),
            &PlaceholderConfig::default(),
        ));
        let listener = EventListener::new(
            DEFAULT_DECK_ADDRESS,
            Arc::clone(&authority),
            Arc::clone(&detector),
            Arc::clone(&publisher),
            placeholder,
        );
        Fixture {
            authority,
            detector,
            publisher,
            listener,
        }
    }

    fn message(args: Vec<OscType>) -> OscMessage {
        OscMessage {
            addr: DEFAULT_DECK_ADDRESS.to_string(),
            args,
        }
    }

    fn deck(raw: i64) -> DeckIndex {
        DeckIndex::new(raw, 4).unwrap()
    }

    #[test]
    fn test_valid_indices_become_authority() {
        let f = fixture(4, false);
        for raw in [3, 1, 2, 0] {
            f.listener.handle_message(&message(vec![OscType::Int(raw as i32)]));
            assert_eq!(f.authority.get(), deck(raw));
        }
    }

    #[test]
    fn test_invalid_payloads_leave_authority_unchanged() {
        let f = fixture(2, true);
        f.listener.handle_message(&message(vec![OscType::Int(1)]));
        let before = f.authority.snapshot();
        let sent_before = f.publisher.transport().sent().len();

        for args in [
            vec![],
            vec![OscType::Int(2)],
            vec![OscType::Int(-1)],
            vec![OscType::String("one".into())],
            vec![OscType::Float(0.5)],
            vec![OscType::Bool(false)],
        ] {
            assert_eq!(f.listener.handle_message(&message(args)), Notification::Ignored);
        }

        assert_eq!(f.authority.snapshot(), before);
        assert_eq!(f.publisher.transport().sent().len(), sent_before);
    }

    #[test]
    fn test_other_addresses_ignored() {
        let f = fixture(2, true);
        let other = OscMessage {
            addr: "/bpm/master/current".into(),
            args: vec![OscType::Int(1)],
        };
        assert_eq!(f.listener.handle_message(&other), Notification::Ignored);
        assert_eq!(f.authority.get(), DeckIndex::FIRST);
    }

    #[test]
    fn test_same_deck_is_noop() {
        let f = fixture(2, true);
        let outcome = f.listener.handle_message(&message(vec![OscType::Int(0)]));

        assert_eq!(outcome, Notification::Unchanged(DeckIndex::FIRST));
        assert!(f.publisher.transport().sent().is_empty());
    }

    #[test]
    fn test_switch_sends_placeholder_and_clears_last_published() {
        let f = fixture(2, true);
        let record = TrackRecord::new("DJ X", "Song A");
        f.detector
            .publish_if_changed(&record, &f.publisher, || true)
            .unwrap();

        let outcome = f.listener.handle_message(&message(vec![OscType::String("1".into())]));

        assert_eq!(
            outcome,
            Notification::Switched {
                from: DeckIndex::FIRST,
                to: deck(1)
            }
        );
        assert_eq!(
            f.publisher.transport().records(),
            vec![record, TrackRecord::new("Loading...", "")]
        );
        assert_eq!(f.detector.last_published(), None);
    }

    #[test]
    fn test_switch_without_placeholder_is_silent() {
        let f = fixture(2, false);
        let record = TrackRecord::new("DJ X", "Song A");
        f.detector
            .publish_if_changed(&record, &f.publisher, || true)
            .unwrap();

        f.listener.handle_message(&message(vec![OscType::Int(1)]));

        assert_eq!(f.authority.get(), deck(1));
        assert_eq!(f.publisher.transport().records(), vec![record.clone()]);
        assert_eq!(f.detector.last_published(), Some(record));
    }

    #[test]
    fn test_placeholder_failure_still_switches() {
        let f = fixture(2, true);
        f.publisher.transport().set_failing(true);

        let outcome = f.listener.handle_message(&message(vec![OscType::Int(1)]));
        assert!(matches!(outcome, Notification::Switched { .. }));
        assert_eq!(f.authority.get(), deck(1));
    }

    #[test]
    fn test_run_survives_receive_errors() {
        let f = fixture(2, false);

        // Reserve a port with nothing listening on it
        let peer = UdpSocket::bind("127.0.0.1:0").unwrap();
        let peer_addr = peer.local_addr().unwrap();
        drop(peer);

        // A send to the closed port queues an ICMP error for the next receive
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        let target = socket.local_addr().unwrap();
        socket.connect(peer_addr).unwrap();
        socket.send(&[0]).unwrap();
        thread::sleep(Duration::from_millis(50));

        let shutdown = Arc::new(ShutdownSignal::new());
        let listener = Arc::new(f.listener);
        let handle = {
            let listener = Arc::clone(&listener);
            let shutdown = Arc::clone(&shutdown);
            thread::spawn(move || listener.run(&socket, &shutdown))
        };

        thread::sleep(Duration::from_millis(100));
        assert!(!handle.is_finished());

        // The peer comes up, sends an oversized datagram, then a real switch
        let peer = UdpSocket::bind(peer_addr).unwrap();
        peer.send_to(&[0u8; 4096], target).unwrap();
        let buf = osc::encode_deck_notification(DEFAULT_DECK_ADDRESS, 1).unwrap();
        peer.send_to(&buf, target).unwrap();

        let start = std::time::Instant::now();
        while f.authority.get() != deck(1) && start.elapsed() < Duration::from_secs(5) {
            thread::sleep(Duration::from_millis(10));
        }

        assert_eq!(f.authority.get(), deck(1));
        assert!(!handle.is_finished());
        shutdown.trigger();
        assert!(handle.join().unwrap().is_ok());
    }

    #[test]
    fn test_run_receives_over_udp() {
        let f = fixture(2, false);
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        let target = socket.local_addr().unwrap();
        let shutdown = Arc::new(ShutdownSignal::new());

        let listener = Arc::new(f.listener);
        let handle = {
            let listener = Arc::clone(&listener);
            let shutdown = Arc::clone(&shutdown);
            thread::spawn(move || listener.run(&socket, &shutdown))
        };

        let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
        sender.send_to(b"garbage!", target).unwrap();
        let buf = osc::encode_deck_notification(DEFAULT_DECK_ADDRESS, 1).unwrap();
        sender.send_to(&buf, target).unwrap();

        let start = std::time::Instant::now();
        while f.authority.get() != deck(1) && start.elapsed() < Duration::from_secs(5) {
            thread::sleep(Duration::from_millis(10));
        }
        shutdown.trigger();

        assert_eq!(f.authority.get(), deck(1));
        assert!(handle.join().unwrap().is_ok());
    }
}
