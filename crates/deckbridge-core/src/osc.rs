//! OSC over UDP: encoding track updates and decoding deck notifications.

use std::net::{SocketAddr, UdpSocket};

use rosc::{OscMessage, OscPacket, OscType, decoder, encoder};
use tracing::info;

use crate::error::{Error, Result};
use crate::publisher::Transport;

/// UDP transport sending one OSC message per call.
pub struct OscTransport {
    socket: UdpSocket,
    destination: SocketAddr,
}

impl OscTransport {
    pub fn bind(local: SocketAddr, destination: SocketAddr) -> Result<Self> {
        let socket = UdpSocket::bind(local)?;
        info!("Sending track updates {} -> {}", socket.local_addr()?, destination);
        Ok(Self {
            socket,
            destination,
        })
    }

    pub fn destination(&self) -> SocketAddr {
        self.destination
    }
}

impl Transport for OscTransport {
    fn send(&self, address: &str, value: &str) -> Result<()> {
        let buf = encode_message(address, vec![OscType::String(value.to_string())])?;
        self.socket.send_to(&buf, self.destination)?;
        Ok(())
    }
}

pub fn encode_message(address: &str, args: Vec<OscType>) -> Result<Vec<u8>> {
    let packet = OscPacket::Message(OscMessage {
        addr: address.to_string(),
        args,
    });
    encoder::encode(&packet).map_err(|e| Error::Osc(format!("{:?}", e)))
}

/// Encode an authority-change notification as the upstream sends it.
pub fn encode_deck_notification(address: &str, deck: i32) -> Result<Vec<u8>> {
    encode_message(address, vec![OscType::Int(deck)])
}

pub fn decode_packet(buf: &[u8]) -> Result<OscPacket> {
    decoder::decode_udp(buf)
        .map(|(_, packet)| packet)
        .map_err(|e| Error::Osc(format!("{:?}", e)))
}

/// All messages in a packet, with bundles flattened in order.
pub fn messages(packet: &OscPacket) -> Vec<&OscMessage> {
    match packet {
        OscPacket::Message(message) => vec![message],
        OscPacket::Bundle(bundle) => bundle.content.iter().flat_map(messages).collect(),
    }
}

/// Interpret an OSC argument as an integer.
///
/// Integers are taken as-is, floats only when integral, strings when they
/// parse after trimming. Everything else is rejected.
pub fn integer_argument(arg: &OscType) -> Option<i64> {
    match arg {
        OscType::Int(value) => Some(i64::from(*value)),
        OscType::Long(value) => Some(*value),
        OscType::Float(value) => integral(f64::from(*value)),
        OscType::Double(value) => integral(*value),
        OscType::String(value) => value.trim().parse().ok(),
        _ => None,
    }
}

fn integral(value: f64) -> Option<i64> {
    (value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64)
        .then_some(value as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosc::{OscBundle, OscTime};
    use std::time::Duration;

    #[test]
    fn test_integer_argument() {
        assert_eq!(integer_argument(&OscType::Int(1)), Some(1));
        assert_eq!(integer_argument(&OscType::Long(3)), Some(3));
        assert_eq!(integer_argument(&OscType::Float(1.0)), Some(1));
        assert_eq!(integer_argument(&OscType::Double(0.0)), Some(0));
        assert_eq!(integer_argument(&OscType::String(" 1 ".into())), Some(1));
        assert_eq!(integer_argument(&OscType::Int(-1)), Some(-1));
    }

    #[test]
    fn test_integer_argument_rejects() {
        assert_eq!(integer_argument(&OscType::Float(1.5)), None);
        assert_eq!(integer_argument(&OscType::Float(f32::NAN)), None);
        assert_eq!(integer_argument(&OscType::Double(f64::INFINITY)), None);
        assert_eq!(integer_argument(&OscType::String("deck".into())), None);
        assert_eq!(integer_argument(&OscType::String("".into())), None);
        assert_eq!(integer_argument(&OscType::Bool(true)), None);
        assert_eq!(integer_argument(&OscType::Nil), None);
    }

    #[test]
    fn test_notification_decodes() {
        let buf = encode_deck_notification("/deck/master", 1).unwrap();
        let packet = decode_packet(&buf).unwrap();
        let messages = messages(&packet);

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].addr, "/deck/master");
        assert_eq!(messages[0].args, vec![OscType::Int(1)]);
    }

    #[test]
    fn test_bundles_are_flattened() {
        let message = |deck| {
            OscPacket::Message(OscMessage {
                addr: "/deck/master".into(),
                args: vec![OscType::Int(deck)],
            })
        };
        let packet = OscPacket::Bundle(OscBundle {
            timetag: OscTime::from((0, 1)),
            content: vec![
                message(0),
                OscPacket::Bundle(OscBundle {
                    timetag: OscTime::from((0, 1)),
                    content: vec![message(1)],
                }),
            ],
        });

        let args: Vec<_> = messages(&packet).iter().map(|m| m.args[0].clone()).collect();
        assert_eq!(args, vec![OscType::Int(0), OscType::Int(1)]);
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(matches!(decode_packet(b"not osc"), Err(Error::Osc(_))));
    }

    #[test]
    fn test_transport_sends_string_message() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        receiver
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let transport = OscTransport::bind(
            "127.0.0.1:0".parse().unwrap(),
            receiver.local_addr().unwrap(),
        )
        .unwrap();

        transport.send("/track/master/artist", "DJ X").unwrap();

        let mut buf = [0u8; 1024];
        let (len, _) = receiver.recv_from(&mut buf).unwrap();
        let packet = decode_packet(&buf[..len]).unwrap();
        let messages = messages(&packet);
        assert_eq!(messages[0].addr, "/track/master/artist");
        assert_eq!(messages[0].args, vec![OscType::String("DJ X".into())]);
    }
}
