//! RTP-over-UDP reference transport.

use super::Transport;
use crate::{constants::FRAME_SIZE, error::SendResult};
use discortp::{
    rtp::{MutableRtpPacket, RtpType},
    MutablePacket,
};
use rand::random;
use std::net::UdpSocket;

/// The one (and only) RTP version.
const RTP_VERSION: u8 = 2;

/// Fixed 12-byte RTP header (no CSRCs) plus one G.711 frame.
const RTP_PACKET_LEN: usize = 12 + FRAME_SIZE;

/// [`Transport`] which stamps RTP v2 headers onto frames and emits them
/// over a connected UDP socket.
///
/// The transport owns the SSRC and the sequence counter; the engine owns
/// the timestamp clock. The sequence advances on every *successful* send,
/// matching the engine's timestamp behaviour, so the peer never sees
/// sequence gaps it must conceal.
pub struct UdpRtpTransport {
    socket: UdpSocket,
    packet: [u8; RTP_PACKET_LEN],
}

impl UdpRtpTransport {
    /// Creates a transport over an already-connected socket, with a
    /// random SSRC and sequence start.
    #[must_use]
    pub fn new(socket: UdpSocket) -> Self {
        Self::with_ssrc(socket, random::<u32>())
    }

    /// Creates a transport with a caller-chosen SSRC (e.g., to keep the
    /// stream identity stable across a re-INVITE).
    #[must_use]
    pub fn with_ssrc(socket: UdpSocket, ssrc: u32) -> Self {
        let mut packet = [0u8; RTP_PACKET_LEN];

        let mut rtp = MutableRtpPacket::new(&mut packet[..]).expect(
            "FATAL: Too few bytes in self.packet for RTP header.\
                (Blame: RTP_PACKET_LEN?)",
        );
        rtp.set_version(RTP_VERSION);
        rtp.set_ssrc(ssrc);
        rtp.set_sequence(random::<u16>().into());

        Self { socket, packet }
    }
}

impl Transport for UdpRtpTransport {
    fn send_frame(
        &mut self,
        payload: &[u8; FRAME_SIZE],
        timestamp: u32,
        payload_type: u8,
    ) -> SendResult {
        {
            let mut rtp = MutableRtpPacket::new(&mut self.packet[..]).expect(
                "FATAL: Too few bytes in self.packet for RTP header.\
                    (Blame: RTP_PACKET_LEN?)",
            );
            rtp.set_payload_type(match payload_type {
                0 => RtpType::Pcmu,
                8 => RtpType::Pcma,
                other => RtpType::Dynamic(other),
            });
            rtp.set_timestamp(timestamp.into());
            rtp.payload_mut()[..FRAME_SIZE].copy_from_slice(&payload[..]);
        }

        self.socket.send(&self.packet[..])?;

        let mut rtp = MutableRtpPacket::new(&mut self.packet[..]).expect(
            "FATAL: Too few bytes in self.packet for RTP header.\
                (Blame: RTP_PACKET_LEN?)",
        );
        rtp.set_sequence(rtp.get_sequence() + 1);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use discortp::{rtp::RtpPacket, Packet};

    fn socket_pair() -> (UdpSocket, UdpSocket) {
        let rx = UdpSocket::bind("127.0.0.1:0").expect("Failed to create receive port.");
        let tx = UdpSocket::bind("127.0.0.1:0").expect("Failed to create send port.");
        tx.connect(rx.local_addr().unwrap())
            .expect("Failed to connect to local dest port.");

        (tx, rx)
    }

    #[test]
    fn frames_arrive_with_rtp_headers() {
        let (tx, rx) = socket_pair();
        let mut transport = UdpRtpTransport::with_ssrc(tx, 0xDEAD_BEEF);

        let payload = [0x42u8; FRAME_SIZE];
        transport.send_frame(&payload, 10_000, 0).unwrap();
        transport.send_frame(&payload, 10_160, 0).unwrap();

        let mut buf = [0u8; 2 * RTP_PACKET_LEN];
        let mut seqs = Vec::new();
        for _ in 0..2 {
            let n = rx.recv(&mut buf).unwrap();
            assert_eq!(n, RTP_PACKET_LEN);

            let rtp = RtpPacket::new(&buf[..n]).unwrap();
            assert_eq!(rtp.get_version(), RTP_VERSION);
            assert_eq!(rtp.get_payload_type(), RtpType::Pcmu);
            assert_eq!(rtp.get_ssrc(), 0xDEAD_BEEF);
            assert_eq!(rtp.payload(), &payload[..]);

            seqs.push(rtp.get_sequence());
        }

        assert_eq!(seqs[1], seqs[0] + 1);
    }

    #[test]
    fn pcma_sessions_use_payload_type_eight() {
        let (tx, rx) = socket_pair();
        let mut transport = UdpRtpTransport::new(tx);

        transport.send_frame(&[0xD5u8; FRAME_SIZE], 0, 8).unwrap();

        let mut buf = [0u8; 2 * RTP_PACKET_LEN];
        let n = rx.recv(&mut buf).unwrap();
        let rtp = RtpPacket::new(&buf[..n]).unwrap();
        assert_eq!(rtp.get_payload_type(), RtpType::Pcma);
    }
}
