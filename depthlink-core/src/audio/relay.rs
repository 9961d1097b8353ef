//! Drains inbound audio datagrams into the ring buffer.
//!
//! The relay is the ring's single producer: each iteration it pulls
//! every pending datagram off the socket (non-blocking) and copies the
//! payload into the ring. Datagrams that do not fit are truncated by
//! the ring's saturating write; datagrams left unread stay queued in
//! the kernel's receive buffer, and if that overflows the excess is
//! silently lost — the loss-tolerant design absorbs it.

use std::net::SocketAddr;

use tokio::net::UdpSocket;

use crate::audio::ring::RingProducer;
use crate::error::LinkError;

/// Largest datagram one transport unit carries.
pub const MAX_DATAGRAM: usize = 1500;

/// Network-side producer feeding the playback ring.
pub struct AudioRelay {
    socket: UdpSocket,
    producer: RingProducer,
    scratch: Box<[u8; MAX_DATAGRAM]>,
}

impl AudioRelay {
    /// Wrap an already-bound socket and the ring's producer half.
    pub fn new(socket: UdpSocket, producer: RingProducer) -> Self {
        Self {
            socket,
            producer,
            scratch: Box::new([0u8; MAX_DATAGRAM]),
        }
    }

    /// Send the one-byte bootstrap datagram that tells the sender where
    /// to stream.
    pub async fn probe(&self, sender: SocketAddr) -> Result<(), LinkError> {
        self.socket.send_to(&[0u8], sender).await?;
        Ok(())
    }

    /// Drain pending datagrams into the ring.
    ///
    /// Stops when nothing is pending, when the ring is full, or on any
    /// receive error — none of which are fatal. Returns the number of
    /// bytes absorbed this iteration.
    pub fn drain(&mut self) -> usize {
        let mut absorbed = 0usize;
        loop {
            if self.producer.free_count() == 0 {
                break;
            }
            match self.socket.try_recv_from(&mut self.scratch[..]) {
                Ok((len, _)) => {
                    absorbed += self.producer.write(&self.scratch[..len]);
                }
                // WouldBlock or any receive error ends this
                // iteration's drain.
                Err(_) => break,
            }
        }
        absorbed
    }

    /// Bytes currently buffered for playback.
    pub fn fill_count(&self) -> usize {
        self.producer.fill_count()
    }

    /// Bytes of headroom left in the ring.
    pub fn free_count(&self) -> usize {
        self.producer.free_count()
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::ring::RingBuffer;
    use std::time::Duration;

    async fn relay_pair(capacity: usize) -> (AudioRelay, UdpSocket) {
        let relay_sock = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let relay_addr = relay_sock.local_addr().unwrap();
        let feeder = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        feeder.connect(relay_addr).await.unwrap();

        let (producer, _consumer) = RingBuffer::with_capacity(capacity);
        (AudioRelay::new(relay_sock, producer), feeder)
    }

    #[tokio::test]
    async fn burst_is_absorbed_exactly() {
        let (mut relay, feeder) = relay_pair(8192).await;

        const K: usize = 5;
        const S: usize = 640;
        for _ in 0..K {
            feeder.send(&[7u8; S]).await.unwrap();
        }
        tokio::time::sleep(Duration::from_millis(100)).await;

        let before = relay.fill_count();
        let absorbed = relay.drain();
        assert_eq!(absorbed, K * S);
        assert_eq!(relay.fill_count(), before + K * S);
    }

    #[tokio::test]
    async fn burst_beyond_free_space_saturates() {
        let (mut relay, feeder) = relay_pair(1000).await;

        // 3 × 640 = 1920 bytes offered, only 1000 fit.
        for _ in 0..3 {
            feeder.send(&[9u8; 640]).await.unwrap();
        }
        tokio::time::sleep(Duration::from_millis(100)).await;

        relay.drain();
        assert_eq!(relay.fill_count(), 1000);
        assert_eq!(relay.free_count(), 0);
    }

    #[tokio::test]
    async fn drain_with_nothing_pending_returns_zero() {
        let (mut relay, _feeder) = relay_pair(1000).await;
        assert_eq!(relay.drain(), 0);
    }

    #[tokio::test]
    async fn probe_reaches_the_sender() {
        let sender_sock = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let sender_addr = sender_sock.local_addr().unwrap();

        let relay_sock = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let relay_addr = relay_sock.local_addr().unwrap();
        let (producer, _consumer) = RingBuffer::with_capacity(64);
        let relay = AudioRelay::new(relay_sock, producer);

        relay.probe(sender_addr).await.unwrap();

        let mut buf = [0u8; 8];
        let (len, src) = sender_sock.recv_from(&mut buf).await.unwrap();
        assert_eq!(len, 1);
        assert_eq!(src, relay_addr);
    }
}
