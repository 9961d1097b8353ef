//! UDP transport for calibration, frames, and acknowledgements.
//!
//! Encoded frames are split into MTU-sized datagrams so the receiver can
//! reconstruct them from reordered or lossy delivery — and discard an
//! incomplete frame instead of blocking on reassembly. Every datagram is
//! self-describing.
//!
//! ## Wire format (little-endian)
//!
//! **Calibration datagram**: 1 tag byte + bincode body.
//!
//! **Fragment datagram** (14 byte header + payload):
//! ```text
//! tag:            u8   (1)  = FRAME_FRAGMENT
//! frame_id:       i32  (4)
//! timestamp_ms:   f32  (4)
//! channel:        u8   (1)  (0 = color, 1 = depth)
//! fragment_index: u16  (2)
//! fragment_count: u16  (2)
//! payload:        [u8] (variable, ≤ MTU − 14)
//! ```
//!
//! **Ack datagram** (5 bytes, receiver → sender):
//! ```text
//! tag:               u8   (1)
//! receiver_frame_id: i32  (4)
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;

use tokio::net::UdpSocket;

use crate::error::LinkError;
use crate::stream::types::{Calibration, EncodedFrame};

// ── Constants ────────────────────────────────────────────────────

/// Maximum transmission unit minus IP (20) + UDP (8) headers.
const DEFAULT_MTU: usize = 1400;

/// Datagram tag bytes.
pub mod tag {
    /// Calibration message, sent once after the handshake.
    pub const CALIBRATION: u8 = 0;
    /// One fragment of an encoded frame.
    pub const FRAME_FRAGMENT: u8 = 1;
    /// Receiver progress report.
    pub const ACK: u8 = 2;
}

// ── Channel ──────────────────────────────────────────────────────

/// Which payload a fragment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Color = 0,
    Depth = 1,
}

impl Channel {
    fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Channel::Color),
            1 => Some(Channel::Depth),
            _ => None,
        }
    }
}

// ── FragmentHeader ───────────────────────────────────────────────

/// Self-describing per-fragment metadata.
#[derive(Debug, Clone, Copy)]
pub struct FragmentHeader {
    pub frame_id: i32,
    pub timestamp_ms: f32,
    pub channel: Channel,
    pub fragment_index: u16,
    pub fragment_count: u16,
}

impl FragmentHeader {
    /// Encoded size on the wire, including the tag byte.
    pub const SIZE: usize = 14;

    /// Serialize to bytes (little-endian).
    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0] = tag::FRAME_FRAGMENT;
        buf[1..5].copy_from_slice(&self.frame_id.to_le_bytes());
        buf[5..9].copy_from_slice(&self.timestamp_ms.to_le_bytes());
        buf[9] = self.channel as u8;
        buf[10..12].copy_from_slice(&self.fragment_index.to_le_bytes());
        buf[12..14].copy_from_slice(&self.fragment_count.to_le_bytes());
        buf
    }

    /// Deserialize from bytes.
    pub fn decode(data: &[u8]) -> Result<Self, LinkError> {
        if data.len() < Self::SIZE {
            return Err(LinkError::InvalidHeader("fragment header too short"));
        }
        if data[0] != tag::FRAME_FRAGMENT {
            return Err(LinkError::InvalidHeader("not a frame fragment"));
        }
        let channel = Channel::from_byte(data[9])
            .ok_or(LinkError::InvalidHeader("unknown fragment channel"))?;
        Ok(Self {
            frame_id: i32::from_le_bytes(data[1..5].try_into().unwrap()),
            timestamp_ms: f32::from_le_bytes(data[5..9].try_into().unwrap()),
            channel,
            fragment_index: u16::from_le_bytes(data[10..12].try_into().unwrap()),
            fragment_count: u16::from_le_bytes(data[12..14].try_into().unwrap()),
        })
    }
}

// ── Ack ──────────────────────────────────────────────────────────

/// Receiver progress report: the last frame id it reconstructed.
///
/// Most-recent-wins; no sequencing is enforced on these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    /// Message-type tag as received (not validated).
    pub kind: u8,
    /// Last frame id the receiver reconstructed.
    pub receiver_frame_id: i32,
}

impl Ack {
    /// Encoded size on the wire.
    pub const SIZE: usize = 5;

    /// Serialize to bytes (little-endian).
    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0] = self.kind;
        buf[1..5].copy_from_slice(&self.receiver_frame_id.to_le_bytes());
        buf
    }

    /// Parse an ack datagram. Anything under 5 bytes is not an ack.
    pub fn decode(data: &[u8]) -> Option<Self> {
        if data.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            kind: data[0],
            receiver_frame_id: i32::from_le_bytes(data[1..5].try_into().unwrap()),
        })
    }
}

// ── SendOutcome ──────────────────────────────────────────────────

/// Result of a non-blocking frame transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Every fragment left the socket.
    Sent { bytes: usize },
    /// The socket would have blocked; the rest of the frame was
    /// discarded. Stale sensor data is not worth waiting for.
    Dropped,
}

// ── FrameLink ────────────────────────────────────────────────────

/// Sender-side UDP link to a single receiver.
///
/// The peer is learned from the first inbound datagram (the handshake
/// probe); after that, every operation is a non-blocking poll so a
/// stalled receiver can never stall the capture loop.
pub struct FrameLink {
    socket: UdpSocket,
    endpoint: SocketAddr,
    mtu: usize,
}

impl FrameLink {
    /// Perform the session handshake on an already-bound socket.
    ///
    /// Blocks until any datagram arrives; its source address becomes the
    /// session endpoint. A receive error here aborts the session.
    pub async fn handshake(socket: UdpSocket) -> Result<Self, LinkError> {
        let mut probe = [0u8; 8];
        let (_, endpoint) = socket.recv_from(&mut probe).await?;
        Ok(Self {
            socket,
            endpoint,
            mtu: DEFAULT_MTU,
        })
    }

    /// Override the effective MTU (must exceed the fragment header).
    pub fn with_mtu(mut self, mtu: usize) -> Self {
        assert!(mtu > FragmentHeader::SIZE + 1);
        self.mtu = mtu;
        self
    }

    /// The receiver learned during the handshake.
    pub fn endpoint(&self) -> SocketAddr {
        self.endpoint
    }

    /// Send the session calibration. No acknowledgement is expected and
    /// none is awaited; a lost calibration means a failed session the
    /// operator restarts.
    pub async fn send_calibration(&self, calibration: &Calibration) -> Result<(), LinkError> {
        let body = bincode::serialize(calibration)?;
        let mut pkt = Vec::with_capacity(1 + body.len());
        pkt.push(tag::CALIBRATION);
        pkt.extend_from_slice(&body);
        self.socket.send_to(&pkt, self.endpoint).await?;
        Ok(())
    }

    /// Transmit an encoded frame as fragment datagrams, color channel
    /// first, then depth.
    ///
    /// Never blocks: the first would-block drops the remainder of the
    /// frame and reports [`SendOutcome::Dropped`]. There is no retry —
    /// the next frame supersedes this one.
    pub fn send_frame(&self, frame: &EncodedFrame) -> Result<SendOutcome, LinkError> {
        let budget = self.mtu - FragmentHeader::SIZE;
        let mut sent = 0usize;

        for (channel, payload) in [
            (Channel::Color, frame.color.as_ref()),
            (Channel::Depth, frame.depth.as_ref()),
        ] {
            let fragment_count = payload.len().div_ceil(budget).max(1);
            if fragment_count > u16::MAX as usize {
                return Err(LinkError::PayloadTooLarge {
                    size: payload.len(),
                    max: budget * u16::MAX as usize,
                });
            }

            for index in 0..fragment_count {
                let start = index * budget;
                let piece = &payload[start..payload.len().min(start + budget)];

                let header = FragmentHeader {
                    frame_id: frame.frame_id,
                    timestamp_ms: frame.timestamp_ms,
                    channel,
                    fragment_index: index as u16,
                    fragment_count: fragment_count as u16,
                };

                let mut pkt = Vec::with_capacity(FragmentHeader::SIZE + piece.len());
                pkt.extend_from_slice(&header.encode());
                pkt.extend_from_slice(piece);

                match self.socket.try_send_to(&pkt, self.endpoint) {
                    Ok(n) => sent += n,
                    Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        return Ok(SendOutcome::Dropped);
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }

        Ok(SendOutcome::Sent { bytes: sent })
    }

    /// One non-blocking poll for a receiver ack.
    ///
    /// Returns at most one parsed [`Ack`]. Datagrams from any address
    /// other than the handshake-learned endpoint are dropped, as are
    /// malformed or truncated ones — never an error.
    pub fn poll_ack(&self) -> Option<Ack> {
        let mut buf = [0u8; 64];
        match self.socket.try_recv_from(&mut buf) {
            Ok((len, src)) if src == self.endpoint => Ack::decode(&buf[..len]),
            // Foreign source, would-block, or any receive error:
            // nothing ready this iteration.
            _ => None,
        }
    }
}

// ── FragmentAssembler ────────────────────────────────────────────

/// A frame reconstructed from fragments.
#[derive(Debug, Clone)]
pub struct AssembledFrame {
    pub frame_id: i32,
    pub timestamp_ms: f32,
    pub color: Vec<u8>,
    pub depth: Vec<u8>,
}

/// Receiver-side reassembly of fragment datagrams.
///
/// Fragments may arrive reordered, duplicated, or not at all. A frame
/// completes once both channels have every fragment; completing a frame
/// discards all older partial frames instead of waiting for their
/// missing pieces.
#[derive(Default)]
pub struct FragmentAssembler {
    partial: HashMap<i32, PartialFrame>,
}

struct PartialFrame {
    timestamp_ms: f32,
    color: ChannelSlots,
    depth: ChannelSlots,
}

#[derive(Default)]
struct ChannelSlots {
    slots: Vec<Option<Vec<u8>>>,
    received: usize,
}

impl ChannelSlots {
    fn insert(&mut self, header: &FragmentHeader, payload: &[u8]) {
        let count = header.fragment_count as usize;
        if self.slots.is_empty() {
            self.slots = vec![None; count];
        }
        // A count disagreeing with earlier fragments marks a corrupt
        // datagram; drop it.
        if self.slots.len() != count {
            return;
        }
        let index = header.fragment_index as usize;
        if index >= count || self.slots[index].is_some() {
            return;
        }
        self.slots[index] = Some(payload.to_vec());
        self.received += 1;
    }

    fn is_complete(&self) -> bool {
        !self.slots.is_empty() && self.received == self.slots.len()
    }

    fn into_payload(self) -> Vec<u8> {
        let mut out = Vec::new();
        for slot in self.slots.into_iter().flatten() {
            out.extend_from_slice(&slot);
        }
        out
    }
}

impl FragmentAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one fragment datagram.
    ///
    /// Returns the assembled frame when this fragment completes one;
    /// non-fragment or malformed datagrams are ignored.
    pub fn insert(&mut self, datagram: &[u8]) -> Option<AssembledFrame> {
        let header = FragmentHeader::decode(datagram).ok()?;
        let payload = &datagram[FragmentHeader::SIZE..];

        let partial = self
            .partial
            .entry(header.frame_id)
            .or_insert_with(|| PartialFrame {
                timestamp_ms: header.timestamp_ms,
                color: ChannelSlots::default(),
                depth: ChannelSlots::default(),
            });

        match header.channel {
            Channel::Color => partial.color.insert(&header, payload),
            Channel::Depth => partial.depth.insert(&header, payload),
        }

        if !(partial.color.is_complete() && partial.depth.is_complete()) {
            return None;
        }

        let complete = self.partial.remove(&header.frame_id)?;
        // Older incomplete frames are now superseded.
        self.partial.retain(|&id, _| id > header.frame_id);

        Some(AssembledFrame {
            frame_id: header.frame_id,
            timestamp_ms: complete.timestamp_ms,
            color: complete.color.into_payload(),
            depth: complete.depth.into_payload(),
        })
    }

    /// Number of frames currently awaiting fragments.
    pub fn pending(&self) -> usize {
        self.partial.len()
    }
}

/// Parse a calibration datagram.
pub fn decode_calibration(datagram: &[u8]) -> Result<Calibration, LinkError> {
    if datagram.is_empty() || datagram[0] != tag::CALIBRATION {
        return Err(LinkError::InvalidHeader("not a calibration datagram"));
    }
    Ok(bincode::deserialize(&datagram[1..])?)
}

// ── Tests ────────────────────────────────────────────────────────
