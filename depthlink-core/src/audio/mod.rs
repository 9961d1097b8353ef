//! # depthlink audio — microphone companion feed
//!
//! Receives the sender's microphone datagrams and plays them on the
//! local output device. Arrival is bursty and lossy; playback is a
//! steady callback-driven pull. The [`ring::RingBuffer`] absorbs the
//! mismatch:
//!
//! ```text
//! UDP datagrams ──► AudioRelay ──► RingProducer ─┐
//!                                                │  lock-free SPSC
//!                  device callback ◄── RingConsumer ◄┘
//! ```
//!
//! Only the network side advances the write cursor and only the
//! playback side advances the read cursor; the handle split makes any
//! other arrangement unrepresentable.

pub mod playback;
pub mod relay;
pub mod ring;

// ── Re-exports ───────────────────────────────────────────────────

pub use playback::{AudioFormat, PlaybackStream, output_device_names};
pub use relay::{AudioRelay, MAX_DATAGRAM};
pub use ring::{RingBuffer, RingConsumer, RingProducer};
