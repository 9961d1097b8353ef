//! depthlink audio relay — entry point.
//!
//! No CLI: the sender is expected at the fixed loopback endpoint
//! 127.0.0.1:7777. The relay sends one bootstrap datagram so the sender
//! learns where to stream, then drains microphone datagrams into the
//! playback ring until the process is killed.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::UdpSocket;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use depthlink_core::audio::{AudioFormat, AudioRelay, RingBuffer, output_device_names, playback};

/// Playback latency budget.
const MICROPHONE_LATENCY: Duration = Duration::from_millis(200);

/// Where the microphone sender listens.
const SENDER_ADDR: &str = "127.0.0.1:7777";

/// Pause between empty drain iterations. Keeps the relay off a full
/// core spin without adding meaningful latency against the 200 ms
/// budget.
const IDLE_BACKOFF: Duration = Duration::from_millis(1);

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    for (i, name) in output_device_names()?.iter().enumerate() {
        println!("output_device[{i}]: {name}");
    }

    let format = AudioFormat::default();
    let (producer, consumer) = RingBuffer::for_latency(
        MICROPHONE_LATENCY,
        format.sample_rate,
        format.bytes_per_sample(),
        format.channels as usize,
    );

    // The stream's callback thread is the ring's only consumer; it
    // must outlive the relay loop.
    let _stream = playback::start(consumer, format)?;

    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    let sender: SocketAddr = SENDER_ADDR.parse()?;
    let mut relay = AudioRelay::new(socket, producer);
    relay.probe(sender).await?;
    info!("relaying audio from {sender}");

    loop {
        let absorbed = relay.drain();
        if absorbed > 0 {
            debug!(
                "absorbed {absorbed} bytes (fill: {}, free: {})",
                relay.fill_count(),
                relay.free_count(),
            );
        } else {
            tokio::time::sleep(IDLE_BACKOFF).await;
        }
    }
}
