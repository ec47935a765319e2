//! Voice Client Application
//!
//! Streams the microphone to a voice peer over WebSocket and plays the peer's
//! audio on the speaker until Ctrl-C or the session ends.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pcm_voice_bridge::{
    audio::device::{list_devices, CpalInput, CpalOutput},
    config::AppConfig,
    network::{InboundEvent, WebSocketTransport},
    session::{SessionEvent, SessionState, StreamSession},
};

#[derive(Parser, Debug)]
#[command(name = "voice_client", about = "Bidirectional PCM voice streaming client")]
struct Args {
    /// Session identifier issued by the peer
    #[arg(required_unless_present = "list_devices")]
    session_id: Option<String>,

    /// Override the transport URL template (must contain {session_id})
    #[arg(long)]
    url: Option<String>,

    /// Config file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print available audio devices and exit
    #[arg(long)]
    list_devices: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    if args.list_devices {
        print_devices();
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::load_or_default()?,
    };
    if let Some(url) = args.url {
        config.transport.url = url;
    }
    config.validate()?;

    let session_id = args.session_id.unwrap_or_default();
    tracing::info!("Starting voice client for session {}", session_id);

    let input = CpalInput::open(config.capture.device.as_deref())?;
    let output = CpalOutput::open(config.playback.device.as_deref())?;
    tracing::info!("Input: {} / Output: {}", input.name(), output.name());

    let (mut session, events) = StreamSession::new(
        input,
        output,
        config.capture.clone(),
        config.playback.clone(),
    );
    session.start(&session_id)?;

    let url = config.transport.url_for(&session_id);
    let mut inbound = match WebSocketTransport::connect(&url).await {
        Ok((transport, inbound)) => {
            session.on_transport_open(Arc::new(transport))?;
            inbound
        }
        Err(e) => {
            session.on_transport_failed(e.clone());
            return Err(e.into());
        }
    };

    let mut ticker = tokio::time::interval(Duration::from_millis(100));
    let mut speaking = false;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down...");
                break;
            }
            event = inbound.recv() => match event {
                Some(InboundEvent::Text(text)) => session.on_transport_message(&text),
                Some(InboundEvent::Closed(reason)) => session.on_transport_closed(reason),
                Some(InboundEvent::Failed(e)) => session.on_transport_failed(e),
                None => session.on_transport_closed(None),
            },
            _ = ticker.tick() => session.poll_devices(),
        }

        for event in events.try_iter() {
            match event {
                SessionEvent::StateChanged(state) => tracing::info!("Session {}", state),
                SessionEvent::TurnComplete => tracing::debug!("Turn complete"),
                SessionEvent::Terminated(e) => tracing::error!("Session ended: {}", e),
                // Already logged where it was raised
                SessionEvent::Warning { .. } => {}
            }
        }

        if session.state() == SessionState::Stopped {
            break;
        }

        let now_speaking = session.is_speaking();
        if now_speaking != speaking {
            speaking = now_speaking;
            tracing::info!("{}", if speaking { "Speaking..." } else { "Listening..." });
        }
    }

    session.stop();
    if let Some(stats) = session.capture_stats() {
        tracing::info!("Capture: {:?}", stats);
    }
    if let Some(stats) = session.scheduler_stats() {
        tracing::info!("Playback: {:?}", stats);
    }

    Ok(())
}

fn print_devices() {
    println!("\n=== Available Audio Devices ===");
    for device in list_devices() {
        let device_type = match (device.is_input, device.is_output) {
            (true, true) => "Input/Output",
            (true, false) => "Input",
            (false, true) => "Output",
            _ => "Unknown",
        };
        let default_marker = if device.is_default { " [DEFAULT]" } else { "" };
        println!("  {} ({}){}:", device.name, device_type, default_marker);
        println!("    Sample rates: {:?}", device.sample_rates);
        println!("    Channels: {:?}", device.channels);
    }
    println!();
}
