//! Run lifecycle: connect, settle, capture, wait, ordered shutdown.

use anyhow::{bail, Context, Result};
use cpal::traits::HostTrait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, sleep};
use tracing::{info, warn};

use super::state::{ConnectionState, SessionState};
use crate::audio::{device, CaptureDriver};
use crate::config::Config;
use crate::output::Presenter;
use crate::platform::PlatformTuning;
use crate::transport::TransportSession;

pub struct SessionOrchestrator {
    config: Config,
    state: Arc<SessionState>,
}

impl SessionOrchestrator {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: Arc::new(SessionState::new()),
        }
    }

    pub fn state(&self) -> Arc<SessionState> {
        self.state.clone()
    }

    /// Drives one complete run. Startup failures (connect, device, stream
    /// open) are fatal and propagate after the shutdown sequence; once
    /// streaming, the run ends on a termination signal or when the
    /// liveness poll sees the connection or capture die.
    pub async fn run(self) -> Result<()> {
        let tuning = PlatformTuning::detect(self.config.streaming.chunk_size);
        info!(
            frames_per_buffer = tuning.frames_per_buffer,
            sigterm = tuning.sigterm_supported,
            "platform tuning resolved"
        );

        let presenter = Arc::new(Presenter::stdout());
        let session = TransportSession::connect(&self.config, self.state.clone(), presenter)
            .await
            .context("initial connect failed")?;

        // Let the connection settle before opening the microphone. A silent
        // drop during this window means the server rejected us (bad API key
        // or recognition options), so capturing would be pointless.
        sleep(Duration::from_millis(self.config.streaming.settle_delay_ms)).await;
        if self.state.connection() != ConnectionState::Connected {
            session.shutdown().await;
            bail!("connection lost right after connecting; check the API key and recognition options");
        }

        let host = cpal::default_host();
        let (input_device, preferred_rate) = match device::select_best_device(&host) {
            Some((input_device, descriptor)) => {
                let rate = descriptor.preferred_rate();
                (input_device, rate)
            }
            None => match host.default_input_device() {
                Some(input_device) => {
                    info!(
                        rate = device::DEFAULT_ASSUMED_RATE,
                        "using OS default input device"
                    );
                    (input_device, device::DEFAULT_ASSUMED_RATE)
                }
                None => {
                    session.shutdown().await;
                    bail!("no audio input device available");
                }
            },
        };

        let mut capture = match CaptureDriver::open(
            &input_device,
            preferred_rate,
            &tuning,
            self.state.clone(),
            session.frame_sender(),
        ) {
            Ok(capture) => capture,
            Err(e) => {
                session.shutdown().await;
                return Err(e).context("failed to open microphone stream");
            }
        };

        if let Err(e) = capture.start() {
            capture.stop();
            session.shutdown().await;
            return Err(e).context("failed to start capture");
        }

        info!(
            source_rate = capture.active_rate(),
            "streaming microphone audio; press ctrl-c to stop"
        );
        self.wait_for_shutdown(&tuning).await;

        // Shutdown sequence, strictly in this order: stop capture, flush
        // streamEnd, disconnect. Each step is best-effort.
        capture.stop();
        session.shutdown().await;

        info!("session terminated");
        Ok(())
    }

    /// Returns when a termination signal arrives or the liveness poll sees
    /// the connection or recording flag go false, whichever happens first.
    async fn wait_for_shutdown(&self, tuning: &PlatformTuning) {
        let signal = wait_for_signal(tuning.sigterm_supported);
        tokio::pin!(signal);

        let mut tick = interval(Duration::from_millis(self.config.streaming.liveness_poll_ms));
        tick.tick().await; // the first tick completes immediately

        loop {
            tokio::select! {
                _ = &mut signal => {
                    info!("termination signal received, shutting down");
                    return;
                }
                _ = tick.tick() => {
                    if !self.state.is_live() {
                        warn!("connection or capture no longer live, shutting down");
                        return;
                    }
                }
            }
        }
    }
}

/// Completes on the interrupt signal, or on SIGTERM where the platform
/// supports it.
async fn wait_for_signal(sigterm_supported: bool) {
    #[cfg(unix)]
    {
        if sigterm_supported {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => {}
                        _ = sigterm.recv() => {}
                    }
                    return;
                }
                Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
            }
        }
    }

    #[cfg(not(unix))]
    let _ = sigterm_supported;

    if tokio::signal::ctrl_c().await.is_err() {
        warn!("failed to listen for the interrupt signal");
    }
}
