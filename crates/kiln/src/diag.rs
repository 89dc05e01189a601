//! Diagnostics sender: ships frame metrics to `kiln-telemetry` over UDP.
//!
//! Enabled by the `diagnostics` feature and `diagnostics.enabled` in the
//! config. Once per frame the app calls [`DiagSender::maybe_send`], which is
//! throttled to `rate_hz` and sends one JSON [`DiagSnapshot`] datagram to
//! `diagnostics.address` (default `127.0.0.1:9100`). Nothing listening is
//! fine: UDP sends are fire-and-forget.

use std::net::UdpSocket;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::asset::ReloadEvent;
use crate::config::DiagnosticsConfig;
use crate::render::frame::FrameStats;
use crate::scene::Scene;
use crate::time::Time;

/// Largest datagram we send. Reload events are dropped first to fit.
const MAX_DATAGRAM: usize = 60_000;

// ── Wire format ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagSnapshot {
    pub fps: f32,
    pub frame_ms: f32,
    pub frame_count: u64,
    pub elapsed_secs: f32,
    pub entities: usize,
    pub lights: usize,
    pub emitters: usize,
    pub living_particles: usize,
    pub particle_capacity: usize,
    pub passes: Vec<PassSnapshot>,
    pub total_draw_calls: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reloads: Vec<ReloadEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassSnapshot {
    pub name: String,
    pub draw_calls: u32,
}

impl DiagSnapshot {
    pub fn collect(time: &Time, scene: &Scene, stats: &FrameStats, reloads: Vec<ReloadEvent>) -> Self {
        let rate = time.frame_rate();
        Self {
            fps: rate.map_or(0.0, |r| r.fps),
            frame_ms: rate.map_or(time.delta_secs() * 1000.0, |r| r.frame_ms),
            frame_count: time.frame_count(),
            elapsed_secs: time.elapsed_secs(),
            entities: scene.entities.len(),
            lights: scene.lights.len(),
            emitters: scene.emitters.len(),
            living_particles: scene.living_particles(),
            particle_capacity: scene.emitters.iter().map(|e| e.max_particles()).sum(),
            passes: stats
                .passes
                .iter()
                .map(|(pass, draws)| PassSnapshot {
                    name: pass.name().to_string(),
                    draw_calls: *draws,
                })
                .collect(),
            total_draw_calls: stats.total_draw_calls(),
            reloads,
        }
    }

    /// JSON bytes, trimming reload events if the datagram would be too big.
    pub fn to_datagram(mut self) -> Option<Vec<u8>> {
        loop {
            let bytes = serde_json::to_vec(&self).ok()?;
            if bytes.len() <= MAX_DATAGRAM || self.reloads.is_empty() {
                return Some(bytes);
            }
            self.reloads.remove(0);
        }
    }
}

// ── Sender ──────────────────────────────────────────────────────────────

/// Fixed-rate gate: opens at most once per interval.
#[derive(Debug, Clone, Copy)]
pub struct Throttle {
    interval: Duration,
    last: Option<Instant>,
}

impl Throttle {
    pub fn new(rate_hz: f32) -> Self {
        let rate = if rate_hz.is_finite() && rate_hz > 0.0 { rate_hz } else { 10.0 };
        Self {
            interval: Duration::from_secs_f32(1.0 / rate),
            last: None,
        }
    }

    pub fn ready(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

pub struct DiagSender {
    socket: UdpSocket,
    throttle: Throttle,
    /// Reload events waiting for the next snapshot.
    pending_reloads: Vec<ReloadEvent>,
}

impl DiagSender {
    /// Bind an ephemeral local port aimed at the telemetry address. Returns
    /// `None` (logged) when disabled or the socket can't be set up.
    pub fn new(config: &DiagnosticsConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        let socket = match bind(&config.address) {
            Ok(socket) => socket,
            Err(e) => {
                log::warn!("Diagnostics disabled, cannot reach {}: {e}", config.address);
                return None;
            }
        };
        log::info!("Sending diagnostics to {} at {} Hz", config.address, config.rate_hz);
        Some(Self {
            socket,
            throttle: Throttle::new(config.rate_hz),
            pending_reloads: Vec::new(),
        })
    }

    pub fn queue_reloads(&mut self, events: Vec<ReloadEvent>) {
        self.pending_reloads.extend(events);
    }

    /// Send a snapshot if the throttle allows.
    pub fn maybe_send(&mut self, time: &Time, scene: &Scene, stats: &FrameStats) {
        if !self.throttle.ready(Instant::now()) {
            return;
        }
        let reloads = std::mem::take(&mut self.pending_reloads);
        let Some(bytes) = DiagSnapshot::collect(time, scene, stats, reloads).to_datagram() else {
            return;
        };
        // Connection refused just means no viewer is running.
        if let Err(e) = self.socket.send(&bytes)
            && e.kind() != std::io::ErrorKind::ConnectionRefused
            && e.kind() != std::io::ErrorKind::WouldBlock
        {
            log::debug!("Diagnostics send failed: {e}");
        }
    }
}

fn bind(address: &str) -> std::io::Result<UdpSocket> {
    let socket = UdpSocket::bind("127.0.0.1:0")?;
    socket.connect(address)?;
    socket.set_nonblocking(true)?;
    Ok(socket)
}
