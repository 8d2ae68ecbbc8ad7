//! Input device enumeration and ranking.
//!
//! Purely advisory: scores the available devices and picks the most
//! promising one, but never opens a stream itself.

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Device, Host};
use tracing::{debug, info, warn};

/// Sample rates probed against every device, in preference order.
pub const CANDIDATE_RATES: [u32; 4] = [44100, 48000, 16000, 8000];

/// Rate assumed when selection fails and the OS default device is used.
pub const DEFAULT_ASSUMED_RATE: u32 = 44100;

/// Snapshot of one input device taken during enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub index: usize,
    pub name: String,
    pub priority: u8,
    pub default_sample_rate: u32,
    pub supported_rates: Vec<u32>,
    pub channels: u16,
}

impl DeviceDescriptor {
    pub fn supports(&self, rate: u32) -> bool {
        self.supported_rates.contains(&rate)
    }

    /// The rate capture should try first: 44.1 kHz when available, then
    /// 48 kHz, then whatever the device accepted.
    pub fn preferred_rate(&self) -> u32 {
        if self.supports(44100) {
            44100
        } else if self.supports(48000) {
            48000
        } else {
            self.supported_rates
                .first()
                .copied()
                .unwrap_or(DEFAULT_ASSUMED_RATE)
        }
    }
}

/// Name-keyword priority: brand > microphone > headset > anything else.
pub fn name_priority(name: &str) -> u8 {
    let name = name.to_lowercase();
    if name.contains("logitech") || name.contains("logitec") {
        3
    } else if name.contains("microphone") || name.contains("mic") {
        2
    } else if name.contains("headset") || name.contains("headphone") {
        1
    } else {
        0
    }
}

/// Orders candidates by priority, then 44.1 kHz support, then how many
/// candidate rates the device accepts. The order is total: ties beyond the
/// third key keep enumeration order.
pub fn rank_devices(mut devices: Vec<DeviceDescriptor>) -> Vec<DeviceDescriptor> {
    devices.sort_by_key(|d| {
        std::cmp::Reverse((d.priority, d.supports(44100), d.supported_rates.len()))
    });
    devices
}

/// Enumerates input devices and returns the best candidate. Devices that
/// fail their probe are skipped; total failure returns `None` and the
/// caller falls back to the OS default device.
pub fn select_best_device(host: &Host) -> Option<(Device, DeviceDescriptor)> {
    let devices: Vec<Device> = match host.input_devices() {
        Ok(devices) => devices.collect(),
        Err(e) => {
            warn!(error = %e, "failed to enumerate input devices");
            return None;
        }
    };

    let candidates: Vec<DeviceDescriptor> = devices
        .iter()
        .enumerate()
        .filter_map(|(index, device)| probe_device(index, device))
        .collect();

    if candidates.is_empty() {
        warn!("no compatible input device found, falling back to the OS default");
        return None;
    }

    let ranked = rank_devices(candidates);
    for descriptor in ranked.iter().take(5) {
        info!(
            index = descriptor.index,
            name = %descriptor.name,
            priority = descriptor.priority,
            default_rate = descriptor.default_sample_rate,
            rates = ?descriptor.supported_rates,
            channels = descriptor.channels,
            "input device candidate"
        );
    }

    let best = ranked.into_iter().next()?;
    info!(name = %best.name, rate = best.preferred_rate(), "selected input device");

    let device = devices.into_iter().nth(best.index)?;
    Some((device, best))
}

/// Builds a descriptor for one device, or `None` when the device cannot be
/// queried or accepts none of the candidate rates.
fn probe_device(index: usize, device: &Device) -> Option<DeviceDescriptor> {
    let name = device.name().ok()?;

    let ranges: Vec<_> = match device.supported_input_configs() {
        Ok(configs) => configs.collect(),
        Err(e) => {
            debug!(index, name = %name, error = %e, "skipping unqueryable device");
            return None;
        }
    };
    if ranges.is_empty() {
        return None;
    }

    let supported_rates: Vec<u32> = CANDIDATE_RATES
        .iter()
        .copied()
        .filter(|&rate| {
            ranges
                .iter()
                .any(|r| r.min_sample_rate().0 <= rate && rate <= r.max_sample_rate().0)
        })
        .collect();
    if supported_rates.is_empty() {
        debug!(index, name = %name, "device supports none of the candidate rates");
        return None;
    }

    let default_sample_rate = device
        .default_input_config()
        .map(|c| c.sample_rate().0)
        .unwrap_or(DEFAULT_ASSUMED_RATE);
    let channels = ranges.iter().map(|r| r.channels()).max().unwrap_or(1);

    Some(DeviceDescriptor {
        index,
        priority: name_priority(&name),
        name,
        default_sample_rate,
        supported_rates,
        channels,
    })
}
