//! AudioBlock → WireFrame conversion: resampling, gain, byte encoding.
//!
//! Everything here is a pure function of its inputs so the capture callback
//! can run it synchronously without touching shared state.

use std::f64::consts::PI;

/// Sample rate the speech service expects.
pub const TARGET_SAMPLE_RATE: u32 = 8000;

/// Light volume boost applied to every sample.
const GAIN: f64 = 1.1;

/// Half-width of the sinc kernel, in input samples per side.
const KERNEL_HALF_WIDTH: isize = 16;

/// One capture callback's worth of mono 16-bit samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBlock {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

impl AudioBlock {
    /// Interprets raw little-endian 16-bit PCM bytes. A trailing odd byte
    /// is discarded.
    pub fn from_le_bytes(bytes: &[u8], sample_rate: u32) -> Self {
        let samples = bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();

        Self { samples, sample_rate }
    }
}

/// Resampled, gain-adjusted payload ready for emission: 16-bit LE PCM,
/// mono, at the target rate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireFrame {
    pub bytes: Vec<u8>,
}

impl WireFrame {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Converts a captured block into the wire format: resample to
/// `target_rate`, apply the fixed gain with saturation, encode as
/// little-endian bytes. An empty block yields an empty frame.
pub fn transform(block: &AudioBlock, target_rate: u32) -> WireFrame {
    let resampled = if block.sample_rate == target_rate {
        block.samples.clone()
    } else {
        resample(&block.samples, block.sample_rate, target_rate)
    };

    let bytes = resampled
        .iter()
        .map(|&s| apply_gain(s))
        .flat_map(i16::to_le_bytes)
        .collect();

    WireFrame { bytes }
}

/// Saturating 1.1x boost; never wraps.
fn apply_gain(sample: i16) -> i16 {
    (sample as f64 * GAIN)
        .round()
        .clamp(i16::MIN as f64, i16::MAX as f64) as i16
}

/// Windowed-sinc resampling to exactly `round(len * target / source)`
/// output samples. The kernel cutoff shrinks to the target Nyquist when
/// downsampling, which is what anti-aliases the 44.1/48 kHz capture down
/// to 8 kHz.
fn resample(input: &[i16], source_rate: u32, target_rate: u32) -> Vec<i16> {
    if input.is_empty() {
        return Vec::new();
    }

    let ratio = target_rate as f64 / source_rate as f64;
    let output_len = (input.len() as f64 * ratio).round() as usize;
    let cutoff = ratio.min(1.0);

    let mut output = Vec::with_capacity(output_len);
    for i in 0..output_len {
        let center = i as f64 / ratio;
        let base = center.floor() as isize;

        let mut acc = 0.0;
        for j in (base - KERNEL_HALF_WIDTH)..=(base + KERNEL_HALF_WIDTH + 1) {
            if j < 0 || j >= input.len() as isize {
                continue;
            }
            let offset = center - j as f64;
            acc += input[j as usize] as f64 * cutoff * sinc(offset * cutoff) * hann(offset);
        }

        output.push(acc.round().clamp(i16::MIN as f64, i16::MAX as f64) as i16);
    }

    output
}

fn sinc(x: f64) -> f64 {
    if x.abs() < 1e-12 {
        1.0
    } else {
        (PI * x).sin() / (PI * x)
    }
}

/// Hann window over the kernel support; zero outside it.
fn hann(offset: f64) -> f64 {
    let half = KERNEL_HALF_WIDTH as f64 + 1.0;
    if offset.abs() >= half {
        0.0
    } else {
        0.5 * (1.0 + (PI * offset / half).cos())
    }
}
