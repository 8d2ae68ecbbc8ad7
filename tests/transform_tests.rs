// Tests for the block transformation: resampling, gain, byte encoding.

use verbum_live::audio::{transform, AudioBlock, TARGET_SAMPLE_RATE};

fn block(samples: Vec<i16>, sample_rate: u32) -> AudioBlock {
    AudioBlock { samples, sample_rate }
}

fn decode(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

#[test]
fn empty_block_yields_empty_frame() {
    let frame = transform(&block(vec![], 44100), TARGET_SAMPLE_RATE);
    assert!(frame.is_empty());

    let frame = transform(&block(vec![], TARGET_SAMPLE_RATE), TARGET_SAMPLE_RATE);
    assert!(frame.is_empty());
}

#[test]
fn rate_equal_input_is_gain_only() {
    let frame = transform(&block(vec![1000, -1000, 0, 500], 8000), 8000);
    assert_eq!(decode(&frame.bytes), vec![1100, -1100, 0, 550]);
}

#[test]
fn gain_saturates_at_i16_range() {
    let frame = transform(&block(vec![i16::MAX, i16::MIN, 30000, -30000], 8000), 8000);
    let samples = decode(&frame.bytes);
    assert_eq!(samples[0], i16::MAX);
    assert_eq!(samples[1], i16::MIN);
    // 30000 * 1.1 = 33000, past the positive bound
    assert_eq!(samples[2], i16::MAX);
    assert_eq!(samples[3], i16::MIN);
}

#[test]
fn all_outputs_stay_within_i16_range() {
    // Worst-case full-scale alternating input through the resampler
    let samples: Vec<i16> = (0..2048)
        .map(|i| if i % 2 == 0 { i16::MAX } else { i16::MIN })
        .collect();
    let frame = transform(&block(samples, 48000), TARGET_SAMPLE_RATE);
    // Decoding proves every pair is a valid i16; saturation is enforced
    // inside both the resampler and the gain stage.
    assert_eq!(decode(&frame.bytes).len(), frame.bytes.len() / 2);
}

#[test]
fn resampled_length_matches_rate_ratio() {
    let cases = [
        (512usize, 44100u32, 8000u32),
        (1024, 48000, 8000),
        (100, 16000, 8000),
        (480, 48000, 16000),
        (333, 44100, 16000),
    ];

    for (len, source, target) in cases {
        let frame = transform(&block(vec![100; len], source), target);
        let expected = (len as f64 * target as f64 / source as f64).round() as usize;
        let got = frame.bytes.len() / 2;
        assert!(
            got.abs_diff(expected) <= 1,
            "{len} samples {source}->{target}: got {got}, expected {expected}"
        );
    }
}

#[test]
fn transform_is_deterministic() {
    let samples: Vec<i16> = (0..512).map(|i| ((i * 37) % 5000) as i16 - 2500).collect();
    let a = transform(&block(samples.clone(), 44100), TARGET_SAMPLE_RATE);
    let b = transform(&block(samples, 44100), TARGET_SAMPLE_RATE);
    assert_eq!(a, b);
}

// Scenario: five 1024-byte blocks captured at 44.1 kHz produce five frames
// of round(512 * 8000/44100) = 93 samples = 186 bytes each.
#[test]
fn chunk_sized_blocks_produce_expected_frame_length() {
    let raw = vec![0x10u8; 1024];

    for _ in 0..5 {
        let captured = AudioBlock::from_le_bytes(&raw, 44100);
        assert_eq!(captured.samples.len(), 512);

        let frame = transform(&captured, TARGET_SAMPLE_RATE);
        assert_eq!(frame.len(), 186);
    }
}
