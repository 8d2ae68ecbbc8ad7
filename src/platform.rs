/// Capture and signal tuning resolved once at startup, instead of
/// platform conditionals scattered through the capture path.
#[derive(Debug, Clone, Copy)]
pub struct PlatformTuning {
    /// Samples per capture buffer. Windows audio drivers are more stable
    /// with smaller buffers, at the cost of more frequent callbacks.
    pub frames_per_buffer: u32,
    /// Whether SIGTERM can be handled in addition to the interrupt signal.
    pub sigterm_supported: bool,
}

impl PlatformTuning {
    pub fn detect(chunk_size_bytes: usize) -> Self {
        Self::resolve(chunk_size_bytes, cfg!(windows))
    }

    fn resolve(chunk_size_bytes: usize, windows: bool) -> Self {
        let frames_per_buffer = if windows {
            (chunk_size_bytes / 4).max(512)
        } else {
            chunk_size_bytes / 2
        };

        Self {
            frames_per_buffer: frames_per_buffer as u32,
            sigterm_supported: !windows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_chunk_size_buffer_math() {
        let unix = PlatformTuning::resolve(1024, false);
        assert_eq!(unix.frames_per_buffer, 512);
        assert!(unix.sigterm_supported);

        let windows = PlatformTuning::resolve(1024, true);
        assert_eq!(windows.frames_per_buffer, 512);
        assert!(!windows.sigterm_supported);
    }

    #[test]
    fn windows_buffer_never_below_512_frames() {
        let tuning = PlatformTuning::resolve(256, true);
        assert_eq!(tuning.frames_per_buffer, 512);

        let tuning = PlatformTuning::resolve(8192, true);
        assert_eq!(tuning.frames_per_buffer, 2048);
    }
}
