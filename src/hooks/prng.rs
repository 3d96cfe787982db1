//! Session-seeded noise for spoofed readbacks.
//!
//! The same index always yields the same noise within a session, so a script
//! reading a canvas twice cannot average the perturbation away.

/// Deterministic noise keyed by a per-session seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoiseSource {
    seed: u32,
}

impl NoiseSource {
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Murmur-style finalizer over `seed ^ index`.
    #[inline]
    pub fn mix(&self, index: u32) -> u32 {
        let mut h = self.seed ^ index;
        h = (h ^ (h >> 16)).wrapping_mul(0x45d9f3b);
        h = (h ^ (h >> 13)).wrapping_mul(0x45d9f3b);
        h ^ (h >> 16)
    }

    /// Roughly one pixel in 32.
    #[inline]
    pub fn should_perturb(&self, pixel: u32) -> bool {
        self.mix(pixel) & 0x1F == 0
    }

    /// Nudge one RGB channel of selected RGBA pixels by ±1.
    pub fn perturb_pixels(&self, rgba: &mut [u8]) {
        for (px, chunk) in rgba.chunks_exact_mut(4).enumerate() {
            let px = px as u32;
            if !self.should_perturb(px) {
                continue;
            }
            let channel = (self.mix(px.wrapping_add(0x10_0000)) % 3) as usize;
            let up = self.mix(px.wrapping_add(0x20_0000)) & 1 == 1;
            chunk[channel] = if up {
                chunk[channel].saturating_add(1)
            } else {
                chunk[channel].saturating_sub(1)
            };
        }
    }

    /// Add sub-decibel noise to float frequency bins.
    pub fn jitter_floats(&self, bins: &mut [f32]) {
        for (i, bin) in bins.iter_mut().enumerate() {
            let raw = (self.mix(i as u32 + 0x70_0000) & 0xFF) as f32 - 128.0;
            *bin += raw * 0.000_01;
        }
    }

    /// ±1 on about one byte bin in 16.
    pub fn jitter_bytes(&self, bins: &mut [u8]) {
        for (i, bin) in bins.iter_mut().enumerate() {
            let i = i as u32;
            if self.mix(i + 0x80_0000) & 0xF != 0 {
                continue;
            }
            *bin = if self.mix(i + 0x90_0000) & 1 == 1 {
                bin.saturating_add(1)
            } else {
                bin.saturating_sub(1)
            };
        }
    }
}
