//! Fractional Brownian Motion roughness for initial surfaces.
//!
//! fBm: sum of octaves with amplitude = gain^i and frequency = lacunarity^i.
//! Persistence: gain = lacunarity^(−H).  For lacunarity=2, H=0.75 → gain≈0.595.
use noise::{NoiseFn, Perlin};

/// Perlin fBm used as spatially correlated pre-impact roughness.
///
/// Higher `hurst` damps the fine octaves faster, giving smoother terrain
/// between crater rims; `hurst` near 0 approaches white noise.
pub struct Fbm {
    pub hurst: f64,
    pub octaves: u32,
    pub lacunarity: f64,
    noise: Perlin,
}

impl Fbm {
    /// `lacunarity` is fixed at 2.0; gain is derived from H.
    pub fn new(seed: u32, hurst: f64, octaves: u32) -> Self {
        Self { hurst, octaves, lacunarity: 2.0, noise: Perlin::new(seed) }
    }

    #[inline]
    fn gain(&self) -> f64 {
        self.lacunarity.powf(-self.hurst)
    }

    /// Evaluate fBm at `(x, y)` in noise space. Output is roughly ±1.
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let gain = self.gain();
        let mut value = 0.0f64;
        let mut amp = 1.0f64;
        let mut freq = 1.0f64;
        for _ in 0..self.octaves {
            value += amp * self.noise.get([x * freq, y * freq]);
            amp *= gain;
            freq *= self.lacunarity;
        }
        value
    }
}
