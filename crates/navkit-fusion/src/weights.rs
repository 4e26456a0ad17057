use crate::errors::FusionError;

/// `w_s + w_h` must equal 1.0; validated at construction per the
/// configuration surface that exposes these as tunables.
#[derive(Clone, Copy, Debug)]
pub struct FusionWeights {
    pub w_s: f64,
    pub w_h: f64,
}

impl FusionWeights {
    pub fn new(w_s: f64, w_h: f64) -> Result<Self, FusionError> {
        if (w_s + w_h - 1.0).abs() > 1e-6 {
            return Err(FusionError::InvalidWeights(w_s, w_h));
        }
        Ok(Self { w_s, w_h })
    }
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self { w_s: 0.6, w_h: 0.4 }
    }
}
