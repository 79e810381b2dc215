//! Physical unit conversion.
//!
//! Density, spacing, spread and size parameters are authored in millimetres and
//! converted to render units by a fixed linear factor before any geometry is
//! computed. Densities are "per linear millimetre of curve", so the number of
//! placed shapes does not depend on the output resolution.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const MM_PER_INCH: f32 = 25.4;
pub const DEFAULT_DPI: f32 = 96.0;

/// Linear millimetre to render-unit scale.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Units {
    px_per_mm: f32,
}

impl Default for Units {
    fn default() -> Self {
        Self::from_dpi(DEFAULT_DPI)
    }
}

impl Units {
    pub fn from_dpi(dpi: f32) -> Self {
        Self::from_px_per_mm(dpi / MM_PER_INCH)
    }

    /// Non-positive or non-finite factors fall back to the default DPI.
    pub fn from_px_per_mm(px_per_mm: f32) -> Self {
        let px_per_mm = if px_per_mm.is_finite() && px_per_mm > 0.0 {
            px_per_mm
        } else {
            DEFAULT_DPI / MM_PER_INCH
        };
        Self { px_per_mm }
    }

    /// Render units are millimetres (scale 1.0).
    pub fn millimetres() -> Self {
        Self { px_per_mm: 1.0 }
    }

    #[inline]
    pub fn px_per_mm(&self) -> f32 {
        self.px_per_mm
    }

    #[inline]
    pub fn mm_to_px(&self, mm: f32) -> f32 {
        mm * self.px_per_mm
    }

    #[inline]
    pub fn px_to_mm(&self, px: f32) -> f32 {
        px / self.px_per_mm
    }
}
