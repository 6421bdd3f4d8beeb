use bytemuck_derive::{Pod, Zeroable};

use crate::error::OpticsError;

/// Sellmeier coefficients of an optical glass.
///
/// `b` are the dimensionless B terms, `c` the C terms in µm².
#[derive(Debug, Default, Copy, Clone, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct GlassDispersion {
    pub b: [f32; 3],
    pub c: [f32; 3],
}

impl GlassDispersion {
    pub const N_BK7: GlassDispersion = GlassDispersion::new(
        [1.039_612_1, 0.231_792_34, 1.010_469_5],
        [0.006_000_698_7, 0.020_017_914, 103.560_65],
    );

    pub const N_SF11: GlassDispersion = GlassDispersion::new(
        [1.737_597, 0.313_747_35, 1.898_781],
        [0.013_188_707, 0.062_306_814, 155.236_29],
    );

    pub const FUSED_SILICA: GlassDispersion = GlassDispersion::new(
        [0.696_166_3, 0.407_942_6, 0.897_479_4],
        [0.004_679_148_3, 0.013_512_063, 97.934_003],
    );

    pub const fn new(b: [f32; 3], c: [f32; 3]) -> Self {
        GlassDispersion { b, c }
    }

    /// Looks up a catalogue glass by name, ignoring case and separators.
    pub fn preset(name: &str) -> Option<GlassDispersion> {
        let key: String = name
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "nbk7" | "bk7" => Some(Self::N_BK7),
            "nsf11" | "sf11" => Some(Self::N_SF11),
            "fusedsilica" | "silica" => Some(Self::FUSED_SILICA),
            _ => None,
        }
    }

    pub fn refractive_index(&self, wavelength_nm: f32) -> Result<f32, OpticsError> {
        refractive_index(wavelength_nm, self)
    }
}

/// Refractive index of `glass` at `wavelength_nm` from the Sellmeier equation.
///
/// Fails when the wavelength sits on one of the glass's resonances or the
/// squared index comes out negative. Callers treat that as the ray being
/// absorbed rather than carrying a NaN forward.
pub fn refractive_index(wavelength_nm: f32, glass: &GlassDispersion) -> Result<f32, OpticsError> {
    let invalid = || OpticsError::InvalidDispersion { wavelength_nm };

    if !(wavelength_nm > 0.0) || !wavelength_nm.is_finite() {
        return Err(invalid());
    }

    let micrometers = wavelength_nm / 1000.0;
    let l2 = micrometers * micrometers;

    let mut n2 = 1.0;
    for (b, c) in glass.b.iter().zip(&glass.c) {
        let denominator = l2 - c;
        if denominator == 0.0 {
            return Err(invalid());
        }
        n2 += b * l2 / denominator;
    }

    if !n2.is_finite() || n2 < 0.0 {
        return Err(invalid());
    }
    Ok(n2.sqrt())
}
