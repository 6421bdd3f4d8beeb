use thiserror::Error;

/// Failures of the optical model itself.
///
/// None of these abort a scan: a ray that runs into one simply stops
/// contributing light.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OpticsError {
    #[error("glass dispersion is undefined at {wavelength_nm} nm")]
    InvalidDispersion { wavelength_nm: f32 },

    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),
}

/// Failures that abort a whole sensor scan.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScanError {
    #[error("sensor has no pixels ({width}x{height})")]
    EmptySensor { width: u32, height: u32 },

    #[error("sensor physical size must be positive and finite, got {width}x{height}")]
    InvalidSensorSize { width: f32, height: f32 },

    #[error("sensor binning must be at least 1")]
    InvalidBinning,

    #[error("scan was cancelled")]
    Cancelled,
}
