use std::f32::consts::TAU;

use nalgebra::{point, vector, Point3, Rotation3, Unit, Vector3};

use crate::error::ScanError;

/// Builds an orientation the way a tripod head moves: yaw about Y, then
/// pitch about X, then roll about Z.
pub fn orientation(yaw: f32, pitch: f32, roll: f32) -> Rotation3<f32> {
    Rotation3::from_axis_angle(&Vector3::y_axis(), yaw)
        * Rotation3::from_axis_angle(&Vector3::x_axis(), pitch)
        * Rotation3::from_axis_angle(&Vector3::z_axis(), roll)
}

/// The virtual image plane.
///
/// In its local frame the sensor spans the XY plane centered on `position`,
/// with +X to the right, +Y up, and looks along -Z.
#[derive(Clone, Debug, PartialEq)]
pub struct SensorDescriptor {
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub physical_width: f32,
    pub physical_height: f32,
    pub position: Point3<f32>,
    pub orientation: Rotation3<f32>,
    /// Physical pixels per sample along each axis.
    pub binning: u32,
}

impl SensorDescriptor {
    pub fn new(pixels: (u32, u32), physical: (f32, f32), position: Point3<f32>) -> Self {
        SensorDescriptor {
            pixel_width: pixels.0,
            pixel_height: pixels.1,
            physical_width: physical.0,
            physical_height: physical.1,
            position,
            orientation: Rotation3::identity(),
            binning: 1,
        }
    }

    pub fn with_orientation(self, orientation: Rotation3<f32>) -> Self {
        SensorDescriptor { orientation, ..self }
    }

    pub fn with_binning(self, binning: u32) -> Self {
        SensorDescriptor { binning, ..self }
    }

    pub fn validate(&self) -> Result<(), ScanError> {
        if self.pixel_width == 0 || self.pixel_height == 0 {
            return Err(ScanError::EmptySensor {
                width: self.pixel_width,
                height: self.pixel_height,
            });
        }
        let positive = |v: f32| v > 0.0 && v.is_finite();
        if !positive(self.physical_width) || !positive(self.physical_height) {
            return Err(ScanError::InvalidSensorSize {
                width: self.physical_width,
                height: self.physical_height,
            });
        }
        if self.binning == 0 {
            return Err(ScanError::InvalidBinning);
        }
        Ok(())
    }

    /// Number of samples across and down once bins are applied.
    pub fn output_size(&self) -> (u32, u32) {
        let bin = self.binning.max(1);
        (self.pixel_width.div_ceil(bin), self.pixel_height.div_ceil(bin))
    }

    pub fn forward(&self) -> Unit<Vector3<f32>> {
        Unit::new_normalize(self.orientation * vector![0.0, 0.0, -1.0])
    }

    /// Center of output sample `(x, y)` in sensor-local physical units.
    ///
    /// A bin at the right or bottom edge may cover fewer physical pixels; its
    /// center is that of the pixels it actually covers.
    pub fn local_center(&self, x: u32, y: u32) -> Point3<f32> {
        let bin = self.binning.max(1);
        let span = |index: u32, pixels: u32| {
            let first = index * bin;
            let last = (first + bin).min(pixels);
            (first + last) as f32 / 2.0 / pixels as f32
        };
        let u = span(x, self.pixel_width);
        let v = span(y, self.pixel_height);
        point![
            (u - 0.5) * self.physical_width,
            (0.5 - v) * self.physical_height,
            0.0
        ]
    }

    /// World-space origin of output sample `(x, y)` at the current pose.
    pub fn sample_origin(&self, x: u32, y: u32) -> Point3<f32> {
        self.position + self.orientation * self.local_center(x, y).coords
    }
}

/// An oscillating sensor pose.
///
/// The pose is a pure function of elapsed time; there is no stored "current"
/// pose that could fall behind the clock.
#[derive(Clone, Debug, PartialEq)]
pub struct SensorMotion {
    pub base: SensorDescriptor,
    /// Peak displacement from `base.position`.
    pub amplitude: Vector3<f32>,
    /// Peak yaw swing in radians, applied on top of `base.orientation`.
    pub yaw_amplitude: f32,
    /// Peak pitch swing in radians.
    pub pitch_amplitude: f32,
    /// Oscillations per second.
    pub frequency: f32,
}

impl SensorMotion {
    /// A motion that keeps `base` where it is.
    pub fn still(base: SensorDescriptor) -> Self {
        SensorMotion {
            base,
            amplitude: Vector3::zeros(),
            yaw_amplitude: 0.0,
            pitch_amplitude: 0.0,
            frequency: 0.0,
        }
    }

    pub fn pose_at(&self, elapsed: f32) -> SensorDescriptor {
        let phase = (TAU * self.frequency * elapsed).sin();
        let swing = orientation(self.yaw_amplitude * phase, self.pitch_amplitude * phase, 0.0);
        SensorDescriptor {
            position: self.base.position + self.amplitude * phase,
            orientation: self.base.orientation * swing,
            ..self.base.clone()
        }
    }
}
