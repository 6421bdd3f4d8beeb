use std::f32::consts::TAU;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, trace};
use nalgebra::{vector, Point3, Unit, Vector2, Vector3};
use rayon::prelude::*;

use crate::error::ScanError;
use crate::intersect::nearest_hit;
use crate::picture::{Color, Picture};
use crate::ray::{Ray, Target};
use crate::record::ObjectRecord;
use crate::refraction::{transmit, Transmission};
use crate::scene::Scene;
use crate::sensor::SensorDescriptor;

/// A fixed set of angular offsets, in radians, around a pixel's central ray.
pub trait SamplePattern: Sync {
    fn sample_offsets(&self) -> &[Vector2<f32>];
}

impl<const N: usize> SamplePattern for [Vector2<f32>; N] {
    fn sample_offsets(&self) -> &[Vector2<f32>] {
        self
    }
}

pub const SINGLE_SAMPLE_PATTERN: [Vector2<f32>; 1] = [vector![0.0, 0.0]];

/// Fraunhofer F, d and C lines.
pub const DEFAULT_WAVELENGTHS: [f32; 3] = [486.1, 587.6, 656.3];

/// A deterministic fan: the central ray plus `rings` concentric rings of
/// `per_ring` rays each, out to `spread` radians. Odd rings are turned half a
/// step so neighbouring rings do not line up.
#[derive(Clone, Debug, PartialEq)]
pub struct AngularFan {
    offsets: Vec<Vector2<f32>>,
}

impl AngularFan {
    pub fn new(rings: u32, per_ring: u32, spread: f32) -> Self {
        let mut offsets = vec![Vector2::zeros()];
        for ring in 1..=rings {
            let radius = spread * ring as f32 / rings as f32;
            let twist = if ring % 2 == 1 { 0.5 } else { 0.0 };
            offsets.extend((0..per_ring).map(|step| {
                let azimuth = TAU * (step as f32 + twist) / per_ring as f32;
                vector![radius * azimuth.cos(), radius * azimuth.sin()]
            }));
        }
        AngularFan { offsets }
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

impl Default for AngularFan {
    fn default() -> Self {
        AngularFan::new(2, 6, 0.002)
    }
}

impl SamplePattern for AngularFan {
    fn sample_offsets(&self) -> &[Vector2<f32>] {
        &self.offsets
    }
}

/// Two unit vectors spanning the plane perpendicular to `direction`.
fn perpendicular_basis(direction: &Unit<Vector3<f32>>) -> (Vector3<f32>, Vector3<f32>) {
    let helper = if direction.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let u = direction.cross(&helper).normalize();
    let v = direction.cross(&u);
    (u, v)
}

fn tilt(center: &Unit<Vector3<f32>>, basis: &(Vector3<f32>, Vector3<f32>), offset: &Vector2<f32>) -> Unit<Vector3<f32>> {
    Unit::new_normalize(center.into_inner() + basis.0 * offset.x.tan() + basis.1 * offset.y.tan())
}

/// Rows handed to a worker at a time.
const LINES_PER_WORK: usize = 16;

pub struct Tracer {
    pattern: Box<dyn SamplePattern>,
    wavelengths: Vec<f32>,
    max_elements: u32,
}

impl Default for Tracer {
    fn default() -> Self {
        Tracer::new(AngularFan::default(), DEFAULT_WAVELENGTHS.to_vec(), 4)
    }
}

impl Tracer {
    /// `max_elements` caps how many lenses one ray may pass through in a row.
    /// An empty wavelength list falls back to the d line.
    pub fn new(pattern: impl SamplePattern + 'static, wavelengths: Vec<f32>, max_elements: u32) -> Self {
        let wavelengths = if wavelengths.is_empty() {
            vec![DEFAULT_WAVELENGTHS[1]]
        } else {
            wavelengths
        };
        Tracer {
            pattern: Box::new(pattern),
            wavelengths,
            max_elements,
        }
    }

    pub fn pattern(&self) -> &dyn SamplePattern {
        self.pattern.as_ref()
    }

    pub fn max_elements(&self) -> u32 {
        self.max_elements
    }

    pub fn wavelengths(&self) -> &[f32] {
        &self.wavelengths
    }

    /// Wavelength used for sample `k` of a pixel.
    pub fn wavelength_for(&self, k: usize) -> f32 {
        self.wavelengths[k % self.wavelengths.len()]
    }

    /// Follows one ray through the scene.
    ///
    /// Spheres are opaque and report [`Color::HIT`]. Lenses refract the ray
    /// and the pass repeats without the lens just crossed. A ray that got
    /// through glass and then escapes shows its exit direction; anything
    /// else shows [`Color::BACKGROUND`].
    pub fn trace(&self, ray: Ray, records: &[ObjectRecord], wavelength_nm: f32) -> Color {
        let mut ray = ray;
        let mut exclude = None;
        let mut elements = 0;

        loop {
            let Some(hit) = nearest_hit(&ray, records, exclude) else {
                return if elements > 0 {
                    Color::visualize_direction(&ray.direction)
                } else {
                    Color::BACKGROUND
                };
            };
            if hit.target == Target::Sphere {
                return Color::HIT;
            }
            if elements == self.max_elements {
                return Color::BACKGROUND;
            }

            match transmit(&ray, &hit, &records[hit.object], wavelength_nm) {
                Transmission::Transmitted(out) => {
                    ray = out;
                    exclude = Some(hit.object);
                    elements += 1;
                }
                Transmission::Absorbed(reason) => {
                    trace!(target: "render", "Ray absorbed by object {}: {:?}", hit.object, reason);
                    return Color::BACKGROUND;
                }
            }
        }
    }

    /// Averages the sample fan around `center_direction` into one color.
    pub fn sample_pixel(&self, origin: &Point3<f32>, center_direction: &Unit<Vector3<f32>>, records: &[ObjectRecord]) -> Color {
        let offsets = self.pattern.sample_offsets();
        if records.is_empty() || offsets.is_empty() {
            return Color::BACKGROUND;
        }

        let basis = perpendicular_basis(center_direction);
        let sum: Color = offsets
            .iter()
            .enumerate()
            .map(|(k, offset)| {
                let ray = Ray::new(*origin, tilt(center_direction, &basis, offset));
                self.trace(ray, records, self.wavelength_for(k))
            })
            .sum();
        sum * (1.0 / offsets.len() as f32)
    }

    pub fn scan(&self, sensor: &SensorDescriptor, records: &[ObjectRecord]) -> Result<Picture<Vec<Color>>, ScanError> {
        self.scan_cancellable(sensor, records, &AtomicBool::new(false))
    }

    /// Scans the sensor at its current pose.
    ///
    /// Bands of rows are traced in parallel. Once `cancel` is set no further
    /// band starts and the scan reports [`ScanError::Cancelled`].
    pub fn scan_cancellable(
        &self,
        sensor: &SensorDescriptor,
        records: &[ObjectRecord],
        cancel: &AtomicBool,
    ) -> Result<Picture<Vec<Color>>, ScanError> {
        sensor.validate()?;

        let (width, height) = sensor.output_size();
        let forward = sensor.forward();
        debug!(target: "scan", "Scanning {}x{} samples against {} objects", width, height, records.len());

        let row = width as usize;
        let band = row * LINES_PER_WORK;
        let mut picture = Picture::new(vec![Color::BACKGROUND; row * height as usize], (width, height));
        picture
            .view_mut()
            .buffer_mut()
            .par_chunks_mut(band)
            .enumerate()
            .for_each(|(i, chunk)| {
                if cancel.load(Ordering::Relaxed) {
                    return;
                }
                let first = i * LINES_PER_WORK;
                trace!(target: "scan", "Rendering rows {}..{}", first, first + chunk.len() / row);

                for (offset, pixel) in chunk.iter_mut().enumerate() {
                    let index = i * band + offset;
                    let x = (index % row) as u32;
                    let y = (index / row) as u32;
                    *pixel = self.sample_pixel(&sensor.sample_origin(x, y), &forward, records);
                }
            });

        if cancel.load(Ordering::Relaxed) {
            debug!(target: "scan", "Scan cancelled");
            return Err(ScanError::Cancelled);
        }
        Ok(picture)
    }

    /// Scans against the scene's current geometry, re-encoding it if it was
    /// edited since the last snapshot.
    pub fn scan_scene(&self, sensor: &SensorDescriptor, scene: &mut Scene) -> Result<Picture<Vec<Color>>, ScanError> {
        let snapshot = scene.snapshot();
        self.scan(sensor, snapshot.records())
    }
}
