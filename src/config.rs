use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use nalgebra::{Point3, Vector3};
use serde::Deserialize;
use thiserror::Error;

use crate::error::{OpticsError, ScanError};
use crate::glass::GlassDispersion;
use crate::object::{Lens, OpticalObject, Sphere};
use crate::render::{AngularFan, Tracer, DEFAULT_WAVELENGTHS};
use crate::scene::Scene;
use crate::sensor::{orientation, SensorDescriptor, SensorMotion};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed scene file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown glass {0:?}")]
    UnknownGlass(String),

    #[error("object {index} is invalid: {source}")]
    InvalidObject {
        index: usize,
        #[source]
        source: OpticsError,
    },

    #[error("invalid sensor: {0}")]
    InvalidSensor(#[from] ScanError),
}

/// On-disk layout of a scene file.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneFile {
    pub sensor: SensorSection,
    pub motion: Option<MotionSection>,
    #[serde(default)]
    pub trace: TraceSection,
    #[serde(default)]
    pub objects: Vec<ObjectEntry>,
}

/// Angles are in radians.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SensorSection {
    pub pixels: [u32; 2],
    pub size: [f32; 2],
    pub position: [f32; 3],
    #[serde(default)]
    pub yaw: f32,
    #[serde(default)]
    pub pitch: f32,
    #[serde(default)]
    pub roll: f32,
    #[serde(default = "default_binning")]
    pub binning: u32,
}

fn default_binning() -> u32 {
    1
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MotionSection {
    #[serde(default)]
    pub amplitude: [f32; 3],
    #[serde(default)]
    pub yaw: f32,
    #[serde(default)]
    pub pitch: f32,
    pub frequency: f32,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TraceSection {
    pub rings: u32,
    pub per_ring: u32,
    pub spread: f32,
    pub wavelengths: Vec<f32>,
    pub max_elements: u32,
}

impl Default for TraceSection {
    fn default() -> Self {
        TraceSection {
            rings: 2,
            per_ring: 6,
            spread: 0.002,
            wavelengths: DEFAULT_WAVELENGTHS.to_vec(),
            max_elements: 4,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ObjectEntry {
    Sphere {
        center: [f32; 3],
        radius: f32,
    },
    Lens {
        center: [f32; 3],
        aperture_radius: f32,
        thickness: f32,
        front_curvature: f32,
        back_curvature: f32,
        glass: GlassEntry,
    },
}

/// Either a preset name such as `"N-BK7"` or explicit Sellmeier terms.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum GlassEntry {
    Named(String),
    Coefficients { b: [f32; 3], c: [f32; 3] },
}

impl GlassEntry {
    fn resolve(&self) -> Result<GlassDispersion, ConfigError> {
        match self {
            GlassEntry::Named(name) => GlassDispersion::preset(name).ok_or_else(|| ConfigError::UnknownGlass(name.clone())),
            GlassEntry::Coefficients { b, c } => Ok(GlassDispersion::new(*b, *c)),
        }
    }
}

impl ObjectEntry {
    fn build(&self) -> Result<OpticalObject, ConfigError> {
        Ok(match self {
            ObjectEntry::Sphere { center, radius } => Sphere::new(Point3::from(*center), *radius).into(),
            ObjectEntry::Lens {
                center,
                aperture_radius,
                thickness,
                front_curvature,
                back_curvature,
                glass,
            } => Lens {
                center: Point3::from(*center),
                aperture_radius: *aperture_radius,
                thickness: *thickness,
                front_curvature: *front_curvature,
                back_curvature: *back_curvature,
                glass: glass.resolve()?,
            }
            .into(),
        })
    }
}

/// Everything needed to render a run of frames.
pub struct Setup {
    pub scene: Scene,
    pub motion: SensorMotion,
    pub tracer: Tracer,
}

impl Setup {
    /// The built-in scene with a slow sideways sway.
    pub fn demo() -> Self {
        let sensor = SensorDescriptor::new((64, 48), (60.0, 45.0), Point3::new(0.0, 0.0, 100.0));
        Setup {
            scene: Scene::demo(),
            motion: SensorMotion {
                amplitude: Vector3::new(5.0, 0.0, 0.0),
                frequency: 0.25,
                ..SensorMotion::still(sensor)
            },
            tracer: Tracer::default(),
        }
    }
}

impl SceneFile {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn build(&self) -> Result<Setup, ConfigError> {
        let mut scene = Scene::new();
        for (index, entry) in self.objects.iter().enumerate() {
            scene
                .add(entry.build()?)
                .map_err(|source| ConfigError::InvalidObject { index, source })?;
        }

        let sensor = &self.sensor;
        let base = SensorDescriptor::new(
            (sensor.pixels[0], sensor.pixels[1]),
            (sensor.size[0], sensor.size[1]),
            Point3::from(sensor.position),
        )
        .with_orientation(orientation(sensor.yaw, sensor.pitch, sensor.roll))
        .with_binning(sensor.binning);
        base.validate()?;

        let motion = match &self.motion {
            Some(motion) => SensorMotion {
                amplitude: Vector3::from(motion.amplitude),
                yaw_amplitude: motion.yaw,
                pitch_amplitude: motion.pitch,
                frequency: motion.frequency,
                ..SensorMotion::still(base)
            },
            None => SensorMotion::still(base),
        };

        let trace = &self.trace;
        let tracer = Tracer::new(
            AngularFan::new(trace.rings, trace.per_ring, trace.spread),
            trace.wavelengths.clone(),
            trace.max_elements,
        );

        Ok(Setup { scene, motion, tracer })
    }
}

pub fn load(path: &Path) -> Result<Setup, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file = SceneFile::from_json(&text)?;
    debug!(target: "config", "Loaded {} objects from {}", file.objects.len(), path.display());
    file.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "sensor": { "pixels": [64, 48], "size": [60.0, 45.0],
                    "position": [0, 0, 100], "yaw": 0, "pitch": 0, "roll": 0,
                    "binning": 2 },
        "motion": { "amplitude": [5, 0, 0], "yaw": 0.05, "pitch": 0.0, "frequency": 0.25 },
        "trace":  { "rings": 1, "per_ring": 4, "spread": 0.001,
                    "wavelengths": [587.6], "max_elements": 2 },
        "objects": [
            { "kind": "sphere", "center": [0, 0, -200], "radius": 20 },
            { "kind": "lens", "center": [0, 0, 0], "aperture_radius": 15,
              "thickness": 10, "front_curvature": 35, "back_curvature": -35,
              "glass": "N-BK7" }
        ]
    }"#;

    #[test]
    fn parses_a_full_scene_file() {
        let setup = SceneFile::from_json(SAMPLE).unwrap().build().unwrap();

        assert_eq!(setup.scene.objects().len(), 2);
        match &setup.scene.objects()[1] {
            OpticalObject::Lens(lens) => assert_eq!(lens.glass, GlassDispersion::N_BK7),
            other => panic!("expected a lens, got {other:?}"),
        }
        assert_eq!(setup.motion.base.output_size(), (32, 24));
        assert_eq!(setup.motion.amplitude, Vector3::new(5.0, 0.0, 0.0));
        assert_eq!(setup.motion.yaw_amplitude, 0.05);
        assert_eq!(setup.tracer.pattern().sample_offsets().len(), 5);
        assert_eq!(setup.tracer.wavelengths(), &[587.6]);
        assert_eq!(setup.tracer.max_elements(), 2);
    }

    #[test]
    fn optional_sections_fall_back() {
        let file = SceneFile::from_json(r#"{ "sensor": { "pixels": [4, 4], "size": [1, 1], "position": [0, 0, 0] } }"#).unwrap();
        assert_eq!(file.trace, TraceSection::default());
        assert!(file.motion.is_none());
        assert!(file.objects.is_empty());

        let setup = file.build().unwrap();
        assert_eq!(setup.motion.pose_at(2.0), setup.motion.base);
        assert_eq!(setup.motion.base.binning, 1);
        assert_eq!(setup.tracer.pattern().sample_offsets().len(), 13);
    }

    #[test]
    fn explicit_coefficients() {
        let entry: ObjectEntry = serde_json::from_str(
            r#"{ "kind": "lens", "center": [0, 0, 0], "aperture_radius": 5, "thickness": 4,
                 "front_curvature": 0, "back_curvature": 0,
                 "glass": { "b": [1.0, 0.0, 0.0], "c": [0.01, 0.0, 0.0] } }"#,
        )
        .unwrap();
        match entry.build().unwrap() {
            OpticalObject::Lens(lens) => assert_eq!(lens.glass, GlassDispersion::new([1.0, 0.0, 0.0], [0.01, 0.0, 0.0])),
            other => panic!("expected a lens, got {other:?}"),
        }
    }

    #[test]
    fn unknown_glass_is_rejected() {
        let text = SAMPLE.replace("N-BK7", "unobtainium");
        let err = SceneFile::from_json(&text).unwrap().build().err().unwrap();
        assert!(matches!(err, ConfigError::UnknownGlass(name) if name == "unobtainium"));
    }

    #[test]
    fn invalid_objects_report_their_index() {
        let text = SAMPLE.replace("\"radius\": 20", "\"radius\": -1");
        let err = SceneFile::from_json(&text).unwrap().build().err().unwrap();
        assert!(matches!(err, ConfigError::InvalidObject { index: 0, .. }));
    }

    #[test]
    fn wide_aperture_lens_loads() {
        let text = SAMPLE.replace("\"aperture_radius\": 15", "\"aperture_radius\": 40");
        let setup = SceneFile::from_json(&text).unwrap().build().unwrap();
        assert_eq!(setup.scene.objects().len(), 2);
    }

    #[test]
    fn bad_sensor_and_bad_json() {
        let text = SAMPLE.replace("\"binning\": 2", "\"binning\": 0");
        let err = SceneFile::from_json(&text).unwrap().build().err().unwrap();
        assert!(matches!(err, ConfigError::InvalidSensor(ScanError::InvalidBinning)));

        assert!(matches!(SceneFile::from_json("{ \"sensor\": "), Err(ConfigError::Json(_))));
        assert!(matches!(
            SceneFile::from_json(&SAMPLE.replace("\"kind\": \"sphere\"", "\"kind\": \"prism\"")),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load(Path::new("/definitely/not/here.json")).err().unwrap();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn demo_setup_is_valid() {
        let setup = Setup::demo();
        assert_eq!(setup.motion.base.validate(), Ok(()));
        assert!(!setup.scene.objects().is_empty());
    }
}
