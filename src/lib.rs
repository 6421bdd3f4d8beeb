//! Sequential ray tracing through spherical lenses.
//!
//! A [`Scene`] of opaque spheres and singlet lenses is encoded into flat
//! [`ObjectRecord`]s, and a [`Tracer`] scans a virtual sensor against them:
//! every sensor sample fans out a few rays, refracts them through any lenses
//! using Sellmeier dispersion and averages what they reach into a [`Color`].

pub mod config;
pub mod error;
pub mod glass;
pub mod intersect;
pub mod object;
pub mod picture;
pub mod ray;
pub mod record;
pub mod refraction;
pub mod render;
pub mod sag;
pub mod scene;
pub mod sensor;

pub use error::{OpticsError, ScanError};
pub use glass::{refractive_index, GlassDispersion};
pub use object::{Lens, OpticalObject, Sphere};
pub use picture::{Color, Picture, RGBA8};
pub use ray::Ray;
pub use record::{encode, ObjectRecord};
pub use render::{AngularFan, SamplePattern, Tracer};
pub use sag::sag;
pub use scene::{Scene, Snapshot};
pub use sensor::{orientation, SensorDescriptor, SensorMotion};
