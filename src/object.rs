use log::warn;
use nalgebra::Point3;

use crate::error::OpticsError;
use crate::glass::GlassDispersion;
use crate::sag::sag;

#[derive(Clone, Debug, PartialEq)]
pub struct Sphere {
    pub center: Point3<f32>,
    pub radius: f32,
}

impl Sphere {
    pub fn new(center: Point3<f32>, radius: f32) -> Self {
        Sphere { center, radius }
    }
}

/// A singlet lens whose optical axis is parallel to world Z.
///
/// Curvatures are signed radii of curvature: a positive value puts the center
/// of curvature on the +Z side of the surface vertex, zero is flat.
#[derive(Clone, Debug, PartialEq)]
pub struct Lens {
    pub center: Point3<f32>,
    pub aperture_radius: f32,
    pub thickness: f32,
    pub front_curvature: f32,
    pub back_curvature: f32,
    pub glass: GlassDispersion,
}

impl Lens {
    pub fn front_vertex_z(&self) -> f32 {
        self.center.z - self.thickness / 2.0
    }

    pub fn back_vertex_z(&self) -> f32 {
        self.center.z + self.thickness / 2.0
    }

    /// Axial thickness at the rim of the clear aperture.
    pub fn edge_thickness(&self) -> f32 {
        self.thickness - sag(self.front_curvature, self.aperture_radius)
            + sag(self.back_curvature, self.aperture_radius)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum OpticalObject {
    Sphere(Sphere),
    Lens(Lens),
}

impl OpticalObject {
    pub fn center(&self) -> Point3<f32> {
        match self {
            OpticalObject::Sphere(sphere) => sphere.center,
            OpticalObject::Lens(lens) => lens.center,
        }
    }

    pub fn set_center(&mut self, center: Point3<f32>) {
        match self {
            OpticalObject::Sphere(sphere) => sphere.center = center,
            OpticalObject::Lens(lens) => lens.center = center,
        }
    }

    pub fn validate(&self) -> Result<(), OpticsError> {
        let degenerate = |what: String| Err(OpticsError::DegenerateGeometry(what));

        if !self.center().iter().all(|c| c.is_finite()) {
            return degenerate(format!("center {:?} is not finite", self.center()));
        }

        match self {
            OpticalObject::Sphere(sphere) => {
                if !(sphere.radius > 0.0) || !sphere.radius.is_finite() {
                    return degenerate(format!("sphere radius {} must be positive", sphere.radius));
                }
            }
            OpticalObject::Lens(lens) => {
                if !(lens.aperture_radius > 0.0) || !lens.aperture_radius.is_finite() {
                    return degenerate(format!("aperture radius {} must be positive", lens.aperture_radius));
                }
                if !(lens.thickness > 0.0) || !lens.thickness.is_finite() {
                    return degenerate(format!("thickness {} must be positive", lens.thickness));
                }
                for curvature in [lens.front_curvature, lens.back_curvature] {
                    if !curvature.is_finite() {
                        return degenerate(format!("curvature {curvature} is not finite"));
                    }
                    if curvature != 0.0 && curvature.abs() < lens.aperture_radius {
                        warn!(
                            target: "scene",
                            "Curvature {} is tighter than the aperture radius {}, the rim is clipped by the surface sphere",
                            curvature, lens.aperture_radius
                        );
                    }
                }
                if lens.edge_thickness() < 0.0 {
                    warn!(target: "scene", "Lens surfaces cross inside the aperture (edge thickness {})", lens.edge_thickness());
                }
            }
        }
        Ok(())
    }
}

impl From<Sphere> for OpticalObject {
    fn from(sphere: Sphere) -> Self {
        OpticalObject::Sphere(sphere)
    }
}

impl From<Lens> for OpticalObject {
    fn from(lens: Lens) -> Self {
        OpticalObject::Lens(lens)
    }
}
