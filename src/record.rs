use bytemuck_derive::{Pod, Zeroable};
use nalgebra::Point3;

use crate::glass::GlassDispersion;
use crate::object::{Lens, OpticalObject, Sphere};
use crate::ray::Surface;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum ObjectKind {
    Sphere = 0,
    Lens = 1,
}

impl ObjectKind {
    pub fn from_raw(raw: u32) -> Option<ObjectKind> {
        match raw {
            0 => Some(ObjectKind::Sphere),
            1 => Some(ObjectKind::Lens),
            _ => None,
        }
    }
}

/// Flat, fixed-layout view of one scene object.
///
/// This is all the intersection code ever sees of the scene. Fields that do not
/// apply to the record's kind are zero. The layout has no padding so a record
/// slice can be handed out as raw bytes.
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct ObjectRecord {
    kind: u32,
    pub center: Point3<f32>,
    pub sphere_radius: f32,
    pub aperture_radius: f32,
    pub thickness: f32,
    pub front_curvature: f32,
    pub back_curvature: f32,
    pub glass: GlassDispersion,
}

impl ObjectRecord {
    pub fn sphere(sphere: &Sphere) -> Self {
        ObjectRecord {
            kind: ObjectKind::Sphere as u32,
            center: sphere.center,
            sphere_radius: sphere.radius,
            ..bytemuck::Zeroable::zeroed()
        }
    }

    pub fn lens(lens: &Lens) -> Self {
        ObjectRecord {
            kind: ObjectKind::Lens as u32,
            center: lens.center,
            aperture_radius: lens.aperture_radius,
            thickness: lens.thickness,
            front_curvature: lens.front_curvature,
            back_curvature: lens.back_curvature,
            glass: lens.glass,
            ..bytemuck::Zeroable::zeroed()
        }
    }

    pub fn kind(&self) -> Option<ObjectKind> {
        ObjectKind::from_raw(self.kind)
    }

    pub fn vertex_z(&self, surface: Surface) -> f32 {
        match surface {
            Surface::Front => self.center.z - self.thickness / 2.0,
            Surface::Back => self.center.z + self.thickness / 2.0,
        }
    }

    pub fn curvature(&self, surface: Surface) -> f32 {
        match surface {
            Surface::Front => self.front_curvature,
            Surface::Back => self.back_curvature,
        }
    }
}

impl From<&OpticalObject> for ObjectRecord {
    fn from(object: &OpticalObject) -> Self {
        match object {
            OpticalObject::Sphere(sphere) => ObjectRecord::sphere(sphere),
            OpticalObject::Lens(lens) => ObjectRecord::lens(lens),
        }
    }
}

/// Flattens `objects` into records, row `i` describing object `i`.
pub fn encode(objects: &[OpticalObject]) -> Vec<ObjectRecord> {
    objects.iter().map(ObjectRecord::from).collect()
}

#[cfg(test)]
mod tests {
    use std::mem::size_of;

    use nalgebra::point;

    use super::*;

    fn scene() -> Vec<OpticalObject> {
        vec![
            Sphere::new(point![0.0, 0.0, -500.0], 50.0).into(),
            Lens {
                center: point![1.0, 2.0, 3.0],
                aperture_radius: 15.0,
                thickness: 10.0,
                front_curvature: 35.0,
                back_curvature: -35.0,
                glass: GlassDispersion::N_BK7,
            }
            .into(),
            Sphere::new(point![0.0, 10.0, -100.0], 5.0).into(),
        ]
    }

    #[test]
    fn empty_scene_encodes_to_nothing() {
        assert!(encode(&[]).is_empty());
    }

    #[test]
    fn encoding_preserves_order() {
        let records = encode(&scene());
        let kinds: Vec<_> = records.iter().map(|r| r.kind()).collect();
        assert_eq!(kinds, vec![Some(ObjectKind::Sphere), Some(ObjectKind::Lens), Some(ObjectKind::Sphere)]);
        assert_eq!(records[2].center, point![0.0, 10.0, -100.0]);
        assert_eq!(records[2].sphere_radius, 5.0);
    }

    #[test]
    fn lens_fields_are_kept_apart_from_sphere_radius() {
        let records = encode(&scene());
        let lens = &records[1];
        assert_eq!(lens.sphere_radius, 0.0);
        assert_eq!(lens.aperture_radius, 15.0);
        assert_eq!(lens.thickness, 10.0);
        assert_eq!(lens.front_curvature, 35.0);
        assert_eq!(lens.back_curvature, -35.0);
        assert_eq!(lens.glass, GlassDispersion::N_BK7);
        assert_eq!(lens.vertex_z(Surface::Front), -2.0);
        assert_eq!(lens.vertex_z(Surface::Back), 8.0);
        assert_eq!(lens.curvature(Surface::Back), -35.0);
    }

    #[test]
    fn encoding_is_deterministic() {
        assert_eq!(encode(&scene()), encode(&scene()));
    }

    #[test]
    fn records_are_fixed_width() {
        assert_eq!(size_of::<ObjectRecord>(), 15 * 4);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert_eq!(ObjectKind::from_raw(7), None);
    }
}
