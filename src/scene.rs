use std::ops::Deref;
use std::sync::Arc;

use log::debug;
use nalgebra::{point, Point3};

use crate::error::OpticsError;
use crate::glass::GlassDispersion;
use crate::object::{Lens, OpticalObject, Sphere};
use crate::record::{encode, ObjectRecord};

/// Immutable encoded view of a scene at one revision.
#[derive(Clone, Debug)]
pub struct Snapshot {
    revision: u64,
    records: Arc<[ObjectRecord]>,
}

impl Snapshot {
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn records(&self) -> &[ObjectRecord] {
        &self.records
    }
}

impl Deref for Snapshot {
    type Target = [ObjectRecord];

    fn deref(&self) -> &Self::Target {
        &self.records
    }
}

/// The editable object list.
///
/// Every edit bumps the revision, and [`Scene::snapshot`] re-encodes whenever
/// the revision moved, so scans always read the geometry as of their start.
#[derive(Debug, Default)]
pub struct Scene {
    objects: Vec<OpticalObject>,
    revision: u64,
    encoded: Option<Snapshot>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_objects(objects: Vec<OpticalObject>) -> Result<Self, OpticsError> {
        let mut scene = Scene::new();
        for object in objects {
            scene.add(object)?;
        }
        Ok(scene)
    }

    /// A biconvex N-BK7 lens at the origin with a target sphere behind it.
    pub fn demo() -> Self {
        Scene {
            objects: vec![
                Sphere::new(point![0.0, 0.0, -200.0], 20.0).into(),
                Sphere::new(point![40.0, 25.0, -260.0], 15.0).into(),
                Lens {
                    center: Point3::origin(),
                    aperture_radius: 15.0,
                    thickness: 10.0,
                    front_curvature: 35.0,
                    back_curvature: -35.0,
                    glass: GlassDispersion::N_BK7,
                }
                .into(),
            ],
            revision: 1,
            encoded: None,
        }
    }

    pub fn objects(&self) -> &[OpticalObject] {
        &self.objects
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn add(&mut self, object: OpticalObject) -> Result<usize, OpticsError> {
        object.validate()?;
        self.objects.push(object);
        self.revision += 1;
        Ok(self.objects.len() - 1)
    }

    pub fn remove(&mut self, index: usize) -> Option<OpticalObject> {
        if index >= self.objects.len() {
            return None;
        }
        self.revision += 1;
        Some(self.objects.remove(index))
    }

    /// Moves object `index`; returns `false` when there is no such object.
    pub fn set_center(&mut self, index: usize, center: Point3<f32>) -> bool {
        if !center.iter().all(|c| c.is_finite()) {
            return false;
        }
        match self.objects.get_mut(index) {
            Some(object) => {
                object.set_center(center);
                self.revision += 1;
                true
            }
            None => false,
        }
    }

    /// Encoded records for the current revision.
    pub fn snapshot(&mut self) -> Snapshot {
        match &self.encoded {
            Some(snapshot) if snapshot.revision == self.revision => snapshot.clone(),
            _ => {
                debug!(target: "scene", "Encoding {} objects at revision {}", self.objects.len(), self.revision);
                let snapshot = Snapshot {
                    revision: self.revision,
                    records: encode(&self.objects).into(),
                };
                self.encoded = Some(snapshot.clone());
                snapshot
            }
        }
    }
}
