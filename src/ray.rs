use nalgebra::{Point3, Unit, Vector3};

/// Offset used to keep a ray from re-hitting the surface it just left.
pub const EPSILON: f32 = 1.0e-3;

#[derive(Clone, Debug, PartialEq)]
pub struct Ray {
    pub origin: Point3<f32>,
    pub direction: Unit<Vector3<f32>>,
}

impl Ray {
    pub fn new(origin: Point3<f32>, direction: Unit<Vector3<f32>>) -> Self {
        Self { origin, direction }
    }

    pub fn at(&self, t: f32) -> Point3<f32> {
        self.origin + self.direction.into_inner() * t
    }

    /// A ray leaving `point` along `direction`, nudged off the surface.
    pub fn leaving(point: Point3<f32>, direction: Unit<Vector3<f32>>) -> Self {
        Ray::new(point + direction.into_inner() * EPSILON, direction)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Face {
    Front,
    Back,
}

/// One of the two refracting surfaces of a lens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Surface {
    /// Vertex at `center.z - thickness / 2`.
    Front,
    /// Vertex at `center.z + thickness / 2`.
    Back,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    Sphere,
    /// The ray enters the lens body through `entry`.
    Lens { entry: Surface },
}

#[derive(Clone, Debug)]
pub struct Hit {
    pub point: Point3<f32>,
    /// Unit surface normal, always facing against the incoming ray.
    pub normal: Unit<Vector3<f32>>,
    pub face: Face,
    pub t: f32,
    /// Index of the record that was hit.
    pub object: usize,
    pub target: Target,
}

impl Hit {
    pub fn is_lens_body(&self) -> bool {
        matches!(self.target, Target::Lens { .. })
    }
}

/// Orients `outward` against `direction`, reporting which face was struck.
pub fn face_normal(direction: &Unit<Vector3<f32>>, outward: Unit<Vector3<f32>>) -> (Face, Unit<Vector3<f32>>) {
    if direction.dot(outward.as_ref()) < 0.0 {
        (Face::Front, outward)
    } else {
        (Face::Back, Unit::new_unchecked(-outward.into_inner()))
    }
}
