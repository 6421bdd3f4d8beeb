use log::trace;
use nalgebra::{Unit, Vector3};

use crate::error::OpticsError;
use crate::intersect::{lens_span, radial_distance, surface_normal};
use crate::ray::{face_normal, Hit, Ray, Surface, Target, EPSILON};
use crate::record::ObjectRecord;

/// Why a ray stopped inside a lens.
#[derive(Clone, Debug, PartialEq)]
pub enum Absorption {
    Dispersion(OpticsError),
    TotalInternalReflection(Surface),
    /// The ray reached the rim of the lens outside the clear aperture.
    Vignetted,
    /// The hit handed in was not a lens entry.
    NotALens,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Transmission {
    /// The ray leaving the back of the element, already nudged off the glass.
    Transmitted(Ray),
    Absorbed(Absorption),
}

/// Snell's law in vector form.
///
/// `normal` must face against `incident`, and `eta` is the ratio of the
/// indices on the incident side over the transmitted side. `None` means total
/// internal reflection.
pub fn refract(incident: &Unit<Vector3<f32>>, normal: &Unit<Vector3<f32>>, eta: f32) -> Option<Unit<Vector3<f32>>> {
    let cos_i = normal.dot(incident.as_ref());
    let k = 1.0 - eta * eta * (1.0 - cos_i * cos_i);
    if k < 0.0 {
        return None;
    }
    let direction = eta * incident.into_inner() - (eta * cos_i + k.sqrt()) * normal.into_inner();
    Some(Unit::new_normalize(direction))
}

/// Carries a ray that has just struck a lens through both of its surfaces.
pub fn transmit(ray: &Ray, hit: &Hit, record: &ObjectRecord, wavelength_nm: f32) -> Transmission {
    let Target::Lens { entry } = hit.target else {
        return Transmission::Absorbed(Absorption::NotALens);
    };

    let n = match record.glass.refractive_index(wavelength_nm) {
        Ok(n) => n,
        Err(err) => return Transmission::Absorbed(Absorption::Dispersion(err)),
    };

    let Some(inside) = refract(&ray.direction, &hit.normal, 1.0 / n) else {
        return Transmission::Absorbed(Absorption::TotalInternalReflection(entry));
    };

    let internal = Ray::new(hit.point, inside);
    let Some(span) = lens_span(&internal, record, |span| span.enter <= EPSILON) else {
        trace!(target: "refraction", "Internal ray from {:?} never reaches an exit surface", hit.point);
        return Transmission::Absorbed(Absorption::Vignetted);
    };

    let exit_point = internal.at(span.exit);
    if !(radial_distance(record, &exit_point) <= record.aperture_radius) {
        return Transmission::Absorbed(Absorption::Vignetted);
    }

    let (_, exit_normal) = face_normal(&inside, surface_normal(record, span.exit_surface, &exit_point));
    match refract(&inside, &exit_normal, n) {
        Some(outgoing) => Transmission::Transmitted(Ray::leaving(exit_point, outgoing)),
        None => Transmission::Absorbed(Absorption::TotalInternalReflection(span.exit_surface)),
    }
}
