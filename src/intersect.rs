use float_ord::FloatOrd;
use nalgebra::{point, Point3, Unit, Vector3};

use crate::ray::{face_normal, Face, Hit, Ray, Surface, Target, EPSILON};
use crate::record::{ObjectKind, ObjectRecord};

/// Range of ray parameters, possibly unbounded at either end.
type Interval = (f32, f32);

/// Both roots of the ray/sphere quadratic, nearest first.
pub fn intersect_sphere(ray: &Ray, center: &Point3<f32>, radius: f32) -> Option<(f32, f32)> {
    let direction = ray.direction.as_ref();
    let oc = ray.origin - *center;
    let a = direction.magnitude_squared();
    let half_b = oc.dot(direction);
    let c = oc.magnitude_squared() - radius * radius;

    let discriminant = half_b * half_b - a * c;
    if discriminant < 0.0 {
        return None;
    }
    let sqrtd = discriminant.sqrt();
    Some(((-half_b - sqrtd) / a, (-half_b + sqrtd) / a))
}

fn hit_sphere(ray: &Ray, record: &ObjectRecord, object: usize) -> Option<Hit> {
    let (near, far) = intersect_sphere(ray, &record.center, record.sphere_radius)?;

    // find the nearest root in front of the ray.
    let t = if near > EPSILON {
        near
    } else if far > EPSILON {
        far
    } else {
        return None;
    };

    let point = ray.at(t);
    let (face, normal) = face_normal(&ray.direction, Unit::new_normalize(point - record.center));
    Some(Hit {
        point,
        normal,
        face,
        t,
        object,
        target: Target::Sphere,
    })
}

/// The stretch of a ray lying inside a lens body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Span {
    pub enter: f32,
    pub exit: f32,
    pub enter_surface: Surface,
    pub exit_surface: Surface,
}

/// Center of the sphere a curved surface lies on.
pub fn surface_center(record: &ObjectRecord, surface: Surface) -> Point3<f32> {
    point![
        record.center.x,
        record.center.y,
        record.vertex_z(surface) + record.curvature(surface)
    ]
}

/// Geometric normal of `surface` at `point`, pointing away from its center of
/// curvature (along +Z for a flat surface).
pub fn surface_normal(record: &ObjectRecord, surface: Surface, point: &Point3<f32>) -> Unit<Vector3<f32>> {
    if record.curvature(surface) == 0.0 {
        Vector3::z_axis()
    } else {
        Unit::new_normalize(*point - surface_center(record, surface))
    }
}

/// Normal of `surface` at `point` pointing out of the glass.
pub fn outward_normal(record: &ObjectRecord, surface: Surface, point: &Point3<f32>) -> Unit<Vector3<f32>> {
    let normal = surface_normal(record, surface, point);
    let curvature = record.curvature(surface);
    let keep = if curvature == 0.0 {
        glass_sign(surface) < 0.0
    } else {
        glass_sign(surface) * curvature > 0.0
    };
    if keep {
        normal
    } else {
        Unit::new_unchecked(-normal.into_inner())
    }
}

pub fn radial_distance(record: &ObjectRecord, point: &Point3<f32>) -> f32 {
    (point.x - record.center.x).hypot(point.y - record.center.y)
}

fn glass_sign(surface: Surface) -> f32 {
    match surface {
        Surface::Front => 1.0,
        Surface::Back => -1.0,
    }
}

/// Parameters for which `sign * (z - plane_z) >= 0`.
fn half_space(ray: &Ray, plane_z: f32, sign: f32) -> Option<Interval> {
    let dz = ray.direction.z;
    let offset = ray.origin.z - plane_z;
    if dz == 0.0 {
        return (sign * offset >= 0.0).then_some((f32::NEG_INFINITY, f32::INFINITY));
    }
    let t0 = -offset / dz;
    if sign * dz > 0.0 {
        Some((t0, f32::INFINITY))
    } else {
        Some((f32::NEG_INFINITY, t0))
    }
}

fn overlap(a: Interval, b: Interval) -> Option<Interval> {
    let lo = a.0.max(b.0);
    let hi = a.1.min(b.1);
    (lo < hi).then_some((lo, hi))
}

/// Parameter ranges on the glass side of one lens surface.
///
/// Glass sits on +Z of the front surface and on -Z of the back one. A convex
/// surface bounds the inside of its sphere, a concave one the outside, cut at
/// the plane through its center of curvature.
fn glass_side(ray: &Ray, record: &ObjectRecord, surface: Surface) -> [Option<Interval>; 2] {
    let sign = glass_sign(surface);
    let curvature = record.curvature(surface);

    if curvature == 0.0 {
        return [half_space(ray, record.vertex_z(surface), sign), None];
    }

    let center = surface_center(record, surface);
    let roots = intersect_sphere(ray, &center, curvature.abs());
    if sign * curvature > 0.0 {
        return [roots, None];
    }

    let Some(cut) = half_space(ray, center.z, sign) else {
        return [None, None];
    };
    match roots {
        Some((near, far)) => [
            overlap((f32::NEG_INFINITY, near), cut),
            overlap((far, f32::INFINITY), cut),
        ],
        None => [Some(cut), None],
    }
}

/// Earliest stretch of `ray` inside the lens body that `accept` agrees to.
///
/// Only spans ending ahead of the ray origin are considered.
pub fn lens_span(ray: &Ray, record: &ObjectRecord, accept: impl Fn(&Span) -> bool) -> Option<Span> {
    let front = glass_side(ray, record, Surface::Front);
    let back = glass_side(ray, record, Surface::Back);

    front
        .iter()
        .flatten()
        .flat_map(|f| back.iter().flatten().map(move |b| (*f, *b)))
        .filter_map(|(f, b)| {
            let (enter, enter_surface) = if f.0 >= b.0 {
                (f.0, Surface::Front)
            } else {
                (b.0, Surface::Back)
            };
            let (exit, exit_surface) = if f.1 <= b.1 {
                (f.1, Surface::Front)
            } else {
                (b.1, Surface::Back)
            };
            (enter < exit && exit > EPSILON).then_some(Span {
                enter,
                exit,
                enter_surface,
                exit_surface,
            })
        })
        .filter(|span| accept(span))
        .min_by_key(|span| FloatOrd(span.enter))
}

/// Where `ray` enters the lens body, if it does so inside the clear aperture.
pub fn intersect_lens(ray: &Ray, record: &ObjectRecord, object: usize) -> Option<Hit> {
    let span = lens_span(ray, record, |span| span.enter > EPSILON)?;

    let point = ray.at(span.enter);
    if radial_distance(record, &point) > record.aperture_radius {
        return None;
    }

    // Normals point out of the glass, so an entry from outside is a front face.
    let (face, normal) = face_normal(
        &ray.direction,
        outward_normal(record, span.enter_surface, &point),
    );
    Some(Hit {
        point,
        normal,
        face,
        t: span.enter,
        object,
        target: Target::Lens {
            entry: span.enter_surface,
        },
    })
}

pub fn intersect(ray: &Ray, record: &ObjectRecord, object: usize) -> Option<Hit> {
    match record.kind()? {
        ObjectKind::Sphere => hit_sphere(ray, record, object),
        ObjectKind::Lens => intersect_lens(ray, record, object),
    }
}

/// Closest hit over all records except `exclude`.
///
/// Exact ties in `t` go to whichever record happens to win the comparison.
pub fn nearest_hit(ray: &Ray, records: &[ObjectRecord], exclude: Option<usize>) -> Option<Hit> {
    records
        .iter()
        .enumerate()
        .filter(|(index, _)| Some(*index) != exclude)
        .filter_map(|(index, record)| intersect(ray, record, index))
        .min_by_key(|hit| FloatOrd(hit.t))
}

#[cfg(test)]
mod tests {
    use nalgebra::{point, vector};

    use super::*;
    use crate::glass::GlassDispersion;
    use crate::object::{Lens, Sphere};

    fn ray(origin: Point3<f32>, direction: Vector3<f32>) -> Ray {
        Ray::new(origin, Unit::new_normalize(direction))
    }

    fn lens(front_curvature: f32, back_curvature: f32, thickness: f32, aperture_radius: f32) -> ObjectRecord {
        ObjectRecord::lens(&Lens {
            center: Point3::origin(),
            aperture_radius,
            thickness,
            front_curvature,
            back_curvature,
            glass: GlassDispersion::N_BK7,
        })
    }

    fn sphere(center: Point3<f32>, radius: f32) -> ObjectRecord {
        ObjectRecord::sphere(&Sphere::new(center, radius))
    }

    #[test]
    fn sphere_round_trip() {
        let center = point![1.0, 2.0, -30.0];
        let origin = point![0.0, 0.0, 10.0];
        let target = center + Unit::new_normalize(vector![2.0, -2.0, 40.0]).into_inner() * 5.0;
        let r = ray(origin, target - origin);

        let hit = intersect(&r, &sphere(center, 5.0), 0).unwrap();
        assert!((r.at(hit.t) - target).norm() < 2.0e-3);
        assert_eq!(hit.face, Face::Front);
        assert!(hit.normal.dot(r.direction.as_ref()) < 0.0);
    }

    #[test]
    fn sphere_miss_and_behind() {
        let record = sphere(point![0.0, 0.0, -10.0], 1.0);
        assert!(intersect_sphere(&ray(point![5.0, 0.0, 0.0], vector![0.0, 0.0, -1.0]), &record.center, 1.0).is_none());
        assert!(intersect(&ray(Point3::origin(), vector![0.0, 0.0, 1.0]), &record, 0).is_none());
    }

    #[test]
    fn inside_sphere_hits_far_side() {
        let record = sphere(Point3::origin(), 2.0);
        let hit = intersect(&ray(Point3::origin(), vector![1.0, 0.0, 0.0]), &record, 0).unwrap();
        assert!((hit.t - 2.0).abs() < 1.0e-5);
        assert_eq!(hit.face, Face::Back);
    }

    #[test]
    fn biconvex_entered_from_behind() {
        let record = lens(35.0, -35.0, 10.0, 15.0);
        let hit = intersect(&ray(point![0.0, 0.0, 100.0], vector![0.0, 0.0, -1.0]), &record, 3).unwrap();
        assert!((hit.t - 95.0).abs() < 1.0e-3);
        assert_eq!(hit.target, Target::Lens { entry: Surface::Back });
        assert_eq!(hit.object, 3);
        assert!((hit.normal.z - 1.0).abs() < 1.0e-5);
        assert!(hit.is_lens_body());
    }

    #[test]
    fn biconvex_entered_from_front() {
        let record = lens(35.0, -35.0, 10.0, 15.0);
        let hit = intersect(&ray(point![0.0, 0.0, -100.0], vector![0.0, 0.0, 1.0]), &record, 0).unwrap();
        assert!((hit.t - 95.0).abs() < 1.0e-3);
        assert_eq!(hit.target, Target::Lens { entry: Surface::Front });
    }

    #[test]
    fn biconvex_span_uses_max_near_and_min_far() {
        let record = lens(35.0, -35.0, 10.0, 15.0);
        let r = ray(point![0.0, 0.0, 100.0], vector![0.0, 0.0, -1.0]);
        let span = lens_span(&r, &record, |_| true).unwrap();
        assert!((span.enter - 95.0).abs() < 1.0e-3);
        assert!((span.exit - 105.0).abs() < 1.0e-3);
        assert_eq!(span.enter_surface, Surface::Back);
        assert_eq!(span.exit_surface, Surface::Front);
    }

    #[test]
    fn outside_aperture_is_a_miss() {
        let record = lens(35.0, -35.0, 10.0, 15.0);
        // Still inside the body's rim at r = 18, but past the clear aperture.
        let r = ray(point![16.0, 0.0, 100.0], vector![0.0, 0.0, -1.0]);
        assert!(lens_span(&r, &record, |_| true).is_some());
        assert!(intersect(&r, &record, 0).is_none());
        assert!(intersect(&ray(point![20.0, 0.0, 100.0], vector![0.0, 0.0, -1.0]), &record, 0).is_none());
    }

    #[test]
    fn plano_convex_off_axis() {
        let record = lens(0.0, -40.0, 10.0, 15.0);
        let hit = intersect(&ray(point![3.0, 0.0, 100.0], vector![0.0, 0.0, -1.0]), &record, 0).unwrap();
        let sag = 40.0 - (1600.0_f32 - 9.0).sqrt();
        assert!((hit.t - (95.0 + sag)).abs() < 1.0e-3);

        let span = lens_span(&ray(point![3.0, 0.0, 100.0], vector![0.0, 0.0, -1.0]), &record, |_| true).unwrap();
        assert!((span.exit - 105.0).abs() < 1.0e-3);
        assert_eq!(span.exit_surface, Surface::Front);
    }

    #[test]
    fn flat_window() {
        let record = lens(0.0, 0.0, 4.0, 10.0);
        let r = ray(point![0.0, 0.0, 10.0], vector![0.0, 0.5, -1.0]);
        let span = lens_span(&r, &record, |_| true).unwrap();
        assert_eq!(span.enter_surface, Surface::Back);
        assert_eq!(span.exit_surface, Surface::Front);
        assert!((r.at(span.enter).z - 2.0).abs() < 1.0e-4);
        assert!((r.at(span.exit).z + 2.0).abs() < 1.0e-4);

        // Sliding along the plate without ever entering it.
        let parallel = ray(point![0.0, 0.0, 10.0], vector![1.0, 0.0, 0.0]);
        assert!(intersect(&parallel, &record, 0).is_none());
    }

    #[test]
    fn biconcave_has_one_body() {
        let record = lens(-50.0, 50.0, 2.0, 10.0);
        let on_axis = intersect(&ray(point![0.0, 0.0, 100.0], vector![0.0, 0.0, -1.0]), &record, 0).unwrap();
        assert!((on_axis.t - 99.0).abs() < 1.0e-3);

        let r = ray(point![5.0, 0.0, 100.0], vector![0.0, 0.0, -1.0]);
        let span = lens_span(&r, &record, |_| true).unwrap();
        let surface_z = 51.0 - (2500.0_f32 - 25.0).sqrt();
        assert!((r.at(span.enter).z - surface_z).abs() < 1.0e-3);
        assert!((r.at(span.exit).z + surface_z).abs() < 1.0e-3);
    }

    #[test]
    fn lens_entries_strike_the_front_face() {
        let shapes = [lens(35.0, -35.0, 10.0, 15.0), lens(-50.0, 50.0, 2.0, 10.0), lens(0.0, 0.0, 4.0, 10.0), lens(0.0, -30.0, 6.0, 10.0)];
        for record in &shapes {
            for (origin, direction) in [
                (point![3.0, 0.0, 100.0], vector![0.0, 0.0, -1.0]),
                (point![-3.0, 1.0, -100.0], vector![0.0, 0.0, 1.0]),
            ] {
                let r = ray(origin, direction);
                let hit = intersect(&r, record, 0).unwrap();
                assert_eq!(hit.face, Face::Front);
                assert!(hit.normal.dot(r.direction.as_ref()) < 0.0);
                let Target::Lens { entry } = hit.target else {
                    panic!("expected a lens hit");
                };
                let outward = outward_normal(record, entry, &hit.point);
                assert!(outward.dot(r.direction.as_ref()) < 0.0);
            }
        }
    }

    #[test]
    fn ray_from_inside_the_glass_is_not_an_entry() {
        let record = lens(35.0, -35.0, 10.0, 15.0);
        let r = ray(Point3::origin(), vector![0.0, 0.0, -1.0]);
        assert!(intersect(&r, &record, 0).is_none());
        let span = lens_span(&r, &record, |span| span.enter <= EPSILON).unwrap();
        assert!((span.exit - 5.0).abs() < 1.0e-3);
        assert_eq!(span.exit_surface, Surface::Front);
    }

    #[test]
    fn nearest_hit_picks_lowest_t() {
        let records = [
            sphere(point![0.0, 0.0, -50.0], 5.0),
            sphere(point![0.0, 0.0, -20.0], 5.0),
            sphere(point![0.0, 0.0, 20.0], 5.0),
        ];
        let r = ray(Point3::origin(), vector![0.0, 0.0, -1.0]);
        let hit = nearest_hit(&r, &records, None).unwrap();
        assert_eq!(hit.object, 1);
        assert!((hit.t - 15.0).abs() < 1.0e-4);

        let hit = nearest_hit(&r, &records, Some(1)).unwrap();
        assert_eq!(hit.object, 0);
    }

    #[test]
    fn nearest_hit_on_empty_scene() {
        let r = ray(Point3::origin(), vector![0.0, 0.0, -1.0]);
        assert!(nearest_hit(&r, &[], None).is_none());
    }
}
