/// Axial displacement of a curved surface at `radius` from its vertex.
///
/// `curvature` is the signed radius of curvature; `0` is a flat surface. Past
/// the sphere of curvature (`radius >= |curvature|`) the spherical form is
/// undefined and the paraxial parabola is used instead. Both branches meet at
/// `|curvature| / 2`.
pub fn sag(curvature: f32, radius: f32) -> f32 {
    if curvature == 0.0 {
        return 0.0;
    }

    let r = curvature.abs();
    let r2 = radius * radius;
    let offset = if radius.abs() >= r {
        r2 / (2.0 * r)
    } else {
        r2 / (2.0 * r * (1.0 + (1.0 - r2 / (r * r)).sqrt()))
    };

    offset.copysign(curvature)
}
