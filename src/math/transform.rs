use super::{Matrix4, Point3, Vector3, TOLERANCE};

/// Transforms a point by a 4x4 matrix (homogeneous coordinates).
#[must_use]
pub fn transform_point(matrix: &Matrix4, point: &Point3) -> Point3 {
    let v = matrix * nalgebra::Vector4::new(point.x, point.y, point.z, 1.0);
    Point3::new(v.x, v.y, v.z)
}

/// Transforms a direction vector by a 4x4 matrix (ignoring translation).
///
/// This is the forward transform, not the inverse transpose, so normals are
/// only exact under rigid or uniformly scaled placements.
#[must_use]
pub fn transform_direction(matrix: &Matrix4, dir: &Vector3) -> Vector3 {
    let v = matrix * nalgebra::Vector4::new(dir.x, dir.y, dir.z, 0.0);
    Vector3::new(v.x, v.y, v.z)
}

/// Composes a link placement under an accumulated ancestor transform.
///
/// The link placement maps the child frame into its parent, and the
/// accumulated transform maps the parent into the root frame, so the link is
/// applied first.
#[must_use]
pub fn compose_placement(accumulated: &Matrix4, link: &Matrix4) -> Matrix4 {
    accumulated * link
}

/// Builds a placement from an axis2 placement (origin, Z axis, X reference).
///
/// The reference direction is projected to be orthogonal to the axis. Falls
/// back to the identity rotation if either direction is degenerate.
#[must_use]
pub fn axis2_placement(location: &Point3, axis: &Vector3, ref_direction: &Vector3) -> Matrix4 {
    let z_len = axis.norm();
    if z_len < TOLERANCE {
        return Matrix4::new_translation(&location.coords);
    }
    let z = axis / z_len;
    let x = ref_direction - z * ref_direction.dot(&z);
    let x_len = x.norm();
    if x_len < TOLERANCE {
        return Matrix4::new_translation(&location.coords);
    }
    let x = x / x_len;
    let y = z.cross(&x);

    #[rustfmt::skip]
    let m = Matrix4::new(
        x.x, y.x, z.x, location.x,
        x.y, y.y, z.y, location.y,
        x.z, y.z, z.z, location.z,
        0.0, 0.0, 0.0, 1.0,
    );
    m
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn translation(x: f64, y: f64, z: f64) -> Matrix4 {
        Matrix4::new_translation(&Vector3::new(x, y, z))
    }

    #[test]
    fn translation_moves_points_not_directions() {
        let m = translation(10.0, 0.0, 0.0);
        let p = transform_point(&m, &Point3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(p, Point3::new(11.0, 2.0, 3.0));
        let d = transform_direction(&m, &Vector3::z());
        assert_relative_eq!(d, Vector3::z());
    }

    #[test]
    fn three_level_chain_matches_direct_composition() {
        // root -> a -> b -> c, each link expressed in its parent frame
        let a = translation(1.0, 0.0, 0.0);
        let b = Matrix4::from_euler_angles(0.0, 0.0, std::f64::consts::FRAC_PI_2);
        let c = translation(0.0, 0.0, 5.0) * Matrix4::new_scaling(2.0);

        let mut acc = Matrix4::identity();
        for link in [&a, &b, &c] {
            acc = compose_placement(&acc, link);
        }

        let local = Point3::new(1.0, 1.0, 1.0);
        let chained = transform_point(&acc, &local);
        let direct = transform_point(&a, &transform_point(&b, &transform_point(&c, &local)));
        assert_relative_eq!(chained, direct, epsilon = 1e-12);
        // (1,1,1) -> scale (2,2,2) -> +z (2,2,7) -> rot z (-2,2,7) -> +x (-1,2,7)
        assert_relative_eq!(chained, Point3::new(-1.0, 2.0, 7.0), epsilon = 1e-12);
    }

    #[test]
    fn composition_is_associative() {
        let a = translation(3.0, -1.0, 0.0);
        let b = Matrix4::from_euler_angles(0.3, 0.0, 1.1);
        let c = translation(0.0, 2.0, 4.0);
        let left = compose_placement(&compose_placement(&a, &b), &c);
        let right = compose_placement(&a, &compose_placement(&b, &c));
        assert_relative_eq!(left, right, epsilon = 1e-12);
    }

    #[test]
    fn axis2_placement_builds_right_handed_frame() {
        let m = axis2_placement(
            &Point3::new(1.0, 2.0, 3.0),
            &Vector3::new(0.0, 0.0, 2.0),
            &Vector3::new(0.0, 1.0, 0.0),
        );
        // X maps to +Y, Z stays Z, so Y maps to -X
        let p = transform_point(&m, &Point3::new(0.0, 1.0, 0.0));
        assert_relative_eq!(p, Point3::new(0.0, 2.0, 3.0), epsilon = 1e-12);
        let q = transform_point(&m, &Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(q, Point3::new(1.0, 3.0, 3.0), epsilon = 1e-12);
    }

    #[test]
    fn degenerate_axis2_keeps_translation() {
        let m = axis2_placement(&Point3::new(4.0, 0.0, 0.0), &Vector3::zeros(), &Vector3::x());
        assert_relative_eq!(m, translation(4.0, 0.0, 0.0));
    }
}
