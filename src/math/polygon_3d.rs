use super::{Point3, Vector3, TOLERANCE};

/// An orthonormal frame on a plane, used to project planar loops to 2D.
///
/// `u_dir × v_dir = normal`, so a loop that winds counter-clockwise around
/// `normal` also winds counter-clockwise in `(u, v)`.
#[derive(Debug, Clone)]
pub struct PlaneFrame {
    origin: Point3,
    u_dir: Vector3,
    v_dir: Vector3,
    normal: Vector3,
}

impl PlaneFrame {
    /// Creates a frame from an origin and a normal vector.
    ///
    /// Returns `None` if the normal is zero-length.
    #[must_use]
    pub fn from_normal(origin: Point3, normal: &Vector3) -> Option<Self> {
        let len = normal.norm();
        if len < TOLERANCE {
            return None;
        }
        let normal = normal / len;

        // Choose a reference vector not parallel to the normal
        let reference = if normal.x.abs() < 0.9 {
            Vector3::x()
        } else {
            Vector3::y()
        };

        let u_dir = normal.cross(&reference).normalize();
        let v_dir = normal.cross(&u_dir);

        Some(Self {
            origin,
            u_dir,
            v_dir,
            normal,
        })
    }

    /// Returns the unit normal of the plane.
    #[must_use]
    pub fn normal(&self) -> &Vector3 {
        &self.normal
    }

    /// Projects a point into `(u, v)` plane coordinates.
    #[must_use]
    pub fn project(&self, p: &Point3) -> (f64, f64) {
        let d = p - self.origin;
        (d.dot(&self.u_dir), d.dot(&self.v_dir))
    }

    /// Lifts `(u, v)` plane coordinates back to 3D.
    #[must_use]
    pub fn lift(&self, u: f64, v: f64) -> Point3 {
        self.origin + self.u_dir * u + self.v_dir * v
    }
}

/// Computes the (unnormalized) polygon normal using Newell's method.
///
/// The length of the result is twice the polygon area.
#[must_use]
pub fn newell_normal(points: &[Point3]) -> Vector3 {
    let n = points.len();
    let mut normal = Vector3::zeros();
    for i in 0..n {
        let curr = &points[i];
        let next = &points[(i + 1) % n];
        normal.x += (curr.y - next.y) * (curr.z + next.z);
        normal.y += (curr.z - next.z) * (curr.x + next.x);
        normal.z += (curr.x - next.x) * (curr.y + next.y);
    }
    normal
}

/// Computes the centroid of a set of points.
#[must_use]
pub fn centroid(points: &[Point3]) -> Point3 {
    if points.is_empty() {
        return Point3::origin();
    }
    #[allow(clippy::cast_precision_loss)]
    let inv_n = 1.0 / points.len() as f64;
    Point3::new(
        points.iter().map(|p| p.x).sum::<f64>() * inv_n,
        points.iter().map(|p| p.y).sum::<f64>() * inv_n,
        points.iter().map(|p| p.z).sum::<f64>() * inv_n,
    )
}

/// Area of the triangle `(a, b, c)`.
#[must_use]
pub fn triangle_area(a: &Point3, b: &Point3, c: &Point3) -> f64 {
    (b - a).cross(&(c - a)).norm() * 0.5
}

/// Unit normal of the triangle `(a, b, c)`, or `None` if it is degenerate.
#[must_use]
pub fn triangle_normal(a: &Point3, b: &Point3, c: &Point3) -> Option<Vector3> {
    let n = (b - a).cross(&(c - a));
    let len = n.norm();
    (len > TOLERANCE).then(|| n / len)
}
