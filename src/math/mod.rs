pub mod bounding_box;
pub mod polygon_3d;
pub mod transform;

pub use bounding_box::BoundingBox;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// 4x4 transformation matrix.
///
/// Column-vector convention: a point `p` in a child frame lands in the parent
/// frame at `m * p`, so translation lives in the fourth column.
pub type Matrix4 = nalgebra::Matrix4<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;
