pub mod cache;
pub mod error;
pub mod export;
pub mod io;
pub mod math;
pub mod model;
pub mod scheduler;
pub mod tessellation;
pub mod traversal;

#[cfg(test)]
mod test_support;

pub use error::{FacetError, Result};
