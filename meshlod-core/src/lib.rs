//! Core data structures for meshlod
//!
//! This crate provides the mesh value type exchanged between the loader,
//! the simplification engine, and the rest of the asset pipeline: an
//! interleaved vertex buffer with a declared attribute layout plus a
//! triangle index buffer.

pub mod error;
pub mod mesh;

pub use error::*;
pub use mesh::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3};

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;
