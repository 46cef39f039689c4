//! Recursive ray tracer.
//!
//! A [`space::Space`] holds the primitives and lights of a scene, accelerated by a
//! [`kdtree::KdTree`], and computes the color seen along a ray with a recursive
//! Phong integrator that follows shadow, reflected and transmitted rays.

pub mod camera;
pub mod config;
pub mod error;
pub mod geometry;
pub mod kdtree;
pub mod light;
pub mod material;
pub mod primitives;
pub mod ray;
pub mod render;
pub mod space;
pub mod textures;

pub use error::{RenderError, Result};
