//! WebGPU rendering
//!
//! The whole playfield is drawn by a single fullscreen SDF pass; see
//! [`sdf_pipeline`].

pub mod sdf_pipeline;

pub use sdf_pipeline::SdfRenderState;
