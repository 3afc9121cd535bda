//! Core compute primitives.
//!
//! `Matrix<f32>` carries transformed feature rows between the
//! preprocessing stage and the tree ensemble.

mod matrix;

pub use matrix::Matrix;
