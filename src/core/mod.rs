//! Core deterministic primitives.
//!
//! Integer grid coordinates and state hashing. Everything here is free of
//! wall-clock, randomness, and floating-point simulation math, so the
//! engine's behavior depends only on its inputs.

pub mod hash;
pub mod point;

pub use hash::{StateHash, StateHasher};
pub use point::{Direction, Point};
