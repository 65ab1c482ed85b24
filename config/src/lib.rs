//! Shared configuration crate holding constants used across the workspace.
//!
//! The `constants` module centralizes tolerances, tessellation defaults, and
//! safety limits so downstream crates avoid sprinkling magic numbers.
//!
//! ```
//! use config::constants::{EPSILON, DEFAULT_DETAIL};
//!
//! assert!(EPSILON < 1.0e-6);
//! assert!(DEFAULT_DETAIL >= 4);
//! ```

pub mod constants;

pub use constants::{
    BSP_PLANE_SAMPLE, BSP_SPLIT_PENALTY, DEFAULT_DETAIL, EPSILON, MAX_IMPORT_DEPTH, MIN_DETAIL,
    STACK_GROW_BYTES, STACK_RED_ZONE_BYTES,
};
