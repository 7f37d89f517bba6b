//! Synthetic scene generation for detector validation.
//!
//! Scenes are grayscale images with a uniform light background and uniform
//! dark circular particles. Every particle's center and radius are returned
//! exactly as drawn, so the list doubles as the scoring baseline.
//!
//! Two layouts are available:
//! - [`generate_scatter`]: random radii and positions, overlap allowed;
//! - [`generate_grid`]: equal circles on a regular lattice.
//!
//! Scatter placement is seeded ([`DEFAULT_SCENE_SEED`] unless overridden);
//! nondeterministic scenes must be requested with
//! [`ScatterParams::with_entropy`].

mod generate;
mod params;
mod raster;

pub use generate::{generate_grid, generate_scatter, SyntheticScene};
pub use params::{
    GridParams, GridSpacing, ScatterParams, SceneError, SceneStyle, DEFAULT_SCENE_SEED,
};
pub use raster::fill_disk;
