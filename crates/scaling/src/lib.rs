//! Rescaling composite for pseudo-Boolean samplers.
//!
//! Wraps any [`Sampler`] so the models it receives have biases within
//! caller-specified magnitude ranges, then maps returned energies back to
//! the original units. Uses trait-based abstraction so the pipeline can be
//! tested with mocks (no hardware solver).
//!
//! # Key types
//!
//! - [`ScaleComposite`] — the decorator driving normalize → scale → sample → restore
//! - [`ScaleOptions`] / [`BiasRange`] — per-call configuration, loadable from TOML
//! - [`Exclusions`] — variables and interactions left unscaled
//! - [`Sampler`] — trait for the wrapped solver
//! - [`ModelOrder`] — pairwise vs higher-order classification

pub mod composite;
pub mod config;
pub mod exclusions;
pub mod mocks;
pub mod scalar;
pub mod scaler;

pub use composite::{IsingTerms, Properties, ScaleComposite, ScaleError, ScaleRequest, Sampler};
pub use config::{load_scale_toml, BiasRange, Parameters, ScaleOptions, ScaleToml, SCALING_PARAMETERS};
pub use exclusions::{normalize, Exclusions, InteractionKey};
pub use scalar::calc_norm_coeff;
pub use scaler::{scale_hyper, scale_pairwise, ModelOrder};
