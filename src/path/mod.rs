//! Field paths over untyped JSON.
//!
//! [`flatten`] enumerates paths, [`exists`] checks them; both speak the
//! grammar defined in [`segment`], so every flattened path resolves.

mod flatten;
mod resolve;
pub mod segment;

pub use flatten::{FlattenPaths, flatten};
pub use resolve::{exists, resolve};
pub use segment::PathSegment;
