//! Passes over the lowered HTML tree.
//!
//! Each pass takes a [`Fragment`](crate::html::Fragment) by value and
//! returns the transformed tree. Passes keep no state between calls.

mod anchors;
mod lazy_images;
mod math;
mod outline;

pub use anchors::{AnchorRegistry, inject_anchors, slugify};
pub use lazy_images::{NO_LAZY_ATTR, lazy_load_images};
pub use math::{DelimitedTypesetter, MathError, MathTypesetter, render_math};
pub use outline::{OutlineEntry, collect_outline};
