//! Core types for the machine view.

pub mod slice;
pub mod mode;

pub use slice::{Slice, SliceId, SliceIdError, SliceKind, SliceMeta, SlicePatch, SliceDescriptor};
pub use mode::Mode;
