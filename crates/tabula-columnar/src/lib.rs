//! Column vector model for the tabula table pipeline.
//!
//! This crate is the seam between a table source/sink and the host engine:
//! - Typed column vectors with validity masks, batched into [`DataChunk`]s of
//!   at most [`STANDARD_VECTOR_SIZE`] rows.
//! - The [`LogicalType`] lattice the reader infers into and the writer
//!   projects out of.
//! - Text [`cast`] routines: every cell is materialized as text first and
//!   cast per column afterwards.

#![forbid(unsafe_code)]

mod bitmap;
pub mod cast;
mod types;
mod vector;

pub use crate::bitmap::Bitmap;
pub use crate::types::LogicalType;
pub use crate::vector::{DataChunk, Value, Vector, STANDARD_VECTOR_SIZE};
