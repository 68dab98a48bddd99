//! Drawing for lake data: colormap lookup, PNG charts of labelled arrays
//! and GIF animations of model sections.

pub mod animate;
pub mod colormap;
pub mod render;
