//! Expands the documentation macros of an annotated memory image into HTML.
//!
//! The steps are:
//! 1. **Scanning** - finding the next `#NAME` in the text
//! 2. **Parsing** - reading the macro's parameters
//! 3. **Expanding** - building the replacement, writing any image it refers to, and splicing it
//!    back into the text before scanning again

/// Page paths, titles and rendering options.
pub mod config;

/// The entries and instructions the cross-reference macros point at.
pub mod disassembly;

/// Tiles, grids, frames and screen memory.
pub mod graphics;

/// Image formats, output files and the raster encoder.
pub mod images;

pub mod instrumentation;

/// The macro dispatcher and its handlers.
pub mod macros;

pub mod markup;

/// The `expand` and `macros` commands.
pub mod render;

/// 64K memory snapshots.
pub mod snapshot;

/// Links to pages, items, entries and images.
pub mod xref;
