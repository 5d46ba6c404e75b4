/// Resource module - CPU-side asset data and its uploaded GPU counterparts

pub mod mesh;

pub use mesh::*;
