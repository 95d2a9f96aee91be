//! Software triangle rasterizer
//!
//! Converts transformed vertices into filled, depth-tested,
//! texture-mapped pixels in an in-memory color buffer, with no hardware
//! pipeline behind it.
//!
//! Features:
//! - Homogeneous-space frustum clipping against all six planes with
//!   recursive re-triangulation
//! - Perspective divide, viewport transform, and scanline fill with a
//!   depth test and perspective-correct texture lookup
//! - 4-wide lane types for masked gather/scatter of pixels and texels
//! - Wrap and clamp texture addressing, nearest-neighbor sampling
//!
//! The color buffer holds packed `B | G<<8 | R<<16 | A<<24` words, ready
//! for presentation surfaces that expect that layout. Windowing, input,
//! and frame pacing are the caller's concern.

mod buffer;
mod clip;
mod math;
mod quad;
mod render;
mod texture;
mod types;

pub use buffer::*;
pub use clip::*;
pub use math::*;
pub use quad::*;
pub use render::*;
pub use texture::*;
pub use types::*;
