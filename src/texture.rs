//! Texture loading into color buffers
//!
//! The rasterizer itself never touches the filesystem; these helpers are
//! the external loader collaborator that fills a [`ColorBuffer`] with
//! decoded pixels, or fails with a load error.

use std::path::Path;

use image::GenericImageView;
use thiserror::Error;

use crate::buffer::{Buffer, ColorBuffer};
use crate::types::Color;

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("failed to load texture {path}: {source}")]
    Load {
        path: String,
        source: image::ImageError,
    },
    #[error("failed to decode texture: {0}")]
    Decode(#[from] image::ImageError),
}

/// Load an image file into a buffer of packed pixels
pub fn load_texture<P: AsRef<Path>>(path: P) -> Result<ColorBuffer, TextureError> {
    let path = path.as_ref();
    let img = image::open(path).map_err(|source| TextureError::Load {
        path: path.display().to_string(),
        source,
    })?;

    let buffer = buffer_from_image(img);
    log::info!(
        "loaded texture {} ({}x{})",
        path.display(),
        buffer.width(),
        buffer.height(),
    );
    Ok(buffer)
}

/// Decode raw image bytes (PNG/JPEG/BMP) into a buffer of packed pixels
pub fn texture_from_bytes(bytes: &[u8]) -> Result<ColorBuffer, TextureError> {
    let img = image::load_from_memory(bytes)?;
    Ok(buffer_from_image(img))
}

fn buffer_from_image(img: image::DynamicImage) -> ColorBuffer {
    let (width, height) = img.dimensions();
    let rgba = img.to_rgba8();

    let mut buffer = Buffer::new(width as usize, height as usize);
    for (pixel, target) in rgba.pixels().zip(buffer.data_mut()) {
        *target = Color::with_alpha(pixel[0], pixel[1], pixel[2], pixel[3]);
    }
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_a_load_error() {
        let result = load_texture("/nonexistent/texture.png");
        assert!(matches!(result, Err(TextureError::Load { .. })));
    }

    #[test]
    fn test_garbage_bytes_are_a_decode_error() {
        let result = texture_from_bytes(&[0x00, 0x01, 0x02, 0x03]);
        assert!(result.is_err());
    }
}
