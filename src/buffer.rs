//! Fixed-size 2D buffers for colors and depth values

use crate::types::Color;

/// Texture coordinate normalization policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapMode {
    /// Saturate coordinates to `[0, 1 - epsilon]`
    Clamp,
    /// Tile by subtracting the floor of the coordinate
    Wrap,
}

/// Row-major `width * height` array of `T` with fixed dimensions
#[derive(Debug, Clone)]
pub struct Buffer<T> {
    width: usize,
    height: usize,
    float_width: f32,
    float_height: f32,
    data: Vec<T>,
}

pub type ColorBuffer = Buffer<Color>;
pub type DepthBuffer = Buffer<f32>;

impl<T: Copy + Default> Buffer<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            float_width: width as f32,
            float_height: height as f32,
            data: vec![T::default(); width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Exact access; out-of-range coordinates are a programming error
    /// and panic. Both axes are checked, so an overflowing `x` cannot
    /// alias into the next row.
    pub fn at(&self, x: usize, y: usize) -> T {
        assert!(x < self.width && y < self.height, "buffer access out of range");
        self.data[y * self.width + x]
    }

    pub fn at_mut(&mut self, x: usize, y: usize) -> &mut T {
        assert!(x < self.width && y < self.height, "buffer access out of range");
        &mut self.data[y * self.width + x]
    }

    pub fn fill(&mut self, value: T) {
        for element in &mut self.data {
            *element = value;
        }
    }

    /// Nearest-neighbor sample at normalized coordinates.
    ///
    /// Coordinates are normalized per `mode`, then mapped to a texel by
    /// truncation. No filtering; an interpolated variant is an extension
    /// point, not provided here.
    pub fn sample(&self, x: f32, y: f32, mode: WrapMode) -> T {
        let (x, y) = match mode {
            WrapMode::Clamp => {
                let upper = 1.0 - f32::EPSILON;
                (x.clamp(0.0, upper), y.clamp(0.0, upper))
            }
            WrapMode::Wrap => (x - x.floor(), y - y.floor()),
        };

        self.at(
            (x * self.float_width) as usize,
            (y * self.float_height) as usize,
        )
    }

    /// Raw element slice, row-major. Escape hatch for the quad lane
    /// layer's bulk gather/scatter; offsets computed against it must stay
    /// in bounds.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions_and_fill() {
        let mut buffer: Buffer<f32> = Buffer::new(4, 3);
        assert_eq!(buffer.data().len(), 12);
        buffer.fill(2.5);
        assert_eq!(buffer.at(3, 2), 2.5);
    }

    #[test]
    fn test_row_major_addressing() {
        let mut buffer: Buffer<u32> = Buffer::new(3, 2);
        *buffer.at_mut(2, 1) = 7;
        assert_eq!(buffer.data()[1 * 3 + 2], 7);
    }

    #[test]
    #[should_panic]
    fn test_out_of_range_access_panics() {
        // x = 2 on a 2x2 buffer must not alias into row 1
        let buffer: Buffer<f32> = Buffer::new(2, 2);
        buffer.at(2, 0);
    }

    #[test]
    #[should_panic]
    fn test_out_of_range_mut_access_panics() {
        let mut buffer: Buffer<f32> = Buffer::new(2, 2);
        *buffer.at_mut(0, 2) = 1.0;
    }

    #[test]
    fn test_sample_wrap_tiles() {
        let mut texture: ColorBuffer = Buffer::new(2, 1);
        *texture.at_mut(0, 0) = Color::RED;
        *texture.at_mut(1, 0) = Color::BLUE;

        // u = 1.5 wraps to u = 0.5
        assert_eq!(
            texture.sample(1.5, 0.0, WrapMode::Wrap),
            texture.sample(0.5, 0.0, WrapMode::Wrap),
        );
        assert_eq!(texture.sample(1.5, 0.0, WrapMode::Wrap), Color::BLUE);

        // Negative coordinates tile too
        assert_eq!(texture.sample(-0.25, 0.0, WrapMode::Wrap), Color::BLUE);
    }

    #[test]
    fn test_sample_clamp_saturates() {
        let mut texture: ColorBuffer = Buffer::new(4, 1);
        *texture.at_mut(3, 0) = Color::GREEN;

        // Clamp pins out-of-range coordinates to the last texel
        assert_eq!(texture.sample(1.5, 0.0, WrapMode::Clamp), Color::GREEN);
        assert_eq!(
            texture.sample(1.5, 0.0, WrapMode::Clamp),
            texture.sample(0.999, 0.0, WrapMode::Clamp),
        );
        assert_eq!(texture.sample(-2.0, 0.0, WrapMode::Clamp), texture.at(0, 0));
    }
}
