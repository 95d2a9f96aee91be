//! 4-wide lane types for vectorized pixel and texel access
//!
//! Scalar four-lane implementation with standard SIMD semantics:
//! elementwise arithmetic, shifts, conversions, and masked gather/scatter.
//! Masked-off lanes are never read from or written to memory, and their
//! in-register values are unspecified (zero here); callers must not rely
//! on them.

use std::ops::{Add, BitAnd, BitOr, Div, Mul, Not, Shl, Shr, Sub};

use crate::types::Color;

/// Number of lanes in every quad type
pub const LANES: usize = 4;

/// Per-lane boolean mask
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuadMask {
    lanes: [bool; LANES],
}

impl QuadMask {
    pub const ALL: QuadMask = QuadMask { lanes: [true; LANES] };
    pub const NONE: QuadMask = QuadMask { lanes: [false; LANES] };

    pub fn new(lanes: [bool; LANES]) -> Self {
        Self { lanes }
    }

    pub fn lane(self, index: usize) -> bool {
        self.lanes[index]
    }

    pub fn any(self) -> bool {
        self.lanes.iter().any(|&set| set)
    }

    pub fn all(self) -> bool {
        self.lanes.iter().all(|&set| set)
    }
}

impl BitAnd for QuadMask {
    type Output = QuadMask;
    fn bitand(self, rhs: QuadMask) -> QuadMask {
        let mut lanes = [false; LANES];
        for i in 0..LANES {
            lanes[i] = self.lanes[i] && rhs.lanes[i];
        }
        QuadMask { lanes }
    }
}

impl BitOr for QuadMask {
    type Output = QuadMask;
    fn bitor(self, rhs: QuadMask) -> QuadMask {
        let mut lanes = [false; LANES];
        for i in 0..LANES {
            lanes[i] = self.lanes[i] || rhs.lanes[i];
        }
        QuadMask { lanes }
    }
}

impl Not for QuadMask {
    type Output = QuadMask;
    fn not(self) -> QuadMask {
        let mut lanes = [false; LANES];
        for i in 0..LANES {
            lanes[i] = !self.lanes[i];
        }
        QuadMask { lanes }
    }
}

/// Four f32 lanes
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QuadFloat {
    lanes: [f32; LANES],
}

impl QuadFloat {
    pub fn splat(value: f32) -> Self {
        Self { lanes: [value; LANES] }
    }

    pub fn new(lanes: [f32; LANES]) -> Self {
        Self { lanes }
    }

    /// `[start, start+1, start+2, start+3]`, the per-lane pixel columns
    /// of a span chunk
    pub fn sequence(start: f32) -> Self {
        Self { lanes: [start, start + 1.0, start + 2.0, start + 3.0] }
    }

    pub fn lane(self, index: usize) -> f32 {
        self.lanes[index]
    }

    pub fn round(self) -> Self {
        Self { lanes: self.lanes.map(f32::round) }
    }

    pub fn floor(self) -> Self {
        Self { lanes: self.lanes.map(f32::floor) }
    }

    pub fn clamp(self, min: f32, max: f32) -> Self {
        Self { lanes: self.lanes.map(|v| v.clamp(min, max)) }
    }

    /// Lanewise `self < rhs`
    pub fn lt(self, rhs: QuadFloat) -> QuadMask {
        let mut lanes = [false; LANES];
        for i in 0..LANES {
            lanes[i] = self.lanes[i] < rhs.lanes[i];
        }
        QuadMask::new(lanes)
    }

    /// Truncating float -> int conversion
    pub fn to_int(self) -> QuadInt {
        QuadInt { lanes: self.lanes.map(|v| v as i32) }
    }

    /// Masked contiguous load of 4 lanes starting at `index`
    pub fn load(source: &[f32], index: usize, mask: QuadMask) -> Self {
        let mut lanes = [0.0; LANES];
        for i in 0..LANES {
            if mask.lane(i) {
                lanes[i] = source[index + i];
            }
        }
        Self { lanes }
    }

    /// Masked contiguous store of 4 lanes starting at `index`
    pub fn store(self, target: &mut [f32], index: usize, mask: QuadMask) {
        for i in 0..LANES {
            if mask.lane(i) {
                target[index + i] = self.lanes[i];
            }
        }
    }
}

impl Add for QuadFloat {
    type Output = QuadFloat;
    fn add(self, rhs: QuadFloat) -> QuadFloat {
        let mut lanes = [0.0; LANES];
        for i in 0..LANES {
            lanes[i] = self.lanes[i] + rhs.lanes[i];
        }
        QuadFloat { lanes }
    }
}

impl Sub for QuadFloat {
    type Output = QuadFloat;
    fn sub(self, rhs: QuadFloat) -> QuadFloat {
        let mut lanes = [0.0; LANES];
        for i in 0..LANES {
            lanes[i] = self.lanes[i] - rhs.lanes[i];
        }
        QuadFloat { lanes }
    }
}

impl Mul for QuadFloat {
    type Output = QuadFloat;
    fn mul(self, rhs: QuadFloat) -> QuadFloat {
        let mut lanes = [0.0; LANES];
        for i in 0..LANES {
            lanes[i] = self.lanes[i] * rhs.lanes[i];
        }
        QuadFloat { lanes }
    }
}

impl Div for QuadFloat {
    type Output = QuadFloat;
    fn div(self, rhs: QuadFloat) -> QuadFloat {
        let mut lanes = [0.0; LANES];
        for i in 0..LANES {
            lanes[i] = self.lanes[i] / rhs.lanes[i];
        }
        QuadFloat { lanes }
    }
}

impl Mul<f32> for QuadFloat {
    type Output = QuadFloat;
    fn mul(self, rhs: f32) -> QuadFloat {
        QuadFloat { lanes: self.lanes.map(|v| v * rhs) }
    }
}

/// Four i32 lanes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuadInt {
    lanes: [i32; LANES],
}

impl QuadInt {
    pub fn splat(value: i32) -> Self {
        Self { lanes: [value; LANES] }
    }

    pub fn new(lanes: [i32; LANES]) -> Self {
        Self { lanes }
    }

    pub fn lane(self, index: usize) -> i32 {
        self.lanes[index]
    }

    pub fn to_float(self) -> QuadFloat {
        QuadFloat::new(self.lanes.map(|v| v as f32))
    }

    /// Read `base[self.lane(i)]` for every set mask lane, treating `self`
    /// as per-lane offsets. Cleared lanes stay zero and must not be read
    /// by the caller.
    pub fn gather_at_offsets(self, base: &[i32], mask: QuadMask) -> QuadInt {
        let mut lanes = [0; LANES];
        for i in 0..LANES {
            if mask.lane(i) {
                lanes[i] = base[self.lanes[i] as usize];
            }
        }
        QuadInt { lanes }
    }

    /// Masked contiguous store of 4 lanes starting at `index`
    pub fn write(self, target: &mut [i32], index: usize, mask: QuadMask) {
        for i in 0..LANES {
            if mask.lane(i) {
                target[index + i] = self.lanes[i];
            }
        }
    }
}

impl Add for QuadInt {
    type Output = QuadInt;
    fn add(self, rhs: QuadInt) -> QuadInt {
        let mut lanes = [0; LANES];
        for i in 0..LANES {
            lanes[i] = self.lanes[i].wrapping_add(rhs.lanes[i]);
        }
        QuadInt { lanes }
    }
}

impl Mul for QuadInt {
    type Output = QuadInt;
    fn mul(self, rhs: QuadInt) -> QuadInt {
        let mut lanes = [0; LANES];
        for i in 0..LANES {
            lanes[i] = self.lanes[i].wrapping_mul(rhs.lanes[i]);
        }
        QuadInt { lanes }
    }
}

impl BitAnd for QuadInt {
    type Output = QuadInt;
    fn bitand(self, rhs: QuadInt) -> QuadInt {
        let mut lanes = [0; LANES];
        for i in 0..LANES {
            lanes[i] = self.lanes[i] & rhs.lanes[i];
        }
        QuadInt { lanes }
    }
}

impl BitOr for QuadInt {
    type Output = QuadInt;
    fn bitor(self, rhs: QuadInt) -> QuadInt {
        let mut lanes = [0; LANES];
        for i in 0..LANES {
            lanes[i] = self.lanes[i] | rhs.lanes[i];
        }
        QuadInt { lanes }
    }
}

impl Shl<u32> for QuadInt {
    type Output = QuadInt;
    fn shl(self, rhs: u32) -> QuadInt {
        QuadInt { lanes: self.lanes.map(|v| v << rhs) }
    }
}

impl Shr<u32> for QuadInt {
    type Output = QuadInt;
    fn shr(self, rhs: u32) -> QuadInt {
        QuadInt { lanes: self.lanes.map(|v| ((v as u32) >> rhs) as i32) }
    }
}

/// Four 2D vectors in lane-planar layout (texture coordinates)
#[derive(Debug, Clone, Copy, Default)]
pub struct QuadVec2 {
    pub x: QuadFloat,
    pub y: QuadFloat,
}

impl QuadVec2 {
    pub fn new(x: QuadFloat, y: QuadFloat) -> Self {
        Self { x, y }
    }

    pub fn splat(x: f32, y: f32) -> Self {
        Self { x: QuadFloat::splat(x), y: QuadFloat::splat(y) }
    }
}

impl Add for QuadVec2 {
    type Output = QuadVec2;
    fn add(self, rhs: QuadVec2) -> QuadVec2 {
        QuadVec2 { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl Mul<QuadFloat> for QuadVec2 {
    type Output = QuadVec2;
    fn mul(self, rhs: QuadFloat) -> QuadVec2 {
        QuadVec2 { x: self.x * rhs, y: self.y * rhs }
    }
}

impl Div<QuadFloat> for QuadVec2 {
    type Output = QuadVec2;
    fn div(self, rhs: QuadFloat) -> QuadVec2 {
        QuadVec2 { x: self.x / rhs, y: self.y / rhs }
    }
}

/// Four 4D vectors in lane-planar layout
#[derive(Debug, Clone, Copy, Default)]
pub struct QuadVec4 {
    pub x: QuadFloat,
    pub y: QuadFloat,
    pub z: QuadFloat,
    pub w: QuadFloat,
}

impl QuadVec4 {
    pub fn new(x: QuadFloat, y: QuadFloat, z: QuadFloat, w: QuadFloat) -> Self {
        Self { x, y, z, w }
    }
}

impl Add for QuadVec4 {
    type Output = QuadVec4;
    fn add(self, rhs: QuadVec4) -> QuadVec4 {
        QuadVec4 {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
            w: self.w + rhs.w,
        }
    }
}

impl Mul<QuadFloat> for QuadVec4 {
    type Output = QuadVec4;
    fn mul(self, rhs: QuadFloat) -> QuadVec4 {
        QuadVec4 {
            x: self.x * rhs,
            y: self.y * rhs,
            z: self.z * rhs,
            w: self.w * rhs,
        }
    }
}

const BYTE_MASK: QuadInt = QuadInt { lanes: [0xFF; LANES] };

// Color's memory layout is the packed BGRA word, so texel storage can be
// viewed as i32 words for the generic lane gather/scatter.
const _: () = assert!(std::mem::size_of::<Color>() == std::mem::size_of::<i32>());
const _: () = assert!(std::mem::align_of::<Color>() == std::mem::align_of::<i32>());

fn color_words(colors: &[Color]) -> &[i32] {
    unsafe { std::slice::from_raw_parts(colors.as_ptr() as *const i32, colors.len()) }
}

fn color_words_mut(colors: &mut [Color]) -> &mut [i32] {
    unsafe { std::slice::from_raw_parts_mut(colors.as_mut_ptr() as *mut i32, colors.len()) }
}

/// Four colors unpacked into planar channel lanes
///
/// Gathered from packed BGRA words and written back the same way; the
/// unpack -> repack round trip is exact for integer channels in 0..=255.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuadColor {
    r: QuadFloat,
    g: QuadFloat,
    b: QuadFloat,
    a: QuadFloat,
}

impl QuadColor {
    pub fn from_channels(r: QuadFloat, g: QuadFloat, b: QuadFloat, a: QuadFloat) -> Self {
        Self { r, g, b, a }
    }

    /// Gather 4 packed colors at `base[offsets.lane(i)]` where the mask
    /// is set and unpack them into channel lanes
    pub fn gather(base: &[Color], offsets: QuadInt, mask: QuadMask) -> Self {
        let words = offsets.gather_at_offsets(color_words(base), mask);

        let b_values = words & BYTE_MASK;
        let g_values = (words >> 8) & BYTE_MASK;
        let r_values = (words >> 16) & BYTE_MASK;
        let a_values = (words >> 24) & BYTE_MASK;

        Self {
            r: r_values.to_float(),
            g: g_values.to_float(),
            b: b_values.to_float(),
            a: a_values.to_float(),
        }
    }

    /// Round each channel to nearest, repack, and scatter to 4
    /// contiguous pixels starting at `index`, honoring the mask
    pub fn write(self, target: &mut [Color], index: usize, mask: QuadMask) {
        let r = self.r.round().to_int() << 16;
        let g = self.g.round().to_int() << 8;
        let b = self.b.round().to_int();
        let a = self.a.round().to_int() << 24;

        (r | g | b | a).write(color_words_mut(target), index, mask);
    }

    /// Channel lanes as a vector in buffer byte order (x=b, y=g, z=r, w=a)
    pub fn to_vector(self) -> QuadVec4 {
        QuadVec4::new(self.b, self.g, self.r, self.a)
    }

    pub fn from_vector(vec: QuadVec4) -> Self {
        Self { b: vec.x, g: vec.y, r: vec.z, a: vec.w }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_arithmetic_is_elementwise() {
        let a = QuadFloat::new([1.0, 2.0, 3.0, 4.0]);
        let b = QuadFloat::splat(2.0);
        let sum = a + b;
        let product = a * b;
        assert_eq!(sum.lane(0), 3.0);
        assert_eq!(sum.lane(3), 6.0);
        assert_eq!(product.lane(2), 6.0);
    }

    #[test]
    fn test_float_to_int_truncates() {
        let v = QuadFloat::new([1.9, -0.5, 2.5, 0.0]).to_int();
        assert_eq!(v, QuadInt::new([1, 0, 2, 0]));
    }

    #[test]
    fn test_round_is_nearest() {
        let v = QuadFloat::new([1.4, 1.6, 254.5, 0.49]).round();
        assert_eq!(v.lane(0), 1.0);
        assert_eq!(v.lane(1), 2.0);
        assert_eq!(v.lane(2), 255.0);
        assert_eq!(v.lane(3), 0.0);
    }

    #[test]
    fn test_int_shifts_and_bitwise() {
        let v = QuadInt::splat(0x4411_2233u32 as i32);
        assert_eq!(((v >> 8) & QuadInt::splat(0xFF)).lane(0), 0x22);
        assert_eq!(((v >> 24) & QuadInt::splat(0xFF)).lane(0), 0x44);
        assert_eq!((QuadInt::splat(1) << 16).lane(0), 0x1_0000);
    }

    #[test]
    fn test_gather_skips_masked_lanes() {
        let base = [10, 20, 30, 40, 50];
        let offsets = QuadInt::new([4, 1000, 0, 1000]);
        let mask = QuadMask::new([true, false, true, false]);
        let gathered = offsets.gather_at_offsets(&base, mask);
        // Masked-off lanes never touch memory, even with wild offsets
        assert_eq!(gathered.lane(0), 50);
        assert_eq!(gathered.lane(2), 10);
    }

    #[test]
    fn test_masked_store_leaves_other_lanes() {
        let mut target = [0.0; 6];
        let mask = QuadMask::new([true, false, true, false]);
        QuadFloat::new([1.0, 2.0, 3.0, 4.0]).store(&mut target, 1, mask);
        assert_eq!(target, [0.0, 1.0, 0.0, 3.0, 0.0, 0.0]);
    }

    #[test]
    fn test_color_word_view_matches_packed_form() {
        // The word view the gather/scatter path relies on must agree
        // with Color::pack exactly
        let colors = [
            Color::with_alpha(0x11, 0x22, 0x33, 0x44),
            Color::BLACK,
            Color::WHITE,
            Color::with_alpha(255, 0, 128, 1),
        ];
        for (word, color) in color_words(&colors).iter().zip(&colors) {
            assert_eq!(*word as u32, color.pack());
        }
    }

    #[test]
    fn test_quad_color_round_trip() {
        let source = [
            Color::with_alpha(1, 2, 3, 4),
            Color::with_alpha(255, 0, 128, 255),
            Color::with_alpha(0, 255, 0, 0),
            Color::with_alpha(17, 34, 51, 68),
        ];
        let offsets = QuadInt::new([0, 1, 2, 3]);
        let gathered = QuadColor::gather(&source, offsets, QuadMask::ALL);

        let mut target = [Color::BLACK; 4];
        gathered.write(&mut target, 0, QuadMask::ALL);
        assert_eq!(target, source);
    }

    #[test]
    fn test_quad_color_write_respects_mask() {
        let source = [Color::WHITE; 4];
        let gathered = QuadColor::gather(&source, QuadInt::new([0, 1, 2, 3]), QuadMask::ALL);

        let mut target = [Color::BLACK; 4];
        gathered.write(&mut target, 0, QuadMask::new([false, true, false, true]));
        assert_eq!(target[0], Color::BLACK);
        assert_eq!(target[1], Color::WHITE);
        assert_eq!(target[2], Color::BLACK);
        assert_eq!(target[3], Color::WHITE);
    }

    #[test]
    fn test_quad_color_vector_mapping() {
        let source = [Color::with_alpha(10, 20, 30, 40); 4];
        let color = QuadColor::gather(&source, QuadInt::new([0, 1, 2, 3]), QuadMask::ALL);
        let vec = color.to_vector();
        assert_eq!(vec.x.lane(0), 30.0); // b
        assert_eq!(vec.y.lane(0), 20.0); // g
        assert_eq!(vec.z.lane(0), 10.0); // r
        assert_eq!(vec.w.lane(0), 40.0); // a

        let mut target = [Color::BLACK; 4];
        QuadColor::from_vector(vec).write(&mut target, 0, QuadMask::ALL);
        assert_eq!(target[0], source[0]);
    }
}
