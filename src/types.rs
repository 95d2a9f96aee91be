//! Core value types for the rasterizer

use std::ops::{Add, Mul, Sub};

use crate::math::{Vec2, Vec3, Vec4};

/// RGBA color (0-255 per channel)
///
/// Packed form is a little-endian `B | G<<8 | R<<16 | A<<24` word, the
/// layout presentation surfaces expect when they reinterpret the color
/// buffer as raw bytes. The struct's own memory layout is fixed to the
/// same byte order and word alignment, so a color buffer can be viewed
/// as packed words without copying (the quad lane layer relies on this).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(C, align(4))]
pub struct Color {
    pub b: u8,
    pub g: u8,
    pub r: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };
    pub const RED: Color = Color { r: 255, g: 0, b: 0, a: 255 };
    pub const GREEN: Color = Color { r: 0, g: 255, b: 0, a: 255 };
    pub const BLUE: Color = Color { r: 0, g: 0, b: 255, a: 255 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn with_alpha(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Pack into the BGRA word layout
    pub fn pack(self) -> u32 {
        (self.b as u32)
            | ((self.g as u32) << 8)
            | ((self.r as u32) << 16)
            | ((self.a as u32) << 24)
    }

    /// Inverse of [`Color::pack`]
    pub fn from_packed(word: u32) -> Self {
        Self {
            b: (word & 0xFF) as u8,
            g: ((word >> 8) & 0xFF) as u8,
            r: ((word >> 16) & 0xFF) as u8,
            a: ((word >> 24) & 0xFF) as u8,
        }
    }
}

/// A clip-space vertex: homogeneous position plus interpolable attributes
///
/// The operator impls exist so edge intersection can be written as
/// `start + (end - start) * alpha`, interpolating every attribute at once.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vertex {
    pub position: Vec4,
    pub normal: Vec3,
    pub tex_coord: Vec2,
}

impl Vertex {
    pub fn new(position: Vec4, normal: Vec3, tex_coord: Vec2) -> Self {
        Self { position, normal, tex_coord }
    }

    pub fn from_pos(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self {
            position: Vec4::new(x, y, z, w),
            normal: Vec3::ZERO,
            tex_coord: Vec2::ZERO,
        }
    }
}

impl Add for Vertex {
    type Output = Vertex;
    fn add(self, rhs: Vertex) -> Vertex {
        Vertex {
            position: self.position + rhs.position,
            normal: self.normal + rhs.normal,
            tex_coord: self.tex_coord + rhs.tex_coord,
        }
    }
}

impl Sub for Vertex {
    type Output = Vertex;
    fn sub(self, rhs: Vertex) -> Vertex {
        Vertex {
            position: self.position - rhs.position,
            normal: self.normal - rhs.normal,
            tex_coord: self.tex_coord - rhs.tex_coord,
        }
    }
}

impl Mul<f32> for Vertex {
    type Output = Vertex;
    fn mul(self, s: f32) -> Vertex {
        Vertex {
            position: self.position * s,
            normal: self.normal * s,
            tex_coord: self.tex_coord * s,
        }
    }
}

/// Primitive topology
///
/// Only `Triangles` (independent triangle list) rasterizes anything.
/// `TriangleStrip` and `TriangleFan` are accepted configuration values
/// but draw nothing; their grouping rules are deliberately unspecified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Triangles,
    TriangleStrip,
    TriangleFan,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_pack_layout() {
        let c = Color::with_alpha(0x11, 0x22, 0x33, 0x44);
        assert_eq!(c.pack(), 0x4411_2233);
    }

    #[test]
    fn test_color_round_trip_every_channel_value() {
        for v in 0..=255u8 {
            for c in [
                Color::with_alpha(v, 0, 0, 255),
                Color::with_alpha(0, v, 0, 255),
                Color::with_alpha(0, 0, v, 255),
                Color::with_alpha(0, 0, 0, v),
            ] {
                assert_eq!(Color::from_packed(c.pack()), c);
            }
        }
    }

    #[test]
    fn test_vertex_interpolation_ops() {
        let a = Vertex::new(
            Vec4::new(0.0, 0.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec2::new(0.0, 0.0),
        );
        let b = Vertex::new(
            Vec4::new(2.0, 4.0, 6.0, 1.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec2::new(1.0, 1.0),
        );
        let mid = a + (b - a) * 0.5;
        assert!((mid.position.x - 1.0).abs() < 0.001);
        assert!((mid.position.z - 3.0).abs() < 0.001);
        assert!((mid.normal.x - 0.5).abs() < 0.001);
        assert!((mid.tex_coord.y - 0.5).abs() < 0.001);
    }
}
