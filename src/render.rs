//! Pipeline driver and scanline triangle fill

use crate::buffer::{ColorBuffer, DepthBuffer, WrapMode};
use crate::clip::Clipper;
use crate::math::{Mat4, Vec2, Vec4};
use crate::quad::{QuadColor, QuadFloat, QuadInt, QuadMask, QuadVec2, LANES};
use crate::types::{Primitive, Vertex};

/// Software rasterizer: transforms vertices by a single combined matrix,
/// clips each triangle against the frustum, and scanline-fills the
/// surviving pieces into caller-owned color and depth buffers.
///
/// `draw` is synchronous and single-threaded; triangles are filled in
/// input order. Clear the depth buffer to `f32::MAX` between frames.
pub struct Rasterizer {
    matrix: Mat4,
    primitive: Primitive,
    texture_wrap: WrapMode,
    clipper: Clipper,
}

/// Post-divide vertex: screen-space x/y, NDC z, and the attributes the
/// fill interpolates
#[derive(Debug, Clone, Copy)]
struct ScreenVertex {
    position: Vec4,
    tex_coord: Vec2,
    inverse_w: f32,
}

impl Rasterizer {
    pub fn new() -> Self {
        Self {
            matrix: Mat4::IDENTITY,
            primitive: Primitive::Triangles,
            texture_wrap: WrapMode::Wrap,
            clipper: Clipper::new(),
        }
    }

    pub fn set_matrix(&mut self, matrix: Mat4) {
        self.matrix = matrix;
    }

    pub fn set_primitive(&mut self, primitive: Primitive) {
        self.primitive = primitive;
    }

    pub fn set_texture_wrap(&mut self, mode: WrapMode) {
        self.texture_wrap = mode;
    }

    /// Rasterize `vertices` into `color_buffer`/`depth_buffer`.
    ///
    /// Zero-sized buffers make this a no-op. With the `Triangles`
    /// topology every 3 consecutive vertices form one triangle and 1-2
    /// trailing vertices are ignored; `TriangleStrip` and `TriangleFan`
    /// draw nothing. The texture is read-only and must not alias the
    /// output buffers.
    pub fn draw(
        &self,
        vertices: &[Vertex],
        texture: &ColorBuffer,
        color_buffer: &mut ColorBuffer,
        depth_buffer: &mut DepthBuffer,
    ) {
        if color_buffer.width() == 0
            || color_buffer.height() == 0
            || depth_buffer.width() == 0
            || depth_buffer.height() == 0
        {
            return;
        }

        assert_eq!(color_buffer.width(), depth_buffer.width(), "buffer width mismatch");
        assert_eq!(color_buffer.height(), depth_buffer.height(), "buffer height mismatch");

        let half_width = color_buffer.width() as f32 / 2.0 - 0.0001;
        let half_height = color_buffer.height() as f32 / 2.0 - 0.0001;

        let transformed: Vec<Vertex> = vertices
            .iter()
            .map(|vertex| Vertex {
                position: self.matrix * vertex.position,
                ..*vertex
            })
            .collect();

        match self.primitive {
            Primitive::Triangles => {
                for triangle in transformed.chunks_exact(3) {
                    let triangle = [triangle[0], triangle[1], triangle[2]];
                    for piece in self.clipper.clip(triangle) {
                        draw_triangle(
                            piece,
                            texture,
                            self.texture_wrap,
                            half_width,
                            half_height,
                            color_buffer,
                            depth_buffer,
                        );
                    }
                }
            }
            Primitive::TriangleStrip | Primitive::TriangleFan => {
                log::debug!("{:?} topology configured; nothing drawn", self.primitive);
            }
        }
    }
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Signed area orientation of the screen-space projection; non-negative
/// means back-facing under the fixed winding convention
fn orient_point(line_start: Vec4, line_end: Vec4, point: Vec4) -> f32 {
    (line_end.x - line_start.x) * (point.y - line_start.y)
        - (line_end.y - line_start.y) * (point.x - line_start.x)
}

fn draw_triangle(
    vertices: [Vertex; 3],
    texture: &ColorBuffer,
    texture_wrap: WrapMode,
    half_width: f32,
    half_height: f32,
    color_buffer: &mut ColorBuffer,
    depth_buffer: &mut DepthBuffer,
) {
    // Perspective divide, recording 1/w for perspective-correct
    // interpolation later
    let mut screen = vertices.map(|vertex| {
        let inverse_w = 1.0 / vertex.position.w;
        ScreenVertex {
            position: vertex.position * inverse_w,
            tex_coord: vertex.tex_coord,
            inverse_w,
        }
    });

    // Backface cull in NDC
    if orient_point(screen[0].position, screen[1].position, screen[2].position) >= 0.0 {
        return;
    }

    // Viewport transform (row 0 is the top of the buffer, so Y flips)
    // plus the half-pixel shift that aligns samples to pixel centers
    for vertex in &mut screen {
        vertex.position.x = vertex.position.x * half_width + half_width - 0.5;
        vertex.position.y = half_height - vertex.position.y * half_height - 0.5;
    }

    // Stable sort by ascending screen Y: top, middle, bottom
    for _ in 0..2 {
        for i in 0..2 {
            if screen[i].position.y > screen[i + 1].position.y {
                screen.swap(i, i + 1);
            }
        }
    }

    fill_triangle(&screen, texture, texture_wrap, color_buffer, depth_buffer);
}

/// Barycentric setup over the shifted screen-space triangle, with
/// premultiplied `1/w` attributes for perspective-correct lookup
struct SpanAttributes {
    x: [f32; 3],
    y: [f32; 3],
    z: [f32; 3],
    inverse_w: [f32; 3],
    u_over_w: [f32; 3],
    v_over_w: [f32; 3],
    inverse_denom: f32,
}

impl SpanAttributes {
    /// Returns `None` for zero-area triangles, which rasterize no pixels
    fn new(vertices: &[ScreenVertex; 3]) -> Option<Self> {
        let x = [vertices[0].position.x, vertices[1].position.x, vertices[2].position.x];
        let y = [vertices[0].position.y, vertices[1].position.y, vertices[2].position.y];

        let denom = (y[1] - y[2]) * (x[0] - x[2]) + (x[2] - x[1]) * (y[0] - y[2]);
        if denom.abs() < 1e-8 {
            return None;
        }

        let inverse_w = [
            vertices[0].inverse_w,
            vertices[1].inverse_w,
            vertices[2].inverse_w,
        ];

        Some(Self {
            x,
            y,
            z: [vertices[0].position.z, vertices[1].position.z, vertices[2].position.z],
            inverse_w,
            u_over_w: [
                vertices[0].tex_coord.x * inverse_w[0],
                vertices[1].tex_coord.x * inverse_w[1],
                vertices[2].tex_coord.x * inverse_w[2],
            ],
            v_over_w: [
                vertices[0].tex_coord.y * inverse_w[0],
                vertices[1].tex_coord.y * inverse_w[1],
                vertices[2].tex_coord.y * inverse_w[2],
            ],
            inverse_denom: 1.0 / denom,
        })
    }

    /// Barycentric weights for 4 pixel centers at once
    fn weights(&self, px: QuadFloat, py: QuadFloat) -> (QuadFloat, QuadFloat, QuadFloat) {
        let dx = px - QuadFloat::splat(self.x[2]);
        let dy = py - QuadFloat::splat(self.y[2]);

        let w0 = (dx * QuadFloat::splat(self.y[1] - self.y[2])
            + dy * QuadFloat::splat(self.x[2] - self.x[1]))
            * QuadFloat::splat(self.inverse_denom);
        let w1 = (dx * QuadFloat::splat(self.y[2] - self.y[0])
            + dy * QuadFloat::splat(self.x[0] - self.x[2]))
            * QuadFloat::splat(self.inverse_denom);
        let w2 = QuadFloat::splat(1.0) - w0 - w1;

        (w0, w1, w2)
    }
}

fn interpolate(
    weights: &(QuadFloat, QuadFloat, QuadFloat),
    values: [f32; 3],
) -> QuadFloat {
    weights.0 * QuadFloat::splat(values[0])
        + weights.1 * QuadFloat::splat(values[1])
        + weights.2 * QuadFloat::splat(values[2])
}

/// X coordinate where an edge starting at `base_x` crosses the scanline
/// `diff` rows below its origin. Shared by both sub-trapezoids so the
/// long edge evaluates bit-identically on each side of a shared edge.
fn edge_start(base_x: f32, edge: Vec2, diff: f32) -> f32 {
    base_x + edge.x * (diff / edge.y)
}

fn fill_triangle(
    vertices: &[ScreenVertex; 3],
    texture: &ColorBuffer,
    texture_wrap: WrapMode,
    color_buffer: &mut ColorBuffer,
    depth_buffer: &mut DepthBuffer,
) {
    let Some(attributes) = SpanAttributes::new(vertices) else {
        return;
    };

    let top = Vec2::new(vertices[0].position.x, vertices[0].position.y);
    let middle = Vec2::new(vertices[1].position.x, vertices[1].position.y);
    let bottom = Vec2::new(vertices[2].position.x, vertices[2].position.y);

    let top_to_middle = (middle - top).normalize();
    let top_to_bottom = (bottom - top).normalize();
    let middle_to_bottom = (bottom - middle).normalize();

    // Which side of the long (top->bottom) edge the middle vertex is on
    let middle_on_left = top_to_middle.x <= top_to_bottom.x;

    if top.y != middle.y {
        let first_y = top.y.ceil();
        let to_first_y = first_y - top.y;

        let (left, right) = if middle_on_left {
            (top_to_middle, top_to_bottom)
        } else {
            (top_to_bottom, top_to_middle)
        };

        fill_spans(
            left,
            right,
            first_y as usize,
            middle.y.ceil() as usize,
            edge_start(top.x, left, to_first_y),
            edge_start(top.x, right, to_first_y),
            &attributes,
            texture,
            texture_wrap,
            color_buffer,
            depth_buffer,
        );
    }

    if middle.y != bottom.y {
        let first_y = middle.y.ceil();
        let middle_to_first_y = first_y - middle.y;
        let top_to_first_y = first_y - top.y;

        let (left, right) = if middle_on_left {
            (middle_to_bottom, top_to_bottom)
        } else {
            (top_to_bottom, middle_to_bottom)
        };

        let start_left = if middle_on_left {
            edge_start(middle.x, left, middle_to_first_y)
        } else {
            edge_start(top.x, left, top_to_first_y)
        };
        let start_right = if middle_on_left {
            edge_start(top.x, right, top_to_first_y)
        } else {
            edge_start(middle.x, right, middle_to_first_y)
        };

        fill_spans(
            left,
            right,
            first_y as usize,
            bottom.y.ceil() as usize,
            start_left,
            start_right,
            &attributes,
            texture,
            texture_wrap,
            color_buffer,
            depth_buffer,
        );
    }
}

/// Step the left and right bounding edges one scanline at a time; each
/// row covers the pixel columns `[ceil(left), ceil(right))`
#[allow(clippy::too_many_arguments)]
fn fill_spans(
    left: Vec2,
    right: Vec2,
    first_y: usize,
    target_y: usize,
    left_start: f32,
    right_start: f32,
    attributes: &SpanAttributes,
    texture: &ColorBuffer,
    texture_wrap: WrapMode,
    color_buffer: &mut ColorBuffer,
    depth_buffer: &mut DepthBuffer,
) {
    let left_change = left.x / left.y;
    let right_change = right.x / right.y;

    let mut current_left = left_start;
    let mut current_right = right_start;

    for y in first_y..target_y {
        let first_x = current_left.ceil() as usize;
        let last_x = current_right.ceil() as usize;

        fill_span(
            y,
            first_x,
            last_x,
            attributes,
            texture,
            texture_wrap,
            color_buffer,
            depth_buffer,
        );

        current_left += left_change;
        current_right += right_change;
    }
}

/// Depth-test, texture, and write one span, four pixels at a time
#[allow(clippy::too_many_arguments)]
fn fill_span(
    y: usize,
    first_x: usize,
    last_x: usize,
    attributes: &SpanAttributes,
    texture: &ColorBuffer,
    texture_wrap: WrapMode,
    color_buffer: &mut ColorBuffer,
    depth_buffer: &mut DepthBuffer,
) {
    if last_x <= first_x {
        return;
    }

    let row = y * color_buffer.width();
    let texture_width = texture.width() as f32;
    let texture_height = texture.height() as f32;
    let py = QuadFloat::splat(y as f32);

    let mut x = first_x;
    while x < last_x {
        let in_span = QuadMask::new([
            true,
            x + 1 < last_x,
            x + 2 < last_x,
            x + 3 < last_x,
        ]);

        let index = row + x;
        let weights = attributes.weights(QuadFloat::sequence(x as f32), py);

        let z = interpolate(&weights, attributes.z);
        let depth = QuadFloat::load(depth_buffer.data(), index, in_span);
        let visible = z.lt(depth) & in_span;

        if visible.any() {
            // Perspective-correct texture coordinates: interpolate the
            // 1/w-scaled attributes, then renormalize
            let inverse_w = interpolate(&weights, attributes.inverse_w);
            let tex_coord = QuadVec2::new(
                interpolate(&weights, attributes.u_over_w),
                interpolate(&weights, attributes.v_over_w),
            ) / inverse_w;

            let (u, v) = match texture_wrap {
                WrapMode::Clamp => {
                    let upper = 1.0 - f32::EPSILON;
                    (tex_coord.x.clamp(0.0, upper), tex_coord.y.clamp(0.0, upper))
                }
                WrapMode::Wrap => (
                    tex_coord.x - tex_coord.x.floor(),
                    tex_coord.y - tex_coord.y.floor(),
                ),
            };

            let texel_x = (u * texture_width).to_int();
            let texel_y = (v * texture_height).to_int();
            let offsets = texel_y * QuadInt::splat(texture.width() as i32) + texel_x;

            let texels = QuadColor::gather(texture.data(), offsets, visible);
            texels.write(color_buffer.data_mut(), index, visible);
            z.store(depth_buffer.data_mut(), index, visible);
        }

        x += LANES;
    }
}
