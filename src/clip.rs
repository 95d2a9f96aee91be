//! Homogeneous-space frustum clipping
//!
//! Triangles are tested against the six planes of the canonical clip
//! volume (`-w <= x,y,z <= w`) and recursively split until every piece is
//! either fully inside (emitted) or fully outside (dropped). Splitting is
//! driven by an explicit worklist, so the recursion depth never touches
//! the call stack.

use std::ops::{BitAnd, BitOr, BitOrAssign, BitXor, Not};

use crate::math::Axis;
use crate::types::Vertex;

/// Epsilon band around each plane; points inside it count as on-plane
/// rather than outside, so boundary geometry is neither rejected nor
/// split twice.
const PLANE_MARGIN: f32 = 0.0001;

/// Set of clip planes, one bit per plane
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClipMask(u8);

impl ClipMask {
    pub const NONE: ClipMask = ClipMask(0);
    pub const LEFT: ClipMask = ClipMask(1 << 0);
    pub const RIGHT: ClipMask = ClipMask(1 << 1);
    pub const BOTTOM: ClipMask = ClipMask(1 << 2);
    pub const TOP: ClipMask = ClipMask(1 << 3);
    pub const NEAR: ClipMask = ClipMask(1 << 4);
    pub const FAR: ClipMask = ClipMask(1 << 5);

    pub fn any(self) -> bool {
        self.0 != 0
    }

    pub fn intersects(self, other: ClipMask) -> bool {
        (self & other).any()
    }
}

impl BitOr for ClipMask {
    type Output = ClipMask;
    fn bitor(self, rhs: ClipMask) -> ClipMask {
        ClipMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for ClipMask {
    fn bitor_assign(&mut self, rhs: ClipMask) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for ClipMask {
    type Output = ClipMask;
    fn bitand(self, rhs: ClipMask) -> ClipMask {
        ClipMask(self.0 & rhs.0)
    }
}

impl BitXor for ClipMask {
    type Output = ClipMask;
    fn bitxor(self, rhs: ClipMask) -> ClipMask {
        ClipMask(self.0 ^ rhs.0)
    }
}

impl Not for ClipMask {
    type Output = ClipMask;
    fn not(self) -> ClipMask {
        ClipMask(!self.0 & 0x3F)
    }
}

/// One clip plane: its mask bit, the axis it bounds, and whether it is
/// the `-w` or `+w` side
#[derive(Debug, Clone, Copy)]
struct ClipPlane {
    bit: ClipMask,
    axis: Axis,
    negative_w: bool,
}

/// Triangle edges in fixed scan order: (first, second, opposite)
const EDGES: [[usize; 3]; 3] = [[0, 1, 2], [1, 2, 0], [2, 0, 1]];

/// Frustum clipper with its plane table fixed at construction
///
/// Plane order is left, right, bottom, top, near, far; when an edge
/// violates several planes at once the first in this order wins, which
/// keeps the output triangulation deterministic.
pub struct Clipper {
    planes: [ClipPlane; 6],
}

impl Clipper {
    pub fn new() -> Self {
        Self {
            planes: [
                ClipPlane { bit: ClipMask::LEFT, axis: Axis::X, negative_w: true },
                ClipPlane { bit: ClipMask::RIGHT, axis: Axis::X, negative_w: false },
                ClipPlane { bit: ClipMask::BOTTOM, axis: Axis::Y, negative_w: true },
                ClipPlane { bit: ClipMask::TOP, axis: Axis::Y, negative_w: false },
                ClipPlane { bit: ClipMask::NEAR, axis: Axis::Z, negative_w: true },
                ClipPlane { bit: ClipMask::FAR, axis: Axis::Z, negative_w: false },
            ],
        }
    }

    /// Clip one triangle, returning the fully-inside pieces
    pub fn clip(&self, triangle: [Vertex; 3]) -> Vec<[Vertex; 3]> {
        let mut accepted = Vec::new();
        let mut pending = vec![triangle];

        while let Some(tri) = pending.pop() {
            let mut outside = [ClipMask::NONE; 3];
            let mut on_plane = [ClipMask::NONE; 3];

            for (vertex, (out, on)) in tri
                .iter()
                .zip(outside.iter_mut().zip(on_plane.iter_mut()))
            {
                (*out, *on) = classify(vertex);
            }

            if !(outside[0] | outside[1] | outside[2]).any() {
                // Trivial accept
                accepted.push(tri);
                continue;
            }

            if ((outside[0] | on_plane[0])
                & (outside[1] | on_plane[1])
                & (outside[2] | on_plane[2]))
                .any()
            {
                // Trivial reject: all three share an outside-or-on plane
                continue;
            }

            for [first, second, opposite] in EDGES {
                let combined =
                    (outside[first] ^ outside[second]) & !(on_plane[first] | on_plane[second]);

                if !combined.any() {
                    continue;
                }

                let plane = self
                    .planes
                    .iter()
                    .find(|plane| combined.intersects(plane.bit))
                    .unwrap_or_else(|| unreachable!("clip bit set outside the plane table"));

                let intersection = line_frustum_intersection(
                    &tri[first],
                    &tri[second],
                    plane.axis,
                    plane.negative_w,
                );

                pending.push([tri[first], intersection, tri[opposite]]);
                pending.push([tri[second], tri[opposite], intersection]);
                break;
            }
        }

        accepted
    }
}

impl Default for Clipper {
    fn default() -> Self {
        Self::new()
    }
}

/// Classify a vertex against all six planes: which it is strictly
/// outside of, and which it sits on within the margin band
fn classify(vertex: &Vertex) -> (ClipMask, ClipMask) {
    let p = vertex.position;
    let w_less_margin = p.w - PLANE_MARGIN;
    let w_plus_margin = p.w + PLANE_MARGIN;

    let mut outside = ClipMask::NONE;
    let mut on_plane = ClipMask::NONE;

    if p.x < -w_plus_margin { outside |= ClipMask::LEFT; }
    if p.x > w_plus_margin { outside |= ClipMask::RIGHT; }
    if p.y < -w_plus_margin { outside |= ClipMask::BOTTOM; }
    if p.y > w_plus_margin { outside |= ClipMask::TOP; }
    if p.z < -w_plus_margin { outside |= ClipMask::NEAR; }
    if p.z > w_plus_margin { outside |= ClipMask::FAR; }

    if p.x <= -w_less_margin { on_plane |= !outside & ClipMask::LEFT; }
    if p.x >= w_less_margin { on_plane |= !outside & ClipMask::RIGHT; }
    if p.y <= -w_less_margin { on_plane |= !outside & ClipMask::BOTTOM; }
    if p.y >= w_less_margin { on_plane |= !outside & ClipMask::TOP; }
    if p.z <= -w_less_margin { on_plane |= !outside & ClipMask::NEAR; }
    if p.z >= w_less_margin { on_plane |= !outside & ClipMask::FAR; }

    (outside, on_plane)
}

/// Intersect the edge `start -> end` with one clip plane
/// (`position[axis] = -w` or `= +w`), interpolating every vertex
/// attribute at the solved parameter
fn line_frustum_intersection(start: &Vertex, end: &Vertex, axis: Axis, negative_w: bool) -> Vertex {
    let sp = start.position;
    let ep = end.position;

    let alpha = if negative_w {
        (-sp.w - sp[axis]) / (ep[axis] - sp[axis] + ep.w - sp.w)
    } else {
        (sp.w - sp[axis]) / (ep[axis] - sp[axis] - ep.w + sp.w)
    };

    *start + (*end - *start) * alpha
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Vec2, Vec3, Vec4};

    fn vertex(x: f32, y: f32, z: f32, w: f32) -> Vertex {
        Vertex::new(Vec4::new(x, y, z, w), Vec3::UP, Vec2::new(0.5, 0.5))
    }

    fn assert_inside(triangles: &[[Vertex; 3]]) {
        for tri in triangles {
            for v in tri {
                let p = v.position;
                let bound = p.w + 2.0 * PLANE_MARGIN;
                assert!(p.x.abs() <= bound, "x={} outside w={}", p.x, p.w);
                assert!(p.y.abs() <= bound, "y={} outside w={}", p.y, p.w);
                assert!(p.z.abs() <= bound, "z={} outside w={}", p.z, p.w);
            }
        }
    }

    #[test]
    fn test_mask_bit_arithmetic() {
        let both = ClipMask::LEFT | ClipMask::NEAR;
        assert!(both.intersects(ClipMask::LEFT));
        assert!(!both.intersects(ClipMask::FAR));
        assert_eq!(both ^ ClipMask::LEFT, ClipMask::NEAR);
        assert!(!(!both).intersects(ClipMask::NEAR));
    }

    #[test]
    fn test_trivial_accept_passes_through_unchanged() {
        for w in [1.0, 2.0, 10.0] {
            let tri = [
                vertex(-0.5 * w, -0.5 * w, 0.0, w),
                vertex(0.5 * w, -0.5 * w, 0.0, w),
                vertex(0.0, 0.5 * w, 0.0, w),
            ];
            let out = Clipper::new().clip(tri);
            assert_eq!(out.len(), 1);
            assert_eq!(out[0], tri);
        }
    }

    #[test]
    fn test_trivial_reject_right_of_frustum() {
        let tri = [
            vertex(2.0, 0.0, 0.0, 1.0),
            vertex(3.0, 0.0, 0.0, 1.0),
            vertex(2.5, 1.0, 0.0, 1.0),
        ];
        assert!(Clipper::new().clip(tri).is_empty());
    }

    #[test]
    fn test_reject_behind_near_plane() {
        let tri = [
            vertex(0.0, 0.0, -2.0, 1.0),
            vertex(1.0, 0.0, -3.0, 1.0),
            vertex(0.0, 1.0, -2.5, 1.0),
        ];
        assert!(Clipper::new().clip(tri).is_empty());
    }

    #[test]
    fn test_split_against_one_plane_stays_inside() {
        // Straddles the right plane; every output piece must lie inside
        let tri = [
            vertex(0.0, -0.5, 0.0, 1.0),
            vertex(2.0, 0.0, 0.0, 1.0),
            vertex(0.0, 0.5, 0.0, 1.0),
        ];
        let out = Clipper::new().clip(tri);
        assert!(!out.is_empty());
        assert_inside(&out);
    }

    #[test]
    fn test_split_against_many_planes_stays_inside() {
        // Pokes out of the right, top, and far planes at once
        let tri = [
            vertex(-0.5, -0.5, 0.0, 1.0),
            vertex(3.0, 0.2, 0.0, 1.0),
            vertex(0.0, 2.5, 2.5, 1.0),
        ];
        let out = Clipper::new().clip(tri);
        assert!(!out.is_empty());
        assert_inside(&out);
    }

    #[test]
    fn test_on_plane_vertex_is_accepted_without_split() {
        // One vertex exactly on the right plane
        let tri = [
            vertex(1.0, 0.0, 0.0, 1.0),
            vertex(-0.5, -0.5, 0.0, 1.0),
            vertex(-0.5, 0.5, 0.0, 1.0),
        ];
        let out = Clipper::new().clip(tri);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0], tri);
    }

    #[test]
    fn test_intersection_interpolates_attributes() {
        let start = Vertex::new(
            Vec4::new(0.0, 0.0, 0.0, 1.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec2::new(0.0, 0.0),
        );
        let end = Vertex::new(
            Vec4::new(2.0, 0.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec2::new(1.0, 1.0),
        );

        // Edge crosses x = +w halfway along
        let hit = line_frustum_intersection(&start, &end, Axis::X, false);
        assert!((hit.position.x - 1.0).abs() < 0.001);
        assert!((hit.tex_coord.x - 0.5).abs() < 0.001);
        assert!((hit.normal.x - 0.5).abs() < 0.001);
    }
}
