use float_ord::FloatOrd;
use glam::Vec2;

/// A hashable, totally-ordered stand-in for [`glam::Vec2`].
///
/// Used wherever positions need to live as map/set keys: deduplicating
/// near-coincident OBJ vertices and giving a deterministic secondary sort
/// key when two candidate positions tie on distance.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Vec2Ord([FloatOrd<f32>; 2]);

pub trait ToOrd {
    fn to_ord(&self) -> Vec2Ord;
}

impl ToOrd for Vec2 {
    fn to_ord(&self) -> Vec2Ord {
        Vec2Ord([FloatOrd(self.x), FloatOrd(self.y)])
    }
}

pub trait ToVec {
    fn to_vec(&self) -> Vec2;
}

impl ToVec for Vec2Ord {
    fn to_vec(&self) -> Vec2 {
        Vec2::new(self.0[0].0, self.0[1].0)
    }
}

/// Rounds both components to 6 decimal places, matching the precision the
/// OBJ loader uses to merge coincident vertices.
pub fn round6(p: Vec2) -> Vec2Ord {
    let r = |x: f32| (x * 1_000_000.0).round() / 1_000_000.0;
    Vec2::new(r(p.x), r(p.y)).to_ord()
}

/// Twice the signed area of triangle `(a, b, c)`; positive iff `a, b, c` are
/// in counter-clockwise order. Also used directly by the funnel algorithm,
/// where it is conventionally called `triarea2`.
pub fn triarea2(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y)
}

/// Closest point to `p` on the segment `[a, b]`, clamped to the endpoints.
pub fn closest_point_on_segment(a: Vec2, b: Vec2, p: Vec2) -> Vec2 {
    let dir = b - a;
    let len_sq = dir.length_squared();
    if len_sq <= f32::EPSILON {
        return a;
    }
    let t = ((p - a).dot(dir) / len_sq).clamp(0.0, 1.0);
    a + dir * t
}
