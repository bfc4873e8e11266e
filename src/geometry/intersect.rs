//! 三角形相交测试
//!
//! 用于判断两个刚体网格是否穿插：只需要知道是否相交，
//! 不计算穿透深度或接触点，找到第一对相交三角形即返回。

use glam::Vec3;

use super::trimesh::TriMesh;

/// 默认容差
pub const EPSILON: f32 = 1e-6;

/// 轴对齐包围盒
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

impl Aabb {
    /// 空（反转）包围盒
    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::MAX),
            max: Vec3::splat(f32::MIN),
        }
    }

    pub fn from_triangle(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self {
            min: a.min(b).min(c),
            max: a.max(b).max(c),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn expand_point(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// 两个包围盒是否重叠（带容差）
    pub fn intersects(&self, other: &Self, tolerance: f32) -> bool {
        !(self.max.x + tolerance < other.min.x
            || other.max.x + tolerance < self.min.x
            || self.max.y + tolerance < other.min.y
            || other.max.y + tolerance < self.min.y
            || self.max.z + tolerance < other.min.z
            || other.max.z + tolerance < self.min.z)
    }
}

/// 线段与三角形相交（Möller-Trumbore）
///
/// 返回线段参数 t ∈ [0, 1]。
pub fn edge_triangle_intersect(e0: Vec3, e1: Vec3, v0: Vec3, v1: Vec3, v2: Vec3, epsilon: f32) -> Option<f32> {
    let direction = e1 - e0;
    if direction.length_squared() < epsilon * epsilon {
        return None;
    }

    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = direction.cross(edge2);
    let a = edge1.dot(h);

    // 线段与三角形平行
    if a.abs() < epsilon {
        return None;
    }

    let f = 1.0 / a;
    let s = e0 - v0;
    let u = f * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * direction.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);
    if t < -epsilon || t > 1.0 + epsilon {
        return None;
    }
    Some(t.clamp(0.0, 1.0))
}

/// 两个三角形是否相交（6 条边分别与对方三角形测试）
pub fn triangles_intersect(a: [Vec3; 3], b: [Vec3; 3], epsilon: f32) -> bool {
    let edges_a = [(a[0], a[1]), (a[1], a[2]), (a[2], a[0])];
    if edges_a
        .iter()
        .any(|&(e0, e1)| edge_triangle_intersect(e0, e1, b[0], b[1], b[2], epsilon).is_some())
    {
        return true;
    }

    let edges_b = [(b[0], b[1]), (b[1], b[2]), (b[2], b[0])];
    edges_b
        .iter()
        .any(|&(e0, e1)| edge_triangle_intersect(e0, e1, a[0], a[1], a[2], epsilon).is_some())
}

/// 两个三角网格是否存在相交的三角形
///
/// 网格应已变换到同一（世界）空间。先做整体与逐三角形包围盒剔除。
pub fn meshes_intersect(a: &TriMesh, b: &TriMesh) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    let aabb_a = a.aabb();
    let aabb_b = b.aabb();
    if !aabb_a.intersects(&aabb_b, EPSILON) {
        return false;
    }

    // 只保留落在对方包围盒内的三角形
    let tris_b: Vec<([Vec3; 3], Aabb)> = b
        .triangle_vertices()
        .map(|t| (t, Aabb::from_triangle(t[0], t[1], t[2])))
        .filter(|(_, bb)| bb.intersects(&aabb_a, EPSILON))
        .collect();
    if tris_b.is_empty() {
        return false;
    }

    for ta in a.triangle_vertices() {
        let bb_a = Aabb::from_triangle(ta[0], ta[1], ta[2]);
        if !bb_a.intersects(&aabb_b, EPSILON) {
            continue;
        }
        for (tb, bb_b) in &tris_b {
            if bb_a.intersects(bb_b, EPSILON) && triangles_intersect(ta, *tb, EPSILON) {
                return true;
            }
        }
    }
    false
}
