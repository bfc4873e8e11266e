//! 三角网格与刚体形状网格生成

use std::f32::consts::PI;

use glam::{Mat4, Vec3};

use super::intersect::Aabb;

/// 索引三角网格
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TriMesh {
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
}

impl TriMesh {
    pub fn new(vertices: Vec<Vec3>, triangles: Vec<[u32; 3]>) -> Self {
        Self { vertices, triangles }
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// 变换后的副本
    pub fn transformed(&self, matrix: Mat4) -> Self {
        Self {
            vertices: self.vertices.iter().map(|v| matrix.transform_point3(*v)).collect(),
            triangles: self.triangles.clone(),
        }
    }

    pub fn aabb(&self) -> Aabb {
        let mut aabb = Aabb::empty();
        for v in &self.vertices {
            aabb.expand_point(*v);
        }
        aabb
    }

    /// 三角形顶点（跳过越界索引）
    pub fn triangle_vertices(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.triangles.iter().filter_map(move |t| {
            let a = *self.vertices.get(t[0] as usize)?;
            let b = *self.vertices.get(t[1] as usize)?;
            let c = *self.vertices.get(t[2] as usize)?;
            Some([a, b, c])
        })
    }

    /// 轴对齐长方体，`half` 为半边长
    pub fn cuboid(half: Vec3) -> Self {
        let h = half.abs();
        let vertices = vec![
            Vec3::new(-h.x, -h.y, -h.z),
            Vec3::new(h.x, -h.y, -h.z),
            Vec3::new(h.x, h.y, -h.z),
            Vec3::new(-h.x, h.y, -h.z),
            Vec3::new(-h.x, -h.y, h.z),
            Vec3::new(h.x, -h.y, h.z),
            Vec3::new(h.x, h.y, h.z),
            Vec3::new(-h.x, h.y, h.z),
        ];
        let triangles = vec![
            [0, 2, 1], [0, 3, 2], // -Z
            [4, 5, 6], [4, 6, 7], // +Z
            [0, 1, 5], [0, 5, 4], // -Y
            [3, 7, 6], [3, 6, 2], // +Y
            [0, 4, 7], [0, 7, 3], // -X
            [1, 2, 6], [1, 6, 5], // +X
        ];
        Self::new(vertices, triangles)
    }

    /// UV 球
    pub fn uv_sphere(radius: f32, segments: u32, rings: u32) -> Self {
        Self::capsule(radius, 0.0, segments, rings)
    }

    /// 沿局部 Z 轴的胶囊体，`height` 为圆柱部分长度（为 0 时退化为球）
    pub fn capsule(radius: f32, height: f32, segments: u32, rings: u32) -> Self {
        let segments = segments.max(3);
        // 每个半球至少 1 圈
        let half_rings = (rings.max(2) + 1) / 2;
        let half_height = height.max(0.0) * 0.5;
        let r = radius.abs();

        let mut vertices = vec![Vec3::new(0.0, 0.0, r + half_height)];
        // 上半球 + 下半球的纬线圈（从上到下）
        let mut ring_params = Vec::new();
        for i in 1..=half_rings {
            let phi = (i as f32 / half_rings as f32) * PI * 0.5;
            ring_params.push((phi.sin(), phi.cos() * r + half_height));
        }
        for i in 0..half_rings {
            let phi = PI * 0.5 + (i as f32 / half_rings as f32) * PI * 0.5;
            if i == 0 && half_height == 0.0 {
                // 球体赤道只保留一圈
                continue;
            }
            ring_params.push((phi.sin(), phi.cos() * r - half_height));
        }
        for &(s, z) in &ring_params {
            for j in 0..segments {
                let theta = j as f32 / segments as f32 * PI * 2.0;
                vertices.push(Vec3::new(theta.cos() * s * r, theta.sin() * s * r, z));
            }
        }
        let bottom = vertices.len() as u32;
        vertices.push(Vec3::new(0.0, 0.0, -(r + half_height)));

        let ring_count = ring_params.len() as u32;
        let ring_start = |k: u32| 1 + k * segments;
        let mut triangles = Vec::new();
        for j in 0..segments {
            let next = (j + 1) % segments;
            triangles.push([0, ring_start(0) + j, ring_start(0) + next]);
        }
        for k in 0..ring_count - 1 {
            for j in 0..segments {
                let next = (j + 1) % segments;
                let a = ring_start(k) + j;
                let b = ring_start(k) + next;
                let c = ring_start(k + 1) + j;
                let d = ring_start(k + 1) + next;
                triangles.push([a, c, b]);
                triangles.push([b, c, d]);
            }
        }
        let last = ring_start(ring_count - 1);
        for j in 0..segments {
            let next = (j + 1) % segments;
            triangles.push([bottom, last + next, last + j]);
        }
        Self::new(vertices, triangles)
    }
}
