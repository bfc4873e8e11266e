//! 胸部锚点（伪胸骨）计算
//!
//! 从胸骨权重影响的顶点范围推出左右对称的一对“伪胸骨”：
//! tail 位于胸部最前端，head 取自最靠后的水平胸骨。素材胸骨会被对齐到伪胸骨上。

use std::collections::HashSet;

use glam::{Mat4, Vec3};

use crate::error::ValidationError;
use crate::model::{Model, WeightedMesh};
use crate::skeleton::{Bone, Side};
use crate::Result;

/// 伪胸骨（世界坐标）
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnchorFrame {
    /// 伪胸骨 tail
    pub tip_l: Vec3,
    pub tip_r: Vec3,
    /// 伪胸骨 head
    pub root_l: Vec3,
    pub root_r: Vec3,
    /// 顶点范围 X 最大值（一侧胸部宽度）
    pub half_width: f32,
    /// 顶点范围 Z 方向的一半
    pub half_height: f32,
    /// head 的 |x|
    pub root_x: f32,
}

impl AnchorFrame {
    pub fn tip(&self, side: Side) -> Vec3 {
        match side {
            Side::L => self.tip_l,
            Side::R => self.tip_r,
        }
    }

    pub fn root(&self, side: Side) -> Vec3 {
        match side {
            Side::L => self.root_l,
            Side::R => self.root_r,
        }
    }

    /// 胸部半径（宽度与高度的均值）
    pub fn radius(&self) -> f32 {
        (self.half_width + self.half_height) / 2.0
    }
}

/// 筛选接近水平的胸骨
///
/// 骨骼向量与其水平投影的夹角小于 `threshold_deg` 即为水平；零长度骨骼或竖直骨骼跳过。
pub fn horizontal_bones<'a>(bones: &[&'a Bone], matrix_world: Mat4, threshold_deg: f32) -> Vec<&'a Bone> {
    let threshold = threshold_deg.to_radians();
    bones
        .iter()
        .copied()
        .filter(|b| {
            let v = b.tail_world(matrix_world) - b.head_world(matrix_world);
            let flat = Vec3::new(v.x, v.y, 0.0);
            if v.length_squared() == 0.0 || flat.length_squared() == 0.0 {
                return false;
            }
            v.angle_between(flat) < threshold
        })
        .collect()
}

/// 胸骨权重之和严格大于阈值的顶点
pub fn influenced_vertices(mesh: &WeightedMesh, bone_names: &HashSet<&str>, threshold: f32) -> Vec<usize> {
    let groups: Vec<usize> = mesh
        .group_names()
        .iter()
        .enumerate()
        .filter(|(_, name)| bone_names.contains(name.as_str()))
        .map(|(i, _)| i)
        .collect();

    mesh.vertices
        .iter()
        .enumerate()
        .filter(|(_, v)| {
            let total: f32 = v
                .groups
                .iter()
                .filter(|(g, _)| groups.contains(g))
                .map(|(_, w)| *w)
                .sum();
            total > threshold
        })
        .map(|(i, _)| i)
        .collect()
}

/// 计算伪胸骨
///
/// `breast` 为已识别的胸骨；顶点全部不超过阈值时返回 `NoUsableGeometry`。
pub fn compute_anchor(
    model: &Model,
    breast: &[&Bone],
    weight_threshold: f32,
    horizontal_angle_deg: f32,
) -> Result<AnchorFrame> {
    if breast.is_empty() {
        return Err(ValidationError::NoBreastBones.into());
    }
    let mesh = model.primary_mesh().ok_or(ValidationError::NoMesh)?;
    let matrix = model.matrix_world();

    let names: HashSet<&str> = breast.iter().map(|b| b.name.as_str()).collect();
    let verts = influenced_vertices(mesh, &names, weight_threshold);
    if verts.is_empty() {
        return Err(ValidationError::NoUsableGeometry { threshold: weight_threshold }.into());
    }

    let mut min = Vec3::splat(f32::INFINITY);
    let mut max = Vec3::splat(f32::NEG_INFINITY);
    for &i in &verts {
        let co = matrix.transform_point3(mesh.vertices[i].co);
        min = min.min(co);
        max = max.max(co);
    }

    let avg_x = (max.x / 2.0).abs();
    let avg_z = (min.z + max.z) / 2.0;
    let tip_l = Vec3::new(avg_x, min.y, avg_z);
    let tip_r = Vec3::new(-avg_x, min.y, avg_z);

    // 水平胸骨中 head 最靠后（y 最大）的一根；没有水平胸骨时退回全部胸骨
    let horizontal = horizontal_bones(breast, matrix, horizontal_angle_deg);
    let candidates: &[&Bone] = if horizontal.is_empty() { breast } else { &horizontal };
    let mut head = candidates[0].head_world(matrix);
    for bone in &candidates[1..] {
        let h = bone.head_world(matrix);
        if h.y > head.y {
            head = h;
        }
    }

    let root_x = head.x.abs();
    let anchor = AnchorFrame {
        tip_l,
        tip_r,
        root_l: Vec3::new(root_x, head.y, tip_l.z),
        root_r: Vec3::new(-root_x, head.y, tip_r.z),
        half_width: max.x,
        half_height: (max.z - min.z) / 2.0,
        root_x,
    };
    log::debug!(
        "[RGBA] 伪胸骨: tail={:?} head={:?} 宽={:.4} 高={:.4}（{} 个顶点，{} 根水平胸骨）",
        anchor.tip_l,
        anchor.root_l,
        anchor.half_width,
        anchor.half_height,
        verts.len(),
        horizontal.len()
    );
    Ok(anchor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MmdError;
    use crate::skeleton::BoneSet;

    fn breast_model(weight: f32) -> Model {
        let mut model = Model::new("host");
        model.skeleton = BoneSet::from_bones([
            Bone::new("上半身2", Vec3::ZERO, Vec3::Z),
            Bone::new("胸.L", Vec3::new(0.6, 0.2, 1.0), Vec3::new(0.6, -0.4, 1.0)).with_parent("上半身2"),
            Bone::new("胸.R", Vec3::new(-0.6, 0.1, 1.0), Vec3::new(-0.6, -0.4, 0.9)).with_parent("上半身2"),
        ]);
        let mut mesh = WeightedMesh::new("body");
        mesh.add_vertex(Vec3::new(1.2, -0.8, 0.7), &[("胸.L", weight)]);
        mesh.add_vertex(Vec3::new(0.2, -0.2, 1.3), &[("胸.L", weight)]);
        mesh.add_vertex(Vec3::new(-1.0, -0.7, 1.0), &[("胸.R", weight)]);
        mesh.add_vertex(Vec3::new(0.0, 0.5, 0.0), &[("上半身2", 1.0)]);
        model.meshes.push(mesh);
        model
    }

    #[test]
    fn test_threshold_is_strict() {
        let model = breast_model(0.25);
        let names: HashSet<&str> = ["胸.L", "胸.R"].into();
        assert!(influenced_vertices(model.primary_mesh().unwrap(), &names, 0.25).is_empty());

        let model = breast_model(0.25 + 1e-4);
        assert_eq!(influenced_vertices(model.primary_mesh().unwrap(), &names, 0.25), vec![0, 1, 2]);
    }

    #[test]
    fn test_weights_summed_across_breast_groups() {
        let mut mesh = WeightedMesh::new("body");
        mesh.add_vertex(Vec3::ZERO, &[("胸.L", 0.15), ("胸先", 0.15), ("上半身2", 0.7)]);
        let names: HashSet<&str> = ["胸.L", "胸先"].into();
        assert_eq!(influenced_vertices(&mesh, &names, 0.25), vec![0]);
    }

    #[test]
    fn test_anchor_is_mirrored() {
        let model = breast_model(0.4);
        let breast: Vec<&Bone> = crate::skeleton::breast_bones(&model.skeleton);
        let anchor = compute_anchor(&model, &breast, 0.25, 30.0).unwrap();

        assert_eq!(anchor.tip_l.x, -anchor.tip_r.x);
        assert_eq!(anchor.root_l.x, -anchor.root_r.x);
        assert!((anchor.tip_l.x - 0.6).abs() < 1e-6);
        assert!((anchor.tip_l.y + 0.8).abs() < 1e-6);
        assert!((anchor.tip_l.z - 1.0).abs() < 1e-6);
        // 胸.R 倾斜约 11°，仍算水平；head.y 最大的是 胸.L
        assert!((anchor.root_l.y - 0.2).abs() < 1e-6);
        assert_eq!(anchor.root_l.z, anchor.tip_l.z);
        assert!((anchor.half_width - 1.2).abs() < 1e-6);
        assert!((anchor.half_height - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_vertical_bones_fall_back_to_all() {
        let mut model = breast_model(0.4);
        for name in ["胸.L", "胸.R"] {
            let bone = model.skeleton.get_mut(name).unwrap();
            bone.tail = bone.head + Vec3::Z;
        }
        let breast: Vec<&Bone> = crate::skeleton::breast_bones(&model.skeleton);
        assert!(horizontal_bones(&breast, model.matrix_world(), 30.0).is_empty());
        let anchor = compute_anchor(&model, &breast, 0.25, 30.0).unwrap();
        assert!((anchor.root_l.y - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_no_usable_geometry() {
        let model = breast_model(0.1);
        let breast: Vec<&Bone> = crate::skeleton::breast_bones(&model.skeleton);
        let err = compute_anchor(&model, &breast, 0.25, 30.0).unwrap_err();
        assert!(matches!(err, MmdError::Validation(ValidationError::NoUsableGeometry { .. })));
    }
}
