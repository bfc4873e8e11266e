//! 模型场景图
//!
//! 一个 `Model` 对应宿主文档中的一个 MMD 模型根物体：
//! 骨架、网格、刚体、关节都保存在根物体的局部空间（模型空间）中，
//! 世界坐标 = 根物体变换 × 模型空间坐标。
//!
//! 坐标约定（Z 轴向上）：+X 为模型左侧，-Y 为模型正面，+Z 为上方。

mod display_frame;
mod mesh;

pub use display_frame::{find_frame, merge_frames, move_frame, retain_items, DisplayFrame, PHYSICS_FRAME_NAME};
pub use mesh::{Vertex, WeightedMesh};

use glam::{EulerRot, Mat4, Quat, Vec3};

use crate::physics::{Joint, RigidBody};
use crate::skeleton::BoneSet;

// ============================================================================
// 物体变换
// ============================================================================

/// 物体变换（位置 + XYZ 欧拉旋转 + 缩放）
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObjectTransform {
    pub location: Vec3,
    /// XYZ 欧拉角（弧度）：先绕 X，再绕 Y，最后绕 Z
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for ObjectTransform {
    fn default() -> Self {
        Self {
            location: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl ObjectTransform {
    #[inline]
    pub fn rotation_quat(&self) -> Quat {
        Quat::from_euler(EulerRot::ZYX, self.rotation.z, self.rotation.y, self.rotation.x)
    }

    /// 转换为 4x4 矩阵
    #[inline]
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation_quat(), self.location)
    }
}

/// 需要烘焙的变换分量
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ApplyTransform {
    pub location: bool,
    pub rotation: bool,
    pub scale: bool,
}

impl ApplyTransform {
    pub const LOCATION: Self = Self { location: true, rotation: false, scale: false };
    pub const ROTATION: Self = Self { location: false, rotation: true, scale: false };
    pub const SCALE: Self = Self { location: false, rotation: false, scale: true };
}

// ============================================================================
// 模型
// ============================================================================

#[derive(Clone, Debug, Default)]
pub struct Model {
    pub name: String,
    /// 根物体变换
    pub root: ObjectTransform,
    pub skeleton: BoneSet,
    pub meshes: Vec<WeightedMesh>,
    pub rigid_bodies: Vec<RigidBody>,
    pub joints: Vec<Joint>,
    pub display_frames: Vec<DisplayFrame>,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    #[inline]
    pub fn matrix_world(&self) -> Mat4 {
        self.root.to_matrix()
    }

    /// 主网格（导入的 PMX 只有一个网格物体）
    pub fn primary_mesh(&self) -> Option<&WeightedMesh> {
        self.meshes.first()
    }

    pub fn primary_mesh_mut(&mut self) -> Option<&mut WeightedMesh> {
        self.meshes.first_mut()
    }

    pub fn bone_head_world(&self, name: &str) -> Option<Vec3> {
        let m = self.matrix_world();
        self.skeleton.get(name).map(|b| b.head_world(m))
    }

    pub fn bone_tail_world(&self, name: &str) -> Option<Vec3> {
        let m = self.matrix_world();
        self.skeleton.get(name).map(|b| b.tail_world(m))
    }

    /// 按模型中的刚体名称查找
    pub fn find_body_j(&self, name_j: &str) -> Option<usize> {
        self.rigid_bodies.iter().position(|rb| rb.name_j == name_j)
    }

    /// 按物体名称查找
    pub fn find_body(&self, name: &str) -> Option<usize> {
        self.rigid_bodies.iter().position(|rb| rb.name == name)
    }

    pub fn contains_body(&self, name: &str) -> bool {
        self.find_body(name).is_some()
    }

    /// 烘焙根物体变换（世界坐标保持不变）
    ///
    /// 被烘焙的分量从根物体移除，并作用到骨骼、网格、刚体与关节上。
    pub fn apply_transform(&mut self, apply: ApplyTransform) {
        let full = self.root.to_matrix();
        if apply.location {
            self.root.location = Vec3::ZERO;
        }
        if apply.rotation {
            self.root.rotation = Vec3::ZERO;
        }
        if apply.scale {
            self.root.scale = Vec3::ONE;
        }
        let correction = self.root.to_matrix().inverse() * full;
        if correction.abs_diff_eq(Mat4::IDENTITY, 1e-7) {
            return;
        }
        self.transform_contents(correction);
    }

    /// 对根物体下的所有内容应用矩阵
    pub fn transform_contents(&mut self, matrix: Mat4) {
        self.skeleton.transform(matrix);
        for mesh in &mut self.meshes {
            mesh.transform(matrix);
        }
        for rb in &mut self.rigid_bodies {
            rb.matrix = matrix * rb.matrix;
        }
        for joint in &mut self.joints {
            joint.matrix = matrix * joint.matrix;
        }
    }
}
