//! 刚体数据
//!
//! 只描述导出用的静态刚体属性，不做任何物理模拟。

use bitflags::bitflags;
use glam::{Mat4, Vec3};

use crate::geometry::TriMesh;

/// 碰撞群组数量
pub const GROUP_COUNT: u8 = 16;

bitflags! {
    /// 非碰撞群组掩码：第 i 位置位表示“不与群组 i 碰撞”
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct CollisionMask: u16 {
        const ALL = u16::MAX;
    }
}

impl CollisionMask {
    /// 仅含单个群组
    #[inline]
    pub fn group(index: u8) -> Self {
        Self::from_bits_retain(1u16 << (index.min(GROUP_COUNT - 1)))
    }

    /// 是否不与该群组碰撞
    #[inline]
    pub fn excludes(self, index: u8) -> bool {
        self.contains(Self::group(index))
    }

    /// 设置是否不与该群组碰撞
    #[inline]
    pub fn set_excluded(&mut self, index: u8, excluded: bool) {
        self.set(Self::group(index), excluded);
    }

    /// 除指定群组外全部排除
    pub fn all_except(index: u8) -> Self {
        Self::ALL.difference(Self::group(index))
    }
}

/// 刚体形状
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RigidBodyShape {
    #[default]
    Sphere,
    Box,
    Capsule,
}

/// 刚体物理模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RigidBodyKind {
    /// 跟随骨骼（运动学）
    #[default]
    FollowBone,
    /// 物理
    Physics,
    /// 物理 + 骨骼位置
    PhysicsWithBone,
}

impl RigidBodyKind {
    #[inline]
    pub fn is_physics(self) -> bool {
        !matches!(self, RigidBodyKind::FollowBone)
    }
}

/// 刚体
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBody {
    /// 物体名称（可带 3 位 36 进制序号前缀，决定导出顺序）
    pub name: String,
    /// 模型中的刚体名称（日文名）
    pub name_j: String,
    /// 关联骨骼名称
    pub bone: Option<String>,
    pub shape: RigidBodyShape,
    /// 尺寸：球 x=半径；长方体 xyz=半边长；胶囊 x=半径 y=高度
    pub size: Vec3,
    pub kind: RigidBodyKind,
    /// 碰撞群组（0~15）
    pub group: u8,
    pub mask: CollisionMask,
    /// 刚体变换（模型空间）
    pub matrix: Mat4,
}

impl RigidBody {
    pub fn new(name: impl Into<String>, name_j: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            name_j: name_j.into(),
            bone: None,
            shape: RigidBodyShape::Sphere,
            size: Vec3::splat(1.0),
            kind: RigidBodyKind::FollowBone,
            group: 0,
            mask: CollisionMask::empty(),
            matrix: Mat4::IDENTITY,
        }
    }

    pub fn with_bone(mut self, bone: impl Into<String>) -> Self {
        self.bone = Some(bone.into());
        self
    }

    pub fn with_kind(mut self, kind: RigidBodyKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_shape(mut self, shape: RigidBodyShape, size: Vec3) -> Self {
        self.shape = shape;
        self.size = size;
        self
    }

    pub fn with_group(mut self, group: u8, mask: CollisionMask) -> Self {
        self.group = group.min(GROUP_COUNT - 1);
        self.mask = mask;
        self
    }

    pub fn with_matrix(mut self, matrix: Mat4) -> Self {
        self.matrix = matrix;
        self
    }

    /// 局部空间形状网格
    pub fn local_mesh(&self) -> TriMesh {
        match self.shape {
            RigidBodyShape::Sphere => TriMesh::uv_sphere(self.size.x, 16, 8),
            RigidBodyShape::Box => TriMesh::cuboid(self.size),
            RigidBodyShape::Capsule => TriMesh::capsule(self.size.x, self.size.y, 16, 8),
        }
    }

    /// 世界空间形状网格
    pub fn world_mesh(&self, model_matrix: Mat4) -> TriMesh {
        self.local_mesh().transformed(model_matrix * self.matrix)
    }
}
