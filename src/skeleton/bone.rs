//! 骨骼节点
//!
//! 只保存移植需要的静态数据：名称、父骨骼、head/tail（模型空间）。
//! 父子关系以名称表示，删除/合并骨骼时不需要重映射索引。

use glam::{Mat4, Vec3};

#[derive(Clone, Debug, PartialEq)]
pub struct Bone {
    /// 骨骼名称（同一骨架内唯一）
    pub name: String,
    /// 父骨骼名称（None 表示根骨骼）
    pub parent: Option<String>,
    /// 骨骼头部位置（模型空间）
    pub head: Vec3,
    /// 骨骼尾部位置（模型空间）
    pub tail: Vec3,
}

impl Bone {
    pub fn new(name: impl Into<String>, head: Vec3, tail: Vec3) -> Self {
        Self {
            name: name.into(),
            parent: None,
            head,
            tail,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    #[inline]
    pub fn head_world(&self, matrix_world: Mat4) -> Vec3 {
        matrix_world.transform_point3(self.head)
    }

    #[inline]
    pub fn tail_world(&self, matrix_world: Mat4) -> Vec3 {
        matrix_world.transform_point3(self.tail)
    }

    /// 用矩阵变换 head/tail（烘焙父物体变换时使用）
    pub fn transform(&mut self, matrix: Mat4) {
        self.head = matrix.transform_point3(self.head);
        self.tail = matrix.transform_point3(self.tail);
    }
}
