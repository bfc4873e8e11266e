//! 关节（Joint）数据

use glam::{Mat4, Vec3};

/// 6DOF 弹簧关节限制
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JointLimits {
    pub position_min: Vec3,
    pub position_max: Vec3,
    pub rotation_min: Vec3,
    pub rotation_max: Vec3,
    pub position_spring: Vec3,
    pub rotation_spring: Vec3,
}

/// 关节
#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    /// 物体名称（可带序号前缀）
    pub name: String,
    /// 模型中的关节名称（日文名）
    pub name_j: String,
    /// 刚体 A（刚体物体名称）
    pub body_a: Option<String>,
    /// 刚体 B（刚体物体名称）
    pub body_b: Option<String>,
    pub limits: JointLimits,
    /// 关节变换（模型空间，可能带未归一的缩放）
    pub matrix: Mat4,
}

impl Joint {
    pub fn new(name: impl Into<String>, name_j: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            name_j: name_j.into(),
            body_a: None,
            body_b: None,
            limits: JointLimits::default(),
            matrix: Mat4::IDENTITY,
        }
    }

    pub fn connect(mut self, body_a: impl Into<String>, body_b: impl Into<String>) -> Self {
        self.body_a = Some(body_a.into());
        self.body_b = Some(body_b.into());
        self
    }

    pub fn with_matrix(mut self, matrix: Mat4) -> Self {
        self.matrix = matrix;
        self
    }

    pub fn with_limits(mut self, limits: JointLimits) -> Self {
        self.limits = limits;
        self
    }

    /// 两端刚体是否都存在于给定集合中
    pub fn is_connected_within<F>(&self, mut exists: F) -> bool
    where
        F: FnMut(&str) -> bool,
    {
        match (&self.body_a, &self.body_b) {
            (Some(a), Some(b)) => exists(a) && exists(b),
            _ => false,
        }
    }

    /// 应用缩放：矩阵缩放归 1，保留旋转与平移，限制值不变
    pub fn freeze_scale(&mut self) {
        let (scale, rotation, translation) = self.matrix.to_scale_rotation_translation();
        if scale.abs_diff_eq(Vec3::ONE, 1e-6) {
            return;
        }
        self.matrix = Mat4::from_rotation_translation(rotation, translation);
    }
}
