//! 骨骼系统
//!
//! - Bone: 单根骨骼（头尾位置 + 父骨骼名称）
//! - BoneSet: 按名称索引的骨架，维护父子层次
//! - classifier: 胸骨/胸部刚体的名称识别

mod bone;
mod bone_set;
mod classifier;

pub use bone::Bone;
pub use bone_set::BoneSet;
pub use classifier::{
    accessory_roots, breast_bones, classify_body_name, classify_bone_name, expand_accessory_bone_names,
    is_breast_bone_name, is_helper_bone_name, physical_bone_names, NameClass, NameRule, BODY_RULES, BONE_RULES,
};

// ============================================================================
// 左右侧
// ============================================================================

/// 模型左右侧（+X 为模型左侧）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    L,
    R,
}

impl Side {
    /// 根据骨骼尾部的 X 坐标判断；正好位于中线时无法判断
    pub fn from_lateral(x: f32) -> Option<Self> {
        if x > 0.0 {
            Some(Side::L)
        } else if x < 0.0 {
            Some(Side::R)
        } else {
            None
        }
    }

    /// 日文名中含“左”视为左侧，否则右侧
    pub fn from_japanese_name(name: &str) -> Self {
        if name.contains('左') {
            Side::L
        } else {
            Side::R
        }
    }

    /// 英文骨骼名中含“.L”视为左侧，否则右侧
    pub fn from_suffix_name(name: &str) -> Self {
        if name.contains(".L") {
            Side::L
        } else {
            Side::R
        }
    }
}
