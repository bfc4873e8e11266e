//! RGBA 胸部素材
//!
//! 素材为左右两个独立模型（RGBA_L / RGBA_R），骨骼、刚体、关节均已制作完成，
//! 每处理一个模型都重新导入一次，合并进源模型后即被消耗。

use crate::model::Model;
use crate::skeleton::Side;
use crate::{MmdError, Result};

// ============================================================================
// 名称常量
// ============================================================================

/// 素材左胸骨骼
pub const BREAST_BONE_L: &str = "胸.L";
/// 素材右胸骨骼
pub const BREAST_BONE_R: &str = "胸.R";
/// 素材左胸主刚体
pub const BREAST_BODY_L: &str = "左胸";
/// 素材右胸主刚体
pub const BREAST_BODY_R: &str = "右胸";

/// 躯干刚体名称标记
pub const TORSO_MARKER: &str = "上半身";
/// 素材根骨骼挂接的源模型骨骼
pub const TRUNK_BONE: &str = "上半身2";
pub const TORSO_ANCHOR_BODY_L: &str = "上半身2_L";
pub const TORSO_ANCHOR_BODY_R: &str = "上半身2_R";

/// 素材胸部刚体
pub const TEMPLATE_BODY_NAMES: [&str; 10] = [
    "右胸_後", "右胸_回転", "右胸_前", "右胸_前後", "右胸",
    "左胸_後", "左胸_回転", "左胸_前", "左胸_前後", "左胸",
];

/// 素材刚体排序（胸部刚体 + 躯干锚点刚体）
pub const TEMPLATE_BODY_ORDER: [&str; 12] = [
    "上半身2_R", "右胸_後", "右胸_回転", "右胸_前", "右胸_前後", "右胸",
    "上半身2_L", "左胸_後", "左胸_回転", "左胸_前", "左胸_前後", "左胸",
];

/// 素材关节排序
pub const TEMPLATE_JOINT_ORDER: [&str; 18] = [
    "右胸_後1", "右胸_後2", "右胸_回転1", "右胸_前1", "右胸_前2", "右胸_回転2", "右胸_前後1", "右胸_前後2", "右胸",
    "左胸_後1", "左胸_後2", "左胸_回転1", "左胸_前1", "左胸_前2", "左胸_回転2", "左胸_前後1", "左胸_前後2", "左胸",
];

/// 双臂刚体（与胸部碰撞的肢体）
pub const LIMB_BODY_NAMES: [&str; 8] = ["右手首", "右手", "右ひじ", "右腕", "左手首", "左手", "左ひじ", "左腕"];

/// 衝突刚体名称后缀
pub const PROXY_SUFFIX: &str = "衝突";
/// 衝突刚体物体名称前缀
pub const PROXY_OBJECT_PREFIX: &str = "AAA_";

pub fn is_template_body(name_j: &str) -> bool {
    TEMPLATE_BODY_NAMES.contains(&name_j)
}

pub fn breast_bone_name(side: Side) -> &'static str {
    match side {
        Side::L => BREAST_BONE_L,
        Side::R => BREAST_BONE_R,
    }
}

pub fn breast_body_name(side: Side) -> &'static str {
    match side {
        Side::L => BREAST_BODY_L,
        Side::R => BREAST_BODY_R,
    }
}

/// 衝突刚体的 (模型中名称, 物体名称)
pub fn proxy_names(name_j: &str) -> (String, String) {
    let proxy = format!("{name_j}{PROXY_SUFFIX}");
    let object = format!("{PROXY_OBJECT_PREFIX}{proxy}");
    (proxy, object)
}

// ============================================================================
// 素材
// ============================================================================

/// 已校验的左右胸部素材
#[derive(Clone, Debug)]
pub struct TemplateRig {
    pub left: Model,
    pub right: Model,
}

impl TemplateRig {
    /// 校验素材并移除素材自带的网格
    ///
    /// 缺少胸骨或主刚体属于素材损坏，返回配置错误（整批中止）。
    pub fn new(mut left: Model, mut right: Model) -> Result<Self> {
        Self::validate_side(&left, Side::L)?;
        Self::validate_side(&right, Side::R)?;
        left.meshes.clear();
        right.meshes.clear();
        Ok(Self { left, right })
    }

    fn validate_side(model: &Model, side: Side) -> Result<()> {
        let bone = breast_bone_name(side);
        if !model.skeleton.contains(bone) {
            return Err(MmdError::Config(format!("bone \"{bone}\" not found in template \"{}\"", model.name)));
        }
        let body = breast_body_name(side);
        let Some(index) = model.find_body_j(body) else {
            return Err(MmdError::Config(format!(
                "rigid body \"{body}\" not found in template \"{}\"",
                model.name
            )));
        };
        if model.rigid_bodies[index].size.x <= 0.0 {
            return Err(MmdError::Config(format!(
                "rigid body \"{body}\" in template \"{}\" has no radius",
                model.name
            )));
        }
        Ok(())
    }

    pub fn side_mut(&mut self, side: Side) -> &mut Model {
        match side {
            Side::L => &mut self.left,
            Side::R => &mut self.right,
        }
    }

    /// 某侧主刚体
    pub fn breast_body_mut(&mut self, side: Side) -> Result<&mut crate::physics::RigidBody> {
        let model = self.side_mut(side);
        let name = breast_body_name(side);
        match model.find_body_j(name) {
            Some(index) => Ok(&mut model.rigid_bodies[index]),
            None => Err(MmdError::Config(format!("rigid body \"{name}\" not found in template"))),
        }
    }
}
