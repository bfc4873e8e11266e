//! 单个模型的移植流程
//!
//! `Classified → AnchorComputed → Aligned → Transplanted → CollisionBuilt → WeightTransferred → Exported`
//!
//! 严格顺序执行。`Transplanted` 之前的失败按校验/配置错误返回；
//! 之后的失败说明素材或本流程存在缺陷，统一转为 `MmdError::Defect`。

use std::fmt;

use super::anchor::{compute_anchor, AnchorFrame};
use super::collision::{build_collision, reorder, CollisionLayout, CollisionSummary};
use super::solver::{apply_location_diff, apply_rotation_diff, apply_scale_diff};
use super::template::{
    breast_body_name, breast_bone_name, TemplateRig, BREAST_BONE_L, BREAST_BONE_R, TRUNK_BONE,
};
use super::transplant::{
    bind_torso_anchors, gather_accessory_info, join_template, remove_breast_bones, repair_accessory,
    AccessoryInfo, RemovedBreast,
};
use crate::config::RgbaConfig;
use crate::error::ValidationError;
use crate::model::{find_frame, move_frame, Model, PHYSICS_FRAME_NAME};
use crate::skeleton::{breast_bones, Side};
use crate::weight::transfer;
use crate::{MmdError, Result};

/// 单个模型的处理阶段
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum AssetStage {
    Classified,
    AnchorComputed,
    Aligned,
    Transplanted,
    CollisionBuilt,
    WeightTransferred,
    Exported,
}

impl AssetStage {
    pub fn name(self) -> &'static str {
        match self {
            AssetStage::Classified => "classify",
            AssetStage::AnchorComputed => "anchor",
            AssetStage::Aligned => "align",
            AssetStage::Transplanted => "transplant",
            AssetStage::CollisionBuilt => "collision",
            AssetStage::WeightTransferred => "weight transfer",
            AssetStage::Exported => "export",
        }
    }
}

impl fmt::Display for AssetStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 阶段推进记录（只能前进）
#[derive(Clone, Debug, Default)]
pub struct StageTracker {
    current: Option<AssetStage>,
}

impl StageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<AssetStage> {
        self.current
    }

    /// 进入下一阶段，跳跃或回退都视为缺陷
    pub fn advance(&mut self, next: AssetStage) -> Result<()> {
        let expected = match self.current {
            None => AssetStage::Classified,
            Some(AssetStage::Classified) => AssetStage::AnchorComputed,
            Some(AssetStage::AnchorComputed) => AssetStage::Aligned,
            Some(AssetStage::Aligned) => AssetStage::Transplanted,
            Some(AssetStage::Transplanted) => AssetStage::CollisionBuilt,
            Some(AssetStage::CollisionBuilt) => AssetStage::WeightTransferred,
            Some(AssetStage::WeightTransferred) => AssetStage::Exported,
            Some(AssetStage::Exported) => {
                return Err(MmdError::defect("export", "asset already exported"));
            }
        };
        if next != expected {
            return Err(MmdError::defect(next.name(), format!("expected stage {expected}, got {next}")));
        }
        log::debug!("[RGBA] 进入阶段 {}", next);
        self.current = Some(next);
        Ok(())
    }

    /// 已越过 `Transplanted`，之后的失败均为缺陷
    pub fn is_past_transplant(&self) -> bool {
        self.current.is_some_and(|s| s >= AssetStage::Transplanted)
    }
}

// ============================================================================
// 准备阶段（只读）
// ============================================================================

/// 校验通过、可以开始移植的源模型信息
#[derive(Clone, Debug)]
pub struct PreparedAsset {
    pub breast_bones: Vec<String>,
    pub anchor: AnchorFrame,
    pub accessory: AccessoryInfo,
    /// 源模型“物理”显示枠的位置
    pub physics_frame_index: Option<usize>,
    pub stages: StageTracker,
}

/// 识别胸骨并计算伪胸骨
///
/// 失败均为单个模型的校验错误：没有胸骨、胸部顶点权重均不超过阈值、缺少 `上半身2`。
pub fn prepare(model: &Model, config: &RgbaConfig) -> Result<PreparedAsset> {
    let mut stages = StageTracker::new();
    let breast = breast_bones(&model.skeleton);
    if breast.is_empty() {
        return Err(ValidationError::NoBreastBones.into());
    }
    stages.advance(AssetStage::Classified)?;

    let anchor = compute_anchor(model, &breast, config.weight_threshold, config.horizontal_angle_deg)?;
    if !model.skeleton.contains(TRUNK_BONE) {
        return Err(ValidationError::MissingTrunkBone { name: TRUNK_BONE.to_owned() }.into());
    }
    stages.advance(AssetStage::AnchorComputed)?;

    let physics_frame_index = find_frame(&model.display_frames, PHYSICS_FRAME_NAME);
    let accessory = gather_accessory_info(model, &breast);

    Ok(PreparedAsset {
        breast_bones: breast.iter().map(|b| b.name.clone()).collect(),
        anchor,
        accessory,
        physics_frame_index,
        stages,
    })
}

// ============================================================================
// 移植
// ============================================================================

/// 移植结果
#[derive(Clone, Debug, Default)]
pub struct TransplantReport {
    pub scale: f32,
    pub yaw: [f32; 2],
    pub depth_offset: f32,
    pub removed: RemovedBreast,
    pub collision: CollisionSummary,
}

/// 对齐素材并移植到源模型
///
/// 素材对齐阶段的错误属于素材损坏（配置错误）；此后的任何失败都转为缺陷。
pub fn transplant(
    host: &mut Model,
    prepared: &mut PreparedAsset,
    mut template: TemplateRig,
    config: &RgbaConfig,
) -> Result<TransplantReport> {
    let mut report = TransplantReport {
        scale: apply_scale_diff(&mut template, &prepared.anchor, config.rounded_rb_scale_factor())?,
        yaw: apply_rotation_diff(&mut template, &prepared.anchor)?,
        depth_offset: apply_location_diff(&mut template, &prepared.anchor)?,
        ..Default::default()
    };
    prepared.stages.advance(AssetStage::Aligned)?;

    run_post_alignment(host, prepared, template, config, &mut report).map_err(|err| match err {
        MmdError::Defect { .. } => err,
        other => {
            let stage = prepared.stages.current().unwrap_or(AssetStage::Aligned);
            MmdError::defect(stage.name(), other.to_string())
        }
    })?;
    Ok(report)
}

fn run_post_alignment(
    host: &mut Model,
    prepared: &mut PreparedAsset,
    template: TemplateRig,
    config: &RgbaConfig,
    report: &mut TransplantReport,
) -> Result<()> {
    let accessory = &prepared.accessory;

    // 先删除源模型的胸骨，防止刚体/关节重名
    report.removed = remove_breast_bones(host, &accessory.kept_joints);
    join_template(host, template)?;
    migrate_breast_weights(host, &report.removed);
    repair_accessory(host, accessory)?;
    bind_torso_anchors(host);
    prepared.stages.advance(AssetStage::Transplanted)?;

    let layout = CollisionLayout::from_config(config);
    report.collision = build_collision(host, &accessory.accessory_map, config.collision, &layout);
    reorder(host, layout.ordinal_base);
    restore_physics_frame(host, prepared.physics_frame_index);
    prepared.stages.advance(AssetStage::CollisionBuilt)?;

    blend_breast_weights(host, config.rounded_factor());
    verify(host)?;
    prepared.stages.advance(AssetStage::WeightTransferred)?;
    Ok(())
}

/// 被删除胸骨的权重按左右完整迁移到素材胸骨
fn migrate_breast_weights(host: &mut Model, removed: &RemovedBreast) {
    let Some(mesh) = host.primary_mesh_mut() else {
        return;
    };
    for (names, target) in [(&removed.left, BREAST_BONE_L), (&removed.right, BREAST_BONE_R)] {
        for name in names {
            transfer(mesh, name, target, 1.0, true);
        }
    }
}

/// 按权重比例把胸部权重部分还给 `上半身2`，比例越小胸部运动幅度越小
fn blend_breast_weights(host: &mut Model, factor: f32) {
    let Some(mesh) = host.primary_mesh_mut() else {
        return;
    };
    for source in [BREAST_BONE_L, BREAST_BONE_R] {
        transfer(mesh, source, TRUNK_BONE, 1.0 - factor, false);
    }
}

/// “物理”显示枠恢复到原位置；源模型没有时放到末尾
fn restore_physics_frame(host: &mut Model, original: Option<usize>) {
    let Some(current) = find_frame(&host.display_frames, PHYSICS_FRAME_NAME) else {
        return;
    };
    let target = original.unwrap_or(host.display_frames.len().saturating_sub(1));
    move_frame(&mut host.display_frames, current, target);
}

/// 移植后的不变量
fn verify(host: &Model) -> Result<()> {
    for side in [Side::L, Side::R] {
        let bone = breast_bone_name(side);
        if !host.skeleton.contains(bone) {
            return Err(MmdError::defect("verify", format!("bone \"{bone}\" missing")));
        }
        let body = breast_body_name(side);
        if host.find_body_j(body).is_none() {
            return Err(MmdError::defect("verify", format!("rigid body \"{body}\" missing")));
        }
    }
    let dangling: Vec<&str> = host
        .joints
        .iter()
        .filter(|j| !j.is_connected_within(|b| host.contains_body(b)))
        .map(|j| j.name.as_str())
        .collect();
    if !dangling.is_empty() {
        return Err(MmdError::defect("verify", format!("joints with dangling bodies: {}", dangling.join(", "))));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order_is_strict() {
        let mut stages = StageTracker::new();
        assert!(stages.advance(AssetStage::AnchorComputed).is_err());
        stages.advance(AssetStage::Classified).unwrap();
        stages.advance(AssetStage::AnchorComputed).unwrap();
        assert!(!stages.is_past_transplant());
        assert!(stages.advance(AssetStage::Classified).is_err());
        stages.advance(AssetStage::Aligned).unwrap();
        stages.advance(AssetStage::Transplanted).unwrap();
        assert!(stages.is_past_transplant());
        assert!(matches!(
            stages.advance(AssetStage::Exported),
            Err(MmdError::Defect { stage: "export", .. })
        ));
    }

    #[test]
    fn test_prepare_rejects_missing_breast() {
        let model = Model::new("empty");
        let err = prepare(&model, &RgbaConfig::default()).unwrap_err();
        assert!(matches!(err, MmdError::Validation(ValidationError::NoBreastBones)));
        assert!(err.to_string().contains("no breast bones found"));
    }
}
