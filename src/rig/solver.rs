//! 素材对齐：缩放 → 旋转 → 位移
//!
//! 三步顺序固定。旋转只取绕竖直轴（Z）的分量；旋转与位移在各自步骤末尾烘焙，
//! 之后的计算都基于已烘焙的几何。

use glam::{EulerRot, Quat, Vec3};

use super::anchor::AnchorFrame;
use super::template::{breast_bone_name, TemplateRig, BREAST_BODY_L};
use crate::model::{ApplyTransform, Model};
use crate::skeleton::Side;
use crate::{MmdError, Result};

const SIDES: [Side; 2] = [Side::L, Side::R];

fn bone_world(model: &Model, side: Side) -> Result<(Vec3, Vec3)> {
    let name = breast_bone_name(side);
    match (model.bone_head_world(name), model.bone_tail_world(name)) {
        (Some(head), Some(tail)) => Ok((head, tail)),
        _ => Err(MmdError::Config(format!("bone \"{name}\" not found in template \"{}\"", model.name))),
    }
}

/// 缩放胸部主刚体半径
///
/// 比例 = 胸部半径 / 左侧主刚体半径 × `rb_scale_factor`，左右使用同一比例。
pub fn apply_scale_diff(template: &mut TemplateRig, anchor: &AnchorFrame, rb_scale_factor: f32) -> Result<f32> {
    let radius = template.breast_body_mut(Side::L)?.size.x;
    if radius <= 0.0 {
        return Err(MmdError::Config(format!("rigid body \"{BREAST_BODY_L}\" has no radius")));
    }
    let scale = anchor.radius() / radius * rb_scale_factor;
    for side in SIDES {
        template.breast_body_mut(side)?.size.x *= scale;
    }
    log::debug!("[RGBA] 胸部刚体缩放 {:.4}（半径 {:.4} → {:.4}）", scale, radius, radius * scale);
    Ok(scale)
}

/// 绕 Z 轴旋转素材，使素材胸骨方向与伪胸骨一致，随后烘焙旋转并归一关节缩放
///
/// 返回左右两侧的旋转角（弧度）。
pub fn apply_rotation_diff(template: &mut TemplateRig, anchor: &AnchorFrame) -> Result<[f32; 2]> {
    let mut yaws = [0.0; 2];
    for (i, side) in SIDES.into_iter().enumerate() {
        let model = template.side_mut(side);
        let (head, tail) = bone_world(model, side)?;
        let direction = (head - tail).normalize_or_zero();
        let target = (anchor.root(side) - anchor.tip(side)).normalize_or_zero();
        if direction == Vec3::ZERO || target == Vec3::ZERO {
            log::warn!("[RGBA] {:?} 侧胸骨方向为零，跳过旋转", side);
        } else {
            let diff = Quat::from_rotation_arc(direction, target);
            let (yaw, _, _) = diff.to_euler(EulerRot::ZYX);
            model.root.rotation.z += yaw;
            yaws[i] = yaw;
        }
        model.apply_transform(ApplyTransform::ROTATION);

        // 未归 1 的缩放会让导出的关节属性值发生变化
        for joint in &mut model.joints {
            joint.freeze_scale();
        }
    }
    log::debug!("[RGBA] 素材旋转 L={:.4} R={:.4}", yaws[0], yaws[1]);
    Ok(yaws)
}

/// 平移素材，使素材胸骨 tail 与伪胸骨 tail 重合，再按左胸刚体前端做深度修正
///
/// 返回深度修正量。
pub fn apply_location_diff(template: &mut TemplateRig, anchor: &AnchorFrame) -> Result<f32> {
    for side in SIDES {
        let model = template.side_mut(side);
        let (_, tail) = bone_world(model, side)?;
        model.root.location += anchor.tip(side) - tail;
    }

    // 左胸刚体前端（y 最小处）与胸部最前端的差值，两侧同时修正
    let y_min = {
        let model = &template.left;
        let index = model
            .find_body_j(BREAST_BODY_L)
            .ok_or_else(|| MmdError::Config(format!("rigid body \"{BREAST_BODY_L}\" not found in template")))?;
        let aabb = model.rigid_bodies[index].world_mesh(model.matrix_world()).aabb();
        if aabb.is_empty() {
            return Err(MmdError::Config(format!("rigid body \"{BREAST_BODY_L}\" has no geometry")));
        }
        aabb.min.y
    };
    let (_, tail_r) = bone_world(&template.right, Side::R)?;
    let offset_y = tail_r.y - y_min;

    for side in SIDES {
        let model = template.side_mut(side);
        model.root.location.y += offset_y;
        model.apply_transform(ApplyTransform::LOCATION);
    }
    log::debug!("[RGBA] 素材深度修正 {:.4}", offset_y);
    Ok(offset_y)
}
