//! 骨骼/刚体/关节图的移植
//!
//! 删除源模型的胸骨及相关刚体、关节，把左右素材合并进源模型，
//! 再修复胸饰的父子关系与关节连接。

use std::collections::{BTreeMap, HashMap, HashSet};

use super::template::{
    breast_body_name, breast_bone_name, is_template_body, TemplateRig, TORSO_ANCHOR_BODY_L, TORSO_ANCHOR_BODY_R,
    TRUNK_BONE,
};
use crate::model::{merge_frames, retain_items, Model};
use crate::physics::{CollisionMask, RigidBody};
use crate::skeleton::{
    accessory_roots, breast_bones, classify_body_name, expand_accessory_bone_names, Bone, Side,
};
use crate::{MmdError, Result};

const STAGE: &str = "transplant";

// ============================================================================
// 胸饰信息
// ============================================================================

/// 胸饰信息（在删除胸骨之前收集）
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AccessoryInfo {
    /// 胸饰根骨骼 → 所属胸骨
    pub accessory_map: BTreeMap<String, String>,
    /// 连接胸饰刚体与胸部刚体的关节（物体名称 → 胸部所在侧）
    pub kept_joints: BTreeMap<String, Side>,
}

fn bodies_bound_to<'a>(model: &'a Model, bone: impl Fn(&str) -> bool) -> HashSet<&'a str> {
    model
        .rigid_bodies
        .iter()
        .filter(|rb| rb.bone.as_deref().is_some_and(&bone))
        .map(|rb| rb.name.as_str())
        .collect()
}

/// 收集胸饰根骨骼与需要保留的关节
pub fn gather_accessory_info(model: &Model, breast: &[&Bone]) -> AccessoryInfo {
    let accessory_map = accessory_roots(&model.skeleton, breast);

    let breast_names: HashSet<&str> = breast.iter().map(|b| b.name.as_str()).collect();
    let accessory_bones: HashSet<String> = expand_accessory_bone_names(&model.skeleton, &accessory_map)
        .into_iter()
        .collect();

    let breast_bodies = bodies_bound_to(model, |b| breast_names.contains(b));
    let accessory_bodies = bodies_bound_to(model, |b| accessory_bones.contains(b));

    let mut kept_joints = BTreeMap::new();
    for joint in &model.joints {
        let (Some(a), Some(b)) = (joint.body_a.as_deref(), joint.body_b.as_deref()) else {
            continue;
        };
        if accessory_bodies.contains(a) && breast_bodies.contains(b) {
            kept_joints.insert(joint.name.clone(), Side::from_japanese_name(b));
        } else if breast_bodies.contains(a) && accessory_bodies.contains(b) {
            kept_joints.insert(joint.name.clone(), Side::from_japanese_name(a));
        }
    }

    if !accessory_map.is_empty() {
        log::info!("[RGBA] 胸饰根骨骼 {} 根，保留关节 {} 个", accessory_map.len(), kept_joints.len());
    }
    AccessoryInfo { accessory_map, kept_joints }
}

// ============================================================================
// 删除胸骨
// ============================================================================

/// 删除结果
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RemovedBreast {
    /// 左侧胸骨（tail.x > 0）
    pub left: Vec<String>,
    /// 右侧胸骨（tail.x < 0）
    pub right: Vec<String>,
    pub bones: Vec<String>,
    pub bodies: Vec<String>,
    pub joints: Vec<String>,
}

/// 删除源模型的胸骨及相关刚体、关节
///
/// 正好位于中线的胸骨无法判断左右，其权重不参与迁移。
pub fn remove_breast_bones(model: &mut Model, kept_joints: &BTreeMap<String, Side>) -> RemovedBreast {
    let mut removed = RemovedBreast::default();
    let names: HashSet<String> = breast_bones(&model.skeleton).iter().map(|b| b.name.clone()).collect();

    for bone in model.skeleton.iter().filter(|b| names.contains(&b.name)) {
        match Side::from_lateral(bone.tail.x) {
            Some(Side::L) => removed.left.push(bone.name.clone()),
            Some(Side::R) => removed.right.push(bone.name.clone()),
            None => log::warn!("[RGBA] 胸骨 '{}' 位于中线，无法判断左右", bone.name),
        }
    }

    // 胸骨删除后，关联刚体随之删除
    let bound_bodies: HashSet<String> = model
        .rigid_bodies
        .iter()
        .filter(|rb| rb.bone.as_ref().is_some_and(|b| names.contains(b)))
        .map(|rb| rb.name.clone())
        .collect();

    removed.bones = model.skeleton.remove_bones(&names);
    retain_items(&mut model.display_frames, |item| !names.contains(item));

    purge_invalid(model, &bound_bodies, kept_joints, &mut removed);
    log::info!(
        "[RGBA] 删除胸骨 {} 根（L {} / R {}），刚体 {} 个，关节 {} 个",
        removed.bones.len(),
        removed.left.len(),
        removed.right.len(),
        removed.bodies.len(),
        removed.joints.len()
    );
    removed
}

fn should_purge_body(rb: &RigidBody, bound_bodies: &HashSet<String>) -> bool {
    // 素材刚体名称可能被错误地绑定到非胸部骨骼上，一律删除
    if is_template_body(&rb.name_j) {
        return true;
    }
    if classify_body_name(&rb.name_j).is_breast() && rb.kind.is_physics() {
        return true;
    }
    // 未关联骨骼的刚体可能仍由关节连接，保留
    bound_bodies.contains(&rb.name)
}

/// 清理无效刚体与关节
///
/// 保留关节不会被删除，其指向已删除刚体的一端置空，等待合并后重新连接。
fn purge_invalid(
    model: &mut Model,
    bound_bodies: &HashSet<String>,
    kept_joints: &BTreeMap<String, Side>,
    removed: &mut RemovedBreast,
) {
    drop_dangling_joints(model, kept_joints, removed);

    let mut purged = HashSet::new();
    model.rigid_bodies.retain(|rb| {
        if should_purge_body(rb, bound_bodies) {
            purged.insert(rb.name.clone());
            removed.bodies.push(rb.name.clone());
            false
        } else {
            true
        }
    });

    for joint in model.joints.iter_mut().filter(|j| kept_joints.contains_key(&j.name)) {
        for slot in [&mut joint.body_a, &mut joint.body_b] {
            if slot.as_ref().is_some_and(|b| purged.contains(b)) {
                *slot = None;
            }
        }
    }
    drop_dangling_joints(model, kept_joints, removed);
}

fn drop_dangling_joints(model: &mut Model, kept_joints: &BTreeMap<String, Side>, removed: &mut RemovedBreast) {
    let bodies: HashSet<&str> = model.rigid_bodies.iter().map(|rb| rb.name.as_str()).collect();
    model.joints.retain(|joint| {
        if kept_joints.contains_key(&joint.name) || joint.is_connected_within(|b| bodies.contains(b)) {
            return true;
        }
        removed.joints.push(joint.name.clone());
        false
    });
}

// ============================================================================
// 合并
// ============================================================================

fn unique_name(name: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(name) {
        return name.to_owned();
    }
    (1..)
        .map(|i| format!("{name}.{i:03}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| name.to_owned())
}

/// 把一侧素材并入源模型
///
/// 素材内容先转换到源模型的局部空间；与源模型重名的骨骼/刚体/关节加 `.001` 后缀。
/// 素材根骨骼挂到 `上半身2` 下。
fn join_side(host: &mut Model, mut side: Model) -> Result<()> {
    let to_host = host.matrix_world().inverse() * side.matrix_world();
    side.transform_contents(to_host);

    let mut bone_renames: HashMap<String, String> = HashMap::new();
    for bone in side.skeleton.iter() {
        let name = unique_name(&bone.name, |n| host.skeleton.contains(n) || bone_renames.values().any(|v| v == n));
        if name != bone.name {
            bone_renames.insert(bone.name.clone(), name);
        }
    }
    let rename_bone = |name: &str| bone_renames.get(name).cloned().unwrap_or_else(|| name.to_owned());

    for bone in side.skeleton.iter() {
        let mut merged = bone.clone();
        merged.name = rename_bone(&bone.name);
        merged.parent = Some(match &bone.parent {
            Some(parent) => rename_bone(parent),
            None => TRUNK_BONE.to_owned(),
        });
        if !host.skeleton.add_bone(merged) {
            return Err(MmdError::defect(STAGE, format!("bone \"{}\" could not be merged", bone.name)));
        }
    }

    let mut body_renames: HashMap<String, String> = HashMap::new();
    for mut rb in side.rigid_bodies {
        let name = unique_name(&rb.name, |n| host.contains_body(n));
        if name != rb.name {
            body_renames.insert(rb.name.clone(), name.clone());
            rb.name = name;
        }
        rb.bone = rb.bone.map(|b| rename_bone(&b));
        host.rigid_bodies.push(rb);
    }

    for mut joint in side.joints {
        joint.name = unique_name(&joint.name, |n| host.joints.iter().any(|j| j.name == n));
        for slot in [&mut joint.body_a, &mut joint.body_b] {
            if let Some(renamed) = slot.as_ref().and_then(|b| body_renames.get(b)) {
                *slot = Some(renamed.clone());
            }
        }
        host.joints.push(joint);
    }

    merge_frames(&mut host.display_frames, side.display_frames);
    Ok(())
}

/// 把左右素材并入源模型
pub fn join_template(host: &mut Model, template: TemplateRig) -> Result<()> {
    if !host.skeleton.contains(TRUNK_BONE) {
        return Err(MmdError::defect(STAGE, format!("bone \"{TRUNK_BONE}\" missing before join")));
    }
    let TemplateRig { left, right } = template;
    join_side(host, left)?;
    join_side(host, right)?;
    log::info!(
        "[RGBA] 合并完成：骨骼 {} 根，刚体 {} 个，关节 {} 个",
        host.skeleton.len(),
        host.rigid_bodies.len(),
        host.joints.len()
    );
    Ok(())
}

// ============================================================================
// 修复
// ============================================================================

fn breast_body_object(model: &Model, side: Side) -> Result<String> {
    let name_j = breast_body_name(side);
    model
        .find_body_j(name_j)
        .map(|i| model.rigid_bodies[i].name.clone())
        .ok_or_else(|| MmdError::defect(STAGE, format!("rigid body \"{name_j}\" missing after join")))
}

/// 修复胸饰与胸之间的父子关系与关节连接
pub fn repair_accessory(model: &mut Model, info: &AccessoryInfo) -> Result<()> {
    for (child, breast) in &info.accessory_map {
        let target = breast_bone_name(Side::from_suffix_name(breast));
        if !model.skeleton.set_parent(child, Some(target)) {
            return Err(MmdError::defect(
                STAGE,
                format!("accessory bone \"{child}\" could not be attached to \"{target}\""),
            ));
        }
    }

    let body_l = breast_body_object(model, Side::L)?;
    let body_r = breast_body_object(model, Side::R)?;
    for joint in model.joints.iter_mut().rev() {
        let Some(side) = info.kept_joints.get(&joint.name) else {
            continue;
        };
        let target = match side {
            Side::L => &body_l,
            Side::R => &body_r,
        };
        for slot in [&mut joint.body_a, &mut joint.body_b] {
            if slot.is_none() {
                *slot = Some(target.clone());
            }
        }
    }
    Ok(())
}

/// 素材的躯干锚点刚体绑定到 `上半身2`，不参与碰撞并缩到最小
pub fn bind_torso_anchors(model: &mut Model) {
    for rb in model
        .rigid_bodies
        .iter_mut()
        .filter(|rb| rb.name_j == TORSO_ANCHOR_BODY_L || rb.name_j == TORSO_ANCHOR_BODY_R)
    {
        rb.bone = Some(TRUNK_BONE.to_owned());
        rb.mask = CollisionMask::ALL;
        rb.size.x = 0.01;
        rb.size.y = 0.01;
    }
}
