//! 胸部刚体碰撞群组设置与重排序
//!
//! 掩码位置位表示“不与该群组碰撞”。
//! - 双臂衝突刚体：位于四肢群组，只与胸部群组碰撞
//! - 胸部衝突刚体：位于胸部群组的骨骼追踪刚体，与其他物理刚体所在群组碰撞
//! - 胸部刚体本身只与双臂衝突刚体碰撞

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use super::template::{
    is_template_body, proxy_names, BREAST_BODY_L, BREAST_BODY_R, LIMB_BODY_NAMES, PROXY_SUFFIX, TEMPLATE_BODY_ORDER,
    TEMPLATE_JOINT_ORDER, TORSO_MARKER,
};
use crate::config::{CollisionPolicy, RgbaConfig};
use crate::geometry::{meshes_intersect, TriMesh};
use crate::model::Model;
use crate::physics::{with_ordinal, CollisionMask, RigidBody, RigidBodyKind};
use crate::skeleton::expand_accessory_bone_names;

/// 碰撞群组布局
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollisionLayout {
    pub limb_group: u8,
    pub breast_group: u8,
    /// 重排序起始序号
    pub ordinal_base: u32,
}

impl CollisionLayout {
    pub fn from_config(config: &RgbaConfig) -> Self {
        Self {
            limb_group: config.limb_group.min(15),
            breast_group: config.effective_breast_group(),
            ordinal_base: config.ordinal_base,
        }
    }
}

impl Default for CollisionLayout {
    fn default() -> Self {
        Self::from_config(&RgbaConfig::default())
    }
}

/// 碰撞设置结果（刚体物体名称，重排序前）
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CollisionSummary {
    pub limb_proxies: Vec<String>,
    pub breast_proxies: Vec<String>,
    /// 物理+骨骼 → 骨骼追踪的胸饰刚体
    pub demoted: Vec<String>,
    /// 因与胸部刚体穿模而取消与胸部碰撞的刚体
    pub overlap_excluded: Vec<String>,
}

fn clone_as_proxy(source: &RigidBody) -> RigidBody {
    let (name_j, name) = proxy_names(&source.name_j);
    let mut proxy = source.clone();
    proxy.name_j = name_j;
    proxy.name = name;
    proxy
}

/// 设置碰撞群组
///
/// 胸部刚体的全掩码总会设置；其余步骤只在默认碰撞策略下执行。
/// 新建的衝突刚体不参与本轮后续步骤的判断，全部步骤完成后追加到刚体列表末尾。
pub fn build_collision(
    model: &mut Model,
    accessory_map: &BTreeMap<String, String>,
    policy: CollisionPolicy,
    layout: &CollisionLayout,
) -> CollisionSummary {
    let mut summary = CollisionSummary::default();
    let breast = layout.breast_group;
    let limb = layout.limb_group;

    for rb in model.rigid_bodies.iter_mut().filter(|rb| is_template_body(&rb.name_j)) {
        rb.mask = CollisionMask::ALL;
    }
    if policy == CollisionPolicy::NoCollision {
        log::info!("[碰撞] 无碰撞策略，胸部刚体已全部取消碰撞");
        return summary;
    }

    // 含“上半身”的刚体不与胸部碰撞，可能影响少量其他物理刚体（如头发）
    for rb in model.rigid_bodies.iter_mut().filter(|rb| rb.name_j.contains(TORSO_MARKER)) {
        rb.mask.set_excluded(breast, true);
    }

    let mut created: Vec<RigidBody> = Vec::new();

    // 双臂衝突刚体，只与胸部碰撞
    let mut limb_seen: HashSet<&str> = HashSet::new();
    for rb in &model.rigid_bodies {
        if rb.kind.is_physics() || !LIMB_BODY_NAMES.contains(&rb.name_j.as_str()) {
            continue;
        }
        if !limb_seen.insert(rb.name_j.as_str()) {
            continue;
        }
        let mut proxy = clone_as_proxy(rb);
        proxy.group = limb;
        proxy.mask = CollisionMask::all_except(breast);
        summary.limb_proxies.push(proxy.name.clone());
        created.push(proxy);
    }

    // 胸部刚体只与双臂衝突刚体碰撞
    for rb in model
        .rigid_bodies
        .iter_mut()
        .filter(|rb| rb.name_j == BREAST_BODY_L || rb.name_j == BREAST_BODY_R)
    {
        rb.mask.set_excluded(limb, false);
    }

    // 物理刚体所在群组（不含胸部群组）
    let physics_groups: BTreeSet<u8> = model
        .rigid_bodies
        .iter()
        .filter(|rb| rb.kind.is_physics() && rb.group != breast)
        .map(|rb| rb.group)
        .collect();

    // 胸部衝突刚体：与胸部刚体同群组，与物理部位碰撞与否取决于这些部位原本的设置
    let mut breast_seen: HashSet<&str> = HashSet::new();
    for rb in &model.rigid_bodies {
        if !rb.kind.is_physics() || !(rb.name_j == BREAST_BODY_L || rb.name_j == BREAST_BODY_R) {
            continue;
        }
        if !breast_seen.insert(rb.name_j.as_str()) {
            continue;
        }
        let mut proxy = clone_as_proxy(rb);
        proxy.kind = RigidBodyKind::FollowBone;
        proxy.group = breast;
        for &group in &physics_groups {
            proxy.mask.set_excluded(group, false);
        }
        summary.breast_proxies.push(proxy.name.clone());
        created.push(proxy);
    }

    // 胸饰根骨骼上的 物理+骨骼 刚体改为骨骼追踪，且不与胸部碰撞
    for rb in model.rigid_bodies.iter_mut() {
        if rb.kind != RigidBodyKind::PhysicsWithBone {
            continue;
        }
        if !rb.bone.as_ref().is_some_and(|b| accessory_map.contains_key(b)) {
            continue;
        }
        rb.kind = RigidBodyKind::FollowBone;
        rb.mask.set_excluded(breast, true);
        summary.demoted.push(rb.name.clone());
    }

    // 胸饰子孙骨骼的物理刚体与胸部刚体穿模时，取消与胸部的碰撞
    let accessory_bones: HashSet<String> = expand_accessory_bone_names(&model.skeleton, accessory_map)
        .into_iter()
        .collect();
    if !accessory_bones.is_empty() {
        let model_matrix = model.matrix_world();
        let breast_meshes: Vec<TriMesh> = model
            .rigid_bodies
            .iter()
            .filter(|rb| is_template_body(&rb.name_j))
            .map(|rb| rb.world_mesh(model_matrix))
            .collect();
        for rb in model.rigid_bodies.iter_mut() {
            if !rb.kind.is_physics() || is_template_body(&rb.name_j) {
                continue;
            }
            if !rb.bone.as_ref().is_some_and(|b| accessory_bones.contains(b)) {
                continue;
            }
            if rb.mask.excludes(breast) {
                continue;
            }
            let mesh = rb.world_mesh(model_matrix);
            if breast_meshes.iter().any(|b| meshes_intersect(&mesh, b)) {
                rb.mask.set_excluded(breast, true);
                summary.overlap_excluded.push(rb.name.clone());
            }
        }
    }

    model.rigid_bodies.extend(created);
    log::info!(
        "[碰撞] 双臂衝突刚体 {} 个，胸部衝突刚体 {} 个，改为骨骼追踪 {} 个，穿模排除 {} 个",
        summary.limb_proxies.len(),
        summary.breast_proxies.len(),
        summary.demoted.len(),
        summary.overlap_excluded.len()
    );
    summary
}

// ============================================================================
// 重排序
// ============================================================================

fn canonical_position(list: &[&str], name: &str) -> Option<usize> {
    list.iter().position(|n| *n == name)
}

/// 双臂衝突刚体在肢体列表中的位置
fn limb_proxy_position(name_j: &str) -> Option<usize> {
    name_j
        .strip_suffix(PROXY_SUFFIX)
        .and_then(|limb| canonical_position(&LIMB_BODY_NAMES, limb))
}

/// 重排序素材刚体、双臂衝突刚体与素材关节
///
/// 双臂衝突刚体按肢体列表、素材刚体按素材刚体列表排序，依次赋予从 `ordinal_base`
/// 开始的序号前缀；素材关节按关节列表单独编号。最后按物体名称稳定排序。
/// 重复执行结果不变。
pub fn reorder(model: &mut Model, ordinal_base: u32) {
    let mut limb: Vec<(usize, usize)> = model
        .rigid_bodies
        .iter()
        .enumerate()
        .filter_map(|(i, rb)| limb_proxy_position(&rb.name_j).map(|p| (p, i)))
        .collect();
    limb.sort_by_key(|&(p, _)| p);

    let mut breast: Vec<(usize, usize)> = model
        .rigid_bodies
        .iter()
        .enumerate()
        .filter_map(|(i, rb)| canonical_position(&TEMPLATE_BODY_ORDER, &rb.name_j).map(|p| (p, i)))
        .collect();
    breast.sort_by_key(|&(p, _)| p);

    for (ordinal, (_, index)) in (ordinal_base..).zip(limb.iter().chain(breast.iter())) {
        let renamed = with_ordinal(&model.rigid_bodies[*index].name, ordinal);
        rename_body_refs(model, *index, renamed);
    }

    let mut joints: Vec<(usize, usize)> = model
        .joints
        .iter()
        .enumerate()
        .filter_map(|(i, j)| canonical_position(&TEMPLATE_JOINT_ORDER, &j.name_j).map(|p| (p, i)))
        .collect();
    joints.sort_by_key(|&(p, _)| p);
    for (ordinal, (_, index)) in (ordinal_base..).zip(joints.iter()) {
        let joint = &mut model.joints[*index];
        joint.name = with_ordinal(&joint.name, ordinal);
    }

    model.rigid_bodies.sort_by(|a, b| a.name.cmp(&b.name));
    model.joints.sort_by(|a, b| a.name.cmp(&b.name));
}

/// 重命名刚体物体，并同步更新关节中的引用
fn rename_body_refs(model: &mut Model, index: usize, renamed: String) {
    let old = std::mem::replace(&mut model.rigid_bodies[index].name, renamed.clone());
    if old == renamed {
        return;
    }
    let mut renames = HashMap::with_capacity(1);
    renames.insert(old, renamed);
    for joint in &mut model.joints {
        for slot in [&mut joint.body_a, &mut joint.body_b] {
            if let Some(target) = slot.as_ref().and_then(|n| renames.get(n)) {
                *slot = Some(target.clone());
            }
        }
    }
}
