mod common;

use approx::assert_relative_eq;
use common::{broken_template_left, flat_host_model, host_model, init_logger, template_left, template_right};
use mmd_jiggle::model::{find_frame, PHYSICS_FRAME_NAME};
use mmd_jiggle::physics::{CollisionMask, RigidBodyKind};
use mmd_jiggle::rig::{prepare, transplant, AssetStage, TemplateRig};
use mmd_jiggle::{MmdError, RgbaConfig, ValidationError};

fn template() -> TemplateRig {
    TemplateRig::new(template_left(), template_right()).unwrap()
}

fn run(model: &mut mmd_jiggle::model::Model, config: &RgbaConfig) -> mmd_jiggle::rig::PreparedAsset {
    let mut prepared = prepare(model, config).unwrap();
    transplant(model, &mut prepared, template(), config).unwrap();
    prepared
}

#[test]
fn test_anchor_is_mirrored() {
    let model = host_model();
    let prepared = prepare(&model, &RgbaConfig::default()).unwrap();
    let anchor = prepared.anchor;

    assert_eq!(anchor.tip_l.x, -anchor.tip_r.x);
    assert_eq!(anchor.root_l.x, -anchor.root_r.x);
    assert_relative_eq!(anchor.tip_l.x, 0.1, epsilon = 1e-6);
    assert_relative_eq!(anchor.tip_l.y, -0.15, epsilon = 1e-6);
    assert_relative_eq!(anchor.tip_l.z, 1.3, epsilon = 1e-6);
    assert_relative_eq!(anchor.root_x, 0.15, epsilon = 1e-6);
    assert_eq!(prepared.breast_bones, vec!["胸上.L".to_string(), "胸上.R".to_string()]);
    assert_eq!(prepared.physics_frame_index, Some(1));
    assert_eq!(prepared.stages.current(), Some(AssetStage::AnchorComputed));
}

#[test]
fn test_transplant_replaces_breast_rig() {
    init_logger();
    let mut model = host_model();
    let config = RgbaConfig::default();
    let prepared = run(&mut model, &config);
    assert_eq!(prepared.stages.current(), Some(AssetStage::WeightTransferred));

    let skeleton = &model.skeleton;
    assert!(!skeleton.contains("胸上.L"));
    assert!(!skeleton.contains("胸上.R"));
    for bone in ["胸.L", "胸.R"] {
        assert_eq!(skeleton.get(bone).unwrap().parent.as_deref(), Some("上半身2"));
    }
    assert_eq!(skeleton.get("胸飾り").unwrap().parent.as_deref(), Some("胸.L"));

    // 素材胸骨 tail 对齐到伪胸骨，主刚体前端对齐胸部最前端
    let tail = model.bone_tail_world("胸.L").unwrap();
    assert_relative_eq!(tail.x, 0.1, epsilon = 1e-4);
    assert_relative_eq!(tail.z, 1.3, epsilon = 1e-4);
    assert!(tail.y > -0.15 && tail.y < -0.04);

    let left = &model.rigid_bodies[model.find_body_j("左胸").unwrap()];
    assert_relative_eq!(left.size.x, 0.1, epsilon = 1e-5);
    let front = left.world_mesh(model.matrix_world()).aabb().min.y;
    assert_relative_eq!(front, -0.15, epsilon = 1e-4);

    // 源模型的胸部刚体只剩素材刚体
    assert_eq!(model.rigid_bodies.iter().filter(|rb| rb.name_j == "左胸").count(), 1);
    assert_eq!(model.rigid_bodies.iter().filter(|rb| rb.name_j == "右胸").count(), 1);
}

#[test]
fn test_joints_purged_or_rebound() {
    let mut model = host_model();
    run(&mut model, &RgbaConfig::default());

    // 连接已删除刚体的普通关节被删除
    assert!(!model.joints.iter().any(|j| j.name == "右胸"));
    assert!(!model.joints.iter().any(|j| j.name == "左胸"));

    // 保留关节重新连接到同侧的素材主刚体
    let left_body = &model.rigid_bodies[model.find_body_j("左胸").unwrap()].name;
    let kept = model.joints.iter().find(|j| j.name == "胸飾り").unwrap();
    assert_eq!(kept.body_a.as_deref(), Some("胸飾り"));
    assert_eq!(kept.body_b.as_deref(), Some(left_body.as_str()));

    assert!(model.joints.iter().any(|j| j.name == "髪"));
    for joint in &model.joints {
        assert!(joint.is_connected_within(|b| model.contains_body(b)), "{} is dangling", joint.name);
    }
}

#[test]
fn test_weights_migrated_then_blended() {
    let mut model = host_model();
    let config = RgbaConfig { factor: 0.6, ..Default::default() };
    run(&mut model, &config);

    let mesh = model.primary_mesh().unwrap();
    assert!(mesh.find_group("胸上.L").is_none() || mesh.total_weight("胸上.L") == 0.0);
    assert_relative_eq!(mesh.weight(0, "胸.L"), 0.48, epsilon = 1e-5);
    assert_relative_eq!(mesh.weight(0, "上半身2"), 0.52, epsilon = 1e-5);
    assert_relative_eq!(mesh.weight(2, "胸.R"), 0.48, epsilon = 1e-5);
    assert_relative_eq!(mesh.weight(2, "上半身2"), 0.52, epsilon = 1e-5);
    // 总权重不变
    for v in 0..mesh.vertices.len() {
        let total: f32 = mesh.vertices[v].groups.iter().map(|(_, w)| *w).sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-5);
    }
}

#[test]
fn test_collision_and_order() {
    let mut model = host_model();
    let config = RgbaConfig::default();
    run(&mut model, &config);

    let limb = &model.rigid_bodies[model.find_body_j("右腕衝突").unwrap()];
    assert_eq!(limb.name, "7PS_右腕衝突");
    assert_eq!(limb.group, 13);
    assert_eq!(limb.mask, CollisionMask::all_except(14));
    let limb = &model.rigid_bodies[model.find_body_j("左腕衝突").unwrap()];
    assert_eq!(limb.name, "7PT_左腕衝突");

    let proxy = &model.rigid_bodies[model.find_body_j("左胸衝突").unwrap()];
    assert_eq!(proxy.kind, RigidBodyKind::FollowBone);
    assert_eq!(proxy.group, 14);

    let breast = &model.rigid_bodies[model.find_body_j("左胸").unwrap()];
    assert!(!breast.mask.excludes(13));
    assert!(breast.mask.excludes(14));

    let anchor = &model.rigid_bodies[model.find_body_j("上半身2_L").unwrap()];
    assert_eq!(anchor.bone.as_deref(), Some("上半身2"));
    assert_eq!(anchor.mask, CollisionMask::ALL);
    assert_relative_eq!(anchor.size.x, 0.01);

    let torso = &model.rigid_bodies[model.find_body_j("上半身2").unwrap()];
    assert!(torso.mask.excludes(14));

    let names: Vec<&str> = model.rigid_bodies.iter().map(|rb| rb.name.as_str()).collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
}

#[test]
fn test_no_collision_policy() {
    let mut model = host_model();
    let config = RgbaConfig { collision: mmd_jiggle::CollisionPolicy::NoCollision, ..Default::default() };
    run(&mut model, &config);

    assert!(model.find_body_j("右腕衝突").is_none());
    assert!(model.find_body_j("左胸衝突").is_none());
    let breast = &model.rigid_bodies[model.find_body_j("左胸").unwrap()];
    assert_eq!(breast.mask, CollisionMask::ALL);
}

#[test]
fn test_physics_frame_restored() {
    let mut model = host_model();
    run(&mut model, &RgbaConfig::default());
    assert_eq!(find_frame(&model.display_frames, PHYSICS_FRAME_NAME), Some(1));
    let physics = &model.display_frames[1];
    assert!(!physics.items.iter().any(|i| i == "胸上.L"));

    // 源模型没有“物理”显示枠时放到末尾
    let mut model = host_model();
    model.display_frames.remove(1);
    run(&mut model, &RgbaConfig::default());
    assert_eq!(
        find_frame(&model.display_frames, PHYSICS_FRAME_NAME),
        Some(model.display_frames.len() - 1)
    );
    let rgba = find_frame(&model.display_frames, "RGBA").unwrap();
    assert_eq!(model.display_frames[rgba].items, vec!["胸.L".to_string(), "胸.R".to_string()]);
}

#[test]
fn test_validation_errors() {
    let err = prepare(&flat_host_model(), &RgbaConfig::default()).unwrap_err();
    assert!(matches!(err, MmdError::Validation(ValidationError::NoBreastBones)));

    let mut model = host_model();
    let high = RgbaConfig { weight_threshold: 0.8, ..Default::default() };
    let err = prepare(&model, &high).unwrap_err();
    assert!(matches!(err, MmdError::Validation(ValidationError::NoUsableGeometry { .. })));

    let names = ["上半身2".to_string()].into_iter().collect();
    model.skeleton.remove_bones(&names);
    let err = prepare(&model, &RgbaConfig::default()).unwrap_err();
    assert!(matches!(err, MmdError::Validation(ValidationError::MissingTrunkBone { .. })));
}

#[test]
fn test_broken_template_is_config_error() {
    let mut left = template_left();
    left.rigid_bodies.retain(|rb| rb.name_j != "左胸");
    let err = TemplateRig::new(left, template_right()).unwrap_err();
    assert!(matches!(err, MmdError::Config(_)));
    assert!(err.is_run_fatal());
}

#[test]
fn test_failure_after_alignment_is_defect() {
    init_logger();
    let mut model = host_model();
    let config = RgbaConfig::default();
    let mut prepared = prepare(&model, &config).unwrap();
    let template = TemplateRig::new(broken_template_left(), template_right()).unwrap();

    let err = transplant(&mut model, &mut prepared, template, &config).unwrap_err();
    assert!(matches!(err, MmdError::Defect { stage: "verify", .. }), "{err}");
    assert!(err.to_string().contains("左胸_後"));
    assert!(!err.is_run_fatal());
    assert!(prepared.stages.is_past_transplant());
    assert_eq!(prepared.stages.current(), Some(AssetStage::CollisionBuilt));
}
