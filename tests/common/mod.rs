#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use glam::{Mat4, Vec3};
use mmd_jiggle::batch::{ExportOptions, HostDocument, ImportOptions};
use mmd_jiggle::model::{DisplayFrame, Model, WeightedMesh};
use mmd_jiggle::physics::{CollisionMask, Joint, RigidBody, RigidBodyKind, RigidBodyShape};
use mmd_jiggle::skeleton::{Bone, BoneSet};
use mmd_jiggle::HostError;
use tempfile::TempDir;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ============================================================================
// 内存宿主
// ============================================================================

/// 以文件名（不含扩展名）索引模型的宿主文档
#[derive(Default)]
pub struct MemoryHost {
    pub models: HashMap<String, Model>,
    /// 文件名 → 剩余导入失败次数
    pub import_failures: HashMap<String, u32>,
    /// 剩余导出失败次数
    pub export_failures: u32,
    pub imports: Vec<PathBuf>,
    pub exports: Vec<(PathBuf, Model)>,
    pub purges: usize,
}

fn stem(path: &Path) -> String {
    path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
}

impl MemoryHost {
    pub fn with_templates() -> Self {
        let mut host = Self::default();
        host.insert("RGBA_L", template_left());
        host.insert("RGBA_R", template_right());
        host
    }

    pub fn insert(&mut self, name: &str, model: Model) {
        self.models.insert(name.to_owned(), model);
    }
}

impl HostDocument for MemoryHost {
    fn import_model(&mut self, path: &Path, _: &ImportOptions) -> Result<Model, HostError> {
        self.imports.push(path.to_path_buf());
        let name = stem(path);
        if let Some(left) = self.import_failures.get_mut(&name) {
            if *left > 0 {
                *left -= 1;
                return Err(HostError::new(format!("{name} is locked")));
            }
        }
        self.models
            .get(&name)
            .cloned()
            .ok_or_else(|| HostError::new(format!("file not found: {}", path.display())))
    }

    fn export_model(&mut self, model: &Model, path: &Path, _: &ExportOptions) -> Result<(), HostError> {
        if self.export_failures > 0 {
            self.export_failures -= 1;
            return Err(HostError::new("disk full"));
        }
        self.exports.push((path.to_path_buf(), model.clone()));
        Ok(())
    }

    fn purge_scratch(&mut self) {
        self.purges += 1;
    }
}

// ============================================================================
// 测试模型
// ============================================================================

fn sphere(name: &str, kind: RigidBodyKind, group: u8, radius: f32, at: Vec3) -> RigidBody {
    RigidBody::new(name, name)
        .with_kind(kind)
        .with_shape(RigidBodyShape::Sphere, Vec3::new(radius, 0.0, 0.0))
        .with_group(group, CollisionMask::empty())
        .with_matrix(Mat4::from_translation(at))
}

/// 带左右胸骨、胸饰、双臂的源模型
///
/// 胸饰关节连接 `胸飾り` 与源模型的 `左胸` 刚体。
pub fn host_model() -> Model {
    let mut model = Model::new("host");
    model.skeleton = BoneSet::from_bones([
        Bone::new("全ての親", Vec3::ZERO, Vec3::Z * 0.1),
        Bone::new("上半身", Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 0.0, 1.1)).with_parent("全ての親"),
        Bone::new("上半身2", Vec3::new(0.0, 0.0, 1.1), Vec3::new(0.0, 0.0, 1.4)).with_parent("上半身"),
        Bone::new("胸上.L", Vec3::new(0.15, 0.0, 1.3), Vec3::new(0.15, -0.12, 1.28)).with_parent("上半身2"),
        Bone::new("胸上.R", Vec3::new(-0.15, 0.0, 1.3), Vec3::new(-0.15, -0.12, 1.28)).with_parent("上半身2"),
        Bone::new("胸飾り", Vec3::new(0.15, -0.12, 1.28), Vec3::new(0.15, -0.2, 1.2)).with_parent("胸上.L"),
        Bone::new("左腕", Vec3::new(0.2, 0.0, 1.4), Vec3::new(0.5, 0.0, 1.2)).with_parent("上半身2"),
        Bone::new("右腕", Vec3::new(-0.2, 0.0, 1.4), Vec3::new(-0.5, 0.0, 1.2)).with_parent("上半身2"),
    ]);

    let mut mesh = WeightedMesh::new("body");
    mesh.add_vertex(Vec3::new(0.20, -0.15, 1.25), &[("胸上.L", 0.8), ("上半身2", 0.2)]);
    mesh.add_vertex(Vec3::new(0.05, -0.05, 1.35), &[("胸上.L", 0.5), ("上半身2", 0.5)]);
    mesh.add_vertex(Vec3::new(-0.20, -0.15, 1.25), &[("胸上.R", 0.8), ("上半身2", 0.2)]);
    mesh.add_vertex(Vec3::new(-0.05, -0.05, 1.35), &[("胸上.R", 0.5), ("上半身2", 0.5)]);
    // 恰好等于阈值，不计入胸部范围
    mesh.add_vertex(Vec3::new(0.6, -0.9, 0.2), &[("胸上.L", 0.25), ("上半身2", 0.75)]);
    mesh.add_vertex(Vec3::new(0.0, 0.1, 1.0), &[("上半身2", 1.0)]);
    model.meshes.push(mesh);

    model.rigid_bodies = vec![
        sphere("上半身2", RigidBodyKind::FollowBone, 0, 0.1, Vec3::new(0.0, 0.0, 1.2)).with_bone("上半身2"),
        sphere("左胸", RigidBodyKind::Physics, 1, 0.08, Vec3::new(0.15, -0.1, 1.28)).with_bone("胸上.L"),
        sphere("右胸", RigidBodyKind::Physics, 1, 0.08, Vec3::new(-0.15, -0.1, 1.28)).with_bone("胸上.R"),
        sphere("左腕", RigidBodyKind::FollowBone, 0, 0.05, Vec3::new(0.35, 0.0, 1.3)).with_bone("左腕"),
        sphere("右腕", RigidBodyKind::FollowBone, 0, 0.05, Vec3::new(-0.35, 0.0, 1.3)).with_bone("右腕"),
        sphere("胸飾り", RigidBodyKind::Physics, 5, 0.02, Vec3::new(0.15, -0.6, 1.2)).with_bone("胸飾り"),
        sphere("髪", RigidBodyKind::Physics, 3, 0.05, Vec3::new(0.0, 0.3, 1.6)),
    ];
    model.joints = vec![
        Joint::new("左胸", "左胸").connect("上半身2", "左胸"),
        Joint::new("右胸", "右胸").connect("上半身2", "右胸"),
        Joint::new("胸飾り", "胸飾り").connect("胸飾り", "左胸"),
        Joint::new("髪", "髪").connect("上半身2", "髪"),
    ];
    model.display_frames = vec![
        DisplayFrame::new("Root", vec!["全ての親".into()]),
        DisplayFrame::new("物理", vec!["胸上.L".into(), "胸上.R".into()]),
        DisplayFrame::new("体", vec!["上半身".into(), "上半身2".into(), "左腕".into()]),
    ];
    model
}

/// 没有胸骨的源模型
pub fn flat_host_model() -> Model {
    let mut model = host_model();
    let names = ["胸上.L", "胸上.R"].iter().map(|s| s.to_string()).collect();
    model.skeleton.remove_bones(&names);
    model
}

fn template_side(left: bool) -> Model {
    let sign = if left { 1.0 } else { -1.0 };
    let (suffix, lr) = if left { ("L", "左") } else { ("R", "右") };
    let bone = format!("胸.{suffix}");
    let main = format!("{lr}胸");
    let front = format!("{lr}胸_前");
    let anchor = format!("上半身2_{suffix}");

    let mut model = Model::new(format!("RGBA_{suffix}"));
    let head = Vec3::new(sign * 0.5, 0.0, 1.0);
    let tail = Vec3::new(sign * 0.5, -1.0, 1.0);
    model.skeleton.add_bone(Bone::new(bone.clone(), head, tail));
    model.meshes.push(WeightedMesh::new("breast"));

    model.rigid_bodies = vec![
        sphere(&anchor, RigidBodyKind::FollowBone, 0, 0.3, head).with_bone(bone.clone()),
        sphere(&main, RigidBodyKind::Physics, 14, 0.5, tail).with_bone(bone.clone()),
        sphere(&front, RigidBodyKind::Physics, 14, 0.2, tail - Vec3::Y * 0.3).with_bone(bone.clone()),
    ];
    model.joints = vec![
        Joint::new(main.clone(), main.clone())
            .connect(anchor, main.clone())
            .with_matrix(Mat4::from_scale(Vec3::splat(1.5))),
        Joint::new(format!("{lr}胸_前1"), format!("{lr}胸_前1")).connect(main, front),
    ];
    model.display_frames = vec![
        DisplayFrame::new("物理", vec![]),
        DisplayFrame::new("RGBA", vec![bone]),
    ];
    model
}

pub fn template_left() -> Model {
    template_side(true)
}

pub fn template_right() -> Model {
    template_side(false)
}

/// 关节连接了素材中不存在的刚体，对齐阶段无法发现
pub fn broken_template_left() -> Model {
    let mut model = template_left();
    model.joints.push(Joint::new("左胸_後", "左胸_後").connect("左胸", "左胸_後"));
    model
}

// ============================================================================
// 临时目录
// ============================================================================

/// 在临时目录中写入指定大小的文件
pub fn file(dir: &TempDir, relative: &str, bytes: usize) -> PathBuf {
    let path = dir.path().join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, vec![0u8; bytes]).unwrap();
    path
}
