//! 骨骼集合 - 管理骨骼层次结构与名称唯一性

use std::collections::{HashMap, HashSet};

use glam::Mat4;

use super::bone::Bone;

/// 骨骼集合
///
/// 骨骼按插入顺序保存；`name_to_index` 保证名称唯一。
#[derive(Clone, Debug, Default)]
pub struct BoneSet {
    bones: Vec<Bone>,
    name_to_index: HashMap<String, usize>,
}

impl BoneSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按顺序添加骨骼，重名的骨骼会被跳过
    pub fn from_bones(bones: impl IntoIterator<Item = Bone>) -> Self {
        let mut set = Self::new();
        for bone in bones {
            if !set.add_bone(bone) {
                log::warn!("[骨骼] 骨骼名称重复，已跳过");
            }
        }
        set
    }

    /// 添加骨骼，名称已存在时返回 false
    pub fn add_bone(&mut self, bone: Bone) -> bool {
        if self.name_to_index.contains_key(&bone.name) {
            return false;
        }
        self.name_to_index.insert(bone.name.clone(), self.bones.len());
        self.bones.push(bone);
        true
    }

    pub fn find_bone_by_name(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.name_to_index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Bone> {
        self.find_bone_by_name(name).map(|i| &self.bones[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Bone> {
        match self.find_bone_by_name(name) {
            Some(i) => Some(&mut self.bones[i]),
            None => None,
        }
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bone> {
        self.bones.iter()
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// 子骨骼（按骨骼顺序）
    pub fn children<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Bone> + 'a {
        self.bones
            .iter()
            .filter(move |b| b.parent.as_deref() == Some(name))
    }

    /// `ancestor` 是否为 `name` 的祖先（含自身）
    ///
    /// 带访问集合，畸形数据中的环不会导致死循环。
    pub fn is_ancestor_or_self(&self, ancestor: &str, name: &str) -> bool {
        let mut visited = HashSet::new();
        let mut current = Some(name);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            if !visited.insert(n) {
                return false;
            }
            current = self.get(n).and_then(|b| b.parent.as_deref());
        }
        false
    }

    /// 设置父骨骼，会形成环或骨骼不存在时返回 false
    pub fn set_parent(&mut self, name: &str, parent: Option<&str>) -> bool {
        if let Some(p) = parent {
            if !self.contains(p) || self.is_ancestor_or_self(name, p) {
                return false;
            }
        }
        match self.get_mut(name) {
            Some(bone) => {
                bone.parent = parent.map(str::to_owned);
                true
            }
            None => false,
        }
    }

    /// 删除骨骼
    ///
    /// 被删除骨骼的子骨骼挂到被删除骨骼的（未被删除的）最近祖先上。
    /// 返回实际删除的骨骼名称（按原顺序）。
    pub fn remove_bones(&mut self, names: &HashSet<String>) -> Vec<String> {
        let removed: Vec<String> = self
            .bones
            .iter()
            .filter(|b| names.contains(&b.name))
            .map(|b| b.name.clone())
            .collect();
        if removed.is_empty() {
            return removed;
        }

        // 先计算每个被删除骨骼的替代父骨骼
        let mut replacement: HashMap<String, Option<String>> = HashMap::new();
        for name in &removed {
            let mut visited = HashSet::new();
            let mut parent = self.get(name).and_then(|b| b.parent.clone());
            while let Some(p) = parent.clone() {
                if !names.contains(&p) || !visited.insert(p.clone()) {
                    break;
                }
                parent = self.get(&p).and_then(|b| b.parent.clone());
            }
            let parent = parent.filter(|p| !names.contains(p));
            replacement.insert(name.clone(), parent);
        }

        self.bones.retain(|b| !names.contains(&b.name));
        for bone in &mut self.bones {
            if let Some(p) = &bone.parent {
                if let Some(new_parent) = replacement.get(p) {
                    bone.parent = new_parent.clone();
                }
            }
        }
        self.rebuild_index();
        removed
    }

    /// 对所有骨骼应用矩阵
    pub fn transform(&mut self, matrix: Mat4) {
        for bone in &mut self.bones {
            bone.transform(matrix);
        }
    }

    fn rebuild_index(&mut self) {
        self.name_to_index = self
            .bones
            .iter()
            .enumerate()
            .map(|(i, b)| (b.name.clone(), i))
            .collect();
    }
}
