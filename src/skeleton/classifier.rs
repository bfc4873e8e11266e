//! 骨骼/刚体名称分类
//!
//! 规则表按顺序匹配，首个命中的规则决定分类。
//! 辅助骨骼（`_dummy_` / `_shadow_` 前缀）总是排除在胸骨之外。

use std::collections::{BTreeMap, BTreeSet, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

use super::bone::Bone;
use super::bone_set::BoneSet;
use crate::physics::RigidBody;

/// 名称分类结果
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NameClass {
    /// 辅助骨骼
    Helper,
    /// 符合胸部命名规则
    Breast,
    /// 少女前线2 的胸部命名
    VendorBreast,
    Other,
}

impl NameClass {
    #[inline]
    pub fn is_breast(self) -> bool {
        matches!(self, NameClass::Breast | NameClass::VendorBreast)
    }
}

enum NamePattern {
    Regex(Regex),
    /// 忽略大小写，需同时包含所有片段
    ContainsAll(&'static [&'static str]),
}

impl NamePattern {
    fn matches(&self, name: &str) -> bool {
        match self {
            NamePattern::Regex(re) => re.is_match(name),
            NamePattern::ContainsAll(parts) => {
                let lower = name.to_lowercase();
                parts.iter().all(|p| lower.contains(p))
            }
        }
    }
}

/// 单条分类规则
pub struct NameRule {
    pattern: NamePattern,
    class: NameClass,
}

impl NameRule {
    fn regex(pattern: &str, class: NameClass) -> Self {
        // 规则均为编译期常量
        let re = Regex::new(pattern).unwrap_or_else(|e| panic!("invalid name rule {pattern}: {e}"));
        Self { pattern: NamePattern::Regex(re), class }
    }

    fn contains_all(parts: &'static [&'static str], class: NameClass) -> Self {
        Self { pattern: NamePattern::ContainsAll(parts), class }
    }

    pub fn class(&self) -> NameClass {
        self.class
    }

    pub fn matches(&self, name: &str) -> bool {
        self.pattern.matches(name)
    }
}

const QUALIFIERS: &str = "_上下前後先間親亲変形回転支え基W筋";

/// 胸骨命名：胸 + 修饰字 + 可选数字 + 可选錘/先/D + 可选序号/左右
static BREAST_BONE_GRAMMAR: Lazy<String> = Lazy::new(|| {
    format!(r"^胸([{QUALIFIERS}]*)([0-9０-９])?([錘先D])?(\.\d{{3}})?(\.[LR])?(\.\d{{3}})?$")
});

/// 胸部刚体命名：开头可为任意个 左/右/胸/_
static BREAST_BODY_GRAMMAR: Lazy<String> = Lazy::new(|| {
    format!(r"^([_左右胸]*)([{QUALIFIERS}]*)([0-9０-９])?([錘先D])?(\.\d{{3}})?(\.[LR])?(\.\d{{3}})?$")
});

/// 骨骼规则表
pub static BONE_RULES: Lazy<Vec<NameRule>> = Lazy::new(|| {
    vec![
        NameRule::regex(r"^_(dummy|shadow)_", NameClass::Helper),
        NameRule::regex(&BREAST_BONE_GRAMMAR, NameClass::Breast),
        NameRule::regex(r"(?i)chest_[lr]", NameClass::VendorBreast),
        NameRule::contains_all(&["bone", "ches"], NameClass::VendorBreast),
    ]
});

/// 刚体规则表
pub static BODY_RULES: Lazy<Vec<NameRule>> = Lazy::new(|| {
    vec![
        NameRule::regex(&BREAST_BODY_GRAMMAR, NameClass::Breast),
        NameRule::regex(r"(?i)chest_[lr]", NameClass::VendorBreast),
        NameRule::contains_all(&["bone", "ches"], NameClass::VendorBreast),
    ]
});

fn classify(rules: &[NameRule], name: &str) -> NameClass {
    rules
        .iter()
        .find(|rule| rule.matches(name))
        .map(NameRule::class)
        .unwrap_or(NameClass::Other)
}

pub fn classify_bone_name(name: &str) -> NameClass {
    classify(&BONE_RULES, name)
}

pub fn classify_body_name(name: &str) -> NameClass {
    if name.is_empty() {
        return NameClass::Other;
    }
    classify(&BODY_RULES, name)
}

pub fn is_helper_bone_name(name: &str) -> bool {
    classify_bone_name(name) == NameClass::Helper
}

pub fn is_breast_bone_name(name: &str) -> bool {
    classify_bone_name(name).is_breast()
}

/// 胸部骨骼列表（按骨骼顺序）
///
/// 返回空列表表示模型中没有可识别的胸骨，调用方应终止该模型的处理。
pub fn breast_bones(skeleton: &BoneSet) -> Vec<&Bone> {
    skeleton
        .iter()
        .filter(|b| is_breast_bone_name(&b.name))
        .collect()
}

/// 受物理影响的骨骼（被 物理 / 物理+骨骼 刚体关联）
pub fn physical_bone_names(bodies: &[RigidBody]) -> BTreeSet<String> {
    bodies
        .iter()
        .filter(|rb| rb.kind.is_physics())
        .filter_map(|rb| rb.bone.clone())
        .filter(|b| !b.is_empty())
        .collect()
}

/// 胸饰品根骨骼 → 所属胸骨
///
/// 胸饰品指胸骨的非胸骨、非辅助子骨骼（胸飾、胸坠等）。
pub fn accessory_roots(skeleton: &BoneSet, breast: &[&Bone]) -> BTreeMap<String, String> {
    let breast_names: HashSet<&str> = breast.iter().map(|b| b.name.as_str()).collect();
    let mut map = BTreeMap::new();
    for bone in breast {
        for child in skeleton.children(&bone.name) {
            if breast_names.contains(child.name.as_str()) || is_helper_bone_name(&child.name) {
                continue;
            }
            map.insert(child.name.clone(), bone.name.clone());
        }
    }
    map
}

/// 根据胸饰品关系表递归展开所有子孙骨骼名称
///
/// 结果以饰品根骨骼开头，随后是按深度优先顺序收集的子孙骨骼。
/// 带访问集合，环状的畸形骨架不会导致死循环。
pub fn expand_accessory_bone_names(
    skeleton: &BoneSet,
    accessory_map: &BTreeMap<String, String>,
) -> Vec<String> {
    let mut collected: Vec<String> = accessory_map.keys().cloned().collect();
    let mut visited: HashSet<String> = collected.iter().cloned().collect();

    for root in accessory_map.keys() {
        let mut stack = vec![root.clone()];
        while let Some(name) = stack.pop() {
            let children: Vec<String> = skeleton.children(&name).map(|c| c.name.clone()).collect();
            // 逆序压栈，保持子骨骼的原始顺序
            for child in children.into_iter().rev() {
                if visited.insert(child.clone()) {
                    collected.push(child.clone());
                    stack.push(child);
                }
            }
        }
    }
    collected
}
