//! 带顶点权重的网格
//!
//! 顶点组以名称为键保存在网格的顶点组表中（与骨骼同名），
//! 每个顶点只记录非零权重的稀疏列表。

use std::collections::HashMap;

use glam::{Mat4, Vec3};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Vertex {
    /// 模型空间坐标
    pub co: Vec3,
    /// (顶点组索引, 权重)
    pub groups: Vec<(usize, f32)>,
}

impl Vertex {
    pub fn weight(&self, group: usize) -> f32 {
        self.groups
            .iter()
            .find(|(g, _)| *g == group)
            .map(|(_, w)| *w)
            .unwrap_or(0.0)
    }

    pub fn set_weight(&mut self, group: usize, weight: f32) {
        match self.groups.iter_mut().find(|(g, _)| *g == group) {
            Some(entry) => entry.1 = weight,
            None => self.groups.push((group, weight)),
        }
    }

    pub fn remove_weight(&mut self, group: usize) {
        self.groups.retain(|(g, _)| *g != group);
    }
}

#[derive(Clone, Debug, Default)]
pub struct WeightedMesh {
    pub name: String,
    pub vertices: Vec<Vertex>,
    groups: Vec<String>,
    group_index: HashMap<String, usize>,
}

impl WeightedMesh {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn group_names(&self) -> &[String] {
        &self.groups
    }

    pub fn find_group(&self, name: &str) -> Option<usize> {
        self.group_index.get(name).copied()
    }

    /// 获取顶点组索引，不存在时新建
    pub fn ensure_group(&mut self, name: &str) -> usize {
        if let Some(index) = self.find_group(name) {
            return index;
        }
        let index = self.groups.len();
        self.groups.push(name.to_owned());
        self.group_index.insert(name.to_owned(), index);
        index
    }

    /// 添加顶点，权重按顶点组名称给出
    pub fn add_vertex(&mut self, co: Vec3, weights: &[(&str, f32)]) -> usize {
        let mut vertex = Vertex { co, groups: Vec::with_capacity(weights.len()) };
        for (name, weight) in weights {
            let group = self.ensure_group(name);
            vertex.set_weight(group, *weight);
        }
        self.vertices.push(vertex);
        self.vertices.len() - 1
    }

    /// 顶点在某顶点组中的权重（组不存在时为 0）
    pub fn weight(&self, vertex: usize, group_name: &str) -> f32 {
        match (self.vertices.get(vertex), self.find_group(group_name)) {
            (Some(v), Some(g)) => v.weight(g),
            _ => 0.0,
        }
    }

    /// 某顶点组的总权重
    pub fn total_weight(&self, group_name: &str) -> f32 {
        match self.find_group(group_name) {
            Some(g) => self.vertices.iter().map(|v| v.weight(g)).sum(),
            None => 0.0,
        }
    }

    pub fn transform(&mut self, matrix: Mat4) {
        for v in &mut self.vertices {
            v.co = matrix.transform_point3(v.co);
        }
    }
}
