//! 顶点组之间的权重传递

use crate::model::WeightedMesh;

/// 一次传递的统计
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TransferStats {
    /// 受影响的顶点数
    pub vertices: usize,
    /// 移入目标组的总权重
    pub moved: f32,
}

/// 把 `source` 组的权重按 `factor` 传给 `target` 组
///
/// - `remove_source = true`：源权重整体移除（完全转移）
/// - `remove_source = false`：源权重保留 `1 - factor`
///
/// 源组与目标组相同或源组不存在时什么也不做；目标组不存在时新建。
pub fn transfer(
    mesh: &mut WeightedMesh,
    source: &str,
    target: &str,
    factor: f32,
    remove_source: bool,
) -> TransferStats {
    let mut stats = TransferStats::default();
    if source == target {
        return stats;
    }
    let Some(source_index) = mesh.find_group(source) else {
        return stats;
    };
    let target_index = mesh.ensure_group(target);
    let factor = factor.clamp(0.0, 1.0);

    for vertex in &mut mesh.vertices {
        let source_weight = vertex.weight(source_index);
        if source_weight <= 0.0 {
            continue;
        }
        let moved = source_weight * factor;
        // 先读后写：以当前目标权重为基准设置新值
        let target_weight = vertex.weight(target_index);
        vertex.set_weight(target_index, target_weight + moved);

        if remove_source {
            vertex.remove_weight(source_index);
        } else {
            vertex.set_weight(source_index, source_weight * (1.0 - factor));
        }
        stats.vertices += 1;
        stats.moved += moved;
    }

    log::debug!(
        "[权重] {} → {}：{} 个顶点，转移 {:.4}（factor={}, remove={}）",
        source,
        target,
        stats.vertices,
        stats.moved,
        factor,
        remove_source
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::Vec3;

    fn mesh() -> WeightedMesh {
        let mut mesh = WeightedMesh::new("body");
        mesh.add_vertex(Vec3::ZERO, &[("胸", 0.8), ("上半身2", 0.2)]);
        mesh.add_vertex(Vec3::X, &[("胸", 0.3)]);
        mesh.add_vertex(Vec3::Y, &[("上半身2", 1.0)]);
        mesh
    }

    #[test]
    fn test_full_migration_conserves_weight() {
        let mut mesh = mesh();
        let before = mesh.total_weight("胸");
        let stats = transfer(&mut mesh, "胸", "胸.L", 1.0, true);

        assert_eq!(stats.vertices, 2);
        assert_relative_eq!(stats.moved, before, epsilon = 1e-6);
        assert_relative_eq!(mesh.total_weight("胸.L"), before, epsilon = 1e-6);
        assert_eq!(mesh.total_weight("胸"), 0.0);
        let source = mesh.find_group("胸").unwrap();
        assert!(mesh.vertices.iter().all(|v| v.groups.iter().all(|(g, _)| *g != source)));
    }

    #[test]
    fn test_partial_blend_keeps_remainder() {
        let mut mesh = mesh();
        let before: Vec<f32> = (0..3).map(|v| mesh.weight(v, "胸")).collect();
        let torso_before: Vec<f32> = (0..3).map(|v| mesh.weight(v, "上半身2")).collect();

        transfer(&mut mesh, "胸", "上半身2", 0.4, false);

        for v in 0..3 {
            let moved = mesh.weight(v, "上半身2") - torso_before[v];
            assert_relative_eq!(mesh.weight(v, "胸") + moved, before[v], epsilon = 1e-6);
        }
        assert_relative_eq!(mesh.weight(0, "上半身2"), 0.2 + 0.32, epsilon = 1e-6);
    }

    #[test]
    fn test_noop_cases() {
        let mut mesh = mesh();
        assert_eq!(transfer(&mut mesh, "胸", "胸", 1.0, true), TransferStats::default());
        assert_eq!(transfer(&mut mesh, "missing", "胸", 1.0, true), TransferStats::default());
        assert!(mesh.find_group("missing").is_none());
    }
}
