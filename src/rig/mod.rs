//! RGBA 胸部物理移植
//!
//! - `template`: 左右胸部素材
//! - `anchor`: 伪胸骨计算
//! - `solver`: 素材对齐（缩放/旋转/位移）
//! - `transplant`: 骨骼/刚体/关节图移植
//! - `collision`: 碰撞拓扑与重排序
//! - `pipeline`: 单个模型的完整流程

pub mod anchor;
pub mod collision;
pub mod pipeline;
pub mod solver;
pub mod template;
pub mod transplant;

pub use anchor::{compute_anchor, AnchorFrame};
pub use collision::{build_collision, reorder, CollisionLayout, CollisionSummary};
pub use pipeline::{prepare, transplant, AssetStage, PreparedAsset, StageTracker, TransplantReport};
pub use solver::{apply_location_diff, apply_rotation_diff, apply_scale_diff};
pub use template::TemplateRig;
pub use transplant::{AccessoryInfo, RemovedBreast};
