//! MMD 模型 RGBA 胸部物理移植
//!
//! 把预先制作好的左右胸部物理素材（骨骼 + 刚体 + 关节）对齐并合并到任意 MMD 模型上，
//! 重建碰撞群组，按比例分配胸部权重。
//!
//! 坐标约定（Z 轴向上）：+X 为模型左侧，-Y 为模型正面。

pub mod batch;
pub mod config;
pub mod error;
pub mod geometry;
pub mod model;
pub mod physics;
pub mod rig;
pub mod skeleton;
pub mod weight;

pub use config::{get_config, reset_config, set_config, CollisionPolicy, ConflictStrategy, RgbaConfig};
pub use error::{HostError, MmdError, Result, ValidationError};
