//! 刚体与关节数据
//!
//! - RigidBody: 刚体（形状、群组、非碰撞掩码）
//! - Joint: 连接两个刚体的 6DOF 弹簧关节
//! - ordinal: 导出顺序用的 36 进制序号前缀

mod joint;
mod ordinal;
mod rigid_body;

pub use joint::{Joint, JointLimits};
pub use ordinal::{strip_ordinal, to_base36, with_ordinal};
pub use rigid_body::{CollisionMask, RigidBody, RigidBodyKind, RigidBodyShape, GROUP_COUNT};
