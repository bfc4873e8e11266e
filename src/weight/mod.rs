//! 顶点权重处理

mod transfer;

pub use transfer::{transfer, TransferStats};
