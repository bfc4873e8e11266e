//! 错误类型
//!
//! 分级：配置错误（整批中止）、校验错误（单个模型跳过并报告）、
//! I/O 错误（重试耗尽后单个模型失败）、缺陷（移植后不变量被破坏）。

use std::path::PathBuf;

use thiserror::Error;

/// 单个模型的校验失败原因（可报告，批处理继续）
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("no breast bones found in the source model")]
    NoBreastBones,

    #[error("no usable breast geometry: every breast vertex weight is at most {threshold}")]
    NoUsableGeometry { threshold: f32 },

    #[error("required bone \"{name}\" not found in the source model")]
    MissingTrunkBone { name: String },

    #[error("source model has no mesh object")]
    NoMesh,
}

/// 宿主文档（导入/导出协作方）的单次调用失败
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{0}")]
pub struct HostError(pub String);

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

#[derive(Debug, Error)]
pub enum MmdError {
    /// 胸部素材损坏或缺少预期骨骼/刚体，整批中止
    #[error("template asset error: {0}")]
    Config(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// 导入/导出连续失败
    #[error("{operation} failed {attempts} times for {}: {last}", path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        attempts: u32,
        last: HostError,
    },

    #[error(transparent)]
    Host(#[from] HostError),

    /// 移植后阶段的不变量被破坏
    #[error("invariant violated after {stage}: {details}")]
    Defect { stage: &'static str, details: String },

    #[error("invalid model directory {}: {reason}", path.display())]
    InvalidDirectory { path: PathBuf, reason: &'static str },

    #[error("IO error: {0}")]
    FileSystem(#[from] std::io::Error),
}

impl MmdError {
    pub(crate) fn defect(stage: &'static str, details: impl Into<String>) -> Self {
        MmdError::Defect { stage, details: details.into() }
    }

    /// 是否应中止整个批处理（而不仅是当前模型）
    pub fn is_run_fatal(&self) -> bool {
        matches!(self, MmdError::Config(_) | MmdError::InvalidDirectory { .. })
    }
}

pub type Result<T> = std::result::Result<T, MmdError>;
