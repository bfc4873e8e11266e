//! 宿主文档接口
//!
//! 导入/导出编解码由宿主实现，这里只定义调用方式。

use std::ops::{Deref, DerefMut};
use std::path::Path;
use std::thread;
use std::time::Duration;

use crate::error::HostError;
use crate::model::Model;
use crate::{MmdError, Result};

/// 导入参数
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImportOptions {
    pub scale: f32,
    /// 移除未使用的顶点和重复/无效的面
    pub clean_model: bool,
}

/// 导出参数
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExportOptions {
    pub scale: f32,
    pub copy_textures: bool,
}

/// 宿主文档
///
/// 导入的模型放在临时区域中，`purge_scratch` 会清空临时区域内的所有物体和孤立数据。
pub trait HostDocument {
    fn import_model(&mut self, path: &Path, options: &ImportOptions) -> std::result::Result<Model, HostError>;

    fn export_model(&mut self, model: &Model, path: &Path, options: &ExportOptions) -> std::result::Result<(), HostError>;

    fn purge_scratch(&mut self);
}

/// 单个模型处理期间的临时区域
///
/// 离开作用域时（成功或任何失败）清空临时区域。
pub struct ScratchArea<'a, H: HostDocument + ?Sized> {
    host: &'a mut H,
}

impl<'a, H: HostDocument + ?Sized> ScratchArea<'a, H> {
    pub fn new(host: &'a mut H) -> Self {
        Self { host }
    }
}

impl<H: HostDocument + ?Sized> Deref for ScratchArea<'_, H> {
    type Target = H;

    fn deref(&self) -> &H {
        &*self.host
    }
}

impl<H: HostDocument + ?Sized> DerefMut for ScratchArea<'_, H> {
    fn deref_mut(&mut self) -> &mut H {
        &mut *self.host
    }
}

impl<H: HostDocument + ?Sized> Drop for ScratchArea<'_, H> {
    fn drop(&mut self) {
        self.host.purge_scratch();
    }
}

// ============================================================================
// 重试
// ============================================================================

/// 重试策略
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts: attempts.max(1), delay }
    }
}

/// 调用宿主操作，失败后执行 `on_fail` 并等待固定间隔再重试
///
/// 全部失败返回 `MmdError::Io`，携带最后一次的错误。
pub fn with_retry<H, T, F, G>(
    host: &mut H,
    operation: &'static str,
    path: &Path,
    policy: RetryPolicy,
    mut op: F,
    mut on_fail: G,
) -> Result<T>
where
    H: HostDocument + ?Sized,
    F: FnMut(&mut H) -> std::result::Result<T, HostError>,
    G: FnMut(&mut H),
{
    let mut last = HostError::new("not attempted");
    for attempt in 0..policy.attempts {
        match op(&mut *host) {
            Ok(value) => {
                log::info!("[批处理] {}成功: {}（重试次数 {}）", operation, path.display(), attempt);
                return Ok(value);
            }
            Err(err) => {
                log::warn!("[批处理] {}失败，即将重试: {}，错误: {}", operation, path.display(), err);
                last = err;
                on_fail(&mut *host);
                if attempt + 1 < policy.attempts && !policy.delay.is_zero() {
                    thread::sleep(policy.delay);
                }
            }
        }
    }
    Err(MmdError::Io { operation, path: path.to_path_buf(), attempts: policy.attempts, last })
}

/// 导入模型，失败时先清空临时区域
pub fn import_with_retry<H: HostDocument + ?Sized>(
    host: &mut H,
    path: &Path,
    options: &ImportOptions,
    policy: RetryPolicy,
) -> Result<Model> {
    with_retry(host, "import", path, policy, |h| h.import_model(path, options), |h| h.purge_scratch())
}

/// 导出模型
pub fn export_with_retry<H: HostDocument + ?Sized>(
    host: &mut H,
    model: &Model,
    path: &Path,
    options: &ExportOptions,
    policy: RetryPolicy,
) -> Result<()> {
    with_retry(host, "export", path, policy, |h| h.export_model(model, path, options), |_| {})
}
