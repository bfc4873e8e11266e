//! 处理结果汇总

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

/// 单个模型的处理结果
#[derive(Clone, Debug, PartialEq)]
pub struct AssetReport {
    /// 源模型名称（文件名去掉扩展名）
    pub name: String,
    pub severity: Severity,
    pub message: String,
    /// 成功时的输出文件
    pub output: Option<PathBuf>,
}

impl AssetReport {
    pub fn info(name: impl Into<String>, output: PathBuf) -> Self {
        Self {
            name: name.into(),
            severity: Severity::Info,
            message: format!("执行完成，模型文件地址：{}", output.display()),
            output: Some(output),
        }
    }

    pub fn error(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self { name: name.into(), severity: Severity::Error, message: message.into(), output: None }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// 整批处理结果
#[derive(Clone, Debug)]
pub struct RunSummary {
    pub directory: PathBuf,
    pub reports: Vec<AssetReport>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.reports.len()
    }

    pub fn succeeded(&self) -> usize {
        self.reports.iter().filter(|r| !r.is_error()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &AssetReport> {
        self.reports.iter().filter(|r| r.is_error())
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }
}

impl fmt::Display for RunSummary {
    /// 有失败时逐条列出 `名称 - 原因` 并给出成功数；全部成功时只输出一条消息
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.elapsed.as_secs_f64();
        if !self.has_failures() {
            return write!(f, "目录“{}”处理完成（总耗时{:.2}s）", self.directory.display(), secs);
        }
        for report in self.failures() {
            writeln!(f, "{} - {}", report.name, report.message)?;
        }
        write!(f, "{}/{} 个文件已处理完成（总耗时 {:.2}s）", self.succeeded(), self.total(), secs)
    }
}
