//! 批处理驱动
//!
//! 逐个处理目录中的模型：导入 → 识别 → 对齐 → 移植 → 碰撞 → 权重 → 导出 → 清理。
//! 单线程顺序执行，一个模型处理完成后才开始下一个。

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use super::host::{export_with_retry, import_with_retry, ExportOptions, HostDocument, ImportOptions, RetryPolicy, ScratchArea};
use super::naming::{output_file_name, timestamp_now};
use super::report::{AssetReport, RunSummary};
use super::search::{find_model_files, validate_directory};
use crate::config::RgbaConfig;
use crate::rig::{prepare, transplant, AssetStage, TemplateRig};
use crate::{MmdError, Result};

pub struct BatchOrchestrator<H: HostDocument> {
    host: H,
    config: RgbaConfig,
}

impl<H: HostDocument> BatchOrchestrator<H> {
    pub fn new(host: H, config: RgbaConfig) -> Self {
        Self { host, config }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn config(&self) -> &RgbaConfig {
        &self.config
    }

    pub fn into_host(self) -> H {
        self.host
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.config.max_retries, Duration::from_millis(self.config.retry_delay_ms))
    }

    fn import_options(&self) -> ImportOptions {
        ImportOptions { scale: self.config.import_scale, clean_model: true }
    }

    fn export_options(&self) -> ExportOptions {
        ExportOptions { scale: self.config.export_scale, copy_textures: false }
    }

    /// 处理目录
    ///
    /// 目录无效或素材损坏时中止整批；其余失败记录到对应模型的结果中。
    pub fn run(&mut self, directory: &Path) -> Result<RunSummary> {
        let start = Instant::now();
        let directory = validate_directory(directory)?;
        let files = find_model_files(&directory, &self.config)?;
        let count = files.len();

        let mut reports = Vec::with_capacity(count);
        for (index, path) in files.iter().enumerate() {
            let file_start = Instant::now();
            let report = match self.process_file(path) {
                Ok(report) => report,
                Err(err) if err.is_run_fatal() => {
                    log::error!("[批处理] 中止: {}", err);
                    return Err(err);
                }
                Err(err) => AssetReport::error(model_name(path), err.to_string()),
            };
            if report.is_error() {
                log::warn!("[批处理] {} - {}", report.name, report.message);
            }
            reports.push(report);
            log::info!(
                "[批处理] 文件“{}”处理完成，进度 {}/{}（当前耗时 {:.2}s，总耗时 {:.2}s）",
                path.display(),
                index + 1,
                count,
                file_start.elapsed().as_secs_f64(),
                start.elapsed().as_secs_f64()
            );
        }

        let summary = RunSummary { directory, reports, elapsed: start.elapsed() };
        if summary.has_failures() {
            log::warn!("[批处理] {}", summary);
        } else {
            log::info!("[批处理] {}", summary);
        }
        Ok(summary)
    }

    /// 处理单个模型
    ///
    /// 校验失败返回 `Severity::Error` 结果；I/O 失败与缺陷以错误返回。
    /// 无论结果如何，临时区域都会被清空。
    pub fn process_file(&mut self, path: &Path) -> Result<AssetReport> {
        let name = model_name(path);
        let policy = self.retry_policy();
        let import = self.import_options();
        let export = self.export_options();
        let config = &self.config;
        let mut scratch = ScratchArea::new(&mut self.host);

        let mut model = import_with_retry(&mut *scratch, path, &import, policy)?;
        let mut prepared = match prepare(&model, config) {
            Ok(prepared) => prepared,
            Err(MmdError::Validation(err)) => return Ok(AssetReport::error(name, err.to_string())),
            Err(err) => return Err(err),
        };

        let left = import_with_retry(&mut *scratch, &config.template_path_l(), &import, policy)?;
        let right = import_with_retry(&mut *scratch, &config.template_path_r(), &import, policy)?;
        let template = TemplateRig::new(left, right)?;

        transplant(&mut model, &mut prepared, template, config)?;

        let output = output_path(path, &name, config);
        export_with_retry(&mut *scratch, &model, &output, &export, policy)?;
        prepared.stages.advance(AssetStage::Exported)?;

        log::info!("[RGBA] {} → {}", name, output.display());
        Ok(AssetReport::info(name, output))
    }
}

fn model_name(path: &Path) -> String {
    path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
}

fn output_path(source: &Path, name: &str, config: &RgbaConfig) -> PathBuf {
    let file = output_file_name(name, config, &timestamp_now());
    match source.parent() {
        Some(dir) => dir.join(file),
        None => PathBuf::from(file),
    }
}
