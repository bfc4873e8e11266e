//! 模型文件搜索

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use super::naming::{output_key, parse_output_stem};
use crate::config::{ConflictStrategy, RgbaConfig};
use crate::{MmdError, Result};

const MODEL_EXTENSIONS: [&str; 2] = ["pmx", "pmd"];

/// 模型目录必须存在，且不能是文件系统根目录
pub fn validate_directory(path: &Path) -> Result<PathBuf> {
    if !path.is_dir() {
        return Err(MmdError::InvalidDirectory { path: path.to_path_buf(), reason: "model directory not found" });
    }
    let absolute = fs::canonicalize(path)?;
    if absolute.parent().is_none() {
        return Err(MmdError::InvalidDirectory {
            path: absolute,
            reason: "root directory is not allowed, choose a subfolder",
        });
    }
    Ok(absolute)
}

fn is_model_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| MODEL_EXTENSIONS.contains(&e))
}

fn file_stem(path: &Path) -> &str {
    path.file_stem().and_then(|s| s.to_str()).unwrap_or_default()
}

/// 递归搜索待处理的模型文件
///
/// 每个目录内：体积大于阈值的 `.pmx`/`.pmd` 为候选；已生成的文件不作为输入；
/// `Skip` 策略下，已存在同参数生成文件的 `<name>.pmx` 也被排除。
/// 不进入符号链接指向的目录，无法读取的子目录跳过。结果按路径排序。
pub fn find_model_files(directory: &Path, config: &RgbaConfig) -> Result<Vec<PathBuf>> {
    // 顶层目录无法读取时整批失败
    fs::read_dir(directory)?;
    let (result, total) = walk(vec![directory.to_path_buf()], config);
    log::info!(
        "[批处理] 实际处理文件数 {}，模型文件总数 {}，跳过 {}",
        result.len(),
        total,
        total - result.len()
    );
    Ok(result)
}

/// 返回排序后的候选文件和模型文件总数
fn walk(mut pending: Vec<PathBuf>, config: &RgbaConfig) -> (Vec<PathBuf>, usize) {
    let mut result = Vec::new();
    let mut total = 0usize;
    while let Some(dir) = pending.pop() {
        let (dirs, files) = match list_directory(&dir) {
            Ok(listing) => listing,
            Err(err) => {
                log::warn!("[批处理] 无法读取目录，已跳过 {}: {}", dir.display(), err);
                continue;
            }
        };
        pending.extend(dirs);
        total += files.len();
        result.extend(select_in_directory(&dir, files, config));
    }
    result.sort();
    (result, total)
}

/// 列出目录中的子目录与模型文件（不跟随符号链接）
fn list_directory(dir: &Path) -> std::io::Result<(Vec<PathBuf>, Vec<PathBuf>)> {
    let mut dirs = Vec::new();
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            dirs.push(path);
        } else if is_model_file(&path) {
            files.push(path);
        }
    }
    Ok((dirs, files))
}

fn select_in_directory(dir: &Path, files: Vec<PathBuf>, config: &RgbaConfig) -> Vec<PathBuf> {
    let threshold = config.size_threshold_kb.saturating_mul(1024);
    let mut candidates = Vec::new();
    for path in files {
        match fs::metadata(&path) {
            Ok(meta) if meta.len() > threshold => candidates.push(path),
            Ok(_) => {}
            Err(err) => log::warn!("[批处理] 无法读取文件大小，已跳过 {}: {}", path.display(), err),
        }
    }

    let mut excluded = BTreeSet::new();
    for path in &candidates {
        let Some(name) = parse_output_stem(file_stem(path)) else {
            continue;
        };
        excluded.insert(path.clone());
        if config.conflict_strategy == ConflictStrategy::Skip && file_stem(path).contains(&output_key(name, config)) {
            let source = dir.join(format!("{name}.pmx"));
            log::debug!("[批处理] 已存在同参数生成文件，跳过 {}", source.display());
            excluded.insert(source);
        }
    }

    candidates.retain(|p| !excluded.contains(p));
    candidates
}
