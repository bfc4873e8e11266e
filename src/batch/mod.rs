//! 批处理：宿主文档接口、文件搜索、命名、结果汇总

mod host;
mod naming;
mod orchestrator;
mod report;
mod search;

pub use host::{
    export_with_retry, import_with_retry, with_retry, ExportOptions, HostDocument, ImportOptions, RetryPolicy,
    ScratchArea,
};
pub use naming::{format_factor, format_timestamp, output_file_name, output_key, parse_output_stem, timestamp_now, OUTPUT_NAME};
pub use orchestrator::BatchOrchestrator;
pub use report::{AssetReport, RunSummary, Severity};
pub use search::{find_model_files, validate_directory};
