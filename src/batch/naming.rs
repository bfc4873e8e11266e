//! 输出文件命名
//!
//! `<name>_RGBA_<factor>_<rb_scale_factor>_<默认|无碰撞>_<YYYYMMDDHHMMSS>.pmx`

use std::fmt;

use chrono::{DateTime, Local, TimeZone};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::RgbaConfig;

/// 已生成文件的文件名（不含扩展名）
pub static OUTPUT_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.+)_RGBA_(\d+(?:\.\d+)?)_(\d+(?:\.\d+)?)_(默认|无碰撞)_(\d{14})$")
        .unwrap_or_else(|e| panic!("invalid output name pattern: {e}"))
});

/// 保留两位小数并去掉末尾的 0 和小数点
pub fn format_factor(value: f32) -> String {
    let text = format!("{value:.2}");
    text.trim_end_matches('0').trim_end_matches('.').to_owned()
}

/// 输出文件名中时间戳之前的部分，用于识别同参数的已生成文件
pub fn output_key(name: &str, config: &RgbaConfig) -> String {
    format!(
        "{}_RGBA_{}_{}_{}",
        name,
        format_factor(config.rounded_factor()),
        format_factor(config.rounded_rb_scale_factor()),
        config.collision.label()
    )
}

pub fn output_file_name(name: &str, config: &RgbaConfig, timestamp: &str) -> String {
    format!("{}_{}.pmx", output_key(name, config), timestamp)
}

/// 匹配输出文件名时返回源模型名称
pub fn parse_output_stem(stem: &str) -> Option<&str> {
    OUTPUT_NAME.captures(stem).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// 当前本地时间，格式 `YYYYMMDDHHMMSS`
pub fn timestamp_now() -> String {
    format_timestamp(&Local::now())
}

pub fn format_timestamp<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    time.format("%Y%m%d%H%M%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CollisionPolicy;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_format_factor() {
        assert_eq!(format_factor(0.6), "0.6");
        assert_eq!(format_factor(1.0), "1");
        assert_eq!(format_factor(0.05), "0.05");
        assert_eq!(format_factor(0.0), "0");
    }

    #[test]
    fn test_output_name_matches_pattern() {
        let config = RgbaConfig { collision: CollisionPolicy::NoCollision, ..Default::default() };
        let file = output_file_name("ミク_v2", &config, "20240102030405");
        assert_eq!(file, "ミク_v2_RGBA_0.6_0.8_无碰撞_20240102030405.pmx");
        assert_eq!(parse_output_stem(file.trim_end_matches(".pmx")), Some("ミク_v2"));
        assert_eq!(parse_output_stem("ミク_v2"), None);
        assert_eq!(parse_output_stem("a_RGBA_0.6_0.8_other_20240102030405"), None);
    }

    #[test]
    fn test_timestamp() {
        let time = Utc.with_ymd_and_hms(2024, 2, 29, 12, 34, 56).single().unwrap();
        assert_eq!(format_timestamp(&time), "20240229123456");
        let now = timestamp_now();
        assert_eq!(now.len(), 14);
        assert!(OUTPUT_NAME.is_match(&format!("a_RGBA_0.6_0.8_默认_{now}")));
    }
}
