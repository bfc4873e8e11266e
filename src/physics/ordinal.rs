//! 刚体/关节的序号前缀
//!
//! 导出顺序由物体名称决定，名称前缀为 3 位 36 进制序号 + 下划线，如 `7PS_左胸`。

use once_cell::sync::Lazy;
use regex::Regex;

const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

static ORDINAL_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9A-Z]{3}_)(.*)$").unwrap_or_else(|e| panic!("invalid ordinal pattern: {e}"))
});

/// 整数转 36 进制字符串，不足 `width` 位时左侧补 0
pub fn to_base36(mut value: u32, width: usize) -> String {
    if value == 0 {
        return "0".repeat(width.max(1));
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    while digits.len() < width {
        digits.push(b'0');
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

/// 去掉已有的序号前缀
pub fn strip_ordinal(name: &str) -> &str {
    match ORDINAL_PREFIX.captures(name).and_then(|c| c.get(2)) {
        Some(rest) => rest.as_str(),
        None => name,
    }
}

/// 用新序号替换名称前缀
pub fn with_ordinal(name: &str, index: u32) -> String {
    format!("{}_{}", to_base36(index, 3), strip_ordinal(name))
}
