//! 时间工具模块
//! 链上时间格式：UTC、秒精度、`YYYY-MM-DDTHH:MM:SS`

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// 链上时间文本格式
pub const CHAIN_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// 格式化为链上时间文本（截断到秒）
pub fn format_chain_time(dt: &DateTime<Utc>) -> String {
    dt.format(CHAIN_TIME_FORMAT).to_string()
}

/// 解析时间文本
///
/// 依次尝试 RFC 3339（带时区）与不带时区的 ISO-8601（视为 UTC）
pub fn parse_time(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Unix 秒转时间
pub fn from_unix_seconds(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}

/// 时间转链上 u32 秒；纪元之前或超出 u32 范围时返回 None
pub fn to_chain_seconds(dt: &DateTime<Utc>) -> Option<u32> {
    u32::try_from(dt.timestamp()).ok()
}
