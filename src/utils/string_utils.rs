//! 字符串工具模块
//! 请求字段的空白处理

/// 检查字符串是否为空或只包含空白字符
pub fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// 可选字段：空白视为未提供，其余去除两端空白
pub fn non_blank(opt: Option<&str>) -> Option<&str> {
    opt.map(str::trim).filter(|s| !s.is_empty())
}
