//! 输入验证辅助函数
//!
//! - normalize_required：必填字段，去除首尾空格后不能为空
//! - normalize_optional：可选字段，提供时同样不能为空
//! - parse_status：状态字符串解析，失败返回 INVALID.STATUS
//!
//! 失败时直接返回可用的错误响应。

use crate::utils::response::{bad_request_error, invalid_status_error};
use axum::response::Response;
use std::fmt::Display;
use std::str::FromStr;

/// 验证必填字段，去除空格并检查非空
pub fn normalize_required(value: String, field: &str) -> Result<String, Response> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(bad_request_error(format!("{field} required")));
    }
    Ok(trimmed.to_string())
}

/// 验证可选字段，如果提供则去除空格并检查非空
pub fn normalize_optional(value: Option<String>, field: &str) -> Result<Option<String>, Response> {
    match value {
        Some(value) => normalize_required(value, field).map(Some),
        None => Ok(None),
    }
}

/// 解析可选的状态参数
pub fn parse_status<T>(value: Option<&str>) -> Result<Option<T>, Response>
where
    T: FromStr,
    T::Err: Display,
{
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|err: T::Err| invalid_status_error(err.to_string())),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use domain::{BuildingStatus, ChangeStatus};

    #[test]
    fn required_fields_are_trimmed() {
        assert_eq!(
            normalize_required("  Tower ".to_string(), "name").expect("name"),
            "Tower"
        );
        let response = normalize_required("   ".to_string(), "name").expect_err("blank");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(normalize_optional(None, "name").expect("none"), None);
    }

    #[test]
    fn status_parsing_rejects_unknown_values() {
        let parsed: Option<BuildingStatus> = parse_status(Some("fire")).expect("fire");
        assert_eq!(parsed, Some(BuildingStatus::Fire));
        let parsed: Option<ChangeStatus> = parse_status(Some("")).expect("empty");
        assert_eq!(parsed, None);
        let response = parse_status::<ChangeStatus>(Some("archived")).expect_err("bad");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
