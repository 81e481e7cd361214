//! 通用 API 响应模型
//!
//! 定义统一的 API 响应格式

use chrono::Utc;
use chrono_tz::Asia::Shanghai;
use serde::{Deserialize, Serialize};

/// 获取北京时间字符串（ISO 8601 格式，带+08:00时区）
pub fn get_beijing_time() -> String {
    Utc::now().with_timezone(&Shanghai).to_rfc3339()
}

/// 统一 API 响应结构
///
/// 所有接口返回统一格式，包含：
/// - success: 请求是否成功
/// - data: 响应数据（成功时有值）
/// - message: 响应消息
/// - warnings: 被跳过的请求或记录（部分失败时有值）
/// - timestamp: 响应时间戳（北京时间）
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    /// 创建成功响应
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: "Success".to_string(),
            warnings: Vec::new(),
            timestamp: get_beijing_time(),
        }
    }

    /// 创建成功响应，并附带部分失败信息
    pub fn partial(data: T, warnings: Vec<String>) -> Self {
        let message = if warnings.is_empty() {
            "Success".to_string()
        } else {
            format!("部分数据获取失败: {} 项", warnings.len())
        };
        Self {
            success: true,
            data: Some(data),
            message,
            warnings,
            timestamp: get_beijing_time(),
        }
    }

    /// 创建错误响应
    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message,
            warnings: Vec::new(),
            timestamp: get_beijing_time(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_beijing_time() {
        assert!(get_beijing_time().contains("+08:00"));
    }

    #[test]
    fn test_partial_message() {
        let ok = ApiResponse::partial(1, Vec::new());
        assert_eq!(ok.message, "Success");

        let partial = ApiResponse::partial(1, vec!["a".into(), "b".into()]);
        assert!(partial.success);
        assert_eq!(partial.message, "部分数据获取失败: 2 项");

        let json = serde_json::to_value(ApiResponse::success(1)).unwrap();
        assert!(json.get("warnings").is_none());
    }
}
