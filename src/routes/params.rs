//! 查询参数解析
//!
//! 参数先按字符串收集，类型转换失败统一返回 `InvalidArgument`，
//! 保证错误响应始终是 `{error, message, retriable}` 结构。

use std::collections::HashMap;
use std::str::FromStr;

use crate::error::{AppError, AppResult};

pub(crate) struct QueryParams(HashMap<String, String>);

impl QueryParams {
    pub(crate) fn new(raw: HashMap<String, String>) -> Self {
        Self(raw)
    }

    /// 字符串参数，空白值视为缺失
    pub(crate) fn text(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// 必填字符串参数
    pub(crate) fn required(&self, name: &str) -> AppResult<&str> {
        self.text(name)
            .ok_or_else(|| AppError::invalid_argument(format!("缺少 {} 参数", name)))
    }

    /// 布尔开关，接受 true/false/1/0，缺失时为 false
    pub(crate) fn flag(&self, name: &str) -> AppResult<bool> {
        match self.text(name).map(|v| v.trim().to_ascii_lowercase()) {
            None => Ok(false),
            Some(v) if v == "true" || v == "1" => Ok(true),
            Some(v) if v == "false" || v == "0" => Ok(false),
            Some(v) => Err(AppError::invalid_argument(format!(
                "参数 {} 需要布尔值，收到 '{}'",
                name, v
            ))),
        }
    }

    /// 可选的数值参数
    pub(crate) fn number<T: FromStr>(&self, name: &str) -> AppResult<Option<T>> {
        self.text(name)
            .map(|v| {
                v.trim().parse::<T>().map_err(|_| {
                    AppError::invalid_argument(format!("参数 {} 需要数字，收到 '{}'", name, v))
                })
            })
            .transpose()
    }
}
