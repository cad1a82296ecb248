use serde::{Deserialize, Serialize};
use std::fmt;

/// 评测题目 ID
///
/// 后端返回的 id 既可能是整数也可能是字符串，序列化时保持原样
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Number(i64),
    Text(String),
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Number(n) => write!(f, "{}", n),
            ItemId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for ItemId {
    fn from(value: i64) -> Self {
        ItemId::Number(value)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        ItemId::Text(value.to_string())
    }
}

/// 一道待评测的题目（query / context / response）
///
/// 支持两种形态：
/// - 单上下文：`context`
/// - 双上下文：`context1` + `context2`
///
/// 旧版本地数据使用 `Query` / `Source` / `Response` 字段名，这里作为别名兼容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    #[serde(alias = "Query")]
    pub query: String,
    #[serde(default, alias = "Source", skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context2: Option<String>,
    #[serde(alias = "Response")]
    pub response: String,
}

impl Item {
    /// 主上下文：单上下文题目的 `context`，或双上下文题目的 `context1`
    pub fn primary_context(&self) -> &str {
        self.context
            .as_deref()
            .or(self.context1.as_deref())
            .unwrap_or_default()
    }

    /// 第二上下文，单上下文题目返回 None
    pub fn secondary_context(&self) -> Option<&str> {
        self.context2.as_deref()
    }

    pub fn is_dual_context(&self) -> bool {
        self.context2.is_some()
    }
}
