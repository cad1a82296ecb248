use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::item::ItemId;

/// 参与者标识
///
/// 启动时从链接参数中读取一次，缺失时为哨兵值 `"-1"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(String);

impl WorkerId {
    pub const UNKNOWN: &'static str = "-1";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn unknown() -> Self {
        Self(Self::UNKNOWN.to_string())
    }

    /// 从启动链接的查询参数中读取参与者 ID
    ///
    /// # 参数
    /// - `launch_url`: 完整链接或仅查询串（如 `?PROLIFIC_PID=abc`）
    /// - `param`: 参数名
    ///
    /// # 返回
    /// 找到非空参数时返回对应 ID，否则返回 `"-1"`
    pub fn from_launch_url(launch_url: Option<&str>, param: &str) -> Self {
        let Some(raw) = launch_url.map(str::trim).filter(|s| !s.is_empty()) else {
            return Self::unknown();
        };

        let parsed = Url::parse(raw).or_else(|_| {
            let query = raw.trim_start_matches('?');
            Url::parse(&format!("http://localhost/?{}", query))
        });

        parsed
            .ok()
            .and_then(|url| {
                url.query_pairs()
                    .find(|(key, value)| key == param && !value.is_empty())
                    .map(|(_, value)| value.into_owned())
            })
            .map(Self)
            .unwrap_or_else(Self::unknown)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_unknown(&self) -> bool {
        self.0 == Self::UNKNOWN
    }
}

impl Default for WorkerId {
    fn default() -> Self {
        Self::unknown()
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 参与者对一道题目的评判
///
/// 提交时创建，之后不再修改；字段名与后端 `/responses` 接口保持一致
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub item_id: ItemId,
    pub is_faithful: bool,
    pub is_relevant: bool,
    pub faithfulness_reasoning: String,
    pub relevance_reasoning: String,
    pub comments: String,
    pub elapsed_ms: i64,
    pub worker_id: WorkerId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_id_from_full_url() {
        let id = WorkerId::from_launch_url(
            Some("https://survey.example.org/?PROLIFIC_PID=5f1a&STUDY_ID=9"),
            "PROLIFIC_PID",
        );
        assert_eq!(id.as_str(), "5f1a");
    }

    #[test]
    fn test_worker_id_from_bare_query() {
        let id = WorkerId::from_launch_url(Some("?workerId=w-42"), "workerId");
        assert_eq!(id, WorkerId::new("w-42"));
    }

    #[test]
    fn test_worker_id_missing_falls_back_to_sentinel() {
        assert!(WorkerId::from_launch_url(None, "PROLIFIC_PID").is_unknown());
        assert!(WorkerId::from_launch_url(Some("?other=1"), "PROLIFIC_PID").is_unknown());
        assert!(WorkerId::from_launch_url(Some("?PROLIFIC_PID="), "PROLIFIC_PID").is_unknown());
        assert_eq!(WorkerId::default().as_str(), "-1");
    }

    #[test]
    fn test_evaluation_uses_camel_case_keys() {
        let evaluation = Evaluation {
            item_id: ItemId::Number(1),
            is_faithful: true,
            is_relevant: false,
            faithfulness_reasoning: "a".to_string(),
            relevance_reasoning: "b".to_string(),
            comments: String::new(),
            elapsed_ms: 1500,
            worker_id: WorkerId::unknown(),
        };

        let value = serde_json::to_value(&evaluation).unwrap();
        assert_eq!(value["itemId"], 1);
        assert_eq!(value["isFaithful"], true);
        assert_eq!(value["isRelevant"], false);
        assert_eq!(value["faithfulnessReasoning"], "a");
        assert_eq!(value["relevanceReasoning"], "b");
        assert_eq!(value["elapsedMs"], 1500);
        assert_eq!(value["workerId"], "-1");
    }
}
