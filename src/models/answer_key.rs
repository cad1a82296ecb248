use serde::{Deserialize, Serialize};

use crate::models::item::ItemId;

/// 资格测试题目的标准答案
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalAnswer {
    pub id: ItemId,
    pub faithfulness: bool,
    pub relevance: bool,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// 原始回答全文，用于判断理由是否整段粘贴
    pub response: String,
}

/// 标准答案表（只读，启动时加载一次）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerKey {
    answers: Vec<CanonicalAnswer>,
}

impl AnswerKey {
    pub fn new(answers: Vec<CanonicalAnswer>) -> Self {
        Self { answers }
    }

    pub fn answers(&self) -> &[CanonicalAnswer] {
        &self.answers
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn get(&self, id: &ItemId) -> Option<&CanonicalAnswer> {
        self.answers.iter().find(|a| &a.id == id)
    }
}
