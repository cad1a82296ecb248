//! 资格测试评分服务 - 业务能力层
//!
//! 只负责"给一次资格测试打分"能力，不持有会话状态。
//!
//! 单题部分得分规则（满分 3 分）：
//! 1. 忠实度判断与标准答案一致 +1
//! 2. 相关性判断与标准答案一致 +1
//! 3. 任一关键词出现在两段理由之一中，且两段理由长度都小于 `回答长度 - margin` +1
//!
//! 单题得分 ≥ 2 视为答对；答对题数 ≥ 通过阈值视为通过。

use crate::config::Config;
use crate::models::answer_key::{AnswerKey, CanonicalAnswer};
use crate::models::evaluation::Evaluation;
use crate::models::item::ItemId;

/// 单题答对所需的最低分
pub const POINTS_TO_BE_CORRECT: u8 = 2;

/// 单题评分结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemScore {
    pub points: u8,
    pub correct: bool,
}

impl ItemScore {
    /// 没有找到对应提交时的结果（不计为答对）
    pub const MISSING: ItemScore = ItemScore {
        points: 0,
        correct: false,
    };

    fn from_points(points: u8) -> Self {
        Self {
            points,
            correct: points >= POINTS_TO_BE_CORRECT,
        }
    }
}

/// 对单道资格题打分
///
/// # 参数
/// - `canonical`: 标准答案
/// - `submitted`: 参与者提交的评判
/// - `length_margin`: 理由长度必须小于 `回答长度 - length_margin`
pub fn score(
    canonical: &CanonicalAnswer,
    submitted: &Evaluation,
    length_margin: usize,
) -> ItemScore {
    let mut points = 0u8;

    if submitted.is_faithful == canonical.faithfulness {
        points += 1;
    }
    if submitted.is_relevant == canonical.relevance {
        points += 1;
    }
    if earns_keyword_point(canonical, submitted, length_margin) {
        points += 1;
    }

    ItemScore::from_points(points)
}

fn earns_keyword_point(
    canonical: &CanonicalAnswer,
    submitted: &Evaluation,
    length_margin: usize,
) -> bool {
    let Some(limit) = canonical.response.chars().count().checked_sub(length_margin) else {
        return false;
    };

    let faithfulness = submitted.faithfulness_reasoning.as_str();
    let relevance = submitted.relevance_reasoning.as_str();

    // 理由与整段回答长度接近时视为直接粘贴
    let short_enough =
        faithfulness.chars().count() < limit && relevance.chars().count() < limit;
    if !short_enough {
        return false;
    }

    canonical
        .keywords
        .iter()
        .filter(|keyword| !keyword.is_empty())
        .any(|keyword| {
            faithfulness.contains(keyword.as_str()) || relevance.contains(keyword.as_str())
        })
}

/// 一次资格测试的评分结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualificationOutcome {
    pub passed: bool,
    pub correct_count: usize,
    pub required: usize,
    pub item_scores: Vec<(ItemId, ItemScore)>,
}

/// 资格测试评分器
///
/// 职责：
/// - 按 id 匹配标准答案和提交
/// - 汇总答对题数并与阈值比较
/// - 不保留任何状态，同样的输入永远得到同样的结果
#[derive(Debug, Clone)]
pub struct QualificationEvaluator {
    answer_key: AnswerKey,
    pass_threshold: usize,
    length_margin: usize,
}

impl QualificationEvaluator {
    pub fn new(answer_key: AnswerKey, pass_threshold: usize, length_margin: usize) -> Self {
        Self {
            answer_key,
            pass_threshold,
            length_margin,
        }
    }

    pub fn from_config(answer_key: AnswerKey, config: &Config) -> Self {
        Self::new(
            answer_key,
            config.pass_threshold,
            config.reasoning_length_margin,
        )
    }

    /// 对一次资格测试的全部提交打分
    pub fn evaluate(&self, evaluations: &[Evaluation]) -> QualificationOutcome {
        let item_scores: Vec<(ItemId, ItemScore)> = self
            .answer_key
            .answers()
            .iter()
            .map(|canonical| {
                let item_score = evaluations
                    .iter()
                    .find(|e| e.item_id == canonical.id)
                    .map(|submitted| score(canonical, submitted, self.length_margin))
                    .unwrap_or(ItemScore::MISSING);
                (canonical.id.clone(), item_score)
            })
            .collect();

        let correct_count = item_scores.iter().filter(|(_, s)| s.correct).count();

        QualificationOutcome {
            passed: correct_count >= self.pass_threshold,
            correct_count,
            required: self.pass_threshold,
            item_scores,
        }
    }
}
