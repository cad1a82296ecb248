//! 单批次题目流程 - 流程层
//!
//! 逐题推进：展示 → 收集评判 → 校验 → 提交/跳过 → 下一题。
//! 下标走到批次末尾的那一步会报告 `batch_finished`，且只报告一次。

use std::fmt;

use crate::error::SessionError;
use crate::models::evaluation::{Evaluation, WorkerId};
use crate::models::item::Item;

/// 提交时必须填写的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JudgmentField {
    Faithfulness,
    Relevance,
    FaithfulnessReasoning,
    RelevanceReasoning,
}

impl fmt::Display for JudgmentField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JudgmentField::Faithfulness => "faithfulness",
            JudgmentField::Relevance => "relevance",
            JudgmentField::FaithfulnessReasoning => "faithfulness_reasoning",
            JudgmentField::RelevanceReasoning => "relevance_reasoning",
        };
        f.write_str(name)
    }
}

/// 字段级校验错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: Vec<JudgmentField>,
}

impl ValidationErrors {
    pub fn new(fields: Vec<JudgmentField>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[JudgmentField] {
        &self.fields
    }

    pub fn contains(&self, field: JudgmentField) -> bool {
        self.fields.contains(&field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.fields.iter().map(ToString::to_string).collect();
        write!(f, "缺少必填字段 [{}]", names.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

/// 当前题目的输入草稿
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JudgmentDraft {
    pub is_faithful: Option<bool>,
    pub is_relevant: Option<bool>,
    pub faithfulness_reasoning: String,
    pub relevance_reasoning: String,
    pub comments: String,
}

impl JudgmentDraft {
    /// 校验必填字段，返回所有缺失字段
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut missing = Vec::new();
        if self.is_faithful.is_none() {
            missing.push(JudgmentField::Faithfulness);
        }
        if self.is_relevant.is_none() {
            missing.push(JudgmentField::Relevance);
        }
        if self.faithfulness_reasoning.trim().is_empty() {
            missing.push(JudgmentField::FaithfulnessReasoning);
        }
        if self.relevance_reasoning.trim().is_empty() {
            missing.push(JudgmentField::RelevanceReasoning);
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors::new(missing))
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 单道题目的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    Unanswered,
    Submitted,
    Skipped,
}

/// 一次提交/跳过的结果
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    /// 提交时生成的评判，跳过时为 None
    pub evaluation: Option<Evaluation>,
    /// 本步是否走完了整个批次
    pub batch_finished: bool,
}

/// 单批次题目会话
///
/// 空批次等同于"仍在加载"，不会被当作完成
#[derive(Debug, Clone)]
pub struct TaskSession {
    items: Vec<Item>,
    states: Vec<ItemState>,
    index: usize,
    draft: JudgmentDraft,
    allow_skip: bool,
    /// 上一次提交/跳过或进入阶段的时间
    segment_started_ms: i64,
}

impl TaskSession {
    pub fn new(items: Vec<Item>, allow_skip: bool, started_ms: i64) -> Self {
        let states = vec![ItemState::Unanswered; items.len()];
        Self {
            items,
            states,
            index: 0,
            draft: JudgmentDraft::default(),
            allow_skip,
            segment_started_ms: started_ms,
        }
    }

    /// 创建一个仍在等待题目的空会话
    pub fn loading(allow_skip: bool, started_ms: i64) -> Self {
        Self::new(Vec::new(), allow_skip, started_ms)
    }

    /// 为加载中的会话填入批次，计时从此刻开始
    ///
    /// 已有题目时不做任何修改
    pub fn load(&mut self, items: Vec<Item>, now_ms: i64) {
        if !self.is_loading() {
            return;
        }
        *self = Self::new(items, self.allow_skip, now_ms);
    }

    pub fn is_loading(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_finished(&self) -> bool {
        !self.items.is_empty() && self.index >= self.items.len()
    }

    pub fn current(&self) -> Option<&Item> {
        self.items.get(self.index)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn allows_skip(&self) -> bool {
        self.allow_skip
    }

    pub fn draft(&self) -> &JudgmentDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut JudgmentDraft {
        &mut self.draft
    }

    pub fn count(&self, state: ItemState) -> usize {
        self.states.iter().filter(|s| **s == state).count()
    }

    /// 提交当前题目
    ///
    /// 校验失败时停留在当前题目，不修改任何状态
    pub fn submit(
        &mut self,
        now_ms: i64,
        worker_id: &WorkerId,
    ) -> Result<StepOutcome, SessionError> {
        self.ensure_active()?;
        self.draft.validate()?;

        let item_id = match self.current() {
            Some(item) => item.id.clone(),
            None => return Err(SessionError::BatchFinished),
        };

        let evaluation = Evaluation {
            item_id,
            is_faithful: self.draft.is_faithful.unwrap_or_default(),
            is_relevant: self.draft.is_relevant.unwrap_or_default(),
            faithfulness_reasoning: self.draft.faithfulness_reasoning.clone(),
            relevance_reasoning: self.draft.relevance_reasoning.clone(),
            comments: self.draft.comments.clone(),
            elapsed_ms: (now_ms - self.segment_started_ms).max(0),
            worker_id: worker_id.clone(),
        };

        self.states[self.index] = ItemState::Submitted;
        let batch_finished = self.advance(now_ms);

        Ok(StepOutcome {
            evaluation: Some(evaluation),
            batch_finished,
        })
    }

    /// 跳过当前题目，不生成评判
    pub fn skip(&mut self, now_ms: i64) -> Result<StepOutcome, SessionError> {
        if !self.allow_skip {
            return Err(SessionError::SkipNotAllowed);
        }
        self.ensure_active()?;

        self.states[self.index] = ItemState::Skipped;
        let batch_finished = self.advance(now_ms);

        Ok(StepOutcome {
            evaluation: None,
            batch_finished,
        })
    }

    fn ensure_active(&self) -> Result<(), SessionError> {
        if self.is_loading() {
            return Err(SessionError::BatchLoading);
        }
        if self.is_finished() {
            return Err(SessionError::BatchFinished);
        }
        Ok(())
    }

    fn advance(&mut self, now_ms: i64) -> bool {
        self.draft.reset();
        self.index += 1;
        self.segment_started_ms = now_ms;
        self.index == self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::item::ItemId;

    fn items(n: i64) -> Vec<Item> {
        (1..=n)
            .map(|id| Item {
                id: ItemId::Number(id),
                query: "q".to_string(),
                context: Some("c".to_string()),
                context1: None,
                context2: None,
                response: "r".to_string(),
            })
            .collect()
    }

    fn fill(draft: &mut JudgmentDraft) {
        draft.is_faithful = Some(true);
        draft.is_relevant = Some(false);
        draft.faithfulness_reasoning = "because".to_string();
        draft.relevance_reasoning = "off topic".to_string();
    }

    #[test]
    fn test_validate_reports_every_missing_field() {
        let draft = JudgmentDraft {
            faithfulness_reasoning: "   ".to_string(),
            ..Default::default()
        };

        let err = draft.validate().unwrap_err();
        assert_eq!(
            err.fields(),
            &[
                JudgmentField::Faithfulness,
                JudgmentField::Relevance,
                JudgmentField::FaithfulnessReasoning,
                JudgmentField::RelevanceReasoning,
            ]
        );
    }

    #[test]
    fn test_empty_reasoning_blocks_advance() {
        let mut session = TaskSession::new(items(3), false, 0);
        fill(session.draft_mut());
        session.draft_mut().faithfulness_reasoning = String::new();

        let err = session.submit(10, &WorkerId::unknown()).unwrap_err();
        match err {
            SessionError::Validation(errors) => {
                assert!(errors.contains(JudgmentField::FaithfulnessReasoning));
                assert_eq!(errors.fields().len(), 1);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(session.index(), 0);
        // 草稿保留，方便参与者补充
        assert_eq!(session.draft().is_faithful, Some(true));
    }

    #[test]
    fn test_submit_builds_evaluation_and_resets_draft() {
        let mut session = TaskSession::new(items(2), false, 1_000);
        fill(session.draft_mut());
        session.draft_mut().comments = "ok".to_string();

        let outcome = session.submit(4_500, &WorkerId::new("w")).unwrap();
        let evaluation = outcome.evaluation.unwrap();

        assert_eq!(evaluation.item_id, ItemId::Number(1));
        assert!(evaluation.is_faithful);
        assert!(!evaluation.is_relevant);
        assert_eq!(evaluation.comments, "ok");
        assert_eq!(evaluation.elapsed_ms, 3_500);
        assert_eq!(evaluation.worker_id, WorkerId::new("w"));
        assert!(!outcome.batch_finished);
        assert_eq!(session.index(), 1);
        assert_eq!(session.draft(), &JudgmentDraft::default());
    }

    #[test]
    fn test_skip_restarts_timer() {
        let mut session = TaskSession::new(items(2), true, 0);
        session.skip(2_000).unwrap();
        fill(session.draft_mut());

        let evaluation = session
            .submit(2_750, &WorkerId::unknown())
            .unwrap()
            .evaluation
            .unwrap();
        assert_eq!(evaluation.elapsed_ms, 750);
        assert_eq!(session.count(ItemState::Skipped), 1);
        assert_eq!(session.count(ItemState::Submitted), 1);
    }

    #[test]
    fn test_skip_rejected_when_not_allowed() {
        let mut session = TaskSession::new(items(2), false, 0);
        assert!(matches!(session.skip(1), Err(SessionError::SkipNotAllowed)));
        assert_eq!(session.index(), 0);
    }

    #[test]
    fn test_batch_finished_reported_exactly_once() {
        let batch_size = 4;
        let mut session = TaskSession::new(items(batch_size + 1), true, 0);
        let mut finished_steps = Vec::new();

        for step in 0..=batch_size {
            let outcome = if step % 2 == 0 {
                fill(session.draft_mut());
                session.submit(step, &WorkerId::unknown()).unwrap()
            } else {
                session.skip(step).unwrap()
            };
            if outcome.batch_finished {
                finished_steps.push(step);
            }
        }

        assert_eq!(finished_steps, vec![batch_size]);
        assert_eq!(session.index() as i64, batch_size + 1);
        assert!(session.is_finished());
        assert!(matches!(session.skip(99), Err(SessionError::BatchFinished)));
        fill(session.draft_mut());
        assert!(matches!(
            session.submit(99, &WorkerId::unknown()),
            Err(SessionError::BatchFinished)
        ));
    }

    #[test]
    fn test_empty_batch_is_loading_not_finished() {
        let mut session = TaskSession::loading(true, 0);
        assert!(session.is_loading());
        assert!(!session.is_finished());
        assert!(matches!(session.skip(1), Err(SessionError::BatchLoading)));

        session.load(items(1), 100);
        assert!(!session.is_loading());
        fill(session.draft_mut());
        let outcome = session.submit(400, &WorkerId::unknown()).unwrap();
        assert_eq!(outcome.evaluation.unwrap().elapsed_ms, 300);
        assert!(outcome.batch_finished);
    }
}
