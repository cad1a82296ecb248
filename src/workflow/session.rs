//! 会话控制器 - 流程层
//!
//! 核心职责：管理一位参与者的完整阶段流转
//!
//! ```text
//! Introduction(k<N) --advance--> Introduction(k+1)
//! Introduction(N)   ----------> Qualification
//! Qualification --通过--> MainTask（取共享计数器，分配批次）
//! Qualification --未通过--> Qualification（清空、重新打乱）
//! MainTask --全部完成--> Complete
//! ```
//!
//! 控制器只被一个任务持有，所有修改都经过 `&mut self`，
//! 同一时刻最多只有一个网络请求在等待。

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::clients::{ItemPool, SharedCounter, SubmissionGateway};
use crate::config::Config;
use crate::error::{AppError, AppResult, SessionError};
use crate::models::evaluation::{Evaluation, WorkerId};
use crate::models::item::Item;
use crate::models::loaders::StaticAssets;
use crate::models::stage::IntroStage;
use crate::services::introduction::{IntroProgress, IntroductionSequencer};
use crate::services::qualification::QualificationEvaluator;
use crate::services::shuffler::{apply_permutation, Shuffler};
use crate::services::work_assigner::WorkAssigner;
use crate::utils::clock::Clock;
use crate::utils::logging;
use crate::workflow::task_session::{ItemState, JudgmentDraft, StepOutcome, TaskSession};

/// 会话阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Introduction,
    Qualification,
    MainTask,
    Complete,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Introduction => "Introduction",
            Phase::Qualification => "Qualification",
            Phase::MainTask => "MainTask",
            Phase::Complete => "Complete",
        };
        f.write_str(name)
    }
}

/// 会话状态快照
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub phase: Phase,
    pub introduction_stage_index: usize,
    pub item_index: usize,
    pub evaluations: Vec<Evaluation>,
    pub qualification_passed: bool,
}

/// 每次操作后发生的事情
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// 介绍阶段前进到第 k 页
    IntroductionAdvanced { stage_index: usize },
    /// 开始（或重新开始）资格测试
    QualificationStarted { attempt: u32, item_count: usize },
    /// 同一阶段内前进到下一题
    ItemAdvanced { item_index: usize },
    /// 资格测试未通过，已重新开始
    QualificationFailed {
        correct: usize,
        required: usize,
        next_attempt: u32,
    },
    /// 资格测试通过，进入正式任务（等待加载批次）
    QualificationPassed { correct: usize, required: usize },
    /// 正式任务批次已就绪
    MainTaskReady { counter_value: i64, batch_len: usize },
    /// 批次仍在加载（计数器或题库暂不可用）
    StillLoading { counter_value: Option<i64> },
    /// 全部完成
    Completed { submitted: usize, skipped: usize },
}

/// 会话依赖的外部能力
pub struct SessionDeps {
    pub shuffler: Box<dyn Shuffler>,
    pub clock: Arc<dyn Clock>,
    pub gateway: Arc<dyn SubmissionGateway>,
    pub worker_id: WorkerId,
}

/// 会话控制器
pub struct SessionController {
    phase: Phase,
    introduction: IntroductionSequencer,
    evaluator: QualificationEvaluator,
    assigner: WorkAssigner,
    qualification_items: Vec<Item>,
    control_item: Item,
    shuffler: Box<dyn Shuffler>,
    clock: Arc<dyn Clock>,
    gateway: Arc<dyn SubmissionGateway>,
    worker_id: WorkerId,
    task: TaskSession,
    evaluations: Vec<Evaluation>,
    qualification_passed: bool,
    /// 仅用于日志，不持久化
    qualification_attempt: u32,
    /// 每个会话只取一次
    counter_value: Option<i64>,
    /// 后台提交任务，退出前由 `flush_submissions` 收尾
    submissions: JoinSet<()>,
}

impl SessionController {
    /// 创建新的会话控制器
    ///
    /// 通过阈值大于标准答案条数时无法通过，视为配置错误
    pub fn new(assets: StaticAssets, config: &Config, deps: SessionDeps) -> AppResult<Self> {
        config.validate()?;
        if config.pass_threshold > assets.answer_key.len() {
            return Err(AppError::invalid_config(
                "PASS_THRESHOLD",
                format!(
                    "阈值 {} 大于标准答案条数 {}",
                    config.pass_threshold,
                    assets.answer_key.len()
                ),
            ));
        }

        let now = deps.clock.now_ms();
        let mut controller = Self {
            phase: Phase::Introduction,
            introduction: IntroductionSequencer::new(assets.introduction),
            evaluator: QualificationEvaluator::from_config(assets.answer_key, config),
            assigner: WorkAssigner::from_config(config),
            qualification_items: assets.qualification_items,
            control_item: assets.control_item,
            shuffler: deps.shuffler,
            clock: deps.clock,
            gateway: deps.gateway,
            worker_id: deps.worker_id,
            task: TaskSession::loading(false, now),
            evaluations: Vec::new(),
            qualification_passed: false,
            qualification_attempt: 0,
            counter_value: None,
            submissions: JoinSet::new(),
        };

        if controller.introduction.is_finished() {
            controller.enter_qualification();
        }
        Ok(controller)
    }

    // ========== 只读访问 ==========

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> SessionState {
        SessionState {
            phase: self.phase,
            introduction_stage_index: self.introduction.index(),
            item_index: self.item_index(),
            evaluations: self.evaluations.clone(),
            qualification_passed: self.qualification_passed,
        }
    }

    pub fn current_stage(&self) -> Option<&IntroStage> {
        match self.phase {
            Phase::Introduction => self.introduction.current(),
            _ => None,
        }
    }

    pub fn introduction_progress(&self) -> (usize, usize) {
        (self.introduction.index(), self.introduction.stage_count())
    }

    pub fn current_item(&self) -> Option<&Item> {
        match self.phase {
            Phase::Qualification | Phase::MainTask => self.task.current(),
            _ => None,
        }
    }

    /// 当前题目序号，会话完成后归零
    pub fn item_index(&self) -> usize {
        match self.phase {
            Phase::Complete => 0,
            _ => self.task.index(),
        }
    }

    pub fn batch_len(&self) -> usize {
        self.task.len()
    }

    /// 正式任务阶段且批次尚未就绪
    pub fn is_loading(&self) -> bool {
        self.phase == Phase::MainTask && self.task.is_loading()
    }

    pub fn can_skip(&self) -> bool {
        self.phase == Phase::MainTask && self.task.allows_skip()
    }

    pub fn evaluations(&self) -> &[Evaluation] {
        &self.evaluations
    }

    pub fn counter_value(&self) -> Option<i64> {
        self.counter_value
    }

    pub fn qualification_attempt(&self) -> u32 {
        self.qualification_attempt
    }

    pub fn skipped_count(&self) -> usize {
        self.task.count(ItemState::Skipped)
    }

    pub fn draft(&self) -> &JudgmentDraft {
        self.task.draft()
    }

    pub fn draft_mut(&mut self) -> &mut JudgmentDraft {
        self.task.draft_mut()
    }

    // ========== 用户操作 ==========

    /// 介绍阶段翻到下一页，看完最后一页后进入资格测试
    pub fn advance_introduction(&mut self) -> Result<SessionEvent, SessionError> {
        self.require_phase(&[Phase::Introduction], "advance_introduction")?;

        match self.introduction.advance() {
            IntroProgress::Stage(stage_index) => {
                debug!("介绍阶段第 {} 页", stage_index + 1);
                Ok(SessionEvent::IntroductionAdvanced { stage_index })
            }
            IntroProgress::Finished => Ok(self.enter_qualification()),
        }
    }

    /// 提交当前题目
    pub fn submit(&mut self) -> Result<SessionEvent, SessionError> {
        self.require_phase(&[Phase::Qualification, Phase::MainTask], "submit")?;

        let outcome = self.task.submit(self.clock.now_ms(), &self.worker_id)?;
        Ok(self.after_step(outcome))
    }

    /// 跳过当前题目（仅正式任务阶段）
    pub fn skip(&mut self) -> Result<SessionEvent, SessionError> {
        self.require_phase(&[Phase::Qualification, Phase::MainTask], "skip")?;
        if self.phase == Phase::Qualification {
            return Err(SessionError::SkipNotAllowed);
        }

        let outcome = self.task.skip(self.clock.now_ms())?;
        Ok(self.after_step(outcome))
    }

    /// 加载正式任务批次
    ///
    /// - 计数器每个会话只取一次；取值失败时保持加载状态
    /// - 题库拉取失败按空题库处理，保持加载状态
    /// - 不做自动重试，由调用方决定何时再次加载
    pub async fn load_main_task(
        &mut self,
        counter: &dyn SharedCounter,
        pool: &dyn ItemPool,
    ) -> AppResult<SessionEvent> {
        self.require_phase(&[Phase::MainTask], "load_main_task")?;

        if let (Some(counter_value), false) = (self.counter_value, self.task.is_loading()) {
            return Ok(SessionEvent::MainTaskReady {
                counter_value,
                batch_len: self.task.len(),
            });
        }

        let counter_value = match self.counter_value {
            Some(value) => value,
            None => match counter.increment().await {
                Ok(value) => {
                    info!("🔢 获取共享计数器: {}", value);
                    self.counter_value = Some(value);
                    value
                }
                Err(e) => {
                    warn!("⚠️ 获取共享计数器失败，保持加载状态: {}", e);
                    return Ok(SessionEvent::StillLoading {
                        counter_value: None,
                    });
                }
            },
        };

        let pool_items = match pool.fetch_items().await {
            Ok(items) => items,
            Err(e) => {
                warn!("⚠️ 拉取题库失败，按空题库处理: {}", e);
                Vec::new()
            }
        };

        let batch = self
            .assigner
            .assign(counter_value, &pool_items, &self.control_item);
        if batch.is_empty() {
            return Ok(SessionEvent::StillLoading {
                counter_value: Some(counter_value),
            });
        }

        let window = self.assigner.window(counter_value);
        logging::log_batch_assigned(counter_value, window.start, window.end, batch.len());

        let batch_len = batch.len();
        self.task.load(batch, self.clock.now_ms());
        Ok(SessionEvent::MainTaskReady {
            counter_value,
            batch_len,
        })
    }

    // ========== 内部流转 ==========

    fn require_phase(
        &self,
        allowed: &[Phase],
        operation: &'static str,
    ) -> Result<(), SessionError> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(SessionError::WrongPhase {
                phase: self.phase.to_string(),
                operation,
            })
        }
    }

    fn set_phase(&mut self, next: Phase) {
        if self.phase != next {
            logging::log_phase_change(&self.phase.to_string(), &next.to_string());
        }
        self.phase = next;
    }

    /// 进入（或重新进入）资格测试：清空作答、重新打乱
    fn enter_qualification(&mut self) -> SessionEvent {
        self.qualification_attempt += 1;
        self.evaluations.clear();

        let order = self.shuffler.permutation(self.qualification_items.len());
        let items = apply_permutation(&self.qualification_items, &order);
        let item_count = items.len();

        self.task = TaskSession::new(items, false, self.clock.now_ms());
        self.set_phase(Phase::Qualification);

        info!(
            "📝 开始第 {} 次资格测试，共 {} 道题",
            self.qualification_attempt, item_count
        );
        SessionEvent::QualificationStarted {
            attempt: self.qualification_attempt,
            item_count,
        }
    }

    fn after_step(&mut self, outcome: StepOutcome) -> SessionEvent {
        if let Some(evaluation) = outcome.evaluation {
            if self.phase == Phase::MainTask {
                self.dispatch_submission(evaluation.clone());
            }
            self.evaluations.push(evaluation);
        }

        if !outcome.batch_finished {
            return SessionEvent::ItemAdvanced {
                item_index: self.task.index(),
            };
        }

        match self.phase {
            Phase::Qualification => self.finish_qualification(),
            Phase::MainTask => self.complete(),
            Phase::Introduction | Phase::Complete => SessionEvent::ItemAdvanced {
                item_index: self.task.index(),
            },
        }
    }

    fn finish_qualification(&mut self) -> SessionEvent {
        let outcome = self.evaluator.evaluate(&self.evaluations);
        for (id, score) in &outcome.item_scores {
            debug!("资格题 {}: {} 分, 正确: {}", id, score.points, score.correct);
        }

        // 资格测试的作答在判定后一律丢弃
        self.evaluations.clear();

        if outcome.passed {
            info!(
                "✅ 资格测试通过: {}/{} (阈值 {})",
                outcome.correct_count,
                outcome.item_scores.len(),
                outcome.required
            );
            self.qualification_passed = true;
            self.task = TaskSession::loading(true, self.clock.now_ms());
            self.set_phase(Phase::MainTask);
            SessionEvent::QualificationPassed {
                correct: outcome.correct_count,
                required: outcome.required,
            }
        } else {
            warn!(
                "❌ 资格测试未通过: {}/{} (阈值 {})，重新开始",
                outcome.correct_count,
                outcome.item_scores.len(),
                outcome.required
            );
            self.enter_qualification();
            SessionEvent::QualificationFailed {
                correct: outcome.correct_count,
                required: outcome.required,
                next_attempt: self.qualification_attempt,
            }
        }
    }

    fn complete(&mut self) -> SessionEvent {
        self.set_phase(Phase::Complete);
        let submitted = self.task.count(ItemState::Submitted);
        let skipped = self.task.count(ItemState::Skipped);
        info!("🎉 会话完成: 提交 {}, 跳过 {}", submitted, skipped);
        SessionEvent::Completed { submitted, skipped }
    }

    /// 投递评判结果：放到后台执行，不等待、不重试
    fn dispatch_submission(&mut self, evaluation: Evaluation) {
        let gateway = Arc::clone(&self.gateway);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let task = async move {
                    if let Err(e) = gateway.submit(&evaluation).await {
                        warn!("⚠️ 提交评判失败 (题目 {}): {}", evaluation.item_id, e);
                    }
                };
                self.submissions.spawn_on(task, &handle);
            }
            Err(_) => {
                warn!(
                    "⚠️ 没有可用的异步运行时，丢弃提交 (题目 {})",
                    evaluation.item_id
                );
            }
        }
    }

    /// 等待仍在后台的提交完成
    ///
    /// 超过 `limit` 后放弃剩余任务并返回其数量，全部完成时返回 0
    pub async fn flush_submissions(&mut self, limit: Duration) -> usize {
        if self.submissions.is_empty() {
            return 0;
        }
        info!("⏳ 等待 {} 个后台提交完成", self.submissions.len());

        let submissions = &mut self.submissions;
        let drained = tokio::time::timeout(limit, async {
            while let Some(result) = submissions.join_next().await {
                if let Err(e) = result {
                    warn!("⚠️ 后台提交任务异常结束: {}", e);
                }
            }
        })
        .await;

        if drained.is_ok() {
            debug!("后台提交已全部完成");
            return 0;
        }
        let pending = self.submissions.len();
        warn!("⚠️ 等待 {:?} 后仍有 {} 个提交未完成，已放弃", limit, pending);
        // 丢弃旧集合即中止其中的任务
        self.submissions = JoinSet::new();
        pending
    }
}
