//! 会话应用 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：读取参与者 ID、写日志头、加载静态资源、创建后端客户端
//! 2. **装配控制器**：把时钟、打乱器、投递网关注入 `SessionController`
//! 3. **终端循环**：按阶段展示内容、读取输入、调用控制器
//! 4. **收尾**：导出评判结果并输出统计
//!
//! 本模块不做任何业务判断，阶段流转全部委托给 workflow 层

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncWrite};
use tracing::{debug, error, info, warn};

use crate::clients::BackendClient;
use crate::config::Config;
use crate::error::SessionError;
use crate::models::evaluation::WorkerId;
use crate::models::item::Item;
use crate::models::loaders::load_static_assets;
use crate::orchestrator::console::Console;
use crate::services::export::ResultExporter;
use crate::services::shuffler::SeededShuffler;
use crate::utils::clock::SystemClock;
use crate::utils::logging;
use crate::workflow::session::{Phase, SessionController, SessionDeps, SessionEvent};
use crate::workflow::task_session::JudgmentField;

const JUDGMENT_FIELDS: [JudgmentField; 4] = [
    JudgmentField::Faithfulness,
    JudgmentField::Relevance,
    JudgmentField::FaithfulnessReasoning,
    JudgmentField::RelevanceReasoning,
];

/// 会话结束时的汇总
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    /// 结束时所处阶段，输入中途结束时不是 Complete
    pub phase: Phase,
    pub submitted: usize,
    pub skipped: usize,
    pub export_path: Option<PathBuf>,
}

/// 单步执行结果
enum Step {
    Continue,
    InputClosed,
}

/// 单个字段的输入结果
enum FieldInput {
    Value(String),
    Skipped,
    InputClosed,
}

/// 应用主结构
pub struct App {
    config: Config,
    backend: BackendClient,
    controller: SessionController,
    exporter: ResultExporter,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        let worker_id =
            WorkerId::from_launch_url(config.launch_url.as_deref(), &config.worker_id_param);

        logging::init_log_file(&config.output_log_file, worker_id.as_str())?;
        logging::log_startup(&config.api_base_url, worker_id.as_str());
        if worker_id.is_unknown() {
            warn!(
                "⚠️ 启动链接中没有参数 {}，参与者 ID 记为 {}",
                config.worker_id_param,
                WorkerId::UNKNOWN
            );
        }

        let assets = load_static_assets(Path::new(&config.assets_dir)).await?;
        let backend = BackendClient::new(&config)?;

        let deps = SessionDeps {
            shuffler: Box::new(SeededShuffler::from_optional_seed(config.shuffle_seed)),
            clock: Arc::new(SystemClock),
            gateway: Arc::new(backend.clone()),
            worker_id,
        };
        let controller = SessionController::new(assets, &config, deps)?;
        let exporter = ResultExporter::new(config.export_dir.clone());

        Ok(Self {
            config,
            backend,
            controller,
            exporter,
        })
    }

    /// 在标准输入输出上运行会话
    pub async fn run(self) -> Result<SessionSummary> {
        let mut console = Console::stdio();
        self.run_with(&mut console).await
    }

    /// 在指定终端上运行会话，直到完成或输入结束
    pub async fn run_with<R, W>(mut self, console: &mut Console<R, W>) -> Result<SessionSummary>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        loop {
            let step = match self.controller.phase() {
                Phase::Introduction => self.show_stage(console).await?,
                Phase::Qualification | Phase::MainTask if self.controller.is_loading() => {
                    self.load_batch(console).await?
                }
                Phase::Qualification | Phase::MainTask => self.judge_item(console).await?,
                Phase::Complete => return self.finish(console).await,
            };

            if let Step::InputClosed = step {
                return Ok(self.abort().await);
            }
        }
    }

    // ========== 介绍阶段 ==========

    async fn show_stage<R, W>(&mut self, console: &mut Console<R, W>) -> Result<Step>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let (index, total) = self.controller.introduction_progress();
        let Some(stage) = self.controller.current_stage() else {
            return Ok(Step::Continue);
        };
        let text = format!(
            "\n=== [{}/{}] {} ===\n\n{}\n",
            index + 1,
            total,
            stage.title,
            stage.body.trim_end()
        );
        let label = format!("[{}] press Enter > ", stage.button_label);

        console.say(&text).await?;
        if console.prompt(&label).await?.is_none() {
            return Ok(Step::InputClosed);
        }

        let event = self.controller.advance_introduction()?;
        self.report(console, event).await?;
        Ok(Step::Continue)
    }

    // ========== 批次加载 ==========

    async fn load_batch<R, W>(&mut self, console: &mut Console<R, W>) -> Result<Step>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        console.say("Loading your tasks...").await?;
        let event = self
            .controller
            .load_main_task(&self.backend, &self.backend)
            .await?;

        match event {
            SessionEvent::MainTaskReady { batch_len, .. } => {
                console
                    .say(&format!("{} items are ready for you.", batch_len))
                    .await?;
                Ok(Step::Continue)
            }
            _ => {
                let input = console
                    .prompt("Tasks are still loading. Press Enter to try again > ")
                    .await?;
                Ok(input.map_or(Step::InputClosed, |_| Step::Continue))
            }
        }
    }

    // ========== 逐题作答 ==========

    async fn judge_item<R, W>(&mut self, console: &mut Console<R, W>) -> Result<Step>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let Some(item) = self.controller.current_item() else {
            return Ok(Step::Continue);
        };
        let heading = match self.controller.phase() {
            Phase::Qualification => "Qualification item",
            _ => "Task",
        };
        let text = format!(
            "\n--- {} {}/{} ---\n{}",
            heading,
            self.controller.item_index() + 1,
            self.controller.batch_len(),
            render_item(item)
        );
        debug!(
            "展示题目 {}: {}",
            item.id,
            logging::truncate_text(&item.query, 40)
        );
        console.say(&text).await?;

        let mut pending: Vec<JudgmentField> = JUDGMENT_FIELDS.to_vec();
        let mut ask_comments = true;

        loop {
            for field in &pending {
                match self.read_field(console, *field).await? {
                    FieldInput::Value(value) => self.apply_field(*field, value),
                    FieldInput::Skipped => return Ok(Step::Continue),
                    FieldInput::InputClosed => return Ok(Step::InputClosed),
                }
            }

            if ask_comments {
                ask_comments = false;
                match console.prompt("Comments (optional) > ").await? {
                    Some(comments) => self.controller.draft_mut().comments = comments,
                    None => return Ok(Step::InputClosed),
                }
            }

            match self.controller.submit() {
                Ok(event) => {
                    self.report(console, event).await?;
                    return Ok(Step::Continue);
                }
                Err(SessionError::Validation(errors)) => {
                    console
                        .say(&format!("Please complete: {}", field_list(errors.fields())))
                        .await?;
                    pending = errors.fields().to_vec();
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// 读取一个字段；正式任务中输入 skip 直接跳过本题
    async fn read_field<R, W>(
        &mut self,
        console: &mut Console<R, W>,
        field: JudgmentField,
    ) -> Result<FieldInput>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let label = field_prompt(field, self.controller.can_skip());

        loop {
            let Some(input) = console.prompt(&label).await? else {
                return Ok(FieldInput::InputClosed);
            };
            if !is_skip_command(&input) {
                return Ok(FieldInput::Value(input));
            }

            match self.controller.skip() {
                Ok(event) => {
                    console.say("Skipped.").await?;
                    self.report(console, event).await?;
                    return Ok(FieldInput::Skipped);
                }
                Err(SessionError::SkipNotAllowed) => {
                    console
                        .say("Items cannot be skipped in the qualification test.")
                        .await?;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn apply_field(&mut self, field: JudgmentField, value: String) {
        let draft = self.controller.draft_mut();
        match field {
            JudgmentField::Faithfulness => draft.is_faithful = parse_verdict(&value),
            JudgmentField::Relevance => draft.is_relevant = parse_verdict(&value),
            JudgmentField::FaithfulnessReasoning => draft.faithfulness_reasoning = value,
            JudgmentField::RelevanceReasoning => draft.relevance_reasoning = value,
        }
    }

    /// 把控制器事件转成给参与者看的提示
    async fn report<R, W>(&self, console: &mut Console<R, W>, event: SessionEvent) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let message = match event {
            SessionEvent::QualificationStarted { item_count, .. } => format!(
                "\nQualification test: {} items. Skipping is not possible here.",
                item_count
            ),
            SessionEvent::QualificationFailed {
                correct, required, ..
            } => format!(
                "\nYou answered {} items correctly, {} are needed. \
                 The qualification test starts again.",
                correct, required
            ),
            SessionEvent::QualificationPassed { .. } => {
                "\nQualification passed! Your main tasks come next.".to_string()
            }
            _ => return Ok(()),
        };
        console.say(&message).await?;
        Ok(())
    }

    // ========== 收尾 ==========

    /// 等待后台提交，超时未完成的只记日志
    async fn drain_submissions(&mut self) {
        let limit = Duration::from_secs(self.config.submission_drain_timeout_secs);
        let lost = self.controller.flush_submissions(limit).await;
        if lost > 0 {
            error!("❌ {} 个评判结果未能送达后端", lost);
        }
    }

    async fn finish<R, W>(mut self, console: &mut Console<R, W>) -> Result<SessionSummary>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        self.drain_submissions().await;

        let evaluations = self.controller.evaluations();
        let export_path = match self.exporter.export(evaluations).await {
            Ok(path) => Some(path),
            Err(e) => {
                error!("❌ 导出评判结果失败: {}", e);
                None
            }
        };

        let summary = SessionSummary {
            phase: Phase::Complete,
            submitted: evaluations.len(),
            skipped: self.controller.skipped_count(),
            export_path,
        };
        let export_display = summary
            .export_path
            .as_ref()
            .map(|p| p.display().to_string());
        logging::print_final_stats(summary.submitted, summary.skipped, export_display.as_deref());

        console
            .say("\nAll tasks are done. Thank you for participating!")
            .await?;
        Ok(summary)
    }

    async fn abort(mut self) -> SessionSummary {
        self.drain_submissions().await;

        let phase = self.controller.phase();
        warn!("⚠️ 输入已结束，会话停在 {} 阶段", phase);

        let submitted = match phase {
            Phase::MainTask => self.controller.evaluations().len(),
            _ => 0,
        };
        info!("已提交 {} 道题，未导出结果", submitted);
        SessionSummary {
            phase,
            submitted,
            skipped: self.controller.skipped_count(),
            export_path: None,
        }
    }
}

fn render_item(item: &Item) -> String {
    let mut text = format!("Query:\n  {}\n", item.query);
    match item.secondary_context() {
        Some(second) => {
            text.push_str(&format!("Context 1:\n  {}\n", item.primary_context()));
            text.push_str(&format!("Context 2:\n  {}\n", second));
        }
        None => text.push_str(&format!("Context:\n  {}\n", item.primary_context())),
    }
    text.push_str(&format!("Response:\n  {}", item.response));
    text
}

fn field_prompt(field: JudgmentField, can_skip: bool) -> String {
    let skip_hint = if can_skip { ", or 'skip'" } else { "" };
    match field {
        JudgmentField::Faithfulness => {
            format!("Is the response faithful to the context? (y/n{}) > ", skip_hint)
        }
        JudgmentField::Relevance => {
            format!("Is the response relevant to the query? (y/n{}) > ", skip_hint)
        }
        JudgmentField::FaithfulnessReasoning => {
            format!("Why is it (un)faithful?{} > ", hint_suffix(skip_hint))
        }
        JudgmentField::RelevanceReasoning => {
            format!("Why is it (ir)relevant?{} > ", hint_suffix(skip_hint))
        }
    }
}

fn hint_suffix(skip_hint: &str) -> String {
    if skip_hint.is_empty() {
        String::new()
    } else {
        " (type 'skip' to skip)".to_string()
    }
}

fn field_list(fields: &[JudgmentField]) -> String {
    fields
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// y/yes 为 true，n/no 为 false，其它输入视为未作答
fn parse_verdict(input: &str) -> Option<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

fn is_skip_command(input: &str) -> bool {
    input.trim().eq_ignore_ascii_case("skip")
}
