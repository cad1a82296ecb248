//! # RAG Eval Session
//!
//! RAG 人工评测问卷的会话流转与任务分配控制器
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Clients / Utils）
//! - `clients/` - 后端能力接口与 HTTP 实现
//! - `BackendClient` - 共享计数器、题库、评判投递
//! - `utils/` - 日志与时钟
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，全部是纯逻辑
//! - `WorkAssigner` - 按计数器值分配批次
//! - `QualificationEvaluator` - 资格测试评分
//! - `IntroductionSequencer` - 介绍页推进
//! - `Shuffler` - 可设种子的随机排列
//! - `ResultExporter` - 导出 JSON
//!
//! ### ③ 流程层（Workflow）
//! - `TaskSession` - 逐题状态机（作答 → 校验 → 提交/跳过 → 前进）
//! - `SessionController` - 阶段流转（介绍 → 资格测试 → 正式任务 → 完成）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 装配依赖并运行终端循环
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{BackendClient, ItemPool, SharedCounter, SubmissionGateway};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{Evaluation, Item, ItemId, WorkerId};
pub use orchestrator::{App, SessionSummary};
pub use workflow::{Phase, SessionController, SessionEvent, SessionState};
