//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责装配和驱动一个参与者会话，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 会话应用
//! - 管理应用生命周期（初始化、运行、收尾）
//! - 装配后端客户端、时钟、打乱器和会话控制器
//! - 按阶段驱动终端循环
//! - 导出结果并输出统计信息
//!
//! ### `console` - 行式终端
//! - 输出文字、读取一行输入
//! - 输入流结束时返回 None
//!
//! ## 层次关系
//!
//! ```text
//! app (终端循环)
//!     ↓
//! workflow::SessionController (阶段流转)
//!     ↓
//! workflow::TaskSession (逐题状态机)
//!     ↓
//! services (能力层：assign / qualify / shuffle / export)
//!     ↓
//! clients (后端：counter / questions / responses)
//! ```

pub mod app;
pub mod console;

pub use app::{App, SessionSummary};
pub use console::Console;
