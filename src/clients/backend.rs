//! 后端能力接口
//!
//! 会话只通过这三个窄接口与后端交互：
//! - `SharedCounter`：跨会话共享的原子自增计数器
//! - `ItemPool`：远程题库
//! - `SubmissionGateway`：评判结果投递（尽力而为，不重试）

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::evaluation::Evaluation;
use crate::models::item::Item;

/// 共享计数器
#[async_trait]
pub trait SharedCounter: Send + Sync {
    /// 原子自增并返回新值
    async fn increment(&self) -> AppResult<i64>;
}

/// 远程题库
#[async_trait]
pub trait ItemPool: Send + Sync {
    /// 拉取完整有序题库
    async fn fetch_items(&self) -> AppResult<Vec<Item>>;
}

/// 评判结果投递
#[async_trait]
pub trait SubmissionGateway: Send + Sync {
    async fn submit(&self, evaluation: &Evaluation) -> AppResult<()>;
}
