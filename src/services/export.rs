//! 结果导出服务 - 业务能力层
//!
//! 只负责"把本次会话的评判写成一个 JSON 文件"能力，不关心流程

use crate::error::{AppError, AppResult};
use crate::models::evaluation::Evaluation;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::debug;

/// 结果导出服务
///
/// 导出文件名带 ISO-8601（基本格式）UTC 时间戳，例如
/// `responses_20261019T101500.123Z.json`
pub struct ResultExporter {
    export_dir: PathBuf,
}

impl ResultExporter {
    pub fn new(export_dir: impl Into<PathBuf>) -> Self {
        Self {
            export_dir: export_dir.into(),
        }
    }

    /// 生成导出文件名
    pub fn file_name(at: DateTime<Utc>) -> String {
        format!("responses_{}.json", at.format("%Y%m%dT%H%M%S%.3fZ"))
    }

    /// 渲染为带缩进的 JSON 文本
    pub fn render(evaluations: &[Evaluation]) -> AppResult<String> {
        serde_json::to_string_pretty(evaluations)
            .map_err(|e| AppError::file_write_failed("<render>", e))
    }

    /// 写出导出文件
    ///
    /// # 返回
    /// 返回导出文件的完整路径
    pub async fn export(&self, evaluations: &[Evaluation]) -> AppResult<PathBuf> {
        self.export_at(evaluations, Utc::now()).await
    }

    /// 以指定时间戳写出导出文件
    pub async fn export_at(
        &self,
        evaluations: &[Evaluation],
        at: DateTime<Utc>,
    ) -> AppResult<PathBuf> {
        let body = Self::render(evaluations)?;
        let path = self.export_dir.join(Self::file_name(at));

        tokio::fs::create_dir_all(&self.export_dir)
            .await
            .map_err(|e| AppError::file_write_failed(self.export_dir.display().to_string(), e))?;
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;

        debug!("导出 {} 条评判到 {}", evaluations.len(), path.display());
        Ok(path)
    }
}
