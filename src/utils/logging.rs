//! 日志工具模块
//!
//! 提供日志初始化、格式化和输出的辅助函数

use crate::error::{AppError, AppResult};
use std::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 日志
///
/// `RUST_LOG` 优先；未设置时 verbose 模式为 debug，否则为 info
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// 初始化会话日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
/// - `worker_id`: 参与者 ID
pub fn init_log_file(log_file_path: &str, worker_id: &str) -> AppResult<()> {
    let log_header = format!(
        "{}\n评测会话日志 - {} - 参与者 {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        worker_id,
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
        .map_err(|e| AppError::file_write_failed(log_file_path, e))?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(api_base_url: &str, worker_id: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 人工评测会话");
    info!("🌐 后端地址: {}", api_base_url);
    info!("👤 参与者: {}", worker_id);
    info!("{}", "=".repeat(60));
}

/// 记录阶段切换
pub fn log_phase_change(from: &str, to: &str) {
    info!("\n{}", "─".repeat(60));
    info!("🔀 阶段切换: {} → {}", from, to);
    info!("{}", "─".repeat(60));
}

/// 记录批次分配结果
///
/// # 参数
/// - `counter_value`: 共享计数器的值
/// - `start`: 起始下标
/// - `end`: 结束下标（不含）
/// - `batch_len`: 批次长度（含对照题）
pub fn log_batch_assigned(counter_value: i64, start: usize, end: usize, batch_len: usize) {
    info!("📦 计数器值: {}", counter_value);
    info!("📄 分配题目区间: [{}, {}) 共 {} 道（含对照题）", start, end, batch_len);
}

/// 打印会话完成统计
pub fn print_final_stats(submitted: usize, skipped: usize, export_path: Option<&str>) {
    info!("\n{}", "=".repeat(60));
    info!("📊 会话完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 已提交: {}", submitted);
    info!("⏭️ 已跳过: {}", skipped);
    info!("{}", "=".repeat(60));
    if let Some(path) = export_path {
        info!("\n结果已导出至: {}", path);
    }
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("abcdefghij", 4), "abcd...");
        assert_eq!(truncate_text("数据评测", 2), "数据...");
    }
}
