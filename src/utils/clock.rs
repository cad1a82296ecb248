//! 时钟抽象
//!
//! 用于计算每道题的作答耗时，测试中可替换为手动推进的时钟

/// 毫秒级时钟
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// 系统时钟（UTC 毫秒时间戳）
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}
