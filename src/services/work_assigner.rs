//! 批次分配服务 - 业务能力层
//!
//! 根据共享计数器的值，从有序题库中切出本会话的题目批次，并在末尾追加对照题。
//!
//! 分配是纯函数：同一个计数器值永远得到同一个批次，不读取任何全局状态。

use crate::config::Config;
use crate::models::item::Item;

/// 批次分配参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkAssigner {
    /// 每批题目数 B
    batch_size: usize,
    /// 折叠周期 C
    cycle_length: u64,
    /// 共享同一批次的计数值个数 R
    sessions_per_batch: u64,
    /// 参与轮换的题库上限
    pool_cap: usize,
}

/// 批次在题库中的区间 `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchWindow {
    pub start: usize,
    pub end: usize,
}

impl WorkAssigner {
    /// 创建批次分配器
    ///
    /// `cycle_length` 与 `sessions_per_batch` 为 0 时按 1 处理
    pub fn new(
        batch_size: usize,
        cycle_length: u64,
        sessions_per_batch: u64,
        pool_cap: usize,
    ) -> Self {
        Self {
            batch_size,
            cycle_length: cycle_length.max(1),
            sessions_per_batch: sessions_per_batch.max(1),
            pool_cap,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.batch_size,
            config.cycle_length,
            config.sessions_per_batch,
            config.pool_cap,
        )
    }

    /// 将任意计数器值折叠到 `1..=C`
    pub fn effective_slot(&self, counter_value: i64) -> u64 {
        let cycle = i64::try_from(self.cycle_length).unwrap_or(i64::MAX);
        // rem_euclid 结果在 [0, cycle) 内，非负
        (counter_value.wrapping_sub(1).rem_euclid(cycle) as u64) + 1
    }

    /// 计算计数器值对应的题库区间
    pub fn window(&self, counter_value: i64) -> BatchWindow {
        let slot = self.effective_slot(counter_value);
        let block = ((slot - 1) / self.sessions_per_batch) as usize;
        let start = block.saturating_mul(self.batch_size);
        BatchWindow {
            start,
            end: start.saturating_add(self.batch_size),
        }
    }

    /// 分配本会话的题目批次
    ///
    /// # 参数
    /// - `counter_value`: 本会话拿到的共享计数器值
    /// - `pool`: 完整有序题库
    /// - `control_item`: 对照题（金标准题）
    ///
    /// # 返回
    /// 题库为空时返回空批次；否则返回切片加上末尾唯一的一道对照题
    pub fn assign(&self, counter_value: i64, pool: &[Item], control_item: &Item) -> Vec<Item> {
        if pool.is_empty() {
            return Vec::new();
        }

        let eligible = &pool[..pool.len().min(self.pool_cap)];
        let window = self.window(counter_value);
        let start = window.start.min(eligible.len());
        let end = window.end.min(eligible.len());

        let mut batch: Vec<Item> = eligible[start..end]
            .iter()
            .filter(|item| item.id != control_item.id)
            .cloned()
            .collect();

        if batch.is_empty() {
            tracing::warn!(
                "计数器值 {} 对应区间 [{}, {}) 超出可用题库 ({} 道)，批次只包含对照题",
                counter_value,
                window.start,
                window.end,
                eligible.len()
            );
        }

        batch.push(control_item.clone());
        batch
    }
}
