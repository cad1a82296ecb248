//! 介绍阶段服务 - 业务能力层
//!
//! 线性地走完固定的介绍页列表，不能后退也没有校验

use crate::models::stage::IntroStage;

/// 介绍阶段推进结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntroProgress {
    /// 停留在第 k 页（从 0 开始）
    Stage(usize),
    /// 全部介绍页已看完
    Finished,
}

/// 介绍阶段序列器
#[derive(Debug, Clone)]
pub struct IntroductionSequencer {
    stages: Vec<IntroStage>,
    index: usize,
}

impl IntroductionSequencer {
    pub fn new(stages: Vec<IntroStage>) -> Self {
        Self { stages, index: 0 }
    }

    /// 当前页下标，看完时等于页数 N
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// 当前页内容，看完后返回 None
    pub fn current(&self) -> Option<&IntroStage> {
        self.stages.get(self.index)
    }

    pub fn is_finished(&self) -> bool {
        self.index >= self.stages.len()
    }

    /// 从第 k 页前进到第 k+1 页
    pub fn advance(&mut self) -> IntroProgress {
        if !self.is_finished() {
            self.index += 1;
        }
        self.progress()
    }

    pub fn progress(&self) -> IntroProgress {
        if self.is_finished() {
            IntroProgress::Finished
        } else {
            IntroProgress::Stage(self.index)
        }
    }
}
