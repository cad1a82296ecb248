//! 打乱顺序服务
//!
//! 资格测试题目在每次（重新）开始时都会重新打乱；
//! 使用可注入、可设种子的随机排列，保证测试可复现

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// 随机排列生成器
pub trait Shuffler: Send {
    /// 返回 `0..len` 的一个排列
    fn permutation(&mut self, len: usize) -> Vec<usize>;
}

/// 按排列重新排列元素
pub fn apply_permutation<T: Clone>(items: &[T], permutation: &[usize]) -> Vec<T> {
    permutation
        .iter()
        .filter_map(|&i| items.get(i).cloned())
        .collect()
}

/// 基于 StdRng 的随机排列
///
/// 同一个种子产生同样的排列序列
#[derive(Debug, Clone)]
pub struct SeededShuffler {
    rng: StdRng,
}

impl SeededShuffler {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// 有种子时使用种子，否则使用系统熵
    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        seed.map(Self::from_seed).unwrap_or_else(Self::from_entropy)
    }
}

impl Shuffler for SeededShuffler {
    fn permutation(&mut self, len: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..len).collect();
        order.shuffle(&mut self.rng);
        order
    }
}
