use serde::{Deserialize, Serialize};

/// 介绍阶段的一页内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntroStage {
    pub title: String,
    pub body: String,
    /// 继续按钮上的文字
    #[serde(default = "default_button_label")]
    pub button_label: String,
}

fn default_button_label() -> String {
    "Continue".to_string()
}

/// `introduction.toml` 的文件结构
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntroductionFile {
    #[serde(default)]
    pub stages: Vec<IntroStage>,
}
