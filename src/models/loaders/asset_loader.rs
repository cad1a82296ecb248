use crate::error::{AppError, AppResult, FileError};
use crate::models::answer_key::{AnswerKey, CanonicalAnswer};
use crate::models::item::Item;
use crate::models::stage::{IntroStage, IntroductionFile};
use serde::de::DeserializeOwned;
use std::path::Path;
use tokio::fs;

pub const INTRODUCTION_FILE: &str = "introduction.toml";
pub const QUALIFICATION_ITEMS_FILE: &str = "qualification_items.json";
pub const ANSWER_KEY_FILE: &str = "answer_key.json";
pub const CONTROL_ITEM_FILE: &str = "control_item.json";

/// 会话启动时加载的全部本地静态资源
#[derive(Debug, Clone)]
pub struct StaticAssets {
    pub introduction: Vec<IntroStage>,
    pub qualification_items: Vec<Item>,
    pub answer_key: AnswerKey,
    pub control_item: Item,
}

/// 从资源目录加载全部静态资源
///
/// # 参数
/// - `assets_dir`: 资源目录，包含 introduction.toml / qualification_items.json /
///   answer_key.json / control_item.json
pub async fn load_static_assets(assets_dir: &Path) -> AppResult<StaticAssets> {
    let introduction = load_introduction(&assets_dir.join(INTRODUCTION_FILE)).await?;
    let qualification_items: Vec<Item> =
        load_json(&assets_dir.join(QUALIFICATION_ITEMS_FILE)).await?;
    let answers: Vec<CanonicalAnswer> = load_json(&assets_dir.join(ANSWER_KEY_FILE)).await?;
    let control_item: Item = load_json(&assets_dir.join(CONTROL_ITEM_FILE)).await?;

    if qualification_items.is_empty() {
        return Err(AppError::invalid_asset(
            assets_dir.join(QUALIFICATION_ITEMS_FILE).display().to_string(),
            "资格测试题目不能为空",
        ));
    }

    // 标准答案中找不到对应题目时，该题在评分中按错误处理
    for answer in &answers {
        if !qualification_items.iter().any(|item| item.id == answer.id) {
            tracing::warn!("标准答案 {} 在资格测试题目中不存在", answer.id);
        }
    }

    tracing::info!(
        "✓ 静态资源加载完成: 介绍 {} 页, 资格题 {} 道, 标准答案 {} 条",
        introduction.len(),
        qualification_items.len(),
        answers.len()
    );

    Ok(StaticAssets {
        introduction,
        qualification_items,
        answer_key: AnswerKey::new(answers),
        control_item,
    })
}

/// 从 TOML 文件加载介绍阶段
pub async fn load_introduction(path: &Path) -> AppResult<Vec<IntroStage>> {
    let content = read_to_string(path).await?;
    let file: IntroductionFile = toml::from_str(&content).map_err(|e| {
        AppError::File(FileError::TomlParseFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })
    })?;
    Ok(file.stages)
}

/// 从 JSON 文件加载任意资源
pub async fn load_json<T: DeserializeOwned>(path: &Path) -> AppResult<T> {
    let content = read_to_string(path).await?;
    serde_json::from_str(&content).map_err(|e| {
        AppError::File(FileError::JsonParseFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })
    })
}

async fn read_to_string(path: &Path) -> AppResult<String> {
    tracing::debug!("正在加载: {}", path.display());
    fs::read_to_string(path)
        .await
        .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))
}
