use thiserror::Error;

use crate::workflow::task_session::ValidationErrors;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 后端 API 调用错误
    #[error("API错误: {0}")]
    Api(#[from] ApiError),
    /// 文件/静态资源错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 会话状态机错误
    #[error("会话错误: {0}")]
    Session(#[from] SessionError),
}

/// API 调用错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 网络请求失败
    #[error("API请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// API 返回非 2xx 响应
    #[error("API返回错误响应 ({endpoint}): status={status}")]
    BadResponse { endpoint: String, status: u16 },
    /// JSON 解析失败
    #[error("JSON解析失败 ({endpoint}): {source}")]
    JsonParseFailed {
        endpoint: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// HTTP 客户端构建失败
    #[error("HTTP客户端初始化失败: {source}")]
    ClientInit {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// JSON 资源解析失败
    #[error("JSON解析失败 ({path}): {source}")]
    JsonParseFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// TOML 资源解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 资源内容不合法
    #[error("资源内容不合法 ({path}): {reason}")]
    InvalidAsset { path: String, reason: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置值不合法
    #[error("配置项 {name} 不合法: {reason}")]
    InvalidValue { name: String, reason: String },
}

/// 会话状态机错误
///
/// 所有变体都不会改变会话状态
#[derive(Debug, Error)]
pub enum SessionError {
    /// 当前阶段不允许该操作
    #[error("当前阶段 {phase} 不允许操作: {operation}")]
    WrongPhase {
        phase: String,
        operation: &'static str,
    },
    /// 资格测试阶段不允许跳过
    #[error("资格测试阶段不允许跳过题目")]
    SkipNotAllowed,
    /// 题目批次仍在加载
    #[error("题目批次仍在加载中")]
    BatchLoading,
    /// 题目批次已经完成
    #[error("题目批次已经全部完成")]
    BatchFinished,
    /// 提交内容校验失败
    #[error("提交内容不完整: {0}")]
    Validation(#[from] ValidationErrors),
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建API请求失败错误
    pub fn api_request_failed(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Api(ApiError::RequestFailed {
            endpoint: endpoint.into(),
            source: Box::new(source),
        })
    }

    /// 创建API响应状态错误
    pub fn api_bad_response(endpoint: impl Into<String>, status: u16) -> Self {
        AppError::Api(ApiError::BadResponse {
            endpoint: endpoint.into(),
            status,
        })
    }

    /// 创建文件读取错误
    pub fn file_read_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建资源内容不合法错误
    pub fn invalid_asset(path: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::File(FileError::InvalidAsset {
            path: path.into(),
            reason: reason.into(),
        })
    }

    /// 创建配置值不合法错误
    pub fn invalid_config(name: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Config(ConfigError::InvalidValue {
            name: name.into(),
            reason: reason.into(),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
