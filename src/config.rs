use crate::error::{AppError, AppResult, ConfigError};
use std::str::FromStr;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    // --- 后端 API 配置 ---
    /// 后端服务地址（提供 /questions, /counter/increment, /responses）
    pub api_base_url: String,
    /// HTTP 请求超时（秒），由传输层施加
    pub request_timeout_secs: u64,
    /// 退出前等待后台提交完成的最长时间（秒）
    pub submission_drain_timeout_secs: u64,

    // --- 批次分配配置 ---
    /// 每个会话分到的题目数量（不含对照题）
    pub batch_size: usize,
    /// 计数器折叠周期：循环多少个计数值后重复
    pub cycle_length: u64,
    /// 共享同一批次的连续计数值个数
    pub sessions_per_batch: u64,
    /// 题库中参与轮换的前 N 道题
    pub pool_cap: usize,

    // --- 资格测试配置 ---
    /// 通过资格测试所需的正确题数
    pub pass_threshold: usize,
    /// 理由长度必须小于 `回答长度 - margin` 才能获得关键词分
    pub reasoning_length_margin: usize,
    /// 资格题目打乱顺序的随机种子，不设置时使用系统熵
    pub shuffle_seed: Option<u64>,

    // --- 会话与文件配置 ---
    /// 静态资源目录
    pub assets_dir: String,
    /// 结果导出目录
    pub export_dir: String,
    /// 启动链接中携带参与者 ID 的参数名
    pub worker_id_param: String,
    /// 启动链接（包含查询参数）
    pub launch_url: Option<String>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 会话日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000".to_string(),
            request_timeout_secs: 30,
            submission_drain_timeout_secs: 10,
            batch_size: 5,
            cycle_length: 20,
            sessions_per_batch: 2,
            pool_cap: 50,
            pass_threshold: 3,
            reasoning_length_margin: 3,
            shuffle_seed: None,
            assets_dir: "assets".to_string(),
            export_dir: "exports".to_string(),
            worker_id_param: "PROLIFIC_PID".to_string(),
            launch_url: None,
            verbose_logging: false,
            output_log_file: "session_log.txt".to_string(),
        }
    }
}

impl Config {
    /// 从环境变量加载配置，未设置的项使用默认值
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 从任意键值来源加载配置
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();
        let config = Self {
            api_base_url: lookup("API_BASE_URL").unwrap_or(default.api_base_url),
            request_timeout_secs: parse_var(&lookup, "REQUEST_TIMEOUT_SECS", "u64")?
                .unwrap_or(default.request_timeout_secs),
            submission_drain_timeout_secs: parse_var(
                &lookup,
                "SUBMISSION_DRAIN_TIMEOUT_SECS",
                "u64",
            )?
            .unwrap_or(default.submission_drain_timeout_secs),
            batch_size: parse_var(&lookup, "BATCH_SIZE", "usize")?.unwrap_or(default.batch_size),
            cycle_length: parse_var(&lookup, "CYCLE_LENGTH", "u64")?
                .unwrap_or(default.cycle_length),
            sessions_per_batch: parse_var(&lookup, "SESSIONS_PER_BATCH", "u64")?
                .unwrap_or(default.sessions_per_batch),
            pool_cap: parse_var(&lookup, "POOL_CAP", "usize")?.unwrap_or(default.pool_cap),
            pass_threshold: parse_var(&lookup, "PASS_THRESHOLD", "usize")?
                .unwrap_or(default.pass_threshold),
            reasoning_length_margin: parse_var(&lookup, "REASONING_LENGTH_MARGIN", "usize")?
                .unwrap_or(default.reasoning_length_margin),
            shuffle_seed: parse_var(&lookup, "SHUFFLE_SEED", "u64")?,
            assets_dir: lookup("ASSETS_DIR").unwrap_or(default.assets_dir),
            export_dir: lookup("EXPORT_DIR").unwrap_or(default.export_dir),
            worker_id_param: lookup("WORKER_ID_PARAM").unwrap_or(default.worker_id_param),
            launch_url: lookup("LAUNCH_URL").filter(|v| !v.trim().is_empty()),
            verbose_logging: parse_var(&lookup, "VERBOSE_LOGGING", "bool")?
                .unwrap_or(default.verbose_logging),
            output_log_file: lookup("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
        };
        config.validate()?;
        Ok(config)
    }

    /// 校验批次分配相关配置
    pub fn validate(&self) -> AppResult<()> {
        if self.batch_size == 0 {
            return Err(AppError::invalid_config("BATCH_SIZE", "必须大于 0"));
        }
        if self.cycle_length == 0 {
            return Err(AppError::invalid_config("CYCLE_LENGTH", "必须大于 0"));
        }
        if self.sessions_per_batch == 0 {
            return Err(AppError::invalid_config("SESSIONS_PER_BATCH", "必须大于 0"));
        }
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, var_name: &str, expected_type: &str) -> AppResult<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var_name) {
        None => Ok(None),
        Some(value) => value.trim().parse().map(Some).map_err(|_| {
            AppError::Config(ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            })
        }),
    }
}
