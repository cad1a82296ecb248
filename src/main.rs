use anyhow::Result;
use rag_eval_session::utils::logging;
use rag_eval_session::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env()?;

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行会话
    App::initialize(config).await?.run().await?;

    Ok(())
}
