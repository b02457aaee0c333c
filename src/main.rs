use anyhow::Result;
use bookmark_classifier::utils::logging;
use bookmark_classifier::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 加载配置
    let config = Config::from_env();

    // 第一个参数是搜索关键词，缺省表示整理全部书签
    let search_query = std::env::args().nth(1).unwrap_or_default();

    // 初始化并运行应用
    let mut app = App::initialize(config)?;
    app.run(&search_query).await?;

    Ok(())
}
