//! ast-diff - 结构感知的代码差异分析工具
//!
//! 把每一行变更归属到包含它的类、方法或函数，按结构分组输出。

mod cli;

use ast_diff_core::{DiffAnalyzer, OutputRenderer, Result};
use cli::{Cli, Config};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    // 解析命令行参数
    let cli = Cli::parse_args();

    // 初始化日志记录，RUST_LOG 优先
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.default_log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // 验证参数
    if let Err(e) = cli.validate() {
        error!("Invalid arguments: {}", e);
        std::process::exit(1);
    }

    let config: Config = cli.into();
    debug!(
        "Configuration: mode={:?}, format={:?}, debug={}",
        config.run.mode, config.formatter.output_format, config.debug
    );

    if let Err(e) = run(config) {
        error!("Application error: {}", e);
        std::process::exit(1);
    }
}

/// 主要应用逻辑
fn run(config: Config) -> Result<()> {
    info!(
        "Analyzing changes in repository: {}",
        config.run.repo_path.display()
    );

    let outcome = DiffAnalyzer::new(config.run).run()?;
    if outcome.no_changes {
        println!("No changes detected");
        return Ok(());
    }

    let output = OutputRenderer::new(config.formatter).render(&outcome.result)?;
    print!("{}", output.content);
    if !output.content.ends_with('\n') {
        println!();
    }

    info!(
        "Analysis completed: {} files, {} changes",
        output.metadata.files_count, output.metadata.total_changes
    );
    Ok(())
}
