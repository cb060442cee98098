//! 命令行接口模块
//!
//! 提供命令行参数解析、校验以及到运行配置的转换

use ast_diff_core::{FormatterConfig, OutputFormat, RunConfig};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use thiserror::Error;

/// ast-diff - 结构感知的代码差异分析工具
///
/// 把 git diff 或两个文件之间的差异逐行映射到包含它的类、方法或函数，
/// 并按结构分组展示。
#[derive(Parser, Debug)]
#[command(name = "ast-diff")]
#[command(author = "ast-diff contributors")]
#[command(version)]
#[command(about = "Attribute each changed line to the class, method or function that owns it")]
#[command(
    long_about = "ast-diff runs git diff (or diff between two files), parses the Python and Java sources of both versions with tree-sitter, and groups every added or removed line under the innermost enclosing structure."
)]
pub struct Cli {
    /// 旧版本修订；比较模式下为旧文件
    #[arg(
        help = "Old revision (defaults to HEAD), or the old file with --compare",
        value_name = "COMMIT1"
    )]
    pub commit1: Option<String>,

    /// 新版本修订；比较模式下为新文件
    #[arg(
        help = "New revision (defaults to the working tree), or the new file with --compare",
        value_name = "COMMIT2"
    )]
    pub commit2: Option<String>,

    /// 详细输出
    #[arg(
        short = 'v',
        long = "verbose",
        help = "Show structure signatures and line ranges, and info-level logs"
    )]
    pub verbose: bool,

    /// 显示统计信息
    #[arg(
        short = 's',
        long = "stats",
        help = "Show the most modified structures"
    )]
    pub stats: bool,

    /// 比较两个文件
    #[arg(long = "compare", help = "Compare two files instead of git revisions")]
    pub compare: bool,

    /// 仓库路径
    #[arg(
        short = 'r',
        long = "repo",
        default_value = ".",
        env = "AST_DIFF_REPO",
        help = "Path to the Git repository",
        value_name = "PATH"
    )]
    pub repo_path: PathBuf,

    /// 调试日志
    #[arg(long = "debug", help = "Enable debug logging")]
    pub debug: bool,

    /// 输出格式
    #[arg(
        short = 'f',
        long = "format",
        value_enum,
        default_value_t = OutputFormatArg::Text,
        help = "Output format for the analysis results"
    )]
    pub format: OutputFormatArg,

    /// 禁用颜色
    #[arg(long = "no-color", help = "Disable ANSI colors in text output")]
    pub no_color: bool,
}

/// 输出格式命令行参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormatArg {
    /// 终端文本报告
    #[value(name = "text")]
    Text,
    /// JSON 文档
    #[value(name = "json")]
    Json,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Text => OutputFormat::Text,
            OutputFormatArg::Json => OutputFormat::Json,
        }
    }
}

/// 参数校验错误
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CliError {
    #[error("--compare requires two files")]
    MissingCompareFiles,

    #[error("Repository path does not exist: {0}")]
    RepoNotFound(PathBuf),
}

/// 应用程序配置信息
#[derive(Debug, Clone)]
pub struct Config {
    /// 核心运行配置
    pub run: RunConfig,
    /// 输出配置
    pub formatter: FormatterConfig,
    /// 是否启用调试日志
    pub debug: bool,
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        let run = match (cli.compare, cli.commit1, cli.commit2) {
            (true, Some(old_file), Some(new_file)) => {
                RunConfig::compare(cli.repo_path, old_file, new_file)
            }
            (_, commit1, commit2) => RunConfig::git(cli.repo_path, commit1, commit2),
        };

        let formatter = FormatterConfig {
            output_format: cli.format.into(),
            enable_colors: !cli.no_color,
            verbose: cli.verbose,
            show_statistics: cli.stats,
            ..FormatterConfig::default()
        };

        Config {
            run,
            formatter,
            debug: cli.debug,
        }
    }
}

impl Cli {
    /// 解析命令行参数
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// 验证参数的有效性
    pub fn validate(&self) -> Result<(), CliError> {
        if self.compare && (self.commit1.is_none() || self.commit2.is_none()) {
            return Err(CliError::MissingCompareFiles);
        }

        if !self.compare && !self.repo_path.exists() {
            return Err(CliError::RepoNotFound(self.repo_path.clone()));
        }

        Ok(())
    }

    /// 未设置 RUST_LOG 时使用的日志级别
    pub fn default_log_level(&self) -> &'static str {
        if self.debug {
            "debug"
        } else if self.verbose {
            "info"
        } else {
            "warn"
        }
    }
}
