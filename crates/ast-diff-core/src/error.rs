use thiserror::Error;

/// ast-diff 工具的错误类型定义
#[derive(Error, Debug)]
pub enum AstDiffError {
    /// 生成差异的外部命令失败，整个运行都会因此终止
    #[error("External tool failed: {0}")]
    ExternalToolFailure(String),

    #[error("Git repository error: {0}")]
    GitError(String),

    #[error("Source parsing error: {0}")]
    ParseError(String),

    #[error("File I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Tree-sitter parsing failed: {0}")]
    TreeSitterError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// 项目通用的 Result 类型别名
pub type Result<T> = std::result::Result<T, AstDiffError>;
