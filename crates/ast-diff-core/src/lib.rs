//! ast-diff-core - 结构感知的代码差异分析核心库
//!
//! 基于 Tree-sitter 提取 Python 和 Java 源码中的类、接口、枚举、函数、方法和构造器，
//! 将统一差异格式中的每一行变更映射到包含它的最内层代码结构，并按结构分组输出。

pub mod analyzer;
pub mod cache;
pub mod diff;
pub mod error;
pub mod formatter;
pub mod git;
pub mod index;
pub mod mapper;
pub mod parser;
pub mod source;
pub mod structure;

// 重新导出主要的公共 API
pub use analyzer::{AnalysisOutcome, DiffAnalyzer, DiffMode, RunConfig};
pub use cache::{AnalyzerCache, AnalyzerLookup, CacheKey, CacheStats, FileAnalyzer};
pub use diff::{ChangeKind, DiffLineEvent, DiffParser, FileDiff, HunkHeader};
pub use error::{AstDiffError, Result};
pub use formatter::{
    ColorTheme, FormattedOutput, FormatterConfig, OutputFormat, OutputMetadata, OutputRenderer,
};
pub use git::{GitRevisionReader, git_diff};
pub use index::StructureIndex;
pub use mapper::{
    AnalysisResult, Change, ChangeMapper, FileChanges, StructureGroup, StructureStat,
    UNKNOWN_STRUCTURE,
};
// 导出多语言提取器
pub use parser::{
    JavaExtractor, ParserFactory, PythonExtractor, StructureExtractor, SupportedLanguage,
};
pub use source::{
    ContentProvider, FileSystemReader, FileVersion, MemoryContent, RepositoryContent,
    compare_files,
};
pub use structure::{ResolvedStructure, Structure, StructureId, StructureKind, StructureSet};
