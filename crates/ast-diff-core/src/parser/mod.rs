//! 多语言结构提取模块
//!
//! 提供通用的结构提取接口和具体的语言实现

pub mod brace;
pub mod common;
pub mod java;
pub mod python;

// 重新导出核心类型
pub use brace::{FALLBACK_END_LINE_ESTIMATE, find_block_end};
pub use common::{ParserFactory, StructureExtractor, SupportedLanguage};
pub use java::JavaExtractor;
pub use python::PythonExtractor;
