//! 通用解析器接口和数据结构
//!
//! 定义多语言结构提取器的通用接口和语言检测逻辑

use crate::error::{AstDiffError, Result};
use crate::structure::StructureSet;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tree_sitter::Node;

/// 支持的编程语言枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupportedLanguage {
    Python,
    Java,
}

impl SupportedLanguage {
    pub fn name(&self) -> &'static str {
        match self {
            SupportedLanguage::Python => "Python",
            SupportedLanguage::Java => "Java",
        }
    }
}

/// 通用结构提取器接口
///
/// 每个语言变体把源码转换为有序的结构集合。解析失败时返回错误，不保留部分结果。
pub trait StructureExtractor {
    /// 从源码中提取结构
    fn extract(&mut self, source: &str) -> Result<StructureSet>;

    /// 获取语言类型
    fn language(&self) -> SupportedLanguage;

    /// 获取支持的文件扩展名
    fn file_extensions(&self) -> &'static [&'static str];
}

/// 解析器工厂
pub struct ParserFactory;

impl ParserFactory {
    /// 根据语言类型创建提取器
    pub fn create_extractor(language: SupportedLanguage) -> Result<Box<dyn StructureExtractor>> {
        match language {
            SupportedLanguage::Python => Ok(Box::new(super::python::PythonExtractor::new()?)),
            SupportedLanguage::Java => Ok(Box::new(super::java::JavaExtractor::new()?)),
        }
    }

    /// 根据文件路径检测语言类型（扩展名不区分大小写）
    pub fn detect_language(file_path: &Path) -> Option<SupportedLanguage> {
        let extension = file_path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "py" => Some(SupportedLanguage::Python),
            "java" => Some(SupportedLanguage::Java),
            _ => None,
        }
    }

    /// 根据文件路径创建对应的提取器
    pub fn create_extractor_for_file(file_path: &Path) -> Result<Box<dyn StructureExtractor>> {
        let language = Self::detect_language(file_path).ok_or_else(|| {
            AstDiffError::UnsupportedFileType(file_path.to_string_lossy().to_string())
        })?;
        Self::create_extractor(language)
    }
}

/// 获取节点的文本内容
pub(crate) fn node_text<'a>(node: Node, source: &'a str) -> &'a str {
    source.get(node.byte_range()).unwrap_or_default()
}

/// 节点起始行（从 1 开始）
pub(crate) fn start_line(node: Node) -> u32 {
    node.start_position().row as u32 + 1
}

/// 节点结束行（从 1 开始）
///
/// 结束位置落在下一行行首时，按上一行计算
pub(crate) fn end_line(node: Node) -> u32 {
    let end = node.end_position();
    let start_row = node.start_position().row;
    if end.column == 0 && end.row > start_row {
        end.row as u32
    } else {
        end.row as u32 + 1
    }
}

/// 查找直接子节点中指定类型的节点
pub(crate) fn find_child_by_kind<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).find(|child| child.kind() == kind)
}

/// 生成包含错误位置的诊断信息
pub(crate) fn describe_syntax_error(root: Node, language: SupportedLanguage) -> String {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            let position = node.start_position();
            return format!(
                "{} syntax error at line {}, column {}",
                language.name(),
                position.row + 1,
                position.column + 1
            );
        }
        if node.has_error() {
            let mut cursor = node.walk();
            let children: Vec<Node> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
    }
    format!("{} syntax error", language.name())
}
