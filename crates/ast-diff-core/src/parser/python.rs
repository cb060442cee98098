//! Python 结构提取器
//!
//! 基于 Tree-sitter 语法树的精确行范围提取类、函数和方法

use super::common::{
    SupportedLanguage, StructureExtractor, describe_syntax_error, end_line, node_text, start_line,
};
use crate::error::{AstDiffError, Result};
use crate::structure::{Structure, StructureId, StructureKind, StructureSet};
use tracing::debug;
use tree_sitter::{Node, Parser};

/// Python 结构提取器
pub struct PythonExtractor {
    parser: Parser,
}

impl PythonExtractor {
    /// 创建新的 Python 提取器
    pub fn new() -> Result<Self> {
        let language = tree_sitter_python::LANGUAGE.into();
        let mut parser = Parser::new();

        parser.set_language(&language).map_err(|e| {
            AstDiffError::TreeSitterError(format!("Failed to set Python language: {e}"))
        })?;

        Ok(Self { parser })
    }

    /// 递归访问节点，`parent` 为最近的外层结构
    fn visit(
        &self,
        node: Node,
        source: &str,
        parent: Option<StructureId>,
        structures: &mut StructureSet,
    ) {
        match node.kind() {
            "decorated_definition" => {
                let decorators = collect_decorators(node, source);
                if let Some(definition) = node.child_by_field_name("definition") {
                    self.visit_definition(definition, source, parent, decorators, structures);
                }
            }
            "class_definition" | "function_definition" => {
                self.visit_definition(node, source, parent, Vec::new(), structures);
            }
            _ => {
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    self.visit(child, source, parent, structures);
                }
            }
        }
    }

    /// 处理类或函数定义，并继续访问其函数体
    fn visit_definition(
        &self,
        node: Node,
        source: &str,
        parent: Option<StructureId>,
        decorators: Vec<String>,
        structures: &mut StructureSet,
    ) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = node_text(name_node, source);

        let structure = match node.kind() {
            "class_definition" => Structure::new(name, StructureKind::Class, start_line(node)),
            "function_definition" => {
                let parent_is_class = parent
                    .and_then(|id| structures.get(id))
                    .is_some_and(|p| p.kind == StructureKind::Class);
                let kind = if parent_is_class {
                    StructureKind::Method
                } else {
                    StructureKind::Function
                };

                let params = node
                    .child_by_field_name("parameters")
                    .map(|p| positional_parameters(p, source))
                    .unwrap_or_default();
                let return_type = node
                    .child_by_field_name("return_type")
                    .map(|r| node_text(r, source).to_string())
                    .unwrap_or_default();

                Structure::new(name, kind, start_line(node))
                    .with_params(params)
                    .with_return_type(return_type)
            }
            _ => return,
        };

        let id = structures.push(
            structure
                .with_end_line(end_line(node))
                .with_parent(parent)
                .with_modifiers(decorators),
        );

        if let Some(body) = node.child_by_field_name("body") {
            self.visit(body, source, Some(id), structures);
        }
    }
}

impl StructureExtractor for PythonExtractor {
    fn extract(&mut self, source: &str) -> Result<StructureSet> {
        let tree = self.parser.parse(source, None).ok_or_else(|| {
            AstDiffError::ParseError("Failed to parse Python source code".to_string())
        })?;

        let root = tree.root_node();
        if root.has_error() {
            return Err(AstDiffError::ParseError(describe_syntax_error(
                root,
                SupportedLanguage::Python,
            )));
        }

        let mut structures = StructureSet::new();
        self.visit(root, source, None, &mut structures);
        debug!("Extracted {} Python structures", structures.len());

        Ok(structures)
    }

    fn language(&self) -> SupportedLanguage {
        SupportedLanguage::Python
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["py"]
    }
}

/// 提取装饰器名称
///
/// 只记录 `@name` 与 `@name(...)` 两种形式，带点号的装饰器被忽略
fn collect_decorators(node: Node, source: &str) -> Vec<String> {
    let mut decorators = Vec::new();
    let mut cursor = node.walk();

    for child in node.children(&mut cursor) {
        if child.kind() != "decorator" {
            continue;
        }
        let Some(expression) = child.named_child(0) else {
            continue;
        };
        match expression.kind() {
            "identifier" => decorators.push(format!("@{}", node_text(expression, source))),
            "call" => {
                if let Some(function) = expression.child_by_field_name("function") {
                    if function.kind() == "identifier" {
                        decorators.push(format!("@{}", node_text(function, source)));
                    }
                }
            }
            _ => {}
        }
    }

    decorators
}

/// 提取普通位置参数的名称
///
/// `/` 之前的仅位置参数、`*args`、`*` 之后的仅关键字参数以及 `**kwargs` 都不计入
fn positional_parameters(parameters: Node, source: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut cursor = parameters.walk();

    for child in parameters.named_children(&mut cursor) {
        match child.kind() {
            "identifier" => names.push(node_text(child, source).to_string()),
            "default_parameter" | "typed_default_parameter" => {
                if let Some(name) = child.child_by_field_name("name") {
                    names.push(node_text(name, source).to_string());
                }
            }
            "typed_parameter" => match child.named_child(0) {
                Some(inner) if inner.kind() == "identifier" => {
                    names.push(node_text(inner, source).to_string());
                }
                _ => break,
            },
            "positional_separator" => names.clear(),
            "keyword_separator" | "list_splat_pattern" | "dictionary_splat_pattern" => break,
            _ => {}
        }
    }

    names
}
