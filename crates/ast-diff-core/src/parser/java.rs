//! Java 结构提取器
//!
//! 语法树只用于定位声明的起始行和元数据（修饰符、参数、返回类型），
//! 结束行由 [`super::brace::find_block_end`] 的花括号扫描决定。

use super::brace::find_block_end;
use super::common::{
    SupportedLanguage, StructureExtractor, describe_syntax_error, find_child_by_kind, node_text,
    start_line,
};
use crate::error::{AstDiffError, Result};
use crate::structure::{Structure, StructureId, StructureKind, StructureSet};
use tracing::debug;
use tree_sitter::{Node, Parser};

// 花括号扫描前的占位行数
const DEFAULT_CLASS_LINES: u32 = 1000;
const DEFAULT_INTERFACE_LINES: u32 = 1000;
const DEFAULT_ENUM_LINES: u32 = 100;
const DEFAULT_METHOD_LINES: u32 = 50;
const DEFAULT_CONSTRUCTOR_LINES: u32 = 50;

/// Java 结构提取器
pub struct JavaExtractor {
    parser: Parser,
}

impl JavaExtractor {
    /// 创建新的 Java 提取器
    pub fn new() -> Result<Self> {
        let language = tree_sitter_java::LANGUAGE.into();
        let mut parser = Parser::new();

        parser.set_language(&language).map_err(|e| {
            AstDiffError::TreeSitterError(format!("Failed to set Java language: {e}"))
        })?;

        Ok(Self { parser })
    }

    /// 前序遍历语法树，遇到类型声明时依次登记类型本身、构造器和方法
    fn visit(&self, node: Node, source: &str, structures: &mut StructureSet) {
        if let Some(kind) = type_declaration_kind(node.kind()) {
            self.declare_type(node, kind, source, structures);
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.visit(child, source, structures);
        }
    }

    fn declare_type(
        &self,
        node: Node,
        kind: StructureKind,
        source: &str,
        structures: &mut StructureSet,
    ) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };

        let start = start_line(name_node);
        let placeholder = match kind {
            StructureKind::Interface => DEFAULT_INTERFACE_LINES,
            StructureKind::Enum => DEFAULT_ENUM_LINES,
            _ => DEFAULT_CLASS_LINES,
        };
        let parent = enclosing_type(node, source, structures);

        let type_id = structures.push(
            Structure::new(node_text(name_node, source), kind, start)
                .with_end_line(start + placeholder)
                .with_parent(parent)
                .with_modifiers(modifiers(node, source)),
        );

        let members = direct_members(node);

        for member in members.iter().filter(|m| m.kind() == "constructor_declaration") {
            if let Some(structure) = callable(*member, StructureKind::Constructor, source) {
                structures.push(structure.with_parent(Some(type_id)));
            }
        }

        for member in members.iter().filter(|m| m.kind() == "method_declaration") {
            if let Some(structure) = callable(*member, StructureKind::Method, source) {
                structures.push(structure.with_parent(Some(type_id)));
            }
        }
    }
}

impl StructureExtractor for JavaExtractor {
    fn extract(&mut self, source: &str) -> Result<StructureSet> {
        let tree = self.parser.parse(source, None).ok_or_else(|| {
            AstDiffError::ParseError("Failed to parse Java source code".to_string())
        })?;

        let root = tree.root_node();
        if root.has_error() {
            return Err(AstDiffError::ParseError(describe_syntax_error(
                root,
                SupportedLanguage::Java,
            )));
        }

        let mut structures = StructureSet::new();
        self.visit(root, source, &mut structures);

        // 用花括号扫描结果覆盖占位结束行
        for index in 0..structures.len() {
            if let Some(structure) = structures.get_mut(StructureId(index)) {
                structure.end_line = find_block_end(source, structure.start_line);
            }
        }

        debug!("Extracted {} Java structures", structures.len());
        Ok(structures)
    }

    fn language(&self) -> SupportedLanguage {
        SupportedLanguage::Java
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["java"]
    }
}

fn type_declaration_kind(node_kind: &str) -> Option<StructureKind> {
    match node_kind {
        "class_declaration" => Some(StructureKind::Class),
        "interface_declaration" => Some(StructureKind::Interface),
        "enum_declaration" => Some(StructureKind::Enum),
        _ => None,
    }
}

/// 沿语法树向上找到最近的外层类型声明，并匹配已创建的结构
fn enclosing_type(node: Node, source: &str, structures: &StructureSet) -> Option<StructureId> {
    let mut current = node.parent();
    while let Some(ancestor) = current {
        if let Some(kind) = type_declaration_kind(ancestor.kind()) {
            let name_node = ancestor.child_by_field_name("name")?;
            return structures.find(node_text(name_node, source), kind, start_line(name_node));
        }
        current = ancestor.parent();
    }
    None
}

/// 类型体中的直接成员；枚举只取 `enum_body_declarations` 中的成员
fn direct_members(node: Node) -> Vec<Node> {
    let Some(body) = node.child_by_field_name("body") else {
        return Vec::new();
    };

    let container = if body.kind() == "enum_body" {
        match find_child_by_kind(body, "enum_body_declarations") {
            Some(declarations) => declarations,
            None => return Vec::new(),
        }
    } else {
        body
    };

    let mut cursor = container.walk();
    container.named_children(&mut cursor).collect()
}

fn callable(node: Node, kind: StructureKind, source: &str) -> Option<Structure> {
    let name_node = node.child_by_field_name("name")?;
    let start = start_line(name_node);
    let placeholder = match kind {
        StructureKind::Constructor => DEFAULT_CONSTRUCTOR_LINES,
        _ => DEFAULT_METHOD_LINES,
    };

    let params = node
        .child_by_field_name("parameters")
        .map(|p| formal_parameters(p, source))
        .unwrap_or_default();

    let return_type = match kind {
        StructureKind::Method => node
            .child_by_field_name("type")
            .map(|t| node_text(t, source))
            .filter(|t| *t != "void")
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    };

    Some(
        Structure::new(node_text(name_node, source), kind, start)
            .with_end_line(start + placeholder)
            .with_modifiers(modifiers(node, source))
            .with_params(params)
            .with_return_type(return_type),
    )
}

/// 声明的修饰符关键字，注解不计入
fn modifiers(node: Node, source: &str) -> Vec<String> {
    let Some(modifiers) = find_child_by_kind(node, "modifiers") else {
        return Vec::new();
    };

    let mut cursor = modifiers.walk();
    modifiers
        .children(&mut cursor)
        .filter(|child| !child.is_named())
        .map(|child| node_text(child, source).to_string())
        .collect()
}

/// 将形参格式化为 `类型 名称`，可变参数为 `类型... 名称`
fn formal_parameters(parameters: Node, source: &str) -> Vec<String> {
    let mut formatted = Vec::new();
    let mut cursor = parameters.walk();

    for parameter in parameters.named_children(&mut cursor) {
        match parameter.kind() {
            "formal_parameter" => {
                let type_text = parameter
                    .child_by_field_name("type")
                    .map(|t| node_text(t, source))
                    .unwrap_or_default();
                let name = parameter
                    .child_by_field_name("name")
                    .map(|n| node_text(n, source))
                    .unwrap_or_default();
                formatted.push(format!("{type_text} {name}"));
            }
            "spread_parameter" => {
                let mut inner = parameter.walk();
                let children: Vec<Node> = parameter.named_children(&mut inner).collect();
                let type_text = children
                    .iter()
                    .find(|c| c.kind() != "modifiers" && c.kind() != "variable_declarator")
                    .map(|t| node_text(*t, source))
                    .unwrap_or_default();
                let name = children
                    .iter()
                    .find(|c| c.kind() == "variable_declarator")
                    .and_then(|d| d.child_by_field_name("name"))
                    .map(|n| node_text(n, source))
                    .unwrap_or_default();
                formatted.push(format!("{type_text}... {name}"));
            }
            _ => {}
        }
    }

    formatted
}
