//! 代码结构数据模型
//!
//! 定义类、接口、枚举、函数、方法、构造器等代码结构，以及单个文件版本内的结构集合

use serde::{Deserialize, Serialize};
use std::fmt;

/// full_path 中各层级之间的分隔符
pub const PATH_SEPARATOR: &str = " > ";

/// 代码结构类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructureKind {
    Class,
    Interface,
    Enum,
    Function,
    Method,
    Constructor,
}

impl StructureKind {
    /// 获取结构类型的显示名称
    pub fn as_str(&self) -> &'static str {
        match self {
            StructureKind::Class => "class",
            StructureKind::Interface => "interface",
            StructureKind::Enum => "enum",
            StructureKind::Function => "function",
            StructureKind::Method => "method",
            StructureKind::Constructor => "constructor",
        }
    }

    /// 是否为可调用结构（函数、方法、构造器）
    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            StructureKind::Function | StructureKind::Method | StructureKind::Constructor
        )
    }
}

impl fmt::Display for StructureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 结构在所属 [`StructureSet`] 中的索引
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructureId(pub usize);

/// 单个代码结构
///
/// 行号从 1 开始，闭区间。`parent` 只是信息性的回指，不拥有父结构。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Structure {
    pub name: String,
    pub kind: StructureKind,
    pub start_line: u32,
    pub end_line: u32,
    pub parent: Option<StructureId>,
    /// 访问修饰符或装饰器名称，保持源码顺序
    pub modifiers: Vec<String>,
    /// 已格式化的参数列表
    pub params: Vec<String>,
    /// 返回类型，没有时为空字符串
    pub return_type: String,
}

impl Structure {
    /// 创建新的结构，结束行默认等于起始行
    pub fn new(name: impl Into<String>, kind: StructureKind, start_line: u32) -> Self {
        Self {
            name: name.into(),
            kind,
            start_line,
            end_line: start_line,
            parent: None,
            modifiers: Vec::new(),
            params: Vec::new(),
            return_type: String::new(),
        }
    }

    pub fn with_end_line(mut self, end_line: u32) -> Self {
        self.end_line = end_line;
        self
    }

    pub fn with_parent(mut self, parent: Option<StructureId>) -> Self {
        self.parent = parent;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Vec<String>) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_params(mut self, params: Vec<String>) -> Self {
        self.params = params;
        self
    }

    pub fn with_return_type(mut self, return_type: impl Into<String>) -> Self {
        self.return_type = return_type.into();
        self
    }

    /// 结构占用的行数
    pub fn line_count(&self) -> u32 {
        self.end_line.saturating_sub(self.start_line) + 1
    }

    /// 判断结构是否包含指定行
    pub fn contains_line(&self, line: u32) -> bool {
        self.start_line <= line && line <= self.end_line
    }

    /// 单层标签，例如 `public method addUser`
    pub fn label(&self) -> String {
        if self.modifiers.is_empty() {
            format!("{} {}", self.kind, self.name)
        } else {
            format!("{} {} {}", self.modifiers.join(" "), self.kind, self.name)
        }
    }

    /// 可调用结构的签名，例如 `add_user(self, name) -> bool`
    pub fn signature(&self) -> String {
        if !self.kind.is_callable() {
            return self.name.clone();
        }

        let mut signature = format!("{}({})", self.name, self.params.join(", "));
        if !self.return_type.is_empty() {
            signature.push_str(" -> ");
            signature.push_str(&self.return_type);
        }
        signature
    }
}

/// 单个文件版本的结构集合
///
/// 结构按提取顺序存放，父子关系通过 [`StructureId`] 表达，构成一个森林。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructureSet {
    structures: Vec<Structure>,
}

impl StructureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加结构并返回其索引
    pub fn push(&mut self, structure: Structure) -> StructureId {
        let id = StructureId(self.structures.len());
        self.structures.push(structure);
        id
    }

    pub fn get(&self, id: StructureId) -> Option<&Structure> {
        self.structures.get(id.0)
    }

    pub(crate) fn get_mut(&mut self, id: StructureId) -> Option<&mut Structure> {
        self.structures.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.structures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
    }

    /// 按提取顺序遍历所有结构
    pub fn iter(&self) -> impl Iterator<Item = (StructureId, &Structure)> {
        self.structures
            .iter()
            .enumerate()
            .map(|(index, structure)| (StructureId(index), structure))
    }

    /// 查找已创建的、名称、类型和起始行都匹配的结构
    pub fn find(&self, name: &str, kind: StructureKind, start_line: u32) -> Option<StructureId> {
        self.structures
            .iter()
            .enumerate()
            .rev()
            .find(|(_, s)| s.kind == kind && s.start_line == start_line && s.name == name)
            .map(|(index, _)| StructureId(index))
    }

    /// 从自身开始向外遍历祖先链
    ///
    /// 遍历步数不超过集合大小
    pub fn ancestry(&self, id: StructureId) -> Vec<&Structure> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(current_id) = current {
            let Some(structure) = self.get(current_id) else {
                break;
            };
            chain.push(structure);
            if chain.len() > self.structures.len() {
                break;
            }
            current = structure.parent;
        }
        chain
    }

    /// 结构的完整层级路径，例如 `class Order > method total`
    pub fn full_path(&self, id: StructureId) -> String {
        let mut labels: Vec<String> = self.ancestry(id).iter().map(|s| s.label()).collect();
        labels.reverse();
        labels.join(PATH_SEPARATOR)
    }

    /// 生成可脱离集合独立使用的结构快照
    pub fn resolve(&self, id: StructureId) -> Option<ResolvedStructure> {
        let structure = self.get(id)?;
        Some(ResolvedStructure {
            name: structure.name.clone(),
            kind: structure.kind,
            start_line: structure.start_line,
            end_line: structure.end_line,
            full_path: self.full_path(id),
            signature: structure.signature(),
            modifiers: structure.modifiers.clone(),
            params: structure.params.clone(),
            return_type: structure.return_type.clone(),
        })
    }
}

/// 解析后的结构快照
///
/// 变更记录持有该快照，因此可以在缓存释放后继续使用
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedStructure {
    pub name: String,
    pub kind: StructureKind,
    pub start_line: u32,
    pub end_line: u32,
    pub full_path: String,
    pub signature: String,
    pub modifiers: Vec<String>,
    pub params: Vec<String>,
    pub return_type: String,
}

impl ResolvedStructure {
    pub fn line_count(&self) -> u32 {
        self.end_line.saturating_sub(self.start_line) + 1
    }
}
