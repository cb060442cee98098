//! 变更映射模块
//!
//! 把差异行事件关联到所属的代码结构：新增行查新文件索引，删除行查旧文件索引，
//! 然后按结构分组并合并只有格式差异的行。

use crate::cache::{AnalyzerCache, AnalyzerLookup, FileAnalyzer};
use crate::diff::{ChangeKind, DiffLineEvent, FileDiff};
use crate::index::StructureIndex;
use crate::parser::{ParserFactory, SupportedLanguage};
use crate::source::FileVersion;
use crate::structure::ResolvedStructure;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;
use tracing::{debug, info};

/// 无法归属到任何结构的变更所在分组
pub const UNKNOWN_STRUCTURE: &str = "unknown structure";

/// 单条变更记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    #[serde(flatten)]
    pub event: DiffLineEvent,
    /// 所属结构，None 表示模块级代码
    pub structure: Option<ResolvedStructure>,
}

impl Change {
    pub fn kind(&self) -> ChangeKind {
        self.event.kind
    }

    pub fn line_number(&self) -> u32 {
        self.event.line_number
    }

    pub fn group_key(&self) -> &str {
        self.structure
            .as_ref()
            .map_or(UNKNOWN_STRUCTURE, |s| s.full_path.as_str())
    }
}

/// 同一结构下的变更
#[derive(Debug, Clone, Serialize)]
pub struct StructureGroup {
    pub key: String,
    pub structure: Option<ResolvedStructure>,
    pub additions: usize,
    pub deletions: usize,
    pub changes: Vec<Change>,
}

impl StructureGroup {
    fn new(key: String, structure: Option<ResolvedStructure>) -> Self {
        Self {
            key,
            structure,
            additions: 0,
            deletions: 0,
            changes: Vec::new(),
        }
    }

    /// 合并同一行上内容相同的一对新增和删除，并重新计数
    fn collapse_reformatting(&mut self) {
        let mut slots: Vec<Option<Change>> = self.changes.drain(..).map(Some).collect();

        for i in 0..slots.len() {
            let Some(first) = slots[i].as_ref() else {
                continue;
            };
            let opposite = match first.kind() {
                ChangeKind::Addition => ChangeKind::Deletion,
                ChangeKind::Deletion => ChangeKind::Addition,
                ChangeKind::Context => continue,
            };
            let line = first.line_number();
            let content = first.event.content.trim_end().to_string();

            let partner = (i + 1..slots.len()).find(|&j| {
                slots[j].as_ref().is_some_and(|c| {
                    c.kind() == opposite
                        && c.line_number() == line
                        && c.event.content.trim_end() == content
                })
            });

            if let Some(j) = partner {
                let (Some(a), Some(b)) = (slots[i].take(), slots[j].take()) else {
                    continue;
                };
                let mut merged = if a.kind() == ChangeKind::Addition { a } else { b };
                merged.event.kind = ChangeKind::Context;
                slots[i] = Some(merged);
            }
        }

        self.changes = slots.into_iter().flatten().collect();
        self.additions = self.count(ChangeKind::Addition);
        self.deletions = self.count(ChangeKind::Deletion);
    }

    fn count(&self, kind: ChangeKind) -> usize {
        self.changes.iter().filter(|c| c.kind() == kind).count()
    }
}

/// 单个文件的映射结果
#[derive(Debug, Clone, Serialize)]
pub struct FileChanges {
    pub file_path: String,
    pub old_path: Option<String>,
    pub new_path: Option<String>,
    pub language: SupportedLanguage,
    /// 按 key 字母序排列
    pub groups: Vec<StructureGroup>,
    #[serde(skip)]
    pub old_source: Option<Rc<str>>,
    #[serde(skip)]
    pub new_source: Option<Rc<str>>,
}

impl FileChanges {
    pub fn additions(&self) -> usize {
        self.groups.iter().map(|g| g.additions).sum()
    }

    pub fn deletions(&self) -> usize {
        self.groups.iter().map(|g| g.deletions).sum()
    }

    /// 变更记录总数（包括合并后的记录）
    pub fn change_count(&self) -> usize {
        self.groups.iter().map(|g| g.changes.len()).sum()
    }

    /// 渲染上下文使用的源码：优先新版本
    pub fn context_source(&self) -> Option<&str> {
        self.new_source.as_deref().or(self.old_source.as_deref())
    }

    pub fn changes(&self) -> impl Iterator<Item = &Change> {
        self.groups.iter().flat_map(|g| g.changes.iter())
    }
}

/// 修改最多的结构
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructureStat {
    pub full_path: String,
    pub changes: usize,
}

/// 整个差异的映射结果
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisResult {
    /// 按差异中出现的顺序排列
    pub files: Vec<FileChanges>,
}

impl AnalysisResult {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn total_changes(&self) -> usize {
        self.files.iter().map(|f| f.change_count()).sum()
    }

    pub fn total_additions(&self) -> usize {
        self.files.iter().map(|f| f.additions()).sum()
    }

    pub fn total_deletions(&self) -> usize {
        self.files.iter().map(|f| f.deletions()).sum()
    }

    /// 文件路径到变更列表的扁平映射，列表按分组顺序拼接
    pub fn changes_by_file(&self) -> Vec<(&str, Vec<&Change>)> {
        self.files
            .iter()
            .map(|f| (f.file_path.as_str(), f.changes().collect()))
            .collect()
    }

    /// 新增和删除次数最多的结构，次数相同时保持首次出现的顺序
    pub fn top_structures(&self, limit: usize) -> Vec<StructureStat> {
        let mut stats: Vec<StructureStat> = Vec::new();
        let mut positions: HashMap<&str, usize> = HashMap::new();

        for change in self.files.iter().flat_map(|f| f.changes()) {
            if change.kind() == ChangeKind::Context {
                continue;
            }
            let Some(structure) = change.structure.as_ref() else {
                continue;
            };
            let path = structure.full_path.as_str();
            match positions.get(path) {
                Some(&position) => stats[position].changes += 1,
                None => {
                    positions.insert(path, stats.len());
                    stats.push(StructureStat {
                        full_path: path.to_string(),
                        changes: 1,
                    });
                }
            }
        }

        stats.sort_by(|a, b| b.changes.cmp(&a.changes));
        stats.truncate(limit);
        stats
    }
}

/// 变更映射器
pub struct ChangeMapper<'a> {
    cache: &'a mut AnalyzerCache,
    old_version: FileVersion,
    new_version: FileVersion,
}

impl<'a> ChangeMapper<'a> {
    pub fn new(
        cache: &'a mut AnalyzerCache,
        old_version: FileVersion,
        new_version: FileVersion,
    ) -> Self {
        Self {
            cache,
            old_version,
            new_version,
        }
    }

    /// 映射所有文件，没有变更记录的文件被省略
    pub fn map(&mut self, files: &[FileDiff]) -> AnalysisResult {
        let files: Vec<FileChanges> = files.iter().filter_map(|f| self.map_file(f)).collect();
        let result = AnalysisResult { files };

        info!(
            "Mapped {} changes in {} files",
            result.total_changes(),
            result.files.len()
        );
        result
    }

    /// 映射单个文件；不支持的语言或没有变更时返回 None
    pub fn map_file(&mut self, file: &FileDiff) -> Option<FileChanges> {
        let display_path = file.display_path();
        let Some(language) = ParserFactory::detect_language(Path::new(display_path)) else {
            debug!("Skipping unsupported file {}", display_path);
            return None;
        };

        let new_analyzer = Self::analyzer(self.cache, file.new_path.as_deref(), &self.new_version);
        let old_analyzer = Self::analyzer(self.cache, file.old_path.as_deref(), &self.old_version);

        let empty = StructureIndex::empty();
        let new_index = new_analyzer.as_ref().map_or(&empty, |a| &a.index);
        let old_index = match (&old_analyzer, &new_analyzer) {
            (Some(old), _) => &old.index,
            (None, Some(new)) => {
                debug!(
                    "Old version of {} unavailable, resolving deletions against the new version",
                    display_path
                );
                &new.index
            }
            (None, None) => &empty,
        };

        let mut groups: Vec<StructureGroup> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for event in &file.events {
            let structure = match event.kind {
                ChangeKind::Addition => new_index.resolve(event.line_number),
                ChangeKind::Deletion => old_index.resolve(event.line_number),
                ChangeKind::Context => continue,
            };
            let change = Change {
                event: event.clone(),
                structure,
            };

            let key = change.group_key().to_string();
            let position = *positions.entry(key.clone()).or_insert_with(|| {
                groups.push(StructureGroup::new(key, change.structure.clone()));
                groups.len() - 1
            });
            groups[position].changes.push(change);
        }

        for group in &mut groups {
            group.collapse_reformatting();
        }
        groups.retain(|g| !g.changes.is_empty());
        if groups.is_empty() {
            return None;
        }
        groups.sort_by(|a, b| a.key.cmp(&b.key));

        Some(FileChanges {
            file_path: display_path.to_string(),
            old_path: file.old_path.clone(),
            new_path: file.new_path.clone(),
            language,
            groups,
            old_source: old_analyzer.map(|a| Rc::clone(&a.source)),
            new_source: new_analyzer.map(|a| Rc::clone(&a.source)),
        })
    }

    fn analyzer(
        cache: &mut AnalyzerCache,
        path: Option<&str>,
        version: &FileVersion,
    ) -> Option<Rc<FileAnalyzer>> {
        let path = path?;
        match cache.get(path, version) {
            AnalyzerLookup::Ready(analyzer) => Some(analyzer),
            AnalyzerLookup::Unavailable | AnalyzerLookup::Unsupported => None,
        }
    }
}
