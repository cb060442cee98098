//! 结构索引模块
//!
//! 将结构集合展开为逐行查找表，回答"第 N 行属于哪个结构"

use crate::structure::{ResolvedStructure, Structure, StructureId, StructureSet};
use std::collections::HashMap;

/// 结构索引
///
/// 多个结构覆盖同一行时，行数最少的结构（最内层）胜出，行数相同时先出现的胜出
#[derive(Debug, Clone, Default)]
pub struct StructureIndex {
    structures: StructureSet,
    line_map: HashMap<u32, StructureId>,
}

impl StructureIndex {
    /// 根据结构集合构建索引
    pub fn build(structures: StructureSet) -> Self {
        let mut line_map: HashMap<u32, StructureId> = HashMap::new();

        for (id, structure) in structures.iter() {
            for line in structure.start_line..=structure.end_line {
                match line_map.get(&line) {
                    Some(&existing) => {
                        let keep_existing = structures
                            .get(existing)
                            .is_some_and(|e| e.line_count() <= structure.line_count());
                        if !keep_existing {
                            line_map.insert(line, id);
                        }
                    }
                    None => {
                        line_map.insert(line, id);
                    }
                }
            }
        }

        Self {
            structures,
            line_map,
        }
    }

    /// 空索引，所有查询都返回 None
    pub fn empty() -> Self {
        Self::default()
    }

    /// 查找包含指定行的最具体结构的索引
    pub fn lookup_id(&self, line: u32) -> Option<StructureId> {
        if let Some(&id) = self.line_map.get(&line) {
            return Some(id);
        }

        // 查找表未覆盖时退回到线性扫描
        let mut best: Option<(StructureId, u32)> = None;
        for (id, structure) in self.structures.iter() {
            if !structure.contains_line(line) {
                continue;
            }
            let count = structure.line_count();
            if best.is_none_or(|(_, best_count)| count < best_count) {
                best = Some((id, count));
            }
        }
        best.map(|(id, _)| id)
    }

    /// 查找包含指定行的最具体结构
    pub fn lookup(&self, line: u32) -> Option<&Structure> {
        self.lookup_id(line).and_then(|id| self.structures.get(id))
    }

    /// 查找并生成结构快照
    pub fn resolve(&self, line: u32) -> Option<ResolvedStructure> {
        self.lookup_id(line).and_then(|id| self.structures.resolve(id))
    }

    pub fn structures(&self) -> &StructureSet {
        &self.structures
    }

    /// 查找表覆盖的行数
    pub fn indexed_lines(&self) -> usize {
        self.line_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
    }
}
