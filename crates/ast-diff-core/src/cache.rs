//! 分析器缓存模块
//!
//! 按 (路径, 版本) 缓存结构索引，保证一次运行中每个文件版本最多读取和解析一次

use crate::index::StructureIndex;
use crate::parser::{ParserFactory, StructureExtractor, SupportedLanguage};
use crate::source::{ContentProvider, FileVersion};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::Path;
use std::rc::Rc;
use tracing::{debug, warn};

/// 缓存键
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub path: String,
    pub version: FileVersion,
}

impl CacheKey {
    pub fn new(path: impl Into<String>, version: FileVersion) -> Self {
        Self {
            path: path.into(),
            version,
        }
    }
}

/// 单个文件版本的分析结果
#[derive(Debug)]
pub struct FileAnalyzer {
    pub path: String,
    pub version: FileVersion,
    pub language: SupportedLanguage,
    /// 源码文本，渲染上下文时共享使用
    pub source: Rc<str>,
    pub index: StructureIndex,
    /// 解析失败时的诊断信息，此时索引为空
    pub parse_error: Option<String>,
}

impl FileAnalyzer {
    pub fn is_parsed(&self) -> bool {
        self.parse_error.is_none()
    }
}

/// 缓存查询结果
#[derive(Debug, Clone)]
pub enum AnalyzerLookup {
    Ready(Rc<FileAnalyzer>),
    /// 该版本的内容无法读取
    Unavailable,
    /// 文件扩展名不受支持
    Unsupported,
}

impl AnalyzerLookup {
    pub fn ready(&self) -> Option<&Rc<FileAnalyzer>> {
        match self {
            AnalyzerLookup::Ready(analyzer) => Some(analyzer),
            _ => None,
        }
    }
}

/// 缓存统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// 缓存命中次数
    pub hits: u64,
    /// 缓存未命中次数
    pub misses: u64,
    /// 提取器创建次数
    pub creates: u64,
    /// 解析失败次数
    pub parse_failures: u64,
}

impl CacheStats {
    /// 获取缓存命中率
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// 分析器缓存
///
/// 由一次运行持有并显式传递，失败的结果同样会被缓存
pub struct AnalyzerCache {
    provider: Box<dyn ContentProvider>,
    entries: HashMap<CacheKey, AnalyzerLookup>,
    extractors: HashMap<SupportedLanguage, Box<dyn StructureExtractor>>,
    stats: CacheStats,
}

impl AnalyzerCache {
    pub fn new(provider: Box<dyn ContentProvider>) -> Self {
        Self {
            provider,
            entries: HashMap::new(),
            extractors: HashMap::new(),
            stats: CacheStats::default(),
        }
    }

    /// 获取文件版本的分析器，首次访问时读取并解析
    pub fn get(&mut self, path: &str, version: &FileVersion) -> AnalyzerLookup {
        let key = CacheKey::new(path, version.clone());
        if let Some(lookup) = self.entries.get(&key) {
            self.stats.hits += 1;
            return lookup.clone();
        }

        self.stats.misses += 1;
        let lookup = self.build(path, version);
        self.entries.insert(key, lookup.clone());
        lookup
    }

    fn build(&mut self, path: &str, version: &FileVersion) -> AnalyzerLookup {
        let Some(language) = ParserFactory::detect_language(Path::new(path)) else {
            debug!("Skipping unsupported file {}", path);
            return AnalyzerLookup::Unsupported;
        };

        let Some(content) = self.provider.fetch(path, version) else {
            debug!("Content unavailable for {} ({})", path, version);
            return AnalyzerLookup::Unavailable;
        };

        let (index, parse_error) = match self.extract(language, &content) {
            Ok(index) => (index, None),
            Err(message) => {
                warn!("Failed to parse {} ({}): {}", path, version, message);
                self.stats.parse_failures += 1;
                (StructureIndex::empty(), Some(message))
            }
        };

        debug!(
            "Analyzed {} ({}): {} structures",
            path,
            version,
            index.structures().len()
        );

        AnalyzerLookup::Ready(Rc::new(FileAnalyzer {
            path: path.to_string(),
            version: version.clone(),
            language,
            source: Rc::from(content),
            index,
            parse_error,
        }))
    }

    fn extract(
        &mut self,
        language: SupportedLanguage,
        content: &str,
    ) -> std::result::Result<StructureIndex, String> {
        let extractor = match self.extractors.entry(language) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                debug!("Creating {} extractor", language.name());
                let extractor =
                    ParserFactory::create_extractor(language).map_err(|e| e.to_string())?;
                self.stats.creates += 1;
                entry.insert(extractor)
            }
        };

        let structures = extractor.extract(content).map_err(|e| e.to_string())?;
        Ok(StructureIndex::build(structures))
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// 已缓存的文件版本数量
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
