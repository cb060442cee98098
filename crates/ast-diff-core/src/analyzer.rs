//! 差异分析入口
//!
//! 组合差异来源、内容读取、分析器缓存和变更映射，完成一次完整的分析运行

use crate::cache::{AnalyzerCache, CacheStats};
use crate::diff::DiffParser;
use crate::error::Result;
use crate::git::git_diff;
use crate::mapper::{AnalysisResult, ChangeMapper};
use crate::source::{ContentProvider, FileVersion, RepositoryContent, compare_files};
use std::path::PathBuf;
use tracing::{debug, info};

/// 默认的旧版本修订
pub const DEFAULT_OLD_REVISION: &str = "HEAD";

/// 差异来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffMode {
    /// `git diff [old [new]]`；未指定 new 时与工作区比较
    Git {
        old: Option<String>,
        new: Option<String>,
    },
    /// 直接比较两个文件
    Compare { old_file: PathBuf, new_file: PathBuf },
}

/// 单次运行的配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub repo_path: PathBuf,
    pub mode: DiffMode,
}

impl RunConfig {
    pub fn git(repo_path: impl Into<PathBuf>, old: Option<String>, new: Option<String>) -> Self {
        Self {
            repo_path: repo_path.into(),
            mode: DiffMode::Git { old, new },
        }
    }

    pub fn compare(
        repo_path: impl Into<PathBuf>,
        old_file: impl Into<PathBuf>,
        new_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            repo_path: repo_path.into(),
            mode: DiffMode::Compare {
                old_file: old_file.into(),
                new_file: new_file.into(),
            },
        }
    }

    /// 删除行和新增行分别对应的文件版本
    pub fn versions(&self) -> (FileVersion, FileVersion) {
        match &self.mode {
            DiffMode::Git { old, new } => (
                FileVersion::Revision(
                    old.clone()
                        .unwrap_or_else(|| DEFAULT_OLD_REVISION.to_string()),
                ),
                new.clone()
                    .map_or(FileVersion::WorkingTree, FileVersion::Revision),
            ),
            DiffMode::Compare { .. } => (FileVersion::WorkingTree, FileVersion::WorkingTree),
        }
    }
}

/// 一次运行的结果
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub result: AnalysisResult,
    /// 差异文本为空
    pub no_changes: bool,
    pub cache_stats: CacheStats,
}

/// 差异分析器
pub struct DiffAnalyzer {
    config: RunConfig,
}

impl DiffAnalyzer {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// 运行外部命令生成差异文本
    pub fn diff_text(&self) -> Result<String> {
        match &self.config.mode {
            DiffMode::Git { old, new } => {
                git_diff(&self.config.repo_path, old.as_deref(), new.as_deref())
            }
            DiffMode::Compare { old_file, new_file } => {
                info!(
                    "Comparing files: {} vs {}",
                    old_file.display(),
                    new_file.display()
                );
                compare_files(old_file, new_file)
            }
        }
    }

    /// 本次运行使用的内容读取器
    pub fn content_provider(&self) -> Box<dyn ContentProvider> {
        match &self.config.mode {
            DiffMode::Git { .. } => Box::new(RepositoryContent::open(&self.config.repo_path)),
            DiffMode::Compare { .. } => {
                Box::new(RepositoryContent::working_tree(&self.config.repo_path))
            }
        }
    }

    /// 解析差异文本并映射到代码结构
    pub fn analyze_diff(&self, diff_text: &str, cache: &mut AnalyzerCache) -> AnalysisResult {
        let files = DiffParser::parse(diff_text);
        debug!("Diff contains {} file sections", files.len());

        let (old_version, new_version) = self.config.versions();
        ChangeMapper::new(cache, old_version, new_version).map(&files)
    }

    /// 完整运行：生成差异、构建缓存、映射变更
    pub fn run(&self) -> Result<AnalysisOutcome> {
        let diff_text = self.diff_text()?;
        let mut cache = AnalyzerCache::new(self.content_provider());

        if diff_text.trim().is_empty() {
            info!("No changes detected");
            return Ok(AnalysisOutcome {
                result: AnalysisResult::default(),
                no_changes: true,
                cache_stats: cache.stats().clone(),
            });
        }

        info!("Analyzing changes...");
        let result = self.analyze_diff(&diff_text, &mut cache);
        let cache_stats = cache.stats().clone();
        debug!(
            "Analyzer cache: {} hits, {} misses, {} parse failures",
            cache_stats.hits, cache_stats.misses, cache_stats.parse_failures
        );

        Ok(AnalysisOutcome {
            result,
            no_changes: false,
            cache_stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AstDiffError;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_git_versions() {
        let config = RunConfig::git(".", None, None);
        assert_eq!(
            config.versions(),
            (
                FileVersion::Revision("HEAD".to_string()),
                FileVersion::WorkingTree
            )
        );

        let config = RunConfig::git(".", Some("v1".to_string()), Some("v2".to_string()));
        assert_eq!(
            config.versions(),
            (
                FileVersion::Revision("v1".to_string()),
                FileVersion::Revision("v2".to_string())
            )
        );
    }

    #[test]
    fn test_compare_versions() {
        let config = RunConfig::compare(".", "a.py", "b.py");
        assert_eq!(
            config.versions(),
            (FileVersion::WorkingTree, FileVersion::WorkingTree)
        );
    }

    #[test]
    fn test_compare_run() {
        let temp_dir = TempDir::new().unwrap();
        let old_file = temp_dir.path().join("v1.py");
        let new_file = temp_dir.path().join("v2.py");
        fs::write(&old_file, "def f():\n    return 1\n").unwrap();
        fs::write(&new_file, "def f():\n    return 2\n").unwrap();

        let analyzer = DiffAnalyzer::new(RunConfig::compare(temp_dir.path(), &old_file, &new_file));
        let outcome = analyzer.run().expect("compare run should succeed");

        assert!(!outcome.no_changes);
        assert_eq!(outcome.result.files.len(), 1);

        let group = &outcome.result.files[0].groups[0];
        assert_eq!(group.key, "function f");
        assert_eq!((group.additions, group.deletions), (1, 1));
    }

    #[test]
    fn test_compare_identical_files() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("same.py");
        fs::write(&file, "x = 1\n").unwrap();

        let outcome = DiffAnalyzer::new(RunConfig::compare(temp_dir.path(), &file, &file))
            .run()
            .unwrap();

        assert!(outcome.no_changes);
        assert!(outcome.result.is_empty());
    }

    #[test]
    fn test_compare_missing_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.py");

        let result = DiffAnalyzer::new(RunConfig::compare(temp_dir.path(), &missing, &missing)).run();
        assert!(matches!(result, Err(AstDiffError::ExternalToolFailure(_))));
    }
}
