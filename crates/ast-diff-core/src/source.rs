//! 文件内容读取模块
//!
//! 按 (路径, 版本) 读取文件内容。版本可以是工作区，也可以是某个 Git 修订；
//! 读取失败一律视为内容不可用，由调用方决定如何降级。

use crate::error::{AstDiffError, Result};
use crate::git::GitRevisionReader;
use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::rc::Rc;
use tracing::debug;

/// 文件版本
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FileVersion {
    /// 工作区中的当前文件
    WorkingTree,
    /// Git 修订，例如 `HEAD` 或提交哈希
    Revision(String),
}

impl fmt::Display for FileVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileVersion::WorkingTree => f.write_str("working tree"),
            FileVersion::Revision(rev) => f.write_str(rev),
        }
    }
}

/// 文件内容提供者
pub trait ContentProvider {
    /// 读取指定版本的文件内容，不可用时返回 None
    fn fetch(&self, path: &str, version: &FileVersion) -> Option<String>;
}

/// 工作区文件读取器
///
/// 先按根目录拼接相对路径，再按原样尝试；不支持修订
#[derive(Debug, Clone)]
pub struct FileSystemReader {
    root: PathBuf,
}

impl FileSystemReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read(&self, path: &str) -> Option<String> {
        let candidates = [self.root.join(path), PathBuf::from(path)];
        for candidate in &candidates {
            match fs::read(candidate) {
                Ok(bytes) => return Some(String::from_utf8_lossy(&bytes).into_owned()),
                Err(e) => debug!("Cannot read {}: {}", candidate.display(), e),
            }
        }
        None
    }
}

impl ContentProvider for FileSystemReader {
    fn fetch(&self, path: &str, version: &FileVersion) -> Option<String> {
        match version {
            FileVersion::WorkingTree => self.read(path),
            FileVersion::Revision(rev) => {
                debug!("File system reader cannot read revision {} of {}", rev, path);
                None
            }
        }
    }
}

/// 仓库内容读取器：工作区走文件系统，修订走 Git 对象库
pub struct RepositoryContent {
    files: FileSystemReader,
    revisions: Option<GitRevisionReader>,
}

impl RepositoryContent {
    /// 打开仓库；无法打开时只保留工作区读取能力
    pub fn open(repo_path: &Path) -> Self {
        match GitRevisionReader::open(repo_path) {
            Ok(reader) => {
                let root = reader
                    .work_dir()
                    .unwrap_or_else(|| repo_path.to_path_buf());
                Self {
                    files: FileSystemReader::new(root),
                    revisions: Some(reader),
                }
            }
            Err(e) => {
                debug!("Revision content unavailable: {}", e);
                Self {
                    files: FileSystemReader::new(repo_path),
                    revisions: None,
                }
            }
        }
    }

    /// 只读取工作区文件
    pub fn working_tree(root: impl Into<PathBuf>) -> Self {
        Self {
            files: FileSystemReader::new(root),
            revisions: None,
        }
    }

    pub fn has_revisions(&self) -> bool {
        self.revisions.is_some()
    }
}

impl ContentProvider for RepositoryContent {
    fn fetch(&self, path: &str, version: &FileVersion) -> Option<String> {
        match version {
            FileVersion::WorkingTree => self.files.fetch(path, version),
            FileVersion::Revision(_) => self
                .revisions
                .as_ref()
                .and_then(|reader| reader.fetch(path, version)),
        }
    }
}

/// 内存中的文件内容，用于测试和嵌入调用
#[derive(Debug, Default)]
pub struct MemoryContent {
    files: HashMap<(String, FileVersion), String>,
    fetches: Cell<usize>,
}

impl MemoryContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(
        mut self,
        path: impl Into<String>,
        version: FileVersion,
        content: impl Into<String>,
    ) -> Self {
        self.files.insert((path.into(), version), content.into());
        self
    }

    /// 累计的读取次数
    pub fn fetch_count(&self) -> usize {
        self.fetches.get()
    }
}

impl ContentProvider for MemoryContent {
    fn fetch(&self, path: &str, version: &FileVersion) -> Option<String> {
        self.fetches.set(self.fetches.get() + 1);
        self.files.get(&(path.to_string(), version.clone())).cloned()
    }
}

impl<P: ContentProvider + ?Sized> ContentProvider for Rc<P> {
    fn fetch(&self, path: &str, version: &FileVersion) -> Option<String> {
        (**self).fetch(path, version)
    }
}

/// 用 `diff -a -u` 比较两个文件，并把文件头改写为 `--- a/<file1>` / `+++ b/<file2>`
///
/// 退出码 0 和 1 表示相同和不同，其余退出码视为外部工具失败
pub fn compare_files(file1: &Path, file2: &Path) -> Result<String> {
    let output = Command::new("diff")
        .arg("-a")
        .arg("-u")
        .arg(file1)
        .arg(file2)
        .output()
        .map_err(|e| AstDiffError::ExternalToolFailure(format!("Failed to run diff: {e}")))?;

    match output.status.code() {
        Some(0) | Some(1) => {}
        code => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AstDiffError::ExternalToolFailure(format!(
                "diff exited with status {}: {}",
                code.map_or_else(|| "signal".to_string(), |c| c.to_string()),
                stderr.trim()
            )));
        }
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(rewrite_compare_headers(
        &stdout,
        &file1.to_string_lossy(),
        &file2.to_string_lossy(),
    ))
}

/// 改写 `diff -u` 的文件头，后续行保持不变
fn rewrite_compare_headers(diff_text: &str, file1: &str, file2: &str) -> String {
    let mut rewritten = String::with_capacity(diff_text.len());
    let mut old_done = false;
    let mut new_done = false;

    for line in diff_text.lines() {
        if !old_done && line.starts_with("--- ") {
            rewritten.push_str(&format!("--- a/{file1}"));
            old_done = true;
        } else if old_done && !new_done && line.starts_with("+++ ") {
            rewritten.push_str(&format!("+++ b/{file2}"));
            new_done = true;
        } else {
            rewritten.push_str(line);
        }
        rewritten.push('\n');
    }

    rewritten
}
