//! Git 仓库交互模块
//!
//! 修订中的文件内容通过 gix 在进程内读取；差异文本由 `git diff` 命令生成

use crate::error::{AstDiffError, Result};
use crate::source::{ContentProvider, FileVersion};
use gix::ThreadSafeRepository;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Git 修订内容读取器
pub struct GitRevisionReader {
    repo: ThreadSafeRepository,
}

impl GitRevisionReader {
    /// 从指定路径向上查找并打开 Git 仓库，子目录也可以
    pub fn open(repo_path: &Path) -> Result<Self> {
        let repo = ThreadSafeRepository::discover(repo_path).map_err(|e| {
            AstDiffError::GitError(format!(
                "Failed to open repository at {}: {}",
                repo_path.display(),
                e
            ))
        })?;

        Ok(Self { repo })
    }

    /// 仓库工作区根目录，裸仓库返回 None
    pub fn work_dir(&self) -> Option<PathBuf> {
        self.repo.to_thread_local().workdir().map(Path::to_path_buf)
    }

    /// 读取 `<rev>:<path>` 对应的文件内容，非 UTF-8 字节按有损方式转换
    pub fn read_blob(&self, rev: &str, path: &str) -> Result<String> {
        let repo = self.repo.to_thread_local();
        let spec = format!("{rev}:{path}");

        let id = repo
            .rev_parse_single(spec.as_str())
            .map_err(|e| AstDiffError::GitError(format!("Failed to resolve {spec}: {e}")))?
            .detach();

        let blob = repo
            .find_object(id)
            .map_err(|e| AstDiffError::GitError(format!("Failed to find object {id}: {e}")))?
            .try_into_blob()
            .map_err(|e| AstDiffError::GitError(format!("{spec} is not a file: {e}")))?;

        Ok(String::from_utf8_lossy(&blob.data).into_owned())
    }
}

impl ContentProvider for GitRevisionReader {
    fn fetch(&self, path: &str, version: &FileVersion) -> Option<String> {
        let FileVersion::Revision(rev) = version else {
            return None;
        };

        match self.read_blob(rev, path) {
            Ok(content) => Some(content),
            Err(e) => {
                debug!("Content unavailable for {} at {}: {}", path, rev, e);
                None
            }
        }
    }
}

/// 在仓库中运行 `git diff [commit1 [commit2]]` 并返回差异文本
///
/// 固定 `a/`、`b/` 前缀，不受 `diff.noprefix` 和 `diff.mnemonicPrefix` 配置影响
pub fn git_diff(repo_path: &Path, commit1: Option<&str>, commit2: Option<&str>) -> Result<String> {
    let mut command = Command::new("git");
    command
        .args([
            "diff",
            "--no-color",
            "--no-ext-diff",
            "--src-prefix=a/",
            "--dst-prefix=b/",
        ])
        .current_dir(repo_path);
    for rev in [commit1, commit2].into_iter().flatten() {
        command.arg(rev);
    }

    info!(
        "Running git diff in {} ({} .. {})",
        repo_path.display(),
        commit1.unwrap_or("HEAD"),
        commit2.unwrap_or("working tree")
    );

    let output = command
        .output()
        .map_err(|e| AstDiffError::ExternalToolFailure(format!("Failed to run git diff: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AstDiffError::ExternalToolFailure(format!(
            "git diff failed: {}",
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
