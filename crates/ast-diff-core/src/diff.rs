//! 统一差异格式解析模块
//!
//! 将 `git diff` / `diff -u` 输出的统一差异文本解析为逐行变更事件，
//! 新旧两侧的行号各自独立计数。

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::debug;

static HUNK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@").expect("valid hunk header regex")
});

/// 变更类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Addition,
    Deletion,
    Context,
}

impl ChangeKind {
    /// 差异行的前缀标记
    pub fn marker(&self) -> char {
        match self {
            ChangeKind::Addition => '+',
            ChangeKind::Deletion => '-',
            ChangeKind::Context => ' ',
        }
    }
}

/// 单个差异行事件
///
/// 新增行和上下文行的行号属于新文件，删除行的行号属于旧文件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLineEvent {
    pub file_path: String,
    pub line_number: u32,
    /// 去掉前缀标记后的原始内容
    pub content: String,
    pub kind: ChangeKind,
}

/// 差异块头部及其结束时的计数器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkHeader {
    pub old_start: u32,
    pub old_count: u32,
    pub new_start: u32,
    pub new_count: u32,
    /// 块结束后旧文件计数器的值
    pub old_line: u32,
    /// 块结束后新文件计数器的值
    pub new_line: u32,
}

impl HunkHeader {
    /// 解析 `@@ -a[,b] +c[,d] @@` 头部，省略的行数为 1
    pub fn parse(line: &str) -> Option<Self> {
        let captures = HUNK_HEADER.captures(line)?;
        let number = |index: usize| -> Option<u32> {
            match captures.get(index) {
                Some(m) => m.as_str().parse().ok(),
                None => Some(1),
            }
        };

        let old_start = number(1)?;
        let old_count = number(2)?;
        let new_start = number(3)?;
        let new_count = number(4)?;

        Some(Self {
            old_start,
            old_count,
            new_start,
            new_count,
            old_line: old_start,
            new_line: new_start,
        })
    }
}

/// 单个文件的差异
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileDiff {
    /// 旧路径，`/dev/null` 时为 None
    pub old_path: Option<String>,
    /// 新路径，`/dev/null` 时为 None
    pub new_path: Option<String>,
    pub events: Vec<DiffLineEvent>,
    pub hunks: Vec<HunkHeader>,
}

impl FileDiff {
    /// 用于展示和语言检测的路径：优先新路径
    pub fn display_path(&self) -> &str {
        self.new_path
            .as_deref()
            .or(self.old_path.as_deref())
            .unwrap_or_default()
    }

    pub fn additions(&self) -> usize {
        self.count(ChangeKind::Addition)
    }

    pub fn deletions(&self) -> usize {
        self.count(ChangeKind::Deletion)
    }

    fn count(&self, kind: ChangeKind) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    SeekingFileHeader,
    SeekingHunk,
    InHunk,
}

/// 统一差异解析器
pub struct DiffParser {
    state: ParseState,
    files: Vec<FileDiff>,
    current: Option<FileDiff>,
    pending_old_path: Option<Option<String>>,
    hunk: Option<HunkHeader>,
    old_remaining: u32,
    new_remaining: u32,
}

impl Default for DiffParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DiffParser {
    pub fn new() -> Self {
        Self {
            state: ParseState::SeekingFileHeader,
            files: Vec::new(),
            current: None,
            pending_old_path: None,
            hunk: None,
            old_remaining: 0,
            new_remaining: 0,
        }
    }

    /// 解析完整的差异文本，每个文件段落返回一个 [`FileDiff`]
    pub fn parse(diff_text: &str) -> Vec<FileDiff> {
        let mut parser = Self::new();
        for line in diff_text.lines() {
            parser.feed_line(line);
        }
        parser.finish()
    }

    /// 处理一行输入
    pub fn feed_line(&mut self, line: &str) {
        let in_budget =
            self.state == ParseState::InHunk && (self.old_remaining > 0 || self.new_remaining > 0);

        if !in_budget && self.handle_header(line) {
            return;
        }

        if self.state == ParseState::InHunk {
            self.handle_hunk_line(line, in_budget);
        }
    }

    /// 结束解析并返回所有文件
    pub fn finish(mut self) -> Vec<FileDiff> {
        self.finish_file();
        self.files
    }

    /// 识别文件头和块头，返回该行是否已被消费
    fn handle_header(&mut self, line: &str) -> bool {
        if line.starts_with("diff --git ") {
            self.finish_file();
            return true;
        }

        if let Some(path) = line.strip_prefix("--- ") {
            self.finish_file();
            self.pending_old_path = Some(normalize_path(path));
            return true;
        }

        if let Some(path) = line.strip_prefix("+++ ") {
            let old_path = match self.pending_old_path.take() {
                Some(old_path) => old_path,
                None => {
                    self.finish_file();
                    None
                }
            };
            self.current = Some(FileDiff {
                old_path,
                new_path: normalize_path(path),
                ..FileDiff::default()
            });
            self.state = ParseState::SeekingHunk;
            return true;
        }

        if line.starts_with("@@") {
            if self.state == ParseState::SeekingFileHeader {
                return true;
            }
            match HunkHeader::parse(line) {
                Some(header) => {
                    self.close_hunk();
                    self.old_remaining = header.old_count;
                    self.new_remaining = header.new_count;
                    self.hunk = Some(header);
                    self.state = ParseState::InHunk;
                }
                None => debug!("Ignoring malformed hunk header: {}", line),
            }
            return true;
        }

        false
    }

    fn handle_hunk_line(&mut self, line: &str, in_budget: bool) {
        let Some(hunk) = self.hunk.as_mut() else {
            return;
        };

        let (kind, line_number, content) = if line.starts_with('\\') {
            return;
        } else if let Some(content) = line.strip_prefix('+') {
            let number = hunk.new_line;
            hunk.new_line = hunk.new_line.saturating_add(1);
            self.new_remaining = self.new_remaining.saturating_sub(1);
            (ChangeKind::Addition, number, content)
        } else if let Some(content) = line.strip_prefix('-') {
            let number = hunk.old_line;
            hunk.old_line = hunk.old_line.saturating_add(1);
            self.old_remaining = self.old_remaining.saturating_sub(1);
            (ChangeKind::Deletion, number, content)
        } else if line.is_empty() && !in_budget {
            return;
        } else {
            let number = hunk.new_line;
            if in_budget {
                if self.old_remaining > 0 {
                    hunk.old_line = hunk.old_line.saturating_add(1);
                    self.old_remaining -= 1;
                }
                if self.new_remaining > 0 {
                    hunk.new_line = hunk.new_line.saturating_add(1);
                    self.new_remaining -= 1;
                }
            } else {
                hunk.old_line = hunk.old_line.saturating_add(1);
                hunk.new_line = hunk.new_line.saturating_add(1);
            }
            (
                ChangeKind::Context,
                number,
                line.strip_prefix(' ').unwrap_or(line),
            )
        };

        if let Some(file) = self.current.as_mut() {
            let file_path = file.display_path().to_string();
            file.events.push(DiffLineEvent {
                file_path,
                line_number,
                content: content.to_string(),
                kind,
            });
        }
    }

    fn close_hunk(&mut self) {
        if let (Some(hunk), Some(file)) = (self.hunk.take(), self.current.as_mut()) {
            file.hunks.push(hunk);
        }
        self.old_remaining = 0;
        self.new_remaining = 0;
    }

    fn finish_file(&mut self) {
        self.close_hunk();
        if let Some(file) = self.current.take() {
            debug!(
                "Parsed diff for {}: {} events in {} hunks",
                file.display_path(),
                file.events.len(),
                file.hunks.len()
            );
            self.files.push(file);
        }
        self.pending_old_path = None;
        self.state = ParseState::SeekingFileHeader;
    }
}

/// 规范化文件头中的路径
///
/// 去掉 TAB 之后的时间戳、git 的 C 风格引号和 `a/`、`b/` 前缀，`/dev/null` 表示不存在
fn normalize_path(raw: &str) -> Option<String> {
    let path = raw.split('\t').next().unwrap_or_default().trim_end();
    let path = match unquote_c_path(path) {
        Some(unquoted) => unquoted,
        None => path.to_string(),
    };
    if path == "/dev/null" || path.is_empty() {
        return None;
    }

    let stripped = path
        .strip_prefix("a/")
        .or_else(|| path.strip_prefix("b/"))
        .unwrap_or(&path);
    Some(stripped.to_string())
}

/// 还原 git 按 `core.quotePath` 输出的带引号路径
///
/// 八进制转义是 UTF-8 字节序列；不是以双引号包围的输入返回 `None`
fn unquote_c_path(path: &str) -> Option<String> {
    let inner = path.strip_prefix('"')?.strip_suffix('"')?;
    let mut bytes = Vec::with_capacity(inner.len());
    let mut rest = inner.bytes().peekable();

    while let Some(byte) = rest.next() {
        if byte != b'\\' {
            bytes.push(byte);
            continue;
        }
        let Some(escaped) = rest.next() else {
            bytes.push(b'\\');
            break;
        };
        match escaped {
            b'a' => bytes.push(0x07),
            b'b' => bytes.push(0x08),
            b't' => bytes.push(b'\t'),
            b'n' => bytes.push(b'\n'),
            b'v' => bytes.push(0x0b),
            b'f' => bytes.push(0x0c),
            b'r' => bytes.push(b'\r'),
            b'0'..=b'7' => {
                let mut value = u32::from(escaped - b'0');
                for _ in 0..2 {
                    match rest.peek().copied() {
                        Some(digit @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(digit - b'0');
                            rest.next();
                        }
                        _ => break,
                    }
                }
                bytes.push(u8::try_from(value).unwrap_or(u8::MAX));
            }
            other => bytes.push(other),
        }
    }

    Some(String::from_utf8_lossy(&bytes).into_owned())
}
