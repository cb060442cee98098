//! 输出格式化模块
//!
//! 将映射结果渲染为按文件、按结构分组的文本报告或 JSON

use crate::diff::ChangeKind;
use crate::error::Result;
use crate::mapper::{AnalysisResult, Change, FileChanges, StructureGroup, StructureStat};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// 输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// 终端文本报告
    #[default]
    Text,
    /// JSON 文档
    Json,
}

/// 输出格式化器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatterConfig {
    /// 输出格式
    pub output_format: OutputFormat,
    /// 是否启用颜色输出（仅对文本输出有效）
    pub enable_colors: bool,
    /// 是否显示结构签名和行范围
    pub verbose: bool,
    /// 是否显示统计信息
    pub show_statistics: bool,
    /// 每个变更行前后显示的上下文行数
    pub context_lines: u32,
    /// 行号间隔达到该值时显示省略号
    pub min_gap_for_ellipsis: u32,
    /// 统计中列出的结构数量
    pub top_structures_limit: usize,
    /// 分隔线宽度
    pub separator_width: usize,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::Text,
            enable_colors: true,
            verbose: false,
            show_statistics: false,
            context_lines: 3,
            min_gap_for_ellipsis: 5,
            top_structures_limit: 10,
            separator_width: 80,
        }
    }
}

/// 颜色主题
#[derive(Debug, Clone)]
pub struct ColorTheme {
    /// 标题和分隔线颜色
    pub header: String,
    /// 摘要颜色
    pub summary: String,
    /// 结构路径颜色
    pub structure: String,
    /// 增删计数和省略号颜色
    pub counts: String,
    /// 添加行颜色
    pub added_line: String,
    /// 删除行颜色
    pub removed_line: String,
    /// 上下文行颜色
    pub context_line: String,
    /// 结构详情颜色
    pub detail: String,
    /// 重置
    pub reset: String,
}

impl Default for ColorTheme {
    fn default() -> Self {
        Self {
            header: "\x1b[36m".to_string(),       // 青色
            summary: "\x1b[32m".to_string(),      // 绿色
            structure: "\x1b[32m".to_string(),    // 绿色
            counts: "\x1b[33m".to_string(),       // 黄色
            added_line: "\x1b[32m".to_string(),   // 绿色
            removed_line: "\x1b[31m".to_string(), // 红色
            context_line: "\x1b[37m".to_string(), // 白色
            detail: "\x1b[90m".to_string(),       // 灰色
            reset: "\x1b[0m".to_string(),
        }
    }
}

impl ColorTheme {
    /// 不输出任何转义序列的主题
    pub fn plain() -> Self {
        Self {
            header: String::new(),
            summary: String::new(),
            structure: String::new(),
            counts: String::new(),
            added_line: String::new(),
            removed_line: String::new(),
            context_line: String::new(),
            detail: String::new(),
            reset: String::new(),
        }
    }
}

/// 输出元数据
#[derive(Debug, Clone, Serialize)]
pub struct OutputMetadata {
    /// 涉及的文件数
    pub files_count: usize,
    /// 变更记录总数
    pub total_changes: usize,
    pub additions: usize,
    pub deletions: usize,
    /// 生成时间戳
    pub generated_at: String,
}

/// 格式化结果
#[derive(Debug, Clone)]
pub struct FormattedOutput {
    /// 格式化后的内容
    pub content: String,
    /// 输出格式
    pub format: OutputFormat,
    /// 元数据
    pub metadata: OutputMetadata,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    metadata: &'a OutputMetadata,
    files: &'a [FileChanges],
    #[serde(skip_serializing_if = "Option::is_none")]
    top_structures: Option<Vec<StructureStat>>,
}

/// 输出渲染器
pub struct OutputRenderer {
    config: FormatterConfig,
    theme: ColorTheme,
}

impl OutputRenderer {
    /// 创建新的输出渲染器
    pub fn new(config: FormatterConfig) -> Self {
        let theme = if config.enable_colors {
            ColorTheme::default()
        } else {
            ColorTheme::plain()
        };
        Self { config, theme }
    }

    /// 使用默认配置创建渲染器
    pub fn with_default_config() -> Self {
        Self::new(FormatterConfig::default())
    }

    /// 使用自定义颜色主题
    pub fn with_theme(mut self, theme: ColorTheme) -> Self {
        self.theme = theme;
        self
    }

    pub fn config(&self) -> &FormatterConfig {
        &self.config
    }

    /// 渲染映射结果
    pub fn render(&self, result: &AnalysisResult) -> Result<FormattedOutput> {
        let metadata = self.generate_metadata(result);
        let content = match self.config.output_format {
            OutputFormat::Text => self.render_text(result),
            OutputFormat::Json => self.render_json(result, &metadata)?,
        };

        Ok(FormattedOutput {
            content,
            format: self.config.output_format,
            metadata,
        })
    }

    /// 渲染为文本报告
    fn render_text(&self, result: &AnalysisResult) -> String {
        let mut output = String::new();
        let t = &self.theme;

        if result.is_empty() {
            output.push_str(&format!(
                "{}No supported file changes detected{}\n",
                t.counts, t.reset
            ));
            return output;
        }

        self.push_banner(&mut output, "AST Diff Analysis Results");
        output.push_str(&format!(
            "{}Summary: {} files, {} lines changed{}\n\n",
            t.summary,
            result.files.len(),
            result.total_changes(),
            t.reset
        ));

        for file in &result.files {
            self.render_file(&mut output, file);
        }

        if self.config.show_statistics {
            output.push_str(&self.render_statistics(result));
        }

        output
    }

    fn push_banner(&self, output: &mut String, title: &str) {
        let t = &self.theme;
        let separator = "=".repeat(self.config.separator_width);
        output.push_str(&format!("{}{}{}\n", t.header, separator, t.reset));
        output.push_str(&format!("{}{}{}\n", t.header, title, t.reset));
        output.push_str(&format!("{}{}{}\n\n", t.header, separator, t.reset));
    }

    fn render_file(&self, output: &mut String, file: &FileChanges) {
        let t = &self.theme;
        output.push_str(&format!("{}File: {}{}\n", t.header, file.file_path, t.reset));
        output.push_str(&format!(
            "{}{}{}\n",
            t.header,
            "-".repeat(self.config.separator_width),
            t.reset
        ));

        let source_lines: Vec<&str> = file
            .context_source()
            .map(|source| source.lines().collect())
            .unwrap_or_default();

        for group in &file.groups {
            self.render_group(output, group, &source_lines);
        }
        output.push('\n');
    }

    /// 渲染单个结构分组：变更行按行号排列，前后附带上下文
    fn render_group(&self, output: &mut String, group: &StructureGroup, source_lines: &[&str]) {
        let t = &self.theme;
        output.push_str(&format!("\n  {}▸ {}{}\n", t.structure, group.key, t.reset));
        output.push_str(&format!(
            "     {}(+{} -{} lines){}\n",
            t.counts, group.additions, group.deletions, t.reset
        ));

        if self.config.verbose {
            if let Some(structure) = &group.structure {
                output.push_str(&format!(
                    "     {}{} [lines {}-{}]{}\n",
                    t.detail, structure.signature, structure.start_line, structure.end_line, t.reset
                ));
            }
        }

        let mut changes_by_line: BTreeMap<u32, Vec<&Change>> = BTreeMap::new();
        for change in &group.changes {
            changes_by_line
                .entry(change.line_number())
                .or_default()
                .push(change);
        }

        let mut lines_to_display = BTreeSet::new();
        for &line in changes_by_line.keys() {
            lines_to_display.insert(line);
            for offset in 1..=self.config.context_lines {
                if line > offset {
                    lines_to_display.insert(line - offset);
                }
                lines_to_display.insert(line.saturating_add(offset));
            }
        }

        let mut previous: Option<u32> = None;
        for line in lines_to_display {
            if let Some(previous) = previous {
                if line - previous >= self.config.min_gap_for_ellipsis {
                    output.push_str(&format!("     {}     ...{}\n", t.counts, t.reset));
                }
            }
            previous = Some(line);

            match changes_by_line.get(&line) {
                Some(changes) => {
                    for change in changes {
                        self.render_change(output, change);
                    }
                }
                None => {
                    let Some(content) = (line as usize)
                        .checked_sub(1)
                        .and_then(|index| source_lines.get(index))
                    else {
                        continue;
                    };
                    output.push_str(&format!(
                        "     {}{:4}   {}{}\n",
                        t.context_line,
                        line,
                        content.trim_end(),
                        t.reset
                    ));
                }
            }
        }
    }

    fn render_change(&self, output: &mut String, change: &Change) {
        let t = &self.theme;
        let content = change.event.content.trim_end();
        let line = change.line_number();

        let color = match change.kind() {
            ChangeKind::Addition => &t.added_line,
            ChangeKind::Deletion => &t.removed_line,
            ChangeKind::Context => {
                output.push_str(&format!(
                    "     {}{:4}   {}{}\n",
                    t.context_line, line, content, t.reset
                ));
                return;
            }
        };

        output.push_str(&format!(
            "     {}{:4} {}{} {}{}\n",
            t.context_line,
            line,
            color,
            change.kind().marker(),
            content,
            t.reset
        ));
    }

    /// 渲染修改最多的结构统计
    pub fn render_statistics(&self, result: &AnalysisResult) -> String {
        let mut output = String::new();
        let t = &self.theme;
        let limit = self.config.top_structures_limit;

        self.push_banner(&mut output, "Statistics");
        output.push_str(&format!(
            "{}Top {} Most Modified Structures:{}\n\n",
            t.summary, limit, t.reset
        ));

        for (rank, stat) in result.top_structures(limit).iter().enumerate() {
            output.push_str(&format!(
                "  {:2}. {}{:3} lines{} | {}\n",
                rank + 1,
                t.counts,
                stat.changes,
                t.reset,
                stat.full_path
            ));
        }
        output.push('\n');

        output
    }

    /// 渲染为 JSON 格式
    fn render_json(&self, result: &AnalysisResult, metadata: &OutputMetadata) -> Result<String> {
        let report = JsonReport {
            metadata,
            files: &result.files,
            top_structures: self
                .config
                .show_statistics
                .then(|| result.top_structures(self.config.top_structures_limit)),
        };
        Ok(serde_json::to_string_pretty(&report)?)
    }

    /// 生成元数据
    fn generate_metadata(&self, result: &AnalysisResult) -> OutputMetadata {
        OutputMetadata {
            files_count: result.files.len(),
            total_changes: result.total_changes(),
            additions: result.total_additions(),
            deletions: result.total_deletions(),
            generated_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl FormattedOutput {
    /// 保存到文件
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<()> {
        std::fs::write(path, &self.content)?;
        Ok(())
    }

    /// 检查是否为空
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}
