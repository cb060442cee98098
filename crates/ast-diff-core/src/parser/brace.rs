//! 花括号匹配
//!
//! 为只知道起始行的声明推算结束行。这是一个近似算法：
//! 不识别跨行字符串、文本块、字符字面量和块注释中的花括号。

/// 未能配平时，从起始行向后估算的行数
pub const FALLBACK_END_LINE_ESTIMATE: u32 = 100;

/// 从 `start_line`（从 1 开始）向前扫描，返回配平花括号所在的行
///
/// 扫描规则：
/// - 未转义的双引号切换字符串状态，字符串状态在每个物理行开头重置
/// - 字符串外的 `//` 忽略该行剩余部分
/// - `{` 计数加一并标记已打开，`}` 计数减一，已打开且计数归零时即为结束行
///
/// 到达文件末尾仍未配平时，结束行为 `start_line + 100` 与文件最后一行中较小者，且不小于起始行
pub fn find_block_end(source: &str, start_line: u32) -> u32 {
    let lines: Vec<&str> = source.lines().collect();
    let total_lines = lines.len() as u32;
    let start_index = start_line.saturating_sub(1) as usize;

    let mut depth: i64 = 0;
    let mut opened = false;

    for (offset, line) in lines.iter().enumerate().skip(start_index) {
        let mut in_string = false;
        let mut previous: Option<char> = None;
        let mut chars = line.chars().peekable();

        while let Some(ch) = chars.next() {
            if ch == '"' && previous != Some('\\') {
                in_string = !in_string;
            }
            previous = Some(ch);

            if in_string {
                continue;
            }

            match ch {
                '/' if chars.peek() == Some(&'/') => break,
                '{' => {
                    depth += 1;
                    opened = true;
                }
                '}' => {
                    depth -= 1;
                    if opened && depth == 0 {
                        return offset as u32 + 1;
                    }
                }
                _ => {}
            }
        }
    }

    fallback_end_line(start_line, total_lines)
}

fn fallback_end_line(start_line: u32, total_lines: u32) -> u32 {
    start_line
        .saturating_add(FALLBACK_END_LINE_ESTIMATE)
        .min(total_lines)
        .max(start_line)
}
