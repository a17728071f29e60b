//! 内容文档分段模块
//!
//! 将 `contents.lr` 格式的原始文本切分为有序的 `(字段名, 值行)` 片段，
//! 并识别流式区块标记。
//!
//! 每一行都记录它在原始文档中的行号和文本起始偏移，重写阶段据此把译文
//! 拼接回原始字节，不触碰分隔线、空行和区块标记。
//!
//! 嵌套层级通过转义表示：在任一层级，`---` 分隔字段、4个井号的标记开启区块；
//! 更长的横线行和井号标记属于更深的层级，交给下一层时各去掉一个字符。

// 标准库导入
use std::fmt;

// 第三方crate导入
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

// 本地模块导入
use crate::constants::format::{BLOCK_MARKER_HASHES, FIELD_SEPARATOR};

static KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([a-zA-Z0-9._-]+):").expect("字段行正则表达式无效"));

static MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(#{4,})\s*([^#]*?)\s*(#{4,})\s*$").expect("区块标记正则表达式无效")
});

/// 按原始字节切分的文档行（每行保留自身的换行符）
#[derive(Debug, Clone)]
pub struct DocumentLines<'a> {
    lines: Vec<&'a str>,
}

impl<'a> DocumentLines<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.split_inclusive('\n').collect(),
        }
    }

    /// 顶层视图：每行文本去掉行尾换行符
    pub fn views(&self) -> Vec<LineView> {
        self.lines
            .iter()
            .enumerate()
            .map(|(index, raw)| LineView {
                index,
                offset: 0,
                text: strip_line_ending(raw).to_string(),
            })
            .collect()
    }

    /// 获取第 `index` 行的原始内容（含换行符）
    pub fn raw(&self, index: usize) -> &'a str {
        self.lines[index]
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.lines.iter().copied()
    }
}

/// 某一嵌套层级上看到的一行
///
/// `text` 是该层级反转义后的内容；`offset` 是 `text` 在原始行中的起始字节，
/// 对于 `title: Hello` 这样的行内值，偏移指向冒号后的值部分。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineView {
    pub index: usize,
    pub offset: usize,
    pub text: String,
}

impl LineView {
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// 结构行（横线行或区块标记）永远不参与翻译
    pub fn is_structural(&self) -> bool {
        line_is_dashes(&self.text) || flow_marker(&self.text).is_some()
    }
}

/// 一个字段的原始值
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub key: String,
    /// 字段行所在的原始行号
    pub key_line: usize,
    pub lines: Vec<LineView>,
}

impl Section {
    /// 按 `\n` 拼接的字段值
    pub fn value_text(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// 字段名到字段值的有序映射，重复字段以最后一次出现为准
pub type Sections = IndexMap<String, Section>;

/// 流式区块：标记行之后、下一个同级标记之前的内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowBlock {
    pub name: String,
    /// 区块标记所在的原始行号
    pub marker_line: usize,
    pub lines: Vec<LineView>,
}

/// 去掉行尾的 `\r` 与 `\n`
pub fn strip_line_ending(raw: &str) -> &str {
    raw.trim_end_matches(['\n', '\r'])
}

/// 判断是否为至少3个横线组成的行
pub fn line_is_dashes(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.len() >= 3 && trimmed.chars().all(|c| c == '-')
}

/// 解析区块标记行，返回 `(井号数量, 区块名)`
///
/// 两侧井号数量必须相等且不少于4个，否则不是标记行。
pub fn flow_marker(text: &str) -> Option<(usize, &str)> {
    let captures = MARKER_RE.captures(text)?;
    let opening = captures.get(1)?.as_str().len();
    let closing = captures.get(3)?.as_str().len();
    if opening != closing {
        return None;
    }
    Some((opening, captures.get(2)?.as_str()))
}

/// 将行序列切分为字段片段
///
/// 键行形如 `name:`，冒号后的内容（去掉空格和制表符）作为第一行值；
/// 若冒号后为空，则紧随其后的第一个空行被跳过。`---` 结束当前字段。
/// 不属于任何字段且不是键行的内容会被忽略，不会报错。
pub fn tokenize(lines: &[LineView]) -> Sections {
    let mut sections = Sections::new();
    let mut current: Option<Section> = None;
    let mut want_newline = false;

    for line in lines {
        if line.text.trim() == FIELD_SEPARATOR {
            want_newline = false;
            if let Some(section) = current.take() {
                finish_section(&mut sections, section);
            }
            continue;
        }

        if let Some(section) = current.as_mut() {
            if want_newline {
                want_newline = false;
                if line.is_blank() {
                    continue;
                }
            }
            section.lines.push(line.clone());
            continue;
        }

        let Some(captures) = KEY_RE.captures(&line.text) else {
            if !line.is_blank() {
                debug!("忽略字段之外的内容: 第{}行", line.index + 1);
            }
            continue;
        };

        let key_end = captures.get(0).map_or(0, |m| m.end());
        let rest = &line.text[key_end..];
        let first_bit = rest.trim_start_matches([' ', '\t']);

        let mut section = Section {
            key: captures[1].to_string(),
            key_line: line.index,
            lines: Vec::new(),
        };

        if first_bit.trim().is_empty() {
            want_newline = true;
        } else {
            section.lines.push(LineView {
                index: line.index,
                offset: line.offset + (line.text.len() - first_bit.len()),
                text: first_bit.to_string(),
            });
        }
        current = Some(section);
    }

    if let Some(section) = current.take() {
        finish_section(&mut sections, section);
    }

    sections
}

/// 字段值中的横线行是转义过的，去掉一个横线
fn finish_section(sections: &mut Sections, mut section: Section) {
    for line in section.lines.iter_mut() {
        if line_is_dashes(&line.text) {
            if let Some(pos) = line.text.find('-') {
                line.text.remove(pos);
            }
        }
    }
    sections.insert(section.key.clone(), section);
}

/// 流式字段中的结构问题，`line` 为原始行号（从0开始）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureIssue {
    /// 第一个区块之前的非空内容
    StrayContent { line: usize },
    /// 井号数量不属于当前层级的区块标记
    MismatchedMarker { line: usize },
}

impl fmt::Display for StructureIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructureIssue::StrayContent { line } => write!(f, "第{}行: 区块之外的内容", line + 1),
            StructureIssue::MismatchedMarker { line } => write!(f, "第{}行: 区块标记层级不匹配", line + 1),
        }
    }
}

/// 流式字段的切分结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowBlocks {
    pub blocks: Vec<FlowBlock>,
    /// 被跳过的内容
    pub issues: Vec<StructureIssue>,
}

/// 把流式字段的值切分为区块
///
/// 第一个区块之前的空行被忽略；第一个区块之前的非空内容不属于任何区块，
/// 跳过并记入 `issues`。更深层级的标记（井号多于4个）去掉一层转义后归入当前区块。
pub fn parse_flow_blocks(lines: &[LineView]) -> FlowBlocks {
    let mut flow = FlowBlocks::default();
    let mut current: Option<FlowBlock> = None;

    for line in lines {
        if current.is_none() && line.is_blank() {
            continue;
        }

        match flow_marker(&line.text) {
            Some((hashes, name)) if hashes == BLOCK_MARKER_HASHES => {
                if let Some(block) = current.take() {
                    flow.blocks.push(block);
                }
                current = Some(FlowBlock {
                    name: name.to_string(),
                    marker_line: line.index,
                    lines: Vec::new(),
                });
            }
            Some(_) => match current.as_mut() {
                Some(block) => block.lines.push(unescape_marker(line)),
                None => {
                    debug!("区块标记层级不匹配: 第{}行", line.index + 1);
                    flow.issues.push(StructureIssue::MismatchedMarker { line: line.index });
                }
            },
            None => match current.as_mut() {
                Some(block) => block.lines.push(line.clone()),
                None => {
                    debug!("流式字段中存在区块之外的内容: 第{}行", line.index + 1);
                    flow.issues.push(StructureIssue::StrayContent { line: line.index });
                }
            },
        }
    }

    if let Some(block) = current.take() {
        flow.blocks.push(block);
    }

    flow
}

/// 去掉标记两侧各一个井号
fn unescape_marker(line: &LineView) -> LineView {
    let body = line.text.trim_end();
    let trailing = &line.text[body.len()..];
    let inner = &body[1..body.len() - 1];
    LineView {
        index: line.index,
        offset: line.offset,
        text: format!("{}{}", inner, trailing),
    }
}
