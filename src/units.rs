//! 翻译单元切分
//!
//! 行模式下每个非空行是一个单元，行首的Markdown标题/列表标记不参与比较；
//! 段落模式下连续的非空行组成一个单元，不去除任何前缀。

// 第三方crate导入
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

// 本地模块导入
use crate::segmenter::LineView;

static PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:#+|[*+-])\s+").expect("前缀正则表达式无效"));

/// 翻译粒度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationMode {
    /// 逐行翻译
    #[default]
    Line,
    /// 逐段翻译
    Paragraph,
}

impl TranslationMode {
    pub fn from_paragraphwise(paragraphwise: bool) -> Self {
        if paragraphwise {
            TranslationMode::Paragraph
        } else {
            TranslationMode::Line
        }
    }
}

/// 一个待翻译单元及其在文档中占据的行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    /// 去掉首尾空白（行模式下还去掉了前缀）的文本
    pub text: String,
    pub spans: Vec<LineView>,
    /// 文本在首行原始内容中的起始字节
    pub start: usize,
    /// 文本在末行原始内容中的结束字节
    pub end: usize,
}

/// 按翻译粒度切分字段值
pub fn split_units(lines: &[LineView], mode: TranslationMode) -> Vec<Unit> {
    match mode {
        TranslationMode::Line => split_lines(lines),
        TranslationMode::Paragraph => split_paragraphs(lines),
    }
}

/// 去掉行首的标题或列表标记
pub fn strip_prefix(text: &str) -> &str {
    match PREFIX_RE.find(text) {
        Some(m) => &text[m.end()..],
        None => text,
    }
}

fn split_lines(lines: &[LineView]) -> Vec<Unit> {
    lines
        .iter()
        .filter(|line| !line.is_blank() && !line.is_structural())
        .filter_map(|line| {
            let rest = strip_prefix(&line.text).trim_start();
            let text = rest.trim_end();
            if text.is_empty() {
                return None;
            }
            let start = line.offset + line.text.len() - rest.len();
            Some(Unit {
                text: text.to_string(),
                spans: vec![line.clone()],
                start,
                end: start + text.len(),
            })
        })
        .collect()
}

fn split_paragraphs(lines: &[LineView]) -> Vec<Unit> {
    let mut units = Vec::new();
    let mut group: Vec<LineView> = Vec::new();

    for line in lines {
        if line.is_blank() || line.is_structural() {
            flush_paragraph(&mut units, &mut group);
        } else {
            group.push(line.clone());
        }
    }
    flush_paragraph(&mut units, &mut group);

    units
}

fn flush_paragraph(units: &mut Vec<Unit>, group: &mut Vec<LineView>) {
    if group.is_empty() {
        return;
    }
    let spans = std::mem::take(group);
    let joined = spans
        .iter()
        .map(|line| line.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    let text = joined.trim();
    if text.is_empty() {
        return;
    }
    let (Some(first), Some(last)) = (spans.first(), spans.last()) else {
        return;
    };
    let start = first.offset + first.text.len() - first.text.trim_start().len();
    let end = last.offset + last.text.trim_end().len();
    units.push(Unit {
        text: text.to_string(),
        start,
        end,
        spans,
    });
}
