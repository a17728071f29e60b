//! 文档重写
//!
//! 在原始文档字节上按行替换译文，分隔线、空行、区块标记和不翻译的字段保持原样。
//! 译文与原文相同的单元不产生任何修改，因此恒等目录会逐字节还原原文。

// 标准库导入
use std::collections::BTreeMap;

// 第三方crate导入
use tracing::debug;

// 本地模块导入
use crate::schema::{Field, FieldType, ModelRegistry};
use crate::segmenter::{parse_flow_blocks, tokenize, DocumentLines, Sections};
use crate::translator::Translate;
use crate::units::{split_units, TranslationMode, Unit};

/// 针对原始行的修改集合
struct LineEdits<'a> {
    document: &'a DocumentLines<'a>,
    replaced: BTreeMap<usize, String>,
}

impl<'a> LineEdits<'a> {
    fn new(document: &'a DocumentLines<'a>) -> Self {
        Self {
            document,
            replaced: BTreeMap::new(),
        }
    }

    /// 把单元的译文拼接回它占据的原始行
    ///
    /// 首行 `start` 之前（缩进、列表或标题标记）和末行 `end` 之后（尾随空白、换行符）原样保留。
    fn apply(&mut self, unit: &Unit, translated: &str) {
        let (Some(first), Some(last)) = (unit.spans.first(), unit.spans.last()) else {
            return;
        };

        let head = &self.document.raw(first.index)[..unit.start];
        let tail = &self.document.raw(last.index)[unit.end..];
        self.replaced.insert(first.index, format!("{}{}{}", head, translated, tail));
        for span in &unit.spans[1..] {
            if span.index != first.index {
                self.replaced.insert(span.index, String::new());
            }
        }
    }

    fn render(&self) -> String {
        self.document
            .iter()
            .enumerate()
            .map(|(index, raw)| self.replaced.get(&index).map_or(raw, String::as_str))
            .collect()
    }

    fn count(&self) -> usize {
        self.replaced.len()
    }
}

/// 文档重写器
pub struct Rewriter<'a> {
    registry: &'a ModelRegistry,
    mode: TranslationMode,
}

impl<'a> Rewriter<'a> {
    pub fn new(registry: &'a ModelRegistry, mode: TranslationMode) -> Self {
        Self { registry, mode }
    }

    /// 用给定的翻译目录重写整篇文档
    pub fn rewrite(
        &self,
        fields: &[Field],
        raw_document: &str,
        translator: &dyn Translate,
    ) -> String {
        let document = DocumentLines::new(raw_document);
        let mut edits = LineEdits::new(&document);
        let sections = tokenize(&document.views());

        self.rewrite_fields(fields, &sections, translator, &mut edits, 0);
        debug!("重写完成，修改 {} 行", edits.count());

        edits.render()
    }

    fn rewrite_fields(
        &self,
        fields: &[Field],
        sections: &Sections,
        translator: &dyn Translate,
        edits: &mut LineEdits<'_>,
        depth: usize,
    ) {
        for field in fields {
            let Some(section) = sections.get(&field.name) else {
                continue;
            };

            match &field.field_type {
                FieldType::Flow { .. } => {
                    for block in parse_flow_blocks(&section.lines).blocks {
                        let Some(model) = self.registry.flowblock(&block.name) else {
                            continue;
                        };
                        debug!("重写流式区块 {} (深度 {})", block.name, depth);
                        let block_sections = tokenize(&block.lines);
                        self.rewrite_fields(
                            &model.fields,
                            &block_sections,
                            translator,
                            edits,
                            depth + 1,
                        );
                    }
                }
                FieldType::Scalar(_) if field.is_translatable() => {
                    for unit in split_units(&section.lines, self.mode) {
                        let translated = translator.translate(&unit.text);
                        if translated != unit.text {
                            edits.apply(&unit, &translated);
                        }
                    }
                }
                FieldType::Scalar(_) => {}
            }
        }
    }
}
