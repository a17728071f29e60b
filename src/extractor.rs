//! 翻译单元提取
//!
//! 按字段定义遍历文档片段，把可翻译字段中的单元连同来源位置加入翻译记忆；
//! 流式字段递归进入每个区块，区块名作为新的区域名。

// 第三方crate导入
use tracing::debug;

// 本地模块导入
use crate::memory::TranslationMemory;
use crate::schema::{Field, FieldType, ModelRegistry};
use crate::segmenter::{parse_flow_blocks, tokenize, Sections, StructureIssue};
use crate::units::{split_units, TranslationMode};

/// 单元所在文档的上下文
#[derive(Debug, Clone)]
pub struct DocumentContext<'a> {
    /// 文档的绝对地址（站点地址 + 页面路径）
    pub url: String,
    /// 文档文件相对于项目根目录的路径
    pub relative_path: &'a str,
    /// 文档的语言变体，`None` 表示主版本
    pub alt: Option<&'a str>,
}

impl DocumentContext<'_> {
    /// 来源位置: `<url> (<路径>:<区域>.<字段>)`
    pub fn location(&self, zone: &str, field: &str) -> String {
        format!("{} ({}:{}.{})", self.url, self.relative_path, zone, field)
    }
}

/// 翻译单元提取器
pub struct Extractor<'a> {
    registry: &'a ModelRegistry,
    mode: TranslationMode,
    content_language: &'a str,
}

impl<'a> Extractor<'a> {
    pub fn new(
        registry: &'a ModelRegistry,
        mode: TranslationMode,
        content_language: &'a str,
    ) -> Self {
        Self {
            registry,
            mode,
            content_language,
        }
    }

    /// 只从主版本或源语言版本中提取，已翻译的版本不参与
    fn is_source_variant(&self, document: &DocumentContext<'_>) -> bool {
        match document.alt {
            None => true,
            Some(alt) => alt == self.content_language,
        }
    }

    /// 提取一组字段中的翻译单元，返回提交给翻译记忆的单元数量
    pub fn extract(
        &self,
        fields: &[Field],
        sections: &Sections,
        document: &DocumentContext<'_>,
        zone: &str,
        memory: &mut TranslationMemory,
    ) -> usize {
        let mut added = 0;

        for field in fields {
            let Some(section) = sections.get(&field.name) else {
                continue;
            };

            if field.is_translatable() && self.is_source_variant(document) {
                let location = document.location(zone, &field.name);
                for unit in split_units(&section.lines, self.mode) {
                    memory.add(&unit.text, &location);
                    added += 1;
                }
            }

            if let FieldType::Flow { .. } = field.field_type {
                for block in parse_flow_blocks(&section.lines).blocks {
                    let Some(model) = self.registry.flowblock(&block.name) else {
                        continue;
                    };
                    let block_sections = tokenize(&block.lines);
                    debug!(
                        "进入流式区块 {} ({}:{})",
                        block.name,
                        document.relative_path,
                        block.marker_line + 1
                    );
                    added +=
                        self.extract(&model.fields, &block_sections, document, &block.name, memory);
                }
            }
        }

        added
    }

    /// 检查各层流式字段的结构，返回被跳过的内容
    pub fn check_structure(&self, fields: &[Field], sections: &Sections) -> Vec<StructureIssue> {
        let mut issues = Vec::new();
        for field in fields {
            if !matches!(field.field_type, FieldType::Flow { .. }) {
                continue;
            }
            let Some(section) = sections.get(&field.name) else {
                continue;
            };
            let flow = parse_flow_blocks(&section.lines);
            issues.extend(flow.issues);
            for block in flow.blocks {
                if let Some(model) = self.registry.flowblock(&block.name) {
                    issues.extend(self.check_structure(&model.fields, &tokenize(&block.lines)));
                }
            }
        }
        issues
    }
}
