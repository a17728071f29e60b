//! 翻译记忆
//!
//! 记录所有待翻译单元及其来源位置，单元和位置都保持首次出现的顺序且不重复。
//! 分析阶段写入，构建结束时渲染为POT模板；重写阶段不会修改它。

// 标准库导入
use std::fs;
use std::path::Path;

// 第三方crate导入
use indexmap::{IndexMap, IndexSet};
use tracing::{debug, info};

// 本地模块导入
use crate::constants::memory::{LOG_TRUNCATE_LENGTH, POT_HEADER};
use crate::error::Result;
use crate::i18n_error;
use crate::utils::truncate;

/// 翻译记忆：单元 -> 有序的来源位置集合
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TranslationMemory {
    translations: IndexMap<String, IndexSet<String>>,
}

impl TranslationMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加一个单元及其来源位置
    ///
    /// 单元先去掉首尾空白；已存在的单元只追加新的位置。
    /// 返回该单元是否为首次加入。
    pub fn add(&mut self, unit: &str, location: &str) -> bool {
        let unit = unit.trim();
        if unit.is_empty() {
            return false;
        }

        let is_new = !self.translations.contains_key(unit);
        let locations = self.translations.entry(unit.to_string()).or_default();
        if is_new {
            debug!("加入翻译记忆: {}", truncate(unit, LOG_TRUNCATE_LENGTH));
        }
        locations.insert(location.to_string());
        is_new
    }

    pub fn len(&self) -> usize {
        self.translations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.translations.is_empty()
    }

    /// 某个单元的所有来源位置
    pub fn locations(&self, unit: &str) -> Option<impl Iterator<Item = &str>> {
        self.translations
            .get(unit.trim())
            .map(|set| set.iter().map(String::as_str))
    }

    /// 按加入顺序遍历单元
    pub fn units(&self) -> impl Iterator<Item = &str> {
        self.translations.keys().map(String::as_str)
    }

    /// 来源位置总数
    pub fn location_count(&self) -> usize {
        self.translations.values().map(IndexSet::len).sum()
    }

    /// 渲染POT模板
    pub fn render_template(&self, source_language: &str) -> String {
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M%z").to_string();
        self.render_template_at(source_language, &now)
    }

    /// 使用给定的生成时间渲染POT模板
    pub fn render_template_at(&self, source_language: &str, now: &str) -> String {
        let mut result = POT_HEADER
            .replace("{now}", now)
            .replace("{language}", source_language);

        for (unit, locations) in &self.translations {
            let sources = locations.iter().map(String::as_str).collect::<Vec<_>>();
            result.push_str(&format!("#: {}\n", sources.join(" ")));
            result.push_str(&format!("msgid \"{}\"\n", escape_po(unit)));
            result.push_str("msgstr \"\"\n\n");
        }
        result
    }

    /// 写出POT模板（整体替换目标文件）
    pub fn write_template(&self, path: &Path, source_language: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| i18n_error!(file_op, parent.display(), "创建目录", e))?;
        }
        fs::write(path, self.render_template(source_language))
            .map_err(|e| i18n_error!(file_op, path.display(), "写入", e))?;
        info!("📝 翻译模板已生成: {} ({} 个条目)", path.display(), self.len());
        Ok(())
    }
}

/// 转义PO字符串中的控制字符
pub fn escape_po(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            '\r' => escaped.push_str("\\r"),
            other => escaped.push(other),
        }
    }
    escaped
}
