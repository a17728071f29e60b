//! 翻译目录工具
//!
//! 合并模板、初始化或更新各语言的PO文件，并编译为MO文件供重写阶段使用。

// 标准库导入
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

// 第三方crate导入
use polib::catalog::Catalog;
use polib::message::{Message, MessageView};
use polib::metadata::CatalogMetadata;
use polib::{mo_file, po_file};
use tracing::{debug, info, warn};

// 本地模块导入
use crate::constants::memory::REQUIRED_HEADER_KEYS;
use crate::constants::naming::PO_FILENAME_PREFIX;
use crate::error::Result;
use crate::i18n_error;
use crate::translator::compiled_catalog_path;

fn context_of(message: &dyn MessageView) -> Option<&str> {
    Some(message.msgctxt()).filter(|ctxt| !ctxt.is_empty())
}

fn plural_of(message: &dyn MessageView) -> Option<&str> {
    if message.is_plural() {
        message.msgid_plural().ok()
    } else {
        None
    }
}

fn contains(catalog: &Catalog, message: &dyn MessageView) -> bool {
    catalog
        .find_message(context_of(message), message.msgid(), plural_of(message))
        .is_some()
}

/// 以 `template` 的原文和来源位置、`translated` 的译文和标记构造新条目
fn merged_message(template: &dyn MessageView, translated: &dyn MessageView) -> Message {
    if template.is_plural() {
        Message::build_plural()
            .with_msgctxt(template.msgctxt().to_string())
            .with_msgid(template.msgid().to_string())
            .with_msgid_plural(plural_of(template).unwrap_or_default().to_string())
            .with_msgstr_plural(translated.msgstr_plural().cloned().unwrap_or_default())
            .with_source(template.source().to_string())
            .with_comments(translated.comments().to_string())
            .with_flags(translated.flags().clone())
            .done()
    } else {
        Message::build_singular()
            .with_msgctxt(template.msgctxt().to_string())
            .with_msgid(template.msgid().to_string())
            .with_msgstr(translated.msgstr().unwrap_or_default().to_string())
            .with_source(template.source().to_string())
            .with_comments(translated.comments().to_string())
            .with_flags(translated.flags().clone())
            .done()
    }
}

fn owned_message(message: &dyn MessageView) -> Message {
    merged_message(message, message)
}

/// 头部缺少的第一个必需字段
fn missing_header_key(content: &str) -> Option<&'static str> {
    let present: HashSet<&str> = content
        .lines()
        .filter_map(|line| line.trim_start().trim_start_matches('"').split_once(':'))
        .map(|(key, _)| key.trim())
        .collect();
    REQUIRED_HEADER_KEYS
        .iter()
        .copied()
        .find(|key| !present.contains(key))
}

fn parse_catalog(path: &Path) -> Result<Catalog> {
    let content = fs::read_to_string(path)
        .map_err(|e| i18n_error!(file_op, path.display(), "读取", e))?;
    // 头部字段不全时 polib 会直接 panic
    if let Some(key) = missing_header_key(&content) {
        return Err(i18n_error!(catalog, path.display(), format!("文件头部缺少 {} 字段", key)));
    }
    po_file::parse(path).map_err(|e| i18n_error!(catalog, path.display(), e))
}

fn write_catalog(catalog: &Catalog, path: &Path) -> Result<()> {
    po_file::write(catalog, path).map_err(|e| i18n_error!(file_op, path.display(), "写入", e))
}

/// 合并多个模板，重复条目以先出现的为准
///
/// 不存在的输入被跳过；第一个存在的输入提供模板头部。返回合并后的条目数。
pub fn merge_templates(inputs: &[PathBuf], output: &Path) -> Result<usize> {
    let mut merged: Option<Catalog> = None;

    for input in inputs {
        if !input.is_file() {
            debug!("模板不存在，跳过合并: {}", input.display());
            continue;
        }
        let mut catalog = parse_catalog(input)?;

        match merged.as_mut() {
            None => {
                let metadata = std::mem::replace(&mut catalog.metadata, CatalogMetadata::new());
                let mut first = Catalog::new(metadata);
                for message in catalog.messages() {
                    first.append_or_update(owned_message(message));
                }
                merged = Some(first);
            }
            Some(target) => {
                for message in catalog.messages() {
                    if !contains(target, message) {
                        target.append_or_update(owned_message(message));
                    }
                }
            }
        }
    }

    let Some(merged) = merged else {
        return Err(i18n_error!(catalog, output.display(), "没有可合并的模板"));
    };
    write_catalog(&merged, output)?;
    debug!("已合并 {} 个模板到 {} ({} 个条目)", inputs.len(), output.display(), merged.count());
    Ok(merged.count())
}

/// 某语言PO文件的生成结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogUpdate {
    /// 新建的PO文件
    Created,
    /// 在已有PO文件基础上更新
    Updated,
}

/// 单一语言的PO文件
#[derive(Debug, Clone)]
pub struct PoFile {
    language: String,
    i18n_path: PathBuf,
}

impl PoFile {
    pub fn new(language: &str, i18n_path: impl Into<PathBuf>) -> Self {
        Self {
            language: language.to_string(),
            i18n_path: i18n_path.into(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// `<i18npath>/contents+<lang>.po`
    pub fn path(&self) -> PathBuf {
        self.i18n_path
            .join(format!("{}{}.po", PO_FILENAME_PREFIX, self.language))
    }

    pub fn exists(&self) -> bool {
        self.path().is_file()
    }

    pub fn backup_path(&self) -> PathBuf {
        let mut name = self.path().into_os_string();
        name.push("~");
        PathBuf::from(name)
    }

    pub fn compiled_path(&self) -> PathBuf {
        compiled_catalog_path(&self.i18n_path, &self.language)
    }

    /// 由模板生成PO文件并编译
    ///
    /// 已有PO文件时保留其中的译文（先备份为 `~` 文件），条目以模板为准；
    /// 否则以模板初始化。随后把已翻译且非模糊的条目编译到MO文件。
    pub fn generate(&self, template_path: &Path) -> Result<CatalogUpdate> {
        let mut template = parse_catalog(template_path)?;
        let path = self.path();

        let (catalog, outcome) = if self.exists() {
            let mut existing = parse_catalog(&path)?;
            fs::copy(&path, self.backup_path())
                .map_err(|e| i18n_error!(file_op, path.display(), "备份", e))?;

            let mut metadata = std::mem::replace(&mut existing.metadata, CatalogMetadata::new());
            metadata.pot_creation_date = template.metadata.pot_creation_date.clone();

            let mut catalog = Catalog::new(metadata);
            for message in template.messages() {
                let previous = existing
                    .find_message(context_of(message), message.msgid(), plural_of(message))
                    .filter(|previous| previous.is_translated());
                catalog.append_or_update(match previous {
                    Some(previous) => merged_message(message, previous),
                    None => owned_message(message),
                });
            }
            (catalog, CatalogUpdate::Updated)
        } else {
            let mut metadata = std::mem::replace(&mut template.metadata, CatalogMetadata::new());
            metadata.language = self.language.clone();

            let mut catalog = Catalog::new(metadata);
            for message in template.messages() {
                catalog.append_or_update(owned_message(message));
            }
            (catalog, CatalogUpdate::Created)
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| i18n_error!(file_op, parent.display(), "创建目录", e))?;
        }
        write_catalog(&catalog, &path)?;
        match outcome {
            CatalogUpdate::Created => info!("🆕 已初始化 {} 的翻译文件: {}", self.language, path.display()),
            CatalogUpdate::Updated => info!("🔄 已更新 {} 的翻译文件: {}", self.language, path.display()),
        }

        self.compile()?;
        Ok(outcome)
    }

    /// 把PO文件中已翻译且非模糊的条目编译为MO文件，返回编译的条目数
    pub fn compile(&self) -> Result<usize> {
        let mut source = parse_catalog(&self.path())?;
        let metadata = std::mem::replace(&mut source.metadata, CatalogMetadata::new());

        let mut compiled = Catalog::new(metadata);
        for message in source.messages() {
            if message.is_translated() && !message.flags().is_fuzzy() {
                compiled.append_or_update(owned_message(message));
            }
        }

        let target = self.compiled_path();
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| i18n_error!(file_op, parent.display(), "创建目录", e))?;
        }
        mo_file::write(&compiled, &target)
            .map_err(|e| i18n_error!(file_op, target.display(), "写入", e))?;

        debug!("已编译 {} 的翻译目录: {} 个条目", self.language, compiled.count());
        Ok(compiled.count())
    }
}

/// 运行外部模板提取命令
///
/// 命令中的 `{output}` 被替换为输出文件路径，在 `cwd` 下执行。
pub fn run_template_extractor(command: &str, output: &Path, cwd: &Path) -> Result<()> {
    let output_arg = output.to_string_lossy();
    let mut parts = command
        .split_whitespace()
        .map(|part| part.replace("{output}", &output_arg));

    let Some(program) = parts.next() else {
        return Err(i18n_error!(config, "template_extractor", "命令为空"));
    };
    let args: Vec<String> = parts.collect();
    debug!("模板提取命令: {} {}", program, args.join(" "));

    let result = Command::new(&program)
        .args(&args)
        .current_dir(cwd)
        .output()
        .map_err(|e| i18n_error!(tool, program, e))?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        warn!("⚠️  模板提取命令退出码异常: {}", result.status);
        return Err(i18n_error!(tool, program, stderr.trim()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::TranslationMemory;
    use crate::translator::{LanguageCatalog, Translate};

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("content-i18n-catalog-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn template(dir: &Path, units: &[&str]) -> PathBuf {
        let mut memory = TranslationMemory::new();
        for unit in units {
            memory.add(unit, "http://localhost/ (content/contents.lr:page.title)");
        }
        let path = dir.join("contents.pot");
        memory.write_template(&path, "en").unwrap();
        path
    }

    fn translate_in_place(path: &Path, msgid: &str, msgstr: &str) {
        let mut catalog = po_file::parse(path).unwrap();
        catalog.append_or_update(
            Message::build_singular()
                .with_msgid(msgid.to_string())
                .with_msgstr(msgstr.to_string())
                .done(),
        );
        po_file::write(&catalog, path).unwrap();
    }

    #[test]
    fn test_po_file_paths() {
        let po = PoFile::new("fr", "i18n");
        assert_eq!(po.path(), PathBuf::from("i18n/contents+fr.po"));
        assert_eq!(po.backup_path(), PathBuf::from("i18n/contents+fr.po~"));
        assert_eq!(po.compiled_path(), PathBuf::from("i18n/_compiled/fr/LC_MESSAGES/contents.mo"));
    }

    #[test]
    fn test_generate_initializes_then_updates() {
        let dir = scratch("generate");
        let pot = template(&dir, &["Hello", "World"]);
        let po = PoFile::new("fr", &dir);

        assert_eq!(po.generate(&pot).unwrap(), CatalogUpdate::Created);
        assert!(po.exists());
        assert!(po.compiled_path().is_file());
        let created = po_file::parse(&po.path()).unwrap();
        assert_eq!(created.metadata.language, "fr");
        assert_eq!(created.count(), 2);

        translate_in_place(&po.path(), "Hello", "Bonjour");
        let pot = template(&dir, &["Hello", "Goodbye"]);
        assert_eq!(po.generate(&pot).unwrap(), CatalogUpdate::Updated);
        assert!(po.backup_path().is_file());

        let updated = po_file::parse(&po.path()).unwrap();
        assert_eq!(updated.count(), 2);
        let hello = updated.find_message(None, "Hello", None).unwrap();
        assert_eq!(hello.msgstr().unwrap(), "Bonjour");
        assert!(updated.find_message(None, "World", None).is_none());

        let catalog = LanguageCatalog::load(&dir, "fr");
        assert!(catalog.is_compiled());
        assert_eq!(catalog.translate("Hello"), "Bonjour");
        assert_eq!(catalog.translate("Goodbye"), "Goodbye");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_merge_templates_first_wins() {
        let dir = scratch("merge");
        let first = template(&dir, &["Hello", "Shared"]);
        let second_dir = dir.join("extra");
        fs::create_dir_all(&second_dir).unwrap();
        let second = template(&second_dir, &["Shared", "Footer"]);
        let output = dir.join("merged.pot");

        let count = merge_templates(&[first, dir.join("missing.pot"), second], &output).unwrap();
        assert_eq!(count, 3);

        let merged = po_file::parse(&output).unwrap();
        let ids: Vec<&str> = merged.messages().map(|m| m.msgid()).collect();
        assert_eq!(ids, vec!["Hello", "Shared", "Footer"]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_merge_without_inputs_fails() {
        let dir = scratch("merge-empty");
        assert!(merge_templates(&[dir.join("none.pot")], &dir.join("out.pot")).is_err());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_incomplete_header_reported_as_catalog_error() {
        let dir = scratch("header");
        let foreign = dir.join("templates.pot");
        fs::write(&foreign, "msgid \"\"\nmsgstr \"\"\n\"Language: en\\n\"\n\nmsgid \"Foreign\"\nmsgstr \"\"\n").unwrap();

        let err = PoFile::new("fr", &dir).generate(&foreign).unwrap_err();
        assert!(matches!(err, crate::error::I18nError::Catalog { .. }));
        assert!(err.to_string().contains("Project-Id-Version"));

        let err = merge_templates(&[foreign], &dir.join("merged.pot")).unwrap_err();
        assert!(matches!(err, crate::error::I18nError::Catalog { .. }));
        assert!(!dir.join("merged.pot").exists());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_header_key() {
        let pot = TranslationMemory::new().render_template_at("en", "2024-01-01 10:00+0000");
        assert_eq!(missing_header_key(&pot), None);
        assert_eq!(
            missing_header_key(&pot.replace("\"Plural-Forms: nplurals=2; plural=(n != 1);\\n\"\n", "")),
            Some("Plural-Forms")
        );
    }

    #[test]
    fn test_template_extractor_failures_reported() {
        let dir = scratch("extractor");
        let output = dir.join("templates.pot");
        assert!(run_template_extractor("", &output, &dir).is_err());
        assert!(run_template_extractor("content-i18n-no-such-tool -o {output}", &output, &dir).is_err());
        fs::remove_dir_all(&dir).unwrap();
    }
}
