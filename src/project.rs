//! 项目编排
//!
//! 扫描内容目录，驱动分析（提取翻译单元）、目录生成和文档重写三个阶段。
//! 单个文档失败只记录日志并计数，不影响其余文档。

// 标准库导入
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

// 第三方crate导入
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

// 本地模块导入
use crate::catalog::{merge_templates, run_template_extractor, CatalogUpdate, PoFile};
use crate::config::I18nConfig;
use crate::constants::format::MODEL_FIELD;
use crate::constants::memory::DYNAMIC_LOCATION;
use crate::constants::naming::{
    CONTENTS_ALT_PREFIX, CONTENTS_EXTENSION, CONTENTS_FILENAME, TEMPLATES_POT_FILENAME,
    TEMPLATE_FILENAME,
};
use crate::error::Result;
use crate::extractor::{DocumentContext, Extractor};
use crate::i18n_error;
use crate::memory::TranslationMemory;
use crate::rewriter::Rewriter;
use crate::schema::ModelRegistry;
use crate::segmenter::{tokenize, DocumentLines};
use crate::stats::BuildStats;
use crate::translator::{CatalogStore, Translate};
use crate::utils::{absolute_url, relative_path, translated_path};

/// 内容目录中的一个文档文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDocument {
    pub source_path: PathBuf,
    /// 相对于项目根目录的路径
    pub relative_path: String,
    /// 页面路径，形如 `/blog/first-post/`
    pub url_path: String,
    /// 语言变体，主版本为 `None`
    pub alt: Option<String>,
}

impl ContentDocument {
    pub fn is_primary(&self) -> bool {
        self.alt.is_none()
    }
}

/// 从文件名识别文档变体：`contents.lr` 为主版本，`contents+<alt>.lr` 为语言变体
fn document_alt(file_name: &str) -> Option<Option<String>> {
    if file_name == CONTENTS_FILENAME {
        return Some(None);
    }
    let alt = file_name
        .strip_prefix(CONTENTS_ALT_PREFIX)?
        .strip_suffix(CONTENTS_EXTENSION)?;
    if alt.is_empty() {
        None
    } else {
        Some(Some(alt.to_string()))
    }
}

fn url_path_of(dir: &Path, content_dir: &Path) -> String {
    let relative = relative_path(dir, content_dir);
    if relative.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", relative)
    }
}

/// 扫描内容目录，按路径排序返回所有文档
pub fn discover_documents(content_dir: &Path, project_root: &Path) -> Vec<ContentDocument> {
    if !content_dir.is_dir() {
        warn!("⚠️  内容目录不存在: {}", content_dir.display());
        return Vec::new();
    }

    let mut documents = Vec::new();
    for entry in WalkDir::new(content_dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("⚠️  无法访问内容目录项: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy();
        let Some(alt) = document_alt(&file_name) else {
            continue;
        };

        let path = entry.path();
        let dir = path.parent().unwrap_or(content_dir);
        documents.push(ContentDocument {
            source_path: path.to_path_buf(),
            relative_path: relative_path(path, project_root),
            url_path: url_path_of(dir, content_dir),
            alt,
        });
    }

    debug!("发现 {} 个内容文档", documents.len());
    documents
}

/// 读取文档声明的模型（`_model` 字段）
pub fn declared_model(raw_document: &str) -> Option<String> {
    let sections = tokenize(&DocumentLines::new(raw_document).views());
    sections
        .get(MODEL_FIELD)
        .map(|section| section.value_text().trim().to_string())
        .filter(|model| !model.is_empty())
}

/// 国际化项目
pub struct Project {
    root: PathBuf,
    config: I18nConfig,
    registry: ModelRegistry,
    memory: TranslationMemory,
    catalogs: CatalogStore,
    stats: BuildStats,
}

impl Project {
    /// 打开项目：解析路径并加载数据模型
    pub fn open(root: impl Into<PathBuf>, config: I18nConfig) -> Result<Self> {
        let root = root.into();
        let config = config.resolve(&root);

        let start = Instant::now();
        let registry = ModelRegistry::load(&config.models_dir, &config.flowblocks_dir)?;
        let stats = BuildStats {
            schema_time: start.elapsed(),
            ..BuildStats::default()
        };

        info!(
            "🌐 国际化已启用，源语言 {}，目标语言: {}",
            config.content_language,
            config.translations.join(", ")
        );
        debug!(
            "模型 {} 个，流式区块模型 {} 个",
            registry.model_count(),
            registry.flowblock_count()
        );

        Ok(Self {
            catalogs: CatalogStore::new(config.i18n_path.clone()),
            root,
            config,
            registry,
            memory: TranslationMemory::new(),
            stats,
        })
    }

    /// 使用已构造好的模型注册表打开项目
    pub fn with_registry(
        root: impl Into<PathBuf>,
        config: I18nConfig,
        registry: ModelRegistry,
    ) -> Self {
        let root = root.into();
        let config = config.resolve(&root);
        Self {
            catalogs: CatalogStore::new(config.i18n_path.clone()),
            root,
            config,
            registry,
            memory: TranslationMemory::new(),
            stats: BuildStats::default(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &I18nConfig {
        &self.config
    }

    pub fn memory(&self) -> &TranslationMemory {
        &self.memory
    }

    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    pub fn template_path(&self) -> PathBuf {
        self.config.i18n_path.join(TEMPLATE_FILENAME)
    }

    /// 外部模板提取器的输出位置
    pub fn templates_pot_path(&self) -> PathBuf {
        self.config
            .templates_pot
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(TEMPLATES_POT_FILENAME))
    }

    pub fn documents(&self) -> Vec<ContentDocument> {
        discover_documents(&self.config.content_dir, &self.root)
    }

    fn read_document(document: &ContentDocument) -> Result<String> {
        fs::read_to_string(&document.source_path)
            .map_err(|e| i18n_error!(file_op, document.relative_path, "读取", e))
    }

    /// 文档使用的模型标识；语言变体未声明时沿用主版本的声明
    fn model_id(&self, document: &ContentDocument, raw_document: &str) -> String {
        declared_model(raw_document)
            .or_else(|| {
                if document.is_primary() {
                    return None;
                }
                let primary = document.source_path.with_file_name(CONTENTS_FILENAME);
                fs::read_to_string(primary)
                    .ok()
                    .and_then(|raw| declared_model(&raw))
            })
            .unwrap_or_else(|| self.config.default_model.clone())
    }

    /// 分析单个文档，把可翻译单元加入翻译记忆
    ///
    /// 返回提交的单元数；模型未知时返回 `None`。
    pub fn analyze_document(&mut self, document: &ContentDocument) -> Result<Option<usize>> {
        let raw_document = Self::read_document(document)?;
        let model_id = self.model_id(document, &raw_document);
        let Some(model) = self.registry.model(&model_id) else {
            warn!("⚠️  文档 {} 使用了未知模型 {}，已跳过", document.relative_path, model_id);
            return Ok(None);
        };

        let sections = tokenize(&DocumentLines::new(&raw_document).views());
        let context = DocumentContext {
            url: absolute_url(&self.config.url_prefix, &document.url_path),
            relative_path: &document.relative_path,
            alt: document.alt.as_deref(),
        };
        let extractor =
            Extractor::new(&self.registry, self.config.mode, &self.config.content_language);
        let added =
            extractor.extract(&model.fields, &sections, &context, &model.id, &mut self.memory);

        let issues = extractor.check_structure(&model.fields, &sections);
        if !issues.is_empty() {
            let details = issues.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ");
            warn!("⚠️  {}", i18n_error!(document, document.relative_path, details));
            self.stats.documents_malformed += 1;
        }

        debug!("分析 {}: {} 个单元", document.relative_path, added);
        Ok(Some(added))
    }

    /// 分析所有文档
    pub fn analyze_all(&mut self) {
        let start = Instant::now();
        for document in self.documents() {
            self.stats.documents_scanned += 1;
            match self.analyze_document(&document) {
                Ok(Some(added)) => self.stats.units_extracted += added,
                Ok(None) => self.stats.documents_skipped += 1,
                Err(e) => {
                    error!("❌ 文档分析失败: {}", e);
                    self.stats.documents_failed += 1;
                }
            }
        }
        self.stats.memory_entries = self.memory.len();
        self.stats.memory_locations = self.memory.location_count();
        self.stats.analysis_time += start.elapsed();
        info!(
            "🔍 分析完成: {} 个文档，{} 个翻译条目",
            self.stats.documents_scanned,
            self.memory.len()
        );
    }

    /// 为主版本文档生成每种语言的 `contents+<lang>.lr`
    ///
    /// 语言变体文档不会被重写，返回写出的文件列表。
    pub fn rewrite_document(&mut self, document: &ContentDocument) -> Result<Vec<PathBuf>> {
        if !document.is_primary() {
            return Ok(Vec::new());
        }
        let raw_document = Self::read_document(document)?;
        let model_id = self.model_id(document, &raw_document);
        let Some(model) = self.registry.model(&model_id) else {
            warn!("⚠️  文档 {} 使用了未知模型 {}，未重写", document.relative_path, model_id);
            return Ok(Vec::new());
        };
        let fields = model.fields.clone();

        let mut written = Vec::with_capacity(self.config.translations.len());
        for language in self.config.translations.clone() {
            let rewriter = Rewriter::new(&self.registry, self.config.mode);
            let catalog = self.catalogs.get(&language);
            let output = rewriter.rewrite(&fields, &raw_document, catalog);

            let target = translated_path(&document.source_path, &language);
            let unchanged = fs::read_to_string(&target).is_ok_and(|existing| existing == output);
            if unchanged {
                self.stats.files_unchanged += 1;
            } else {
                fs::write(&target, output)
                    .map_err(|e| i18n_error!(file_op, target.display(), "写入", e))?;
                self.stats.files_rewritten += 1;
                debug!("已写出 {}", relative_path(&target, &self.root));
            }
            written.push(target);
        }
        Ok(written)
    }

    /// 重写所有主版本文档
    pub fn rewrite_all(&mut self) {
        let start = Instant::now();
        let mut documents = 0;
        for document in self.documents().into_iter().filter(ContentDocument::is_primary) {
            match self.rewrite_document(&document) {
                Ok(written) if !written.is_empty() => documents += 1,
                Ok(_) => {}
                Err(e) => {
                    error!("❌ 文档重写失败: {}", e);
                    self.stats.documents_failed += 1;
                }
            }
        }
        self.stats.rewrite_time += start.elapsed();
        info!("✍️  重写完成: {} 个文档，{} 种语言", documents, self.config.translations.len());
    }

    /// 运行外部模板提取器（若已配置），失败只记录日志
    pub fn extract_templates(&self) {
        let Some(command) = self.config.template_extractor.as_deref() else {
            return;
        };
        let output = self.templates_pot_path();
        info!("🧩 解析模板中的可翻译文本: {}", output.display());
        if let Err(e) = run_template_extractor(command, &output, &self.root) {
            warn!("⚠️  模板提取失败: {}", e);
        }
    }

    /// 写出 `contents.pot`
    pub fn write_template(&self) -> Result<PathBuf> {
        let path = self.template_path();
        self.memory.write_template(&path, &self.config.content_language)?;
        Ok(path)
    }

    /// 写出 `contents.pot`，并合并外部模板提取器的输出（若存在）
    ///
    /// 合并失败只记录日志并计入失败的目录数，`contents.pot` 保持未合并的内容。
    pub fn write_merged_template(&mut self) -> Result<PathBuf> {
        let template = self.write_template()?;

        let templates_pot = self.templates_pot_path();
        if templates_pot.is_file() {
            match merge_templates(&[template.clone(), templates_pot.clone()], &template) {
                Ok(_) => info!(
                    "🔗 {} 已合并到 {}",
                    relative_path(&templates_pot, &self.root),
                    relative_path(&template, &self.root)
                ),
                Err(e) => {
                    warn!("⚠️  模板合并失败: {}", e);
                    self.stats.catalogs_failed += 1;
                }
            }
        }
        Ok(template)
    }

    /// 写出模板并为每种语言生成、编译PO文件
    ///
    /// 目录工具的失败只记录日志；模板本身写入失败时返回错误。
    pub fn write_catalogs(&mut self) -> Result<()> {
        let start = Instant::now();
        let template = self.write_merged_template()?;

        for language in &self.config.translations {
            let po = PoFile::new(language, &self.config.i18n_path);
            match po.generate(&template) {
                Ok(CatalogUpdate::Created) => self.stats.catalogs_created += 1,
                Ok(CatalogUpdate::Updated) => self.stats.catalogs_updated += 1,
                Err(e) => {
                    error!("❌ {} 的翻译目录生成失败: {}", language, e);
                    self.stats.catalogs_failed += 1;
                }
            }
        }

        self.catalogs.invalidate();
        self.stats.catalog_time += start.elapsed();
        Ok(())
    }

    /// 完整构建：模板提取、分析、目录生成、重写
    pub fn build(&mut self) -> Result<()> {
        if !self.config.enabled {
            info!("⏸️  国际化已在配置中禁用");
            return Ok(());
        }
        self.extract_templates();
        self.analyze_all();
        self.write_catalogs()?;
        self.rewrite_all();
        Ok(())
    }

    /// 模板中的翻译标签
    ///
    /// 渲染源语言时把文本记入翻译记忆并原样返回，其他语言通过翻译目录翻译。
    pub fn translate_tag(&mut self, text: &str, language: &str) -> String {
        let text = text.trim();
        if !self.config.enabled {
            return text.to_string();
        }
        if language == self.config.content_language {
            self.memory.add(text, DYNAMIC_LOCATION);
            return text.to_string();
        }
        self.catalogs.get(language).translate(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Field, Model};
    use polib::message::MessageView;

    const PAGE: &str = "_model: page\n---\ntitle: Hello\n---\nslug: hello\n---\nbody:\n\n#### text ####\ntext:\n\nWelcome home\n";

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("content-i18n-project-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(dir.join("content/blog")).unwrap();
        dir
    }

    fn registry() -> ModelRegistry {
        ModelRegistry::new(
            vec![Model::new(
                "page",
                vec![
                    Field::scalar("title", "string").translatable(),
                    Field::scalar("slug", "string"),
                    Field::flow("body"),
                ],
            )],
            vec![Model::new("text", vec![Field::scalar("text", "markdown").translatable()])],
        )
    }

    fn open_project(root: &Path) -> Project {
        let config =
            I18nConfig::from_toml_str("translations = \"fr\"\ntemplates_pot = \"i18n/templates.pot\"\n")
                .unwrap();
        Project::with_registry(root, config, registry())
    }

    #[test]
    fn test_document_alt() {
        assert_eq!(document_alt("contents.lr"), Some(None));
        assert_eq!(document_alt("contents+fr.lr"), Some(Some("fr".to_string())));
        assert_eq!(document_alt("contents+.lr"), None);
        assert_eq!(document_alt("notes.lr"), None);
    }

    #[test]
    fn test_discover_documents() {
        let root = scratch("discover");
        fs::write(root.join("content/contents.lr"), PAGE).unwrap();
        fs::write(root.join("content/blog/contents.lr"), PAGE).unwrap();
        fs::write(root.join("content/blog/contents+fr.lr"), PAGE).unwrap();
        fs::write(root.join("content/blog/image.png"), b"png").unwrap();

        let documents = discover_documents(&root.join("content"), &root);
        let summary: Vec<(&str, &str, Option<&str>)> = documents
            .iter()
            .map(|d| (d.relative_path.as_str(), d.url_path.as_str(), d.alt.as_deref()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("content/blog/contents+fr.lr", "/blog/", Some("fr")),
                ("content/blog/contents.lr", "/blog/", None),
                ("content/contents.lr", "/", None),
            ]
        );

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_declared_model() {
        assert_eq!(declared_model(PAGE), Some("page".to_string()));
        assert_eq!(declared_model("title: x\n"), None);
    }

    #[test]
    fn test_analyze_and_write_template() {
        let root = scratch("analyze");
        fs::write(root.join("content/contents.lr"), PAGE).unwrap();
        fs::write(root.join("content/blog/contents.lr"), "title: Hello\n---\n_model: missing\n").unwrap();
        fs::write(root.join("content/blog/contents+fr.lr"), "_model: page\n---\ntitle: Bonjour\n").unwrap();

        let mut project = open_project(&root);
        project.analyze_all();

        assert_eq!(project.memory().units().collect::<Vec<_>>(), vec!["Hello", "Welcome home"]);
        assert_eq!(
            project.memory().locations("Welcome home").unwrap().collect::<Vec<_>>(),
            vec!["http://localhost/ (content/contents.lr:text.text)"]
        );
        assert_eq!(project.stats().documents_scanned, 3);
        assert_eq!(project.stats().documents_skipped, 1);

        let pot = project.write_template().unwrap();
        let content = fs::read_to_string(pot).unwrap();
        assert!(content.contains("#: http://localhost/ (content/contents.lr:page.title)\nmsgid \"Hello\"\n"));

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_rewrite_without_catalogs_is_identity() {
        let root = scratch("rewrite");
        fs::write(root.join("content/blog/contents.lr"), PAGE).unwrap();

        let mut project = open_project(&root);
        let document = project.documents().remove(0);
        let written = project.rewrite_document(&document).unwrap();

        assert_eq!(
            written,
            vec![
                root.join("content/blog/contents+fr.lr"),
                root.join("content/blog/contents+en.lr"),
            ]
        );
        for path in written {
            assert_eq!(fs::read_to_string(path).unwrap(), PAGE);
        }

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_build_compiles_and_applies_translations() {
        let root = scratch("build");
        fs::write(root.join("content/contents.lr"), PAGE).unwrap();

        let mut project = open_project(&root);
        project.build().unwrap();
        assert_eq!(project.stats().catalogs_created, 2);

        let po = PoFile::new("fr", root.join("i18n"));
        let mut catalog = polib::po_file::parse(&po.path()).unwrap();
        catalog.append_or_update(
            polib::message::Message::build_singular()
                .with_msgid("Hello".to_string())
                .with_msgstr("Bonjour".to_string())
                .done(),
        );
        polib::po_file::write(&catalog, &po.path()).unwrap();

        let mut project = open_project(&root);
        project.build().unwrap();
        assert_eq!(project.stats().catalogs_updated, 2);

        let translated = fs::read_to_string(root.join("content/contents+fr.lr")).unwrap();
        assert_eq!(translated, PAGE.replace("title: Hello", "title: Bonjour"));
        assert_eq!(project.translate_tag(" Hello ", "fr"), "Bonjour");

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_build_isolates_catalog_failures() {
        let root = scratch("catalog-failures");
        fs::write(root.join("content/contents.lr"), PAGE).unwrap();
        fs::create_dir_all(root.join("i18n")).unwrap();
        let foreign = "msgid \"\"\nmsgstr \"\"\n\"Language: en\\n\"\n\nmsgid \"Foreign\"\nmsgstr \"\"\n";
        fs::write(root.join("i18n/templates.pot"), foreign).unwrap();
        let broken_po = "msgid \"\"\nmsgstr \"\"\n\"Language: fr\\n\"\n";
        fs::write(root.join("i18n/contents+fr.po"), broken_po).unwrap();

        let mut project = open_project(&root);
        project.build().unwrap();

        let stats = project.stats();
        assert_eq!(stats.catalogs_failed, 2);
        assert_eq!(stats.catalogs_created, 1);
        assert!(stats.has_failures());

        let pot = fs::read_to_string(project.template_path()).unwrap();
        assert!(pot.contains("msgid \"Hello\""));
        assert!(!pot.contains("Foreign"));
        assert_eq!(fs::read_to_string(root.join("i18n/contents+fr.po")).unwrap(), broken_po);
        assert_eq!(fs::read_to_string(root.join("content/contents+fr.lr")).unwrap(), PAGE);

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_write_merged_template_includes_extracted_entries() {
        let root = scratch("merged-template");
        fs::write(root.join("content/contents.lr"), PAGE).unwrap();
        let mut extracted = TranslationMemory::new();
        extracted.add("Read more", "templates/layout.html:12");
        extracted.add("Hello", "templates/layout.html:3");
        extracted.write_template(&root.join("i18n/templates.pot"), "en").unwrap();

        let mut project = open_project(&root);
        project.analyze_all();
        let path = project.write_merged_template().unwrap();

        let catalog = polib::po_file::parse(&path).unwrap();
        let ids: Vec<&str> = catalog.messages().map(|m| m.msgid()).collect();
        assert_eq!(ids, vec!["Hello", "Welcome home", "Read more"]);
        assert_eq!(project.stats().catalogs_failed, 0);

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_analyze_reports_structure_issues() {
        let root = scratch("malformed");
        let document = "_model: page\n---\ntitle: Hello\n---\nbody:\n\nstray line\n#### text ####\ntext: Kept\n";
        fs::write(root.join("content/contents.lr"), document).unwrap();

        let mut project = open_project(&root);
        project.analyze_all();

        assert_eq!(project.stats().documents_malformed, 1);
        assert_eq!(project.stats().documents_failed, 0);
        assert_eq!(project.memory().units().collect::<Vec<_>>(), vec!["Hello", "Kept"]);

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_translate_tag_records_dynamic_units() {
        let root = scratch("tag");
        let mut project = open_project(&root);

        assert_eq!(project.translate_tag("  Read more  ", "en"), "Read more");
        assert_eq!(
            project.memory().locations("Read more").unwrap().collect::<Vec<_>>(),
            vec!["(dynamic)"]
        );
        assert_eq!(project.translate_tag("Read more", "de"), "Read more");
        assert_eq!(project.memory().len(), 1);

        fs::remove_dir_all(&root).unwrap();
    }
}
