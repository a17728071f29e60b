//! 翻译目录适配器
//!
//! 为每种语言提供 `translate(单元) -> 译文` 查询。编译后的目录位于
//! `<i18npath>/_compiled/<lang>/LC_MESSAGES/contents.mo`；目录不存在或无法读取时
//! 退化为原样返回，不会让构建失败。

// 标准库导入
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

// 第三方crate导入
use tracing::{debug, warn};

// 本地模块导入
use crate::constants::naming::{COMPILED_DIR, LC_MESSAGES_DIR, MO_FILENAME};

/// 单元翻译接口
pub trait Translate {
    /// 返回单元的译文；没有译文时返回单元本身
    fn translate(&self, unit: &str) -> String;
}

impl<F> Translate for F
where
    F: Fn(&str) -> String,
{
    fn translate(&self, unit: &str) -> String {
        self(unit)
    }
}

/// 某语言编译后目录的路径
pub fn compiled_catalog_path(catalog_root: &Path, language: &str) -> PathBuf {
    catalog_root
        .join(COMPILED_DIR)
        .join(language)
        .join(LC_MESSAGES_DIR)
        .join(MO_FILENAME)
}

/// 绑定到单一语言的翻译目录
pub enum LanguageCatalog {
    /// 已加载的MO目录
    Compiled {
        language: String,
        catalog: gettext::Catalog,
    },
    /// 没有可用目录，原样返回
    Identity { language: String },
}

impl LanguageCatalog {
    pub fn identity(language: &str) -> Self {
        LanguageCatalog::Identity {
            language: language.to_string(),
        }
    }

    /// 加载某语言的编译目录，失败时退化为原样返回
    pub fn load(catalog_root: &Path, language: &str) -> Self {
        let path = compiled_catalog_path(catalog_root, language);
        if !path.is_file() {
            debug!("未找到 {} 的编译目录: {}", language, path.display());
            return Self::identity(language);
        }

        let parsed = File::open(&path)
            .map_err(|e| e.to_string())
            .and_then(|file| gettext::Catalog::parse(file).map_err(|e| e.to_string()));

        match parsed {
            Ok(catalog) => {
                debug!("已加载 {} 的编译目录: {}", language, path.display());
                LanguageCatalog::Compiled {
                    language: language.to_string(),
                    catalog,
                }
            }
            Err(e) => {
                warn!("⚠️  无法读取编译目录 {}: {}，将保留原文", path.display(), e);
                Self::identity(language)
            }
        }
    }

    pub fn language(&self) -> &str {
        match self {
            LanguageCatalog::Compiled { language, .. } => language,
            LanguageCatalog::Identity { language } => language,
        }
    }

    pub fn is_compiled(&self) -> bool {
        matches!(self, LanguageCatalog::Compiled { .. })
    }
}

impl Translate for LanguageCatalog {
    fn translate(&self, unit: &str) -> String {
        match self {
            LanguageCatalog::Compiled { catalog, .. } => {
                let translated = catalog.gettext(unit);
                if translated.is_empty() {
                    unit.to_string()
                } else {
                    translated.to_string()
                }
            }
            LanguageCatalog::Identity { .. } => unit.to_string(),
        }
    }
}

/// 按语言缓存的目录集合
///
/// 目录在一次构建中只加载一次；重新编译目录后需调用 [`CatalogStore::invalidate`]。
pub struct CatalogStore {
    root: PathBuf,
    cache: HashMap<String, LanguageCatalog>,
}

impl CatalogStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 获取某语言的目录，首次访问时加载
    pub fn get(&mut self, language: &str) -> &LanguageCatalog {
        let root = &self.root;
        self.cache
            .entry(language.to_string())
            .or_insert_with(|| LanguageCatalog::load(root, language))
    }

    /// 用给定的目录覆盖缓存
    pub fn insert(&mut self, catalog: LanguageCatalog) {
        self.cache.insert(catalog.language().to_string(), catalog);
    }

    /// 丢弃所有缓存的目录
    pub fn invalidate(&mut self) {
        if !self.cache.is_empty() {
            debug!("清除 {} 个已缓存的翻译目录", self.cache.len());
        }
        self.cache.clear();
    }

    pub fn is_cached(&self, language: &str) -> bool {
        self.cache.contains_key(language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compiled_catalog_path() {
        let path = compiled_catalog_path(Path::new("i18n"), "fr");
        assert_eq!(path, PathBuf::from("i18n/_compiled/fr/LC_MESSAGES/contents.mo"));
    }

    #[test]
    fn test_missing_catalog_degrades_to_identity() {
        let root = std::env::temp_dir().join("content-i18n-no-catalog");
        let catalog = LanguageCatalog::load(&root, "de");
        assert!(!catalog.is_compiled());
        assert_eq!(catalog.language(), "de");
        assert_eq!(catalog.translate("Hello"), "Hello");
    }

    #[test]
    fn test_unreadable_catalog_degrades_to_identity() {
        let root = std::env::temp_dir().join(format!("content-i18n-bad-mo-{}", std::process::id()));
        let path = compiled_catalog_path(&root, "fr");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"not a mo file").unwrap();

        let catalog = LanguageCatalog::load(&root, "fr");
        assert!(!catalog.is_compiled());
        assert_eq!(catalog.translate("Hello"), "Hello");

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_closure_translator() {
        let translator = |unit: &str| {
            if unit == "Hello" {
                "Bonjour".to_string()
            } else {
                unit.to_string()
            }
        };
        assert_eq!(translator.translate("Hello"), "Bonjour");
        assert_eq!(translator.translate("World"), "World");
    }

    #[test]
    fn test_store_caches_and_invalidates() {
        let mut store = CatalogStore::new(std::env::temp_dir().join("content-i18n-store"));
        assert!(!store.is_cached("fr"));
        assert_eq!(store.get("fr").translate("Hi"), "Hi");
        assert!(store.is_cached("fr"));

        store.invalidate();
        assert!(!store.is_cached("fr"));

        store.insert(LanguageCatalog::identity("it"));
        assert!(store.is_cached("it"));
    }
}
