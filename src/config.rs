//! 配置管理模块
//!
//! 提供CLI参数解析和国际化配置管理功能

// 标准库导入
use std::fs;
use std::path::{Path, PathBuf};

// 第三方crate导入
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing::debug;
use url::Url;

// 本地模块导入
use crate::constants::{defaults, naming};
use crate::error::Result;
use crate::i18n_error;
use crate::schema::Flag;
use crate::units::TranslationMode;

/// 目标语言列表，既可写成数组也可写成逗号分隔的字符串
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LanguageList {
    List(Vec<String>),
    Csv(String),
}

impl LanguageList {
    pub fn languages(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            LanguageList::List(items) => items.iter().map(String::as_str).collect(),
            LanguageList::Csv(text) => text.split(',').collect(),
        };
        raw.into_iter()
            .map(str::trim)
            .filter(|lang| !lang.is_empty())
            .map(str::to_string)
            .collect()
    }
}

fn path_or(value: Option<String>, default: &str) -> PathBuf {
    PathBuf::from(value.unwrap_or_else(|| default.to_string()))
}

/// 配置文件原始结构（`configs/i18n.toml`）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    enable: Option<Flag>,
    content: Option<String>,
    translations: Option<LanguageList>,
    i18npath: Option<String>,
    url_prefix: Option<String>,
    translate_paragraphwise: Option<Flag>,
    content_dir: Option<String>,
    models_dir: Option<String>,
    flowblocks_dir: Option<String>,
    default_model: Option<String>,
    templates_pot: Option<String>,
    template_extractor: Option<String>,
}

/// 校验后的国际化配置
///
/// 路径均为相对于项目根目录的值，由 [`I18nConfig::resolve`] 转成绝对路径。
#[derive(Debug, Clone, PartialEq)]
pub struct I18nConfig {
    pub enabled: bool,
    /// 源内容语言
    pub content_language: String,
    /// 目标语言（包含源内容语言）
    pub translations: Vec<String>,
    pub i18n_path: PathBuf,
    pub url_prefix: Url,
    pub mode: TranslationMode,
    pub content_dir: PathBuf,
    pub models_dir: PathBuf,
    pub flowblocks_dir: PathBuf,
    pub default_model: String,
    /// 外部模板提取器产出的模板，合并进 `contents.pot`
    pub templates_pot: Option<PathBuf>,
    /// 外部模板提取命令，`{output}` 会被替换为输出路径
    pub template_extractor: Option<String>,
}

impl I18nConfig {
    /// 从TOML文本解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content)?;
        Self::from_file_config(file)
    }

    /// 从配置文件读取
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| i18n_error!(file_op, path.display(), "读取", e))?;
        debug!("读取配置文件: {}", path.display());
        Self::from_toml_str(&content)
    }

    /// 加载项目配置：优先使用显式指定的文件，否则读取 `<root>/configs/i18n.toml`
    pub fn load(project_root: &Path, explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => project_root.join(naming::CONFIG_PATH),
        };
        if !path.is_file() {
            return Err(i18n_error!(config, "translations", format!("配置文件不存在: {}", path.display())));
        }
        Self::from_file(&path)
    }

    fn from_file_config(file: ConfigFile) -> Result<Self> {
        let content_language = file
            .content
            .map(|lang| lang.trim().to_string())
            .filter(|lang| !lang.is_empty())
            .unwrap_or_else(|| defaults::CONTENT_LANGUAGE.to_string());

        let mut translations = file
            .translations
            .map(|list| list.languages())
            .unwrap_or_default();
        if translations.is_empty() {
            return Err(i18n_error!(config, "translations", "未配置目标语言"));
        }
        if !translations.contains(&content_language) {
            translations.push(content_language.clone());
        }

        let raw_prefix = file
            .url_prefix
            .unwrap_or_else(|| defaults::URL_PREFIX.to_string());
        let url_prefix = Url::parse(&raw_prefix)
            .map_err(|e| i18n_error!(config, "url_prefix", format!("{}: {}", raw_prefix, e)))?;

        let config = Self {
            enabled: file.enable.as_ref().map_or(true, Flag::is_truthy),
            content_language,
            translations,
            i18n_path: path_or(file.i18npath, defaults::I18N_PATH),
            url_prefix,
            mode: TranslationMode::from_paragraphwise(
                file.translate_paragraphwise.as_ref().is_some_and(Flag::is_truthy),
            ),
            content_dir: path_or(file.content_dir, defaults::CONTENT_DIR),
            models_dir: path_or(file.models_dir, defaults::MODELS_DIR),
            flowblocks_dir: path_or(file.flowblocks_dir, defaults::FLOWBLOCKS_DIR),
            default_model: file
                .default_model
                .unwrap_or_else(|| defaults::DEFAULT_MODEL.to_string()),
            templates_pot: file.templates_pot.map(PathBuf::from),
            template_extractor: file.template_extractor.filter(|cmd| !cmd.trim().is_empty()),
        };
        config.validate()?;
        Ok(config)
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        if self.translations.is_empty() {
            return Err(i18n_error!(config, "translations", "未配置目标语言"));
        }
        if let Some(lang) = self
            .translations
            .iter()
            .find(|lang| lang.contains(|c: char| c.is_whitespace() || c == '/'))
        {
            return Err(i18n_error!(config, "translations", format!("无效的语言代码: {}", lang)));
        }
        if self.default_model.trim().is_empty() {
            return Err(i18n_error!(config, "default_model", "默认模型不能为空"));
        }
        Ok(())
    }

    /// 把相对路径解析到项目根目录下
    pub fn resolve(&self, project_root: &Path) -> Self {
        let join = |path: &Path| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                project_root.join(path)
            }
        };
        Self {
            i18n_path: join(&self.i18n_path),
            content_dir: join(&self.content_dir),
            models_dir: join(&self.models_dir),
            flowblocks_dir: join(&self.flowblocks_dir),
            templates_pot: self.templates_pot.as_deref().map(join),
            ..self.clone()
        }
    }
}

/// CLI参数结构
#[derive(Parser)]
#[command(author, version, about = "内容文档国际化工具 - 提取可翻译文本并生成各语言版本", long_about = None)]
pub struct Cli {
    /// 项目根目录
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub project: PathBuf,

    /// 配置文件路径 (默认为 <项目>/configs/i18n.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// 详细输出模式
    #[arg(short, long)]
    pub verbose: bool,

    /// 静默模式 (仅输出错误)
    #[arg(short, long)]
    pub quiet: bool,

    /// 显示构建统计
    #[arg(long)]
    pub stats: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// 子命令
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// 提取可翻译文本并写出 contents.pot
    Extract,
    /// 按已编译的翻译目录生成各语言的内容文档
    Rewrite,
    /// 生成模板、更新并编译各语言的PO文件
    Catalogs,
    /// 完整流程：提取、更新目录、重写文档
    Build,
}
