//! 数据模型模块
//!
//! 描述内容文档的字段定义：页面模型位于 `models/*.toml`，流式区块模型位于
//! `flowblocks/*.toml`，文件名（不含扩展名）即模型标识。
//!
//! ```toml
//! [model]
//! name = "Page"
//!
//! [[fields]]
//! name = "title"
//! type = "string"
//! translate = true
//!
//! [[fields]]
//! name = "body"
//! type = "flow"
//! flow_blocks = ["text", "image"]
//! ```

// 标准库导入
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;

// 第三方crate导入
use serde::Deserialize;
use tracing::{debug, warn};

// 本地模块导入
use crate::error::Result;
use crate::i18n_error;

/// 配置中的布尔型开关，兼容 `true`、`"True"`、`"1"`、`1` 等写法
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Flag {
    Bool(bool),
    Integer(i64),
    Text(String),
}

impl Flag {
    pub fn is_truthy(&self) -> bool {
        match self {
            Flag::Bool(value) => *value,
            Flag::Integer(value) => *value == 1,
            Flag::Text(value) => matches!(value.trim(), "True" | "true" | "1"),
        }
    }
}

/// 字段类型
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    /// 普通文本类字段（string、markdown、text 等）
    Scalar(String),
    /// 流式字段，值由若干命名区块组成，区块模型按名称解析
    Flow { flow_blocks: Option<Vec<String>> },
}

impl FieldType {
    pub fn from_name(type_name: &str, flow_blocks: Option<Vec<String>>) -> Self {
        if type_name == "flow" {
            FieldType::Flow { flow_blocks }
        } else {
            FieldType::Scalar(type_name.to_string())
        }
    }

    pub fn is_flow(&self) -> bool {
        matches!(self, FieldType::Flow { .. })
    }
}

/// 字段选项
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldOptions {
    pub translate: Option<Flag>,
    /// 其余未解释的选项原样保留
    pub extra: BTreeMap<String, toml::Value>,
}

/// 模型中的一个字段
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
    pub options: FieldOptions,
}

impl Field {
    pub fn scalar(name: &str, type_name: &str) -> Self {
        Self {
            name: name.to_string(),
            field_type: FieldType::Scalar(type_name.to_string()),
            options: FieldOptions::default(),
        }
    }

    pub fn flow(name: &str) -> Self {
        Self {
            name: name.to_string(),
            field_type: FieldType::Flow { flow_blocks: None },
            options: FieldOptions::default(),
        }
    }

    /// 设置 `translate` 选项
    pub fn with_translate(mut self, flag: Flag) -> Self {
        self.options.translate = Some(flag);
        self
    }

    /// 标记为可翻译
    pub fn translatable(self) -> Self {
        self.with_translate(Flag::Bool(true))
    }

    /// 只有 `translate` 为真且不是流式字段时才直接翻译
    pub fn is_translatable(&self) -> bool {
        !self.field_type.is_flow()
            && self
                .options
                .translate
                .as_ref()
                .is_some_and(Flag::is_truthy)
    }
}

/// 页面模型或流式区块模型
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub id: String,
    pub name: String,
    pub fields: Vec<Field>,
}

impl Model {
    pub fn new(id: &str, fields: Vec<Field>) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            fields,
        }
    }

    /// 从TOML文本解析模型
    pub fn from_toml_str(id: &str, content: &str) -> Result<Self> {
        let file: ModelFile =
            toml::from_str(content).map_err(|e| i18n_error!(schema, id, e))?;

        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(file.fields.len());
        for def in file.fields {
            if !seen.insert(def.name.clone()) {
                return Err(i18n_error!(schema, id, format!("字段重复定义: {}", def.name)));
            }
            fields.push(Field {
                field_type: FieldType::from_name(&def.type_name, def.flow_blocks),
                name: def.name,
                options: FieldOptions {
                    translate: def.translate,
                    extra: def.extra,
                },
            });
        }

        Ok(Self {
            id: id.to_string(),
            name: file.model.name.unwrap_or_else(|| id.to_string()),
            fields,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct ModelHeader {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FieldDef {
    name: String,
    #[serde(rename = "type", default = "default_field_type")]
    type_name: String,
    #[serde(default)]
    translate: Option<Flag>,
    #[serde(default)]
    flow_blocks: Option<Vec<String>>,
    #[serde(flatten)]
    extra: BTreeMap<String, toml::Value>,
}

#[derive(Debug, Deserialize)]
struct ModelFile {
    #[serde(default)]
    model: ModelHeader,
    #[serde(default)]
    fields: Vec<FieldDef>,
}

fn default_field_type() -> String {
    "string".to_string()
}

/// 模型注册表
///
/// 找不到的区块模型只报告一次，之后该区块作为不透明内容跳过。
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: HashMap<String, Model>,
    flowblocks: HashMap<String, Model>,
    reported_missing: RefCell<HashSet<String>>,
}

impl ModelRegistry {
    pub fn new(models: Vec<Model>, flowblocks: Vec<Model>) -> Self {
        Self {
            models: models.into_iter().map(|m| (m.id.clone(), m)).collect(),
            flowblocks: flowblocks.into_iter().map(|m| (m.id.clone(), m)).collect(),
            reported_missing: RefCell::new(HashSet::new()),
        }
    }

    /// 从模型目录加载；目录不存在时视为空
    pub fn load(models_dir: &Path, flowblocks_dir: &Path) -> Result<Self> {
        let models = load_models_dir(models_dir)?;
        let flowblocks = load_models_dir(flowblocks_dir)?;
        debug!("加载模型 {} 个，流式区块模型 {} 个", models.len(), flowblocks.len());
        Ok(Self::new(models, flowblocks))
    }

    pub fn model(&self, id: &str) -> Option<&Model> {
        self.models.get(id)
    }

    /// 按区块名解析流式区块模型
    pub fn flowblock(&self, name: &str) -> Option<&Model> {
        let model = self.flowblocks.get(name);
        if model.is_none() && self.reported_missing.borrow_mut().insert(name.to_string()) {
            warn!("⚠️  未知的流式区块模型: {}，其内容将不被翻译", name);
        }
        model
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    pub fn flowblock_count(&self) -> usize {
        self.flowblocks.len()
    }
}

fn load_models_dir(dir: &Path) -> Result<Vec<Model>> {
    if !dir.is_dir() {
        debug!("模型目录不存在: {}", dir.display());
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(dir)
        .map_err(|e| i18n_error!(file_op, dir.display(), "读取目录", e))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| i18n_error!(file_op, dir.display(), "读取目录", e))?
            .path();
        if path.extension().is_some_and(|ext| ext == "toml") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut models = Vec::with_capacity(paths.len());
    for path in paths {
        let Some(id) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
            continue;
        };
        let content = fs::read_to_string(&path)
            .map_err(|e| i18n_error!(file_op, path.display(), "读取", e))?;
        models.push(Model::from_toml_str(&id, &content)?);
    }
    Ok(models)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_truthiness() {
        assert!(Flag::Bool(true).is_truthy());
        assert!(Flag::Integer(1).is_truthy());
        assert!(Flag::Text("True".into()).is_truthy());
        assert!(Flag::Text("true".into()).is_truthy());
        assert!(Flag::Text("1".into()).is_truthy());
        assert!(!Flag::Text("yes".into()).is_truthy());
        assert!(!Flag::Integer(0).is_truthy());
        assert!(!Flag::Bool(false).is_truthy());
    }

    #[test]
    fn test_flow_field_never_translatable() {
        let field = Field::flow("body").translatable();
        assert!(!field.is_translatable());
        assert!(Field::scalar("title", "string").translatable().is_translatable());
        assert!(!Field::scalar("title", "string").is_translatable());
    }

    #[test]
    fn test_model_from_toml() {
        let content = r#"
[model]
name = "Page"

[[fields]]
name = "title"
type = "string"
translate = "True"

[[fields]]
name = "body"
type = "flow"
flow_blocks = ["text"]

[[fields]]
name = "count"
type = "integer"
translate = 1
width = "1/2"
"#;
        let model = Model::from_toml_str("page", content).unwrap();
        assert_eq!(model.name, "Page");
        assert_eq!(
            model.fields.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(),
            vec!["title", "body", "count"]
        );
        assert!(model.fields[0].is_translatable());
        assert_eq!(
            model.fields[1].field_type,
            FieldType::Flow { flow_blocks: Some(vec!["text".to_string()]) }
        );
        assert!(model.fields[2].is_translatable());
        assert!(model.fields[2].options.extra.contains_key("width"));
    }

    #[test]
    fn test_model_duplicate_field_rejected() {
        let content = "[[fields]]\nname = \"a\"\n[[fields]]\nname = \"a\"\n";
        assert!(Model::from_toml_str("dup", content).is_err());
    }

    #[test]
    fn test_registry_lookup() {
        let registry = ModelRegistry::new(
            vec![Model::new("page", vec![Field::scalar("title", "string")])],
            vec![Model::new("text", vec![Field::scalar("text", "markdown")])],
        );
        assert!(registry.model("page").is_some());
        assert!(registry.flowblock("text").is_some());
        assert!(registry.flowblock("missing").is_none());
        assert!(registry.flowblock("missing").is_none());
        assert_eq!(registry.reported_missing.borrow().len(), 1);
    }

    #[test]
    fn test_registry_load_from_dirs() {
        let root = std::env::temp_dir().join(format!("content-i18n-schema-{}", std::process::id()));
        let models = root.join("models");
        let flowblocks = root.join("flowblocks");
        fs::create_dir_all(&models).unwrap();
        fs::create_dir_all(&flowblocks).unwrap();
        fs::write(models.join("page.toml"), "[[fields]]\nname = \"title\"\ntranslate = true\n").unwrap();
        fs::write(flowblocks.join("text.toml"), "[[fields]]\nname = \"text\"\n").unwrap();
        fs::write(flowblocks.join("README.md"), "ignored").unwrap();

        let registry = ModelRegistry::load(&models, &flowblocks).unwrap();
        assert_eq!(registry.model_count(), 1);
        assert_eq!(registry.flowblock_count(), 1);
        assert!(registry.model("page").unwrap().fields[0].is_translatable());

        fs::remove_dir_all(&root).unwrap();
    }
}
