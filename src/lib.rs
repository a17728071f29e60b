//! Content i18n - 内容文档国际化工具库
//!
//! 这个库提供了内容文档分段、翻译单元提取、翻译记忆与模板生成、按语言重写文档和翻译目录管理等核心功能。

pub mod catalog;
pub mod config;
pub mod constants;
pub mod error;
pub mod extractor;
pub mod memory;
pub mod project;
pub mod rewriter;
pub mod schema;
pub mod segmenter;
pub mod stats;
pub mod translator;
pub mod units;
pub mod utils;
