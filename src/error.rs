//! 统一错误处理模块
//!
//! 提供内容国际化流程的统一错误类型定义和处理机制

// 标准库导入
use std::fmt;

// 第三方crate导入
use anyhow::Error as AnyhowError;

/// 国际化流程统一错误类型
///
/// 文档级错误（读取失败、结构异常）可以隔离处理，配置错误在启动时直接失败
#[derive(Debug)]
pub enum I18nError {
    /// 文件操作相关错误
    FileOperation {
        /// 文件路径
        path: String,
        /// 操作类型（读取、写入、创建等）
        operation: String,
        /// 底层错误信息
        source: String,
    },

    /// 配置相关错误
    Configuration {
        /// 配置项名称
        field: String,
        /// 错误原因
        reason: String,
    },

    /// 数据模型（字段定义）错误
    Schema {
        /// 模型标识
        model: String,
        /// 错误原因
        reason: String,
    },

    /// 内容文档结构错误
    MalformedDocument {
        /// 文档路径
        path: String,
        /// 具体错误信息
        details: String,
    },

    /// 翻译目录（PO/MO）处理错误
    Catalog {
        /// 目录文件路径
        path: String,
        /// 错误详情
        details: String,
    },

    /// 外部工具调用错误
    ExternalTool {
        /// 工具名称
        tool: String,
        /// 错误详情
        details: String,
    },

    /// 内部处理错误（包装anyhow::Error）
    Internal {
        /// 包装的错误
        source: AnyhowError,
    },
}

impl fmt::Display for I18nError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            I18nError::FileOperation { path, operation, source } => {
                write!(f, "文件{}操作失败 [{}]: {}", operation, path, source)
            }
            I18nError::Configuration { field, reason } => {
                write!(f, "配置错误 [{}]: {}", field, reason)
            }
            I18nError::Schema { model, reason } => {
                write!(f, "数据模型错误 [{}]: {}", model, reason)
            }
            I18nError::MalformedDocument { path, details } => {
                write!(f, "文档结构错误 [{}]: {}", path, details)
            }
            I18nError::Catalog { path, details } => {
                write!(f, "翻译目录错误 [{}]: {}", path, details)
            }
            I18nError::ExternalTool { tool, details } => {
                write!(f, "外部工具{}执行失败: {}", tool, details)
            }
            I18nError::Internal { source } => {
                write!(f, "内部处理错误: {}", source)
            }
        }
    }
}

impl std::error::Error for I18nError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            I18nError::Internal { source } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl I18nError {
    /// 是否为致命错误（配置类错误需要立即终止）
    pub fn is_fatal(&self) -> bool {
        matches!(self, I18nError::Configuration { .. } | I18nError::Schema { .. })
    }
}

/// 国际化流程结果类型别名
pub type Result<T> = std::result::Result<T, I18nError>;

/// 便捷的错误创建宏
#[macro_export]
macro_rules! i18n_error {
    (file_op, $path:expr, $op:expr, $source:expr) => {
        $crate::error::I18nError::FileOperation {
            path: $path.to_string(),
            operation: $op.to_string(),
            source: $source.to_string(),
        }
    };
    (config, $field:expr, $reason:expr) => {
        $crate::error::I18nError::Configuration {
            field: $field.to_string(),
            reason: $reason.to_string(),
        }
    };
    (schema, $model:expr, $reason:expr) => {
        $crate::error::I18nError::Schema {
            model: $model.to_string(),
            reason: $reason.to_string(),
        }
    };
    (document, $path:expr, $details:expr) => {
        $crate::error::I18nError::MalformedDocument {
            path: $path.to_string(),
            details: $details.to_string(),
        }
    };
    (catalog, $path:expr, $details:expr) => {
        $crate::error::I18nError::Catalog {
            path: $path.to_string(),
            details: $details.to_string(),
        }
    };
    (tool, $tool:expr, $details:expr) => {
        $crate::error::I18nError::ExternalTool {
            tool: $tool.to_string(),
            details: $details.to_string(),
        }
    };
}

/// 从anyhow::Error转换为I18nError
impl From<AnyhowError> for I18nError {
    fn from(error: AnyhowError) -> Self {
        I18nError::Internal { source: error }
    }
}

/// 从std::io::Error转换为I18nError
impl From<std::io::Error> for I18nError {
    fn from(error: std::io::Error) -> Self {
        I18nError::FileOperation {
            path: "unknown".to_string(),
            operation: "io".to_string(),
            source: error.to_string(),
        }
    }
}

/// 从toml反序列化错误转换为I18nError
impl From<toml::de::Error> for I18nError {
    fn from(error: toml::de::Error) -> Self {
        I18nError::Configuration {
            field: "toml".to_string(),
            reason: error.to_string(),
        }
    }
}
