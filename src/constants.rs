/// 国际化流程常量
///
/// 该文件定义了文件命名约定、默认配置值和模板头部，方便统一管理和维护

/// 文件与目录命名约定
pub mod naming {
    /// 主内容文档文件名
    pub const CONTENTS_FILENAME: &str = "contents.lr";

    /// 内容文档替代版本文件名前缀（`contents+<lang>.lr`）
    pub const CONTENTS_ALT_PREFIX: &str = "contents+";

    /// 内容文档扩展名
    pub const CONTENTS_EXTENSION: &str = ".lr";

    /// 翻译模板文件名
    pub const TEMPLATE_FILENAME: &str = "contents.pot";

    /// 各语言PO文件名前缀（`contents+<lang>.po`）
    pub const PO_FILENAME_PREFIX: &str = "contents+";

    /// 编译目录根名
    pub const COMPILED_DIR: &str = "_compiled";

    /// gettext消息目录
    pub const LC_MESSAGES_DIR: &str = "LC_MESSAGES";

    /// 编译后的MO文件名
    pub const MO_FILENAME: &str = "contents.mo";

    /// 外部模板提取器输出的临时模板文件名
    pub const TEMPLATES_POT_FILENAME: &str = "templates.pot";

    /// 默认配置文件位置（相对于项目根目录）
    pub const CONFIG_PATH: &str = "configs/i18n.toml";
}

/// 默认配置值
pub mod defaults {
    /// 源内容语言
    pub const CONTENT_LANGUAGE: &str = "en";

    /// 翻译文件目录
    pub const I18N_PATH: &str = "i18n";

    /// 构建来源位置时使用的公开站点地址
    pub const URL_PREFIX: &str = "http://localhost/";

    /// 内容目录
    pub const CONTENT_DIR: &str = "content";

    /// 页面模型目录
    pub const MODELS_DIR: &str = "models";

    /// 流式区块模型目录
    pub const FLOWBLOCKS_DIR: &str = "flowblocks";

    /// 未声明 `_model` 时使用的模型
    pub const DEFAULT_MODEL: &str = "page";
}

/// 翻译记忆相关常量
pub mod memory {
    /// 模板中动态添加的条目使用的来源标记
    pub const DYNAMIC_LOCATION: &str = "(dynamic)";

    /// 调试日志中文本截断长度
    pub const LOG_TRUNCATE_LENGTH: usize = 32;

    /// POT模板头部，`{now}` 与 `{language}` 在渲染时替换
    pub const POT_HEADER: &str = r#"msgid ""
msgstr ""
"Project-Id-Version: PACKAGE VERSION\n"
"Report-Msgid-Bugs-To: \n"
"POT-Creation-Date: {now}\n"
"PO-Revision-Date: YEAR-MO-DA HO:MI+ZONE\n"
"Last-Translator: FULL NAME <EMAIL@ADDRESS>\n"
"Language-Team: {language} <LL@li.org>\n"
"Language: {language}\n"
"MIME-Version: 1.0\n"
"Content-Type: text/plain; charset=UTF-8\n"
"Content-Transfer-Encoding: 8bit\n"
"Plural-Forms: nplurals=2; plural=(n != 1);\n"

"#;

    /// 解析PO/POT文件时头部必须包含的字段
    pub const REQUIRED_HEADER_KEYS: [&str; 9] = [
        "Project-Id-Version",
        "POT-Creation-Date",
        "PO-Revision-Date",
        "Language-Team",
        "MIME-Version",
        "Content-Type",
        "Content-Transfer-Encoding",
        "Language",
        "Plural-Forms",
    ];
}

/// 内容文档格式常量
pub mod format {
    /// 字段分隔线
    pub const FIELD_SEPARATOR: &str = "---";

    /// 当前层级区块标记的井号数量
    pub const BLOCK_MARKER_HASHES: usize = 4;

    /// 以 `_` 开头的字段是系统字段，例如 `_model`
    pub const MODEL_FIELD: &str = "_model";
}
