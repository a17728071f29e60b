use std::path::{Path, PathBuf};

use url::Url;

use crate::constants::naming::{CONTENTS_ALT_PREFIX, CONTENTS_EXTENSION};

/// 初始化日志系统
pub fn init_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

/// 截断过长文本用于日志输出
pub fn truncate(text: &str, length: usize) -> String {
    if text.chars().count() > length {
        format!("{}..", text.chars().take(length).collect::<String>())
    } else {
        text.to_string()
    }
}

/// 把站点地址与页面路径拼接为绝对地址
pub fn absolute_url(base: &Url, url_path: &str) -> String {
    match base.join(url_path) {
        Ok(url) => url.to_string(),
        Err(_) => format!("{}{}", base, url_path.trim_start_matches('/')),
    }
}

/// 相对于项目根目录的路径，统一使用 `/` 分隔
pub fn relative_path(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// 生成某语言的内容文档路径: `<dir>/contents+<lang>.lr`
pub fn translated_path(source: &Path, language: &str) -> PathBuf {
    let file_name = format!("{}{}{}", CONTENTS_ALT_PREFIX, language, CONTENTS_EXTENSION);
    match source.parent() {
        Some(parent) => parent.join(file_name),
        None => PathBuf::from(file_name),
    }
}

/// 从列表中选出指定语言的条目，找不到时使用回退语言
///
/// 比较时忽略大小写和首尾空白。
pub fn choose_language<'a, T, F>(
    items: &'a [T],
    language: &str,
    fallback: &str,
    attribute: F,
) -> Option<&'a T>
where
    F: Fn(&T) -> &str,
{
    let language = language.trim().to_lowercase();
    let fallback = fallback.trim().to_lowercase();

    items
        .iter()
        .find(|item| attribute(*item).trim().to_lowercase() == language)
        .or_else(|| {
            items
                .iter()
                .find(|item| attribute(*item).trim().to_lowercase() == fallback)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 32), "short");
        assert_eq!(truncate("abcdef", 3), "abc..");
        assert_eq!(truncate("éèàç", 2), "éè..");
    }

    #[test]
    fn test_absolute_url() {
        let base = Url::parse("http://localhost/").unwrap();
        assert_eq!(absolute_url(&base, "/"), "http://localhost/");
        assert_eq!(absolute_url(&base, "/blog/first-post/"), "http://localhost/blog/first-post/");

        let nested = Url::parse("https://example.com/site/").unwrap();
        assert_eq!(absolute_url(&nested, "about/"), "https://example.com/site/about/");
    }

    #[test]
    fn test_relative_path() {
        let root = Path::new("/project");
        assert_eq!(
            relative_path(Path::new("/project/content/blog/contents.lr"), root),
            "content/blog/contents.lr"
        );
    }

    #[test]
    fn test_translated_path() {
        let path = translated_path(Path::new("content/blog/contents.lr"), "fr");
        assert_eq!(path, PathBuf::from("content/blog/contents+fr.lr"));
    }

    #[test]
    fn test_choose_language_with_fallback() {
        let items = vec![("EN ", "hello"), ("fr", "bonjour")];
        let pick = |lang: &str| choose_language(&items, lang, "en", |item| item.0).map(|i| i.1);

        assert_eq!(pick("FR"), Some("bonjour"));
        assert_eq!(pick("de"), Some("hello"));
        assert_eq!(choose_language(&items, "de", "it", |item| item.0), None);
    }
}
