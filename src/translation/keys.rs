//! 字符串键派生
//!
//! 将源语言文本映射为稳定的短键：空白折叠为下划线后截断。
//! 截断意味着派生结果只是"候选键"，键与文本的最终绑定
//! 由 [`StringCatalog`](crate::translation::catalog::StringCatalog) 裁决。

use std::sync::OnceLock;

use regex::Regex;

/// 候选键的最大字符数
pub const MAX_KEY_CHARS: usize = 20;

fn whitespace_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

/// 从源文本派生候选键
///
/// 纯函数：同一输入在任何进程中都产生同一输出。
/// 先去除首尾空白，再把所有空白串折叠为单个 `_`，
/// 最后在字符边界截断到 [`MAX_KEY_CHARS`]。
pub fn derive_key(text: &str) -> String {
    let collapsed = whitespace_regex().replace_all(text.trim(), "_");
    collapsed.chars().take(MAX_KEY_CHARS).collect()
}
