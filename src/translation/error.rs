//! 翻译模块统一错误处理
//!
//! 提供结构化错误类型和错误处理机制

use std::path::PathBuf;

use thiserror::Error;

/// 翻译操作的结果类型
pub type TranslationResult<T> = Result<T, TranslationError>;

/// 翻译错误类型
#[derive(Error, Debug)]
pub enum TranslationError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 持久化存储错误
    #[error("存储错误: {0}")]
    Store(String),

    /// 翻译服务错误
    #[error("翻译服务错误: {0}")]
    Provider(String),

    /// 超时错误
    #[error("翻译请求超时: {0}")]
    Timeout(String),

    /// 单个文档处理错误
    #[error("文档处理失败 {path}: {reason}")]
    Document { path: PathBuf, reason: String },

    /// IO错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
}

impl TranslationError {
    /// 判断错误是否对整个构建致命
    ///
    /// 存储与配置错误终止整个构建；文档级和翻译服务错误
    /// 只影响当前(文档, 语言)对，构建继续。
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TranslationError::Store(_) | TranslationError::Config(_)
        )
    }
}

impl From<reqwest::Error> for TranslationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TranslationError::Timeout(err.to_string())
        } else {
            TranslationError::Provider(err.to_string())
        }
    }
}

impl From<redb::DatabaseError> for TranslationError {
    fn from(err: redb::DatabaseError) -> Self {
        TranslationError::Store(err.to_string())
    }
}

impl From<redb::TransactionError> for TranslationError {
    fn from(err: redb::TransactionError) -> Self {
        TranslationError::Store(err.to_string())
    }
}

impl From<redb::TableError> for TranslationError {
    fn from(err: redb::TableError) -> Self {
        TranslationError::Store(err.to_string())
    }
}

impl From<redb::StorageError> for TranslationError {
    fn from(err: redb::StorageError) -> Self {
        TranslationError::Store(err.to_string())
    }
}

impl From<redb::CommitError> for TranslationError {
    fn from(err: redb::CommitError) -> Self {
        TranslationError::Store(err.to_string())
    }
}
