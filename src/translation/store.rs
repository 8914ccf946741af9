//! 持久化字符串与译文存储
//!
//! 基于 redb 的嵌入式存储，是跨构建的唯一事实来源。
//! 两张表对应两类记录：
//!
//! - `strings`: 键 → 源语言规范文本
//! - `translations`: (键, 语言) → 译文
//!
//! 进程内的缓存只是本存储的只读投影，每次写入都先落表再更新内存。

use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition};
use tracing::debug;

use crate::translation::error::TranslationResult;

const STRINGS: TableDefinition<&str, &str> = TableDefinition::new("strings");
const TRANSLATIONS: TableDefinition<(&str, &str), &str> = TableDefinition::new("translations");

/// 插入字符串记录的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StringInsert {
    /// 本次写入创建了记录
    Inserted,
    /// 键已被占用，携带已存在的规范文本（另一写入者先到）
    Existing(String),
}

/// redb 数据库封装
///
/// 打开即建表，之后的读事务不会遇到不存在的表。
/// redb 串行化写事务，插入前在同一写事务内复查即可实现
/// "先到者胜出"的冲突恢复。
pub struct LocaleStore {
    db: Database,
}

impl LocaleStore {
    /// 打开（必要时创建）存储文件
    pub fn open(path: &Path) -> TranslationResult<Self> {
        let db = Database::create(path)?;
        let tx = db.begin_write()?;
        {
            tx.open_table(STRINGS)?;
            tx.open_table(TRANSLATIONS)?;
        }
        tx.commit()?;
        debug!(path = %path.display(), "字符串存储已打开");
        Ok(Self { db })
    }

    /// 读出全部字符串记录 (键, 规范文本)
    pub fn load_strings(&self) -> TranslationResult<Vec<(String, String)>> {
        let tx = self.db.begin_read()?;
        let table = tx.open_table(STRINGS)?;
        let mut entries = Vec::new();
        for item in table.iter()? {
            let (key, text) = item?;
            entries.push((key.value().to_string(), text.value().to_string()));
        }
        Ok(entries)
    }

    /// 读出全部译文记录 (键, 语言, 译文)
    pub fn load_translations(&self) -> TranslationResult<Vec<(String, String, String)>> {
        let tx = self.db.begin_read()?;
        let table = tx.open_table(TRANSLATIONS)?;
        let mut entries = Vec::new();
        for item in table.iter()? {
            let (pair, text) = item?;
            let (key, locale) = pair.value();
            entries.push((key.to_string(), locale.to_string(), text.value().to_string()));
        }
        Ok(entries)
    }

    /// 不覆盖地插入字符串记录
    ///
    /// 键已存在时不做任何写入，返回占用该键的文本。
    pub fn insert_string_if_absent(
        &self,
        key: &str,
        text: &str,
    ) -> TranslationResult<StringInsert> {
        let tx = self.db.begin_write()?;
        let outcome;
        {
            let mut table = tx.open_table(STRINGS)?;
            // 先把守卫里的值取出来，结束对表的只读借用
            let current = table.get(key)?.map(|g| g.value().to_string());
            if let Some(existing) = current {
                outcome = StringInsert::Existing(existing);
            } else {
                table.insert(key, text)?;
                outcome = StringInsert::Inserted;
            }
        }
        tx.commit()?;
        Ok(outcome)
    }

    /// 不覆盖地插入译文记录（先写者胜出）
    ///
    /// 返回已存在的译文；`None` 表示本次写入生效。
    pub fn insert_translation_if_absent(
        &self,
        key: &str,
        locale: &str,
        text: &str,
    ) -> TranslationResult<Option<String>> {
        let tx = self.db.begin_write()?;
        let existing;
        {
            let mut table = tx.open_table(TRANSLATIONS)?;
            let current = table.get((key, locale))?.map(|g| g.value().to_string());
            if let Some(current) = current {
                existing = Some(current);
            } else {
                table.insert((key, locale), text)?;
                existing = None;
            }
        }
        tx.commit()?;
        Ok(existing)
    }
}
