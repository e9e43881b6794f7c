//! 結果ファイルへの追記
//!
//! 結果ファイルは「1回分の結果」を要素とするJSON配列。毎回全体を読み込み、
//! 新しいバッチを追加して書き戻す。

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::chains::ResultBatch;
use crate::error::ScraperError;

#[derive(Debug, Clone)]
pub struct ResultStore {
    path: PathBuf,
}

impl ResultStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 既存の結果を読み込む
    ///
    /// ファイルが無い・空・壊れている場合は空リストから始める。
    /// 配列でない単一の値は要素1つのリストとして扱う。
    pub fn load_history(&self) -> Vec<Value> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                error!("Error reading existing data from {:?}: {}", self.path, e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Array(items)) => items,
            Ok(single) => vec![single],
            Err(_) => {
                warn!(
                    "Existing {:?} is empty or corrupted JSON. Starting with a new list.",
                    self.path
                );
                Vec::new()
            }
        }
    }

    /// バッチを追記し、追記後の件数を返す
    pub fn append(&self, batch: &ResultBatch) -> Result<usize, ScraperError> {
        let mut history = self.load_history();
        history.push(serde_json::to_value(batch)?);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut buf = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        history.serialize(&mut serializer)?;
        std::fs::write(&self.path, buf)?;

        info!(
            "New data appended and saved to {:?} ({} batches)",
            self.path,
            history.len()
        );
        Ok(history.len())
    }
}
