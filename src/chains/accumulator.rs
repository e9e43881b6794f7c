use std::collections::HashSet;

use super::types::ChainRow;

/// 実行1回分の重複排除
///
/// スクロールごとに入れ替わる行のウィンドウを、重複のない一覧に変換する。
/// 最初に見つかった順序を保持する。
#[derive(Debug, Default)]
pub struct DedupAccumulator {
    seen: HashSet<String>,
    rows: Vec<ChainRow>,
}

impl DedupAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 受け入れた場合は `true`
    ///
    /// Name が `N/A` の行、既に見た Name の行は受け入れない。
    pub fn offer(&mut self, row: ChainRow) -> bool {
        if !row.has_name() || self.seen.contains(&row.name) {
            return false;
        }
        self.seen.insert(row.name.clone());
        self.rows.push(row);
        true
    }

    pub fn rows(&self) -> &[ChainRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_rows(self) -> Vec<ChainRow> {
        self.rows
    }
}
