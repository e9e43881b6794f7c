//! チェーン一覧関連の型定義

use chrono::{DateTime, Local};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// 値を読み取れなかった列に入れるプレースホルダー
pub const NOT_AVAILABLE: &str = "N/A";

/// テーブルの1行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainRow {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Protocols")]
    pub protocols: String,
    #[serde(rename = "TVL")]
    pub tvl: String,
}

impl ChainRow {
    pub fn new(
        name: impl Into<String>,
        protocols: impl Into<String>,
        tvl: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            protocols: protocols.into(),
            tvl: tvl.into(),
        }
    }

    pub fn has_name(&self) -> bool {
        self.name != NOT_AVAILABLE
    }
}

/// 行内の列の位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldSlot {
    Name,
    Protocols,
    Tvl,
}

impl FieldSlot {
    /// 行要素を起点とするCSSセレクタ
    pub fn selector(self) -> &'static str {
        match self {
            FieldSlot::Name => "div:nth-child(1) a",
            FieldSlot::Protocols => "div:nth-child(2)",
            FieldSlot::Tvl => "div:nth-child(7)",
        }
    }
}

/// 行の抽出結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowExtraction {
    Row(ChainRow),
    /// 読み取り中に行が消えた等。実行は継続する
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Probe { slot: FieldSlot, message: String },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Probe { slot, message } => {
                write!(f, "failed to read {:?} cell: {}", slot, message)
            }
        }
    }
}

/// スクロール後の位置情報
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollMetrics {
    pub scroll_y: f64,
    pub viewport_height: f64,
    pub document_height: f64,
}

impl ScrollMetrics {
    /// `scrollY + innerHeight >= scrollHeight`
    pub fn is_at_bottom(&self) -> bool {
        self.scroll_y + self.viewport_height >= self.document_height
    }
}

/// 1回のスクレイプ結果
#[derive(Debug, Clone)]
pub struct ResultBatch {
    started_at: DateTime<Local>,
    rows: Vec<ChainRow>,
}

impl ResultBatch {
    pub fn new(started_at: DateTime<Local>, rows: Vec<ChainRow>) -> Self {
        Self { started_at, rows }
    }

    /// 例: `Scraping at 2024-05-01 12:00:00`
    pub fn label(&self) -> String {
        format!("Scraping at {}", self.started_at.format("%Y-%m-%d %H:%M:%S"))
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
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
}

#[derive(Serialize)]
struct DataList<'a> {
    data_list: &'a [ChainRow],
}

/// `{"Scraping at ...": {"data_list": [...]}}` の形で出力する
impl Serialize for ResultBatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.label(), &DataList { data_list: &self.rows })?;
        map.end()
    }
}
