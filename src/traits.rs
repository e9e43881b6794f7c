use async_trait::async_trait;

use crate::chains::{FieldSlot, ScrollMetrics};
use crate::error::ScraperError;

/// スクロール位置の制御
#[async_trait]
pub trait Viewport: Send {
    /// `step` だけ下にスクロールし、スクロール後の位置を返す
    ///
    /// ページが閉じられている場合は `ScraperError::Navigation` を返す（ローカルでのリトライなし）。
    async fn advance(&mut self, step: u32) -> Result<ScrollMetrics, ScraperError>;
}

/// 描画済みの行から列の値を読み取る
///
/// セレクタ戦略ごとに1実装。テストではブラウザなしの実装に差し替える。
#[async_trait]
pub trait RowFieldReader: Send + Sync {
    type Row: Send + Sync;

    /// 行がチェーン詳細ページへのリンクを含むか
    async fn has_detail_link(&self, row: &Self::Row) -> Result<bool, ScraperError>;

    /// 列のテキストを読む。要素が無い・非表示の場合は `Ok(None)`
    async fn read_field(
        &self,
        row: &Self::Row,
        slot: FieldSlot,
    ) -> Result<Option<String>, ScraperError>;
}

/// 仮想スクロールテーブルを持つページ
#[async_trait]
pub trait TablePage: Viewport + RowFieldReader {
    /// ブラウザ起動 → 対象ページへ遷移
    async fn open(&mut self) -> Result<(), ScraperError>;

    /// 初回描画を促すスクロール
    async fn warm_up(&mut self) -> Result<(), ScraperError>;

    /// 現在DOMに存在する行（仮想リストのウィンドウ分のみ）
    async fn rendered_rows(&self) -> Result<Vec<Self::Row>, ScraperError>;

    /// リソース解放（複数回呼んでもよい）
    async fn close(&mut self) -> Result<(), ScraperError>;
}
