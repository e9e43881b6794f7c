//! 行の抽出

use tracing::error;

use crate::traits::RowFieldReader;

use super::types::{ChainRow, FieldSlot, RowExtraction, SkipReason, NOT_AVAILABLE};

/// 描画済みの行から Name / Protocols / TVL を取り出す
pub struct RowExtractor;

impl RowExtractor {
    /// 欠けている列・非表示の列は `N/A` になる。
    ///
    /// 読み取り中のエラー（仮想化で行が外された等）は `RowExtraction::Skipped` として返し、
    /// 呼び出し側の実行は止めない。
    pub async fn extract<R>(reader: &R, row: &R::Row) -> RowExtraction
    where
        R: RowFieldReader + ?Sized,
    {
        match Self::read_row(reader, row).await {
            Ok(row) => RowExtraction::Row(row),
            Err(reason) => {
                error!("Error on stage of extracting data from element: {}", reason);
                RowExtraction::Skipped(reason)
            }
        }
    }

    async fn read_row<R>(reader: &R, row: &R::Row) -> Result<ChainRow, SkipReason>
    where
        R: RowFieldReader + ?Sized,
    {
        Ok(ChainRow {
            name: Self::read_cell(reader, row, FieldSlot::Name).await?,
            protocols: Self::read_cell(reader, row, FieldSlot::Protocols).await?,
            tvl: Self::read_cell(reader, row, FieldSlot::Tvl).await?,
        })
    }

    async fn read_cell<R>(reader: &R, row: &R::Row, slot: FieldSlot) -> Result<String, SkipReason>
    where
        R: RowFieldReader + ?Sized,
    {
        match reader.read_field(row, slot).await {
            Ok(Some(text)) => Ok(text.trim().to_string()),
            Ok(None) => Ok(NOT_AVAILABLE.to_string()),
            Err(e) => Err(SkipReason::Probe {
                slot,
                message: e.to_string(),
            }),
        }
    }
}
