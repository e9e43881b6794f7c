use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("ブラウザ初期化エラー: {0}")]
    BrowserInit(String),

    #[error("ナビゲーションエラー: {0}")]
    Navigation(String),

    #[error("JavaScript実行エラー: {0}")]
    JavaScript(String),

    #[error("要素の読み取りエラー: {0}")]
    Element(String),

    #[error("JSONエラー: {0}")]
    Json(String),

    #[error("ファイル操作エラー: {0}")]
    FileIO(#[from] std::io::Error),

    #[error("設定エラー: {0}")]
    Config(String),

    #[error("キャンセルされました")]
    Cancelled,
}

impl ScraperError {
    /// 実行全体を中断すべきエラーか（行単位の読み取り失敗は継続可能）
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ScraperError::Element(_))
    }
}

impl From<serde_json::Error> for ScraperError {
    fn from(e: serde_json::Error) -> Self {
        ScraperError::Json(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_errors_are_recoverable() {
        assert!(!ScraperError::Element("detached".into()).is_fatal());
        assert!(ScraperError::Navigation("page closed".into()).is_fatal());
        assert!(ScraperError::Cancelled.is_fatal());
    }
}
