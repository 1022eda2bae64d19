//! # Costing Core
//!
//! 布種（Quality）成本核算的核心資料模型與類型定義

pub mod breakdown;
pub mod config;
pub mod draft;
pub mod recipe;
pub mod store;
pub mod weft;
pub mod yarn;

use rust_decimal::Decimal;

// Re-export 主要類型
pub use breakdown::{CostBreakdown, PricingSheetRow, SegmentDetail};
pub use config::{CostingConfig, RfdShortageRule};
pub use draft::RecipeDraft;
pub use recipe::{EndsMode, Recipe, WarpSpec};
pub use store::{InMemoryRecipeStore, QualityRow, RecipeStore, StoredRecipe, StoredSummary};
pub use weft::{SpecMode, WeftSegment, WeftSpec};
pub use yarn::{InMemoryPriceRegistry, PriceRegistry, YarnQuote, YarnRole};

/// 成本核算錯誤類型
#[derive(Debug, thiserror::Error)]
pub enum CostingError {
    #[error("無效的輸入 {field}: {value}")]
    InvalidInput { field: &'static str, value: Decimal },

    #[error("加成百分比超出範圍 {field}: {value}（必須 >= 0 且 < 100）")]
    MarkupOutOfRange { field: &'static str, value: Decimal },

    #[error("無法核算成本: {0}")]
    NotCostable(String),

    #[error("找不到布種配方: {0}")]
    RecipeNotFound(uuid::Uuid),

    #[error("找不到紗線報價: {0}")]
    QuoteNotFound(u64),

    #[error("無效的緯紗段索引: {0}")]
    InvalidSegmentIndex(usize),

    #[error("配方至少需要保留一段緯紗")]
    LastSegment,

    #[error("缺少必要欄位: {0}")]
    MissingField(&'static str),

    #[error("序列化錯誤: {0}")]
    Serialization(String),

    #[error("數值溢位: {0}")]
    Overflow(&'static str),
}

pub type Result<T> = std::result::Result<T, CostingError>;

impl From<serde_json::Error> for CostingError {
    fn from(err: serde_json::Error) -> Self {
        CostingError::Serialization(err.to_string())
    }
}

/// 檢查數值為正，否則回傳 `InvalidInput`
pub fn ensure_positive(field: &'static str, value: Decimal) -> Result<()> {
    if value > Decimal::ZERO {
        Ok(())
    } else {
        Err(CostingError::InvalidInput { field, value })
    }
}

/// 檢查數值非負，否則回傳 `InvalidInput`
pub fn ensure_non_negative(field: &'static str, value: Decimal) -> Result<()> {
    if value >= Decimal::ZERO {
        Ok(())
    } else {
        Err(CostingError::InvalidInput { field, value })
    }
}

/// 乘法，超出 Decimal 範圍時回傳 `Overflow`
pub fn checked_mul(field: &'static str, lhs: Decimal, rhs: Decimal) -> Result<Decimal> {
    lhs.checked_mul(rhs).ok_or(CostingError::Overflow(field))
}

/// 加法，超出 Decimal 範圍時回傳 `Overflow`
pub fn checked_add(field: &'static str, lhs: Decimal, rhs: Decimal) -> Result<Decimal> {
    lhs.checked_add(rhs).ok_or(CostingError::Overflow(field))
}
