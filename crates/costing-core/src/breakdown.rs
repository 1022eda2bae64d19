//! 成本明細模型（衍生結果，不作為資料來源）

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::SpecMode;

/// 每百單位長度換算倍數
pub const PER_HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// 單段緯紗明細（供顯示用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentDetail {
    /// 顯示標籤，例如 "Weft 1"
    pub label: String,
    pub picks: Decimal,
    pub mode: SpecMode,
    pub denier: Decimal,
    pub count: Option<Decimal>,
    pub price_per_kg: Decimal,
    pub yarn_name: Option<String>,

    /// 每百單位長度技術重量（不含損耗）
    pub weight_100: Decimal,

    /// 是否計入成本（單價 <= 0 的緯紗段僅計重量）
    pub cost_bearing: bool,
}

/// 成本明細
///
/// 坯布與 RFD 的成本、售價只保存每單位長度數值，每百單位數值一律由其 ×100 取得。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    /// 經紗技術重量 / 100
    pub warp_weight_100: Decimal,

    /// 緯紗技術重量 / 100
    pub weft_weight_100: Decimal,

    /// 布重 / 100（經緯皆不含損耗）
    pub fabric_weight_100: Decimal,

    /// 報價用布重 / 100（經紗含損耗、緯紗不含）
    pub fabric_weight_costing_100: Decimal,

    /// 經紗成本 / 100
    pub warp_cost_100: Decimal,

    /// 緯紗成本 / 100
    pub weft_cost_100: Decimal,

    /// 織造費 / 100
    pub weaving_charge_100: Decimal,

    /// 紗線利息 / 100
    pub interest_100: Decimal,

    pub grey_cost_per_unit: Decimal,
    pub grey_sale_per_unit: Decimal,
    pub rfd_cost_per_unit: Decimal,
    pub rfd_sale_per_unit: Decimal,

    /// 實際使用的經紗丹尼與單價
    pub warp_denier: Decimal,
    pub warp_price_per_kg: Decimal,

    /// 總緯密與有效緯紗丹尼、單價
    pub total_picks: Decimal,
    pub effective_weft_denier: Decimal,
    pub effective_weft_price: Decimal,

    /// 緯紗聚合是否回退至舊版純量欄位
    pub weft_fallback_used: bool,

    /// 各段緯紗明細
    pub segments: Vec<SegmentDetail>,
}

impl CostBreakdown {
    pub fn grey_cost_100(&self) -> Decimal {
        self.grey_cost_per_unit * PER_HUNDRED
    }

    pub fn grey_sale_100(&self) -> Decimal {
        self.grey_sale_per_unit * PER_HUNDRED
    }

    pub fn rfd_cost_100(&self) -> Decimal {
        self.rfd_cost_per_unit * PER_HUNDRED
    }

    pub fn rfd_sale_100(&self) -> Decimal {
        self.rfd_sale_per_unit * PER_HUNDRED
    }

    /// 轉為報價單列
    pub fn pricing_row(&self, quality_name: &str) -> PricingSheetRow {
        PricingSheetRow {
            quality_name: quality_name.to_string(),
            fabric_weight_costing_100: self.fabric_weight_costing_100,
            grey_sale_per_unit: self.grey_sale_per_unit,
            rfd_sale_per_unit: self.rfd_sale_per_unit,
        }
    }
}

/// 報價單列：布種名稱、報價用布重 / 100、坯布售價、RFD 售價
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingSheetRow {
    pub quality_name: String,
    pub fabric_weight_costing_100: Decimal,
    pub grey_sale_per_unit: Decimal,
    pub rfd_sale_per_unit: Decimal,
}

impl PricingSheetRow {
    /// 顯示用四捨五入：重量 3 位、價格 2 位小數
    pub fn rounded(&self) -> Self {
        Self {
            quality_name: self.quality_name.clone(),
            fabric_weight_costing_100: self.fabric_weight_costing_100.round_dp(3),
            grey_sale_per_unit: self.grey_sale_per_unit.round_dp(2),
            rfd_sale_per_unit: self.rfd_sale_per_unit.round_dp(2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breakdown(grey_cost: Decimal, grey_sale: Decimal) -> CostBreakdown {
        CostBreakdown {
            warp_weight_100: Decimal::from(4),
            weft_weight_100: Decimal::new(182, 2),
            fabric_weight_100: Decimal::new(582, 2),
            fabric_weight_costing_100: Decimal::new(618, 2),
            warp_cost_100: Decimal::ZERO,
            weft_cost_100: Decimal::ZERO,
            weaving_charge_100: Decimal::ZERO,
            interest_100: Decimal::ZERO,
            grey_cost_per_unit: grey_cost,
            grey_sale_per_unit: grey_sale,
            rfd_cost_per_unit: grey_cost,
            rfd_sale_per_unit: grey_sale,
            warp_denier: Decimal::from(120),
            warp_price_per_kg: Decimal::from(450),
            total_picks: Decimal::from(48),
            effective_weft_denier: Decimal::from(75),
            effective_weft_price: Decimal::from(220),
            weft_fallback_used: false,
            segments: Vec::new(),
        }
    }

    #[test]
    fn test_per_hundred_accessors() {
        let b = breakdown(Decimal::new(323738848, 7), Decimal::new(4012345, 5));
        assert_eq!(b.grey_cost_100(), Decimal::new(323738848, 5));
        assert_eq!(b.grey_sale_100(), Decimal::new(4012345, 3));
        assert_eq!(b.rfd_cost_100(), b.grey_cost_per_unit * Decimal::ONE_HUNDRED);
    }

    #[test]
    fn test_pricing_row_rounding() {
        let b = breakdown(Decimal::new(323738848, 7), Decimal::new(4012345, 5));
        let row = b.pricing_row("SANTOON").rounded();
        assert_eq!(row.quality_name, "SANTOON");
        assert_eq!(row.fabric_weight_costing_100, Decimal::new(618, 2));
        assert_eq!(row.grey_sale_per_unit, Decimal::new(4012, 2));
    }
}
