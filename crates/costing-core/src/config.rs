//! 費用與加成參數配置

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{CostingError, Result};

/// RFD 損耗計算規則
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RfdShortageRule {
    /// 百分比膨脹：(坯布成本 + RFD 加工費) × (1 + 損耗% / 100)
    #[default]
    Percentage,

    /// 每單位長度固定金額：坯布成本 + RFD 加工費 + 損耗金額
    FlatPerUnit,
}

/// 布種配方的費用與加成參數
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostingConfig {
    /// 每緯織造費（每單位長度）
    pub weaving_rate_per_pick: Decimal,

    /// 坯布加成%（售價毛利率）
    pub grey_markup_percent: Decimal,

    /// RFD 加工費（每單位長度）
    pub rfd_charge_per_unit: Decimal,

    /// RFD 損耗（依 `rfd_shortage_rule` 解讀為百分比或固定金額）
    pub rfd_shortage: Decimal,

    /// RFD 加成%（售價毛利率）
    pub rfd_markup_percent: Decimal,

    /// 坯布成本是否計入紗線利息
    pub include_interest: bool,

    /// RFD 損耗計算規則
    #[serde(default)]
    pub rfd_shortage_rule: RfdShortageRule,
}

impl CostingConfig {
    /// 創建新的配置（加成與 RFD 參數預設為 0，計入利息）
    pub fn new(weaving_rate_per_pick: Decimal) -> Self {
        Self {
            weaving_rate_per_pick,
            grey_markup_percent: Decimal::ZERO,
            rfd_charge_per_unit: Decimal::ZERO,
            rfd_shortage: Decimal::ZERO,
            rfd_markup_percent: Decimal::ZERO,
            include_interest: true,
            rfd_shortage_rule: RfdShortageRule::Percentage,
        }
    }

    /// 建構器模式：設置坯布加成%
    pub fn with_grey_markup(mut self, percent: Decimal) -> Self {
        self.grey_markup_percent = percent;
        self
    }

    /// 建構器模式：設置 RFD 加工費
    pub fn with_rfd_charge(mut self, charge_per_unit: Decimal) -> Self {
        self.rfd_charge_per_unit = charge_per_unit;
        self
    }

    /// 建構器模式：設置 RFD 損耗%
    pub fn with_rfd_shortage_percent(mut self, percent: Decimal) -> Self {
        self.rfd_shortage = percent;
        self.rfd_shortage_rule = RfdShortageRule::Percentage;
        self
    }

    /// 建構器模式：設置 RFD 損耗為每單位固定金額
    pub fn with_rfd_shortage_flat(mut self, amount_per_unit: Decimal) -> Self {
        self.rfd_shortage = amount_per_unit;
        self.rfd_shortage_rule = RfdShortageRule::FlatPerUnit;
        self
    }

    /// 建構器模式：設置 RFD 加成%
    pub fn with_rfd_markup(mut self, percent: Decimal) -> Self {
        self.rfd_markup_percent = percent;
        self
    }

    /// 建構器模式：設置是否計入紗線利息
    pub fn with_interest(mut self, include: bool) -> Self {
        self.include_interest = include;
        self
    }

    /// 驗證參數
    ///
    /// 加成% 必須 >= 0 且 < 100（售價毛利率在 100% 時除數為零）。
    pub fn validate(&self) -> Result<()> {
        crate::ensure_non_negative("weaving_rate_per_pick", self.weaving_rate_per_pick)?;
        crate::ensure_non_negative("rfd_charge_per_unit", self.rfd_charge_per_unit)?;
        crate::ensure_non_negative("rfd_shortage", self.rfd_shortage)?;
        ensure_markup("grey_markup_percent", self.grey_markup_percent)?;
        ensure_markup("rfd_markup_percent", self.rfd_markup_percent)?;
        Ok(())
    }
}

fn ensure_markup(field: &'static str, value: Decimal) -> Result<()> {
    if value < Decimal::ZERO || value >= Decimal::ONE_HUNDRED {
        return Err(CostingError::MarkupOutOfRange { field, value });
    }
    Ok(())
}
