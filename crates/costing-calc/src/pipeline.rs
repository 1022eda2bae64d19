//! 費用與加成管線
//!
//! 兩個依序階段：坯布（Grey）→ RFD，每階段先得成本再推導售價。

use costing_core::breakdown::PER_HUNDRED;
use costing_core::{checked_add, checked_mul, CostingConfig, CostingError, Result, RfdShortageRule};
use rust_decimal::Decimal;

/// 紗線利息率
pub const INTEREST_RATE: Decimal = Decimal::from_parts(4, 0, 0, false, 2);

/// 單一階段的成本與售價（每單位長度）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StagePrice {
    pub cost_per_unit: Decimal,
    pub sale_per_unit: Decimal,
}

impl StagePrice {
    pub fn cost_100(&self) -> Decimal {
        self.cost_per_unit * PER_HUNDRED
    }

    pub fn sale_100(&self) -> Decimal {
        self.sale_per_unit * PER_HUNDRED
    }
}

/// 管線輸出
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingChain {
    pub weaving_charge_100: Decimal,
    pub interest_100: Decimal,
    pub grey: StagePrice,
    pub rfd: StagePrice,
}

/// 費用與加成管線
pub struct ChargePipeline;

impl ChargePipeline {
    /// 執行管線
    ///
    /// 輸入的經緯成本皆為每百單位數值，且已通過配置驗證。
    pub fn run(
        config: &CostingConfig,
        warp_cost_100: Decimal,
        weft_cost_100: Decimal,
        total_picks: Decimal,
    ) -> Result<PricingChain> {
        let weaving_charge_100 = Self::weaving_charge_100(config.weaving_rate_per_pick, total_picks)?;
        let yarn_cost_100 = checked_add("yarn_cost", warp_cost_100, weft_cost_100)?;
        let interest_100 = if config.include_interest {
            checked_mul("interest", yarn_cost_100, INTEREST_RATE)?
        } else {
            Decimal::ZERO
        };
        tracing::debug!("織造費 / 100: {}，利息 / 100: {}", weaving_charge_100, interest_100);

        let grey_cost_100 = checked_add(
            "grey_cost",
            checked_add("grey_cost", yarn_cost_100, weaving_charge_100)?,
            interest_100,
        )?;
        let grey_cost_per_unit = grey_cost_100 / PER_HUNDRED;
        let grey = StagePrice {
            cost_per_unit: grey_cost_per_unit,
            sale_per_unit: Self::margin_on_sale(
                "grey_markup_percent",
                grey_cost_per_unit,
                config.grey_markup_percent,
            )?,
        };
        tracing::debug!("坯布階段：成本 {}，售價 {}", grey.cost_per_unit, grey.sale_per_unit);

        let rfd_cost_per_unit = Self::rfd_cost_per_unit(config, grey.cost_per_unit)?;
        let rfd = StagePrice {
            cost_per_unit: rfd_cost_per_unit,
            sale_per_unit: Self::margin_on_sale(
                "rfd_markup_percent",
                rfd_cost_per_unit,
                config.rfd_markup_percent,
            )?,
        };
        tracing::debug!(
            "RFD 階段（{:?}）：成本 {}，售價 {}",
            config.rfd_shortage_rule,
            rfd.cost_per_unit,
            rfd.sale_per_unit
        );

        Ok(PricingChain {
            weaving_charge_100,
            interest_100,
            grey,
            rfd,
        })
    }

    /// 織造費 / 100 = 每緯費率 × 總緯密 × 100
    pub fn weaving_charge_100(rate_per_pick: Decimal, total_picks: Decimal) -> Result<Decimal> {
        let per_unit = checked_mul("weaving_charge", rate_per_pick, total_picks)?;
        checked_mul("weaving_charge", per_unit, PER_HUNDRED)
    }

    /// 售價毛利率：sale = cost / (1 - m / 100)
    ///
    /// m = 0 時售價即成本；m >= 100 回傳 `MarkupOutOfRange`。
    pub fn margin_on_sale(field: &'static str, cost: Decimal, markup_percent: Decimal) -> Result<Decimal> {
        if markup_percent.is_zero() {
            return Ok(cost);
        }
        let kept = Decimal::ONE - markup_percent / PER_HUNDRED;
        if kept <= Decimal::ZERO {
            return Err(CostingError::MarkupOutOfRange {
                field,
                value: markup_percent,
            });
        }
        cost.checked_div(kept).ok_or(CostingError::MarkupOutOfRange {
            field,
            value: markup_percent,
        })
    }

    /// RFD 成本（每單位長度）
    pub fn rfd_cost_per_unit(config: &CostingConfig, grey_cost_per_unit: Decimal) -> Result<Decimal> {
        let base = checked_add("rfd_cost", grey_cost_per_unit, config.rfd_charge_per_unit)?;
        match config.rfd_shortage_rule {
            RfdShortageRule::Percentage => {
                let factor = checked_add("rfd_cost", Decimal::ONE, config.rfd_shortage / PER_HUNDRED)?;
                checked_mul("rfd_cost", base, factor)
            }
            RfdShortageRule::FlatPerUnit => checked_add("rfd_cost", base, config.rfd_shortage),
        }
    }
}
