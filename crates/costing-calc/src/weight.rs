//! 重量與成本聚合

use costing_core::weft::WeftScalars;
use costing_core::{checked_add, checked_mul, Result, SegmentDetail, SpecMode, WeftSegment};
use rust_decimal::Decimal;

use crate::resolver::ResolvedYarn;

/// 線密度換算除數：weight / 100 = 長度 × 丹尼 / 90000
pub const WEIGHT_DIVISOR: Decimal = Decimal::from_parts(90000, 0, 0, false, 0);

/// 經紗損耗係數（僅用於成本）
pub const WARP_SHORTAGE: Decimal = Decimal::from_parts(109, 0, 0, false, 2);

/// 緯紗損耗係數（僅用於成本）
pub const WEFT_SHORTAGE: Decimal = Decimal::from_parts(103, 0, 0, false, 2);

/// 解析後的緯紗段
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSegment {
    pub picks: Decimal,
    pub mode: SpecMode,
    pub denier: Decimal,
    pub count: Option<Decimal>,
    pub price_per_kg: Decimal,
    pub yarn_name: Option<String>,
}

impl ResolvedSegment {
    pub fn new(segment: &WeftSegment, resolved: ResolvedYarn) -> Self {
        Self {
            picks: segment.picks,
            mode: segment.mode,
            denier: resolved.denier,
            count: resolved.count,
            price_per_kg: resolved.price_per_kg,
            yarn_name: segment.yarn_name.clone(),
        }
    }

    fn from_scalars(scalars: WeftScalars) -> Self {
        Self {
            picks: scalars.picks,
            mode: SpecMode::Denier,
            denier: scalars.denier,
            count: None,
            price_per_kg: scalars.price_per_kg,
            yarn_name: None,
        }
    }

    /// 可計重量（緯密與丹尼皆為正）
    pub fn has_weight(&self) -> bool {
        self.picks > Decimal::ZERO && self.denier > Decimal::ZERO
    }

    /// 參與聚合與成本（緯密、丹尼、單價皆為正）
    pub fn is_active(&self) -> bool {
        self.has_weight() && self.price_per_kg > Decimal::ZERO
    }
}

/// 經紗重量與成本
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WarpTotals {
    pub weight_100: Decimal,
    pub weight_shortage_100: Decimal,
    pub cost_100: Decimal,
}

/// 緯紗重量與成本
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeftTotals {
    pub weight_100: Decimal,
    pub weight_shortage_100: Decimal,
    pub cost_100: Decimal,
    pub total_picks: Decimal,
}

/// 有效緯紗（多段加權平均）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectiveWeft {
    pub total_picks: Decimal,
    pub denier: Decimal,
    pub price_per_kg: Decimal,
    /// 是否回退至舊版純量欄位
    pub fallback_used: bool,
}

/// 重量與成本聚合器
///
/// 所有乘法與加總皆檢查溢位，超出 Decimal 範圍時回傳 `CostingError::Overflow`。
pub struct WeightAggregator;

impl WeightAggregator {
    /// 經紗技術重量 / 100（不含損耗，不乘 RS）
    pub fn warp_weight_100(ends: Decimal, denier: Decimal) -> Result<Decimal> {
        Ok(checked_mul("warp_weight", ends, denier)? / WEIGHT_DIVISOR)
    }

    /// 緯紗技術重量 / 100（不含損耗）
    pub fn weft_weight_100(picks: Decimal, denier: Decimal, rs: Decimal) -> Result<Decimal> {
        let picks_denier = checked_mul("weft_weight", picks, denier)?;
        Ok(checked_mul("weft_weight", picks_denier, rs)? / WEIGHT_DIVISOR)
    }

    /// 經紗重量與成本
    pub fn warp(ends: Decimal, denier: Decimal, price_per_kg: Decimal) -> Result<WarpTotals> {
        let weight_100 = Self::warp_weight_100(ends, denier)?;
        let weight_shortage_100 = checked_mul("warp_weight", weight_100, WARP_SHORTAGE)?;
        Ok(WarpTotals {
            weight_100,
            weight_shortage_100,
            cost_100: checked_mul("warp_cost", weight_shortage_100, price_per_kg)?,
        })
    }

    /// 計算有效緯紗
    ///
    /// - total_picks = Σ picks
    /// - denier = Σ(picks·denier) / total_picks
    /// - price = Σ(picks·denier·price) / Σ(picks·denier)
    ///
    /// 只有有效緯紗段參與；總和 <= 0 時回退至舊版純量，純量也無效則回傳 `None`。
    pub fn effective_weft(
        segments: &[ResolvedSegment],
        fallback: Option<WeftScalars>,
    ) -> Result<Option<EffectiveWeft>> {
        let (total_picks, sum_pd, sum_pdp) = segments
            .iter()
            .filter(|s| s.is_active())
            .try_fold(
                (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO),
                |(picks, pd, pdp), s| -> Result<_> {
                    let seg_pd = checked_mul("weft_weight", s.picks, s.denier)?;
                    let seg_pdp = checked_mul("weft_cost", seg_pd, s.price_per_kg)?;
                    Ok((
                        checked_add("total_picks", picks, s.picks)?,
                        checked_add("weft_weight", pd, seg_pd)?,
                        checked_add("weft_cost", pdp, seg_pdp)?,
                    ))
                },
            )?;

        if total_picks > Decimal::ZERO && sum_pd > Decimal::ZERO {
            return Ok(Some(EffectiveWeft {
                total_picks,
                denier: sum_pd / total_picks,
                price_per_kg: sum_pdp / sum_pd,
                fallback_used: false,
            }));
        }

        Ok(fallback.filter(WeftScalars::is_costable).map(|s| EffectiveWeft {
            total_picks: s.picks,
            denier: s.denier,
            price_per_kg: s.price_per_kg,
            fallback_used: true,
        }))
    }

    /// 以有效緯紗套用單緯公式
    pub fn weft_from_effective(effective: &EffectiveWeft, rs: Decimal) -> Result<WeftTotals> {
        let weight_100 = Self::weft_weight_100(effective.total_picks, effective.denier, rs)?;
        let weight_shortage_100 = checked_mul("weft_weight", weight_100, WEFT_SHORTAGE)?;
        Ok(WeftTotals {
            weight_100,
            weight_shortage_100,
            cost_100: checked_mul("weft_cost", weight_shortage_100, effective.price_per_kg)?,
            total_picks: effective.total_picks,
        })
    }

    /// 逐段加總重量與成本（不經有效丹尼換算）
    ///
    /// 沒有有效緯紗段時以回退純量視為單一段。
    pub fn sum_segments(
        segments: &[ResolvedSegment],
        fallback: Option<WeftScalars>,
        rs: Decimal,
    ) -> Result<Option<WeftTotals>> {
        let mut active: Vec<ResolvedSegment> =
            segments.iter().filter(|s| s.is_active()).cloned().collect();
        if active.is_empty() {
            let Some(scalars) = fallback.filter(WeftScalars::is_costable) else {
                return Ok(None);
            };
            active.push(ResolvedSegment::from_scalars(scalars));
        }

        let mut totals = WeftTotals {
            weight_100: Decimal::ZERO,
            weight_shortage_100: Decimal::ZERO,
            cost_100: Decimal::ZERO,
            total_picks: Decimal::ZERO,
        };
        for s in &active {
            let weight_100 = Self::weft_weight_100(s.picks, s.denier, rs)?;
            let weight_shortage_100 = checked_mul("weft_weight", weight_100, WEFT_SHORTAGE)?;
            let cost_100 = checked_mul("weft_cost", weight_shortage_100, s.price_per_kg)?;
            totals = WeftTotals {
                weight_100: checked_add("weft_weight", totals.weight_100, weight_100)?,
                weight_shortage_100: checked_add(
                    "weft_weight",
                    totals.weight_shortage_100,
                    weight_shortage_100,
                )?,
                cost_100: checked_add("weft_cost", totals.cost_100, cost_100)?,
                total_picks: checked_add("total_picks", totals.total_picks, s.picks)?,
            };
        }
        Ok(Some(totals))
    }

    /// 各段緯紗明細
    ///
    /// 緯密與丹尼皆為正的段才列出；單價 <= 0 者僅計重量。
    pub fn segment_details(segments: &[ResolvedSegment], rs: Decimal) -> Result<Vec<SegmentDetail>> {
        segments
            .iter()
            .filter(|s| s.has_weight())
            .enumerate()
            .map(|(i, s)| {
                Ok(SegmentDetail {
                    label: format!("Weft {}", i + 1),
                    picks: s.picks,
                    mode: s.mode,
                    denier: s.denier,
                    count: s.count,
                    price_per_kg: s.price_per_kg,
                    yarn_name: s.yarn_name.clone(),
                    weight_100: Self::weft_weight_100(s.picks, s.denier, rs)?,
                    cost_bearing: s.is_active(),
                })
            })
            .collect()
    }

    /// 布重 / 100（經緯皆不含損耗）
    pub fn fabric_weight_100(warp: &WarpTotals, weft: &WeftTotals) -> Result<Decimal> {
        checked_add("fabric_weight", warp.weight_100, weft.weight_100)
    }

    /// 報價用布重 / 100：經紗含損耗，緯紗刻意不含損耗
    pub fn fabric_weight_costing_100(warp: &WarpTotals, weft: &WeftTotals) -> Result<Decimal> {
        checked_add("fabric_weight", warp.weight_shortage_100, weft.weight_100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use costing_core::CostingError;
    use proptest::prelude::*;

    fn seg(picks: i64, denier: i64, price: i64) -> ResolvedSegment {
        ResolvedSegment {
            picks: Decimal::from(picks),
            mode: SpecMode::Denier,
            denier: Decimal::from(denier),
            count: None,
            price_per_kg: Decimal::from(price),
            yarn_name: None,
        }
    }

    fn rs() -> Decimal {
        Decimal::new(455, 1)
    }

    fn tolerance() -> Decimal {
        Decimal::new(1, 9)
    }

    #[test]
    fn test_warp_weight_and_cost() {
        let warp = WeightAggregator::warp(Decimal::from(3000), Decimal::from(120), Decimal::from(450)).unwrap();

        assert_eq!(warp.weight_100, Decimal::from(4));
        assert_eq!(warp.weight_shortage_100, Decimal::new(436, 2));
        assert_eq!(warp.cost_100, Decimal::from(1962));
    }

    #[test]
    fn test_weft_weight_uses_rs() {
        assert_eq!(
            WeightAggregator::weft_weight_100(Decimal::from(48), Decimal::from(75), rs()).unwrap(),
            Decimal::new(182, 2)
        );
    }

    #[test]
    fn test_effective_weft_weighted_average() {
        // Σp = 50, Σpd = 30×75 + 20×150 = 5250, Σpdp = 2250×200 + 3000×300 = 1350000
        let segments = vec![seg(30, 75, 200), seg(20, 150, 300)];
        let eff = WeightAggregator::effective_weft(&segments, None).unwrap().unwrap();

        assert_eq!(eff.total_picks, Decimal::from(50));
        assert_eq!(eff.denier, Decimal::from(105));
        assert!((eff.price_per_kg - Decimal::from(1350000) / Decimal::from(5250)).abs() < tolerance());
        assert!(!eff.fallback_used);
    }

    #[test]
    fn test_inactive_segments_excluded() {
        let segments = vec![seg(48, 75, 220), seg(10, 100, 0), seg(0, 100, 300)];
        let eff = WeightAggregator::effective_weft(&segments, None).unwrap().unwrap();

        assert_eq!(eff.total_picks, Decimal::from(48));
        assert_eq!(eff.denier, Decimal::from(75));
        assert_eq!(eff.price_per_kg, Decimal::from(220));

        let details = WeightAggregator::segment_details(&segments, rs()).unwrap();
        assert_eq!(details.len(), 2);
        assert!(details[0].cost_bearing);
        assert!(!details[1].cost_bearing);
        assert_eq!(details[1].label, "Weft 2");
    }

    #[test]
    fn test_fallback_to_scalars() {
        let segments = vec![seg(0, 0, 0)];
        let fallback = WeftScalars::new(Decimal::from(48), Decimal::from(75), Decimal::from(220));

        let eff = WeightAggregator::effective_weft(&segments, Some(fallback)).unwrap().unwrap();
        assert!(eff.fallback_used);
        assert_eq!(eff.total_picks, Decimal::from(48));

        let totals = WeightAggregator::sum_segments(&segments, Some(fallback), rs()).unwrap().unwrap();
        assert_eq!(totals.weight_100, Decimal::new(182, 2));
    }

    #[test]
    fn test_no_active_segment_and_invalid_fallback() {
        let segments = vec![seg(0, 75, 220)];
        let bad = WeftScalars::new(Decimal::ZERO, Decimal::from(75), Decimal::from(220));

        assert!(WeightAggregator::effective_weft(&segments, Some(bad)).unwrap().is_none());
        assert!(WeightAggregator::effective_weft(&[], None).unwrap().is_none());
        assert!(WeightAggregator::sum_segments(&segments, None, rs()).unwrap().is_none());
    }

    #[test]
    fn test_costing_style_weight_is_asymmetric() {
        let warp = WeightAggregator::warp(Decimal::from(3000), Decimal::from(120), Decimal::from(450)).unwrap();
        let eff = WeightAggregator::effective_weft(&[seg(48, 75, 220)], None).unwrap().unwrap();
        let weft = WeightAggregator::weft_from_effective(&eff, rs()).unwrap();

        assert_eq!(WeightAggregator::fabric_weight_100(&warp, &weft).unwrap(), Decimal::new(582, 2));
        // 4 × 1.09 + 1.82
        assert_eq!(
            WeightAggregator::fabric_weight_costing_100(&warp, &weft).unwrap(),
            Decimal::new(618, 2)
        );
    }

    #[test]
    fn test_huge_inputs_overflow_instead_of_panicking() {
        let ends = Decimal::from(u64::MAX);
        let denier = Decimal::from(10_000_000_000u64);
        let result = WeightAggregator::warp(ends, denier, Decimal::from(450));
        assert!(matches!(result, Err(CostingError::Overflow(_))));

        let huge = ResolvedSegment {
            picks: Decimal::from(u64::MAX),
            ..seg(1, 75, 220)
        };
        let wide_rs = Decimal::from(1_000_000_000_000u64);
        assert!(matches!(
            WeightAggregator::weft_weight_100(huge.picks, Decimal::from(u64::MAX), wide_rs),
            Err(CostingError::Overflow("weft_weight"))
        ));
        assert!(matches!(
            WeightAggregator::sum_segments(&[huge], None, wide_rs),
            Err(CostingError::Overflow(_))
        ));

        // Σ(picks·denier·price) 超出範圍
        let costly = ResolvedSegment {
            price_per_kg: Decimal::MAX,
            ..seg(48, 75, 1)
        };
        assert!(matches!(
            WeightAggregator::effective_weft(&[costly], None),
            Err(CostingError::Overflow("weft_cost"))
        ));
    }

    #[test]
    fn test_split_segments_match_single_segment() {
        let single = [seg(48, 75, 220)];
        let split = [seg(24, 75, 220), seg(24, 75, 220)];

        let eff_single = WeightAggregator::effective_weft(&single, None).unwrap().unwrap();
        let eff_split = WeightAggregator::effective_weft(&split, None).unwrap().unwrap();
        assert_eq!(eff_single, eff_split);

        let summed = WeightAggregator::sum_segments(&split, None, rs()).unwrap().unwrap();
        let shortcut = WeightAggregator::weft_from_effective(&eff_split, rs()).unwrap();
        assert_eq!(summed, shortcut);
    }

    fn segment_strategy() -> impl Strategy<Value = ResolvedSegment> {
        (1i64..200, 20i64..600, 50i64..900).prop_map(|(p, d, price)| seg(p, d, price))
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

        #[test]
        fn homogeneous_segments_average_to_common_values(
            picks in prop::collection::vec(1i64..200, 1..6),
            denier in 20i64..600,
            price in 50i64..900,
        ) {
            let segments: Vec<ResolvedSegment> = picks.iter().map(|p| seg(*p, denier, price)).collect();
            let eff = WeightAggregator::effective_weft(&segments, None).unwrap().unwrap();

            prop_assert_eq!(eff.denier, Decimal::from(denier));
            prop_assert_eq!(eff.price_per_kg, Decimal::from(price));
        }

        #[test]
        fn effective_price_invariant_under_pick_scaling(
            segments in prop::collection::vec(segment_strategy(), 1..6),
            factor in 2i64..50,
        ) {
            let scaled: Vec<ResolvedSegment> = segments
                .iter()
                .map(|s| ResolvedSegment { picks: s.picks * Decimal::from(factor), ..s.clone() })
                .collect();

            let base = WeightAggregator::effective_weft(&segments, None).unwrap().unwrap();
            let after = WeightAggregator::effective_weft(&scaled, None).unwrap().unwrap();

            prop_assert!((base.price_per_kg - after.price_per_kg).abs() < tolerance());
            prop_assert!((base.denier - after.denier).abs() < tolerance());
        }

        #[test]
        fn summed_and_effective_paths_agree(
            segments in prop::collection::vec(segment_strategy(), 1..6),
        ) {
            let eff = WeightAggregator::effective_weft(&segments, None).unwrap().unwrap();
            let shortcut = WeightAggregator::weft_from_effective(&eff, rs()).unwrap();
            let summed = WeightAggregator::sum_segments(&segments, None, rs()).unwrap().unwrap();

            prop_assert!((shortcut.weight_100 - summed.weight_100).abs() < tolerance());
            prop_assert!((shortcut.cost_100 - summed.cost_100).abs() < tolerance());
            prop_assert_eq!(shortcut.total_picks, summed.total_picks);
        }
    }
}
