//! 成本核算主計算器

use std::collections::BTreeMap;

use costing_core::weft::WeftScalars;
use costing_core::{
    CostBreakdown, CostingConfig, CostingError, PriceRegistry, Recipe, RecipeDraft, RecipeStore,
    Result, StoredSummary, WeftSpec,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pipeline::ChargePipeline;
use crate::resolver::{PriceResolver, ResolvedYarn};
use crate::weight::{EffectiveWeft, ResolvedSegment, WarpTotals, WeftTotals, WeightAggregator};

/// 假設情境覆寫值
///
/// 覆寫單價時同時解除紗線連結，讓該單價直接生效。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WhatIf {
    pub warp_price_per_kg: Option<Decimal>,
    pub weft_prices: BTreeMap<usize, Decimal>,
    pub config: Option<CostingConfig>,
}

impl WhatIf {
    pub fn new() -> Self {
        Self::default()
    }

    /// 建構器模式：覆寫經紗單價
    pub fn with_warp_price(mut self, price_per_kg: Decimal) -> Self {
        self.warp_price_per_kg = Some(price_per_kg);
        self
    }

    /// 建構器模式：覆寫第 index 段緯紗單價
    pub fn with_weft_price(mut self, index: usize, price_per_kg: Decimal) -> Self {
        self.weft_prices.insert(index, price_per_kg);
        self
    }

    /// 建構器模式：覆寫費用與加成參數
    pub fn with_config(mut self, config: CostingConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// 套用至配方副本
    ///
    /// 緯紗覆寫的索引以正規化後的緯紗段為準，空列表會先由快照重建。
    fn apply(&self, recipe: &Recipe) -> Result<Recipe> {
        let mut modified = recipe.clone();

        if !self.weft_prices.is_empty() {
            let (normalized, _) = modified.weft.normalize();
            if let WeftSpec::Segments { segments, .. } = &mut modified.weft {
                *segments = normalized;
            }
        }

        if let Some(price) = self.warp_price_per_kg {
            modified.warp.price_per_kg = price;
            modified.warp.yarn_name = None;
        }

        for (&index, &price) in &self.weft_prices {
            let segment = match &mut modified.weft {
                WeftSpec::Legacy(segment) if index == 0 => segment,
                WeftSpec::Legacy(_) => return Err(CostingError::InvalidSegmentIndex(index)),
                WeftSpec::Segments { segments, .. } => segments
                    .get_mut(index)
                    .ok_or(CostingError::InvalidSegmentIndex(index))?,
            };
            segment.price_per_kg = price;
            segment.yarn_name = None;
        }

        if let Some(config) = &self.config {
            modified.config = config.clone();
        }
        Ok(modified)
    }
}

/// 緯紗聚合路徑
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WeftPath {
    /// 有效丹尼捷徑（單緯公式）
    Effective,
    /// 逐段加總
    PerSegment,
}

/// 成本核算計算器
///
/// 價格登錄簿僅作唯讀輸入，計算器本身不保存任何狀態。
pub struct CostingCalculator<R: PriceRegistry> {
    registry: R,
}

impl<R: PriceRegistry> CostingCalculator<R> {
    /// 創建新的計算器
    pub fn new(registry: R) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// 重新核算配方成本（有效丹尼路徑）
    pub fn recompute(&self, recipe: &Recipe) -> Result<CostBreakdown> {
        self.compute(recipe, WeftPath::Effective)
    }

    /// 逐段加總緯紗重量與成本後核算
    pub fn multi_weft_breakdown(&self, recipe: &Recipe) -> Result<CostBreakdown> {
        self.compute(recipe, WeftPath::PerSegment)
    }

    /// 假設情境核算，不修改輸入配方
    pub fn what_if(&self, recipe: &Recipe, overrides: &WhatIf) -> Result<CostBreakdown> {
        tracing::info!("假設情境核算：{}", recipe.name);
        let modified = overrides.apply(recipe)?;
        self.recompute(&modified)
    }

    /// 完成草稿並核算
    ///
    /// 回傳的配方已寫入有效緯紗快照，供日後緯紗段失效時回退。
    pub fn price_draft(&self, draft: &RecipeDraft) -> Result<(Recipe, CostBreakdown)> {
        let mut recipe = draft.finalize()?;
        let breakdown = self.recompute(&recipe)?;

        if let WeftSpec::Segments { snapshot, .. } = &mut recipe.weft {
            *snapshot = Some(WeftScalars::new(
                breakdown.total_picks,
                breakdown.effective_weft_denier,
                breakdown.effective_weft_price,
            ));
        }
        Ok((recipe, breakdown))
    }

    /// 核算草稿並儲存為新配方
    pub fn save_draft<S: RecipeStore + ?Sized>(
        &self,
        store: &mut S,
        draft: &RecipeDraft,
    ) -> Result<(Uuid, CostBreakdown)> {
        let (recipe, breakdown) = self.price_draft(draft)?;
        let id = store.save(recipe, StoredSummary::from(&breakdown))?;
        tracing::info!("已儲存布種 {}：{}", draft.name.trim(), id);
        Ok((id, breakdown))
    }

    /// 核算草稿並整筆覆寫既有配方
    pub fn overwrite_draft<S: RecipeStore + ?Sized>(
        &self,
        store: &mut S,
        id: Uuid,
        draft: &RecipeDraft,
    ) -> Result<CostBreakdown> {
        let (recipe, breakdown) = self.price_draft(draft)?;
        store.overwrite(id, recipe, StoredSummary::from(&breakdown))?;
        tracing::info!("已覆寫布種 {}：{}", draft.name.trim(), id);
        Ok(breakdown)
    }

    /// 以目前報價重新核算已儲存配方（不寫回）
    pub fn reprice_stored<S: RecipeStore + ?Sized>(&self, store: &S, id: Uuid) -> Result<CostBreakdown> {
        let stored = store.load(id)?;
        self.recompute(&stored.recipe)
    }

    fn compute(&self, recipe: &Recipe, path: WeftPath) -> Result<CostBreakdown> {
        tracing::info!("開始核算布種：{}", recipe.name);

        // Step 1: 邊界驗證
        recipe.validate()?;

        // Step 2: 經紗價格解析
        tracing::debug!("Step 2: 經紗價格解析");
        let warp = PriceResolver::resolve_warp(&self.registry, &recipe.warp);
        costing_core::ensure_positive("warp_denier", warp.denier)?;
        costing_core::ensure_positive("warp_price_per_kg", warp.price_per_kg)?;

        // Step 3: 緯紗正規化與價格解析
        tracing::debug!("Step 3: 緯紗正規化與價格解析");
        let (segments, fallback) = recipe.weft.normalize();
        let resolved: Vec<ResolvedSegment> = segments
            .iter()
            .map(|segment| {
                ResolvedSegment::new(segment, PriceResolver::resolve_weft(&self.registry, segment))
            })
            .collect();
        tracing::debug!("緯紗段數: {}", resolved.len());

        // Step 4: 重量與成本聚合
        tracing::debug!("Step 4: 重量與成本聚合");
        let ends = recipe.ends()?;
        let warp_totals = WeightAggregator::warp(ends, warp.denier, warp.price_per_kg)?;
        let effective = WeightAggregator::effective_weft(&resolved, fallback)?
            .ok_or_else(|| not_costable(recipe))?;
        if effective.fallback_used {
            tracing::warn!("布種 {} 沒有有效緯紗段，回退至舊版緯紗欄位", recipe.name);
        }
        let weft_totals = match path {
            WeftPath::Effective => WeightAggregator::weft_from_effective(&effective, recipe.rs)?,
            WeftPath::PerSegment => WeightAggregator::sum_segments(&resolved, fallback, recipe.rs)?
                .ok_or_else(|| not_costable(recipe))?,
        };

        // Step 5: 費用與加成管線
        tracing::debug!("Step 5: 費用與加成管線");
        let chain = ChargePipeline::run(
            &recipe.config,
            warp_totals.cost_100,
            weft_totals.cost_100,
            weft_totals.total_picks,
        )?;

        let breakdown = Self::assemble(
            &warp,
            &warp_totals,
            &weft_totals,
            &effective,
            &resolved,
            recipe.rs,
            chain,
        )?;
        tracing::info!(
            "布種 {} 核算完成：坯布成本 / 100 = {}，坯布售價 / 100 = {}",
            recipe.name,
            breakdown.grey_cost_100(),
            breakdown.grey_sale_100()
        );
        Ok(breakdown)
    }

    fn assemble(
        warp: &ResolvedYarn,
        warp_totals: &WarpTotals,
        weft_totals: &WeftTotals,
        effective: &EffectiveWeft,
        resolved: &[ResolvedSegment],
        rs: Decimal,
        chain: crate::pipeline::PricingChain,
    ) -> Result<CostBreakdown> {
        Ok(CostBreakdown {
            warp_weight_100: warp_totals.weight_100,
            weft_weight_100: weft_totals.weight_100,
            fabric_weight_100: WeightAggregator::fabric_weight_100(warp_totals, weft_totals)?,
            fabric_weight_costing_100: WeightAggregator::fabric_weight_costing_100(
                warp_totals,
                weft_totals,
            )?,
            warp_cost_100: warp_totals.cost_100,
            weft_cost_100: weft_totals.cost_100,
            weaving_charge_100: chain.weaving_charge_100,
            interest_100: chain.interest_100,
            grey_cost_per_unit: chain.grey.cost_per_unit,
            grey_sale_per_unit: chain.grey.sale_per_unit,
            rfd_cost_per_unit: chain.rfd.cost_per_unit,
            rfd_sale_per_unit: chain.rfd.sale_per_unit,
            warp_denier: warp.denier,
            warp_price_per_kg: warp.price_per_kg,
            total_picks: effective.total_picks,
            effective_weft_denier: effective.denier,
            effective_weft_price: effective.price_per_kg,
            weft_fallback_used: effective.fallback_used,
            segments: WeightAggregator::segment_details(resolved, rs)?,
        })
    }
}

fn not_costable(recipe: &Recipe) -> CostingError {
    CostingError::NotCostable(format!(
        "布種 {} 沒有有效緯紗段，舊版緯紗欄位亦無效",
        recipe.name
    ))
}
