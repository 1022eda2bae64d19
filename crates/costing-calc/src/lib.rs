//! # Costing Calculation Engine
//!
//! 布種成本核算引擎：紗線價格解析、重量與成本聚合、費用與加成管線

pub mod calculator;
pub mod pipeline;
pub mod report;
pub mod resolver;
pub mod weight;

// Re-export 主要類型
pub use calculator::{CostingCalculator, WhatIf};
pub use pipeline::{ChargePipeline, PricingChain, StagePrice};
pub use report::{PricingSheet, SkippedQuality};
pub use resolver::{PriceResolver, PriceSource, ResolvedYarn};
pub use weight::{EffectiveWeft, ResolvedSegment, WeightAggregator};

use costing_core::{CostBreakdown, PriceRegistry, Recipe};

/// 以給定價格登錄簿重新核算配方
pub fn recompute<R: PriceRegistry + ?Sized>(
    recipe: &Recipe,
    registry: &R,
) -> costing_core::Result<CostBreakdown> {
    CostingCalculator::new(registry).recompute(recipe)
}
