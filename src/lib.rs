//! # Fabric Costing
//!
//! 布種成本核算：核心模型（`costing_core`）與計算引擎（`costing_calc`）的統一入口

pub use costing_calc;
pub use costing_core;

pub use costing_calc::{recompute, CostingCalculator, PricingSheet, WhatIf};
pub use costing_core::{
    CostBreakdown, CostingConfig, CostingError, InMemoryPriceRegistry, InMemoryRecipeStore,
    PriceRegistry, Recipe, RecipeDraft, RecipeStore, Result, WarpSpec, WeftSegment, WeftSpec,
    YarnRole,
};
pub use rust_decimal::Decimal;
