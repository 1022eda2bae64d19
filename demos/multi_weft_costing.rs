//! # 多段緯紗布種核算範例
//!
//! 這個範例展示完整的流程：
//! - 建立紗線價格登錄簿
//! - 以草稿逐段編輯緯紗並選取紗線
//! - 核算、儲存，報價更新後重新核算

use chrono::NaiveDate;
use costing_calc::{CostingCalculator, WhatIf};
use costing_core::*;
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("===== 多段緯紗布種核算範例 =====\n");

    // ========== 1. 紗線價格登錄簿 ==========
    println!("步驟 1: 建立紗線價格登錄簿");
    let jan = NaiveDate::from_ymd_opt(2025, 1, 10).ok_or_else(|| anyhow::anyhow!("invalid date"))?;
    let mut registry = InMemoryPriceRegistry::new();
    registry.record("120D POLY", YarnRole::Warp, None, Some(Decimal::from(120)), Decimal::from(450), jan)?;
    registry.record("75D FDY", YarnRole::Both, None, Some(Decimal::from(75)), Decimal::from(220), jan)?;
    registry.record("30S CTN", YarnRole::Weft, Some(Decimal::from(30)), None, Decimal::from(310), jan)?;
    for name in registry.list_names(Some(YarnRole::Weft)) {
        println!("   ✓ 緯紗可選: {}", name);
    }
    println!();

    // ========== 2. 編輯草稿 ==========
    println!("步驟 2: 編輯配方草稿");
    let mut draft = RecipeDraft::new(
        "DOBBY 120X(75+30S)",
        CostingConfig::new(Decimal::new(16, 2))
            .with_grey_markup(Decimal::from(10))
            .with_rfd_charge(Decimal::from(8))
            .with_rfd_shortage_percent(Decimal::from(5))
            .with_rfd_markup(Decimal::from(12)),
    );
    draft.rs = Decimal::new(455, 1);
    draft.warp = WarpSpec::from_reed(Decimal::from(64), Decimal::from(88), Decimal::ZERO, Decimal::ZERO);
    draft.select_warp_yarn(Some("120D POLY"), &registry);

    draft.edit_segment(0, |s| s.picks = Decimal::from(36))?;
    draft.select_weft_yarn(0, Some("75D FDY"), &registry)?;

    let second = draft.add_segment();
    draft.set_segment_mode(second, SpecMode::Count)?;
    draft.edit_segment(second, |s| s.picks = Decimal::from(16))?;
    draft.select_weft_yarn(second, Some("30S CTN"), &registry)?;

    for (label, segment) in draft.labels().iter().zip(draft.segments()) {
        println!(
            "   ✓ {}: {} 緯, {}D, {}/kg",
            label,
            segment.picks,
            segment.denier.round_dp(2),
            segment.price_per_kg
        );
    }
    println!();

    // ========== 3. 核算並儲存 ==========
    println!("步驟 3: 核算並儲存");
    let calculator = CostingCalculator::new(&registry);
    let mut store = InMemoryRecipeStore::new();
    let (id, breakdown) = calculator.save_draft(&mut store, &draft)?;
    tracing::info!("草稿已儲存：{}", id);
    print_breakdown(&breakdown);

    let summed = calculator.multi_weft_breakdown(&store.load(id)?.recipe)?;
    println!("   逐段加總緯紗成本 / 100: {}", summed.weft_cost_100.round_dp(4));
    println!();

    // ========== 4. 假設情境 ==========
    println!("步驟 4: 假設緯紗 2 單價降為 280");
    let scenario = calculator.what_if(&store.load(id)?.recipe, &WhatIf::new().with_weft_price(1, Decimal::from(280)))?;
    println!("   坯布售價: {} → {}", breakdown.grey_sale_per_unit.round_dp(2), scenario.grey_sale_per_unit.round_dp(2));
    println!();

    // ========== 5. 報價更新 ==========
    println!("步驟 5: 75D FDY 報價更新後重新核算");
    let mar = NaiveDate::from_ymd_opt(2025, 3, 1).ok_or_else(|| anyhow::anyhow!("invalid date"))?;
    registry.record("75D FDY", YarnRole::Weft, None, Some(Decimal::from(75)), Decimal::from(235), mar)?;
    let repriced = CostingCalculator::new(&registry).reprice_stored(&store, id)?;
    println!("   坯布售價: {} → {}", breakdown.grey_sale_per_unit.round_dp(2), repriced.grey_sale_per_unit.round_dp(2));

    Ok(())
}

fn print_breakdown(b: &CostBreakdown) {
    for segment in &b.segments {
        println!("   {} 重量 / 100: {}", segment.label, segment.weight_100.round_dp(4));
    }
    println!("   總緯密: {}，有效丹尼: {}，有效單價: {}", b.total_picks, b.effective_weft_denier.round_dp(2), b.effective_weft_price.round_dp(2));
    println!("   坯布成本 / 售價: {} / {}", b.grey_cost_per_unit.round_dp(2), b.grey_sale_per_unit.round_dp(2));
    println!("   RFD 成本 / 售價: {} / {}", b.rfd_cost_per_unit.round_dp(2), b.rfd_sale_per_unit.round_dp(2));
}
