//! 單緯布種成本核算示例

use costing_calc::CostingCalculator;
use costing_core::{CostingConfig, InMemoryPriceRegistry, Recipe, WarpSpec, WeftSegment, WeftSpec};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== 單緯布種成本核算示例 ===\n");

    let recipe = Recipe::new(
        "SANTOON 120X80",
        Decimal::new(455, 1),
        WarpSpec::direct(Decimal::from(3000), Decimal::from(120), Decimal::from(450)),
        WeftSpec::Legacy(WeftSegment::with_denier(
            Decimal::from(48),
            Decimal::from(75),
            Decimal::from(220),
        )),
        CostingConfig::new(Decimal::new(16, 2))
            .with_grey_markup(Decimal::from(10))
            .with_rfd_charge(Decimal::from(8))
            .with_rfd_shortage_percent(Decimal::from(5))
            .with_rfd_markup(Decimal::from(12)),
    );

    let calculator = CostingCalculator::new(InMemoryPriceRegistry::new());
    let b = calculator.recompute(&recipe)?;
    tracing::info!("示例布種 {} 核算完成", recipe.name);

    println!("布種: {}", recipe.name);
    println!("  經紗重量 / 100: {}", b.warp_weight_100.round_dp(4));
    println!("  緯紗重量 / 100: {}", b.weft_weight_100.round_dp(4));
    println!("  布重 / 100:     {}", b.fabric_weight_100.round_dp(4));
    println!("  報價用布重 / 100: {}", b.fabric_weight_costing_100.round_dp(3));
    println!();
    println!("  經紗成本 / 100: {}", b.warp_cost_100.round_dp(2));
    println!("  緯紗成本 / 100: {}", b.weft_cost_100.round_dp(2));
    println!("  織造費 / 100:   {}", b.weaving_charge_100.round_dp(2));
    println!("  利息 / 100:     {}", b.interest_100.round_dp(2));
    println!();
    println!("  坯布成本 / 售價: {} / {}", b.grey_cost_per_unit.round_dp(2), b.grey_sale_per_unit.round_dp(2));
    println!("  RFD 成本 / 售價: {} / {}", b.rfd_cost_per_unit.round_dp(2), b.rfd_sale_per_unit.round_dp(2));

    Ok(())
}
