//! 報價單產生示例

use costing_calc::{CostingCalculator, PricingSheet};
use costing_core::{
    CostingConfig, InMemoryPriceRegistry, InMemoryRecipeStore, QualityRow, RecipeStore, StoredSummary,
};
use tracing_subscriber::EnvFilter;

/// 儲存層匯出的資料列（第二筆為多段緯紗，第三筆缺少緯紗資料）
const STORED_ROWS: &str = r#"[
  {
    "quality_name": "SANTOON 120X80", "ends_mode": "direct", "ends": "3000", "reed": null,
    "rs": "45.5", "borders": null, "warp_denier": "120", "warp_yarn_name": "(manual price)",
    "warp_yarn_price": "450", "picks": "48", "weft_denier_mode": "denier", "weft_denier": "75",
    "weft_count": null, "weft_yarn_name": null, "weft_yarn_price": "220",
    "weaving_rate_per_pick": "0.16", "grey_markup_percent": "10", "rfd_charge_per_m": "8",
    "rfd_shortage_percent": "5", "rfd_markup_percent": "12"
  },
  {
    "quality_name": "dobby stripe", "ends_mode": "calc", "ends": null, "reed": "64",
    "rs": "45.5", "borders": "88", "warp_denier": "120", "warp_yarn_name": null,
    "warp_yarn_price": "450", "picks": "52", "weft_denier_mode": "denier", "weft_denier": "80",
    "weft_count": null, "weft_yarn_name": null, "weft_yarn_price": "240",
    "weaving_rate_per_pick": "0.18", "grey_markup_percent": "15", "rfd_charge_per_m": "9",
    "rfd_shortage_percent": "4", "rfd_markup_percent": "10", "include_interest": false,
    "wefts_json": "[{\"picks\":\"36\",\"mode\":\"denier\",\"denier\":\"75\",\"price\":\"220\"},{\"picks\":\"16\",\"mode\":\"count\",\"count\":\"30\",\"denier\":\"177.17\",\"price\":\"310\"}]"
  },
  {
    "quality_name": "Unfinished", "ends_mode": "direct", "ends": "2800", "reed": null,
    "rs": "44", "borders": null, "warp_denier": "100", "warp_yarn_name": null,
    "warp_yarn_price": "430", "picks": "0", "weft_denier_mode": "denier", "weft_denier": "0",
    "weft_count": null, "weft_yarn_name": null, "weft_yarn_price": "0",
    "weaving_rate_per_pick": "0.16", "grey_markup_percent": "0", "rfd_charge_per_m": "0",
    "rfd_shortage_percent": "0", "rfd_markup_percent": "0"
  }
]"#;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== 報價單產生示例 ===\n");

    let rows: Vec<QualityRow> = serde_json::from_str(STORED_ROWS)?;
    let mut store = InMemoryRecipeStore::new();
    for row in &rows {
        store.save(row.into_recipe()?, StoredSummary::default())?;
    }
    println!("已載入 {} 筆布種", store.list().len());

    let calculator = CostingCalculator::new(InMemoryPriceRegistry::new());
    let sheet = PricingSheet::build(&calculator, &store)?;
    tracing::info!("報價單：{} 筆，略過 {} 筆", sheet.rows.len(), sheet.skipped.len());

    println!();
    println!("{:<20} {:>12} {:>12} {:>12}", "Quality", "Weight/100", "Grey/m", "RFD/m");
    println!("{}", "-".repeat(59));
    for row in sheet.display_rows() {
        println!(
            "{:<20} {:>12} {:>12} {:>12}",
            row.quality_name, row.fabric_weight_costing_100, row.grey_sale_per_unit, row.rfd_sale_per_unit
        );
    }

    if !sheet.skipped.is_empty() {
        println!();
        println!("略過:");
        for skipped in &sheet.skipped {
            println!("  - {}: {}", skipped.quality_name, skipped.reason);
        }
    }

    let defaults = CostingConfig::new(rust_decimal::Decimal::new(16, 2));
    println!();
    println!("新配方預設參數: {}", serde_json::to_string(&defaults)?);

    Ok(())
}
