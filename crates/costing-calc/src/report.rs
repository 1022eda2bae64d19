//! 報價單產生

use costing_core::{PriceRegistry, PricingSheetRow, Recipe, RecipeStore, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::CostingCalculator;

/// 無法核算而略過的布種
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedQuality {
    pub id: Option<Uuid>,
    pub quality_name: String,
    pub reason: String,
}

/// 報價單
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PricingSheet {
    /// 依儲存清單順序排列的報價列（未四捨五入）
    pub rows: Vec<PricingSheetRow>,

    /// 略過的布種
    pub skipped: Vec<SkippedQuality>,
}

impl PricingSheet {
    /// 對儲存中的所有配方產生報價單
    ///
    /// 各配方彼此獨立，並行核算後仍依 `RecipeStore::list` 的順序輸出。
    pub fn build<R, S>(calculator: &CostingCalculator<R>, store: &S) -> Result<Self>
    where
        R: PriceRegistry + Sync,
        S: RecipeStore + ?Sized,
    {
        let entries = store
            .list()
            .into_iter()
            .map(|(id, _)| store.load(id).map(|stored| (Some(stored.id), stored.recipe)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::evaluate(calculator, entries))
    }

    /// 對一組配方產生報價單（保持輸入順序）
    pub fn from_recipes<R>(calculator: &CostingCalculator<R>, recipes: &[Recipe]) -> Self
    where
        R: PriceRegistry + Sync,
    {
        let entries = recipes.iter().map(|r| (None, r.clone())).collect();
        Self::evaluate(calculator, entries)
    }

    fn evaluate<R>(calculator: &CostingCalculator<R>, entries: Vec<(Option<Uuid>, Recipe)>) -> Self
    where
        R: PriceRegistry + Sync,
    {
        tracing::info!("開始產生報價單：{} 筆布種", entries.len());

        let results: Vec<std::result::Result<PricingSheetRow, SkippedQuality>> = entries
            .par_iter()
            .map(|(id, recipe)| {
                calculator
                    .recompute(recipe)
                    .map(|b| b.pricing_row(&recipe.name))
                    .map_err(|e| SkippedQuality {
                        id: *id,
                        quality_name: recipe.name.clone(),
                        reason: e.to_string(),
                    })
            })
            .collect();

        let mut sheet = Self::default();
        for result in results {
            match result {
                Ok(row) => sheet.rows.push(row),
                Err(skipped) => {
                    tracing::warn!("略過布種 {}：{}", skipped.quality_name, skipped.reason);
                    sheet.skipped.push(skipped);
                }
            }
        }

        tracing::info!(
            "報價單完成：{} 筆，略過 {} 筆",
            sheet.rows.len(),
            sheet.skipped.len()
        );
        sheet
    }

    /// 顯示用列（重量 3 位、價格 2 位小數）
    pub fn display_rows(&self) -> Vec<PricingSheetRow> {
        self.rows.iter().map(PricingSheetRow::rounded).collect()
    }
}
