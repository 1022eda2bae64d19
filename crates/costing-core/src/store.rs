//! 配方儲存介面與儲存邊界的資料列轉換

use std::collections::HashMap;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::weft::WeftScalars;
use crate::{
    CostBreakdown, CostingConfig, CostingError, EndsMode, Recipe, Result, SpecMode, WarpSpec, WeftSegment, WeftSpec,
};

/// 表單上「手動單價」選項的顯示文字，儲存時視同未連結紗線
pub const MANUAL_PRICE_LABEL: &str = "(manual price)";

/// 儲存時的成本摘要（供報表直接讀取，不必每次重算）
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoredSummary {
    pub warp_weight_100: Decimal,
    pub weft_weight_100: Decimal,
    pub fabric_weight_100: Decimal,
    pub warp_cost_100: Decimal,
    pub weft_cost_100: Decimal,
    pub weaving_charge_100: Decimal,
    pub interest_on_yarn_100: Decimal,
    pub final_grey_cost_100: Decimal,
    pub grey_sale_100: Decimal,
    pub rfd_cost_100: Decimal,
    pub rfd_sale_100: Decimal,
}

impl From<&CostBreakdown> for StoredSummary {
    fn from(b: &CostBreakdown) -> Self {
        Self {
            warp_weight_100: b.warp_weight_100,
            weft_weight_100: b.weft_weight_100,
            fabric_weight_100: b.fabric_weight_100,
            warp_cost_100: b.warp_cost_100,
            weft_cost_100: b.weft_cost_100,
            weaving_charge_100: b.weaving_charge_100,
            interest_on_yarn_100: b.interest_100,
            final_grey_cost_100: b.grey_cost_100(),
            grey_sale_100: b.grey_sale_100(),
            rfd_cost_100: b.rfd_cost_100(),
            rfd_sale_100: b.rfd_sale_100(),
        }
    }
}

/// 已儲存的配方
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecipe {
    pub id: Uuid,
    pub created_at: NaiveDateTime,
    pub recipe: Recipe,
    pub summary: StoredSummary,
}

/// 配方儲存介面
///
/// 儲存一律整筆覆寫，不做部分更新。
pub trait RecipeStore {
    /// 依 ID 載入配方
    fn load(&self, id: Uuid) -> Result<StoredRecipe>;

    /// 儲存新配方，回傳新 ID
    fn save(&mut self, recipe: Recipe, summary: StoredSummary) -> Result<Uuid>;

    /// 整筆覆寫既有配方
    fn overwrite(&mut self, id: Uuid, recipe: Recipe, summary: StoredSummary) -> Result<()>;

    /// 列出所有配方（ID, 名稱），依名稱排序（不分大小寫）
    fn list(&self) -> Vec<(Uuid, String)>;

    /// 刪除配方
    fn delete(&mut self, id: Uuid) -> Result<()>;
}

/// 記憶體內的配方儲存
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecipeStore {
    recipes: HashMap<Uuid, StoredRecipe>,
}

impl InMemoryRecipeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    fn now() -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

impl RecipeStore for InMemoryRecipeStore {
    fn load(&self, id: Uuid) -> Result<StoredRecipe> {
        self.recipes
            .get(&id)
            .cloned()
            .ok_or(CostingError::RecipeNotFound(id))
    }

    fn save(&mut self, recipe: Recipe, summary: StoredSummary) -> Result<Uuid> {
        let id = Uuid::new_v4();
        self.recipes.insert(
            id,
            StoredRecipe {
                id,
                created_at: Self::now(),
                recipe,
                summary,
            },
        );
        Ok(id)
    }

    fn overwrite(&mut self, id: Uuid, recipe: Recipe, summary: StoredSummary) -> Result<()> {
        let stored = self
            .recipes
            .get_mut(&id)
            .ok_or(CostingError::RecipeNotFound(id))?;
        stored.created_at = Self::now();
        stored.recipe = recipe;
        stored.summary = summary;
        Ok(())
    }

    fn list(&self) -> Vec<(Uuid, String)> {
        let mut entries: Vec<(Uuid, String)> = self
            .recipes
            .values()
            .map(|s| (s.id, s.recipe.name.clone()))
            .collect();
        entries.sort_by(|a, b| {
            a.1.to_lowercase()
                .cmp(&b.1.to_lowercase())
                .then_with(|| a.0.cmp(&b.0))
        });
        entries
    }

    fn delete(&mut self, id: Uuid) -> Result<()> {
        self.recipes
            .remove(&id)
            .map(|_| ())
            .ok_or(CostingError::RecipeNotFound(id))
    }
}

/// 儲存層的扁平資料列
///
/// 舊版資料列只有緯紗純量欄位；新版另以 `wefts_json` 保存多段緯紗。
/// 在此一次轉換為強型別的 [`Recipe`]。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityRow {
    pub quality_name: String,

    /// "direct" 或 "calc"
    pub ends_mode: String,
    pub ends: Option<Decimal>,
    pub reed: Option<Decimal>,
    pub rs: Decimal,
    pub borders: Option<Decimal>,
    pub warp_denier: Decimal,
    pub warp_yarn_name: Option<String>,
    pub warp_yarn_price: Decimal,

    pub picks: Decimal,
    /// "denier" 或 "count"
    pub weft_denier_mode: String,
    pub weft_denier: Decimal,
    pub weft_count: Option<Decimal>,
    pub weft_yarn_name: Option<String>,
    pub weft_yarn_price: Decimal,

    pub weaving_rate_per_pick: Decimal,
    pub grey_markup_percent: Decimal,
    pub rfd_charge_per_m: Decimal,
    pub rfd_shortage_percent: Decimal,
    pub rfd_markup_percent: Decimal,
    #[serde(default = "default_include_interest")]
    pub include_interest: bool,

    #[serde(default)]
    pub wefts_json: Option<String>,

    #[serde(flatten)]
    pub summary: StoredSummary,
}

fn default_include_interest() -> bool {
    true
}

/// 把「手動單價」與空白名稱視為未連結
fn linked_name(name: Option<&str>) -> Option<String> {
    name.map(str::trim)
        .filter(|n| !n.is_empty() && *n != MANUAL_PRICE_LABEL)
        .map(str::to_string)
}

fn parse_mode(mode: &str) -> SpecMode {
    if mode.eq_ignore_ascii_case("count") {
        SpecMode::Count
    } else {
        SpecMode::Denier
    }
}

fn mode_str(mode: SpecMode) -> &'static str {
    match mode {
        SpecMode::Denier => "denier",
        SpecMode::Count => "count",
    }
}

impl QualityRow {
    /// 轉換為強型別配方
    ///
    /// `wefts_json` 缺漏、空白或解析為空列表時視為舊版單緯紗形狀；
    /// JSON 格式錯誤回傳 `Serialization` 錯誤。
    pub fn into_recipe(&self) -> Result<Recipe> {
        let ends_mode = if self.ends_mode.eq_ignore_ascii_case("calc") {
            EndsMode::FromReed {
                reed: self.reed.ok_or(CostingError::MissingField("reed"))?,
                borders: self.borders.unwrap_or(Decimal::ZERO),
            }
        } else {
            EndsMode::Direct {
                ends: self.ends.ok_or(CostingError::MissingField("ends"))?,
                reed: self.reed.filter(|r| *r > Decimal::ZERO),
            }
        };

        let warp = WarpSpec {
            ends_mode,
            denier: self.warp_denier,
            yarn_name: linked_name(self.warp_yarn_name.as_deref()),
            price_per_kg: self.warp_yarn_price,
        };

        let stored_segments: Vec<WeftSegment> = match self.wefts_json.as_deref().map(str::trim) {
            Some(json) if !json.is_empty() => serde_json::from_str(json)?,
            _ => Vec::new(),
        };

        let weft = if stored_segments.is_empty() {
            WeftSpec::Legacy(WeftSegment {
                picks: self.picks,
                mode: parse_mode(&self.weft_denier_mode),
                denier: self.weft_denier,
                count: self.weft_count,
                price_per_kg: self.weft_yarn_price,
                yarn_name: linked_name(self.weft_yarn_name.as_deref()),
            })
        } else {
            let segments = stored_segments
                .into_iter()
                .map(|mut s| {
                    s.yarn_name = linked_name(s.yarn_name.as_deref());
                    s
                })
                .collect();
            WeftSpec::Segments {
                segments,
                snapshot: Some(WeftScalars::new(
                    self.picks,
                    self.weft_denier,
                    self.weft_yarn_price,
                )),
            }
        };

        let config = CostingConfig::new(self.weaving_rate_per_pick)
            .with_grey_markup(self.grey_markup_percent)
            .with_rfd_charge(self.rfd_charge_per_m)
            .with_rfd_shortage_percent(self.rfd_shortage_percent)
            .with_rfd_markup(self.rfd_markup_percent)
            .with_interest(self.include_interest);

        Ok(Recipe::new(
            self.quality_name.clone(),
            self.rs,
            warp,
            weft,
            config,
        ))
    }

    /// 由配方與成本摘要產生資料列
    ///
    /// 多段配方的純量欄位寫入有效緯紗快照（無快照時取第一段），
    /// 並以丹尼模式、不連結紗線的形式保存。
    pub fn from_recipe(recipe: &Recipe, summary: StoredSummary) -> Result<Self> {
        let (ends_mode, ends, reed, borders) = match recipe.warp.ends_mode {
            EndsMode::Direct { ends, reed } => ("direct", ends, reed, None),
            EndsMode::FromReed { reed, borders } => {
                ("calc", recipe.ends()?, Some(reed), Some(borders))
            }
        };

        let (picks, mode, denier, count, yarn_name, price, wefts_json) = match &recipe.weft {
            WeftSpec::Legacy(s) => (
                s.picks,
                s.mode,
                s.denier,
                s.count,
                s.yarn_name.clone(),
                s.price_per_kg,
                None,
            ),
            WeftSpec::Segments { segments, snapshot } => {
                let scalars = (*snapshot)
                    .or_else(|| {
                        segments
                            .first()
                            .map(|s| WeftScalars::new(s.picks, s.denier, s.price_per_kg))
                    })
                    .ok_or(CostingError::MissingField("weft segments"))?;
                (
                    scalars.picks,
                    SpecMode::Denier,
                    scalars.denier,
                    None,
                    None,
                    scalars.price_per_kg,
                    Some(serde_json::to_string(segments)?),
                )
            }
        };

        Ok(Self {
            quality_name: recipe.name.clone(),
            ends_mode: ends_mode.to_string(),
            ends: Some(ends),
            reed,
            rs: recipe.rs,
            borders,
            warp_denier: recipe.warp.denier,
            warp_yarn_name: recipe.warp.yarn_name.clone(),
            warp_yarn_price: recipe.warp.price_per_kg,
            picks,
            weft_denier_mode: mode_str(mode).to_string(),
            weft_denier: denier,
            weft_count: count,
            weft_yarn_name: yarn_name,
            weft_yarn_price: price,
            weaving_rate_per_pick: recipe.config.weaving_rate_per_pick,
            grey_markup_percent: recipe.config.grey_markup_percent,
            rfd_charge_per_m: recipe.config.rfd_charge_per_unit,
            rfd_shortage_percent: recipe.config.rfd_shortage,
            rfd_markup_percent: recipe.config.rfd_markup_percent,
            include_interest: recipe.config.include_interest,
            wefts_json,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy_row() -> QualityRow {
        QualityRow {
            quality_name: "OLD SANTOON".to_string(),
            ends_mode: "direct".to_string(),
            ends: Some(Decimal::from(3000)),
            reed: Some(Decimal::ZERO),
            rs: Decimal::new(455, 1),
            borders: Some(Decimal::ZERO),
            warp_denier: Decimal::from(120),
            warp_yarn_name: Some(MANUAL_PRICE_LABEL.to_string()),
            warp_yarn_price: Decimal::from(450),
            picks: Decimal::from(48),
            weft_denier_mode: "denier".to_string(),
            weft_denier: Decimal::from(75),
            weft_count: None,
            weft_yarn_name: Some("75D FDY".to_string()),
            weft_yarn_price: Decimal::from(220),
            weaving_rate_per_pick: Decimal::new(16, 2),
            grey_markup_percent: Decimal::ZERO,
            rfd_charge_per_m: Decimal::ZERO,
            rfd_shortage_percent: Decimal::ZERO,
            rfd_markup_percent: Decimal::ZERO,
            include_interest: true,
            wefts_json: None,
            summary: StoredSummary::default(),
        }
    }

    fn sample_recipe(name: &str) -> Recipe {
        legacy_row()
            .into_recipe()
            .map(|mut r| {
                r.name = name.to_string();
                r
            })
            .unwrap()
    }

    #[test]
    fn test_legacy_row_into_recipe() {
        let recipe = legacy_row().into_recipe().unwrap();

        assert!(recipe.weft.is_legacy());
        assert_eq!(recipe.warp.yarn_name, None);
        assert_eq!(recipe.ends().unwrap(), Decimal::from(3000));
        assert_eq!(recipe.warp.ends_mode.reed(), None);
        match &recipe.weft {
            WeftSpec::Legacy(s) => assert_eq!(s.yarn_name.as_deref(), Some("75D FDY")),
            other => panic!("unexpected weft spec: {:?}", other),
        }
    }

    #[test]
    fn test_segment_row_into_recipe() {
        let mut row = legacy_row();
        row.wefts_json = Some(
            r#"[{"picks": 24, "denier": 75, "price": 220, "mode": "denier", "count": 0, "yarn_name": "(manual price)"},
                {"picks": 24, "denier": 75, "price": 220, "mode": "denier", "count": 0, "yarn_name": "75D FDY"}]"#
                .to_string(),
        );

        let recipe = row.into_recipe().unwrap();
        match &recipe.weft {
            WeftSpec::Segments { segments, snapshot } => {
                assert_eq!(segments.len(), 2);
                assert_eq!(segments[0].yarn_name, None);
                assert_eq!(segments[1].yarn_name.as_deref(), Some("75D FDY"));
                assert_eq!(snapshot.map(|s| s.picks), Some(Decimal::from(48)));
            }
            other => panic!("unexpected weft spec: {:?}", other),
        }
    }

    #[test]
    fn test_empty_json_list_is_legacy() {
        let mut row = legacy_row();
        row.wefts_json = Some("[]".to_string());
        assert!(row.into_recipe().unwrap().weft.is_legacy());
    }

    #[test]
    fn test_malformed_json_is_reported() {
        let mut row = legacy_row();
        row.wefts_json = Some("{not json".to_string());
        assert!(matches!(row.into_recipe(), Err(CostingError::Serialization(_))));
    }

    #[test]
    fn test_calc_mode_requires_reed() {
        let mut row = legacy_row();
        row.ends_mode = "calc".to_string();
        row.reed = None;
        assert!(matches!(row.into_recipe(), Err(CostingError::MissingField("reed"))));

        row.reed = Some(Decimal::from(64));
        row.borders = Some(Decimal::from(48));
        assert_eq!(row.into_recipe().unwrap().ends().unwrap(), Decimal::from(2960));
    }

    #[test]
    fn test_row_round_trip_with_segments() {
        let recipe = Recipe::new(
            "MULTI",
            Decimal::from(40),
            WarpSpec::from_reed(Decimal::from(64), Decimal::from(40), Decimal::from(100), Decimal::from(400)),
            WeftSpec::Segments {
                segments: vec![
                    WeftSegment::with_denier(Decimal::from(30), Decimal::from(75), Decimal::from(220)),
                    WeftSegment::with_count(Decimal::from(20), Decimal::from(30), Decimal::from(260))
                        .linked_to("30S COTTON"),
                ],
                snapshot: Some(WeftScalars::new(Decimal::from(50), Decimal::from(100), Decimal::from(240))),
            },
            CostingConfig::new(Decimal::new(16, 2)).with_interest(false),
        );

        let row = QualityRow::from_recipe(&recipe, StoredSummary::default()).unwrap();
        assert_eq!(row.ends_mode, "calc");
        assert_eq!(row.ends, Some(Decimal::from(2600)));
        assert_eq!(row.picks, Decimal::from(50));
        assert_eq!(row.weft_yarn_name, None);
        assert!(!row.include_interest);

        let back = row.into_recipe().unwrap();
        assert_eq!(back, recipe);
    }

    #[test]
    fn test_in_memory_store_crud() {
        let mut store = InMemoryRecipeStore::new();
        let b_id = store.save(sample_recipe("beta"), StoredSummary::default()).unwrap();
        let a_id = store.save(sample_recipe("Alpha"), StoredSummary::default()).unwrap();

        let names: Vec<String> = store.list().into_iter().map(|(_, n)| n).collect();
        assert_eq!(names, vec!["Alpha", "beta"]);

        let mut recipe = store.load(b_id).unwrap().recipe;
        recipe.rs = Decimal::from(50);
        store.overwrite(b_id, recipe, StoredSummary::default()).unwrap();
        assert_eq!(store.load(b_id).unwrap().recipe.rs, Decimal::from(50));

        store.delete(a_id).unwrap();
        assert_eq!(store.len(), 1);
        assert!(matches!(store.load(a_id), Err(CostingError::RecipeNotFound(_))));
        assert!(store.delete(a_id).is_err());
        assert!(store
            .overwrite(a_id, sample_recipe("x"), StoredSummary::default())
            .is_err());
    }
}
