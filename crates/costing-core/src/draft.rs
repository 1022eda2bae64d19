//! 配方草稿（由呼叫端持有的可變編輯狀態）

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::weft::count_to_denier;
use crate::{
    CostingConfig, CostingError, PriceRegistry, Recipe, Result, SpecMode, WarpSpec, WeftSegment,
    WeftSpec, YarnRole,
};

/// 配方草稿
///
/// 取代表單的全域狀態：緯紗段的新增、刪除、編輯與紗線選取都在草稿上進行，
/// 引擎本身不保留任何跨呼叫狀態。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeDraft {
    pub name: String,
    pub rs: Decimal,
    pub warp: WarpSpec,
    segments: Vec<WeftSegment>,
    pub config: CostingConfig,
}

impl RecipeDraft {
    /// 創建草稿，預設包含一段空白緯紗
    pub fn new(name: impl Into<String>, config: CostingConfig) -> Self {
        Self {
            name: name.into(),
            rs: Decimal::ZERO,
            warp: WarpSpec::direct(Decimal::ZERO, Decimal::ZERO, Decimal::ZERO),
            segments: vec![WeftSegment::default()],
            config,
        }
    }

    /// 由既有配方建立草稿（供修改後覆寫）
    pub fn from_recipe(recipe: &Recipe) -> Self {
        let (segments, _) = recipe.weft.normalize();
        Self {
            name: recipe.name.clone(),
            rs: recipe.rs,
            warp: recipe.warp.clone(),
            segments,
            config: recipe.config.clone(),
        }
    }

    pub fn segments(&self) -> &[WeftSegment] {
        &self.segments
    }

    /// 緯紗段顯示標籤
    pub fn labels(&self) -> Vec<String> {
        (1..=self.segments.len()).map(|i| format!("Weft {}", i)).collect()
    }

    /// 新增空白緯紗段，回傳其索引
    pub fn add_segment(&mut self) -> usize {
        self.segments.push(WeftSegment::default());
        self.segments.len() - 1
    }

    /// 移除緯紗段（至少保留一段）
    pub fn remove_segment(&mut self, index: usize) -> Result<WeftSegment> {
        if index >= self.segments.len() {
            return Err(CostingError::InvalidSegmentIndex(index));
        }
        if self.segments.len() == 1 {
            return Err(CostingError::LastSegment);
        }
        Ok(self.segments.remove(index))
    }

    /// 編輯緯紗段
    pub fn edit_segment<F>(&mut self, index: usize, edit: F) -> Result<()>
    where
        F: FnOnce(&mut WeftSegment),
    {
        let segment = self
            .segments
            .get_mut(index)
            .ok_or(CostingError::InvalidSegmentIndex(index))?;
        edit(segment);
        Ok(())
    }

    /// 切換規格輸入方式；切回丹尼模式時清除支數
    pub fn set_segment_mode(&mut self, index: usize, mode: SpecMode) -> Result<()> {
        self.edit_segment(index, |segment| {
            segment.mode = mode;
            match mode {
                SpecMode::Denier => segment.count = None,
                SpecMode::Count => {
                    if let Some(denier) = segment.count.and_then(count_to_denier) {
                        segment.denier = denier;
                    }
                }
            }
        })
    }

    /// 選取緯紗紗線並預填最新報價
    ///
    /// 紗線變更時覆蓋單價與規格；未變更時只填入仍為 0 的欄位。
    pub fn select_weft_yarn<R: PriceRegistry>(
        &mut self,
        index: usize,
        yarn_name: Option<&str>,
        registry: &R,
    ) -> Result<()> {
        let segment = self
            .segments
            .get_mut(index)
            .ok_or(CostingError::InvalidSegmentIndex(index))?;

        let changed = segment.yarn_name.as_deref() != yarn_name;
        segment.yarn_name = yarn_name.map(str::to_string);

        let Some(name) = yarn_name else {
            return Ok(());
        };
        let Some(quote) = registry.latest_quote(name, Some(YarnRole::Weft)) else {
            return Ok(());
        };

        if changed || segment.price_per_kg.is_zero() {
            segment.price_per_kg = quote.price_per_kg;
        }

        let quote_denier = quote.denier.filter(|d| *d > Decimal::ZERO);
        let quote_count = quote.count.filter(|c| *c > Decimal::ZERO);
        match segment.mode {
            SpecMode::Denier => {
                if changed || segment.denier.is_zero() {
                    if let Some(denier) = quote_denier.or_else(|| quote_count.and_then(count_to_denier)) {
                        segment.denier = denier;
                    }
                }
            }
            SpecMode::Count => {
                let count_missing = segment.count.map_or(true, |c| c.is_zero());
                if let Some(count) = quote_count.filter(|_| changed || count_missing) {
                    segment.set_count(count);
                } else if let Some(denier) = quote_denier.filter(|_| changed || segment.denier.is_zero()) {
                    segment.denier = denier;
                }
            }
        }
        Ok(())
    }

    /// 選取經紗紗線並預填最新報價
    pub fn select_warp_yarn<R: PriceRegistry>(&mut self, yarn_name: Option<&str>, registry: &R) {
        let changed = self.warp.yarn_name.as_deref() != yarn_name;
        self.warp.yarn_name = yarn_name.map(str::to_string);

        let Some(quote) = yarn_name.and_then(|name| registry.latest_quote(name, Some(YarnRole::Warp)))
        else {
            return;
        };

        if changed || self.warp.price_per_kg.is_zero() {
            self.warp.price_per_kg = quote.price_per_kg;
        }
        if changed || self.warp.denier.is_zero() {
            if let Some(denier) = quote
                .denier
                .filter(|d| *d > Decimal::ZERO)
                .or_else(|| quote.count.and_then(count_to_denier))
            {
                self.warp.denier = denier;
            }
        }
    }

    /// 完成草稿，產生配方
    ///
    /// 只保留緯密、丹尼、單價皆為正的緯紗段；沒有任何有效緯紗段時無法核算。
    pub fn finalize(&self) -> Result<Recipe> {
        crate::ensure_positive("warp_denier", self.warp.denier)?;
        crate::ensure_positive("warp_price_per_kg", self.warp.price_per_kg)?;

        let active: Vec<WeftSegment> = self
            .segments
            .iter()
            .filter(|s| {
                s.picks > Decimal::ZERO && s.denier > Decimal::ZERO && s.price_per_kg > Decimal::ZERO
            })
            .cloned()
            .collect();
        if active.is_empty() {
            return Err(CostingError::NotCostable(
                "至少需要一段有效緯紗（緯密、丹尼、單價皆 > 0）".to_string(),
            ));
        }

        let recipe = Recipe::new(
            self.name.trim(),
            self.rs,
            self.warp.clone(),
            WeftSpec::segments(active),
            self.config.clone(),
        );
        recipe.validate()?;
        Ok(recipe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryPriceRegistry;
    use chrono::NaiveDate;

    fn registry() -> InMemoryPriceRegistry {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let mut registry = InMemoryPriceRegistry::new();
        registry
            .record("75D FDY", YarnRole::Weft, None, Some(Decimal::from(75)), Decimal::from(220), date)
            .unwrap();
        registry
            .record("30S COTTON", YarnRole::Both, Some(Decimal::from(30)), None, Decimal::from(260), date)
            .unwrap();
        registry
            .record("120D POLY", YarnRole::Warp, None, Some(Decimal::from(120)), Decimal::from(450), date)
            .unwrap();
        registry
    }

    fn ready_draft() -> RecipeDraft {
        let mut draft = RecipeDraft::new("SANTOON", CostingConfig::new(Decimal::new(16, 2)));
        draft.rs = Decimal::new(455, 1);
        draft.warp = WarpSpec::direct(Decimal::from(3000), Decimal::from(120), Decimal::from(450));
        draft
    }

    #[test]
    fn test_add_and_remove_segments() {
        let mut draft = ready_draft();
        assert_eq!(draft.segments().len(), 1);

        let idx = draft.add_segment();
        assert_eq!(idx, 1);
        assert_eq!(draft.labels(), vec!["Weft 1", "Weft 2"]);

        assert!(draft.remove_segment(0).is_ok());
        assert!(matches!(draft.remove_segment(0), Err(CostingError::LastSegment)));
        assert!(matches!(draft.remove_segment(5), Err(CostingError::InvalidSegmentIndex(5))));
    }

    #[test]
    fn test_select_weft_yarn_prefills_denier_mode() {
        let registry = registry();
        let mut draft = ready_draft();

        draft.select_weft_yarn(0, Some("75D FDY"), &registry).unwrap();
        let segment = &draft.segments()[0];
        assert_eq!(segment.price_per_kg, Decimal::from(220));
        assert_eq!(segment.denier, Decimal::from(75));

        // 同一紗線再次選取時不覆蓋使用者修改
        draft.edit_segment(0, |s| s.price_per_kg = Decimal::from(230)).unwrap();
        draft.select_weft_yarn(0, Some("75D FDY"), &registry).unwrap();
        assert_eq!(draft.segments()[0].price_per_kg, Decimal::from(230));
    }

    #[test]
    fn test_select_weft_yarn_count_mode_converts() {
        let registry = registry();
        let mut draft = ready_draft();
        draft.set_segment_mode(0, SpecMode::Count).unwrap();

        draft.select_weft_yarn(0, Some("30S COTTON"), &registry).unwrap();
        let segment = &draft.segments()[0];
        assert_eq!(segment.count, Some(Decimal::from(30)));
        assert_eq!(segment.denier, Decimal::from(5315) / Decimal::from(30));
        assert_eq!(segment.price_per_kg, Decimal::from(260));

        draft.set_segment_mode(0, SpecMode::Denier).unwrap();
        assert_eq!(draft.segments()[0].count, None);
    }

    #[test]
    fn test_select_warp_yarn_prefills() {
        let registry = registry();
        let mut draft = RecipeDraft::new("X", CostingConfig::new(Decimal::ONE));

        draft.select_warp_yarn(Some("120D POLY"), &registry);
        assert_eq!(draft.warp.price_per_kg, Decimal::from(450));
        assert_eq!(draft.warp.denier, Decimal::from(120));

        draft.select_warp_yarn(None, &registry);
        assert_eq!(draft.warp.yarn_name, None);
        assert_eq!(draft.warp.price_per_kg, Decimal::from(450));
    }

    #[test]
    fn test_finalize_keeps_active_segments_only() {
        let mut draft = ready_draft();
        draft
            .edit_segment(0, |s| {
                *s = WeftSegment::with_denier(Decimal::from(24), Decimal::from(75), Decimal::from(220))
            })
            .unwrap();
        let idx = draft.add_segment();
        draft.edit_segment(idx, |s| s.picks = Decimal::from(10)).unwrap();

        let recipe = draft.finalize().unwrap();
        match &recipe.weft {
            WeftSpec::Segments { segments, snapshot } => {
                assert_eq!(segments.len(), 1);
                assert!(snapshot.is_none());
            }
            other => panic!("unexpected weft spec: {:?}", other),
        }
    }

    #[test]
    fn test_finalize_without_active_weft_is_not_costable() {
        let draft = ready_draft();
        assert!(matches!(draft.finalize(), Err(CostingError::NotCostable(_))));
    }

    #[test]
    fn test_finalize_rejects_markup_of_hundred() {
        let mut draft = ready_draft();
        draft
            .edit_segment(0, |s| {
                *s = WeftSegment::with_denier(Decimal::from(48), Decimal::from(75), Decimal::from(220))
            })
            .unwrap();
        draft.config = draft.config.clone().with_rfd_markup(Decimal::ONE_HUNDRED);
        assert!(matches!(
            draft.finalize(),
            Err(CostingError::MarkupOutOfRange { .. })
        ));
    }

    #[test]
    fn test_from_recipe_round_trip() {
        let recipe = Recipe::new(
            "LEGACY",
            Decimal::from(40),
            WarpSpec::direct(Decimal::from(2800), Decimal::from(100), Decimal::from(400)),
            WeftSpec::Legacy(WeftSegment::with_denier(Decimal::from(50), Decimal::from(80), Decimal::from(200))),
            CostingConfig::new(Decimal::ONE),
        );
        let draft = RecipeDraft::from_recipe(&recipe);
        assert_eq!(draft.segments().len(), 1);
        assert_eq!(draft.finalize().unwrap().name, "LEGACY");
    }
}
