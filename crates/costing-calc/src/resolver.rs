//! 紗線價格解析
//!
//! 決定單段紗線在本次計算實際使用的單價、丹尼與支數：
//! - 未連結紗線（手動單價）：一律使用配方凍結值
//! - 連結紗線且有報價：單價一律以報價覆蓋；丹尼/支數依規格輸入方式覆蓋
//! - 連結紗線但無報價：沿用凍結值，不視為錯誤

use chrono::NaiveDate;
use costing_core::weft::count_to_denier;
use costing_core::{PriceRegistry, SpecMode, WarpSpec, WeftSegment, YarnQuote, YarnRole};
use rust_decimal::Decimal;

/// 單價來源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource {
    /// 手動單價（未連結紗線）
    Manual,
    /// 取自價格登錄簿
    Registry { quote_id: u64, valid_from: NaiveDate },
    /// 已連結紗線但查無報價，沿用凍結值
    Frozen,
}

/// 配方凍結的紗線數值
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrozenYarn {
    pub price_per_kg: Decimal,
    pub denier: Decimal,
    pub count: Option<Decimal>,
    pub mode: SpecMode,
}

/// 解析後的紗線數值
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedYarn {
    pub price_per_kg: Decimal,
    pub denier: Decimal,
    pub count: Option<Decimal>,
    pub source: PriceSource,
}

impl ResolvedYarn {
    fn frozen(frozen: FrozenYarn, source: PriceSource) -> Self {
        Self {
            price_per_kg: frozen.price_per_kg,
            denier: frozen.denier,
            count: frozen.count,
            source,
        }
    }
}

/// 價格解析器
pub struct PriceResolver;

impl PriceResolver {
    /// 解析單段紗線
    pub fn resolve<R: PriceRegistry + ?Sized>(
        registry: &R,
        role: YarnRole,
        yarn_name: Option<&str>,
        frozen: FrozenYarn,
    ) -> ResolvedYarn {
        let Some(name) = yarn_name else {
            return ResolvedYarn::frozen(frozen, PriceSource::Manual);
        };

        match registry.latest_quote(name, Some(role)) {
            Some(quote) => {
                let resolved = Self::apply_quote(frozen, &quote);
                tracing::debug!(
                    "紗線 {} ({:?}) 使用報價 #{}：單價 {}，丹尼 {}",
                    name,
                    role,
                    quote.id,
                    resolved.price_per_kg,
                    resolved.denier
                );
                resolved
            }
            None => {
                tracing::warn!("紗線 {} ({:?}) 查無報價，沿用配方凍結值", name, role);
                ResolvedYarn::frozen(frozen, PriceSource::Frozen)
            }
        }
    }

    /// 以報價覆蓋凍結值
    ///
    /// 丹尼模式：報價丹尼優先，無丹尼時由報價支數換算。
    /// 支數模式：報價支數優先並換算丹尼，無支數時直接使用報價丹尼。
    pub fn apply_quote(frozen: FrozenYarn, quote: &YarnQuote) -> ResolvedYarn {
        let quote_denier = quote.denier.filter(|d| *d > Decimal::ZERO);
        let quote_count = quote.count.filter(|c| *c > Decimal::ZERO);

        let mut denier = frozen.denier;
        let mut count = frozen.count;
        match frozen.mode {
            SpecMode::Denier => {
                if let Some(d) = quote_denier.or_else(|| quote_count.and_then(count_to_denier)) {
                    denier = d;
                }
            }
            SpecMode::Count => {
                if let Some(c) = quote_count {
                    count = Some(c);
                    if let Some(d) = count_to_denier(c) {
                        denier = d;
                    }
                } else if let Some(d) = quote_denier {
                    denier = d;
                }
            }
        }

        ResolvedYarn {
            price_per_kg: quote.price_per_kg,
            denier,
            count,
            source: PriceSource::Registry {
                quote_id: quote.id,
                valid_from: quote.valid_from,
            },
        }
    }

    /// 解析經紗（經紗一律以丹尼指定）
    pub fn resolve_warp<R: PriceRegistry + ?Sized>(registry: &R, warp: &WarpSpec) -> ResolvedYarn {
        let frozen = FrozenYarn {
            price_per_kg: warp.price_per_kg,
            denier: warp.denier,
            count: None,
            mode: SpecMode::Denier,
        };
        Self::resolve(registry, YarnRole::Warp, warp.yarn_name.as_deref(), frozen)
    }

    /// 解析緯紗段
    pub fn resolve_weft<R: PriceRegistry + ?Sized>(
        registry: &R,
        segment: &WeftSegment,
    ) -> ResolvedYarn {
        let frozen = FrozenYarn {
            price_per_kg: segment.price_per_kg,
            denier: segment.denier,
            count: segment.count,
            mode: segment.mode,
        };
        Self::resolve(registry, YarnRole::Weft, segment.yarn_name.as_deref(), frozen)
    }
}
