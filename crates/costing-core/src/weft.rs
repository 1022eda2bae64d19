//! 緯紗段模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 支數（Ne）換算丹尼的固定常數：denier = 5315 / count
pub const NE_TO_DENIER: Decimal = Decimal::from_parts(5315, 0, 0, false, 0);

/// 支數換算丹尼；支數 <= 0 視為無支數
pub fn count_to_denier(count: Decimal) -> Option<Decimal> {
    if count > Decimal::ZERO {
        NE_TO_DENIER.checked_div(count)
    } else {
        None
    }
}

/// 緯紗規格輸入方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecMode {
    /// 以丹尼指定
    #[default]
    Denier,
    /// 以支數（Ne）指定
    Count,
}

/// 緯紗段
///
/// 保存配方凍結時的數值；若連結紗線名稱，計算時會依最新報價覆蓋。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeftSegment {
    /// 每單位長度緯密
    #[serde(default)]
    pub picks: Decimal,

    /// 規格輸入方式
    #[serde(default)]
    pub mode: SpecMode,

    /// 丹尼數（支數模式下為換算值）
    #[serde(default)]
    pub denier: Decimal,

    /// 支數（Ne）
    #[serde(default)]
    pub count: Option<Decimal>,

    /// 每公斤單價
    #[serde(default, rename = "price")]
    pub price_per_kg: Decimal,

    /// 連結的紗線名稱（`None` 表示手動單價）
    #[serde(default)]
    pub yarn_name: Option<String>,
}

impl WeftSegment {
    /// 以丹尼指定的緯紗段
    pub fn with_denier(picks: Decimal, denier: Decimal, price_per_kg: Decimal) -> Self {
        Self {
            picks,
            mode: SpecMode::Denier,
            denier,
            count: None,
            price_per_kg,
            yarn_name: None,
        }
    }

    /// 以支數指定的緯紗段，丹尼由支數換算
    pub fn with_count(picks: Decimal, count: Decimal, price_per_kg: Decimal) -> Self {
        Self {
            picks,
            mode: SpecMode::Count,
            denier: count_to_denier(count).unwrap_or(Decimal::ZERO),
            count: Some(count),
            price_per_kg,
            yarn_name: None,
        }
    }

    /// 建構器模式：連結紗線名稱
    pub fn linked_to(mut self, yarn_name: impl Into<String>) -> Self {
        self.yarn_name = Some(yarn_name.into());
        self
    }

    /// 設定支數並同步換算丹尼
    pub fn set_count(&mut self, count: Decimal) {
        self.count = Some(count);
        if let Some(denier) = count_to_denier(count) {
            self.denier = denier;
        }
    }

    /// 是否連結紗線
    pub fn is_linked(&self) -> bool {
        self.yarn_name.is_some()
    }
}

/// 舊版單緯紗純量欄位
///
/// 多段配方儲存時也會寫入一份有效緯紗快照，作為聚合失敗時的回退值。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeftScalars {
    pub picks: Decimal,
    pub denier: Decimal,
    pub price_per_kg: Decimal,
}

impl WeftScalars {
    pub fn new(picks: Decimal, denier: Decimal, price_per_kg: Decimal) -> Self {
        Self {
            picks,
            denier,
            price_per_kg,
        }
    }

    /// 三個欄位皆為正值才可用於核算
    pub fn is_costable(&self) -> bool {
        self.picks > Decimal::ZERO
            && self.denier > Decimal::ZERO
            && self.price_per_kg > Decimal::ZERO
    }
}

/// 配方的緯紗規格
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WeftSpec {
    /// 舊版：單一緯紗以純量欄位儲存
    Legacy(WeftSegment),

    /// 多段緯紗（有序、非空）
    Segments {
        segments: Vec<WeftSegment>,
        /// 儲存時的有效緯紗快照
        snapshot: Option<WeftScalars>,
    },
}

impl WeftSpec {
    /// 由緯紗段列表建立（尚無快照）
    pub fn segments(segments: Vec<WeftSegment>) -> Self {
        WeftSpec::Segments {
            segments,
            snapshot: None,
        }
    }

    /// 正規化為緯紗段列表與回退純量
    ///
    /// 舊版形狀轉為長度 1 的列表；空列表時以快照重建單一緯紗段，
    /// 確保下游永遠拿到長度 >= 1 的列表。
    pub fn normalize(&self) -> (Vec<WeftSegment>, Option<WeftScalars>) {
        match self {
            WeftSpec::Legacy(segment) => {
                let scalars =
                    WeftScalars::new(segment.picks, segment.denier, segment.price_per_kg);
                (vec![segment.clone()], Some(scalars))
            }
            WeftSpec::Segments { segments, snapshot } => {
                if segments.is_empty() {
                    let rebuilt = snapshot
                        .map(|s| WeftSegment::with_denier(s.picks, s.denier, s.price_per_kg))
                        .unwrap_or_default();
                    (vec![rebuilt], *snapshot)
                } else {
                    (segments.clone(), *snapshot)
                }
            }
        }
    }

    /// 回退純量（舊版形狀即為其本身欄位）
    pub fn fallback(&self) -> Option<WeftScalars> {
        match self {
            WeftSpec::Legacy(segment) => Some(WeftScalars::new(
                segment.picks,
                segment.denier,
                segment.price_per_kg,
            )),
            WeftSpec::Segments { snapshot, .. } => *snapshot,
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, WeftSpec::Legacy(_))
    }
}
