//! 布種配方（Quality）模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{CostingConfig, CostingError, Result, WeftSpec};

/// 經紗根數輸入方式
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EndsMode {
    /// 直接輸入根數（筘號僅供參考）
    Direct { ends: Decimal, reed: Option<Decimal> },

    /// 由筘號、筘幅與布邊計算：ends = reed × RS + borders
    FromReed { reed: Decimal, borders: Decimal },
}

impl EndsMode {
    /// 計算經紗根數
    pub fn ends(&self, rs: Decimal) -> Result<Decimal> {
        match *self {
            EndsMode::Direct { ends, .. } => Ok(ends),
            EndsMode::FromReed { reed, borders } => {
                crate::checked_add("ends", crate::checked_mul("ends", reed, rs)?, borders)
            }
        }
    }

    pub fn reed(&self) -> Option<Decimal> {
        match *self {
            EndsMode::Direct { reed, .. } => reed,
            EndsMode::FromReed { reed, .. } => Some(reed),
        }
    }
}

/// 經紗規格
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarpSpec {
    /// 根數輸入方式
    pub ends_mode: EndsMode,

    /// 丹尼數
    pub denier: Decimal,

    /// 連結的紗線名稱（`None` 表示手動單價）
    pub yarn_name: Option<String>,

    /// 每公斤單價
    pub price_per_kg: Decimal,
}

impl WarpSpec {
    /// 直接指定根數的經紗
    pub fn direct(ends: Decimal, denier: Decimal, price_per_kg: Decimal) -> Self {
        Self {
            ends_mode: EndsMode::Direct { ends, reed: None },
            denier,
            yarn_name: None,
            price_per_kg,
        }
    }

    /// 由筘號計算根數的經紗
    pub fn from_reed(reed: Decimal, borders: Decimal, denier: Decimal, price_per_kg: Decimal) -> Self {
        Self {
            ends_mode: EndsMode::FromReed { reed, borders },
            denier,
            yarn_name: None,
            price_per_kg,
        }
    }

    /// 建構器模式：連結紗線名稱
    pub fn linked_to(mut self, yarn_name: impl Into<String>) -> Self {
        self.yarn_name = Some(yarn_name.into());
        self
    }
}

/// 布種配方
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    /// 布種名稱
    pub name: String,

    /// 筘幅（RS），經緯共用
    pub rs: Decimal,

    /// 經紗規格
    pub warp: WarpSpec,

    /// 緯紗規格
    pub weft: WeftSpec,

    /// 費用與加成參數
    pub config: CostingConfig,
}

impl Recipe {
    /// 創建新的配方
    pub fn new(
        name: impl Into<String>,
        rs: Decimal,
        warp: WarpSpec,
        weft: WeftSpec,
        config: CostingConfig,
    ) -> Self {
        Self {
            name: name.into(),
            rs,
            warp,
            weft,
            config,
        }
    }

    /// 經紗根數
    pub fn ends(&self) -> Result<Decimal> {
        self.warp.ends_mode.ends(self.rs)
    }

    /// 基本正值檢查（不含緯紗，緯紗於聚合時處理回退）
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CostingError::MissingField("quality name"));
        }
        crate::ensure_positive("rs", self.rs)?;
        if let EndsMode::FromReed { reed, borders } = self.warp.ends_mode {
            crate::ensure_positive("reed", reed)?;
            crate::ensure_non_negative("borders", borders)?;
        }
        crate::ensure_positive("ends", self.ends()?)?;
        self.config.validate()
    }
}
