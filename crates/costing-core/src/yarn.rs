//! 紗線報價模型與價格登錄簿

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{CostingError, Result};

/// 紗線用途
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YarnRole {
    /// 經紗
    Warp,
    /// 緯紗
    Weft,
    /// 經緯皆可
    Both,
}

impl YarnRole {
    /// 檢查此報價用途是否可供指定用途使用（`Both` 可供任何用途）
    pub fn serves(self, requested: YarnRole) -> bool {
        self == YarnRole::Both || self == requested
    }
}

/// 紗線報價（只增不改的歷史紀錄）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YarnQuote {
    /// 登錄序號（同日期時以此判斷先後）
    pub id: u64,

    /// 紗線名稱
    pub name: String,

    /// 用途
    pub role: YarnRole,

    /// 支數（Ne）
    pub count: Option<Decimal>,

    /// 丹尼數
    pub denier: Option<Decimal>,

    /// 每公斤單價
    pub price_per_kg: Decimal,

    /// 生效日期
    pub valid_from: NaiveDate,
}

impl YarnQuote {
    /// 排序鍵：生效日期優先，其次登錄序號
    pub fn recency_key(&self) -> (NaiveDate, u64) {
        (self.valid_from, self.id)
    }
}

/// 價格登錄簿讀取介面
///
/// 引擎只讀取「目前適用的最新報價」，不持有、不快取登錄簿狀態。
pub trait PriceRegistry {
    /// 取得指定紗線的最新報價
    ///
    /// 依（生效日期降冪、登錄序號降冪）選取；`role` 為 `None` 時不過濾用途，
    /// 用途為 `Both` 的報價可匹配任何用途。
    fn latest_quote(&self, name: &str, role: Option<YarnRole>) -> Option<YarnQuote>;
}

impl<R: PriceRegistry + ?Sized> PriceRegistry for &R {
    fn latest_quote(&self, name: &str, role: Option<YarnRole>) -> Option<YarnQuote> {
        (**self).latest_quote(name, role)
    }
}

/// 記憶體內的價格登錄簿
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryPriceRegistry {
    quotes: Vec<YarnQuote>,
    next_id: u64,
}

impl InMemoryPriceRegistry {
    /// 創建空的登錄簿
    pub fn new() -> Self {
        Self::default()
    }

    /// 登錄新報價，回傳登錄序號
    ///
    /// 支數或丹尼數 <= 0 視為未提供。
    pub fn record(
        &mut self,
        name: &str,
        role: YarnRole,
        count: Option<Decimal>,
        denier: Option<Decimal>,
        price_per_kg: Decimal,
        valid_from: NaiveDate,
    ) -> Result<u64> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CostingError::MissingField("yarn name"));
        }
        crate::ensure_positive("price_per_kg", price_per_kg)?;

        self.next_id += 1;
        let id = self.next_id;
        self.quotes.push(YarnQuote {
            id,
            name: name.to_string(),
            role,
            count: count.filter(|c| *c > Decimal::ZERO),
            denier: denier.filter(|d| *d > Decimal::ZERO),
            price_per_kg,
            valid_from,
        });
        Ok(id)
    }

    /// 列出不重複的紗線名稱（依名稱排序），可依用途過濾
    pub fn list_names(&self, role: Option<YarnRole>) -> Vec<String> {
        let mut names: Vec<String> = self
            .quotes
            .iter()
            .filter(|q| role.map_or(true, |r| q.role.serves(r)))
            .map(|q| q.name.clone())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// 所有報價，最新在前
    pub fn quotes_latest_first(&self) -> Vec<&YarnQuote> {
        let mut quotes: Vec<&YarnQuote> = self.quotes.iter().collect();
        quotes.sort_by(|a, b| b.recency_key().cmp(&a.recency_key()));
        quotes
    }

    /// 就地修改一筆報價（登錄簿擁有者的操作，用途保持不變）
    pub fn edit_quote(
        &mut self,
        id: u64,
        name: &str,
        count: Option<Decimal>,
        denier: Option<Decimal>,
        price_per_kg: Decimal,
        valid_from: NaiveDate,
    ) -> Result<()> {
        crate::ensure_positive("price_per_kg", price_per_kg)?;
        let quote = self
            .quotes
            .iter_mut()
            .find(|q| q.id == id)
            .ok_or(CostingError::QuoteNotFound(id))?;

        quote.name = name.trim().to_string();
        quote.count = count.filter(|c| *c > Decimal::ZERO);
        quote.denier = denier.filter(|d| *d > Decimal::ZERO);
        quote.price_per_kg = price_per_kg;
        quote.valid_from = valid_from;
        Ok(())
    }

    /// 刪除某紗線的全部報價，回傳刪除筆數
    pub fn delete_yarn(&mut self, name: &str) -> usize {
        let name = name.trim();
        let before = self.quotes.len();
        self.quotes.retain(|q| q.name != name);
        before - self.quotes.len()
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

impl PriceRegistry for InMemoryPriceRegistry {
    fn latest_quote(&self, name: &str, role: Option<YarnRole>) -> Option<YarnQuote> {
        self.quotes
            .iter()
            .filter(|q| q.name == name)
            .filter(|q| role.map_or(true, |r| q.role.serves(r)))
            .max_by_key(|q| q.recency_key())
            .cloned()
    }
}
