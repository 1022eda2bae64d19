//! Python 綁定實現

use chrono::NaiveDate;
use costing_calc::{CostingCalculator, PricingSheet};
use costing_core::{
    CostingConfig, CostingError, InMemoryPriceRegistry, Recipe, WarpSpec, WeftSegment, WeftSpec,
    YarnRole,
};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use rust_decimal::Decimal;

fn to_py_err(err: CostingError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

fn json_err(err: serde_json::Error) -> PyErr {
    PyValueError::new_err(format!("JSON 錯誤: {}", err))
}

fn to_decimal(field: &str, value: f64) -> PyResult<Decimal> {
    Decimal::try_from(value)
        .map_err(|_| PyValueError::new_err(format!("無法轉換數值 {}: {}", field, value)))
}

fn to_optional_decimal(field: &str, value: Option<f64>) -> PyResult<Option<Decimal>> {
    value.map(|v| to_decimal(field, v)).transpose()
}

fn parse_role(role: &str) -> PyResult<YarnRole> {
    match role {
        "warp" => Ok(YarnRole::Warp),
        "weft" => Ok(YarnRole::Weft),
        "both" => Ok(YarnRole::Both),
        _ => Err(PyValueError::new_err(format!(
            "Invalid role: {}, must be 'warp', 'weft', or 'both'",
            role
        ))),
    }
}

/// Python 紗線價格登錄簿
#[pyclass(name = "PriceRegistry")]
#[derive(Default)]
pub struct PyPriceRegistry {
    inner: InMemoryPriceRegistry,
}

#[pymethods]
impl PyPriceRegistry {
    #[new]
    fn new() -> Self {
        Self::default()
    }

    /// 新增報價，回傳報價 ID
    #[pyo3(signature = (name, role, price_per_kg, valid_from, count=None, denier=None))]
    fn record(
        &mut self,
        name: &str,
        role: &str,
        price_per_kg: f64,
        valid_from: &str,
        count: Option<f64>,
        denier: Option<f64>,
    ) -> PyResult<u64> {
        let valid_from = NaiveDate::parse_from_str(valid_from, "%Y-%m-%d")
            .map_err(|e| PyValueError::new_err(format!("Invalid date {}: {}", valid_from, e)))?;
        self.inner
            .record(
                name,
                parse_role(role)?,
                to_optional_decimal("count", count)?,
                to_optional_decimal("denier", denier)?,
                to_decimal("price_per_kg", price_per_kg)?,
                valid_from,
            )
            .map_err(to_py_err)
    }

    /// 列出紗線名稱
    #[pyo3(signature = (role=None))]
    fn list_names(&self, role: Option<&str>) -> PyResult<Vec<String>> {
        let role = role.map(parse_role).transpose()?;
        Ok(self.inner.list_names(role))
    }

    /// 刪除紗線的所有報價
    fn delete_yarn(&mut self, name: &str) -> usize {
        self.inner.delete_yarn(name)
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }
}

/// Python 費用與加成配置
#[pyclass(name = "CostingConfig")]
#[derive(Clone)]
pub struct PyCostingConfig {
    #[pyo3(get, set)]
    pub weaving_rate_per_pick: f64,
    #[pyo3(get, set)]
    pub grey_markup_percent: f64,
    #[pyo3(get, set)]
    pub rfd_charge_per_unit: f64,
    #[pyo3(get, set)]
    pub rfd_shortage: f64,
    #[pyo3(get, set)]
    pub rfd_markup_percent: f64,
    #[pyo3(get, set)]
    pub include_interest: bool,
    #[pyo3(get, set)]
    pub rfd_shortage_rule: String, // "percentage" or "flat"
}

#[pymethods]
impl PyCostingConfig {
    #[new]
    #[pyo3(signature = (weaving_rate_per_pick, grey_markup_percent=0.0, rfd_charge_per_unit=0.0, rfd_shortage=0.0, rfd_markup_percent=0.0, include_interest=true))]
    fn new(
        weaving_rate_per_pick: f64,
        grey_markup_percent: f64,
        rfd_charge_per_unit: f64,
        rfd_shortage: f64,
        rfd_markup_percent: f64,
        include_interest: bool,
    ) -> Self {
        Self {
            weaving_rate_per_pick,
            grey_markup_percent,
            rfd_charge_per_unit,
            rfd_shortage,
            rfd_markup_percent,
            include_interest,
            rfd_shortage_rule: "percentage".to_string(),
        }
    }
}

/// 內部方法實現（不暴露給 Python）
impl PyCostingConfig {
    pub(crate) fn to_rust_config(&self) -> PyResult<CostingConfig> {
        let config = CostingConfig::new(to_decimal("weaving_rate_per_pick", self.weaving_rate_per_pick)?)
            .with_grey_markup(to_decimal("grey_markup_percent", self.grey_markup_percent)?)
            .with_rfd_charge(to_decimal("rfd_charge_per_unit", self.rfd_charge_per_unit)?)
            .with_rfd_markup(to_decimal("rfd_markup_percent", self.rfd_markup_percent)?)
            .with_interest(self.include_interest);

        let shortage = to_decimal("rfd_shortage", self.rfd_shortage)?;
        let config = match self.rfd_shortage_rule.as_str() {
            "percentage" => config.with_rfd_shortage_percent(shortage),
            "flat" => config.with_rfd_shortage_flat(shortage),
            _ => {
                return Err(PyValueError::new_err(format!(
                    "Invalid rfd_shortage_rule: {}, must be 'percentage' or 'flat'",
                    self.rfd_shortage_rule
                )))
            }
        };
        Ok(config)
    }
}

/// Python 成本核算計算器
#[pyclass(name = "CostingCalculator")]
#[derive(Default)]
pub struct PyCostingCalculator {}

#[pymethods]
impl PyCostingCalculator {
    #[new]
    fn new() -> Self {
        Self {}
    }

    /// 以配方 JSON 核算，回傳成本明細 JSON
    #[pyo3(signature = (recipe_json, registry=None))]
    fn recompute(&self, recipe_json: &str, registry: Option<PyRef<'_, PyPriceRegistry>>) -> PyResult<String> {
        let recipe: Recipe = serde_json::from_str(recipe_json).map_err(json_err)?;
        let breakdown = match registry {
            Some(registry) => CostingCalculator::new(&registry.inner).recompute(&recipe),
            None => CostingCalculator::new(InMemoryPriceRegistry::new()).recompute(&recipe),
        }
        .map_err(to_py_err)?;
        serde_json::to_string(&breakdown).map_err(json_err)
    }

    /// 以配方 JSON 陣列產生報價單 JSON
    #[pyo3(signature = (recipes_json, registry=None))]
    fn pricing_sheet(
        &self,
        recipes_json: &str,
        registry: Option<PyRef<'_, PyPriceRegistry>>,
    ) -> PyResult<String> {
        let recipes: Vec<Recipe> = serde_json::from_str(recipes_json).map_err(json_err)?;
        let sheet = match registry {
            Some(registry) => PricingSheet::from_recipes(&CostingCalculator::new(&registry.inner), &recipes),
            None => PricingSheet::from_recipes(&CostingCalculator::new(InMemoryPriceRegistry::new()), &recipes),
        };
        serde_json::to_string(&sheet).map_err(json_err)
    }
}

/// 單緯公式核算（手動單價，不查登錄簿），回傳成本明細 JSON
#[pyfunction]
#[pyo3(signature = (ends, warp_denier, warp_price, rs, picks, weft_denier, weft_price, config))]
#[allow(clippy::too_many_arguments)]
pub fn calculate_costing(
    ends: f64,
    warp_denier: f64,
    warp_price: f64,
    rs: f64,
    picks: f64,
    weft_denier: f64,
    weft_price: f64,
    config: PyRef<'_, PyCostingConfig>,
) -> PyResult<String> {
    let recipe = Recipe::new(
        "calculate_costing",
        to_decimal("rs", rs)?,
        WarpSpec::direct(
            to_decimal("ends", ends)?,
            to_decimal("warp_denier", warp_denier)?,
            to_decimal("warp_price", warp_price)?,
        ),
        WeftSpec::Legacy(WeftSegment::with_denier(
            to_decimal("picks", picks)?,
            to_decimal("weft_denier", weft_denier)?,
            to_decimal("weft_price", weft_price)?,
        )),
        config.to_rust_config()?,
    );

    let breakdown = costing_calc::recompute(&recipe, &InMemoryPriceRegistry::new()).map_err(to_py_err)?;
    serde_json::to_string(&breakdown).map_err(json_err)
}
