//! # Costing FFI
//!
//! Python 綁定層（PyO3）

use pyo3::prelude::*;

pub mod python;

/// Python 模組註冊
#[pymodule]
fn costing_engine(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<python::PyCostingCalculator>()?;
    m.add_class::<python::PyPriceRegistry>()?;
    m.add_class::<python::PyCostingConfig>()?;
    m.add_function(wrap_pyfunction!(python::calculate_costing, m)?)?;
    Ok(())
}
