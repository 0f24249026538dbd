//! Rule Engine Core - boolean-expression rule compiler and evaluator
//!
//! This crate turns condition strings like `age > 18 AND status = 'active'`
//! into expression trees, persists them in a portable JSON form and
//! evaluates them against records, with Python bindings via PyO3.

use pyo3::prelude::*;

pub mod config;
pub mod engine;
pub mod error;
pub mod record;
pub mod rule;
pub mod store;

use crate::config::{deserialize_config, EngineConfig};
use crate::engine::RuleEngine;
use crate::record::record_from_py;
use crate::rule::ExpressionNode;
use crate::store::MemoryRuleStore;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use pyo3::exceptions::PyRuntimeError;
use pyo3::types::PyDict;
use std::sync::Arc;

// ============================================================================
// Cached Engine
// ============================================================================

type SharedEngine = Arc<RwLock<RuleEngine<MemoryRuleStore>>>;

/// Global engine holding the configuration and the stored rules
static CACHED_ENGINE: OnceCell<SharedEngine> = OnceCell::new();

fn cached_engine() -> PyResult<SharedEngine> {
    CACHED_ENGINE
        .get()
        .cloned()
        .ok_or_else(|| PyRuntimeError::new_err("Engine not initialized. Call init_engine() first."))
}

// ============================================================================
// CompiledRule PyClass
// ============================================================================

/// A parsed or combined rule held in Rust memory
#[pyclass]
pub struct CompiledRule {
    root: ExpressionNode,
}

impl CompiledRule {
    pub fn new(root: ExpressionNode) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &ExpressionNode {
        &self.root
    }
}

#[pymethods]
impl CompiledRule {
    /// Portable JSON form, suitable for storage
    #[getter]
    fn ast_json(&self) -> PyResult<String> {
        Ok(rule::to_json(Some(&self.root))?)
    }

    /// Field names referenced by the rule, in visitation order
    fn fields(&self) -> Vec<String> {
        rule::fields_of(Some(&self.root))
    }

    /// Evaluate the rule against a dict of field values
    fn evaluate(&self, data: &Bound<'_, PyDict>) -> PyResult<bool> {
        let record = record_from_py(data)?;
        Ok(self.root.evaluate(&record)?)
    }

    fn __str__(&self) -> String {
        self.root.to_string()
    }

    fn __repr__(&self) -> String {
        format!("CompiledRule({})", self.root)
    }
}

// ============================================================================
// Python Functions
// ============================================================================

/// Initialize the rule engine (call once at startup)
///
/// # Arguments
/// * `config` - Optional dict: `cache_enabled` (bool), `cache_capacity` (int)
///
/// Calling it again replaces the engine, including its stored rules.
#[pyfunction]
#[pyo3(signature = (config=None))]
fn init_engine(config: Option<&Bound<'_, PyDict>>) -> PyResult<()> {
    let config = match config {
        Some(dict) => deserialize_config(dict)?,
        None => EngineConfig::default(),
    };

    let engine = RuleEngine::new(MemoryRuleStore::new(), config);

    if let Some(existing) = CACHED_ENGINE.get() {
        let mut guard = existing.write();
        *guard = engine;
    } else {
        let _ = CACHED_ENGINE.set(Arc::new(RwLock::new(engine)));
    }

    Ok(())
}

/// Check if the engine is initialized
#[pyfunction]
fn is_engine_initialized() -> bool {
    CACHED_ENGINE.get().is_some()
}

/// Parse a rule string
///
/// # Raises
/// ValueError on lexical or syntax errors, or an empty rule
#[pyfunction]
fn parse_rule(rule: &str) -> PyResult<CompiledRule> {
    let (root, _) = engine::parse_rule(rule)?;
    Ok(CompiledRule::new(root))
}

/// Combine rules under the operator used most often across their texts
#[pyfunction]
fn combine_rules(rules: Vec<String>) -> PyResult<CompiledRule> {
    let (root, _) = engine::combine_rules(&rules)?;
    Ok(CompiledRule::new(root))
}

/// Combine rules with AND, left to right
#[pyfunction]
fn conjoin_rules(rules: Vec<String>) -> PyResult<CompiledRule> {
    let (root, _) = engine::conjoin_rules(&rules)?;
    Ok(CompiledRule::new(root))
}

/// Evaluate a portable JSON tree against a dict of field values
#[pyfunction]
fn evaluate(ast_json: &str, data: &Bound<'_, PyDict>) -> PyResult<bool> {
    let record = record_from_py(data)?;
    let tree = rule::portable::portable_from_json(ast_json)?;
    Ok(engine::evaluate_portable(tree, &record)?)
}

/// Field names referenced by a portable JSON tree
#[pyfunction]
fn fields_of(ast_json: &str) -> PyResult<Vec<String>> {
    let tree = rule::portable::portable_from_json(ast_json)?;
    Ok(engine::fields_of_portable(tree)?)
}

/// Parse a rule and store it under `name`
///
/// # Raises
/// ValueError on parse errors, RuntimeError if the name is already taken
#[pyfunction]
fn create_rule(name: &str, rule: &str) -> PyResult<CompiledRule> {
    let engine = cached_engine()?;
    let root = engine.read().create_rule(name, rule)?;
    Ok(CompiledRule::new(root))
}

/// Evaluate a stored rule against a dict of field values
///
/// # Raises
/// KeyError if the rule or a referenced field is missing
#[pyfunction]
fn evaluate_rule(rule_name: &str, data: &Bound<'_, PyDict>) -> PyResult<bool> {
    let engine = cached_engine()?;
    let record = record_from_py(data)?;
    let result = engine.read().evaluate_rule(rule_name, &record)?;
    Ok(result)
}

/// Evaluate a stored rule asynchronously
///
/// Evaluation runs on Tokio's blocking pool so the asyncio event loop stays
/// responsive.
///
/// # Example (Python)
/// ```python
/// matched = await evaluate_rule_async("eligible", {"age": 35, "salary": 60000})
/// ```
#[pyfunction]
fn evaluate_rule_async<'py>(
    py: Python<'py>,
    rule_name: String,
    data: &Bound<'py, PyDict>,
) -> PyResult<Bound<'py, PyAny>> {
    // Resolve everything that touches Python objects before leaving the GIL
    let engine = cached_engine()?;
    let record = record_from_py(data)?;

    pyo3_async_runtimes::tokio::future_into_py(py, async move {
        let result = tokio::task::spawn_blocking(move || {
            let engine = engine.read();
            engine
                .evaluate_rule(&rule_name, &record)
                .map_err(PyErr::from)
        })
        .await
        .map_err(|e| PyRuntimeError::new_err(format!("Evaluation task panicked: {}", e)))??;

        Ok(result)
    })
}

/// Field names a stored rule depends on
#[pyfunction]
fn check_rule(rule_name: &str) -> PyResult<Vec<String>> {
    let engine = cached_engine()?;
    let fields = engine.read().rule_fields(rule_name)?;
    Ok(fields)
}

// ============================================================================
// Python Module Definition
// ============================================================================

/// Python module definition
#[pymodule]
fn rule_engine_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(init_engine, m)?)?;
    m.add_function(wrap_pyfunction!(is_engine_initialized, m)?)?;
    m.add_function(wrap_pyfunction!(parse_rule, m)?)?;
    m.add_function(wrap_pyfunction!(combine_rules, m)?)?;
    m.add_function(wrap_pyfunction!(conjoin_rules, m)?)?;
    m.add_function(wrap_pyfunction!(evaluate, m)?)?;
    m.add_function(wrap_pyfunction!(fields_of, m)?)?;
    m.add_function(wrap_pyfunction!(create_rule, m)?)?;
    m.add_function(wrap_pyfunction!(evaluate_rule, m)?)?;
    m.add_function(wrap_pyfunction!(evaluate_rule_async, m)?)?;
    m.add_function(wrap_pyfunction!(check_rule, m)?)?;
    m.add_class::<CompiledRule>()?;
    Ok(())
}
