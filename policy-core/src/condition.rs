//! Boolean conditions over resolved variables.
//!
//! A `Condition` is a JSON object mapping operator name to operand; every
//! top-level entry must pass (AND).

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{PolicyError, Result};
use crate::resolver::DynResolver;

/// A single boolean condition: operator name -> operand. Multiple entries
/// are AND-joined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Condition(Map<String, Value>);

impl Condition {
    /// Evaluate this condition against `resolver`. Boxed because `anyOf`
    /// and `noneOf` recurse into nested conditions.
    pub fn evaluate<'a>(
        &'a self,
        resolver: &'a DynResolver,
    ) -> Pin<Box<dyn Future<Output = Result<bool>> + Send + 'a>> {
        Box::pin(async move {
            for (op, operand) in &self.0 {
                if !apply_operator(op, operand, resolver).await? {
                    return Ok(false);
                }
            }
            Ok(true)
        })
    }
}

/// Evaluate a list of conditions, AND-joined.
pub async fn evaluate_all(conditions: &[Condition], resolver: &DynResolver) -> Result<bool> {
    for condition in conditions {
        if !condition.evaluate(resolver).await? {
            return Ok(false);
        }
    }
    Ok(true)
}

async fn apply_operator(op: &str, operand: &Value, resolver: &DynResolver) -> Result<bool> {
    match op {
        "equals" => binary(operand, resolver, |a, b| a == b).await,
        "endsWith" => binary(operand, resolver, |a, b| a.ends_with(b)).await,
        "contains" => contains(operand, resolver).await,
        "anyOf" => any_of(operand, resolver).await,
        "noneOf" => none_of(operand, resolver).await,
        other => Err(PolicyError::Condition(format!("unknown operator: {other}"))),
    }
}

async fn binary_pairs(operand: &Value, resolver: &DynResolver) -> Result<Vec<(Vec<String>, Vec<String>)>> {
    let map = operand
        .as_object()
        .ok_or_else(|| PolicyError::Condition("binary predicate operand must be an object".into()))?;

    let mut pairs = Vec::with_capacity(map.len());
    for (lhs_text, rhs_value) in map {
        let rhs_text = rhs_value
            .as_str()
            .ok_or_else(|| PolicyError::Condition(format!("operand value for {lhs_text} must be a string")))?;
        let lhs = resolver.resolve(lhs_text).await?;
        let rhs = resolver.resolve(rhs_text).await?;
        pairs.push((lhs, rhs));
    }
    Ok(pairs)
}

fn single_or_empty<'a>(list: &'a [String], label: &str) -> Result<Option<&'a str>> {
    match list.len() {
        0 => Ok(None),
        1 => Ok(Some(list[0].as_str())),
        _ => Err(PolicyError::Condition(format!("{label} resolved to more than one value"))),
    }
}

async fn binary(operand: &Value, resolver: &DynResolver, test: impl Fn(&str, &str) -> bool) -> Result<bool> {
    let pairs = binary_pairs(operand, resolver).await?;
    let mut passed = true;
    for (lhs, rhs) in &pairs {
        let l = single_or_empty(lhs, "left-hand side")?;
        let r = single_or_empty(rhs, "right-hand side")?;
        passed &= matches!((l, r), (Some(a), Some(b)) if test(a, b));
    }
    Ok(passed)
}

async fn contains(operand: &Value, resolver: &DynResolver) -> Result<bool> {
    let pairs = binary_pairs(operand, resolver).await?;
    let mut passed = true;
    for (item_values, csv_values) in &pairs {
        let item = single_or_empty(item_values, "item")?;
        let csv = single_or_empty(csv_values, "csv")?;
        passed &= matches!((item, csv), (Some(item), Some(csv)) if csv.split(',').any(|s| s == item));
    }
    Ok(passed)
}

fn sub_conditions(operand: &Value) -> Result<Vec<Condition>> {
    let items = operand
        .as_array()
        .ok_or_else(|| PolicyError::Condition("anyOf/noneOf operand must be an array".into()))?;

    items
        .iter()
        .map(|item| {
            item.as_object()
                .map(|map| Condition(map.clone()))
                .ok_or_else(|| PolicyError::Condition("anyOf/noneOf elements must be condition objects".into()))
        })
        .collect()
}

async fn any_of(operand: &Value, resolver: &DynResolver) -> Result<bool> {
    for condition in sub_conditions(operand)? {
        if condition.evaluate(resolver).await? {
            return Ok(true);
        }
    }
    Ok(false)
}

async fn none_of(operand: &Value, resolver: &DynResolver) -> Result<bool> {
    for condition in sub_conditions(operand)? {
        if condition.evaluate(resolver).await? {
            return Ok(false);
        }
    }
    Ok(true)
}
