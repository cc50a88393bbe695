//! Prediction results and output normalization.
//!
//! Models report predictions in several shapes. All of them are folded into
//! `{intent, probabilities}` here.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// Uniform prediction result.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PredictionResult {
    pub success: bool,
    pub intent: Option<String>,
    pub probabilities: BTreeMap<String, f64>,
    pub errors: Vec<String>,
}

impl PredictionResult {
    pub fn failed(errors: Vec<String>) -> Self {
        Self { errors, ..Self::default() }
    }
}

/// Intent and per-class probabilities extracted from raw model output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedOutput {
    pub intent: Option<String>,
    pub probabilities: BTreeMap<String, f64>,
}

/// Fold a raw prediction into `NormalizedOutput`.
///
/// Accepted shapes:
/// - `{"intent": .., "probabilities": {class: p}}`
/// - `{"intent": .., "probabilities": [p, ..]}` with `classes` from the model
/// - `{"classes": [..], "probabilities": [..]}` (intent is the argmax)
/// - `[p, ..]` with `classes` from the model (intent is the argmax)
pub fn normalize_output(output: &Value, classes: Option<&[String]>) -> NormalizedOutput {
    match output {
        Value::Object(map) => {
            if let Some(intent) = map.get("intent") {
                let probabilities = match map.get("probabilities") {
                    Some(Value::Object(probs)) => probs
                        .iter()
                        .filter_map(|(k, v)| v.as_f64().map(|p| (k.clone(), p)))
                        .collect(),
                    Some(Value::Array(probs)) => classes
                        .map(|classes| zip_probabilities(classes, probs))
                        .unwrap_or_default(),
                    _ => BTreeMap::new(),
                };
                return NormalizedOutput { intent: intent_label(intent), probabilities };
            }

            match (map.get("classes"), map.get("probabilities")) {
                (Some(Value::Array(labels)), Some(Value::Array(probs))) => {
                    let labels: Vec<String> = labels.iter().filter_map(intent_label).collect();
                    from_parallel(&labels, probs)
                }
                _ => NormalizedOutput::default(),
            }
        }
        Value::Array(probs) => match classes {
            Some(classes) => from_parallel(classes, probs),
            None => NormalizedOutput::default(),
        },
        _ => NormalizedOutput::default(),
    }
}

fn intent_label(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn zip_probabilities(classes: &[String], probs: &[Value]) -> BTreeMap<String, f64> {
    classes
        .iter()
        .zip(probs)
        .filter_map(|(class, p)| p.as_f64().map(|p| (class.clone(), p)))
        .collect()
}

fn from_parallel(classes: &[String], probs: &[Value]) -> NormalizedOutput {
    let mut best: Option<(&String, f64)> = None;
    for (class, p) in classes.iter().zip(probs) {
        if let Some(p) = p.as_f64() {
            if best.map_or(true, |(_, b)| p > b) {
                best = Some((class, p));
            }
        }
    }
    NormalizedOutput {
        intent: best.map(|(class, _)| class.clone()),
        probabilities: zip_probabilities(classes, probs),
    }
}
