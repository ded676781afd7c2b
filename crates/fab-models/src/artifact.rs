//! Serialized regression pipelines.
//!
//! An artifact is a JSON document with an input column list (numeric or
//! one-hot encoded) and an estimator: a linear model or a gradient-boosted
//! ensemble of regression trees. Pipelines encode their own categorical
//! columns, so callers hand over raw labels.

use fab_core::{FeatureRow, FeatureValue, ModelError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How an input column is turned into estimator features.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "encoding", rename_all = "snake_case")]
pub enum Encoding {
    /// Passed through as a single feature.
    Numeric,
    /// One feature per category; unknown labels encode as all zeros.
    OneHot { categories: Vec<String> },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(flatten)]
    pub encoding: Encoding,
}

impl ColumnSpec {
    fn width(&self) -> usize {
        match &self.encoding {
            Encoding::Numeric => 1,
            Encoding::OneHot { categories } => categories.len(),
        }
    }
}

/// A node of a regression tree. Splits send `x <= threshold` left.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// Nodes stored flat with the root at index 0.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

impl RegressionTree {
    fn evaluate(&self, x: &[f64]) -> f64 {
        let mut idx = 0;
        // Children always point forward (checked at load), so this terminates.
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if x[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    fn check(&self, width: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".into());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(format!("leaf {i} has a non-finite value"));
                    }
                }
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= width {
                        return Err(format!(
                            "node {i} splits on feature {feature}, pipeline has {width}"
                        ));
                    }
                    if threshold.is_nan() {
                        return Err(format!("node {i} has a NaN threshold"));
                    }
                    for child in [*left, *right] {
                        if child <= i || child >= self.nodes.len() {
                            return Err(format!("node {i} has invalid child {child}"));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Estimator {
    Linear {
        intercept: f64,
        coefficients: Vec<f64>,
    },
    GradientBoosting {
        init: f64,
        learning_rate: f64,
        trees: Vec<RegressionTree>,
    },
}

impl Estimator {
    fn evaluate(&self, x: &[f64]) -> f64 {
        match self {
            Estimator::Linear {
                intercept,
                coefficients,
            } => {
                intercept
                    + coefficients
                        .iter()
                        .zip(x)
                        .map(|(c, v)| c * v)
                        .sum::<f64>()
            }
            Estimator::GradientBoosting {
                init,
                learning_rate,
                trees,
            } => {
                init + learning_rate * trees.iter().map(|t| t.evaluate(x)).sum::<f64>()
            }
        }
    }

    fn check(&self, width: usize) -> Result<(), String> {
        match self {
            Estimator::Linear {
                intercept,
                coefficients,
            } => {
                if coefficients.len() != width {
                    return Err(format!(
                        "linear model has {} coefficients, pipeline encodes {width} features",
                        coefficients.len()
                    ));
                }
                if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
                    return Err("linear model has non-finite parameters".into());
                }
                Ok(())
            }
            Estimator::GradientBoosting {
                init,
                learning_rate,
                trees,
            } => {
                if !init.is_finite() || !learning_rate.is_finite() {
                    return Err("boosting parameters must be finite".into());
                }
                if trees.is_empty() {
                    return Err("ensemble has no trees".into());
                }
                for (i, tree) in trees.iter().enumerate() {
                    tree.check(width).map_err(|e| format!("tree {i}: {e}"))?;
                }
                Ok(())
            }
        }
    }
}

/// A complete regression pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub columns: Vec<ColumnSpec>,
    pub estimator: Estimator,
}

impl ModelArtifact {
    /// Parse and validate an artifact; `path` is used for error context only.
    pub fn from_json(text: &str, path: &Path) -> Result<Self, ModelError> {
        let malformed = |reason: String| ModelError::Malformed {
            path: path.to_path_buf(),
            reason,
        };
        let artifact: ModelArtifact =
            serde_json::from_str(text).map_err(|e| malformed(e.to_string()))?;
        artifact.validate().map_err(malformed)?;
        Ok(artifact)
    }

    /// Number of features after encoding.
    pub fn width(&self) -> usize {
        self.columns.iter().map(ColumnSpec::width).sum()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.columns.is_empty() {
            return Err("pipeline has no input columns".into());
        }
        for col in &self.columns {
            if let Encoding::OneHot { categories } = &col.encoding {
                if categories.is_empty() {
                    return Err(format!("column '{}' has no categories", col.name));
                }
            }
        }
        self.estimator.check(self.width())
    }

    /// Encode a feature row into the estimator's numeric input.
    pub fn encode(&self, row: &FeatureRow) -> Result<Vec<f64>, ModelError> {
        let mut x = Vec::with_capacity(self.width());
        for col in &self.columns {
            let value = row
                .get(&col.name)
                .ok_or_else(|| ModelError::MissingFeature(col.name.clone()))?;
            match (&col.encoding, value) {
                (Encoding::Numeric, FeatureValue::Number(v)) => x.push(*v),
                (Encoding::OneHot { categories }, FeatureValue::Label(label)) => {
                    x.extend(
                        categories
                            .iter()
                            .map(|c| if c == label { 1.0 } else { 0.0 }),
                    );
                }
                (Encoding::Numeric, FeatureValue::Label(_)) => {
                    return Err(ModelError::FeatureType {
                        column: col.name.clone(),
                        expected: "number",
                    })
                }
                (Encoding::OneHot { .. }, FeatureValue::Number(_)) => {
                    return Err(ModelError::FeatureType {
                        column: col.name.clone(),
                        expected: "label",
                    })
                }
            }
        }
        Ok(x)
    }

    /// Predict a scalar for one row.
    pub fn predict(&self, row: &FeatureRow) -> Result<f64, ModelError> {
        let x = self.encode(row)?;
        Ok(self.estimator.evaluate(&x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::path::PathBuf;

    fn parse(text: &str) -> Result<ModelArtifact, ModelError> {
        ModelArtifact::from_json(text, &PathBuf::from("test.json"))
    }

    const LINEAR: &str = r#"{
        "name": "lin",
        "columns": [
            {"name": "a", "encoding": "numeric"},
            {"name": "seg", "encoding": "one_hot", "categories": ["x", "y"]}
        ],
        "estimator": {"type": "linear", "intercept": 1.0, "coefficients": [2.0, 10.0, 20.0]}
    }"#;

    const TREES: &str = r#"{
        "name": "gbr",
        "columns": [{"name": "a", "encoding": "numeric"}],
        "estimator": {
            "type": "gradient_boosting",
            "init": 100.0,
            "learning_rate": 0.5,
            "trees": [
                {"nodes": [
                    {"feature": 0, "threshold": 5.0, "left": 1, "right": 2},
                    {"value": -10.0},
                    {"value": 10.0}
                ]},
                {"nodes": [{"value": 4.0}]}
            ]
        }
    }"#;

    fn row(a: f64, seg: Option<&str>) -> FeatureRow {
        let mut r = FeatureRow::default();
        r.push_number("a", a);
        if let Some(s) = seg {
            r.push_label("seg", s);
        }
        r
    }

    #[test]
    fn linear_with_one_hot() {
        let m = parse(LINEAR).unwrap();
        assert_eq!(m.width(), 3);
        assert_eq!(m.predict(&row(3.0, Some("y"))).unwrap(), 1.0 + 6.0 + 20.0);
        // Unknown category contributes nothing.
        assert_eq!(m.predict(&row(3.0, Some("z"))).unwrap(), 7.0);
    }

    #[test]
    fn boosted_trees() {
        let m = parse(TREES).unwrap();
        assert_eq!(m.predict(&row(5.0, None)).unwrap(), 100.0 + 0.5 * (-10.0 + 4.0));
        assert_eq!(m.predict(&row(6.0, None)).unwrap(), 100.0 + 0.5 * (10.0 + 4.0));
    }

    #[test]
    fn missing_and_mistyped_features() {
        let m = parse(LINEAR).unwrap();
        assert!(matches!(
            m.predict(&row(1.0, None)),
            Err(ModelError::MissingFeature(c)) if c == "seg"
        ));
        let mut bad = FeatureRow::default();
        bad.push_label("a", "oops");
        bad.push_label("seg", "x");
        assert!(matches!(
            m.predict(&bad),
            Err(ModelError::FeatureType { expected: "number", .. })
        ));
    }

    #[test]
    fn rejects_width_mismatch() {
        let text = LINEAR.replace("[2.0, 10.0, 20.0]", "[2.0, 10.0]");
        let err = parse(&text).unwrap_err();
        assert!(matches!(err, ModelError::Malformed { .. }));
        assert!(err.to_string().contains("2 coefficients"));
    }

    #[test]
    fn rejects_backward_or_dangling_children() {
        let cyclic = TREES.replace(r#""left": 1, "right": 2"#, r#""left": 0, "right": 2"#);
        assert!(parse(&cyclic).is_err());
        let dangling = TREES.replace(r#""left": 1, "right": 2"#, r#""left": 1, "right": 9"#);
        assert!(parse(&dangling).is_err());
        let bad_feature = TREES.replace(r#""feature": 0"#, r#""feature": 3"#);
        assert!(parse(&bad_feature).is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            parse("not json"),
            Err(ModelError::Malformed { .. })
        ));
        assert!(parse(r#"{"name":"x","columns":[],"estimator":{"type":"linear","intercept":0,"coefficients":[]}}"#).is_err());
    }

    proptest! {
        #[test]
        fn boosted_prediction_is_one_of_the_leaf_paths(a in -1.0e6f64..1.0e6) {
            let m = parse(TREES).unwrap();
            let y = m.predict(&row(a, None)).unwrap();
            prop_assert!(y == 97.0 || y == 107.0);
            prop_assert_eq!(y == 97.0, a <= 5.0);
        }
    }
}
