//! Artifact types held by the model store: the fitted scaler and classifier.
//!
//! Both artifacts are JSON documents wrapped in a small envelope carrying
//! `format_version` and a `kind` tag selecting the variant. Parsing never
//! trusts the payload: every artifact is validated once at load time so the
//! per-request paths can index without further checks.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::common::error::{ServeError, ServeResult};

/// Artifact envelope version understood by this build.
pub const FORMAT_VERSION: u32 = 1;

/// Labels the classifier must emit: 0 = not potable, 1 = potable.
pub const POTABILITY_CLASSES: [i64; 2] = [0, 1];

/// Sentinel child index marking a leaf node.
pub const LEAF: i64 = -1;

#[derive(Deserialize)]
struct Header {
    format_version: Option<u32>,
}

/// Decode an artifact document, checking the envelope version before the body.
pub fn parse_artifact<T: DeserializeOwned>(what: &str, raw: &str) -> ServeResult<T> {
    let header: Header = serde_json::from_str(raw)
        .map_err(|err| ServeError::artifact_corrupt(format!("{what}: {err}")))?;

    match header.format_version {
        Some(FORMAT_VERSION) => {}
        Some(other) => {
            return Err(ServeError::artifact_incompatible(format!(
                "{what}: format_version {other} is not supported (expected {FORMAT_VERSION})"
            )))
        }
        None => {
            return Err(ServeError::artifact_incompatible(format!(
                "{what}: missing format_version"
            )))
        }
    }

    serde_json::from_str(raw).map_err(|err| ServeError::artifact_corrupt(format!("{what}: {err}")))
}

fn corrupt(what: &str, msg: impl AsRef<str>) -> ServeError {
    ServeError::artifact_corrupt(format!("{what}: {}", msg.as_ref()))
}

/// Fitted feature scaler.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scaler {
    /// Standardisation: `(x - mean) / scale`.
    Standard { mean: Vec<f64>, scale: Vec<f64> },
    /// Range scaling: `x * scale + min`.
    MinMax { min: Vec<f64>, scale: Vec<f64> },
}

impl Scaler {
    pub fn from_json(raw: &str) -> ServeResult<Self> {
        let scaler: Self = parse_artifact("scaler", raw)?;
        scaler.validate()?;
        Ok(scaler)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Scaler::Standard { .. } => "standard",
            Scaler::MinMax { .. } => "min_max",
        }
    }

    /// Number of features the scaler was fit on.
    pub fn n_features(&self) -> usize {
        match self {
            Scaler::Standard { scale, .. } | Scaler::MinMax { scale, .. } => scale.len(),
        }
    }

    pub fn validate(&self) -> ServeResult<()> {
        let (offset, scale, offset_name) = match self {
            Scaler::Standard { mean, scale } => (mean, scale, "mean"),
            Scaler::MinMax { min, scale } => (min, scale, "min"),
        };

        if scale.is_empty() {
            return Err(corrupt("scaler", "no features"));
        }
        if offset.len() != scale.len() {
            return Err(corrupt(
                "scaler",
                format!(
                    "{offset_name} has {} entries but scale has {}",
                    offset.len(),
                    scale.len()
                ),
            ));
        }
        if let Some(idx) = offset.iter().position(|v| !v.is_finite()) {
            return Err(corrupt("scaler", format!("{offset_name}[{idx}] is not finite")));
        }
        if let Some(idx) = scale.iter().position(|v| !v.is_finite() || *v == 0.0) {
            return Err(corrupt("scaler", format!("scale[{idx}] must be finite and non-zero")));
        }
        Ok(())
    }

    /// Map a raw feature row onto the normalised space.
    pub fn transform(&self, row: &[f64]) -> ServeResult<Vec<f64>> {
        if row.len() != self.n_features() {
            return Err(ServeError::dimension_mismatch(row.len(), self.n_features()));
        }

        let out = match self {
            Scaler::Standard { mean, scale } => row
                .iter()
                .zip(mean.iter().zip(scale))
                .map(|(x, (m, s))| (x - m) / s)
                .collect(),
            Scaler::MinMax { min, scale } => row
                .iter()
                .zip(min.iter().zip(scale))
                .map(|(x, (m, s))| x * s + m)
                .collect(),
        };
        Ok(out)
    }
}

/// Binary decision tree stored as parallel per-node arrays.
///
/// Children always carry a larger index than their parent, so traversal
/// from the root terminates.
#[derive(Clone, Debug, Deserialize)]
pub struct Tree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    /// Per-node class counts (or fractions); only leaf rows are consulted.
    pub value: Vec<Vec<f64>>,
}

impl Tree {
    fn validate(&self, tree_idx: usize, n_features: usize, n_classes: usize) -> ServeResult<()> {
        let what = format!("classifier tree {tree_idx}");
        let n_nodes = self.children_left.len();
        if n_nodes == 0 {
            return Err(corrupt(&what, "has no nodes"));
        }
        if [
            self.children_right.len(),
            self.feature.len(),
            self.threshold.len(),
            self.value.len(),
        ]
        .iter()
        .any(|len| *len != n_nodes)
        {
            return Err(corrupt(&what, "node arrays differ in length"));
        }

        for node in 0..n_nodes {
            let left = self.children_left[node];
            let right = self.children_right[node];

            if left == LEAF {
                let dist = &self.value[node];
                if dist.len() != n_classes {
                    return Err(corrupt(
                        &what,
                        format!("leaf {node} has {} class values, expected {n_classes}", dist.len()),
                    ));
                }
                if dist.iter().any(|v| !v.is_finite() || *v < 0.0) || dist.iter().sum::<f64>() <= 0.0
                {
                    return Err(corrupt(&what, format!("leaf {node} has an invalid class distribution")));
                }
                continue;
            }

            for child in [left, right] {
                if child <= node as i64 || child as usize >= n_nodes {
                    return Err(corrupt(
                        &what,
                        format!("node {node} references child {child} but tree has {n_nodes} nodes"),
                    ));
                }
            }
            let feature = self.feature[node];
            if feature < 0 || feature as usize >= n_features {
                return Err(corrupt(
                    &what,
                    format!("node {node} splits on feature {feature} of {n_features}"),
                ));
            }
            if self.threshold[node].is_nan() {
                return Err(corrupt(&what, format!("node {node} has a NaN threshold")));
            }
        }
        Ok(())
    }

    /// Index of the leaf reached by `row`.
    fn leaf(&self, row: &[f64]) -> usize {
        let mut node = 0usize;
        while self.children_left[node] != LEAF {
            // thresholds were learned on single-precision inputs
            let x = row[self.feature[node] as usize] as f32 as f64;
            let next = if x <= self.threshold[node] {
                self.children_left[node]
            } else {
                self.children_right[node]
            };
            node = next as usize;
        }
        node
    }

    /// Normalised class distribution at the leaf reached by `row`.
    fn proba(&self, row: &[f64]) -> impl Iterator<Item = f64> + '_ {
        let dist = &self.value[self.leaf(row)];
        let total: f64 = dist.iter().sum();
        dist.iter().map(move |v| v / total)
    }
}

/// Fitted binary classifier.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Classifier {
    Logistic {
        classes: Vec<i64>,
        coef: Vec<f64>,
        intercept: f64,
    },
    DecisionTree {
        classes: Vec<i64>,
        n_features: usize,
        tree: Tree,
    },
    RandomForest {
        classes: Vec<i64>,
        n_features: usize,
        trees: Vec<Tree>,
    },
}

impl Classifier {
    pub fn from_json(raw: &str) -> ServeResult<Self> {
        let classifier: Self = parse_artifact("classifier", raw)?;
        classifier.validate()?;
        Ok(classifier)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Classifier::Logistic { .. } => "logistic",
            Classifier::DecisionTree { .. } => "decision_tree",
            Classifier::RandomForest { .. } => "random_forest",
        }
    }

    pub fn classes(&self) -> &[i64] {
        match self {
            Classifier::Logistic { classes, .. }
            | Classifier::DecisionTree { classes, .. }
            | Classifier::RandomForest { classes, .. } => classes,
        }
    }

    pub fn n_features(&self) -> usize {
        match self {
            Classifier::Logistic { coef, .. } => coef.len(),
            Classifier::DecisionTree { n_features, .. }
            | Classifier::RandomForest { n_features, .. } => *n_features,
        }
    }

    pub fn validate(&self) -> ServeResult<()> {
        if self.classes() != POTABILITY_CLASSES {
            return Err(corrupt(
                "classifier",
                format!("classes must be [0, 1], found {:?}", self.classes()),
            ));
        }
        if self.n_features() == 0 {
            return Err(corrupt("classifier", "no features"));
        }

        match self {
            Classifier::Logistic {
                coef, intercept, ..
            } => {
                if let Some(idx) = coef.iter().position(|v| !v.is_finite()) {
                    return Err(corrupt("classifier", format!("coef[{idx}] is not finite")));
                }
                if !intercept.is_finite() {
                    return Err(corrupt("classifier", "intercept is not finite"));
                }
            }
            Classifier::DecisionTree {
                n_features, tree, ..
            } => tree.validate(0, *n_features, 2)?,
            Classifier::RandomForest {
                n_features, trees, ..
            } => {
                if trees.is_empty() {
                    return Err(corrupt("classifier", "forest has no trees"));
                }
                for (idx, tree) in trees.iter().enumerate() {
                    tree.validate(idx, *n_features, 2)?;
                }
            }
        }
        Ok(())
    }

    /// Reject scaled values the model cannot represent.
    ///
    /// Trees compare in single precision, so their bound is `f32::MAX`.
    fn check_range(&self, row: &[f64]) -> ServeResult<()> {
        let limit = match self {
            Classifier::Logistic { .. } => f64::MAX,
            Classifier::DecisionTree { .. } | Classifier::RandomForest { .. } => f32::MAX as f64,
        };
        match row.iter().position(|v| !v.is_finite() || v.abs() > limit) {
            Some(idx) => Err(ServeError::invalid(format!(
                "scaled feature {idx} is infinite or too large for the model"
            ))),
            None => Ok(()),
        }
    }

    /// Predict the class label for one scaled row.
    pub fn predict(&self, row: &[f64]) -> ServeResult<i64> {
        if row.len() != self.n_features() {
            return Err(ServeError::dimension_mismatch(row.len(), self.n_features()));
        }
        self.check_range(row)?;

        let idx = match self {
            Classifier::Logistic {
                coef, intercept, ..
            } => {
                let score: f64 = coef.iter().zip(row).map(|(w, x)| w * x).sum::<f64>() + intercept;
                if score.is_nan() {
                    return Err(ServeError::invalid(
                        "decision score is undefined for this input",
                    ));
                }
                usize::from(score > 0.0)
            }
            Classifier::DecisionTree { tree, .. } => argmax(tree.proba(row)),
            Classifier::RandomForest { trees, .. } => {
                let mut acc = [0.0f64; 2];
                for tree in trees {
                    for (slot, p) in acc.iter_mut().zip(tree.proba(row)) {
                        *slot += p;
                    }
                }
                // the mean and the sum share an argmax
                argmax(acc.into_iter())
            }
        };

        self.classes()
            .get(idx)
            .copied()
            .ok_or_else(|| ServeError::internal(format!("class index {idx} out of range")))
    }
}

/// First index holding the maximum; ties resolve to the lower class.
fn argmax(values: impl Iterator<Item = f64>) -> usize {
    let mut best = 0;
    let mut best_value = f64::NEG_INFINITY;
    for (idx, value) in values.enumerate() {
        if value > best_value {
            best = idx;
            best_value = value;
        }
    }
    best
}

/// Loader contract for the two artifacts.
pub trait ArtifactRepo {
    fn load_scaler(&self) -> ServeResult<Scaler>;
    fn load_classifier(&self) -> ServeResult<Classifier>;
}

/// Immutable pair of artifacts shared by every request.
#[derive(Clone, Debug)]
pub struct ModelStore {
    scaler: Scaler,
    classifier: Classifier,
}

impl ModelStore {
    /// Assemble a store, rejecting artifacts that disagree on dimensionality.
    pub fn new(scaler: Scaler, classifier: Classifier) -> ServeResult<Self> {
        scaler.validate()?;
        classifier.validate()?;
        if scaler.n_features() != classifier.n_features() {
            return Err(ServeError::artifact_corrupt(format!(
                "scaler expects {} features but classifier expects {}",
                scaler.n_features(),
                classifier.n_features()
            )));
        }
        Ok(Self { scaler, classifier })
    }

    /// Load both artifacts from `repo`. Any failure is fatal for startup.
    pub fn load(repo: &dyn ArtifactRepo) -> ServeResult<Self> {
        let scaler = repo.load_scaler()?;
        let classifier = repo.load_classifier()?;
        Self::new(scaler, classifier)
    }

    pub fn n_features(&self) -> usize {
        self.scaler.n_features()
    }

    pub fn scaler(&self) -> &Scaler {
        &self.scaler
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }
}
