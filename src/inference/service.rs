//! Inference orchestration: scale one row, classify it, report the label.
//!
//! Width and range checks live with the artifacts; this layer only sequences
//! them and times the call.
//!
//! TODO: Return class probabilities next to the label once clients ask for a confidence score.

use std::time::Instant;

use crate::common::error::ServeResult;
use crate::store::ModelStore;

use super::domain::Prediction;

/// Run a single prediction against the loaded artifacts.
pub fn predict(store: &ModelStore, features: &[f64]) -> ServeResult<Prediction> {
    let start = Instant::now();

    let scaled = store.scaler().transform(features)?;
    let potability = store.classifier().predict(&scaled)?;

    Ok(Prediction {
        potability,
        latency_us: u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ErrorCode;
    use crate::store::{Classifier, Scaler};

    fn store() -> ModelStore {
        let scaler = Scaler::Standard {
            mean: vec![7.0, 300.0],
            scale: vec![1.5, 40.0],
        };
        let classifier = Classifier::Logistic {
            classes: vec![0, 1],
            coef: vec![-1.0, 0.8],
            intercept: 0.1,
        };
        ModelStore::new(scaler, classifier).unwrap()
    }

    #[test]
    fn label_is_binary() {
        let store = store();
        for row in [[7.0, 300.0], [10.0, 250.0], [4.0, 400.0], [0.0, 0.0]] {
            let pred = predict(&store, &row).unwrap();
            assert!(pred.potability == 0 || pred.potability == 1);
        }
    }

    #[test]
    fn scaling_happens_before_classification() {
        let store = store();
        // scaled row is (0, 0): score = 0.1 > 0
        assert_eq!(predict(&store, &[7.0, 300.0]).unwrap().potability, 1);
        // scaled row is (2, -1.25): score = -2 - 1 + 0.1 < 0
        assert_eq!(predict(&store, &[10.0, 250.0]).unwrap().potability, 0);
    }

    #[test]
    fn identical_inputs_give_identical_labels() {
        let store = store();
        let row = [6.2, 318.0];
        let first = predict(&store, &row).unwrap().potability;
        for _ in 0..10 {
            assert_eq!(predict(&store, &row).unwrap().potability, first);
        }
    }

    #[test]
    fn overflowing_scaled_value_is_rejected() {
        let scaler = Scaler::Standard {
            mean: vec![0.0],
            scale: vec![1e-10],
        };
        let classifier = Classifier::Logistic {
            classes: vec![0, 1],
            coef: vec![1.0],
            intercept: 0.0,
        };
        let store = ModelStore::new(scaler, classifier).unwrap();
        // 1e300 / 1e-10 overflows to infinity during scaling
        let err = predict(&store, &[1e300]).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
    }

    #[test]
    fn wrong_width_is_rejected() {
        let store = store();
        for row in [&[][..], &[7.0][..], &[7.0, 300.0, 1.0][..]] {
            let err = predict(&store, row).unwrap_err();
            assert_eq!(err.code, ErrorCode::DimensionMismatch);
        }
    }
}
