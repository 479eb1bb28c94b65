//! Binary classification metrics used to compare candidate models.

use std::fmt;

/// Counts of predicted vs. true labels, positive class = churn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
    pub true_positives: usize,
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl ConfusionMatrix {
    pub fn from_labels(targets: &[u8], predictions: &[u8]) -> Self {
        let mut cm = Self::default();
        for (&target, &pred) in targets.iter().zip(predictions) {
            match (pred == 1, target == 1) {
                (true, true) => cm.true_positives += 1,
                (false, false) => cm.true_negatives += 1,
                (true, false) => cm.false_positives += 1,
                (false, true) => cm.false_negatives += 1,
            }
        }
        cm
    }

    pub fn total(&self) -> usize {
        self.true_positives + self.true_negatives + self.false_positives + self.false_negatives
    }

    /// Precision, recall, F1 and support for one class.
    pub fn class_scores(&self, positive: bool) -> ClassScores {
        let (tp, fp, fn_) = if positive {
            (self.true_positives, self.false_positives, self.false_negatives)
        } else {
            (self.true_negatives, self.false_negatives, self.false_positives)
        };
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        ClassScores {
            precision,
            recall,
            f1,
            support: tp + fn_,
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClassScores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Held-out scores of one model. Undefined ratios are reported as 0.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub confusion: ConfusionMatrix,
}

impl ClassificationMetrics {
    pub fn compute(targets: &[u8], predictions: &[u8]) -> Self {
        let confusion = ConfusionMatrix::from_labels(targets, predictions);
        let positive = confusion.class_scores(true);
        Self {
            accuracy: ratio(
                confusion.true_positives + confusion.true_negatives,
                confusion.total(),
            ),
            precision: positive.precision,
            recall: positive.recall,
            f1: positive.f1,
            confusion,
        }
    }

    pub fn report(&self) -> ClassificationReport {
        ClassificationReport {
            metrics: *self,
        }
    }
}

/// Per-class precision/recall/F1/support table, printable with `Display`.
#[derive(Clone, Copy, Debug)]
pub struct ClassificationReport {
    metrics: ClassificationMetrics,
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cm = &self.metrics.confusion;
        writeln!(
            f,
            "{:>10} {:>10} {:>10} {:>10} {:>10}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        for (name, positive) in [("No", false), ("Yes", true)] {
            let s = cm.class_scores(positive);
            writeln!(
                f,
                "{:>10} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                name, s.precision, s.recall, s.f1, s.support
            )?;
        }
        write!(
            f,
            "{:>10} {:>10} {:>10} {:>10.2} {:>10}",
            "accuracy",
            "",
            "",
            self.metrics.accuracy,
            cm.total()
        )
    }
}
