use ndarray::{ArrayView1, ArrayView2};
use rand::Rng;
use rand::seq::SliceRandom;
use score_helpers::Float;
use std::cmp::Ordering;

/// Growth limits shared by every tree of a forest.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TreeParams {
    pub max_features: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

#[derive(Debug, Clone, PartialEq)]
enum Node<F: Float> {
    /// Normalized weighted class distribution of the training samples that reached the leaf.
    Leaf { distribution: Vec<f64> },
    /// Samples with `x[feature] <= threshold` go left.
    Split {
        feature: usize,
        threshold: F,
        left: usize,
        right: usize,
    },
}

/// A CART classification tree grown with the weighted Gini criterion.
///
/// Class labels are indices `0..n_classes`; the forest owns the mapping back
/// to user labels.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTree<F: Float> {
    nodes: Vec<Node<F>>,
    n_features: usize,
    n_classes: usize,
    depth: usize,
    /// Unnormalized total impurity decrease per feature.
    impurity_decrease: Vec<f64>,
}

struct Candidate<F> {
    feature: usize,
    threshold: F,
    /// Sum of weight * gini over both children; lower is better.
    children_impurity: f64,
}

struct Builder<'a, 'x, F: Float, R: Rng + ?Sized> {
    x: ArrayView2<'x, F>,
    y: &'a [usize],
    weights: &'a [f64],
    n_classes: usize,
    params: TreeParams,
    rng: &'a mut R,
    features: Vec<usize>,
    nodes: Vec<Node<F>>,
    impurity_decrease: Vec<f64>,
    depth: usize,
}

impl<F: Float> DecisionTree<F> {
    /// Grows a tree on the rows listed in `samples`.
    ///
    /// `y[i]` must be a class index below `n_classes`, and `weights[i]` the
    /// weight of row `i` in the split criterion. Callers guarantee that
    /// `samples` is non-empty.
    pub(crate) fn fit<R: Rng + ?Sized>(
        x: ArrayView2<F>,
        y: &[usize],
        weights: &[f64],
        mut samples: Vec<usize>,
        n_classes: usize,
        params: TreeParams,
        rng: &mut R,
    ) -> Self {
        let n_features = x.ncols();
        let mut builder = Builder {
            x,
            y,
            weights,
            n_classes,
            params,
            rng,
            features: (0..n_features).collect(),
            nodes: Vec::new(),
            impurity_decrease: vec![0.0; n_features],
            depth: 0,
        };
        builder.grow(&mut samples, 0);

        DecisionTree {
            nodes: builder.nodes,
            n_features,
            n_classes,
            depth: builder.depth,
            impurity_decrease: builder.impurity_decrease,
        }
    }

    /// Class distribution of the leaf that `row` falls into.
    ///
    /// `row` must have `n_features()` entries.
    pub fn predict_proba(&self, row: ArrayView1<F>) -> &[f64] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { distribution } => return distribution,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    /// Length of the longest root-to-leaf path (a lone leaf has depth 0).
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Impurity decrease per feature, normalized to sum to 1 (all zeros for a lone leaf).
    pub fn feature_importances(&self) -> Vec<f64> {
        let total: f64 = self.impurity_decrease.iter().sum();
        if total > 0.0 {
            self.impurity_decrease.iter().map(|d| d / total).collect()
        } else {
            vec![0.0; self.n_features]
        }
    }
}

fn gini(class_weights: &[f64], total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    1.0 - class_weights
        .iter()
        .map(|w| (w / total) * (w / total))
        .sum::<f64>()
}

/// Halfway between two consecutive distinct values, nudged so that `lo <= t < hi`.
fn midpoint<F: Float>(lo: F, hi: F) -> F {
    let t = (lo + hi) / F::from_count(2);
    if t >= hi || !t.is_finite() { lo } else { t }
}

impl<F: Float, R: Rng + ?Sized> Builder<'_, '_, F, R> {
    fn class_totals(&self, samples: &[usize]) -> Vec<f64> {
        let mut totals = vec![0.0; self.n_classes];
        for &i in samples {
            totals[self.y[i]] += self.weights[i];
        }
        totals
    }

    fn push_leaf(&mut self, totals: Vec<f64>, weight: f64) -> usize {
        let distribution = if weight > 0.0 {
            totals.into_iter().map(|t| t / weight).collect()
        } else {
            vec![1.0 / self.n_classes as f64; self.n_classes]
        };
        self.nodes.push(Node::Leaf { distribution });
        self.nodes.len() - 1
    }

    fn grow(&mut self, samples: &mut [usize], depth: usize) -> usize {
        self.depth = self.depth.max(depth);

        let totals = self.class_totals(samples);
        let weight: f64 = totals.iter().sum();
        let impurity = gini(&totals, weight);

        let n = samples.len();
        let is_leaf = n < self.params.min_samples_split
            || n < 2 * self.params.min_samples_leaf
            || impurity <= f64::EPSILON
            || self.params.max_depth.is_some_and(|max| depth >= max);
        if is_leaf {
            return self.push_leaf(totals, weight);
        }

        let Some(split) = self.best_split(samples, &totals, weight) else {
            return self.push_leaf(totals, weight);
        };

        self.impurity_decrease[split.feature] += weight * impurity - split.children_impurity;

        let mut mid = 0;
        for k in 0..n {
            if self.x[[samples[k], split.feature]] <= split.threshold {
                samples.swap(k, mid);
                mid += 1;
            }
        }

        // Reserve the slot so children are stored after their parent.
        let idx = self.nodes.len();
        self.nodes.push(Node::Leaf {
            distribution: Vec::new(),
        });
        let (left_samples, right_samples) = samples.split_at_mut(mid);
        let left = self.grow(left_samples, depth + 1);
        let right = self.grow(right_samples, depth + 1);
        self.nodes[idx] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        idx
    }

    /// Searches a random subset of features for the split with the lowest weighted child impurity.
    ///
    /// Features are visited in random order until `max_features` non-constant
    /// ones have been evaluated. If none of those yields a valid split, the
    /// search continues through the remaining features.
    fn best_split(&mut self, samples: &[usize], totals: &[f64], weight: f64) -> Option<Candidate<F>> {
        self.features.shuffle(&mut *self.rng);

        let n = samples.len();
        let min_leaf = self.params.min_samples_leaf;
        let mut order = samples.to_vec();
        let mut left = vec![0.0; self.n_classes];
        let mut right = vec![0.0; self.n_classes];
        let mut best: Option<Candidate<F>> = None;
        let mut visited = 0;

        for fi in 0..self.features.len() {
            if visited >= self.params.max_features && best.is_some() {
                break;
            }
            let feature = self.features[fi];
            let column = self.x.column(feature);

            order.sort_unstable_by(|&a, &b| {
                column[a].partial_cmp(&column[b]).unwrap_or(Ordering::Equal)
            });
            if column[order[n - 1]] <= column[order[0]] {
                continue;
            }
            visited += 1;

            left.iter_mut().for_each(|w| *w = 0.0);
            let mut left_weight = 0.0;
            for pos in 1..n {
                let prev = order[pos - 1];
                left[self.y[prev]] += self.weights[prev];
                left_weight += self.weights[prev];

                let lo = column[prev];
                let hi = column[order[pos]];
                if hi <= lo || pos < min_leaf || n - pos < min_leaf {
                    continue;
                }

                for (r, (&t, &l)) in right.iter_mut().zip(totals.iter().zip(left.iter())) {
                    *r = t - l;
                }
                let right_weight = weight - left_weight;
                let score = left_weight * gini(&left, left_weight)
                    + right_weight * gini(&right, right_weight);

                if best.as_ref().is_none_or(|b| score < b.children_impurity) {
                    best = Some(Candidate {
                        feature,
                        threshold: midpoint(lo, hi),
                        children_impurity: score,
                    });
                }
            }
        }
        best
    }
}
