//! CART decision tree with Gini impurity
//!
//! Nodes live in a flat arena; index 0 is the root. Splits send
//! `x[feature] <= threshold` left.

use crate::dataset::LabeledSample;
use crate::models::{NUM_FEATURES, NUM_SPECIES};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Minimum impurity decrease for a split to be kept
const MIN_IMPURITY_DECREASE: f64 = 1e-12;

/// Growth limits for a single tree
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    /// Number of features considered at each split
    pub max_features: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Leaf {
        /// Class fractions of the training samples that reached this leaf
        distribution: [f64; NUM_SPECIES],
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

impl DecisionTree {
    /// Grow a tree over `indices` into `samples`; duplicates act as weights
    pub fn fit<R: Rng + ?Sized>(
        samples: &[LabeledSample],
        indices: &[usize],
        params: &TreeParams,
        rng: &mut R,
    ) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        let mut scratch = indices.to_vec();
        tree.grow(samples, &mut scratch, 0, params, rng);
        tree
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], at: usize) -> usize {
            match &nodes[at] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }

    /// Class distribution of the leaf reached by `x`
    ///
    /// Returns `None` when the arena is empty or references a missing node,
    /// which only happens for a corrupted artifact.
    pub fn predict_proba(&self, x: &[f64; NUM_FEATURES]) -> Option<[f64; NUM_SPECIES]> {
        let mut at = 0;
        // A well-formed tree never revisits a node, so the arena size bounds the walk
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(at)? {
                Node::Leaf { distribution } => return Some(*distribution),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = *x.get(*feature)?;
                    at = if value <= *threshold { *left } else { *right };
                }
            }
        }
        None
    }

    fn grow<R: Rng + ?Sized>(
        &mut self,
        samples: &[LabeledSample],
        indices: &mut [usize],
        depth: usize,
        params: &TreeParams,
        rng: &mut R,
    ) -> usize {
        let counts = class_counts(samples, indices);
        let node_id = self.nodes.len();
        self.nodes.push(leaf(&counts));

        let depth_exhausted = params.max_depth.is_some_and(|max| depth >= max);
        if is_pure(&counts) || indices.len() < params.min_samples_split || depth_exhausted {
            return node_id;
        }

        let parent_impurity = gini(&counts, indices.len());
        let best = match best_split(samples, indices, params.max_features, rng) {
            Some(split) if split.impurity < parent_impurity - MIN_IMPURITY_DECREASE => split,
            _ => return node_id,
        };

        let boundary = partition(indices, |i| {
            samples[i].features[best.feature] <= best.threshold
        });
        let (left_indices, right_indices) = indices.split_at_mut(boundary);

        let left = self.grow(samples, left_indices, depth + 1, params, rng);
        let right = self.grow(samples, right_indices, depth + 1, params, rng);
        self.nodes[node_id] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        node_id
    }
}

fn leaf(counts: &[usize; NUM_SPECIES]) -> Node {
    let total: usize = counts.iter().sum();
    let mut distribution = [0.0; NUM_SPECIES];
    if total > 0 {
        for (d, c) in distribution.iter_mut().zip(counts) {
            *d = *c as f64 / total as f64;
        }
    }
    Node::Leaf { distribution }
}

fn class_counts(samples: &[LabeledSample], indices: &[usize]) -> [usize; NUM_SPECIES] {
    let mut counts = [0; NUM_SPECIES];
    for &i in indices {
        counts[samples[i].species.index()] += 1;
    }
    counts
}

fn is_pure(counts: &[usize; NUM_SPECIES]) -> bool {
    counts.iter().filter(|c| **c > 0).count() <= 1
}

fn gini(counts: &[usize; NUM_SPECIES], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|c| {
            let p = *c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

/// Search a random subset of features, falling back to the remaining
/// features when every candidate in the subset is constant
fn best_split<R: Rng + ?Sized>(
    samples: &[LabeledSample],
    indices: &[usize],
    max_features: usize,
    rng: &mut R,
) -> Option<SplitCandidate> {
    let mut features: Vec<usize> = (0..NUM_FEATURES).collect();
    features.shuffle(rng);

    let mut best: Option<SplitCandidate> = None;
    let mut visited = 0;
    for feature in features {
        if visited >= max_features && best.is_some() {
            break;
        }
        visited += 1;
        if let Some(candidate) = best_split_on(samples, indices, feature) {
            if best.as_ref().map_or(true, |b| candidate.impurity < b.impurity) {
                best = Some(candidate);
            }
        }
    }
    best
}

fn best_split_on(
    samples: &[LabeledSample],
    indices: &[usize],
    feature: usize,
) -> Option<SplitCandidate> {
    let mut sorted: Vec<(f64, usize)> = indices
        .iter()
        .map(|&i| (samples[i].features[feature], samples[i].species.index()))
        .collect();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

    let total = sorted.len();
    let mut right = [0usize; NUM_SPECIES];
    for (_, class) in &sorted {
        right[*class] += 1;
    }
    let mut left = [0usize; NUM_SPECIES];

    let mut best: Option<SplitCandidate> = None;
    for pos in 0..total.saturating_sub(1) {
        let (value, class) = sorted[pos];
        left[class] += 1;
        right[class] -= 1;

        let next = sorted[pos + 1].0;
        if value >= next {
            continue;
        }

        let n_left = pos + 1;
        let n_right = total - n_left;
        let impurity = (n_left as f64 * gini(&left, n_left)
            + n_right as f64 * gini(&right, n_right))
            / total as f64;

        if best.as_ref().map_or(true, |b| impurity < b.impurity) {
            best = Some(SplitCandidate {
                feature,
                threshold: midpoint(value, next),
                impurity,
            });
        }
    }
    best
}

/// Midpoint that still separates `lo` from `hi` after rounding
fn midpoint(lo: f64, hi: f64) -> f64 {
    let mid = lo + (hi - lo) / 2.0;
    if mid >= hi {
        lo
    } else {
        mid
    }
}

/// In-place stable-enough partition; returns the count satisfying `pred`
fn partition<F: Fn(usize) -> bool>(indices: &mut [usize], pred: F) -> usize {
    let mut boundary = 0;
    for i in 0..indices.len() {
        if pred(indices[i]) {
            indices.swap(boundary, i);
            boundary += 1;
        }
    }
    boundary
}
