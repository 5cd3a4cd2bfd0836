//! Permutation matrices over variables.
//!
//! Convention: rows are positions, columns are variables. `P[[r, v]]` is
//! the weight with which variable `v` occupies position `r`; a hard
//! permutation has exactly one 1 per row and column.

pub mod mask;

use ndarray::{Array2, ArrayView2, ArrayView3, Axis};

use ocd_core::errors::{GraphError, OcdResult, ShapeError};
use ocd_core::NodeId;

/// Permutation input of one forward pass.
#[derive(Debug, Clone, Copy)]
pub enum Perm<'a> {
    /// One `(n, n)` matrix for the whole batch.
    Shared(ArrayView2<'a, f64>),
    /// One `(n, n)` matrix per batch row, shape `(batch, n, n)`.
    Batched(ArrayView3<'a, f64>),
}

impl<'a> Perm<'a> {
    /// Number of variables the permutation orders.
    pub fn num_variables(&self) -> usize {
        match self {
            Perm::Shared(p) => p.nrows(),
            Perm::Batched(p) => p.shape()[1],
        }
    }
}

impl<'a> From<&'a Array2<f64>> for Perm<'a> {
    fn from(p: &'a Array2<f64>) -> Self {
        Perm::Shared(p.view())
    }
}

impl<'a> From<ArrayView2<'a, f64>> for Perm<'a> {
    fn from(p: ArrayView2<'a, f64>) -> Self {
        Perm::Shared(p)
    }
}

impl<'a> From<&'a ndarray::Array3<f64>> for Perm<'a> {
    fn from(p: &'a ndarray::Array3<f64>) -> Self {
        Perm::Batched(p.view())
    }
}

/// Fail unless `perm` is square.
pub fn ensure_square(perm: ArrayView2<'_, f64>) -> OcdResult<usize> {
    let (rows, cols) = perm.dim();
    if rows != cols || rows == 0 {
        return Err(ShapeError::NotSquare { rows, cols }.into());
    }
    Ok(rows)
}

/// The identity ordering `0, 1, ..., n - 1`.
pub fn identity(n: usize) -> Array2<f64> {
    Array2::eye(n)
}

/// Hard permutation matrix placing `ordering[r]` at position `r`.
pub fn from_ordering(ordering: &[NodeId]) -> OcdResult<Array2<f64>> {
    let n = ordering.len();
    let mut perm = Array2::zeros((n, n));
    let mut seen = vec![false; n];
    for (position, &variable) in ordering.iter().enumerate() {
        if variable >= n {
            return Err(GraphError::UnknownNode {
                node: variable,
                node_count: n,
            }
            .into());
        }
        if std::mem::replace(&mut seen[variable], true) {
            return Err(ShapeError::Mismatch {
                context: "ordering".into(),
                expected: "each variable exactly once".into(),
                actual: format!("{variable} repeated"),
            }
            .into());
        }
        perm[[position, variable]] = 1.0;
    }
    Ok(perm)
}

/// Whether `perm` is an exact 0/1 permutation matrix.
pub fn is_hard(perm: ArrayView2<'_, f64>) -> bool {
    if ensure_square(perm).is_err() {
        return false;
    }
    let binary = perm.iter().all(|&v| v == 0.0 || v == 1.0);
    binary
        && perm.sum_axis(Axis(0)).iter().all(|&s| s == 1.0)
        && perm.sum_axis(Axis(1)).iter().all(|&s| s == 1.0)
}

/// Decode a (possibly soft) matrix into an ordering, first to last.
///
/// Positions are filled greedily by the largest remaining entry, so a hard
/// matrix round-trips exactly.
pub fn to_ordering(perm: ArrayView2<'_, f64>) -> OcdResult<Vec<NodeId>> {
    let n = ensure_square(perm)?;
    let mut entries: Vec<(usize, usize, f64)> = perm
        .indexed_iter()
        .map(|((r, v), &w)| (r, v, w))
        .collect();
    entries.sort_by(|a, b| b.2.total_cmp(&a.2));

    let mut ordering = vec![usize::MAX; n];
    let mut used = vec![false; n];
    for (position, variable, _) in entries {
        if ordering[position] == usize::MAX && !used[variable] {
            ordering[position] = variable;
            used[variable] = true;
        }
    }
    Ok(ordering)
}

/// Largest row-sum error at which Sinkhorn iteration stops early.
pub const SINKHORN_TOLERANCE: f64 = 1e-10;

/// Sinkhorn normalisation of `log_scores / temperature` into a doubly
/// stochastic matrix.
///
/// Runs in log space, at most `iterations` alternating row and column
/// passes. Columns always sum to one; rows do once every row sum is within
/// [`SINKHORN_TOLERANCE`], at which point iteration stops. Low temperatures
/// converge slowly and need more passes.
pub fn sinkhorn(
    log_scores: ArrayView2<'_, f64>,
    temperature: f64,
    iterations: usize,
) -> OcdResult<Array2<f64>> {
    ensure_square(log_scores)?;
    if !(temperature > 0.0) {
        return Err(ocd_core::errors::ConfigError::InvalidValue {
            field: "temperature".into(),
            reason: "must be positive".into(),
        }
        .into());
    }
    let mut log_alpha = log_scores.mapv(|v| v / temperature);
    for _ in 0..iterations {
        for mut row in log_alpha.rows_mut() {
            let lse = log_sum_exp(row.iter().copied());
            row.mapv_inplace(|v| v - lse);
        }
        for mut col in log_alpha.columns_mut() {
            let lse = log_sum_exp(col.iter().copied());
            col.mapv_inplace(|v| v - lse);
        }
        let row_error = log_alpha
            .rows()
            .into_iter()
            .map(|row| (row.iter().map(|v| v.exp()).sum::<f64>() - 1.0).abs())
            .fold(0.0, f64::max);
        if row_error < SINKHORN_TOLERANCE {
            break;
        }
    }
    Ok(log_alpha.mapv_into(f64::exp))
}

fn log_sum_exp(values: impl Iterator<Item = f64> + Clone) -> f64 {
    let max = values.clone().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return max;
    }
    max + values.map(|v| (v - max).exp()).sum::<f64>().ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_round_trips() {
        let perm = from_ordering(&[2, 0, 1]).unwrap();
        assert!(is_hard(perm.view()));
        assert_eq!(to_ordering(perm.view()).unwrap(), vec![2, 0, 1]);
    }

    #[test]
    fn from_ordering_rejects_repeats() {
        assert!(from_ordering(&[0, 0, 1]).is_err());
        assert!(from_ordering(&[0, 3, 1]).is_err());
    }

    #[test]
    fn sinkhorn_is_doubly_stochastic() {
        let scores = ndarray::arr2(&[[1.0, 0.2, -0.5], [0.0, 2.0, 0.3], [0.7, -1.0, 0.1]]);
        let soft = sinkhorn(scores.view(), 0.1, 10_000).unwrap();
        for s in soft.sum_axis(Axis(0)).iter().chain(soft.sum_axis(Axis(1)).iter()) {
            assert!((s - 1.0).abs() < 1e-6);
        }
        assert!(!is_hard(soft.view()));
        assert_eq!(to_ordering(soft.view()).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn sinkhorn_columns_are_exact_even_before_convergence() {
        let scores = ndarray::arr2(&[[1.0, 0.2, -0.5], [0.0, 2.0, 0.3], [0.7, -1.0, 0.1]]);
        let soft = sinkhorn(scores.view(), 0.1, 3).unwrap();
        for s in soft.sum_axis(Axis(0)).iter() {
            assert!((s - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn sinkhorn_rejects_non_positive_temperature() {
        let scores = Array2::zeros((2, 2));
        assert!(sinkhorn(scores.view(), 0.0, 10).is_err());
    }
}
