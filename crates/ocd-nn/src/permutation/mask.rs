//! Connectivity masks derived from a permutation matrix.

use ndarray::{Array2, ArrayView2};

use ocd_core::config::defaults::DEFAULT_MASK_THRESHOLD;
use ocd_core::config::MaskPolicy;
use ocd_core::errors::{OcdResult, ShapeError};

use super::ensure_square;

/// Allowed connections between positions.
///
/// `L[[a, b]] = 1` iff position `b` may feed position `a`: `b < a`, or
/// `b <= a` with auto-connection; reversed ordering flips the comparison.
pub fn position_mask(n: usize, auto_connection: bool, reversed_ordering: bool) -> Array2<f64> {
    Array2::from_shape_fn((n, n), |(a, b)| {
        let allowed = match (reversed_ordering, auto_connection) {
            (false, false) => b < a,
            (false, true) => b <= a,
            (true, false) => b > a,
            (true, true) => b >= a,
        };
        if allowed {
            1.0
        } else {
            0.0
        }
    })
}

/// Variable-level mask `M = Pᵀ L P`, shape `(n, n)`.
///
/// `M[[i, j]]` is how strongly variable `j` may influence variable `i`. For
/// a hard permutation it is exactly 0 or 1; for a relaxed one it is the
/// probability-weighted mix and stays within `[0, 1]`.
pub fn variable_mask(
    perm: ArrayView2<'_, f64>,
    auto_connection: bool,
    reversed_ordering: bool,
    policy: MaskPolicy,
) -> OcdResult<Array2<f64>> {
    let n = ensure_square(perm)?;
    let l = position_mask(n, auto_connection, reversed_ordering);
    let mask = perm.t().dot(&l).dot(&perm);
    Ok(match policy {
        MaskPolicy::Soft => mask,
        MaskPolicy::Binary => mask.mapv_into(|v| if v > DEFAULT_MASK_THRESHOLD { 1.0 } else { 0.0 }),
    })
}

/// Variable label of every feature on one side of a layer.
///
/// Blocks are grouped contiguously over `num_variables`: with `B` blocks
/// block `b` belongs to variable `b / (B / n)`. `B` must be a multiple of `n`.
pub fn feature_labels(block_sizes: &[usize], num_variables: usize) -> OcdResult<Vec<usize>> {
    let blocks = block_sizes.len();
    if num_variables == 0 || blocks == 0 || blocks % num_variables != 0 {
        return Err(ShapeError::BlockGrouping {
            blocks,
            variables: num_variables,
        }
        .into());
    }
    let group = blocks / num_variables;
    Ok(block_sizes
        .iter()
        .enumerate()
        .flat_map(|(b, &size)| std::iter::repeat(b / group).take(size))
        .collect())
}

/// Expand a variable mask to a `(out_width, in_width)` feature mask.
pub fn expand(
    variable_mask: ArrayView2<'_, f64>,
    out_labels: &[usize],
    in_labels: &[usize],
) -> Array2<f64> {
    Array2::from_shape_fn((out_labels.len(), in_labels.len()), |(f, g)| {
        variable_mask[[out_labels[f], in_labels[g]]]
    })
}
