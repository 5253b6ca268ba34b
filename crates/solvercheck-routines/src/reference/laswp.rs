use solvercheck::{Element, HarnessError, HarnessResult};

/// Positions of the pivot entries visited by a row-interchange sweep, in
/// application order, as `(row, ipiv index)` pairs (both 0-based).
///
/// Rows `k1..=k2` (1-based) are visited forwards when `incx > 0` and backwards
/// when `incx < 0`. Row `i` always reads entry `k1 + (i - k1) * |incx|`
/// (1-based), so a negative increment walks the same entries in reverse. This
/// is reference LAPACK's `IX0 = K1 + (K1 - K2) * INCX` starting point; entries
/// before `k1` are never read in either direction.
pub fn pivot_sequence(k1: usize, k2: usize, incx: isize) -> Vec<(usize, usize)> {
    let step = incx.unsigned_abs();
    let rows: Vec<usize> = if incx > 0 {
        (k1 - 1..k2).collect()
    } else {
        (k1 - 1..k2).rev().collect()
    };
    // Entry for row k1 sits at (k1 - 1) in both directions; later rows follow
    // at |incx| spacing.
    rows.into_iter()
        .map(|row| (row, (k1 - 1) + (row + 1 - k1) * step))
        .collect()
}

/// Number of pivot entries a sweep with these bounds reads, or `None` when
/// the count does not fit in `usize`.
pub fn pivot_len(k1: usize, k2: usize, incx: isize) -> Option<usize> {
    k2.checked_sub(k1)?
        .checked_mul(incx.unsigned_abs())?
        .checked_add(k1)
}

/// CPU reference: interchange rows of the `rows x n` matrix `a` as directed by
/// the 1-based pivots in `ipiv`.
///
/// For each visited row `i`, row `i` and row `ipiv[i]` are swapped across all
/// `n` columns.
pub fn laswp<T: Element>(
    n: usize,
    a: &mut [T],
    lda: usize,
    k1: usize,
    k2: usize,
    ipiv: &[i32],
    incx: isize,
) -> HarnessResult<()> {
    let needed = pivot_len(k1, k2, incx).ok_or_else(|| HarnessError::CapacityOverflow {
        reason: format!("laswp pivots for rows {k1}..={k2} with incx {incx}"),
    })?;
    if ipiv.len() < needed {
        return Err(HarnessError::HostReference {
            routine: "laswp".to_string(),
            reason: format!("{} pivots given, {needed} needed", ipiv.len()),
        });
    }
    for (row, at) in pivot_sequence(k1, k2, incx) {
        let pivot = ipiv[at];
        let target = usize::try_from(pivot)
            .ok()
            .filter(|p| (1..=lda).contains(p))
            .ok_or_else(|| HarnessError::HostReference {
                routine: "laswp".to_string(),
                reason: format!("pivot {pivot} at ipiv[{at}] is outside 1..={lda}"),
            })?
            - 1;
        if target != row {
            for col in 0..n {
                a.swap(row + col * lda, target + col * lda);
            }
        }
    }
    Ok(())
}
