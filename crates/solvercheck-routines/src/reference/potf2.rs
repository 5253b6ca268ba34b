use num_traits::{Float, One, Zero};
use solvercheck::{Element, HarnessError, HarnessResult};

use crate::Fill;

/// CPU reference: unblocked Cholesky factorization (LAPACK `potf2`)
///
/// Factors the Hermitian positive-definite `n x n` matrix `a` as `U^H * U`
/// (`Fill::Upper`) or `L * L^H` (`Fill::Lower`), overwriting the referenced
/// triangle. The other triangle is not touched.
///
/// Returns the LAPACK `info`: 0 on success, or the 1-based column `j` at which
/// the leading minor of order `j` was found not to be positive definite. In
/// that case `a[j-1, j-1]` holds the offending non-positive value.
pub fn potf2<T: Element>(uplo: Fill, n: usize, a: &mut [T], lda: usize) -> HarnessResult<i32> {
    if uplo == Fill::Full {
        return Err(HarnessError::HostReference {
            routine: "potf2".to_string(),
            reason: "fill mode must be U or L".to_string(),
        });
    }
    // Storage index of lower-view entry (row, col). The upper variant is the
    // lower one applied to the conjugate transpose.
    let at = |row: usize, col: usize| match uplo {
        Fill::Upper => col + row * lda,
        _ => row + col * lda,
    };

    for j in 0..n {
        let mut ajj = a[j + j * lda].real_part();
        for k in 0..j {
            ajj -= a[at(j, k)].norm_sqr();
        }
        if ajj <= T::Real::zero() || ajj.is_nan() {
            a[j + j * lda] = T::from_real(ajj);
            return Ok(info_at(j));
        }
        let ajj = Float::sqrt(ajj);
        a[j + j * lda] = T::from_real(ajj);

        let recip = T::from_real(T::Real::one() / ajj);
        for i in j + 1..n {
            let mut sum = mirrored(uplo, a[at(i, j)]);
            for k in 0..j {
                sum -= mirrored(uplo, a[at(i, k)]) * mirrored(uplo, a[at(j, k)]).conjugate();
            }
            a[at(i, j)] = mirrored(uplo, sum * recip);
        }
    }
    Ok(0)
}

/// Lower-view value of an element stored in the referenced triangle, and back.
fn mirrored<T: Element>(uplo: Fill, value: T) -> T {
    match uplo {
        Fill::Upper => value.conjugate(),
        _ => value,
    }
}

fn info_at(column: usize) -> i32 {
    i32::try_from(column + 1).unwrap_or(i32::MAX)
}
