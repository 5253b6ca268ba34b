use num_traits::{Float, One, Zero};
use solvercheck::{Element, RealElement};

use super::blas::{ladiv, lapy3, nrm2, neg_sign, safmin, scal};

/// Rescaling passes allowed when `beta` is tiny.
const MAX_RESCALES: usize = 20;

/// CPU reference: generate an elementary reflector.
///
/// Finds `H = I - tau * v * v^H` with `v = (1, x')` such that
/// `H^H * (alpha, x) = (beta, 0)` and `beta` real. On return `alpha` holds
/// `beta`, `x` holds `x'` and `tau` the scalar factor. `tau` is zero (and `H`
/// the identity) when `x` is zero and `alpha` is real.
///
/// `x` holds `n - 1` elements spaced `incx` apart.
pub fn larfg<T: Element>(n: usize, alpha: &mut T, x: &mut [T], incx: usize, tau: &mut T) {
    if n == 0 {
        *tau = T::zero();
        return;
    }
    let m = n - 1;
    let zero = T::Real::zero();

    let mut xnorm = nrm2(m, x, incx);
    let mut alphr = alpha.real_part();
    let mut alphi = alpha.imag_part();
    if xnorm == zero && alphi == zero {
        *tau = T::zero();
        return;
    }

    let mut beta = neg_sign(lapy3(alphr, alphi, xnorm), alphr);
    let safmin = safmin::<T::Real>();
    let mut rescales = 0;
    if Float::abs(beta) < safmin {
        // beta may be inaccurate; scale x and recompute
        let rsafmn = T::Real::one() / safmin;
        loop {
            rescales += 1;
            scal(m, T::from_real(rsafmn), x, incx);
            beta = beta * rsafmn;
            alphr = alphr * rsafmn;
            alphi = alphi * rsafmn;
            if Float::abs(beta) >= safmin || rescales >= MAX_RESCALES {
                break;
            }
        }
        xnorm = nrm2(m, x, incx);
        beta = neg_sign(lapy3(alphr, alphi, xnorm), alphr);
    }

    *tau = T::from_parts((beta - alphr) / beta, -alphi / beta);
    let recip = ladiv(T::one(), T::from_parts(alphr, alphi) - T::from_real(beta));
    scal(m, recip, x, incx);

    for _ in 0..rescales {
        beta = beta * safmin;
    }
    *alpha = T::from_real(beta);
}
