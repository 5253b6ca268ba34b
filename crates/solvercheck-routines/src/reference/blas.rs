//! Scalar and level-1 helpers shared by the references.

use num_traits::{Float, One, Zero};
use solvercheck::{Element, RealElement};

/// Euclidean norm of `n` elements spaced `incx` apart.
///
/// Accumulates a scaled sum of squares so that neither overflow nor underflow
/// occurs for representable inputs.
pub fn nrm2<T: Element>(n: usize, x: &[T], incx: usize) -> T::Real {
    let zero = T::Real::zero();
    let one = T::Real::one();
    let mut scale = zero;
    let mut ssq = one;

    for i in 0..n {
        let value = x[i * incx];
        for part in [value.real_part(), value.imag_part()] {
            if part == zero {
                continue;
            }
            let abs = Float::abs(part);
            if scale < abs {
                let ratio = scale / abs;
                ssq = one + ssq * ratio * ratio;
                scale = abs;
            } else {
                let ratio = abs / scale;
                ssq += ratio * ratio;
            }
        }
    }
    scale * Float::sqrt(ssq)
}

/// `sqrt(x^2 + y^2 + z^2)`, avoiding unnecessary overflow.
pub fn lapy3<R: RealElement>(x: R, y: R, z: R) -> R {
    let (xa, ya, za) = (Float::abs(x), Float::abs(y), Float::abs(z));
    let w = Float::max(Float::max(xa, ya), za);
    if w == R::zero() {
        // Also covers the case where one of the inputs is NaN.
        return xa + ya + za;
    }
    let (xw, yw, zw) = (xa / w, ya / w, za / w);
    w * Float::sqrt(xw * xw + yw * yw + zw * zw)
}

/// `a / b` with Smith's algorithm for complex elements.
pub fn ladiv<T: Element>(a: T, b: T) -> T {
    let (ar, ai) = (a.real_part(), a.imag_part());
    let (br, bi) = (b.real_part(), b.imag_part());

    if Float::abs(bi) <= Float::abs(br) {
        let e = bi / br;
        let f = br + bi * e;
        T::from_parts((ar + ai * e) / f, (ai - ar * e) / f)
    } else {
        let e = br / bi;
        let f = bi + br * e;
        T::from_parts((ai + ar * e) / f, (ai * e - ar) / f)
    }
}

/// Smallest value whose reciprocal, scaled by the precision, stays finite.
pub fn safmin<R: RealElement>() -> R {
    R::safe_min() / <R as Float>::epsilon()
}

/// `x := alpha * x` over `n` elements spaced `incx` apart.
pub fn scal<T: Element>(n: usize, alpha: T, x: &mut [T], incx: usize) {
    for i in 0..n {
        x[i * incx] *= alpha;
    }
}

/// `-|magnitude|` if `sign >= 0`, else `|magnitude|`.
pub fn neg_sign<R: RealElement>(magnitude: R, sign: R) -> R {
    if sign >= R::zero() {
        -Float::abs(magnitude)
    } else {
        Float::abs(magnitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use num_complex::Complex64;

    #[test]
    fn test_nrm2_matches_naive() {
        let x = [3.0f64, 99.0, 4.0, 99.0, 12.0];
        assert_relative_eq!(nrm2(3, &x, 2), 13.0);
        assert_eq!(nrm2::<f64>(0, &[], 1), 0.0);

        let z = [Complex64::new(1.0, 2.0), Complex64::new(2.0, 4.0)];
        assert_relative_eq!(nrm2(2, &z, 1), 25.0f64.sqrt());
    }

    #[test]
    fn test_nrm2_does_not_overflow() {
        let x = [1e300f64, 1e300];
        assert_relative_eq!(nrm2(2, &x, 1), 1e300 * 2.0f64.sqrt(), max_relative = 1e-15);
    }

    #[test]
    fn test_lapy3() {
        assert_relative_eq!(lapy3(2.0f64, 3.0, 6.0), 7.0);
        assert_eq!(lapy3(0.0f32, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_ladiv() {
        let q = ladiv(Complex64::new(1.0, 0.0), Complex64::new(3.0, 4.0));
        assert_relative_eq!(q.re, 0.12);
        assert_relative_eq!(q.im, -0.16);

        let q = ladiv(Complex64::new(2.0, 1.0), Complex64::new(1.0, 5.0));
        let expected = Complex64::new(2.0, 1.0) / Complex64::new(1.0, 5.0);
        assert_relative_eq!(q.re, expected.re, max_relative = 1e-15);
        assert_relative_eq!(q.im, expected.im, max_relative = 1e-15);

        assert_eq!(ladiv(1.0f64, 4.0), 0.25);
    }
}
