use solvercheck::Element;

/// CPU reference: conjugate `n` elements spaced `|incx|` apart.
///
/// The sign of `incx` only changes the logical order, which conjugation does
/// not depend on.
pub fn lacgv<T: Element>(n: usize, x: &mut [T], incx: isize) {
    let step = incx.unsigned_abs();
    for i in 0..n {
        let at = i * step;
        x[at] = x[at].conjugate();
    }
}
