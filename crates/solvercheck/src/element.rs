//! Element type system.
//!
//! Every routine is written once over an [`Element`] and instantiated for the
//! four LAPACK precisions:
//!
//! | char | element     | working real |
//! |------|-------------|--------------|
//! | `s`  | `f32`       | `f32`        |
//! | `d`  | `f64`       | `f64`        |
//! | `c`  | `Complex32` | `f32`        |
//! | `z`  | `Complex64` | `f64`        |
//!
//! Scale-sensitive quantities (norms, tolerances, the `beta` of a reflector)
//! are computed in the associated [`Element::Real`] type.

use core::fmt::{Debug, Display};
use core::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use bytemuck::Pod;
use num_complex::{Complex32, Complex64};
use num_traits::{Float, One, Zero};

/// Numeric element a routine operates on.
pub trait Element:
    Pod
    + Debug
    + Display
    + PartialEq
    + Send
    + Sync
    + Zero
    + One
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + SubAssign
    + MulAssign
    + DivAssign
    + 'static
{
    /// Working real type.
    type Real: RealElement;

    /// True for complex elements.
    const IS_COMPLEX: bool;

    /// LAPACK precision character.
    const PRECISION: char;

    /// Absolute value (modulus for complex).
    fn magnitude(self) -> Self::Real;

    /// Squared modulus.
    fn norm_sqr(self) -> Self::Real;

    /// Complex conjugate; identity for real elements.
    fn conjugate(self) -> Self;

    /// Real part.
    fn real_part(self) -> Self::Real;

    /// Imaginary part; zero for real elements.
    fn imag_part(self) -> Self::Real;

    /// Element with the given real part and zero imaginary part.
    fn from_real(re: Self::Real) -> Self;

    /// Element from both parts. Real elements drop `im`.
    fn from_parts(re: Self::Real, im: Self::Real) -> Self;

    /// Multiply by a real scalar.
    fn scale(self, factor: Self::Real) -> Self {
        self * Self::from_real(factor)
    }
}

/// Real working type.
pub trait RealElement: Element<Real = Self> + Float {
    /// Widen to `f64`.
    fn as_f64(self) -> f64;

    /// Narrow from `f64`.
    fn from_f64(value: f64) -> Self;

    /// Smallest positive number such that `1 / safe_min()` does not overflow.
    fn safe_min() -> Self {
        Self::min_positive_value()
    }
}

macro_rules! impl_real_element {
    ($ty:ty, $precision:literal) => {
        impl Element for $ty {
            type Real = $ty;
            const IS_COMPLEX: bool = false;
            const PRECISION: char = $precision;

            fn magnitude(self) -> $ty {
                self.abs()
            }

            fn norm_sqr(self) -> $ty {
                self * self
            }

            fn conjugate(self) -> $ty {
                self
            }

            fn real_part(self) -> $ty {
                self
            }

            fn imag_part(self) -> $ty {
                0.0
            }

            fn from_real(re: $ty) -> $ty {
                re
            }

            fn from_parts(re: $ty, _im: $ty) -> $ty {
                re
            }
        }

        impl RealElement for $ty {
            fn as_f64(self) -> f64 {
                self as f64
            }

            fn from_f64(value: f64) -> $ty {
                value as $ty
            }
        }
    };
}

macro_rules! impl_complex_element {
    ($ty:ty, $real:ty, $precision:literal) => {
        impl Element for $ty {
            type Real = $real;
            const IS_COMPLEX: bool = true;
            const PRECISION: char = $precision;

            fn magnitude(self) -> $real {
                self.norm()
            }

            fn norm_sqr(self) -> $real {
                self.re * self.re + self.im * self.im
            }

            fn conjugate(self) -> $ty {
                self.conj()
            }

            fn real_part(self) -> $real {
                self.re
            }

            fn imag_part(self) -> $real {
                self.im
            }

            fn from_real(re: $real) -> $ty {
                <$ty>::new(re, 0.0)
            }

            fn from_parts(re: $real, im: $real) -> $ty {
                <$ty>::new(re, im)
            }
        }
    };
}

impl_real_element!(f32, 's');
impl_real_element!(f64, 'd');
impl_complex_element!(Complex32, f32, 'c');
impl_complex_element!(Complex64, f64, 'z');

/// Machine epsilon of the working real type of `T`, widened to `f64`.
pub fn epsilon<T: Element>() -> f64 {
    <T::Real as Float>::epsilon().as_f64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_precision_chars() {
        assert_eq!(<f32 as Element>::PRECISION, 's');
        assert_eq!(<f64 as Element>::PRECISION, 'd');
        assert_eq!(<Complex32 as Element>::PRECISION, 'c');
        assert_eq!(<Complex64 as Element>::PRECISION, 'z');
        assert!(<Complex64 as Element>::IS_COMPLEX);
        assert!(!<f64 as Element>::IS_COMPLEX);
    }

    #[test]
    fn test_epsilon_uses_working_real() {
        assert_eq!(epsilon::<Complex32>(), f32::EPSILON as f64);
        assert_eq!(epsilon::<f64>(), f64::EPSILON);
    }

    #[test]
    fn test_complex_helpers() {
        let z = Complex64::from_parts(3.0, -4.0);
        assert_relative_eq!(z.magnitude(), 5.0);
        assert_relative_eq!(z.norm_sqr(), 25.0);
        assert_eq!(z.conjugate(), Complex64::new(3.0, 4.0));
        assert_eq!(z.scale(2.0), Complex64::new(6.0, -8.0));
        assert_eq!(f32::from_parts(1.5, 7.0), 1.5);
        assert_eq!((-2.0f64).magnitude(), 2.0);
    }
}
