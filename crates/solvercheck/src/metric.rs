//! Discrepancy metric between a host reference result and a device result.
//!
//! The error of one batch instance is `||reference - computed|| / ||reference||`
//! in the norm selected for the buffer's shape, falling back to the absolute
//! difference when the reference is zero. The error of a batched buffer is the
//! worst instance.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::element::{Element, RealElement};
use crate::storage::{HostBuffer, Shape};
use crate::{HarnessError, HarnessResult};

/// Norms for vector-shaped buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorNorm {
    /// Sum of magnitudes
    One,
    /// Euclidean norm
    Two,
    /// Largest magnitude
    Infinity,
}

/// Norms for matrix-shaped buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatrixNorm {
    /// Largest column sum
    One,
    /// Largest row sum
    Infinity,
    /// Square root of the sum of squared magnitudes
    Frobenius,
    /// Largest magnitude
    Max,
}

impl FromStr for VectorNorm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "one" | "1" => Ok(VectorNorm::One),
            "two" | "2" => Ok(VectorNorm::Two),
            "inf" | "infinity" => Ok(VectorNorm::Infinity),
            other => Err(format!("unknown vector norm {other:?}")),
        }
    }
}

impl FromStr for MatrixNorm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "one" | "1" => Ok(MatrixNorm::One),
            "inf" | "infinity" => Ok(MatrixNorm::Infinity),
            "frobenius" | "fro" => Ok(MatrixNorm::Frobenius),
            "max" => Ok(MatrixNorm::Max),
            other => Err(format!("unknown matrix norm {other:?}")),
        }
    }
}

/// Norm used for each buffer shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormSpec {
    /// Norm for vectors
    pub vector: VectorNorm,
    /// Norm for matrices
    pub matrix: MatrixNorm,
}

impl Default for NormSpec {
    fn default() -> Self {
        Self {
            vector: VectorNorm::Infinity,
            matrix: MatrixNorm::Frobenius,
        }
    }
}

fn magnitude<T: Element>(value: T) -> f64 {
    value.magnitude().as_f64()
}

/// Norm of a logical vector.
pub fn vector_norm<T: Element>(norm: VectorNorm, values: &[T]) -> f64 {
    match norm {
        VectorNorm::One => values.iter().map(|&v| magnitude(v)).sum(),
        VectorNorm::Two => values
            .iter()
            .map(|&v| v.norm_sqr().as_f64())
            .sum::<f64>()
            .sqrt(),
        VectorNorm::Infinity => values.iter().map(|&v| magnitude(v)).fold(0.0, f64::max),
    }
}

/// Norm of a column-major `rows x cols` matrix given densely (`ld == rows`).
pub fn matrix_norm<T: Element>(norm: MatrixNorm, rows: usize, cols: usize, values: &[T]) -> f64 {
    let at = |i: usize, j: usize| magnitude(values[i + j * rows]);
    match norm {
        MatrixNorm::One => (0..cols)
            .map(|j| (0..rows).map(|i| at(i, j)).sum::<f64>())
            .fold(0.0, f64::max),
        MatrixNorm::Infinity => (0..rows)
            .map(|i| (0..cols).map(|j| at(i, j)).sum::<f64>())
            .fold(0.0, f64::max),
        MatrixNorm::Frobenius => values
            .iter()
            .map(|&v| v.norm_sqr().as_f64())
            .sum::<f64>()
            .sqrt(),
        MatrixNorm::Max => values.iter().map(|&v| magnitude(v)).fold(0.0, f64::max),
    }
}

/// Relative discrepancy between `reference` and `computed`.
///
/// Fails if the two buffers do not share a layout.
pub fn norm_error<T: Element>(
    spec: NormSpec,
    reference: &HostBuffer<T>,
    computed: &HostBuffer<T>,
) -> HarnessResult<f64> {
    check_layout(reference, computed)?;
    let desc = reference.desc();
    if desc.is_placeholder() || desc.is_empty() {
        return Ok(0.0);
    }

    let mut worst = 0.0f64;
    for batch in 0..desc.batch_count {
        let error = instance_error(spec, reference, computed, batch)?;
        // NaN must not be swallowed by f64::max.
        if error.is_nan() {
            return Ok(f64::NAN);
        }
        worst = worst.max(error);
    }
    Ok(worst)
}

/// Relative discrepancy of batch instance `batch` alone.
pub fn instance_error<T: Element>(
    spec: NormSpec,
    reference: &HostBuffer<T>,
    computed: &HostBuffer<T>,
    batch: usize,
) -> HarnessResult<f64> {
    check_layout(reference, computed)?;
    let desc = reference.desc();
    if desc.is_placeholder() || desc.is_empty() {
        return Ok(0.0);
    }

    let expected = reference.logical(batch);
    let diff: Vec<T> = expected
        .iter()
        .zip(computed.logical(batch))
        .map(|(&e, c)| e - c)
        .collect();

    let (num, den) = match desc.shape {
        Shape::Vector { .. } => (
            vector_norm(spec.vector, &diff),
            vector_norm(spec.vector, &expected),
        ),
        Shape::Matrix { rows, cols, .. } => (
            matrix_norm(spec.matrix, rows, cols, &diff),
            matrix_norm(spec.matrix, rows, cols, &expected),
        ),
    };
    Ok(if den > 0.0 { num / den } else { num })
}

fn check_layout<T: Element>(reference: &HostBuffer<T>, computed: &HostBuffer<T>) -> HarnessResult<()> {
    if reference.desc() != computed.desc() {
        return Err(HarnessError::ShapeMismatch {
            reason: format!(
                "reference {:?} vs computed {:?}",
                reference.desc(),
                computed.desc()
            ),
        });
    }
    Ok(())
}

/// Number of positions where two integer status arrays differ.
pub fn count_mismatches<I: PartialEq>(reference: &[I], computed: &[I]) -> usize {
    let differing = reference
        .iter()
        .zip(computed)
        .filter(|(r, c)| r != c)
        .count();
    differing + reference.len().abs_diff(computed.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageDescriptor;
    use approx::assert_relative_eq;
    use num_complex::Complex64;

    fn host<T: Element>(desc: StorageDescriptor, data: &[T]) -> HostBuffer<T> {
        let mut buffer = HostBuffer::new(desc).unwrap();
        buffer.as_mut_slice().copy_from_slice(data);
        buffer
    }

    #[test]
    fn test_vector_norms() {
        // Expected: 1-norm 12, 2-norm 5 * sqrt(2), inf-norm 5
        let values = [3.0f64, -4.0, 5.0];
        assert_relative_eq!(vector_norm(VectorNorm::One, &values), 12.0);
        assert_relative_eq!(vector_norm(VectorNorm::Two, &values), 50.0f64.sqrt());
        assert_relative_eq!(vector_norm(VectorNorm::Infinity, &values), 5.0);
    }

    #[test]
    fn test_matrix_norms() {
        // [[1, -2], [3, 4]] stored column-major
        let values = [1.0f32, 3.0, -2.0, 4.0];
        assert_relative_eq!(matrix_norm(MatrixNorm::One, 2, 2, &values), 6.0);
        assert_relative_eq!(matrix_norm(MatrixNorm::Infinity, 2, 2, &values), 7.0);
        assert_relative_eq!(matrix_norm(MatrixNorm::Frobenius, 2, 2, &values), 30.0f64.sqrt());
        assert_relative_eq!(matrix_norm(MatrixNorm::Max, 2, 2, &values), 4.0);
    }

    #[test]
    fn test_strided_vector_error_uses_logical_elements() {
        let desc = StorageDescriptor::vector(2, 2);
        // The padding element (index 1) differs but is not part of the vector.
        let reference = host(desc, &[4.0f64, 100.0, -2.0]);
        let computed = host(desc, &[4.0f64, -100.0, -1.0]);

        let error = norm_error(NormSpec::default(), &reference, &computed).unwrap();
        assert_relative_eq!(error, 0.25);
    }

    #[test]
    fn test_batched_error_is_worst_instance() {
        let desc = StorageDescriptor::matrix(1, 2, 1).strided_batch(2, 2);
        let reference = host(desc, &[3.0f64, 4.0, 1.0, 0.0]);
        let computed = host(desc, &[3.0f64, 4.0, 1.5, 0.0]);

        let error = norm_error(NormSpec::default(), &reference, &computed).unwrap();
        assert_relative_eq!(error, 0.5);
        assert_eq!(instance_error(NormSpec::default(), &reference, &computed, 0).unwrap(), 0.0);
    }

    #[test]
    fn test_zero_reference_uses_absolute_error() {
        let desc = StorageDescriptor::vector(2, 1);
        let reference = host(desc, &[Complex64::new(0.0, 0.0); 2]);
        let computed = host(desc, &[Complex64::new(0.0, 0.0), Complex64::new(3.0, 4.0)]);

        let error = norm_error(NormSpec::default(), &reference, &computed).unwrap();
        assert_relative_eq!(error, 5.0);
    }

    #[test]
    fn test_layout_mismatch_is_an_error() {
        let reference = host(StorageDescriptor::vector(2, 1), &[1.0f32, 2.0]);
        let computed = host(StorageDescriptor::matrix(2, 1, 2), &[1.0f32, 2.0]);
        assert!(matches!(
            norm_error(NormSpec::default(), &reference, &computed),
            Err(HarnessError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_parse_norms() {
        assert_eq!("inf".parse(), Ok(VectorNorm::Infinity));
        assert_eq!("one".parse(), Ok(MatrixNorm::One));
        assert!("spectral".parse::<MatrixNorm>().is_err());
    }

    #[test]
    fn test_count_mismatches() {
        assert_eq!(count_mismatches(&[0, 2, 0], &[0, 2, 0]), 0);
        assert_eq!(count_mismatches(&[0, 2, 0], &[1, 2, 3]), 2);
        assert_eq!(count_mismatches(&[0, 2], &[0]), 1);
    }
}
