/// A trait that provides easy access to the last element of a slice.
///
/// Callers must ensure the slice is non-empty.
pub trait Back<T> {
    fn back(&self) -> &T;
}

impl<T> Back<T> for [T] {
    #[inline(always)]
    fn back(&self) -> &T {
        &self[self.len() - 1]
    }
}

/// Computes half the summed squared error between `actual` and `expected`.
pub fn half_square_error(actual: &[f64], expected: &[f64]) -> f64 {
    let mut error = 0.0;
    for (&a, e) in actual.iter().zip(expected) {
        error += 0.5 * (e - a) * (e - a);
    }
    error
}
