use crate::{Error, Result};

/// Odd extension of `x` by `padlen` samples at both ends.
///
/// Each end is mirrored through its edge value, so the extension continues
/// the local slope instead of folding back. `padlen` must be strictly smaller
/// than `x.len()` since the reflection never re-uses the edge sample itself.
pub(crate) fn odd_ext(padlen: usize, x: &[f64]) -> Result<Vec<f64>> {
    let n = x.len();
    if n == 0 {
        return Err(Error::invalid_arg("x", "input must be non-empty."));
    }
    if padlen == 0 {
        return Ok(x.to_vec());
    }
    if padlen >= n {
        return Err(Error::invalid_arg(
            "padlen",
            "edge extension cannot exceed the signal length.",
        ));
    }

    let (first, last) = (x[0], x[n - 1]);
    let mut out = Vec::with_capacity(n + 2 * padlen);
    out.extend((1..=padlen).rev().map(|k| 2.0 * first - x[k]));
    out.extend_from_slice(x);
    out.extend((1..=padlen).map(|k| 2.0 * last - x[n - 1 - k]));
    Ok(out)
}
