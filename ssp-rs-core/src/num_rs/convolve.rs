use crate::{Error, Result};
use ndarray::{Array1, ArrayView1};
use num_traits::Float;
use rustfft::num_complex::Complex;
use rustfft::{FftNum, FftPlanner};

/// Convolution mode determines behavior near edges and output size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvolveMode {
    /// Full convolution, output size is `in1.len() + in2.len() - 1`
    Full,
    /// Valid convolution, output size is `max(in1.len(), in2.len()) - min(in1.len(), in2.len()) + 1`
    Valid,
    /// Same convolution, output size is `max(in1.len(), in2.len())`
    Same,
}

/// Best effort parallel behaviour with numpy's convolve method, evaluated in the frequency
/// domain. We take `v` as the convolution kernel.
///
/// Returns the discrete, linear convolution of two one-dimensional sequences.
///
/// # Parameters
/// * `a` : (N,) [[array_like]]([ndarray::Array1])  
///   Signal to be (linearly) convolved.
/// * `v` : (M,) [[array_like]]([ndarray::Array1])  
///   Second one-dimensional input array.
/// * `mode` : [ConvolveMode]  
///   [ConvolveMode::Full]:  
///   This returns the convolution at each point of overlap, with an output shape of (N+M-1,).
///
///   [ConvolveMode::Same]:  
///   Mode 'same' returns output of length ``max(M, N)``, centred on the full output.
///
///   [ConvolveMode::Valid]:  
///   Mode 'valid' returns output of length ``max(M, N) - min(M, N) + 1``.
///
/// # Errors
/// Either input being empty.
///
/// # Examples
/// ```
/// use approx::assert_abs_diff_eq;
/// use ndarray::array;
/// use ssp_rs_core::num_rs::{convolve, ConvolveMode};
///
/// let a = array![1., 2., 3.];
/// let v = array![0., 1., 0.5];
///
/// let result = convolve(a.view(), v.view(), ConvolveMode::Same).unwrap();
/// for (r, e) in result.iter().zip([1., 2.5, 4.]) {
///     assert_abs_diff_eq!(*r, e, epsilon = 1e-12);
/// }
/// ```
pub fn convolve<T>(a: ArrayView1<T>, v: ArrayView1<T>, mode: ConvolveMode) -> Result<Array1<T>>
where
    T: FftNum + Float,
{
    if a.is_empty() || v.is_empty() {
        return Err(Error::Conv {
            reason: "inputs to convolve must be non-empty".into(),
        });
    }
    let (n, m) = (a.len(), v.len());
    let full_len = n + m - 1;
    let nfft = full_len.next_power_of_two();

    let mut planner = FftPlanner::<T>::new();
    let fft = planner.plan_fft_forward(nfft);
    let ifft = planner.plan_fft_inverse(nfft);

    let spectrum = |x: ArrayView1<T>| {
        let mut buf = vec![Complex::new(T::zero(), T::zero()); nfft];
        for (dst, src) in buf.iter_mut().zip(x.iter().copied()) {
            *dst = Complex::new(src, T::zero());
        }
        fft.process(&mut buf);
        buf
    };
    let mut prod = spectrum(a);
    let kernel = spectrum(v);
    for (p, k) in prod.iter_mut().zip(kernel.iter()) {
        *p = *p * *k;
    }
    ifft.process(&mut prod);

    let scale = T::from_usize(nfft).ok_or(Error::Conv {
        reason: "fft length not representable".into(),
    })?;
    let (start, len) = match mode {
        ConvolveMode::Full => (0, full_len),
        ConvolveMode::Same => ((n.min(m) - 1) / 2, n.max(m)),
        ConvolveMode::Valid => (n.min(m) - 1, n.max(m) - n.min(m) + 1),
    };
    Ok(prod[start..start + len]
        .iter()
        .map(|c| c.re / scale)
        .collect())
}
