//! Noise-tolerant local extrema search.

use tracing::info;

/// Which extrema [`peak_finder`] looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Extrema {
    /// Local maxima.
    #[default]
    Maxima,
    /// Local minima.
    Minima,
}

impl Extrema {
    fn sign(self) -> f64 {
        match self {
            Extrema::Maxima => 1.0,
            Extrema::Minima => -1.0,
        }
    }
}

/// Peaks found by [`peak_finder`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Peaks {
    /// Sample index of each peak, increasing.
    pub indices: Vec<usize>,
    /// Signal value at each peak.
    pub magnitudes: Vec<f64>,
}

impl Peaks {
    /// Number of peaks.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Whether no peak was found.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

fn sign(v: f64) -> i8 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

///
/// Find peaks that stand out from their surroundings by at least `thresh`.
///
/// A peak must rise `thresh` above the lowest point since the previous peak
/// and be followed by a descent of at least `thresh`, so small ripples on a
/// slope are ignored. The end points of `x0` are candidates as well.
///
/// `thresh` defaults to a quarter of the signal range. Minima are searched by
/// negating the signal; reported magnitudes are in the original sign.
///
/// ```
/// use ssp_rs::signal::peak::{peak_finder, Extrema};
///
/// let x = [0.0, 1.0, 0.0, 0.1, 0.0, 3.0, 0.0];
/// let peaks = peak_finder(&x, None, Extrema::Maxima);
/// assert_eq!(peaks.indices, vec![1, 5]);
/// ```
pub fn peak_finder(x0: &[f64], thresh: Option<f64>, extrema: Extrema) -> Peaks {
    if x0.is_empty() {
        return Peaks::default();
    }
    let s = x0.len();
    let (lo, hi) = x0
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let thresh = thresh.unwrap_or((hi - lo) / 4.0);
    let sgn = extrema.sign();
    let x0: Vec<f64> = x0.iter().map(|v| v * sgn).collect();

    // Turning points of the derivative; flat runs count as descending.
    let dx0: Vec<f64> = x0
        .windows(2)
        .map(|w| {
            let d = w[1] - w[0];
            if d == 0.0 {
                -f64::EPSILON
            } else {
                d
            }
        })
        .collect();
    let mut ind = vec![0usize];
    ind.extend(
        dx0.windows(2)
            .enumerate()
            .filter(|(_, d)| d[0] * d[1] < 0.0)
            .map(|(i, _)| i + 1),
    );
    ind.push(s - 1);
    let mut x: Vec<f64> = ind.iter().map(|&i| x0[i]).collect();
    let min_mag = x.iter().copied().fold(f64::INFINITY, f64::min);

    let mut peak_loc = Vec::new();
    let mut peak_mag = Vec::new();

    if x.len() > 2 {
        let mut temp_mag = min_mag;
        let mut temp_loc = 0usize;
        let mut found_peak = false;
        let mut left_min = min_mag;

        // The end points were tacked on, so make the sequence alternate.
        let d0 = sign(x[1] - x[0]);
        let d1 = sign(x[2] - x[1]);
        let mut ii: isize = if d0 <= 0 {
            if d0 == d1 {
                x.remove(1);
                ind.remove(1);
            }
            -1
        } else {
            if d0 == d1 {
                x.remove(0);
                ind.remove(0);
            }
            0
        };
        let len = x.len() as isize;

        while ii < len {
            ii += 1;
            if found_peak {
                temp_mag = min_mag;
                found_peak = false;
            }
            if ii >= len - 1 {
                break;
            }
            let i = ii as usize;
            if x[i] > temp_mag && x[i] > left_min + thresh {
                temp_loc = i;
                temp_mag = x[i];
            }

            ii += 1;
            let i = ii as usize;
            if !found_peak && temp_mag > thresh + x[i] {
                found_peak = true;
                left_min = x[i];
                peak_loc.push(temp_loc);
                peak_mag.push(temp_mag);
            } else if x[i] < left_min {
                left_min = x[i];
            }
        }

        let last = x.len() - 1;
        if x[last] > temp_mag && x[last] > left_min + thresh {
            peak_loc.push(last);
            peak_mag.push(x[last]);
        } else if !found_peak && temp_mag > min_mag {
            peak_loc.push(temp_loc);
            peak_mag.push(temp_mag);
        }
    } else {
        // Monotone input, only an end point can be a peak.
        let (arg, &mag) = x
            .iter()
            .enumerate()
            .fold((0, &f64::NEG_INFINITY), |best, cur| {
                if *cur.1 > *best.1 {
                    cur
                } else {
                    best
                }
            });
        if mag > min_mag + thresh {
            peak_loc.push(arg);
            peak_mag.push(mag);
        }
    }

    let indices: Vec<usize> = peak_loc.iter().map(|&l| ind[l]).collect();
    let magnitudes: Vec<f64> = peak_mag.iter().map(|m| m * sgn).collect();

    if indices.is_empty() {
        info!("No significant peaks found");
    }
    Peaks {
        indices,
        magnitudes,
    }
}
