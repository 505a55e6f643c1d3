//! One-dimensional discrete Fourier transform.
//!
//! Forward: `X[k] = sum_j x[j] exp(-2 pi i jk / n)`, unnormalized.
//! Inverse: conjugate kernel scaled by `1 / n`.

use std::f64::consts::PI;

use crate::scalar::c64;

/// Transform `buf` in place.
///
/// Lengths that are powers of two use iterative radix-2 Cooley-Tukey;
/// other lengths use direct summation.
pub fn dft_in_place(buf: &mut [c64], inverse: bool) {
    let n = buf.len();
    if n <= 1 {
        return;
    }
    if n.is_power_of_two() {
        radix2(buf, inverse);
    } else {
        direct(buf, inverse);
    }
    if inverse {
        let scale = 1.0 / n as f64;
        for x in buf.iter_mut() {
            *x = *x * scale;
        }
    }
}

fn twiddle(k: usize, n: usize, inverse: bool) -> c64 {
    let sign = if inverse { 1.0 } else { -1.0 };
    let angle = sign * 2.0 * PI * k as f64 / n as f64;
    c64::new(angle.cos(), angle.sin())
}

fn radix2(buf: &mut [c64], inverse: bool) {
    let n = buf.len();
    // Bit-reversal permutation
    let mut j = 0usize;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j ^= bit;
        if i < j {
            buf.swap(i, j);
        }
    }

    let mut len = 2;
    while len <= n {
        let half = len / 2;
        for start in (0..n).step_by(len) {
            for k in 0..half {
                let w = twiddle(k, len, inverse);
                let t = w * buf[start + half + k];
                let u = buf[start + k];
                buf[start + k] = u + t;
                buf[start + half + k] = u - t;
            }
        }
        len <<= 1;
    }
}

fn direct(buf: &mut [c64], inverse: bool) {
    let n = buf.len();
    let input = buf.to_vec();
    for (k, out) in buf.iter_mut().enumerate() {
        *out = input
            .iter()
            .enumerate()
            .fold(c64::new(0.0, 0.0), |acc, (j, &x)| {
                acc + x * twiddle((j * k) % n, n, inverse)
            });
    }
}
