// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Column-major linear algebra kernel
//!
//! Every matrix in this module is a contiguous `f64` slice in column-major
//! order: element (i, j) of an n-row matrix lives at `i + j * n`. The
//! layout is load-bearing; the Kalman filter state compression walks
//! columns contiguously. The [`Matrix`] wrapper carries the dimensions for
//! callers that want checked indexing, while the kernels themselves take
//! plain slices.

use std::fmt;
use std::ops::{Index, IndexMut};

/// Errors raised by the numeric kernels
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NumericsError {
    #[error("matrix is singular")]
    /// A pivot collapsed to zero during LU factorization
    Singular,
    #[error("insufficient observations: {observations} < {unknowns}")]
    /// A least squares problem with fewer observations than unknowns
    Underdetermined {
        /// Number of observations supplied
        observations: usize,
        /// Number of unknowns requested
        unknowns: usize,
    },
}

/// A thin owner of a column-major matrix
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    data: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl Matrix {
    /// Makes a zero-filled matrix
    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix {
            data: vec![0.0; rows * cols],
            rows,
            cols,
        }
    }

    /// Makes an identity matrix
    #[must_use]
    pub fn identity(n: usize) -> Matrix {
        let mut m = Matrix::zeros(n, n);
        for i in 0..n {
            m[(i, i)] = 1.0;
        }
        m
    }

    /// Makes a matrix from a column-major slice
    ///
    /// # Panics
    ///
    /// Panics when the slice length does not match the dimensions.
    #[must_use]
    pub fn from_slice(rows: usize, cols: usize, data: &[f64]) -> Matrix {
        assert_eq!(data.len(), rows * cols);
        Matrix {
            data: data.to_vec(),
            rows,
            cols,
        }
    }

    /// Gets the number of rows
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Gets the number of columns
    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Views the column-major storage
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Views the column-major storage mutably
    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;
    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        assert!(i < self.rows && j < self.cols);
        &self.data[i + j * self.rows]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut f64 {
        assert!(i < self.rows && j < self.cols);
        &mut self.data[i + j * self.rows]
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.rows {
            for j in 0..self.cols {
                write!(f, "{:14.6e} ", self[(i, j)])?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Inner product of two vectors
#[must_use]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Euclidean norm of a vector
#[must_use]
pub fn norm(a: &[f64]) -> f64 {
    dot(a, a).sqrt()
}

/// Cross product of two 3-vectors
#[must_use]
pub fn cross3(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Normalizes a 3-vector, returning `None` for the zero vector
#[must_use]
pub fn normalize3(a: &[f64; 3]) -> Option<[f64; 3]> {
    let r = norm(a);
    if r <= 0.0 {
        return None;
    }
    Some([a[0] / r, a[1] / r, a[2] / r])
}

/// Multiplies matrices: `C ← α·op(A)·op(B) + β·C`
///
/// `tr` selects transposition: `"NN"`, `"NT"`, `"TN"` or `"TT"`; op(A) is
/// n×m, op(B) is m×k and C is n×k, all column-major.
pub fn mat_mul(
    tr: &str,
    n: usize,
    k: usize,
    m: usize,
    alpha: f64,
    a: &[f64],
    b: &[f64],
    beta: f64,
    c: &mut [f64],
) {
    let t = tr.as_bytes();
    let form = match (t[0], t[1]) {
        (b'N', b'N') => 1,
        (b'N', b'T') => 2,
        (b'T', b'N') => 3,
        _ => 4,
    };

    for i in 0..n {
        for j in 0..k {
            let mut d = 0.0;
            match form {
                1 => {
                    for x in 0..m {
                        d += a[i + x * n] * b[x + j * m];
                    }
                }
                2 => {
                    for x in 0..m {
                        d += a[i + x * n] * b[j + x * k];
                    }
                }
                3 => {
                    for x in 0..m {
                        d += a[x + i * m] * b[x + j * m];
                    }
                }
                _ => {
                    for x in 0..m {
                        d += a[x + i * m] * b[j + x * k];
                    }
                }
            }
            if beta == 0.0 {
                c[i + j * n] = alpha * d;
            } else {
                c[i + j * n] = alpha * d + beta * c[i + j * n];
            }
        }
    }
}

/// LU decomposition with implicit scaling and partial pivoting
fn lu_decompose(a: &mut [f64], n: usize, index: &mut [usize]) -> Result<(), NumericsError> {
    let mut scale = vec![0.0; n];

    for i in 0..n {
        let mut big = 0.0f64;
        for j in 0..n {
            big = big.max(a[i + j * n].abs());
        }
        if big <= 0.0 {
            return Err(NumericsError::Singular);
        }
        scale[i] = 1.0 / big;
    }

    for j in 0..n {
        for i in 0..j {
            let mut sum = a[i + j * n];
            for k in 0..i {
                sum -= a[i + k * n] * a[k + j * n];
            }
            a[i + j * n] = sum;
        }
        let mut big = 0.0f64;
        let mut imax = j;
        for i in j..n {
            let mut sum = a[i + j * n];
            for k in 0..j {
                sum -= a[i + k * n] * a[k + j * n];
            }
            a[i + j * n] = sum;
            let tmp = scale[i] * sum.abs();
            if tmp >= big {
                big = tmp;
                imax = i;
            }
        }
        if j != imax {
            for k in 0..n {
                a.swap(imax + k * n, j + k * n);
            }
            scale[imax] = scale[j];
        }
        index[j] = imax;
        if a[j + j * n] == 0.0 {
            return Err(NumericsError::Singular);
        }
        if j != n - 1 {
            let pivot = a[j + j * n];
            for i in j + 1..n {
                a[i + j * n] /= pivot;
            }
        }
    }
    Ok(())
}

/// Back substitution over an LU-factored matrix
fn lu_back_substitute(a: &[f64], n: usize, index: &[usize], b: &mut [f64]) {
    let mut ii: isize = -1;
    for i in 0..n {
        let ip = index[i];
        let mut sum = b[ip];
        b[ip] = b[i];
        if ii >= 0 {
            for j in ii as usize..i {
                sum -= a[i + j * n] * b[j];
            }
        } else if sum != 0.0 {
            ii = i as isize;
        }
        b[i] = sum;
    }
    for i in (0..n).rev() {
        let mut sum = b[i];
        for j in i + 1..n {
            sum -= a[i + j * n] * b[j];
        }
        b[i] = sum / a[i + i * n];
    }
}

/// Inverts a square matrix in place by LU factorization
pub fn mat_inv(a: &mut [f64], n: usize) -> Result<(), NumericsError> {
    let mut lu = a.to_vec();
    let mut index = vec![0usize; n];
    lu_decompose(&mut lu, n, &mut index)?;

    for j in 0..n {
        for i in 0..n {
            a[i + j * n] = if i == j { 1.0 } else { 0.0 };
        }
        lu_back_substitute(&lu, n, &index, &mut a[j * n..(j + 1) * n]);
    }
    Ok(())
}

/// Solves `op(A)·X = Y` for X
///
/// A is n×n, Y is n×m, X is n×m, all column-major.
pub fn solve(
    tr: &str,
    a: &[f64],
    y: &[f64],
    n: usize,
    m: usize,
    x: &mut [f64],
) -> Result<(), NumericsError> {
    let mut b = a.to_vec();
    mat_inv(&mut b, n)?;
    let flip = if tr.starts_with('N') { "NN" } else { "TN" };
    mat_mul(flip, n, m, n, 1.0, &b, y, 0.0, x);
    Ok(())
}

/// Least squares estimation: `x = (A·Aᵀ)⁻¹·A·y`, `Q = (A·Aᵀ)⁻¹`
///
/// A is the n×m transposed design matrix, y is m×1 with `m ≥ n`.
pub fn lsq(
    a: &[f64],
    y: &[f64],
    n: usize,
    m: usize,
    x: &mut [f64],
    q: &mut [f64],
) -> Result<(), NumericsError> {
    if m < n {
        return Err(NumericsError::Underdetermined {
            observations: m,
            unknowns: n,
        });
    }
    let mut ay = vec![0.0; n];
    mat_mul("NN", n, 1, m, 1.0, a, y, 0.0, &mut ay);
    mat_mul("NT", n, n, m, 1.0, a, a, 0.0, q);
    mat_inv(q, n)?;
    mat_mul("NN", n, 1, n, 1.0, q, &ay, 0.0, x);
    Ok(())
}

/// Dense Kalman measurement update on an already-compressed state
fn kf_update_dense(
    x: &mut [f64],
    p: &mut [f64],
    h: &[f64],
    v: &[f64],
    r: &[f64],
    n: usize,
    m: usize,
) -> Result<(), NumericsError> {
    let mut f = vec![0.0; n * m];
    let mut q = r.to_vec();
    let mut k = vec![0.0; n * m];

    /* F = P·H, Q = Hᵀ·F + R, K = F·Q⁻¹ */
    mat_mul("NN", n, m, n, 1.0, p, h, 0.0, &mut f);
    mat_mul("TN", m, m, n, 1.0, h, &f, 1.0, &mut q);
    mat_inv(&mut q, m)?;
    mat_mul("NN", n, m, m, 1.0, &f, &q, 0.0, &mut k);

    /* x ← x + K·v */
    mat_mul("NN", n, 1, m, 1.0, &k, v, 1.0, x);

    /* P ← (I − K·Hᵀ)·P */
    let mut ikh = Matrix::identity(n);
    mat_mul("NT", n, n, m, -1.0, &k, h, 1.0, ikh.as_mut_slice());
    let p_old = p.to_vec();
    mat_mul("NN", n, n, n, 1.0, ikh.as_slice(), &p_old, 0.0, p);
    Ok(())
}

/// Kalman filter measurement update with inactive-state compression
///
/// `x` is the n×1 state, `p` its n×n covariance, `h` the n×m transposed
/// design matrix, `v` the m×1 innovation and `r` the m×m measurement
/// covariance. States with `x[i] == 0` and `P[i][i] == 0` are excluded
/// from the update and come out bit-identical; an inactive state must not
/// be perturbed by innovations.
pub fn kf_update(
    x: &mut [f64],
    p: &mut [f64],
    h: &[f64],
    v: &[f64],
    r: &[f64],
    n: usize,
    m: usize,
) -> Result<(), NumericsError> {
    let active: Vec<usize> = (0..n)
        .filter(|&i| x[i] != 0.0 || p[i + i * n] != 0.0)
        .collect();
    let k = active.len();
    if k == 0 {
        return Ok(());
    }

    let mut x_c = vec![0.0; k];
    let mut p_c = vec![0.0; k * k];
    let mut h_c = vec![0.0; k * m];
    for (ci, &i) in active.iter().enumerate() {
        x_c[ci] = x[i];
        for j in 0..m {
            h_c[ci + j * k] = h[i + j * n];
        }
        for (cj, &j) in active.iter().enumerate() {
            p_c[ci + cj * k] = p[i + j * n];
        }
    }

    kf_update_dense(&mut x_c, &mut p_c, &h_c, v, r, k, m)?;

    for (ci, &i) in active.iter().enumerate() {
        x[i] = x_c[ci];
        for (cj, &j) in active.iter().enumerate() {
            p[i + j * n] = p_c[ci + cj * k];
        }
    }
    Ok(())
}

/// Combines forward and backward filter solutions (RTS fixed-interval
/// smoother): `Qs = (Qf⁻¹ + Qb⁻¹)⁻¹`, `xs = Qs·(Qf⁻¹·xf + Qb⁻¹·xb)`
pub fn smoother(
    xf: &[f64],
    qf: &[f64],
    xb: &[f64],
    qb: &[f64],
    n: usize,
    xs: &mut [f64],
    qs: &mut [f64],
) -> Result<(), NumericsError> {
    let mut invqf = qf.to_vec();
    let mut invqb = qb.to_vec();
    mat_inv(&mut invqf, n)?;
    mat_inv(&mut invqb, n)?;

    for i in 0..n * n {
        qs[i] = invqf[i] + invqb[i];
    }
    mat_inv(qs, n)?;

    let mut xx = vec![0.0; n];
    mat_mul("NN", n, 1, n, 1.0, &invqf, xf, 0.0, &mut xx);
    mat_mul("NN", n, 1, n, 1.0, &invqb, xb, 1.0, &mut xx);
    mat_mul("NN", n, 1, n, 1.0, qs, &xx, 0.0, xs);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::assert_float_eq;
    use proptest::prelude::*;

    #[test]
    fn matmul_forms() {
        /* A = [1 3; 2 4] column-major, B = [5 7; 6 8] column-major */
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [5.0, 6.0, 7.0, 8.0];
        let mut c = [0.0; 4];

        mat_mul("NN", 2, 2, 2, 1.0, &a, &b, 0.0, &mut c);
        assert_eq!(c, [23.0, 34.0, 31.0, 46.0]);

        mat_mul("TN", 2, 2, 2, 1.0, &a, &b, 0.0, &mut c);
        assert_eq!(c, [17.0, 39.0, 23.0, 53.0]);

        mat_mul("NT", 2, 2, 2, 1.0, &a, &b, 0.0, &mut c);
        assert_eq!(c, [26.0, 38.0, 30.0, 44.0]);

        /* accumulate with beta */
        let mut c = [1.0, 1.0, 1.0, 1.0];
        mat_mul("NN", 2, 2, 2, 1.0, &a, &b, 2.0, &mut c);
        assert_eq!(c, [25.0, 36.0, 33.0, 48.0]);
    }

    #[test]
    fn inverse() {
        let mut a = [4.0, 2.0, 7.0, 6.0];
        mat_inv(&mut a, 2).unwrap();
        /* inv([[4,7],[2,6]]) = [[0.6,-0.7],[-0.2,0.4]] */
        assert_float_eq!(a[0], 0.6, abs <= 1e-12);
        assert_float_eq!(a[1], -0.2, abs <= 1e-12);
        assert_float_eq!(a[2], -0.7, abs <= 1e-12);
        assert_float_eq!(a[3], 0.4, abs <= 1e-12);

        let mut sing = [1.0, 2.0, 2.0, 4.0];
        assert_eq!(mat_inv(&mut sing, 2), Err(NumericsError::Singular));
        let mut zero = [0.0; 9];
        assert_eq!(mat_inv(&mut zero, 3), Err(NumericsError::Singular));
    }

    #[test]
    fn solve_linear_system() {
        /* A·x = y with A = [[2,1],[1,3]] (symmetric) */
        let a = [2.0, 1.0, 1.0, 3.0];
        let y = [5.0, 10.0];
        let mut x = [0.0; 2];
        solve("N", &a, &y, 2, 1, &mut x).unwrap();
        assert_float_eq!(2.0 * x[0] + x[1], 5.0, abs <= 1e-12);
        assert_float_eq!(x[0] + 3.0 * x[1], 10.0, abs <= 1e-12);
    }

    #[test]
    fn least_squares_exact_fit() {
        /* fit z = a + b·t through 3 points on an exact line */
        let t = [0.0, 1.0, 2.0];
        let z = [1.0, 3.0, 5.0];
        /* A is 2x3: rows are [1, t_i] per observation, stored column-major */
        let mut a = [0.0; 6];
        for i in 0..3 {
            a[2 * i] = 1.0;
            a[2 * i + 1] = t[i];
        }
        let mut x = [0.0; 2];
        let mut q = [0.0; 4];
        lsq(&a, &z, 2, 3, &mut x, &mut q).unwrap();
        assert_float_eq!(x[0], 1.0, abs <= 1e-9);
        assert_float_eq!(x[1], 2.0, abs <= 1e-9);

        assert!(matches!(
            lsq(&a, &z, 2, 1, &mut x, &mut q),
            Err(NumericsError::Underdetermined { .. })
        ));
    }

    #[test]
    fn kalman_sparsity_gate() {
        /* states 0 and 2 are inactive: zero value, zero variance */
        let mut x = [0.0, 1.0, 0.0];
        let mut p = [0.0; 9];
        p[1 + 1 * 3] = 1.0;
        let h = [0.5, 1.0, -0.3]; /* one measurement row over all states */
        let v = [0.5];
        let r = [0.25];

        kf_update(&mut x, &mut p, &h, &v, &r, 3, 1).unwrap();

        assert_eq!(x[0], 0.0);
        assert_eq!(x[2], 0.0);
        assert_eq!(p[0], 0.0);
        assert_eq!(p[2 + 2 * 3], 0.0);
        /* the active state moved toward the innovation */
        assert!(x[1] > 1.0);
        assert!(p[1 + 1 * 3] < 1.0);
    }

    #[test]
    fn kalman_scalar_case() {
        /* scalar filter: gain = P/(P+R) */
        let mut x = [2.0];
        let mut p = [4.0];
        let h = [1.0];
        let v = [1.0]; /* innovation */
        let r = [1.0];
        kf_update(&mut x, &mut p, &h, &v, &r, 1, 1).unwrap();
        assert_float_eq!(x[0], 2.8, abs <= 1e-12);
        assert_float_eq!(p[0], 0.8, abs <= 1e-12);
    }

    #[test]
    fn smoother_combines() {
        let xf = [1.0];
        let qf = [1.0];
        let xb = [3.0];
        let qb = [1.0];
        let mut xs = [0.0];
        let mut qs = [0.0];
        smoother(&xf, &qf, &xb, &qb, 1, &mut xs, &mut qs).unwrap();
        assert_float_eq!(xs[0], 2.0, abs <= 1e-12);
        assert_float_eq!(qs[0], 0.5, abs <= 1e-12);
    }

    proptest! {
        #[test]
        fn inverse_roundtrip(seed in proptest::array::uniform9(-10f64..10.0)) {
            let mut a = seed;
            /* diagonal dominance keeps the matrix comfortably regular */
            for i in 0..3 {
                a[i + i * 3] += 40.0;
            }
            let orig = a;
            mat_inv(&mut a, 3).unwrap();
            mat_inv(&mut a, 3).unwrap();
            for i in 0..9 {
                prop_assert!((a[i] - orig[i]).abs() < 1e-6);
            }
        }
    }
}
