use super::Tensor;
use crate::error::{Result, ToychError};

impl Tensor {
    /// Applies `f` to every element.
    pub fn map<F: Fn(f64) -> f64>(&self, f: F) -> Tensor {
        Tensor {
            data: self.data.iter().map(|&x| f(x)).collect(),
            shape: self.shape.clone(),
        }
    }

    pub fn scale(&self, factor: f64) -> Tensor {
        self.map(|x| x * factor)
    }

    pub fn add(&self, other: &Tensor) -> Result<Tensor> {
        self.zip_map(other, |a, b| a + b)
    }

    pub fn sub(&self, other: &Tensor) -> Result<Tensor> {
        self.zip_map(other, |a, b| a - b)
    }

    pub fn mul(&self, other: &Tensor) -> Result<Tensor> {
        self.zip_map(other, |a, b| a * b)
    }

    pub fn div(&self, other: &Tensor) -> Result<Tensor> {
        self.zip_map(other, |a, b| a / b)
    }

    /// In-place `self += other` for equally shaped tensors.
    ///
    /// # Errors
    /// Returns `ShapeMismatch` if the shapes differ; no broadcasting is performed.
    pub fn add_assign(&mut self, other: &Tensor) -> Result<()> {
        if self.shape != other.shape {
            return Err(ToychError::ShapeMismatch {
                expected: self.shape.clone(),
                actual: other.shape.clone(),
                operation: "add_assign".to_string(),
            });
        }
        self.data
            .iter_mut()
            .zip(&other.data)
            .for_each(|(a, &b)| *a += b);
        Ok(())
    }

    /// Largest absolute value, 0 for an empty tensor.
    pub fn abs_max(&self) -> f64 {
        self.data.iter().fold(0.0, |acc: f64, &x| acc.max(x.abs()))
    }

    /// Sum of all elements as a scalar tensor.
    pub fn sum(&self) -> Tensor {
        super::scalar(self.data.iter().sum())
    }

    /// Mean of all elements as a scalar tensor (0 for an empty tensor).
    pub fn mean(&self) -> Tensor {
        let n = self.numel().max(1) as f64;
        super::scalar(self.data.iter().sum::<f64>() / n)
    }

    /// Sums along `axis`, keeping it as a size-1 dimension when `keepdim` is set.
    ///
    /// # Errors
    /// Returns `IndexOutOfBounds` if `axis` is not a dimension of the tensor.
    pub fn sum_axis(&self, axis: usize, keepdim: bool) -> Result<Tensor> {
        if axis >= self.rank() {
            return Err(ToychError::IndexOutOfBounds {
                index: vec![axis],
                shape: self.shape.clone(),
            });
        }
        let outer: usize = self.shape[..axis].iter().product();
        let len = self.shape[axis];
        let inner: usize = self.shape[axis + 1..].iter().product();

        let mut data = vec![0.0; outer * inner];
        for o in 0..outer {
            for k in 0..len {
                let base = (o * len + k) * inner;
                for i in 0..inner {
                    data[o * inner + i] += self.data[base + i];
                }
            }
        }
        let mut shape = self.shape.clone();
        if keepdim {
            shape[axis] = 1;
        } else {
            shape.remove(axis);
        }
        Tensor::new(data, shape)
    }

    /// Matrix product of two rank-2 tensors `[m, k] x [k, n] -> [m, n]`.
    ///
    /// # Errors
    /// Returns `ShapeMismatch` if either operand is not rank 2 or the inner dimensions differ.
    pub fn matmul(&self, other: &Tensor) -> Result<Tensor> {
        let (m, k) = self.as_matrix_dims("matmul")?;
        let (k2, n) = other.as_matrix_dims("matmul")?;
        if k != k2 {
            return Err(ToychError::ShapeMismatch {
                expected: vec![k, n],
                actual: other.shape.clone(),
                operation: "matmul".to_string(),
            });
        }
        let mut data = vec![0.0; m * n];
        for i in 0..m {
            for p in 0..k {
                let a = self.data[i * k + p];
                if a == 0.0 {
                    continue;
                }
                let row = &other.data[p * n..(p + 1) * n];
                for (out, &b) in data[i * n..(i + 1) * n].iter_mut().zip(row) {
                    *out += a * b;
                }
            }
        }
        Tensor::new(data, vec![m, n])
    }

    /// Transpose of a rank-2 tensor.
    pub fn transpose(&self) -> Result<Tensor> {
        let (m, n) = self.as_matrix_dims("transpose")?;
        let mut data = Vec::with_capacity(m * n);
        for j in 0..n {
            for i in 0..m {
                data.push(self.data[i * n + j]);
            }
        }
        Tensor::new(data, vec![n, m])
    }

    /// Softmax over the last axis.
    pub fn softmax(&self) -> Tensor {
        self.last_axis_rows(|row, out| {
            let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let mut total = 0.0;
            for (o, &x) in out.iter_mut().zip(row) {
                *o = (x - max).exp();
                total += *o;
            }
            out.iter_mut().for_each(|o| *o /= total);
        })
    }

    /// Log-softmax over the last axis, computed with the max-shift for stability.
    pub fn log_softmax(&self) -> Tensor {
        self.last_axis_rows(|row, out| {
            let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let log_total = row.iter().map(|&x| (x - max).exp()).sum::<f64>().ln() + max;
            for (o, &x) in out.iter_mut().zip(row) {
                *o = x - log_total;
            }
        })
    }

    /// Index of the largest element of each row of a rank-2 tensor (first one on ties).
    pub fn argmax_rows(&self) -> Result<Vec<usize>> {
        let (m, n) = self.as_matrix_dims("argmax_rows")?;
        Ok((0..m)
            .map(|i| {
                let row = &self.data[i * n..(i + 1) * n];
                let mut best = 0;
                for (j, &x) in row.iter().enumerate() {
                    if x > row[best] {
                        best = j;
                    }
                }
                best
            })
            .collect())
    }

    fn as_matrix_dims(&self, operation: &str) -> Result<(usize, usize)> {
        match self.shape[..] {
            [m, n] => Ok((m, n)),
            _ => Err(ToychError::ShapeMismatch {
                expected: vec![0, 0],
                actual: self.shape.clone(),
                operation: format!("{} (expects a rank-2 tensor)", operation),
            }),
        }
    }

    fn last_axis_rows<F: Fn(&[f64], &mut [f64])>(&self, f: F) -> Tensor {
        let width = self.shape.last().copied().unwrap_or(1).max(1);
        let mut data = vec![0.0; self.numel()];
        for (row, out) in self.data.chunks(width).zip(data.chunks_mut(width)) {
            f(row, out);
        }
        Tensor {
            data,
            shape: self.shape.clone(),
        }
    }
}

#[cfg(test)]
#[path = "math_methods_test.rs"]
mod tests;
