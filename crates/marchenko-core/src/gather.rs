//! Gather containers for time- and frequency-domain fields.
//!
//! A gather is a dense `ts × ns` array stored row-major with the time (or
//! frequency) sample as the slow axis and the receiver as the fast axis.
//! The element type carries the domain: real gathers hold time samples,
//! complex gathers hold spectra. A [`Cube`] adds a source axis as the
//! fastest index (`ts × ns × ns`) and holds the reflectivity.

use num_complex::Complex64;

use crate::error::{MarchenkoError, Result};

/// Dense `ts × ns` field.
#[derive(Debug, Clone, PartialEq)]
pub struct Gather<T> {
    ts: usize,
    ns: usize,
    data: Vec<T>,
}

/// Time-domain gather (centered layout, see [`crate::transform`]).
pub type TimeGather = Gather<f64>;

/// Frequency-domain gather.
pub type SpectralGather = Gather<Complex64>;

impl<T: Copy + Default> Gather<T> {
    pub fn zeros(ts: usize, ns: usize) -> Self {
        Self {
            ts,
            ns,
            data: vec![T::default(); ts * ns],
        }
    }

    /// Wrap row-major `ts × ns` data.
    pub fn from_vec(ts: usize, ns: usize, data: Vec<T>) -> Result<Self> {
        if data.len() != ts * ns {
            return Err(MarchenkoError::ShapeMismatch {
                field: "gather data",
                expected: format!("{} samples ({}x{})", ts * ns, ts, ns),
                found: format!("{} samples", data.len()),
            });
        }
        Ok(Self { ts, ns, data })
    }

    /// Build a gather from a function of `(sample, receiver)`.
    pub fn from_fn(ts: usize, ns: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(ts * ns);
        for t in 0..ts {
            for r in 0..ns {
                data.push(f(t, r));
            }
        }
        Self { ts, ns, data }
    }

    pub fn ts(&self) -> usize {
        self.ts
    }

    pub fn ns(&self) -> usize {
        self.ns
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.ts, self.ns)
    }

    #[inline]
    pub fn get(&self, t: usize, r: usize) -> T {
        self.data[t * self.ns + r]
    }

    #[inline]
    pub fn set(&mut self, t: usize, r: usize, value: T) {
        self.data[t * self.ns + r] = value;
    }

    /// All receivers at one sample.
    pub fn row(&self, t: usize) -> &[T] {
        &self.data[t * self.ns..(t + 1) * self.ns]
    }

    /// Copy out the samples of one receiver.
    pub fn trace(&self, r: usize) -> Vec<T> {
        (0..self.ts).map(|t| self.get(t, r)).collect()
    }

    /// Overwrite the samples of one receiver. `samples` must hold `ts` values.
    pub fn set_trace(&mut self, r: usize, samples: &[T]) {
        debug_assert_eq!(samples.len(), self.ts);
        for (t, &v) in samples.iter().enumerate() {
            self.set(t, r, v);
        }
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    pub fn map<U: Copy + Default>(&self, f: impl Fn(T) -> U) -> Gather<U> {
        Gather {
            ts: self.ts,
            ns: self.ns,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Combine two gathers of equal shape sample by sample.
    pub fn zip_with(&self, other: &Self, f: impl Fn(T, T) -> T) -> Self {
        debug_assert_eq!(self.shape(), other.shape());
        Self {
            ts: self.ts,
            ns: self.ns,
            data: self
                .data
                .iter()
                .zip(other.data.iter())
                .map(|(&a, &b)| f(a, b))
                .collect(),
        }
    }

    /// `"ts x ns"`, used in error messages.
    pub fn describe_shape(&self) -> String {
        format!("{}x{}", self.ts, self.ns)
    }
}

impl Gather<f64> {
    /// Largest absolute sample value.
    pub fn peak_abs(&self) -> f64 {
        self.data.iter().map(|v| v.abs()).fold(0.0f64, f64::max)
    }

    pub fn scale(&mut self, factor: f64) {
        for v in self.data.iter_mut() {
            *v *= factor;
        }
    }

    pub fn add(&self, other: &Self) -> Self {
        self.zip_with(other, |a, b| a + b)
    }

    pub fn sub(&self, other: &Self) -> Self {
        self.zip_with(other, |a, b| a - b)
    }

    /// Pointwise product, used for masking.
    pub fn mul(&self, other: &Self) -> Self {
        self.zip_with(other, |a, b| a * b)
    }

    /// `1 - x` for every sample.
    pub fn complement(&self) -> Self {
        self.map(|v| 1.0 - v)
    }

    pub fn l2_norm(&self) -> f64 {
        self.data.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    pub fn max_abs_diff(&self, other: &Self) -> f64 {
        self.data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0f64, f64::max)
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }
}

impl Gather<Complex64> {
    pub fn add(&self, other: &Self) -> Self {
        self.zip_with(other, |a, b| a + b)
    }
}

/// Dense `ts × ns × ns` field indexed `(sample, receiver, source)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Cube<T> {
    ts: usize,
    ns: usize,
    data: Vec<T>,
}

impl<T: Copy + Default> Cube<T> {
    pub fn zeros(ts: usize, ns: usize) -> Self {
        Self {
            ts,
            ns,
            data: vec![T::default(); ts * ns * ns],
        }
    }

    /// Wrap row-major `ts × ns × ns` data.
    pub fn from_vec(ts: usize, ns: usize, data: Vec<T>) -> Result<Self> {
        if data.len() != ts * ns * ns {
            return Err(MarchenkoError::ShapeMismatch {
                field: "cube data",
                expected: format!("{} samples ({}x{}x{})", ts * ns * ns, ts, ns, ns),
                found: format!("{} samples", data.len()),
            });
        }
        Ok(Self { ts, ns, data })
    }

    pub fn from_fn(ts: usize, ns: usize, mut f: impl FnMut(usize, usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(ts * ns * ns);
        for t in 0..ts {
            for r in 0..ns {
                for s in 0..ns {
                    data.push(f(t, r, s));
                }
            }
        }
        Self { ts, ns, data }
    }

    pub fn ts(&self) -> usize {
        self.ts
    }

    pub fn ns(&self) -> usize {
        self.ns
    }

    #[inline]
    fn index(&self, t: usize, r: usize, s: usize) -> usize {
        (t * self.ns + r) * self.ns + s
    }

    #[inline]
    pub fn get(&self, t: usize, r: usize, s: usize) -> T {
        self.data[self.index(t, r, s)]
    }

    #[inline]
    pub fn set(&mut self, t: usize, r: usize, s: usize, value: T) {
        let i = self.index(t, r, s);
        self.data[i] = value;
    }

    /// Sources for one receiver at one sample.
    pub fn row(&self, t: usize, r: usize) -> &[T] {
        let start = self.index(t, r, 0);
        &self.data[start..start + self.ns]
    }

    /// Copy out the trace recorded at receiver `r` from source `s`.
    pub fn trace(&self, r: usize, s: usize) -> Vec<T> {
        (0..self.ts).map(|t| self.get(t, r, s)).collect()
    }

    pub fn set_trace(&mut self, r: usize, s: usize, samples: &[T]) {
        debug_assert_eq!(samples.len(), self.ts);
        for (t, &v) in samples.iter().enumerate() {
            self.set(t, r, s, v);
        }
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn describe_shape(&self) -> String {
        format!("{}x{}x{}", self.ts, self.ns, self.ns)
    }
}

/// A quantity kept in both domains at once.
#[derive(Debug, Clone)]
pub struct DualGather {
    pub time: TimeGather,
    pub spectrum: SpectralGather,
}
