//! Complex value types for escape-time iteration.
//!
//! Provides a trait abstraction over f32, f64 and double-double complex
//! numbers so a single generic kernel serves every precision: double-double
//! on the CPU, f32 as the host-side mirror of the GPU shader.

use crate::DoubleDouble;

/// Complex number type usable by the escape-time kernel.
pub trait EscapeComplex: Copy + Sized {
    /// Narrow a double-double coordinate to this representation.
    fn from_dd_pair(re: DoubleDouble, im: DoubleDouble) -> Self;

    /// Additive identity.
    fn zero() -> Self;

    /// Complex addition.
    fn add(&self, other: &Self) -> Self;

    /// Complex square.
    fn square(&self) -> Self;

    /// Magnitude squared, evaluated in this type's own precision and widened to f64.
    fn norm_sq(&self) -> f64;
}

/// f32 complex, matching the GPU shader's arithmetic.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct F32Complex {
    pub re: f32,
    pub im: f32,
}

impl EscapeComplex for F32Complex {
    #[inline]
    fn from_dd_pair(re: DoubleDouble, im: DoubleDouble) -> Self {
        Self {
            re: re.to_f64() as f32,
            im: im.to_f64() as f32,
        }
    }

    #[inline]
    fn zero() -> Self {
        Self { re: 0.0, im: 0.0 }
    }

    #[inline]
    fn add(&self, other: &Self) -> Self {
        Self {
            re: self.re + other.re,
            im: self.im + other.im,
        }
    }

    #[inline]
    fn square(&self) -> Self {
        Self {
            re: self.re * self.re - self.im * self.im,
            im: 2.0 * self.re * self.im,
        }
    }

    #[inline]
    fn norm_sq(&self) -> f64 {
        f64::from(self.re * self.re + self.im * self.im)
    }
}

/// Plain f64 complex.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct F64Complex {
    pub re: f64,
    pub im: f64,
}

impl EscapeComplex for F64Complex {
    #[inline]
    fn from_dd_pair(re: DoubleDouble, im: DoubleDouble) -> Self {
        Self {
            re: re.to_f64(),
            im: im.to_f64(),
        }
    }

    #[inline]
    fn zero() -> Self {
        Self { re: 0.0, im: 0.0 }
    }

    #[inline]
    fn add(&self, other: &Self) -> Self {
        Self {
            re: self.re + other.re,
            im: self.im + other.im,
        }
    }

    #[inline]
    fn square(&self) -> Self {
        Self {
            re: self.re * self.re - self.im * self.im,
            im: 2.0 * self.re * self.im,
        }
    }

    #[inline]
    fn norm_sq(&self) -> f64 {
        self.re * self.re + self.im * self.im
    }
}

/// Double-double complex, used for viewport coordinates and CPU iteration.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DdComplex {
    pub re: DoubleDouble,
    pub im: DoubleDouble,
}

impl DdComplex {
    pub const ZERO: Self = Self {
        re: DoubleDouble::ZERO,
        im: DoubleDouble::ZERO,
    };

    pub fn new(re: DoubleDouble, im: DoubleDouble) -> Self {
        Self { re, im }
    }

    pub fn from_f64(re: f64, im: f64) -> Self {
        Self {
            re: DoubleDouble::from_f64(re),
            im: DoubleDouble::from_f64(im),
        }
    }

    pub fn to_f64_pair(&self) -> (f64, f64) {
        (self.re.to_f64(), self.im.to_f64())
    }

    pub fn is_finite(&self) -> bool {
        self.re.is_finite() && self.im.is_finite()
    }
}

impl EscapeComplex for DdComplex {
    #[inline]
    fn from_dd_pair(re: DoubleDouble, im: DoubleDouble) -> Self {
        Self { re, im }
    }

    #[inline]
    fn zero() -> Self {
        Self::ZERO
    }

    #[inline]
    fn add(&self, other: &Self) -> Self {
        Self {
            re: self.re.add(&other.re),
            im: self.im.add(&other.im),
        }
    }

    #[inline]
    fn square(&self) -> Self {
        // (a + bi)² = (a² - b²) + 2abi; doubling is exact
        Self {
            re: self.re.square().sub(&self.im.square()),
            im: self.re.mul(&self.im).mul_f64(2.0),
        }
    }

    #[inline]
    fn norm_sq(&self) -> f64 {
        self.re.square().add(&self.im.square()).to_f64()
    }
}
