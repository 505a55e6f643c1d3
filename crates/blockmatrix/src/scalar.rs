//! Element types stored in block matrix leaves.

use std::fmt::{self, Debug};
use std::ops::{Add, Div, Mul, Neg, Sub};

use faer_traits::ComplexField;

pub use faer::c64;

/// Runtime tag of a leaf element type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementType {
    Bool,
    Float64,
    Complex128,
}

impl ElementType {
    /// Whether values of this type are complex numbers.
    pub fn is_complex(self) -> bool {
        matches!(self, Self::Complex128)
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Float64 => "float64",
            Self::Complex128 => "complex128",
        };
        f.write_str(name)
    }
}

/// Anything that can be stored in a dense leaf.
///
/// Numeric and boolean leaves share the storage layer; arithmetic is
/// only available for [`Scalar`] elements.
pub trait Element: Copy + Debug + Default + PartialEq + Send + Sync + 'static {
    /// Runtime tag of this element type.
    const ELEMENT_TYPE: ElementType;

    /// Truth value: anything but zero (or `false`) is true.
    fn is_nonzero(self) -> bool {
        self != Self::default()
    }
}

impl Element for bool {
    const ELEMENT_TYPE: ElementType = ElementType::Bool;
}

impl Element for f64 {
    const ELEMENT_TYPE: ElementType = ElementType::Float64;
}

impl Element for c64 {
    const ELEMENT_TYPE: ElementType = ElementType::Complex128;
}

/// Numeric element types.
///
/// This wraps faer's `ComplexField` with the std operators used by
/// block-wise arithmetic.
pub trait Scalar:
    Element
    + ComplexField
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
{
    /// Returns the additive identity (zero).
    fn zero() -> Self {
        Self::default()
    }

    /// Returns the multiplicative identity (one).
    fn one() -> Self;

    /// Widen to a complex number.
    fn to_c64(self) -> c64;
}

impl Scalar for f64 {
    fn one() -> Self {
        1.0
    }

    fn to_c64(self) -> c64 {
        c64::new(self, 0.0)
    }
}

impl Scalar for c64 {
    fn one() -> Self {
        c64::new(1.0, 0.0)
    }

    fn to_c64(self) -> c64 {
        self
    }
}

/// Numeric promotion between a left operand of type `Self` and a right operand of type `Rhs`.
///
/// Real with real stays real; anything involving a complex operand is complex.
pub trait Promote<Rhs: Scalar>: Scalar {
    /// The common type.
    type Promoted: Scalar;

    /// Convert a left operand to the common type.
    fn promote_lhs(self) -> Self::Promoted;

    /// Convert a right operand to the common type.
    fn promote_rhs(rhs: Rhs) -> Self::Promoted;
}

impl Promote<f64> for f64 {
    type Promoted = f64;

    fn promote_lhs(self) -> f64 {
        self
    }

    fn promote_rhs(rhs: f64) -> f64 {
        rhs
    }
}

impl Promote<c64> for f64 {
    type Promoted = c64;

    fn promote_lhs(self) -> c64 {
        self.to_c64()
    }

    fn promote_rhs(rhs: c64) -> c64 {
        rhs
    }
}

impl Promote<f64> for c64 {
    type Promoted = c64;

    fn promote_lhs(self) -> c64 {
        self
    }

    fn promote_rhs(rhs: f64) -> c64 {
        rhs.to_c64()
    }
}

impl Promote<c64> for c64 {
    type Promoted = c64;

    fn promote_lhs(self) -> c64 {
        self
    }

    fn promote_rhs(rhs: c64) -> c64 {
        rhs
    }
}
