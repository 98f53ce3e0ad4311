use std::fmt;

/// Optimization direction ("sense") of the objective function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    #[default]
    Minimize,
    Maximize,
}

impl Direction {
    pub fn is_minimize(self) -> bool {
        matches!(self, Direction::Minimize)
    }
}

/// Shape of the feasible range of a row or column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BoundType {
    /// -inf < x < +inf
    Free,
    /// lb <= x < +inf
    LowerOnly,
    /// -inf < x <= ub
    UpperOnly,
    /// lb <= x <= ub
    Double,
    /// x = value
    Fixed,
}

impl BoundType {
    pub fn as_str(self) -> &'static str {
        match self {
            BoundType::Free => "free",
            BoundType::LowerOnly => "lower",
            BoundType::UpperOnly => "upper",
            BoundType::Double => "double",
            BoundType::Fixed => "fixed",
        }
    }
}

impl fmt::Display for BoundType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored bound: the bound type together with the values it actually uses
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BoundSpec {
    #[default]
    Free,
    LowerOnly(f64),
    UpperOnly(f64),
    Double(f64, f64),
    Fixed(f64),
}

impl BoundSpec {
    /// Build the stored bound from a `(type, lower, upper)` triple.
    ///
    /// Values the bound type does not use are dropped. `Fixed` takes its
    /// value from `lower` and ignores `upper`. No consistency check is made
    /// here; see [`BoundSpec::is_consistent`].
    pub fn from_parts(kind: BoundType, lower: f64, upper: f64) -> Self {
        match kind {
            BoundType::Free => BoundSpec::Free,
            BoundType::LowerOnly => BoundSpec::LowerOnly(lower),
            BoundType::UpperOnly => BoundSpec::UpperOnly(upper),
            BoundType::Double => BoundSpec::Double(lower, upper),
            BoundType::Fixed => BoundSpec::Fixed(lower),
        }
    }

    pub fn bound_type(&self) -> BoundType {
        match self {
            BoundSpec::Free => BoundType::Free,
            BoundSpec::LowerOnly(_) => BoundType::LowerOnly,
            BoundSpec::UpperOnly(_) => BoundType::UpperOnly,
            BoundSpec::Double(_, _) => BoundType::Double,
            BoundSpec::Fixed(_) => BoundType::Fixed,
        }
    }

    /// Lower bound, if any. `-inf` counts as no lower bound.
    pub fn lower(&self) -> Option<f64> {
        let value = match *self {
            BoundSpec::LowerOnly(lb) | BoundSpec::Double(lb, _) | BoundSpec::Fixed(lb) => lb,
            BoundSpec::Free | BoundSpec::UpperOnly(_) => return None,
        };
        (value != f64::NEG_INFINITY).then_some(value)
    }

    /// Upper bound, if any. `+inf` counts as no upper bound.
    pub fn upper(&self) -> Option<f64> {
        let value = match *self {
            BoundSpec::UpperOnly(ub) | BoundSpec::Double(_, ub) | BoundSpec::Fixed(ub) => ub,
            BoundSpec::Free | BoundSpec::LowerOnly(_) => return None,
        };
        (value != f64::INFINITY).then_some(value)
    }

    /// Whether some finite value satisfies this bound.
    ///
    /// A double bound needs `lower <= upper`. A lower side of `+inf` or an
    /// upper side of `-inf` admits nothing, and neither does a fixed
    /// infinite value.
    pub fn is_consistent(&self) -> bool {
        match *self {
            BoundSpec::Free => true,
            BoundSpec::LowerOnly(lb) => lb != f64::INFINITY,
            BoundSpec::UpperOnly(ub) => ub != f64::NEG_INFINITY,
            BoundSpec::Double(lb, ub) => lb <= ub && lb != f64::INFINITY && ub != f64::NEG_INFINITY,
            BoundSpec::Fixed(value) => !value.is_infinite(),
        }
    }

    /// Whether any value this bound uses is NaN
    pub(crate) fn has_nan(&self) -> bool {
        match *self {
            BoundSpec::Free => false,
            BoundSpec::LowerOnly(v) | BoundSpec::UpperOnly(v) | BoundSpec::Fixed(v) => v.is_nan(),
            BoundSpec::Double(lb, ub) => lb.is_nan() || ub.is_nan(),
        }
    }
}
