//! Scalar values held by metrics tables.

use std::fmt;

/// A single scalar cell within a metrics table.
///
/// Source reports mix free text, counts, and measurements in one row, so the
/// cell type is a small union rather than anything stronger. Two members are
/// sentinels with fixed renderings: a not-a-number float renders as `nan`
/// (the marker substituted for blank numeric fields in source reports) and
/// [`Value::Null`] renders as whatever fill the writer was configured with
/// (gaps introduced by an outer join).
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Free text carried through from a source file.
    String(String),
    /// An integral count.
    Integer(i64),
    /// A floating point measurement or ratio.
    Float(f64),
    /// A gap introduced by an outer join.
    Null,
}

impl Value {
    /// The sentinel substituted for blank numeric fields in source reports.
    pub fn nan() -> Self {
        Value::Float(f64::NAN)
    }

    /// Whether this value is the [`Value::Null`] join gap.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(x) if x.is_nan() => f.write_str("nan"),
            Value::Float(x) => write!(f, "{}", x),
            Value::Null => Ok(()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}
