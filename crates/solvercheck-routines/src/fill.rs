use core::fmt;
use core::str::FromStr;

/// Which part of a matrix a routine references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    /// Upper triangle
    Upper,
    /// Lower triangle
    Lower,
    /// Whole matrix. Routines working on one triangle reject it.
    Full,
}

impl Fill {
    /// LAPACK character for this fill mode.
    pub fn as_char(&self) -> char {
        match self {
            Fill::Upper => 'U',
            Fill::Lower => 'L',
            Fill::Full => 'F',
        }
    }
}

impl fmt::Display for Fill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for Fill {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "U" | "u" => Ok(Fill::Upper),
            "L" | "l" => Ok(Fill::Lower),
            "F" | "f" => Ok(Fill::Full),
            other => Err(format!("unknown fill mode {other:?}, expected U, L or F")),
        }
    }
}
