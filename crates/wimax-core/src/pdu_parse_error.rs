use std::fmt;

/// Errors raised by the wire codecs. A decode failure discards the offending
/// frame and is logged with enough context to skip; it never tears down the
/// station.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PduParseErr {
    BufferEnded { field: Option<&'static str> },
    /// UIUC/DIUC discriminant does not select any known map IE variant
    UnknownIeType { uiuc: u8, cid: u16 },
    InvalidValue { field: &'static str, value: u64 },
}

impl fmt::Display for PduParseErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PduParseErr::BufferEnded { field } => {
                write!(f, "buffer ended while reading {}", field.unwrap_or("(unnamed field)"))
            }
            PduParseErr::UnknownIeType { uiuc, cid } => {
                write!(f, "unknown map IE type: uiuc {} cid {}", uiuc, cid)
            }
            PduParseErr::InvalidValue { field, value } => {
                write!(f, "invalid value for {}: {}", field, value)
            }
        }
    }
}

/// Checks whether a value matches an expected value. If not, returns PduParseErr::InvalidValue
#[macro_export]
macro_rules! expect_value {
    ($value:ident, $expected:expr) => {
        $crate::expect_value!(@inner $value, $expected, stringify!($value))
    };
    ($value:expr, $expected:expr, $field:expr) => {
        $crate::expect_value!(@inner $value, $expected, $field)
    };

    (@inner $value:expr, $expected:expr, $field:expr) => {{
        let val = $value;
        if val == $expected {
            Ok(())
        } else {
            Err($crate::PduParseErr::InvalidValue {
                field: $field,
                value: val.into(),
            })
        }
    }};
}

/// Reads a named fixed-width field from a BitBuffer, binding it to `$ident`.
#[macro_export]
macro_rules! let_field {
    ($buf:expr, $ident:ident, $bits:expr) => {
        let $ident = $buf.read_field($bits, stringify!($ident))?;
    };
}
