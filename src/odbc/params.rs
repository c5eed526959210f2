// Parameter conversion between middleware values and call-level buffers
//
// Every `ParamValue` is encoded into a `ParamBinding` before it is handed to
// the driver: the binding owns the buffer the driver reads from, so the
// buffer stays alive for as long as the statement keeps the binding.

use crate::odbc::interface::{CDataType, Indicator, SqlDataType};
use crate::types::ParamValue;

/// Owned buffer content of one bound parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamData {
    /// A 64-bit integer cell the driver reads in place.
    Int(i64),
    /// A NUL-terminated character buffer.
    Bytes(Vec<u8>),
    /// No buffer; the indicator alone marks the parameter NULL.
    None,
}

/// One encoded parameter, ready to hand to the driver's bind call.
///
/// Integers are widened to 64 bits and bound as `SBigInt`/`BigInt`; text is
/// copied into a NUL-terminated buffer bound as `Char`/`Varchar`; NULL binds
/// an empty `Varchar` with the null indicator set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamBinding {
    value_type: CDataType,
    parameter_type: SqlDataType,
    column_size: usize,
    data: ParamData,
    indicator: Indicator,
}

impl ParamBinding {
    /// Encode a middleware value into its driver-side representation.
    #[must_use]
    pub fn from_value(value: &ParamValue) -> Self {
        match value {
            ParamValue::Int(i) => Self::from_int(*i),
            ParamValue::Text(s) => Self::from_text(s),
            ParamValue::Null => Self::null(),
        }
    }

    fn from_int(value: i64) -> Self {
        Self {
            value_type: CDataType::SBigInt,
            parameter_type: SqlDataType::BigInt,
            column_size: 0,
            data: ParamData::Int(value),
            indicator: Indicator::Length(std::mem::size_of::<i64>()),
        }
    }

    fn from_text(value: &str) -> Self {
        let len = value.len();
        let mut buffer = Vec::with_capacity(len + 1);
        buffer.extend_from_slice(value.as_bytes());
        buffer.push(0);
        Self {
            value_type: CDataType::Char,
            parameter_type: SqlDataType::Varchar,
            column_size: len,
            data: ParamData::Bytes(buffer),
            indicator: Indicator::Length(len),
        }
    }

    fn null() -> Self {
        Self {
            value_type: CDataType::Char,
            parameter_type: SqlDataType::Varchar,
            column_size: 0,
            data: ParamData::None,
            indicator: Indicator::Null,
        }
    }

    /// C-side type of the bound buffer.
    #[must_use]
    pub fn value_type(&self) -> CDataType {
        self.value_type
    }

    /// SQL-side type declared for the parameter.
    #[must_use]
    pub fn parameter_type(&self) -> SqlDataType {
        self.parameter_type
    }

    /// Declared column size (byte length for text, 0 otherwise).
    #[must_use]
    pub fn column_size(&self) -> usize {
        self.column_size
    }

    /// The owned buffer content.
    #[must_use]
    pub fn data(&self) -> &ParamData {
        &self.data
    }

    /// Length-or-null indicator passed alongside the buffer.
    #[must_use]
    pub fn indicator(&self) -> Indicator {
        self.indicator
    }
}
