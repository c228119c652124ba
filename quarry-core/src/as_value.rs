use crate::{Error, Result, Value, truncate_long};
use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};
use std::{any, borrow::Cow, str::FromStr};
use time::{
    Date, OffsetDateTime, PrimitiveDateTime, Time, format_description::BorrowedFormatItem,
    macros::format_description,
};
use uuid::Uuid;

/// Conversion between native Rust types and the dynamic [`Value`].
///
/// This is where the coercion rules of the materializer live: a row cell
/// produced by a driver is handed to `try_from_value` of the target field type,
/// which accepts its canonical variant plus the compatible ones:
/// - integers of any width, with a range check, and integral decimals
/// - floats from integers and decimals
/// - text parsed into numbers, booleans, dates, times, timestamps and uuids
/// - a single character text into `char` and `char` back into text
///
/// # Examples
/// ```rust
/// use quarry_core::{AsValue, Value};
/// let v = 42i32.as_value();
/// assert!(matches!(v, Value::Int32(Some(42))));
/// let n: i64 = AsValue::try_from_value(v).unwrap();
/// assert_eq!(n, 42);
/// ```
pub trait AsValue {
    /// The typed NULL of this type, it describes the column kind without a value.
    fn as_empty_value() -> Value;
    /// Owned dynamic representation.
    fn as_value(self) -> Value;
    /// Converts a dynamic value back, applying the coercion rules.
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
    /// Parses the whole input.
    fn parse(input: &str) -> Result<Self>
    where
        Self: Sized,
    {
        Err(Error::msg(format!(
            "Cannot parse `{}` as {}",
            truncate_long!(input),
            any::type_name::<Self>()
        )))
    }
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}

impl From<&'static str> for Value {
    fn from(value: &'static str) -> Self {
        Value::Varchar(Some(value.into()))
    }
}

fn conversion_error<T>(value: &Value) -> Error {
    Error::msg(format!(
        "Cannot convert {value:?} to {}",
        any::type_name::<T>()
    ))
}

/// Integral content of any integer like variant.
fn integral(value: &Value) -> Option<i128> {
    Some(match value {
        Value::Boolean(Some(v)) => *v as i128,
        Value::Int8(Some(v)) => *v as i128,
        Value::Int16(Some(v)) => *v as i128,
        Value::Int32(Some(v)) => *v as i128,
        Value::Int64(Some(v)) => *v as i128,
        Value::UInt8(Some(v)) => *v as i128,
        Value::UInt16(Some(v)) => *v as i128,
        Value::UInt32(Some(v)) => *v as i128,
        Value::UInt64(Some(v)) => *v as i128,
        Value::Decimal(Some(v)) if v.is_integer() => v.to_i128()?,
        _ => return None,
    })
}

macro_rules! impl_as_value {
    ($source:ty, $destination:path) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    $destination(Some(v)) => Ok(v),
                    Value::Varchar(Some(ref v)) => <Self as AsValue>::parse(v),
                    ref value => {
                        let Some(v) = integral(value) else {
                            return Err(conversion_error::<Self>(value));
                        };
                        <$source>::try_from(v).map_err(|_| {
                            Error::msg(format!(
                                "Value {v} is out of range for {}",
                                any::type_name::<Self>()
                            ))
                        })
                    }
                }
            }
            fn parse(input: &str) -> Result<Self> {
                input.trim().parse::<$source>().map_err(|e| {
                    Error::new(e).context(format!(
                        "Cannot parse `{}` as {}",
                        truncate_long!(input),
                        any::type_name::<Self>()
                    ))
                })
            }
        }
    };
}
impl_as_value!(i8, Value::Int8);
impl_as_value!(i16, Value::Int16);
impl_as_value!(i32, Value::Int32);
impl_as_value!(i64, Value::Int64);
impl_as_value!(u8, Value::UInt8);
impl_as_value!(u16, Value::UInt16);
impl_as_value!(u32, Value::UInt32);
impl_as_value!(u64, Value::UInt64);

macro_rules! impl_as_value {
    ($source:ty, $destination:path, $other:path, $to:ident) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    $destination(Some(v)) => Ok(v),
                    $other(Some(v)) => Ok(v as _),
                    Value::Decimal(Some(v)) => v.$to().ok_or_else(|| conversion_error::<Self>(&value)),
                    Value::Varchar(Some(ref v)) => <Self as AsValue>::parse(v),
                    ref value => integral(value)
                        .map(|v| v as _)
                        .ok_or_else(|| conversion_error::<Self>(value)),
                }
            }
            fn parse(input: &str) -> Result<Self> {
                fast_float::parse(input.trim()).map_err(|_| {
                    Error::msg(format!(
                        "Cannot parse `{}` as {}",
                        truncate_long!(input),
                        any::type_name::<Self>()
                    ))
                })
            }
        }
    };
}
impl_as_value!(f32, Value::Float32, Value::Float64, to_f32);
impl_as_value!(f64, Value::Float64, Value::Float32, to_f64);

impl AsValue for bool {
    fn as_empty_value() -> Value {
        Value::Boolean(None)
    }
    fn as_value(self) -> Value {
        Value::Boolean(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Boolean(Some(v)) => Ok(v),
            Value::Varchar(Some(ref v)) => <Self as AsValue>::parse(v),
            Value::Char(Some(v)) => <Self as AsValue>::parse(v.encode_utf8(&mut [0; 4])),
            ref value => integral(value)
                .map(|v| v != 0)
                .ok_or_else(|| conversion_error::<Self>(value)),
        }
    }
    fn parse(input: &str) -> Result<Self> {
        match input.trim() {
            x if ["true", "t", "yes", "y", "1"]
                .iter()
                .any(|v| x.eq_ignore_ascii_case(v)) =>
            {
                Ok(true)
            }
            x if ["false", "f", "no", "n", "0"]
                .iter()
                .any(|v| x.eq_ignore_ascii_case(v)) =>
            {
                Ok(false)
            }
            _ => Err(Error::msg(format!(
                "Cannot parse boolean from `{}`",
                truncate_long!(input)
            ))),
        }
    }
}

impl AsValue for char {
    fn as_empty_value() -> Value {
        Value::Char(None)
    }
    fn as_value(self) -> Value {
        Value::Char(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Char(Some(v)) => Ok(v),
            Value::Varchar(Some(ref v)) => <Self as AsValue>::parse(v),
            ref value => Err(conversion_error::<Self>(value)),
        }
    }
    fn parse(input: &str) -> Result<Self> {
        let mut chars = input.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(Error::msg(format!(
                "Cannot convert `{}` into a char, it must contain exactly one character",
                truncate_long!(input)
            ))),
        }
    }
}

impl AsValue for String {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Varchar(Some(v)) => Ok(v),
            Value::Blob(..) | Value::List(..) => Err(conversion_error::<Self>(&value)),
            value if value.is_null() => Err(conversion_error::<Self>(&value)),
            value => Ok(value.to_string()),
        }
    }
    fn parse(input: &str) -> Result<Self> {
        Ok(input.into())
    }
}

impl<'a> AsValue for Cow<'a, str> {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self.into()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        String::try_from_value(value).map(Into::into)
    }
    fn parse(input: &str) -> Result<Self> {
        Ok(Cow::Owned(input.into()))
    }
}

impl AsValue for Decimal {
    fn as_empty_value() -> Value {
        Value::Decimal(None)
    }
    fn as_value(self) -> Value {
        Value::Decimal(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Decimal(Some(v)) => Ok(v),
            Value::Float32(Some(v)) => {
                Decimal::from_f32(v).ok_or_else(|| conversion_error::<Self>(&value))
            }
            Value::Float64(Some(v)) => {
                Decimal::from_f64(v).ok_or_else(|| conversion_error::<Self>(&value))
            }
            Value::Varchar(Some(ref v)) => <Self as AsValue>::parse(v),
            ref value => integral(value)
                .and_then(Decimal::from_i128)
                .ok_or_else(|| conversion_error::<Self>(value)),
        }
    }
    fn parse(input: &str) -> Result<Self> {
        Decimal::from_str(input.trim())
            .or_else(|_| Decimal::from_scientific(input.trim()))
            .map_err(|e| {
                Error::new(e).context(format!("Cannot parse `{}` as Decimal", truncate_long!(input)))
            })
    }
}

impl AsValue for Box<[u8]> {
    fn as_empty_value() -> Value {
        Value::Blob(None)
    }
    fn as_value(self) -> Value {
        Value::Blob(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Blob(Some(v)) => Ok(v),
            Value::Varchar(Some(v)) => Ok(v.into_bytes().into_boxed_slice()),
            Value::Uuid(Some(v)) => Ok(v.as_bytes().to_vec().into_boxed_slice()),
            ref value => Err(conversion_error::<Self>(value)),
        }
    }
}

impl AsValue for Uuid {
    fn as_empty_value() -> Value {
        Value::Uuid(None)
    }
    fn as_value(self) -> Value {
        Value::Uuid(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Uuid(Some(v)) => Ok(v),
            Value::Varchar(Some(ref v)) => <Self as AsValue>::parse(v),
            Value::Blob(Some(ref v)) => {
                Uuid::from_slice(v).map_err(|e| Error::new(e).context(conversion_error::<Self>(&value)))
            }
            ref value => Err(conversion_error::<Self>(value)),
        }
    }
    fn parse(input: &str) -> Result<Self> {
        Uuid::parse_str(input.trim()).map_err(|e| {
            Error::new(e).context(format!("Cannot parse `{}` as Uuid", truncate_long!(input)))
        })
    }
}

const DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const TIMES: &[&[BorrowedFormatItem<'static>]] = &[
    format_description!("[hour]:[minute]:[second].[subsecond]"),
    format_description!("[hour]:[minute]:[second]"),
    format_description!("[hour]:[minute]"),
];
const TIMESTAMPS: &[&[BorrowedFormatItem<'static>]] = &[
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]"),
];
const TIMESTAMPS_TZ: &[&[BorrowedFormatItem<'static>]] = &[
    format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond][offset_hour sign:mandatory]:[offset_minute]"
    ),
    format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]"
    ),
    format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond][offset_hour sign:mandatory]:[offset_minute]"
    ),
    format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]"
    ),
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second][offset_hour sign:mandatory]"),
];

macro_rules! parse_time {
    ($ty:ty, $input:expr, $formats:expr) => {{
        let input = $input.trim();
        $formats
            .iter()
            .find_map(|format| <$ty>::parse(input, format).ok())
            .ok_or_else(|| {
                Error::msg(format!(
                    "Cannot parse `{}` as {}",
                    truncate_long!(input),
                    any::type_name::<$ty>()
                ))
            })
    }};
}

impl AsValue for Date {
    fn as_empty_value() -> Value {
        Value::Date(None)
    }
    fn as_value(self) -> Value {
        Value::Date(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Date(Some(v)) => Ok(v),
            Value::Timestamp(Some(v)) => Ok(v.date()),
            Value::TimestampWithTimezone(Some(v)) => Ok(v.date()),
            Value::Varchar(Some(ref v)) => <Self as AsValue>::parse(v),
            ref value => Err(conversion_error::<Self>(value)),
        }
    }
    fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        let date = input.get(..10).unwrap_or(input);
        parse_time!(Date, date, [DATE])
    }
}

impl AsValue for Time {
    fn as_empty_value() -> Value {
        Value::Time(None)
    }
    fn as_value(self) -> Value {
        Value::Time(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Time(Some(v)) => Ok(v),
            Value::Timestamp(Some(v)) => Ok(v.time()),
            Value::Varchar(Some(ref v)) => <Self as AsValue>::parse(v),
            ref value => Err(conversion_error::<Self>(value)),
        }
    }
    fn parse(input: &str) -> Result<Self> {
        parse_time!(Time, input, TIMES)
    }
}

impl AsValue for PrimitiveDateTime {
    fn as_empty_value() -> Value {
        Value::Timestamp(None)
    }
    fn as_value(self) -> Value {
        Value::Timestamp(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Timestamp(Some(v)) => Ok(v),
            Value::TimestampWithTimezone(Some(v)) => {
                let v = v.to_offset(time::UtcOffset::UTC);
                Ok(PrimitiveDateTime::new(v.date(), v.time()))
            }
            Value::Date(Some(v)) => Ok(v.midnight()),
            Value::Varchar(Some(ref v)) => <Self as AsValue>::parse(v),
            ref value => Err(conversion_error::<Self>(value)),
        }
    }
    fn parse(input: &str) -> Result<Self> {
        parse_time!(PrimitiveDateTime, input, TIMESTAMPS)
    }
}

impl AsValue for OffsetDateTime {
    fn as_empty_value() -> Value {
        Value::TimestampWithTimezone(None)
    }
    fn as_value(self) -> Value {
        Value::TimestampWithTimezone(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::TimestampWithTimezone(Some(v)) => Ok(v),
            Value::Timestamp(Some(v)) => Ok(v.assume_utc()),
            Value::Varchar(Some(ref v)) => <Self as AsValue>::parse(v),
            ref value => Err(conversion_error::<Self>(value)),
        }
    }
    fn parse(input: &str) -> Result<Self> {
        parse_time!(OffsetDateTime, input, TIMESTAMPS_TZ)
            .or_else(|_| <PrimitiveDateTime as AsValue>::parse(input).map(|v| v.assume_utc()))
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => T::as_empty_value(),
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        Ok(if value.is_null() {
            None
        } else {
            Some(T::try_from_value(value)?)
        })
    }
    fn parse(input: &str) -> Result<Self> {
        if input.trim().eq_ignore_ascii_case("null") {
            return Ok(None);
        }
        T::parse(input).map(Some)
    }
}

impl<T: AsValue> AsValue for Box<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        (*self).as_value()
    }
    fn try_from_value(value: Value) -> Result<Self> {
        T::try_from_value(value).map(Box::new)
    }
    fn parse(input: &str) -> Result<Self> {
        T::parse(input).map(Box::new)
    }
}

impl<T: AsValue> AsValue for Vec<T> {
    fn as_empty_value() -> Value {
        Value::List(None, Box::new(T::as_empty_value()))
    }
    fn as_value(self) -> Value {
        Value::List(
            Some(self.into_iter().map(AsValue::as_value).collect()),
            Box::new(T::as_empty_value()),
        )
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::List(Some(v), ..) => v.into_iter().map(T::try_from_value).collect(),
            ref value => Err(conversion_error::<Self>(value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floats_across_widths() {
        assert_eq!(f32::try_from_value(Value::Float64(Some(1.5))).unwrap(), 1.5);
        assert_eq!(f32::try_from_value(Value::Float32(Some(2.5))).unwrap(), 2.5);
        assert_eq!(f64::try_from_value(Value::Float32(Some(0.25))).unwrap(), 0.25);
        assert_eq!(f64::try_from_value(Value::Int32(Some(3))).unwrap(), 3.0);
        assert_eq!(
            f64::try_from_value(Value::Decimal(Some(Decimal::new(125, 2)))).unwrap(),
            1.25
        );
        assert_eq!(f64::try_from_value(" 4.5 ".into()).unwrap(), 4.5);
        assert!(f32::try_from_value(Value::Float64(None)).is_err());
    }
}
