// used for the storage collaborator
use rusqlite::types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef};

// used to print out readable forms of kinds and values
use std::fmt;

// used for the presentation view of a record
use serde_json::Value as JsonValue;

use crate::error::{Result, RowloomError};

// ------------- ScalarKind -------------
// The closed set of parameter kinds a constructor shape may declare.
// Raw is a passthrough policy: the argument is taken as text verbatim.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ScalarKind {
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Boolean,
    Char,
    Text,
    Raw,
}

impl ScalarKind {
    /// Coerces one textual argument to this kind, per the fixed conversion
    /// table. The `index` names the argument position in conversion errors.
    ///
    /// * `Text` and `Raw` pass the string through untouched.
    /// * `Char` takes the first character; an empty argument is an error.
    /// * The integral and floating kinds parse the full string.
    /// * `Boolean` accepts exactly `true` or `false`, case-insensitively.
    pub fn coerce(self, index: usize, raw: &str) -> Result<Scalar> {
        match self {
            ScalarKind::Text | ScalarKind::Raw => Ok(Scalar::Text(raw.to_owned())),
            ScalarKind::Char => raw
                .chars()
                .next()
                .map(Scalar::Char)
                .ok_or_else(|| self.conversion_error(index, raw)),
            ScalarKind::Byte => raw
                .parse::<i8>()
                .map(Scalar::Byte)
                .map_err(|_| self.conversion_error(index, raw)),
            ScalarKind::Short => raw
                .parse::<i16>()
                .map(Scalar::Short)
                .map_err(|_| self.conversion_error(index, raw)),
            ScalarKind::Int => raw
                .parse::<i32>()
                .map(Scalar::Int)
                .map_err(|_| self.conversion_error(index, raw)),
            ScalarKind::Long => raw
                .parse::<i64>()
                .map(Scalar::Long)
                .map_err(|_| self.conversion_error(index, raw)),
            ScalarKind::Float => raw
                .parse::<f32>()
                .map(Scalar::Float)
                .map_err(|_| self.conversion_error(index, raw)),
            ScalarKind::Double => raw
                .parse::<f64>()
                .map(Scalar::Double)
                .map_err(|_| self.conversion_error(index, raw)),
            ScalarKind::Boolean => {
                if raw.eq_ignore_ascii_case("true") {
                    Ok(Scalar::Boolean(true))
                } else if raw.eq_ignore_ascii_case("false") {
                    Ok(Scalar::Boolean(false))
                } else {
                    // lenient parsing would turn typos into false
                    Err(self.conversion_error(index, raw))
                }
            }
        }
    }

    /// Narrows a scalar to this kind. NULL passes through for every kind,
    /// and a value already of this kind is returned untouched. Fetched rows
    /// carry the widest kinds the store distinguishes (Long, Double, Text),
    /// so this is where a stored 0/1 becomes a boolean and a stored number
    /// narrows, checked, into its declared integral or floating kind. The
    /// textual conversion table above governs constructor arguments only.
    pub fn refit(self, value: Scalar) -> Result<Scalar> {
        if value.is_null() {
            return Ok(Scalar::Null);
        }
        if value.kind() == Some(self) {
            return Ok(value);
        }
        match (self, &value) {
            (ScalarKind::Byte, Scalar::Long(i)) => i8::try_from(*i)
                .map(Scalar::Byte)
                .map_err(|_| self.refit_error(&value)),
            (ScalarKind::Short, Scalar::Long(i)) => i16::try_from(*i)
                .map(Scalar::Short)
                .map_err(|_| self.refit_error(&value)),
            (ScalarKind::Int, Scalar::Long(i)) => i32::try_from(*i)
                .map(Scalar::Int)
                .map_err(|_| self.refit_error(&value)),
            (ScalarKind::Boolean, Scalar::Long(0)) => Ok(Scalar::Boolean(false)),
            (ScalarKind::Boolean, Scalar::Long(1)) => Ok(Scalar::Boolean(true)),
            (ScalarKind::Float, Scalar::Double(f)) => {
                // a finite double beyond f32 range casts to infinity
                let narrowed = *f as f32;
                if narrowed.is_infinite() && f.is_finite() {
                    Err(self.refit_error(&value))
                } else {
                    Ok(Scalar::Float(narrowed))
                }
            }
            // every i64 sits well inside f32 range, only precision is lost
            (ScalarKind::Float, Scalar::Long(i)) => Ok(Scalar::Float(*i as f32)),
            (ScalarKind::Double, Scalar::Long(i)) => Ok(Scalar::Double(*i as f64)),
            (ScalarKind::Char, Scalar::Text(s)) => s
                .chars()
                .next()
                .map(Scalar::Char)
                .ok_or_else(|| self.refit_error(&value)),
            (ScalarKind::Text | ScalarKind::Raw, Scalar::Long(i)) => Ok(Scalar::Text(i.to_string())),
            (ScalarKind::Text | ScalarKind::Raw, Scalar::Double(f)) => {
                Ok(Scalar::Text(f.to_string()))
            }
            (ScalarKind::Raw, Scalar::Text(s)) => Ok(Scalar::Text(s.clone())),
            (_, _) => Err(self.refit_error(&value)),
        }
    }

    fn conversion_error(self, index: usize, raw: &str) -> RowloomError {
        RowloomError::ArgumentConversion {
            index,
            kind: self,
            value: raw.to_owned(),
        }
    }

    fn refit_error(self, value: &Scalar) -> RowloomError {
        RowloomError::StoreExecution(format!(
            "stored value '{}' does not fit declared kind {}",
            value, self
        ))
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ScalarKind::Byte => "Byte",
            ScalarKind::Short => "Short",
            ScalarKind::Int => "Int",
            ScalarKind::Long => "Long",
            ScalarKind::Float => "Float",
            ScalarKind::Double => "Double",
            ScalarKind::Boolean => "Boolean",
            ScalarKind::Char => "Char",
            ScalarKind::Text => "Text",
            ScalarKind::Raw => "Raw",
        };
        write!(f, "{}", name)
    }
}

// ------------- Scalar -------------
// One column value. Null is a value of every kind, so kinds live on the
// schema side and values carry their own variant.
#[derive(Clone, PartialEq, Debug)]
pub enum Scalar {
    Null,
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    Char(char),
    Text(String),
}

impl Scalar {
    /// Reads one stored value in the widest kind the store distinguishes:
    /// integers become Long, reals Double, text Text. Narrowing to a
    /// declared kind happens later via [`ScalarKind::refit`]. Blob columns
    /// have no scalar kind and fail closed.
    pub fn from_sql(value: ValueRef<'_>) -> Result<Scalar> {
        match value {
            ValueRef::Null => Ok(Scalar::Null),
            ValueRef::Integer(i) => Ok(Scalar::Long(i)),
            ValueRef::Real(f) => Ok(Scalar::Double(f)),
            ValueRef::Text(t) => std::str::from_utf8(t)
                .map(|s| Scalar::Text(s.to_owned()))
                .map_err(|_| {
                    RowloomError::StoreExecution("invalid utf-8 in stored text".to_owned())
                }),
            ValueRef::Blob(_) => Err(RowloomError::StoreExecution(
                "blob columns have no scalar kind".to_owned(),
            )),
        }
    }
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }
    pub fn kind(&self) -> Option<ScalarKind> {
        match self {
            Scalar::Null => None,
            Scalar::Byte(_) => Some(ScalarKind::Byte),
            Scalar::Short(_) => Some(ScalarKind::Short),
            Scalar::Int(_) => Some(ScalarKind::Int),
            Scalar::Long(_) => Some(ScalarKind::Long),
            Scalar::Float(_) => Some(ScalarKind::Float),
            Scalar::Double(_) => Some(ScalarKind::Double),
            Scalar::Boolean(_) => Some(ScalarKind::Boolean),
            Scalar::Char(_) => Some(ScalarKind::Char),
            Scalar::Text(_) => Some(ScalarKind::Text),
        }
    }
    // accessors for constructor closures and tests that know what they hold
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Byte(v) => Some(*v as i64),
            Scalar::Short(v) => Some(*v as i64),
            Scalar::Int(v) => Some(*v as i64),
            Scalar::Long(v) => Some(*v),
            _ => None,
        }
    }
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Float(v) => Some(*v as f64),
            Scalar::Double(v) => Some(*v),
            _ => None,
        }
    }
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Boolean(v) => Some(*v),
            _ => None,
        }
    }
    pub fn as_char(&self) -> Option<char> {
        match self {
            Scalar::Char(v) => Some(*v),
            _ => None,
        }
    }
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Text(v) => Some(v),
            _ => None,
        }
    }
    pub fn as_json(&self) -> JsonValue {
        match self {
            Scalar::Null => JsonValue::Null,
            Scalar::Byte(v) => JsonValue::from(*v),
            Scalar::Short(v) => JsonValue::from(*v),
            Scalar::Int(v) => JsonValue::from(*v),
            Scalar::Long(v) => JsonValue::from(*v),
            Scalar::Float(v) => JsonValue::from(*v as f64),
            Scalar::Double(v) => JsonValue::from(*v),
            Scalar::Boolean(v) => JsonValue::Bool(*v),
            Scalar::Char(v) => JsonValue::String(v.to_string()),
            Scalar::Text(v) => JsonValue::String(v.clone()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Scalar::Null => write!(f, "null"),
            Scalar::Byte(v) => write!(f, "{}", v),
            Scalar::Short(v) => write!(f, "{}", v),
            Scalar::Int(v) => write!(f, "{}", v),
            Scalar::Long(v) => write!(f, "{}", v),
            Scalar::Float(v) => write!(f, "{}", v),
            Scalar::Double(v) => write!(f, "{}", v),
            Scalar::Boolean(v) => write!(f, "{}", v),
            Scalar::Char(v) => write!(f, "{}", v),
            Scalar::Text(v) => write!(f, "{}", v),
        }
    }
}

impl ToSql for Scalar {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Scalar::Null => ToSqlOutput::Owned(SqlValue::Null),
            Scalar::Byte(v) => ToSqlOutput::Owned(SqlValue::Integer(*v as i64)),
            Scalar::Short(v) => ToSqlOutput::Owned(SqlValue::Integer(*v as i64)),
            Scalar::Int(v) => ToSqlOutput::Owned(SqlValue::Integer(*v as i64)),
            Scalar::Long(v) => ToSqlOutput::Owned(SqlValue::Integer(*v)),
            Scalar::Float(v) => ToSqlOutput::Owned(SqlValue::Real(*v as f64)),
            Scalar::Double(v) => ToSqlOutput::Owned(SqlValue::Real(*v)),
            Scalar::Boolean(v) => ToSqlOutput::Owned(SqlValue::Integer(*v as i64)),
            Scalar::Char(v) => ToSqlOutput::Owned(SqlValue::Text(v.to_string())),
            Scalar::Text(v) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
        })
    }
}

// conversions so callers can write record.set("name", "Alice")
impl From<i8> for Scalar {
    fn from(v: i8) -> Self {
        Scalar::Byte(v)
    }
}
impl From<i16> for Scalar {
    fn from(v: i16) -> Self {
        Scalar::Short(v)
    }
}
impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::Int(v)
    }
}
impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Long(v)
    }
}
impl From<f32> for Scalar {
    fn from(v: f32) -> Self {
        Scalar::Float(v)
    }
}
impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Double(v)
    }
}
impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Boolean(v)
    }
}
impl From<char> for Scalar {
    fn from(v: char) -> Self {
        Scalar::Char(v)
    }
}
impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Text(v.to_owned())
    }
}
impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::Text(v)
    }
}
