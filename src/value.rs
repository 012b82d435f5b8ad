// Copyright 2021 Datafuse Labs
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Cell values stored in a table.

use std::fmt;

/// A single column value of a row.
///
/// The derived ordering compares the variant first and then the value,
/// which gives a total order usable for sorting clustering columns.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CqlValue {
    Null,
    Boolean(bool),
    Int(i32),
    BigInt(i64),
    Text(String),
    Blob(Vec<u8>),
}

impl CqlValue {
    /// The CQL type name, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            CqlValue::Null => "null",
            CqlValue::Boolean(_) => "boolean",
            CqlValue::Int(_) => "int",
            CqlValue::BigInt(_) => "bigint",
            CqlValue::Text(_) => "text",
            CqlValue::Blob(_) => "blob",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CqlValue::Null)
    }

    /// Serialize the value the way the native protocol encodes it.
    ///
    /// This is the input of the partitioner when computing a token.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            CqlValue::Null => vec![],
            CqlValue::Boolean(b) => vec![*b as u8],
            CqlValue::Int(i) => i.to_be_bytes().to_vec(),
            CqlValue::BigInt(i) => i.to_be_bytes().to_vec(),
            CqlValue::Text(s) => s.as_bytes().to_vec(),
            CqlValue::Blob(b) => b.clone(),
        }
    }
}

/// Displays the value as a CQL literal.
impl fmt::Display for CqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CqlValue::Null => write!(f, "null"),
            CqlValue::Boolean(b) => write!(f, "{}", b),
            CqlValue::Int(i) => write!(f, "{}", i),
            CqlValue::BigInt(i) => write!(f, "{}", i),
            CqlValue::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
            CqlValue::Blob(b) => {
                write!(f, "0x")?;
                for byte in b {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
        }
    }
}

impl From<bool> for CqlValue {
    fn from(v: bool) -> Self {
        CqlValue::Boolean(v)
    }
}

impl From<i32> for CqlValue {
    fn from(v: i32) -> Self {
        CqlValue::Int(v)
    }
}

impl From<i64> for CqlValue {
    fn from(v: i64) -> Self {
        CqlValue::BigInt(v)
    }
}

impl From<&str> for CqlValue {
    fn from(v: &str) -> Self {
        CqlValue::Text(v.to_string())
    }
}

impl From<String> for CqlValue {
    fn from(v: String) -> Self {
        CqlValue::Text(v)
    }
}

impl From<Vec<u8>> for CqlValue {
    fn from(v: Vec<u8>) -> Self {
        CqlValue::Blob(v)
    }
}

impl<T> From<Option<T>> for CqlValue
where T: Into<CqlValue>
{
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(CqlValue::Null)
    }
}

/// Convert a [`CqlValue`] back into a Rust type.
pub trait FromCqlValue: Sized {
    /// The CQL type name this conversion accepts.
    const TYPE_NAME: &'static str;

    /// Returns `None` if the value is of another type.
    fn from_cql(value: &CqlValue) -> Option<Self>;
}

macro_rules! impl_from_cql_value {
    ($t:ty, $name:expr, $variant:ident) => {
        impl FromCqlValue for $t {
            const TYPE_NAME: &'static str = $name;

            fn from_cql(value: &CqlValue) -> Option<Self> {
                match value {
                    CqlValue::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }
        }
    };
}

impl_from_cql_value!(bool, "boolean", Boolean);
impl_from_cql_value!(i32, "int", Int);
impl_from_cql_value!(i64, "bigint", BigInt);
impl_from_cql_value!(String, "text", Text);
impl_from_cql_value!(Vec<u8>, "blob", Blob);

/// A nullable column: `null` converts to `None`.
impl<T> FromCqlValue for Option<T>
where T: FromCqlValue
{
    const TYPE_NAME: &'static str = T::TYPE_NAME;

    fn from_cql(value: &CqlValue) -> Option<Self> {
        match value {
            CqlValue::Null => Some(None),
            v => T::from_cql(v).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        assert!(CqlValue::Int(1) < CqlValue::Int(2));
        assert!(CqlValue::Text("a".to_string()) < CqlValue::Text("b".to_string()));
        assert!(CqlValue::Null < CqlValue::Int(i32::MIN));
        assert!(CqlValue::Int(i32::MAX) < CqlValue::BigInt(i64::MIN));
    }

    #[test]
    fn test_to_bytes() {
        assert_eq!(vec![0, 0, 0, 1], CqlValue::Int(1).to_bytes());
        assert_eq!(vec![0xff, 0xff, 0xff, 0xff], CqlValue::Int(-1).to_bytes());
        assert_eq!(vec![0, 0, 0, 0, 0, 0, 1, 0], CqlValue::BigInt(256).to_bytes());
        assert_eq!(b"ab".to_vec(), CqlValue::from("ab").to_bytes());
        assert_eq!(Vec::<u8>::new(), CqlValue::Null.to_bytes());
    }

    #[test]
    fn test_display_literal() {
        assert_eq!("3", CqlValue::Int(3).to_string());
        assert_eq!("'it''s'", CqlValue::from("it's").to_string());
        assert_eq!("0x0aff", CqlValue::Blob(vec![10, 255]).to_string());
        assert_eq!("null", CqlValue::from(None::<i32>).to_string());
    }

    #[test]
    fn test_from_cql() {
        assert_eq!(Some(5), i32::from_cql(&CqlValue::Int(5)));
        assert_eq!(None, i32::from_cql(&CqlValue::BigInt(5)));
        assert_eq!(Some(None), Option::<String>::from_cql(&CqlValue::Null));
        assert_eq!(
            Some(Some("x".to_string())),
            Option::<String>::from_cql(&CqlValue::from("x"))
        );
        assert_eq!(None, Option::<String>::from_cql(&CqlValue::Int(1)));
    }
}
