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

//! A row returned by a [`Session`](crate::Session).

use crate::errors::ScanError;
use crate::value::CqlValue;
use crate::value::FromCqlValue;

/// An ordered list of `(column, value)` pairs.
///
/// Rows are small, thus a column lookup is a linear search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    columns: Vec<(String, CqlValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder style [`Row::set`].
    pub fn with(mut self, column: impl Into<String>, value: impl Into<CqlValue>) -> Self {
        self.set(column, value);
        self
    }

    /// Set a column, replacing the value if the column is already present.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<CqlValue>) {
        let column = column.into();
        let value = value.into();

        if let Some(slot) = self.columns.iter_mut().find(|(c, _)| *c == column) {
            slot.1 = value;
        } else {
            self.columns.push((column, value));
        }
    }

    pub fn value(&self, column: &str) -> Option<&CqlValue> {
        self.columns
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v)
    }

    /// Like [`Row::value`] but a missing column is an error.
    pub fn require(&self, column: &str) -> Result<&CqlValue, ScanError> {
        self.value(column).ok_or_else(|| ScanError::MissingColumn {
            column: column.to_string(),
        })
    }

    /// Get a typed column value.
    pub fn get<T>(&self, column: &str) -> Result<T, ScanError>
    where T: FromCqlValue {
        let value = self.require(column)?;

        T::from_cql(value).ok_or_else(|| ScanError::TypeMismatch {
            column: column.to_string(),
            expected: T::TYPE_NAME,
            found: value.type_name(),
        })
    }

    /// Collect the values of the given columns, in the given order.
    pub fn project<'a>(
        &self,
        columns: impl IntoIterator<Item = &'a str>,
    ) -> Result<Vec<CqlValue>, ScanError> {
        columns
            .into_iter()
            .map(|c| self.require(c).cloned())
            .collect()
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &CqlValue)> {
        self.columns.iter().map(|(c, v)| (c.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl<C, V> FromIterator<(C, V)> for Row
where
    C: Into<String>,
    V: Into<CqlValue>,
{
    fn from_iter<I: IntoIterator<Item = (C, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (c, v) in iter {
            row.set(c, v);
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn sample() -> Row {
        Row::new()
            .with("p_key", 1)
            .with("c_key", 2)
            .with("value", "1:2")
            .with("note", None::<String>)
    }

    #[test]
    fn test_set_replaces() {
        let mut row = sample();
        row.set("c_key", 3);

        assert_eq!(4, row.len());
        assert_eq!(Some(&CqlValue::Int(3)), row.value("c_key"));
    }

    #[test]
    fn test_get() -> anyhow::Result<()> {
        let row = sample();

        assert_eq!(1, row.get::<i32>("p_key")?);
        assert_eq!("1:2", row.get::<String>("value")?);
        assert_eq!(None, row.get::<Option<String>>("note")?);
        Ok(())
    }

    #[test]
    fn test_get_errors() {
        let row = sample();

        let err = row.get::<i32>("absent").unwrap_err();
        assert!(matches!(err, ScanError::MissingColumn { ref column } if column == "absent"));

        let err = row.get::<i64>("p_key").unwrap_err();
        assert!(matches!(
            err,
            ScanError::TypeMismatch {
                expected: "bigint",
                found: "int",
                ..
            }
        ));
    }

    #[test]
    fn test_project() -> anyhow::Result<()> {
        let row = sample();

        assert_eq!(
            vec![CqlValue::Int(2), CqlValue::Int(1)],
            row.project(["c_key", "p_key"])?
        );
        assert!(row.project(["p_key", "nope"]).is_err());
        Ok(())
    }

    #[test]
    fn test_from_iter() {
        let row: Row = [("a", 1), ("b", 2), ("a", 3)].into_iter().collect();

        let got: Vec<_> = row.columns().map(|(c, v)| (c.to_string(), v.clone())).collect();
        assert_eq!(
            vec![
                ("a".to_string(), CqlValue::Int(3)),
                ("b".to_string(), CqlValue::Int(2)),
            ],
            got
        );
    }
}
