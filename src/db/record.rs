use rusqlite::types::Value;
use rusqlite::Row;

/// An ordered column-name to value mapping.
///
/// Used both for rows read from the store and for the field sets handed to
/// [`super::Crud`] for inserts, updates and `WHERE` clauses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Record::set`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Like [`Record::with`], storing `NULL` for `None`.
    pub fn with_optional(self, name: impl Into<String>, value: Option<impl Into<Value>>) -> Self {
        match value {
            Some(v) => self.with(name, v),
            None => self.with(name, Value::Null),
        }
    }

    /// Set a field, replacing an existing value of the same name in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Text value of a column; `None` for NULL, missing or non-text values.
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(Value::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.get(name) {
            Some(Value::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.fields.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn from_row(row: &Row, columns: &[String]) -> rusqlite::Result<Self> {
        let mut fields = Vec::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            fields.push((name.clone(), row.get::<_, Value>(i)?));
        }
        Ok(Self { fields })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_keeps_order_and_replaces() {
        let mut record = Record::new()
            .with("first_name", "Jane".to_string())
            .with("phone", "(555)123-4567".to_string());
        record.set("first_name", "Janet".to_string());

        assert_eq!(record.names().collect::<Vec<_>>(), vec!["first_name", "phone"]);
        assert_eq!(record.text("first_name"), Some("Janet"));
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn test_typed_accessors() {
        let record = Record::new()
            .with("id", 7i64)
            .with_optional("email", None::<String>)
            .with_optional("address", Some("1 Main St".to_string()));

        assert_eq!(record.integer("id"), Some(7));
        assert_eq!(record.text("id"), None);
        assert_eq!(record.get("email"), Some(&Value::Null));
        assert_eq!(record.text("email"), None);
        assert_eq!(record.text("address"), Some("1 Main St"));
        assert_eq!(record.get("missing"), None);
    }
}
