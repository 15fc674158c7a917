use crate::{TransactionType, Value, truncate_long};
use indexmap::IndexMap;
use std::{
    fmt::{self, Display, Formatter},
    time::Duration,
};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// `text` holds the statement.
    #[default]
    Text,
    /// `text` holds the name of a stored procedure.
    Procedure,
}

/// Named parameter values in binding order.
///
/// Names are unique: adding a name already present replaces its value and keeps its position.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Parameters(IndexMap<String, Value>);

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn add(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
    pub fn values(&self) -> impl ExactSizeIterator<Item = &Value> {
        self.0.values()
    }
}

impl<'a> IntoIterator for &'a Parameters {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Compiled statement ready for a storage provider.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct StorageCommand {
    pub text: String,
    pub kind: CommandKind,
    pub parameters: Parameters,
    /// Maximum execution time, `None` leaves the provider default.
    pub timeout: Option<Duration>,
}

impl StorageCommand {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn procedure(name: impl Into<String>) -> Self {
        Self {
            text: name.into(),
            kind: CommandKind::Procedure,
            ..Default::default()
        }
    }

    /// Adds or replaces (keeping its position) the named parameter.
    pub fn add_parameter(&mut self, name: impl Into<String>, value: Value) -> &mut Self {
        self.parameters.add(name, value);
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Derived from the first keyword of the text, `None` for procedures and other statements.
    pub fn transaction_type(&self) -> Option<TransactionType> {
        match self.kind {
            CommandKind::Text => TransactionType::from_sql(&self.text),
            CommandKind::Procedure => None,
        }
    }
}

impl From<&str> for StorageCommand {
    fn from(value: &str) -> Self {
        StorageCommand::new(value)
    }
}

impl From<String> for StorageCommand {
    fn from(value: String) -> Self {
        StorageCommand::new(value)
    }
}

impl Display for StorageCommand {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", truncate_long!(self.text))?;
        if !self.parameters.is_empty() {
            f.write_str(" [")?;
            for (i, (name, value)) in self.parameters.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{name} = {value}")?;
            }
            f.write_str("]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_parameter_updates_in_place() {
        let mut command = StorageCommand::new("SELECT @a, @b");
        command
            .add_parameter("@a", Value::Int32(Some(1)))
            .add_parameter("@b", Value::Int32(Some(2)))
            .add_parameter("@a", Value::Int32(Some(3)));
        assert_eq!(command.parameters.len(), 2);
        let values: Vec<_> = command.parameters.iter().collect();
        assert_eq!(
            values,
            [
                ("@a", &Value::Int32(Some(3))),
                ("@b", &Value::Int32(Some(2)))
            ]
        );
    }

    #[test]
    fn kind_from_text() {
        assert_eq!(
            StorageCommand::new("UPDATE x SET y = 1").transaction_type(),
            Some(TransactionType::Update)
        );
        assert_eq!(StorageCommand::procedure("uspGetBillOfMaterials").transaction_type(), None);
    }
}
