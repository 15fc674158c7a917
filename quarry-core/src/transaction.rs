use crate::{Error, Result};
use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IsolationLevel {
    ReadUncommitted,
    #[default]
    ReadCommitted,
    RepeatableRead,
    Serializable,
    Snapshot,
}

impl IsolationLevel {
    pub fn sql(&self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted => "READ UNCOMMITTED",
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
            IsolationLevel::Snapshot => "SNAPSHOT",
        }
    }
}

impl Display for IsolationLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql())
    }
}

impl FromStr for IsolationLevel {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        Ok(match normalized.as_str() {
            "read_uncommitted" => IsolationLevel::ReadUncommitted,
            "read_committed" => IsolationLevel::ReadCommitted,
            "repeatable_read" => IsolationLevel::RepeatableRead,
            "serializable" => IsolationLevel::Serializable,
            "snapshot" => IsolationLevel::Snapshot,
            _ => return Err(Error::msg(format!("Unknown isolation level `{s}`"))),
        })
    }
}

/// Handle of a [`crate::Session::begin`] call.
///
/// Only the call that actually started the transaction owns it, nested calls enlist in the
/// ambient transaction and their commit just leaves it.
#[must_use = "pass the token to commit or rollback"]
#[derive(Debug)]
pub struct TransactionToken {
    pub(crate) owner: bool,
    pub(crate) isolation: IsolationLevel,
}

impl TransactionToken {
    pub fn is_owner(&self) -> bool {
        self.owner
    }
    pub fn isolation(&self) -> IsolationLevel {
        self.isolation
    }
}

/// Transaction shared by the operations of one session.
#[derive(Default, Debug)]
pub(crate) struct AmbientTransaction {
    /// Open `begin` calls, 0 when no transaction is active.
    pub(crate) depth: u32,
    /// A rollback happened, the outer owner cannot commit anymore.
    pub(crate) invalidated: bool,
    pub(crate) isolation: IsolationLevel,
}

impl AmbientTransaction {
    pub(crate) fn is_active(&self) -> bool {
        self.depth > 0
    }
    pub(crate) fn reset(&mut self) {
        *self = AmbientTransaction::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_isolation() {
        assert_eq!(
            "Read Committed".parse::<IsolationLevel>().ok(),
            Some(IsolationLevel::ReadCommitted)
        );
        assert_eq!(
            "serializable".parse::<IsolationLevel>().ok(),
            Some(IsolationLevel::Serializable)
        );
        assert!("chaos".parse::<IsolationLevel>().is_err());
    }
}
