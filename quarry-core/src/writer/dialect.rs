use crate::{
    CompactSqlWriter, Error, GenericSqlWriter, JetSqlWriter, Result, SqlServerSqlWriter,
    SqlWriter,
};
use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

static GENERIC: GenericSqlWriter = GenericSqlWriter::new();
static SQL_SERVER: SqlServerSqlWriter = SqlServerSqlWriter::new();
static JET: JetSqlWriter = JetSqlWriter::new();
static COMPACT: CompactSqlWriter = CompactSqlWriter::new();

/// Dialects printed by this crate, drivers bring their own writer.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    #[default]
    Generic,
    SqlServer,
    Jet,
    Compact,
}

impl Dialect {
    pub fn writer(&self) -> &'static dyn SqlWriter {
        match self {
            Dialect::Generic => &GENERIC,
            Dialect::SqlServer => &SQL_SERVER,
            Dialect::Jet => &JET,
            Dialect::Compact => &COMPACT,
        }
    }

    pub fn name(&self) -> &'static str {
        self.writer().dialect()
    }
}

impl Display for Dialect {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "generic" | "ansi" => Dialect::Generic,
            "sqlserver" | "mssql" => Dialect::SqlServer,
            "jet" | "access" => Dialect::Jet,
            "compact" | "sqlce" => Dialect::Compact,
            _ => return Err(Error::msg(format!("Unknown dialect `{s}`"))),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for dialect in [
            Dialect::Generic,
            Dialect::SqlServer,
            Dialect::Jet,
            Dialect::Compact,
        ] {
            assert_eq!(dialect.name().parse::<Dialect>().ok(), Some(dialect));
        }
        assert!("oracle".parse::<Dialect>().is_err());
    }
}
