use std::fmt;

/// Logical column types understood by the engine.
///
/// Temporal representations follow the engine's storage conventions:
/// `Date` is days since the Unix epoch, `Time` is microseconds since
/// midnight, `Timestamp` is microseconds since the Unix epoch and
/// `TimestampSeconds` is whole seconds since the Unix epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LogicalType {
    Boolean,
    BigInt,
    Double,
    Date,
    Time,
    Timestamp,
    TimestampSeconds,
    Varchar,
}

impl LogicalType {
    pub fn is_numeric(self) -> bool {
        matches!(self, LogicalType::BigInt | LogicalType::Double)
    }

    pub fn is_temporal(self) -> bool {
        matches!(
            self,
            LogicalType::Date
                | LogicalType::Time
                | LogicalType::Timestamp
                | LogicalType::TimestampSeconds
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            LogicalType::Boolean => "BOOLEAN",
            LogicalType::BigInt => "BIGINT",
            LogicalType::Double => "DOUBLE",
            LogicalType::Date => "DATE",
            LogicalType::Time => "TIME",
            LogicalType::Timestamp => "TIMESTAMP",
            LogicalType::TimestampSeconds => "TIMESTAMP_S",
            LogicalType::Varchar => "VARCHAR",
        }
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
