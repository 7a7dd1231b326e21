//! Built-in function calls

use crate::Expression;
use cimql_diagnostics::{CIMQL0001, QueryError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Built-in functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionKind {
    ClassName,
    NamespaceName,
    HostName,
    ModelPath,
    ObjectPath,
    UpperCase,
    StringToUint,
    StringToSint,
    StringToReal,
    StringToNumeric,
    NumericToString,
    ReferenceToString,
    DateTimeToMicrosecond,
    MicrosecondToTimestamp,
    MicrosecondToInterval,
    DateTime,
    CurrentDateTime,
}

impl FunctionKind {
    const ALL: [FunctionKind; 17] = [
        Self::ClassName,
        Self::NamespaceName,
        Self::HostName,
        Self::ModelPath,
        Self::ObjectPath,
        Self::UpperCase,
        Self::StringToUint,
        Self::StringToSint,
        Self::StringToReal,
        Self::StringToNumeric,
        Self::NumericToString,
        Self::ReferenceToString,
        Self::DateTimeToMicrosecond,
        Self::MicrosecondToTimestamp,
        Self::MicrosecondToInterval,
        Self::DateTime,
        Self::CurrentDateTime,
    ];

    /// Function name as written in queries
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ClassName => "CLASSNAME",
            Self::NamespaceName => "NAMESPACENAME",
            Self::HostName => "HOSTNAME",
            Self::ModelPath => "MODELPATH",
            Self::ObjectPath => "OBJECTPATH",
            Self::UpperCase => "UPPERCASE",
            Self::StringToUint => "STRINGTOUINT",
            Self::StringToSint => "STRINGTOSINT",
            Self::StringToReal => "STRINGTOREAL",
            Self::StringToNumeric => "STRINGTONUMERIC",
            Self::NumericToString => "NUMERICTOSTRING",
            Self::ReferenceToString => "REFERENCETOSTRING",
            Self::DateTimeToMicrosecond => "DATETIMETOMICROSECOND",
            Self::MicrosecondToTimestamp => "MICROSECONDTOTIMESTAMP",
            Self::MicrosecondToInterval => "MICROSECONDTOINTERVAL",
            Self::DateTime => "DATETIME",
            Self::CurrentDateTime => "CURRENTDATETIME",
        }
    }

    /// Accepted argument count, inclusive
    pub const fn arity(&self) -> (usize, usize) {
        match self {
            Self::ClassName
            | Self::NamespaceName
            | Self::HostName
            | Self::ModelPath
            | Self::ObjectPath => (0, 1),
            Self::CurrentDateTime => (0, 0),
            _ => (1, 1),
        }
    }
}

impl FromStr for FunctionKind {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                QueryError::syntax(CIMQL0001, format!("Function: {} is not a supported function", s))
            })
    }
}

impl fmt::Display for FunctionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A function call with its argument expressions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    kind: FunctionKind,
    #[serde(default)]
    args: Vec<Expression>,
}

impl Function {
    pub fn new(kind: FunctionKind, args: Vec<Expression>) -> Self {
        Self { kind, args }
    }

    /// Look the function up by name; unknown names are a syntax error
    pub fn named(name: &str, args: Vec<Expression>) -> Result<Self, QueryError> {
        Ok(Self::new(name.parse()?, args))
    }

    pub fn kind(&self) -> FunctionKind {
        self.kind
    }

    pub fn args(&self) -> &[Expression] {
        &self.args
    }

    pub(crate) fn args_mut(&mut self) -> &mut [Expression] {
        &mut self.args
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.kind)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", arg)?;
        }
        write!(f, ")")
    }
}
