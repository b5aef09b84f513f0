//! Control-flow signals exchanged between casters, arguments, the runner
//! and the command dispatcher.

use crate::conversation::Message;
use crate::value::Value;

/// A control-flow outcome.
///
/// Flags are created on demand and consumed by the nearest layer that
/// understands them. `Cancel`, `Retry` and `Continue` end an argument run;
/// `Fail` is a cast failure carrying a reason.
#[derive(Debug, Clone, PartialEq)]
pub enum Flag {
    /// Stop the command silently.
    Cancel,
    /// Stop the command and handle this message as a fresh command invocation.
    Retry(Message),
    /// A cast failed. The payload explains why.
    Fail(Value),
    /// Stop the command and run another one with the remaining input.
    Continue {
        command: String,
        ignore_checks: bool,
        /// Input for the next command. Filled with the unparsed remainder
        /// by the runner when left empty.
        rest: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagKind {
    Cancel,
    Retry,
    Fail,
    Continue,
}

impl Flag {
    pub fn cancel() -> Self {
        Flag::Cancel
    }

    pub fn retry(message: Message) -> Self {
        Flag::Retry(message)
    }

    pub fn fail(value: impl Into<Value>) -> Self {
        Flag::Fail(value.into())
    }

    /// Continue into `command` with the remaining input.
    pub fn continue_to(command: impl Into<String>) -> Self {
        Flag::continue_with(command, false, None)
    }

    pub fn continue_with(
        command: impl Into<String>,
        ignore_checks: bool,
        rest: Option<String>,
    ) -> Self {
        Flag::Continue {
            command: command.into(),
            ignore_checks,
            rest,
        }
    }

    pub fn kind(&self) -> FlagKind {
        match self {
            Flag::Cancel => FlagKind::Cancel,
            Flag::Retry(_) => FlagKind::Retry,
            Flag::Fail(_) => FlagKind::Fail,
            Flag::Continue { .. } => FlagKind::Continue,
        }
    }

    /// Whether `outcome` is a flag of the given kind.
    pub fn is(outcome: &Outcome, kind: FlagKind) -> bool {
        matches!(outcome, Outcome::Flag(flag) if flag.kind() == kind)
    }

    /// Whether this flag ends an argument run.
    pub fn is_short_circuit(&self) -> bool {
        !matches!(self, Flag::Fail(_))
    }
}

/// What casters, arguments and generators hand to each other.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Value(Value),
    Flag(Flag),
}

impl Outcome {
    pub fn null() -> Self {
        Outcome::Value(Value::Null)
    }

    /// `Null` and `Fail` are cast failures.
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Value(Value::Null) | Outcome::Flag(Flag::Fail(_)))
    }

    pub fn is_short_circuit(&self) -> bool {
        matches!(self, Outcome::Flag(flag) if flag.is_short_circuit())
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Outcome::Value(value) => Some(value),
            Outcome::Flag(_) => None,
        }
    }

    pub fn flag(&self) -> Option<&Flag> {
        match self {
            Outcome::Flag(flag) => Some(flag),
            Outcome::Value(_) => None,
        }
    }

    /// The value, with every flag collapsed to `Null`.
    pub fn into_value(self) -> Value {
        match self {
            Outcome::Value(value) => value,
            Outcome::Flag(_) => Value::Null,
        }
    }

    /// Text to feed into the next caster of a pipeline.
    pub fn as_input(&self) -> String {
        self.value().map(Value::as_input).unwrap_or_default()
    }
}

impl From<Value> for Outcome {
    fn from(value: Value) -> Self {
        Outcome::Value(value)
    }
}

impl From<Flag> for Outcome {
    fn from(flag: Flag) -> Self {
        Outcome::Flag(flag)
    }
}
