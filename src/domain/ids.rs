//! Integer row identifiers

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            pub const fn value(&self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

row_id!(
    /// Identifier of a workflow definition
    WorkflowId
);
row_id!(
    /// Identifier of a source definition
    SourceId
);
row_id!(
    /// Identifier of an outcome definition
    OutcomeId
);
row_id!(FormFieldId);
row_id!(
    /// Identifier of a workflow run
    InstanceId
);
row_id!(SourceInstanceId);
row_id!(OutcomeInstanceId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_value() {
        let id = InstanceId::new(42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(id.value(), 42);
    }

    #[test]
    fn test_serializes_as_integer() {
        let id = WorkflowId::from(3);
        assert_eq!(serde_json::to_string(&id).unwrap(), "3");

        let parsed: WorkflowId = serde_json::from_str("3").unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_ordering() {
        assert!(SourceId::new(1) < SourceId::new(2));
    }
}
