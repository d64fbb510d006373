use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! id_type {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(value: Uuid) -> Self {
                Self(value)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

// Ids that arrive from spreadsheets or remote providers are free text.
macro_rules! text_id_type {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: &str) -> Result<Self, CoreError> {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(CoreError::EmptyId);
                }
                Ok(Self(trimmed.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }
    };
}

id_type!(AlertId);
text_id_type!(ShipmentId);
text_id_type!(CallId);

impl ShipmentId {
    pub fn generate() -> Self {
        Self(format!("import-{}", Uuid::new_v4().simple()))
    }
}

impl CallId {
    /// Id for a call record that never reached the transport.
    pub fn local() -> Self {
        Self(format!("local_{}", Uuid::new_v4().simple()))
    }

    pub fn is_local(&self) -> bool {
        self.0.starts_with("local_")
    }
}

#[cfg(test)]
mod tests {
    use super::{CallId, ShipmentId};
    use crate::error::CoreError;

    #[test]
    fn text_ids_trim_and_reject_blank() {
        assert_eq!(ShipmentId::new("  SH-001 ").unwrap().as_str(), "SH-001");
        assert_eq!(ShipmentId::new("   ").unwrap_err(), CoreError::EmptyId);
    }

    #[test]
    fn generated_ids_are_distinct() {
        let a = ShipmentId::generate();
        let b = ShipmentId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("import-"));
    }

    #[test]
    fn local_call_ids_are_marked() {
        assert!(CallId::local().is_local());
        assert!(!CallId::new("CA123").unwrap().is_local());
    }
}
