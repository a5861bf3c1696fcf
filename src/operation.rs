//! Operation identifiers and invocation notifications.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use uuid::Uuid;

/// Stable name of an instrumented operation.
///
/// Chosen once at wrap time and cloned into every notification, so the
/// backing string is shared rather than copied per call.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId(Arc<str>);

impl OperationId {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OperationId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for OperationId {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl Borrow<str> for OperationId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for OperationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OperationId({:?})", &*self.0)
    }
}

impl Serialize for OperationId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Notification that one invocation of an instrumented operation completed.
///
/// Carries no identity beyond its payload; two events for the same
/// operation are interchangeable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallEvent {
    pub operation: OperationId,
    /// Optional token tying the call to an outer request.
    pub correlation_id: Option<Uuid>,
}

impl CallEvent {
    pub fn new(operation: OperationId) -> Self {
        Self {
            operation,
            correlation_id: None,
        }
    }

    pub fn with_correlation(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_operation_id_looks_up_by_str() {
        let mut map = HashMap::new();
        map.insert(OperationId::from("sayHello"), 3u64);

        assert_eq!(map.get("sayHello"), Some(&3));
        assert_eq!(map.get("doWork"), None);
    }

    #[test]
    fn test_operation_id_serializes_as_plain_string() {
        let id = OperationId::from("doWork");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"doWork\"");
        assert_eq!(id.to_string(), "doWork");
    }

    #[test]
    fn test_call_event_correlation() {
        let token = Uuid::new_v4();
        let event = CallEvent::new("sayHello".into()).with_correlation(token);

        assert_eq!(event.operation.as_str(), "sayHello");
        assert_eq!(event.correlation_id, Some(token));
        assert_eq!(CallEvent::new("sayHello".into()).correlation_id, None);
    }
}
