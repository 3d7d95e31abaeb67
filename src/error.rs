//! Error types surfaced by the bus.
//!
//! Only subscription management can fail. Publishing never returns an error:
//! handlers whose signature does not fit the published arguments are skipped,
//! and a handler that panics does so on the task it runs on.
//!
//! - [`BusError::InvalidCallable`]: a value could not be wrapped as a callable.
//! - [`BusError::TopicEmpty`]: unsubscribe on a topic without handlers.
//! - [`BusError::Aggregate`]: per-item failures collected by batch helpers.
//!
//! Like the rest of the crate, errors provide `as_label`/`as_message` helpers
//! for logs and metrics.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T, E = BusError> = std::result::Result<T, E>;

/// # Errors produced by subscription management.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum BusError {
    /// The value handed to a subscribe operation cannot be used as a callable.
    ///
    /// The registry is left unchanged.
    #[error("invalid callable: {reason}")]
    InvalidCallable {
        /// Why the value was refused.
        reason: String,
    },

    /// Unsubscribe was called on a topic that has no handlers.
    #[error("topic {topic:?} has no subscribers")]
    TopicEmpty {
        /// The topic that was looked up.
        topic: String,
    },

    /// Several items of a batch failed; every other item was still applied.
    #[error("{} subscription error(s): {}", .errors.len(), join_errors(.errors))]
    Aggregate {
        /// Per-item errors, in the order the items were visited.
        errors: Vec<BusError>,
    },
}

impl BusError {
    pub(crate) fn invalid_callable(reason: impl Into<String>) -> Self {
        BusError::InvalidCallable {
            reason: reason.into(),
        }
    }

    pub(crate) fn topic_empty(topic: &str) -> Self {
        BusError::TopicEmpty {
            topic: topic.to_owned(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use topicbus::BusError;
    ///
    /// let err = BusError::TopicEmpty { topic: "orders".into() };
    /// assert_eq!(err.as_label(), "bus_topic_empty");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BusError::InvalidCallable { .. } => "bus_invalid_callable",
            BusError::TopicEmpty { .. } => "bus_topic_empty",
            BusError::Aggregate { .. } => "bus_aggregate",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            BusError::InvalidCallable { reason } => format!("invalid callable: {reason}"),
            BusError::TopicEmpty { topic } => format!("no subscribers on topic={topic:?}"),
            BusError::Aggregate { errors } => {
                format!("{} errors: {}", errors.len(), join_errors(errors))
            }
        }
    }

    /// True for [`BusError::TopicEmpty`].
    pub fn is_topic_empty(&self) -> bool {
        matches!(self, BusError::TopicEmpty { .. })
    }

    /// Per-item errors for [`BusError::Aggregate`], or the error itself otherwise.
    pub fn errors(&self) -> Vec<&BusError> {
        match self {
            BusError::Aggregate { errors } => errors.iter().collect(),
            other => vec![other],
        }
    }
}

fn join_errors(errors: &[BusError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_stable() {
        assert_eq!(
            BusError::invalid_callable("nope").as_label(),
            "bus_invalid_callable"
        );
        assert_eq!(BusError::topic_empty("t").as_label(), "bus_topic_empty");
        assert_eq!(
            BusError::Aggregate { errors: vec![] }.as_label(),
            "bus_aggregate"
        );
    }

    #[test]
    fn aggregate_lists_every_item() {
        let err = BusError::Aggregate {
            errors: vec![
                BusError::invalid_callable("first"),
                BusError::topic_empty("second"),
            ],
        };
        let text = err.to_string();
        assert!(text.starts_with("2 subscription error(s)"));
        assert!(text.contains("invalid callable: first"));
        assert!(text.contains("\"second\""));
        assert_eq!(err.errors().len(), 2);
    }

    #[test]
    fn topic_empty_predicate() {
        assert!(BusError::topic_empty("").is_topic_empty());
        assert!(!BusError::invalid_callable("x").is_topic_empty());
    }
}
