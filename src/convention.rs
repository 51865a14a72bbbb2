//! Dead-letter topic naming.

/// Maps a source topic to its dead-letter topic.
///
/// Implementations must be pure: the same input always yields the same
/// name. Any `Fn(&str) -> String` closure qualifies.
pub trait DeadLetterTopicNameConvention: Send + Sync {
    fn dead_letter_topic(&self, topic: &str) -> String;
}

impl<F> DeadLetterTopicNameConvention for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn dead_letter_topic(&self, topic: &str) -> String {
        self(topic)
    }
}

/// Appends a fixed suffix to the source topic, e.g. `orders` to `orders-dlt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuffixConvention {
    suffix: String,
}

impl SuffixConvention {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }
}

impl DeadLetterTopicNameConvention for SuffixConvention {
    fn dead_letter_topic(&self, topic: &str) -> String {
        format!("{topic}{}", self.suffix)
    }
}
