use serde::{Deserialize, Serialize};

/// Result of a business operation as shown to a player: a success flag and
/// the ordered lines to print.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub success: bool,
    pub messages: Vec<String>,
}

impl Outcome {
    pub fn success<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { success: true, messages: messages.into_iter().map(Into::into).collect() }
    }

    pub fn failure<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { success: false, messages: messages.into_iter().map(Into::into).collect() }
    }
}
