use serde::{Deserialize, Serialize};

/// An opaque payload handed down from the simulated application layer.
///
/// Messages are created by the application (or a scenario's `app_send`
/// action) and consumed once handed to the sender; they have no identity
/// beyond their data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    data: String,
}

impl Message {
    pub fn new(data: impl Into<String>) -> Self {
        Self { data: data.into() }
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn into_data(self) -> String {
        self.data
    }
}

impl From<&str> for Message {
    fn from(data: &str) -> Self {
        Self::new(data)
    }
}
