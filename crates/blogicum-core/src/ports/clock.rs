use chrono::{DateTime, Utc};

/// Source of the current time, injected so visibility checks can be tested.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
