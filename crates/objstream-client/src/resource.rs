//! Object identity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one object, optionally pinned to a generation.
///
/// The channel resolves an unset generation to the live one at open time and
/// pins every subsequent read to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceId {
    pub bucket: String,
    pub object: String,
    /// Generation to read; `None` means the live generation at open.
    pub generation: Option<i64>,
}

impl ResourceId {
    pub fn new(bucket: impl Into<String>, object: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            object: object.into(),
            generation: None,
        }
    }

    pub fn with_generation(mut self, generation: i64) -> Self {
        self.generation = Some(generation);
        self
    }

    /// Bucket name in the v2 resource form the wire expects.
    pub fn v2_bucket(&self) -> String {
        format!("projects/_/buckets/{}", self.bucket)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gs://{}/{}", self.bucket, self.object)
    }
}
