//! Optimistic concurrency token for document collections.

use crate::error::{DomainError, DomainResult};

/// Optimistic concurrency expectation for a collection write.
///
/// Collections are read, modified and written back as a whole; a writer that
/// read version `n` must only succeed if nobody else wrote in between.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking (last-write-wins).
    Any,
    /// Require the collection to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }

    pub fn check(self, actual: u64) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "optimistic concurrency check failed (expected: {self:?}, actual: {actual})"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_version_mismatch_is_conflict() {
        assert!(ExpectedVersion::Any.check(7).is_ok());
        assert!(ExpectedVersion::Exact(7).check(7).is_ok());
        match ExpectedVersion::Exact(6).check(7) {
            Err(DomainError::Conflict(_)) => {}
            other => panic!("Expected Conflict, got {other:?}"),
        }
    }
}
