//! Route handlers.
//!
//! Handlers receive the immutable [`RequestContext`](courseware_core::RequestContext)
//! built by the pipeline. Authentication and field validation have already
//! run for the operations that need them; handlers only deal with store
//! lookups, ownership and shaping responses.

pub mod courses;
pub mod users;

use courseware_core::CoursewareError;
use courseware_store::StoreError;

/// Client message for a store failure. The cause is kept as the error source.
pub const STORE_FAILURE_MESSAGE: &str = "Store operation failed";

fn store_error(error: StoreError) -> CoursewareError {
    CoursewareError::internal_with_source(STORE_FAILURE_MESSAGE, error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use courseware_core::ErrorCategory;

    #[test]
    fn test_store_errors_are_internal() {
        let error = store_error(StoreError::Unavailable("connection reset".into()));
        assert_eq!(error.category(), ErrorCategory::Internal);
        assert_eq!(error.client_message(), STORE_FAILURE_MESSAGE);
        assert!(!error.to_body().to_string().contains("connection reset"));
    }
}
