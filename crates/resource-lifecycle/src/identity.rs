//! Physical identity policy.

use cfn_resource_core::{InvocationContext, Operation, ResourceRequest};

/// Physical id reported for every Create that fails.
///
/// A later Delete carrying this id refers to a resource that never existed
/// and is acknowledged without running the handler's result through.
pub const CREATE_FAILED_PHYSICAL_ID: &str = "aws-custom-resources:CREATE_FAILED_PHYSICAL_ID";

/// Resolve the physical id to report.
///
/// A non-empty hint wins. Otherwise Update and Delete keep the existing id
/// and Create falls back to the log stream name, which is unique per
/// function instance.
pub fn resolve_physical_id(
    hint: Option<&str>,
    request: &ResourceRequest,
    context: &InvocationContext,
) -> String {
    if let Some(hint) = hint.filter(|h| !h.is_empty()) {
        return hint.to_string();
    }

    match &request.operation {
        Operation::Update {
            physical_resource_id,
            ..
        }
        | Operation::Delete {
            physical_resource_id,
        } => physical_resource_id.clone(),
        Operation::Create => context.log_stream_name.clone(),
    }
}

/// Check whether this is a Delete of a resource whose Create failed.
///
/// Matches on the exact sentinel string only.
pub fn is_delete_of_failed_create(request: &ResourceRequest) -> bool {
    matches!(
        &request.operation,
        Operation::Delete { physical_resource_id } if physical_resource_id == CREATE_FAILED_PHYSICAL_ID
    )
}

/// Physical id hint for a failed invocation.
pub fn failure_physical_id_hint(request: &ResourceRequest) -> Option<String> {
    match request.operation {
        Operation::Create => Some(CREATE_FAILED_PHYSICAL_ID.to_string()),
        _ => None,
    }
}
