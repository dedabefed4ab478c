use rolegate_core::engine::Decision;
use rolegate_core::entity::{Operation, SubjectId};

fn outcome(decision: &Decision) -> &'static str {
    match decision {
        Decision::Denied => "denied",
        Decision::GrantedFull => "granted_full",
        Decision::GrantedFields(_) => "granted_fields",
    }
}

pub fn audit_decision(
    subject: SubjectId,
    object_type: &str,
    object_id: Option<i64>,
    operation: Operation,
    decision: &Decision,
) {
    tracing::info!(
        target: "audit",
        event = "authorize",
        subject = subject.value(),
        object_type = object_type,
        object_id = object_id.map(|id| id.to_string()).unwrap_or_default(),
        operation = operation.as_str(),
        outcome = outcome(decision),
        granted_fields = decision.fields().map_or(0, |fields| fields.len()),
        "authorization decided"
    );
}

pub fn audit_authorize_failure(
    subject: SubjectId,
    object_type: &str,
    operation: Operation,
    reason: &str,
) {
    tracing::warn!(
        target: "audit",
        event = "authorize_failure",
        subject = subject.value(),
        object_type = object_type,
        operation = operation.as_str(),
        reason = reason,
        "authorization could not be decided"
    );
}
