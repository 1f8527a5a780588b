use sha2::{Digest, Sha256};
use transeval_core::model::IssueType;

/// Stable id for an LLM-reported issue missing its own `id` (§4.7), derived
/// from `(type, rationale)` so the same defect reported twice hashes to the
/// same id.
pub fn stable_issue_id(issue_type: IssueType, rationale: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{issue_type:?}").as_bytes());
    hasher.update(b"\0");
    hasher.update(rationale.as_bytes());
    let digest = hasher.finalize();
    format!("llm:{}", hex::encode(&digest[..8]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_type_and_rationale_hash_identically() {
        let a = stable_issue_id(IssueType::Omission, "dropped a clause");
        let b = stable_issue_id(IssueType::Omission, "dropped a clause");
        assert_eq!(a, b);
    }

    #[test]
    fn different_rationale_hashes_differently() {
        let a = stable_issue_id(IssueType::Omission, "dropped a clause");
        let b = stable_issue_id(IssueType::Omission, "dropped a different clause");
        assert_ne!(a, b);
    }
}
