use crate::model::Condition;

/// Capability flags record (§9 redesign note): pipeline stages select on
/// these flags, never on the `Condition` string itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CapabilityFlags {
    pub has_state: bool,
    pub has_verify_repair: bool,
}

/// A0: no state, no repair. A1: state, no repair. A2: no state, repair
/// permitted. A3: state and repair permitted.
pub fn capability_flags(condition: Condition) -> CapabilityFlags {
    match condition {
        Condition::A0 => CapabilityFlags {
            has_state: false,
            has_verify_repair: false,
        },
        Condition::A1 => CapabilityFlags {
            has_state: true,
            has_verify_repair: false,
        },
        Condition::A2 => CapabilityFlags {
            has_state: false,
            has_verify_repair: true,
        },
        Condition::A3 => CapabilityFlags {
            has_state: true,
            has_verify_repair: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a0_has_neither() {
        let flags = capability_flags(Condition::A0);
        assert!(!flags.has_state);
        assert!(!flags.has_verify_repair);
    }

    #[test]
    fn a1_has_state_only() {
        let flags = capability_flags(Condition::A1);
        assert!(flags.has_state);
        assert!(!flags.has_verify_repair);
    }

    #[test]
    fn a2_has_repair_only() {
        let flags = capability_flags(Condition::A2);
        assert!(!flags.has_state);
        assert!(flags.has_verify_repair);
    }

    #[test]
    fn a3_has_both() {
        let flags = capability_flags(Condition::A3);
        assert!(flags.has_state);
        assert!(flags.has_verify_repair);
    }
}
