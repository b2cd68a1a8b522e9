use crate::ciflow::labels::LabelPolicy;

/// Configuration shared by all event handlers.
pub struct CiflowContext {
    pub policy: LabelPolicy,
}

impl CiflowContext {
    pub fn new(policy: LabelPolicy) -> Self {
        Self { policy }
    }
}
