/// A host to probe, with its MX preference (lower is tried first).
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MxCandidate {
    pub host: String,
    pub preference: u16,
}

impl MxCandidate {
    pub fn new(preference: u16, host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            preference,
        }
    }
}
