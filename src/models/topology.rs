/// Separator between protocol labels in a combined verification annotation
pub const VERIFICATION_SEPARATOR: &str = "; ";

/// One port row of a device sheet asserting a link to a neighbor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimedAdjacency {
    pub row: u32,
    pub local_interface: String,
    pub neighbor: String,
    pub remote_interface: String,
}

impl ClaimedAdjacency {
    /// Rows with any blank field are skipped, not treated as errors
    pub fn is_eligible(&self) -> bool {
        !self.local_interface.trim().is_empty()
            && !self.neighbor.trim().is_empty()
            && !self.remote_interface.trim().is_empty()
    }
}

/// A claim reduced to the same canonical keys as `NeighborRecord`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalClaim {
    pub neighbor: String,
    pub local_short_if: String,
    pub remote_short_if: String,
}

/// Per-protocol outcome for one claim
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationResult {
    pub cdp: Option<String>,
    pub lldp: Option<String>,
}

impl VerificationResult {
    /// Combined annotation, or `None` when neither protocol corroborates
    pub fn annotation(&self) -> Option<String> {
        let labels: Vec<&str> = [self.cdp.as_deref(), self.lldp.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        if labels.is_empty() {
            None
        } else {
            Some(labels.join(VERIFICATION_SEPARATOR))
        }
    }
}
