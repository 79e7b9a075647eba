//! Consent and violation accumulation

use std::fmt;

/// Outcome of a visibility, usability or validity check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Consent {
    /// Permitted
    Allow,
    /// Refused, with the reason shown to the user
    Veto(String),
}

impl Consent {
    /// Veto from an optional reason; no reason means allow
    pub fn from_reason(reason: Option<String>) -> Self {
        match reason {
            Some(reason) if !reason.is_empty() => Consent::Veto(reason),
            _ => Consent::Allow,
        }
    }

    /// Whether permitted
    pub fn is_allowed(&self) -> bool {
        matches!(self, Consent::Allow)
    }

    /// Whether refused
    pub fn is_vetoed(&self) -> bool {
        !self.is_allowed()
    }

    /// Reason for a veto
    pub fn reason(&self) -> Option<&str> {
        match self {
            Consent::Allow => None,
            Consent::Veto(reason) => Some(reason),
        }
    }
}

impl fmt::Display for Consent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Consent::Allow => f.write_str("Allowed"),
            Consent::Veto(reason) => write!(f, "Vetoed: {}", reason),
        }
    }
}

/// Collects every violation found by a sequence of checks
#[derive(Debug, Clone, Default)]
pub struct InteractionBuffer {
    reasons: Vec<String>,
}

impl InteractionBuffer {
    /// Empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation; empty reasons are ignored
    pub fn append(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        if !reason.is_empty() {
            self.reasons.push(reason);
        }
    }

    /// Record the veto of a consent
    pub fn append_consent(&mut self, consent: &Consent) {
        if let Some(reason) = consent.reason() {
            self.append(reason);
        }
    }

    /// Whether no violation was recorded
    pub fn is_empty(&self) -> bool {
        self.reasons.is_empty()
    }

    /// Recorded violations
    pub fn reasons(&self) -> &[String] {
        &self.reasons
    }

    /// One consent for everything recorded
    pub fn to_consent(&self) -> Consent {
        if self.reasons.is_empty() {
            Consent::Allow
        } else {
            Consent::Veto(self.reasons.join("; "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_joins_every_reason() {
        let mut buf = InteractionBuffer::new();
        assert_eq!(buf.to_consent(), Consent::Allow);
        buf.append("Mandatory");
        buf.append("");
        buf.append_consent(&Consent::Veto("Too long, maximum 5 characters".into()));
        buf.append_consent(&Consent::Allow);
        assert_eq!(buf.reasons().len(), 2);
        assert_eq!(
            buf.to_consent().reason(),
            Some("Mandatory; Too long, maximum 5 characters")
        );
    }

    #[test]
    fn test_consent_from_reason() {
        assert!(Consent::from_reason(None).is_allowed());
        assert!(Consent::from_reason(Some(String::new())).is_allowed());
        assert!(Consent::from_reason(Some("No".into())).is_vetoed());
    }
}
