//! Inbound operator control commands.

use super::Subjects;
use crate::domain::VenueId;

/// Operator commands consumed by the pipelines and the venue registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    /// Force an immediate reconnect attempt regardless of backoff state.
    Reconnect(VenueId),
    /// Administratively disable a venue.
    Disable(VenueId),
    /// Re-enable a venue.
    Enable(VenueId),
}

impl Subjects {
    /// Parse a control subject (`<root>.control.<verb>.<venue>`) into a
    /// command. Returns `None` for any other subject.
    #[must_use]
    pub fn parse_control(&self, subject: &str) -> Option<ControlCommand> {
        let rest = subject.strip_prefix(self.root())?.strip_prefix('.')?;
        let rest = rest.strip_prefix("control.")?;
        let (verb, venue) = rest.split_once('.')?;
        if venue.is_empty() {
            return None;
        }
        let venue = VenueId::new(venue);
        match verb {
            "reconnect" => Some(ControlCommand::Reconnect(venue)),
            "disable" => Some(ControlCommand::Disable(venue)),
            "enable" => Some(ControlCommand::Enable(venue)),
            _ => None,
        }
    }
}
