//! The per-negotiation transcript and the sinks that mirror it.

use core::fmt;

use serde::{Deserialize, Serialize};

use agrotrade_types::{PartyId, Role};

use crate::scheduler::NegotiationOutcome;

/// Who produced a transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Speaker {
    /// The scheduler itself (opening line, timeouts).
    Moderator,
    /// A negotiating party.
    Party {
        /// The speaking party.
        id: PartyId,
        /// Its role in this negotiation.
        role: Role,
    },
}

impl Speaker {
    /// The role of a party speaker; `None` for the moderator.
    pub const fn role(&self) -> Option<Role> {
        match self {
            Self::Moderator => None,
            Self::Party { role, .. } => Some(*role),
        }
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Moderator => f.write_str("Moderador"),
            Self::Party { id, .. } => write!(f, "{id}"),
        }
    }
}

/// One line of the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Who spoke.
    pub speaker: Speaker,
    /// The finalized text, including any action outcome.
    pub text: String,
}

impl fmt::Display for TranscriptEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]: {}", self.speaker, self.text)
    }
}

/// The ordered entries of the current negotiation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    /// Start a fresh transcript with the opening line for `counterparty`.
    pub fn opening(counterparty: &PartyId) -> Self {
        Self {
            entries: vec![TranscriptEntry {
                speaker: Speaker::Moderator,
                text: format!("Iniciando negociação com {counterparty}"),
            }],
        }
    }

    /// Append an entry.
    pub fn push(&mut self, entry: TranscriptEntry) {
        self.entries.push(entry);
    }

    /// All entries in order.
    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    /// The most recent entry.
    pub fn latest(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the transcript is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Observer of transcript activity.
///
/// Receives every entry as it is appended and every outcome as a
/// negotiation ends. Sinks must not fail the run; implementations log
/// their own I/O errors.
pub trait TranscriptSink: Send {
    /// Called after an entry is appended.
    fn on_entry(&mut self, counterparty: &PartyId, entry: &TranscriptEntry);

    /// Called when a negotiation terminates.
    fn on_outcome(&mut self, _outcome: &NegotiationOutcome) {}
}

/// A sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSink;

impl TranscriptSink for NoOpSink {
    fn on_entry(&mut self, _counterparty: &PartyId, _entry: &TranscriptEntry) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_line_names_counterparty() {
        let transcript = Transcript::opening(&PartyId::from("Fz2"));
        assert_eq!(transcript.len(), 1);
        assert_eq!(
            transcript.latest().map(ToString::to_string),
            Some("[Moderador]: Iniciando negociação com Fz2".to_owned())
        );
    }

    #[test]
    fn party_entries_render_with_name() {
        let entry = TranscriptEntry {
            speaker: Speaker::Party {
                id: PartyId::from("Empresario"),
                role: Role::Central,
            },
            text: "Ofereço R$14 por kg.".to_owned(),
        };
        assert_eq!(entry.to_string(), "[Empresario]: Ofereço R$14 por kg.");
        assert_eq!(entry.speaker.role(), Some(Role::Central));
        assert_eq!(Speaker::Moderator.role(), None);
    }
}
