//! Transcript sink that logs every entry and mirrors it to a file.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use agrotrade_core::{NegotiationOutcome, TranscriptEntry, TranscriptSink};
use agrotrade_types::PartyId;

/// Logs transcript lines and optionally appends them to a file.
///
/// File errors are logged and then the file is dropped; the run goes on.
pub struct TranscriptLog {
    file: Option<BufWriter<File>>,
}

impl TranscriptLog {
    /// A sink that only logs.
    pub const fn log_only() -> Self {
        Self { file: None }
    }

    /// A sink that also writes to `path`, truncating it.
    pub fn to_file(path: &Path, run_id: Uuid) -> std::io::Result<Self> {
        let mut file = BufWriter::new(File::create(path)?);
        writeln!(file, "# run {run_id} started {}", Utc::now().to_rfc3339())?;
        Ok(Self { file: Some(file) })
    }

    fn write_line(&mut self, line: &str) {
        let Some(file) = self.file.as_mut() else {
            return;
        };
        if let Err(err) = writeln!(file, "{line}").and_then(|()| file.flush()) {
            warn!(error = %err, "transcript file write failed, disabling file output");
            self.file = None;
        }
    }
}

impl TranscriptSink for TranscriptLog {
    fn on_entry(&mut self, counterparty: &PartyId, entry: &TranscriptEntry) {
        info!(%counterparty, speaker = %entry.speaker, text = %entry.text, "transcript");
        self.write_line(&entry.to_string());
    }

    fn on_outcome(&mut self, outcome: &NegotiationOutcome) {
        let line = format!(
            "--- negociação com {} encerrada: {} ({} turnos) ---",
            outcome.counterparty, outcome.reason, outcome.iterations
        );
        self.write_line(&line);
    }
}

#[cfg(test)]
mod tests {
    use agrotrade_core::Speaker;
    use agrotrade_types::TerminationReason;

    use super::*;

    #[test]
    fn writes_entries_and_outcomes_to_file() {
        let path = std::env::temp_dir().join(format!(
            "agrotrade_transcript_{}_{:?}.txt",
            std::process::id(),
            std::thread::current().id(),
        ));
        let sink = TranscriptLog::to_file(&path, Uuid::now_v7());
        assert!(sink.is_ok());
        let Ok(mut sink) = sink else { return };

        let fz1 = PartyId::from("Fz1");
        sink.on_entry(
            &fz1,
            &TranscriptEntry {
                speaker: Speaker::Moderator,
                text: "Iniciando negociação com Fz1".to_owned(),
            },
        );
        sink.on_outcome(&NegotiationOutcome {
            counterparty: fz1,
            reason: TerminationReason::Abandoned,
            iterations: 2,
            settlements: Vec::new(),
            transcript: Vec::new(),
        });
        drop(sink);

        let written = std::fs::read_to_string(&path).unwrap_or_default();
        assert!(written.contains("[Moderador]: Iniciando negociação com Fz1"));
        assert!(written.contains("encerrada: abandoned (2 turnos)"));
        std::fs::remove_file(&path).ok();
    }
}
