//! End-of-run report.

use core::fmt;

use agrotrade_ledger::Ledger;

use crate::scheduler::RunSummary;

/// Final state of a run, printable as plain text.
#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
    ledger: &'a Ledger,
    summary: &'a RunSummary,
}

impl<'a> Report<'a> {
    /// Build a report over the final ledger and the run outcomes.
    pub const fn new(ledger: &'a Ledger, summary: &'a RunSummary) -> Self {
        Self { ledger, summary }
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Resultado das negociações ===")?;
        for outcome in &self.summary.outcomes {
            writeln!(
                f,
                "{}: {} após {} turnos, {} transação(ões)",
                outcome.counterparty,
                outcome.reason,
                outcome.iterations,
                outcome.settlements.len()
            )?;
        }

        writeln!(f, "\n=== Estado final ===")?;
        for (party, account) in self.ledger.accounts() {
            writeln!(f, "{party}: saldo R${:.2}", account.balance)?;
            for (good, qty) in &account.stock {
                writeln!(f, "  estoque {good}: {qty}")?;
            }
            for (category, items) in &account.inventory {
                if !items.is_empty() {
                    writeln!(f, "  {}: {}", category.label(), items.join(", "))?;
                }
            }
            for (parcel, state) in &account.parcels {
                writeln!(f, "  parcela {parcel}: {state}")?;
            }
            if account.total_yield > 0 || account.total_pollution > 0 {
                writeln!(
                    f,
                    "  produtividade total: {}, poluição total: {}",
                    account.total_yield, account.total_pollution
                )?;
            }
        }

        writeln!(f, "\n=== Transações ===")?;
        if self.ledger.transactions().is_empty() {
            writeln!(f, "nenhuma")?;
        }
        for record in self.ledger.transactions() {
            writeln!(f, "{record}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use agrotrade_ledger::Account;
    use agrotrade_types::{PartyId, TerminationReason};

    use super::*;
    use crate::scheduler::NegotiationOutcome;

    #[test]
    fn lists_outcomes_balances_and_empty_history() {
        let mut ledger = Ledger::new(PartyId::from("Empresario"), Account::new(dec!(10000)));
        let opened = ledger.open_account(
            PartyId::from("Fz1"),
            Account::new(dec!(0)).with_stock("Soja", dec!(500)),
        );
        assert!(opened.is_ok());
        let summary = RunSummary {
            outcomes: vec![NegotiationOutcome {
                counterparty: PartyId::from("Fz1"),
                reason: TerminationReason::Abandoned,
                iterations: 4,
                settlements: Vec::new(),
                transcript: Vec::new(),
            }],
        };

        let text = Report::new(&ledger, &summary).to_string();
        assert!(text.contains("Fz1: abandoned após 4 turnos"));
        assert!(text.contains("Empresario: saldo R$10000.00"));
        assert!(text.contains("estoque Soja: 500"));
        assert!(text.contains("nenhuma"));
    }
}
