//! Strict parser for the text form of a transaction command.
//!
//! ```text
//! Comprador: <id>, Vendedor: <id>, Item: <name>, Quantidade: <number>kg, Preço Total: <number>
//! ```
//!
//! Matching is case-insensitive and numbers accept `.` or `,` as the
//! decimal separator. Anything else fails closed with
//! [`CommandError::Malformed`]; there is no fuzzy recovery.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

use agrotrade_types::{ErrorKind, PartyId, TransactionCommand};

/// Errors produced while parsing a transaction command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// The input does not follow the command format.
    #[error("malformed transaction command: {reason}")]
    Malformed {
        /// What was wrong with the input.
        reason: String,
    },
}

impl CommandError {
    /// Map this error onto the shared error taxonomy.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Malformed { .. } => ErrorKind::MalformedCommand,
        }
    }

    fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }
}

/// Full-line pattern of a transaction command.
static COMMAND_REGEX: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*comprador\s*:\s*(?P<buyer>[^,]+?)\s*,\s*vendedor\s*:\s*(?P<seller>[^,]+?)\s*,\s*item\s*:\s*(?P<item>[^,]+?)\s*,\s*quantidade\s*:\s*(?P<quantity>\d+(?:[.,]\d+)?)\s*kg\s*,\s*preço\s+total\s*:\s*(?:r\$\s*)?(?P<price>\d+(?:[.,]\d+)?)\s*\.?\s*$",
    )
});

/// Where a command starts inside a line of free text.
static ANNOUNCE_REGEX: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"(?i)\bcomprador\s*:"));

/// Parse one line into a [`TransactionCommand`].
///
/// # Errors
///
/// Returns [`CommandError::Malformed`] if the line does not match the
/// command format exactly.
pub fn parse_transaction_command(line: &str) -> Result<TransactionCommand, CommandError> {
    let regex = COMMAND_REGEX
        .as_ref()
        .map_err(|err| CommandError::malformed(format!("command pattern failed to compile: {err}")))?;
    let captures = regex
        .captures(line)
        .ok_or_else(|| CommandError::malformed(format!("'{}' does not match the command format", line.trim())))?;

    let field = |name: &str| {
        captures
            .name(name)
            .map(|m| m.as_str())
            .ok_or_else(|| CommandError::malformed(format!("missing field '{name}'")))
    };

    Ok(TransactionCommand {
        buyer: PartyId::new(field("buyer")?),
        seller: PartyId::new(field("seller")?),
        item: field("item")?.to_owned(),
        quantity: parse_number(field("quantity")?)?,
        total_price: parse_number(field("price")?)?,
    })
}

/// Find and parse the first line of `text` that announces a command.
///
/// A line announces a command when it mentions `comprador:` in any case.
/// The line is parsed strictly from that point on. Returns `None` when no
/// line announces one.
pub fn find_transaction_command(text: &str) -> Option<Result<TransactionCommand, CommandError>> {
    let announce = match ANNOUNCE_REGEX.as_ref() {
        Ok(regex) => regex,
        Err(err) => {
            return Some(Err(CommandError::malformed(format!(
                "announce pattern failed to compile: {err}"
            ))));
        }
    };
    text.lines().find_map(|line| {
        announce
            .find(line)
            .map(|found| parse_transaction_command(line.get(found.start()..).unwrap_or(line)))
    })
}

fn parse_number(raw: &str) -> Result<Decimal, CommandError> {
    Decimal::from_str(&raw.replace(',', "."))
        .map_err(|err| CommandError::malformed(format!("invalid number '{raw}': {err}")))
}
