//! LLM response parsing into negotiation replies.
//!
//! Reasoning models may prefix their answer with a `<think>` block, which
//! is dropped. Tool-using parties are asked for a JSON object holding the
//! spoken message and an optional action; text-only parties answer in
//! plain text. A JSON answer that cannot be recovered is kept as plain
//! text, so the party still speaks.

use serde::Deserialize;
use tracing::debug;

use agrotrade_core::Reply;
use agrotrade_core::command::{CommandError, parse_transaction_command};
use agrotrade_types::NegotiationAction;

/// Shape of a tool-using party's JSON answer.
#[derive(Debug, Deserialize)]
struct RawReply {
    #[serde(default)]
    message: String,
    #[serde(default)]
    action: Option<serde_json::Value>,
}

/// Parse raw LLM output into a [`Reply`].
pub fn parse_reply(raw: &str, tool_using: bool) -> Reply {
    let cleaned = strip_reasoning(raw).trim();
    if !tool_using {
        return Reply::text(cleaned);
    }

    match try_parse(cleaned) {
        Some(parsed) => Reply {
            text: parsed.message.trim().to_owned(),
            action: parsed.action.filter(|v| !v.is_null()).map(convert_action),
        },
        None => {
            debug!(raw_response = cleaned, "reply is not JSON, keeping it as text");
            Reply::text(cleaned)
        }
    }
}

/// Keep only what follows the last `</think>` tag.
fn strip_reasoning(raw: &str) -> &str {
    raw.rfind("</think>")
        .and_then(|pos| raw.get(pos.checked_add("</think>".len())?..))
        .unwrap_or(raw)
}

/// Attempt to parse the answer through several recovery strategies.
fn try_parse(text: &str) -> Option<RawReply> {
    // Strategy 1: direct parse
    if let Ok(parsed) = serde_json::from_str::<RawReply>(text) {
        return Some(parsed);
    }

    // Strategy 2: extract from markdown code block
    let block = extract_json_from_codeblock(text);
    if let Some(json_str) = block
        && let Ok(parsed) = serde_json::from_str::<RawReply>(json_str)
    {
        return Some(parsed);
    }

    // Strategy 3: outermost braces, tolerating trailing commas
    let candidate = block.unwrap_or(text);
    let start = candidate.find('{')?;
    let end = candidate.rfind('}')?;
    let object = candidate.get(start..=end)?;
    serde_json::from_str::<RawReply>(&strip_trailing_commas(object)).ok()
}

/// Turn the JSON action into a typed action.
///
/// `record_transaction` may carry the registration line as a `command`
/// string, which then goes through the strict command parser.
fn convert_action(value: serde_json::Value) -> Result<NegotiationAction, CommandError> {
    let is_record = value.get("type").and_then(serde_json::Value::as_str) == Some("record_transaction");
    if is_record
        && let Some(command) = value.get("command").and_then(serde_json::Value::as_str)
    {
        return parse_transaction_command(command).map(NegotiationAction::RecordTransaction);
    }
    serde_json::from_value(value).map_err(|e| CommandError::Malformed {
        reason: format!("invalid action: {e}"),
    })
}

/// Extract the body of the first fenced code block.
fn extract_json_from_codeblock(text: &str) -> Option<&str> {
    let fence = text.find("```")?;
    let after_fence = text.get(fence.checked_add(3)?..)?;
    let body_start = after_fence.find('\n').and_then(|nl| nl.checked_add(1)).unwrap_or(0);
    let body = after_fence.get(body_start..)?;
    let end = body.find("```")?;
    body.get(..end).map(str::trim)
}

/// Remove commas directly followed (after whitespace) by `}` or `]`.
fn strip_trailing_commas(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == ',' {
            let rest = chars.clone().find(|n| !n.is_whitespace());
            if matches!(rest, Some('}' | ']')) {
                continue;
            }
        }
        result.push(c);
    }
    result
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use agrotrade_types::PartyId;

    use super::*;

    #[test]
    fn text_only_parties_keep_raw_text() {
        let reply = parse_reply("  Quero R$18 por kg. ", false);
        assert_eq!(reply, Reply::text("Quero R$18 por kg."));
    }

    #[test]
    fn reasoning_block_is_dropped() {
        let reply = parse_reply("<think>ele quer 18, vou pedir 20</think>\nQuero R$20.", false);
        assert_eq!(reply.text, "Quero R$20.");
    }

    #[test]
    fn json_with_propose_action() {
        let raw = r#"{"message": "Tenho fertilizante.", "action": {"type": "propose", "item": "fertilizante-comum", "quantity": 2, "price": 55.5}}"#;
        let reply = parse_reply(raw, true);
        assert_eq!(reply.text, "Tenho fertilizante.");
        assert_eq!(
            reply.action,
            Some(Ok(NegotiationAction::Propose {
                item: "fertilizante-comum".to_owned(),
                quantity: dec!(2),
                price: dec!(55.5),
            }))
        );
    }

    #[test]
    fn null_action_is_no_action() {
        let reply = parse_reply(r#"{"message": "Olá", "action": null}"#, true);
        assert_eq!(reply, Reply::text("Olá"));
    }

    #[test]
    fn record_transaction_command_string() {
        let raw = r#"```json
{"message": "Registrando.", "action": {"type": "record_transaction", "command": "Comprador: Empresario, Vendedor: Fz1, Item: Soja, Quantidade: 500kg, Preço Total: 7500"},}
```"#;
        let reply = parse_reply(raw, true);
        assert!(matches!(
            reply.action,
            Some(Ok(NegotiationAction::RecordTransaction(cmd)))
                if cmd.seller == PartyId::from("Fz1") && cmd.total_price == dec!(7500)
        ));
    }

    #[test]
    fn unknown_action_is_malformed() {
        let reply = parse_reply(r#"{"message": "x", "action": {"type": "steal"}}"#, true);
        assert!(matches!(reply.action, Some(Err(CommandError::Malformed { .. }))));
    }

    #[test]
    fn plain_text_from_tool_user_is_kept() {
        let reply = parse_reply("Desisto da negociação.", true);
        assert_eq!(reply, Reply::text("Desisto da negociação."));
    }

    #[test]
    fn trailing_commas_are_stripped() {
        assert_eq!(strip_trailing_commas(r#"{"a": [1, 2,], }"#), r#"{"a": [1, 2] }"#);
    }
}
