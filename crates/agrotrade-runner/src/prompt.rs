//! Prompt template loading and rendering via `minijinja`.
//!
//! Templates are loaded from the filesystem (default: `templates/` directory)
//! so operators can tune party behavior without recompiling. Two templates
//! render the role prompt of each side, a third renders the transcript and
//! reply instructions for a turn.

use minijinja::{Environment, context};
use serde::Serialize;

use agrotrade_core::{
    AGREEMENT_PHRASE, NegotiatorError, PromptContext, RolePrompts, TurnContext, WITHDRAWAL_PHRASE,
};
use agrotrade_types::{Role, Scenario};

use crate::error::RunnerError;

/// Template files the engine requires, with their registered names.
const TEMPLATES: &[(&str, &str)] = &[
    ("central", "central.j2"),
    ("counterparty", "counterparty.j2"),
    ("turn", "turn.j2"),
];

/// Manages prompt template loading and rendering.
///
/// Wraps a `minijinja` [`Environment`] with all prompt templates
/// pre-loaded. Templates can be edited on disk and will be picked up on
/// the next call to [`PromptEngine::new`].
pub struct PromptEngine {
    env: Environment<'static>,
}

/// The complete rendered prompt ready to send to an LLM backend.
#[derive(Debug, Clone)]
pub struct RenderedPrompt {
    /// System message: the party's role prompt.
    pub system: String,
    /// User message: transcript so far plus reply instructions.
    pub user: String,
}

/// One catalog line as templates see it.
#[derive(Debug, Serialize)]
struct CatalogLine<'a> {
    item: &'a str,
    category: &'static str,
    price: String,
}

/// One transcript line as templates see it.
#[derive(Debug, Serialize)]
struct Line {
    speaker: String,
    text: String,
}

impl PromptEngine {
    /// Create a new prompt engine loading templates from the given directory.
    ///
    /// The directory must contain `central.j2`, `counterparty.j2` and
    /// `turn.j2`.
    pub fn new(templates_dir: &str) -> Result<Self, RunnerError> {
        let mut env = Environment::new();
        for (name, file) in TEMPLATES {
            let source = load_template(templates_dir, file)?;
            env.add_template_owned(*name, source).map_err(|e| {
                RunnerError::Template(format!("failed to add {name} template: {e}"))
            })?;
        }
        Ok(Self { env })
    }

    /// Render the full prompt for one turn.
    pub fn render_turn(&self, turn: &TurnContext<'_>) -> Result<RenderedPrompt, RunnerError> {
        let transcript: Vec<Line> = turn
            .transcript
            .iter()
            .map(|entry| Line {
                speaker: entry.speaker.to_string(),
                text: entry.text.clone(),
            })
            .collect();

        let user = self.render(
            "turn",
            context! {
                party => turn.party.as_str(),
                counterparty => turn.counterparty.as_str(),
                role => role_name(turn.role),
                scenario => scenario_name(turn.scenario),
                tool_using => turn.tool_using,
                transcript => transcript,
                agreement_phrase => AGREEMENT_PHRASE,
                withdrawal_phrase => WITHDRAWAL_PHRASE,
            },
        )?;

        Ok(RenderedPrompt {
            system: turn.role_prompt.to_owned(),
            user,
        })
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> Result<String, RunnerError> {
        self.env
            .get_template(name)
            .map_err(|e| RunnerError::Template(format!("missing {name} template: {e}")))?
            .render(ctx)
            .map_err(|e| RunnerError::Template(format!("{name} render failed: {e}")))
    }
}

impl RolePrompts for PromptEngine {
    fn role_prompt(&self, ctx: &PromptContext<'_>) -> Result<String, NegotiatorError> {
        let catalog: Vec<CatalogLine<'_>> = ctx
            .catalog
            .entries()
            .map(|entry| CatalogLine {
                item: &entry.item,
                category: entry.category.label(),
                price: format!("{:.2}", entry.reference_price),
            })
            .collect();
        let stock: Vec<(String, String)> = ctx
            .account
            .stock
            .iter()
            .map(|(good, qty)| (good.clone(), qty.to_string()))
            .collect();
        let inventory: Vec<(&'static str, String)> = ctx
            .account
            .inventory
            .iter()
            .filter(|(_, items)| !items.is_empty())
            .map(|(category, items)| (category.label(), items.join(", ")))
            .collect();
        let parcels: Vec<(String, String)> = ctx
            .account
            .parcels
            .iter()
            .map(|(parcel, state)| (parcel.clone(), state.to_string()))
            .collect();
        let offer = ctx.offer.map(|offer| {
            context! {
                item => offer.item.as_str(),
                quantity => offer.quantity.to_string(),
                price => format!("{:.2}", offer.price),
                proposer => role_name(offer.last_proposer),
            }
        });

        let template = match ctx.role {
            Role::Central => "central",
            Role::Counterparty => "counterparty",
        };
        let rendered = self.render(
            template,
            context! {
                party => ctx.party.as_str(),
                central => ctx.central.as_str(),
                counterparty => ctx.counterparty.as_str(),
                scenario => scenario_name(ctx.scenario),
                tool_using => ctx.tool_using,
                balance => format!("{:.2}", ctx.account.balance),
                stock => stock,
                inventory => inventory,
                parcels => parcels,
                catalog => catalog,
                offer => offer,
                agreement_phrase => AGREEMENT_PHRASE,
                withdrawal_phrase => WITHDRAWAL_PHRASE,
            },
        )?;
        Ok(rendered)
    }
}

const fn role_name(role: Role) -> &'static str {
    match role {
        Role::Central => "central",
        Role::Counterparty => "counterparty",
    }
}

const fn scenario_name(scenario: Scenario) -> &'static str {
    match scenario {
        Scenario::Commodity => "commodity",
        Scenario::Inputs => "inputs",
    }
}

/// Read a template file from disk.
fn load_template(dir: &str, filename: &str) -> Result<String, RunnerError> {
    let path = format!("{dir}/{filename}");
    std::fs::read_to_string(&path)
        .map_err(|e| RunnerError::Template(format!("failed to read {path}: {e}")))
}
