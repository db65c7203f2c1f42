use serde::Serialize;

use crate::actions::ClockAction;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    #[serde(rename = "plain_text")]
    Plain { text: String },
    Mrkdwn { text: String },
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain { text: text.into() }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Mrkdwn { text: text.into() }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Plain { text } | Self::Mrkdwn { text } => text,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    Primary,
    Danger,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ButtonElement {
    pub action_id: String,
    pub text: TextObject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<ButtonStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl ButtonElement {
    pub fn new(action_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            action_id: action_id.into(),
            text: TextObject::plain(label),
            style: None,
            value: None,
        }
    }

    pub fn style(mut self, style: ButtonStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionElement {
    Button(ButtonElement),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Header { block_id: String, text: TextObject },
    Section { block_id: String, text: TextObject },
    Actions { block_id: String, elements: Vec<ActionElement> },
    Context { block_id: String, elements: Vec<TextObject> },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageTemplate {
    #[serde(rename = "text")]
    pub fallback_text: String,
    pub blocks: Vec<Block>,
}

impl MessageTemplate {
    /// Concatenated text of every section, in order.
    pub fn section_text(&self) -> String {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                Block::Section { text, .. } => Some(text.text()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub struct MessageBuilder {
    fallback_text: String,
    blocks: Vec<Block>,
}

impl MessageBuilder {
    pub fn new(fallback_text: impl Into<String>) -> Self {
        Self { fallback_text: fallback_text.into(), blocks: Vec::new() }
    }

    pub fn header(mut self, block_id: impl Into<String>, text: impl Into<String>) -> Self {
        self.blocks.push(Block::Header { block_id: block_id.into(), text: TextObject::plain(text) });
        self
    }

    pub fn section<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut SectionBuilder),
    {
        let mut builder = SectionBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Section { block_id: block_id.into(), text: builder.build() });
        self
    }

    pub fn actions<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut ActionsBuilder),
    {
        let mut builder = ActionsBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Actions { block_id: block_id.into(), elements: builder.build() });
        self
    }

    pub fn context<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut ContextBuilder),
    {
        let mut builder = ContextBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Context { block_id: block_id.into(), elements: builder.build() });
        self
    }

    pub fn build(self) -> MessageTemplate {
        MessageTemplate { fallback_text: self.fallback_text, blocks: self.blocks }
    }
}

#[derive(Default)]
pub struct SectionBuilder {
    text: Option<TextObject>,
}

impl SectionBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::plain(text));
        self
    }

    pub fn mrkdwn(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::mrkdwn(text));
        self
    }

    fn build(self) -> TextObject {
        self.text.unwrap_or_else(|| TextObject::plain(""))
    }
}

#[derive(Default)]
pub struct ActionsBuilder {
    elements: Vec<ActionElement>,
}

impl ActionsBuilder {
    pub fn button(&mut self, button: ButtonElement) -> &mut Self {
        self.elements.push(ActionElement::Button(button));
        self
    }

    fn build(self) -> Vec<ActionElement> {
        self.elements
    }
}

#[derive(Default)]
pub struct ContextBuilder {
    elements: Vec<TextObject>,
}

impl ContextBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.elements.push(TextObject::plain(text));
        self
    }

    pub fn mrkdwn(&mut self, text: impl Into<String>) -> &mut Self {
        self.elements.push(TextObject::mrkdwn(text));
        self
    }

    fn build(self) -> Vec<TextObject> {
        self.elements
    }
}

pub const RANKING_TITLE: &str = "🏆 Hours worked leaderboard 🏆";

/// Per-worker control panel with the three clock buttons.
pub fn clock_panel_message() -> MessageTemplate {
    MessageBuilder::new("Workshop time clock: choose an option")
        .header("clock.panel.header.v1", "💼 Workshop time clock")
        .section("clock.panel.prompt.v1", |section| {
            section.mrkdwn("Workshop clock-in system\nChoose an option:");
        })
        .actions("clock.panel.actions.v1", |actions| {
            actions
                .button(
                    ButtonElement::new(ClockAction::ClockIn.action_id(), "🟢 Clock in")
                        .style(ButtonStyle::Primary)
                        .value("in"),
                )
                .button(
                    ButtonElement::new(ClockAction::ClockOut.action_id(), "🔴 Clock out")
                        .style(ButtonStyle::Danger)
                        .value("out"),
                )
                .button(
                    ButtonElement::new(ClockAction::Total.action_id(), "📊 Total hours")
                        .value("total"),
                );
        })
        .build()
}

pub fn clock_in_message() -> MessageTemplate {
    MessageBuilder::new("You clocked in.")
        .section("clock.in.confirmed.v1", |section| {
            section.mrkdwn("✅ You clocked *in*.");
        })
        .build()
}

pub fn clock_out_message(added: &str, unit_label: &str) -> MessageTemplate {
    let added_text = with_unit(added, unit_label);
    MessageBuilder::new(format!("You clocked out. Time added: {added_text}."))
        .section("clock.out.confirmed.v1", |section| {
            section.mrkdwn(format!("👋 You clocked *out*.\n🕒 Time added: {added_text}."));
        })
        .build()
}

pub fn total_message(total: &str, unit_label: &str) -> MessageTemplate {
    let total_text = with_unit(total, unit_label);
    MessageBuilder::new(format!("Total: {total_text}"))
        .section("clock.total.summary.v1", |section| {
            section.mrkdwn(format!("🕒 Total: {total_text}"));
        })
        .build()
}

/// Short private notice for a rejected or failed action.
pub fn notice_message(summary: &str) -> MessageTemplate {
    MessageBuilder::new(summary.to_owned())
        .section("clock.notice.summary.v1", |section| {
            section.mrkdwn(summary.to_owned());
        })
        .build()
}

pub fn unregistered_channel_message() -> MessageTemplate {
    notice_message("⚠️ This channel is not registered for time tracking.")
}

/// Slack rejects section text longer than this many characters.
pub const SECTION_TEXT_LIMIT: usize = 3_000;
/// Entry sections per ranking message; Slack allows 50 blocks in total.
const MAX_RANKING_SECTIONS: usize = 48;

/// Leaderboard message. Entries are split across sections to stay under the
/// per-section limit; entries past the block budget are summarized.
pub fn ranking_message(lines: &[String]) -> MessageTemplate {
    let entries: Vec<String> = lines.iter().map(|line| format!("*{line}*")).collect();
    let mut chunks = chunk_lines(&entries, SECTION_TEXT_LIMIT);
    if chunks.is_empty() {
        chunks.push("No hours logged yet.".to_owned());
    }

    let omitted: usize =
        chunks.iter().skip(MAX_RANKING_SECTIONS).map(|chunk| chunk.lines().count()).sum();
    chunks.truncate(MAX_RANKING_SECTIONS);
    let shown = lines.len().saturating_sub(omitted);

    let fallback = format!("{RANKING_TITLE}\n{}", lines[..shown].join("\n"));
    let mut builder = MessageBuilder::new(fallback).section("ranking.title.v1", |section| {
        section.mrkdwn(RANKING_TITLE);
    });
    for (index, chunk) in chunks.into_iter().enumerate() {
        let block_id = match index {
            0 => "ranking.entries.v1".to_owned(),
            n => format!("ranking.entries.v1.{}", n + 1),
        };
        builder = builder.section(block_id, |section| {
            section.mrkdwn(chunk);
        });
    }
    if omitted > 0 {
        builder = builder.context("ranking.overflow.v1", |context| {
            context.plain(format!("…and {omitted} more"));
        });
    }

    builder.build()
}

/// Joins lines with newlines into chunks of at most `limit` characters.
/// A single line longer than `limit` is cut to fit.
fn chunk_lines(lines: &[String], limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in lines {
        let line: String = line.chars().take(limit).collect();
        let line_len = line.chars().count();
        let needed = if current.is_empty() { line_len } else { current_len + 1 + line_len };

        if needed > limit && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(&line);
        current_len += line_len;
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

fn with_unit(value: &str, unit_label: &str) -> String {
    match unit_label.trim() {
        "" => value.to_owned(),
        unit => format!("{value} {unit}"),
    }
}
