//! Renderer-neutral panel output.
//!
//! Panels produce lines of tone-tagged segments. The terminal host maps each
//! [`Tone`] to a style; tests and `--json` output use [`PanelContent::to_plain`].

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Normal,
    Muted,
    Heading,
    Good,
    Warning,
    Critical,
    /// Last known data that is no longer current.
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub text: String,
    pub tone: Tone,
}

impl Segment {
    pub fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContentLine {
    pub segments: Vec<Segment>,
}

impl ContentLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(text: impl Into<String>, tone: Tone) -> Self {
        Self::new().push(text, tone)
    }

    pub fn push(mut self, text: impl Into<String>, tone: Tone) -> Self {
        self.segments.push(Segment::new(text, tone));
        self
    }

    /// Re-tone every segment except headings. Used to dim last-good data.
    pub fn dimmed(mut self, tone: Tone) -> Self {
        for segment in &mut self.segments {
            if segment.tone != Tone::Heading {
                segment.tone = tone;
            }
        }
        self
    }

    pub fn to_plain(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PanelContent {
    pub lines: Vec<ContentLine>,
}

impl PanelContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&mut self, line: ContentLine) {
        self.lines.push(line);
    }

    pub fn blank(&mut self) {
        self.lines.push(ContentLine::new());
    }

    pub fn extend(&mut self, lines: impl IntoIterator<Item = ContentLine>) {
        self.lines.extend(lines);
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn to_plain(&self) -> String {
        self.lines
            .iter()
            .map(ContentLine::to_plain)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Placeholder shown in place of a panel whose render failed.
    pub fn render_failed(label: &str, reason: &str) -> Self {
        let mut content = Self::new();
        content.line(ContentLine::text(label, Tone::Heading));
        content.blank();
        content.line(
            ContentLine::new()
                .push("render failed: ", Tone::Critical)
                .push(reason, Tone::Muted),
        );
        content
    }
}
