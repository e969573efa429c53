//! Preview documents: what a specimen page contains and how it is laid out.
//!
//! [`compose`] is a pure function of a [`PreviewRequest`]. Drawing happens behind
//! the [`RenderSurface`] trait, and [`present`] is the boundary where a failed
//! draw turns into an inline diagnostic instead of an error.

use std::fmt;
use std::io::Write;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::registry::FontRegistry;

/// Heading shown until the user supplies their own.
pub const DEFAULT_HEADING: &str = "The quick brown fox jumps over the lazy dog.";

/// Fixed passage exercising common glyph shapes, punctuation and paragraph rhythm.
pub const BODY_TEXT: &str = "The quick brown fox jumps over the lazy dog, not because he is in a hurry, but because the quiet afternoon makes him restless. The sun hangs low in the sky, warming the grass, and the fox feels a sudden urge to prove that his legs are still strong and swift. The dog barely opens one eye, letting out a slow yawn, unimpressed by the fox\u{2019}s display.

After landing softly on the other side, the fox pauses and looks back. He notices that the dog is old, tired, and comfortable in his laziness. For a moment, the fox feels a strange mix of pride and sympathy. Speed and cleverness have always been his strengths, but watching the dog rest so peacefully makes him wonder if constant movement is truly necessary.

The dog finally lifts his head and speaks in a calm voice, telling the fox that there is wisdom in resting and joy in being content. The fox listens carefully, realizing that life is not only about jumping higher or running faster. Sometimes, it is also about knowing when to slow down.

As evening approaches, the fox walks away more thoughtfully than before. The dog closes his eyes again, smiling slightly. In that quiet field, both animals learn something important: balance between action and rest is what makes life complete.";

/// Digits, punctuation and symbols drawn under the body text.
pub const FOOTER_TEXT: &str = "--------------~12345!@#$)000(%^&*67890~--------------";

pub const STYLE_LABEL_PREFIX: &str = "STYLE: ";
pub const INTERFACE_FAMILY: &str = "sans-serif";
pub const INTERFACE_STYLE: &str = "Regular";
pub const STYLE_LABEL_SIZE: f32 = 10.0;
pub const BASE_HEADING_SIZE: u32 = 48;
pub const BODY_SIZE: f32 = 13.0;
pub const FOOTER_SIZE: f32 = 13.0;

pub const MIN_ZOOM: u16 = 50;
pub const MAX_ZOOM: u16 = 200;
pub const DEFAULT_ZOOM: u16 = 100;

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("font face {family} {style} is not available")]
    UnresolvedFace { family: String, style: String },
    #[error("rendering surface failed: {0}")]
    Surface(String),
}

/// Heading zoom in percent, always within [`MIN_ZOOM`]..=[`MAX_ZOOM`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "u16")]
pub struct Zoom(u16);

impl Zoom {
    pub fn new(percent: i64) -> Self {
        Self(percent.clamp(MIN_ZOOM as i64, MAX_ZOOM as i64) as u16)
    }

    pub fn percent(self) -> u16 {
        self.0
    }

    /// round(48 × zoom / 100), in whole points.
    pub fn heading_point_size(self) -> u32 {
        (BASE_HEADING_SIZE * self.0 as u32 + 50) / 100
    }
}

impl Default for Zoom {
    fn default() -> Self {
        Self(DEFAULT_ZOOM)
    }
}

impl From<i64> for Zoom {
    fn from(percent: i64) -> Self {
        Self::new(percent)
    }
}

impl From<Zoom> for u16 {
    fn from(zoom: Zoom) -> Self {
        zoom.0
    }
}

/// Heading text: the stock sentence or a user override.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum HeadingText {
    #[default]
    Default,
    Custom(String),
}

impl HeadingText {
    pub fn custom(text: impl Into<String>) -> Self {
        Self::Custom(text.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Default => DEFAULT_HEADING,
            Self::Custom(text) => text,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::Default;
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewRequest {
    pub family: String,
    pub style: String,
    pub zoom: Zoom,
    pub caps: bool,
    pub heading: HeadingText,
}

impl PreviewRequest {
    pub fn new(family: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            style: style.into(),
            zoom: Zoom::default(),
            caps: false,
            heading: HeadingText::Default,
        }
    }

    /// Heading as drawn; the stored heading is never modified by caps.
    pub fn display_heading(&self) -> String {
        if self.caps {
            self.heading.as_str().to_uppercase()
        } else {
            self.heading.as_str().to_string()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);
    pub const GRAY: Color = Color::rgb(0x80, 0x80, 0x80);
    pub const MUTED: Color = Color::rgb(0xaa, 0xaa, 0xaa);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Vertical margins around a block, in points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockSpacing {
    pub top: u16,
    pub bottom: u16,
}

impl BlockSpacing {
    pub const TIGHT: BlockSpacing = BlockSpacing { top: 0, bottom: 5 };
    pub const LARGE_GAP: BlockSpacing = BlockSpacing { top: 10, bottom: 15 };
    pub const FOOTER: BlockSpacing = BlockSpacing { top: 10, bottom: 20 };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    Left,
    Center,
}

/// Which font a block is drawn in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontRole {
    /// The application's own UI font.
    Interface,
    /// The face being previewed.
    Specimen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    StyleLabel,
    Heading,
    Body,
    Footer,
    Diagnostic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub kind: BlockKind,
    pub text: String,
    pub role: FontRole,
    pub font_family: String,
    pub font_style: String,
    pub point_size: f32,
    pub color: Color,
    pub spacing: BlockSpacing,
    pub alignment: Alignment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewDocument {
    pub blocks: Vec<Block>,
}

impl PreviewDocument {
    /// Stand-in document for a preview that could not be drawn.
    pub fn diagnostic(err: &ComposeError) -> Self {
        Self {
            blocks: vec![Block {
                kind: BlockKind::Diagnostic,
                text: format!("Error rendering: {err}"),
                role: FontRole::Interface,
                font_family: INTERFACE_FAMILY.to_string(),
                font_style: INTERFACE_STYLE.to_string(),
                point_size: BODY_SIZE,
                color: Color::WHITE,
                spacing: BlockSpacing::TIGHT,
                alignment: Alignment::Left,
            }],
        }
    }

    pub fn block(&self, kind: BlockKind) -> Option<&Block> {
        self.blocks.iter().find(|b| b.kind == kind)
    }

    pub fn is_diagnostic(&self) -> bool {
        self.blocks.iter().any(|b| b.kind == BlockKind::Diagnostic)
    }
}

/// Build the four-block specimen page for `request`.
pub fn compose(request: &PreviewRequest) -> PreviewDocument {
    let specimen = |kind, text: String, point_size, color, spacing, alignment| Block {
        kind,
        text,
        role: FontRole::Specimen,
        font_family: request.family.clone(),
        font_style: request.style.clone(),
        point_size,
        color,
        spacing,
        alignment,
    };

    let label = Block {
        kind: BlockKind::StyleLabel,
        text: format!("{STYLE_LABEL_PREFIX}{}", request.style.to_uppercase()),
        role: FontRole::Interface,
        font_family: INTERFACE_FAMILY.to_string(),
        font_style: INTERFACE_STYLE.to_string(),
        point_size: STYLE_LABEL_SIZE,
        color: Color::GRAY,
        spacing: BlockSpacing::TIGHT,
        alignment: Alignment::Left,
    };

    PreviewDocument {
        blocks: vec![
            label,
            specimen(
                BlockKind::Heading,
                request.display_heading(),
                request.zoom.heading_point_size() as f32,
                Color::WHITE,
                BlockSpacing::LARGE_GAP,
                Alignment::Left,
            ),
            specimen(
                BlockKind::Body,
                BODY_TEXT.to_string(),
                BODY_SIZE,
                Color::WHITE,
                BlockSpacing::LARGE_GAP,
                Alignment::Left,
            ),
            specimen(
                BlockKind::Footer,
                FOOTER_TEXT.to_string(),
                FOOTER_SIZE,
                Color::MUTED,
                BlockSpacing::FOOTER,
                Alignment::Center,
            ),
        ],
    }
}

/// Something that can draw a [`PreviewDocument`].
pub trait RenderSurface {
    fn draw(&mut self, document: &PreviewDocument) -> Result<(), ComposeError>;
}

/// Outcome of [`present`].
#[derive(Debug)]
pub enum Presented {
    Document,
    Diagnostic(ComposeError),
}

/// Draw `document`, replacing it with a diagnostic block if the surface fails.
pub fn present(document: &PreviewDocument, surface: &mut dyn RenderSurface) -> Presented {
    match surface.draw(document) {
        Ok(()) => Presented::Document,
        Err(err) => {
            warn!(error = %err, "preview could not be rendered");
            if let Err(again) = surface.draw(&PreviewDocument::diagnostic(&err)) {
                warn!(error = %again, "diagnostic could not be rendered either");
            }
            Presented::Diagnostic(err)
        }
    }
}

/// Plain-text surface: specimen blocks are materialized through the registry
/// before anything is written, so an unknown face produces no partial output.
pub struct TextSurface<'a, W> {
    out: W,
    fonts: &'a dyn FontRegistry,
    width: usize,
}

impl<'a, W: Write> TextSurface<'a, W> {
    pub fn new(out: W, fonts: &'a dyn FontRegistry) -> Self {
        Self {
            out,
            fonts,
            width: 72,
        }
    }

    pub fn width(mut self, width: usize) -> Self {
        self.width = width.max(FOOTER_TEXT.chars().count());
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn render(&self, document: &PreviewDocument) -> Result<String, ComposeError> {
        let mut page = String::new();
        for block in &document.blocks {
            let header = match block.role {
                FontRole::Interface => None,
                FontRole::Specimen => {
                    let face = self
                        .fonts
                        .face(&block.font_family, &block.font_style, block.point_size)
                        .ok_or_else(|| ComposeError::UnresolvedFace {
                            family: block.font_family.clone(),
                            style: block.font_style.clone(),
                        })?;
                    Some(format!(
                        "[{} {} {}pt {}]",
                        face.family, face.style, face.point_size, block.color
                    ))
                }
            };

            push_lines(&mut page, block.spacing.top / 5);
            if let Some(header) = header {
                page.push_str(&header);
                page.push('\n');
            }
            for paragraph in block.text.split("\n\n") {
                for line in wrap(paragraph, self.width) {
                    match block.alignment {
                        Alignment::Left => page.push_str(&line),
                        Alignment::Center => {
                            let pad = self.width.saturating_sub(line.chars().count()) / 2;
                            page.push_str(&" ".repeat(pad));
                            page.push_str(&line);
                        }
                    }
                    page.push('\n');
                }
                if block.text.contains("\n\n") {
                    page.push('\n');
                }
            }
            push_lines(&mut page, block.spacing.bottom / 5);
        }
        Ok(page)
    }
}

impl<W: Write> RenderSurface for TextSurface<'_, W> {
    fn draw(&mut self, document: &PreviewDocument) -> Result<(), ComposeError> {
        let page = self.render(document)?;
        self.out
            .write_all(page.as_bytes())
            .and_then(|()| self.out.flush())
            .map_err(|err| ComposeError::Surface(err.to_string()))
    }
}

fn push_lines(page: &mut String, count: u16) {
    for _ in 0..count {
        page.push('\n');
    }
}

/// Greedy word wrap on whitespace; words longer than `width` get a line of their own.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        let needed = if line.is_empty() {
            word.chars().count()
        } else {
            line.chars().count() + 1 + word.chars().count()
        };
        if needed > width && !line.is_empty() {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() || lines.is_empty() {
        lines.push(line);
    }
    lines
}
