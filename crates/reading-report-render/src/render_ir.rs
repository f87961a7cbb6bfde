use serde::{Deserialize, Serialize};

use crate::fonts::FontId;

type MergedCommandIter<'a> =
    core::iter::Chain<core::slice::Iter<'a, DrawCommand>, core::slice::Iter<'a, DrawCommand>>;

/// Page represented as encoder-agnostic draw commands.
///
/// Coordinates are absolute page units with the origin at the top-left
/// corner and y growing downwards.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderPage {
    /// 1-based page number.
    pub page_number: usize,
    /// Content-layer draw commands (report blocks).
    pub content_commands: Vec<DrawCommand>,
    /// Chrome-layer draw commands (frame and page-number footer).
    pub chrome_commands: Vec<DrawCommand>,
}

impl RenderPage {
    const INITIAL_CONTENT_COMMAND_CAPACITY: usize = 32;
    const INITIAL_CHROME_COMMAND_CAPACITY: usize = 2;

    /// Create an empty page.
    pub fn new(page_number: usize) -> Self {
        Self {
            page_number,
            content_commands: Vec::with_capacity(0),
            chrome_commands: Vec::with_capacity(0),
        }
    }

    /// Push a content-layer command.
    pub fn push_content_command(&mut self, cmd: DrawCommand) {
        if self.content_commands.capacity() == 0 {
            self.content_commands
                .reserve(Self::INITIAL_CONTENT_COMMAND_CAPACITY);
        }
        self.content_commands.push(cmd);
    }

    /// Push a chrome-layer command.
    pub fn push_chrome_command(&mut self, cmd: DrawCommand) {
        if self.chrome_commands.capacity() == 0 {
            self.chrome_commands
                .reserve(Self::INITIAL_CHROME_COMMAND_CAPACITY);
        }
        self.chrome_commands.push(cmd);
    }

    /// `true` when no content has been placed yet.
    pub fn is_content_empty(&self) -> bool {
        self.content_commands.is_empty()
    }

    /// Number of commands across both layers.
    pub fn merged_commands_len(&self) -> usize {
        self.content_commands.len() + self.chrome_commands.len()
    }

    /// Iterate content then chrome commands without allocating.
    pub fn merged_commands_iter(&self) -> MergedCommandIter<'_> {
        self.content_commands
            .iter()
            .chain(self.chrome_commands.iter())
    }

    /// Text runs of the content layer, in draw order.
    pub fn content_texts(&self) -> impl Iterator<Item = &TextCommand> {
        self.content_commands.iter().filter_map(|cmd| match cmd {
            DrawCommand::Text(text) => Some(text),
            _ => None,
        })
    }
}

/// Layout output commands.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawCommand {
    /// Filled rectangle.
    FillRect(RectCommand),
    /// Rectangle outline.
    StrokeRect(RectCommand),
    /// Filled (and optionally outlined) circle.
    Circle(CircleCommand),
    /// Text run.
    Text(TextCommand),
}

/// sRGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const BLACK: Self = Self::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `#rrggbb` form.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Horizontal alignment a text run was placed with.
///
/// Informational: `TextCommand::x` is already the resolved left edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// Rectangle command.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RectCommand {
    /// Left x.
    pub x: f32,
    /// Top y.
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Fill color for `FillRect`, stroke color for `StrokeRect`.
    pub color: Color,
    /// Outline width; unused by `FillRect`.
    pub stroke_width: f32,
}

/// Circle command.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CircleCommand {
    /// Center x.
    pub cx: f32,
    /// Center y.
    pub cy: f32,
    pub radius: f32,
    pub fill: Color,
    /// Outline color, if outlined.
    pub stroke: Option<Color>,
    pub stroke_width: f32,
}

/// Text draw command. `text` is in display order (already shaped).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextCommand {
    /// Left x of the run.
    pub x: f32,
    /// Baseline y.
    pub baseline_y: f32,
    /// Measured run width.
    pub width: f32,
    pub text: String,
    pub align: TextAlign,
    pub font: FontId,
    pub size_pt: f32,
    pub color: Color,
}

/// Per-page chrome emission policy and geometry.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageChromeConfig {
    /// Stroke a frame around every page.
    pub frame_enabled: bool,
    /// Draw a centered page-number footer on every page.
    pub footer_enabled: bool,
    /// Frame distance from the page edge.
    pub frame_inset: f32,
    /// Frame outline width.
    pub frame_stroke_width: f32,
    /// Footer baseline distance from the bottom page edge.
    pub footer_baseline_from_bottom: f32,
    /// Footer text size.
    pub footer_size_pt: f32,
}

impl PageChromeConfig {
    /// Chrome disabled; pages carry only content commands.
    pub const fn disabled() -> Self {
        let mut cfg = Self::geometry_defaults();
        cfg.frame_enabled = false;
        cfg.footer_enabled = false;
        cfg
    }

    /// Default chrome geometry for an A4 report.
    pub const fn geometry_defaults() -> Self {
        Self {
            frame_enabled: true,
            footer_enabled: true,
            frame_inset: 5.0,
            frame_stroke_width: 0.6,
            footer_baseline_from_bottom: 9.0,
            footer_size_pt: 10.0,
        }
    }
}

impl Default for PageChromeConfig {
    fn default() -> Self {
        Self::geometry_defaults()
    }
}
