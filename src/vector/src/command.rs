//! The declarative vector command set.
//!
//! A vector image is compiled from a flat array of these commands. Path
//! commands are only valid between `StartPath` and the stroke or fill that
//! consumes the assembled points; `Text` is followed by its `TextRange`
//! sub-commands.

use std::fmt;
use std::sync::Arc;

use cgmath::{Matrix3, Vector2};

use hal::Backend;

use crate::geom::Box2;
use crate::text::Font;

/// Stroke cap shapes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LineCap {
    Butt,
    Round,
    Square,
}

/// Stroke join shapes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LineJoin {
    Miter,
    Bevel,
    Round,
}

/// Winding rule for fills.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FillRule {
    EvenOdd,
    NonZero,
}

/// Horizontal alignment of laid-out text.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TextAlign {
    Start,
    Center,
    End,
}

/// Style of a stroke operation.
#[derive(Clone, Debug, PartialEq)]
pub struct StrokeStyle {
    /// Material name, resolved against the shared then the local set.
    pub material: String,
    pub opacity: f32,
    pub cap: LineCap,
    pub join: LineJoin,
    pub width: f32,
    /// Ratio of the miter length to the stroke width above which miter
    /// joins fall back to bevel. Must be at least 1.
    pub miter_limit: f32,
    /// Four dash phase lengths; all zero disables dashing.
    pub dash_array: [f32; 4],
}

/// Style of a fill operation.
#[derive(Clone, Debug, PartialEq)]
pub struct FillStyle {
    /// Material name, resolved against the shared then the local set.
    pub material: String,
    pub opacity: f32,
    pub fill_rule: FillRule,
}

/// A `Text` command header; `range_count` `TextRange` commands follow.
#[derive(Clone)]
pub struct TextCommand<B: Backend> {
    pub text: String,
    pub font: Arc<dyn Font<B>>,
    pub alignment: TextAlign,
    /// Maximum line length before wrapping; infinite disables wrapping.
    pub max_length: f32,
    /// Line height as a multiple of the font size.
    pub line_height: f32,
    pub transform: Matrix3<f32>,
    pub range_count: u32,
}

impl<B: Backend> fmt::Debug for TextCommand<B> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TextCommand")
            .field("text", &self.text)
            .field("alignment", &self.alignment)
            .field("range_count", &self.range_count)
            .finish()
    }
}

/// Styling for a character range of the preceding `Text` command.
#[derive(Clone, Debug, PartialEq)]
pub struct TextRangeCommand {
    /// First character of the range.
    pub start: u32,
    /// Number of characters.
    pub count: u32,
    /// Offset applied to the laid-out position.
    pub position_offset: Vector2<f32>,
    /// Fill material name.
    pub fill_material: String,
    /// Outline material name; empty disables the outline.
    pub outline_material: String,
    pub fill_opacity: f32,
    pub outline_opacity: f32,
    pub size: f32,
    pub embolden: f32,
    pub slant: f32,
    pub outline_width: f32,
    /// Anti-alias quality factor handed to the glyph shaper.
    pub fuzziness: f32,
}

/// One step of a vector image description.
#[derive(Clone, Debug)]
pub enum VectorCommand<B: Backend> {
    /// Begin a path. `simple` promises the path has no self-intersections,
    /// allowing direct triangulation of fills.
    StartPath { transform: Matrix3<f32>, simple: bool },
    /// Move the pen, starting a new subpath.
    Move { position: Vector2<f32> },
    /// Straight line from the pen.
    Line { end: Vector2<f32> },
    /// Cubic Bézier from the pen.
    Bezier {
        control1: Vector2<f32>,
        control2: Vector2<f32>,
        end: Vector2<f32>,
    },
    /// Quadratic Bézier from the pen.
    Quadratic {
        control: Vector2<f32>,
        end: Vector2<f32>,
    },
    /// SVG-semantics elliptical arc from the pen.
    Arc {
        radius: Vector2<f32>,
        rotation: f32,
        large_arc: bool,
        clockwise: bool,
        end: Vector2<f32>,
    },
    /// Close the current subpath with a line back to its start.
    ClosePath,
    /// A full ellipse as its own subpath.
    Ellipse {
        center: Vector2<f32>,
        radius: Vector2<f32>,
    },
    /// An axis-aligned, optionally rounded rectangle as its own subpath.
    Rectangle {
        bounds: Box2,
        corner_radius: Vector2<f32>,
    },
    /// Stroke the assembled path.
    StrokePath(StrokeStyle),
    /// Fill the assembled path.
    FillPath(FillStyle),
    /// A textured axis-aligned quad.
    Image {
        image: B::Texture,
        bounds: Box2,
        opacity: f32,
        transform: Matrix3<f32>,
    },
    /// Laid-out text; followed by `range_count` `TextRange` commands.
    Text(TextCommand<B>),
    /// Range styling for the preceding `Text`.
    TextRange(TextRangeCommand),
}
