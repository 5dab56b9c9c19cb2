//! Binary vector image format.
//!
//! A verified little-endian tagged stream: header (magic, version, size,
//! sRGB flag), the local material tables (colors, linear gradients,
//! radial gradients), then the command list as a tag-discriminated union
//! of the runtime command set. Unknown tags and truncated tables fail
//! with a format error. Saving writes the same layout, so save/load
//! round-trips are byte-stable.

use std::io::{Read, Write};
use std::sync::Arc;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use cgmath::{Matrix3, Vector2};

use hal::{Backend, Error, Result};

use crate::command::{
    FillRule, FillStyle, LineCap, LineJoin, StrokeStyle, TextAlign, TextCommand,
    TextRangeCommand, VectorCommand,
};
use crate::geom::Box2;
use crate::material::{
    GradientEdge, GradientStop, LinearGradient, MaterialDesc, MaterialSpace, RadialGradient,
};
use crate::text::Font;

const MAGIC: &[u8; 4] = b"TSVI";
const VERSION: u32 = 1;
/// Upper bound on table counts, rejecting absurd sizes before allocating.
const MAX_TABLE_COUNT: u32 = 1 << 20;

/// Resolves names in an image file to live resources.
pub trait VectorResources<B: Backend> {
    /// Look up a texture by name.
    fn find_texture(&self, name: &str) -> Option<B::Texture>;
    /// Look up a font by name.
    fn find_font(&self, name: &str) -> Option<Arc<dyn Font<B>>>;
}

/// Maps live resources back to the names they were loaded under, for
/// saving.
pub trait VectorResourceNames<B: Backend> {
    /// The name of a texture.
    fn texture_name(&self, texture: &B::Texture) -> Option<String>;
    /// The name of a font.
    fn font_name(&self, font: &dyn Font<B>) -> Option<String>;
}

/// Everything a vector image file describes.
#[derive(Debug)]
pub struct VectorImageData<B: Backend> {
    pub size: Vector2<f32>,
    pub srgb: bool,
    /// The image-local material table in index order.
    pub materials: Vec<(String, MaterialDesc)>,
    pub commands: Vec<VectorCommand<B>>,
}

fn format_error(detail: &str) -> Error {
    error!("vector image format error: {}", detail);
    Error::Format(detail.to_owned())
}

fn read_count<R: Read>(stream: &mut R, what: &str) -> Result<u32> {
    let count = stream.read_u32::<LittleEndian>()?;
    if count > MAX_TABLE_COUNT {
        return Err(format_error(what));
    }
    Ok(count)
}

fn read_string<R: Read>(stream: &mut R) -> Result<String> {
    let length = stream.read_u16::<LittleEndian>()? as usize;
    let mut bytes = vec![0; length];
    stream.read_exact(&mut bytes)?;
    String::from_utf8(bytes).map_err(|_| format_error("invalid string encoding"))
}

fn write_string<W: Write>(stream: &mut W, value: &str) -> Result<()> {
    if value.len() > u16::MAX as usize {
        return Err(Error::InvalidArg("string too long for the image format"));
    }
    stream.write_u16::<LittleEndian>(value.len() as u16)?;
    stream.write_all(value.as_bytes())?;
    Ok(())
}

fn read_vec2<R: Read>(stream: &mut R) -> Result<Vector2<f32>> {
    Ok(Vector2::new(
        stream.read_f32::<LittleEndian>()?,
        stream.read_f32::<LittleEndian>()?,
    ))
}

fn write_vec2<W: Write>(stream: &mut W, value: Vector2<f32>) -> Result<()> {
    stream.write_f32::<LittleEndian>(value.x)?;
    stream.write_f32::<LittleEndian>(value.y)?;
    Ok(())
}

fn read_box2<R: Read>(stream: &mut R) -> Result<Box2> {
    Ok(Box2::new(read_vec2(stream)?, read_vec2(stream)?))
}

fn write_box2<W: Write>(stream: &mut W, value: Box2) -> Result<()> {
    write_vec2(stream, value.min)?;
    write_vec2(stream, value.max)
}

fn read_transform<R: Read>(stream: &mut R) -> Result<Matrix3<f32>> {
    let mut values = [0.0f32; 6];
    for value in &mut values {
        *value = stream.read_f32::<LittleEndian>()?;
    }
    Ok(Matrix3::new(
        values[0], values[1], 0.0, values[2], values[3], 0.0, values[4], values[5], 1.0,
    ))
}

fn write_transform<W: Write>(stream: &mut W, transform: &Matrix3<f32>) -> Result<()> {
    for value in &[
        transform.x.x,
        transform.x.y,
        transform.y.x,
        transform.y.y,
        transform.z.x,
        transform.z.y,
    ] {
        stream.write_f32::<LittleEndian>(*value)?;
    }
    Ok(())
}

fn read_stops<R: Read>(stream: &mut R) -> Result<Vec<GradientStop>> {
    let count = read_count(stream, "gradient stop count")?;
    let mut stops = Vec::with_capacity(count.min(64) as usize);
    for _ in 0..count {
        let position = stream.read_f32::<LittleEndian>()?;
        let mut color = [0u8; 4];
        stream.read_exact(&mut color)?;
        stops.push(GradientStop { position, color });
    }
    Ok(stops)
}

fn write_stops<W: Write>(stream: &mut W, stops: &[GradientStop]) -> Result<()> {
    stream.write_u32::<LittleEndian>(stops.len() as u32)?;
    for stop in stops {
        stream.write_f32::<LittleEndian>(stop.position)?;
        stream.write_all(&stop.color)?;
    }
    Ok(())
}

fn read_edge<R: Read>(stream: &mut R) -> Result<GradientEdge> {
    match stream.read_u8()? {
        0 => Ok(GradientEdge::Clamp),
        1 => Ok(GradientEdge::Repeat),
        2 => Ok(GradientEdge::Mirror),
        _ => Err(format_error("unknown gradient edge mode")),
    }
}

fn read_space<R: Read>(stream: &mut R) -> Result<MaterialSpace> {
    match stream.read_u8()? {
        0 => Ok(MaterialSpace::Local),
        1 => Ok(MaterialSpace::Bounds),
        _ => Err(format_error("unknown material space")),
    }
}

fn edge_tag(edge: GradientEdge) -> u8 {
    match edge {
        GradientEdge::Clamp => 0,
        GradientEdge::Repeat => 1,
        GradientEdge::Mirror => 2,
    }
}

fn space_tag(space: MaterialSpace) -> u8 {
    match space {
        MaterialSpace::Local => 0,
        MaterialSpace::Bounds => 1,
    }
}

/// Load an image description from a stream.
pub fn load_image_data<B: Backend, R: Read>(
    stream: &mut R,
    resources: &dyn VectorResources<B>,
) -> Result<VectorImageData<B>> {
    let mut magic = [0u8; 4];
    stream.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(format_error("bad magic"));
    }
    let version = stream.read_u32::<LittleEndian>()?;
    if version != VERSION {
        return Err(format_error("unsupported version"));
    }

    let size = read_vec2(stream)?;
    if size.x <= 0.0 || size.y <= 0.0 {
        return Err(format_error("non-positive image size"));
    }
    let srgb = stream.read_u8()? != 0;

    let mut materials = Vec::new();

    // Color materials.
    for _ in 0..read_count(stream, "color material count")? {
        let name = read_string(stream)?;
        let mut color = [0u8; 4];
        stream.read_exact(&mut color)?;
        materials.push((name, MaterialDesc::Color(color)));
    }

    // Linear gradients.
    for _ in 0..read_count(stream, "linear gradient count")? {
        let name = read_string(stream)?;
        let stops = read_stops(stream)?;
        let start = read_vec2(stream)?;
        let end = read_vec2(stream)?;
        let edge = read_edge(stream)?;
        let space = read_space(stream)?;
        let transform = read_transform(stream)?;
        materials.push((
            name,
            MaterialDesc::LinearGradient(LinearGradient {
                stops,
                start,
                end,
                edge,
                space,
                transform,
            }),
        ));
    }

    // Radial gradients.
    for _ in 0..read_count(stream, "radial gradient count")? {
        let name = read_string(stream)?;
        let stops = read_stops(stream)?;
        let center = read_vec2(stream)?;
        let radius = stream.read_f32::<LittleEndian>()?;
        let focus = read_vec2(stream)?;
        let focus_radius = stream.read_f32::<LittleEndian>()?;
        let edge = read_edge(stream)?;
        let space = read_space(stream)?;
        let transform = read_transform(stream)?;
        materials.push((
            name,
            MaterialDesc::RadialGradient(RadialGradient {
                stops,
                center,
                radius,
                focus,
                focus_radius,
                edge,
                space,
                transform,
            }),
        ));
    }

    // Commands.
    let command_count = read_count(stream, "command count")?;
    let mut commands = Vec::with_capacity(command_count.min(4096) as usize);
    for _ in 0..command_count {
        let tag = stream.read_u8()?;
        let command = match tag {
            0 => {
                let transform = read_transform(stream)?;
                let simple = stream.read_u8()? != 0;
                VectorCommand::StartPath { transform, simple }
            }
            1 => VectorCommand::Move {
                position: read_vec2(stream)?,
            },
            2 => VectorCommand::Line {
                end: read_vec2(stream)?,
            },
            3 => VectorCommand::Bezier {
                control1: read_vec2(stream)?,
                control2: read_vec2(stream)?,
                end: read_vec2(stream)?,
            },
            4 => VectorCommand::Quadratic {
                control: read_vec2(stream)?,
                end: read_vec2(stream)?,
            },
            5 => {
                let radius = read_vec2(stream)?;
                let rotation = stream.read_f32::<LittleEndian>()?;
                let large_arc = stream.read_u8()? != 0;
                let clockwise = stream.read_u8()? != 0;
                let end = read_vec2(stream)?;
                VectorCommand::Arc {
                    radius,
                    rotation,
                    large_arc,
                    clockwise,
                    end,
                }
            }
            6 => VectorCommand::ClosePath,
            7 => VectorCommand::Ellipse {
                center: read_vec2(stream)?,
                radius: read_vec2(stream)?,
            },
            8 => VectorCommand::Rectangle {
                bounds: read_box2(stream)?,
                corner_radius: read_vec2(stream)?,
            },
            9 => {
                let material = read_string(stream)?;
                let opacity = stream.read_f32::<LittleEndian>()?;
                let cap = match stream.read_u8()? {
                    0 => LineCap::Butt,
                    1 => LineCap::Round,
                    2 => LineCap::Square,
                    _ => return Err(format_error("unknown line cap")),
                };
                let join = match stream.read_u8()? {
                    0 => LineJoin::Miter,
                    1 => LineJoin::Bevel,
                    2 => LineJoin::Round,
                    _ => return Err(format_error("unknown line join")),
                };
                let width = stream.read_f32::<LittleEndian>()?;
                let miter_limit = stream.read_f32::<LittleEndian>()?;
                let mut dash_array = [0.0f32; 4];
                for value in &mut dash_array {
                    *value = stream.read_f32::<LittleEndian>()?;
                }
                VectorCommand::StrokePath(StrokeStyle {
                    material,
                    opacity,
                    cap,
                    join,
                    width,
                    miter_limit,
                    dash_array,
                })
            }
            10 => {
                let material = read_string(stream)?;
                let opacity = stream.read_f32::<LittleEndian>()?;
                let fill_rule = match stream.read_u8()? {
                    0 => FillRule::EvenOdd,
                    1 => FillRule::NonZero,
                    _ => return Err(format_error("unknown fill rule")),
                };
                VectorCommand::FillPath(FillStyle {
                    material,
                    opacity,
                    fill_rule,
                })
            }
            11 => {
                let name = read_string(stream)?;
                let bounds = read_box2(stream)?;
                let opacity = stream.read_f32::<LittleEndian>()?;
                let transform = read_transform(stream)?;
                let image = resources
                    .find_texture(&name)
                    .ok_or_else(|| Error::NotFound(format!("texture '{}'", name)))?;
                VectorCommand::Image {
                    image,
                    bounds,
                    opacity,
                    transform,
                }
            }
            12 => {
                let text = read_string(stream)?;
                let font_name = read_string(stream)?;
                let alignment = match stream.read_u8()? {
                    0 => TextAlign::Start,
                    1 => TextAlign::Center,
                    2 => TextAlign::End,
                    _ => return Err(format_error("unknown text alignment")),
                };
                let max_length = stream.read_f32::<LittleEndian>()?;
                let line_height = stream.read_f32::<LittleEndian>()?;
                let transform = read_transform(stream)?;
                let range_count = read_count(stream, "text range count")?;
                let font = resources
                    .find_font(&font_name)
                    .ok_or_else(|| Error::NotFound(format!("font '{}'", font_name)))?;
                VectorCommand::Text(TextCommand {
                    text,
                    font,
                    alignment,
                    max_length,
                    line_height,
                    transform,
                    range_count,
                })
            }
            13 => {
                let start = stream.read_u32::<LittleEndian>()?;
                let count = stream.read_u32::<LittleEndian>()?;
                let position_offset = read_vec2(stream)?;
                let fill_material = read_string(stream)?;
                let outline_material = read_string(stream)?;
                let fill_opacity = stream.read_f32::<LittleEndian>()?;
                let outline_opacity = stream.read_f32::<LittleEndian>()?;
                let size = stream.read_f32::<LittleEndian>()?;
                let embolden = stream.read_f32::<LittleEndian>()?;
                let slant = stream.read_f32::<LittleEndian>()?;
                let outline_width = stream.read_f32::<LittleEndian>()?;
                let fuzziness = stream.read_f32::<LittleEndian>()?;
                VectorCommand::TextRange(TextRangeCommand {
                    start,
                    count,
                    position_offset,
                    fill_material,
                    outline_material,
                    fill_opacity,
                    outline_opacity,
                    size,
                    embolden,
                    slant,
                    outline_width,
                    fuzziness,
                })
            }
            _ => return Err(format_error("unknown command tag")),
        };
        commands.push(command);
    }

    Ok(VectorImageData {
        size,
        srgb,
        materials,
        commands,
    })
}

/// Save an image description to a stream.
pub fn save_image_data<B: Backend, W: Write>(
    stream: &mut W,
    data: &VectorImageData<B>,
    names: &dyn VectorResourceNames<B>,
) -> Result<()> {
    stream.write_all(MAGIC)?;
    stream.write_u32::<LittleEndian>(VERSION)?;
    write_vec2(stream, data.size)?;
    stream.write_u8(data.srgb as u8)?;

    // Material tables are grouped by kind, keeping index order within
    // each kind.
    let colors: Vec<_> = data
        .materials
        .iter()
        .filter_map(|(name, desc)| match desc {
            MaterialDesc::Color(color) => Some((name, color)),
            _ => None,
        })
        .collect();
    stream.write_u32::<LittleEndian>(colors.len() as u32)?;
    for (name, color) in colors {
        write_string(stream, name)?;
        stream.write_all(color)?;
    }

    let linear: Vec<_> = data
        .materials
        .iter()
        .filter_map(|(name, desc)| match desc {
            MaterialDesc::LinearGradient(gradient) => Some((name, gradient)),
            _ => None,
        })
        .collect();
    stream.write_u32::<LittleEndian>(linear.len() as u32)?;
    for (name, gradient) in linear {
        write_string(stream, name)?;
        write_stops(stream, &gradient.stops)?;
        write_vec2(stream, gradient.start)?;
        write_vec2(stream, gradient.end)?;
        stream.write_u8(edge_tag(gradient.edge))?;
        stream.write_u8(space_tag(gradient.space))?;
        write_transform(stream, &gradient.transform)?;
    }

    let radial: Vec<_> = data
        .materials
        .iter()
        .filter_map(|(name, desc)| match desc {
            MaterialDesc::RadialGradient(gradient) => Some((name, gradient)),
            _ => None,
        })
        .collect();
    stream.write_u32::<LittleEndian>(radial.len() as u32)?;
    for (name, gradient) in radial {
        write_string(stream, name)?;
        write_stops(stream, &gradient.stops)?;
        write_vec2(stream, gradient.center)?;
        stream.write_f32::<LittleEndian>(gradient.radius)?;
        write_vec2(stream, gradient.focus)?;
        stream.write_f32::<LittleEndian>(gradient.focus_radius)?;
        stream.write_u8(edge_tag(gradient.edge))?;
        stream.write_u8(space_tag(gradient.space))?;
        write_transform(stream, &gradient.transform)?;
    }

    stream.write_u32::<LittleEndian>(data.commands.len() as u32)?;
    for command in &data.commands {
        match command {
            VectorCommand::StartPath { transform, simple } => {
                stream.write_u8(0)?;
                write_transform(stream, transform)?;
                stream.write_u8(*simple as u8)?;
            }
            VectorCommand::Move { position } => {
                stream.write_u8(1)?;
                write_vec2(stream, *position)?;
            }
            VectorCommand::Line { end } => {
                stream.write_u8(2)?;
                write_vec2(stream, *end)?;
            }
            VectorCommand::Bezier {
                control1,
                control2,
                end,
            } => {
                stream.write_u8(3)?;
                write_vec2(stream, *control1)?;
                write_vec2(stream, *control2)?;
                write_vec2(stream, *end)?;
            }
            VectorCommand::Quadratic { control, end } => {
                stream.write_u8(4)?;
                write_vec2(stream, *control)?;
                write_vec2(stream, *end)?;
            }
            VectorCommand::Arc {
                radius,
                rotation,
                large_arc,
                clockwise,
                end,
            } => {
                stream.write_u8(5)?;
                write_vec2(stream, *radius)?;
                stream.write_f32::<LittleEndian>(*rotation)?;
                stream.write_u8(*large_arc as u8)?;
                stream.write_u8(*clockwise as u8)?;
                write_vec2(stream, *end)?;
            }
            VectorCommand::ClosePath => stream.write_u8(6)?,
            VectorCommand::Ellipse { center, radius } => {
                stream.write_u8(7)?;
                write_vec2(stream, *center)?;
                write_vec2(stream, *radius)?;
            }
            VectorCommand::Rectangle {
                bounds,
                corner_radius,
            } => {
                stream.write_u8(8)?;
                write_box2(stream, *bounds)?;
                write_vec2(stream, *corner_radius)?;
            }
            VectorCommand::StrokePath(style) => {
                stream.write_u8(9)?;
                write_string(stream, &style.material)?;
                stream.write_f32::<LittleEndian>(style.opacity)?;
                stream.write_u8(match style.cap {
                    LineCap::Butt => 0,
                    LineCap::Round => 1,
                    LineCap::Square => 2,
                })?;
                stream.write_u8(match style.join {
                    LineJoin::Miter => 0,
                    LineJoin::Bevel => 1,
                    LineJoin::Round => 2,
                })?;
                stream.write_f32::<LittleEndian>(style.width)?;
                stream.write_f32::<LittleEndian>(style.miter_limit)?;
                for value in &style.dash_array {
                    stream.write_f32::<LittleEndian>(*value)?;
                }
            }
            VectorCommand::FillPath(style) => {
                stream.write_u8(10)?;
                write_string(stream, &style.material)?;
                stream.write_f32::<LittleEndian>(style.opacity)?;
                stream.write_u8(match style.fill_rule {
                    FillRule::EvenOdd => 0,
                    FillRule::NonZero => 1,
                })?;
            }
            VectorCommand::Image {
                image,
                bounds,
                opacity,
                transform,
            } => {
                stream.write_u8(11)?;
                let name = names
                    .texture_name(image)
                    .ok_or(Error::InvalidArg("image texture has no saved name"))?;
                write_string(stream, &name)?;
                write_box2(stream, *bounds)?;
                stream.write_f32::<LittleEndian>(*opacity)?;
                write_transform(stream, transform)?;
            }
            VectorCommand::Text(text) => {
                stream.write_u8(12)?;
                write_string(stream, &text.text)?;
                let name = names
                    .font_name(&*text.font)
                    .ok_or(Error::InvalidArg("font has no saved name"))?;
                write_string(stream, &name)?;
                stream.write_u8(match text.alignment {
                    TextAlign::Start => 0,
                    TextAlign::Center => 1,
                    TextAlign::End => 2,
                })?;
                stream.write_f32::<LittleEndian>(text.max_length)?;
                stream.write_f32::<LittleEndian>(text.line_height)?;
                write_transform(stream, &text.transform)?;
                stream.write_u32::<LittleEndian>(text.range_count)?;
            }
            VectorCommand::TextRange(range) => {
                stream.write_u8(13)?;
                stream.write_u32::<LittleEndian>(range.start)?;
                stream.write_u32::<LittleEndian>(range.count)?;
                write_vec2(stream, range.position_offset)?;
                write_string(stream, &range.fill_material)?;
                write_string(stream, &range.outline_material)?;
                stream.write_f32::<LittleEndian>(range.fill_opacity)?;
                stream.write_f32::<LittleEndian>(range.outline_opacity)?;
                stream.write_f32::<LittleEndian>(range.size)?;
                stream.write_f32::<LittleEndian>(range.embolden)?;
                stream.write_f32::<LittleEndian>(range.slant)?;
                stream.write_f32::<LittleEndian>(range.outline_width)?;
                stream.write_f32::<LittleEndian>(range.fuzziness)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::TextCommand;
    use crate::image::VectorImage;
    use crate::material::MaterialSet;
    use crate::mock::{mock_materials, mock_texture, MockBackend, MockDevice, MockFont, MockTexture};
    use crate::scratch::VectorScratchData;
    use cgmath::SquareMatrix;

    struct MockResourceMap {
        textures: Vec<(String, MockTexture)>,
        fonts: Vec<(String, Arc<MockFont>)>,
    }

    impl MockResourceMap {
        fn new() -> Self {
            MockResourceMap {
                textures: vec![("decal".to_owned(), mock_texture(32, 32))],
                fonts: vec![("serif".to_owned(), Arc::new(MockFont::new()))],
            }
        }
    }

    impl VectorResources<MockBackend> for MockResourceMap {
        fn find_texture(&self, name: &str) -> Option<MockTexture> {
            self.textures
                .iter()
                .find(|(entry, _)| entry == name)
                .map(|(_, texture)| texture.clone())
        }
        fn find_font(&self, name: &str) -> Option<Arc<dyn Font<MockBackend>>> {
            self.fonts
                .iter()
                .find(|(entry, _)| entry == name)
                .map(|(_, font)| font.clone() as Arc<dyn Font<MockBackend>>)
        }
    }

    impl VectorResourceNames<MockBackend> for MockResourceMap {
        fn texture_name(&self, texture: &MockTexture) -> Option<String> {
            self.textures
                .iter()
                .find(|(_, entry)| entry == texture)
                .map(|(name, _)| name.clone())
        }
        fn font_name(&self, font: &dyn Font<MockBackend>) -> Option<String> {
            let wanted = font as *const dyn Font<MockBackend> as *const ();
            self.fonts
                .iter()
                .find(|(_, entry)| Arc::as_ptr(entry) as *const () == wanted)
                .map(|(name, _)| name.clone())
        }
    }

    fn sample_data(resources: &MockResourceMap) -> VectorImageData<MockBackend> {
        use crate::command::*;
        use crate::material::*;

        let materials = vec![
            ("ink".to_owned(), MaterialDesc::Color([10, 20, 30, 255])),
            (
                "sky".to_owned(),
                MaterialDesc::LinearGradient(LinearGradient {
                    stops: vec![
                        GradientStop {
                            position: 0.0,
                            color: [0, 0, 128, 255],
                        },
                        GradientStop {
                            position: 1.0,
                            color: [128, 200, 255, 255],
                        },
                    ],
                    start: Vector2::new(0.0, 0.0),
                    end: Vector2::new(0.0, 1.0),
                    edge: GradientEdge::Clamp,
                    space: MaterialSpace::Bounds,
                    transform: Matrix3::identity(),
                }),
            ),
            (
                "spot".to_owned(),
                MaterialDesc::RadialGradient(RadialGradient {
                    stops: vec![GradientStop {
                        position: 0.5,
                        color: [255, 255, 0, 255],
                    }],
                    center: Vector2::new(0.5, 0.5),
                    radius: 0.5,
                    focus: Vector2::new(0.4, 0.4),
                    focus_radius: 0.1,
                    edge: GradientEdge::Mirror,
                    space: MaterialSpace::Local,
                    transform: Matrix3::identity(),
                }),
            ),
        ];

        let commands = vec![
            VectorCommand::StartPath {
                transform: Matrix3::identity(),
                simple: true,
            },
            VectorCommand::Move {
                position: Vector2::new(0.0, 0.0),
            },
            VectorCommand::Line {
                end: Vector2::new(10.0, 0.0),
            },
            VectorCommand::Bezier {
                control1: Vector2::new(12.0, 2.0),
                control2: Vector2::new(12.0, 8.0),
                end: Vector2::new(10.0, 10.0),
            },
            VectorCommand::Quadratic {
                control: Vector2::new(5.0, 12.0),
                end: Vector2::new(0.0, 10.0),
            },
            VectorCommand::Arc {
                radius: Vector2::new(5.0, 5.0),
                rotation: 0.0,
                large_arc: false,
                clockwise: true,
                end: Vector2::new(0.0, 0.0),
            },
            VectorCommand::ClosePath,
            VectorCommand::FillPath(FillStyle {
                material: "ink".to_owned(),
                opacity: 1.0,
                fill_rule: FillRule::NonZero,
            }),
            VectorCommand::StartPath {
                transform: Matrix3::identity(),
                simple: true,
            },
            VectorCommand::Ellipse {
                center: Vector2::new(20.0, 20.0),
                radius: Vector2::new(5.0, 3.0),
            },
            VectorCommand::StrokePath(StrokeStyle {
                material: "sky".to_owned(),
                opacity: 0.75,
                cap: LineCap::Round,
                join: LineJoin::Round,
                width: 2.0,
                miter_limit: 4.0,
                dash_array: [4.0, 2.0, 0.0, 0.0],
            }),
            VectorCommand::StartPath {
                transform: Matrix3::identity(),
                simple: true,
            },
            VectorCommand::Rectangle {
                bounds: Box2::new(Vector2::new(30.0, 30.0), Vector2::new(40.0, 38.0)),
                corner_radius: Vector2::new(2.0, 2.0),
            },
            VectorCommand::FillPath(FillStyle {
                material: "spot".to_owned(),
                opacity: 1.0,
                fill_rule: FillRule::EvenOdd,
            }),
            VectorCommand::Image {
                image: resources.find_texture("decal").unwrap(),
                bounds: Box2::new(Vector2::new(50.0, 50.0), Vector2::new(60.0, 60.0)),
                opacity: 0.9,
                transform: Matrix3::identity(),
            },
            VectorCommand::Text(TextCommand {
                text: "hi".to_owned(),
                font: resources.find_font("serif").unwrap(),
                alignment: TextAlign::Center,
                max_length: 100.0,
                line_height: 1.5,
                transform: Matrix3::identity(),
                range_count: 1,
            }),
            VectorCommand::TextRange(TextRangeCommand {
                start: 0,
                count: 2,
                position_offset: Vector2::new(1.0, 1.0),
                fill_material: "ink".to_owned(),
                outline_material: String::new(),
                fill_opacity: 1.0,
                outline_opacity: 0.0,
                size: 14.0,
                embolden: 0.1,
                slant: 0.0,
                outline_width: 0.0,
                fuzziness: 1.0,
            }),
        ];

        VectorImageData {
            size: Vector2::new(100.0, 80.0),
            srgb: false,
            materials,
            commands,
        }
    }

    fn save(data: &VectorImageData<MockBackend>, names: &MockResourceMap) -> Vec<u8> {
        let mut bytes = Vec::new();
        save_image_data(&mut bytes, data, names).unwrap();
        bytes
    }

    #[test]
    fn save_load_is_byte_stable() {
        let resources = MockResourceMap::new();
        let data = sample_data(&resources);
        let bytes = save(&data, &resources);

        let mut cursor = &bytes[..];
        let reloaded = load_image_data(&mut cursor, &resources).unwrap();
        assert!(cursor.is_empty(), "trailing bytes after load");
        assert_eq!(reloaded.size, data.size);
        assert_eq!(reloaded.materials.len(), data.materials.len());
        assert_eq!(reloaded.commands.len(), data.commands.len());

        let rewritten = save(&reloaded, &resources);
        assert_eq!(bytes, rewritten);
    }

    #[test]
    fn round_trip_builds_identical_images() {
        let resources = MockResourceMap::new();
        let data = sample_data(&resources);
        let bytes = save(&data, &resources);

        let device = MockDevice::default();
        let mut scratch = VectorScratchData::new();
        let (shared, _) = mock_materials();

        let original =
            VectorImage::from_data(&device, &mut scratch, sample_data(&resources), &shared, 1.0)
                .unwrap();
        let reloaded = VectorImage::load_data(
            &device,
            &mut scratch,
            &bytes,
            &resources,
            &shared,
            1.0,
        )
        .unwrap();

        // Byte-identical GPU buffer and info records.
        assert_eq!(
            original.buffer().unwrap().0.data,
            reloaded.buffer().unwrap().0.data
        );
        assert_eq!(original.info_records(), reloaded.info_records());
        assert_eq!(original.piece_count(), reloaded.piece_count());
        assert_eq!(original.size(), reloaded.size());
    }

    #[test]
    fn bad_magic_is_a_format_error() {
        let resources = MockResourceMap::new();
        let mut bytes = save(&sample_data(&resources), &resources);
        bytes[0] = b'X';
        let mut cursor = &bytes[..];
        assert!(matches!(
            load_image_data::<MockBackend, _>(&mut cursor, &resources),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn unknown_command_tag_is_a_format_error() {
        let resources = MockResourceMap::new();
        let data = VectorImageData::<MockBackend> {
            size: Vector2::new(10.0, 10.0),
            srgb: false,
            materials: Vec::new(),
            commands: vec![VectorCommand::ClosePath],
        };
        let mut bytes = save(&data, &resources);
        // The single command's tag is the last byte.
        *bytes.last_mut().unwrap() = 200;
        let mut cursor = &bytes[..];
        assert!(matches!(
            load_image_data::<MockBackend, _>(&mut cursor, &resources),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn truncated_streams_fail_with_io_errors() {
        let resources = MockResourceMap::new();
        let bytes = save(&sample_data(&resources), &resources);
        let mut cursor = &bytes[..bytes.len() / 2];
        assert!(load_image_data::<MockBackend, _>(&mut cursor, &resources).is_err());
    }

    #[test]
    fn missing_resources_fail_with_not_found() {
        let resources = MockResourceMap::new();
        let bytes = save(&sample_data(&resources), &resources);
        let empty = MockResourceMap {
            textures: Vec::new(),
            fonts: Vec::new(),
        };
        let mut cursor = &bytes[..];
        assert!(matches!(
            load_image_data::<MockBackend, _>(&mut cursor, &empty),
            Err(Error::NotFound(_))
        ));
    }
}
