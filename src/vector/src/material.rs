//! Named materials: solid colors and gradients.
//!
//! Materials live in named sets. Stroke, fill and text commands resolve
//! names against the shared set first, then the image-local set; the
//! resolved index and source tag travel with the draw piece. At image
//! creation a set packs its parameters into an info texture and its color
//! ramps into a palette texture, both sampled by the shaders.

use cgmath::{Matrix3, Vector2};

use hal::buffer::MemoryFlags;
use hal::format::Format;
use hal::image::{TextureInfo, TextureUsage};
use hal::{Backend, Device, Error, Result};

use crate::scratch::MaterialSource;

/// Most materials a set can hold; indices must fit the vertex layout.
pub const MAX_MATERIALS: usize = 1024;
/// Horizontal resolution of gradient ramps in the palette texture.
pub const RAMP_WIDTH: u32 = 256;

/// Kinds of materials a name can resolve to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MaterialType {
    Color,
    LinearGradient,
    RadialGradient,
}

/// Behavior of gradient coordinates outside `[0, 1]`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GradientEdge {
    Clamp,
    Repeat,
    Mirror,
}

/// Coordinate space gradient geometry is defined in.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MaterialSpace {
    /// Image coordinates.
    Local,
    /// Normalized to the bounds of the shape being drawn.
    Bounds,
}

/// One gradient color stop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientStop {
    /// Stop position in `[0, 1]`.
    pub position: f32,
    /// RGBA8 color.
    pub color: [u8; 4],
}

/// A linear gradient between two points.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearGradient {
    pub stops: Vec<GradientStop>,
    pub start: Vector2<f32>,
    pub end: Vector2<f32>,
    pub edge: GradientEdge,
    pub space: MaterialSpace,
    pub transform: Matrix3<f32>,
}

/// A radial gradient with an optional off-center focus.
#[derive(Clone, Debug, PartialEq)]
pub struct RadialGradient {
    pub stops: Vec<GradientStop>,
    pub center: Vector2<f32>,
    pub radius: f32,
    pub focus: Vector2<f32>,
    pub focus_radius: f32,
    pub edge: GradientEdge,
    pub space: MaterialSpace,
    pub transform: Matrix3<f32>,
}

/// A material description.
#[derive(Clone, Debug, PartialEq)]
pub enum MaterialDesc {
    Color([u8; 4]),
    LinearGradient(LinearGradient),
    RadialGradient(RadialGradient),
}

impl MaterialDesc {
    pub fn material_type(&self) -> MaterialType {
        match self {
            MaterialDesc::Color(_) => MaterialType::Color,
            MaterialDesc::LinearGradient(_) => MaterialType::LinearGradient,
            MaterialDesc::RadialGradient(_) => MaterialType::RadialGradient,
        }
    }

    fn stops(&self) -> Option<&[GradientStop]> {
        match self {
            MaterialDesc::Color(_) => None,
            MaterialDesc::LinearGradient(gradient) => Some(&gradient.stops),
            MaterialDesc::RadialGradient(gradient) => Some(&gradient.stops),
        }
    }
}

/// A named material table with its packed GPU textures.
#[derive(Debug)]
pub struct MaterialSet<B: Backend> {
    entries: Vec<(String, MaterialDesc)>,
    info_texture: Option<B::Texture>,
    color_texture: Option<B::Texture>,
}

impl<B: Backend> Default for MaterialSet<B> {
    fn default() -> Self {
        MaterialSet::new()
    }
}

impl<B: Backend> MaterialSet<B> {
    pub fn new() -> Self {
        MaterialSet {
            entries: Vec::new(),
            info_texture: None,
            color_texture: None,
        }
    }

    /// Number of materials in the set.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set holds no materials.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add a named material. Names are unique within a set.
    pub fn add(&mut self, name: &str, desc: MaterialDesc) -> Result<()> {
        if name.is_empty() {
            return Err(Error::InvalidArg("material name is empty"));
        }
        if self.entries.len() >= MAX_MATERIALS {
            return Err(Error::IndexOutOfRange("material set is full"));
        }
        if self.find(name).is_some() {
            return Err(Error::InvalidArg("material name already in use"));
        }
        if let Some(stops) = desc.stops() {
            if stops.is_empty() {
                return Err(Error::InvalidArg("gradient has no stops"));
            }
            let ordered = stops.windows(2).all(|pair| pair[0].position <= pair[1].position);
            if !ordered {
                return Err(Error::InvalidArg("gradient stops are not sorted"));
            }
        }
        self.entries.push((name.to_owned(), desc));
        // Any packed textures are stale now.
        self.info_texture = None;
        self.color_texture = None;
        Ok(())
    }

    /// Look up a material by name.
    pub fn find(&self, name: &str) -> Option<(u32, MaterialType)> {
        self.entries
            .iter()
            .position(|(entry_name, _)| entry_name == name)
            .map(|index| (index as u32, self.entries[index].1.material_type()))
    }

    /// The material at an index.
    pub fn material(&self, index: u32) -> Option<&MaterialDesc> {
        self.entries.get(index as usize).map(|(_, desc)| desc)
    }

    /// Iterate `(name, description)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MaterialDesc)> {
        self.entries.iter().map(|(name, desc)| (name.as_str(), desc))
    }

    /// The packed parameter texture, if `create_textures` ran.
    pub fn info_texture(&self) -> Option<&B::Texture> {
        self.info_texture.as_ref()
    }

    /// The packed color ramp texture, if `create_textures` ran.
    pub fn color_texture(&self) -> Option<&B::Texture> {
        self.color_texture.as_ref()
    }

    /// Height of the packed textures: the next power of two covering the
    /// set.
    pub fn texture_height(&self) -> u32 {
        (self.entries.len() as u32).next_power_of_two()
    }

    /// Pack the set into its GPU textures.
    ///
    /// The info texture is RGBA32F, four texels per material:
    /// `(type, edge, space, stop count)`, the gradient parameters, and the
    /// two transform rows. The color texture is an RGBA8 ramp per
    /// material.
    pub fn create_textures(&mut self, device: &B::Device) -> Result<()> {
        if self.entries.is_empty() {
            return Ok(());
        }
        if !device.texture_format_supported(Format::INFO_TEXTURE) {
            error!("float textures are required for vector materials");
            return Err(Error::NotSupported("float textures"));
        }

        let height = (self.entries.len() as u32).next_power_of_two();
        let mut info_data = vec![0.0f32; (4 * 4 * height) as usize];
        for (index, (_, desc)) in self.entries.iter().enumerate() {
            let row = &mut info_data[index * 16..(index + 1) * 16];
            let (ty, edge, space, stop_count, transform) = match desc {
                MaterialDesc::Color(_) => (0.0, 0.0, 0.0, 0.0, None),
                MaterialDesc::LinearGradient(gradient) => {
                    row[4] = gradient.start.x;
                    row[5] = gradient.start.y;
                    row[6] = gradient.end.x;
                    row[7] = gradient.end.y;
                    (
                        1.0,
                        edge_value(gradient.edge),
                        space_value(gradient.space),
                        gradient.stops.len() as f32,
                        Some(&gradient.transform),
                    )
                }
                MaterialDesc::RadialGradient(gradient) => {
                    row[4] = gradient.center.x;
                    row[5] = gradient.center.y;
                    row[6] = gradient.radius;
                    row[7] = gradient.focus_radius;
                    row[14] = gradient.focus.x;
                    row[15] = gradient.focus.y;
                    (
                        2.0,
                        edge_value(gradient.edge),
                        space_value(gradient.space),
                        gradient.stops.len() as f32,
                        Some(&gradient.transform),
                    )
                }
            };
            row[0] = ty;
            row[1] = edge;
            row[2] = space;
            row[3] = stop_count;
            if let Some(transform) = transform {
                row[8] = transform.x.x;
                row[9] = transform.x.y;
                row[10] = transform.y.x;
                row[11] = transform.y.y;
                row[12] = transform.z.x;
                row[13] = transform.z.y;
            }
        }

        let info_texture_info = TextureInfo::new_2d(Format::INFO_TEXTURE, 4, height);
        self.info_texture = Some(device.create_texture(
            &info_texture_info,
            TextureUsage::TEXTURE,
            MemoryFlags::STATIC | MemoryFlags::GPU_ONLY,
            Some(bytemuck::cast_slice(&info_data)),
        )?);

        let mut ramp_data = vec![0u8; (RAMP_WIDTH * 4 * height) as usize];
        for (index, (_, desc)) in self.entries.iter().enumerate() {
            let row = &mut ramp_data
                [index * (RAMP_WIDTH * 4) as usize..(index + 1) * (RAMP_WIDTH * 4) as usize];
            match desc {
                MaterialDesc::Color(color) => {
                    for texel in row.chunks_exact_mut(4) {
                        texel.copy_from_slice(color);
                    }
                }
                _ => {
                    let stops = desc.stops().unwrap();
                    for (x, texel) in row.chunks_exact_mut(4).enumerate() {
                        let t = x as f32 / (RAMP_WIDTH - 1) as f32;
                        texel.copy_from_slice(&evaluate_stops(stops, t));
                    }
                }
            }
        }

        let ramp_info = TextureInfo::new_2d(
            Format::Standard(
                hal::format::SurfaceType::Rgba8,
                hal::format::ChannelType::Unorm,
            ),
            RAMP_WIDTH,
            height,
        );
        self.color_texture = Some(device.create_texture(
            &ramp_info,
            TextureUsage::TEXTURE,
            MemoryFlags::STATIC | MemoryFlags::GPU_ONLY,
            Some(&ramp_data),
        )?);
        Ok(())
    }
}

fn edge_value(edge: GradientEdge) -> f32 {
    match edge {
        GradientEdge::Clamp => 0.0,
        GradientEdge::Repeat => 1.0,
        GradientEdge::Mirror => 2.0,
    }
}

fn space_value(space: MaterialSpace) -> f32 {
    match space {
        MaterialSpace::Local => 0.0,
        MaterialSpace::Bounds => 1.0,
    }
}

/// Sample a sorted stop list at `t` with linear interpolation.
pub(crate) fn evaluate_stops(stops: &[GradientStop], t: f32) -> [u8; 4] {
    debug_assert!(!stops.is_empty());
    if t <= stops[0].position {
        return stops[0].color;
    }
    for pair in stops.windows(2) {
        if t <= pair[1].position {
            let span = pair[1].position - pair[0].position;
            let factor = if span > 0.0 {
                (t - pair[0].position) / span
            } else {
                1.0
            };
            let mut color = [0u8; 4];
            for (i, channel) in color.iter_mut().enumerate() {
                let a = pair[0].color[i] as f32;
                let b = pair[1].color[i] as f32;
                *channel = (a + (b - a) * factor).round() as u8;
            }
            return color;
        }
    }
    stops[stops.len() - 1].color
}

/// Resolve a material name against the shared set, then the local set.
pub(crate) fn find_material<B: Backend>(
    shared: &MaterialSet<B>,
    local: &MaterialSet<B>,
    name: &str,
) -> Result<(u32, MaterialType, MaterialSource)> {
    if let Some((index, ty)) = shared.find(name) {
        return Ok((index, ty, MaterialSource::Shared));
    }
    if let Some((index, ty)) = local.find(name) {
        return Ok((index, ty, MaterialSource::Local));
    }
    error!("material '{}' not found", name);
    Err(Error::NotFound(format!("material '{}'", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBackend;

    #[test]
    fn names_resolve_shared_then_local() {
        let mut shared: MaterialSet<MockBackend> = MaterialSet::new();
        let mut local: MaterialSet<MockBackend> = MaterialSet::new();
        shared.add("red", MaterialDesc::Color([255, 0, 0, 255])).unwrap();
        local.add("red", MaterialDesc::Color([1, 2, 3, 4])).unwrap();
        local.add("blue", MaterialDesc::Color([0, 0, 255, 255])).unwrap();

        let (index, ty, source) = find_material(&shared, &local, "red").unwrap();
        assert_eq!((index, ty, source), (0, MaterialType::Color, MaterialSource::Shared));
        let (_, _, source) = find_material(&shared, &local, "blue").unwrap();
        assert_eq!(source, MaterialSource::Local);
        assert!(matches!(
            find_material(&shared, &local, "green"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut set: MaterialSet<MockBackend> = MaterialSet::new();
        set.add("a", MaterialDesc::Color([0; 4])).unwrap();
        assert!(set.add("a", MaterialDesc::Color([1; 4])).is_err());
        assert!(set.add("", MaterialDesc::Color([1; 4])).is_err());
    }

    #[test]
    fn unsorted_gradient_stops_are_rejected() {
        let mut set: MaterialSet<MockBackend> = MaterialSet::new();
        let gradient = LinearGradient {
            stops: vec![
                GradientStop { position: 0.8, color: [0; 4] },
                GradientStop { position: 0.2, color: [255; 4] },
            ],
            start: Vector2::new(0.0, 0.0),
            end: Vector2::new(1.0, 0.0),
            edge: GradientEdge::Clamp,
            space: MaterialSpace::Bounds,
            transform: cgmath::SquareMatrix::identity(),
        };
        assert!(set.add("bad", MaterialDesc::LinearGradient(gradient)).is_err());
    }

    #[test]
    fn stop_evaluation_interpolates() {
        let stops = [
            GradientStop { position: 0.0, color: [0, 0, 0, 255] },
            GradientStop { position: 1.0, color: [200, 100, 0, 255] },
        ];
        assert_eq!(evaluate_stops(&stops, -1.0), [0, 0, 0, 255]);
        assert_eq!(evaluate_stops(&stops, 2.0), [200, 100, 0, 255]);
        assert_eq!(evaluate_stops(&stops, 0.5), [100, 50, 0, 255]);
    }
}
