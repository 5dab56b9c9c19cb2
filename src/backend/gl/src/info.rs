//! Driver feature probing.
//!
//! The driver is interrogated exactly once, at adapter creation; everything
//! downstream consults the derived capability sets instead of re-querying.

use std::collections::HashSet;
use std::fmt;

use crate::gl::{consts, Context};

/// A version number of the driver implementation.
#[derive(Copy, Clone, Eq, Ord, PartialEq, PartialOrd)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub revision: Option<u32>,
    pub is_embedded: bool,
}

impl Version {
    /// Create a new version number.
    pub fn new(major: u32, minor: u32, revision: Option<u32>) -> Version {
        Version {
            major,
            minor,
            revision,
            is_embedded: false,
        }
    }

    /// According to the specification, the version information follows
    ///
    /// ```text
    /// <release>  ::= <major> "." <minor> ["." <revision>]
    /// <version>  ::= ["OpenGL ES "] <release> [" " <vendor-info>]
    /// ```
    ///
    /// This parse is intentionally lenient and recovers at least the first
    /// two numbers whenever possible.
    pub fn parse(mut src: &str) -> Result<Version, String> {
        let es = src.starts_with("OpenGL ES ");
        if es {
            src = &src["OpenGL ES ".len()..];
        }
        let version = match src.find(' ') {
            Some(i) => &src[..i],
            None => src,
        };

        let mut it = version.split('.');
        let major = it.next().and_then(|s| s.parse().ok());
        let minor = it.next().and_then(|s| s.parse().ok());
        let revision = it.next().and_then(|s| s.parse().ok());

        match (major, minor) {
            (Some(major), Some(minor)) => Ok(Version {
                major,
                minor,
                revision,
                is_embedded: es,
            }),
            _ => Err(src.to_owned()),
        }
    }
}

impl fmt::Debug for Version {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.revision {
            Some(revision) => write!(f, "{}.{}.{}", self.major, self.minor, revision),
            None => write!(f, "{}.{}", self.major, self.minor),
        }
    }
}

bitflags! {
    /// Optional driver features that older implementations may lack.
    pub struct LegacyFeatures: u32 {
        /// Instanced draw calls.
        const DRAW_INSTANCED = 0x1;
        /// Indexed draws with a base vertex offset.
        const DRAW_INDEXED_BASE = 0x2;
        /// Instanced indexed draws with a base vertex offset.
        const DRAW_INDEXED_INSTANCED_BASE = 0x4;
        /// Indirect draw and dispatch execution.
        const INDIRECT_EXECUTION = 0x8;
        /// Compute shader dispatch.
        const COMPUTE = 0x10;
        /// Tessellation patch primitives.
        const TESSELLATION = 0x20;
        /// Timestamp queries.
        const TIMESTAMP_QUERY = 0x40;
        /// 64-bit query results.
        const QUERY_64 = 0x80;
    }
}

bitflags! {
    /// Capabilities that change which code path the backend takes.
    pub struct PrivateCaps: u32 {
        /// Vertex array objects.
        const VERTEX_ARRAY = 0x1;
        /// Framebuffer objects.
        const FRAMEBUFFER = 0x2;
        /// Typed per-attachment clears (`glClearBuffer*`).
        const CLEAR_BUFFER = 0x4;
        /// Separate sampler objects.
        const SAMPLER_OBJECT = 0x8;
        /// Direct image-to-image copies.
        const COPY_IMAGE = 0x10;
        /// Buffer range mapping.
        const MAP_BUFFER_RANGE = 0x20;
        /// Persistent/coherent buffer storage.
        const BUFFER_STORAGE = 0x40;
        /// Reading buffer contents back to the host.
        const BUFFER_READ_BACK = 0x80;
        /// Sync objects.
        const SYNC = 0x100;
        /// Per-attachment blend state.
        const INDEXED_BLEND = 0x200;
        /// Texture buffers.
        const TEXTURE_BUFFER = 0x400;
        /// Depth bounds testing.
        const DEPTH_BOUNDS = 0x800;
        /// Debug group annotations.
        const DEBUG_GROUPS = 0x1000;
        /// Shader memory barriers.
        const MEMORY_BARRIER = 0x2000;
        /// Multisampled renderbuffers and textures.
        const MULTISAMPLE = 0x4000;
    }
}

/// Numeric limits probed from the driver.
#[derive(Clone, Copy, Debug)]
pub struct Limits {
    pub max_texture_size: u32,
    pub max_clip_distances: u32,
    pub max_color_attachments: u32,
    pub max_samples: u32,
    /// Line widths outside this range are clamped before reaching the
    /// driver.
    pub line_width_range: [f32; 2],
}

/// Implementation information gathered at initialization.
#[derive(Debug)]
pub struct Info {
    pub version: Version,
    pub extensions: HashSet<String>,
    pub legacy_features: LegacyFeatures,
    pub private_caps: PrivateCaps,
    pub limits: Limits,
}

impl Info {
    /// Probe the driver.
    pub fn get(ctx: &dyn Context) -> Info {
        let version = match Version::parse(&ctx.get_string(consts::VERSION)) {
            Ok(version) => version,
            Err(src) => {
                warn!("unparsable driver version {:?}, assuming 2.1", src);
                Version::new(2, 1, None)
            }
        };
        let extensions: HashSet<String> = ctx
            .get_string(consts::EXTENSIONS)
            .split_whitespace()
            .map(|s| s.to_owned())
            .collect();

        let supported = |major, minor, ext: &str| {
            version >= Version::new(major, minor, None) || extensions.contains(ext)
        };

        let mut legacy = LegacyFeatures::empty();
        if supported(3, 1, "GL_ARB_draw_instanced") {
            legacy |= LegacyFeatures::DRAW_INSTANCED;
        }
        if supported(3, 2, "GL_ARB_draw_elements_base_vertex") {
            legacy |= LegacyFeatures::DRAW_INDEXED_BASE;
            legacy |= LegacyFeatures::DRAW_INDEXED_INSTANCED_BASE;
        }
        if supported(4, 0, "GL_ARB_draw_indirect") {
            legacy |= LegacyFeatures::INDIRECT_EXECUTION;
        }
        if supported(4, 3, "GL_ARB_compute_shader") {
            legacy |= LegacyFeatures::COMPUTE;
        }
        if supported(4, 0, "GL_ARB_tessellation_shader") {
            legacy |= LegacyFeatures::TESSELLATION;
        }
        if supported(3, 3, "GL_ARB_timer_query") {
            legacy |= LegacyFeatures::TIMESTAMP_QUERY;
            legacy |= LegacyFeatures::QUERY_64;
        }

        let mut caps = PrivateCaps::empty();
        if supported(3, 0, "GL_ARB_vertex_array_object") {
            caps |= PrivateCaps::VERTEX_ARRAY;
        }
        if supported(3, 0, "GL_ARB_framebuffer_object") {
            caps |= PrivateCaps::FRAMEBUFFER;
            caps |= PrivateCaps::CLEAR_BUFFER;
            caps |= PrivateCaps::MULTISAMPLE;
        }
        if supported(3, 3, "GL_ARB_sampler_objects") {
            caps |= PrivateCaps::SAMPLER_OBJECT;
        }
        if supported(4, 3, "GL_ARB_copy_image") {
            caps |= PrivateCaps::COPY_IMAGE;
        }
        if supported(3, 0, "GL_ARB_map_buffer_range") {
            caps |= PrivateCaps::MAP_BUFFER_RANGE;
            caps |= PrivateCaps::BUFFER_READ_BACK;
        }
        if supported(4, 4, "GL_ARB_buffer_storage") {
            caps |= PrivateCaps::BUFFER_STORAGE;
        }
        if supported(3, 2, "GL_ARB_sync") {
            caps |= PrivateCaps::SYNC;
        }
        if supported(4, 0, "GL_ARB_draw_buffers_blend") {
            caps |= PrivateCaps::INDEXED_BLEND;
        }
        if supported(3, 1, "GL_ARB_texture_buffer_object") {
            caps |= PrivateCaps::TEXTURE_BUFFER;
        }
        if extensions.contains("GL_EXT_depth_bounds_test") {
            caps |= PrivateCaps::DEPTH_BOUNDS;
        }
        if supported(4, 3, "GL_KHR_debug") {
            caps |= PrivateCaps::DEBUG_GROUPS;
        }
        if supported(4, 2, "GL_ARB_shader_image_load_store") {
            caps |= PrivateCaps::MEMORY_BARRIER;
        }

        let limits = Limits {
            max_texture_size: ctx.get_integer(consts::MAX_TEXTURE_SIZE).max(64) as u32,
            max_clip_distances: ctx.get_integer(consts::MAX_CLIP_DISTANCES).max(0) as u32,
            max_color_attachments: ctx.get_integer(consts::MAX_COLOR_ATTACHMENTS).max(1) as u32,
            max_samples: ctx.get_integer(consts::MAX_SAMPLES).max(1) as u32,
            line_width_range: ctx.get_float_2(consts::ALIASED_LINE_WIDTH_RANGE),
        };

        Info {
            version,
            extensions,
            legacy_features: legacy,
            private_caps: caps,
            limits,
        }
    }

    /// Returns `true` if the implementation reports the extension.
    pub fn is_extension_supported(&self, ext: &str) -> bool {
        self.extensions.contains(ext)
    }

    /// Version or extension check, the way most GL features are gated.
    pub fn is_supported(&self, major: u32, minor: u32, ext: &str) -> bool {
        self.version >= Version::new(major, minor, None) || self.is_extension_supported(ext)
    }
}

#[cfg(test)]
mod tests {
    use super::Version;

    #[test]
    fn test_version_parse() {
        assert!(Version::parse("1").is_err());
        assert!(Version::parse("1.").is_err());
        assert!(Version::parse("1 h3l1o. W0rld").is_err());
        assert_eq!(Version::parse("4.1"), Ok(Version::new(4, 1, None)));
        assert_eq!(Version::parse("4.1.2"), Ok(Version::new(4, 1, Some(2))));
        assert_eq!(
            Version::parse("4.6.0 NVIDIA 520.56.06"),
            Ok(Version::new(4, 6, Some(0)))
        );
        let es = Version::parse("OpenGL ES 3.2 Mesa").unwrap();
        assert!(es.is_embedded);
        assert_eq!((es.major, es.minor), (3, 2));
    }

    #[test]
    fn test_version_order() {
        assert!(Version::new(3, 0, None) < Version::new(3, 2, None));
        assert!(Version::new(3, 2, None) < Version::new(4, 0, None));
        assert!(Version::new(4, 0, Some(1)) > Version::new(4, 0, None));
    }

    #[test]
    fn test_probe_full_caps() {
        use super::{LegacyFeatures, PrivateCaps};
        let ctx = crate::mock::MockContext::new();
        let info = super::Info::get(&ctx);
        assert!(info.private_caps.contains(PrivateCaps::FRAMEBUFFER));
        assert!(info.private_caps.contains(PrivateCaps::CLEAR_BUFFER));
        assert!(info.private_caps.contains(PrivateCaps::DEPTH_BOUNDS));
        assert!(info.legacy_features.contains(LegacyFeatures::DRAW_INDEXED_BASE));
        assert_eq!(info.limits.line_width_range, [1.0, 8.0]);
    }

    #[test]
    fn test_probe_reduced_caps() {
        use super::PrivateCaps;
        let ctx = crate::mock::MockContext::with_driver("2.1 Mesa", "");
        let info = super::Info::get(&ctx);
        assert!(!info.private_caps.contains(PrivateCaps::CLEAR_BUFFER));
        assert!(!info.private_caps.contains(PrivateCaps::SYNC));
        assert!(!info
            .legacy_features
            .contains(super::LegacyFeatures::DRAW_INDEXED_BASE));
    }
}
