//! Material identifiers.
//!
//! A material is everything that forces a new draw call when it changes: shader program,
//! bound texture and blend function. Two quad commands batch together only when their
//! [`MaterialId`]s are equal.

/// Built-in shader programs.
#[repr(u8)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Program {
    /// Texture sample multiplied by vertex color.
    PositionTextureColor = 0,
    /// Vertex color only; the bound texture is ignored.
    PositionColor = 1,
}

impl Program {
    #[inline]
    fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Program::PositionTextureColor),
            1 => Some(Program::PositionColor),
            _ => None,
        }
    }
}

/// Backend texture handle. `TextureId::NONE` binds a 1x1 white texture.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct TextureId(pub u32);

impl TextureId {
    pub const NONE: TextureId = TextureId(0);
}

#[repr(u8)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BlendFactor {
    Zero = 0,
    One = 1,
    SrcAlpha = 2,
    OneMinusSrcAlpha = 3,
    DstColor = 4,
    OneMinusDstColor = 5,
    SrcColor = 6,
    OneMinusSrcColor = 7,
}

impl BlendFactor {
    #[inline]
    fn from_bits(bits: u8) -> Option<Self> {
        use BlendFactor::*;
        Some(match bits {
            0 => Zero,
            1 => One,
            2 => SrcAlpha,
            3 => OneMinusSrcAlpha,
            4 => DstColor,
            5 => OneMinusDstColor,
            6 => SrcColor,
            7 => OneMinusSrcColor,
            _ => return None,
        })
    }
}

/// Color blend equation `src * src_factor + dst * dst_factor`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct BlendFunc {
    pub src: BlendFactor,
    pub dst: BlendFactor,
}

impl BlendFunc {
    pub const DISABLE: BlendFunc = BlendFunc::new(BlendFactor::One, BlendFactor::Zero);
    pub const ALPHA_PREMULTIPLIED: BlendFunc =
        BlendFunc::new(BlendFactor::One, BlendFactor::OneMinusSrcAlpha);
    pub const ALPHA_NON_PREMULTIPLIED: BlendFunc =
        BlendFunc::new(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha);
    pub const ADDITIVE: BlendFunc = BlendFunc::new(BlendFactor::SrcAlpha, BlendFactor::One);

    #[inline]
    pub const fn new(src: BlendFactor, dst: BlendFactor) -> Self {
        Self { src, dst }
    }
}

impl Default for BlendFunc {
    fn default() -> Self {
        BlendFunc::ALPHA_PREMULTIPLIED
    }
}

/// Program + texture + blend state of a draw.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Material {
    pub program: Program,
    pub texture: TextureId,
    pub blend: BlendFunc,
}

impl Material {
    #[inline]
    pub const fn new(program: Program, texture: TextureId, blend: BlendFunc) -> Self {
        Self { program, texture, blend }
    }

    /// Textured sprite with premultiplied alpha blending.
    #[inline]
    pub const fn sprite(texture: TextureId) -> Self {
        Self::new(Program::PositionTextureColor, texture, BlendFunc::ALPHA_PREMULTIPLIED)
    }

    /// Untextured, vertex-colored geometry with premultiplied alpha blending.
    #[inline]
    pub const fn solid() -> Self {
        Self::new(Program::PositionColor, TextureId::NONE, BlendFunc::ALPHA_PREMULTIPLIED)
    }

    /// Packs the material into its identifier.
    ///
    /// Layout (most to least significant): 8 reserved bits, program (8), texture (32),
    /// blend src (8), blend dst (8). Distinct materials never share an id.
    #[inline]
    pub const fn id(&self) -> MaterialId {
        MaterialId(
            (self.program as u64) << 48
                | (self.texture.0 as u64) << 16
                | (self.blend.src as u64) << 8
                | self.blend.dst as u64,
        )
    }
}

/// Opaque, equality-comparable material token.
///
/// Batching compares ids bit for bit; nothing else about a quad command affects batching.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default, PartialOrd, Ord)]
pub struct MaterialId(pub u64);

impl MaterialId {
    /// Decodes the id back into a material. Returns `None` for ids not produced by
    /// [`Material::id`].
    pub fn material(self) -> Option<Material> {
        let bits = self.0;
        if bits >> 56 != 0 {
            return None;
        }
        let program = Program::from_bits((bits >> 48) as u8)?;
        let texture = TextureId((bits >> 16) as u32);
        let src = BlendFactor::from_bits((bits >> 8) as u8)?;
        let dst = BlendFactor::from_bits(bits as u8)?;
        Some(Material::new(program, texture, BlendFunc::new(src, dst)))
    }
}

impl From<Material> for MaterialId {
    #[inline]
    fn from(m: Material) -> Self {
        m.id()
    }
}
