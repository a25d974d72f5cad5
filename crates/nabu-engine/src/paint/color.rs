/// Linear premultiplied RGBA color.
///
/// Invariant:
/// - `rgb` components are multiplied by `a` (premultiplied alpha), matching the default
///   `BlendFunc::ALPHA_PREMULTIPLIED` material blend.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Color {
    pub r: f32, // premultiplied
    pub g: f32, // premultiplied
    pub b: f32, // premultiplied
    pub a: f32,
}

impl Color {
    #[inline]
    pub const fn transparent() -> Self {
        Self { r: 0.0, g: 0.0, b: 0.0, a: 0.0 }
    }

    #[inline]
    pub const fn white() -> Self {
        Self { r: 1.0, g: 1.0, b: 1.0, a: 1.0 }
    }

    #[inline]
    pub const fn black() -> Self {
        Self { r: 0.0, g: 0.0, b: 0.0, a: 1.0 }
    }

    /// Creates a premultiplied color from premultiplied components.
    #[inline]
    pub const fn from_premul(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates a premultiplied color from straight alpha components in `[0, 1]`.
    #[inline]
    pub fn from_straight(r: f32, g: f32, b: f32, a: f32) -> Self {
        let a = a.clamp(0.0, 1.0);
        Self {
            r: r.clamp(0.0, 1.0) * a,
            g: g.clamp(0.0, 1.0) * a,
            b: b.clamp(0.0, 1.0) * a,
            a,
        }
    }

    /// Creates a premultiplied color from straight RGBA bytes.
    #[inline]
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::from_straight(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, a as f32 / 255.0)
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }

    /// Clamps all channels to [0, 1] and enforces premultiplication.
    ///
    /// A non-finite alpha becomes 0, which also zeroes the color channels.
    #[inline]
    pub fn clamped(self) -> Self {
        // `a` bounds the rgb clamps below, and `f32::clamp` panics on a NaN bound.
        let a = if self.a.is_finite() { self.a.clamp(0.0, 1.0) } else { 0.0 };
        Self {
            r: self.r.clamp(0.0, a),
            g: self.g.clamp(0.0, a),
            b: self.b.clamp(0.0, a),
            a,
        }
    }

    /// Packs into the 4-byte vertex color (premultiplied, rounded to nearest).
    ///
    /// Non-finite channels pack as 0.
    #[inline]
    pub fn to_rgba8(self) -> [u8; 4] {
        let c = self.clamped();
        let q = |v: f32| if v.is_finite() { (v * 255.0).round() as u8 } else { 0 };
        [q(c.r), q(c.g), q(c.b), q(c.a)]
    }
}
