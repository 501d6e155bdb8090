use serde::{Deserialize, Serialize};

/// An RGBA color with straight (non-premultiplied) alpha. Components are
/// nominally in the range 0.0 to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorA {
    /// Red component.
    pub r: f32,
    /// Green component.
    pub g: f32,
    /// Blue component.
    pub b: f32,
    /// Alpha component.
    pub a: f32,
}

impl Default for ColorA {
    fn default() -> Self {
        Self::WHITE
    }
}

impl ColorA {
    /// Opaque white.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    /// Opaque black.
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Construct a color from all four components.
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// An opaque color.
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// An opaque gray.
    pub const fn gray(v: f32) -> Self {
        Self::new(v, v, v, 1.0)
    }

    /// Build an opaque color from hue, saturation and value. Hue is in turns
    /// (0.0 to 1.0) and wraps.
    pub fn hsv(h: f32, s: f32, v: f32) -> Self {
        let s = s.clamp(0.0, 1.0);
        let v = v.clamp(0.0, 1.0);
        if s == 0.0 {
            return Self::gray(v);
        }
        let h = h.rem_euclid(1.0) * 6.0;
        let sector = h.floor();
        let f = h - sector;
        let p = v * (1.0 - s);
        let q = v * (1.0 - s * f);
        let t = v * (1.0 - s * (1.0 - f));
        match sector as u32 {
            0 => Self::rgb(v, t, p),
            1 => Self::rgb(q, v, p),
            2 => Self::rgb(p, v, t),
            3 => Self::rgb(p, q, v),
            4 => Self::rgb(t, p, v),
            _ => Self::rgb(v, p, q),
        }
    }

    /// The same color with a replaced alpha.
    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// The same color with its alpha multiplied by `factor`.
    pub fn scale_alpha(self, factor: f32) -> Self {
        Self {
            a: self.a * factor,
            ..self
        }
    }

    /// The color with RGB premultiplied by alpha.
    pub fn premultiplied(self) -> Self {
        Self {
            r: self.r * self.a,
            g: self.g * self.a,
            b: self.b * self.a,
            a: self.a,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: ColorA, b: ColorA) -> bool {
        (a.r - b.r).abs() < 1e-5
            && (a.g - b.g).abs() < 1e-5
            && (a.b - b.b).abs() < 1e-5
            && (a.a - b.a).abs() < 1e-5
    }

    #[test]
    fn hsv_primaries() {
        assert!(close(ColorA::hsv(0.0, 1.0, 1.0), ColorA::rgb(1.0, 0.0, 0.0)));
        assert!(close(
            ColorA::hsv(1.0 / 3.0, 1.0, 1.0),
            ColorA::rgb(0.0, 1.0, 0.0)
        ));
        assert!(close(
            ColorA::hsv(2.0 / 3.0, 1.0, 1.0),
            ColorA::rgb(0.0, 0.0, 1.0)
        ));
        assert!(close(ColorA::hsv(1.0, 1.0, 1.0), ColorA::rgb(1.0, 0.0, 0.0)));
        assert!(close(ColorA::hsv(0.3, 0.0, 0.5), ColorA::gray(0.5)));
    }

    #[test]
    fn alpha_helpers() {
        let c = ColorA::rgb(1.0, 0.5, 0.0).with_alpha(0.5);
        assert_eq!(c.scale_alpha(0.5).a, 0.25);
        assert_eq!(c.premultiplied(), ColorA::new(0.5, 0.25, 0.0, 0.5));
    }
}
