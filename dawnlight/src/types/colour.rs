//! Colour values and the pure colour math consumed by renderers.
//!
//! Conversions between HSV and RGB go through `palette`; gamma
//! correction is a plain power curve applied per channel just before a
//! frame reaches the sink.

use palette::{FromColor, Hsv as PaletteHsv, Srgb};

/// An 8-bit-per-channel RGB colour, the sink's native format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const BLACK: Self = Self::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Per-channel linear interpolation, `t` clamped to `0.0..=1.0`.
    pub fn lerp(self, to: Rgb8, t: f32) -> Rgb8 {
        let t = t.clamp(0.0, 1.0);
        let channel = |a: u8, b: u8| -> u8 {
            let a = a as f32;
            let b = b as f32;
            (a + (b - a) * t).round().clamp(0.0, 255.0) as u8
        };
        Rgb8::new(
            channel(self.r, to.r),
            channel(self.g, to.g),
            channel(self.b, to.b),
        )
    }
}

impl From<(u8, u8, u8)> for Rgb8 {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Rgb8::new(r, g, b)
    }
}

/// Hue in degrees (`0.0..360.0`), saturation and value in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsv {
    pub h: f32,
    pub s: f32,
    pub v: f32,
}

impl Hsv {
    pub const fn new(h: f32, s: f32, v: f32) -> Self {
        Self { h, s, v }
    }

    /// Interpolate along the shortest hue arc.
    ///
    /// A colour with no saturation or no value has no meaningful hue; in
    /// that case the other endpoint's hue is used for the whole blend.
    pub fn lerp(self, to: Hsv, t: f32) -> Hsv {
        let t = t.clamp(0.0, 1.0);
        let achromatic = |c: &Hsv| c.s <= f32::EPSILON || c.v <= f32::EPSILON;

        let (from_h, to_h) = match (achromatic(&self), achromatic(&to)) {
            (true, false) => (to.h, to.h),
            (false, true) => (self.h, self.h),
            _ => (self.h, to.h),
        };

        let mut delta = to_h - from_h;
        if delta > 180.0 {
            delta -= 360.0;
        } else if delta < -180.0 {
            delta += 360.0;
        }

        Hsv {
            h: (from_h + delta * t).rem_euclid(360.0),
            s: self.s + (to.s - self.s) * t,
            v: self.v + (to.v - self.v) * t,
        }
    }
}

/// Colour space a fade interpolates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ColourSpace {
    #[default]
    Rgb,
    Hsv,
}

/// Pure colour conversions and output correction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColourMath {
    /// Gamma exponent, or `None` to write values unchanged.
    gamma: Option<f32>,
}

impl ColourMath {
    pub fn new(gamma: Option<f32>) -> Self {
        Self { gamma }
    }

    pub fn linear() -> Self {
        Self { gamma: None }
    }

    pub fn hsv_to_rgb(&self, hsv: Hsv) -> Rgb8 {
        let colour = PaletteHsv::new(hsv.h, hsv.s.clamp(0.0, 1.0), hsv.v.clamp(0.0, 1.0));
        let rgb: Srgb<u8> = Srgb::<f32>::from_color(colour).into_format();
        Rgb8::new(rgb.red, rgb.green, rgb.blue)
    }

    pub fn rgb_to_hsv(&self, rgb: Rgb8) -> Hsv {
        let srgb: Srgb<f32> = Srgb::new(rgb.r, rgb.g, rgb.b).into_format();
        let hsv: PaletteHsv = PaletteHsv::from_color(srgb);
        Hsv::new(hsv.hue.into_positive_degrees(), hsv.saturation, hsv.value)
    }

    pub fn apply_gamma(&self, rgb: Rgb8) -> Rgb8 {
        let Some(gamma) = self.gamma else {
            return rgb;
        };
        let correct = |c: u8| -> u8 { ((c as f32 / 255.0).powf(gamma) * 255.0).round() as u8 };
        Rgb8::new(correct(rgb.r), correct(rgb.g), correct(rgb.b))
    }

    /// Blend `from` towards `to` by `t` in the given colour space.
    ///
    /// The endpoints are returned unchanged at `t == 0.0` and `t == 1.0`
    /// regardless of space, so round-off in the HSV conversion never
    /// shifts the first or last frame of a fade.
    pub fn interpolate(&self, space: ColourSpace, from: Rgb8, to: Rgb8, t: f32) -> Rgb8 {
        if t <= 0.0 {
            return from;
        }
        if t >= 1.0 {
            return to;
        }
        match space {
            ColourSpace::Rgb => from.lerp(to, t),
            ColourSpace::Hsv => {
                let blended = self.rgb_to_hsv(from).lerp(self.rgb_to_hsv(to), t);
                self.hsv_to_rgb(blended)
            }
        }
    }
}

impl Default for ColourMath {
    fn default() -> Self {
        Self::linear()
    }
}
