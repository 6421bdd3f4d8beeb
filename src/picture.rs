use std::iter::Sum;
use std::ops::{Add, Mul};

use bytemuck_derive::{AnyBitPattern, NoUninit};
use image::RgbaImage;
use nalgebra::Vector3;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Sum for Color {
    fn sum<I: Iterator<Item=Self>>(iter: I) -> Self {
        let mut acc = Color::new(0.0, 0.0, 0.0, 1.0);
        for color in iter {
            acc = acc + color;
        }
        acc
    }
}

impl Color {
    /// What rays that reach nothing, or die in glass, report.
    pub const BACKGROUND: Color = Color::new(0.172_549, 0.125_490, 0.337_255, 1.0);
    /// What rays that end on a sphere report.
    pub const HIT: Color = Color::new(0.909_804, 0.639_216, 0.239_216, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Maps each component of a unit vector from [-1, 1] to [0, 1].
    pub fn visualize_direction(vector: &Vector3<f32>) -> Self {
        Color::new(
            (vector.x + 1.0) * 0.5,
            (vector.y + 1.0) * 0.5,
            (vector.z + 1.0) * 0.5,
            1.0,
        )
    }

    pub fn is_finite(&self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }

    /// Largest per-channel difference, ignoring alpha.
    pub fn distance(&self, other: &Color) -> f32 {
        (self.r - other.r)
            .abs()
            .max((self.g - other.g).abs())
            .max((self.b - other.b).abs())
    }
}

impl Add for Color {
    type Output = Color;

    fn add(self, rhs: Self) -> Self::Output {
        Color::new(
            self.r + rhs.r,
            self.g + rhs.g,
            self.b + rhs.b,
            self.a,
        )
    }
}

impl Mul<f32> for Color {
    type Output = Color;

    fn mul(self, rhs: f32) -> Self::Output {
        Color::new(
            self.r * rhs,
            self.g * rhs,
            self.b * rhs,
            self.a,
        )
    }
}

impl Mul<Color> for f32 {
    type Output = Color;

    fn mul(self, rhs: Color) -> Self::Output {
        rhs * self
    }
}

#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, AnyBitPattern, NoUninit)]
#[repr(C)]
pub struct RGBA8 {
    r: u8,
    g: u8,
    b: u8,
    a: u8,
}

impl From<Color> for RGBA8 {
    fn from(value: Color) -> Self {
        RGBA8::new_norm(value.r, value.g, value.b, value.a)
    }
}

fn normalize(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl RGBA8 {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        RGBA8 { r, g, b, a }
    }

    pub const fn new_hex(rgba: u32) -> RGBA8 {
        RGBA8 {
            r: ((rgba & 0xff000000) >> 24) as u8,
            g: ((rgba & 0x00ff0000) >> 16) as u8,
            b: ((rgba & 0x0000ff00) >> 8) as u8,
            a: (rgba & 0x000000ff) as u8,
        }
    }

    pub fn new_norm(r: f32, g: f32, b: f32, a: f32) -> Self {
        RGBA8::new(normalize(r), normalize(g), normalize(b), normalize(a))
    }
}

/// A row-major grid of pixels over some backing storage.
#[derive(Clone, Debug, PartialEq)]
pub struct Picture<P> {
    pixels: P,
    size: (u32, u32),
}

impl<P> Picture<P> {
    pub fn new(pixels: P, size: (u32, u32)) -> Self {
        Picture { pixels, size }
    }

    pub fn width(&self) -> u32 {
        self.size.0
    }

    pub fn height(&self) -> u32 {
        self.size.1
    }

    fn to_index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width() as usize + x as usize
    }
}

impl<T> Picture<Vec<T>> {
    pub fn pixel(&self, x: u32, y: u32) -> &T {
        &self.pixels[self.to_index(x, y)]
    }

    pub fn pixels(&self) -> &[T] {
        &self.pixels
    }

    pub fn view_mut(&mut self) -> Picture<&mut [T]> {
        Picture::new(self.pixels.as_mut_slice(), self.size)
    }

    pub fn map<U>(&self, f: impl Fn(&T) -> U) -> Picture<Vec<U>> {
        Picture::new(self.pixels.iter().map(f).collect(), self.size)
    }
}

impl<'a, T> Picture<&'a mut [T]> {
    pub fn buffer_mut(&mut self) -> &mut [T] {
        &mut *self.pixels
    }
}

impl Picture<Vec<Color>> {
    pub fn to_rgba8(&self) -> Picture<Vec<RGBA8>> {
        self.map(|&color| RGBA8::from(color))
    }

    /// Converts to an 8-bit image, e.g. for saving as PNG.
    pub fn to_image(&self) -> Option<RgbaImage> {
        let pixels = self.to_rgba8();
        let bytes: &[u8] = bytemuck::cast_slice(pixels.pixels());
        RgbaImage::from_raw(self.width(), self.height(), bytes.to_vec())
    }
}
