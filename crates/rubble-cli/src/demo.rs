//! Deterministic synthetic crushed-stone image.
//!
//! 150 randomly placed, rotated, filled ellipses on a light background,
//! each with a dark outline, plus Gaussian sensor noise. A fixed seed
//! makes every run produce the same image.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Canvas width.
pub const WIDTH: u32 = 600;
/// Canvas height.
pub const HEIGHT: u32 = 400;
/// Number of particles.
pub const PARTICLES: usize = 150;
/// Random seed.
pub const SEED: u64 = 42;

const BACKGROUND: Rgb<u8> = Rgb([200, 200, 200]);
const OUTLINE: Rgb<u8> = Rgb([80, 80, 80]);
const NOISE_SIGMA: f64 = 10.0;
const OUTLINE_SEGMENTS: usize = 72;

/// Stone colors: gray, light gray, blue-gray, brown, white.
const PALETTE: [Rgb<u8>; 5] = [
    Rgb([120, 120, 120]),
    Rgb([180, 180, 180]),
    Rgb([200, 150, 100]),
    Rgb([100, 130, 150]),
    Rgb([200, 200, 200]),
];

/// One stone: center, semi-axes, rotation in degrees.
#[derive(Debug, Clone, Copy)]
struct Ellipse {
    cx: f64,
    cy: f64,
    a: f64,
    b: f64,
    angle: f64,
}

impl Ellipse {
    fn contains(&self, x: f64, y: f64) -> bool {
        let (sin, cos) = self.angle.to_radians().sin_cos();
        let (dx, dy) = (x - self.cx, y - self.cy);
        let u = dx.mul_add(cos, dy * sin);
        let v = (-dx).mul_add(sin, dy * cos);
        (u / self.a).powi(2) + (v / self.b).powi(2) <= 1.0
    }

    #[allow(clippy::cast_precision_loss)]
    fn boundary(&self, i: usize) -> (f64, f64) {
        let t = std::f64::consts::TAU * i as f64 / OUTLINE_SEGMENTS as f64;
        let (sin, cos) = self.angle.to_radians().sin_cos();
        let (u, v) = (self.a * t.cos(), self.b * t.sin());
        (
            u.mul_add(cos, -v * sin) + self.cx,
            u.mul_add(sin, v * cos) + self.cy,
        )
    }
}

/// Generate the demo image.
#[must_use]
pub fn generate() -> RgbImage {
    let mut rng = StdRng::seed_from_u64(SEED);
    let mut img = RgbImage::from_pixel(WIDTH, HEIGHT, BACKGROUND);

    for _ in 0..PARTICLES {
        let cx = f64::from(rng.gen_range(20_u32..580));
        let cy = f64::from(rng.gen_range(20_u32..380));
        let size = rng.gen_range(8_u32..25);
        let color = PALETTE[rng.gen_range(0..PALETTE.len())];
        let a = f64::from(size);
        let b = f64::from(size * 4 / 5);

        let body = Ellipse {
            cx,
            cy,
            a,
            b,
            angle: f64::from(rng.gen_range(0_u32..180)),
        };
        fill(&mut img, &body, color);

        let rim = Ellipse {
            angle: f64::from(rng.gen_range(0_u32..180)),
            ..body
        };
        outline(&mut img, &rim);
    }

    add_noise(&mut img, &mut rng);
    img
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn fill(img: &mut RgbImage, e: &Ellipse, color: Rgb<u8>) {
    let r = e.a.max(e.b);
    let x0 = (e.cx - r).floor().max(0.0) as u32;
    let y0 = (e.cy - r).floor().max(0.0) as u32;
    let x1 = ((e.cx + r).ceil() as u32).min(img.width() - 1);
    let y1 = ((e.cy + r).ceil() as u32).min(img.height() - 1);
    for y in y0..=y1 {
        for x in x0..=x1 {
            if e.contains(f64::from(x), f64::from(y)) {
                img.put_pixel(x, y, color);
            }
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn outline(img: &mut RgbImage, e: &Ellipse) {
    for i in 0..OUTLINE_SEGMENTS {
        let (x0, y0) = e.boundary(i);
        let (x1, y1) = e.boundary(i + 1);
        draw_line_segment_mut(img, (x0 as f32, y0 as f32), (x1 as f32, y1 as f32), OUTLINE);
    }
}

/// Add zero-mean Gaussian noise (Box-Muller) to every channel.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn add_noise(img: &mut RgbImage, rng: &mut StdRng) {
    for pixel in img.pixels_mut() {
        for channel in &mut pixel.0 {
            let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
            let u2: f64 = rng.r#gen();
            let z = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
            let value = NOISE_SIGMA.mul_add(z, f64::from(*channel)).round();
            *channel = value.clamp(0.0, 255.0) as u8;
        }
    }
}
