//! Background reconstruction under the text mask.
//!
//! [`TeleaInpainter`] is a fast-marching inpainter: a distance field is
//! propagated inward from the mask boundary, and pixels are filled in order
//! of increasing distance from a weighted average of already-known pixels
//! within a small radius.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use image::{GrayImage, RgbaImage};

/// Default neighbourhood radius in pixels.
pub const DEFAULT_RADIUS: u32 = 3;

/// Distance assigned to pixels the front has not reached yet.
const FAR: f32 = 1.0e6;

/// Reconstructs plausible background where the mask is set.
pub trait Inpainter: Send + Sync {
    /// Return a copy of `image` with masked pixels synthesized.
    ///
    /// Pixels outside the mask must be returned unchanged.
    fn inpaint(&self, image: &RgbaImage, mask: &GrayImage) -> RgbaImage;
}

/// Fast-marching inpainting with direction, distance and level-set weights.
#[derive(Debug, Clone, Copy)]
pub struct TeleaInpainter {
    radius: u32,
}

impl Default for TeleaInpainter {
    fn default() -> Self {
        Self::new(DEFAULT_RADIUS)
    }
}

impl TeleaInpainter {
    /// Create an inpainter with the given neighbourhood radius (minimum 1).
    #[must_use]
    pub fn new(radius: u32) -> Self {
        Self {
            radius: radius.max(1),
        }
    }

    /// Neighbourhood radius in pixels.
    #[must_use]
    pub fn radius(&self) -> u32 {
        self.radius
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flag {
    Known,
    Band,
    Inside,
}

/// Min-heap entry ordered by arrival time.
#[derive(Debug, Clone, Copy)]
struct Front {
    t: f32,
    idx: usize,
}

impl PartialEq for Front {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Front {}

impl PartialOrd for Front {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Front {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .t
            .total_cmp(&self.t)
            .then_with(|| other.idx.cmp(&self.idx))
    }
}

struct March<'a> {
    width: usize,
    height: usize,
    flags: Vec<Flag>,
    dist: Vec<f32>,
    out: &'a mut RgbaImage,
    radius: i64,
}

impl Inpainter for TeleaInpainter {
    fn inpaint(&self, image: &RgbaImage, mask: &GrayImage) -> RgbaImage {
        let mut out = image.clone();
        if mask.dimensions() != image.dimensions() {
            tracing::warn!(
                image = ?image.dimensions(),
                mask = ?mask.dimensions(),
                "mask size mismatch, skipping inpaint"
            );
            return out;
        }

        let width = image.width() as usize;
        let height = image.height() as usize;
        let mut flags: Vec<Flag> = mask
            .pixels()
            .map(|p| if p[0] == 0 { Flag::Known } else { Flag::Inside })
            .collect();
        let masked = flags.iter().filter(|f| **f == Flag::Inside).count();
        if masked == 0 {
            return out;
        }
        if masked == flags.len() {
            tracing::warn!("mask covers the whole image, nothing to propagate from");
            return out;
        }

        let mut dist = vec![0.0_f32; flags.len()];
        let mut heap = BinaryHeap::new();
        for idx in 0..flags.len() {
            if flags[idx] == Flag::Inside {
                dist[idx] = FAR;
            } else if neighbours4(idx, width, height).any(|n| flags[n] == Flag::Inside) {
                flags[idx] = Flag::Band;
                heap.push(Front { t: 0.0, idx });
            }
        }

        let mut march = March {
            width,
            height,
            flags,
            dist,
            out: &mut out,
            radius: i64::from(self.radius),
        };
        march.run(heap);
        tracing::debug!(pixels = masked, radius = self.radius, "inpainted mask");
        out
    }
}

impl March<'_> {
    fn run(&mut self, mut heap: BinaryHeap<Front>) {
        while let Some(Front { idx, .. }) = heap.pop() {
            if self.flags[idx] == Flag::Known {
                continue;
            }
            self.flags[idx] = Flag::Known;

            for n in neighbours4(idx, self.width, self.height) {
                if self.flags[n] != Flag::Inside {
                    continue;
                }
                let (x, y) = (n % self.width, n / self.width);
                let t = [
                    self.solve(x, y, -1, -1),
                    self.solve(x, y, 1, -1),
                    self.solve(x, y, -1, 1),
                    self.solve(x, y, 1, 1),
                ]
                .into_iter()
                .fold(FAR, f32::min);
                self.dist[n] = t;
                self.fill(x, y);
                self.flags[n] = Flag::Band;
                heap.push(Front { t, idx: n });
            }
        }
    }

    #[allow(clippy::cast_possible_wrap)]
    fn at(&self, x: usize, dx: i64, y: usize, dy: i64) -> Option<usize> {
        let nx = usize::try_from(x as i64 + dx).ok()?;
        let ny = usize::try_from(y as i64 + dy).ok()?;
        (nx < self.width && ny < self.height).then_some(ny * self.width + nx)
    }

    /// Eikonal update from one horizontal and one vertical neighbour.
    fn solve(&self, x: usize, y: usize, dx: i64, dy: i64) -> f32 {
        let a = self.at(x, dx, y, 0);
        let b = self.at(x, 0, y, dy);
        let known = |i: Option<usize>| i.filter(|&i| self.flags[i] == Flag::Known);
        match (known(a), known(b)) {
            (Some(a), Some(b)) => {
                let (t1, t2) = (self.dist[a], self.dist[b]);
                let diff = t1 - t2;
                let r = (2.0 - diff * diff).max(0.0).sqrt();
                let s = (t1 + t2 - r) / 2.0;
                if s >= t1 && s >= t2 {
                    s
                } else if s + r >= t1 && s + r >= t2 {
                    s + r
                } else {
                    FAR
                }
            }
            (Some(a), None) => 1.0 + self.dist[a],
            (None, Some(b)) => 1.0 + self.dist[b],
            (None, None) => FAR,
        }
    }

    fn grad(&self, x: usize, y: usize, horizontal: bool) -> f32 {
        let here = self.dist[y * self.width + x];
        let (dx, dy) = if horizontal { (1, 0) } else { (0, 1) };
        let usable = |i: Option<usize>| i.filter(|&i| self.flags[i] != Flag::Inside);
        match (usable(self.at(x, dx, y, dy)), usable(self.at(x, -dx, y, -dy))) {
            (Some(p), Some(m)) => (self.dist[p] - self.dist[m]) * 0.5,
            (Some(p), None) => self.dist[p] - here,
            (None, Some(m)) => here - self.dist[m],
            (None, None) => 0.0,
        }
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    fn fill(&mut self, x: usize, y: usize) {
        let here = self.dist[y * self.width + x];
        let (gx, gy) = (self.grad(x, y, true), self.grad(x, y, false));
        let r = self.radius;
        let mut sum = [0.0_f32; 4];
        let mut total = 0.0_f32;

        for dy in -r..=r {
            for dx in -r..=r {
                let Some(q) = self.at(x, dx, y, dy) else {
                    continue;
                };
                if self.flags[q] == Flag::Inside || (dx == 0 && dy == 0) {
                    continue;
                }
                let (rx, ry) = (-dx as f32, -dy as f32);
                let len2 = rx * rx + ry * ry;
                if len2 > (r * r) as f32 {
                    continue;
                }
                let len = len2.sqrt();
                let mut dir = (rx * gx + ry * gy).abs() / len;
                if dir == 0.0 {
                    dir = 1.0e-6;
                }
                let dst = 1.0 / (len2 * len);
                let lev = 1.0 / (1.0 + (self.dist[q] - here).abs());
                let w = dir * dst * lev;

                let (qx, qy) = ((q % self.width) as u32, (q / self.width) as u32);
                let px = self.out.get_pixel(qx, qy);
                for (acc, &c) in sum.iter_mut().zip(px.0.iter()) {
                    *acc += w * f32::from(c);
                }
                total += w;
            }
        }

        let value = if total > f32::EPSILON {
            sum.map(|s| (s / total).round().clamp(0.0, 255.0) as u8)
        } else {
            self.nearest_known(x, y)
        };
        self.out.get_pixel_mut(x as u32, y as u32).0 = value;
    }

    /// Copy the closest-in-time known 8-neighbour.
    #[allow(clippy::cast_possible_truncation)]
    fn nearest_known(&self, x: usize, y: usize) -> [u8; 4] {
        let mut best: Option<usize> = None;
        for dy in -1..=1 {
            for dx in -1..=1 {
                if let Some(q) = self.at(x, dx, y, dy) {
                    if self.flags[q] != Flag::Inside
                        && best.is_none_or(|b| self.dist[q] < self.dist[b])
                    {
                        best = Some(q);
                    }
                }
            }
        }
        best.map_or_else(
            || self.out.get_pixel(x as u32, y as u32).0,
            |q| {
                self.out
                    .get_pixel((q % self.width) as u32, (q / self.width) as u32)
                    .0
            },
        )
    }
}

fn neighbours4(idx: usize, width: usize, height: usize) -> impl Iterator<Item = usize> {
    let (x, y) = (idx % width, idx / width);
    [
        (x > 0).then(|| idx - 1),
        (x + 1 < width).then(|| idx + 1),
        (y > 0).then(|| idx - width),
        (y + 1 < height).then(|| idx + width),
    ]
    .into_iter()
    .flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::build_mask;
    use image::Rgba;

    fn solid(w: u32, h: u32, c: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba(c))
    }

    #[test]
    fn uniform_background_is_restored_exactly() {
        let mut img = solid(60, 40, [200, 180, 40, 255]);
        for y in 15..25 {
            for x in 10..50 {
                img.put_pixel(x, y, Rgba([0, 0, 0, 255]));
            }
        }
        let poly = [(10, 15), (49, 15), (49, 24), (10, 24)];
        let mask = build_mask(60, 40, [poly.as_slice()]);
        let out = TeleaInpainter::default().inpaint(&img, &mask);
        for p in out.pixels() {
            assert_eq!(p.0, [200, 180, 40, 255]);
        }
    }

    #[test]
    fn unmasked_pixels_are_untouched() {
        let mut img = RgbaImage::new(32, 32);
        for (x, y, p) in img.enumerate_pixels_mut() {
            *p = Rgba([(x * 8) as u8, (y * 8) as u8, 77, 255]);
        }
        let poly = [(8, 8), (20, 8), (20, 14), (8, 14)];
        let mask = build_mask(32, 32, [poly.as_slice()]);
        let out = TeleaInpainter::new(3).inpaint(&img, &mask);
        for (x, y, p) in out.enumerate_pixels() {
            if mask.get_pixel(x, y)[0] == 0 {
                assert_eq!(p, img.get_pixel(x, y));
            }
        }
    }

    #[test]
    fn fill_blends_between_two_backgrounds() {
        let mut img = RgbaImage::new(40, 20);
        for (x, _, p) in img.enumerate_pixels_mut() {
            *p = if x < 20 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            };
        }
        let poly = [(15, 5), (24, 5), (24, 14), (15, 14)];
        let mask = build_mask(40, 20, [poly.as_slice()]);
        let out = TeleaInpainter::default().inpaint(&img, &mask);
        assert!(out.get_pixel(15, 10)[0] < out.get_pixel(24, 10)[0]);
        assert_eq!(out.get_pixel(19, 10)[3], 255);
    }

    #[test]
    fn empty_and_full_masks_return_copies() {
        let img = solid(8, 8, [1, 2, 3, 4]);
        let empty = GrayImage::new(8, 8);
        assert_eq!(TeleaInpainter::default().inpaint(&img, &empty), img);

        let full = GrayImage::from_pixel(8, 8, image::Luma([255]));
        assert_eq!(TeleaInpainter::default().inpaint(&img, &full), img);

        let wrong = GrayImage::new(4, 4);
        assert_eq!(TeleaInpainter::default().inpaint(&img, &wrong), img);
    }

    #[test]
    fn radius_is_clamped_to_one() {
        assert_eq!(TeleaInpainter::new(0).radius(), 1);
        assert_eq!(TeleaInpainter::default().radius(), DEFAULT_RADIUS);
    }
}
