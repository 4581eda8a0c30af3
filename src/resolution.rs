//! Device resolution presets and the resolution adapter.
//!
//! When source and target share an orientation the image is stretched to
//! the target size. When one is portrait and the other is not, the image is
//! scaled to fit and letterboxed on a fill color averaged from its borders.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

/// Width of the border band sampled for the letterbox fill color.
pub const DEFAULT_EDGE_BAND: u32 = 20;

/// A target output size in pixels. Both dimensions are positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolutionTarget {
    width: u32,
    height: u32,
}

impl ResolutionTarget {
    /// Create a target, or `None` if either dimension is zero.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Option<Self> {
        (width > 0 && height > 0).then_some(Self { width, height })
    }

    /// Target width.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Target height.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether the target is taller than it is wide.
    #[must_use]
    pub fn is_portrait(&self) -> bool {
        self.height > self.width
    }
}

/// Named device presets.
pub const RESOLUTIONS: &[(&str, ResolutionTarget)] = &[
    ("iphone-15", ResolutionTarget { width: 1290, height: 2796 }),
    ("iphone-14", ResolutionTarget { width: 1179, height: 2556 }),
    ("iphone-13", ResolutionTarget { width: 1170, height: 2532 }),
    ("android-fhd", ResolutionTarget { width: 1080, height: 2400 }),
    ("android-qhd", ResolutionTarget { width: 1440, height: 3200 }),
    ("iphone-15-land", ResolutionTarget { width: 2796, height: 1290 }),
    ("android-fhd-land", ResolutionTarget { width: 2400, height: 1080 }),
    ("ipad-pro", ResolutionTarget { width: 2048, height: 2732 }),
    ("ipad-mini", ResolutionTarget { width: 1536, height: 2048 }),
    ("android-tab", ResolutionTarget { width: 1600, height: 2560 }),
    ("hd", ResolutionTarget { width: 1920, height: 1080 }),
    ("qhd", ResolutionTarget { width: 2560, height: 1440 }),
    ("4k", ResolutionTarget { width: 3840, height: 2160 }),
    ("square-1to1", ResolutionTarget { width: 1080, height: 1080 }),
    ("portrait-3to4", ResolutionTarget { width: 1350, height: 1800 }),
    ("portrait-2to3", ResolutionTarget { width: 1200, height: 1800 }),
    ("landscape-4to3", ResolutionTarget { width: 1600, height: 1200 }),
    ("landscape-16to9", ResolutionTarget { width: 1920, height: 1080 }),
];

/// Look up a preset by key. Unknown keys mean "no resize".
#[must_use]
pub fn resolution_for(key: &str) -> Option<ResolutionTarget> {
    RESOLUTIONS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, target)| *target)
}

/// How the adapter reached the target size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdaptMode {
    /// No target requested; image returned as-is.
    Unchanged,
    /// Resized directly to the target, ignoring aspect ratio.
    Stretch,
    /// Scaled to fit and centered on a fill color.
    Pad {
        /// Background color of the letterbox bands.
        fill: Rgba<u8>,
    },
}

/// Resize or letterbox `image` to `target`.
///
/// Returns the new image and how it was produced. With no target the
/// image is returned unchanged.
#[must_use]
pub fn adapt_resolution(
    image: RgbaImage,
    target: Option<ResolutionTarget>,
    edge_band: u32,
) -> (RgbaImage, AdaptMode) {
    let Some(target) = target else {
        return (image, AdaptMode::Unchanged);
    };

    let source_portrait = image.height() > image.width();
    if source_portrait == target.is_portrait() {
        tracing::debug!(
            from = ?image.dimensions(),
            to = ?(target.width, target.height),
            "stretching to target"
        );
        let resized = if image.dimensions() == (target.width, target.height) {
            image
        } else {
            imageops::resize(&image, target.width, target.height, FilterType::Lanczos3)
        };
        return (resized, AdaptMode::Stretch);
    }

    let fill = edge_average_color(&image, edge_band);
    tracing::debug!(
        from = ?image.dimensions(),
        to = ?(target.width, target.height),
        ?fill,
        "letterboxing across orientations"
    );
    (pad_keep_aspect(&image, target, fill), AdaptMode::Pad { fill })
}

/// Average color of the top, bottom, left and right `band`-pixel strips.
///
/// Each strip spans the full edge, so corner pixels are counted once per
/// strip they belong to. Strips wider than the image cover all of it. The
/// result is opaque; channel means are truncated.
#[must_use]
pub fn edge_average_color(image: &RgbaImage, band: u32) -> Rgba<u8> {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return Rgba([0, 0, 0, 255]);
    }
    let bh = band.min(h);
    let bw = band.min(w);

    let strips = [
        (0, 0, w, bh),
        (0, h - bh, w, bh),
        (0, 0, bw, h),
        (w - bw, 0, bw, h),
    ];

    let mut sum = [0u64; 3];
    let mut count = 0u64;
    for (x0, y0, sw, sh) in strips {
        for y in y0..y0 + sh {
            for x in x0..x0 + sw {
                let px = image.get_pixel(x, y);
                for (acc, &c) in sum.iter_mut().zip(px.0.iter()) {
                    *acc += u64::from(c);
                }
            }
        }
        count += u64::from(sw) * u64::from(sh);
    }

    let mean = |c: u64| u8::try_from(c / count).unwrap_or(u8::MAX);
    Rgba([mean(sum[0]), mean(sum[1]), mean(sum[2]), 255])
}

/// Scale `image` to fit inside `target` and center it on `fill`.
///
/// The limiting dimension is matched exactly; the other is truncated (never
/// below 1 px). Nothing is cropped.
#[must_use]
pub fn pad_keep_aspect(image: &RgbaImage, target: ResolutionTarget, fill: Rgba<u8>) -> RgbaImage {
    let (new_w, new_h) = fit_within(image.dimensions(), target);
    let resized = imageops::resize(image, new_w, new_h, FilterType::Lanczos3);
    let mut canvas = RgbaImage::from_pixel(target.width, target.height, fill);
    let x = (target.width - new_w) / 2;
    let y = (target.height - new_h) / 2;
    imageops::replace(&mut canvas, &resized, i64::from(x), i64::from(y));
    canvas
}

/// Content size after aspect-preserving scaling into `target`.
#[must_use]
pub fn fit_within((w, h): (u32, u32), target: ResolutionTarget) -> (u32, u32) {
    if w == 0 || h == 0 {
        return (target.width, target.height);
    }
    let (w, h) = (u64::from(w), u64::from(h));
    let (tw, th) = (u64::from(target.width), u64::from(target.height));
    // Compare w/h > tw/th without floating point.
    let (new_w, new_h) = if w * th > tw * h {
        (tw, tw * h / w)
    } else {
        (th * w / h, th)
    };
    let clamp = |v: u64, max: u64| u32::try_from(v.clamp(1, max)).unwrap_or(u32::MAX);
    (clamp(new_w, tw), clamp(new_h, th))
}
