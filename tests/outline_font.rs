use std::path::Path;

use image::{Rgba, RgbaImage};
use image_text_translate::compose::centered_origin;
use image_text_translate::font::fit_font_size;
use image_text_translate::{BoundingBox, OutlineFont, TextRenderer};

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// DejaVu Sans Condensed Oblique, see `tests/fixtures/DejaVu-LICENSE.txt`.
fn oblique() -> OutlineFont {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/DejaVuSansCondensed-Oblique.ttf");
    OutlineFont::from_file(&path).unwrap()
}

fn draw_on_white(font: &OutlineFont, text: &str, size: u32, origin: (i32, i32)) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(200, 160, WHITE);
    font.draw(&mut canvas, text, size, origin, BLACK);
    canvas
}

fn ink(canvas: &RgbaImage) -> Vec<(u32, u32)> {
    canvas
        .enumerate_pixels()
        .filter(|(_, _, p)| **p != WHITE)
        .map(|(x, y, _)| (x, y))
        .collect()
}

#[test]
fn reads_family_name() {
    let font = oblique();
    assert!(font.family().unwrap().starts_with("DejaVu Sans"));
}

#[test]
fn measured_extent_grows_with_size() {
    let font = oblique();
    let mut previous = font.measure("HOLA MUNDO", 10);
    assert!(previous.width > 0 && previous.height > 10);
    for size in (20..=200).step_by(10) {
        let extent = font.measure("HOLA MUNDO", size);
        assert!(extent.width > previous.width, "width at {size}");
        assert!(extent.height > previous.height, "height at {size}");
        previous = extent;
    }
    assert_eq!(font.measure("", 40).width, 0);
}

#[test]
fn trailing_space_does_not_change_the_ink() {
    let font = oblique();
    let f = draw_on_white(&font, "f", 60, (40, 40));
    let f_space = draw_on_white(&font, "f ", 60, (40, 40));
    assert!(!ink(&f).is_empty());
    assert_eq!(f, f_space);
}

#[test]
fn ink_past_the_advance_is_drawn() {
    let font = oblique();
    // The italic hook of "f" reaches past its advance width.
    let advance = font.measure("f", 60).width;
    let canvas = draw_on_white(&font, "f", 60, (40, 40));
    assert!(ink(&canvas).iter().any(|&(x, _)| x >= 40 + advance));

    // The tail of "j" reaches left of the pen position.
    let canvas = draw_on_white(&font, "j", 60, (40, 40));
    assert!(ink(&canvas).iter().any(|&(x, _)| x < 40));
}

#[test]
fn fitted_text_stays_inside_its_box() {
    let font = oblique();
    let text = "HOLA MUNDO";
    let bbox = BoundingBox {
        x0: 20,
        y0: 20,
        x1: 300,
        y1: 80,
    };
    let size = fit_font_size(bbox.width(), bbox.height(), |s| font.measure(text, s));
    let extent = font.measure(text, size);
    assert!(size > 10);
    assert!(i64::from(extent.width) <= i64::from(bbox.width()));
    assert!(i64::from(extent.height) <= i64::from(bbox.height()));

    let origin = centered_origin(bbox, extent.width, extent.height);
    let mut canvas = RgbaImage::from_pixel(320, 100, WHITE);
    font.draw(&mut canvas, text, size, origin, BLACK);

    let pixels = ink(&canvas);
    assert!(pixels.len() > 100);
    for (x, y) in pixels {
        let (x, y) = (i64::from(x), i64::from(y));
        assert!((i64::from(bbox.x0)..i64::from(bbox.x1)).contains(&x), "x {x}");
        assert!((i64::from(bbox.y0)..i64::from(bbox.y1)).contains(&y), "y {y}");
    }
}

#[test]
fn drawing_off_canvas_is_clipped() {
    let font = oblique();
    let mut canvas = RgbaImage::from_pixel(20, 20, WHITE);
    font.draw(&mut canvas, "HOLA", 40, (-30, -30), BLACK);
    font.draw(&mut canvas, "HOLA", 40, (500, 500), BLACK);
    assert_eq!(canvas.dimensions(), (20, 20));
}
