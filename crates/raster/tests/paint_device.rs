use std::sync::Arc;

use quickcheck::{TestResult, quickcheck};
use raster::{
    Color, ConversionFlags, FixedBounds, PaintDevice, Rect, RenderingIntent, SelectionMask,
    TextureConfig, alpha8, rgba8, rgba16,
};

fn white() -> Color {
    Color::white(rgba8())
}

fn wrapped_device(period: i32) -> PaintDevice {
    let bounds = Arc::new(FixedBounds::wrapped(Rect::new(0, 0, period, period)));
    PaintDevice::with_bounds(rgba8(), bounds)
}

#[test]
fn test_fill_move_crop() {
    let mut device = PaintDevice::new(rgba8());
    device.fill(Rect::new(0, 0, 512, 512), &white()).unwrap();
    assert_eq!(device.exact_bounds(), Rect::new(0, 0, 512, 512));

    device.move_to(10, 10).unwrap();
    assert_eq!(device.exact_bounds(), Rect::new(10, 10, 512, 512));

    device.crop(Rect::new(50, 50, 50, 50)).unwrap();
    assert_eq!(device.exact_bounds(), Rect::new(50, 50, 50, 50));
    assert_eq!(device.extent(), Rect::new(10, 10, 128, 128));
}

#[test]
fn test_transparent_outlier_ignored_by_bounds() {
    let mut device = PaintDevice::new(rgba8());
    device
        .set_pixel(6, 6, &Color::from_rgba8([0, 10, 0, 0], rgba8()))
        .unwrap();
    device.fill(Rect::new(10, 10, 10, 10), &white()).unwrap();
    assert_eq!(device.exact_bounds(), Rect::new(10, 10, 10, 10));
}

#[test]
fn test_crop_never_grows() {
    let mut device = PaintDevice::new(rgba8());
    device.fill(Rect::new(0, 0, 100, 100), &white()).unwrap();
    let before = device.exact_bounds();
    device.crop(Rect::new(-50, 20, 500, 30)).unwrap();
    let after = device.exact_bounds();
    assert!(before.contains_rect(&after));
    assert_eq!(after, Rect::new(0, 20, 100, 30));
}

#[test]
fn test_wrap_window_repeats_pixel() {
    let mut device = wrapped_device(20);
    device.set_pixel(3, 3, &white()).unwrap();

    for window in [
        Rect::new(0, 0, 20, 20),
        Rect::new(-7, -11, 30, 30),
        Rect::new(-40, -40, 40, 40),
        Rect::new(5, -13, 40, 40),
    ] {
        let bytes = device.read_bytes(window).unwrap();
        for y in window.y..window.y_end() {
            for x in window.x..window.x_end() {
                let i = ((y - window.y) * window.width + (x - window.x)) as usize * 4;
                let expected = x.rem_euclid(20) == 3 && y.rem_euclid(20) == 3;
                assert_eq!(bytes[i + 3] == 255, expected, "window {:?} at ({}, {})", window, x, y);
            }
        }
    }
}

#[test]
fn test_wrap_accessors_agree_with_bulk_read() {
    let mut device = wrapped_device(20);
    device.fill(Rect::new(15, 15, 10, 10), &white()).unwrap();
    let window = Rect::new(-5, -5, 45, 45);
    let bytes = device.read_bytes(window).unwrap();
    for (x, y, pixel) in device.rect_iterator_const(window) {
        let i = ((y - window.y) * window.width + (x - window.x)) as usize * 4;
        assert_eq!(pixel, &bytes[i..i + 4]);
    }
}

#[test]
fn test_wrap_move_keeps_content_in_period() {
    let mut device = wrapped_device(20);
    device.fill(Rect::new(2, 2, 4, 4), &white()).unwrap();
    device.move_to(17, 0).unwrap();
    let bounds = device.exact_bounds();
    assert!(Rect::new(0, 0, 20, 20).contains_rect(&bounds));
    for (x, y) in [(19, 2), (0, 5), (2, 5)] {
        assert_eq!(device.pixel(x, y).unwrap().opacity_u8(), 255, "({}, {})", x, y);
    }
    assert_eq!(device.pixel(3, 3).unwrap().opacity_u8(), 0);
}

#[test]
fn test_clone_isolated_from_writes() {
    let mut device = PaintDevice::new(rgba8());
    device.fill(Rect::new(0, 0, 200, 200), &white()).unwrap();
    let copy = device.clone();
    device.clear_rect(Rect::new(0, 0, 64, 64)).unwrap();
    device
        .set_pixel(150, 150, &Color::from_rgba8([1, 2, 3, 4], rgba8()))
        .unwrap();

    assert_eq!(copy.pixel(10, 10).unwrap(), white());
    assert_eq!(copy.pixel(150, 150).unwrap(), white());
    assert_eq!(copy.exact_bounds(), Rect::new(0, 0, 200, 200));
}

#[test]
fn test_fill_and_clear_idempotent() {
    let mut device = PaintDevice::new(rgba8());
    let rect = Rect::new(-30, 7, 90, 40);
    device.fill(rect, &white()).unwrap();
    let once = device.read_bytes(rect).unwrap();
    device.fill(rect, &white()).unwrap();
    assert_eq!(device.read_bytes(rect).unwrap(), once);

    device.clear_rect(rect).unwrap();
    device.clear_rect(rect).unwrap();
    assert!(device.exact_bounds().is_empty());
}

#[test]
fn test_bytes_round_trip_across_tiles() {
    let mut device = PaintDevice::new(rgba8());
    let rect = Rect::new(60, -3, 10, 9);
    let data: Vec<u8> = (0..rect.area() * 4).map(|i| (i % 251) as u8).collect();
    device.write_bytes(&data, rect).unwrap();
    assert_eq!(device.read_bytes(rect).unwrap(), data);
    assert_eq!(device.store().tile_count(), 4);
}

#[test]
fn test_conversion_round_trip_through_undo() {
    let mut device = PaintDevice::new(rgba8());
    device
        .fill(Rect::new(5, 5, 80, 80), &Color::from_rgba8([12, 34, 56, 200], rgba8()))
        .unwrap();
    let before = device.read_bytes(Rect::new(0, 0, 100, 100)).unwrap();

    let mut command = device
        .convert_to(alpha8(), RenderingIntent::default(), ConversionFlags::default())
        .unwrap();
    assert_eq!(device.pixel(10, 10).unwrap().data(), &[200]);
    command.undo(&mut device);
    assert_eq!(device.read_bytes(Rect::new(0, 0, 100, 100)).unwrap(), before);
    command.redo(&mut device);
    assert_eq!(device.pixel_size(), 1);
}

#[test]
fn test_dump_preserves_default_pixel() {
    let mut device = PaintDevice::new(rgba16());
    device.set_default_pixel(&white()).unwrap();
    device
        .fill(Rect::new(0, 0, 3, 3), &Color::from_rgba8([9, 9, 9, 255], rgba16()))
        .unwrap();
    let mut dump = Vec::new();
    device.write(&mut dump).unwrap();

    let mut restored = PaintDevice::new(rgba16());
    restored.read(&mut dump.as_slice()).unwrap();
    assert_eq!(restored.default_pixel(), Color::white(rgba16()));
    assert_eq!(restored.pixel(1, 1).unwrap().to_rgba8(), [9, 9, 9, 255]);
}

#[test]
fn test_thumbnail_cached_until_write() {
    let mut device = PaintDevice::new(rgba8());
    device.fill(Rect::new(0, 0, 40, 40), &white()).unwrap();
    let first = device
        .create_thumbnail(16, 16, RenderingIntent::default(), ConversionFlags::default())
        .unwrap();
    let second = device
        .create_thumbnail(16, 16, RenderingIntent::default(), ConversionFlags::default())
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(first.dimensions(), (16, 16));

    device.clear_rect(Rect::new(0, 0, 40, 20)).unwrap();
    let third = device
        .create_thumbnail(16, 16, RenderingIntent::default(), ConversionFlags::default())
        .unwrap();
    assert_eq!(third.dimensions(), (16, 8));
}

#[test]
fn test_update_info_converts_patch() {
    let bounds = Arc::new(FixedBounds::new(Rect::new(0, 0, 64, 64)));
    let mut device = PaintDevice::with_bounds(rgba16(), bounds);
    device.fill(Rect::new(0, 0, 64, 64), &white()).unwrap();
    let config = TextureConfig {
        texture_size: 34,
        border: 1,
    };
    let info = device
        .extract_update_info(Rect::new(31, 31, 2, 2), &rgba8(), &config)
        .unwrap();
    assert_eq!(info.tiles.len(), 4);
    for tile in &info.tiles {
        assert_eq!(tile.data.len(), tile.patch_rect.area() * 4);
        assert!(tile.data.iter().all(|b| *b == 255));
    }
}

#[test]
fn test_clear_selection_purges_cleared_tiles() {
    let mut device = PaintDevice::new(rgba8());
    device.fill(Rect::new(0, 0, 256, 64), &white()).unwrap();
    let mut selection = SelectionMask::new();
    selection.select_rect(Rect::new(0, 0, 128, 64)).unwrap();
    device.clear_selection(&selection).unwrap();
    assert_eq!(device.exact_bounds(), Rect::new(128, 0, 128, 64));
    assert_eq!(device.store().tile_count(), 2);
}

quickcheck! {
    fn prop_fill_bounds_match_rect(x: i16, y: i16, w: u8, h: u8) -> TestResult {
        if w == 0 || h == 0 {
            return TestResult::discard();
        }
        let rect = Rect::new(x as i32, y as i32, w as i32, h as i32);
        let mut device = PaintDevice::new(rgba8());
        if device.fill(rect, &Color::white(rgba8())).is_err() {
            return TestResult::failed();
        }
        TestResult::from_bool(device.exact_bounds() == rect && device.extent().contains_rect(&rect))
    }

    fn prop_wrapped_pixel_periodic(px: u8, py: u8, dx: i8, dy: i8) -> TestResult {
        let period = 20;
        let (px, py) = (px as i32 % period, py as i32 % period);
        let bounds = Arc::new(FixedBounds::wrapped(Rect::new(0, 0, period, period)));
        let mut device = PaintDevice::with_bounds(rgba8(), bounds);
        if device.set_pixel(px, py, &Color::white(rgba8())).is_err() {
            return TestResult::failed();
        }
        let (x, y) = (px + dx as i32 * period, py + dy as i32 * period);
        TestResult::from_bool(device.pixel(x, y).map(|c| c.opacity_u8()) == Some(255))
    }

    fn prop_move_preserves_pixels(dx: i16, dy: i16) -> bool {
        let mut device = PaintDevice::new(rgba8());
        let color = Color::from_rgba8([1, 2, 3, 255], rgba8());
        let _ = device.set_pixel(7, 9, &color);
        let _ = device.move_to(dx as i32, dy as i32);
        device.pixel(7 + dx as i32, 9 + dy as i32) == Some(color)
    }
}
