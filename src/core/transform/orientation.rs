//! EXIF orientation handling.
//!
//! Re-encoded images carry no EXIF block, so the rotation a camera
//! recorded in the Orientation tag has to be baked into the pixels
//! before the original metadata is dropped.

use exif::{In, Reader, Tag, Value};
use image::DynamicImage;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Read the EXIF Orientation tag (1-8, where 1 is normal)
pub fn read_orientation(path: &Path) -> Option<u16> {
    let file = File::open(path).ok()?;
    let mut reader = BufReader::new(file);
    let exif = Reader::new().read_from_container(&mut reader).ok()?;

    let field = exif.get_field(Tag::Orientation, In::PRIMARY)?;
    match field.value {
        Value::Short(ref values) => values.first().copied(),
        _ => None,
    }
}

/// Rotate/flip pixels so the image displays upright without EXIF
pub fn apply_orientation(image: DynamicImage, orientation: u16) -> DynamicImage {
    match orientation {
        2 => image.fliph(),
        3 => image.rotate180(),
        4 => image.flipv(),
        5 => image.rotate90().fliph(),
        6 => image.rotate90(),
        7 => image.rotate270().fliph(),
        8 => image.rotate270(),
        _ => image,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn marked_image() -> DynamicImage {
        // 3x2 with a red top-left pixel
        let mut img = RgbImage::from_pixel(3, 2, Rgb([0, 0, 0]));
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        DynamicImage::ImageRgb8(img)
    }

    fn red_at(image: &DynamicImage) -> (u32, u32) {
        let rgb = image.to_rgb8();
        let (x, y, _) = rgb
            .enumerate_pixels()
            .find(|(_, _, p)| p.0 == [255, 0, 0])
            .unwrap();
        (x, y)
    }

    #[test]
    fn normal_orientation_is_untouched() {
        let image = apply_orientation(marked_image(), 1);
        assert_eq!((image.width(), image.height()), (3, 2));
        assert_eq!(red_at(&image), (0, 0));
    }

    #[test]
    fn rotate_cw_swaps_dimensions() {
        let image = apply_orientation(marked_image(), 6);
        assert_eq!((image.width(), image.height()), (2, 3));
        assert_eq!(red_at(&image), (1, 0));
    }

    #[test]
    fn transpose_mirrors_across_diagonal() {
        let image = apply_orientation(marked_image(), 5);
        assert_eq!((image.width(), image.height()), (2, 3));
        assert_eq!(red_at(&image), (0, 0));
    }

    #[test]
    fn missing_exif_reads_as_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plain.png");
        RgbImage::new(2, 2).save(&path).unwrap();
        assert_eq!(read_orientation(&path), None);
    }
}
