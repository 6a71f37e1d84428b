use std::io::Write;

use ::image::{
    codecs::{
        gif::{GifEncoder, Repeat},
        png::PngEncoder,
    },
    ColorType, Delay, ImageEncoder, Rgba, RgbaImage,
};

use super::{ImageError, ImageFormat, ImageWriter};
use crate::graphics::{Frame, MaskType};

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Normal colours 0-7 followed by their bright versions.
const PALETTE: [[u8; 3]; 16] = [
    [0, 0, 0],
    [0, 0, 197],
    [197, 0, 0],
    [197, 0, 197],
    [0, 198, 0],
    [0, 198, 197],
    [197, 198, 0],
    [205, 198, 205],
    [0, 0, 0],
    [0, 0, 255],
    [255, 0, 0],
    [255, 0, 255],
    [0, 255, 0],
    [0, 255, 255],
    [255, 255, 0],
    [255, 255, 255],
];

fn colour(index: u8) -> Rgba<u8> {
    let [r, g, b] = PALETTE[index as usize & 15];
    Rgba([r, g, b, 255])
}

/// Ink and paper colours of an attribute byte. The flash bit is ignored.
fn attribute_colours(attr: u8) -> (Rgba<u8>, Rgba<u8>) {
    let bright = (attr & 64) >> 3;
    (colour(bright | (attr & 7)), colour(bright | ((attr >> 3) & 7)))
}

/// Colour of pixel `(px, py)` of the uncropped frame.
fn pixel(frame: &Frame, px: u32, py: u32) -> Rgba<u8> {
    let Some(tile) = frame.tile_at(px, py) else {
        return colour(0);
    };
    let size = 8 * frame.scale();
    let row = ((py % size) / frame.scale()) as usize;
    let bit = 128u8 >> ((px % size) / frame.scale());
    let (ink, paper) = attribute_colours(tile.attr);
    let graphic = tile.data[row] & bit != 0;
    let masked = match (frame.mask(), tile.mask) {
        (MaskType::None, _) | (_, None) => None,
        (_, Some(mask)) => Some(mask[row] & bit != 0),
    };
    match (frame.mask(), graphic, masked) {
        (_, true, None) => ink,
        (_, false, None) => paper,
        (MaskType::OrAnd, true, Some(true)) => ink,
        (MaskType::OrAnd, _, Some(false)) => paper,
        (MaskType::AndOr, true, Some(_)) => ink,
        (MaskType::AndOr, false, Some(false)) => paper,
        (_, false, Some(true)) => TRANSPARENT,
        (MaskType::None, _, Some(_)) => paper,
    }
}

/// Rasterise the cropped area of a frame.
pub fn rasterise(frame: &Frame) -> RgbaImage {
    RgbaImage::from_fn(frame.width(), frame.height(), |x, y| {
        pixel(frame, frame.x() + x, frame.y() + y)
    })
}

/// Image writer backed by the `image` crate. PNG files hold the first frame
/// only; GIF files hold every frame as a looping animation.
#[derive(Debug, Default)]
pub struct RasterEncoder;

impl RasterEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl ImageWriter for RasterEncoder {
    #[tracing::instrument(skip(self, frames, out))]
    fn write_image(
        &mut self,
        frames: &[Frame],
        out: &mut dyn Write,
        format: ImageFormat,
    ) -> Result<(), ImageError> {
        if let Some(empty) = frames.iter().position(|f| f.width() == 0 || f.height() == 0) {
            return Err(ImageError::Empty(format!("frame {} has no pixels", empty + 1)));
        }
        let Some(first) = frames.first() else {
            return Err(ImageError::Empty("no frames".to_owned()));
        };
        match format {
            ImageFormat::Png => {
                let image = rasterise(first);
                PngEncoder::new(out).write_image(
                    image.as_raw(),
                    image.width(),
                    image.height(),
                    ColorType::Rgba8,
                )?;
            }
            ImageFormat::Gif => {
                let mut encoder = GifEncoder::new(out);
                encoder.set_repeat(Repeat::Infinite)?;
                for frame in frames {
                    let delay = Delay::from_numer_denom_ms(frame.delay().saturating_mul(10), 1);
                    encoder.encode_frame(::image::Frame::from_parts(rasterise(frame), 0, 0, delay))?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::{CropRect, Tile};

    use pretty_assertions::assert_eq;

    fn frame(tile: Tile, scale: u32, mask: MaskType, crop: CropRect) -> Frame {
        Frame::new(vec![vec![tile]], scale, mask, crop).unwrap()
    }

    #[test]
    fn test_attribute_colours() {
        // INK 1 PAPER 7
        assert_eq!(attribute_colours(56 + 1), (colour(1), colour(7)));
        // BRIGHT 1 INK 2 PAPER 0, FLASH 1
        assert_eq!(attribute_colours(128 + 64 + 2), (colour(10), colour(8)));
    }

    #[test]
    fn test_rasterise_scale_and_crop() {
        let tile = Tile::new(56, [0x80, 0, 0, 0, 0, 0, 0, 0]);
        let image = rasterise(&frame(tile.clone(), 2, MaskType::None, CropRect::default()));
        assert_eq!(image.dimensions(), (16, 16));
        assert_eq!(*image.get_pixel(1, 1), colour(0));
        assert_eq!(*image.get_pixel(2, 0), colour(7));

        let crop = CropRect::new(1, 1, Some(4), Some(3));
        let image = rasterise(&frame(tile, 2, MaskType::None, crop));
        assert_eq!(image.dimensions(), (4, 3));
        assert_eq!(*image.get_pixel(0, 0), colour(0));
        assert_eq!(*image.get_pixel(1, 0), colour(7));
    }

    #[test]
    fn test_mask_modes() {
        // Columns: graphic/mask = 1/1, 0/1, 1/0, 0/0
        let tile = Tile::with_mask(56, [0b1010_0000; 8], [0b1100_0000; 8]);
        let tests = vec![
            (MaskType::None, [colour(0), colour(7), colour(0), colour(7)]),
            (MaskType::OrAnd, [colour(0), TRANSPARENT, colour(7), colour(7)]),
            (MaskType::AndOr, [colour(0), TRANSPARENT, colour(0), colour(7)]),
        ];
        for (mask, expected) in tests {
            let image = rasterise(&frame(tile.clone(), 1, mask, CropRect::default()));
            let actual: Vec<Rgba<u8>> = (0..4).map(|x| *image.get_pixel(x, 0)).collect();
            assert_eq!(actual, expected.to_vec());
        }
    }

    #[test]
    fn test_write_png_and_gif() {
        let tile = Tile::new(56, [0xaa; 8]);
        let frames = vec![frame(tile, 1, MaskType::None, CropRect::default())];
        let mut png: Vec<u8> = vec![];
        RasterEncoder::new()
            .write_image(&frames, &mut png, ImageFormat::Png)
            .unwrap();
        assert_eq!(&png[1..4], b"PNG");

        let mut gif: Vec<u8> = vec![];
        RasterEncoder::new()
            .write_image(&frames, &mut gif, ImageFormat::Gif)
            .unwrap();
        assert_eq!(&gif[..3], b"GIF");
    }

    #[test]
    fn test_empty_frame_is_an_error() {
        let frames = vec![Frame::new(vec![vec![]], 1, MaskType::None, CropRect::default()).unwrap()];
        let result = RasterEncoder::new().write_image(&frames, &mut Vec::<u8>::new(), ImageFormat::Png);
        assert!(matches!(result, Err(ImageError::Empty(_))));
    }
}
