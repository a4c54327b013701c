use std::io;
use std::io::Write;
use std::convert::TryFrom;
use std::fs::File;
use std::path::Path;

use crate::color::Rgba;
use crate::error::{ RenderError, Result };

/// Where rendered pixels go.
///
/// The frame driver calls `put_pixel` once per pixel and `finish` once after
/// the last row. Implementations validate what they are given and report
/// failures instead of ignoring them.
pub trait PixelSink {
    /// Stores one pixel.
    fn put_pixel(&mut self, x: usize, y: usize, pixel: Rgba) -> Result<()>;

    /// Stores one pixel given as raw channel values in `0..=255`.
    ///
    /// Values that are not numbers in that range are rejected with
    /// `RenderError::InvalidColorComponent`.
    fn put_rgba(&mut self, x: usize, y: usize,
        r: f64, g: f64, b: f64, a: f64) -> Result<()> {
        let pixel = Rgba::try_new(r, g, b, a)?;
        self.put_pixel(x, y, pixel)
    }

    /// Signals that the whole frame has been written.
    fn finish(&mut self) {}
}

/// A canvas for drawing pixels.
///
/// This structure stores the results of the raycaster, one `Rgba` per pixel,
/// and can save them to a PPM or PNG file once the frame is done.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct Canvas {
    /// The width of the canvas, in pixels.
    pub width: usize,

    /// The height of the canvas, in pixels.
    pub height: usize,

    /// The pixels of the canvas, stored as a flattened vector.
    pixels: Vec<Rgba>,

    finished: bool,
}

impl Canvas {
    /// Creates a new canvas filled with the background color.
    pub fn new(width: usize, height: usize) -> Canvas {
        Canvas {
            width,
            height,
            pixels: vec![Rgba::BACKGROUND; width * height],
            finished: false,
        }
    }

    /// Whether a full frame has been written since the canvas was created.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Writes a color to a location on the `Canvas`.
    ///
    /// Pixels are specified in row-column order, where `y` is the row of the
    /// pixel, and `x` is the column. Rows and columns are zero-indexed.
    ///
    /// # Examples
    ///
    /// ```
    /// # use ellipsoid_raycaster::color::Rgba;
    /// # use ellipsoid_raycaster::canvas::Canvas;
    /// let purple = Rgba { r: 255, g: 0, b: 255, a: 255 };
    /// let mut canvas = Canvas::new(8, 8);
    /// canvas.write_pixel(4, 2, purple).unwrap();
    /// assert_eq!(canvas.read_pixel(4, 2), Some(purple));
    /// assert!(canvas.write_pixel(8, 0, purple).is_err());
    /// ```
    pub fn write_pixel(&mut self, x: usize, y: usize, pixel: Rgba)
        -> Result<()> {
        if x >= self.width || y >= self.height {
            return Err(RenderError::OutOfBoundsPixel {
                x, y,
                width: self.width,
                height: self.height,
            });
        }

        self.pixels[(y * self.width) + x] = pixel;
        Ok(())
    }

    /// Reads a pixel from a location on the `Canvas`, or `None` if the
    /// location is out-of-bounds.
    pub fn read_pixel(&self, x: usize, y: usize) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None
        }

        Some(self.pixels[(y * self.width) + x])
    }

    /// Copies a full row of pixels into the canvas.
    pub fn write_row(&mut self, y: usize, row: &[Rgba]) -> Result<()> {
        if y >= self.height || row.len() != self.width {
            return Err(RenderError::OutOfBoundsPixel {
                x: row.len().saturating_sub(1), y,
                width: self.width,
                height: self.height,
            });
        }

        let start = y * self.width;
        self.pixels[start..start + self.width].copy_from_slice(row);
        Ok(())
    }

    /// The pixels as tightly packed RGBA bytes, row-major from the top.
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        self.pixels.iter()
            .flat_map(|p| [p.r, p.g, p.b, p.a].to_vec())
            .collect()
    }

    /// Saves the canvas, choosing PNG for a `.png` extension and PPM
    /// otherwise.
    pub fn save(&self, path: &Path) -> Result<()> {
        let is_png = path.extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("png"));

        if is_png {
            self.save_png(path)
        } else {
            let mut out = File::create(path)?;
            self.write_ppm(&mut out)?;
            Ok(())
        }
    }

    /// Saves the canvas to a PNG file, alpha included.
    pub fn save_png(&self, path: &Path) -> Result<()> {
        let too_large = || RenderError::ImageTooLarge {
            width: self.width,
            height: self.height,
        };
        let width = u32::try_from(self.width).map_err(|_| too_large())?;
        let height = u32::try_from(self.height).map_err(|_| too_large())?;

        image::save_buffer(
            path,
            &self.to_rgba_bytes(),
            width,
            height,
            image::ExtendedColorType::Rgba8,
        )?;

        Ok(())
    }

    /// Writes the canvas as a plain PPM (P3) image.
    ///
    /// PPM has no alpha channel, so alpha is dropped. Lines are clamped to 70
    /// columns; a value that would cross the 70 column mark starts a new
    /// line.
    pub fn write_ppm<W: Write>(&self, out: &mut W) -> io::Result<()> {
        // Write PPM header, as well as metadata
        writeln!(out, "P3")?;
        writeln!(out, "{} {}", self.width, self.height)?;
        writeln!(out, "255")?; // Maximum color value

        let mut col = 0;
        for pixel in self.pixels.iter() {
            for value in [pixel.r, pixel.g, pixel.b].iter() {
                let s = value.to_string();

                if col == 0 {
                    write!(out, "{}", s)?;
                    col = s.len();
                } else if col + 1 + s.len() > 70 {
                    write!(out, "\n{}", s)?;
                    col = s.len();
                } else {
                    write!(out, " {}", s)?;
                    col += 1 + s.len();
                }
            }
        }

        // Terminate the PPM file with a newline
        writeln!(out)?;
        Ok(())
    }
}

impl PixelSink for Canvas {
    fn put_pixel(&mut self, x: usize, y: usize, pixel: Rgba) -> Result<()> {
        self.write_pixel(x, y, pixel)
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}

#[test]
fn new_canvas_is_background() {
    let c = Canvas::new(10, 20);

    assert_eq!(c.read_pixel(0, 0), Some(Rgba::BACKGROUND));
    assert_eq!(c.read_pixel(9, 19), Some(Rgba::BACKGROUND));
    assert_eq!(c.read_pixel(10, 0), None);
    assert!(!c.is_finished());
}

#[test]
fn out_of_bounds_write_is_reported() {
    let mut c = Canvas::new(3, 2);
    let px = Rgba { r: 1, g: 2, b: 3, a: 255 };

    match c.write_pixel(1, 2, px) {
        Err(RenderError::OutOfBoundsPixel { x, y, width, height }) => {
            assert_eq!((x, y, width, height), (1, 2, 3, 2));
        },
        other => panic!("expected OutOfBoundsPixel, got {:?}", other),
    }
}

#[test]
fn raw_channels_are_validated() {
    let mut c = Canvas::new(2, 2);

    assert!(c.put_rgba(0, 0, 10.0, 20.0, 30.0, 255.0).is_ok());
    assert_eq!(c.read_pixel(0, 0), Some(Rgba { r: 10, g: 20, b: 30, a: 255 }));

    assert!(matches!(c.put_rgba(1, 1, 10.0, 300.0, 30.0, 255.0),
        Err(RenderError::InvalidColorComponent { channel: 'g', .. })));
    assert_eq!(c.read_pixel(1, 1), Some(Rgba::BACKGROUND));
}

#[test]
fn write_row_fills_one_line() {
    let mut c = Canvas::new(2, 2);
    let white = Rgba { r: 255, g: 255, b: 255, a: 255 };

    c.write_row(1, &[white, white]).unwrap();
    assert_eq!(c.read_pixel(0, 0), Some(Rgba::BACKGROUND));
    assert_eq!(c.read_pixel(1, 1), Some(white));
    assert!(c.write_row(0, &[white]).is_err());
}

#[test]
fn rgba_bytes_are_row_major() {
    let mut c = Canvas::new(2, 1);
    c.write_pixel(1, 0, Rgba { r: 9, g: 8, b: 7, a: 6 }).unwrap();

    assert_eq!(c.to_rgba_bytes(), vec![0, 0, 0, 255, 9, 8, 7, 6]);
}

#[test]
fn ppm_header_and_body() {
    let mut c = Canvas::new(2, 2);
    c.write_pixel(0, 0, Rgba { r: 255, g: 0, b: 0, a: 255 }).unwrap();
    c.write_pixel(1, 1, Rgba { r: 0, g: 128, b: 255, a: 255 }).unwrap();

    let mut out = Vec::new();
    c.write_ppm(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert_eq!(text, "P3\n2 2\n255\n255 0 0 0 0 0 0 0 0 0 128 255\n");
}

#[test]
fn ppm_lines_stay_under_70_columns() {
    let mut c = Canvas::new(10, 2);
    let px = Rgba { r: 255, g: 204, b: 153, a: 255 };
    for y in 0..2 {
        for x in 0..10 {
            c.write_pixel(x, y, px).unwrap();
        }
    }

    let mut out = Vec::new();
    c.write_ppm(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.lines().all(|l| l.len() <= 70));
    assert_eq!(text.split_whitespace().count(), 4 + 10 * 2 * 3);
    assert!(text.ends_with('\n'));
}

#[test]
fn png_keeps_rgba_bytes() {
    let mut c = Canvas::new(2, 1);
    c.write_pixel(0, 0, Rgba { r: 255, g: 128, b: 0, a: 255 }).unwrap();
    c.write_pixel(1, 0, Rgba { r: 9, g: 8, b: 7, a: 6 }).unwrap();

    let path = std::env::temp_dir()
        .join(format!("ellipsoid-raycaster-{}.png", std::process::id()));
    c.save(&path).unwrap();

    let loaded = image::open(&path).unwrap().to_rgba8();
    let _ = std::fs::remove_file(&path);

    assert_eq!(loaded.dimensions(), (2, 1));
    assert_eq!(loaded.into_raw(), c.to_rgba_bytes());
}
