//! TGA image container: the pixel sink the rasterizer writes into, plus
//! the binary file codec (raw and run-length-encoded).
//!
//! The in-memory grid and the file format share one pixel layout: channels
//! are stored blue-green-red[-alpha], the order TGA uses on disk. Bounds
//! behavior follows the pixel-sink contract: out-of-range reads return the
//! zero color, out-of-range writes are silently ignored.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Pixel format, as bytes per pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Grayscale = 1,
    Rgb = 3,
    Rgba = 4,
}

/// A color in file channel order: blue, green, red, alpha.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Color {
    pub bgra: [u8; 4],
}

impl Color {
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            bgra: [b, g, r, 255],
        }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { bgra: [b, g, r, a] }
    }

    pub const fn r(&self) -> u8 {
        self.bgra[2]
    }

    pub const fn g(&self) -> u8 {
        self.bgra[1]
    }

    pub const fn b(&self) -> u8 {
        self.bgra[0]
    }

    pub const fn a(&self) -> u8 {
        self.bgra[3]
    }

    /// Scales the color channels (alpha untouched) by `factor`, clamping
    /// to the byte range.
    pub fn modulate(&self, factor: f64) -> Self {
        let mut out = *self;
        for channel in &mut out.bgra[..3] {
            *channel = (*channel as f64 * factor).round().min(255.0) as u8;
        }
        out
    }
}

const FOOTER: &[u8; 18] = b"TRUEVISION-XFILE.\0";
const MAX_CHUNK: usize = 128;

/// A dense 2D grid of pixels with TGA import/export.
#[derive(Clone, Debug, PartialEq)]
pub struct TgaImage {
    data: Vec<u8>,
    width: i32,
    height: i32,
    format: Format,
}

impl TgaImage {
    /// Creates a black (all-zero) image.
    pub fn new(width: i32, height: i32, format: Format) -> Self {
        let size = width.max(0) as usize * height.max(0) as usize * format as usize;
        Self {
            data: vec![0; size],
            width,
            height,
            format,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn format(&self) -> Format {
        self.format
    }

    fn bytespp(&self) -> usize {
        self.format as usize
    }

    /// Reads the pixel at `(x, y)`; out-of-range coordinates yield the
    /// zero color.
    pub fn get(&self, x: i32, y: i32) -> Color {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return Color::default();
        }
        let bpp = self.bytespp();
        let idx = (y as usize * self.width as usize + x as usize) * bpp;
        let mut c = Color::default();
        c.bgra[..bpp].copy_from_slice(&self.data[idx..idx + bpp]);
        c
    }

    /// Writes the pixel at `(x, y)`; out-of-range coordinates are ignored.
    pub fn set(&mut self, x: i32, y: i32, color: Color) {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return;
        }
        let bpp = self.bytespp();
        let idx = (y as usize * self.width as usize + x as usize) * bpp;
        self.data[idx..idx + bpp].copy_from_slice(&color.bgra[..bpp]);
    }

    /// Resets every pixel to the zero color.
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    pub fn flip_vertically(&mut self) {
        let row = self.width as usize * self.bytespp();
        let h = self.height as usize;
        for y in 0..h / 2 {
            let (a, b) = (y * row, (h - 1 - y) * row);
            for i in 0..row {
                self.data.swap(a + i, b + i);
            }
        }
    }

    pub fn flip_horizontally(&mut self) {
        let bpp = self.bytespp();
        let (w, h) = (self.width as usize, self.height as usize);
        for y in 0..h {
            for x in 0..w / 2 {
                let a = (y * w + x) * bpp;
                let b = (y * w + (w - 1 - x)) * bpp;
                for i in 0..bpp {
                    self.data.swap(a + i, b + i);
                }
            }
        }
    }

    // =========================================================================
    // Codec
    // =========================================================================

    /// Writes the image as a TGA file, run-length-encoded when `rle` is set.
    pub fn write_file<P: AsRef<Path>>(&self, path: P, rle: bool) -> io::Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write_to(&mut out, rle)?;
        out.flush()
    }

    /// Serializes the image into `out`: 18-byte header, pixel stream,
    /// zeroed developer/extension references, and the TGA 2.0 footer.
    pub fn write_to<W: Write>(&self, out: &mut W, rle: bool) -> io::Result<()> {
        let mut header = [0u8; 18];
        header[2] = match (self.format, rle) {
            (Format::Grayscale, false) => 3,
            (Format::Grayscale, true) => 11,
            (_, false) => 2,
            (_, true) => 10,
        };
        header[12..14].copy_from_slice(&(self.width as u16).to_le_bytes());
        header[14..16].copy_from_slice(&(self.height as u16).to_le_bytes());
        header[16] = (self.bytespp() * 8) as u8;
        header[17] = 0x20; // top-left origin
        out.write_all(&header)?;

        if rle {
            self.write_rle(out)?;
        } else {
            out.write_all(&self.data)?;
        }

        out.write_all(&[0u8; 8])?; // developer + extension area references
        out.write_all(FOOTER)
    }

    /// Loads a TGA file from disk.
    pub fn read_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Self::read_from(&mut BufReader::new(File::open(path)?))
    }

    /// Parses a TGA stream. Supports the data types this crate writes:
    /// raw and RLE, grayscale and true-color.
    pub fn read_from<R: Read>(input: &mut R) -> io::Result<Self> {
        let mut header = [0u8; 18];
        input.read_exact(&mut header)?;

        let width = u16::from_le_bytes([header[12], header[13]]) as i32;
        let height = u16::from_le_bytes([header[14], header[15]]) as i32;
        let format = match header[16] >> 3 {
            1 => Format::Grayscale,
            3 => Format::Rgb,
            4 => Format::Rgba,
            bpp => {
                return Err(invalid_data(format!("unsupported bytes per pixel: {bpp}")));
            }
        };
        if width <= 0 || height <= 0 {
            return Err(invalid_data(format!("bad dimensions: {width}x{height}")));
        }

        // Skip the optional image id field.
        let mut id = vec![0u8; header[0] as usize];
        input.read_exact(&mut id)?;

        let mut data = vec![0u8; width as usize * height as usize * format as usize];
        match header[2] {
            2 | 3 => input.read_exact(&mut data)?,
            10 | 11 => read_rle(input, &mut data, format as usize)?,
            dt => return Err(invalid_data(format!("unknown data type code: {dt}"))),
        }

        let mut img = Self {
            data,
            width,
            height,
            format,
        };
        if header[17] & 0x20 == 0 {
            img.flip_vertically(); // stored bottom-to-top
        }
        if header[17] & 0x10 != 0 {
            img.flip_horizontally();
        }
        Ok(img)
    }

    /// Run-length-encodes the pixel stream. Chunk headers 0..=127 announce
    /// a raw run of `header + 1` pixels, 128..=255 a repeated run of
    /// `header - 127` copies of one pixel; runs never exceed 128 pixels.
    fn write_rle<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let bpp = self.bytespp();
        let npixels = self.width as usize * self.height as usize;
        let mut current = 0;

        while current < npixels {
            let chunk_start = current * bpp;
            let mut byte = current * bpp;
            let mut run_length = 1;
            let mut raw = true;

            while current + run_length < npixels && run_length < MAX_CHUNK {
                let succ_eq = self.data[byte..byte + bpp] == self.data[byte + bpp..byte + 2 * bpp];
                byte += bpp;
                if run_length == 1 {
                    raw = !succ_eq;
                }
                if raw && succ_eq {
                    run_length -= 1;
                    break;
                }
                if !raw && !succ_eq {
                    break;
                }
                run_length += 1;
            }
            current += run_length;

            if raw {
                out.write_all(&[(run_length - 1) as u8])?;
                out.write_all(&self.data[chunk_start..chunk_start + run_length * bpp])?;
            } else {
                out.write_all(&[(run_length + 127) as u8])?;
                out.write_all(&self.data[chunk_start..chunk_start + bpp])?;
            }
        }
        Ok(())
    }
}

/// Decodes an RLE pixel stream into `data`, which is sized for exactly the
/// expected pixel count. A stream that overruns it is malformed.
fn read_rle<R: Read>(input: &mut R, data: &mut [u8], bpp: usize) -> io::Result<()> {
    let mut filled = 0;
    while filled < data.len() {
        let mut chunk = [0u8];
        input.read_exact(&mut chunk)?;

        if chunk[0] < 128 {
            let run = (chunk[0] as usize + 1) * bpp;
            if filled + run > data.len() {
                return Err(invalid_data("raw run overflows pixel count"));
            }
            input.read_exact(&mut data[filled..filled + run])?;
            filled += run;
        } else {
            let count = chunk[0] as usize - 127;
            let mut pixel = [0u8; 4];
            input.read_exact(&mut pixel[..bpp])?;
            if filled + count * bpp > data.len() {
                return Err(invalid_data("repeated run overflows pixel count"));
            }
            for _ in 0..count {
                data[filled..filled + bpp].copy_from_slice(&pixel[..bpp]);
                filled += bpp;
            }
        }
    }
    Ok(())
}

fn invalid_data(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn roundtrip(img: &TgaImage, rle: bool) -> TgaImage {
        let mut bytes = Vec::new();
        img.write_to(&mut bytes, rle).unwrap();
        assert!(bytes.ends_with(FOOTER));
        TgaImage::read_from(&mut Cursor::new(bytes)).unwrap()
    }

    /// Deterministic but non-repetitive pixel pattern, worst case for RLE.
    fn noisy(width: i32, height: i32, format: Format) -> TgaImage {
        let mut img = TgaImage::new(width, height, format);
        for y in 0..height {
            for x in 0..width {
                let v = (x * 31 + y * 57) as u8;
                img.set(x, y, Color::rgb(v, v.wrapping_mul(3), v.wrapping_add(89)));
            }
        }
        img
    }

    #[test]
    fn get_out_of_range_is_zero_color() {
        let img = TgaImage::new(4, 4, Format::Rgb);
        assert_eq!(img.get(-1, 0), Color::default());
        assert_eq!(img.get(0, 4), Color::default());
    }

    #[test]
    fn set_out_of_range_is_ignored() {
        let mut img = TgaImage::new(4, 4, Format::Rgb);
        img.set(4, 0, Color::WHITE);
        img.set(0, -1, Color::WHITE);
        assert_eq!(img, TgaImage::new(4, 4, Format::Rgb));
    }

    #[test]
    fn set_then_get_returns_the_color() {
        let mut img = TgaImage::new(4, 4, Format::Rgba);
        let c = Color::rgba(1, 2, 3, 4);
        img.set(2, 3, c);
        assert_eq!(img.get(2, 3), c);
    }

    #[test]
    fn raw_roundtrip_is_lossless() {
        let img = noisy(13, 7, Format::Rgb);
        assert_eq!(roundtrip(&img, false), img);
    }

    #[test]
    fn rle_roundtrip_on_repetitive_data() {
        let mut img = TgaImage::new(64, 64, Format::Rgb);
        for y in 0..64 {
            for x in 0..64 {
                img.set(x, y, if y < 32 { Color::rgb(200, 0, 0) } else { Color::WHITE });
            }
        }
        assert_eq!(roundtrip(&img, true), img);
    }

    #[test]
    fn rle_roundtrip_on_noisy_data() {
        let img = noisy(37, 11, Format::Rgba);
        assert_eq!(roundtrip(&img, true), img);
    }

    #[test]
    fn rle_roundtrip_grayscale() {
        let mut img = TgaImage::new(16, 4, Format::Grayscale);
        for x in 0..16 {
            img.set(x, 1, Color::rgb(0, 0, x as u8 * 16));
        }
        assert_eq!(roundtrip(&img, true), img);
    }

    #[test]
    fn rle_compresses_constant_images() {
        let img = TgaImage::new(64, 64, Format::Rgb);
        let mut raw = Vec::new();
        let mut rle = Vec::new();
        img.write_to(&mut raw, false).unwrap();
        img.write_to(&mut rle, true).unwrap();
        assert!(rle.len() < raw.len() / 8);
    }

    #[test]
    fn truncated_stream_is_an_error() {
        let img = noisy(8, 8, Format::Rgb);
        let mut bytes = Vec::new();
        img.write_to(&mut bytes, false).unwrap();
        bytes.truncate(18 + 10);
        assert!(TgaImage::read_from(&mut Cursor::new(bytes)).is_err());
    }

    #[test]
    fn overlong_rle_run_is_an_error() {
        // Header claims a 2x1 image, then a repeated run of 128 pixels.
        let mut bytes = vec![0u8; 18];
        bytes[2] = 10;
        bytes[12] = 2;
        bytes[14] = 1;
        bytes[16] = 24;
        bytes[17] = 0x20;
        bytes.extend_from_slice(&[255, 1, 2, 3]);
        assert!(TgaImage::read_from(&mut Cursor::new(bytes)).is_err());
    }

    #[test]
    fn modulate_scales_and_clamps() {
        let c = Color::rgb(100, 200, 10);
        assert_eq!(c.modulate(0.5), Color::rgb(50, 100, 5));
        assert_eq!(c.modulate(2.0), Color::rgb(200, 255, 20));
        assert_eq!(c.modulate(2.0).a(), 255);
    }
}
