// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! PNG rasterization and ZIP archiving for the export pipeline.

use std::io::Cursor;
use std::io::Write;
use std::sync::Arc;

use bingocards_core::error::ErrorReport;
use bingocards_core::error::Fallible;
use bingocards_core::export::Archiver;
use bingocards_core::export::Rasterizer;
use png::BitDepth;
use png::ColorType;
use png::Compression;
use png::Encoder;
use png::FilterType;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Default device pixel ratio for exported images.
pub const DEFAULT_PIXEL_RATIO: f32 = 2.0;

/// Renders SVG to PNG with resvg.
pub struct PngRasterizer {
    options: usvg::Options<'static>,
    pixel_ratio: f32,
}

impl PngRasterizer {
    pub fn new(pixel_ratio: f32) -> Self {
        let mut options = usvg::Options::default();
        let mut fontdb = usvg::fontdb::Database::new();
        fontdb.load_system_fonts();
        options.fontdb = Arc::new(fontdb);
        Self {
            options,
            pixel_ratio: pixel_ratio.clamp(0.25, 8.0),
        }
    }
}

impl Rasterizer for PngRasterizer {
    fn render(&mut self, svg: &str) -> Fallible<Vec<u8>> {
        let tree = usvg::Tree::from_str(svg, &self.options)
            .map_err(|e| ErrorReport::new(format!("SVG parse error: {e:?}")))?;
        let size = tree.size();
        let w = (size.width() * self.pixel_ratio).ceil() as u32;
        let h = (size.height() * self.pixel_ratio).ceil() as u32;
        let mut pixmap = tiny_skia::Pixmap::new(w, h)
            .ok_or_else(|| ErrorReport::new("pixmap alloc failed"))?;
        let transform = tiny_skia::Transform::from_scale(self.pixel_ratio, self.pixel_ratio);
        resvg::render(&tree, transform, &mut pixmap.as_mut());
        encode_png(&pixmap)
    }
}

fn encode_png(pixmap: &tiny_skia::Pixmap) -> Fallible<Vec<u8>> {
    // tiny-skia stores premultiplied alpha; PNG wants straight alpha.
    let mut data: Vec<u8> = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    let mut out: Vec<u8> = Vec::new();
    {
        let mut enc = Encoder::new(&mut out, pixmap.width(), pixmap.height());
        enc.set_color(ColorType::Rgba);
        enc.set_depth(BitDepth::Eight);
        enc.set_filter(FilterType::NoFilter);
        enc.set_compression(Compression::Default);
        let mut writer = enc.write_header().map_err(png_error)?;
        writer.write_image_data(&data).map_err(png_error)?;
    }
    Ok(out)
}

fn png_error(e: png::EncodingError) -> ErrorReport {
    ErrorReport::new(format!("PNG encoding error: {e}"))
}

/// Builds a ZIP archive in memory. Entries are stored uncompressed since PNG
/// data is already compressed.
pub struct ZipArchiver {
    writer: ZipWriter<Cursor<Vec<u8>>>,
}

impl ZipArchiver {
    pub fn new() -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
        }
    }
}

impl Default for ZipArchiver {
    fn default() -> Self {
        Self::new()
    }
}

impl Archiver for ZipArchiver {
    fn add_file(&mut self, name: &str, bytes: &[u8]) -> Fallible<()> {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        self.writer.start_file(name, options).map_err(zip_error)?;
        self.writer.write_all(bytes)?;
        Ok(())
    }

    fn finalize(self) -> Fallible<Vec<u8>> {
        let cursor = self.writer.finish().map_err(zip_error)?;
        Ok(cursor.into_inner())
    }
}

fn zip_error(e: zip::result::ZipError) -> ErrorReport {
    ErrorReport::new(format!("ZIP error: {e}"))
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use bingocards_core::batch::generate_batch;
    use bingocards_core::export::Export;
    use bingocards_core::export::export_batch;
    use bingocards_core::rng::TinyRng;
    use bingocards_core::settings::Settings;
    use zip::ZipArchive;

    use super::*;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

    #[test]
    fn test_rasterize_svg() -> Fallible<()> {
        let svg = "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"10\" height=\"20\"><rect width=\"10\" height=\"20\" fill=\"#ff0000\"/></svg>";
        let mut rasterizer = PngRasterizer::new(2.0);
        let bytes = rasterizer.render(svg)?;
        assert!(bytes.starts_with(PNG_MAGIC));
        let decoder = png::Decoder::new(Cursor::new(bytes));
        let reader = decoder.read_info().map_err(|e| ErrorReport::new(e.to_string()))?;
        assert_eq!(reader.info().width, 20);
        assert_eq!(reader.info().height, 40);
        Ok(())
    }

    #[test]
    fn test_invalid_svg() {
        let mut rasterizer = PngRasterizer::new(1.0);
        assert!(rasterizer.render("not svg").is_err());
    }

    #[test]
    fn test_zip_archive() -> Fallible<()> {
        let mut archiver = ZipArchiver::new();
        archiver.add_file("a.png", b"first")?;
        archiver.add_file("b.png", b"second")?;
        let bytes = archiver.finalize()?;
        let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(zip_error)?;
        assert_eq!(archive.len(), 2);
        let mut contents = String::new();
        archive
            .by_name("b.png")
            .map_err(zip_error)?
            .read_to_string(&mut contents)?;
        assert_eq!(contents, "second");
        Ok(())
    }

    #[test]
    fn test_export_two_cards_to_zip() -> Fallible<()> {
        let settings = Settings::default();
        let batch = generate_batch(
            &settings.term_pool(),
            settings.layout(),
            2,
            &mut TinyRng::from_seed(11),
        )?;
        let mut rasterizer = PngRasterizer::new(0.5);
        let export = export_batch(&batch, &settings, &mut rasterizer, ZipArchiver::new(), "0")?;
        let Export::Archive { file_name, bytes } = export else {
            panic!("expected an archive");
        };
        assert_eq!(file_name, "bingo-cards.zip");
        let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(zip_error)?;
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(names, vec!["bingo-card-1.png", "bingo-card-2.png"]);
        let mut first = Vec::new();
        archive
            .by_name("bingo-card-1.png")
            .map_err(zip_error)?
            .read_to_end(&mut first)?;
        assert!(first.starts_with(PNG_MAGIC));
        Ok(())
    }
}
