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

//! Turning a batch into downloadable files.
//!
//! Cards are rendered and rasterized strictly one at a time: each image is
//! handed to the archiver before the next card is rendered, so at most one
//! raster buffer is alive.

use crate::batch::Batch;
use crate::error::Fallible;
use crate::error::fail;
use crate::render::Page;
use crate::render::render_card_svg;
use crate::settings::Settings;

pub const ARCHIVE_FILE_NAME: &str = "bingo-cards.zip";

/// Turns an SVG document into encoded image bytes.
pub trait Rasterizer {
    fn render(&mut self, svg: &str) -> Fallible<Vec<u8>>;
}

/// Collects files into a single archive.
pub trait Archiver {
    fn add_file(&mut self, name: &str, bytes: &[u8]) -> Fallible<()>;
    fn finalize(self) -> Fallible<Vec<u8>>;
}

#[derive(Debug, PartialEq)]
pub enum Export {
    /// One card: the image itself.
    Single { file_name: String, bytes: Vec<u8> },
    /// Several cards: an archive of images.
    Archive { file_name: String, bytes: Vec<u8> },
}

impl Export {
    pub fn file_name(&self) -> &str {
        match self {
            Export::Single { file_name, .. } | Export::Archive { file_name, .. } => file_name,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        match self {
            Export::Single { bytes, .. } | Export::Archive { bytes, .. } => bytes,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Export::Single { bytes, .. } | Export::Archive { bytes, .. } => bytes,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Export::Single { .. } => "image/png",
            Export::Archive { .. } => "application/zip",
        }
    }
}

/// Name of the image for card `n` (1-based) inside an archive.
pub fn card_file_name(n: usize) -> String {
    format!("bingo-card-{n}.png")
}

/// Export a batch. A single card is returned as `bingo-card-{stamp}.png`;
/// several cards go into an archive. The archiver is only finalized once
/// every card has been added.
pub fn export_batch<R, A>(
    batch: &Batch,
    settings: &Settings,
    rasterizer: &mut R,
    archiver: A,
    stamp: &str,
) -> Fallible<Export>
where
    R: Rasterizer,
    A: Archiver,
{
    match batch.cards() {
        [] => fail("There are no cards to export."),
        [card] => {
            let svg = render_card_svg(card, settings, Page::A4);
            let bytes = rasterizer.render(&svg)?;
            Ok(Export::Single {
                file_name: format!("bingo-card-{stamp}.png"),
                bytes,
            })
        }
        cards => {
            let mut archiver = archiver;
            for (i, card) in cards.iter().enumerate() {
                log::debug!("Rendering card {}/{}", i + 1, cards.len());
                let svg = render_card_svg(card, settings, Page::A4);
                let bytes = rasterizer.render(&svg)?;
                archiver.add_file(&card_file_name(i + 1), &bytes)?;
            }
            Ok(Export::Archive {
                file_name: ARCHIVE_FILE_NAME.to_string(),
                bytes: archiver.finalize()?,
            })
        }
    }
}
