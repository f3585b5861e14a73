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

use std::fmt::Display;
use std::fmt::Formatter;
use std::fs::create_dir_all;
use std::io::Read;
use std::io::Write;
use std::io::stdin;
use std::io::stdout;
use std::path::Path;
use std::path::PathBuf;

use bingocards_core::batch::Batch;
use bingocards_core::batch::generate_batch;
use bingocards_core::card::GRID_SIZE;
use bingocards_core::error::Fallible;
use bingocards_core::export::export_batch;
use bingocards_core::render::Page;
use bingocards_core::render::render_card_svg;
use bingocards_core::rng::TinyRng;
use bingocards_core::settings::Settings;
use clap::ValueEnum;

use crate::db::Database;
use crate::export::PngRasterizer;
use crate::export::ZipArchiver;
use crate::utils::entropy_seed;
use crate::utils::image_data_uri;
use crate::utils::timestamp_millis;

/// Widest a cell gets in text output, in characters.
const TEXT_CELL_WIDTH: usize = 16;

#[derive(ValueEnum, Clone, Copy, PartialEq, Debug)]
pub enum OutputFormat {
    /// ASCII grids.
    Text,
    /// The batch as JSON.
    Json,
    /// One SVG page per card.
    Svg,
    /// A PNG for one card, a ZIP of PNGs for several.
    Png,
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Svg => write!(f, "svg"),
            OutputFormat::Png => write!(f, "png"),
        }
    }
}

pub struct GenerateConfig {
    pub store: String,
    pub terms: Option<String>,
    pub quantity: usize,
    pub free_space: Option<bool>,
    pub seed: Option<u64>,
    pub profile: Option<String>,
    pub background: Option<String>,
    pub format: OutputFormat,
    pub output: Option<String>,
    pub pixel_ratio: f32,
}

pub fn generate_cards(config: GenerateConfig) -> Fallible<()> {
    let settings = resolve_settings(&config)?;
    let seed = config.seed.unwrap_or_else(entropy_seed);
    log::debug!("Shuffling with seed {seed}");
    let mut rng = TinyRng::from_seed(seed);
    let batch = generate_batch(
        &settings.term_pool(),
        settings.layout(),
        config.quantity,
        &mut rng,
    )?;

    match config.format {
        OutputFormat::Text => {
            write_output(config.output.as_deref(), render_text(&batch).as_bytes())
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&batch)?;
            write_output(config.output.as_deref(), json.as_bytes())
        }
        OutputFormat::Svg => write_svgs(&batch, &settings, config.output.as_deref()),
        OutputFormat::Png => {
            let mut rasterizer = PngRasterizer::new(config.pixel_ratio);
            let stamp = timestamp_millis().to_string();
            let export = export_batch(
                &batch,
                &settings,
                &mut rasterizer,
                ZipArchiver::new(),
                &stamp,
            )?;
            let path: PathBuf = config
                .output
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(export.file_name()));
            std::fs::write(&path, export.bytes())?;
            println!("Wrote {}", path.display());
            Ok(())
        }
    }
}

/// Stored settings, then the profile, then explicit flags.
fn resolve_settings(config: &GenerateConfig) -> Fallible<Settings> {
    let db = Database::new(&config.store)?;
    let mut settings = Settings::load(&db);
    if let Some(profile) = &config.profile {
        let text = std::fs::read_to_string(profile)?;
        settings.apply_toml(&text)?;
    }
    if let Some(terms) = &config.terms {
        settings.terms = read_terms(terms)?;
    }
    if let Some(free_space) = config.free_space {
        settings.use_free_space = free_space;
    }
    if let Some(background) = &config.background {
        settings.background_image = Some(image_data_uri(Path::new(background))?);
    }
    Ok(settings)
}

fn read_terms(source: &str) -> Fallible<String> {
    if source == "-" {
        let mut text = String::new();
        stdin().read_to_string(&mut text)?;
        Ok(text)
    } else {
        Ok(std::fs::read_to_string(source)?)
    }
}

fn write_output(output: Option<&str>, bytes: &[u8]) -> Fallible<()> {
    match output {
        Some(path) => std::fs::write(path, bytes)?,
        None => stdout().write_all(bytes)?,
    }
    Ok(())
}

/// A single card goes to the output file (or stdout); several go into the
/// output directory as `bingo-card-{n}.svg`.
fn write_svgs(batch: &Batch, settings: &Settings, output: Option<&str>) -> Fallible<()> {
    if let [card] = batch.cards() {
        let svg = render_card_svg(card, settings, Page::A4);
        return write_output(output, svg.as_bytes());
    }
    let dir = PathBuf::from(output.unwrap_or("."));
    create_dir_all(&dir)?;
    for (i, card) in batch.cards().iter().enumerate() {
        let path = dir.join(format!("bingo-card-{}.svg", i + 1));
        std::fs::write(&path, render_card_svg(card, settings, Page::A4))?;
    }
    println!("Wrote {} cards to {}", batch.len(), dir.display());
    Ok(())
}

/// ASCII rendering of a batch, one grid per card.
pub fn render_text(batch: &Batch) -> String {
    let border = {
        let mut line = String::from("+");
        for _ in 0..GRID_SIZE {
            line.push_str(&"-".repeat(TEXT_CELL_WIDTH + 2));
            line.push('+');
        }
        line
    };
    let mut out = String::new();
    for card in batch.cards() {
        out.push_str(&format!("Card {}\n", card.id()));
        out.push_str(&border);
        out.push('\n');
        for (r, row) in card.rows().enumerate() {
            out.push('|');
            for (c, cell) in row.iter().enumerate() {
                let text = if card.is_free_cell(r * GRID_SIZE + c) {
                    format!("[{cell}]")
                } else {
                    cell.clone()
                };
                out.push_str(&format!(" {:<width$} |", truncate(&text), width = TEXT_CELL_WIDTH));
            }
            out.push('\n');
            out.push_str(&border);
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= TEXT_CELL_WIDTH {
        text.to_string()
    } else {
        let mut s: String = text.chars().take(TEXT_CELL_WIDTH - 1).collect();
        s.push('~');
        s
    }
}
