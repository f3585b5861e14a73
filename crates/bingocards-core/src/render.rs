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

//! SVG rendering of cards. All coordinates are in millimetres.

use crate::card::Card;
use crate::card::FREE_SPACE_INDEX;
use crate::card::GRID_SIZE;
use crate::card::preview_cells;
use crate::settings::Settings;

/// CSS pixels to millimetres at 96 dpi.
const PX_TO_MM: f64 = 25.4 / 96.0;

const FREE_CELL_FILL: &str = "#fde047";
const FREE_CELL_TEXT: &str = "#dc2626";

/// What the SVG is for.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Page {
    /// A portrait A4 sheet for printing and image export.
    A4,
    /// A small square card for the live preview, at half type size.
    Preview,
}

struct Geometry {
    width: f64,
    height: f64,
    padding: f64,
    max_grid: f64,
    header_gap: f64,
    /// Multiplier applied to the configured title/subtitle sizes.
    type_scale: f64,
    cell_font: f64,
    free_font: f64,
    stroke: f64,
}

impl Page {
    fn geometry(self) -> Geometry {
        match self {
            Page::A4 => Geometry {
                width: 210.0,
                height: 297.0,
                padding: 12.7,
                max_grid: 180.0,
                header_gap: 8.5,
                type_scale: 1.0,
                cell_font: 14.0 * PX_TO_MM,
                free_font: 18.0 * PX_TO_MM,
                stroke: 0.26,
            },
            Page::Preview => Geometry {
                width: 120.0,
                height: 120.0,
                padding: 4.2,
                max_grid: 120.0,
                header_gap: 2.1,
                type_scale: 0.5,
                cell_font: 8.0 * PX_TO_MM,
                free_font: 9.0 * PX_TO_MM,
                stroke: 0.13,
            },
        }
    }
}

/// Render one generated card.
pub fn render_card_svg(card: &Card, settings: &Settings, page: Page) -> String {
    let free = card.has_free_space().then_some(FREE_SPACE_INDEX);
    render_grid_svg(card.cells(), free, settings, page)
}

/// Render the live preview: the terms in input order, padded when short.
pub fn render_preview_svg(settings: &Settings) -> String {
    let cells = preview_cells(&settings.term_pool(), settings.use_free_space);
    let free = settings.use_free_space.then_some(FREE_SPACE_INDEX);
    render_grid_svg(&cells, free, settings, Page::Preview)
}

fn render_grid_svg(
    cells: &[String],
    free_index: Option<usize>,
    settings: &Settings,
    page: Page,
) -> String {
    let g = page.geometry();
    let color = &settings.text_color;
    let font_family = settings.font_family.generic();

    // Header block.
    let title_font = settings.title_size as f64 * g.type_scale * PX_TO_MM;
    let title_h = title_font * 1.1;
    let subtitle_font = settings.subtitle_size as f64 * g.type_scale * PX_TO_MM;
    let has_subtitle = !settings.subtitle.trim().is_empty();
    let subtitle_h = if has_subtitle {
        subtitle_font * 1.4 + g.header_gap / 4.0
    } else {
        0.0
    };
    let header_h = title_h + subtitle_h;

    // The grid is square and takes whatever room the header leaves.
    let content_w = g.width - 2.0 * g.padding;
    let avail_h = g.height - 2.0 * g.padding - header_h - g.header_gap;
    let grid = g.max_grid.min(content_w).min(avail_h).max(10.0);
    let cell = grid / GRID_SIZE as f64;
    let total_h = header_h + g.header_gap + grid;
    let top = g.padding + ((g.height - 2.0 * g.padding - total_h) / 2.0).max(0.0);
    let grid_x = (g.width - grid) / 2.0;
    let grid_y = top + header_h + g.header_gap;
    let center_x = g.width / 2.0;

    let mut s = String::new();
    s.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}mm\" height=\"{h}mm\" viewBox=\"0 0 {w} {h}\" font-family=\"{font_family}\">\n",
        w = fmt_mm(g.width),
        h = fmt_mm(g.height),
    ));
    s.push_str("<rect x=\"0\" y=\"0\" width=\"100%\" height=\"100%\" fill=\"#ffffff\"/>\n");

    if let Some(uri) = &settings.background_image {
        s.push_str(&format!(
            "<image href=\"{}\" x=\"0\" y=\"0\" width=\"{}\" height=\"{}\" preserveAspectRatio=\"xMidYMid slice\" opacity=\"{}\"/>\n",
            svg_escape(uri),
            fmt_mm(g.width),
            fmt_mm(g.height),
            fmt_mm(settings.background_opacity),
        ));
    }

    let title = if settings.title_uppercase {
        settings.title.to_uppercase()
    } else {
        settings.title.clone()
    };
    s.push_str(&format!(
        "<text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-size=\"{}\" font-weight=\"{}\" font-style=\"{}\" fill=\"{}\">{}</text>\n",
        fmt_mm(center_x),
        fmt_mm(top + title_font * 0.9),
        fmt_mm(title_font),
        settings.title_weight.value(),
        if settings.title_italic { "italic" } else { "normal" },
        color,
        svg_escape(&title),
    ));
    if has_subtitle {
        s.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-size=\"{}\" fill=\"{}\" fill-opacity=\"0.8\">{}</text>\n",
            fmt_mm(center_x),
            fmt_mm(top + title_h + g.header_gap / 4.0 + subtitle_font * 1.1),
            fmt_mm(subtitle_font),
            color,
            svg_escape(&settings.subtitle),
        ));
    }

    for (i, text) in cells.iter().enumerate() {
        let x = grid_x + (i % GRID_SIZE) as f64 * cell;
        let y = grid_y + (i / GRID_SIZE) as f64 * cell;
        if free_index == Some(i) {
            push_free_cell(&mut s, &g, x, y, cell, color, text);
        } else {
            push_term_cell(&mut s, &g, x, y, cell, settings, text);
        }
    }

    s.push_str(&format!(
        "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\"/>\n",
        fmt_mm(grid_x),
        fmt_mm(grid_y),
        fmt_mm(grid),
        fmt_mm(grid),
        color,
        fmt_mm(g.stroke * 2.0),
    ));
    s.push_str("</svg>\n");
    s
}

fn push_term_cell(
    s: &mut String,
    g: &Geometry,
    x: f64,
    y: f64,
    cell: f64,
    settings: &Settings,
    text: &str,
) {
    s.push_str(&format!(
        "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"#ffffff\" fill-opacity=\"{}\" stroke=\"{}\" stroke-width=\"{}\"/>\n",
        fmt_mm(x),
        fmt_mm(y),
        fmt_mm(cell),
        fmt_mm(cell),
        fmt_mm(settings.cell_opacity),
        settings.text_color,
        fmt_mm(g.stroke),
    ));
    let inner = cell * 0.88;
    let (font, lines) = fit_text(text, g.cell_font, inner, inner);
    push_lines(
        s,
        &lines,
        x + cell / 2.0,
        y + cell / 2.0,
        font,
        &settings.text_color,
    );
}

fn push_free_cell(
    s: &mut String,
    g: &Geometry,
    x: f64,
    y: f64,
    cell: f64,
    border: &str,
    text: &str,
) {
    s.push_str(&format!(
        "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{FREE_CELL_FILL}\" stroke=\"{}\" stroke-width=\"{}\"/>\n",
        fmt_mm(x),
        fmt_mm(y),
        fmt_mm(cell),
        fmt_mm(cell),
        border,
        fmt_mm(g.stroke),
    ));
    let cx = x + cell / 2.0;
    let cy = y + cell / 2.0;
    let (font, lines) = fit_text(text, g.free_font, cell * 0.7, cell * 0.5);
    s.push_str(&format!(
        "<g transform=\"rotate(-12 {} {})\">\n",
        fmt_mm(cx),
        fmt_mm(cy)
    ));
    let widest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) as f64;
    let rx = (widest * font * 0.3 + font * 0.6).min(cell * 0.46);
    let ry = (lines.len() as f64 * font * 0.6 + font * 0.4).min(cell * 0.4);
    s.push_str(&format!(
        "<ellipse cx=\"{}\" cy=\"{}\" rx=\"{}\" ry=\"{}\" fill=\"none\" stroke=\"{FREE_CELL_TEXT}\" stroke-width=\"{}\"/>\n",
        fmt_mm(cx),
        fmt_mm(cy),
        fmt_mm(rx),
        fmt_mm(ry),
        fmt_mm(g.stroke * 2.0),
    ));
    push_lines(s, &lines, cx, cy, font, FREE_CELL_TEXT);
    s.push_str("</g>\n");
}

fn push_lines(
    s: &mut String,
    lines: &[String],
    cx: f64,
    cy: f64,
    font: f64,
    fill: &str,
) {
    let line_h = font * 1.2;
    let first = cy - (lines.len() as f64 - 1.0) * line_h / 2.0 + font * 0.35;
    s.push_str(&format!(
        "<text text-anchor=\"middle\" font-size=\"{}\" font-weight=\"700\" fill=\"{}\">",
        fmt_mm(font),
        fill,
    ));
    for (i, line) in lines.iter().enumerate() {
        s.push_str(&format!(
            "<tspan x=\"{}\" y=\"{}\">{}</tspan>",
            fmt_mm(cx),
            fmt_mm(first + i as f64 * line_h),
            svg_escape(line)
        ));
    }
    s.push_str("</text>\n");
}

/// Shrink the font until the wrapped text fits the box.
fn fit_text(text: &str, font: f64, width: f64, height: f64) -> (f64, Vec<String>) {
    let min_font = font * 0.5;
    let mut font = font;
    loop {
        let max_chars = ((width / (font * 0.55)).floor() as usize).max(1);
        let lines = wrap_words(text, max_chars);
        let fits = lines.len() as f64 * font * 1.2 <= height;
        if fits || font * 0.85 < min_font {
            return (font, lines);
        }
        font *= 0.85;
    }
}

/// Greedy word wrap. Words longer than a line are split.
fn wrap_words(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let word: String = word.into_iter().collect();
        if current.is_empty() {
            current = word;
        } else if current.chars().count() + 1 + word.chars().count() <= max_chars {
            current.push(' ');
            current.push_str(&word);
        } else {
            lines.push(std::mem::replace(&mut current, word));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

// Near-integers print as integers, everything else with up to 3 decimals.
fn fmt_mm(v: f64) -> String {
    if (v - v.round()).abs() < 1e-6 {
        format!("{:.0}", v)
    } else {
        format!("{:.3}", v)
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}

fn svg_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardId;
    use crate::card::assemble;

    fn card(use_free_space: bool) -> Card {
        let pool: Vec<String> = (0..25).map(|i| format!("term {i}")).collect();
        Card::new(CardId::new(1), assemble(&pool, use_free_space), use_free_space)
    }

    #[test]
    fn test_a4_dimensions() {
        let svg = render_card_svg(&card(true), &Settings::default(), Page::A4);
        assert!(svg.starts_with("<svg "));
        assert!(svg.contains("width=\"210mm\" height=\"297mm\""));
        assert!(svg.contains("viewBox=\"0 0 210 297\""));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_free_cell_only_when_enabled() {
        let with = render_card_svg(&card(true), &Settings::default(), Page::A4);
        assert!(with.contains(FREE_CELL_FILL));
        assert!(with.contains(">FREE</tspan>") || with.contains(">FREE SPACE</tspan>"));
        let without = render_card_svg(&card(false), &Settings::default(), Page::A4);
        assert!(!without.contains(FREE_CELL_FILL));
    }

    #[test]
    fn test_term_cells_rendered() {
        let svg = render_card_svg(&card(false), &Settings::default(), Page::A4);
        for i in 0..25 {
            assert!(svg.contains(&format!(">term {i}</tspan>")));
        }
    }

    #[test]
    fn test_escapes_user_text() {
        let mut settings = Settings::default();
        settings.title = "Q&A <live>".to_string();
        let svg = render_preview_svg(&settings);
        assert!(svg.contains("Q&amp;A &lt;live&gt;"));
        assert!(!svg.contains("<live>"));
    }

    #[test]
    fn test_title_styling() {
        let mut settings = Settings::default();
        settings.title = "office bingo".to_string();
        settings.title_uppercase = true;
        settings.title_italic = true;
        let svg = render_preview_svg(&settings);
        assert!(svg.contains(">OFFICE BINGO</text>"));
        assert!(svg.contains("font-style=\"italic\""));
        assert!(svg.contains("font-weight=\"900\""));
    }

    #[test]
    fn test_subtitle_only_when_present() {
        let mut settings = Settings::default();
        let svg = render_preview_svg(&settings);
        assert!(!svg.contains("fill-opacity=\"0.8\""));
        settings.subtitle = "Friday".to_string();
        let svg = render_preview_svg(&settings);
        assert!(svg.contains(">Friday</text>"));
    }

    #[test]
    fn test_background_layer() {
        let mut settings = Settings::default();
        let svg = render_preview_svg(&settings);
        assert!(!svg.contains("<image"));
        settings.background_image = Some("data:image/png;base64,AAAA".to_string());
        settings.background_opacity = 0.3;
        let svg = render_preview_svg(&settings);
        assert!(svg.contains("<image href=\"data:image/png;base64,AAAA\""));
        assert!(svg.contains("opacity=\"0.3\""));
    }

    #[test]
    fn test_preview_placeholders() {
        let mut settings = Settings::default();
        settings.terms = "only one".to_string();
        let svg = render_preview_svg(&settings);
        assert!(svg.contains(">only one</tspan>"));
        assert!(svg.contains(">...</tspan>"));
    }

    #[test]
    fn test_wrap_words() {
        assert_eq!(wrap_words("Think Outside the Box", 10), vec!["Think", "Outside", "the Box"]);
        assert_eq!(wrap_words("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert!(wrap_words("   ", 4).is_empty());
    }

    #[test]
    fn test_fmt_mm() {
        assert_eq!(fmt_mm(210.0), "210");
        assert_eq!(fmt_mm(0.5), "0.5");
        assert_eq!(fmt_mm(1.23456), "1.235");
    }
}
