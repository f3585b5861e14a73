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

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use bingocards_core::batch::Batch;
use bingocards_core::batch::MAX_QUANTITY;
use bingocards_core::render::Page;
use bingocards_core::render::render_card_svg;
use bingocards_core::render::render_preview_svg;
use bingocards_core::settings::FontFamily;
use bingocards_core::settings::SUBTITLE_SIZE_RANGE;
use bingocards_core::settings::Settings;
use bingocards_core::settings::TITLE_SIZE_RANGE;
use bingocards_core::settings::TitleWeight;
use bingocards_core::terms::count_terms;
use maud::Markup;
use maud::PreEscaped;
use maud::html;

use crate::cmd::serve::state::ServerState;
use crate::cmd::serve::template::page_template;

pub async fn get_handler(State(state): State<ServerState>) -> (StatusCode, Html<String>) {
    let mut mutable = state.lock();
    let notice = mutable.notice.take();
    let body = render_page(
        &mutable.settings,
        mutable.quantity,
        mutable.batch.as_ref(),
        notice.as_deref(),
    );
    let html = page_template(body).into_string();
    (StatusCode::OK, Html(html))
}

fn render_page(
    settings: &Settings,
    quantity: usize,
    batch: Option<&Batch>,
    notice: Option<&str>,
) -> Markup {
    html! {
        div.controls {
            h1 { "Bingo Card Generator" }
            @if let Some(notice) = notice {
                p #notice .notice data-notice=(notice) { (notice) }
            }
            form #settings method="post" action="/" {
                (render_terms(settings))
                (render_title_fields(settings))
                (render_style_fields(settings))
                (render_background(settings))
                fieldset {
                    legend { "Cards" }
                    label {
                        "Quantity "
                        input type="number" name="quantity" min="1" max=(MAX_QUANTITY)
                            value=(quantity);
                    }
                    div.buttons {
                        button type="submit" name="action" value="Generate" { "Generate" }
                        @if settings.background_image.is_some() {
                            button type="submit" name="action" value="RemoveBackground" {
                                "Remove Background"
                            }
                        }
                        @if batch.is_some() {
                            button #print type="button" { "Print" }
                            a.button href="/download" { "Download" }
                        }
                        button type="submit" name="action" value="Reset" { "Reset to Defaults" }
                        button type="submit" name="action" value="Quit" { "Quit" }
                    }
                }
            }
            @if let Some(batch) = batch {
                p.status { (status_line(batch.len())) }
            }
            h2 { "Preview" }
            div #preview {
                (PreEscaped(render_preview_svg(settings)))
            }
        }
        @if let Some(batch) = batch {
            div #print-area {
                @for card in batch.cards() {
                    div.page {
                        (PreEscaped(render_card_svg(card, settings, Page::A4)))
                    }
                }
            }
        }
    }
}

fn render_terms(settings: &Settings) -> Markup {
    let count = count_terms(&settings.terms);
    let required = settings.layout().required_terms();
    html! {
        fieldset {
            legend { "Terms" }
            textarea #terms name="terms" rows="14" data-required=(required) { (settings.terms) }
            p #term-count .short[count < required] {
                (count) " terms (" (required) " needed)"
            }
            label {
                input type="checkbox" name="use-free-space" checked[settings.use_free_space];
                " Free space in the centre"
            }
        }
    }
}

fn render_title_fields(settings: &Settings) -> Markup {
    let (title_lo, title_hi) = TITLE_SIZE_RANGE;
    let (sub_lo, sub_hi) = SUBTITLE_SIZE_RANGE;
    html! {
        fieldset {
            legend { "Header" }
            label { "Title " input type="text" name="title" value=(settings.title); }
            label { "Subtitle " input type="text" name="subtitle" value=(settings.subtitle); }
            label {
                "Title size "
                input type="range" name="title-size" min=(title_lo) max=(title_hi)
                    value=(settings.title_size);
            }
            label {
                "Subtitle size "
                input type="range" name="subtitle-size" min=(sub_lo) max=(sub_hi)
                    value=(settings.subtitle_size);
            }
            label {
                "Weight "
                select name="title-weight" {
                    @for weight in [TitleWeight::Normal, TitleWeight::Bold, TitleWeight::Black] {
                        option value=(weight.value()) selected[settings.title_weight == weight] {
                            (weight.label())
                        }
                    }
                }
            }
            label {
                input type="checkbox" name="title-italic" checked[settings.title_italic];
                " Italic"
            }
            label {
                input type="checkbox" name="title-uppercase" checked[settings.title_uppercase];
                " Uppercase"
            }
        }
    }
}

fn render_style_fields(settings: &Settings) -> Markup {
    html! {
        fieldset {
            legend { "Style" }
            label {
                "Font "
                select name="font-family" {
                    @for family in [FontFamily::Sans, FontFamily::Serif, FontFamily::Mono] {
                        option value=(family.as_str()) selected[settings.font_family == family] {
                            (family.generic())
                        }
                    }
                }
            }
            label {
                "Text colour "
                input type="color" name="text-color" value=(settings.text_color);
            }
            label {
                "Cell opacity "
                input type="range" name="cell-opacity" min="0" max="1" step="0.05"
                    value=(settings.cell_opacity);
            }
            label {
                "Background opacity "
                input type="range" name="background-opacity" min="0" max="1" step="0.05"
                    value=(settings.background_opacity);
            }
        }
    }
}

fn render_background(settings: &Settings) -> Markup {
    html! {
        fieldset {
            legend { "Background" }
            input #background-file type="file" accept="image/*";
            input #background type="hidden" name="background-image" value="";
            @if settings.background_image.is_some() {
                span.hint { "An image is set." }
            }
        }
    }
}

fn status_line(n: usize) -> String {
    if n == 1 {
        "1 Card Generated!".to_string()
    } else {
        format!("{n} Cards Generated!")
    }
}

#[cfg(test)]
mod tests {
    use bingocards_core::batch::generate_batch;
    use bingocards_core::error::Fallible;
    use bingocards_core::rng::TinyRng;

    use super::*;

    #[test]
    fn test_status_line() {
        assert_eq!(status_line(1), "1 Card Generated!");
        assert_eq!(status_line(3), "3 Cards Generated!");
    }

    #[test]
    fn test_render_page_without_batch() {
        let settings = Settings::default();
        let html = render_page(&settings, 1, None, None).into_string();
        assert!(html.contains("25 terms (24 needed)"));
        assert!(!html.contains("print-area"));
        assert!(!html.contains("/download"));
    }

    #[test]
    fn test_render_page_with_batch_and_notice() -> Fallible<()> {
        let settings = Settings::default();
        let batch = generate_batch(
            &settings.term_pool(),
            settings.layout(),
            2,
            &mut TinyRng::from_seed(1),
        )?;
        let html = render_page(&settings, 2, Some(&batch), Some("Careful & slow")).into_string();
        assert!(html.contains("2 Cards Generated!"));
        assert_eq!(html.matches("class=\"page\"").count(), 2);
        assert!(html.contains("Careful &amp; slow"));
        Ok(())
    }

    #[test]
    fn test_escapes_user_text() {
        let mut settings = Settings::default();
        settings.title = "<script>".to_string();
        let html = render_page(&settings, 1, None, None).into_string();
        assert!(!html.contains("value=\"<script>\""));
        assert!(html.contains("value=\"&lt;script&gt;\""));
    }
}
