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

use axum::Form;
use axum::extract::State;
use axum::http::HeaderName;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::Html;
use axum::response::IntoResponse;
use axum::response::Redirect;
use axum::response::Response;
use bingocards_core::batch::generate_batch;
use bingocards_core::error::Fallible;
use bingocards_core::error::fail;
use bingocards_core::render::render_preview_svg;
use bingocards_core::settings::Settings;
use bingocards_core::settings::canonical_field;
use maud::html;

use crate::cmd::serve::state::MutableState;
use crate::cmd::serve::state::ServerState;
use crate::cmd::serve::template::page_template;

/// Checkbox fields. A browser omits unchecked boxes, so when the full
/// settings form is submitted an absent toggle means `false`.
const TOGGLES: [&str; 3] = ["title-italic", "title-uppercase", "use-free-space"];

#[derive(Clone, Copy, PartialEq, Debug)]
enum Action {
    Save,
    Generate,
    RemoveBackground,
    Reset,
    Quit,
}

impl Action {
    fn parse(value: Option<&str>) -> Fallible<Self> {
        match value {
            None | Some("Save") => Ok(Action::Save),
            Some("Generate") => Ok(Action::Generate),
            Some("RemoveBackground") => Ok(Action::RemoveBackground),
            Some("Reset") => Ok(Action::Reset),
            Some("Quit") => Ok(Action::Quit),
            Some(other) => fail(format!("Unknown action: '{other}'.")),
        }
    }
}

type FormPairs = Vec<(String, String)>;

pub async fn post_handler(
    State(state): State<ServerState>,
    Form(form): Form<FormPairs>,
) -> Response {
    let action = match Action::parse(form_value(&form, "action")) {
        Ok(action) => action,
        Err(e) => return (StatusCode::BAD_REQUEST, e.message().to_string()).into_response(),
    };
    if action == Action::Quit {
        state.shutdown();
        let html = page_template(html! {
            h1 { "Server stopped" }
            p { "You can close this tab." }
        });
        return (StatusCode::OK, Html(html.into_string())).into_response();
    }
    let mut mutable = state.lock();
    if let Err(e) = handle_action(&mut mutable, action, &form) {
        push_notice(&mut mutable, e.message().to_string());
    }
    Redirect::to("/").into_response()
}

/// Apply a live edit and answer with the updated preview.
pub async fn preview_handler(
    State(state): State<ServerState>,
    Form(form): Form<FormPairs>,
) -> (StatusCode, [(HeaderName, &'static str); 1], String) {
    let mut mutable = state.lock();
    let mut settings = mutable.settings.clone();
    if let Err(e) = apply_form(&mut settings, &form) {
        return (
            StatusCode::BAD_REQUEST,
            [(CONTENT_TYPE, "text/plain")],
            e.message().to_string(),
        );
    }
    warn_skipped(&settings.save(&mutable.db));
    let svg = render_preview_svg(&settings);
    mutable.settings = settings;
    (StatusCode::OK, [(CONTENT_TYPE, "image/svg+xml")], svg)
}

fn handle_action(
    mutable: &mut MutableState,
    action: Action,
    form: &[(String, String)],
) -> Fallible<()> {
    match action {
        Action::Save | Action::Generate => {
            let mut settings = mutable.settings.clone();
            apply_form(&mut settings, form)?;
            mutable.settings = settings;
            persist(mutable);
            if let Some(quantity) = form_value(form, "quantity") {
                mutable.quantity = parse_quantity(quantity)?;
            }
            if action == Action::Generate {
                let batch = generate_batch(
                    &mutable.settings.term_pool(),
                    mutable.settings.layout(),
                    mutable.quantity,
                    &mut mutable.rng,
                )?;
                mutable.batch = Some(batch);
            }
        }
        Action::RemoveBackground => {
            mutable.settings.background_image = None;
            persist(mutable);
        }
        Action::Reset => {
            mutable.settings = Settings::default();
            if let Err(e) = Settings::clear(&mutable.db) {
                log::warn!("Failed to clear stored settings: {e}");
                push_notice(mutable, e.message().to_string());
            }
            log::debug!("Settings reset to defaults");
        }
        Action::Quit => {}
    }
    Ok(())
}

/// Overlay the submitted fields onto `settings`. Unknown names are ignored;
/// an empty background leaves the current image in place.
pub fn apply_form(settings: &mut Settings, form: &[(String, String)]) -> Fallible<()> {
    for (name, value) in form {
        match canonical_field(name) {
            Some("background-image") if value.is_empty() => {}
            Some(field) => settings.set_field(field, value)?,
            None => {}
        }
    }
    if form_value(form, "terms").is_some() {
        for field in TOGGLES {
            if !form.iter().any(|(name, _)| canonical_field(name) == Some(field)) {
                settings.set_field(field, "false")?;
            }
        }
    }
    Ok(())
}

/// Write the settings through. Fields the store refuses stay in memory and
/// are reported in the notice.
fn persist(mutable: &mut MutableState) {
    let skipped = mutable.settings.save(&mutable.db);
    warn_skipped(&skipped);
    if !skipped.is_empty() {
        let message = format!(
            "Some settings could not be saved: {}.",
            skipped.join(", ")
        );
        push_notice(mutable, message);
    }
}

fn push_notice(mutable: &mut MutableState, message: String) {
    mutable.notice = Some(match mutable.notice.take() {
        Some(previous) => format!("{previous} {message}"),
        None => message,
    });
}

fn warn_skipped(skipped: &[&str]) {
    if !skipped.is_empty() {
        log::warn!("Settings not persisted: {}", skipped.join(", "));
    }
}

fn parse_quantity(value: &str) -> Fallible<usize> {
    match value.trim().parse::<usize>() {
        Ok(n) => Ok(n),
        Err(_) => fail(format!("Not a quantity: '{value}'.")),
    }
}

fn form_value<'a>(form: &'a [(String, String)], name: &str) -> Option<&'a str> {
    form.iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

#[cfg(test)]
mod tests {
    use bingocards_core::rng::TinyRng;
    use rusqlite::Connection;

    use super::*;
    use crate::db::Database;
    use crate::helper::create_tmp_store;

    fn state_with_store(path: &str) -> Fallible<MutableState> {
        Ok(MutableState {
            db: Database::new(path)?,
            settings: Settings::default(),
            quantity: 1,
            batch: None,
            notice: None,
            rng: TinyRng::from_seed(3),
        })
    }

    fn pairs(items: &[(&str, &str)]) -> FormPairs {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_action() -> Fallible<()> {
        assert_eq!(Action::parse(None)?, Action::Save);
        assert_eq!(Action::parse(Some("Generate"))?, Action::Generate);
        assert!(Action::parse(Some("Explode")).is_err());
        Ok(())
    }

    #[test]
    fn test_full_form_clears_absent_toggles() -> Fallible<()> {
        let mut settings = Settings::default();
        settings.title_italic = true;
        apply_form(
            &mut settings,
            &pairs(&[("terms", "a\nb"), ("title-uppercase", "on")]),
        )?;
        assert_eq!(settings.terms, "a\nb");
        assert!(!settings.title_italic);
        assert!(settings.title_uppercase);
        assert!(!settings.use_free_space);
        Ok(())
    }

    #[test]
    fn test_partial_form_keeps_toggles() -> Fallible<()> {
        let mut settings = Settings::default();
        apply_form(&mut settings, &pairs(&[("title", "Partial")]))?;
        assert_eq!(settings.title, "Partial");
        assert!(settings.use_free_space);
        Ok(())
    }

    #[test]
    fn test_empty_background_keeps_image() -> Fallible<()> {
        let mut settings = Settings::default();
        settings.background_image = Some("data:image/png;base64,AAAA".to_string());
        apply_form(&mut settings, &pairs(&[("background-image", "")]))?;
        assert!(settings.background_image.is_some());
        Ok(())
    }

    #[test]
    fn test_bad_value_is_an_error() {
        let mut settings = Settings::default();
        let result = apply_form(&mut settings, &pairs(&[("text-color", "blue")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_quantity() -> Fallible<()> {
        assert_eq!(parse_quantity(" 12 ")?, 12);
        assert!(parse_quantity("many").is_err());
        Ok(())
    }

    #[test]
    fn test_generate_survives_store_failure() -> Fallible<()> {
        let path = create_tmp_store()?;
        let mut mutable = state_with_store(&path)?;
        // Every write through `mutable.db` now fails.
        Connection::open(&path)
            .unwrap()
            .execute_batch("drop table settings")
            .unwrap();

        let form = pairs(&[("title", "Offline"), ("quantity", "2")]);
        handle_action(&mut mutable, Action::Generate, &form)?;

        assert_eq!(mutable.batch.as_ref().map(|b| b.len()), Some(2));
        assert_eq!(mutable.settings.title, "Offline");
        let notice = mutable.notice.unwrap_or_default();
        assert!(notice.starts_with("Some settings could not be saved: terms, title"));
        Ok(())
    }

    #[test]
    fn test_bad_quantity_keeps_other_edits() -> Fallible<()> {
        let path = create_tmp_store()?;
        let mut mutable = state_with_store(&path)?;
        let form = pairs(&[("title", "Kept"), ("quantity", "")]);
        assert!(handle_action(&mut mutable, Action::Generate, &form).is_err());
        assert_eq!(mutable.settings.title, "Kept");
        assert_eq!(Settings::load(&mutable.db).title, "Kept");
        assert!(mutable.batch.is_none());
        Ok(())
    }

    #[test]
    fn test_notices_accumulate() -> Fallible<()> {
        let mut mutable = state_with_store(&create_tmp_store()?)?;
        push_notice(&mut mutable, "First.".to_string());
        push_notice(&mut mutable, "Second.".to_string());
        assert_eq!(mutable.notice.as_deref(), Some("First. Second."));
        Ok(())
    }
}
