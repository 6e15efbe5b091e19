//! Page UI (axum): dataset preview, model selector, prediction and feedback.
//!
//! Each visitor gets a session on first successful model selection. The
//! session owns the models fitted for it; `/end` drops them, and once
//! `server.max_sessions` is reached the least recently used one is dropped.
//! A session is taken out of the map while its model is fitted, so the map
//! lock is never held across a fit.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::dataset::{Dataset, Label};
use crate::error::{Error, Result};
use crate::pipeline::{self, FittedModel, Pipeline, SharedNormalizer};

const PREVIEW_ROWS: usize = 5;

pub type SessionId = String;

/// Models fitted for one visitor.
#[derive(Default)]
pub struct Session {
    logistic: Option<FittedModel>,
    naive_bayes: Option<FittedModel>,
    /// Stamp of the last request that stored this session, 0 until first stored.
    last_used: u64,
}

impl Session {
    /// The session's model for `pipeline`, fitted on first use.
    pub fn model(
        &mut self,
        pipeline: Pipeline,
        dataset: &Dataset,
        config: &Config,
        normalizer: &SharedNormalizer,
    ) -> Result<&FittedModel> {
        let slot = match pipeline {
            Pipeline::LogisticRegression => &mut self.logistic,
            Pipeline::NaiveBayes => &mut self.naive_bayes,
        };
        let model = match slot.take() {
            Some(model) => model,
            None => FittedModel::fit(pipeline, dataset, config, normalizer)?,
        };
        Ok(slot.insert(model))
    }

    pub fn fitted(&self) -> usize {
        usize::from(self.logistic.is_some()) + usize::from(self.naive_bayes.is_some())
    }
}

pub struct ShellState {
    pub dataset: Dataset,
    pub config: Config,
    pub normalizer: SharedNormalizer,
    pub sessions: Mutex<HashMap<SessionId, Session>>,
    /// Server-wide models behind `/api/predict`.
    pub api_models: Mutex<HashMap<Pipeline, FittedModel>>,
    clock: AtomicU64,
}

impl ShellState {
    /// Remove the session named by `sid` from the map, or start a new one.
    fn take_session(&self, sid: Option<&str>) -> (SessionId, Session) {
        let existing = sid.and_then(|sid| {
            self.sessions
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(sid)
                .map(|session| (sid.to_string(), session))
        });
        existing.unwrap_or_else(|| {
            let sid = new_session_id();
            debug!(sid = %sid, "new session");
            (sid, Session::default())
        })
    }

    /// Put a session (back) into the map, evicting the least recently used
    /// one when the map is full.
    fn store_session(&self, sid: SessionId, mut session: Session) {
        if session.last_used == 0 {
            info!(sid = %sid, "session started");
        }
        session.last_used = self.clock.fetch_add(1, Ordering::Relaxed);
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        if !sessions.contains_key(&sid) {
            while sessions.len() >= self.config.server.max_sessions.max(1) {
                let oldest = sessions
                    .iter()
                    .min_by_key(|(_, s)| s.last_used)
                    .map(|(id, _)| id.clone());
                let Some(oldest) = oldest else { break };
                sessions.remove(&oldest);
                info!(sid = %oldest, "session evicted");
            }
        }
        sessions.insert(sid, session);
    }
}

pub type AppState = Arc<ShellState>;

pub fn app_state(dataset: Dataset, config: Config) -> AppState {
    Arc::new(ShellState {
        dataset,
        config,
        normalizer: pipeline::shared_normalizer(),
        sessions: Mutex::new(HashMap::new()),
        api_models: Mutex::new(HashMap::new()),
        clock: AtomicU64::new(1),
    })
}

fn new_session_id() -> SessionId {
    format!("{:016x}", rand::thread_rng().gen::<u64>())
}

/// Query params for GET /
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub sid: Option<String>,
    pub model: Option<String>,
    pub headline: Option<String>,
    pub feedback: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EndQuery {
    pub sid: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiQuery {
    pub model: String,
    pub headline: String,
}

#[derive(Debug, Serialize)]
pub struct Prediction {
    pub label: u8,
    pub verdict: &'static str,
}

/// Everything the page shows for one request.
#[derive(Debug, Default)]
pub struct PageView<'a> {
    pub sid: Option<&'a str>,
    pub selected: Option<Pipeline>,
    pub accuracy_percent: Option<f64>,
    pub headline: Option<&'a str>,
    pub verdict: Option<Label>,
    /// `true` unless the visitor answered "No".
    pub accurate: bool,
    pub error: Option<String>,
}

/// GET / -> the whole page.
pub async fn index_page(
    State(state): State<AppState>,
    Query(params): Query<PageQuery>,
) -> Response {
    let mut view = PageView {
        sid: params.sid.as_deref(),
        accurate: params.feedback.as_deref() != Some("No"),
        ..PageView::default()
    };

    let pipeline = match params.model.as_deref().map(str::parse::<Pipeline>) {
        None => return page(&state, StatusCode::OK, &view),
        Some(Ok(pipeline)) => pipeline,
        Some(Err(err)) => {
            view.error = Some(err.to_string());
            return page(&state, StatusCode::OK, &view);
        }
    };
    view.selected = Some(pipeline);

    let (sid, mut session) = state.take_session(params.sid.as_deref());
    let fitted = session
        .model(pipeline, &state.dataset, &state.config, &state.normalizer)
        .map(|model| {
            let prediction = params.headline.as_deref().map(|h| model.predict(h));
            (model.accuracy_percent(), prediction)
        });

    let (accuracy, prediction) = match fitted {
        Ok(fitted) => fitted,
        Err(err) => {
            warn!(sid = %sid, model = %pipeline, error = %err, "model fit failed");
            // a session with no model left is not worth keeping
            if session.fitted() > 0 {
                state.store_session(sid.clone(), session);
                view.sid = Some(&sid);
            } else {
                view.sid = None;
            }
            view.error = Some(err.to_string());
            return page(&state, StatusCode::INTERNAL_SERVER_ERROR, &view);
        }
    };
    state.store_session(sid.clone(), session);
    view.sid = Some(&sid);
    view.accuracy_percent = Some(accuracy);

    if let Some(prediction) = prediction {
        view.headline = params.headline.as_deref();
        match prediction {
            Ok(label) => view.verdict = Some(label),
            Err(err) => view.error = Some(err.to_string()),
        }
    }
    page(&state, StatusCode::OK, &view)
}

fn page(state: &ShellState, status: StatusCode, view: &PageView<'_>) -> Response {
    (status, Html(render_page(&state.dataset, view))).into_response()
}

/// GET /end?sid=... -> drop the session and go back to the start page.
pub async fn end_session(
    State(state): State<AppState>,
    Query(params): Query<EndQuery>,
) -> Redirect {
    if let Some(sid) = params.sid {
        let removed = state
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&sid);
        if let Some(session) = removed {
            info!(sid = %sid, models = session.fitted(), "session ended");
        }
    }
    Redirect::to("/")
}

/// JSON error body for the API.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_user_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// GET /api/predict?model=lr&headline=... -> `{ "label": 1, "verdict": "..." }`
pub async fn api_predict(
    State(state): State<AppState>,
    Query(params): Query<ApiQuery>,
) -> std::result::Result<Json<Prediction>, ApiError> {
    let pipeline: Pipeline = params.model.parse()?;
    let mut models = state.api_models.lock().unwrap_or_else(PoisonError::into_inner);
    let model = match models.entry(pipeline) {
        Entry::Occupied(entry) => entry.into_mut(),
        Entry::Vacant(entry) => entry.insert(FittedModel::fit(
            pipeline,
            &state.dataset,
            &state.config,
            &state.normalizer,
        )?),
    };
    let label = model.predict(&params.headline)?;
    Ok(Json(Prediction {
        label: label.as_u8(),
        verdict: label.verdict(),
    }))
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const STYLE: &str = r#"
    body { font-family: system-ui, sans-serif; margin: 0; display: flex; }
    aside { width: 260px; min-height: 100vh; padding: 1.5rem 1rem; background: #f0f2f6; box-sizing: border-box; }
    main { max-width: 720px; margin: 0 auto; padding: 2rem 1rem; flex: 1; }
    h1 { font-size: 2rem; }
    .info { background: #e8f0fe; color: #0b3d91; padding: 0.75rem 1rem; border-radius: 4px; }
    .error { background: #fdecea; color: #8a1c1c; padding: 0.75rem 1rem; border-radius: 4px; }
    table { border-collapse: collapse; margin: 1rem 0; }
    th, td { border: 1px solid #ddd; padding: 0.3rem 0.6rem; text-align: left; }
    input[type="text"] { width: 100%; padding: 0.5rem; font-size: 1rem; box-sizing: border-box; }
    button { margin-top: 0.5rem; padding: 0.5rem 1rem; font-size: 1rem; cursor: pointer; }
"#;

fn hidden(out: &mut String, name: &str, value: &str) {
    let _ = write!(
        out,
        r#"<input type="hidden" name="{}" value="{}">"#,
        name,
        escape_html(value)
    );
}

fn render_sidebar(out: &mut String, view: &PageView<'_>) {
    out.push_str("<aside><form method=\"get\" action=\"/\">");
    if let Some(sid) = view.sid {
        hidden(out, "sid", sid);
    }
    out.push_str("<p>Select different methods for prediction.</p>");
    for pipeline in Pipeline::ALL {
        let checked = if view.selected == Some(pipeline) { " checked" } else { "" };
        let _ = write!(
            out,
            r#"<label><input type="radio" name="model" value="{}" onchange="this.form.submit()"{}> {}</label><br>"#,
            pipeline.key(),
            checked,
            escape_html(pipeline.title())
        );
    }
    out.push_str("<button type=\"submit\">Select</button></form>");
    if let Some(sid) = view.sid {
        let _ = write!(
            out,
            r#"<p><a href="/end?sid={}">End session</a></p>"#,
            escape_html(sid)
        );
    }
    out.push_str("</aside>");
}

fn render_preview(out: &mut String, dataset: &Dataset) {
    out.push_str(
        "<p>Taking a dataset of headlines that are either from the Onion or from the \
         r/NotTheOnion subreddit, let&#39;s develop a model that can determine whether \
         or not the headline is an Onion headline or not!</p>",
    );
    out.push_str(
        "<p class=\"info\">1 indicates a headline by the Onion, while 0 is a headline \
         that could be found on r/NotTheOnion.</p>",
    );
    let _ = write!(
        out,
        "<h3>Sample of dataset used to develop the model ({} samples)</h3>",
        dataset.len()
    );
    out.push_str(
        "<p>The dataset used to develop the model is found \
         <a href=\"https://www.kaggle.com/chrisfilo/onion-or-not\">here.</a> \
         The dataset for the model is found on the project \
         <a href=\"https://github.com/boblandsky/onion_ml/\">Github.</a></p>",
    );
    let _ = write!(
        out,
        "<p class=\"info\">The data was originally 24000 samples, and rebalanced to {} \
         ({} samples of each).</p>",
        dataset.len(),
        dataset.count(Label::Onion)
    );
    out.push_str("<table><tr><th></th><th>text</th><th>label</th></tr>");
    for (i, headline) in dataset.head(PREVIEW_ROWS).iter().enumerate() {
        let _ = write!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            i,
            escape_html(&headline.text),
            headline.label.as_u8()
        );
    }
    out.push_str("</table>");
}

fn render_model(out: &mut String, view: &PageView<'_>, pipeline: Pipeline) {
    let _ = write!(out, "<h2>{}</h2>", escape_html(pipeline.header()));
    if let Some(accuracy) = view.accuracy_percent {
        let _ = write!(out, "<p>Accuracy on test set: {}%</p>", accuracy);
    }

    out.push_str("<form method=\"get\" action=\"/\">");
    if let Some(sid) = view.sid {
        hidden(out, "sid", sid);
    }
    hidden(out, "model", pipeline.key());
    let headline = view.headline.unwrap_or(pipeline.sample_headline());
    let _ = write!(
        out,
        r#"<label>Give me a headline to predict. A sample one is provided.<input type="text" name="headline" value="{}"></label><button type="submit">{}</button></form>"#,
        escape_html(headline),
        escape_html(pipeline.button_label())
    );

    let Some(label) = view.verdict else {
        return;
    };
    let _ = write!(out, "<p><strong>{}</strong></p>", escape_html(label.verdict()));

    out.push_str("<form method=\"get\" action=\"/\">");
    if let Some(sid) = view.sid {
        hidden(out, "sid", sid);
    }
    hidden(out, "model", pipeline.key());
    hidden(out, "headline", headline);
    let _ = write!(
        out,
        "<p>Did the {} model make an accurate prediction?</p>",
        pipeline.model_name()
    );
    for (answer, checked) in [("Yes", view.accurate), ("No", !view.accurate)] {
        let _ = write!(
            out,
            r#"<label><input type="radio" name="feedback" value="{0}" onchange="this.form.submit()"{1}> {0}</label> "#,
            answer,
            if checked { " checked" } else { "" }
        );
    }
    out.push_str("</form>");
    out.push_str(if view.accurate { "<p>Sweet!</p>" } else { "<p>Bummer.</p>" });
}

/// Render the page for `view` as a complete HTML document.
pub fn render_page(dataset: &Dataset, view: &PageView<'_>) -> String {
    let mut out = String::with_capacity(8 * 1024);
    let _ = write!(
        out,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n  <meta charset=\"UTF-8\">\n  \
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n  \
         <title>Onion or Not?</title>\n  <style>{}</style>\n</head>\n<body>",
        STYLE
    );
    render_sidebar(&mut out, view);
    out.push_str("<main><h1>Onion or Not?</h1>");
    render_preview(&mut out, dataset);
    if let Some(error) = &view.error {
        let _ = write!(out, "<p class=\"error\">{}</p>", escape_html(error));
    }
    if let Some(pipeline) = view.selected {
        render_model(&mut out, view, pipeline);
    }
    out.push_str("</main></body>\n</html>\n");
    out
}
