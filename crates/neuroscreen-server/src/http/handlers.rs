//! Request handlers for the screening API.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::Redirect;
use axum::Json;
use neuroscreen_core::domain::{assess, score_answers, AdhdAssessment, AdhdScores};
use neuroscreen_core::{
    AnalysisError, AnalysisRecord, AutismLabel, ChatError, EmotionLabel, UploadName,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::error::ApiError;
use crate::state::AppState;

/// Multipart field carrying the uploaded image.
const IMAGE_FIELD: &str = "image";

pub async fn register() -> Redirect {
    Redirect::to("/signin")
}

pub async fn login() -> Redirect {
    Redirect::to("/index")
}

/// Body of a successful `/autism_result` call.
#[derive(Debug, Serialize)]
pub struct AutismResponse {
    pub image_filename: String,
    pub prediction: AutismLabel,
    pub emotion: EmotionLabel,
    pub combined_confidence: f64,
    pub reasoning: String,
    pub autism_confidence: f64,
    pub emotion_confidence: f64,
    pub face_detected: bool,
}

impl From<AnalysisRecord> for AutismResponse {
    fn from(record: AnalysisRecord) -> Self {
        Self {
            image_filename: record
                .stored_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            prediction: record.autism.label,
            emotion: record.emotion.label,
            combined_confidence: record.combined_confidence,
            face_detected: record.face_detected(),
            reasoning: record.reasoning,
            autism_confidence: record.autism.confidence,
            emotion_confidence: record.emotion.confidence,
        }
    }
}

/// Reads the `image` field, returning its filename and bytes.
async fn read_image_field(
    multipart: &mut Multipart,
) -> Result<Option<(String, Vec<u8>)>, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_owned();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        return Ok(Some((filename, bytes.to_vec())));
    }
    Ok(None)
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge
    } else {
        ApiError::bad_request(e.body_text())
    }
}

/// Stores an uploaded image and runs the screening pipeline on it.
pub async fn autism_result(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AutismResponse>, ApiError> {
    let Ok(mut multipart) = multipart else {
        return Err(ApiError::bad_request("No image uploaded"));
    };
    let (filename, bytes) = read_image_field(&mut multipart)
        .await?
        .ok_or_else(|| ApiError::bad_request("No image uploaded"))?;

    let name = UploadName::parse(&filename)?;
    debug!(upload = %name, size = bytes.len(), "Received upload");

    let analyzer = Arc::clone(&state.analyzer);
    let uploads = Arc::clone(&state.uploads);
    let record = tokio::task::spawn_blocking(move || {
        let stored = uploads.store(&name, &bytes).map_err(AnalysisError::Storage)?;
        analyzer.analyze(&stored, name.display_name())
    })
    .await
    .map_err(|e| ApiError::Internal(anyhow::Error::new(e).context("analysis task panicked")))??;

    info!(
        upload = %record.upload_name,
        prediction = %record.autism.label,
        emotion = %record.emotion.label,
        face = record.face_detected(),
        "Analysis complete"
    );
    Ok(Json(record.into()))
}

fn query_int(params: &HashMap<String, String>, key: &str) -> Result<i64, ApiError> {
    params.get(key).map_or(Ok(0), |raw| {
        raw.trim()
            .parse()
            .map_err(|_| ApiError::bad_request(format!("{key} must be an integer")))
    })
}

/// Maps client-computed questionnaire scores to a risk tier.
pub async fn adhd_result_local(
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<AdhdAssessment>, ApiError> {
    let scores = AdhdScores {
        score: query_int(&params, "score")?,
        inattention: query_int(&params, "inattention")?,
        hyperactivity: query_int(&params, "hyperactivity")?,
        impulsivity: query_int(&params, "impulsivity")?,
    };
    Ok(Json(assess(scores)))
}

#[derive(Debug, Deserialize)]
pub struct AnswersRequest {
    pub answers: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct QuestionnaireResponse {
    #[serde(flatten)]
    pub assessment: AdhdAssessment,
    pub score: i64,
    pub probability: u8,
}

/// Scores raw questionnaire answers server-side.
pub async fn adhd_score(
    Json(request): Json<AnswersRequest>,
) -> Result<Json<QuestionnaireResponse>, ApiError> {
    let scored = score_answers(&request.answers)?;
    Ok(Json(QuestionnaireResponse {
        assessment: assess(scored.scores),
        score: scored.scores.score,
        probability: scored.probability,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

/// Relays one message to the assistant.
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let relay = state.chat.as_ref().ok_or(ChatError::NotConfigured)?;
    let reply = relay.reply(&request.message).await?;
    Ok(Json(ChatResponse { reply }))
}
