use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use clap::Args;
use fives::config::AppConfig;
use fives::error::AppError;
use fives::evaluation::orchestrator::extract_json_object;
use fives::evaluation::{
    derive_feedback, validate_and_normalize, AnthropicClassifier, EvaluationError,
    EvaluationOrchestrator, EvaluationServiceError, PhotoLimits, PhotoPayload, RawModelOutput,
    Score, TokioSleeper,
};
use fives::telemetry;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// Photo files to score; only the first four are sent
    #[arg(required = true, num_args = 1..)]
    pub(crate) photos: Vec<PathBuf>,
    /// Workspace name shown in the report header
    #[arg(long)]
    pub(crate) workspace: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// File holding a raw classifier reply; surrounding prose is tolerated
    pub(crate) file: PathBuf,
}

pub(crate) async fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let EvaluateArgs { photos, workspace } = args;

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let payloads = photos
        .iter()
        .map(|path| encode_photo(path))
        .collect::<Result<Vec<_>, _>>()?;
    info!(photos = payloads.len(), "photos encoded");

    let classifier = AnthropicClassifier::new(&config.classifier)?;
    let orchestrator = EvaluationOrchestrator::with_parts(
        Arc::new(classifier),
        Arc::new(TokioSleeper),
        config.retry,
        PhotoLimits::default(),
    );

    let result = orchestrator
        .evaluate(&payloads)
        .await
        .map_err(EvaluationServiceError::from)?;

    print!(
        "{}",
        render_assessment(workspace.as_deref(), &result.score, &result.feedback)
    );
    println!(
        "Photos evaluated: {} | classifier attempts: {}",
        result.photos.len(),
        result.attempts
    );
    Ok(())
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let reply = std::fs::read_to_string(&args.file)?;
    let (score, feedback) = score_reply(&reply)?;
    print!("{}", render_assessment(None, &score, &feedback));
    Ok(())
}

/// Runs a saved reply through extraction and validation.
pub(crate) fn score_reply(reply: &str) -> Result<(Score, String), AppError> {
    let object = extract_json_object(reply).map_err(|err| {
        AppError::from(EvaluationServiceError::Evaluation(EvaluationError::Parse(
            err,
        )))
    })?;
    let assessment = validate_and_normalize(&RawModelOutput(object)).map_err(|err| {
        AppError::from(EvaluationServiceError::Evaluation(
            EvaluationError::Validation(err),
        ))
    })?;
    Ok((assessment.score, assessment.feedback))
}

/// Reads an image file as a `data:` URL.
pub(crate) fn encode_photo(path: &Path) -> Result<PhotoPayload, AppError> {
    let bytes = std::fs::read(path)?;
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    Ok(PhotoPayload(format!(
        "data:{};base64,{}",
        mime.essence_str(),
        STANDARD.encode(bytes)
    )))
}

pub(crate) fn render_assessment(workspace: Option<&str>, score: &Score, feedback: &str) -> String {
    let report = derive_feedback(score);
    let mut lines = Vec::new();

    lines.push(match workspace {
        Some(name) => format!("5S evaluation: {name}"),
        None => "5S evaluation".to_string(),
    });
    lines.push(format!(
        "Total {}/50 ({}%) - {}",
        report.total_score, report.percentage_score, report.tier_label
    ));
    lines.push(report.summary.to_string());
    if let Some(note) = report.foundation_note {
        lines.push(format!("Note: {note}"));
    }

    lines.push("\nCategories".to_string());
    for entry in &report.categories {
        lines.push(format!(
            "- {}: {}/10 [{}] {}",
            entry.label, entry.score, entry.band_label, entry.commentary
        ));
    }

    if !feedback.is_empty() {
        lines.push(format!("\nClassifier feedback\n{feedback}"));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
