//! Side-effecting half of salvage: image preprocessing, remote model calls and
//! the cascading pipeline that always produces an [`AnalysisResult`].

pub mod config;
pub mod error;
pub mod preprocess;
pub mod providers;
pub mod retry;
pub mod synthesizer;
pub mod vision;

#[cfg(test)]
mod testing;

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use salvage_contracts::analysis::{AnalysisResult, FallbackTemplate};
use salvage_contracts::events::{payload_object, EventWriter, RequestEvents};
use salvage_contracts::models::{Capability, ModelRegistry, ModelSelector, ModelSpec};
use salvage_contracts::recommendations::{
    extract_from_analysis, parse_recommendations, Coverage, RecommendationSet,
};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::error::StageError;
use crate::preprocess::{describe_image, prepare_image};
use crate::providers::{default_provider_registry, ChatProvider, ChatProviderRegistry};
use crate::synthesizer::{RecommendationSynthesizer, Synthesis};
use crate::vision::{VisionAnalyzer, VisionOutcome, ANALYSIS_PROMPT_VERSION};

struct Route {
    model: ModelSpec,
    provider: Arc<dyn ChatProvider>,
}

/// Image in, [`AnalysisResult`] out.
///
/// Models and providers are resolved once at construction. A single pipeline
/// can serve concurrent [`Pipeline::run`] calls; each call gets its own
/// request id and processed file.
pub struct Pipeline {
    config: PipelineConfig,
    events: EventWriter,
    vision: Route,
    text: Route,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, events: EventWriter) -> Result<Self> {
        let providers = default_provider_registry(config.request_timeout);
        Self::with_providers(config, events, providers)
    }

    pub fn with_providers(
        config: PipelineConfig,
        events: EventWriter,
        providers: ChatProviderRegistry,
    ) -> Result<Self> {
        Self::with_registry(config, events, providers, ModelRegistry::default())
    }

    pub fn with_registry(
        config: PipelineConfig,
        events: EventWriter,
        providers: ChatProviderRegistry,
        models: ModelRegistry,
    ) -> Result<Self> {
        let selector = ModelSelector::new(Some(models));
        let vision = resolve_route(
            &selector,
            &providers,
            config.vision_model.as_deref(),
            Capability::Vision,
            &events,
        )?;
        let text = resolve_route(
            &selector,
            &providers,
            config.text_model.as_deref(),
            Capability::Text,
            &events,
        )?;
        Ok(Self {
            config,
            events,
            vision,
            text,
        })
    }

    pub fn vision_model(&self) -> &str {
        &self.vision.model.name
    }

    pub fn text_model(&self) -> &str {
        &self.text.model.name
    }

    /// Never fails. Stage failures degrade to fallbacks; a missing or unreadable
    /// source yields an error-category result.
    pub fn run(&self, image_path: &Path) -> AnalysisResult {
        let events = self.events.scoped(Uuid::new_v4().to_string());
        events.record(
            "pipeline_started",
            json!({
                "image_path": image_path.display().to_string(),
                "vision_model": self.vision_model(),
                "text_model": self.text_model(),
                "prompt_version": ANALYSIS_PROMPT_VERSION,
                "credential_configured": self.config.credential.is_configured(),
            }),
        );

        match self.run_stages(image_path, &events) {
            Ok(result) => {
                events.record(
                    "pipeline_finished",
                    json!({
                        "category": result.category.as_str(),
                        "confidence": result.confidence,
                        "coverage": result.recommendations.coverage().as_str(),
                        "processed_image_path": result.processed_image_path.display().to_string(),
                    }),
                );
                result
            }
            Err(err) => {
                let reason = err.to_string();
                events.record("pipeline_failed", json!({ "error": reason }));
                AnalysisResult::failed(image_path, &reason)
            }
        }
    }

    fn run_stages(
        &self,
        image_path: &Path,
        events: &RequestEvents,
    ) -> Result<AnalysisResult, StageError> {
        if !image_path.is_file() {
            return Err(StageError::NotFound(image_path.to_path_buf()));
        }

        let prepared = prepare_image(image_path, &self.config.processed_dir);
        match &prepared.failure {
            None => events.record(
                "image_preprocessed",
                json!({ "processed_image_path": prepared.path.display().to_string() }),
            ),
            Some(reason) => events.record("image_preprocess_failed", json!({ "reason": reason })),
        }

        let analysis_text = self.analyze(image_path, &prepared.path, events)?;
        let recommendations = self.recommend(&analysis_text, events);
        let descriptor = describe_image(&prepared.path);
        Ok(AnalysisResult::completed(
            analysis_text,
            recommendations,
            image_path,
            &prepared.path,
            descriptor,
        ))
    }

    /// Vision text, or the filename-keyed fallback when the vision stage cannot
    /// produce anything usable.
    fn analyze(
        &self,
        original: &Path,
        prepared: &Path,
        events: &RequestEvents,
    ) -> Result<String, StageError> {
        let analyzer = VisionAnalyzer {
            provider: self.vision.provider.as_ref(),
            credential: &self.config.credential,
            model: &self.vision.model.name,
            max_attempts: self.config.vision_attempts,
        };
        let reason = match analyzer.analyze(prepared, events) {
            Ok(VisionOutcome::Analysis { text, .. }) => return Ok(text),
            Ok(VisionOutcome::Exhausted { attempts }) => {
                events.record(
                    "vision_failed",
                    json!({ "reason": "attempts_exhausted", "attempts": attempts }),
                );
                "attempts_exhausted"
            }
            Err(StageError::Configuration) => "credential_unconfigured",
            Err(StageError::Remote(err)) => {
                events.record(
                    "vision_failed",
                    json!({ "reason": err.kind(), "error": err.to_string() }),
                );
                "remote_error"
            }
            Err(err) => return Err(err),
        };

        let file_name = original
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let template = FallbackTemplate::for_file_name(&file_name);
        events.record(
            "analysis_fallback",
            json!({ "reason": reason, "template": template.name() }),
        );
        Ok(template.text().to_string())
    }

    /// Model suggestions when they parse into anything, keyword heuristics otherwise.
    fn recommend(&self, analysis: &str, events: &RequestEvents) -> RecommendationSet {
        let synthesizer = RecommendationSynthesizer {
            provider: self.text.provider.as_ref(),
            credential: &self.config.credential,
            model: &self.text.model.name,
        };
        let parsed = match synthesizer.synthesize(analysis) {
            Synthesis::Raw(text) => {
                let parsed = parse_recommendations(&text);
                events.record(
                    "recommendations_parsed",
                    json!({
                        "coverage": parsed.coverage().as_str(),
                        "counts": section_counts(&parsed),
                    }),
                );
                parsed
            }
            Synthesis::Skipped(reason) => {
                events.record(
                    "recommendations_skipped",
                    json!({ "reason": reason.as_str() }),
                );
                RecommendationSet::empty()
            }
            Synthesis::Failed { kind, message } => {
                events.record(
                    "recommendations_failed",
                    json!({ "reason": kind, "error": message }),
                );
                RecommendationSet::empty()
            }
        };
        if parsed.coverage() != Coverage::Empty {
            return parsed;
        }

        let extracted = extract_from_analysis(analysis);
        events.record(
            "recommendations_heuristic",
            json!({
                "coverage": extracted.coverage().as_str(),
                "counts": section_counts(&extracted),
            }),
        );
        extracted
    }
}

fn resolve_route(
    selector: &ModelSelector,
    providers: &ChatProviderRegistry,
    requested: Option<&str>,
    capability: Capability,
    events: &EventWriter,
) -> Result<Route> {
    let selection = selector
        .select(requested, capability)
        .map_err(|message| anyhow!(message))?;
    if let (Some(requested), Some(reason)) = (&selection.requested, &selection.fallback_reason) {
        events.emit(
            "model_fallback",
            payload_object(json!({
                "capability": capability.as_str(),
                "requested": requested,
                "selected": selection.model.name,
                "reason": reason,
            })),
        )?;
    }
    let provider = providers
        .get(&selection.model.provider)
        .with_context(|| {
            format!(
                "no provider '{}' registered for model '{}'",
                selection.model.provider, selection.model.name
            )
        })?;
    Ok(Route {
        model: selection.model,
        provider,
    })
}

fn section_counts(recommendations: &RecommendationSet) -> Value {
    let counts: Map<String, Value> = recommendations
        .counts()
        .into_iter()
        .map(|(section, count)| (section.key().to_string(), json!(count)))
        .collect();
    Value::Object(counts)
}
