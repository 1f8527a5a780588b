use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use transeval_core::config::{ComponentSpec, EngineConfig, PromptSpec, ProviderKind};
use transeval_core::hardcheck::HardCheckSettings;
use transeval_model::{Gateway, MockProvider, OpenAiProvider, RateLimiter, ResponseCache};
use transeval_pipeline::translator::DEFAULT_SYSTEM_PROMPT as TRANSLATOR_DEFAULT_SYSTEM;
use transeval_pipeline::{Judge, LlmComponent, Repairer, StateBuilder, Translator, Verifier};

use crate::error::{Result, RunnerError};

// Bare source text: providers have no instruction-following to strip
// scaffolding back out, so whatever this renders to becomes `final` verbatim.
// Context/state/constraints reach the provider through a
// `components.translator.prompt` override instead.
const TRANSLATOR_DEFAULT_TEMPLATE: &str = "{{text}}";

const STATE_BUILDER_DEFAULT_SYSTEM: &str =
    "You extract narrative facts from one line of dialogue or narration so a downstream translator can use them.";
const STATE_BUILDER_DEFAULT_TEMPLATE: &str =
    "Source (Japanese):\n{{text}}\n\nPreceding context:\n{{context}}\n\nReturn a JSON object with \
     utterance, speaker, addressee, entities, coreMeaning, and implicature.";

const VERIFIER_DEFAULT_SYSTEM: &str =
    "You review a translation for mistranslation, omission, addition, and constraint violations.";
const VERIFIER_DEFAULT_TEMPLATE: &str =
    "Source (Japanese):\n{{text}}\n\nTranslation:\n{{translation}}\n\nConstraints:\n{{constraints}}\n\n\
     Return a JSON object with an \"issues\" array.";

const REPAIRER_DEFAULT_SYSTEM: &str = "You repair a translation to resolve the issues a reviewer raised.";
const REPAIRER_DEFAULT_TEMPLATE: &str =
    "Source (Japanese):\n{{text}}\n\nPreceding context:\n{{context}}\n\nNarrative state:\n{{state}}\n\n\
     Current translation:\n{{translation}}\n\nIssues to resolve:\n{{issues}}\n\nConstraints:\n{{constraints}}\n\n\
     Return only the repaired translation.";

const JUDGE_DEFAULT_SYSTEM: &str =
    "You score a translation for adequacy, fluency, constraint compliance, and style fit, each from 0 to 1.";
const JUDGE_DEFAULT_TEMPLATE: &str =
    "Source (Japanese):\n{{text}}\n\nTranslation:\n{{translation}}\n\nReference (if any):\n{{reference}}\n\n\
     Return a JSON object with adequacy, fluency, constraintCompliance, styleFit, and overall.";

/// The five pipeline stages, wired up from one [`EngineConfig`] and sharing
/// one [`Gateway`] (§4.5-§4.10). Assembled once per process and held behind
/// an `Arc` by the orchestrator so every worker task shares the same gateway,
/// cache, and rate limiter.
pub struct Pipeline {
    pub state_builder: StateBuilder,
    pub translator: Translator,
    pub translator_with_state: Option<Translator>,
    pub verifier: Verifier,
    pub repairer: Repairer,
    pub judge: Judge,
}

fn provider_id(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::Mock => "mock",
        ProviderKind::Openai => "openai",
    }
}

/// Resolves a component's prompt spec into a `(system, template)` pair,
/// falling back to the stage's built-in defaults when no prompt is
/// configured, or when the resolved artifact carries no system override.
fn resolve_component_template(
    spec: &Option<PromptSpec>,
    prompt_artifacts: &HashMap<String, String>,
    base_dir: &Path,
    default_system: &str,
    default_template: &str,
) -> Result<(Option<String>, String)> {
    match spec {
        None => Ok((Some(default_system.to_string()), default_template.to_string())),
        Some(prompt_spec) => {
            let resolved = transeval_prompt::resolve(prompt_spec, prompt_artifacts, base_dir)?;
            let system = resolved.system.or_else(|| Some(default_system.to_string()));
            let template = resolved.template.unwrap_or_else(|| default_template.to_string());
            Ok((system, template))
        }
    }
}

fn build_llm_component(
    spec: &ComponentSpec,
    gateway: Arc<Gateway>,
    prompt_artifacts: &HashMap<String, String>,
    base_dir: &Path,
    default_system: &str,
    default_template: &str,
) -> Result<LlmComponent> {
    let (system, template) =
        resolve_component_template(&spec.prompt, prompt_artifacts, base_dir, default_system, default_template)?;

    Ok(LlmComponent::new(gateway, provider_id(spec.model.provider), spec.model.name.clone(), template)
        .with_temperature(spec.model.temperature)
        .with_max_output_tokens(spec.model.max_output_tokens)
        .with_json_mode(spec.model.json_mode)
        .with_system(system))
}

fn build_optional_component(
    spec: &Option<ComponentSpec>,
    gateway: &Arc<Gateway>,
    prompt_artifacts: &HashMap<String, String>,
    base_dir: &Path,
    default_system: &str,
    default_template: &str,
) -> Result<Option<LlmComponent>> {
    spec.as_ref()
        .map(|spec| build_llm_component(spec, gateway.clone(), prompt_artifacts, base_dir, default_system, default_template))
        .transpose()
}

/// Builds the five pipeline stages from `config` (§6.3). `components.translator`
/// is the one mandatory component — a translator always talks to an LLM, even
/// the mock provider — every other stage degrades to its heuristic fallback
/// when left unconfigured.
pub fn build_pipeline(config: &EngineConfig, gateway: Arc<Gateway>, base_dir: &Path) -> Result<Pipeline> {
    let translator_spec = config
        .components
        .translator
        .as_ref()
        .ok_or_else(|| RunnerError::Config("components.translator is required".to_string()))?;
    let translator_llm = build_llm_component(
        translator_spec,
        gateway.clone(),
        &config.prompt_artifacts,
        base_dir,
        TRANSLATOR_DEFAULT_SYSTEM,
        TRANSLATOR_DEFAULT_TEMPLATE,
    )?;
    let translator = Translator::new(translator_llm);

    let translator_with_state = config
        .components
        .translator_with_state
        .as_ref()
        .map(|spec| {
            build_llm_component(
                spec,
                gateway.clone(),
                &config.prompt_artifacts,
                base_dir,
                TRANSLATOR_DEFAULT_SYSTEM,
                TRANSLATOR_DEFAULT_TEMPLATE,
            )
            .map(Translator::new)
        })
        .transpose()?;

    let state_builder_llm = build_optional_component(
        &config.components.state_builder,
        &gateway,
        &config.prompt_artifacts,
        base_dir,
        STATE_BUILDER_DEFAULT_SYSTEM,
        STATE_BUILDER_DEFAULT_TEMPLATE,
    )?;
    let state_builder = StateBuilder::new(state_builder_llm);

    let verifier_llm = build_optional_component(
        &config.components.verifier,
        &gateway,
        &config.prompt_artifacts,
        base_dir,
        VERIFIER_DEFAULT_SYSTEM,
        VERIFIER_DEFAULT_TEMPLATE,
    )?;
    let hard_check_settings = HardCheckSettings::from(&config.defaults.hard_checks);
    let verifier = Verifier::new(hard_check_settings, verifier_llm);

    let repairer_llm = build_optional_component(
        &config.components.repairer,
        &gateway,
        &config.prompt_artifacts,
        base_dir,
        REPAIRER_DEFAULT_SYSTEM,
        REPAIRER_DEFAULT_TEMPLATE,
    )?;
    let repairer = Repairer::new(repairer_llm);

    let judge_llm = build_optional_component(
        &config.components.judge,
        &gateway,
        &config.prompt_artifacts,
        base_dir,
        JUDGE_DEFAULT_SYSTEM,
        JUDGE_DEFAULT_TEMPLATE,
    )?;
    let judge = Judge::new(judge_llm, config.run_settings.judge_runs);

    Ok(Pipeline {
        state_builder,
        translator,
        translator_with_state,
        verifier,
        repairer,
        judge,
    })
}

fn uses_openai(config: &EngineConfig) -> bool {
    let specs = [
        &config.components.translator,
        &config.components.translator_with_state,
        &config.components.state_builder,
        &config.components.verifier,
        &config.components.repairer,
        &config.components.judge,
    ];
    specs.iter().filter_map(|s| s.as_ref()).any(|s| s.model.provider == ProviderKind::Openai)
}

/// Builds the shared [`Gateway`]: the mock provider is always registered, the
/// OpenAI provider only when a configured component selects it (and then only
/// if `OPENAI_API_KEY` is set), the on-disk cache always, and the rate
/// limiter only when `runSettings.rpm`/`tpm` is set (§4.3, §6.3).
pub fn build_gateway(config: &EngineConfig, cache_dir: &Path) -> Result<Gateway> {
    let mut gateway = Gateway::new().with_provider("mock", Arc::new(MockProvider::new("mock")));

    if uses_openai(config) {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| RunnerError::Config("OPENAI_API_KEY is required when a component selects provider: openai".to_string()))?;
        gateway = gateway.with_provider("openai", Arc::new(OpenAiProvider::new("openai", api_key)));
    }

    gateway = gateway.with_cache(ResponseCache::new(cache_dir));

    if config.run_settings.rpm.is_some() || config.run_settings.tpm.is_some() {
        gateway = gateway.with_rate_limiter(Arc::new(RateLimiter::new(config.run_settings.rpm, config.run_settings.tpm)));
    }

    Ok(gateway)
}

#[cfg(test)]
mod tests {
    use super::*;
    use transeval_core::config::ModelSpec;

    fn mock_component_spec() -> ComponentSpec {
        ComponentSpec {
            model: ModelSpec {
                provider: ProviderKind::Mock,
                name: "mock-1".to_string(),
                temperature: 0.7,
                top_p: None,
                max_output_tokens: None,
                json_mode: false,
            },
            prompt: None,
            params: serde_json::Value::Null,
        }
    }

    #[test]
    fn missing_translator_is_a_config_error() {
        let config = EngineConfig::default();
        let gateway = Arc::new(Gateway::new());
        let err = build_pipeline(&config, gateway, Path::new(".")).unwrap_err();
        assert!(matches!(err, RunnerError::Config(_)));
    }

    #[test]
    fn minimal_config_builds_a_pipeline() {
        let mut config = EngineConfig::default();
        config.components.translator = Some(mock_component_spec());
        let gateway = Arc::new(Gateway::new().with_provider("mock", Arc::new(MockProvider::new("mock"))));
        let pipeline = build_pipeline(&config, gateway, Path::new(".")).unwrap();
        assert!(pipeline.translator_with_state.is_none());
    }

    #[test]
    fn openai_component_without_api_key_is_a_config_error() {
        std::env::remove_var("OPENAI_API_KEY");
        let mut config = EngineConfig::default();
        let mut spec = mock_component_spec();
        spec.model.provider = ProviderKind::Openai;
        config.components.translator = Some(spec);
        let err = build_gateway(&config, Path::new("cache")).unwrap_err();
        assert!(matches!(err, RunnerError::Config(_)));
    }

    #[test]
    fn mock_only_config_builds_gateway_without_api_key() {
        std::env::remove_var("OPENAI_API_KEY");
        let mut config = EngineConfig::default();
        config.components.translator = Some(mock_component_spec());
        let tmp = tempfile::tempdir().unwrap();
        assert!(build_gateway(&config, tmp.path()).is_ok());
    }
}
