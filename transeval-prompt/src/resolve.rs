use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use transeval_core::config::PromptSpec;
use transeval_core::{CoreError, Result};

/// A compiled prompt artifact produced by an external optimizer (§4.4,
/// glossary). The engine only ever records the artifact's id in a
/// [`ResolvedSource`]; the body is never persisted to a `RunRecord` (§9).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledArtifact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default)]
    pub few_shots: serde_json::Value,
    #[serde(default)]
    pub params: serde_json::Value,
    #[serde(default)]
    pub provenance: serde_json::Value,
}

/// Which prompt source a [`Resolved`] value came from — recorded for
/// provenance without ever carrying the artifact body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ResolvedSource {
    Inline,
    File { path: String },
    Artifact {
        artifact: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        field: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct Resolved {
    pub system: Option<String>,
    pub template: Option<String>,
    pub source: ResolvedSource,
}

/// Resolves a [`PromptSpec`] into usable prompt text (§4.4). `prompt_artifacts`
/// maps artifact id to its JSON file path (§6.3); `base_dir` anchors relative
/// `file` paths to the configuration document's directory.
pub fn resolve(spec: &PromptSpec, prompt_artifacts: &HashMap<String, String>, base_dir: &Path) -> Result<Resolved> {
    match spec {
        PromptSpec::Template { template } => Ok(Resolved {
            system: None,
            template: Some(template.clone()),
            source: ResolvedSource::Inline,
        }),
        PromptSpec::File { file } => {
            let path = base_dir.join(file);
            let contents = std::fs::read_to_string(&path)?;
            Ok(Resolved {
                system: None,
                template: Some(contents),
                source: ResolvedSource::File {
                    path: file.clone(),
                },
            })
        }
        PromptSpec::Artifact { artifact, artifact_field } => {
            let path = prompt_artifacts.get(artifact).ok_or_else(|| {
                CoreError::Config(format!("prompt artifact {artifact:?} is not registered in promptArtifacts"))
            })?;
            let path = base_dir.join(path);
            let contents = std::fs::read_to_string(&path)?;
            let compiled: CompiledArtifact = serde_json::from_str(&contents)?;

            let template = match artifact_field.as_deref() {
                Some("systemPrompt") => compiled.system_prompt.clone(),
                Some("userPrompt") => compiled.user_prompt.clone(),
                Some("template") | None => compiled.template.clone().or_else(|| compiled.user_prompt.clone()),
                Some(other) => {
                    return Err(CoreError::Config(format!(
                        "unknown artifactField {other:?}; expected systemPrompt, userPrompt, or template"
                    )));
                }
            };

            Ok(Resolved {
                system: compiled.system_prompt.clone(),
                template,
                source: ResolvedSource::Artifact {
                    artifact: artifact.clone(),
                    field: artifact_field.clone(),
                },
            })
        }
    }
}
