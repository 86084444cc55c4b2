//! Job-definition templates
//!
//! One XML job definition per [`PipelineTemplate`], with `${repoUrl}` and
//! `${credentialId}` placeholders. Defaults are compiled in; a directory of
//! `<Name>.template` files may override any of them. The store is immutable
//! once built and shared behind an `Arc`.

use std::collections::HashMap;
use std::path::Path;

use gantry_core::PipelineTemplate;

use crate::error::{Result, ServiceError};

const REPO_URL_PLACEHOLDER: &str = "${repoUrl}";
const CREDENTIAL_ID_PLACEHOLDER: &str = "${credentialId}";

fn builtin(template: PipelineTemplate) -> &'static str {
    match template {
        PipelineTemplate::JavaLibrary => include_str!("../templates/JavaLibrary.template"),
        PipelineTemplate::JavaService => include_str!("../templates/JavaService.template"),
        PipelineTemplate::PythonLibrary => include_str!("../templates/PythonLibrary.template"),
        PipelineTemplate::PythonService => include_str!("../templates/PythonService.template"),
        PipelineTemplate::DockerService => include_str!("../templates/DockerService.template"),
        PipelineTemplate::HelmChart => include_str!("../templates/HelmChart.template"),
    }
}

#[derive(Debug, Clone)]
pub struct TemplateStore {
    templates: HashMap<PipelineTemplate, String>,
}

impl TemplateStore {
    /// Store holding the compiled-in definitions
    pub fn builtin() -> Self {
        Self {
            templates: PipelineTemplate::ALL
                .iter()
                .map(|&template| (template, builtin(template).to_string()))
                .collect(),
        }
    }

    /// Store whose definitions are read from `dir` where a `<Name>.template`
    /// file exists, falling back to the compiled-in ones
    pub fn from_dir(dir: &Path) -> anyhow::Result<Self> {
        let mut store = Self::builtin();

        for template in PipelineTemplate::ALL {
            let file = dir.join(format!("{}.template", template.template_name()));
            if !file.is_file() {
                continue;
            }

            let definition = std::fs::read_to_string(&file).map_err(|e| {
                anyhow::anyhow!("Failed to read template {}: {}", file.display(), e)
            })?;
            tracing::info!("Loaded template {} from {}", template.template_name(), file.display());
            store.templates.insert(template, definition);
        }

        Ok(store)
    }

    /// Job definition for `template` with placeholders substituted
    ///
    /// Values are XML-escaped so that they stay text content of the
    /// definition.
    pub fn render(
        &self,
        template: PipelineTemplate,
        repo_url: &str,
        credential_id: &str,
    ) -> Result<String> {
        let definition = self.templates.get(&template).ok_or_else(|| {
            ServiceError::Mapping(format!("No definition for template {}", template))
        })?;

        Ok(definition
            .replace(REPO_URL_PLACEHOLDER, &escape_text(repo_url))
            .replace(CREDENTIAL_ID_PLACEHOLDER, &escape_text(credential_id)))
    }
}

impl Default for TemplateStore {
    fn default() -> Self {
        Self::builtin()
    }
}

fn escape_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_template_has_placeholders() {
        for template in PipelineTemplate::ALL {
            let definition = builtin(template);
            assert!(definition.contains(REPO_URL_PLACEHOLDER), "{}", template);
            assert!(definition.contains(CREDENTIAL_ID_PLACEHOLDER), "{}", template);
        }
    }

    #[test]
    fn test_render_substitutes_placeholders() {
        let store = TemplateStore::builtin();
        let definition = store
            .render(PipelineTemplate::JavaLibrary, "git@git.example.org:team/art.git", "pull-key")
            .unwrap();

        assert!(definition.contains("<url>git@git.example.org:team/art.git</url>"));
        assert!(definition.contains("<credentialsId>pull-key</credentialsId>"));
        assert!(!definition.contains(REPO_URL_PLACEHOLDER));
        assert!(!definition.contains(CREDENTIAL_ID_PLACEHOLDER));
        // Jenkins-side variables are left alone
        assert!(definition.contains("${GIT_BRANCH}"));
    }

    #[test]
    fn test_render_escapes_values() {
        let store = TemplateStore::builtin();
        let definition = store
            .render(PipelineTemplate::HelmChart, "https://git/x?a=1&b=2", "")
            .unwrap();
        assert!(definition.contains("<url>https://git/x?a=1&amp;b=2</url>"));
        assert!(definition.contains("<credentialsId></credentialsId>"));
    }

    #[test]
    fn test_directory_overrides_single_template() {
        let dir = std::env::temp_dir().join(format!("gantry-templates-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("PythonService.template"), "<job>${repoUrl}</job>").unwrap();

        let store = TemplateStore::from_dir(&dir).unwrap();
        let python = store.render(PipelineTemplate::PythonService, "repo", "id").unwrap();
        let java = store.render(PipelineTemplate::JavaService, "repo", "id").unwrap();

        assert_eq!(python, "<job>repo</job>");
        assert!(java.contains("<url>repo</url>"));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
