//! Generator configuration.

use std::path::{Path, PathBuf};

/// Directory layout and runtime class names used by the generator.
///
/// Every directory except `history_dir` is relative to the module root
/// `<output_dir>/<modules_dir>/<Version>/`.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Project root that receives the generated tree.
    pub output_dir: PathBuf,

    /// Directory holding one module per API version.
    pub modules_dir: PathBuf,

    /// Entity and pivot classes.
    pub entities_dir: PathBuf,

    /// Controller classes.
    pub controllers_dir: PathBuf,

    /// Form request classes.
    pub form_request_dir: PathBuf,

    /// Migration classes.
    pub migrations_dir: PathBuf,

    /// Module configuration.
    pub config_dir: PathBuf,

    /// Functional test stubs, relative to `output_dir`.
    pub tests_dir: PathBuf,

    /// Generation history root, relative to `output_dir`.
    pub history_dir: PathBuf,

    /// Fully-qualified parent class of entities and pivots.
    pub base_model: String,

    /// Fully-qualified parent class of form requests.
    pub base_form_request: String,

    /// Fully-qualified parent class of the per-module default controller.
    pub base_controller: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            modules_dir: PathBuf::from("modules"),
            entities_dir: PathBuf::from("Entities"),
            controllers_dir: PathBuf::from("Http/Controllers"),
            form_request_dir: PathBuf::from("Http/Requests"),
            migrations_dir: PathBuf::from("Database/Migrations"),
            config_dir: PathBuf::from("Config"),
            tests_dir: PathBuf::from("tests/functional"),
            history_dir: PathBuf::from(".gen"),
            base_model: "Oasgen\\Extension\\BaseModel".to_string(),
            base_form_request: "Oasgen\\Extension\\BaseFormRequest".to_string(),
            base_controller: "Oasgen\\Extension\\ApiController".to_string(),
        }
    }
}

impl GeneratorConfig {
    /// Creates a configuration rooted at `output_dir` with the default layout.
    pub fn with_output_dir(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    /// Root directory of the module generated for `version`.
    pub fn module_path(&self, version: &str) -> PathBuf {
        self.output_dir.join(&self.modules_dir).join(module_name(version))
    }

    pub fn entities_path(&self, version: &str) -> PathBuf {
        self.module_path(version).join(&self.entities_dir)
    }

    pub fn controllers_path(&self, version: &str) -> PathBuf {
        self.module_path(version).join(&self.controllers_dir)
    }

    pub fn form_requests_path(&self, version: &str) -> PathBuf {
        self.module_path(version).join(&self.form_request_dir)
    }

    pub fn migrations_path(&self, version: &str) -> PathBuf {
        self.module_path(version).join(&self.migrations_dir)
    }

    pub fn config_path(&self, version: &str) -> PathBuf {
        self.module_path(version).join(&self.config_dir)
    }

    pub fn tests_path(&self) -> PathBuf {
        self.output_dir.join(&self.tests_dir)
    }

    pub fn history_path(&self) -> PathBuf {
        self.output_dir.join(&self.history_dir)
    }

    /// Namespace of the module directory `dir` for `version`, e.g. `Modules\V1\Entities`.
    pub fn namespace_for(&self, version: &str, dir: &Path) -> String {
        let mut parts = vec![capitalize(&self.modules_dir.to_string_lossy()), module_name(version)];
        parts.extend(
            dir.components()
                .map(|c| capitalize(&c.as_os_str().to_string_lossy())),
        );
        parts.join("\\")
    }
}

/// Module directory name for an API version: `v2` becomes `V2`.
pub fn module_name(version: &str) -> String {
    capitalize(version.trim_matches('/'))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}
