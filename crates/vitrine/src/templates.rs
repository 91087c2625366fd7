//! Template source management.
//!
//! Widgets and views refer to templates by name; [`TemplateSources`]
//! collects the places those names resolve from before they are loaded into
//! the engine.
//!
//! # Resolution rules
//!
//! - Inline templates have the highest priority and shadow file templates
//!   with the same name.
//! - Directory templates register under their relative path both with and
//!   without extension, so `"cart/mini"` and `"cart/mini.html"` both
//!   resolve.
//! - When several files share a base name, the extension appearing earlier
//!   in [`TEMPLATE_EXTENSIONS`] wins the extensionless name.
//! - Across directories, the first registered directory wins a contested
//!   name.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use minijinja::Environment;

use crate::error::WidgetError;

/// Recognized template file extensions, in priority order.
pub const TEMPLATE_EXTENSIONS: &[&str] = &[".html", ".jinja", ".txt"];

/// Collected template sources: inline strings and template directories.
#[derive(Debug, Default)]
pub struct TemplateSources {
    inline: HashMap<String, String>,
    dirs: Vec<PathBuf>,
}

impl TemplateSources {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an inline template, shadowing any file template with the same
    /// name.
    pub fn add_inline(&mut self, name: impl Into<String>, content: impl Into<String>) {
        self.inline.insert(name.into(), content.into());
    }

    /// Adds a directory to load templates from, recursively.
    ///
    /// # Errors
    ///
    /// [`WidgetError::TemplateSource`] if the path does not exist or is not
    /// a directory.
    pub fn add_dir<P: AsRef<Path>>(&mut self, path: P) -> Result<(), WidgetError> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(WidgetError::TemplateSource {
                path: path.to_path_buf(),
                message: "not a directory".to_string(),
            });
        }
        self.dirs.push(path.to_path_buf());
        Ok(())
    }

    /// Loads every collected template into the environment.
    pub(crate) fn install(&self, env: &mut Environment<'static>) -> Result<(), WidgetError> {
        let mut resolved: HashMap<String, String> = HashMap::new();

        for dir in &self.dirs {
            let mut files = Vec::new();
            walk(dir, dir, &mut files).map_err(|e| WidgetError::TemplateSource {
                path: dir.clone(),
                message: e.to_string(),
            })?;
            // Higher-priority extensions first, so they win the base name.
            files.sort_by_key(|(name, _)| extension_priority(name));

            for (name_with_ext, path) in files {
                let content =
                    fs::read_to_string(&path).map_err(|e| WidgetError::TemplateSource {
                        path: path.clone(),
                        message: e.to_string(),
                    })?;
                let base = strip_extension(&name_with_ext).to_string();
                resolved.entry(base).or_insert_with(|| content.clone());
                resolved.entry(name_with_ext).or_insert(content);
            }
        }

        for (name, content) in &self.inline {
            resolved.insert(name.clone(), content.clone());
        }

        for (name, content) in resolved {
            env.add_template_owned(name.clone(), content)
                .map_err(|e| WidgetError::InvalidTemplate {
                    name,
                    message: e.to_string(),
                })?;
        }
        Ok(())
    }
}

/// Priority index of the template's extension; unrecognized names sort last.
fn extension_priority(name: &str) -> usize {
    TEMPLATE_EXTENSIONS
        .iter()
        .position(|ext| name.ends_with(ext))
        .unwrap_or(usize::MAX)
}

/// Strips a recognized extension from a template name.
fn strip_extension(name: &str) -> &str {
    for ext in TEMPLATE_EXTENSIONS {
        if let Some(base) = name.strip_suffix(ext) {
            return base;
        }
    }
    name
}

/// Recursively collects `(relative_name, path)` pairs for recognized
/// template files under `root`.
fn walk(dir: &Path, root: &Path, out: &mut Vec<(String, PathBuf)>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            walk(&path, root, out)?;
        } else if let Some(name) = relative_template_name(&path, root) {
            out.push((name, path));
        }
    }
    Ok(())
}

fn relative_template_name(path: &Path, root: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let name = relative.to_string_lossy().replace('\\', "/");
    if extension_priority(&name) == usize::MAX {
        return None;
    }
    Some(name)
}
