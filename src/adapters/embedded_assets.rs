use include_dir::{Dir, DirEntry, include_dir};
use minijinja::{AutoEscape, Environment, UndefinedBehavior, Value, context};
use std::path::{Path, PathBuf};

use crate::domain::scaffold::scaffold_package_json;
use crate::domain::{AppError, LicenseType, PLUGIN_ASSETS_DIR, ScaffoldFile, ScaffoldOptions};

static ASSETS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/assets");

const TEMPLATE_SUFFIX: &str = ".j2";

/// Render every file of a new plugin.
pub fn render_plugin_scaffold(
    options: &ScaffoldOptions,
    year: i32,
) -> Result<Vec<ScaffoldFile>, AppError> {
    let context = context! {
        name => options.name,
        version => options.version,
        description => options.description,
        author => options.author,
        year => year,
    };

    let plugin_dir = ASSETS_DIR
        .get_dir("plugin")
        .ok_or_else(|| AppError::template("plugin", "embedded plugin templates are missing"))?;

    let mut files = Vec::new();
    collect_templates(plugin_dir, plugin_dir.path(), &context, &mut files)?;
    files.retain(|file| !is_unused_entry(&file.path, options));

    let package_json = serde_json::to_string_pretty(&scaffold_package_json(options))?;
    files.push(ScaffoldFile::new("package.json", format!("{}\n", package_json)));
    let license = render_license(options.license, year, &options.author)?;
    files.push(ScaffoldFile::new("LICENSE.md", license));
    files.push(ScaffoldFile::new(Path::new(PLUGIN_ASSETS_DIR).join(".gitkeep"), ""));

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

/// Render the license text with year and copyright holder filled in.
pub fn render_license(license: LicenseType, year: i32, author: &str) -> Result<String, AppError> {
    render_named(license.template_name(), context! { year => year, author => author })
}

/// Render a bundler config template from `bundler/`.
pub fn render_bundler_config(name: &str, context: Value) -> Result<String, AppError> {
    render_named(&format!("bundler/{}{}", name, TEMPLATE_SUFFIX), context)
}

fn is_unused_entry(path: &Path, options: &ScaffoldOptions) -> bool {
    let unused = if options.typescript { "src/index.js" } else { "src/index.ts" };
    path == Path::new(unused)
}

fn collect_templates(
    dir: &Dir,
    base_path: &Path,
    context: &Value,
    files: &mut Vec<ScaffoldFile>,
) -> Result<(), AppError> {
    for entry in dir.entries() {
        match entry {
            DirEntry::File(file) => {
                let template_path = file.path().to_string_lossy().to_string();
                let content = file.contents_utf8().ok_or_else(|| {
                    AppError::template(&template_path, "embedded template is not UTF-8")
                })?;
                let relative = file.path().strip_prefix(base_path).map_err(|_| {
                    AppError::template(&template_path, "unexpected embedded template path")
                })?;
                let rendered = render_template(&template_path, content, context)?;
                files.push(ScaffoldFile::new(output_path(relative), rendered));
            }
            DirEntry::Dir(subdir) => collect_templates(subdir, base_path, context, files)?,
        }
    }
    Ok(())
}

/// `gitignore.j2` -> `.gitignore`, `src/index.js.j2` -> `src/index.js`.
fn output_path(relative: &Path) -> PathBuf {
    let file_name = relative.file_name().map(|name| name.to_string_lossy()).unwrap_or_default();
    let stripped = file_name.strip_suffix(TEMPLATE_SUFFIX).unwrap_or(file_name.as_ref());
    let file_name =
        if stripped == "gitignore" { ".gitignore".to_string() } else { stripped.to_string() };
    relative.with_file_name(file_name)
}

fn render_named(name: &str, context: Value) -> Result<String, AppError> {
    let file = ASSETS_DIR
        .get_file(name)
        .ok_or_else(|| AppError::template(name, "embedded template not found"))?;
    let content = file
        .contents_utf8()
        .ok_or_else(|| AppError::template(name, "embedded template is not UTF-8"))?;
    render_template(name, content, &context)
}

fn render_template(name: &str, content: &str, context: &Value) -> Result<String, AppError> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env.set_keep_trailing_newline(true);

    env.add_template(name, content).map_err(|err| AppError::template(name, err))?;
    env.get_template(name)
        .map_err(|err| AppError::template(name, err))?
        .render(context)
        .map_err(|err| AppError::template(name, err))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(files: &[ScaffoldFile]) -> Vec<String> {
        files.iter().map(|file| file.path.to_string_lossy().replace('\\', "/")).collect()
    }

    #[test]
    fn javascript_scaffold_contains_the_expected_files() {
        let files = render_plugin_scaffold(&ScaffoldOptions::new("hello-world"), 2026).unwrap();
        let paths = paths(&files);

        for expected in [
            ".gitignore",
            "CHANGELOG.md",
            "LICENSE.md",
            "README.md",
            "config.json",
            "package.json",
            "plugin-assets/.gitkeep",
            "src/index.js",
        ] {
            assert!(paths.contains(&expected.to_string()), "missing {}", expected);
        }
        assert!(!paths.contains(&"src/index.ts".to_string()));
    }

    #[test]
    fn typescript_scaffold_swaps_the_entry() {
        let mut options = ScaffoldOptions::new("hello-world");
        options.typescript = true;
        let paths = paths(&render_plugin_scaffold(&options, 2026).unwrap());

        assert!(paths.contains(&"src/index.ts".to_string()));
        assert!(!paths.contains(&"src/index.js".to_string()));
    }

    #[test]
    fn templates_receive_the_plugin_name() {
        let files = render_plugin_scaffold(&ScaffoldOptions::new("hello-world"), 2026).unwrap();
        let readme = files.iter().find(|file| file.path == Path::new("README.md")).unwrap();
        assert!(readme.content.starts_with("# hello-world"));
    }

    #[test]
    fn every_license_renders_year_and_author() {
        for license in LicenseType::ALL {
            let text = render_license(license, 2026, "Jane Doe").unwrap();
            assert!(text.contains("2026"), "{} lacks the year", license);
            assert!(text.contains("Jane Doe"), "{} lacks the author", license);
        }
    }

    #[test]
    fn missing_context_value_is_a_template_error() {
        let err = render_bundler_config("vite.dev.config.mjs", context! { root => "\"/x\"" });
        assert!(matches!(err, Err(AppError::Template { .. })));
    }
}
