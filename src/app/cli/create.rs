use std::io::ErrorKind;
use std::path::Path;

use clap::Args;
use dialoguer::{Confirm, Error as DialoguerError, Input, Select};

use crate::app::api::{self, AppError, LicenseType, ScaffoldOptions};

#[derive(Args)]
pub struct CreateArgs {
    /// Package name of the new plugin
    name: Option<String>,
    /// Accept defaults for everything not given on the command line
    #[arg(short, long)]
    yes: bool,
    /// Scaffold a TypeScript plugin
    #[arg(long)]
    typescript: bool,
    /// License of the plugin (SPDX identifier)
    #[arg(long)]
    license: Option<LicenseType>,
    /// Do not install @vcmap/ui after writing the files
    #[arg(long)]
    skip_install: bool,
}

pub fn run_create(parent: &Path, args: CreateArgs) -> Result<(), AppError> {
    let Some(options) = resolve_options(args.name, args.yes, args.typescript, args.license)? else {
        return Ok(());
    };
    let outcome = api::create(parent, &options, args.skip_install)?;
    println!("✅ Created plugin {} at {}/", outcome.name, outcome.path.display());
    if !outcome.installed {
        println!("Run `npm install` in {} before serving the plugin", outcome.path.display());
    }
    Ok(())
}

/// Collect the scaffold answers. `None` when the user cancelled a prompt.
fn resolve_options(
    name: Option<String>,
    yes: bool,
    typescript: bool,
    license: Option<LicenseType>,
) -> Result<Option<ScaffoldOptions>, AppError> {
    let name = match (name, yes) {
        (Some(name), _) => name,
        (None, true) => {
            return Err(AppError::user_input("A plugin name is required when using --yes"));
        }
        (None, false) => match prompt_text("Plugin name", None)? {
            Some(name) => name,
            None => return Ok(None),
        },
    };

    let mut options = ScaffoldOptions::new(name);
    options.typescript = typescript;
    options.license = license.unwrap_or_default();
    if yes {
        return Ok(Some(options));
    }

    let Some(description) = prompt_text("Description", Some(""))? else {
        return Ok(None);
    };
    let Some(author) = prompt_text("Author", Some(""))? else {
        return Ok(None);
    };
    options.description = description;
    options.author = author;

    if license.is_none() {
        match prompt_license()? {
            Some(selected) => options.license = selected,
            None => return Ok(None),
        }
    }
    if !typescript {
        match prompt_typescript()? {
            Some(selected) => options.typescript = selected,
            None => return Ok(None),
        }
    }
    Ok(Some(options))
}

fn prompt_text(prompt: &str, default: Option<&str>) -> Result<Option<String>, AppError> {
    let mut input = Input::<String>::new().with_prompt(prompt);
    if let Some(default) = default {
        input = input.default(default.to_string()).allow_empty(true).show_default(false);
    }
    match input.interact_text() {
        Ok(value) => Ok(Some(value.trim().to_string())),
        Err(DialoguerError::IO(err)) if err.kind() == ErrorKind::Interrupted => Ok(None),
        Err(err) => Err(AppError::user_input(format!("Failed to read {}: {}", prompt, err))),
    }
}

fn prompt_license() -> Result<Option<LicenseType>, AppError> {
    let items: Vec<&str> = LicenseType::ALL.iter().map(|license| license.spdx()).collect();
    let selection = Select::new()
        .with_prompt("License")
        .items(&items)
        .default(0)
        .interact_opt()
        .map_err(|err| AppError::user_input(format!("Failed to select license: {}", err)))?;

    Ok(selection.map(|index| LicenseType::ALL[index]))
}

fn prompt_typescript() -> Result<Option<bool>, AppError> {
    Confirm::new()
        .with_prompt("Use TypeScript?")
        .default(false)
        .interact_opt()
        .map_err(|err| AppError::user_input(format!("Failed to read answer: {}", err)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yes_without_name_is_rejected() {
        let err = resolve_options(None, true, false, None).unwrap_err();
        assert!(matches!(err, AppError::UserInput(message) if message.contains("--yes")));
    }

    #[test]
    fn yes_uses_defaults_and_flags() {
        let options =
            resolve_options(Some("demo".into()), true, true, Some(LicenseType::Apache2))
                .unwrap()
                .unwrap();

        assert_eq!(options.name, "demo");
        assert!(options.typescript);
        assert_eq!(options.license, LicenseType::Apache2);
        assert_eq!(options.description, "");
    }
}
