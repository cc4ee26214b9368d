//! Check command - validate configuration and content

use std::path::Path;

use color_eyre::eyre::{Result, bail};
use hausset_core::{Config, MailProvider};
use hausset_server::{ContentStore, store::validate_json_syntax};

/// Validation result.
#[derive(Debug, Default)]
struct ValidationResult {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationResult {
    fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Run the check command.
///
/// Validates configuration and all content files.
pub fn run(config_path: &Path, strict: bool) -> Result<()> {
    tracing::info!(?config_path, strict, "Checking configuration and content");

    let mut result = ValidationResult::default();

    println!("Checking configuration...");
    let config = load_checked(config_path, &mut result);

    let content_dir = config.server.content_dir.clone();
    if content_dir.is_dir() {
        println!("\nChecking content documents...");
        validate_documents(&ContentStore::new(&content_dir), &mut result);

        println!("\nChecking other JSON files...");
        validate_other_json(&content_dir, &mut result);
    } else {
        result.add_error(format!(
            "Content directory does not exist: {}",
            content_dir.display()
        ));
    }

    println!("\nChecking configuration values...");
    check_config_values(&config, &mut result);

    println!();
    println!("Summary:");
    println!("  Errors:   {}", result.errors.len());
    println!("  Warnings: {}", result.warnings.len());

    if result.has_errors() {
        println!();
        println!("Errors:");
        for err in &result.errors {
            println!("  ✗ {err}");
        }
    }

    if result.has_warnings() {
        println!();
        println!("Warnings:");
        for warn in &result.warnings {
            println!("  ⚠ {warn}");
        }
    }

    if result.has_errors() {
        bail!("Validation failed with {} error(s)", result.errors.len());
    }

    if strict && result.has_warnings() {
        bail!(
            "Validation failed with {} warning(s) (strict mode)",
            result.warnings.len()
        );
    }

    println!();
    println!("✓ All checks passed");

    Ok(())
}

/// Load the configuration the way `serve` does: the optional file with
/// `HAUSSET__*` environment overrides on top.
fn load_checked(config_path: &Path, result: &mut ValidationResult) -> Config {
    if !config_path.exists() {
        result.add_warning(format!(
            "Configuration file not found: {}, using defaults and environment",
            config_path.display()
        ));
        println!("  ⚠ {} missing, using defaults", config_path.display());
    }

    match Config::load_with_env(config_path) {
        Ok(c) => {
            println!("  ✓ Configuration valid");
            c
        }
        Err(e) => {
            result.add_error(format!("Configuration error: {e}"));
            println!("  ✗ Configuration invalid: {e}");
            Config::default()
        }
    }
}

/// Check the three content documents against the content model.
fn validate_documents(store: &ContentStore, result: &mut ValidationResult) {
    for (path, problem) in store.validate() {
        match problem {
            None => println!("  ✓ {}", path.display()),
            Some(problem) => {
                println!("  ✗ {}", path.display());
                result.add_error(format!("{}: {problem}", path.display()));
            }
        }
    }
}

/// Syntax-check any further JSON files under the content directory.
fn validate_other_json(content_dir: &Path, result: &mut ValidationResult) {
    let mut checked = 0;
    let mut failed = 0;

    for entry in walkdir::WalkDir::new(content_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
    {
        checked += 1;
        if let Err(e) = validate_json_syntax(entry.path()) {
            result.add_error(e);
            failed += 1;
        }
    }

    if failed == 0 {
        println!("  ✓ All {checked} JSON files parse");
    } else {
        println!("  ✗ {failed}/{checked} JSON files have errors");
    }
}

/// Check configuration values for common issues.
fn check_config_values(config: &Config, result: &mut ValidationResult) {
    match config.mail.provider {
        MailProvider::None => {
            result.add_warning("mail.provider is not set; the contact form cannot send email");
        }
        MailProvider::Outbox => {
            result.add_warning("mail.provider is outbox; contact messages are only logged");
        }
        MailProvider::Sendgrid if config.mail.api_key.is_none() => {
            result.add_error("mail.api_key is required for the sendgrid provider");
        }
        MailProvider::Smtp | MailProvider::Mailgun
            if config.mail.username.is_none() || config.mail.password.is_none() =>
        {
            result.add_error("mail.username and mail.password are required for this provider");
        }
        _ => {}
    }

    if config.source.mirror.is_none() {
        result.add_warning("source.mirror is not configured; deployed pages fall back to bundled content");
    }

    if let Some(dir) = config.server.static_dir.as_ref().filter(|d| !d.is_dir()) {
        result.add_warning(format!(
            "server.static_dir does not exist: {}",
            dir.display()
        ));
    }

    println!("  ✓ Configuration values checked");
}
