//! Minimal CLI: schema document + JSON inputs → (cleaned output | failure report)
use std::io::Write;
use std::path::{Path as FsPath, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;

use crate::cleaner::Cleaner;
use crate::error::{FailureKind, ValidationError, ValidationFailure};
use crate::eval::Mode;
use crate::value::Value;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// validate JSON/NDJSON documents against a schema document and emit their cleaned form
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    /// log engine decisions at debug level (RUST_LOG takes precedence)
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// clean every input and print the cleaned documents
    Clean(CleanOut),
    /// validate every input and report all failures; exits non-zero if any fail
    Check(CheckOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// schema document (JSON)
    #[arg(long, short)]
    schema: PathBuf,

    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct CleanOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// report every failure per document instead of stopping at the first
    #[arg(long, default_value_t = false)]
    collect_all: bool,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct CheckOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// stop at the first failure per document
    #[arg(long, default_value_t = false)]
    fail_fast: bool,
}

/// One decoded input: where it came from plus its JSON tree.
#[derive(Debug)]
struct Document {
    origin: String,
    value: serde_json::Value,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_cleaner(&self, mode: Mode) -> Result<Cleaner> {
        let src = std::fs::read_to_string(&self.schema)
            .with_context(|| format!("failed to read schema {}", self.schema.display()))?;
        let root = crate::document::load(&src)
            .with_context(|| format!("invalid schema {}", self.schema.display()))?;
        Ok(Cleaner::new(root)?.with_mode(mode))
    }

    fn load_documents(&self) -> Result<Vec<Document>> {
        let mut documents = Vec::new();
        for source_path in resolve_file_path_patterns(&self.input)? {
            let source_path_str = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file {source_path_str}"))?;
            if self.ndjson {
                for (line_no, line) in source.lines().enumerate() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let origin = format!("{source_path_str}:{}", line_no + 1);
                    let value = serde_json::from_str(line)
                        .with_context(|| format!("failed to parse JSON ({origin})"))?;
                    documents.push(self.select(origin, value)?);
                }
            } else {
                let value = serde_json::from_str(&source)
                    .with_context(|| format!("failed to parse JSON source file ({source_path_str})"))?;
                documents.push(self.select(source_path_str, value)?);
            }
        }
        tracing::debug!(documents = documents.len(), "inputs loaded");
        Ok(documents)
    }

    fn select(&self, origin: String, value: serde_json::Value) -> Result<Document> {
        let Some(pointer) = self.json_pointer.as_deref() else {
            return Ok(Document { origin, value });
        };
        let value = value
            .pointer(pointer)
            .cloned()
            .ok_or_else(|| anyhow!("JSON pointer {pointer} selects nothing in {origin}"))?;
        Ok(Document { origin, value })
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> ExitCode {
        init_tracing(self.verbose);
        match self.execute() {
            Ok(code) => code,
            Err(error) => {
                eprintln!("{} {error:#}", "error:".red().bold());
                ExitCode::from(2)
            }
        }
    }

    fn execute(&self) -> Result<ExitCode> {
        match &self.cmd {
            Command::Clean(target) => {
                let mode = if target.collect_all { Mode::CollectAll } else { Mode::FailFast };
                let cleaner = target.input_settings.load_cleaner(mode)?;
                let documents = target.input_settings.load_documents()?;
                let results = clean_all(&cleaner, &documents);

                let mut cleaned = Vec::new();
                let mut failed = 0usize;
                for (document, result) in documents.iter().zip(results) {
                    match result {
                        Ok(value) => cleaned.push(value),
                        Err(error) => {
                            failed += 1;
                            report(&document.origin, &error);
                        }
                    }
                }

                let rendered = render_output(&cleaned, target.input_settings.ndjson)?;
                if let Some(out) = target.out.as_ref() {
                    if let Some(parent) = out.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(out, &rendered)
                        .with_context(|| format!("failed to write {}", out.display()))?;
                } else {
                    let mut stdout = std::io::stdout().lock();
                    writeln!(stdout, "{rendered}")?;
                }
                Ok(summary(documents.len(), failed))
            }
            Command::Check(target) => {
                let mode = if target.fail_fast { Mode::FailFast } else { Mode::CollectAll };
                let cleaner = target.input_settings.load_cleaner(mode)?;
                let documents = target.input_settings.load_documents()?;
                let results = clean_all(&cleaner, &documents);

                let mut failed = 0usize;
                for (document, result) in documents.iter().zip(results) {
                    match result {
                        Ok(_) => eprintln!("{} {}", "✓".green().bold(), document.origin),
                        Err(error) => {
                            failed += 1;
                            report(&document.origin, &error);
                        }
                    }
                }
                Ok(summary(documents.len(), failed))
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;
    let fallback = if verbose { "json_clean=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    // a second init (e.g. from tests) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// The compiled schema is shared read-only by every worker.
fn clean_all(cleaner: &Cleaner, documents: &[Document]) -> Vec<Result<Value, ValidationError>> {
    documents
        .par_iter()
        .map(|document| cleaner.clean_json(&document.value))
        .collect()
}

fn render_output(cleaned: &[Value], ndjson: bool) -> Result<String> {
    if ndjson {
        let lines = cleaned
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(lines.join("\n"));
    }
    let rendered = match cleaned {
        [single] => serde_json::to_string_pretty(single)?,
        many => serde_json::to_string_pretty(many)?,
    };
    Ok(rendered)
}

fn summary(total: usize, failed: usize) -> ExitCode {
    if failed == 0 {
        eprintln!("{} {total} document(s) clean", "ok:".green().bold());
        ExitCode::SUCCESS
    } else {
        eprintln!("{} {failed} of {total} document(s) rejected", "failed:".red().bold());
        ExitCode::FAILURE
    }
}

fn report(origin: &str, error: &ValidationError) {
    eprintln!("{} {}", "✗".red().bold(), origin.bold());
    for failure in error.failures() {
        report_failure(failure, 1);
    }
}

fn report_failure(failure: &ValidationFailure, depth: usize) {
    let indent = "    ".repeat(depth);
    eprintln!(
        "{indent}{} {} {}",
        failure.path.to_string().yellow(),
        failure.kind.name().red(),
        failure.to_string().dimmed()
    );
    if let FailureKind::NoAlternativeMatched { attempts } = &failure.kind {
        for attempt in attempts {
            report_failure(attempt, depth + 1);
        }
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();
    for raw in patterns {
        let pattern = raw.as_ref();
        if has_glob_chars(pattern) {
            let before = out.len();
            for entry in glob::glob(pattern)? {
                out.push(entry?);
            }
            if out.len() == before {
                return Err(anyhow!("glob pattern matched no files: {pattern}"));
            }
        } else {
            out.push(FsPath::new(pattern).to_path_buf());
        }
    }
    Ok(out)
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("json-clean-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn settings(schema: PathBuf, input: Vec<String>, ndjson: bool, json_pointer: Option<&str>) -> InputSettings {
        InputSettings { schema, ndjson, json_pointer: json_pointer.map(str::to_string), input }
    }

    #[test]
    fn ndjson_inputs_with_pointer_are_cleaned_in_order() {
        let dir = scratch_dir("ndjson");
        let schema = dir.join("schema.json");
        std::fs::write(&schema, r#"{"n": "number", "d": "date"}"#).unwrap();
        let input = dir.join("rows.ndjson");
        std::fs::write(
            &input,
            "{\"row\": {\"n\": \"1\", \"d\": \"2000-01-01\"}}\n\n{\"row\": {\"n\": 2, \"d\": \"bad\"}}\n",
        )
        .unwrap();

        let s = settings(schema, vec![input.to_string_lossy().to_string()], true, Some("/row"));
        let cleaner = s.load_cleaner(Mode::FailFast).unwrap();
        let documents = s.load_documents().unwrap();
        assert_eq!(documents.len(), 2);
        assert!(documents[1].origin.ends_with(":3"));

        let results = clean_all(&cleaner, &documents);
        assert_eq!(results[0].as_ref().unwrap().to_json(), json!({"n": 1, "d": "2000-01-01"}));
        assert_eq!(results[1].as_ref().unwrap_err().first().kind.name(), "FormatError");

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn missing_pointer_target_is_an_input_error() {
        let s = settings(PathBuf::from("unused"), vec![], false, Some("/nope"));
        let err = s.select("doc".into(), json!({"a": 1})).unwrap_err();
        assert_eq!(err.to_string(), "JSON pointer /nope selects nothing in doc");
    }

    #[test]
    fn glob_without_matches_is_reported() {
        let dir = scratch_dir("glob");
        let pattern = dir.join("*.json").to_string_lossy().to_string();
        let err = resolve_file_path_patterns([pattern.as_str()]).unwrap_err();
        assert!(err.to_string().starts_with("glob pattern matched no files"));
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn output_shapes() {
        let values = vec![Value::from(json!({"a": 1})), Value::from(json!({"a": 2}))];
        assert_eq!(render_output(&values, true).unwrap(), "{\"a\":1}\n{\"a\":2}");
        assert!(render_output(&values[..1], false).unwrap().starts_with('{'));
        assert!(render_output(&values, false).unwrap().starts_with('['));
    }
}
