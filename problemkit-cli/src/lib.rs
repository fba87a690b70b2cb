//! Command-line front end for the violation list normalizer.

use std::io::Read;
use std::path::Path;

use anyhow::Context;
use problemkit_config::{Config, NormalizerConfig};
use problemkit_normalizer::{
    CamelCaseToSnakeCase, ConstraintViolationList, ConstraintViolationListNormalizer,
    NameResolver, SerializedNameMap,
};

pub mod cli;
pub mod tracing_setup;

use cli::CliArgs;

/// Load and validate configuration from file (if any) plus environment.
pub fn load_config(path: Option<&str>) -> anyhow::Result<Config> {
    let cfg = match path {
        Some(p) => problemkit_config::load_config(Some(p)),
        None => problemkit_config::load_config::<&Path>(None),
    }
    .context("failed to load configuration")?;
    problemkit_config::validate_config(&cfg).context("invalid configuration")?;
    Ok(cfg)
}

/// Build a normalizer from an already validated configuration.
pub fn build_normalizer(cfg: &NormalizerConfig) -> ConstraintViolationListNormalizer {
    let resolver = match cfg.name_converter.as_str() {
        "snake_case" => NameResolver::basic(CamelCaseToSnakeCase::new()),
        "serialized_name" => NameResolver::advanced(
            cfg.serialized_names
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<SerializedNameMap>(),
        ),
        _ => NameResolver::Identity,
    };

    let normalizer =
        ConstraintViolationListNormalizer::new(cfg.serialize_payload_fields.iter().cloned(), resolver);
    match &cfg.target_type {
        Some(t) => normalizer.with_target_type(t.clone()),
        None => normalizer,
    }
}

/// Parse a JSON violation list and render it as a problem document.
pub fn render(
    normalizer: &ConstraintViolationListNormalizer,
    input: &str,
    format: &str,
    pretty: bool,
) -> anyhow::Result<String> {
    let violations: ConstraintViolationList =
        serde_json::from_str(input).context("input is not a valid violation list")?;
    let document = normalizer.normalize_for_format(&violations, format)?;

    tracing::info!(
        violations = document.violations.len(),
        format,
        content_type = problemkit_normalizer::MIME_TYPE,
        "rendered problem document"
    );

    let out = if pretty {
        serde_json::to_string_pretty(&document)?
    } else {
        serde_json::to_string(&document)?
    };
    Ok(out)
}

/// Read the input named by `args` and render it with a normalizer built from `config`.
pub fn run(args: &CliArgs, config: &Config) -> anyhow::Result<String> {
    let input = match args.input_path() {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read input file {path}"))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read violations from stdin")?;
            buf
        }
    };

    let normalizer = build_normalizer(&config.normalizer);
    tracing::debug!(
        payload_fields = ?normalizer.serialize_payload_fields(),
        name_converter = %config.normalizer.name_converter,
        "normalizer configured"
    );
    render(&normalizer, &input, &args.format, args.pretty)
}
