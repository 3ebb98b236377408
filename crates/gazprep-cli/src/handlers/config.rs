//! Configuration command handlers

use crate::cli::{ConfigAction, ConfigArgs, ConfigInitArgs, ConfigShowArgs};
use crate::config::{Config, DEFAULT_CONFIG_TEMPLATE};
use crate::error::Result;
use crate::output::OutputWriter;
use gazprep_core::StageConfig;
use serde::Serialize;
use std::path::Path;

/// Handle the config command
pub async fn handle_config(
    args: ConfigArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    match args.action {
        ConfigAction::Init(init_args) => handle_config_init(init_args, output).await,
        ConfigAction::Show(show_args) => handle_config_show(show_args, config, output).await,
        ConfigAction::Validate => handle_config_validate(config, output).await,
    }
}

/// Handle config init subcommand
async fn handle_config_init(args: ConfigInitArgs, output: &mut OutputWriter) -> Result<()> {
    if write_default_config(&args.path, args.force)? {
        output.success(&format!("✓ Created config at {}", args.path.display()))?;
        output.info("Edit it to choose the categories to keep.")?;
    } else {
        output.warning(&format!(
            "Config already exists at {} (use --force to overwrite)",
            args.path.display()
        ))?;
    }
    Ok(())
}

/// Write the default template; `false` when the file exists and `force` is off
fn write_default_config(path: &Path, force: bool) -> Result<bool> {
    if path.exists() && !force {
        return Ok(false);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, DEFAULT_CONFIG_TEMPLATE)?;
    Ok(true)
}

/// Handle config show subcommand
async fn handle_config_show(
    args: ConfigShowArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    let content = config.render(args.format)?;
    output.write(&content)?;
    if !content.ends_with('\n') {
        output.writeln("")?;
    }
    Ok(())
}

/// The effective stage settings after validation
#[derive(Debug, Serialize)]
struct StageSummary {
    include_policy: String,
    category_field: String,
    missing_category: String,
    countries: Option<Vec<String>>,
    require_name: bool,
    short_name_threshold: usize,
    flag_short_names: bool,
    remove_source_lat_lon: bool,
    stop_terms: usize,
    expand_scripts: bool,
    normalization_steps: Vec<&'static str>,
}

impl StageSummary {
    fn new(stage: &StageConfig) -> Self {
        let normalizer = gazprep_core::FieldNormalizer::from_config(stage);
        Self {
            include_policy: stage.include_policy().to_string(),
            category_field: stage.category_field().to_string(),
            missing_category: stage.missing_category().to_string(),
            countries: stage
                .include_countries()
                .map(|set| set.iter().cloned().collect()),
            require_name: stage.require_name(),
            short_name_threshold: stage.short_name_threshold(),
            flag_short_names: stage.flag_short_names(),
            remove_source_lat_lon: stage.remove_source_lat_lon(),
            stop_terms: stage.stop_terms().len(),
            expand_scripts: stage.expand_scripts(),
            normalization_steps: normalizer.steps().iter().map(|s| s.name()).collect(),
        }
    }
}

/// Handle config validate subcommand
async fn handle_config_validate(config: &Config, output: &mut OutputWriter) -> Result<()> {
    let stage = StageConfig::from_params(&config.stage)?;
    let summary = StageSummary::new(&stage);

    if output.format() != crate::cli::OutputFormat::Human {
        return output.data(&summary);
    }

    output.success("✓ Configuration is valid")?;
    output.section("Stage")?;
    output.table(
        &["setting", "value"],
        vec![
            vec!["include".into(), summary.include_policy.clone()],
            vec!["category field".into(), summary.category_field.clone()],
            vec!["missing category".into(), summary.missing_category.clone()],
            vec![
                "countries".into(),
                summary
                    .countries
                    .as_ref()
                    .map(|c| c.join(","))
                    .unwrap_or_else(|| "any".into()),
            ],
            vec!["require name".into(), summary.require_name.to_string()],
            vec![
                "short names".into(),
                if summary.flag_short_names {
                    format!("flag below {}", summary.short_name_threshold)
                } else {
                    "not flagged".into()
                },
            ],
            vec!["stop terms".into(), summary.stop_terms.to_string()],
            vec!["steps".into(), summary.normalization_steps.join(", ")],
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use gazprep_core::StageConfigBuilder;
    use tempfile::TempDir;

    #[test]
    fn test_write_default_config_respects_force() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(".gazprep.toml");

        assert!(write_default_config(&path, false).unwrap());
        std::fs::write(&path, "# edited\n").unwrap();

        assert!(!write_default_config(&path, false).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# edited\n");

        assert!(write_default_config(&path, true).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), DEFAULT_CONFIG_TEMPLATE);
    }

    #[test]
    fn test_stage_summary_lists_steps() {
        let stage = StageConfigBuilder::new()
            .include_categories(["general"])
            .stop_terms(["hotel"])
            .build()
            .unwrap();
        let summary = StageSummary::new(&stage);

        assert_eq!(summary.include_policy, "{general}");
        assert_eq!(summary.stop_terms, 1);
        assert_eq!(summary.normalization_steps.first(), Some(&"geo_synthesis"));
        assert!(summary.normalization_steps.contains(&"stop_term_flag"));
    }
}
