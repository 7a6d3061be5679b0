use std::{
    fs::File,
    io::{self, BufReader, Write as _},
    path::Path,
};

use anyhow::Context;
use dilemma_core::{catalog, StrategyRegistry};
use tracing_subscriber::EnvFilter;

/// Log to stderr; `RUST_LOG` overrides the level picked by `-v`
pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} file: {}", file_kind, path.display()))?;

    let reader = BufReader::new(file);
    let value = serde_json::from_reader(reader).with_context(|| {
        format!(
            "Failed to parse {} JSON file: {}",
            file_kind,
            path.display()
        )
    })?;

    Ok(value)
}

/// Load a config from `path`, or start from defaults
pub fn load_config<T, P>(file_kind: &str, path: Option<P>) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned + Default,
    P: AsRef<Path>,
{
    match path {
        Some(path) => read_json_file(file_kind, path),
        None => Ok(T::default()),
    }
}

pub fn print_json<T>(value: &T) -> anyhow::Result<()>
where
    T: serde::Serialize,
{
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value).context("Failed to write JSON to stdout")?;
    writeln!(stdout).context("Failed to write newline after JSON to stdout")?;
    Ok(())
}

/// Registry for the strategies named on the command line, or the
/// default lineup when none were given
pub fn strategy_registry(names: &[String]) -> anyhow::Result<StrategyRegistry> {
    let registry = if names.is_empty() {
        catalog::default_registry()
    } else {
        catalog::registry(names)
    };
    registry.context("Failed to build strategy lineup")
}

/// Width of the widest name, at least `min`
pub fn name_width<'a>(names: impl IntoIterator<Item = &'a str>, min: usize) -> usize {
    names.into_iter().map(str::len).max().unwrap_or(0).max(min)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_registry_defaults() {
        let registry = strategy_registry(&[]).unwrap();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, catalog::DEFAULT_LINEUP.to_vec());
    }

    #[test]
    fn test_strategy_registry_unknown_name() {
        let err = strategy_registry(&["Nobody".to_string()]).unwrap_err();
        assert!(format!("{err:#}").contains("Nobody"));
    }

    #[test]
    fn test_load_config_missing_file() {
        let result: anyhow::Result<dilemma_core::MatchConfig> =
            load_config("match config", Some("/nonexistent/config.json"));
        let err = result.unwrap_err();
        assert!(err.to_string().contains("/nonexistent/config.json"));
    }

    #[test]
    fn test_load_config_default() {
        let config: dilemma_core::MatchConfig = load_config("match config", None::<&str>).unwrap();
        assert_eq!(config, dilemma_core::MatchConfig::default());
    }

    #[test]
    fn test_name_width() {
        assert_eq!(name_width(["ab", "abcd"], 3), 4);
        assert_eq!(name_width([], 8), 8);
    }
}
