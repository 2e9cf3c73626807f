//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::error::{Result, ResultExt};
use crate::http::StaticTransport;
use crate::loader::{load_source, SourceDefinition};
use crate::pipeline::RateSource;
use crate::registry::{self, Registry};
use crate::types::RateTuple;
use futures::future::join_all;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command and print its messages
    pub async fn run(&self) -> Result<()> {
        for msg in self.execute().await? {
            self.output_message(&msg);
        }
        Ok(())
    }

    /// Run the CLI command and return its messages
    pub async fn execute(&self) -> Result<Vec<Value>> {
        match &self.cli.command {
            Commands::List => Ok(vec![Self::list_sources()?]),
            Commands::Rates { all: true, .. } => self.rates_all().await,
            Commands::Rates { source, input, .. } => {
                let source = source.as_deref().unwrap_or_default();
                Ok(vec![self.rates(source, input.as_deref()).await?])
            }
            Commands::Find {
                source,
                base,
                destination,
                input,
            } => Ok(vec![
                self.find(source, base, destination, input.as_deref())
                    .await?,
            ]),
            Commands::Validate { file } => Ok(vec![Self::validate(file)?]),
        }
    }

    /// List built-in sources
    fn list_sources() -> Result<Value> {
        let sources = registry::builtin_names()
            .into_iter()
            .map(|name| {
                let def = load_source(name)?;
                Ok(json!({
                    "name": def.name,
                    "title": def.display_title(),
                    "format": def.format,
                    "url": def.request.url,
                }))
            })
            .collect::<Result<Vec<Value>>>()?;

        Ok(json!({
            "type": "SOURCES",
            "sources": sources
        }))
    }

    /// Print every rate of one source
    async fn rates(&self, source: &str, input: Option<&Path>) -> Result<Value> {
        let (source, raw) = Self::build_source(source, input)?;
        let started = Instant::now();
        let rates = source.produce_rates(raw).await?;

        info!(
            source = %source.id(),
            count = rates.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Rates produced"
        );
        Ok(Self::rates_message(&source, &rates))
    }

    /// Fetch every built-in source concurrently
    ///
    /// A failing source is reported as an `ERROR` message and does not
    /// abort the others.
    async fn rates_all(&self) -> Result<Vec<Value>> {
        let registry = Registry::with_builtin();
        let sources = registry
            .source_ids()
            .iter()
            .map(|id| registry.source(id))
            .collect::<Result<Vec<Arc<RateSource>>>>()?;

        let results = join_all(sources.iter().map(|source| source.produce_rates(None))).await;

        Ok(sources
            .iter()
            .zip(results)
            .map(|(source, result)| match result {
                Ok(rates) => Self::rates_message(source, &rates),
                Err(e) => {
                    warn!(source = %source.id(), error = %e, "Source failed");
                    json!({
                        "type": "ERROR",
                        "source": source.id(),
                        "error": {
                            "kind": format!("{:?}", e.kind()),
                            "message": e.to_string()
                        }
                    })
                }
            })
            .collect())
    }

    /// Print the rate of one pair
    async fn find(
        &self,
        source: &str,
        base: &str,
        destination: &str,
        input: Option<&Path>,
    ) -> Result<Value> {
        let (source, raw) = Self::build_source(source, input)?;
        let rate = source.find_rate(base, destination, raw).await?;

        Ok(json!({
            "type": "RATE",
            "source": source.id(),
            "rate": rate
        }))
    }

    /// Validate a source definition file
    fn validate(file: &Path) -> Result<Value> {
        let def = load_source(file)?;
        RateSource::from_definition(&def)?;

        Ok(json!({
            "type": "LOG",
            "log": {
                "level": "INFO",
                "message": Self::describe(&def)
            }
        }))
    }

    /// Build a source; with `input` the document is read from disk
    fn build_source(source: &str, input: Option<&Path>) -> Result<(RateSource, Option<String>)> {
        let def = load_source(source)?;
        let Some(path) = input else {
            return Ok((RateSource::from_definition(&def)?, None));
        };

        let body = fs::read_to_string(path)
            .with_context(|| format!("Failed to read input '{}'", path.display()))?;
        let transport = StaticTransport::new(body.clone()).with_origin(path.display().to_string());
        let source = RateSource::from_definition_with_transport(&def, Arc::new(transport))?;
        Ok((source, Some(body)))
    }

    fn rates_message(source: &RateSource, rates: &[RateTuple]) -> Value {
        json!({
            "type": "RATES",
            "source": source.id(),
            "title": source.title(),
            "rates": rates
        })
    }

    fn describe(def: &SourceDefinition) -> String {
        format!(
            "Source '{}' ({}) is valid: {} document from {}",
            def.name,
            def.display_title(),
            match def.format {
                crate::decode::DecoderFormat::Html => "html",
                crate::decode::DecoderFormat::Json => "json",
            },
            def.request.url
        )
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    const PRIVATBANK_BODY: &str = r#"[
        {"ccy": "EUR", "base_ccy": "UAH", "buy": "30.10", "sale": "30.50"},
        {"ccy": "USD", "base_ccy": "UAH", "buy": "27.50", "sale": "27.80"}
    ]"#;

    fn runner(args: &[&str]) -> Runner {
        let mut argv = vec!["rate-grabber"];
        argv.extend_from_slice(args);
        Runner::new(Cli::try_parse_from(argv).unwrap())
    }

    fn input_file(body: &str) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        fs::write(file.path(), body).unwrap();
        file
    }

    #[test]
    fn test_parse_args() {
        let cli = Cli::try_parse_from(["rate-grabber", "-f", "pretty", "-v", "find", "nbu", "UAH", "USD"])
            .unwrap();
        assert_eq!(cli.format, OutputFormat::Pretty);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Find { ref source, .. } if source == "nbu"));

        assert!(Cli::try_parse_from(["rate-grabber", "rates"]).is_err());
        assert!(Cli::try_parse_from(["rate-grabber", "rates", "nbu", "--all"]).is_err());
        assert!(Cli::try_parse_from(["rate-grabber", "rates", "--all"]).is_ok());
    }

    #[tokio::test]
    async fn test_list() {
        let messages = runner(&["list"]).execute().await.unwrap();
        let sources = messages[0]["sources"].as_array().unwrap();

        assert_eq!(messages[0]["type"], "SOURCES");
        assert_eq!(sources.len(), 5);
        assert!(sources
            .iter()
            .any(|s| s["name"] == "privatbank" && s["format"] == "json"));
    }

    #[tokio::test]
    async fn test_rates_from_input() {
        let file = input_file(PRIVATBANK_BODY);
        let path = file.path().to_string_lossy().to_string();

        let messages = runner(&["rates", "privatbank", "--input", &path])
            .execute()
            .await
            .unwrap();

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["type"], "RATES");
        assert_eq!(messages[0]["source"], "privatbank");
        assert_eq!(
            messages[0]["rates"],
            json!([
                {"base": "UAH", "destination": "EUR", "buy": 30.1, "sale": 30.5},
                {"base": "UAH", "destination": "USD", "buy": 27.5, "sale": 27.8}
            ])
        );
    }

    #[tokio::test]
    async fn test_find_from_input() {
        let file = input_file(PRIVATBANK_BODY);
        let path = file.path().to_string_lossy().to_string();

        let messages = runner(&["find", "privatbank", "UAH", "USD", "-i", &path])
            .execute()
            .await
            .unwrap();
        assert_eq!(messages[0]["rate"]["buy"], 27.5);

        let err = runner(&["find", "privatbank", "UAH", "GBP", "-i", &path])
            .execute()
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_missing_input_file() {
        let err = runner(&["rates", "privatbank", "-i", "/nonexistent/rates.json"])
            .execute()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read input"));
    }

    #[tokio::test]
    async fn test_validate() {
        let file = input_file(registry::builtin_yaml("nbu").unwrap());
        let path = file.path().to_string_lossy().to_string();

        let messages = runner(&["validate", &path]).execute().await.unwrap();
        let message = messages[0]["log"]["message"].as_str().unwrap();
        assert!(message.starts_with("Source 'nbu' (National Bank of Ukraine) is valid"));
    }
}
