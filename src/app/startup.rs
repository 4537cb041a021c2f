//! Binary startup: arguments, logging, configuration and a single resolve run

use crate::app::cli::Args;
use crate::app::display::render_view;
use crate::core::error_handling::log_error_with_context;
use crate::core::logging::{init_logging, reconfigure_log_level};
use crate::engine::config::{DataSourceConfig, EngineConfig};
use crate::engine::{SelectEngine, SelectProps};
use crate::source::descriptor::ServiceApi;
use crate::source::error::{EngineError, EngineResult};
use crate::source::fixture::FixtureService;
use crate::source::http::HttpService;
use clap::Parser;
use std::io::IsTerminal;
use std::process::ExitCode;
use std::sync::Arc;

/// Run the binary and map the outcome to an exit code
pub async fn startup() -> ExitCode {
    let args = Args::parse();
    let use_color = args.color.unwrap_or_else(|| std::io::stdout().is_terminal());
    colored::control::set_override(use_color);

    let log_file = args.log_file.as_ref().map(|path| path.to_string_lossy().to_string());
    if let Err(e) = init_logging(
        args.log_level.as_deref(),
        args.log_format.as_deref(),
        log_file.as_deref(),
        use_color,
    ) {
        eprintln!("Failed to initialise logging: {}", e);
        return ExitCode::FAILURE;
    }

    log::debug!("Arguments: {:?}", args);

    match run(&args).await {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(err) => {
            log_error_with_context(&err, "Resolving options");
            ExitCode::FAILURE
        }
    }
}

/// Resolve options as described by `args` and return the rendered output
pub async fn run(args: &Args) -> EngineResult<String> {
    let mut config = EngineConfig::discover(args.config_file.as_deref())
        .await?
        .unwrap_or_default();

    if args.log_level.is_none() {
        if let Some(level) = config.log_level.as_deref() {
            if let Err(e) = reconfigure_log_level(level) {
                log::warn!("Ignoring log_level '{}' from config: {}", level, e);
            }
        }
    }

    apply_overrides(&mut config, args)?;
    let service = build_service(&config, args).await?;
    let props = SelectProps::from_config(&config, Some(service));
    if props.data_source.is_none() {
        return Err(EngineError::Configuration {
            message: "No data source configured; set [data_source] or pass --api".to_string(),
        });
    }

    let engine = SelectEngine::new(props);
    engine.refresh().await;

    if let Some(text) = args.search.as_deref() {
        engine.search(text).await;
    }
    for page in 0..args.pages {
        if !engine.load_more().await {
            log::debug!("Stopped after {} extra page(s)", page);
            break;
        }
    }
    if let Some(text) = args.paste.as_deref() {
        let tokens = engine.paste(text).await;
        log::info!("Pasted {} value(s)", tokens.len());
    }

    let view = engine.view();
    engine.destroy();

    render_view(&view, args.output).map_err(|e| EngineError::Parse {
        path: "<output>".into(),
        message: e.to_string(),
    })
}

fn apply_overrides(config: &mut EngineConfig, args: &Args) -> EngineResult<()> {
    if let Some(api) = &args.api {
        match config.data_source.as_mut() {
            Some(source) => source.api = api.clone(),
            None => {
                config.data_source = Some(DataSourceConfig {
                    api: api.clone(),
                    payload: Default::default(),
                    response_entity_key: None,
                    json_entity_key: None,
                    option_config: None,
                    endpoint: None,
                })
            }
        }
    }
    if let Some(source) = config.data_source.as_mut() {
        if let Some(endpoint) = &args.endpoint {
            source.endpoint = Some(endpoint.clone());
        }
        // Fixture responses wrap their records under `data`
        if args.fixture.is_some() && source.response_entity_key.is_none() {
            source.response_entity_key = Some("data".to_string());
        }
    }
    config.validate()
}

async fn build_service(config: &EngineConfig, args: &Args) -> EngineResult<Arc<dyn ServiceApi>> {
    if let Some(path) = &args.fixture {
        log::info!("Using fixture {}", path.display());
        return Ok(Arc::new(FixtureService::load(path).await?));
    }

    let endpoint = config
        .data_source
        .as_ref()
        .and_then(|source| source.endpoint.clone());
    match endpoint {
        Some(endpoint) => {
            log::info!("Using HTTP service at {}", endpoint);
            Ok(Arc::new(HttpService::new(endpoint)))
        }
        None => Err(EngineError::Configuration {
            message: "No service available; pass --fixture or set an endpoint".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::cli::OutputFormat;
    use std::io::Write;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["selectengine"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    fn fixture_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"listUsers": [
                {{"value": 1, "label": "Alice"}},
                {{"value": 2, "label": "Bob"}},
                {{"value": 3, "label": "Alina"}}
            ]}}"#
        )
        .unwrap();
        file
    }

    fn config_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_run_with_fixture_and_api_override() {
        let fixture = fixture_file();
        let config = config_file("");
        let args = args(&[
            "-c",
            config.path().to_str().unwrap(),
            "-x",
            fixture.path().to_str().unwrap(),
            "-a",
            "listUsers",
            "--output",
            "json",
        ]);
        assert_eq!(args.output, OutputFormat::Json);

        let output = run(&args).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["final_options"].as_array().unwrap().len(), 3);
        assert_eq!(parsed["loading"], false);
    }

    #[tokio::test]
    async fn test_run_without_data_source_fails() {
        let fixture = fixture_file();
        let config = config_file("");
        let args = args(&[
            "-c",
            config.path().to_str().unwrap(),
            "-x",
            fixture.path().to_str().unwrap(),
        ]);

        let err = run(&args).await.unwrap_err();
        assert!(matches!(err, EngineError::Configuration { .. }));
    }

    #[tokio::test]
    async fn test_run_without_service_fails() {
        let config = config_file("[data_source]\napi = \"listUsers\"\n");
        let args = args(&["-c", config.path().to_str().unwrap()]);

        let err = run(&args).await.unwrap_err();
        assert!(matches!(err, EngineError::Configuration { .. }));
    }

    #[tokio::test]
    async fn test_missing_explicit_config_fails() {
        let args = args(&["-c", "/definitely/not/here.toml"]);
        let err = run(&args).await.unwrap_err();
        assert!(matches!(err, EngineError::Configuration { .. }));
    }
}
