//! Command handlers.
//!
//! Each handler writes user-facing output to `out` and returns the process
//! exit code. Errors that abort a command are returned as `anyhow` errors
//! and reported by `main`.

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use tokio::sync::broadcast::error::RecvError;

use maptoposter_client::api::PosterApi;
use maptoposter_client::backend::GenerationBackend;
use maptoposter_client::orchestrator::{JobOrchestrator, JobState};
use maptoposter_core::generation::{build_config, validate_request, GenerationConfig, RawFields};
use maptoposter_core::preset::PresetSelector;
use maptoposter_core::preset_actions::{self, PresetStatus};
use maptoposter_core::preset_library::EXPORT_FILE_NAME;
use maptoposter_core::preset_store::PresetStore;
use maptoposter_core::prompt::{Confirmer, FixedAnswers};
use maptoposter_core::storage::{FileStore, KeyValueStore};
use maptoposter_core::theme::{default_theme, filter_themes, validate_address, ThemeDraft};

use crate::cli::{Cli, Command, GenerateArgs, PresetCommand, ThemeCommand};
use crate::config::CliConfig;
use crate::presenter;
use crate::prompt::TerminalConfirmer;

/// Run one parsed command line.
pub async fn run(cli: Cli, mut config: CliConfig, out: &mut impl Write) -> anyhow::Result<ExitCode> {
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }

    match cli.command {
        Command::Themes(args) => {
            let themes = api(&config)?
                .list_themes()
                .await
                .context("Failed to load themes")?;
            let query = args.search.unwrap_or_default();
            presenter::render_themes(out, filter_themes(&themes, &query))?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Theme {
            command: ThemeCommand::Create { file },
        } => create_theme(&api(&config)?, &file, out).await,
        Command::Geocode(args) => {
            let address = validate_address(&args.address)?;
            let result = api(&config)?
                .geocode(address)
                .await
                .context("Address lookup failed")?;
            presenter::render_geocode(out, &result)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Generate(args) => generate(api(&config)?, &config, args, out).await,
        Command::Presets { command } => {
            let mut store = PresetStore::load(FileStore::new(&config.store_path));
            let mut terminal = TerminalConfirmer::stdio();
            presets(&mut store, command, &mut terminal, out).await
        }
    }
}

fn api(config: &CliConfig) -> anyhow::Result<PosterApi> {
    PosterApi::with_timeout(config.api_url.as_str(), config.request_timeout)
        .context("Failed to build HTTP client")
}

async fn load_fields(path: &Path) -> anyhow::Result<RawFields> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid fields file {}", path.display()))
}

// ---------------------------------------------------------------------------
// Themes
// ---------------------------------------------------------------------------

async fn create_theme(api: &PosterApi, file: &Path, out: &mut impl Write) -> anyhow::Result<ExitCode> {
    let text = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let draft: ThemeDraft = serde_json::from_str(&text)
        .with_context(|| format!("Invalid theme draft {}", file.display()))?;
    draft.validate()?;

    let created = api
        .create_theme(&draft)
        .await
        .context("Failed to create theme")?;
    match (created.message, created.theme_id) {
        (Some(message), _) => writeln!(out, "{message}")?,
        (None, Some(id)) => writeln!(out, "Theme created: {id}")?,
        (None, None) => writeln!(out, "Theme created")?,
    }
    Ok(ExitCode::SUCCESS)
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

async fn generate(
    api: PosterApi,
    config: &CliConfig,
    args: GenerateArgs,
    out: &mut impl Write,
) -> anyhow::Result<ExitCode> {
    let mut fields = match &args.fields {
        Some(path) => load_fields(path).await?,
        None => RawFields::default(),
    };

    if let Some(address) = args.address.as_deref() {
        let address = validate_address(address)?;
        let result = api.geocode(address).await.context("Address lookup failed")?;
        result.apply_to(&mut fields);
        presenter::render_geocode(out, &result)?;
    }

    apply_overrides(&mut fields, &args);

    if fields.theme.as_deref().map_or(true, |t| t.trim().is_empty()) {
        let themes = api.list_themes().await.context("Failed to load themes")?;
        fields.theme = default_theme(&themes).map(|t| t.id.clone());
    }

    let store = PresetStore::load(FileStore::new(&config.store_path));
    let selector = args
        .preset
        .as_deref()
        .map(PresetSelector::parse)
        .unwrap_or_default();
    if selector != PresetSelector::Custom && store.resolve(&selector).is_none() {
        tracing::warn!(preset = %selector, "Unknown preset, using the custom layer fields");
    }
    if let Some(description) = preset_actions::apply_preset(&store, &mut fields, &selector) {
        writeln!(out, "Preset: {description}")?;
    }

    validate_request(&fields)?;
    let request = build_config(&fields, store.resolve(&selector));

    let orchestrator = JobOrchestrator::with_config(api, config.orchestrator());
    match watch_job(&orchestrator, request, out).await? {
        JobState::Complete { artifact, .. } => {
            let api = orchestrator.backend();
            presenter::render_artifact(out, api.base_url(), &artifact)?;
            if let Some(dest) = args.download.as_deref() {
                let bytes = api
                    .download_poster(&artifact, dest)
                    .await
                    .context("Failed to download poster")?;
                writeln!(out, "Saved {} ({bytes} bytes)", dest.display())?;
            }
            Ok(ExitCode::SUCCESS)
        }
        _ => Ok(ExitCode::FAILURE),
    }
}

/// Command-line values take precedence over the fields file.
fn apply_overrides(fields: &mut RawFields, args: &GenerateArgs) {
    if let Some(city) = &args.city {
        fields.city = city.clone();
    }
    if let Some(country) = &args.country {
        fields.country = country.clone();
    }
    if let Some(theme) = &args.theme {
        fields.theme = Some(theme.clone());
    }
    if let Some(distance) = &args.distance {
        fields.distance = distance.clone();
    }
    if args.house_marker {
        fields.add_house_marker = true;
    }
}

/// Submit `request` and print job events until the job settles or the
/// user interrupts. Returns the final state.
pub async fn watch_job<B: GenerationBackend + 'static>(
    orchestrator: &JobOrchestrator<B>,
    request: GenerationConfig,
    out: &mut impl Write,
) -> anyhow::Result<JobState> {
    let mut events = orchestrator.subscribe();
    if let Err(failure) = orchestrator.submit(request).await {
        tracing::debug!(%failure, "Submission failed");
    }

    loop {
        tokio::select! {
            received = events.recv() => match received {
                Ok(event) => {
                    presenter::render_event(out, &event)?;
                    if event.is_terminal() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Missed job events");
                    if orchestrator.state().is_terminal() {
                        break;
                    }
                }
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::warn!("Interrupted, abandoning job");
                orchestrator.dismiss();
                break;
            }
        }
    }

    Ok(orchestrator.state())
}

// ---------------------------------------------------------------------------
// Presets
// ---------------------------------------------------------------------------

/// Run a preset subcommand against `store`.
///
/// `interactive` answers confirmations unless `--yes` or `--mode` was
/// given.
pub async fn presets<S: KeyValueStore>(
    store: &mut PresetStore<S>,
    command: PresetCommand,
    interactive: &mut dyn Confirmer,
    out: &mut impl Write,
) -> anyhow::Result<ExitCode> {
    let status = match command {
        PresetCommand::List => {
            presenter::render_preset_list(out, store.list())?;
            return Ok(ExitCode::SUCCESS);
        }
        PresetCommand::Show { selector } => {
            let Some(preset) = store.resolve(&PresetSelector::parse(&selector)) else {
                anyhow::bail!("Preset '{selector}' not found");
            };
            presenter::render_preset(out, preset)?;
            return Ok(ExitCode::SUCCESS);
        }
        PresetCommand::Save {
            name,
            description,
            fields,
        } => {
            let fields = load_fields(&fields).await?;
            let mut active = PresetSelector::Custom;
            preset_actions::save_from_fields(store, &fields, &name, &description, &mut active)
        }
        PresetCommand::Delete { name, yes } => {
            let mut active = PresetSelector::saved(name.as_str());
            if store.resolve(&active).is_none() {
                PresetStatus::error(format!("Preset \"{name}\" not found."))
            } else {
                let mut fixed = FixedAnswers::yes();
                let mut confirmer: &mut dyn Confirmer = if yes { &mut fixed } else { interactive };
                match preset_actions::delete_selected(store, &mut active, &mut confirmer) {
                    Some(status) => status,
                    None => PresetStatus::info("Canceled."),
                }
            }
        }
        PresetCommand::DeleteAll { yes } => {
            let mut fixed = FixedAnswers::yes();
            let mut confirmer: &mut dyn Confirmer = if yes { &mut fixed } else { interactive };
            match preset_actions::delete_all(store, &mut confirmer) {
                Some(status) => status,
                None => PresetStatus::info("Canceled."),
            }
        }
        PresetCommand::Export { path } => {
            let path = path.unwrap_or_else(|| EXPORT_FILE_NAME.into());
            preset_actions::export_to(store, &path).await
        }
        PresetCommand::Import { path, mode } => {
            let mut fixed = FixedAnswers::yes().with_answer(mode.clone().unwrap_or_default());
            let mut confirmer: &mut dyn Confirmer = if mode.is_some() { &mut fixed } else { interactive };
            preset_actions::import_from(store, &path, &mut confirmer).await
        }
    };

    presenter::render_status(out, &status)?;
    Ok(if status.is_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
