//! Plain-text rendering of themes, presets and job progress.
//!
//! Everything writes to an `impl Write` so commands can target stdout and
//! tests can target a buffer.

use std::io::{self, Write};

use maptoposter_client::events::JobEvent;
use maptoposter_client::job::PosterArtifact;
use maptoposter_core::preset::LayerPreset;
use maptoposter_core::preset_actions::{PresetStatus, PresetStatusKind};
use maptoposter_core::preset_store::{PresetEntry, PresetGroup};
use maptoposter_core::theme::{GeocodeResult, ThemeSummary};

const PROGRESS_BAR_WIDTH: usize = 20;

pub fn render_themes<'a>(
    out: &mut impl Write,
    themes: impl IntoIterator<Item = &'a ThemeSummary>,
) -> io::Result<()> {
    let mut any = false;
    for theme in themes {
        any = true;
        let name = if theme.name.is_empty() { &theme.id } else { &theme.name };
        write!(out, "{:<16} {name}", theme.id)?;
        if !theme.description.is_empty() {
            write!(out, " - {}", theme.description)?;
        }
        writeln!(out)?;
    }
    if !any {
        writeln!(out, "No themes found")?;
    }
    Ok(())
}

/// The preset picker as a grouped list.
pub fn render_preset_list<'a>(
    out: &mut impl Write,
    entries: impl IntoIterator<Item = PresetEntry<'a>>,
) -> io::Result<()> {
    let mut group = None;
    for entry in entries {
        if entry.group == PresetGroup::Custom {
            continue;
        }
        if group != Some(entry.group) {
            let heading = match entry.group {
                PresetGroup::BuiltIn => "Built-in presets",
                _ => "Saved presets",
            };
            if group.is_some() {
                writeln!(out)?;
            }
            writeln!(out, "{heading}:")?;
            group = Some(entry.group);
        }
        write!(out, "  {:<24} {}", entry.selector.to_string(), entry.label)?;
        if let Some(description) = entry.description.filter(|d| !d.is_empty()) {
            write!(out, " - {description}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn render_preset(out: &mut impl Write, preset: &LayerPreset) -> io::Result<()> {
    let s = &preset.settings;
    writeln!(out, "{}", preset.name)?;
    if let Some(description) = preset.description.as_deref().filter(|d| !d.is_empty()) {
        writeln!(out, "  {description}")?;
    }
    let filter = if s.tag_value.is_empty() {
        s.tag_key.clone()
    } else {
        format!("{}={}", s.tag_key, s.tag_value)
    };
    writeln!(out, "  tag:        {filter}")?;
    writeln!(out, "  mode:       {}", s.mode)?;
    writeln!(out, "  color:      {}", s.color)?;
    writeln!(out, "  line width: {}", s.line_width)?;
    writeln!(out, "  z-order:    {}", s.zorder)
}

pub fn render_status(out: &mut impl Write, status: &PresetStatus) -> io::Result<()> {
    match status.kind {
        PresetStatusKind::Error => writeln!(out, "error: {}", status.message),
        _ => writeln!(out, "{}", status.message),
    }
}

/// `[#####...............]  25%`
pub fn progress_bar(progress: u8) -> String {
    let progress = progress.min(100);
    let filled = usize::from(progress) * PROGRESS_BAR_WIDTH / 100;
    format!(
        "[{}{}] {progress:>3}%",
        "#".repeat(filled),
        ".".repeat(PROGRESS_BAR_WIDTH - filled)
    )
}

pub fn render_event(out: &mut impl Write, event: &JobEvent) -> io::Result<()> {
    match event {
        JobEvent::Submitted { job_id } => writeln!(out, "Job {job_id} submitted"),
        JobEvent::Progress {
            progress, message, ..
        } => {
            if message.is_empty() {
                writeln!(out, "{}", progress_bar(*progress))
            } else {
                writeln!(out, "{} {message}", progress_bar(*progress))
            }
        }
        JobEvent::Completed { .. } => writeln!(out, "{} Poster ready", progress_bar(100)),
        JobEvent::Failed { failure, .. } => writeln!(out, "Generation failed: {failure}"),
    }
}

/// Where the finished poster can be fetched, as absolute URLs.
pub fn render_artifact(
    out: &mut impl Write,
    base_url: &str,
    artifact: &PosterArtifact,
) -> io::Result<()> {
    writeln!(out, "Poster:    {}", artifact.file_name())?;
    writeln!(out, "Download:  {base_url}{}", artifact.download_path())?;
    writeln!(out, "Thumbnail: {base_url}{}", artifact.thumbnail_path())
}

pub fn render_geocode(out: &mut impl Write, result: &GeocodeResult) -> io::Result<()> {
    let c = result.coordinates;
    writeln!(out, "Coordinates: {:.6}, {:.6}", c.lat, c.lon)?;
    if let Some(address) = result.address.as_deref() {
        writeln!(out, "Address:     {address}")?;
    }
    let place: Vec<&str> = [result.city.as_deref(), result.country.as_deref()]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect();
    if !place.is_empty() {
        writeln!(out, "Place:       {}", place.join(", "))?;
    }
    Ok(())
}
