use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use client_core::{
    config::{apply_overrides, load_settings_file},
    load_settings,
    narration::plain_text,
    ControllerSnapshot, FileCandidate, HttpBackend, SelectOutcome, UploadResultController,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "scoresense", about = "Visualize a sheet music PDF from the terminal")]
struct Args {
    /// Sheet music to analyze.
    pdf: PathBuf,
    #[arg(long)]
    base_url: Option<String>,
    #[arg(long)]
    config: Option<PathBuf>,
    /// Request this many additional visual styles after the first result.
    #[arg(long, default_value_t = 0)]
    regenerate: u32,
    /// Write the final visualization to this path.
    #[arg(long)]
    save_image: Option<PathBuf>,
    /// Print the final result as JSON instead of a summary.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => {
            let mut settings = load_settings_file(path)?;
            apply_overrides(&mut settings, |key| std::env::var(key).ok());
            settings
        }
        None => load_settings(),
    };
    if let Some(base_url) = &args.base_url {
        settings.base_url = base_url.clone();
    }

    let backend = HttpBackend::from_settings(&settings)?;
    tracing::info!(base_url = %backend.base_url(), "using backend");
    let mut controller = UploadResultController::new(backend);

    let candidate = read_candidate(&args.pdf).await?;
    if controller.select_file(candidate).await == SelectOutcome::Rejected {
        bail!(final_error(&controller.snapshot()).unwrap_or_default());
    }

    for round in 1..=args.regenerate {
        if let Some(message) = final_error(&controller.snapshot()) {
            bail!(message);
        }
        tracing::info!(round, "requesting another visual style");
        controller.regenerate().await;
    }

    let snapshot = controller.snapshot();
    if let Some(message) = final_error(&snapshot) {
        bail!(message);
    }
    let Some(result) = snapshot.result.as_ref() else {
        bail!("no analysis result was produced");
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        println!("{}", render_summary(&snapshot));
    }

    if let Some(path) = &args.save_image {
        let Some(bytes) = result.decode_image()? else {
            bail!("the analysis did not include an image");
        };
        tokio::fs::write(path, bytes)
            .await
            .with_context(|| format!("failed to write image to '{}'", path.display()))?;
        eprintln!("Saved image to {}", path.display());
    }

    Ok(())
}

async fn read_candidate(path: &Path) -> Result<FileCandidate> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let media_type = mime_guess::from_path(path).first_raw();
    Ok(FileCandidate::new(name, media_type, bytes))
}

/// Any error message left on the controller means the run failed, even when an
/// earlier result is still being shown.
fn final_error(snapshot: &ControllerSnapshot) -> Option<String> {
    snapshot.error_message.clone()
}

fn render_summary(snapshot: &ControllerSnapshot) -> String {
    let Some(result) = &snapshot.result else {
        return String::new();
    };
    let mut out = format!(
        "Visualizing: {}\nVisualization Style: {}\n",
        result.display_title(),
        result.display_visualization_type()
    );
    if !result.has_image() {
        out.push_str(client_core::types::IMAGE_UNAVAILABLE);
        out.push('\n');
    }
    out.push_str("\nNarrative for Non-Musicians:\n");
    out.push_str(&plain_text(result.display_narration()));
    out.push('\n');
    if let Some(disclaimer) = result.disclaimer() {
        out.push('\n');
        out.push_str(disclaimer);
        out.push('\n');
    }
    out
}
