use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context};
use dotenvy::dotenv;
use tracing::{error, info, warn};

use makeup_look_assistant::catalog::ProductCatalog;
use makeup_look_assistant::config::CONFIG;
use makeup_look_assistant::llm::{GeminiLookModel, LookModel};
use makeup_look_assistant::pipeline::LookPipeline;
use makeup_look_assistant::render::{ImageSurface, RenderingContext};
use makeup_look_assistant::utils::logging::init_logging;

#[derive(Debug)]
struct CliArgs {
    prompt: String,
    catalog_path: PathBuf,
    image_path: Option<PathBuf>,
    out_path: Option<PathBuf>,
    offline: bool,
}

fn usage() -> &'static str {
    "Usage: makeup_look_assistant --prompt <text> [--catalog <path>] [--image <path>] [--out <path>] [--offline]"
}

fn parse_args(args: &[String]) -> anyhow::Result<CliArgs> {
    let mut prompt: Option<String> = None;
    let mut catalog_path = CONFIG.catalog_path.clone();
    let mut image_path: Option<PathBuf> = None;
    let mut out_path: Option<PathBuf> = None;
    let mut offline = false;

    let mut index = 1;
    while index < args.len() {
        match args[index].as_str() {
            "--prompt" => {
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| anyhow!("Missing value for --prompt"))?;
                prompt = Some(value.clone());
            }
            "--catalog" => {
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| anyhow!("Missing value for --catalog"))?;
                catalog_path = PathBuf::from(value);
            }
            "--image" => {
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| anyhow!("Missing value for --image"))?;
                image_path = Some(PathBuf::from(value));
            }
            "--out" => {
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| anyhow!("Missing value for --out"))?;
                out_path = Some(PathBuf::from(value));
            }
            "--offline" => {
                offline = true;
            }
            "--help" | "-h" => {
                return Err(anyhow!(usage()));
            }
            other => {
                return Err(anyhow!("Unknown argument: {other}\n{}", usage()));
            }
        }
        index += 1;
    }

    let prompt = prompt
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| anyhow!("--prompt is required\n{}", usage()))?;

    Ok(CliArgs {
        prompt,
        catalog_path,
        image_path,
        out_path,
        offline,
    })
}

fn load_catalog(path: &Path) -> ProductCatalog {
    if !path.exists() {
        warn!("Catalog {} not found; recommendations will be empty", path.display());
        return ProductCatalog::default();
    }
    match ProductCatalog::load(path) {
        Ok(catalog) => catalog,
        Err(err) => {
            warn!("Failed to load catalog {}: {:#}", path.display(), err);
            ProductCatalog::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let _guards = init_logging(&CONFIG);

    let args: Vec<String> = std::env::args().collect();
    let cli = parse_args(&args)?;

    let model: Option<Arc<dyn LookModel>> = if cli.offline {
        info!("Offline mode; using the keyword classifier only");
        None
    } else if !CONFIG.model_configured() {
        warn!("GEMINI_API_KEY is not set; using the keyword classifier only");
        None
    } else {
        Some(Arc::new(GeminiLookModel::from_config(&CONFIG)))
    };

    let context = Arc::new(RenderingContext::new());
    let mut image_bytes: Option<Vec<u8>> = None;
    let mut surface: Option<Arc<ImageSurface>> = None;
    if let Some(path) = &cli.image_path {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read face image {}", path.display()))?;
        let image_surface = Arc::new(ImageSurface::from_bytes(&bytes)?);
        context.register_surface(image_surface.clone());
        surface = Some(image_surface);
        image_bytes = Some(bytes);
    }

    let catalog = Arc::new(load_catalog(&cli.catalog_path));
    info!(
        "Starting makeup look assistant: catalog_products={} model={}",
        catalog.len(),
        model
            .as_ref()
            .map(|model| model.model_name().to_string())
            .unwrap_or_else(|| "none".to_string())
    );

    let pipeline = LookPipeline::from_config(&CONFIG, model, context, catalog);
    let event_logger = pipeline.events().spawn_event_logger();

    let result = pipeline.submit(&cli.prompt, image_bytes.as_deref()).await?;
    info!(
        "Applied look '{}' ({}): {}",
        result.applied.look.style,
        result.applied.look.source.as_str(),
        result.applied.look.description
    );
    for outcome in &result.applied.outcomes {
        info!(
            "  {} -> {} via {}",
            outcome.filter_type.as_str(),
            outcome.state.as_str(),
            outcome.strategy.unwrap_or("none")
        );
    }
    for recommendation in &result.recommendations {
        for entry in &recommendation.matches {
            info!(
                "  recommend {}: {} {} ({}) distance={:.1}",
                recommendation.filter_type.as_str(),
                entry.product.brand,
                entry.product.name,
                entry.product.id,
                entry.distance
            );
        }
    }

    if result.applied.needs_reconciliation() {
        // A headless run has no engine or UI driver that could register later.
        info!("Skipping reconciliation in headless mode");
        pipeline.cancel_active();
    }

    if let (Some(surface), Some(out)) = (&surface, &cli.out_path) {
        match surface.save_render(out) {
            Ok(()) => info!("Rendered look written to {}", out.display()),
            Err(err) => error!("Failed to write rendered look: {:#}", err),
        }
    }

    event_logger.abort();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        std::iter::once("makeup_look_assistant")
            .chain(values.iter().copied())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn parses_all_flags() {
        let cli = parse_args(&args(&[
            "--prompt",
            "wedding makeup",
            "--catalog",
            "shop.json",
            "--image",
            "face.png",
            "--out",
            "look.png",
            "--offline",
        ]))
        .unwrap();
        assert_eq!(cli.prompt, "wedding makeup");
        assert_eq!(cli.catalog_path, PathBuf::from("shop.json"));
        assert_eq!(cli.image_path, Some(PathBuf::from("face.png")));
        assert_eq!(cli.out_path, Some(PathBuf::from("look.png")));
        assert!(cli.offline);
    }

    #[test]
    fn prompt_is_required_and_unknown_flags_rejected() {
        assert!(parse_args(&args(&["--offline"])).is_err());
        assert!(parse_args(&args(&["--prompt", "   "])).is_err());
        assert!(parse_args(&args(&["--prompt"])).is_err());
        let err = parse_args(&args(&["--prompt", "x", "--color"])).unwrap_err();
        assert!(err.to_string().contains("Unknown argument: --color"));
    }
}
