use crate::cli::CheckArgs;
use crate::config::FileConfig;
use crate::error::{CliError, Result};
use crate::tools::ToolLocator;
use foldcolor::engine::error::EngineError;
use foldcolor::engine::folding::FoldingEngine;
use foldcolor::engine::render::Renderer;
use tracing::info;

pub fn run(args: CheckArgs, file_config: &FileConfig) -> Result<()> {
    let tools = file_config.tools().with_args(&args.tools);
    let locator = ToolLocator::new();
    let mut missing = Vec::new();

    let engine = locator.folding_engine(&tools);
    match engine.check_available() {
        Ok(()) => println!("✓ RNAfold: {}", engine.executable().display()),
        Err(e) => {
            println!("✗ RNAfold: {}", e);
            missing.push("RNAfold");
        }
    }

    let renderer = locator
        .renderer(&tools)
        .and_then(|renderer| renderer.check_available().map(|_| renderer).map_err(Into::into));
    match renderer {
        Ok(renderer) => println!("✓ RNArtistCore: {}", renderer.jar().display()),
        Err(e) => {
            println!("✗ RNArtistCore: {}", e);
            missing.push("RNArtistCore");
        }
    }

    if missing.is_empty() {
        info!("All external tools are available.");
        Ok(())
    } else {
        Err(CliError::Engine(EngineError::DependencyMissing {
            name: missing.join(", "),
            hint: "rendering can be skipped with `run --skip-render`; folding always needs RNAfold"
                .to_string(),
        }))
    }
}
