//! Evaluate a JSON model description
//!
//! Usage: evaluate_model <model.json> [engine_config.json]
//!
//! Loads the input layers and commands, evaluates every node in dependency
//! order and prints each result. Set RUST_LOG=debug to trace node execution.

use eems_fuzzy_rust::{CommandSource, EngineConfig, ModelFile, Registry, ResultContext};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eems_fuzzy_rust=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let Some(model_path) = args.next().map(PathBuf::from) else {
        anyhow::bail!("Usage: evaluate_model <model.json> [engine_config.json]");
    };
    let config_path = args.next().map(PathBuf::from);

    let config = EngineConfig::load_or_default(config_path.as_deref())?;
    tracing::info!(
        "Fuzzy range [{}, {}], parallel = {}",
        config.fuzzy.min,
        config.fuzzy.max,
        config.parallel
    );

    let file = ModelFile::load(&model_path)?;
    let result_names: Vec<String> = file.commands.iter().map(|c| c.result_name.clone()).collect();

    let registry = Registry::standard();
    let model = file.into_model(&registry)?;

    let ctx = ResultContext::new(config.fuzzy);
    let summary = model.evaluate(&ctx, config.parallel)?;

    println!("\n{}", "=".repeat(80));
    println!(
        "MODEL RESULTS: {} nodes, {} levels, {:?}",
        summary.nodes_executed, summary.levels, summary.elapsed
    );
    println!("{}", "=".repeat(80));

    for name in &result_names {
        let node = ctx.get(name, &CommandSource::default())?;
        println!("\n{} ({}):", name, node.data_type());
        println!("{}", node.result());
    }

    Ok(())
}
