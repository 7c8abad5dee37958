use anyhow::{bail, Context};
use clap::Parser;
use scene_render_queue::{
    CollectingReporter, InMemoryHost, QueueConfig, RenderHost, RenderScenesToSlots, SceneSelection, Sequencer,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Render selected scenes of a simulated host into named render-result slots.
#[derive(Parser, Debug)]
#[command(name = "scene-render-queue", version, about)]
struct Args {
    /// Scenes known to the host, in host order
    #[arg(long, value_delimiter = ',', required = true)]
    scenes: Vec<String>,

    /// Scenes to render (defaults to all)
    #[arg(long, value_delimiter = ',')]
    select: Vec<String>,

    /// Scene active before the batch (defaults to the first scene)
    #[arg(long)]
    active: Option<String>,

    /// Run the same batch this many times
    #[arg(long, default_value_t = 1)]
    runs: u32,

    /// Simulated render time per scene
    #[arg(long, default_value_t = 5)]
    latency_ms: u64,

    /// Abandon a render that takes longer than this
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Create the render result with a throwaway render
    #[arg(long)]
    warmup: bool,

    /// Simulate a host that never signals render completion
    #[arg(long)]
    drop_completions: bool,

    /// JSON queue configuration; command-line flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print a JSON summary of the render result
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => QueueConfig::from_json_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => QueueConfig::default(),
    };
    if args.timeout_ms.is_some() {
        config.render_timeout_ms = args.timeout_ms;
    }
    config.legacy_warmup_render |= args.warmup;
    config.validate()?;

    if args.drop_completions && config.render_timeout_ms.is_none() {
        bail!("--drop-completions without a timeout would wait forever; pass --timeout-ms");
    }

    let mut host = InMemoryHost::new(args.scenes.iter().map(String::as_str))
        .with_render_latency(Duration::from_millis(args.latency_ms));
    if let Some(active) = &args.active {
        host = host.with_active(active.as_str());
    }
    host.drop_completions(args.drop_completions);

    let selection = if args.select.is_empty() {
        SceneSelection::from_scenes(args.scenes.iter().map(String::as_str))
    } else {
        SceneSelection::from_scenes(args.select.iter().map(String::as_str))
    };

    let reporter = Arc::new(CollectingReporter::new());
    let Some(request) = RenderScenesToSlots::request_for(&host, &selection)? else {
        log::warn!("No scenes selected.");
        return Ok(());
    };

    let sequencer = Sequencer::new(host, Some(config), reporter.clone()).await?;
    let mut outcomes = Vec::new();
    for run in 1..=args.runs {
        log::debug!("batch run {}/{}", run, args.runs);
        let outcome = sequencer.submit(request.clone()).await?;
        let done = outcome.is_completed();
        outcomes.push(outcome);
        if !done {
            break;
        }
    }
    let host = sequencer.shutdown().await?;

    if args.json {
        let summary = serde_json::json!({
            "outcomes": outcomes,
            "active_scene": host.active_scene(),
            "renders": host.render_count(),
            "slots": host.render_result().map(|rr| rr.summaries()).unwrap_or_default(),
            "messages": reporter.messages(),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    if let Some(last) = outcomes.pop() {
        last.into_result()?;
    }
    Ok(())
}
