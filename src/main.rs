//! CLI driver for the veneer attachment kernel.
//!
//! `veneer demo` builds a fabricated document, installs one attach
//! controller over its body, then drives a few mutation rounds through
//! the buffered-delivery and frame-queue pumps, reporting instance
//! counts and metrics along the way.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use prometheus::{Encoder, Registry, TextEncoder};
use serde_json::Value;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use veneer_attach::{
    metrics, policy, AttachConfig, AttachController, AttachError, DocumentChanges, QueueScheduler,
    ResourceFactory, ResourceInstance,
};
use veneer_dom::{Document, Element, FrameQueue};

#[derive(Parser)]
#[command(name = "veneer", about = "Mutation-driven resource attachment demo")]
struct Cli {
    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the attachment walkthrough against a fabricated document
    Demo {
        /// Number of scrollable panels appended after startup
        #[arg(long, default_value_t = 4)]
        panels: usize,
        /// Print prometheus metrics at the end
        #[arg(long)]
        metrics: bool,
    },
}

fn init_logging(level: &str) -> Result<()> {
    let level: tracing::Level = level.parse().context("Invalid log level")?;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
    Ok(())
}

/// Marks enhanced elements and logs attach/detach, standing in for a
/// real overlay renderer.
struct ScrollbarOverlayFactory;

struct ScrollbarOverlay {
    element: Element,
}

impl ResourceInstance for ScrollbarOverlay {
    fn teardown(&mut self) -> Result<(), AttachError> {
        self.element.remove_attribute(policy::ENHANCED_MARKER_ATTR);
        debug!(element = %self.element.id(), "scrollbar overlay removed");
        Ok(())
    }
}

impl ResourceFactory for ScrollbarOverlayFactory {
    fn create_instance(
        &self,
        element: &Element,
        _options: &Value,
    ) -> Result<Box<dyn ResourceInstance>, AttachError> {
        element.set_attribute(policy::ENHANCED_MARKER_ATTR, "");
        debug!(element = %element.id(), tag = %element.tag_name(), "scrollbar overlay attached");
        Ok(Box::new(ScrollbarOverlay {
            element: element.clone(),
        }))
    }
}

fn run_demo(panels: usize, print_metrics: bool) -> Result<()> {
    let registry = Registry::new();
    metrics::register_metrics(&registry);

    let doc = Document::new();
    let sidebar = doc.create_element("nav");
    sidebar.add_class("overflow-y-auto");
    doc.body().append_child(&sidebar.node())?;
    let editor = doc.create_element("textarea");
    doc.body().append_child(&editor.node())?;

    let queue = FrameQueue::new();
    let controller = AttachController::initialize(
        &doc.body(),
        AttachConfig::default(),
        Arc::new(ScrollbarOverlayFactory),
        DocumentChanges::new(),
        QueueScheduler::new(Arc::clone(&queue)),
    );
    info!(
        instances = controller.instance_count(),
        "initial scan complete"
    );

    for index in 0..panels {
        let panel = doc.create_element("div");
        panel.add_class("overflow-auto");
        panel.set_attribute("data-panel", index.to_string());
        doc.body().append_child(&panel.node())?;
    }
    doc.deliver_mutations();
    queue.run_frame();
    info!(
        instances = controller.instance_count(),
        panels, "panels enhanced after one scheduled pass"
    );

    sidebar.detach();
    doc.deliver_mutations();
    queue.run_frame();
    info!(
        instances = controller.instance_count(),
        "sidebar pruned after detachment"
    );

    controller.shutdown();
    info!(
        instances = controller.instance_count(),
        "controller shut down"
    );

    if print_metrics {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&registry.gather(), &mut buffer)
            .context("Failed to encode metrics")?;
        print!("{}", String::from_utf8_lossy(&buffer));
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;
    match cli.command {
        Commands::Demo { panels, metrics } => run_demo(panels, metrics),
    }
}
