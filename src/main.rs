use std::path::PathBuf;

use anyhow::anyhow;
use clap::Parser;
use dashkit::app::SiteOptionsApp;
use dashkit::data::loader;
use dashkit::state::AppState;
use eframe::egui;

#[derive(Parser)]
#[command(author, version, about = "BiUrbs interactive development simulator")]
struct Args {
    /// Option table (.csv, .json or .parquet)
    #[arg(default_value = "economic_data.csv")]
    data: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    // Nothing is shown unless the table loads.
    let table = loader::load_file(&args.data)?;
    log::info!(
        "Loaded {} development options from {}",
        table.len(),
        args.data.display()
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "BiUrbs Development Simulator",
        options,
        Box::new(move |_cc| Ok(Box::new(SiteOptionsApp::new(AppState::new(table))))),
    )
    .map_err(|e| anyhow!("running the dashboard window: {e}"))
}
