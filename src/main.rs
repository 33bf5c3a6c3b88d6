//! subexport binary
use {color_eyre::eyre::Result, subexport::app::ExportApp};

#[tokio::main]
async fn main() -> Result<()> {
    ExportApp::init()?.run().await
}
