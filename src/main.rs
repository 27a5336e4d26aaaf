use std::error::Error;

use avature_scraper::{logger, orchestrator, RunConfig};
use log::{error, info};

fn main() -> Result<(), Box<dyn Error>> {
    logger::init();
    info!("============================================================");
    info!("AVATURE SCRAPER");
    info!("============================================================");

    let config = RunConfig::default();

    if !config.sites_file.exists() {
        error!(
            "Site list {:?} not found. One career-site URL per line is expected.",
            config.sites_file
        );
        return Ok(());
    }

    orchestrator::run(config)?;
    Ok(())
}
