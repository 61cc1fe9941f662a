// Enriches instrumentation-list datasets with semantic-convention categories.
// Usage:
//   Optional: SEMCONV_CONFIG_PATH (YAML configuration), GITHUB_TOKEN, SEMCONV_OUTPUT
//   cargo run --features github --bin enrich_instrumentation [output_path]

use enricher::configuration::Configuration;
use enricher::logging::init_logger;
use enricher::pipeline;
use tracing::{error, info};

fn main() {
    init_logger();

    let config = match Configuration::load() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let config = match std::env::args().nth(1) {
        Some(output) => config.with_output_file(output),
        None => config,
    };

    match pipeline::run(&config) {
        Ok(summary) => {
            info!(
                versions = ?summary.versions,
                entries = summary.entries,
                "successfully generated enriched data in {}",
                summary.output_file.display()
            );
        }
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}
