/*!
 * Feed Server - Main Entry Point
 *
 * Reads JSON requests from stdin, answers on stdout:
 * - `feed-server` or `feed-server s` process requests sequentially
 * - `feed-server p`                   process requests on the default consumer pool
 * - `feed-server <consumers>`         process requests on a pool of that size
 */

use std::io::{self, BufReader, BufWriter};
use tracing::{error, info};

use feed_server::{init_tracing, serve, ProducerExit, ServerConfig};

fn main() -> miette::Result<()> {
    // Initialize structured tracing
    init_tracing();

    let config = ServerConfig::from_args(std::env::args().skip(1))?.with_env_overrides()?;
    info!(
        mode = ?config.mode,
        reader_cap = config.reader_cap,
        duplicates = %config.duplicate_policy,
        "Feed server starting"
    );

    let input = BufReader::new(io::stdin().lock());
    let output = BufWriter::new(io::stdout());
    let report = serve(config, input, output)?;

    if report.exit == ProducerExit::DecodeFailed {
        error!(processed = report.processed, "Stopped on a malformed request");
        std::process::exit(1);
    }

    info!(processed = report.processed, "Feed server stopped");
    Ok(())
}
