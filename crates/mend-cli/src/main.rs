//! `mend` binary

use mend_cli::{build_cli, init_tracing, run};

#[tokio::main]
async fn main() {
    let matches = build_cli().get_matches();
    init_tracing(matches.get_flag("verbose"));

    match run(&matches, |key| std::env::var(key).ok()).await {
        Ok(report) => {
            println!("{report}");
            std::process::exit(if report.has_failures() { 1 } else { 0 });
        }
        Err(err) => {
            tracing::error!(error = %err, "run aborted");
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    }
}
