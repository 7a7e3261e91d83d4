use bakery_tasks::utils::logger;
use bakery_tasks::{app, CliConfig};
use clap::Parser;
use std::io::Write;

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    if config.log_json {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }
    tracing::debug!("CLI config: {:?}", config);

    let exit_code = match app::execute(&config).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(
                "❌ {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            e.exit_code()
        }
    };

    let _ = std::io::stdout().flush();
    std::process::exit(exit_code);
}
