use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn default_filter(verbose: bool, level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("spool_tracker=debug,info")
        } else {
            EnvFilter::new(format!("spool_tracker={}", level))
        }
    })
}

pub fn init_cli_logger(verbose: bool) {
    init_cli_logger_with_level(verbose, "info");
}

pub fn init_cli_logger_with_level(verbose: bool, level: &str) {
    // 日誌輸出到 stderr，stdout 保留給命令回應的 JSON
    tracing_subscriber::registry()
        .with(default_filter(verbose, level))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

pub fn init_json_logger(verbose: bool, level: &str) {
    tracing_subscriber::registry()
        .with(default_filter(verbose, level))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .json(), // host processes parse structured logs
        )
        .init();
}
