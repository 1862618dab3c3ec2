use clap::Parser;
use spool_tracker::adapters::{JsonLinesSink, LogNotificationSink, TomlSettingsStore};
use spool_tracker::domain::ports::NotificationSink;
use spool_tracker::utils::error::ErrorSeverity;
use spool_tracker::utils::{logger, validation::Validate};
use spool_tracker::{
    AccountingService, ApiResponse, CliCommand, CliConfig, JobCompletion, TrackerConfig,
    TrackerError,
};
use std::sync::Arc;
use tokio::io::BufReader;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 載入配置
    let mut config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", cli.config_path(), e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };
    cli.apply_overrides(&mut config);

    // 初始化日誌
    if config.logging.format == "json" {
        logger::init_json_logger(cli.verbose, &config.logging.level);
    } else {
        logger::init_cli_logger_with_level(cli.verbose, &config.logging.level);
    }

    tracing::info!("Starting spool-tracker");
    if cli.verbose {
        tracing::debug!("Config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    // 只有 events 模式把狀態更新輸出到 stdout，其餘命令的 stdout 只有回應本身
    let sink: Arc<dyn NotificationSink> = if cli.command.streams_notifications() {
        Arc::new(JsonLinesSink)
    } else {
        Arc::new(LogNotificationSink)
    };

    let service = match build_service(&config, sink).await {
        Ok(service) => service,
        Err(e) => exit_with(&e),
    };

    match run(&service, &cli.command).await {
        Ok(Some(response)) => {
            println!("{}", response.body);
            if !response.status.is_success() {
                std::process::exit(match response.status.code() {
                    403 => 3,
                    500 => 4,
                    _ => 2,
                });
            }
        }
        Ok(None) => {}
        Err(e) => exit_with(&e),
    }

    Ok(())
}

async fn build_service(
    config: &TrackerConfig,
    sink: Arc<dyn NotificationSink>,
) -> spool_tracker::Result<AccountingService> {
    let store = TomlSettingsStore::new(&config.storage.settings_path);
    tracing::debug!("Using settings file {}", store.path().display());

    AccountingService::init(
        Arc::new(store),
        sink,
        Arc::new(config.authorizer()),
        Arc::new(config.resolver()),
        config.extractor(),
    )
    .await
}

async fn run(
    service: &AccountingService,
    command: &CliCommand,
) -> spool_tracker::Result<Option<ApiResponse>> {
    if let Some((name, data)) = command.to_api_command() {
        return Ok(Some(service.handle_command(&name, &data).await));
    }

    match command {
        CliCommand::State => Ok(Some(service.handle_get().await)),
        CliCommand::Command { name, data } => {
            let data = serde_json::from_str(data)?;
            Ok(Some(service.handle_command(name, &data).await))
        }
        CliCommand::JobDone { origin, path } => {
            let job = JobCompletion {
                origin: origin.clone(),
                path: path.clone(),
            };
            match service.on_job_completed(&job).await {
                Some(step) => tracing::info!(
                    "✅ Recorded {:.2}g, {:.2}g left on spool",
                    step.used_g,
                    step.new_g
                ),
                None => tracing::info!("No filament usage recorded for {}", path),
            }
            Ok(None)
        }
        CliCommand::Events => {
            run_event_loop(service).await?;
            Ok(None)
        }
        _ => Ok(None),
    }
}

/// 讀取 stdin 的主機事件直到關閉或收到 Ctrl-C；無論結果如何都會 flush
async fn run_event_loop(service: &AccountingService) -> spool_tracker::Result<()> {
    tracing::info!("📡 Listening for host events on stdin");
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Ctrl-C handler unavailable: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let consumed = service
        .consume_host_events(BufReader::new(tokio::io::stdin()), shutdown)
        .await;
    let flushed = service.flush().await;

    let stats = consumed?;
    tracing::info!(
        "Processed {} host events ({} accounted, {} skipped)",
        stats.handled,
        stats.accounted,
        stats.skipped
    );
    flushed
}

fn exit_with(e: &TrackerError) -> ! {
    tracing::error!(
        "❌ spool-tracker failed: {} (Kind: {:?}, Severity: {:?})",
        e,
        e.kind(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
