use clap::Parser;
use roof_order_etl::core::ConfigProvider;
use roof_order_etl::utils::{logger, validation::Validate};
use roof_order_etl::{CliConfig, EtlEngine, EtlError, GeminiClient, LocalStorage, WorkOrderPipeline};

fn report_failure(e: &EtlError) -> ! {
    tracing::error!(
        "❌ Extraction failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    if let Some(raw) = e.raw_output() {
        eprintln!("\nRaw Output:\n{}", raw);
    }
    eprintln!("💡 {}", e.recovery_suggestion());

    std::process::exit(e.exit_code());
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env 需在解析參數前載入，GOOGLE_API_KEY 才能被 clap 讀到
    let _ = dotenvy::dotenv();
    let config = CliConfig::parse();

    if config.json_logs {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting roof-order-etl");
    tracing::debug!("CLI config: {:?}", config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        report_failure(&e);
    }

    let monitor_enabled = config.monitor;
    let dry_run = config.dry_run;
    let quiet = config.quiet;

    let client = if dry_run {
        // dry run 不需要 key，也不會送出請求
        GeminiClient::new(
            config.api_base(),
            "",
            config.model(),
            config.request_timeout(),
        )
    } else {
        GeminiClient::from_config(&config)
    };
    let client = match client {
        Ok(client) => client,
        Err(e) => report_failure(&e),
    };

    let pipeline = WorkOrderPipeline::new(LocalStorage::default(), config, client);

    if dry_run {
        tracing::info!("🔍 DRY RUN MODE - the prompt is printed and no request is sent");
        match pipeline.build_prompt().await {
            Ok(prompt) => println!("{}", prompt),
            Err(e) => report_failure(&e),
        }
        return Ok(());
    }

    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output) => {
            tracing::info!("✅ Extraction Successful!");
            if !quiet {
                println!("{}", output.json_output);
            }
            eprintln!("💾 Saved to {}", output.output_path);
        }
        Err(e) => report_failure(&e),
    }

    Ok(())
}
