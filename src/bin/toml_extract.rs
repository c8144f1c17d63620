use anyhow::Context;
use clap::Parser;
use roof_order_etl::core::ConfigProvider;
use roof_order_etl::utils::{logger, validation::Validate};
use roof_order_etl::{EtlEngine, GeminiClient, LocalStorage, TomlConfig, WorkOrderPipeline};

#[derive(Parser)]
#[command(name = "toml-extract")]
#[command(about = "Work-order extraction driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "roof-order.toml")]
    config: String,

    /// Override the input PDF from the config
    #[arg(short, long)]
    input: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Show the resolved configuration and prompt without calling the API
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    // 載入 TOML 配置
    let mut config = TomlConfig::from_file(&args.config)
        .with_context(|| format!("failed to load config file '{}'", args.config))?;

    if config.json_logs() {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 應用命令列覆蓋設定
    if let Some(input) = args.input {
        tracing::info!("🔧 Input overridden to: {}", input);
        config.input.path = input;
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(e.exit_code());
    }

    display_config_summary(&config, &args.config);

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    let print_output = config.print_output();

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No request will be sent");
        let client = GeminiClient::new(config.api_base(), "", config.model(), config.request_timeout())?;
        let pipeline = WorkOrderPipeline::new(LocalStorage::default(), config, client);
        let prompt = pipeline.build_prompt().await?;
        println!("{}", prompt);
        return Ok(());
    }

    let client = GeminiClient::from_config(&config)?;
    let pipeline = WorkOrderPipeline::new(LocalStorage::default(), config, client);
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output) => {
            tracing::info!("✅ Extraction Successful!");
            if print_output {
                println!("{}", output.json_output);
            }
            eprintln!("💾 Saved to {}", output.output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Extraction failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            if let Some(raw) = e.raw_output() {
                eprintln!("\nRaw Output:\n{}", raw);
            }
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, path: &str) {
    eprintln!("📋 Configuration Summary ({}):", path);
    eprintln!("  Input: {}", config.input_path());
    eprintln!("  Output: {}/{}", config.output_path(), config.output_file());
    eprintln!(
        "  Model: {} (fallback: {})",
        config.model(),
        config.fallback_model().unwrap_or("none")
    );
    eprintln!("  Timeout: {}s", config.timeout_seconds());
    eprintln!("  Extra hints: {}", config.extra_hints().len());
    eprintln!();
}
