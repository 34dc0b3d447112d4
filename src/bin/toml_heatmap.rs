use anyhow::Context;
use clap::Parser;
use eldercare_heatmap::core::ConfigProvider;
use eldercare_heatmap::utils::{logger, validation::Validate};
use eldercare_heatmap::{EtlEngine, HeatmapPipeline, LocalStorage, TomlConfig};

#[derive(Parser)]
#[command(name = "toml-heatmap")]
#[command(about = "Eldercare heatmap generator driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "heatmap.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Dry run - show what would be processed without executing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 載入 TOML 配置
    let config = TomlConfig::from_file(&args.config)
        .with_context(|| format!("failed to load config file '{}'", args.config))?;

    // 初始化日誌
    if config.json_logs() {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting TOML-based heatmap generator");
    tracing::info!("📁 Configuration loaded from: {}", args.config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.exit_code());
    }

    tracing::info!("✅ Configuration loaded and validated successfully");

    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        perform_dry_run(&config);
        return Ok(());
    }

    // 決定監控設定
    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::current_dir();
    let pipeline = HeatmapPipeline::new(storage, config);
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Map generated successfully!");
            println!("✅ 地图已保存为 '{}'", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Heatmap generation failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            let exit_code = e.exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!(
        "  Pipeline: {} v{}",
        config.pipeline.name, config.pipeline.version
    );
    println!("  Input: {}", config.input_path());
    if let Some(sheet) = config.sheet_name() {
        println!("  Sheet: {}", sheet);
    }
    println!("  Output: {}/{}", config.output_path(), config.output_file());

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(config: &TomlConfig) {
    let options = config.map_options();
    let columns = config.columns();

    println!("🔍 Dry Run Analysis:");
    println!();

    println!("🔄 Column Mapping:");
    println!("  latitude  -> {}", columns.latitude);
    println!("  longitude -> {}", columns.longitude);
    println!("  capacity  -> {}", columns.capacity);
    println!("  name      -> {}", columns.name);
    println!("  address   -> {}", columns.address);
    println!("  category  -> {}", columns.category);
    println!("  phone     -> {}", columns.phone);

    println!();
    println!("🗺️ Map:");
    println!("  Title: {}", options.title);
    println!("  Center: [{}, {}], zoom {}", options.center.0, options.center.1, options.zoom);
    println!("  Tiles: {} ({})", options.tiles.name, options.tiles.url);

    println!();
    println!("🔥 Heat Layer '{}':", options.heatmap.layer_name);
    println!(
        "  radius {}, blur {}, min opacity {}, max {}",
        options.heatmap.radius,
        options.heatmap.blur,
        options.heatmap.min_opacity,
        options.heatmap.max_value
    );
    let gradient: Vec<String> = options
        .heatmap
        .gradient
        .iter()
        .map(|g| format!("{}: {}", g.stop, g.color))
        .collect();
    println!("  gradient {{{}}}", gradient.join(", "));

    println!();
    println!("📍 Markers '{}':", options.markers.layer_name);
    println!(
        "  color {}, fill opacity {}, popup max width {}px",
        options.markers.color, options.markers.fill_opacity, options.markers.popup_max_width
    );

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");
}
