use anyhow::Context;
use clap::Parser;
use dc_designer::app::{build_service, commands};
use dc_designer::utils::{logger, validation::Validate};
use dc_designer::{CliConfig, DesignerError, TomlConfig};
use std::path::Path;

const DEFAULT_CONFIG: &str = "dc-designer.toml";

fn load_config(cli: &CliConfig) -> anyhow::Result<TomlConfig> {
    // 預設設定檔不存在時使用預設值
    if cli.config == DEFAULT_CONFIG && !Path::new(&cli.config).exists() {
        return Ok(TomlConfig::default());
    }
    TomlConfig::from_file(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config))
}

fn report(e: &DesignerError) -> ! {
    tracing::error!(
        "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();
    let config = load_config(&cli)?;

    // 初始化日誌
    logger::init_logger(&config.logging, cli.verbose);

    tracing::info!("Starting dc-designer");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
        tracing::debug!("TOML config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        report(&e);
    }

    let service = match build_service(&config).await {
        Ok(service) => service,
        Err(e) => report(&e),
    };

    match commands::execute(&service, cli.command).await {
        Ok(output) => {
            let rendered =
                serde_json::to_string_pretty(&output).context("failed to render command output")?;
            println!("{}", rendered);
            Ok(())
        }
        Err(e) => report(&e),
    }
}
