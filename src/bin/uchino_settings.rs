// メーター監視設定ファイルを検査する。
// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: 2025 Akihiro Yamamoto <github.com/ak1211>
//
use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uchinometer::Settings;

mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

/// メーター監視設定ファイルを読み込んで検査する
#[derive(Parser, Debug)]
#[command(name = "uchino_settings")]
#[command(version, about, long_about = None)]
struct Cli {
    /// 設定ファイル名(拡張子 .toml ならTOML形式)
    #[arg(short = 'S', long, env = "SETTINGS_FILE", default_value = "settings.py")]
    settings_file: PathBuf,

    /// systemd-journaldにログ出力する
    #[arg(long)]
    journald: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// 設定ファイルを検査する
    Check,
    /// 読み込んだ設定を表示する
    Show(ShowArgs),
    /// rtlamr のコマンドラインを表示する
    Command,
    /// RTLAMR と RTL_TCP が実行できるか確かめる
    Verify,
}

#[derive(Debug, Args)]
struct ShowArgs {
    /// 出力形式
    #[arg(short = 'f', long, value_enum, default_value_t = Format::Toml)]
    format: Format,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Toml,
    Json,
}

/// tracingの設定
fn init_tracing(journald: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    let fmt_layer = || {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_timer(tracing_subscriber::fmt::time::LocalTime::rfc_3339())
            .with_file(false)
            .with_line_number(false)
            .with_ansi(false)
    };

    if !journald {
        registry.with(fmt_layer()).init();
        return;
    }
    // systemd-journaldに接続
    match tracing_journald::layer() {
        // journaldにログ出力する
        Ok(journald_layer) => registry.with(journald_layer).init(),
        // journaldが使えないので、標準エラー出力にログ出力する
        Err(e) => {
            registry.with(fmt_layer()).init();
            tracing::error!("couldn't connect to journald: {}", e)
        }
    }
}

/// 設定ファイルを検査する
fn exec_check(settings: &Settings) -> anyhow::Result<()> {
    if settings.watches_all_meters() {
        tracing::info!("WATCHED_METERS: all meters");
    } else {
        let ids = settings
            .watched_meters()
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>();
        tracing::info!("WATCHED_METERS: {}", ids.join(", "));
    }
    let msgtype = settings
        .msgtype()
        .iter()
        .map(|m| m.to_string())
        .collect::<Vec<_>>();
    tracing::info!("MSGTYPE: {}", msgtype.join(", "));
    tracing::info!(
        "single mode: {} (RTLAMR_SINGLE_MODE={}, RTLAMR_LOW_CPU={})",
        settings.single_mode(),
        settings.rtlamr_single_mode(),
        settings.rtlamr_low_cpu()
    );
    tracing::info!("update period: {:?}", settings.meter_update_period());
    tracing::info!("units: {}", settings.units());
    match settings.mqtt_credentials() {
        Some(credentials) => tracing::info!(
            "MQTT: {}:{} as {:?}",
            settings.mqtt_host(),
            settings.mqtt_port(),
            credentials
        ),
        None => tracing::info!(
            "MQTT: {}:{} without authentication",
            settings.mqtt_host(),
            settings.mqtt_port()
        ),
    }
    Ok(println!("OK"))
}

/// 読み込んだ設定を表示する
fn exec_show(settings: &Settings, args: &ShowArgs) -> anyhow::Result<()> {
    let text = match args.format {
        Format::Toml => toml::to_string_pretty(settings)?,
        Format::Json => serde_json::to_string_pretty(settings)?,
    };
    Ok(println!("{}", text.trim_end()))
}

/// rtlamr のコマンドラインを表示する
fn exec_command(settings: &Settings) -> anyhow::Result<()> {
    let mut words = vec![settings.rtlamr_path().display().to_string()];
    words.extend(settings.rtlamr_args());
    Ok(println!("{}", words.join(" ")))
}

/// RTLAMR と RTL_TCP が実行できるか確かめる
fn exec_verify(settings: &Settings) -> anyhow::Result<()> {
    settings.verify_executables()?;
    Ok(println!(
        "{} and {} are executable.",
        settings.rtlamr_path().display(),
        settings.rtl_tcp_path().display()
    ))
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let settings = Settings::load(&cli.settings_file).with_context(|| {
        format!(r#"Failed to load "{}"."#, cli.settings_file.display())
    })?;

    match &cli.command {
        Commands::Check => exec_check(&settings),
        Commands::Show(args) => exec_show(&settings, args),
        Commands::Command => exec_command(&settings),
        Commands::Verify => exec_verify(&settings),
    }
}

fn main() -> ExitCode {
    let _ = dotenv::dotenv();

    // コマンドライン引数
    let cli = Cli::parse();

    init_tracing(cli.journald);

    // プログラムの情報
    let git_head_ref = built_info::GIT_HEAD_REF.unwrap_or_default();
    tracing::debug!(
        "{} / {}{}",
        built_info::PKG_NAME,
        built_info::PKG_VERSION,
        built_info::GIT_COMMIT_HASH_SHORT
            .map(|s| format!(" ({s} - {git_head_ref})"))
            .unwrap_or_default()
    );

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
