use clap::Parser;
use realmgen::{ConverterParams, MapDataset, convert};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Конвертер карт в иерархию титулов для Chronicles of Realms
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Путь к конфигурационному файлу в формате TOML (без него — параметры по умолчанию)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Набор данных карты в формате JSON
    #[arg(short, long)]
    map: PathBuf,

    /// Путь для сохранения результата (по умолчанию: ./realm.json)
    #[arg(short, long, default_value = "realm.json")]
    output: PathBuf,

    /// Переопределяет сид из конфигурации
    #[arg(short, long)]
    seed: Option<u64>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let cli = Cli::parse();

    println!("🔍 Загрузка конфигурации...");
    let mut params = match &cli.config {
        Some(path) => ConverterParams::from_toml_file(path)?,
        None => ConverterParams::default(),
    };
    if let Some(seed) = cli.seed {
        params.seed = seed;
    }

    println!("Чтение карты {}...", cli.map.display());
    let dataset = MapDataset::from_json_file(&cli.map)?;

    println!("Конвертация (сид {})...", params.seed);
    let output = convert(&dataset, &params)?;

    println!("Сохранение в {}", cli.output.display());
    output.to_json_file(&cli.output)?;

    let report = &output.report;
    println!(
        "\nГотово! {} баронств, {} графств, {} герцогств, {} королевств, {} империй, {} персонажей.",
        report.baronies,
        report.counties,
        report.duchies,
        report.kingdoms,
        report.empires,
        report.characters
    );
    if !report.wasteland_states.is_empty() {
        println!("Пустоши: {:?}", report.wasteland_states);
    }
    Ok(())
}
