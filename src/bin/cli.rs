use clap::Parser;
use hexmap::{FastNoiseSampler, HexGrid, MapConfig, MapGenerator, save_preview};
use std::path::PathBuf;

/// Генератор гексагональных карт
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Путь к конфигурационному файлу в формате TOML
    #[arg(short, long)]
    config: PathBuf,

    /// Сид генерации (перекрывает значение из конфигурации)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Путь для сохранения карты
    #[arg(short, long, default_value = "map.hexmap")]
    output: PathBuf,

    /// Путь для PNG-превью
    #[arg(short, long)]
    preview: Option<PathBuf>,

    /// Масштаб превью (пикселей на клетку)
    #[arg(long, default_value_t = 8)]
    scale: u32,

    /// Путь для JSON-отчёта о генерации
    #[arg(short, long)]
    report: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    println!("🔍 Загрузка конфигурации...");
    let mut config = MapConfig::from_toml_file(&cli.config)?;
    if let Some(seed) = cli.seed {
        config.generator.seed = Some(seed);
    }

    println!(
        "Генерация карты (размер: {}×{})...",
        config.grid.width, config.grid.height
    );
    let mut grid = HexGrid::new(&config.grid)?;
    let noise = FastNoiseSampler::new(&config.noise);
    let generator = MapGenerator::new(config.generator, &noise);
    let report = generator.generate(&mut grid)?;
    println!(
        "Сид {}: суша {} клеток, рек {}, массивов суши {}",
        report.seed, report.land_cells, report.river_count, report.landmasses
    );

    println!("Сохранение карты в {:?}", cli.output);
    grid.save(&cli.output)?;

    if let Some(path) = &cli.preview {
        println!("Сохранение превью в {path:?}");
        save_preview(&grid, cli.scale, path)?;
    }

    if let Some(path) = &cli.report {
        println!("Сохранение отчёта в {path:?}");
        std::fs::write(path, serde_json::to_string_pretty(&report)?)?;
    }

    println!("\nГотово!");
    Ok(())
}
