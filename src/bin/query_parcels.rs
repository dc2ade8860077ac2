use parcel_query::{
    Config, FilterSpec, JsonOptions, ParcelError, ParcelTable, create_parcels_table,
};
use tracing_subscriber::EnvFilter;

const USAGE: &str =
    "Usage: query_parcels [--csv] [--init] [--include-geometry] [key=value ...]";

fn main() {
    init_logging();

    if let Err(err) = run() {
        match err {
            RunError::Usage(msg) => eprintln!("{msg}\n{USAGE}"),
            RunError::Config(err) => eprintln!("query_parcels failed: {err}"),
            RunError::Fetch(err) => {
                let body = serde_json::json!({
                    "error": "Failed to fetch parcels",
                    "detail": err.to_string(),
                });
                eprintln!("{body}");
            }
        }
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

enum RunError {
    Usage(String),
    Config(ParcelError),
    Fetch(ParcelError),
}

fn run() -> Result<(), RunError> {
    let mut csv = false;
    let mut init = false;
    let mut options = JsonOptions::default();
    let mut pairs = Vec::new();

    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--csv" => csv = true,
            "--init" => init = true,
            "--include-geometry" => options.include_geometry = true,
            _ => {
                let (key, value) = arg
                    .split_once('=')
                    .ok_or_else(|| RunError::Usage(format!("unexpected argument: {arg}")))?;
                pairs.push((key.to_string(), value.to_string()));
            }
        }
    }

    let config = Config::from_env().map_err(RunError::Config)?;
    let conn = rusqlite::Connection::open(&config.database_path)
        .map_err(|err| RunError::Config(err.into()))?;
    if init {
        create_parcels_table(&conn, &config.parcel_table)
            .map_err(|err| RunError::Config(err.into()))?;
    }

    let spec = FilterSpec::from_query(pairs);
    let table = ParcelTable::new(&conn, config.parcel_table.as_str());

    if csv {
        let body = table.export_csv(&spec).map_err(RunError::Fetch)?;
        print!("{body}");
    } else {
        let rows = table.read_json(&spec, options).map_err(RunError::Fetch)?;
        let rows: Vec<serde_json::Value> =
            rows.into_iter().map(serde_json::Value::Object).collect();
        let body =
            serde_json::to_string_pretty(&rows).map_err(|err| RunError::Fetch(err.into()))?;
        println!("{body}");
    }

    Ok(())
}
