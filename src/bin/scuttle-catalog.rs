use miette::{IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;

use scuttle_catalog::{AttrType, AttributeSpec, Database, DatabaseConfig};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("scuttle_catalog=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(false)
                .context_lines(3)
                .tab_width(4)
                .break_words(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    miette::set_panic_hook();

    init_logging();

    // Optional data directory, in memory otherwise
    let config = match std::env::args().nth(1) {
        Some(dir) => DatabaseConfig::new(dir),
        None => DatabaseConfig::in_memory(),
    };

    let mut db = Database::open(&config)?;

    let employee = [
        AttributeSpec::new("id", AttrType::Integer, 4),
        AttributeSpec::new("name", AttrType::String, 20),
        AttributeSpec::new("salary", AttrType::Float, 4),
    ];
    db.create_relation("Employee", &employee)?;

    println!("{}\n", db.describe_all()?);
    println!("{}\n", db.describe("Employee")?);

    if let Err(err) = db.create_relation("Employee", &employee) {
        println!("{:?}", miette::Report::new(err));
    }

    db.destroy_relation("Employee")?;
    println!("{}", db.describe_all()?);

    Ok(())
}
