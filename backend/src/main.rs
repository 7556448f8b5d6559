//! Myshop Feed CLI - read Myshop XML product exports
//!
//! # Main Commands
//!
//! ```bash
//! myshop-feed parse export.xml -d products.json             # Print all products as JSON
//! myshop-feed parse export.xml --stream                     # Same, pulling one at a time
//! myshop-feed import export.xml -s products.jsonl           # Validate and save products
//! ```
//!
//! # Debug Commands (for development)
//!
//! ```bash
//! myshop-feed normalize export.xml      # Convert an export to UTF-8
//! myshop-feed descriptor products.json  # Show grouping and domain fields
//! myshop-feed group records.json -f grp # Re-tag variants of saved records
//! ```

use clap::{Parser, Subcommand};
use myshop_feed::{
    normalize_file, required_fields_schema, tag_variants, FeedConfig, JsonLinesStore,
    ProductList, ProductReader, ProductRecord, RecordValidator,
};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "myshop-feed")]
#[command(about = "Read Myshop tabular XML product exports", long_about = None)]
struct Cli {
    /// Print debug log entries
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse an export and output its products as JSON
    Parse {
        /// Input XML export
        input: PathBuf,

        /// Product list descriptor (default: MYSHOP_FEED_DESCRIPTOR)
        #[arg(short, long)]
        descriptor: Option<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pull records one at a time, printing one JSON object per line
        #[arg(long)]
        stream: bool,

        /// Convert the export to UTF-8 first
        #[arg(long)]
        normalize: bool,
    },

    /// Validate products and save them to a JSON-lines store
    Import {
        /// Input XML export
        input: PathBuf,

        /// JSON-lines file to append products to
        #[arg(short, long)]
        store: PathBuf,

        /// Product list descriptor (default: MYSHOP_FEED_DESCRIPTOR)
        #[arg(short, long)]
        descriptor: Option<PathBuf>,

        /// Convert the export to UTF-8 first
        #[arg(long)]
        normalize: bool,
    },

    /// Convert an export to UTF-8 in place
    Normalize {
        /// Input XML export
        input: PathBuf,

        /// Skip files of this many bytes or more (default: MYSHOP_FEED_NORMALIZE_LIMIT)
        #[arg(short, long)]
        limit: Option<u64>,
    },

    /// Show what a product list descriptor configures
    Descriptor {
        /// Descriptor JSON file
        path: PathBuf,
    },

    /// Re-tag variants of product records read from JSON
    Group {
        /// Input JSON file (array of products)
        input: PathBuf,

        /// Grouping field
        #[arg(short, long)]
        field: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = FeedConfig::from_env();
    config.verbose |= cli.verbose;
    myshop_feed::logs::LOG_BROADCASTER.set_verbose(config.verbose);

    let result = match cli.command {
        Commands::Parse {
            input,
            descriptor,
            output,
            stream,
            normalize,
        } => cmd_parse(
            &config,
            &input,
            descriptor.as_deref(),
            output.as_deref(),
            stream,
            normalize,
        ),

        Commands::Import {
            input,
            store,
            descriptor,
            normalize,
        } => cmd_import(&config, &input, &store, descriptor.as_deref(), normalize),

        Commands::Normalize { input, limit } => {
            cmd_normalize(&input, limit.unwrap_or(config.normalize_limit))
        }

        Commands::Descriptor { path } => cmd_descriptor(&path),

        Commands::Group {
            input,
            field,
            output,
        } => cmd_group(&input, field.as_deref(), output.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn load_descriptor(
    config: &FeedConfig,
    path: Option<&Path>,
) -> Result<ProductList, Box<dyn std::error::Error>> {
    match path.or(config.descriptor_path.as_deref()) {
        Some(p) => {
            eprintln!("📋 Descriptor: {}", p.display());
            Ok(ProductList::from_file(p)?)
        }
        None => {
            eprintln!("⚠️  No descriptor given, products will not be grouped");
            Ok(ProductList::default())
        }
    }
}

fn open_reader(
    config: &FeedConfig,
    input: &Path,
    list: &ProductList,
    normalize: bool,
) -> Result<ProductReader, Box<dyn std::error::Error>> {
    if normalize {
        let (reader, outcome) = ProductReader::open_normalized(input, list, config)?;
        eprintln!("   Encoding: {:?}", outcome);
        Ok(reader)
    } else {
        Ok(ProductReader::with_config(input, list, config)?)
    }
}

fn cmd_parse(
    config: &FeedConfig,
    input: &Path,
    descriptor: Option<&Path>,
    output: Option<&Path>,
    stream: bool,
    normalize: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing export: {}", input.display());

    let list = load_descriptor(config, descriptor)?;
    let mut reader = open_reader(config, input, &list, normalize)?;

    if stream {
        let mut out: Box<dyn Write> = match output {
            Some(p) => Box::new(BufWriter::new(fs::File::create(p)?)),
            None => Box::new(io::stdout().lock()),
        };
        let mut count = 0;
        while let Some(record) = reader.next_record()? {
            serde_json::to_writer(&mut out, &record)?;
            out.write_all(b"\n")?;
            count += 1;
        }
        out.flush()?;
        eprintln!("   Columns: {}", reader.schema().names().join(", "));
        eprintln!("✅ Streamed {} products", count);
    } else {
        let products = reader.collect_products()?;
        let groups = products.iter().filter(|p| !p.is_variant).count();
        eprintln!("   Columns: {}", reader.schema().names().join(", "));
        eprintln!("✅ Parsed {} products in {} groups", products.len(), groups);
        let json = serde_json::to_string_pretty(&products)?;
        write_output(&json, output)?;
    }

    Ok(())
}

fn cmd_import(
    config: &FeedConfig,
    input: &Path,
    store_path: &Path,
    descriptor: Option<&Path>,
    normalize: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📥 Importing export: {}", input.display());

    let list = load_descriptor(config, descriptor)?;
    let validator = RecordValidator::new(&list)?;
    let mut store = JsonLinesStore::new(store_path, validator);
    let mut reader = open_reader(config, input, &list, normalize)?;

    let stats = reader.import(&mut store)?;

    eprintln!("\n📊 Results:");
    eprintln!("   ✅ Saved: {}", stats.persisted);
    if stats.invalid > 0 {
        eprintln!("   ❌ Invalid: {}", stats.invalid);
    }
    if stats.failed > 0 {
        eprintln!("   ⚠️  Failed: {}", stats.failed);
    }
    eprintln!("   💾 Store: {}", store.path().display());
    println!("{}", stats.persisted);

    Ok(())
}

fn cmd_normalize(input: &Path, limit: u64) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("🔤 Normalizing: {}", input.display());
    let outcome = normalize_file(input, limit)?;
    eprintln!("✅ {:?}", outcome);
    Ok(())
}

fn cmd_descriptor(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let list = ProductList::from_file(path)?;

    println!("📋 Product list ({} fields)\n", list.fields.len());
    if let Some(shop) = list.shop_id {
        println!("  Shop: {}", shop);
    }
    println!(
        "  Grouping field: {}",
        list.grouping_field().unwrap_or("(none)")
    );
    println!("  Domain fields: {}", list.domain_fields().join(", "));
    println!("  Required fields: {}", list.required_fields().join(", "));
    println!("\nValidation schema:");
    println!(
        "{}",
        serde_json::to_string_pretty(&required_fields_schema(&list))?
    );
    Ok(())
}

fn cmd_group(
    input: &Path,
    field: Option<&str>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📦 Grouping: {}", input.display());

    let content = fs::read_to_string(input)?;
    let records: Vec<ProductRecord> = serde_json::from_str(&content)?;
    eprintln!("   {} products", records.len());

    let tagged = tag_variants(records, field);
    let groups = tagged.iter().filter(|r| !r.is_variant).count();
    eprintln!("   {} groups", groups);

    let json = serde_json::to_string_pretty(&tagged)?;
    write_output(&json, output)?;

    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
