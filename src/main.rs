use clap::{Parser, Subcommand};
use rrdb::config::ToolConfig;
use rrdb::plan::{RecordSet, filter_record_sets, plan_change};
use rrdb::StoreError;
use rrdb::store::{Record, RecordStore, RecordType};
use std::path::PathBuf;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Check and inspect declarative DNS zone data
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Tool configuration file
    #[arg(short, long, default_value = "config.toml")]
    config_file: PathBuf,

    /// Zone data directory, overriding the configuration
    #[arg(long)]
    zone_data: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load the zone data and verify every managed zone resolves
    Check,

    /// Print all records at and below a name
    Zone {
        fqdn: String,

        /// Default TTL, instead of the one from the configuration
        #[arg(long)]
        ttl: Option<u32>,

        /// Print JSON instead of zone file lines
        #[arg(long)]
        json: bool,
    },

    /// Print the records at exactly one name
    Records {
        fqdn: String,

        /// Only this record type
        #[arg(short = 't', long = "type")]
        rtype: Option<RecordType>,

        #[arg(long)]
        ttl: Option<u32>,

        #[arg(long)]
        json: bool,
    },

    /// Show the change that turns a provider's record sets into the zone
    Plan {
        /// Zone apex
        fqdn: String,

        /// JSON export of the provider's current record sets
        #[arg(long)]
        current: PathBuf,

        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = ToolConfig::from_file(&args.config_file)?;
    let directory = args
        .zone_data
        .clone()
        .unwrap_or_else(|| config.zone_data_directory.clone());
    let store = rrdb::load_directory(&directory)?;

    match args.command {
        Command::Check => check(&config, &store),
        Command::Zone { fqdn, ttl, json } => {
            let ttl = ttl.unwrap_or_else(|| config.ttl_for(&fqdn));
            let records = store
                .zone(&fqdn, ttl)
                .map_err(|e| explain(&store, &fqdn, e))?;
            print_records(&records, json)
        }
        Command::Records {
            fqdn,
            rtype,
            ttl,
            json,
        } => {
            let ttl = ttl.unwrap_or_else(|| config.ttl_for(&fqdn));
            let records = match rtype {
                Some(rtype) => store.get(&fqdn, rtype, ttl).map(|r| vec![r]),
                None => store.records(&fqdn, ttl),
            }
            .map_err(|e| explain(&store, &fqdn, e))?;
            print_records(&records, json)
        }
        Command::Plan {
            fqdn,
            current,
            json,
        } => {
            let content = std::fs::read_to_string(&current)
                .map_err(|e| format!("read {}: {}", current.display(), e))?;
            let sets: Vec<RecordSet> = serde_json::from_str(&content)?;
            let desired = store.zone(&fqdn, config.ttl_for(&fqdn))?;
            let change = plan_change(&desired, &filter_record_sets(&sets, &fqdn), &fqdn);

            if json {
                println!("{}", serde_json::to_string_pretty(&change)?);
            } else if change.is_empty() {
                info!(zone = %fqdn, "Nothing to change");
            } else {
                info!(
                    zone = %fqdn,
                    deletions = change.deletions.len(),
                    additions = change.additions.len(),
                    "Change planned"
                );
                print!("{}", change);
            }
            Ok(())
        }
    }
}

fn check(config: &ToolConfig, store: &RecordStore) -> Result<(), Box<dyn std::error::Error>> {
    if config.managed_zones.is_empty() {
        warn!("No managed zones configured");
    }

    debug!(names = ?store.names(), "Loaded names");

    let mut failures = 0usize;
    for zone in &config.managed_zones {
        match store.zone(&zone.fqdn, zone.default_ttl()) {
            Ok(records) => info!(zone = %zone.fqdn, records = records.len(), "Managed zone ok"),
            Err(e) => {
                error!("Managed zone {}: {}", zone.fqdn, explain(store, &zone.fqdn, e));
                failures += 1;
            }
        }
    }

    if failures > 0 {
        return Err(format!("{} managed zone(s) failed", failures).into());
    }
    info!("Looks good!");
    Ok(())
}

/// Point at the delegation that takes a name out of authority
fn explain(store: &RecordStore, fqdn: &str, err: StoreError) -> StoreError {
    if let StoreError::OutOfAuthority(_) = err {
        if let Ok(Some(point)) = store.delegation_point(fqdn) {
            warn!("{} is delegated at {}", fqdn, point);
        }
    }
    err
}

fn print_records(records: &[Record], json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(records)?);
    } else {
        for record in records {
            println!("{}", record);
        }
    }
    Ok(())
}
