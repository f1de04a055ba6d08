use std::collections::BTreeMap;
use std::net::IpAddr;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use zonecraft::config::ZoneConfig;
use zonecraft::error::Result;
use zonecraft::ops::{self, CreateZoneRequest, RecordRequest};
use zonecraft::rdata::registry;
use zonecraft::transfer::{self, TransferOptions};
use zonecraft::ZoneCraftError;

#[derive(Parser)]
#[command(name = "zonecraft", version, about = "DNS zone file management")]
struct Cli {
    /// Folder holding the managed zone files (overrides ZONECRAFT_ZONE_DIR)
    #[arg(long, global = true)]
    zone_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List all managed zones
    ListZones,
    /// Show one zone's summary
    GetZone { origin: String },
    /// Create a zone with its SOA and NS records
    CreateZone {
        origin: String,
        /// Zone administrator email, e.g. hostmaster@example.com
        #[arg(long)]
        email: String,
        /// Primary nameserver host
        #[arg(long)]
        primary_ns: String,
        /// Address for the primary nameserver's A record
        #[arg(long)]
        primary_ns_ip: Option<String>,
        #[arg(long, default_value_t = 3600)]
        soa_ttl: u32,
        #[arg(long, default_value_t = 3600)]
        ns_ttl: u32,
        #[arg(long, default_value_t = 3600)]
        a_ttl: u32,
        #[arg(long, default_value_t = 10800)]
        refresh: u32,
        #[arg(long, default_value_t = 3600)]
        retry: u32,
        #[arg(long, default_value_t = 604800)]
        expire: u32,
        #[arg(long, default_value_t = 3600)]
        minimum: u32,
    },
    /// Delete a zone and its backing file
    DeleteZone { origin: String },
    /// List records in a zone
    ListRecords {
        origin: String,
        /// Restrict to one owner name
        #[arg(long)]
        name: Option<String>,
        /// Restrict to one record type
        #[arg(long = "type")]
        rtype: Option<String>,
    },
    /// Create a record
    CreateRecord {
        origin: String,
        name: String,
        rtype: String,
        /// Record fields as key=value pairs, e.g. address=192.0.2.1
        #[arg(long = "data", value_parser = parse_key_value)]
        data: Vec<(String, String)>,
        #[arg(long)]
        ttl: Option<u32>,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Replace a record at its index within the set
    UpdateRecord {
        origin: String,
        name: String,
        rtype: String,
        index: usize,
        #[arg(long = "data", value_parser = parse_key_value)]
        data: Vec<(String, String)>,
        #[arg(long)]
        ttl: Option<u32>,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Delete the record matching the given data exactly
    DeleteRecord {
        origin: String,
        name: String,
        rtype: String,
        #[arg(long = "data", value_parser = parse_key_value)]
        data: Vec<(String, String)>,
    },
    /// Pull a zone from an authoritative server via AXFR
    Transfer {
        origin: String,
        /// Server address; resolved from the zone's SOA when omitted
        #[arg(long)]
        nameserver: Option<IpAddr>,
        #[arg(long, default_value_t = 53)]
        port: u16,
        /// Query over UDP instead of TCP
        #[arg(long)]
        udp: bool,
        #[arg(long, default_value_t = 60)]
        timeout_secs: u64,
    },
    /// List the supported record types and their fields
    ListTypes,
}

fn parse_key_value(s: &str) -> std::result::Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{s}'"))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| ZoneCraftError::Internal(format!("response serialization: {e}")))?;
    println!("{text}");
    Ok(())
}

fn data_map(pairs: Vec<(String, String)>) -> BTreeMap<String, String> {
    pairs.into_iter().collect()
}

fn run(cli: Cli) -> Result<()> {
    let mut config = ZoneConfig::from_env()?;
    if let Some(dir) = &cli.zone_dir {
        config = config.with_zone_dir(dir);
    }

    match cli.command {
        Command::ListZones => print_json(&ops::list_zones(&config)?),
        Command::GetZone { origin } => print_json(&ops::get_zone(&config, &origin)?),
        Command::CreateZone {
            origin,
            email,
            primary_ns,
            primary_ns_ip,
            soa_ttl,
            ns_ttl,
            a_ttl,
            refresh,
            retry,
            expire,
            minimum,
        } => {
            let req = CreateZoneRequest {
                origin,
                soa_ttl,
                ns_ttl,
                a_ttl,
                admin_email: email,
                refresh,
                retry,
                expire,
                minimum,
                primary_ns,
                primary_ns_ip,
            };
            print_json(&ops::create_zone(&config, &req)?)
        }
        Command::DeleteZone { origin } => {
            let deleted = ops::delete_zone(&config, &origin)?;
            print_json(&serde_json::json!({ "deleted": deleted }))
        }
        Command::ListRecords {
            origin,
            name,
            rtype,
        } => print_json(&ops::get_records(
            &config,
            &origin,
            name.as_deref(),
            rtype.as_deref(),
        )?),
        Command::CreateRecord {
            origin,
            name,
            rtype,
            data,
            ttl,
            comment,
        } => {
            let req = RecordRequest {
                name,
                rtype,
                ttl,
                data: data_map(data),
                comment,
            };
            print_json(&ops::create_record(&config, &origin, &req)?)
        }
        Command::UpdateRecord {
            origin,
            name,
            rtype,
            index,
            data,
            ttl,
            comment,
        } => {
            let req = RecordRequest {
                name,
                rtype,
                ttl,
                data: data_map(data),
                comment,
            };
            print_json(&ops::update_record(&config, &origin, &req, index)?)
        }
        Command::DeleteRecord {
            origin,
            name,
            rtype,
            data,
        } => {
            let req = RecordRequest {
                name,
                rtype,
                ttl: None,
                data: data_map(data),
                comment: None,
            };
            ops::delete_record(&config, &origin, &req)?;
            print_json(&serde_json::json!({ "deleted": true }))
        }
        Command::Transfer {
            origin,
            nameserver,
            port,
            udp,
            timeout_secs,
        } => {
            let options = TransferOptions {
                nameserver,
                port,
                use_udp: udp,
                timeout: Duration::from_secs(timeout_secs),
            };
            print_json(&transfer::transfer_zone(&config, &origin, &options)?)
        }
        Command::ListTypes => print_json(&registry::list_types()),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        error!(kind = ?e.kind(), "{e}");
        std::process::exit(1);
    }
}
