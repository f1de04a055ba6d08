//! Inbound zone transfer: pull a full zone from an authoritative server via
//! AXFR and materialize it as a managed zone file.

use std::io::{Read, Write};
use std::net::{IpAddr, SocketAddr, TcpStream, UdpSocket};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::ZoneConfig;
use crate::dns::enums::{RecordClass, RecordType};
use crate::dns::name;
use crate::dns::wire::{self, Message};
use crate::error::{Result, ZoneCraftError};
use crate::ops::{self, ZoneResponse};
use crate::rdata::registry;
use crate::zone::record::{RRset, Rdata};
use crate::zone::store::ZoneStore;

const MAX_UDP_RESPONSE: usize = 65535;

#[derive(Debug, Clone)]
pub struct TransferOptions {
    /// Server to transfer from; resolved from the zone's SOA when unset
    pub nameserver: Option<IpAddr>,
    pub port: u16,
    /// Ask over UDP instead of the usual TCP stream
    pub use_udp: bool,
    pub timeout: Duration,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            nameserver: None,
            port: 53,
            use_udp: false,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Resolution seam for locating a zone's primary nameserver.
pub trait SoaResolver {
    /// The MNAME of the zone's SOA record.
    fn soa_mname(&self, zone: &str) -> Result<String>;
    /// An address for a nameserver host.
    fn host_addr(&self, host: &str) -> Result<IpAddr>;
}

/// System-configured resolver backed by trust-dns.
pub struct SystemResolver {
    inner: trust_dns_resolver::Resolver,
}

impl SystemResolver {
    pub fn new() -> Result<Self> {
        let inner = trust_dns_resolver::Resolver::from_system_conf()
            .map_err(|e| ZoneCraftError::Internal(format!("resolver init: {e}")))?;
        Ok(Self { inner })
    }
}

fn map_resolve_error(zone: &str, e: trust_dns_resolver::error::ResolveError) -> ZoneCraftError {
    use trust_dns_resolver::error::ResolveErrorKind;
    match e.kind() {
        ResolveErrorKind::NoRecordsFound { .. } => {
            ZoneCraftError::BadRequest(format!("zone '{zone}' does not resolve: {e}"))
        }
        ResolveErrorKind::Timeout => {
            ZoneCraftError::BadGateway(format!("resolution timed out for '{zone}'"))
        }
        _ => ZoneCraftError::BadGateway(format!("resolution failed for '{zone}': {e}")),
    }
}

impl SoaResolver for SystemResolver {
    fn soa_mname(&self, zone: &str) -> Result<String> {
        let lookup = self
            .inner
            .lookup(zone, trust_dns_resolver::proto::rr::RecordType::SOA)
            .map_err(|e| map_resolve_error(zone, e))?;
        lookup
            .record_iter()
            .filter_map(|record| match record.data() {
                Some(trust_dns_resolver::proto::rr::RData::SOA(soa)) => {
                    Some(soa.mname().to_utf8())
                }
                _ => None,
            })
            .next()
            .ok_or_else(|| {
                ZoneCraftError::BadRequest(format!("no SOA record found for '{zone}'"))
            })
    }

    fn host_addr(&self, host: &str) -> Result<IpAddr> {
        let lookup = self
            .inner
            .lookup_ip(host)
            .map_err(|e| map_resolve_error(host, e))?;
        lookup.iter().next().ok_or_else(|| {
            ZoneCraftError::BadGateway(format!("no address found for nameserver '{host}'"))
        })
    }
}

/// Transfer a zone and write it to the managed folder, overwriting any
/// existing copy. Returns the stored zone's summary.
pub fn transfer_zone(
    config: &ZoneConfig,
    origin: &str,
    options: &TransferOptions,
) -> Result<ZoneResponse> {
    transfer_zone_with(config, origin, options, &SystemResolver::new()?)
}

pub fn transfer_zone_with(
    config: &ZoneConfig,
    origin: &str,
    options: &TransferOptions,
    resolver: &dyn SoaResolver,
) -> Result<ZoneResponse> {
    let origin = name::canonical_origin(origin)?;

    // the zone must exist in the DNS before we try to pull it, whether or
    // not the caller named a server
    let mname = resolver.soa_mname(&origin)?;
    debug!(zone = %origin, mname = %mname, "resolved zone primary");
    let server = match options.nameserver {
        Some(addr) => addr,
        None => resolver.host_addr(&mname)?,
    };
    transfer_from(config, &origin, server, options)
}

fn transfer_from(
    config: &ZoneConfig,
    origin: &str,
    server: IpAddr,
    options: &TransferOptions,
) -> Result<ZoneResponse> {
    let addr = SocketAddr::new(server, options.port);
    info!(zone = %origin, server = %addr, udp = options.use_udp, "starting zone transfer");

    let query_id = (std::process::id() & 0xFFFF) as u16;
    let query = wire::build_query(query_id, &origin, RecordType::AXFR)?;

    let records = if options.use_udp {
        axfr_udp(addr, &query, query_id, &origin, options.timeout)?
    } else {
        axfr_tcp(addr, &query, query_id, &origin, options.timeout)?
    };

    let store = materialize(config, &origin, records)?;
    info!(zone = %origin, records = store.record_count, "zone transfer complete");
    ops::get_zone(config, store.origin())
}

/// One transferred record, already rendered to schema text fields.
struct TransferredRecord {
    name: String,
    rtype: RecordType,
    ttl: u32,
    fields: Vec<String>,
}

fn timed_out(zone: &str) -> ZoneCraftError {
    ZoneCraftError::BadGateway(format!("zone transfer for '{zone}' timed out"))
}

fn map_io(zone: &str, e: std::io::Error) -> ZoneCraftError {
    match e.kind() {
        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut => timed_out(zone),
        _ => ZoneCraftError::BadGateway(format!("zone transfer for '{zone}' failed: {e}")),
    }
}

fn check_response(msg: &Message, query_id: u16, zone: &str) -> Result<()> {
    if msg.id != query_id {
        return Err(ZoneCraftError::BadGateway(format!(
            "mismatched response id during transfer of '{zone}'"
        )));
    }
    match msg.rcode() {
        wire::RCODE_NOERROR => Ok(()),
        wire::RCODE_REFUSED | wire::RCODE_NOTAUTH => Err(ZoneCraftError::BadRequest(format!(
            "server refused transfer of zone '{zone}'"
        ))),
        wire::RCODE_NXDOMAIN => Err(ZoneCraftError::BadRequest(format!(
            "zone '{zone}' does not exist on the server"
        ))),
        rcode => Err(ZoneCraftError::BadGateway(format!(
            "zone transfer of '{zone}' failed with rcode {rcode}"
        ))),
    }
}

/// Collect a message's answer records, tracking SOA occurrences so the
/// caller can spot the end of the transfer.
fn collect_answers(
    buf: &[u8],
    msg: &Message,
    records: &mut Vec<TransferredRecord>,
    soa_seen: &mut u32,
) -> Result<bool> {
    for rec in &msg.answers {
        if RecordClass::from_u16(rec.class) != Some(RecordClass::IN) {
            continue;
        }
        let rtype = RecordType::from_u16(rec.rtype);
        if rtype == Some(RecordType::SOA) {
            *soa_seen += 1;
            if *soa_seen == 2 {
                // the transfer ends where it began
                return Ok(true);
            }
        }
        let Some(fields) = wire::record_fields(buf, rec)? else {
            warn!(name = %rec.name, rtype = rec.rtype, "skipping unsupported record type");
            continue;
        };
        records.push(TransferredRecord {
            name: rec.name.clone(),
            // record_fields only returns Some for registered types
            rtype: rtype.ok_or_else(|| {
                ZoneCraftError::Internal("unregistered type slipped through".to_string())
            })?,
            ttl: rec.ttl,
            fields,
        });
    }
    Ok(false)
}

fn axfr_tcp(
    addr: SocketAddr,
    query: &[u8],
    query_id: u16,
    zone: &str,
    timeout: Duration,
) -> Result<Vec<TransferredRecord>> {
    let deadline = Instant::now() + timeout;
    let mut stream =
        TcpStream::connect_timeout(&addr, timeout).map_err(|e| map_io(zone, e))?;
    stream
        .set_write_timeout(Some(timeout))
        .map_err(|e| map_io(zone, e))?;

    let mut framed = Vec::with_capacity(query.len() + 2);
    framed.extend_from_slice(&(query.len() as u16).to_be_bytes());
    framed.extend_from_slice(query);
    stream.write_all(&framed).map_err(|e| map_io(zone, e))?;

    let mut records = Vec::new();
    let mut soa_seen = 0u32;
    loop {
        let remaining = deadline
            .checked_duration_since(Instant::now())
            .ok_or_else(|| timed_out(zone))?;
        stream
            .set_read_timeout(Some(remaining))
            .map_err(|e| map_io(zone, e))?;

        let mut len_buf = [0u8; 2];
        stream
            .read_exact(&mut len_buf)
            .map_err(|e| map_io(zone, e))?;
        let len = u16::from_be_bytes(len_buf) as usize;
        let mut buf = vec![0u8; len];
        stream.read_exact(&mut buf).map_err(|e| map_io(zone, e))?;

        let msg = wire::parse_message(&buf)?;
        check_response(&msg, query_id, zone)?;
        if collect_answers(&buf, &msg, &mut records, &mut soa_seen)? {
            break;
        }
    }
    Ok(records)
}

fn axfr_udp(
    addr: SocketAddr,
    query: &[u8],
    query_id: u16,
    zone: &str,
    timeout: Duration,
) -> Result<Vec<TransferredRecord>> {
    let socket = UdpSocket::bind(("0.0.0.0", 0)).map_err(|e| map_io(zone, e))?;
    socket
        .set_read_timeout(Some(timeout))
        .map_err(|e| map_io(zone, e))?;
    socket.send_to(query, addr).map_err(|e| map_io(zone, e))?;

    let mut buf = vec![0u8; MAX_UDP_RESPONSE];
    let (n, _) = socket.recv_from(&mut buf).map_err(|e| map_io(zone, e))?;
    buf.truncate(n);

    let msg = wire::parse_message(&buf)?;
    check_response(&msg, query_id, zone)?;
    let mut records = Vec::new();
    let mut soa_seen = 0u32;
    collect_answers(&buf, &msg, &mut records, &mut soa_seen)?;
    Ok(records)
}

/// Build a fresh zone from transferred records and persist it.
fn materialize(
    config: &ZoneConfig,
    origin: &str,
    records: Vec<TransferredRecord>,
) -> Result<ZoneStore> {
    if records.is_empty() {
        return Err(ZoneCraftError::BadGateway(format!(
            "zone transfer of '{origin}' returned no records"
        )));
    }

    let mut store = ZoneStore::create(origin, config.zone_file_path(origin), config.default_ttl)?;
    {
        let mut txn = store.writer();
        for rec in records {
            let slots = registry::schema(rec.rtype.as_str())?;
            let fields: Vec<String> = slots
                .iter()
                .zip(rec.fields)
                .map(|(slot, value)| {
                    if registry::SLOTS_TO_RELATIVIZE.contains(slot) {
                        name::relativize(&value, origin)
                    } else {
                        value
                    }
                })
                .collect();
            txn.add(RRset::from_rdata(
                rec.name,
                rec.rtype,
                RecordClass::IN,
                rec.ttl,
                Rdata::new(fields),
            ))?;
        }
        txn.commit();
    }
    store.persist()?;
    Ok(store)
}
