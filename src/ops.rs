//! Zone and record operations: the stateless façade the CLI drives.
//!
//! Every operation loads the zone fresh from its backing file, mutates it
//! through a writer transaction, and persists on success. Responses are
//! flat serializable shapes.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;

use crate::config::ZoneConfig;
use crate::dns::enums::RecordType;
use crate::dns::name;
use crate::error::{Result, ZoneCraftError};
use crate::rdata::codec::{self, RecordResponse};
use crate::zone::record::RRset;
use crate::zone::store::ZoneStore;
use crate::zone::{directory, zone_exists};

/// Zone summary: origin, record count, and the decoded SOA.
#[derive(Debug, Clone, Serialize)]
pub struct ZoneResponse {
    pub name: String,
    pub record_count: usize,
    pub soa: RecordResponse,
}

/// Parameters for creating a zone with its initial SOA and NS records.
#[derive(Debug, Clone)]
pub struct CreateZoneRequest {
    pub origin: String,
    pub soa_ttl: u32,
    pub ns_ttl: u32,
    pub a_ttl: u32,
    pub admin_email: String,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    pub minimum: u32,
    pub primary_ns: String,
    /// When set, an A record for the primary nameserver is created too
    pub primary_ns_ip: Option<String>,
}

/// One record mutation: owner name, type, optional TTL, schema fields.
#[derive(Debug, Clone)]
pub struct RecordRequest {
    pub name: String,
    pub rtype: String,
    pub ttl: Option<u32>,
    pub data: BTreeMap<String, String>,
    pub comment: Option<String>,
}

fn zone_response(store: &ZoneStore) -> Result<ZoneResponse> {
    let soa = store
        .soa()
        .ok_or(ZoneCraftError::MissingSoa)
        .and_then(|rrset| codec::decode(rrset, store.origin()))?
        .into_iter()
        .next()
        .ok_or(ZoneCraftError::MissingSoa)?;
    Ok(ZoneResponse {
        name: store.origin().to_string(),
        record_count: store.record_count,
        soa,
    })
}

/// All zones in the managed folder.
pub fn list_zones(config: &ZoneConfig) -> Result<Vec<ZoneResponse>> {
    directory::load_all(&config.zone_dir)?
        .iter()
        .map(zone_response)
        .collect()
}

pub fn get_zone(config: &ZoneConfig, origin: &str) -> Result<ZoneResponse> {
    let store = directory::load_one(&config.zone_dir, origin)?;
    zone_response(&store)
}

/// Create a zone file with its SOA, apex NS, and optionally the primary
/// nameserver's A record. Refuses to overwrite an existing zone.
pub fn create_zone(config: &ZoneConfig, req: &CreateZoneRequest) -> Result<ZoneResponse> {
    let origin = name::canonical_origin(&req.origin)?;
    if zone_exists(&config.zone_dir, &origin) {
        return Err(ZoneCraftError::Conflict(format!(
            "zone '{origin}' already exists"
        )));
    }

    let mut store = ZoneStore::create(&origin, config.zone_file_path(&origin), config.default_ttl)?;
    {
        let mut txn = store.writer();

        let soa_data = BTreeMap::from([
            ("mname".to_string(), req.primary_ns.clone()),
            (
                "rname".to_string(),
                name::email_to_zone_format(&req.admin_email)?,
            ),
            // placeholder; persist stamps the date serial
            ("serial".to_string(), "0".to_string()),
            ("refresh".to_string(), req.refresh.to_string()),
            ("retry".to_string(), req.retry.to_string()),
            ("expire".to_string(), req.expire.to_string()),
            ("minimum".to_string(), req.minimum.to_string()),
        ]);
        let (rtype, rdata) = codec::encode(&origin, "SOA", Default::default(), &soa_data, None)?;
        txn.add(RRset::from_rdata(
            "@".to_string(),
            rtype,
            Default::default(),
            req.soa_ttl,
            rdata,
        ))?;

        let ns_data = BTreeMap::from([("target".to_string(), req.primary_ns.clone())]);
        let (rtype, rdata) = codec::encode(&origin, "NS", Default::default(), &ns_data, None)?;
        txn.add(RRset::from_rdata(
            "@".to_string(),
            rtype,
            Default::default(),
            req.ns_ttl,
            rdata,
        ))?;

        if let Some(ip) = &req.primary_ns_ip {
            let a_data = BTreeMap::from([("address".to_string(), ip.clone())]);
            let (rtype, rdata) = codec::encode(&origin, "A", Default::default(), &a_data, None)?;
            txn.add(RRset::from_rdata(
                req.primary_ns.clone(),
                rtype,
                Default::default(),
                req.a_ttl,
                rdata,
            ))?;
        }

        txn.commit();
    }
    store.persist()?;
    info!(origin = %origin, "created zone");
    zone_response(&store)
}

/// Delete a zone's backing file. False when the zone did not exist.
pub fn delete_zone(config: &ZoneConfig, origin: &str) -> Result<bool> {
    let origin = name::canonical_origin(origin)?;
    ZoneStore::delete_file(&config.zone_file_path(&origin))
}

/// Rewrite the apex SOA fields (serial excluded, it is stamped on write).
pub fn update_zone(
    config: &ZoneConfig,
    origin: &str,
    data: BTreeMap<String, String>,
    ttl: Option<u32>,
    comment: Option<String>,
) -> Result<RecordResponse> {
    update_record(
        config,
        origin,
        &RecordRequest {
            name: "@".to_string(),
            rtype: "SOA".to_string(),
            ttl,
            data,
            comment,
        },
        0,
    )
}

fn parse_type_filter(type_filter: Option<&str>) -> Result<Option<RecordType>> {
    type_filter.map(str::parse).transpose()
}

/// Fetch records, flattened one response per rdata. With a name the lookup
/// is exact and NotFound when nothing matches; without one the whole zone
/// is enumerated. SOA stays hidden unless asked for by type.
pub fn get_records(
    config: &ZoneConfig,
    origin: &str,
    record_name: Option<&str>,
    type_filter: Option<&str>,
) -> Result<Vec<RecordResponse>> {
    let rtype = parse_type_filter(type_filter)?;
    let store = directory::load_one(&config.zone_dir, origin)?;
    let include_soa = rtype == Some(RecordType::SOA);

    let rrsets: Vec<&RRset> = match record_name {
        Some(record_name) => {
            let matches: Vec<&RRset> = store
                .lookup(record_name, rtype)?
                .into_iter()
                .filter(|rrset| include_soa || rrset.rtype != RecordType::SOA)
                .collect();
            // a node holding nothing but the SOA counts as no match
            if matches.is_empty() {
                return Err(ZoneCraftError::NotFound(format!(
                    "no matching records under name '{record_name}'"
                )));
            }
            matches
        }
        None => store.all_records(rtype, false),
    };

    let mut responses = Vec::new();
    for rrset in rrsets {
        responses.extend(codec::decode(rrset, store.origin())?);
    }
    Ok(responses)
}

/// Create one record. Appends to an existing (name, type) set; the returned
/// response carries the rdata's index within that set.
pub fn create_record(
    config: &ZoneConfig,
    origin: &str,
    req: &RecordRequest,
) -> Result<RecordResponse> {
    let mut store = directory::load_one(&config.zone_dir, origin)?;
    let ttl = req.ttl.unwrap_or(store.default_ttl());
    let (rtype, rdata) = codec::encode(
        store.origin(),
        &req.rtype,
        Default::default(),
        &req.data,
        req.comment.clone(),
    )?;
    let owner = req.name.clone();

    let mut txn = store.writer();
    txn.add(RRset::from_rdata(
        owner.clone(),
        rtype,
        Default::default(),
        ttl,
        rdata.clone(),
    ))?;
    txn.commit();
    store.persist()?;
    info!(origin = %store.origin(), name = %owner, rtype = %rtype, "created record");

    let rrset = store
        .rrset(&owner, rtype)
        .ok_or_else(|| ZoneCraftError::Internal("record vanished after commit".to_string()))?;
    let responses = codec::decode(rrset, store.origin())?;
    responses
        .into_iter()
        .zip(&rrset.rdatas)
        .find(|(_, r)| r.same_value(&rdata))
        .map(|(response, _)| response)
        .ok_or_else(|| ZoneCraftError::Internal("record vanished after commit".to_string()))
}

/// Replace the rdata at `index` within the (name, type) set.
pub fn update_record(
    config: &ZoneConfig,
    origin: &str,
    req: &RecordRequest,
    index: usize,
) -> Result<RecordResponse> {
    let mut store = directory::load_one(&config.zone_dir, origin)?;
    let (rtype, rdata) = codec::encode(
        store.origin(),
        &req.rtype,
        Default::default(),
        &req.data,
        req.comment.clone(),
    )?;

    let mut txn = store.writer();
    let existing = txn.rrset(&req.name, rtype).ok_or_else(|| {
        ZoneCraftError::NotFound(format!(
            "no {rtype} record set at '{}' in zone '{origin}'",
            req.name
        ))
    })?;
    if index >= existing.len() {
        return Err(ZoneCraftError::NotFound(format!(
            "record index {index} out of range for {} {rtype} (set has {})",
            req.name,
            existing.len()
        )));
    }
    let mut replacement = existing.clone();
    if let Some(ttl) = req.ttl {
        replacement.ttl = ttl;
    }
    replacement.rdatas[index] = rdata;
    txn.replace(replacement);
    txn.commit();
    store.persist()?;
    info!(origin = %store.origin(), name = %req.name, rtype = %rtype, index, "updated record");

    let rrset = store
        .rrset(&req.name, rtype)
        .ok_or_else(|| ZoneCraftError::Internal("record vanished after commit".to_string()))?;
    codec::decode(rrset, store.origin())?
        .into_iter()
        .nth(index)
        .ok_or_else(|| ZoneCraftError::Internal("record vanished after commit".to_string()))
}

/// Delete the record whose data matches exactly. Comment differences do not
/// block deletion.
pub fn delete_record(config: &ZoneConfig, origin: &str, req: &RecordRequest) -> Result<()> {
    let mut store = directory::load_one(&config.zone_dir, origin)?;
    let (rtype, rdata) = codec::encode(
        store.origin(),
        &req.rtype,
        Default::default(),
        &req.data,
        None,
    )?;
    if rtype == RecordType::SOA {
        return Err(ZoneCraftError::BadRequest(
            "the SOA record cannot be deleted; delete the zone instead".to_string(),
        ));
    }

    let mut txn = store.writer();
    txn.delete_exact(&req.name, rtype, &rdata)?;
    txn.commit();
    store.persist()?;
    info!(origin = %store.origin(), name = %req.name, rtype = %rtype, "deleted record");
    Ok(())
}
