use crate::error::{MalformedInterfaceName, SessionError};
use crate::models::*;
use crate::transport::Session;
use crate::utils::{short_hostname, shorten_interface};

/// Build the enriched record for one raw neighbor. Both ends are shortened with
/// the local device's family, since the local device reports both in its own naming.
pub fn enrich_neighbor(
    raw: RawNeighbor,
    family: DeviceFamily,
) -> Result<NeighborRecord, MalformedInterfaceName> {
    let local = shorten_interface(&raw.local_interface, family)?;
    let remote = shorten_interface(&raw.remote_interface, family)?;
    let host = short_hostname(&raw.remote_host);
    Ok(NeighborRecord::new(raw, host, local, remote))
}

/// Pull the raw neighbor fields out of a parsed record
fn raw_neighbor(record: &Record, protocol: Protocol) -> Option<RawNeighbor> {
    Some(RawNeighbor {
        remote_host: record_text(record, protocol.remote_host_field())?.to_string(),
        local_interface: record_text(record, "local_interface")?.to_string(),
        remote_interface: record_text(record, "remote_interface")?.to_string(),
    })
}

/// Fetch one protocol's neighbor table from a connected session.
/// Entries that are incomplete or carry unusable interface names are dropped.
pub async fn fetch_neighbors(
    session: &mut dyn Session,
    protocol: Protocol,
    family: DeviceFamily,
    host: &str,
) -> Result<Vec<NeighborRecord>, SessionError> {
    tracing::debug!("{} | Getting {} neighbors", host, protocol);
    let records = session.run_command(protocol.detail_command()).await?;

    let mut neighbors = Vec::with_capacity(records.len());
    for record in &records {
        let Some(raw) = raw_neighbor(record, protocol) else {
            tracing::warn!("{} | Skipping incomplete {} neighbor entry: {:?}", host, protocol, record);
            continue;
        };
        match enrich_neighbor(raw, family) {
            Ok(neighbor) => neighbors.push(neighbor),
            Err(e) => tracing::warn!("{} | Skipping {} neighbor: {}", host, protocol, e),
        }
    }

    tracing::debug!(
        "{} | {} {} neighbors collected ({} reported)",
        host,
        neighbors.len(),
        protocol,
        records.len()
    );
    Ok(neighbors)
}

/// Normalize a claim with the device's family so it can be compared to neighbor records
pub fn canonicalize_claim(
    claim: &ClaimedAdjacency,
    family: DeviceFamily,
) -> Result<CanonicalClaim, MalformedInterfaceName> {
    Ok(CanonicalClaim {
        neighbor: claim.neighbor.trim().to_string(),
        local_short_if: shorten_interface(&claim.local_interface, family)?,
        remote_short_if: shorten_interface(&claim.remote_interface, family)?,
    })
}

/// Check a claim against one protocol's table.
///
/// Returns "Verified via <protocol>" when some record for the claimed neighbor has
/// both interfaces matching. The first match wins; duplicate or conflicting entries
/// for the same port are not flagged.
pub fn verify(claim: &CanonicalClaim, table: &[NeighborRecord], protocol: Protocol) -> Option<String> {
    table
        .iter()
        .filter(|n| n.host().eq_ignore_ascii_case(&claim.neighbor))
        .find(|n| {
            n.local_short_if().eq_ignore_ascii_case(&claim.local_short_if)
                && n.remote_short_if().eq_ignore_ascii_case(&claim.remote_short_if)
        })
        .map(|_| format!("Verified via {}", protocol.label()))
}

/// Check a claim against both tables
pub fn verify_claim(
    claim: &CanonicalClaim,
    cdp: &[NeighborRecord],
    lldp: &[NeighborRecord],
) -> VerificationResult {
    VerificationResult {
        cdp: verify(claim, cdp, Protocol::Cdp),
        lldp: verify(claim, lldp, Protocol::Lldp),
    }
}
