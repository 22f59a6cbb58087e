//! SRV lookup for addresses typed without a port.
//!
//! Server operators often publish `_minecraft._tcp.<host>` records that
//! point at the real host and port. A failed lookup is not an error: the
//! probe simply falls back to `host:25565`.

use hickory_resolver::TokioResolver;
use hickory_resolver::config::ResolverConfig;
use hickory_resolver::name_server::TokioConnectionProvider;
use tracing::debug;

use crate::status::Address;

/// DNS service label queried in front of the host name.
pub const SRV_PREFIX: &str = "_minecraft._tcp.";

/// Resolve the SRV target for `address`, if one applies.
///
/// Returns `None` when the address carries an explicit port, is an IP
/// literal, or no usable record exists.
pub async fn resolve_srv(address: &Address) -> Option<Address> {
    if address.has_explicit_port() || address.host().parse::<std::net::IpAddr>().is_ok() {
        return None;
    }

    let resolver = system_resolver();
    let query = format!("{SRV_PREFIX}{}", address.host());
    let lookup = match resolver.srv_lookup(query.as_str()).await {
        Ok(lookup) => lookup,
        Err(e) => {
            debug!(%query, "no SRV record: {e}");
            return None;
        }
    };

    let record = lookup.iter().min_by_key(|srv| srv.priority())?;
    let target = record.target().to_string();
    let target = target.trim_end_matches('.');
    let resolved = Address::new(target, record.port()).ok()?;
    debug!(%query, %resolved, "using SRV record");
    Some(resolved)
}

/// Resolver from the host's system configuration, or Cloudflare when
/// that cannot be read.
fn system_resolver() -> TokioResolver {
    match TokioResolver::builder_tokio() {
        Ok(builder) => builder.build(),
        Err(e) => {
            debug!("system resolver config unavailable: {e}");
            TokioResolver::builder_with_config(
                ResolverConfig::cloudflare(),
                TokioConnectionProvider::default(),
            )
            .build()
        }
    }
}
