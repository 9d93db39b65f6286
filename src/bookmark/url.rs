use std::net::{IpAddr, Ipv4Addr};

use url::Url;

/// Prefix of the referrer-masking redirect used when `hideReferer` is set.
pub const REFERRER_MASK_PREFIX: &str = "https://href.li/?";

/// Returns `true` if `candidate` is an absolute URL with a scheme and a host.
pub fn validate_url(candidate: &str) -> bool {
    match Url::parse(candidate) {
        Ok(parsed) => !parsed.scheme().is_empty() && parsed.has_host(),
        Err(_) => false,
    }
}

/// `scheme://host[:port]` of `url`, or `None` for unparseable or opaque URLs.
pub fn base_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let origin = parsed.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}

/// The href a saved card links to.
///
/// With `hide_referrer` the URL is appended verbatim to the redirect prefix,
/// without re-encoding.
pub fn resolve_target(url: &str, hide_referrer: bool) -> String {
    if hide_referrer {
        format!("{REFERRER_MASK_PREFIX}{url}")
    } else {
        url.to_string()
    }
}

/// Returns `true` if `ip` must not be fetched from: anything that is not a
/// globally routed unicast address.
pub fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_reserved_v4(v4),
        IpAddr::V6(v6) => {
            if let Some(mapped) = v6.to_ipv4_mapped() {
                return is_reserved_v4(mapped);
            }
            let first = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                || v6.is_multicast()
                || first & 0xfe00 == 0xfc00 // unique local
                || first & 0xffc0 == 0xfe80 // link local
                || (first == 0x2001 && v6.segments()[1] == 0x0db8) // documentation
        }
    }
}

fn is_reserved_v4(v4: Ipv4Addr) -> bool {
    let [a, b, ..] = v4.octets();
    v4.is_private()
        || v4.is_loopback()
        || v4.is_link_local()
        || v4.is_unspecified()
        || v4.is_broadcast()
        || v4.is_multicast()
        || v4.is_documentation()
        || a == 0
        || a >= 240
        || (a == 100 && b & 0xc0 == 64) // CGNAT 100.64.0.0/10
        || (a == 198 && b & 0xfe == 18) // benchmarking 198.18.0.0/15
        || (a == 192 && b == 0 && v4.octets()[2] == 0) // IETF 192.0.0.0/24
}
