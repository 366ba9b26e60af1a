//! Display-only store location enrichment. Store names may carry an embedded
//! geo tag by convention ("Name (City lat:<f> lng:<f>)"); this module
//! extracts it and renders distances. The optimizer never reads any of this.

use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

fn geo_tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)lat:([0-9.+-]+)\s+lng:([0-9.+-]+)").expect("geo tag pattern is valid")
    })
}

/// Extract the geo tag embedded in a store name, if present and parseable.
pub fn parse_store_geo(store: &str) -> Option<Coordinates> {
    let caps = geo_tag_pattern().captures(store)?;
    let lat = caps.get(1)?.as_str().parse::<f64>().ok()?;
    let lng = caps.get(2)?.as_str().parse::<f64>().ok()?;
    Some(Coordinates { lat, lng })
}

/// Great-circle distance in kilometers (haversine, R = 6371 km).
pub fn distance_km(from: Coordinates, to: Coordinates) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lng = (to.lng - from.lng).to_radians();
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();

    let x = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * x.sqrt().asin()
}

/// "X.X km away" for stores carrying a geo tag, when an origin is known.
pub fn distance_text(store: &str, origin: Option<Coordinates>) -> Option<String> {
    let origin = origin?;
    let target = parse_store_geo(store)?;
    let d = distance_km(origin, target);
    d.is_finite().then(|| format!("{:.1} km away", d))
}
