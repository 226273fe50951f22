//! Helpers for the dotted identifiers used by ODPT-style feeds.
//!
//! Ids look like `odpt.Station:JR-East.Yamanote.Tokyo`: an optional
//! `vocabulary:` prefix followed by dot-separated parts, where the first
//! part names the agency and the last part names the station (the "stem").

/// Drop the `vocabulary:` prefix of an id.
///
/// Ids without a colon are returned unchanged.
///
/// # Examples
///
/// ```
/// use tokyo_gtfs::domain::strip_prefix;
///
/// assert_eq!(strip_prefix("odpt.Calendar:Weekday"), "Weekday");
/// assert_eq!(strip_prefix("Toei.Oedo"), "Toei.Oedo");
/// ```
pub fn strip_prefix(id: &str) -> &str {
    match id.split_once(':') {
        Some((_, rest)) => rest,
        None => id,
    }
}

/// The final dot-separated component of an id.
///
/// # Examples
///
/// ```
/// use tokyo_gtfs::domain::last_part;
///
/// assert_eq!(last_part("TokyoMetro.Hanzomon.Oshiage"), "Oshiage");
/// assert_eq!(last_part("Oshiage"), "Oshiage");
/// ```
pub fn last_part(id: &str) -> &str {
    id.rsplit('.').next().unwrap_or(id)
}

/// The first dot-separated component of an id, usually the agency.
pub fn first_part(id: &str) -> &str {
    id.split('.').next().unwrap_or(id)
}

/// Roughly identifies the physical station behind a stop id.
///
/// Like [`last_part`], but a trailing platform component of `0`, `1` or
/// `2` is skipped.
///
/// # Examples
///
/// ```
/// use tokyo_gtfs::domain::station_stem;
///
/// assert_eq!(station_stem("Toei.Oedo.Tochomae"), "Tochomae");
/// assert_eq!(station_stem("Toei.Oedo.Tochomae.1"), "Tochomae");
/// assert_eq!(station_stem("Tochomae"), "Tochomae");
/// ```
pub fn station_stem(id: &str) -> &str {
    let mut parts = id.rsplit('.');
    let last = parts.next().unwrap_or(id);
    match (last, parts.next()) {
        ("0" | "1" | "2", Some(previous)) => previous,
        _ => last,
    }
}

/// Whether two stop ids refer to the same place, judged by their last part.
pub fn same_stop(a: &str, b: &str) -> bool {
    last_part(a) == last_part(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_prefix_only_first_colon() {
        assert_eq!(
            strip_prefix("odpt.BusroutePattern:TobuBus.Take16.101010008720"),
            "TobuBus.Take16.101010008720"
        );
        assert_eq!(strip_prefix("a:b:c"), "b:c");
    }

    #[test]
    fn first_and_last_parts() {
        assert_eq!(first_part("JR-East.Yamanote.Tokyo"), "JR-East");
        assert_eq!(last_part("JR-East.Yamanote.Tokyo"), "Tokyo");
        assert_eq!(first_part(""), "");
        assert_eq!(last_part(""), "");
    }

    #[test]
    fn same_stop_compares_last_parts() {
        assert!(same_stop("JR-East.Yokosuka.Ofuna", "JR-East.Tokaido.Ofuna"));
        assert!(!same_stop("JR-East.Yokosuka.Ofuna", "JR-East.Yokosuka.Kamakura"));
    }

    #[test]
    fn station_stem_keeps_non_platform_suffix() {
        assert_eq!(station_stem("Toei.Oedo.Tochomae.3"), "3");
        assert_eq!(station_stem("1"), "1");
    }
}
