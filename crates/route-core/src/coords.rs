//! Literal coordinates inside a route string.
//!
//! Three formats, tried in this order:
//!
//! | format  | example            | meaning                 |
//! |---------|--------------------|-------------------------|
//! | 5-char  | `5020N`, `50N20`   | ARINC 424 shorthand     |
//! | 7-char  | `N50W020`          | whole degrees           |
//! | decimal | `N32.665W122.1265` | signed decimal degrees  |
//!
//! ARINC 424 shorthand: the letter gives the quadrant (`N` = north/west,
//! `E` = north/east, `S` = south/east, `W` = south/west). A letter in the
//! middle (`50N20`) means the longitude is 100 plus the trailing digits.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Result, RouteError};

lazy_static! {
    static ref FIVE_TRAILING: Regex = Regex::new(r"^(\d{2})(\d{2})([NEWS])$").unwrap();
    static ref FIVE_MIDDLE: Regex = Regex::new(r"^(\d{2})([NEWS])(\d{2})$").unwrap();
    static ref SEVEN: Regex = Regex::new(r"^([NS])(\d{2})([EW])(\d{3})$").unwrap();
    static ref DECIMAL: Regex =
        Regex::new(r"^([NS])(\d{1,2}(?:\.\d+)?)([EW])(\d{1,3}(?:\.\d+)?)$").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

/// Parse `token` as a coordinate literal.
///
/// `Ok(None)` when the token is not shaped like any format. A token shaped
/// like a coordinate but out of range is a grammar error.
pub fn parse_coordinate(token: &str) -> Result<Option<LatLon>> {
    let parsed = parse_five_letter(token)
        .or_else(|| parse_seven_letter(token))
        .or_else(|| parse_decimal(token));

    match parsed {
        Some(coord) if coord.lat.abs() <= 90.0 && coord.lon.abs() <= 180.0 => Ok(Some(coord)),
        Some(_) => Err(RouteError::grammar(format!(
            "coordinate {} is out of range",
            token
        ))),
        None => Ok(None),
    }
}

fn quadrant(letter: &str) -> Option<(f64, f64)> {
    match letter {
        "N" => Some((1.0, -1.0)),
        "E" => Some((1.0, 1.0)),
        "S" => Some((-1.0, 1.0)),
        "W" => Some((-1.0, -1.0)),
        _ => None,
    }
}

fn parse_five_letter(token: &str) -> Option<LatLon> {
    if let Some(cap) = FIVE_TRAILING.captures(token) {
        let lat: f64 = cap[1].parse().ok()?;
        let lon: f64 = cap[2].parse().ok()?;
        let (lat_sign, lon_sign) = quadrant(&cap[3])?;
        return Some(LatLon {
            lat: lat_sign * lat,
            lon: lon_sign * lon,
        });
    }

    let cap = FIVE_MIDDLE.captures(token)?;
    let lat: f64 = cap[1].parse().ok()?;
    let lon: f64 = cap[3].parse::<f64>().ok()? + 100.0;
    let (lat_sign, lon_sign) = quadrant(&cap[2])?;
    Some(LatLon {
        lat: lat_sign * lat,
        lon: lon_sign * lon,
    })
}

fn hemisphere_sign(letter: &str) -> f64 {
    if letter == "S" || letter == "W" {
        -1.0
    } else {
        1.0
    }
}

fn parse_seven_letter(token: &str) -> Option<LatLon> {
    let cap = SEVEN.captures(token)?;
    let lat: f64 = cap[2].parse().ok()?;
    let lon: f64 = cap[4].parse().ok()?;
    Some(LatLon {
        lat: hemisphere_sign(&cap[1]) * lat,
        lon: hemisphere_sign(&cap[3]) * lon,
    })
}

fn parse_decimal(token: &str) -> Option<LatLon> {
    let cap = DECIMAL.captures(token)?;
    let lat: f64 = cap[2].parse().ok()?;
    let lon: f64 = cap[4].parse().ok()?;
    Some(LatLon {
        lat: hemisphere_sign(&cap[1]) * lat,
        lon: hemisphere_sign(&cap[3]) * lon,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(token: &str) -> LatLon {
        parse_coordinate(token).unwrap().unwrap()
    }

    #[test]
    fn test_five_letter_quadrants() {
        assert_eq!(parse("5020N"), LatLon { lat: 50.0, lon: -20.0 });
        assert_eq!(parse("5020E"), LatLon { lat: 50.0, lon: 20.0 });
        assert_eq!(parse("5020S"), LatLon { lat: -50.0, lon: 20.0 });
        assert_eq!(parse("5020W"), LatLon { lat: -50.0, lon: -20.0 });
    }

    #[test]
    fn test_five_letter_longitude_over_100() {
        assert_eq!(parse("50N50"), LatLon { lat: 50.0, lon: -150.0 });
        assert_eq!(parse("07E10"), LatLon { lat: 7.0, lon: 110.0 });
    }

    #[test]
    fn test_seven_letter() {
        assert_eq!(parse("N50W020"), LatLon { lat: 50.0, lon: -20.0 });
        assert_eq!(parse("S12E130"), LatLon { lat: -12.0, lon: 130.0 });
    }

    #[test]
    fn test_decimal() {
        let coord = parse("N32.665W122.1265");
        assert!((coord.lat - 32.665).abs() < 1e-9);
        assert!((coord.lon + 122.1265).abs() < 1e-9);
    }

    #[test]
    fn test_not_a_coordinate() {
        for token in ["SUNST", "J146", "KLAX", "DCT", "N32", "AUTO"] {
            assert!(parse_coordinate(token).unwrap().is_none(), "{} parsed", token);
        }
    }

    #[test]
    fn test_out_of_range_is_grammar_error() {
        assert!(matches!(parse_coordinate("N95W020"), Err(RouteError::Grammar(_))));
        assert!(matches!(parse_coordinate("N10.5W190.0"), Err(RouteError::Grammar(_))));
    }
}
