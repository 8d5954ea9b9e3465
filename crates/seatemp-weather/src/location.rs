//! The fixed spot the dashboard reports on.

/// Geographic coordinate in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// Ngamotu Beach, New Plymouth
pub const NGAMOTU: Coordinate = Coordinate {
    latitude: -39.0556,
    longitude: 174.0452,
};
