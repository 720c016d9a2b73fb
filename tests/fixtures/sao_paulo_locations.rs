//! São Paulo locations for realistic ordering tests.
//!
//! Coordinates of well-known public places, rounded to 4 decimals.

use stop_sequencer::Coordinate;

/// A named delivery location.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

/// Wholesale market on the west side, used as the distribution hub.
pub const DEPOT: Location = Location::new("CEAGESP", -23.5367, -46.7365);

// ============================================================================
// Centro
// ============================================================================

pub const CENTRO: &[Location] = &[
    Location::new("Praça da Sé", -23.5503, -46.6342),
    Location::new("Mercado Municipal", -23.5417, -46.6297),
    Location::new("Estação da Luz", -23.5349, -46.6352),
    Location::new("Theatro Municipal", -23.5452, -46.6388),
    Location::new("Liberdade", -23.5553, -46.6356),
];

// ============================================================================
// Zona Oeste / Sul
// ============================================================================

pub const OESTE_SUL: &[Location] = &[
    Location::new("MASP", -23.5614, -46.6559),
    Location::new("Parque Ibirapuera", -23.5874, -46.6576),
    Location::new("Pacaembu", -23.5476, -46.6652),
    Location::new("Shopping Eldorado", -23.5726, -46.6964),
    Location::new("Allianz Parque", -23.5275, -46.6783),
    Location::new("Parque Villa-Lobos", -23.5466, -46.7225),
    Location::new("Beco do Batman", -23.5563, -46.6868),
    Location::new("Shopping Morumbi", -23.6229, -46.6988),
    Location::new("Congonhas", -23.6273, -46.6566),
];

// ============================================================================
// Zona Leste / Norte
// ============================================================================

pub const LESTE_NORTE: &[Location] = &[
    Location::new("Museu do Ipiranga", -23.5855, -46.6093),
    Location::new("Tatuapé", -23.5403, -46.5766),
    Location::new("Mooca", -23.5571, -46.5986),
    Location::new("Santana", -23.5026, -46.6250),
];

/// All delivery locations, in a deliberately unsorted order.
pub fn all_locations() -> Vec<Location> {
    let mut all = Vec::with_capacity(18);
    all.extend_from_slice(LESTE_NORTE);
    all.extend_from_slice(CENTRO);
    all.extend_from_slice(OESTE_SUL);
    all
}

/// Returns a subset of locations for smaller tests.
pub fn sample_locations(count: usize) -> Vec<Location> {
    all_locations().into_iter().take(count).collect()
}
