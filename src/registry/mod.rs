/// Static table of road corridors
use crate::domain::{Route, RouteSummary, Waypoint};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RegistryError {
    #[error("default route {0:?} is not registered")]
    MissingDefault(String),
    #[error("route {0:?} has no waypoints")]
    EmptyRoute(String),
    #[error("route {0:?} is registered twice")]
    DuplicateRoute(String),
    #[error("route {route:?}: waypoint {waypoint:?} has invalid distance {km}")]
    InvalidDistance {
        route: String,
        waypoint: String,
        km: f64,
    },
    #[error("route {route:?}: waypoint {waypoint:?} appears more than once")]
    DuplicateWaypoint { route: String, waypoint: String },
}

/// Immutable id -> route lookup with a default fallback
#[derive(Debug)]
pub struct RouteRegistry {
    routes: BTreeMap<String, Route>,
    default_id: String,
}

impl RouteRegistry {
    pub fn new(routes: Vec<Route>, default_id: &str) -> Result<Self, RegistryError> {
        let mut table = BTreeMap::new();
        for route in routes {
            validate(&route)?;
            if table.contains_key(&route.id) {
                return Err(RegistryError::DuplicateRoute(route.id));
            }
            table.insert(route.id.clone(), route);
        }

        if !table.contains_key(default_id) {
            return Err(RegistryError::MissingDefault(default_id.to_string()));
        }

        Ok(Self {
            routes: table,
            default_id: default_id.to_string(),
        })
    }

    /// Registry populated with the built-in corridors
    pub fn builtin(default_id: &str) -> Result<Self, RegistryError> {
        Self::new(builtin_routes(), default_id)
    }

    pub fn get(&self, id: &str) -> Option<&Route> {
        self.routes.get(id)
    }

    pub fn default_route(&self) -> &Route {
        &self.routes[&self.default_id]
    }

    /// Look up a route, falling back to the default for unknown or missing ids
    pub fn resolve(&self, id: Option<&str>) -> &Route {
        id.map(str::trim)
            .and_then(|id| self.get(id))
            .unwrap_or_else(|| self.default_route())
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.values()
    }

    pub fn summaries(&self) -> Vec<RouteSummary> {
        self.routes()
            .map(|r| RouteSummary {
                id: r.id.clone(),
                label: r.label.clone(),
            })
            .collect()
    }
}

fn validate(route: &Route) -> Result<(), RegistryError> {
    if route.waypoints.is_empty() {
        return Err(RegistryError::EmptyRoute(route.id.clone()));
    }

    let mut seen = HashSet::new();
    for (i, wp) in route.waypoints.iter().enumerate() {
        let km = wp.km_from_prev;
        if !km.is_finite() || km < 0.0 || (i == 0 && km != 0.0) {
            return Err(RegistryError::InvalidDistance {
                route: route.id.clone(),
                waypoint: wp.name.clone(),
                km,
            });
        }
        if !seen.insert(wp.name.as_str()) {
            return Err(RegistryError::DuplicateWaypoint {
                route: route.id.clone(),
                waypoint: wp.name.clone(),
            });
        }
    }
    Ok(())
}

/// Same corridor driven the other way. Each leg keeps its length.
pub fn reversed(route: &Route, id: &str, label: &str) -> Route {
    let n = route.waypoints.len();
    let waypoints = (0..n)
        .rev()
        .map(|i| {
            let wp = &route.waypoints[i];
            let km = if i + 1 < n {
                route.waypoints[i + 1].km_from_prev
            } else {
                0.0
            };
            Waypoint::new(wp.name.clone(), wp.lat, wp.lon, km)
        })
        .collect();

    Route {
        id: id.to_string(),
        label: label.to_string(),
        waypoints,
    }
}

fn builtin_routes() -> Vec<Route> {
    let e4_north = Route {
        id: "e4-north".to_string(),
        label: "E4 Skellefteå – Stockholm".to_string(),
        waypoints: vec![
            Waypoint::new("Skellefteå", 64.7507, 20.9528, 0.0),
            Waypoint::new("Umeå", 63.8258, 20.2630, 137.0),
            Waypoint::new("Örnsköldsvik", 63.2909, 18.7153, 113.0),
            Waypoint::new("Sundsvall", 62.3908, 17.3069, 116.0),
            Waypoint::new("Hudiksvall", 61.7274, 17.1056, 83.0),
            Waypoint::new("Gävle", 60.6745, 17.1417, 117.0),
            Waypoint::new("Uppsala", 59.8586, 17.6389, 110.0),
            Waypoint::new("Stockholm", 59.3293, 18.0686, 70.0),
        ],
    };
    let e4_south = reversed(&e4_north, "e4-south", "E4 Stockholm – Skellefteå");

    let west = Route {
        id: "stockholm-goteborg".to_string(),
        label: "Stockholm – Göteborg".to_string(),
        waypoints: vec![
            Waypoint::new("Stockholm", 59.3293, 18.0686, 0.0),
            Waypoint::new("Södertälje", 59.1955, 17.6253, 36.0),
            Waypoint::new("Nyköping", 58.7530, 17.0079, 68.0),
            Waypoint::new("Norrköping", 58.5877, 16.1924, 62.0),
            Waypoint::new("Linköping", 58.4108, 15.6214, 44.0),
            Waypoint::new("Jönköping", 57.7826, 14.1618, 130.0),
            Waypoint::new("Borås", 57.7210, 12.9401, 110.0),
            Waypoint::new("Göteborg", 57.7089, 11.9746, 64.0),
        ],
    };

    vec![e4_north, e4_south, west]
}
