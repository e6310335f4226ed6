// Domain layer: records, filter state and the ports the stores depend on.

pub mod model;
pub mod ports;
