// Domain layer: work-order schema and ports (interfaces).

pub mod model;
pub mod ports;
