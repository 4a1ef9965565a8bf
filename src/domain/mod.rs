// Domain layer: models, postal-code rules and ports (interfaces). No network code here.

pub mod cep;
pub mod model;
pub mod ports;
