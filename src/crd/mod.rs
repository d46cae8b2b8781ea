mod content_delivery_network;
mod content_delivery_network_node;

pub use content_delivery_network::*;
pub use content_delivery_network_node::*;
