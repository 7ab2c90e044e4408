//! Canvas widgets.

pub mod flow_network;
