pub mod layer;
pub mod layer_namespace;
pub mod namespace;
