/// Engine construction parameters.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Initial task capacity reserved for each layer. Layers grow past it as needed.
    pub layer_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            layer_capacity: 200,
        }
    }
}
