use serde::{Deserialize, Serialize};

/// Punto en coordenadas del frame (píxeles)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Resultado de un decode exitoso. Se entrega una vez al callback y no se guarda.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedResult {
    pub text: String,
    /// Esquinas del código, en orden (top-left, top-right, bottom-right, bottom-left)
    pub bounding_quad: [Point; 4],
}
