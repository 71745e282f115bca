use serde::{Deserialize, Serialize};

/// Usuario logueado (guardado por la pantalla de login en localStorage)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub department: Option<String>,
}

impl User {
    /// Nombre para mostrar en la tarjeta de asistencia
    pub fn display_name(&self) -> String {
        match &self.department {
            Some(dept) if !dept.is_empty() => format!("{} ({})", self.name, dept),
            _ => self.name.clone(),
        }
    }
}
