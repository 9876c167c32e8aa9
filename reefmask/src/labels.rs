//! Class label registry: ordered class name to RGB color.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const BACKGROUND: &str = "Background";
pub const EMPTY: &str = "Empty";
pub const BACKGROUND_COLOR: [u8; 3] = [0, 0, 0];
pub const EMPTY_COLOR: [u8; 3] = [255, 255, 255];

/// One class entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub color: [u8; 3],
}

/// Ordered class registry. `Background` and `Empty` are always present and
/// cannot be redefined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Label>", into = "Vec<Label>")]
pub struct LabelRegistry {
    labels: Vec<Label>,
}

impl Default for LabelRegistry {
    fn default() -> Self {
        Self {
            labels: vec![
                Label {
                    name: BACKGROUND.to_string(),
                    color: BACKGROUND_COLOR,
                },
                Label {
                    name: EMPTY.to_string(),
                    color: EMPTY_COLOR,
                },
            ],
        }
    }
}

impl LabelRegistry {
    #[inline]
    pub fn is_reserved(name: &str) -> bool {
        name == BACKGROUND || name == EMPTY
    }

    /// Adds a class or recolors an existing one.
    pub fn insert(&mut self, name: &str, color: [u8; 3]) -> Result<()> {
        if Self::is_reserved(name) {
            return Err(Error::ReservedLabel(name.to_string()));
        }
        match self.labels.iter_mut().find(|l| l.name == name) {
            Some(label) => label.color = color,
            None => self.labels.push(Label {
                name: name.to_string(),
                color,
            }),
        }
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<Option<Label>> {
        if Self::is_reserved(name) {
            return Err(Error::ReservedLabel(name.to_string()));
        }
        let position = self.labels.iter().position(|l| l.name == name);
        Ok(position.map(|i| self.labels.remove(i)))
    }

    pub fn color_of(&self, name: &str) -> Option<[u8; 3]> {
        self.labels.iter().find(|l| l.name == name).map(|l| l.color)
    }

    /// First label (in registry order) with exactly this color.
    pub fn by_color(&self, color: [u8; 3]) -> Option<&Label> {
        self.labels.iter().find(|l| l.color == color)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Label> {
        self.labels.iter()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Loads user classes from a YAML or JSON list of `{name, color}`
    /// entries; the reserved entries are added automatically.
    pub fn from_file(path: &Path) -> Result<Self> {
        let labels: Vec<Label> = common::file_format::load_file(path)?;
        Self::try_from(labels)
    }
}

impl TryFrom<Vec<Label>> for LabelRegistry {
    type Error = Error;

    fn try_from(labels: Vec<Label>) -> Result<Self> {
        let mut registry = Self::default();
        for label in labels {
            if Self::is_reserved(&label.name) {
                let expected = registry.color_of(&label.name);
                if expected != Some(label.color) {
                    return Err(Error::ReservedLabel(label.name));
                }
                continue;
            }
            registry.insert(&label.name, label.color)?;
        }
        Ok(registry)
    }
}

impl From<LabelRegistry> for Vec<Label> {
    fn from(registry: LabelRegistry) -> Self {
        registry.labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::SerdeFormat;

    #[test]
    fn test_reserved_entries_present() {
        let registry = LabelRegistry::default();
        assert_eq!(registry.color_of(BACKGROUND), Some([0, 0, 0]));
        assert_eq!(registry.color_of(EMPTY), Some([255, 255, 255]));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_reserved_names_cannot_be_overwritten() {
        let mut registry = LabelRegistry::default();
        let err = registry.insert(EMPTY, [1, 2, 3]).unwrap_err();
        assert!(matches!(err, Error::ReservedLabel(name) if name == EMPTY));
        assert!(registry.remove(BACKGROUND).is_err());
        assert_eq!(registry.color_of(EMPTY), Some([255, 255, 255]));
    }

    #[test]
    fn test_insert_keeps_order_and_recolors() {
        let mut registry = LabelRegistry::default();
        registry.insert("Pocillopora", [255, 0, 0]).unwrap();
        registry.insert("Porites", [0, 255, 0]).unwrap();
        registry.insert("Pocillopora", [200, 0, 0]).unwrap();

        let names: Vec<&str> = registry.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, [BACKGROUND, EMPTY, "Pocillopora", "Porites"]);
        assert_eq!(registry.by_color([200, 0, 0]).unwrap().name, "Pocillopora");
        assert!(registry.by_color([255, 0, 0]).is_none());
    }

    #[test]
    fn test_first_match_wins_for_shared_color() {
        let mut registry = LabelRegistry::default();
        registry.insert("A", [9, 9, 9]).unwrap();
        registry.insert("B", [9, 9, 9]).unwrap();
        assert_eq!(registry.by_color([9, 9, 9]).unwrap().name, "A");
    }

    #[test]
    fn test_deserialize_rejects_recolored_reserved_label() {
        let ok: LabelRegistry = SerdeFormat::Json
            .deserialize(r#"[{"name": "Porites", "color": [0, 255, 0]}]"#)
            .unwrap();
        assert_eq!(ok.len(), 3);

        let bad: std::result::Result<LabelRegistry, _> = SerdeFormat::Json
            .deserialize(r#"[{"name": "Empty", "color": [1, 1, 1]}]"#);
        assert!(bad.is_err());
    }
}
