//! # Mesh Documents
//!
//! The persisted mesh format: a JSON document carrying polygons either as
//! one flat list (inline materials) or grouped by material index when a
//! `materials` table is present. Round-trips preserve polygon identity up
//! to material normalization.

use serde::{Deserialize, Serialize};

use crate::error::GeometryError;
use crate::material::Material;
use crate::math::Bounds;
use crate::mesh::Mesh;
use crate::polygon::Polygon;

/// Polygon payload: flat with inline materials, or grouped by the index
/// of an accompanying material table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PolygonSet {
    /// Inline-material form.
    Flat(Vec<Polygon>),
    /// Material-table form: `polygons[i]` all use `materials[i]`.
    Grouped(Vec<Vec<Polygon>>),
}

/// A serializable mesh document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshDocument {
    /// Mesh surface.
    pub polygons: PolygonSet,
    /// Optional precomputed bounds hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
    /// Optional convexity hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub convex: Option<bool>,
    /// Material table for the grouped polygon form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub materials: Option<Vec<Material>>,
}

impl MeshDocument {
    /// Captures a mesh into document form.
    ///
    /// Meshes with any materialized polygon serialize in the grouped form
    /// (materials hoisted into the table and stripped from polygons);
    /// all-default meshes stay flat.
    pub fn from_mesh(mesh: &Mesh) -> Self {
        let has_materials = mesh.polygons().iter().any(|p| p.material().is_some());
        let polygons = if has_materials {
            let materials = mesh.materials().to_vec();
            let mut groups: Vec<Vec<Polygon>> = vec![Vec::new(); materials.len()];
            for poly in mesh.polygons() {
                let material = poly.material().cloned().unwrap_or_default();
                let index = materials
                    .iter()
                    .position(|m| *m == material)
                    .unwrap_or(0);
                groups[index].push(poly.with_material_replaced(None));
            }
            return Self {
                polygons: PolygonSet::Grouped(groups),
                bounds: Some(mesh.bounds()),
                convex: Some(mesh.is_convex()),
                materials: Some(materials),
            };
        } else {
            PolygonSet::Flat(mesh.polygons().to_vec())
        };
        Self {
            polygons,
            bounds: Some(mesh.bounds()),
            convex: Some(mesh.is_convex()),
            materials: None,
        }
    }

    /// Reconstructs the mesh, reattaching grouped materials.
    pub fn into_mesh(self) -> Result<Mesh, GeometryError> {
        let polygons: Vec<Polygon> = match self.polygons {
            PolygonSet::Flat(polygons) => polygons,
            PolygonSet::Grouped(groups) => {
                let materials = self.materials.unwrap_or_default();
                let mut out = Vec::new();
                for (index, group) in groups.into_iter().enumerate() {
                    let material = materials.get(index).cloned();
                    let material = material.filter(|m| !m.is_default());
                    for poly in group {
                        out.push(poly.with_material_replaced(material.clone()));
                    }
                }
                out
            }
        };
        for poly in &polygons {
            if poly.vertices().len() < 3 {
                return Err(GeometryError::InvalidDocument(
                    "polygon with fewer than 3 vertices".to_string(),
                ));
            }
            for v in poly.vertices() {
                if !poly.plane().contains_point(v.position) {
                    return Err(GeometryError::InvalidDocument(
                        "polygon vertices do not lie on the stored plane".to_string(),
                    ));
                }
            }
        }
        // A false hint is discarded: convexity may still hold and is
        // cheap enough to recompute lazily.
        Ok(Mesh::with_convexity(polygons, self.convex.filter(|&c| c)))
    }

    /// Serializes to JSON text.
    pub fn to_json(&self) -> Result<String, GeometryError> {
        serde_json::to_string(self)
            .map_err(|e| GeometryError::InvalidDocument(e.to_string()))
    }

    /// Parses JSON text.
    pub fn from_json(text: &str) -> Result<Self, GeometryError> {
        serde_json::from_str(text)
            .map_err(|e| GeometryError::InvalidDocument(e.to_string()))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Color;
    use crate::primitives;

    #[test]
    fn test_roundtrip_flat() {
        let mesh = primitives::cube();
        let doc = MeshDocument::from_mesh(&mesh);
        assert!(matches!(doc.polygons, PolygonSet::Flat(_)));
        let json = doc.to_json().unwrap();
        let back = MeshDocument::from_json(&json).unwrap().into_mesh().unwrap();
        assert_eq!(back, mesh);
    }

    #[test]
    fn test_roundtrip_grouped_materials() {
        let red = Material::color(Color::RED);
        let mesh = primitives::cube().with_default_material(&red);
        let doc = MeshDocument::from_mesh(&mesh);
        assert!(matches!(doc.polygons, PolygonSet::Grouped(_)));
        assert_eq!(doc.materials.as_ref().map(Vec::len), Some(1));

        let json = doc.to_json().unwrap();
        let back = MeshDocument::from_json(&json).unwrap().into_mesh().unwrap();
        assert_eq!(back.polygons().len(), mesh.polygons().len());
        assert!(back
            .polygons()
            .iter()
            .all(|p| p.material() == Some(&red)));
    }

    #[test]
    fn test_convexity_hint_survives() {
        let doc = MeshDocument::from_mesh(&primitives::cube());
        assert_eq!(doc.convex, Some(true));
        let mesh = doc.into_mesh().unwrap();
        assert!(mesh.is_convex());
    }

    #[test]
    fn test_invalid_document_rejected() {
        assert!(MeshDocument::from_json("{not json").is_err());
        assert!(MeshDocument::from_json("{\"polygons\": 42}").is_err());
    }
}
