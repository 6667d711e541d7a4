//! Section input files.

use anyhow::{Context, Result};
use serde::Deserialize;
use tube_kernel::{Section, Vec3};

/// One section as written by hand: an ordered point list.
#[derive(Debug, Deserialize)]
pub struct SectionInput {
    /// `[x, y, z]` triples in boundary order.
    pub points: Vec<[f32; 3]>,
    /// Display rotation in degrees.
    #[serde(default)]
    pub rotation_angle: f32,
}

/// A sections file: `{ "sections": [ { "points": [[x, y, z], ...] }, ... ] }`.
#[derive(Debug, Deserialize)]
pub struct SectionsFile {
    pub sections: Vec<SectionInput>,
}

impl SectionsFile {
    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("parsing sections file")
    }

    pub fn into_sections(self) -> Vec<Section> {
        self.sections
            .into_iter()
            .map(|s| {
                let mut section = Section::from_points(s.points.into_iter().map(Vec3::from).collect());
                section.set_rotation_angle(s.rotation_angle);
                section
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sections_file() {
        let json = r#"{
            "sections": [
                { "points": [[0, 0, 0], [1, 0, 0], [1, 1, 0]] },
                { "points": [[0, 0, 5], [1, 0, 5], [1, 1, 5]], "rotation_angle": 45 }
            ]
        }"#;
        let sections = SectionsFile::parse(json).unwrap().into_sections();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[1].z(), Some(5.0));
        assert_eq!(sections[1].rotation_angle(), 45.0);
        assert_eq!(sections[0].points()[1], Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_parse_rejects_bad_points() {
        assert!(SectionsFile::parse(r#"{ "sections": [ { "points": [[0, 0]] } ] }"#).is_err());
    }
}
