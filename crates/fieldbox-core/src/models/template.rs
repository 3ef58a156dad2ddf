//! Template model: named field boxes keyed by page.
//!
//! On disk a template is a JSON object keyed by `"page number: N"`, each
//! value an ordered list of `{ "name": ..., "coords": [x1, y1, x2, y2] }`.
//! This layout is shared by the box editor and the batch pipeline.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::geometry::{PageIndex, Rect};
use crate::error::TemplateError;

/// One named rectangular region on one page.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldBox {
    /// Field name, used as the output column header.
    pub name: String,
    /// Page the box belongs to.
    pub page: PageIndex,
    /// Region in document points.
    pub rect: Rect,
}

/// Serialized form of a field box.
#[derive(Debug, Serialize, Deserialize)]
struct RawFieldBox {
    name: String,
    coords: Vec<f64>,
}

/// An ordered, page-indexed collection of field boxes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Template {
    pages: BTreeMap<PageIndex, Vec<FieldBox>>,
}

impl Template {
    /// Create an empty template.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a template from a JSON file.
    ///
    /// A missing or unreadable file is reported as a format error, since
    /// either way there is no usable template.
    pub fn load(path: &Path) -> Result<Self, TemplateError> {
        let content = fs::read_to_string(path).map_err(|e| TemplateError::Format {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let template = Self::from_json(&content).map_err(|e| match e {
            TemplateError::Format { reason, .. } => TemplateError::Format {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })?;

        debug!(
            "Loaded template {} with {} field(s) on {} page(s)",
            path.display(),
            template.field_count(),
            template.page_count()
        );
        Ok(template)
    }

    /// Parse a template from its JSON representation.
    pub fn from_json(content: &str) -> Result<Self, TemplateError> {
        let format_error = |reason: String| TemplateError::Format {
            path: Default::default(),
            reason,
        };

        let raw: BTreeMap<String, Vec<RawFieldBox>> =
            serde_json::from_str(content).map_err(|e| format_error(e.to_string()))?;

        let mut template = Self::new();
        for (key, boxes) in raw {
            let page = PageIndex::from_page_key(&key)?;
            if template.pages.contains_key(&page) {
                return Err(format_error(format!("page {page} is declared twice")));
            }

            for field in boxes {
                let coords: [f64; 4] = field.coords.as_slice().try_into().map_err(|_| {
                    format_error(format!(
                        "field {:?} on page {page} has {} coordinate(s), expected 4",
                        field.name,
                        field.coords.len()
                    ))
                })?;
                template.add_field(page, field.name, coords)?;
            }
        }

        Ok(template)
    }

    /// Serialize to pretty JSON with 4-space indentation. Empty pages are omitted.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)?;
        // serde_json only ever writes valid UTF-8.
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Save the template to a JSON file. Empty pages are omitted.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let content = self.to_json().map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;

        debug!("Saved template with {} field(s) to {}", self.field_count(), path.display());
        Ok(())
    }

    /// Add a field box to a page.
    ///
    /// Fails if the name is already used on that page or if the rectangle
    /// has zero width or height.
    pub fn add_field(
        &mut self,
        page: PageIndex,
        name: impl Into<String>,
        coords: [f64; 4],
    ) -> Result<&FieldBox, TemplateError> {
        let name = name.into();

        let rect = Rect::from_coords(coords).ok_or_else(|| TemplateError::DegenerateRect {
            name: name.clone(),
            x1: coords[0],
            y1: coords[1],
            x2: coords[2],
            y2: coords[3],
        })?;

        let fields = self.pages.entry(page).or_default();
        if fields.iter().any(|f| f.name == name) {
            return Err(TemplateError::DuplicateField {
                page: page.get(),
                name,
            });
        }

        fields.push(FieldBox { name, page, rect });
        Ok(&fields[fields.len() - 1])
    }

    /// Remove the most recently added box on a page. No-op on an empty page.
    pub fn remove_last_field(&mut self, page: PageIndex) -> Option<FieldBox> {
        self.pages.get_mut(&page).and_then(Vec::pop)
    }

    /// Remove every box on a page. No-op on an empty page.
    pub fn clear_page(&mut self, page: PageIndex) {
        if let Some(fields) = self.pages.get_mut(&page) {
            fields.clear();
        }
    }

    /// Drop pages that have no boxes left.
    pub fn prune_empty_pages(&mut self) {
        self.pages.retain(|_, fields| !fields.is_empty());
    }

    /// Field boxes declared for a page, in authoring order.
    pub fn fields(&self, page: PageIndex) -> &[FieldBox] {
        self.pages.get(&page).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Pages that carry at least one box, in ascending order.
    pub fn pages(&self) -> impl Iterator<Item = PageIndex> + '_ {
        self.pages
            .iter()
            .filter(|(_, fields)| !fields.is_empty())
            .map(|(page, _)| *page)
    }

    /// The lowest page with at least one box.
    pub fn first_page(&self) -> Option<PageIndex> {
        self.pages().next()
    }

    /// Number of pages with at least one box.
    pub fn page_count(&self) -> usize {
        self.pages().count()
    }

    /// Total number of boxes across all pages.
    pub fn field_count(&self) -> usize {
        self.pages.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.field_count() == 0
    }

    /// All boxes in page order, then authoring order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldBox> {
        self.pages.values().flatten()
    }
}

impl Serialize for Template {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.page_count()))?;
        for page in self.pages() {
            let boxes: Vec<RawFieldBox> = self
                .fields(page)
                .iter()
                .map(|f| RawFieldBox {
                    name: f.name.clone(),
                    coords: f.rect.coords().to_vec(),
                })
                .collect();
            map.serialize_entry(&page.page_key(), &boxes)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn page(n: u32) -> PageIndex {
        PageIndex::new(n).unwrap()
    }

    #[test]
    fn test_parse_single_page_template() {
        let template = Template::from_json(
            r#"{"page number: 1": [{"name": "Doc#", "coords": [0, 0, 100, 20]}]}"#,
        )
        .unwrap();

        let fields = template.fields(PageIndex::FIRST);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "Doc#");
        assert_eq!(fields[0].rect.coords(), [0.0, 0.0, 100.0, 20.0]);
    }

    #[test]
    fn test_parse_rejects_bad_coords() {
        let err = Template::from_json(
            r#"{"page number: 1": [{"name": "Doc#", "coords": [0, 0, 100]}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, TemplateError::Format { .. }));

        let err = Template::from_json(
            r#"{"page number: 1": [{"name": "Doc#", "coords": [0, 0, "a", 20]}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, TemplateError::Format { .. }));
    }

    #[test]
    fn test_parse_rejects_non_mapping() {
        assert!(matches!(
            Template::from_json(r#"[1, 2, 3]"#),
            Err(TemplateError::Format { .. })
        ));
        assert!(matches!(
            Template::from_json(r#"{"first page": []}"#),
            Err(TemplateError::InvalidPageKey(_))
        ));
    }

    #[test]
    fn test_parse_rejects_duplicate_names() {
        let err = Template::from_json(
            r#"{"page number: 1": [
                {"name": "Qty", "coords": [0, 0, 10, 10]},
                {"name": "Qty", "coords": [20, 0, 30, 10]}
            ]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, TemplateError::DuplicateField { page: 1, .. }));
    }

    #[test]
    fn test_add_field_validation() {
        let mut template = Template::new();
        template.add_field(page(1), "Qty", [0.0, 0.0, 10.0, 10.0]).unwrap();

        assert!(matches!(
            template.add_field(page(1), "Qty", [20.0, 0.0, 30.0, 10.0]),
            Err(TemplateError::DuplicateField { .. })
        ));
        assert!(matches!(
            template.add_field(page(1), "Flat", [0.0, 5.0, 30.0, 5.0]),
            Err(TemplateError::DegenerateRect { .. })
        ));
        assert!(matches!(
            template.add_field(page(1), "Thin", [7.0, 0.0, 7.0, 30.0]),
            Err(TemplateError::DegenerateRect { .. })
        ));

        // Same name on another page is fine.
        template.add_field(page(2), "Qty", [0.0, 0.0, 10.0, 10.0]).unwrap();
        assert_eq!(template.field_count(), 2);
    }

    #[test]
    fn test_remove_and_clear_are_noops_on_empty_pages() {
        let mut template = Template::new();
        assert!(template.remove_last_field(page(3)).is_none());
        template.clear_page(page(3));
        assert!(template.is_empty());

        template.add_field(page(1), "A", [0.0, 0.0, 1.0, 1.0]).unwrap();
        template.add_field(page(1), "B", [0.0, 2.0, 1.0, 3.0]).unwrap();
        assert_eq!(template.remove_last_field(page(1)).unwrap().name, "B");
        template.clear_page(page(1));
        assert!(template.fields(page(1)).is_empty());
    }

    #[test]
    fn test_save_prunes_empty_pages_and_orders_numerically() {
        let mut template = Template::new();
        template.add_field(page(10), "Late", [0.0, 0.0, 5.0, 5.0]).unwrap();
        template.add_field(page(2), "Early", [0.0, 0.0, 5.0, 5.0]).unwrap();
        template.add_field(page(3), "Gone", [0.0, 0.0, 5.0, 5.0]).unwrap();
        template.clear_page(page(3));

        let json = template.to_json().unwrap();
        assert!(!json.contains("page number: 3"));
        let early = json.find("page number: 2").unwrap();
        let late = json.find("page number: 10").unwrap();
        assert!(early < late);
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("form.json");

        let mut template = Template::new();
        template.add_field(page(1), "Doc#", [10.5, 20.0, 110.0, 40.25]).unwrap();
        template.add_field(page(1), "NSN", [10.0, 50.0, 200.0, 70.0]).unwrap();
        template.add_field(page(2), "POC Email", [30.0, 600.0, 300.0, 620.0]).unwrap();

        template.save(&path).unwrap();
        let loaded = Template::load(&path).unwrap();
        assert_eq!(loaded, template);

        loaded.save(&path).unwrap();
        assert_eq!(Template::load(&path).unwrap(), template);
    }

    #[test]
    fn test_load_missing_file_is_format_error() {
        let err = Template::load(Path::new("/nonexistent/form.json")).unwrap_err();
        match err {
            TemplateError::Format { path, .. } => {
                assert_eq!(path, Path::new("/nonexistent/form.json"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
