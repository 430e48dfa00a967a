//! The document-level header.
//!
//! An OSM file carries a small amount of metadata on its root element
//! and in leading `<bounds>` elements. The reader collects this into a
//! [`Header`] and delivers it exactly once per run: either when the
//! first entity element is seen, or at end of input if there are none.

use indexmap::IndexMap;

use crate::location::Location;

/// A min/max coordinate pair from a `<bounds>` element or changeset
/// bounds attributes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BoundingBox {
    min: Location,
    max: Location,
}

impl BoundingBox {
    /// Create a box from a min and max corner.
    pub fn new(min: Location, max: Location) -> Self {
        Self { min, max }
    }

    /// Grow the box to include the given location.
    ///
    /// Undefined coordinates are ignored; extending an empty box by a
    /// defined location makes that location both corners.
    pub fn extend(&mut self, location: Location) -> &mut Self {
        if !location.is_defined() {
            return self;
        }
        if !self.min.is_defined() || !self.max.is_defined() {
            self.min = location;
            self.max = location;
            return self;
        }
        if location.raw_lon() < self.min.raw_lon() {
            self.min = Location::from_raw(location.raw_lon(), self.min.raw_lat());
        }
        if location.raw_lat() < self.min.raw_lat() {
            self.min = Location::from_raw(self.min.raw_lon(), location.raw_lat());
        }
        if location.raw_lon() > self.max.raw_lon() {
            self.max = Location::from_raw(location.raw_lon(), self.max.raw_lat());
        }
        if location.raw_lat() > self.max.raw_lat() {
            self.max = Location::from_raw(self.max.raw_lon(), location.raw_lat());
        }
        self
    }

    /// Minimum corner.
    pub fn min(&self) -> Location {
        self.min
    }

    /// Maximum corner.
    pub fn max(&self) -> Location {
        self.max
    }

    /// Whether both corners are defined.
    pub fn is_defined(&self) -> bool {
        self.min.is_defined() && self.max.is_defined()
    }
}

/// Metadata collected from the document's root element and `<bounds>`
/// children.
///
/// Free-form settings (version, generator, anything future formats add)
/// are kept in an insertion-ordered map so the header can be written
/// back out in document order.
#[derive(Clone, Debug, Default)]
pub struct Header {
    settings: IndexMap<String, String>,
    boxes: Vec<BoundingBox>,
    has_multiple_object_versions: bool,
}

impl Header {
    /// Create an empty header.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a named header value, replacing any previous one.
    pub fn set(&mut self, key: &str, value: &str) {
        self.settings.insert(key.to_owned(), value.to_owned());
    }

    /// Get a named header value, or "" if unset.
    pub fn get(&self, key: &str) -> &str {
        self.settings.get(key).map(String::as_str).unwrap_or("")
    }

    /// All settings in insertion order.
    pub fn settings(&self) -> impl Iterator<Item = (&str, &str)> {
        self.settings.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Add a bounding box from a `<bounds>` element.
    pub fn add_box(&mut self, bbox: BoundingBox) {
        self.boxes.push(bbox);
    }

    /// All bounding boxes seen so far, in document order.
    pub fn boxes(&self) -> &[BoundingBox] {
        &self.boxes
    }

    /// Mark the document as containing multiple versions per object id
    /// (diff / osmChange semantics).
    pub fn set_has_multiple_object_versions(&mut self, value: bool) {
        self.has_multiple_object_versions = value;
    }

    /// Whether the document may contain multiple versions per object id.
    pub fn has_multiple_object_versions(&self) -> bool {
        self.has_multiple_object_versions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_preserve_order_and_overwrite() {
        let mut header = Header::new();
        header.set("version", "0.6");
        header.set("generator", "test");
        header.set("version", "0.6");
        let keys: Vec<&str> = header.settings().map(|(k, _)| k).collect();
        assert_eq!(keys, ["version", "generator"]);
        assert_eq!(header.get("generator"), "test");
        assert_eq!(header.get("missing"), "");
    }

    #[test]
    fn extend_empty_box() {
        let mut bbox = BoundingBox::default();
        assert!(!bbox.is_defined());
        bbox.extend(Location::from_degrees(1.0, 2.0));
        assert!(bbox.is_defined());
        assert_eq!(bbox.min(), bbox.max());
    }

    #[test]
    fn extend_grows_in_all_directions() {
        let mut bbox = BoundingBox::default();
        bbox.extend(Location::from_degrees(1.0, 1.0));
        bbox.extend(Location::from_degrees(-1.0, 3.0));
        assert_eq!(bbox.min(), Location::from_degrees(-1.0, 1.0));
        assert_eq!(bbox.max(), Location::from_degrees(1.0, 3.0));
    }

    #[test]
    fn extend_ignores_undefined() {
        let mut bbox = BoundingBox::default();
        bbox.extend(Location::UNDEFINED);
        assert!(!bbox.is_defined());
    }

    #[test]
    fn multiple_boxes_kept_in_order() {
        let mut header = Header::new();
        let mut a = BoundingBox::default();
        a.extend(Location::from_degrees(0.0, 0.0));
        header.add_box(a);
        header.add_box(BoundingBox::default());
        assert_eq!(header.boxes().len(), 2);
    }
}
