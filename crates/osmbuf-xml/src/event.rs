//! Markup events consumed by the parser.
//!
//! The token source (not part of this crate) turns raw markup text into
//! these events. Attribute order and duplicates are preserved as found
//! in the input; the parser decides what each attribute means.

use smallvec::SmallVec;

/// Ordered (name, value) attribute pairs of a start element.
///
/// Real OSM elements rarely carry more than eight attributes, so the
/// common case stays off the heap.
pub type Attributes = SmallVec<[(String, String); 8]>;

/// One markup token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum XmlEvent {
    /// An opening element with its attributes.
    Start {
        /// Element name.
        name: String,
        /// Attributes in document order, duplicates preserved.
        attributes: Attributes,
    },
    /// A closing element.
    End {
        /// Element name.
        name: String,
    },
    /// Raw character data between elements.
    Characters(String),
    /// An XML entity declaration was found in the input.
    ///
    /// Entity declarations are not used by OSM data and can be misused
    /// for entity-expansion amplification, so the token source reports
    /// them and the parser fails the run.
    EntityDeclaration,
}

impl XmlEvent {
    /// Convenience constructor for a start element.
    pub fn start(name: &str, attributes: &[(&str, &str)]) -> Self {
        Self::Start {
            name: name.to_owned(),
            attributes: attributes
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
        }
    }

    /// Convenience constructor for an end element.
    pub fn end(name: &str) -> Self {
        Self::End {
            name: name.to_owned(),
        }
    }

    /// Convenience constructor for character data.
    pub fn text(data: &str) -> Self {
        Self::Characters(data.to_owned())
    }
}
