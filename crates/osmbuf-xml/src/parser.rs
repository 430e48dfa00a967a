//! The streaming parser state machine.
//!
//! [`XmlParser`] consumes markup events and drives the arena builders.
//! It tracks the nested document context across the four entity kinds
//! and their sub-elements, applies the entity-kind filter, honors
//! create/modify/delete change semantics, and rejects malformed or
//! hostile input.
//!
//! The (context, element-name) dispatch is an exhaustively checked
//! match so adding an entity kind cannot silently fall through.

use crossbeam_channel::Sender;

use osmbuf_arena::{ArenaBuffer, Builder, CommentHandle, EntityHandle};
use osmbuf_core::error::{ReadError, ValidationError};
use osmbuf_core::location::parse_coordinate;
use osmbuf_core::types::{parse_changeset_id, parse_object_id, parse_user_id, parse_version};
use osmbuf_core::{BoundingBox, EntityFilter, Header, ItemKind, Location, Timestamp};

use crate::event::{Attributes, XmlEvent};
use crate::reader::ReaderConfig;

/// The single supported format version.
const SUPPORTED_VERSION: &str = "0.6";

/// Where in the document the parser currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Context {
    Root,
    Top,
    Node,
    Way,
    Relation,
    Changeset,
    Discussion,
    Comment,
    CommentText,
    /// Inside a generic sub-element of an entity; the prior context is
    /// remembered in `last_context`.
    InObject,
    IgnoredNode,
    IgnoredWay,
    IgnoredRelation,
    IgnoredChangeset,
}

/// Which nested list is currently open under the active entity.
///
/// At most one is open at a time; opening a differently-kinded list
/// closes the previous one first, which fixes the padding boundary and
/// is therefore an explicit step rather than a side effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OpenList {
    None,
    Tags,
    NodeRefs,
    Members,
    Discussion,
}

/// Streaming parser turning markup events into arena records.
///
/// Feed events with [`XmlParser::feed`]; when the input is exhausted,
/// call [`XmlParser::finish`]. Full buffers are handed off through the
/// output channel as soon as their committed bytes cross the high-water
/// mark; the document header is delivered exactly once on its own
/// channel, either at the first entity element or at end of input.
pub struct XmlParser {
    context: Context,
    last_context: Context,
    /// Depth of unrecognized elements below the one that entered
    /// [`Context::InObject`].
    in_object_depth: usize,
    /// Sticky while inside a `<delete>` section of a change file.
    in_delete_section: bool,
    header: Header,
    header_tx: Option<Sender<Header>>,
    builder: Builder,
    buffer_capacity: usize,
    open_list: OpenList,
    /// Comment whose text has not been written yet.
    comment: Option<CommentHandle>,
    comment_text: String,
    filter: EntityFilter,
    output: Sender<ArenaBuffer>,
}

impl XmlParser {
    /// Create a parser writing finished buffers to `output` and the
    /// document header to `header_tx`.
    pub fn new(
        config: &ReaderConfig,
        filter: EntityFilter,
        output: Sender<ArenaBuffer>,
        header_tx: Sender<Header>,
    ) -> Self {
        Self {
            context: Context::Root,
            last_context: Context::Root,
            in_object_depth: 0,
            in_delete_section: false,
            header: Header::new(),
            header_tx: Some(header_tx),
            builder: Builder::new(ArenaBuffer::with_capacity(config.buffer_capacity)),
            buffer_capacity: config.buffer_capacity,
            open_list: OpenList::None,
            comment: None,
            comment_text: String::new(),
            filter,
            output,
        }
    }

    /// Whether the header has been delivered.
    pub fn header_done(&self) -> bool {
        self.header_tx.is_none()
    }

    /// Whether no further input can produce output: the filter selects
    /// nothing and the header is already delivered.
    pub fn is_drained(&self) -> bool {
        self.filter.is_empty() && self.header_done()
    }

    /// Consume one markup event.
    pub fn feed(&mut self, event: XmlEvent) -> Result<(), ReadError> {
        match event {
            XmlEvent::Start { name, attributes } => self.start_element(&name, &attributes),
            XmlEvent::End { name } => self.end_element(&name),
            XmlEvent::Characters(text) => {
                self.characters(&text);
                Ok(())
            }
            XmlEvent::EntityDeclaration => Err(ReadError::Markup {
                reason: "XML entities are not supported".to_owned(),
            }),
        }
    }

    /// Finish the run: deliver the header if no entity triggered it,
    /// and flush a non-empty buffer.
    pub fn finish(mut self) -> Result<(), ReadError> {
        if self.builder.depth() > 0 {
            return Err(ReadError::Markup {
                reason: "input ended with an element still open".to_owned(),
            });
        }
        self.deliver_header();
        let buffer = self.builder.replace_buffer(ArenaBuffer::with_capacity(0));
        if buffer.committed() > 0 {
            self.output
                .send(buffer)
                .map_err(|_| ReadError::Disconnected)?;
        }
        Ok(())
    }

    fn start_element(&mut self, name: &str, attrs: &Attributes) -> Result<(), ReadError> {
        match self.context {
            Context::Root => self.start_document(name, attrs),
            Context::Top => match name {
                "node" => self.begin_entity(ItemKind::Node, attrs),
                "way" => self.begin_entity(ItemKind::Way, attrs),
                "relation" => self.begin_entity(ItemKind::Relation, attrs),
                "changeset" => self.begin_entity(ItemKind::Changeset, attrs),
                "bounds" => {
                    self.merge_bounds(attrs);
                    Ok(())
                }
                "delete" => {
                    self.in_delete_section = true;
                    Ok(())
                }
                // create/modify sections and anything else at this
                // level are structurally ignored.
                _ => Ok(()),
            },
            Context::Node => {
                self.last_context = Context::Node;
                self.context = Context::InObject;
                if name == "tag" {
                    self.ensure_list(OpenList::Tags)?;
                    self.append_tag(attrs)?;
                }
                Ok(())
            }
            Context::Way => {
                self.last_context = Context::Way;
                self.context = Context::InObject;
                match name {
                    "nd" => {
                        self.ensure_list(OpenList::NodeRefs)?;
                        self.append_node_ref(attrs)
                    }
                    "tag" => {
                        self.ensure_list(OpenList::Tags)?;
                        self.append_tag(attrs)
                    }
                    _ => Ok(()),
                }
            }
            Context::Relation => {
                self.last_context = Context::Relation;
                self.context = Context::InObject;
                match name {
                    "member" => {
                        self.ensure_list(OpenList::Members)?;
                        self.append_member(attrs)
                    }
                    "tag" => {
                        self.ensure_list(OpenList::Tags)?;
                        self.append_tag(attrs)
                    }
                    _ => Ok(()),
                }
            }
            Context::Changeset => {
                self.last_context = Context::Changeset;
                match name {
                    "discussion" => {
                        self.context = Context::Discussion;
                        self.ensure_list(OpenList::Discussion)
                    }
                    "tag" => {
                        self.context = Context::InObject;
                        self.ensure_list(OpenList::Tags)?;
                        self.append_tag(attrs)
                    }
                    _ => {
                        self.context = Context::InObject;
                        Ok(())
                    }
                }
            }
            Context::Discussion => {
                if name == "comment" {
                    self.context = Context::Comment;
                    self.append_comment(attrs)?;
                }
                Ok(())
            }
            Context::Comment => {
                if name == "text" {
                    self.context = Context::CommentText;
                }
                Ok(())
            }
            Context::CommentText => Ok(()),
            Context::InObject => {
                self.in_object_depth += 1;
                Ok(())
            }
            Context::IgnoredNode
            | Context::IgnoredWay
            | Context::IgnoredRelation
            | Context::IgnoredChangeset => Ok(()),
        }
    }

    fn end_element(&mut self, name: &str) -> Result<(), ReadError> {
        match self.context {
            Context::Root => Err(ReadError::Markup {
                reason: format!("unexpected closing element '{name}' at document root"),
            }),
            Context::Top => {
                match name {
                    "osm" | "osmChange" => {
                        self.deliver_header();
                        self.context = Context::Root;
                    }
                    "delete" => {
                        self.in_delete_section = false;
                    }
                    _ => {}
                }
                Ok(())
            }
            Context::Node | Context::Way | Context::Relation | Context::Changeset => {
                self.finish_entity()
            }
            // Closing tags of unrecognized children must not pop the
            // discussion state, so each arm checks the element name.
            Context::Discussion => {
                if name == "discussion" {
                    self.context = Context::Changeset;
                }
                Ok(())
            }
            Context::Comment => {
                if name == "comment" {
                    self.context = Context::Discussion;
                    // A comment without a <text> element still has to be
                    // finalized so the next item starts aligned.
                    if let Some(handle) = self.comment.take() {
                        self.builder.add_comment_text(handle, "")?;
                    }
                }
                Ok(())
            }
            Context::CommentText => {
                if name == "text" {
                    self.context = Context::Comment;
                    if let Some(handle) = self.comment.take() {
                        let text = std::mem::take(&mut self.comment_text);
                        self.builder.add_comment_text(handle, &text)?;
                    }
                }
                Ok(())
            }
            Context::InObject => {
                if self.in_object_depth > 0 {
                    self.in_object_depth -= 1;
                } else {
                    self.context = self.last_context;
                }
                Ok(())
            }
            Context::IgnoredNode => {
                if name == "node" {
                    self.context = Context::Top;
                }
                Ok(())
            }
            Context::IgnoredWay => {
                if name == "way" {
                    self.context = Context::Top;
                }
                Ok(())
            }
            Context::IgnoredRelation => {
                if name == "relation" {
                    self.context = Context::Top;
                }
                Ok(())
            }
            Context::IgnoredChangeset => {
                if name == "changeset" {
                    self.context = Context::Top;
                }
                Ok(())
            }
        }
    }

    fn characters(&mut self, text: &str) {
        if self.context == Context::CommentText {
            self.comment_text.push_str(text);
        } else {
            self.comment_text.clear();
        }
    }

    /// Handle the root element: version gate and diff-semantics flag.
    fn start_document(&mut self, name: &str, attrs: &Attributes) -> Result<(), ReadError> {
        if name != "osm" && name != "osmChange" {
            return Err(ReadError::Markup {
                reason: format!("unknown top-level element: {name}"),
            });
        }
        if name == "osmChange" {
            self.header.set_has_multiple_object_versions(true);
        }
        for (attr, value) in attrs {
            match attr.as_str() {
                "version" => {
                    self.header.set("version", value);
                    if value != SUPPORTED_VERSION {
                        return Err(ReadError::FormatVersion {
                            version: Some(value.clone()),
                        });
                    }
                }
                "generator" => {
                    self.header.set("generator", value);
                }
                _ => {}
            }
        }
        if self.header.get("version").is_empty() {
            return Err(ReadError::FormatVersion { version: None });
        }
        self.context = Context::Top;
        Ok(())
    }

    /// Open an entity record, or switch to the matching ignored state
    /// if the filter excludes its kind.
    fn begin_entity(&mut self, kind: ItemKind, attrs: &Attributes) -> Result<(), ReadError> {
        // The header is final once the first entity shows up.
        self.deliver_header();
        if !self.filter.contains(kind) {
            self.context = match kind {
                ItemKind::Node => Context::IgnoredNode,
                ItemKind::Way => Context::IgnoredWay,
                ItemKind::Relation => Context::IgnoredRelation,
                ItemKind::Changeset => Context::IgnoredChangeset,
                _ => unreachable!("begin_entity called with a list kind"),
            };
            return Ok(());
        }
        let handle = match kind {
            ItemKind::Node => self.builder.start_node()?,
            ItemKind::Way => self.builder.start_way()?,
            ItemKind::Relation => self.builder.start_relation()?,
            ItemKind::Changeset => self.builder.start_changeset()?,
            _ => unreachable!("begin_entity called with a list kind"),
        };
        if kind == ItemKind::Changeset {
            self.init_changeset(handle, attrs)?;
        } else {
            self.init_object(handle, attrs)?;
        }
        self.context = match kind {
            ItemKind::Node => Context::Node,
            ItemKind::Way => Context::Way,
            ItemKind::Relation => Context::Relation,
            ItemKind::Changeset => Context::Changeset,
            _ => unreachable!(),
        };
        Ok(())
    }

    /// Assign node/way/relation attributes to header fields. Attributes
    /// with unrecognized names are preserved verbatim as extension
    /// attributes; this applies to entities only, never to nested
    /// items like `nd` or `member`.
    fn init_object(&mut self, handle: EntityHandle, attrs: &Attributes) -> Result<(), ReadError> {
        let mut user = "";
        let mut location = Location::UNDEFINED;
        let mut extensions: Vec<(&str, &str)> = Vec::new();
        for (attr, value) in attrs {
            match attr.as_str() {
                "id" => {
                    let id = parse_object_id(value)?;
                    self.builder.set_id(handle, id);
                }
                "version" => {
                    let version = parse_version(value)?;
                    self.builder.set_version(handle, version);
                }
                "changeset" => {
                    let changeset = parse_changeset_id(value)?;
                    self.builder.set_changeset(handle, changeset);
                }
                "timestamp" => {
                    let timestamp = Timestamp::parse(value)?;
                    self.builder.set_timestamp(handle, timestamp);
                }
                "uid" => {
                    let uid = parse_user_id(value)?;
                    self.builder.set_uid(handle, uid);
                }
                "user" => user = value,
                "visible" => self.builder.set_visible(handle, value != "false"),
                "lon" if handle.kind() == ItemKind::Node => {
                    location.set_lon(parse_coordinate(value));
                }
                "lat" if handle.kind() == ItemKind::Node => {
                    location.set_lat(parse_coordinate(value));
                }
                _ => extensions.push((attr.as_str(), value.as_str())),
            }
        }
        if handle.kind() == ItemKind::Node {
            self.builder.set_location(handle, location);
        }
        // Inside a <delete> section the entity is gone no matter what
        // its visible attribute claims.
        if self.in_delete_section {
            self.builder.set_visible(handle, false);
        }
        self.builder.append_user(handle, user)?;
        self.append_extensions(&extensions)
    }

    /// Assign changeset attributes, including the bounding coordinates.
    fn init_changeset(
        &mut self,
        handle: EntityHandle,
        attrs: &Attributes,
    ) -> Result<(), ReadError> {
        let mut user = "";
        let mut min = Location::UNDEFINED;
        let mut max = Location::UNDEFINED;
        let mut extensions: Vec<(&str, &str)> = Vec::new();
        for (attr, value) in attrs {
            match attr.as_str() {
                "id" => {
                    let id = parse_object_id(value)?;
                    self.builder.set_id(handle, id);
                }
                "version" => {
                    let version = parse_version(value)?;
                    self.builder.set_version(handle, version);
                }
                "changeset" => {
                    let changeset = parse_changeset_id(value)?;
                    self.builder.set_changeset(handle, changeset);
                }
                "timestamp" => {
                    let timestamp = Timestamp::parse(value)?;
                    self.builder.set_timestamp(handle, timestamp);
                }
                "uid" => {
                    let uid = parse_user_id(value)?;
                    self.builder.set_uid(handle, uid);
                }
                "user" => user = value,
                "visible" => self.builder.set_visible(handle, value != "false"),
                "min_lon" => min.set_lon(parse_coordinate(value)),
                "min_lat" => min.set_lat(parse_coordinate(value)),
                "max_lon" => max.set_lon(parse_coordinate(value)),
                "max_lat" => max.set_lat(parse_coordinate(value)),
                _ => extensions.push((attr.as_str(), value.as_str())),
            }
        }
        self.builder.set_bounds(handle, min, max);
        if self.in_delete_section {
            self.builder.set_visible(handle, false);
        }
        self.builder.append_user(handle, user)?;
        self.append_extensions(&extensions)
    }

    /// Write unrecognized attributes as a complete extension list.
    fn append_extensions(&mut self, extensions: &[(&str, &str)]) -> Result<(), ReadError> {
        if extensions.is_empty() {
            return Ok(());
        }
        self.builder.open_record(ItemKind::ExtensionAttrList)?;
        for (name, value) in extensions {
            self.builder.add_extension_attr(name, value)?;
        }
        self.builder.close_record()?;
        Ok(())
    }

    /// Make `wanted` the open nested list, closing a differently-kinded
    /// one first. The close fixes that list's padding boundary, so it
    /// happens here as an explicit step.
    fn ensure_list(&mut self, wanted: OpenList) -> Result<(), ReadError> {
        debug_assert_ne!(wanted, OpenList::None);
        if self.open_list == wanted {
            return Ok(());
        }
        if self.open_list != OpenList::None {
            self.builder.close_record()?;
        }
        let kind = match wanted {
            OpenList::Tags => ItemKind::TagList,
            OpenList::NodeRefs => ItemKind::NodeRefList,
            OpenList::Members => ItemKind::RelationMemberList,
            OpenList::Discussion => ItemKind::ChangesetDiscussion,
            OpenList::None => unreachable!(),
        };
        self.builder.open_record(kind)?;
        self.open_list = wanted;
        Ok(())
    }

    fn append_tag(&mut self, attrs: &Attributes) -> Result<(), ReadError> {
        let mut key = "";
        let mut value = "";
        for (attr, attr_value) in attrs {
            match attr.as_str() {
                "k" => key = attr_value,
                "v" => value = attr_value,
                _ => {}
            }
        }
        self.builder.add_tag(key, value)
    }

    fn append_node_ref(&mut self, attrs: &Attributes) -> Result<(), ReadError> {
        let mut ref_id = 0;
        let mut location = Location::UNDEFINED;
        for (attr, value) in attrs {
            match attr.as_str() {
                "ref" => ref_id = parse_object_id(value)?,
                "lon" => location.set_lon(parse_coordinate(value)),
                "lat" => location.set_lat(parse_coordinate(value)),
                _ => {}
            }
        }
        self.builder.add_node_ref(ref_id, Some(location))
    }

    fn append_member(&mut self, attrs: &Attributes) -> Result<(), ReadError> {
        let mut kind = None;
        let mut kind_text = "";
        let mut ref_id = 0;
        let mut role = "";
        for (attr, value) in attrs {
            match attr.as_str() {
                "type" => {
                    kind_text = value;
                    kind = value.chars().next().and_then(ItemKind::from_member_char);
                }
                "ref" => ref_id = parse_object_id(value)?,
                "role" => role = value,
                _ => {}
            }
        }
        let kind = kind.ok_or_else(|| {
            ReadError::Validation(ValidationError::UnknownMemberType {
                found: kind_text.to_owned(),
            })
        })?;
        self.builder.add_member(kind, ref_id, role, None)
    }

    fn append_comment(&mut self, attrs: &Attributes) -> Result<(), ReadError> {
        let mut date = Timestamp::default();
        let mut uid = 0;
        let mut user = "";
        for (attr, value) in attrs {
            match attr.as_str() {
                "date" => date = Timestamp::parse(value)?,
                "uid" => uid = parse_user_id(value)?,
                "user" => user = value,
                _ => {}
            }
        }
        self.comment = Some(self.builder.add_comment(date, uid, user)?);
        Ok(())
    }

    /// Merge a `<bounds>` element into the header's bounding-box list.
    /// Ignored once the header has been finalized.
    fn merge_bounds(&mut self, attrs: &Attributes) {
        if self.header_done() {
            return;
        }
        let mut min = Location::UNDEFINED;
        let mut max = Location::UNDEFINED;
        for (attr, value) in attrs {
            match attr.as_str() {
                "minlon" => min.set_lon(parse_coordinate(value)),
                "minlat" => min.set_lat(parse_coordinate(value)),
                "maxlon" => max.set_lon(parse_coordinate(value)),
                "maxlat" => max.set_lat(parse_coordinate(value)),
                _ => {}
            }
        }
        let mut bbox = BoundingBox::default();
        bbox.extend(min).extend(max);
        self.header.add_box(bbox);
    }

    /// Close the open list if any, finalize and commit the entity, and
    /// run flow control.
    fn finish_entity(&mut self) -> Result<(), ReadError> {
        if self.open_list != OpenList::None {
            self.builder.close_record()?;
            self.open_list = OpenList::None;
        }
        self.comment = None;
        self.builder.finish_entity()?;
        self.context = Context::Top;
        self.flush_buffer()
    }

    /// Hand the buffer off once its committed bytes cross nine tenths
    /// of capacity, amortizing handoff cost while bounding worst-case
    /// over-commitment to one buffer.
    fn flush_buffer(&mut self) -> Result<(), ReadError> {
        if self.builder.buffer().committed() > self.buffer_capacity / 10 * 9 {
            let full = self
                .builder
                .replace_buffer(ArenaBuffer::with_capacity(self.buffer_capacity));
            self.output.send(full).map_err(|_| ReadError::Disconnected)?;
        }
        Ok(())
    }

    /// Deliver the header exactly once.
    fn deliver_header(&mut self) {
        if let Some(tx) = self.header_tx.take() {
            // A consumer that dropped the header receiver simply does
            // not care about it; that is not an error.
            let _ = tx.send(self.header.clone());
        }
    }
}
