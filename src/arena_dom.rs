// Node layout and the linking primitives follow the html5ever arena example.
// https://github.com/servo/html5ever/blob/45b2fca5c6/html5ever/examples/arena.rs
//
// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::io;
use std::ptr;

use html5ever::serialize::TraversalScope::{ChildrenOnly, IncludeNode};
use html5ever::serialize::{Serialize, Serializer, TraversalScope};
use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{Tag, TagKind, Token, TokenSink, TokenSinkResult};
use html5ever::{Attribute, LocalName, QualName};
use tracing::trace;

use crate::error::{Error, Result};

/// Open elements deeper than this make the parse fail. Serialization recurses once per level.
pub const MAX_DEPTH: usize = 512;

pub fn create_element<'arena>(arena: Arena<'arena>, name: &str) -> Ref<'arena> {
    arena.alloc(Node::new(NodeData::Element {
        name: QualName::new(None, ns!(html), LocalName::from(name)),
        attrs: RefCell::new(vec![]),
    }))
}

pub fn create_text<'arena>(arena: Arena<'arena>, text: &str) -> Ref<'arena> {
    arena.alloc(Node::new(NodeData::Text {
        contents: RefCell::new(StrTendril::from_slice(text)),
    }))
}

pub type Arena<'arena> = &'arena typed_arena::Arena<Node<'arena>>;

pub type Ref<'arena> = &'arena Node<'arena>;

pub type Link<'arena> = Cell<Option<Ref<'arena>>>;

pub struct Node<'arena> {
    pub parent: Link<'arena>,
    pub next_sibling: Link<'arena>,
    pub previous_sibling: Link<'arena>,
    pub first_child: Link<'arena>,
    pub last_child: Link<'arena>,
    pub data: NodeData,
}

#[derive(Debug)]
pub enum NodeData {
    Document,
    Doctype { name: StrTendril },
    Text { contents: RefCell<StrTendril> },
    Comment { contents: StrTendril },
    Element {
        name: QualName,
        attrs: RefCell<Vec<Attribute>>,
    },
}

impl<'arena> Node<'arena> {
    pub fn new(data: NodeData) -> Self {
        Node {
            parent: Cell::new(None),
            previous_sibling: Cell::new(None),
            next_sibling: Cell::new(None),
            first_child: Cell::new(None),
            last_child: Cell::new(None),
            data,
        }
    }

    pub fn detach(&self) {
        let parent = self.parent.take();
        let previous_sibling = self.previous_sibling.take();
        let next_sibling = self.next_sibling.take();

        if let Some(next_sibling) = next_sibling {
            next_sibling.previous_sibling.set(previous_sibling);
        } else if let Some(parent) = parent {
            parent.last_child.set(previous_sibling);
        }

        if let Some(previous_sibling) = previous_sibling {
            previous_sibling.next_sibling.set(next_sibling);
        } else if let Some(parent) = parent {
            parent.first_child.set(next_sibling);
        }
    }

    /// Splices the children into the parent in place of this node.
    pub fn unwrap(&'arena self) -> Option<Ref<'arena>> {
        let first_child = self.first_child.get();
        for child in self.children().collect::<Vec<_>>() {
            self.insert_before(child);
        }
        self.detach();
        first_child
    }

    pub fn append(&'arena self, new_child: &'arena Self) {
        new_child.detach();
        new_child.parent.set(Some(self));
        if let Some(last_child) = self.last_child.take() {
            new_child.previous_sibling.set(Some(last_child));
            debug_assert!(last_child.next_sibling.get().is_none());
            last_child.next_sibling.set(Some(new_child));
        } else {
            debug_assert!(self.first_child.get().is_none());
            self.first_child.set(Some(new_child));
        }
        self.last_child.set(Some(new_child));
    }

    pub fn insert_before(&'arena self, new_sibling: &'arena Self) {
        new_sibling.detach();
        new_sibling.parent.set(self.parent.get());
        new_sibling.next_sibling.set(Some(self));
        if let Some(previous_sibling) = self.previous_sibling.take() {
            new_sibling.previous_sibling.set(Some(previous_sibling));
            debug_assert!(previous_sibling
                .next_sibling
                .get()
                .map_or(false, |next| ptr::eq::<Node>(next, self)));
            previous_sibling.next_sibling.set(Some(new_sibling));
        } else if let Some(parent) = self.parent.get() {
            debug_assert!(parent
                .first_child
                .get()
                .map_or(false, |first| ptr::eq::<Node>(first, self)));
            parent.first_child.set(Some(new_sibling));
        }
        self.previous_sibling.set(Some(new_sibling));
    }

    pub fn insert_after(&'arena self, new_sibling: &'arena Self) {
        new_sibling.detach();
        new_sibling.parent.set(self.parent.get());
        new_sibling.previous_sibling.set(Some(self));
        if let Some(next_sibling) = self.next_sibling.take() {
            new_sibling.next_sibling.set(Some(next_sibling));
            debug_assert!(next_sibling
                .previous_sibling
                .get()
                .map_or(false, |previous| ptr::eq::<Node>(previous, self)));
            next_sibling.previous_sibling.set(Some(new_sibling));
        } else if let Some(parent) = self.parent.get() {
            debug_assert!(parent
                .last_child
                .get()
                .map_or(false, |last| ptr::eq::<Node>(last, self)));
            parent.last_child.set(Some(new_sibling));
        }
        self.next_sibling.set(Some(new_sibling));
    }

    pub fn replace_with(&'arena self, replacement: &'arena Self) {
        self.insert_before(replacement);
        self.detach();
    }

    /// Moves every child of this node to the end of `new_parent`.
    pub fn reparent_children(&'arena self, new_parent: &'arena Self) {
        let mut next_child = self.first_child.get();
        while let Some(child) = next_child {
            next_child = child.next_sibling.get();
            new_parent.append(child);
        }
    }

    pub fn children(&self) -> Children<'arena> {
        Children {
            next: self.first_child.get(),
        }
    }

    pub fn element_children(&self) -> impl Iterator<Item = Ref<'arena>> {
        self.children().filter(|child| child.is_element())
    }

    pub fn ancestors(&self) -> Ancestors<'arena> {
        Ancestors {
            next: self.parent.get(),
        }
    }

    /// Pre-order walk of everything below this node. Collect it before mutating the tree.
    pub fn descendants(&'arena self) -> Descendants<'arena> {
        Descendants {
            root: self,
            next: self.first_child.get(),
        }
    }

    /// True when the ancestor chain ends at a document root.
    pub fn is_attached(&self) -> bool {
        match self.ancestors().last() {
            Some(root) => matches!(root.data, NodeData::Document),
            None => matches!(self.data, NodeData::Document),
        }
    }

    pub fn contains(&self, other: &Node<'arena>) -> bool {
        ptr::eq::<Node>(self, other) || other.ancestors().any(|a| ptr::eq::<Node>(self, a))
    }

    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element { .. })
    }

    pub fn local_name(&self) -> Option<&LocalName> {
        match self.data {
            NodeData::Element { ref name, .. } => Some(&name.local),
            _ => None,
        }
    }

    pub fn is_named(&self, local: LocalName) -> bool {
        self.local_name().map_or(false, |name| *name == local)
    }

    pub fn is_whitespace_text(&self) -> bool {
        match self.data {
            NodeData::Text { ref contents } => contents.borrow().trim().is_empty(),
            _ => false,
        }
    }

    pub fn text_content(&'arena self) -> String {
        let mut text = String::new();
        if let NodeData::Text { ref contents } = self.data {
            text.push_str(&contents.borrow());
        }
        for node in self.descendants() {
            if let NodeData::Text { ref contents } = node.data {
                text.push_str(&contents.borrow());
            }
        }
        text
    }

    /// True when the concatenated descendant text trims down to nothing.
    pub fn has_blank_text(&'arena self) -> bool {
        if let NodeData::Text { ref contents } = self.data {
            return contents.borrow().trim().is_empty();
        }
        self.descendants().all(|node| match node.data {
            NodeData::Text { ref contents } => contents.borrow().trim().is_empty(),
            _ => true,
        })
    }

    pub fn attributes(&self) -> Vec<Attribute> {
        match self.data {
            NodeData::Element { ref attrs, .. } => attrs.borrow().clone(),
            _ => vec![],
        }
    }

    pub fn get_attribute(&self, local: &LocalName) -> Option<String> {
        match self.data {
            NodeData::Element { ref attrs, .. } => attrs
                .borrow()
                .iter()
                .find(|attr| attr.name.local == *local)
                .map(|attr| attr.value.to_string()),
            _ => None,
        }
    }

    /// Overwrites the value in place when the attribute exists, appends it otherwise.
    pub fn set_attribute(&self, local: LocalName, value: &str) {
        if let NodeData::Element { ref attrs, .. } = self.data {
            let mut attrs = attrs.borrow_mut();
            match attrs.iter_mut().find(|attr| attr.name.local == local) {
                Some(existing) => existing.value = StrTendril::from_slice(value),
                None => attrs.push(Attribute {
                    name: QualName::new(None, ns!(), local),
                    value: StrTendril::from_slice(value),
                }),
            }
        }
    }

    pub fn remove_attribute(&self, local: &LocalName) -> Option<StrTendril> {
        match self.data {
            NodeData::Element { ref attrs, .. } => {
                let mut attrs = attrs.borrow_mut();
                let index = attrs.iter().position(|attr| attr.name.local == *local)?;
                Some(attrs.remove(index).value)
            }
            _ => None,
        }
    }

    pub fn retain_attributes<F>(&self, keep: F)
    where
        F: FnMut(&Attribute) -> bool,
    {
        if let NodeData::Element { ref attrs, .. } = self.data {
            attrs.borrow_mut().retain(keep);
        }
    }
}

pub struct Children<'arena> {
    next: Option<Ref<'arena>>,
}

impl<'arena> Iterator for Children<'arena> {
    type Item = Ref<'arena>;

    fn next(&mut self) -> Option<Ref<'arena>> {
        let current = self.next?;
        self.next = current.next_sibling.get();
        Some(current)
    }
}

pub struct Ancestors<'arena> {
    next: Option<Ref<'arena>>,
}

impl<'arena> Iterator for Ancestors<'arena> {
    type Item = Ref<'arena>;

    fn next(&mut self) -> Option<Ref<'arena>> {
        let current = self.next?;
        self.next = current.parent.get();
        Some(current)
    }
}

pub struct Descendants<'arena> {
    root: Ref<'arena>,
    next: Option<Ref<'arena>>,
}

impl<'arena> Iterator for Descendants<'arena> {
    type Item = Ref<'arena>;

    fn next(&mut self) -> Option<Ref<'arena>> {
        let current = self.next?;
        self.next = match current.first_child.get() {
            Some(child) => Some(child),
            None => {
                let mut node = current;
                loop {
                    if ptr::eq::<Node>(node, self.root) {
                        break None;
                    }
                    if let Some(sibling) = node.next_sibling.get() {
                        break Some(sibling);
                    }
                    match node.parent.get() {
                        Some(parent) => node = parent,
                        None => break None,
                    }
                }
            }
        };
        Some(current)
    }
}

impl<'arena> fmt::Display for Node<'arena> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_node(self, 0, f)
    }
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeData::Document => write!(f, "Document"),
            NodeData::Doctype { name } => write!(f, "Doctype: {}", name),
            NodeData::Text { contents } => write!(
                f,
                "Text: {}...",
                &contents.borrow().chars().take(10).collect::<String>()
            ),
            NodeData::Comment { contents } => write!(
                f,
                "Comment: {}...",
                &contents.chars().take(10).collect::<String>()
            ),
            NodeData::Element { ref name, .. } => write!(f, "Element: {}", &name.local),
        }
    }
}

fn write_node(node: &Node<'_>, indent: usize, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "{}{}", "  ".repeat(indent), node.data)?;
    for child in node.children() {
        write_node(child, indent + 1, f)?;
    }
    Ok(())
}

fn is_void(name: &LocalName) -> bool {
    matches!(
        *name,
        local_name!("area")
            | local_name!("base")
            | local_name!("br")
            | local_name!("col")
            | local_name!("embed")
            | local_name!("hr")
            | local_name!("img")
            | local_name!("input")
            | local_name!("link")
            | local_name!("meta")
            | local_name!("param")
            | local_name!("source")
            | local_name!("track")
            | local_name!("wbr")
    )
}

fn is_table_section(name: &LocalName) -> bool {
    matches!(
        *name,
        local_name!("thead") | local_name!("tbody") | local_name!("tfoot")
    )
}

/// Whether a start tag named `incoming` implicitly ends the open element `open`.
fn closes_implicitly(open: &LocalName, incoming: &LocalName) -> bool {
    match *open {
        local_name!("li") => *incoming == local_name!("li"),
        local_name!("dt") | local_name!("dd") => {
            *incoming == local_name!("dt") || *incoming == local_name!("dd")
        }
        local_name!("option") => *incoming == local_name!("option"),
        local_name!("tr") => *incoming == local_name!("tr") || is_table_section(incoming),
        local_name!("td") | local_name!("th") => {
            matches!(
                *incoming,
                local_name!("td") | local_name!("th") | local_name!("tr")
            ) || is_table_section(incoming)
        }
        local_name!("thead") | local_name!("tbody") | local_name!("tfoot") => {
            is_table_section(incoming)
        }
        _ => false,
    }
}

fn raw_text_kind(name: &LocalName) -> Option<RawKind> {
    match *name {
        local_name!("script") => Some(RawKind::ScriptData),
        local_name!("style")
        | local_name!("xmp")
        | local_name!("iframe")
        | local_name!("noembed")
        | local_name!("noframes") => Some(RawKind::Rawtext),
        local_name!("textarea") | local_name!("title") => Some(RawKind::Rcdata),
        _ => None,
    }
}

/// Builds the arena tree straight from html5ever tokens.
///
/// This skips the HTML5 tree construction algorithm: markup is kept in the shape it was written
/// (a `<tr>` directly inside `<table>`, a `<caption>` outside of one, a block inside `<p>`),
/// closing only what a small set of implied-end rules for list items and table parts requires.
pub struct Sink<'arena> {
    arena: Arena<'arena>,
    document: Ref<'arena>,
    open_elements: RefCell<Vec<Ref<'arena>>>,
    too_deep: Cell<bool>,
}

impl<'arena> Sink<'arena> {
    pub fn new(arena: Arena<'arena>) -> Self {
        Sink {
            arena,
            document: arena.alloc(Node::new(NodeData::Document)),
            open_elements: RefCell::new(vec![]),
            too_deep: Cell::new(false),
        }
    }

    pub fn finish(&self) -> Result<Ref<'arena>> {
        if self.too_deep.get() {
            return Err(Error::parse(format!(
                "elements nested more than {} levels deep",
                MAX_DEPTH
            )));
        }
        Ok(self.document)
    }

    fn new_node(&self, data: NodeData) -> Ref<'arena> {
        self.arena.alloc(Node::new(data))
    }

    fn current_node(&self) -> Ref<'arena> {
        self.open_elements
            .borrow()
            .last()
            .copied()
            .unwrap_or(self.document)
    }

    fn append_text(&self, text: StrTendril) {
        let parent = self.current_node();
        if let Some(&Node {
            data: NodeData::Text { ref contents },
            ..
        }) = parent.last_child.get()
        {
            contents.borrow_mut().push_tendril(&text);
            return;
        }
        parent.append(self.new_node(NodeData::Text {
            contents: RefCell::new(text),
        }));
    }

    fn start_tag(&self, tag: Tag) -> TokenSinkResult<()> {
        {
            let mut open_elements = self.open_elements.borrow_mut();
            while let Some(open) = open_elements.last().copied().and_then(|node| node.local_name()) {
                if !closes_implicitly(open, &tag.name) {
                    break;
                }
                open_elements.pop();
            }
        }

        let element = self.new_node(NodeData::Element {
            name: QualName::new(None, ns!(html), tag.name.clone()),
            attrs: RefCell::new(tag.attrs),
        });
        self.current_node().append(element);

        if is_void(&tag.name) || tag.self_closing {
            return TokenSinkResult::Continue;
        }

        let mut open_elements = self.open_elements.borrow_mut();
        if open_elements.len() >= MAX_DEPTH {
            self.too_deep.set(true);
            return TokenSinkResult::Continue;
        }
        open_elements.push(element);

        match raw_text_kind(&tag.name) {
            Some(kind) => TokenSinkResult::RawData(kind),
            None => TokenSinkResult::Continue,
        }
    }

    fn end_tag(&self, name: &LocalName) {
        let mut open_elements = self.open_elements.borrow_mut();
        let position = open_elements
            .iter()
            .rposition(|node| node.local_name() == Some(name));
        match position {
            Some(position) => open_elements.truncate(position),
            None => trace!(tag = %name, "ignoring end tag without an open element"),
        }
    }
}

impl<'arena> TokenSink for Sink<'arena> {
    type Handle = ();

    fn process_token(&self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::TagToken(tag) => match tag.kind {
                TagKind::StartTag => return self.start_tag(tag),
                TagKind::EndTag => self.end_tag(&tag.name),
            },
            Token::CharacterTokens(text) => self.append_text(text),
            Token::CommentToken(contents) => self
                .current_node()
                .append(self.new_node(NodeData::Comment { contents })),
            Token::DoctypeToken(doctype) => self.document.append(self.new_node(NodeData::Doctype {
                name: doctype.name.unwrap_or_default(),
            })),
            Token::ParseError(error) => trace!(%error, "tolerating malformed markup"),
            Token::NullCharacterToken | Token::EOFToken => {}
        }
        TokenSinkResult::Continue
    }
}

// Implementation adapted from implementation for RcDom:
// https://github.com/servo/html5ever/blob/45b2fca5c6/markup5ever/rcdom.rs#L410
impl<'arena> Serialize for Node<'arena> {
    fn serialize<S>(&self, serializer: &mut S, traversal_scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        match (&traversal_scope, &self.data) {
            (_, &NodeData::Element { ref name, ref attrs }) => {
                let include_node = matches!(traversal_scope, IncludeNode);
                if include_node {
                    let attrs = attrs.borrow();
                    serializer.start_elem(
                        name.clone(),
                        attrs.iter().map(|attr| (&attr.name, &attr.value[..])),
                    )?;
                }

                for child in self.children() {
                    child.serialize(serializer, IncludeNode)?;
                }

                if include_node {
                    serializer.end_elem(name.clone())?;
                }
            }

            (_, &NodeData::Document) => {
                for child in self.children() {
                    child.serialize(serializer, IncludeNode)?;
                }
            }

            (&ChildrenOnly(_), _) => {}

            (&IncludeNode, &NodeData::Doctype { ref name }) => serializer.write_doctype(name)?,
            (&IncludeNode, &NodeData::Text { ref contents }) => {
                serializer.write_text(&contents.borrow())?
            }
            (&IncludeNode, &NodeData::Comment { ref contents }) => {
                serializer.write_comment(contents)?
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use pretty_assertions::assert_eq;

    use crate::test_utils::{parse_and_render, with_document};

    #[test]
    fn keeps_bare_rows_inside_tables() {
        assert_eq!(
            parse_and_render("<table><tr><td>a</td></tr></table>"),
            "<table><tr><td>a</td></tr></table>"
        );
    }

    #[test]
    fn keeps_caption_outside_of_table() {
        assert_eq!(
            parse_and_render("<caption>Data table</caption><table></table>"),
            "<caption>Data table</caption><table></table>"
        );
    }

    #[test]
    fn void_elements_take_no_children() {
        assert_eq!(
            parse_and_render("<p>a<br>b<img src=\"x.png\">c</p>"),
            "<p>a<br>b<img src=\"x.png\">c</p>"
        );
    }

    #[test]
    fn implied_end_tags_close_cells_and_rows() {
        assert_eq!(
            parse_and_render("<table><tr><td>a<td>b<tr><td>c</table>"),
            "<table><tr><td>a</td><td>b</td></tr><tr><td>c</td></tr></table>"
        );
    }

    #[test]
    fn blocks_stay_inside_paragraphs() {
        assert_eq!(
            parse_and_render("<p>one<div>two</div><ul><li>a<li>b</ul><p>in</p></p>"),
            "<p>one<div>two</div><ul><li>a</li><li>b</li></ul><p>in</p></p>"
        );
    }

    #[test]
    fn stray_end_tags_are_ignored() {
        assert_eq!(parse_and_render("<b>x</i></b>"), "<b>x</b>");
    }

    #[test]
    fn script_content_is_raw_text() {
        assert_eq!(
            parse_and_render("<script>if (a < b) {}</script><p>after</p>"),
            "<script>if (a < b) {}</script><p>after</p>"
        );
    }

    #[test]
    fn escapes_text_and_attributes() {
        assert_eq!(
            parse_and_render("<a title='say \"hi\"'>a &amp; b</a>"),
            "<a title=\"say &quot;hi&quot;\">a &amp; b</a>"
        );
    }

    #[test]
    fn too_deep_nesting_is_a_parse_error() {
        let arena = typed_arena::Arena::new();
        let input = "<span>".repeat(MAX_DEPTH + 1);
        let result = crate::document::Document::parse(&arena, &input);
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[test]
    fn unwrap_splices_children_into_parent() {
        with_document("<div>a<p>b<i>c</i></p>d</div>", |document| {
            let paragraph = document.select(local_name!("p"))[0];
            paragraph.unwrap();
            assert_eq!(document.render().unwrap(), "<div>ab<i>c</i>d</div>");
        });
    }

    #[test]
    fn replace_with_descendant() {
        with_document("<div id=\"outer\"><p>kept</p></div>", |document| {
            let div = document.select(local_name!("div"))[0];
            let paragraph = document.select(local_name!("p"))[0];
            div.replace_with(paragraph);
            assert_eq!(document.render().unwrap(), "<p>kept</p>");
            assert!(!div.is_attached());
            assert!(paragraph.is_attached());
        });
    }

    #[test]
    fn descendants_are_in_document_order() {
        with_document("<div><p>a</p><ul><li>b</li></ul></div><span></span>", |document| {
            let names: Vec<String> = document
                .root()
                .descendants()
                .filter_map(|node| node.local_name().map(|name| name.to_string()))
                .collect();
            assert_eq!(names, vec!["div", "p", "ul", "li", "span"]);
        });
    }

    #[test]
    fn descendants_stay_inside_the_subtree() {
        with_document("<div><p>a</p></div><span>b</span>", |document| {
            let div = document.select(local_name!("div"))[0];
            assert_eq!(div.descendants().count(), 2);
            assert_eq!(div.text_content(), "a");
        });
    }

    #[test]
    fn attribute_updates_keep_order() {
        with_document("<p class=\"a\" id=\"b\">x</p>", |document| {
            let paragraph = document.select(local_name!("p"))[0];
            paragraph.set_attribute(local_name!("class"), "c");
            paragraph.set_attribute(local_name!("title"), "t");
            assert_eq!(paragraph.remove_attribute(&local_name!("id")).as_deref(), Some("b"));
            assert_eq!(
                document.render().unwrap(),
                "<p class=\"c\" title=\"t\">x</p>"
            );
        });
    }

    #[test]
    fn blank_text_ignores_whitespace() {
        with_document("<p> \n\u{a0}<b> </b></p><p> x </p>", |document| {
            let paragraphs = document.select(local_name!("p"));
            assert!(paragraphs[0].has_blank_text());
            assert!(!paragraphs[1].has_blank_text());
        });
    }

    #[test]
    fn displays_an_indented_outline() {
        with_document("<p>a<b>x</b></p>", |document| {
            assert_eq!(
                document.root().to_string(),
                "Document\n  Element: p\n    Text: a...\n    Element: b\n      Text: x...\n"
            );
        });
    }
}
