use std::io;

use html5ever::serialize::{serialize, SerializeOpts};
use html5ever::tendril::StrTendril;
use html5ever::tokenizer::{BufferQueue, Tokenizer, TokenizerOpts};
use html5ever::TokenizerResult;
use html5ever::LocalName;

use crate::arena_dom::{create_element, create_text, Arena, Ref, Sink};
use crate::error::{Error, Result};

/// One parsed document: the arena its nodes live in and the root they hang off.
///
/// Every stage takes the document explicitly, so separate documents can be cleaned on separate
/// threads as long as each one gets its own arena.
pub struct Document<'arena> {
    arena: Arena<'arena>,
    root: Ref<'arena>,
}

impl<'arena> Document<'arena> {
    pub fn parse(arena: Arena<'arena>, input: &str) -> Result<Document<'arena>> {
        let queue = BufferQueue::default();
        queue.push_back(StrTendril::from_slice(input));

        let tokenizer = Tokenizer::new(Sink::new(arena), TokenizerOpts::default());
        // A script result only pauses the tokenizer. Keep feeding until the queue is drained.
        while let TokenizerResult::Script(()) = tokenizer.feed(&queue) {}
        tokenizer.end();

        let root = tokenizer.sink.finish()?;
        Ok(Document { arena, root })
    }

    pub fn root(&self) -> Ref<'arena> {
        self.root
    }

    pub fn create_element(&self, name: &str) -> Ref<'arena> {
        create_element(self.arena, name)
    }

    pub fn create_text(&self, text: &str) -> Ref<'arena> {
        create_text(self.arena, text)
    }

    /// Every attached element with the given tag name, in document order.
    pub fn select(&self, name: LocalName) -> Vec<Ref<'arena>> {
        self.root
            .descendants()
            .filter(|node| node.is_named(name.clone()))
            .collect()
    }

    pub fn find_by_id(&self, id: &str) -> Option<Ref<'arena>> {
        self.root.descendants().find(|node| {
            node.get_attribute(&local_name!("id"))
                .map_or(false, |value| value == id)
        })
    }

    pub fn render(&self) -> Result<String> {
        let mut output = vec![];
        serialize(&mut output, self.root, SerializeOpts::default()).map_err(Error::Serialize)?;
        String::from_utf8(output)
            .map_err(|err| Error::Serialize(io::Error::new(io::ErrorKind::InvalidData, err)))
    }
}
