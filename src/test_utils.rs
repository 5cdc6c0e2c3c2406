use crate::arena_dom::Node;
use crate::document::Document;

/// Parses `input` and hands the document to `f`.
pub fn with_document<F>(input: &str, f: F)
where
    F: FnOnce(&Document<'_>),
{
    let arena = typed_arena::Arena::<Node<'_>>::new();
    let document = Document::parse(&arena, input).unwrap();
    f(&document);
}

/// Applies `stage` to the parsed `input` and renders the result.
pub fn apply<F>(input: &str, stage: F) -> String
where
    F: FnOnce(&Document<'_>),
{
    let arena = typed_arena::Arena::<Node<'_>>::new();
    let document = Document::parse(&arena, input).unwrap();
    stage(&document);
    document.render().unwrap()
}

pub fn parse_and_render(input: &str) -> String {
    apply(input, |_| {})
}
