use std::iter;
use std::ptr;

use tracing::{debug, trace};

use crate::arena_dom::Ref;
use crate::document::Document;
use crate::sanitizer::SanitizerConfig;

/// Moves every element referenced by an in-page link (`href="#id"`) to just before the next
/// `<h1>` following the link, as a paragraph carrying the element's attributes.
///
/// Headings are never moved, and neither is anything when no `<h1>` follows the link. Links are
/// handled in document order, each move finishing before the next link is looked at. Only the
/// attributes `config` allows on a `<p>` are carried over, and containers the move leaves empty
/// are removed.
pub fn relocate_references(document: &Document<'_>, config: &SanitizerConfig) {
    debug!("Moving local references...");
    for anchor in document.select(local_name!("a")) {
        if !anchor.is_attached() {
            continue;
        }
        let href = match anchor.get_attribute(&local_name!("href")) {
            Some(href) => href,
            None => continue,
        };
        match href.strip_prefix('#') {
            Some(fragment) if !fragment.is_empty() => {
                relocate(document, config, anchor, fragment)
            }
            _ => {}
        }
    }
}

fn relocate<'arena>(
    document: &Document<'arena>,
    config: &SanitizerConfig,
    anchor: Ref<'arena>,
    fragment: &str,
) {
    let target = match document.find_by_id(fragment) {
        Some(target) => target,
        None => {
            trace!(%fragment, "no element for local reference");
            return;
        }
    };
    if target.local_name().map_or(true, |name| name.starts_with('h')) {
        return;
    }
    // An empty paragraph would be removed by the next run.
    if target.has_blank_text() {
        return;
    }

    let heading = match next_section_heading(anchor) {
        Some(heading) => heading,
        None => return,
    };
    if target.contains(heading) {
        return;
    }
    if following(anchor)
        .take_while(|node| !ptr::eq(*node, heading))
        .any(|node| ptr::eq(node, target))
    {
        trace!(%fragment, "referenced element already precedes the next heading");
        return;
    }

    trace!(%fragment, "relocating referenced element");
    let container = target.parent.get();
    let paragraph = into_paragraph(document, config, target);
    heading.insert_before(paragraph);
    if let Some(container) = container {
        remove_emptied(config, container);
    }
}

/// Detaches `node` and then each of its ancestors for as long as they are left without text and
/// are not allowed to be empty.
fn remove_emptied<'arena>(config: &SanitizerConfig, node: Ref<'arena>) {
    let mut cursor = Some(node);
    while let Some(current) = cursor {
        let removable = current
            .local_name()
            .map_or(false, |name| !config.allows_empty(name));
        if !removable || !current.has_blank_text() {
            break;
        }
        trace!(tag = %current.data, "removing container emptied by relocation");
        cursor = current.parent.get();
        current.detach();
    }
}

/// Replaces `target` with a paragraph holding its content and the attributes a `<p>` may carry.
/// A target whose only child is a paragraph gives up that paragraph instead of wrapping it in
/// another one.
fn into_paragraph<'arena>(
    document: &Document<'arena>,
    config: &SanitizerConfig,
    target: Ref<'arena>,
) -> Ref<'arena> {
    let mut significant = target.children().filter(|child| !child.is_whitespace_text());
    let paragraph = match (significant.next(), significant.next()) {
        (Some(only), None) if only.is_named(local_name!("p")) => only,
        _ => {
            let paragraph = document.create_element("p");
            target.reparent_children(paragraph);
            paragraph
        }
    };
    let p = local_name!("p");
    for attr in target.attributes() {
        let attribute = &attr.name.local;
        if !config.allows_attribute(&p, attribute)
            || (config.is_scheme_restricted(attribute) && !config.allows_url(&attr.value))
        {
            trace!(%attribute, "dropping attribute not allowed on a paragraph");
            continue;
        }
        paragraph.set_attribute(attribute.clone(), &attr.value);
    }
    target.replace_with(paragraph);
    paragraph
}

/// Looks for the `<h1>` that starts the next section after `node`: the first `<h1>` among the
/// following siblings of `node`, else among those of its parent, and so on up to the root.
pub fn next_section_heading<'arena>(node: Ref<'arena>) -> Option<Ref<'arena>> {
    following(node).find(|candidate| candidate.is_named(local_name!("h1")))
}

// Siblings after `node`, then the siblings after its parent, and so on.
fn following<'arena>(node: Ref<'arena>) -> impl Iterator<Item = Ref<'arena>> {
    iter::successors(Some(node), |current| current.parent.get()).flat_map(|current| {
        iter::successors(current.next_sibling.get(), |sibling| sibling.next_sibling.get())
    })
}

#[cfg(test)]
mod test {
    use super::*;

    use pretty_assertions::assert_eq;

    use crate::config::default::DEFAULT_CONFIG;
    use crate::test_utils::{apply, with_document};

    fn relocated(input: &str) -> String {
        apply(input, |document| relocate_references(document, &DEFAULT_CONFIG))
    }

    #[test]
    fn moves_referenced_paragraphs_before_next_h1() {
        let input = "<h1>Part 1</h1>\
            <p><a href=\"#first-distant-paragraph\">Link to first paragraph</a>Sample text</p>\
            <a href=\"#second-distant-paragraph\">Link to second paragraph</a>\
            <h1>Part 2</h1>\
            <p id=\"first-distant-paragraph\">This should move</p>\
            <h1>Part 3</h1>\
            <p id=\"second-distant-paragraph\">This too</p>";
        let expected = "<h1>Part 1</h1>\
            <p><a href=\"#first-distant-paragraph\">Link to first paragraph</a>Sample text</p>\
            <a href=\"#second-distant-paragraph\">Link to second paragraph</a>\
            <p id=\"first-distant-paragraph\">This should move</p>\
            <p id=\"second-distant-paragraph\">This too</p>\
            <h1>Part 2</h1>\
            <h1>Part 3</h1>";
        assert_eq!(relocated(input), expected);
        assert_eq!(relocated(expected), expected);
    }

    #[test]
    fn wraps_non_paragraph_targets() {
        assert_eq!(
            relocated("<a href=\"#note\">see</a><h1>Next</h1><div id=\"note\" class=\"n\">a<i>b</i></div>"),
            "<a href=\"#note\">see</a><p id=\"note\">a<i>b</i></p><h1>Next</h1>"
        );
    }

    #[test]
    fn promotes_single_inner_paragraph() {
        assert_eq!(
            relocated("<a href=\"#note\">see</a><h1>Next</h1><div id=\"note\">\n  <p class=\"inner\">text</p>\n</div>"),
            "<a href=\"#note\">see</a><p class=\"inner\" id=\"note\">text</p><h1>Next</h1>"
        );
    }

    #[test]
    fn keeps_order_of_already_placed_targets() {
        let input = "<h1>A</h1><a href=\"#one\">1</a><a href=\"#two\">2</a>\
            <h1>B</h1><p id=\"two\">two</p><p id=\"one\">one</p>";
        let expected = "<h1>A</h1><a href=\"#one\">1</a><a href=\"#two\">2</a>\
            <p id=\"one\">one</p><p id=\"two\">two</p><h1>B</h1>";
        assert_eq!(relocated(input), expected);
        assert_eq!(relocated(expected), expected);
    }

    #[test]
    fn keeps_only_paragraph_attributes() {
        assert_eq!(
            relocated(
                "<a href=\"#t\">t</a><h1>B</h1><a id=\"t\" href=\"http://x.org\">target link</a>"
            ),
            "<a href=\"#t\">t</a><p id=\"t\">target link</p><h1>B</h1>"
        );
        assert_eq!(
            relocated("<a href=\"#r\">r</a><h1>B</h1><ol id=\"r\" start=\"3\"><li>x</li></ol>"),
            "<a href=\"#r\">r</a><p id=\"r\"><li>x</li></p><h1>B</h1>"
        );
    }

    #[test]
    fn removes_containers_left_empty() {
        assert_eq!(
            relocated("<a href=\"#x\">x</a><h1>B</h1><div><p id=\"x\">moved</p></div>"),
            "<a href=\"#x\">x</a><p id=\"x\">moved</p><h1>B</h1>"
        );
        assert_eq!(
            relocated(
                "<a href=\"#c\">c</a><h1>B</h1>\
                 <table><tr><td id=\"c\" colspan=\"2\">cell</td></tr></table><p>after</p>"
            ),
            "<a href=\"#c\">c</a><p id=\"c\">cell</p><h1>B</h1><p>after</p>"
        );
    }

    #[test]
    fn keeps_containers_with_content_left() {
        assert_eq!(
            relocated("<a href=\"#x\">x</a><h1>B</h1><div><p id=\"x\">moved</p>kept</div>"),
            "<a href=\"#x\">x</a><p id=\"x\">moved</p><h1>B</h1><div>kept</div>"
        );
    }

    #[test]
    fn never_moves_headings() {
        let input = "<a href=\"#title\">top</a><h1>Next</h1><h2 id=\"title\">Title</h2>";
        assert_eq!(relocated(input), input);
    }

    #[test]
    fn stays_put_without_following_h1() {
        let input = "<h1>Only</h1><a href=\"#x\">x</a><p id=\"x\">target</p>";
        assert_eq!(relocated(input), input);
    }

    #[test]
    fn ignores_unknown_and_external_references() {
        let input = "<a href=\"#missing\">m</a><a href=\"http://x/#y\">e</a><h1>H</h1><p id=\"y\">y</p>";
        assert_eq!(relocated(input), input);
    }

    #[test]
    fn skips_heading_inside_target() {
        let input = "<div id=\"s\"><a href=\"#s\">self</a><h1>Inner</h1></div>";
        assert_eq!(relocated(input), input);
    }

    #[test]
    fn target_containing_its_link() {
        assert_eq!(
            relocated("<p id=\"x\"><a href=\"#x\">here</a> text</p><h1>Next</h1>"),
            "<p id=\"x\"><a href=\"#x\">here</a> text</p><h1>Next</h1>"
        );
    }

    #[test]
    fn next_heading_walks_up_ancestors() {
        with_document(
            "<div><p><a href=\"#x\">x</a>tail</p><h2>no</h2></div><span></span><h1>yes</h1>",
            |document| {
                let anchor = document.select(local_name!("a"))[0];
                let heading = next_section_heading(anchor).unwrap();
                assert_eq!(heading.text_content(), "yes");
            },
        );
    }

    #[test]
    fn next_heading_ignores_preceding_h1() {
        with_document("<h1>before</h1><p><a>x</a></p>", |document| {
            let anchor = document.select(local_name!("a"))[0];
            assert!(next_section_heading(anchor).is_none());
        });
    }
}
