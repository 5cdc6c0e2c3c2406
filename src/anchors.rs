use tracing::{debug, trace};

use crate::document::Document;

/// Moves the `id` of every `<a id>` onto its direct parent, unless the parent already has one.
pub fn sanitize_anchors(document: &Document<'_>) {
    debug!("Setting anchor ids on their parents...");
    for anchor in document.select(local_name!("a")) {
        let id = match anchor.get_attribute(&local_name!("id")) {
            Some(id) if !id.is_empty() => id,
            _ => continue,
        };
        let parent = match anchor.parent.get() {
            Some(parent) if parent.is_element() => parent,
            _ => continue,
        };
        if parent
            .get_attribute(&local_name!("id"))
            .map_or(false, |existing| !existing.is_empty())
        {
            continue;
        }

        trace!(%id, parent = %parent.data, "promoting anchor id");
        parent.set_attribute(local_name!("id"), &id);
        anchor.remove_attribute(&local_name!("id"));
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use pretty_assertions::assert_eq;

    use crate::test_utils::apply;

    #[test]
    fn sets_anchor_id_on_parent() {
        assert_eq!(
            apply("<p><a id=\"my-link\"></a>Sample text</p>", sanitize_anchors),
            "<p id=\"my-link\"><a></a>Sample text</p>"
        );
    }

    #[test]
    fn keeps_existing_parent_id() {
        let input = "<p id=\"mytext\"><a id=\"my-link\"></a>Sample text</p>";
        assert_eq!(apply(input, sanitize_anchors), input);
    }

    #[test]
    fn second_anchor_keeps_its_id() {
        assert_eq!(
            apply(
                "<li><a id=\"one\">1</a><a id=\"two\">2</a></li>",
                sanitize_anchors
            ),
            "<li id=\"one\"><a>1</a><a id=\"two\">2</a></li>"
        );
    }

    #[test]
    fn top_level_anchor_is_untouched() {
        let input = "<a id=\"top\">top</a>";
        assert_eq!(apply(input, sanitize_anchors), input);
    }

    #[test]
    fn keeps_other_anchor_attributes() {
        assert_eq!(
            apply(
                "<div><a href=\"#x\" id=\"here\">go</a></div>",
                sanitize_anchors
            ),
            "<div id=\"here\"><a href=\"#x\">go</a></div>"
        );
    }

    #[test]
    fn idempotent() {
        let once = apply("<p><a id=\"x\">a</a></p>", sanitize_anchors);
        assert_eq!(apply(&once, sanitize_anchors), once);
    }
}
