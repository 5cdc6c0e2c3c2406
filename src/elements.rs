use html5ever::LocalName;
use tracing::{debug, trace};

use crate::arena_dom::{NodeData, Ref};
use crate::document::Document;
use crate::sanitizer::SanitizerConfig;

pub const ILLEGAL_TAG_LABEL: &str = "Illegal HTML tag removed : ";

/// Removes empty elements, swaps disallowed tags for a warning and strips attributes the policy
/// does not allow.
///
/// Works on a snapshot of the tree taken up front. Nodes that a deletion earlier in the pass has
/// cut off from the document are skipped; the children of a replaced element are moved into its
/// warning wrapper, so they are still visited and sanitized later in the same pass.
pub fn sanitize_elements(document: &Document<'_>, config: &SanitizerConfig) {
    debug!("Cleaning up elements...");
    let nodes: Vec<_> = document.root().descendants().collect();
    for node in nodes {
        if !node.is_attached() {
            continue;
        }
        match node.data {
            NodeData::Comment { .. } if !config.allow_comments => node.detach(),
            NodeData::Element { ref name, .. } => {
                sanitize_element(document, config, node, &name.local)
            }
            _ => {}
        }
    }
}

fn sanitize_element<'arena>(
    document: &Document<'arena>,
    config: &SanitizerConfig,
    node: Ref<'arena>,
    name: &LocalName,
) {
    if node.has_blank_text() && !config.allows_empty(name) {
        trace!(tag = %name, "removing empty element");
        node.detach();
        return;
    }

    if !config.allows_element(name) {
        trace!(tag = %name, "replacing illegal element");
        replace_illegal_element(document, node);
        return;
    }

    node.retain_attributes(|attr| {
        let attribute = &attr.name.local;
        if !config.allows_attribute(name, attribute) {
            trace!(tag = %name, %attribute, "removing attribute");
            return false;
        }
        if config.is_scheme_restricted(attribute) && !config.allows_url(&attr.value) {
            trace!(tag = %name, %attribute, value = %attr.value, "removing disallowed url");
            return false;
        }
        true
    });
}

/// `<span>` inside a paragraph, `<p>` anywhere else.
fn replace_illegal_element<'arena>(document: &Document<'arena>, node: Ref<'arena>) {
    let in_paragraph = node
        .parent
        .get()
        .map_or(false, |parent| parent.is_named(local_name!("p")));
    let wrapper = document.create_element(if in_paragraph { "span" } else { "p" });
    let label = document.create_element("b");
    label.append(document.create_text(ILLEGAL_TAG_LABEL));
    wrapper.append(label);
    node.reparent_children(wrapper);
    node.replace_with(wrapper);
}
