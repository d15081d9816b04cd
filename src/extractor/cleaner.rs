use ammonia::Builder;
use kuchiki::NodeRef;
use kuchiki::traits::TendrilSink;
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

const ALLOWED_TAGS: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "ul", "ol", "li", "strong", "em", "b", "i", "u", "a",
    "img", "blockquote", "br", "hr", "div", "span", "table", "thead", "tbody", "tr", "td", "th",
];

/// Tags dropped together with everything inside them.
const REMOVED_WITH_CONTENT: &[&str] = &["script", "style"];

const URL_SCHEMES: &[&str] = &["http", "https", "mailto", "tel", "data"];

/// Reduce markup to the allow-listed subset suitable for publishing.
///
/// Disallowed tags are unwrapped, attributes are limited per tag, anchors
/// without `href` are unwrapped and images without `src` are removed.
/// Running the result through `sanitize` again returns it unchanged.
pub fn sanitize(html: &str) -> String {
    let cleaned = builder().clean(html).to_string();
    prune(&cleaned).unwrap_or(cleaned)
}

fn builder() -> Builder<'static> {
    let tag_attributes: HashMap<&'static str, HashSet<&'static str>> = HashMap::from([
        ("a", HashSet::from(["href", "title"])),
        ("img", HashSet::from(["src", "alt", "title", "width", "height"])),
        ("td", HashSet::from(["colspan", "rowspan"])),
        ("th", HashSet::from(["colspan", "rowspan"])),
    ]);

    let mut builder = Builder::default();
    builder
        .tags(ALLOWED_TAGS.iter().copied().collect())
        .clean_content_tags(REMOVED_WITH_CONTENT.iter().copied().collect())
        .tag_attributes(tag_attributes)
        .generic_attributes(HashSet::new())
        .url_schemes(URL_SCHEMES.iter().copied().collect())
        .link_rel(None)
        .strip_comments(true)
        .attribute_filter(|element, attribute, value| {
            // data: URIs are only acceptable as image sources
            if element == "a"
                && attribute == "href"
                && value.trim_start().to_ascii_lowercase().starts_with("data:")
            {
                None
            } else {
                Some(Cow::Borrowed(value))
            }
        });
    builder
}

/// Structural rules the attribute allow-list cannot express.
fn prune(html: &str) -> Option<String> {
    let document =
        kuchiki::parse_html().one(format!("<html><head></head><body>{html}</body></html>"));

    let anchors: Vec<_> = document.select("a").ok()?.collect();
    for anchor in anchors {
        let has_href = anchor.attributes.borrow().contains("href");
        if !has_href {
            unwrap_node(anchor.as_node());
        }
    }

    let images: Vec<_> = document.select("img").ok()?.collect();
    for image in images {
        let has_src = image
            .attributes
            .borrow()
            .get("src")
            .is_some_and(|src| !src.trim().is_empty());
        if !has_src {
            image.as_node().detach();
        }
    }

    let body = document.select_first("body").ok()?;
    Some(
        body.as_node()
            .children()
            .map(|child| child.to_string())
            .collect(),
    )
}

fn unwrap_node(node: &NodeRef) {
    let children: Vec<_> = node.children().collect();
    for child in children {
        node.insert_before(child);
    }
    node.detach();
}
