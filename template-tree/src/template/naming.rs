//! Conversion between markup tag names and template names
//!
//! Templates are named in camelCase (`childA`) and referenced from markup as
//! custom elements in kebab-case (`<child-a>`).

use convert_case::{Case, Casing};

/// Convert a markup tag name to the template name it refers to
///
/// ```rust
/// use template_tree::template::tag_to_name;
///
/// assert_eq!(tag_to_name("nav-bar"), "navBar");
/// assert_eq!(tag_to_name("CHILD-A"), "childA");
/// ```
#[must_use]
pub fn tag_to_name(tag: &str) -> String {
    tag.to_ascii_lowercase().to_case(Case::Camel)
}

/// Convert a template name to the tag used to reference it from markup
///
/// ```rust
/// use template_tree::template::name_to_tag;
///
/// assert_eq!(name_to_tag("navBar"), "nav-bar");
/// ```
#[must_use]
pub fn name_to_tag(name: &str) -> String {
    name.to_case(Case::Kebab)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_to_name() {
        assert_eq!(tag_to_name("child-a"), "childA");
        assert_eq!(tag_to_name("main"), "main");
        assert_eq!(tag_to_name("fill-screen-button"), "fillScreenButton");
        assert_eq!(tag_to_name("DIV"), "div");
    }

    #[test]
    fn test_name_to_tag() {
        assert_eq!(name_to_tag("childA"), "child-a");
        assert_eq!(name_to_tag("loadingScreen"), "loading-screen");
        assert_eq!(name_to_tag("main"), "main");
    }

    #[test]
    fn test_names_survive_a_round_trip() {
        for name in ["main", "navBar", "overlay", "helpScreen", "viewerControls"] {
            assert_eq!(tag_to_name(&name_to_tag(name)), name);
        }
    }
}
