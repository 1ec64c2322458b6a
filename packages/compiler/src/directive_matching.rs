use once_cell::sync::Lazy;
/**
 * Directive Matching - CSS Selector Matching
 *
 * Parses directive selectors and matches them against template nodes. Only the
 * selector forms directives use are supported: tag names, `.class`, `[attr]`,
 * `[attr=value]`, `:not(...)` and comma separated lists.
 */
use regex::Regex;
use serde::{Deserialize, Serialize};

static SELECTOR_REGEXP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(:not\()|(([\.\#]?)[-\w]+)|(?:\[([-.\w*]+)(?:=(?:"([^"]*)"|'([^']*)'|([^\]]*)))?\])|(\))|(\s*,\s*)"#)
        .expect("selector regexp is valid")
});

#[derive(Debug, Clone, Copy)]
enum SelectorRegexp {
    Not = 1,
    Tag = 2,
    Prefix = 3,
    Attribute = 4,
    AttributeValueDouble = 5,
    AttributeValueSingle = 6,
    AttributeValueUnquoted = 7,
    NotEnd = 8,
    Separator = 9,
}

/// CSS Selector representation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CssSelector {
    pub element: Option<String>,
    pub class_names: Vec<String>,
    /// (name, value) pairs; an empty value means "attribute present".
    pub attrs: Vec<(String, String)>,
    pub not_selectors: Vec<CssSelector>,
}

impl CssSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a selector list into its alternatives.
    pub fn parse(selector: &str) -> Result<Vec<CssSelector>, String> {
        let mut results = Vec::new();
        let mut current = CssSelector::new();
        let mut in_not = false;

        for cap in SELECTOR_REGEXP.captures_iter(selector) {
            if cap.get(SelectorRegexp::Not as usize).is_some() {
                if in_not {
                    return Err("Nesting :not in a selector is not allowed".to_string());
                }
                in_not = true;
                current.not_selectors.push(CssSelector::new());
            }

            let target = if in_not {
                match current.not_selectors.last_mut() {
                    Some(not) => not,
                    None => return Err("Unbalanced :not in selector".to_string()),
                }
            } else {
                &mut current
            };

            if let Some(tag) = cap.get(SelectorRegexp::Tag as usize) {
                let tag = tag.as_str();
                match cap.get(SelectorRegexp::Prefix as usize).map(|m| m.as_str()) {
                    Some("#") => target.add_attribute("id", &tag[1..]),
                    Some(".") => target.add_class_name(&tag[1..]),
                    _ => target.set_element(tag),
                }
            }

            if let Some(attr) = cap.get(SelectorRegexp::Attribute as usize) {
                let value = [
                    SelectorRegexp::AttributeValueDouble,
                    SelectorRegexp::AttributeValueSingle,
                    SelectorRegexp::AttributeValueUnquoted,
                ]
                .iter()
                .find_map(|group| cap.get(*group as usize))
                .map(|m| m.as_str())
                .unwrap_or("");
                target.add_attribute(attr.as_str(), value);
            }

            if cap.get(SelectorRegexp::NotEnd as usize).is_some() {
                in_not = false;
            }

            if cap.get(SelectorRegexp::Separator as usize).is_some() {
                if in_not {
                    return Err("Multiple selectors in :not are not supported".to_string());
                }
                results.push(std::mem::take(&mut current));
            }
        }

        results.push(current);
        Ok(results)
    }

    pub fn set_element(&mut self, element: &str) {
        self.element = Some(element.to_string());
    }

    pub fn add_attribute(&mut self, name: &str, value: &str) {
        self.attrs.push((name.to_string(), value.to_lowercase()));
    }

    pub fn add_class_name(&mut self, name: &str) {
        self.class_names.push(name.to_lowercase());
    }

    /// Whether this selector, used as a pattern, matches the node described by `node`.
    pub fn matches(&self, node: &CssSelector) -> bool {
        if let (Some(pattern), Some(actual)) = (&self.element, &node.element) {
            if pattern != "*" && pattern != actual {
                return false;
            }
        } else if self.element.as_deref().is_some_and(|e| e != "*") {
            return false;
        }

        if !self.class_names.iter().all(|c| node.class_names.contains(c)) {
            return false;
        }

        let attrs_match = self.attrs.iter().all(|(name, value)| {
            node.attrs
                .iter()
                .any(|(n, v)| n == name && (value.is_empty() || v.eq_ignore_ascii_case(value)))
        });
        if !attrs_match {
            return false;
        }

        !self.not_selectors.iter().any(|not| not.matches(node))
    }
}

impl std::fmt::Display for CssSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.element.as_deref().unwrap_or(""))?;
        for class_name in &self.class_names {
            write!(f, ".{}", class_name)?;
        }
        for (name, value) in &self.attrs {
            if value.is_empty() {
                write!(f, "[{}]", name)?;
            } else {
                write!(f, "[{}={}]", name, value)?;
            }
        }
        for not_selector in &self.not_selectors {
            write!(f, ":not({})", not_selector)?;
        }
        Ok(())
    }
}

/// Matches node selectors against registered directive selectors. Matches are reported
/// in registration order.
pub struct SelectorMatcher<T> {
    selectables: Vec<(Vec<CssSelector>, T)>,
}

impl<T> SelectorMatcher<T> {
    pub fn new() -> Self {
        SelectorMatcher {
            selectables: Vec::new(),
        }
    }

    pub fn add_selectables(&mut self, selectors: Vec<CssSelector>, data: T) {
        self.selectables.push((selectors, data));
    }

    pub fn match_node(&self, node: &CssSelector) -> Vec<&T> {
        self.selectables
            .iter()
            .filter(|(selectors, _)| selectors.iter().any(|s| s.matches(node)))
            .map(|(_, data)| data)
            .collect()
    }
}

impl<T> Default for SelectorMatcher<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(element: &str, attrs: &[(&str, &str)]) -> CssSelector {
        let mut sel = CssSelector::new();
        sel.set_element(element);
        for (n, v) in attrs {
            sel.add_attribute(n, v);
        }
        sel
    }

    #[test]
    fn test_parse_simple_selector() {
        let parsed = CssSelector::parse("button[mat-button].primary").unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].element.as_deref(), Some("button"));
        assert_eq!(parsed[0].attrs, vec![("mat-button".to_string(), String::new())]);
        assert_eq!(parsed[0].class_names, vec!["primary"]);
        assert_eq!(parsed[0].to_string(), "button.primary[mat-button]");
    }

    #[test]
    fn test_parse_list_and_not() {
        let parsed = CssSelector::parse("[ngModel]:not([formControl]), [ngModelGroup]").unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].not_selectors.len(), 1);
        assert_eq!(parsed[1].attrs[0].0, "ngModelGroup");
    }

    #[test]
    fn test_matches_in_registration_order() {
        let mut matcher = SelectorMatcher::new();
        matcher.add_selectables(CssSelector::parse("[dir]").unwrap(), "Dir");
        matcher.add_selectables(CssSelector::parse("my-cmp").unwrap(), "Cmp");
        matcher.add_selectables(CssSelector::parse("[dir]:not(my-cmp)").unwrap(), "NotCmp");

        let matched = matcher.match_node(&node("my-cmp", &[("dir", "")]));
        assert_eq!(matched, vec![&"Dir", &"Cmp"]);

        let matched = matcher.match_node(&node("div", &[("dir", "x")]));
        assert_eq!(matched, vec![&"Dir", &"NotCmp"]);
    }
}
