use angular_compiler::directive_matching::{CssSelector, SelectorMatcher};

#[cfg(test)]
mod tests {
    use super::*;

    // Helper to get a selector for given properties
    fn get_selector_for(tag: Option<&str>, attrs: Vec<(&str, &str)>, classes: Option<&str>) -> CssSelector {
        let mut selector = CssSelector::new();
        if let Some(t) = tag {
            selector.set_element(t);
        }
        for (name, value) in attrs {
            selector.add_attribute(name, value);
        }
        if let Some(c) = classes {
            for c_name in c.split_whitespace() {
                selector.add_class_name(c_name);
            }
        }
        selector
    }

    fn matcher_for(selectors: &[(&str, i32)]) -> SelectorMatcher<i32> {
        let mut matcher = SelectorMatcher::new();
        for (selector, data) in selectors {
            matcher.add_selectables(CssSelector::parse(selector).unwrap(), *data);
        }
        matcher
    }

    #[test]
    fn should_select_by_element_name_case_sensitive() {
        let matcher = matcher_for(&[("someTag", 1)]);
        assert!(matcher.match_node(&get_selector_for(Some("SOMEOTHERTAG"), vec![], None)).is_empty());
        assert!(matcher.match_node(&get_selector_for(Some("SOMETAG"), vec![], None)).is_empty());
        assert_eq!(matcher.match_node(&get_selector_for(Some("someTag"), vec![], None)), vec![&1]);
    }

    #[test]
    fn should_select_by_class_name_case_insensitive() {
        let matcher = matcher_for(&[(".someClass", 1), (".someClass.class2", 2)]);
        assert_eq!(
            matcher.match_node(&get_selector_for(None, vec![], Some("SOMECLASS"))),
            vec![&1]
        );
        assert_eq!(
            matcher.match_node(&get_selector_for(None, vec![], Some("someClass class2"))),
            vec![&1, &2]
        );
    }

    #[test]
    fn should_select_by_attr_name_and_value() {
        let matcher = matcher_for(&[("[some-attr]", 1), ("[some-attr=someValue]", 2)]);
        assert_eq!(
            matcher.match_node(&get_selector_for(None, vec![("some-attr", "")], None)),
            vec![&1]
        );
        assert_eq!(
            matcher.match_node(&get_selector_for(None, vec![("some-attr", "SOMEVALUE")], None)),
            vec![&1, &2]
        );
        assert!(matcher
            .match_node(&get_selector_for(None, vec![("SOME-ATTR", "")], None))
            .is_empty());
    }

    #[test]
    fn should_select_with_not_selectors() {
        let matcher = matcher_for(&[("p:not(.someClass)", 1), (":not([a])", 2)]);
        assert_eq!(matcher.match_node(&get_selector_for(Some("p"), vec![], None)), vec![&1, &2]);
        assert!(matcher
            .match_node(&get_selector_for(Some("p"), vec![("a", "")], Some("someClass")))
            .is_empty());
    }

    #[test]
    fn should_select_any_of_a_selector_list() {
        let matcher = matcher_for(&[("input[type=text], textarea", 1)]);
        assert_eq!(matcher.match_node(&get_selector_for(Some("textarea"), vec![], None)), vec![&1]);
        assert_eq!(
            matcher.match_node(&get_selector_for(Some("input"), vec![("type", "text")], None)),
            vec![&1]
        );
        assert!(matcher
            .match_node(&get_selector_for(Some("input"), vec![("type", "checkbox")], None))
            .is_empty());
    }

    #[test]
    fn should_reject_nested_not() {
        assert!(CssSelector::parse(":not(:not(a))").is_err());
    }
}
