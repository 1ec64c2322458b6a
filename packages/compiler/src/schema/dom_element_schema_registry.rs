//! DOM Element Schema Registry
//!
//! A table of DOM elements and their bindable properties, with inheritance.

use super::element_schema_registry::ElementSchemaRegistry;
use crate::core::{SchemaMetadata, CUSTOM_ELEMENTS_SCHEMA_NAME, NO_ERRORS_SCHEMA_NAME};
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

/// DOM schema encoding inheritance, properties, and events
///
/// ## Format:
/// Each line: `element_inheritance|properties`
///
/// - Elements separated by `,` have identical properties
/// - `^parentElement` indicates inheritance
/// - Property prefixes: (none) string, `*` event, `!` boolean, `#` number, `%` object
pub static SCHEMA: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "[Element]|textContent,%classList,className,id,innerHTML,outerHTML,#scrollLeft,#scrollTop,slot,%ariaLabel,%ariaHidden,%ariaDisabled,%ariaExpanded,*fullscreenchange,*fullscreenerror",
        "[HTMLElement]^[Element]|accessKey,contentEditable,dir,!draggable,!hidden,!inert,innerText,lang,nonce,*blur,*change,*click,*contextmenu,*dblclick,*focus,*input,*keydown,*keypress,*keyup,*mousedown,*mouseenter,*mouseleave,*mousemove,*mouseout,*mouseover,*mouseup,*scroll,*submit,*wheel,outerText,!spellcheck,%style,#tabIndex,title,!translate",
        "abbr,address,article,aside,b,cite,code,em,footer,header,i,main,nav,section,small,span,strong,sub,sup,u^[HTMLElement]|",
        "a^[HTMLElement]|download,hash,host,href,hreflang,name,rel,target,text,type",
        "br^[HTMLElement]|clear",
        "button^[HTMLElement]|!disabled,formAction,name,type,value",
        "canvas^[HTMLElement]|#height,#width",
        "div^[HTMLElement]|align",
        "form^[HTMLElement]|acceptCharset,action,autocomplete,encoding,enctype,method,name,!noValidate,target",
        "h1,h2,h3,h4,h5,h6^[HTMLElement]|align",
        "img^[HTMLElement]|align,alt,border,crossOrigin,#height,!isMap,loading,sizes,src,srcset,useMap,#width",
        "input^[HTMLElement]|accept,align,alt,autocomplete,!checked,!defaultChecked,defaultValue,!disabled,%files,formAction,#height,!indeterminate,max,#maxLength,min,#minLength,!multiple,name,pattern,placeholder,!readOnly,!required,#size,src,step,type,value,#valueAsNumber,#width",
        "label^[HTMLElement]|htmlFor",
        "li^[HTMLElement]|type,#value",
        "ol^[HTMLElement]|!compact,!reversed,#start,type",
        "option^[HTMLElement]|!defaultSelected,!disabled,label,!selected,text,value",
        "p^[HTMLElement]|align",
        "select^[HTMLElement]|autocomplete,!disabled,#length,!multiple,name,!required,#selectedIndex,#size,value",
        "table^[HTMLElement]|align,border,%caption,cellPadding,cellSpacing,frame,rules,summary,width",
        "td,th^[HTMLElement]|abbr,align,axis,#colSpan,headers,#rowSpan,scope,vAlign,width",
        "textarea^[HTMLElement]|autocomplete,#cols,defaultValue,dirName,!disabled,#maxLength,#minLength,name,placeholder,!readOnly,!required,#rows,value,wrap",
        "tr^[HTMLElement]|align,bgColor,ch,chOff,vAlign",
        "ul^[HTMLElement]|!compact,type",
        "unknown^[HTMLElement]|",
    ]
});

/// Map from attribute names to property names
pub static ATTR_TO_PROP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("class", "className"),
        ("for", "htmlFor"),
        ("formaction", "formAction"),
        ("innerHtml", "innerHTML"),
        ("readonly", "readOnly"),
        ("tabindex", "tabIndex"),
        ("aria-label", "ariaLabel"),
        ("aria-hidden", "ariaHidden"),
        ("aria-disabled", "ariaDisabled"),
        ("aria-expanded", "ariaExpanded"),
    ])
});

fn has_schema(schema_metas: &[SchemaMetadata], name: &str) -> bool {
    schema_metas.iter().any(|s| s.name == name)
}

/// DOM Element Schema Registry implementation
pub struct DomElementSchemaRegistry {
    schema: HashMap<String, HashSet<String>>,
    // Events are tracked separately; binding to them as properties is never allowed.
    event_schema: HashMap<String, HashSet<String>>,
}

impl DomElementSchemaRegistry {
    pub fn new() -> Self {
        let mut schema: HashMap<String, HashSet<String>> = HashMap::new();
        let mut event_schema: HashMap<String, HashSet<String>> = HashMap::new();

        for encoded_type in SCHEMA.iter() {
            let Some((str_type, str_properties)) = encoded_type.split_once('|') else {
                continue;
            };
            let (type_names, super_name) = match str_type.split_once('^') {
                Some((names, parent)) => (names, Some(parent)),
                None => (str_type, None),
            };

            let mut properties: HashSet<String> = HashSet::new();
            let mut events: HashSet<String> = HashSet::new();
            if let Some(parent) = super_name.map(str::to_lowercase) {
                properties.extend(schema.get(&parent).into_iter().flatten().cloned());
                events.extend(event_schema.get(&parent).into_iter().flatten().cloned());
            }

            for property in str_properties.split(',').filter(|p| !p.is_empty()) {
                match property.as_bytes()[0] {
                    b'*' => {
                        events.insert(property[1..].to_string());
                    }
                    b'!' | b'#' | b'%' => {
                        properties.insert(property[1..].to_string());
                    }
                    _ => {
                        properties.insert(property.to_string());
                    }
                }
            }

            for tag in type_names.split(',') {
                let tag = tag.to_lowercase();
                schema.insert(tag.clone(), properties.clone());
                event_schema.insert(tag, events.clone());
            }
        }

        DomElementSchemaRegistry {
            schema,
            event_schema,
        }
    }

    /// Get all known events of an element
    pub fn all_known_events_of_element(&self, tag_name: &str) -> Vec<String> {
        let mut events: Vec<String> = self
            .event_schema
            .get(&tag_name.to_lowercase())
            .map(|events| events.iter().cloned().collect())
            .unwrap_or_default();
        events.sort();
        events
    }
}

impl Default for DomElementSchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn is_ng_container_or_content(tag_name: &str) -> bool {
    let local = tag_name.rsplit(':').next().unwrap_or(tag_name);
    local == "ng-container" || local == "ng-content"
}

impl ElementSchemaRegistry for DomElementSchemaRegistry {
    fn has_property(&self, tag_name: &str, prop_name: &str, schema_metas: &[SchemaMetadata]) -> bool {
        if has_schema(schema_metas, NO_ERRORS_SCHEMA_NAME) {
            return true;
        }

        if tag_name.contains('-') {
            if is_ng_container_or_content(tag_name) {
                return false;
            }
            if has_schema(schema_metas, CUSTOM_ELEMENTS_SCHEMA_NAME) {
                // Properties of a custom element are only known once it is instantiated.
                return true;
            }
        }

        self.schema
            .get(&tag_name.to_lowercase())
            .or_else(|| self.schema.get("unknown"))
            .is_some_and(|props| props.contains(prop_name))
    }

    fn has_element(&self, tag_name: &str, schema_metas: &[SchemaMetadata]) -> bool {
        if has_schema(schema_metas, NO_ERRORS_SCHEMA_NAME) {
            return true;
        }

        if tag_name.contains('-') {
            if is_ng_container_or_content(tag_name) {
                return true;
            }
            if has_schema(schema_metas, CUSTOM_ELEMENTS_SCHEMA_NAME) {
                return true;
            }
        }

        self.schema.contains_key(&tag_name.to_lowercase())
    }

    fn get_mapped_prop_name(&self, prop_name: &str) -> String {
        ATTR_TO_PROP
            .get(prop_name)
            .copied()
            .unwrap_or(prop_name)
            .to_string()
    }

    fn all_known_element_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .schema
            .keys()
            .filter(|name| !name.starts_with('['))
            .cloned()
            .collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{custom_elements_schema, no_errors_schema};

    #[test]
    fn test_has_element() {
        let registry = DomElementSchemaRegistry::new();
        assert!(registry.has_element("div", &[]));
        assert!(registry.has_element("ng-container", &[]));
        assert!(!registry.has_element("my-cmp", &[]));
        assert!(registry.has_element("my-cmp", &[custom_elements_schema()]));
        assert!(registry.has_element("anything", &[no_errors_schema()]));
    }

    #[test]
    fn test_has_property_inherits_from_parents() {
        let registry = DomElementSchemaRegistry::new();
        assert!(registry.has_property("input", "value", &[]));
        assert!(registry.has_property("input", "title", &[]));
        assert!(registry.has_property("div", "id", &[]));
        assert!(!registry.has_property("div", "value", &[]));
        assert!(!registry.has_property("div", "click", &[]));
    }

    #[test]
    fn test_events_are_not_properties() {
        let registry = DomElementSchemaRegistry::new();
        assert!(registry.all_known_events_of_element("button").contains(&"click".to_string()));
    }

    #[test]
    fn test_get_mapped_prop_name() {
        let registry = DomElementSchemaRegistry::new();
        assert_eq!(registry.get_mapped_prop_name("class"), "className");
        assert_eq!(registry.get_mapped_prop_name("title"), "title");
    }
}
