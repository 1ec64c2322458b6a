//! Template construction helpers for tests.
//!
//! Templates are parsed upstream of this crate, so tests assemble nodes by hand.
//! `TemplateBuilder` keeps that honest: every span is located in the real template
//! text by searching for a snippet, and node ids are allocated sequentially.
//!
//! Lookups panic when a snippet is missing; the builder is only meant for tests.

use std::sync::Arc;

use crate::expression_parser::ast::{BindingType, ParsedEventType, AST};
use crate::parse_util::{ParseSourceFile, ParseSourceSpan};
use crate::render3::r3_ast::{
    BoundAttribute, BoundEvent, BoundText, Element, NodeId, R3Node, Reference, Template,
    TemplateAttr, Text, TextAttribute, Variable,
};

pub struct TemplateBuilder {
    file: Arc<ParseSourceFile>,
    next_id: u32,
}

impl TemplateBuilder {
    pub fn new(template: &str) -> Self {
        Self::with_url(template, "test.html")
    }

    pub fn with_url(template: &str, url: &str) -> Self {
        TemplateBuilder {
            file: Arc::new(ParseSourceFile::new(template, url)),
            next_id: 0,
        }
    }

    pub fn file(&self) -> &Arc<ParseSourceFile> {
        &self.file
    }

    pub fn text(&self) -> &str {
        &self.file.content
    }

    pub fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Offset of the first occurrence of `needle`.
    pub fn offset(&self, needle: &str) -> usize {
        self.file
            .content
            .find(needle)
            .unwrap_or_else(|| panic!("`{}` not found in template", needle))
    }

    /// Offset of the first occurrence of `needle` after the first occurrence of `anchor`.
    pub fn offset_after(&self, anchor: &str, needle: &str) -> usize {
        let start = self.offset(anchor);
        self.file.content[start..]
            .find(needle)
            .map(|rel| start + rel)
            .unwrap_or_else(|| panic!("`{}` not found after `{}`", needle, anchor))
    }

    /// Where the key `name` starts inside an attribute starting at `start`. Desugared
    /// names (`ngForOf`, `valueChange`) do not appear in the text; they key at `start`.
    fn key_offset(&self, start: usize, name: &str) -> usize {
        self.file.content[start..]
            .find(name)
            .map(|rel| start + rel)
            .unwrap_or(start)
    }

    pub fn span(&self, start: usize, end: usize) -> ParseSourceSpan {
        ParseSourceSpan::from_offsets(&self.file, start, end)
    }

    pub fn span_of(&self, needle: &str) -> ParseSourceSpan {
        let start = self.offset(needle);
        self.span(start, start + needle.len())
    }

    /// Identifier read `name` at its first occurrence after `anchor`.
    pub fn ident_after(&self, anchor: &str, name: &str) -> AST {
        AST::ident(name, self.offset_after(anchor, name))
    }

    /// Identifier read `name` at its first occurrence.
    pub fn ident(&self, name: &str) -> AST {
        AST::ident(name, self.offset(name))
    }

    /// `receiver.name`, with `name` searched after the receiver.
    pub fn prop(&self, receiver: AST, name: &str) -> AST {
        let from = receiver.source_span().end;
        let rel = self.file.content[from..]
            .find(name)
            .unwrap_or_else(|| panic!("`{}` not found after offset {}", name, from));
        AST::prop(receiver, name, from + rel)
    }

    /// `receiver()` ending at the first `)` after the receiver.
    pub fn call(&self, receiver: AST, args: Vec<AST>) -> AST {
        let from = args
            .last()
            .map(|a| a.source_span().end)
            .unwrap_or(receiver.source_span().end);
        let rel = self.file.content[from..].find(')').unwrap_or(0);
        AST::call(receiver, args, from + rel + 1)
    }

    /// `exp | name`, with the pipe name searched after the expression.
    pub fn pipe(&self, exp: AST, name: &str, args: Vec<AST>) -> AST {
        let from = exp.source_span().end;
        let rel = self.file.content[from..]
            .find(name)
            .unwrap_or_else(|| panic!("pipe `{}` not found", name));
        AST::pipe(exp, name, from + rel, args)
    }

    pub fn element(&mut self, name: &str, snippet: &str) -> Element {
        let source_span = self.span_of(snippet);
        let start = self.offset(snippet);
        let start_tag_end = self.file.content[start..]
            .find('>')
            .map(|rel| start + rel + 1)
            .unwrap_or(start + snippet.len());
        Element {
            id: self.next_id(),
            name: name.to_string(),
            attributes: vec![],
            inputs: vec![],
            outputs: vec![],
            children: vec![],
            references: vec![],
            source_span,
            start_source_span: self.span(start, start_tag_end),
            end_source_span: None,
        }
    }

    pub fn template(&mut self, snippet: &str) -> Template {
        let source_span = self.span_of(snippet);
        let start = self.offset(snippet);
        let start_tag_end = self.file.content[start..]
            .find('>')
            .map(|rel| start + rel + 1)
            .unwrap_or(start + snippet.len());
        Template {
            id: self.next_id(),
            tag_name: None,
            attributes: vec![],
            inputs: vec![],
            outputs: vec![],
            template_attrs: vec![],
            children: vec![],
            references: vec![],
            variables: vec![],
            source_span,
            start_source_span: self.span(start, start_tag_end),
            end_source_span: None,
        }
    }

    /// `[name]="value"` where `snippet` is the whole attribute text.
    pub fn input(&mut self, name: &str, value: AST, snippet: &str) -> BoundAttribute {
        self.bound_attribute(name, BindingType::Property, value, snippet)
    }

    pub fn bound_attribute(
        &mut self,
        name: &str,
        type_: BindingType,
        value: AST,
        snippet: &str,
    ) -> BoundAttribute {
        let start = self.offset(snippet);
        let key_start = self.key_offset(start, name);
        let value_span = value.source_span();
        BoundAttribute {
            id: self.next_id(),
            name: name.to_string(),
            type_,
            value,
            unit: None,
            source_span: self.span(start, start + snippet.len()),
            key_span: self.span(key_start, key_start + name.len()),
            value_span: Some(self.span(value_span.start, value_span.end)),
        }
    }

    /// `(name)="handler"` where `snippet` is the whole attribute text.
    pub fn output(&mut self, name: &str, handler: AST, snippet: &str) -> BoundEvent {
        self.bound_event(name, ParsedEventType::Regular, handler, snippet)
    }

    pub fn bound_event(
        &mut self,
        name: &str,
        type_: ParsedEventType,
        handler: AST,
        snippet: &str,
    ) -> BoundEvent {
        let start = self.offset(snippet);
        let key_start = self.key_offset(start, name);
        let handler_span = handler.source_span();
        BoundEvent {
            id: self.next_id(),
            name: name.to_string(),
            type_,
            handler,
            target: None,
            phase: None,
            source_span: self.span(start, start + snippet.len()),
            handler_span: self.span(handler_span.start, handler_span.end),
            key_span: self.span(key_start, key_start + name.len()),
        }
    }

    /// `[(name)]="target"`: the property half and the `nameChange` event half that
    /// assigns `$event` back into `target`.
    pub fn two_way(&mut self, name: &str, target: &str, snippet: &str) -> (BoundAttribute, BoundEvent) {
        let value_start = self.offset_after(snippet, &format!("\"{}", target)) + 1;
        let read = AST::ident(target, value_start);
        let input = self.bound_attribute(name, BindingType::TwoWay, read, snippet);
        let write = AST::assign(target, value_start, AST::ident("$event", value_start));
        let output = self.bound_event(&format!("{}Change", name), ParsedEventType::TwoWay, write, snippet);
        (input, output)
    }

    pub fn text_attribute(&mut self, name: &str, value: &str, snippet: &str) -> TextAttribute {
        TextAttribute {
            name: name.to_string(),
            value: value.to_string(),
            source_span: self.span_of(snippet),
            key_span: Some(self.span_of(name)),
            value_span: None,
        }
    }

    pub fn reference(&mut self, name: &str, value: &str, snippet: &str) -> Reference {
        let start = self.offset(snippet);
        let key_start = self.offset_after(snippet, name);
        Reference {
            id: self.next_id(),
            name: name.to_string(),
            value: value.to_string(),
            source_span: self.span(start, start + snippet.len()),
            key_span: self.span(key_start, key_start + name.len()),
            value_span: None,
        }
    }

    pub fn variable(&mut self, name: &str, value: &str, snippet: &str) -> Variable {
        let start = self.offset(snippet);
        self.variable_at(name, value, start, snippet.len())
    }

    /// A variable whose snippet is the `nth` (zero-based) occurrence of `snippet`.
    pub fn nth_variable(&mut self, name: &str, value: &str, snippet: &str, nth: usize) -> Variable {
        let start = self
            .file
            .content
            .match_indices(snippet)
            .nth(nth)
            .map(|(idx, _)| idx)
            .unwrap_or_else(|| panic!("occurrence {} of `{}` not found", nth, snippet));
        self.variable_at(name, value, start, snippet.len())
    }

    fn variable_at(&mut self, name: &str, value: &str, start: usize, len: usize) -> Variable {
        let key_start = self.file.content[start..]
            .find(name)
            .map(|rel| start + rel)
            .unwrap_or(start);
        Variable {
            id: self.next_id(),
            name: name.to_string(),
            value: value.to_string(),
            source_span: self.span(start, start + len),
            key_span: self.span(key_start, key_start + name.len()),
            value_span: None,
        }
    }

    /// Interpolation `{{ expr }}` as a text node, where `snippet` is the braces text.
    pub fn bound_text(&mut self, expr: AST, snippet: &str) -> R3Node {
        let start = self.offset(snippet);
        let end = start + snippet.len();
        R3Node::BoundText(BoundText {
            id: self.next_id(),
            value: AST::interpolation(vec![expr], start, end),
            source_span: self.span(start, end),
        })
    }

    pub fn static_text(&self, snippet: &str) -> R3Node {
        R3Node::Text(Text {
            value: snippet.to_string(),
            source_span: self.span_of(snippet),
        })
    }

    /// Adds a bound micro-syntax attribute (`*ngIf="cond"` becomes `ngIf`) to a template.
    pub fn template_attr(&mut self, tmpl: &mut Template, name: &str, value: AST, snippet: &str) {
        let attr = self.bound_attribute(name, BindingType::Property, value, snippet);
        tmpl.template_attrs.push(TemplateAttr::Bound(attr));
    }
}
