// TypeCheck API Module

pub mod api;
pub mod checker;
pub mod completion;
pub mod symbols;

pub use api::*;
pub use checker::TemplateTypeChecker;
pub use completion::{CompletionKind, GlobalCompletion, TemplateEntityCompletion};
pub use symbols::{BindingSymbol, BindingTarget, DirectiveSymbol, TcbLocation, TemplateNode, TemplateSymbol};
