use std::collections::{HashMap, HashSet};

use oxc_allocator::Allocator;
use oxc_ast::ast as oxc;
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType};
use ts::Program;

use super::host::*;
use crate::ngtsc::file_system::AbsoluteFsPath;

/// Reflects over the source text of a `ts::Program` with `oxc`.
pub struct TypeScriptReflectionHost<'p> {
    program: &'p Program,
}

impl<'p> TypeScriptReflectionHost<'p> {
    pub fn new(program: &'p Program) -> Self {
        Self { program }
    }
}

impl ReflectionHost for TypeScriptReflectionHost<'_> {
    fn get_class_declaration(&self, file: &AbsoluteFsPath, name: &str) -> Option<ClassDeclaration> {
        self.get_classes_of_file(file)
            .into_iter()
            .find(|decl| decl.class_ref.name == name)
    }

    fn get_classes_of_file(&self, file: &AbsoluteFsPath) -> Vec<ClassDeclaration> {
        let Some(sf) = self.program.get_source_file(file.as_str()) else {
            return Vec::new();
        };
        let allocator = Allocator::default();
        let source_type = SourceType::default().with_typescript(true).with_module(true);
        let ret = Parser::new(&allocator, sf.text(), source_type).parse();
        if !ret.errors.is_empty() {
            tracing::debug!(file = %file, errors = ret.errors.len(), "reflecting over a file with parse errors");
        }

        let scope = FileScope::collect(&ret.program);
        let mut classes = Vec::new();
        for stmt in &ret.program.body {
            let (class, exported) = match stmt {
                oxc::Statement::ClassDeclaration(class) => (&**class, false),
                oxc::Statement::ExportNamedDeclaration(decl) => match &decl.declaration {
                    Some(oxc::Declaration::ClassDeclaration(class)) => (&**class, true),
                    _ => continue,
                },
                oxc::Statement::ExportDefaultDeclaration(decl) => match &decl.declaration {
                    oxc::ExportDefaultDeclarationKind::ClassDeclaration(class) => (&**class, true),
                    _ => continue,
                },
                _ => continue,
            };
            let Some(id) = &class.id else {
                continue;
            };
            let name = id.name.to_string();
            let exported = exported || scope.exported_later.contains(&name);

            let class_ref = ClassRef::new(name, file.clone())
                .with_span(id.span.start as usize, class.span.end as usize);
            let class_ref = if exported { class_ref } else { class_ref.unexported() };

            let mut decl = ClassDeclaration::new(class_ref);
            if let Some(params) = &class.type_parameters {
                let names: HashSet<String> =
                    params.params.iter().map(|p| p.name.name.to_string()).collect();
                let reflected = params
                    .params
                    .iter()
                    .map(|param| {
                        let bound = param
                            .constraint
                            .as_ref()
                            .map(|ty| reflect_bound(ty, sf.text(), &scope, &names));
                        TypeParameter::new(param.name.name.to_string(), bound)
                    })
                    .collect();
                decl = decl.with_type_parameters(reflected);
            }
            classes.push(decl);
        }
        classes
    }
}

/// Top-level names of one file and where they come from.
#[derive(Default)]
struct FileScope {
    /// Local type declarations and whether each is exported.
    locals: HashMap<String, bool>,
    imports: HashMap<String, TypeReferenceOrigin>,
    /// Names exported through a later `export { Name }`.
    exported_later: HashSet<String>,
}

impl FileScope {
    fn collect(program: &oxc::Program<'_>) -> Self {
        let mut scope = FileScope::default();
        for stmt in &program.body {
            match stmt {
                oxc::Statement::ImportDeclaration(decl) => {
                    let module = decl.source.value.to_string();
                    for specifier in decl.specifiers.iter().flatten() {
                        let (local, origin) = match specifier {
                            oxc::ImportDeclarationSpecifier::ImportSpecifier(s) => (
                                s.local.name.to_string(),
                                TypeReferenceOrigin::Imported {
                                    module: module.clone(),
                                    imported_name: module_export_name(&s.imported),
                                },
                            ),
                            oxc::ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => (
                                s.local.name.to_string(),
                                TypeReferenceOrigin::Imported {
                                    module: module.clone(),
                                    imported_name: "default".to_string(),
                                },
                            ),
                            oxc::ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => (
                                s.local.name.to_string(),
                                TypeReferenceOrigin::Namespace {
                                    module: module.clone(),
                                },
                            ),
                        };
                        scope.imports.insert(local, origin);
                    }
                }
                oxc::Statement::ExportNamedDeclaration(decl) => {
                    if let Some(declaration) = &decl.declaration {
                        if let Some(name) = declared_type_name(declaration) {
                            scope.locals.insert(name, true);
                        }
                    } else if decl.source.is_none() {
                        for specifier in &decl.specifiers {
                            scope.exported_later.insert(module_export_name(&specifier.local));
                        }
                    }
                }
                oxc::Statement::ClassDeclaration(class) => {
                    if let Some(id) = &class.id {
                        scope.locals.entry(id.name.to_string()).or_insert(false);
                    }
                }
                oxc::Statement::TSInterfaceDeclaration(decl) => {
                    scope.locals.entry(decl.id.name.to_string()).or_insert(false);
                }
                oxc::Statement::TSTypeAliasDeclaration(decl) => {
                    scope.locals.entry(decl.id.name.to_string()).or_insert(false);
                }
                oxc::Statement::TSEnumDeclaration(decl) => {
                    scope.locals.entry(decl.id.name.to_string()).or_insert(false);
                }
                _ => {}
            }
        }
        for name in &scope.exported_later {
            if let Some(exported) = scope.locals.get_mut(name) {
                *exported = true;
            }
        }
        scope
    }

    fn origin_of(&self, name: &str, type_params: &HashSet<String>) -> TypeReferenceOrigin {
        if type_params.contains(name) {
            TypeReferenceOrigin::TypeParameter
        } else if let Some(&exported) = self.locals.get(name) {
            TypeReferenceOrigin::Local { exported }
        } else if let Some(origin) = self.imports.get(name) {
            origin.clone()
        } else {
            TypeReferenceOrigin::Ambient
        }
    }
}

fn declared_type_name(declaration: &oxc::Declaration<'_>) -> Option<String> {
    match declaration {
        oxc::Declaration::ClassDeclaration(class) => class.id.as_ref().map(|id| id.name.to_string()),
        oxc::Declaration::TSInterfaceDeclaration(decl) => Some(decl.id.name.to_string()),
        oxc::Declaration::TSTypeAliasDeclaration(decl) => Some(decl.id.name.to_string()),
        oxc::Declaration::TSEnumDeclaration(decl) => Some(decl.id.name.to_string()),
        _ => None,
    }
}

fn module_export_name(name: &oxc::ModuleExportName<'_>) -> String {
    match name {
        oxc::ModuleExportName::IdentifierName(id) => id.name.to_string(),
        oxc::ModuleExportName::IdentifierReference(id) => id.name.to_string(),
        oxc::ModuleExportName::StringLiteral(lit) => lit.value.to_string(),
    }
}

fn reflect_bound(
    ty: &oxc::TSType<'_>,
    source: &str,
    scope: &FileScope,
    type_params: &HashSet<String>,
) -> TypeBound {
    let span = ty.span();
    let (start, end) = (span.start as usize, span.end as usize);
    let mut collector = BoundCollector {
        base: start,
        scope,
        type_params,
        references: Vec::new(),
        opaque: false,
    };
    collector.visit(ty);
    TypeBound {
        text: source[start..end].to_string(),
        references: collector.references,
        opaque: collector.opaque,
    }
}

struct BoundCollector<'s> {
    base: usize,
    scope: &'s FileScope,
    type_params: &'s HashSet<String>,
    references: Vec<BoundTypeReference>,
    opaque: bool,
}

impl BoundCollector<'_> {
    fn visit(&mut self, ty: &oxc::TSType<'_>) {
        match ty {
            oxc::TSType::TSTypeReference(reference) => {
                self.visit_type_name(&reference.type_name);
                if let Some(args) = &reference.type_arguments {
                    for arg in &args.params {
                        self.visit(arg);
                    }
                }
            }
            oxc::TSType::TSUnionType(union) => union.types.iter().for_each(|t| self.visit(t)),
            oxc::TSType::TSIntersectionType(inter) => inter.types.iter().for_each(|t| self.visit(t)),
            oxc::TSType::TSArrayType(array) => self.visit(&array.element_type),
            oxc::TSType::TSTypeOperatorType(op) => self.visit(&op.type_annotation),
            oxc::TSType::TSParenthesizedType(paren) => self.visit(&paren.type_annotation),
            oxc::TSType::TSIndexedAccessType(access) => {
                self.visit(&access.object_type);
                self.visit(&access.index_type);
            }
            oxc::TSType::TSAnyKeyword(_)
            | oxc::TSType::TSStringKeyword(_)
            | oxc::TSType::TSNumberKeyword(_)
            | oxc::TSType::TSBooleanKeyword(_)
            | oxc::TSType::TSBigIntKeyword(_)
            | oxc::TSType::TSNeverKeyword(_)
            | oxc::TSType::TSNullKeyword(_)
            | oxc::TSType::TSObjectKeyword(_)
            | oxc::TSType::TSSymbolKeyword(_)
            | oxc::TSType::TSUndefinedKeyword(_)
            | oxc::TSType::TSUnknownKeyword(_)
            | oxc::TSType::TSVoidKeyword(_)
            | oxc::TSType::TSLiteralType(_) => {}
            _ => self.opaque = true,
        }
    }

    fn visit_type_name(&mut self, name: &oxc::TSTypeName<'_>) {
        match name {
            oxc::TSTypeName::IdentifierReference(id) => {
                let origin = self.scope.origin_of(id.name.as_str(), self.type_params);
                self.references.push(BoundTypeReference {
                    name: id.name.to_string(),
                    start: id.span.start as usize - self.base,
                    end: id.span.end as usize - self.base,
                    origin,
                });
            }
            // Only the leftmost qualifier names something in scope.
            oxc::TSTypeName::QualifiedName(qualified) => self.visit_type_name(&qualified.left),
            _ => self.opaque = true,
        }
    }
}
