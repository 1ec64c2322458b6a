// TypeCheck Environment
//
// State shared by every type check block placed in the same file: imports, pipe
// instances and type constructors. Each declaration is made once per file and reused.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;

use super::reference_emitter::{EmittedReference, ReferenceEmitter};
use super::ts_ast::{Expr, Stmt, TypeNode, TypeParamDecl};
use super::type_constructor::generate_type_ctor_declaration;
use crate::ngtsc::file_system::{relative_import, resolve_relative, AbsoluteFsPath};
use crate::ngtsc::reflection::{ClassDeclaration, ClassRef, TypeBound, TypeReferenceOrigin};
use crate::ngtsc::typecheck::api::{
    PipeMeta, TypeCheckError, TypeCheckableDirectiveMeta, TypeCheckingConfig,
};

pub const ANGULAR_CORE: &str = "@angular/core";

/// Namespace imports of one file, aliased `i0`, `i1`, ... in the order first requested.
#[derive(Debug, Clone, Default)]
pub struct ImportManager {
    aliases: IndexMap<String, String>,
}

impl ImportManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alias_for(&mut self, module_specifier: &str) -> String {
        let next = self.aliases.len();
        self.aliases
            .entry(module_specifier.to_string())
            .or_insert_with(|| format!("i{}", next))
            .clone()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// `import * as iN from "...";` lines, one per module.
    pub fn render(&self) -> String {
        self.aliases
            .iter()
            .map(|(specifier, alias)| format!("import * as {} from {:?};\n", alias, specifier))
            .collect()
    }

    pub fn module_specifiers(&self) -> impl Iterator<Item = &str> {
        self.aliases.keys().map(String::as_str)
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct NextIds {
    pipe_inst: usize,
    type_ctor: usize,
}

pub struct Environment {
    config: TypeCheckingConfig,
    context_file: AbsoluteFsPath,
    emitter: Arc<dyn ReferenceEmitter + Send + Sync>,
    imports: ImportManager,
    next_ids: NextIds,
    pipe_insts: IndexMap<ClassRef, String>,
    pipe_inst_statements: Vec<Stmt>,
    type_ctors: IndexMap<ClassRef, String>,
    type_ctor_statements: Vec<Stmt>,
    inline_type_ctors: HashSet<ClassRef>,
}

impl Environment {
    /// An environment for code placed in `context_file`.
    pub fn new(
        config: TypeCheckingConfig,
        context_file: AbsoluteFsPath,
        emitter: Arc<dyn ReferenceEmitter + Send + Sync>,
    ) -> Self {
        Self {
            config,
            context_file,
            emitter,
            imports: ImportManager::new(),
            next_ids: NextIds {
                pipe_inst: 1,
                type_ctor: 1,
            },
            pipe_insts: IndexMap::new(),
            pipe_inst_statements: Vec::new(),
            type_ctors: IndexMap::new(),
            type_ctor_statements: Vec::new(),
            inline_type_ctors: HashSet::new(),
        }
    }

    pub fn config(&self) -> &TypeCheckingConfig {
        &self.config
    }

    pub fn context_file(&self) -> &AbsoluteFsPath {
        &self.context_file
    }

    pub fn imports(&self) -> &ImportManager {
        &self.imports
    }

    pub fn emitter(&self) -> &(dyn ReferenceEmitter + Send + Sync) {
        self.emitter.as_ref()
    }

    /// Makes `type_ctor_for` use the directive's own `ngTypeCtor`.
    pub fn register_inline_type_ctor(&mut self, class: ClassRef) {
        self.inline_type_ctors.insert(class);
    }

    fn emit(&self, class: &ClassRef) -> Result<EmittedReference, TypeCheckError> {
        self.emitter
            .emit(class, &self.context_file)
            .ok_or_else(|| TypeCheckError::UnemittableReference {
                class: class.name.clone(),
                context: self.context_file.clone(),
            })
    }

    /// A value expression for `class`.
    pub fn reference(&mut self, class: &ClassRef) -> Result<Expr, TypeCheckError> {
        Ok(match self.emit(class)? {
            EmittedReference::Local(name) => Expr::ident(name),
            EmittedReference::Imported {
                module_specifier,
                symbol_name,
            } => Expr::ident(self.imports.alias_for(&module_specifier)).prop(symbol_name),
        })
    }

    /// A type reference to `class` with the given type arguments.
    pub fn reference_type(&mut self, class: &ClassRef, args: Vec<TypeNode>) -> Result<TypeNode, TypeCheckError> {
        Ok(match self.emit(class)? {
            EmittedReference::Local(name) => TypeNode::reference(name, args),
            EmittedReference::Imported {
                module_specifier,
                symbol_name,
            } => {
                let alias = self.imports.alias_for(&module_specifier);
                TypeNode::reference(format!("{}.{}", alias, symbol_name), args)
            }
        })
    }

    /// `iN.name` for a symbol exported by an external module.
    pub fn reference_external_symbol(&mut self, module: &str, name: &str) -> Expr {
        Expr::ident(self.imports.alias_for(module)).prop(name)
    }

    pub fn reference_external_type(&mut self, module: &str, name: &str, args: Vec<TypeNode>) -> TypeNode {
        let alias = self.imports.alias_for(module);
        TypeNode::reference(format!("{}.{}", alias, name), args)
    }

    /// The `_pipeN` instance of `pipe`, declared on first use.
    pub fn pipe_inst(&mut self, pipe: &PipeMeta) -> Result<Expr, TypeCheckError> {
        if let Some(name) = self.pipe_insts.get(&pipe.class_ref) {
            return Ok(Expr::ident(name.clone()));
        }
        let ty = self.reference_type(&pipe.class_ref, Vec::new())?;
        let name = format!("_pipe{}", self.next_ids.pipe_inst);
        self.next_ids.pipe_inst += 1;
        self.pipe_inst_statements.push(Stmt::Var {
            constant: false,
            name: Expr::ident(name.clone()),
            ty: Some(ty),
            init: Some(Expr::null_non_null()),
        });
        self.pipe_insts.insert(pipe.class_ref.clone(), name.clone());
        Ok(Expr::ident(name))
    }

    /// The function that infers `dir`'s type arguments from its inputs.
    pub fn type_ctor_for(&mut self, dir: &TypeCheckableDirectiveMeta) -> Result<Expr, TypeCheckError> {
        let class = dir.class_ref();
        if self.inline_type_ctors.contains(class) {
            return Ok(self.reference(class)?.prop("ngTypeCtor"));
        }
        if let Some(name) = self.type_ctors.get(class) {
            return Ok(Expr::ident(name.clone()));
        }
        let name = format!("_ctor{}", self.next_ids.type_ctor);
        self.next_ids.type_ctor += 1;
        let stmt = generate_type_ctor_declaration(self, dir, &name)?;
        self.type_ctor_statements.push(stmt);
        self.type_ctors.insert(class.clone(), name.clone());
        tracing::trace!(directive = %dir.name, ctor = %name, "declared type constructor");
        Ok(Expr::ident(name))
    }

    /// The class's type parameters as they can be written in `context_file`, adding the
    /// imports their bounds need. `None` when some bound cannot be written there.
    pub fn emit_type_parameters(&mut self, class: &ClassDeclaration) -> Option<Vec<TypeParamDecl>> {
        let declaring = class.class_ref.file.clone();
        let context = self.context_file.clone();
        let imports = &mut self.imports;
        class
            .type_parameters()
            .iter()
            .map(|param| {
                let constraint = match &param.bound {
                    Some(bound) => Some(TypeNode::Raw(emit_type_bound(
                        bound,
                        &declaring,
                        &context,
                        &mut |specifier| imports.alias_for(specifier),
                    )?)),
                    None => None,
                };
                Some(TypeParamDecl {
                    name: param.name.clone(),
                    constraint,
                })
            })
            .collect()
    }

    /// Pipe instances and type constructors, in declaration order.
    pub fn prelude_statements(&self) -> Vec<Stmt> {
        self.pipe_inst_statements
            .iter()
            .chain(self.type_ctor_statements.iter())
            .cloned()
            .collect()
    }
}

/// Rewrites a bound written in `declaring` so it means the same in `context`, calling
/// `alias_for` for every module it has to import. `None` if the bound refers to something
/// that cannot be named from `context`.
pub fn emit_type_bound(
    bound: &TypeBound,
    declaring: &AbsoluteFsPath,
    context: &AbsoluteFsPath,
    alias_for: &mut dyn FnMut(&str) -> String,
) -> Option<String> {
    if declaring == context {
        return Some(bound.text.clone());
    }
    if bound.opaque {
        return None;
    }
    let mut references: Vec<_> = bound.references.iter().collect();
    references.sort_by_key(|r| r.start);

    let mut out = String::with_capacity(bound.text.len());
    let mut cursor = 0;
    for reference in references {
        let replacement = match &reference.origin {
            TypeReferenceOrigin::TypeParameter | TypeReferenceOrigin::Ambient => continue,
            TypeReferenceOrigin::Local { exported: false } => return None,
            TypeReferenceOrigin::Local { exported: true } => {
                let alias = alias_for(&relative_import(context, declaring));
                format!("{}.{}", alias, reference.name)
            }
            TypeReferenceOrigin::Imported {
                module,
                imported_name,
            } => {
                let alias = alias_for(&module_from(module, declaring, context));
                format!("{}.{}", alias, imported_name)
            }
            TypeReferenceOrigin::Namespace { module } => alias_for(&module_from(module, declaring, context)),
        };
        out.push_str(bound.text.get(cursor..reference.start)?);
        out.push_str(&replacement);
        cursor = reference.end;
    }
    out.push_str(bound.text.get(cursor..)?);
    Some(out)
}

/// A module specifier written in `declaring`, as seen from `context`.
fn module_from(specifier: &str, declaring: &AbsoluteFsPath, context: &AbsoluteFsPath) -> String {
    if specifier.starts_with('.') {
        relative_import(context, &resolve_relative(declaring, specifier))
    } else {
        specifier.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ngtsc::reflection::BoundTypeReference;

    fn bound(text: &str, refs: Vec<(&str, TypeReferenceOrigin)>) -> TypeBound {
        let references = refs
            .into_iter()
            .map(|(name, origin)| {
                let start = text.find(name).unwrap();
                BoundTypeReference {
                    name: name.to_string(),
                    start,
                    end: start + name.len(),
                    origin,
                }
            })
            .collect();
        TypeBound {
            text: text.to_string(),
            references,
            opaque: false,
        }
    }

    #[test]
    fn test_bound_is_rewritten_through_imports() {
        let mut imports = ImportManager::new();
        let b = bound(
            "Model | Array<Shared>",
            vec![
                (
                    "Model",
                    TypeReferenceOrigin::Imported {
                        module: "./model".to_string(),
                        imported_name: "Model".to_string(),
                    },
                ),
                ("Array", TypeReferenceOrigin::Ambient),
                ("Shared", TypeReferenceOrigin::Local { exported: true }),
            ],
        );
        let emitted = emit_type_bound(
            &b,
            &AbsoluteFsPath::from("/app/dir.ts"),
            &AbsoluteFsPath::from("/app/cmp.ngtypecheck.ts"),
            &mut |s| imports.alias_for(s),
        );
        assert_eq!(emitted.as_deref(), Some("i0.Model | Array<i1.Shared>"));
        assert_eq!(imports.render(), "import * as i0 from \"./model\";\nimport * as i1 from \"./dir\";\n");
        assert_eq!(imports.module_specifiers().collect::<Vec<_>>(), vec!["./model", "./dir"]);
    }

    #[test]
    fn test_unexported_local_bound_cannot_be_emitted() {
        let b = bound("Hidden", vec![("Hidden", TypeReferenceOrigin::Local { exported: false })]);
        let emitted = emit_type_bound(
            &b,
            &AbsoluteFsPath::from("/dir.ts"),
            &AbsoluteFsPath::from("/dir.ngtypecheck.ts"),
            &mut |_| "i0".to_string(),
        );
        assert_eq!(emitted, None);
    }
}
