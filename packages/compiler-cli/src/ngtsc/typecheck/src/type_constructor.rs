// Type Constructors
//
// A type constructor is a generic function whose only parameter is the set of inputs bound
// to a directive. Calling it lets the host infer the directive's type arguments from
// those bindings:
//
//     const _ctor1: <T extends string>(init: Pick<i1.Dir<T>, "value">) => i1.Dir<T> = null!;
//
// When the directive's generic bounds cannot be written outside its own file, the same
// signature is added to the class itself as `static ngTypeCtor`.

use super::environment::{Environment, ANGULAR_CORE};
use super::ts_ast::{Expr, MethodDecl, Stmt, TypeNode, TypeParamDecl};
use crate::ngtsc::typecheck::api::{InputFlags, TypeCheckError, TypeCheckableDirectiveMeta};

/// `const <name>: <...>(init: ...) => Dir<...> = null!;` for a type check file.
pub fn generate_type_ctor_declaration(
    env: &mut Environment,
    dir: &TypeCheckableDirectiveMeta,
    name: &str,
) -> Result<Stmt, TypeCheckError> {
    let (type_params, init, ret) = signature(env, dir)?;
    let fn_type = TypeNode::Function {
        type_params,
        params: vec![("init".to_string(), init)],
        ret: Box::new(ret),
    };
    Ok(Stmt::Var {
        constant: true,
        name: Expr::ident(name),
        ty: Some(fn_type),
        init: Some(Expr::null_non_null()),
    })
}

/// `static ngTypeCtor<...>(init: ...): Dir<...> { return null!; }`, to be placed inside
/// the directive's class. `env` must be the environment of the directive's own file.
pub fn generate_inline_type_ctor(
    env: &mut Environment,
    dir: &TypeCheckableDirectiveMeta,
) -> Result<MethodDecl, TypeCheckError> {
    let (type_params, init, ret) = signature(env, dir)?;
    Ok(MethodDecl {
        is_static: true,
        name: "ngTypeCtor".to_string(),
        type_params,
        params: vec![("init".to_string(), init)],
        ret,
        body: vec![Stmt::Return(Expr::null_non_null())],
    })
}

fn signature(
    env: &mut Environment,
    dir: &TypeCheckableDirectiveMeta,
) -> Result<(Vec<TypeParamDecl>, TypeNode, TypeNode), TypeCheckError> {
    let type_params = env
        .emit_type_parameters(&dir.class)
        .ok_or_else(|| TypeCheckError::InlineTypeCtorRequired {
            class: dir.name.clone(),
        })?;
    let args = type_params
        .iter()
        .map(|p| TypeNode::reference(p.name.clone(), Vec::new()))
        .collect::<Vec<_>>();
    let raw = env.reference_type(dir.class_ref(), args)?;
    let init = init_type(env, dir, &raw)?;
    Ok((type_params, init, raw))
}

/// The type of `init`: the plain inputs picked from the directive type, coerced inputs
/// through their `ngAcceptInputType_` members and signal inputs unwrapped.
fn init_type(
    env: &mut Environment,
    dir: &TypeCheckableDirectiveMeta,
    raw: &TypeNode,
) -> Result<TypeNode, TypeCheckError> {
    let mut plain = Vec::new();
    let mut coerced = Vec::new();
    let mut signals = Vec::new();
    for input in dir.inputs.iter() {
        let key = input.class_property_name.clone();
        if input.flags.contains(InputFlags::SIGNAL) {
            push_unique(&mut signals, key);
        } else if input.flags.contains(InputFlags::COERCED) {
            push_unique(&mut coerced, key);
        } else {
            push_unique(&mut plain, key);
        }
    }

    let mut parts = Vec::new();
    if !plain.is_empty() {
        parts.push(TypeNode::reference("Pick", vec![raw.clone(), literal_union(&plain)]));
    }
    if !coerced.is_empty() {
        let class_name = match env.reference_type(dir.class_ref(), Vec::new())? {
            TypeNode::Reference { name, .. } => name,
            _ => dir.name.clone(),
        };
        let members = coerced
            .into_iter()
            .map(|field| {
                let ty = TypeNode::Query(format!("{}.ngAcceptInputType_{}", class_name, field));
                (field, ty)
            })
            .collect();
        parts.push(TypeNode::Literal(members));
    }
    if !signals.is_empty() {
        parts.push(env.reference_external_type(
            ANGULAR_CORE,
            "ɵUnwrapDirectiveSignalInputs",
            vec![raw.clone(), literal_union(&signals)],
        ));
    }

    Ok(match parts.len() {
        0 => TypeNode::Literal(Vec::new()),
        1 => parts.remove(0),
        _ => TypeNode::Intersection(parts),
    })
}

fn push_unique(names: &mut Vec<String>, name: String) {
    if !names.contains(&name) {
        names.push(name);
    }
}

fn literal_union(names: &[String]) -> TypeNode {
    let mut members: Vec<_> = names.iter().cloned().map(TypeNode::StringLiteral).collect();
    if members.len() == 1 {
        members.remove(0)
    } else {
        TypeNode::Union(members)
    }
}
