// Type Check File
//
// The `.ngtypecheck.ts` shim of one original file: its imports, the shared prelude of
// pipe instances and type constructors, then every type check block placed there.

use std::sync::Arc;

use super::environment::Environment;
use super::reference_emitter::ReferenceEmitter;
use super::ts_ast::{Printer, SyntheticSourceMap, TcbDecl};
use crate::ngtsc::file_system::AbsoluteFsPath;
use crate::ngtsc::typecheck::api::TypeCheckingConfig;

pub struct TypeCheckFile {
    file_name: AbsoluteFsPath,
    env: Environment,
    tcbs: Vec<TcbDecl>,
}

impl TypeCheckFile {
    pub fn new(
        file_name: AbsoluteFsPath,
        config: TypeCheckingConfig,
        emitter: Arc<dyn ReferenceEmitter + Send + Sync>,
    ) -> Self {
        let env = Environment::new(config, file_name.clone(), emitter);
        Self {
            file_name,
            env,
            tcbs: Vec::new(),
        }
    }

    pub fn file_name(&self) -> &AbsoluteFsPath {
        &self.file_name
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    pub fn add_tcb(&mut self, tcb: TcbDecl) {
        self.tcbs.push(tcb);
    }

    pub fn tcbs(&self) -> &[TcbDecl] {
        &self.tcbs
    }

    /// The shim's text and the positions of its commented nodes.
    pub fn render(&self) -> (String, SyntheticSourceMap) {
        // Imports are only known once every block has been generated, and they go first,
        // so the body is printed on its own and shifted behind them.
        let mut body = Printer::new();
        for stmt in self.env.prelude_statements() {
            body.print_stmt(&stmt);
        }
        for tcb in &self.tcbs {
            body.write_raw("\n");
            body.print_tcb(tcb);
        }
        body.write_raw("\nexport const IS_A_MODULE = true;\n");
        let (body_text, body_map) = body.finish();

        let imports = self.env.imports().render();
        let map = body_map.shifted(imports.len());
        (format!("{}{}", imports, body_text), map)
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::ngtsc::reflection::ClassRef;
    use crate::ngtsc::typecheck::api::{PipeMeta, TemplateId};
    use crate::ngtsc::typecheck::src::comments::read_template_id;
    use crate::ngtsc::typecheck::src::reference_emitter::LocalOrImportEmitter;
    use crate::ngtsc::typecheck::src::ts_ast::{Expr, Stmt};

    #[test]
    fn test_render_puts_imports_before_prelude_and_blocks() {
        let mut file = TypeCheckFile::new(
            AbsoluteFsPath::from("/app/cmp.ngtypecheck.ts"),
            TypeCheckingConfig::default(),
            Arc::new(LocalOrImportEmitter),
        );
        let this_type = file
            .env_mut()
            .reference_type(&ClassRef::new("AppCmp", "/app/cmp.ts"), Vec::new())
            .unwrap();
        let pipe = file
            .env_mut()
            .pipe_inst(&PipeMeta::new("upper", ClassRef::new("UpperPipe", "/app/upper.ts")))
            .unwrap();
        file.add_tcb(TcbDecl {
            id: TemplateId::new(1),
            fn_name: "_tcb1".to_string(),
            type_params: Vec::new(),
            this_type,
            body: vec![Stmt::Expr(pipe.prop("transform").call(vec![Expr::string("a")]))],
            directive_locals: Default::default(),
        });

        let (text, map) = file.render();
        assert_eq!(
            text,
            indoc! {r#"
                import * as i0 from "./cmp";
                import * as i1 from "./upper";
                var _pipe1: i1.UpperPipe = null!;

                /*tcb1*/
                function _tcb1(this: i0.AppCmp) {
                  _pipe1.transform("a");
                }

                export const IS_A_MODULE = true;
            "#}
        );
        let tcb = map.tcbs[0];
        assert_eq!(read_template_id(&text, tcb.start), Some(TemplateId::new(1)));
        assert!(text[tcb.start..tcb.end].ends_with("}\n"));
    }

    #[test]
    fn test_empty_shim_is_still_a_module() {
        let file = TypeCheckFile::new(
            AbsoluteFsPath::from("/app/empty.ngtypecheck.ts"),
            TypeCheckingConfig::default(),
            Arc::new(LocalOrImportEmitter),
        );
        let (text, map) = file.render();
        assert_eq!(text, "\nexport const IS_A_MODULE = true;\n");
        assert!(map.tcbs.is_empty());
    }
}
