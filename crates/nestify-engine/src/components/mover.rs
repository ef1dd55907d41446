//! Component mover: copies handlers into the Service and generates thin
//! delegating Controller methods bound to their HTTP routes.

use nestify_core::config::{ModuleConfig, NestifyConfig};
use nestify_core::constants::{NEST_COMMON, NEST_SWAGGER, REQUEST_IDENT, RESPONSE_IDENT};
use nestify_core::errors::SyntaxError;

use crate::imports::{existing_imports, rebase_relative_specifier, reconcile_imports, ImportRequirement};
use crate::routes::{resolve_binding, RouteEntry};
use crate::syntax::printer::{ClassSpec, DecoratorSpec, MethodSpec, ParamSpec};
use crate::syntax::SourceFile;

use super::component::{find_or_create_component, MethodInsertion};
use super::handlers::{discover_handlers, HandlerFunction};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveOutcome {
    pub class_created: bool,
    pub methods_added: Vec<String>,
    pub methods_skipped: Vec<String>,
}

fn selected_handlers(handler_file: &SourceFile, module: &ModuleConfig) -> Vec<HandlerFunction> {
    discover_handlers(handler_file)
        .into_iter()
        .filter(|h| {
            let selected = module.selects(&h.name);
            if !selected {
                tracing::debug!(handler = %h.name, "excluded by function filter");
            }
            selected
        })
        .collect()
}

/// Copy the selected handlers of `handler_file` into the Service class.
pub fn generate_service(
    handler_file: &SourceFile,
    service_file: &mut SourceFile,
    module: &ModuleConfig,
    config: &NestifyConfig,
) -> Result<MoveOutcome, SyntaxError> {
    let markers = &config.markers;

    let mut requirements = vec![ImportRequirement::named(NEST_COMMON, ["Injectable"])];
    let from_dir = handler_file.path().parent().unwrap_or(handler_file.path());
    for import in existing_imports(handler_file) {
        for mut req in import.to_requirements() {
            req.module_path = rebase_relative_specifier(&req.module_path, from_dir, &module.module_dir);
            requirements.push(req);
        }
    }
    reconcile_imports(service_file, requirements)?;

    let mut class = ClassSpec::new(&module.service.class_name);
    class.decorators.push(DecoratorSpec::bare("Injectable"));
    let handle = find_or_create_component(service_file, &class)?;

    let mut outcome = MoveOutcome {
        class_created: handle.was_created(),
        ..Default::default()
    };

    for handler in selected_handlers(handler_file, module) {
        let method = MethodSpec {
            name: handler.name.clone(),
            docs: vec![markers.marker("Replace Parameters")],
            raw_docs: handler.docs.clone(),
            decorators: Vec::new(),
            params: handler
                .params
                .iter()
                .map(|p| ParamSpec::new(&p.name, Some(p.ty.clone())))
                .collect(),
            return_type: handler.return_type.clone(),
            is_async: true,
            body: handler.body.clone(),
        };
        match handle.add_method(service_file, &method)? {
            MethodInsertion::Added => outcome.methods_added.push(handler.name),
            MethodInsertion::AlreadyPresent => outcome.methods_skipped.push(handler.name),
        }
    }

    tracing::info!(
        class = %module.service.class_name,
        added = outcome.methods_added.len(),
        skipped = outcome.methods_skipped.len(),
        "service generated"
    );
    Ok(outcome)
}

/// Generate delegating Controller methods for the selected handlers.
pub fn generate_controller(
    handler_file: &SourceFile,
    controller_file: &mut SourceFile,
    module: &ModuleConfig,
    config: &NestifyConfig,
    routes: &[RouteEntry],
) -> Result<MoveOutcome, SyntaxError> {
    let markers = &config.markers;
    let api_prefix = config.routes.effective_api_prefix();
    let service = &module.service;

    let mut class = ClassSpec::new(&module.controller.class_name);
    class.docs.push(markers.marker("Check Controller Entry Point"));
    class
        .decorators
        .push(DecoratorSpec::new("ApiTags", vec![format!("'{}'", module.key)]));
    class
        .decorators
        .push(DecoratorSpec::new("Controller", vec![format!("'{}'", module.mount_path())]));
    class.constructor_params.push(ParamSpec {
        name: service.var_name.clone(),
        ty: Some(service.class_name.clone()),
        decorators: vec![DecoratorSpec::new("Inject", vec![service.class_name.clone()])],
        modifiers: Some("private readonly".to_string()),
    });
    let handle = find_or_create_component(controller_file, &class)?;

    let mut outcome = MoveOutcome {
        class_created: handle.was_created(),
        ..Default::default()
    };
    let mut http_decorators: Vec<&'static str> = Vec::new();

    for handler in selected_handlers(handler_file, module) {
        let binding = resolve_binding(&handler.name, routes, module, api_prefix);
        let decorator = binding.method.decorator_name();
        if !http_decorators.contains(&decorator) {
            http_decorators.push(decorator);
        }

        let method = MethodSpec {
            name: handler.name.clone(),
            docs: vec![markers.marker("Check Entry Point"), markers.marker("Replace Req/Res")],
            raw_docs: Vec::new(),
            decorators: vec![DecoratorSpec::new(decorator, binding.decorator_arguments())],
            params: vec![
                ParamSpec::new(REQUEST_IDENT, Some("any".into())).decorated(DecoratorSpec::bare("Req")),
                ParamSpec::new(RESPONSE_IDENT, Some("any".into())).decorated(DecoratorSpec::bare("Res")),
            ],
            return_type: None,
            is_async: true,
            body: format!(
                "return await this.{}.{}({REQUEST_IDENT}, {RESPONSE_IDENT});",
                service.var_name, handler.name
            ),
        };
        match handle.add_method(controller_file, &method)? {
            MethodInsertion::Added => outcome.methods_added.push(handler.name),
            MethodInsertion::AlreadyPresent => outcome.methods_skipped.push(handler.name),
        }
    }

    let mut common: Vec<&str> = vec!["Controller", "Req", "Res", "Inject"];
    common.extend(http_decorators);
    common.sort_unstable();
    reconcile_imports(
        controller_file,
        vec![
            ImportRequirement::named(NEST_COMMON, common),
            ImportRequirement::named(NEST_SWAGGER, ["ApiTags"]),
            ImportRequirement::named(service.sibling_specifier(), [service.class_name.as_str()]),
        ],
    )?;

    tracing::info!(
        class = %module.controller.class_name,
        added = outcome.methods_added.len(),
        skipped = outcome.methods_skipped.len(),
        "controller generated"
    );
    Ok(outcome)
}
