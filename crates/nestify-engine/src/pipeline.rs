//! Step orchestration.
//!
//! The invoker sequences steps (parse-express, move, req, res, todo). Each
//! step loads its files, mutates them in memory and saves every modified
//! file at the end. A step that fails before saving writes nothing.

use std::fmt;
use std::path::{Path, PathBuf};

use nestify_core::config::{ModuleConfig, NestifyConfig};
use nestify_core::errors::{ConfigError, Diagnostic, DiagnosticKind, MigrateError};
use serde::Serialize;

use crate::annotate::annotate_request_response;
use crate::components::{discover_handlers, generate_controller, generate_service, MoveOutcome};
use crate::rewrite::{
    rewrite_error_responses, rewrite_requests, rewrite_success_responses, AccessClassifier, DefaultClassifier,
    LocalTypeOracle, TypeOracle,
};
use crate::routes::{extract_routes, strip_mount_prefix, ExtractorSettings, RouteEntry};
use crate::syntax::SourceFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MigrationStep {
    /// Print the route table of the bootstrap file.
    ParseExpress,
    /// Generate the Service, then the Controller.
    Move,
    Request,
    /// Error pass, then success pass.
    Response,
    Annotate,
}

impl MigrationStep {
    pub fn name(self) -> &'static str {
        match self {
            Self::ParseExpress => "parse-express",
            Self::Move => "move",
            Self::Request => "req",
            Self::Response => "res",
            Self::Annotate => "todo",
        }
    }

    pub fn requires_module(self) -> bool {
        !matches!(self, Self::ParseExpress)
    }
}

impl fmt::Display for MigrationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything a step needs. Built once by the invoker.
#[derive(Debug, Clone)]
pub struct MigrationContext {
    pub root: PathBuf,
    pub config: NestifyConfig,
    /// Absent when no resource key was given.
    pub module: Option<ModuleConfig>,
    pub debug: bool,
}

impl MigrationContext {
    pub fn new(root: impl Into<PathBuf>, config: NestifyConfig, module: Option<ModuleConfig>) -> Self {
        Self {
            root: root.into(),
            config,
            module,
            debug: false,
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn server_file(&self) -> PathBuf {
        self.root.join(self.config.paths.effective_server_file())
    }
}

/// Result of one step.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step: MigrationStep,
    pub files_written: Vec<String>,
    /// Methods generated by the move step.
    pub methods_added: Vec<String>,
    pub methods_skipped: Vec<String>,
    /// Service methods whose request accesses were rewritten.
    pub methods_rewritten: Vec<String>,
    pub rewrites: usize,
    pub routes: Vec<RouteEntry>,
    pub diagnostics: Vec<Diagnostic>,
}

impl StepReport {
    fn new(step: MigrationStep) -> Self {
        Self {
            step,
            files_written: Vec::new(),
            methods_added: Vec::new(),
            methods_skipped: Vec::new(),
            methods_rewritten: Vec::new(),
            rewrites: 0,
            routes: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    fn absorb(&mut self, outcome: MoveOutcome) {
        self.methods_added.extend(outcome.methods_added);
        self.methods_skipped.extend(outcome.methods_skipped);
    }

    fn save(&mut self, files: &mut [&mut SourceFile]) -> Result<(), MigrateError> {
        for file in files.iter_mut() {
            if file.save()? {
                self.files_written.push(file.display_path());
            }
        }
        Ok(())
    }

    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

pub struct Migrator {
    context: MigrationContext,
    classifier: Box<dyn AccessClassifier>,
    oracle: Box<dyn TypeOracle>,
}

impl Migrator {
    pub fn new(context: MigrationContext) -> Self {
        Self {
            context,
            classifier: Box::new(DefaultClassifier),
            oracle: Box::new(LocalTypeOracle),
        }
    }

    pub fn with_classifier(mut self, classifier: impl AccessClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    pub fn with_type_oracle(mut self, oracle: impl TypeOracle + 'static) -> Self {
        self.oracle = Box::new(oracle);
        self
    }

    pub fn context(&self) -> &MigrationContext {
        &self.context
    }

    pub fn run(&self, step: MigrationStep) -> Result<StepReport, MigrateError> {
        tracing::info!(%step, debug = self.context.debug, "running step");
        let report = match step {
            MigrationStep::ParseExpress => self.parse_express(),
            MigrationStep::Move => self.move_components(),
            MigrationStep::Request => self.replace_request(),
            MigrationStep::Response => self.replace_response(),
            MigrationStep::Annotate => self.annotate(),
        }?;
        for diagnostic in &report.diagnostics {
            tracing::debug!(%diagnostic, "diagnostic");
        }
        tracing::info!(
            %step,
            files = report.files_written.len(),
            diagnostics = report.diagnostics.len(),
            "step finished"
        );
        Ok(report)
    }

    /// Route table of the bootstrap file. The file is only read.
    pub fn parse_express(&self) -> Result<StepReport, MigrateError> {
        let step = MigrationStep::ParseExpress;
        let path = self.context.server_file();
        let server = load_existing(&path, step, "the bootstrap file")?;
        let mut report = StepReport::new(step);
        report.routes = extract_routes(&server, &self.settings());
        Ok(report)
    }

    pub fn move_components(&self) -> Result<StepReport, MigrateError> {
        let step = MigrationStep::Move;
        let module = self.module()?;
        let config = &self.context.config;
        let mut report = StepReport::new(step);

        let handlers = load_existing(&module.route_path, step, "the route handler file")?;
        let mut service = SourceFile::load_or_create(&module.service.file_path)?;
        let mut controller = SourceFile::load_or_create(&module.controller.file_path)?;

        report.routes = self.route_table(module, &handlers, &mut report.diagnostics);

        let service_outcome = generate_service(&handlers, &mut service, module, config)?;
        let controller_outcome = generate_controller(&handlers, &mut controller, module, config, &report.routes)?;
        report.absorb(service_outcome);
        report.absorb(controller_outcome);

        report.save(&mut [&mut service, &mut controller])?;
        Ok(report)
    }

    pub fn replace_request(&self) -> Result<StepReport, MigrateError> {
        let step = MigrationStep::Request;
        let module = self.module()?;
        let mut report = StepReport::new(step);

        let mut service = load_existing(&module.service.file_path, step, "the service file")?;
        let mut controller = load_optional(&module.controller.file_path)?;

        let outcome = rewrite_requests(
            &mut service,
            controller.as_mut(),
            module,
            &self.context.config.markers,
            self.classifier.as_ref(),
            self.oracle.as_ref(),
            &mut report.diagnostics,
        )?;
        report.rewrites = outcome.accesses_rewritten;
        report.methods_rewritten = outcome.methods_rewritten;

        match controller.as_mut() {
            Some(controller) => report.save(&mut [&mut service, controller])?,
            None => report.save(&mut [&mut service])?,
        }
        Ok(report)
    }

    pub fn replace_response(&self) -> Result<StepReport, MigrateError> {
        let step = MigrationStep::Response;
        let module = self.module()?;
        let mut report = StepReport::new(step);

        let mut service = load_existing(&module.service.file_path, step, "the service file")?;
        let mut controller = load_optional(&module.controller.file_path)?;

        let errors = rewrite_error_responses(&mut service, controller.as_mut(), module, &mut report.diagnostics)?;
        let successes = rewrite_success_responses(&mut service, module, &mut report.diagnostics)?;
        report.rewrites = errors.rewrites() + successes.rewrites();

        match controller.as_mut() {
            Some(controller) => report.save(&mut [&mut service, controller])?,
            None => report.save(&mut [&mut service])?,
        }
        Ok(report)
    }

    pub fn annotate(&self) -> Result<StepReport, MigrateError> {
        let step = MigrationStep::Annotate;
        let module = self.module()?;
        let mut report = StepReport::new(step);

        let mut service = load_existing(&module.service.file_path, step, "the service file")?;
        let outcome = annotate_request_response(&mut service, &self.context.config.markers)?;
        report.rewrites = outcome.markers_added;

        report.save(&mut [&mut service])?;
        Ok(report)
    }

    fn module(&self) -> Result<&ModuleConfig, MigrateError> {
        self.context
            .module
            .as_ref()
            .ok_or(MigrateError::Config(ConfigError::MissingKey))
    }

    fn settings(&self) -> ExtractorSettings {
        ExtractorSettings::from_config(&self.context.config.routes)
    }

    /// Routes from the bootstrap file, when there is one. Entries that point
    /// at this module but name no exported handler are reported.
    fn route_table(
        &self,
        module: &ModuleConfig,
        handlers: &SourceFile,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<RouteEntry> {
        let path = self.context.server_file();
        let server = match SourceFile::load(&path) {
            Ok(server) => server,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "no bootstrap file, using naming conventions");
                return Vec::new();
            }
        };
        let routes = extract_routes(&server, &self.settings());

        let prefix = format!("{}.", module.key);
        let api_prefix = self.context.config.routes.effective_api_prefix();
        let mount = module.mount_path();
        let names: Vec<String> = discover_handlers(handlers).into_iter().map(|h| h.name).collect();
        for route in &routes {
            let Some(name) = route.handler_ref.strip_prefix(&prefix) else {
                continue;
            };
            let message = if !names.iter().any(|n| n == name) {
                format!(
                    "{} {} points at unknown handler `{}`",
                    route.http_method, route.path, route.handler_ref
                )
            } else if strip_mount_prefix(&route.path, api_prefix, &mount).is_none() {
                format!(
                    "{} {} is outside the controller mount `{mount}`; the full path is kept",
                    route.http_method, route.path
                )
            } else {
                continue;
            };
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::UnrecognizedRoute,
                server.display_path(),
                route.line,
                message,
            ));
        }
        routes
    }
}

fn load_existing(path: &Path, step: MigrationStep, what: &'static str) -> Result<SourceFile, MigrateError> {
    if !path.is_file() {
        return Err(MigrateError::MissingInput {
            step: step.name(),
            what,
            path: path.display().to_string(),
        });
    }
    Ok(SourceFile::load(path)?)
}

fn load_optional(path: &Path) -> Result<Option<SourceFile>, MigrateError> {
    if path.is_file() {
        Ok(Some(SourceFile::load(path)?))
    } else {
        Ok(None)
    }
}
