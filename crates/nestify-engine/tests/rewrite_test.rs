//! Request and response rewriting over in-memory Service/Controller pairs.

use std::path::Path;

use nestify_core::config::{MarkersConfig, MigrationOptions, ModuleConfig, NestifyConfig};
use nestify_core::errors::{Diagnostic, DiagnosticKind};
use nestify_engine::rewrite::{
    rewrite_error_responses, rewrite_requests, rewrite_success_responses, DefaultClassifier, LocalTypeOracle,
};
use nestify_engine::syntax::SourceFile;

fn module() -> ModuleConfig {
    let options = MigrationOptions {
        key: Some("users".into()),
        ..Default::default()
    };
    ModuleConfig::resolve(Path::new("/p"), &options, &NestifyConfig::default()).unwrap()
}

fn service(methods: &str) -> SourceFile {
    let text = format!(
        "import {{ Injectable }} from '@nestjs/common';\n\n@Injectable()\nexport class UsersService {{\n{methods}}}\n"
    );
    SourceFile::from_text("/p/src/modules/users/users.service.ts", text).unwrap()
}

fn controller(methods: &[(&str, &str)]) -> SourceFile {
    let mut body = String::new();
    for (decorator, name) in methods {
        body.push_str(&format!(
            "\n  {decorator}\n  async {name}(@Req() req: any, @Res() res: any) {{\n    return await this.usersService.{name}(req, res);\n  }}\n"
        ));
    }
    let text = format!(
        "import {{ Controller, Get, Inject, Req, Res }} from '@nestjs/common';\n\n@Controller('users')\nexport class UsersController {{\n  constructor(\n    @Inject(UsersService)\n    private readonly usersService: UsersService,\n  ) {{}}\n{body}}}\n"
    );
    SourceFile::from_text("/p/src/modules/users/users.controller.ts", text).unwrap()
}

fn run_requests(service: &mut SourceFile, controller: Option<&mut SourceFile>) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    rewrite_requests(
        service,
        controller,
        &module(),
        &MarkersConfig::default(),
        &DefaultClassifier,
        &LocalTypeOracle,
        &mut diagnostics,
    )
    .unwrap();
    diagnostics
}

#[test]
fn params_field_becomes_named_parameter() {
    let mut svc = service("  async show(req: Request, res: Response) {\n    return User.findById(req.params.id);\n  }\n");
    let mut ctrl = controller(&[("@Get(':id')", "show")]);
    run_requests(&mut svc, Some(&mut ctrl));

    assert!(svc.text().contains("  async show(id: string) {\n    return User.findById(id);"));
    assert!(ctrl.text().contains("  async show(@Param('id') id: string) {"));
    assert!(ctrl.text().contains("return await this.usersService.show(id);"));
    assert!(ctrl
        .text()
        .contains("import { Controller, Get, Inject, Req, Res, Param } from '@nestjs/common';"));
}

#[test]
fn query_prefix_is_dropped_and_typed_from_comparison() {
    let mut svc = service(
        "  async list(req: Request, res: Response) {\n    if (req.query.active === true) {\n      return User.find({ email: req.query.email });\n    }\n  }\n",
    );
    let mut ctrl = controller(&[("@Get()", "list")]);
    let diagnostics = run_requests(&mut svc, Some(&mut ctrl));

    assert!(svc
        .text()
        .contains("async list(query: { active?: boolean; email?: any }) {"));
    assert!(svc.text().contains("if (query.active === true)"));
    assert!(svc.text().contains("User.find({ email: query.email })"));
    assert!(ctrl.text().contains("async list(@Query() query: { active?: boolean; email?: any }) {"));
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::TypeInference);
}

#[test]
fn whole_params_object_and_several_fields() {
    let mut svc = service(
        "  async a(req: Request, res: Response) {\n    return check(req.params);\n  }\n\n  async b(req: Request, res: Response) {\n    return find(req.params.orgId, req.params.id);\n  }\n",
    );
    let mut ctrl = controller(&[("@Get()", "a"), ("@Get()", "b")]);
    run_requests(&mut svc, Some(&mut ctrl));

    assert!(svc.text().contains("async a(params: any) {\n    return check(params);"));
    assert!(svc
        .text()
        .contains("async b({ orgId, id }: { orgId: string; id: string }) {\n    return find(orgId, id);"));
    assert!(ctrl.text().contains("async a(@Param() params: any) {"));
    assert!(ctrl
        .text()
        .contains("async b(@Param() params: { orgId: string; id: string }) {"));
    assert!(ctrl.text().contains("return await this.usersService.b(params);"));
}

#[test]
fn body_whole_object_adds_index_signature() {
    let mut svc = service(
        "  async create(req: Request, res: Response) {\n    const { name } = req.body;\n    return save(name, req.body.email);\n  }\n",
    );
    let mut ctrl = controller(&[("@Post()", "create")]);
    run_requests(&mut svc, Some(&mut ctrl));

    assert!(svc
        .text()
        .contains("async create(body: { email?: any; [key: string]: any }) {"));
    assert!(svc.text().contains("const { name } = body;"));
    assert!(ctrl.text().contains("@Body() body: { email?: any; [key: string]: any }"));
}

#[test]
fn user_access_gets_binding_and_marker() {
    let mut svc = service("  async me(req: Request, res: Response) {\n    return find(req.user.id);\n  }\n");
    run_requests(&mut svc, None);

    assert!(svc.text().contains(
        "  async me() {\n    // TODO(NestJS Migration): Provide requestUser\n    return find(requestUser.id);"
    ));
}

#[test]
fn unknown_group_is_reported_and_left_alone() {
    let mut svc = service(
        "  async show(req: Request, res: Response) {\n    const token = req.headers.authorization;\n    return find(req.params.id);\n  }\n",
    );
    let mut ctrl = controller(&[("@Get(':id')", "show")]);
    let diagnostics = run_requests(&mut svc, Some(&mut ctrl));

    assert!(svc.text().contains("const token = req.headers.authorization;"));
    assert!(svc.text().contains("return find(id);"));
    assert!(diagnostics
        .iter()
        .any(|d| d.kind == DiagnosticKind::UnexpectedGroup && d.line == 6));
}

#[test]
fn migrated_methods_and_filtered_methods_are_skipped() {
    let src = "  async show(id: string) {\n    return find(id);\n  }\n";
    let mut svc = service(src);
    let before = svc.text().to_string();
    run_requests(&mut svc, None);
    assert_eq!(svc.text(), before);

    let options = MigrationOptions {
        key: Some("users".into()),
        functions: vec!["other".into()],
        ..Default::default()
    };
    let filtered = ModuleConfig::resolve(Path::new("/p"), &options, &NestifyConfig::default()).unwrap();
    let mut svc = service("  async show(req: Request, res: Response) {\n    return find(req.params.id);\n  }\n");
    let before = svc.text().to_string();
    let mut diagnostics = Vec::new();
    rewrite_requests(
        &mut svc,
        None,
        &filtered,
        &MarkersConfig::default(),
        &DefaultClassifier,
        &LocalTypeOracle,
        &mut diagnostics,
    )
    .unwrap();
    assert_eq!(svc.text(), before);
}

#[test]
fn missing_controller_method_still_migrates_service() {
    let mut svc = service("  async show(req: Request, res: Response) {\n    return find(req.params.id);\n  }\n");
    let mut ctrl = controller(&[("@Get()", "list")]);
    let diagnostics = run_requests(&mut svc, Some(&mut ctrl));

    assert!(svc.text().contains("async show(id: string)"));
    assert!(diagnostics
        .iter()
        .any(|d| d.kind == DiagnosticKind::MissingCounterpart));
}

const RESPONSES: &str = "  async show(req: Request, res: Response) {
    const user = await find(req.params.id);
    if (!user) {
      return res.status(404).json({ message: 'x' });
    }
    if (user.locked) {
      res.status(418).json({ m: 1 });
    }
    if (user.gone) {
      res.json(null);
    }
    res.status(200).json(user)
  }
";

fn run_responses(svc: &mut SourceFile, ctrl: &mut SourceFile) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    rewrite_error_responses(svc, Some(ctrl), &module(), &mut diagnostics).unwrap();
    rewrite_success_responses(svc, &module(), &mut diagnostics).unwrap();
    diagnostics
}

#[test]
fn error_statuses_become_exceptions() {
    let mut svc = service(RESPONSES);
    let mut ctrl = controller(&[("@Get(':id')", "show")]);
    run_responses(&mut svc, &mut ctrl);

    let text = svc.text();
    assert!(text.contains("      throw new NotFoundException({ message: 'x' });\n"));
    assert!(text.contains("      throw new HttpException({ m: 1 }, 418);\n"));
    assert!(text.contains(
        "import { Injectable, HttpException, NotFoundException } from '@nestjs/common';"
    ));

    let ctrl_text = ctrl.text();
    assert!(ctrl_text.contains(
        "  @Get(':id')\n  @ApiNotFoundResponse()\n  @ApiResponse({ status: 418 })\n  async show("
    ));
    assert!(ctrl_text.contains("import { ApiNotFoundResponse, ApiResponse } from '@nestjs/swagger';"));
}

#[test]
fn success_statuses_become_returns() {
    let mut svc = service(RESPONSES);
    let mut ctrl = controller(&[("@Get(':id')", "show")]);
    run_responses(&mut svc, &mut ctrl);

    let text = svc.text();
    assert!(text.contains("      return;\n"));
    assert!(text.contains("    return user\n  }"));
    assert!(!text.contains("res."));
}

#[test]
fn existing_response_decorators_are_not_duplicated() {
    let mut svc = service(RESPONSES);
    let mut ctrl = controller(&[("@Get(':id')\n  @ApiNotFoundResponse()", "show")]);
    run_responses(&mut svc, &mut ctrl);

    assert_eq!(ctrl.text().matches("@ApiNotFoundResponse()").count(), 1);
    assert_eq!(ctrl.text().matches("@ApiResponse({ status: 418 })").count(), 1);
}

#[test]
fn nested_response_calls_are_reported_not_rewritten() {
    let mut svc = service(
        "  async list(req: Request, res: Response) {\n    items.forEach((i) => res.json(i));\n    await res.status(500).json(err);\n  }\n",
    );
    let mut ctrl = controller(&[("@Get()", "list")]);
    let diagnostics = run_responses(&mut svc, &mut ctrl);

    assert!(svc.text().contains("items.forEach((i) => res.json(i));"));
    assert!(svc.text().contains("await res.status(500).json(err);"));
    let mismatches = diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::PatternMismatch)
        .count();
    assert_eq!(mismatches, 2);
}

#[test]
fn payload_before_status_is_left_alone() {
    let src = "  async list(req: Request, res: Response) {\n    res.json(items).status(200);\n  }\n";
    let mut svc = service(src);
    let mut ctrl = controller(&[("@Get()", "list")]);
    let before = svc.text().to_string();
    run_responses(&mut svc, &mut ctrl);
    assert_eq!(svc.text(), before);
}
