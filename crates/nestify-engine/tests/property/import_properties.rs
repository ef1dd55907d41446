//! Property tests for import reconciliation: merging is commutative and
//! never produces duplicate declarations or symbols.

use std::collections::{BTreeMap, BTreeSet};

use nestify_engine::imports::{existing_imports, reconcile_imports, ImportRequirement};
use nestify_engine::syntax::SourceFile;
use proptest::prelude::*;

const PATHS: &[&str] = &["@nestjs/common", "@nestjs/swagger", "./users.service"];
const SYMBOLS: &[&str] = &["Get", "Post", "Body", "Query", "Param", "ApiTags", "Inject"];

fn requirement() -> impl Strategy<Value = ImportRequirement> {
    (
        prop::sample::select(PATHS),
        prop::collection::vec(prop::sample::select(SYMBOLS), 1..5),
    )
        .prop_map(|(path, names)| ImportRequirement::named(path, names))
}

fn base_file() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        String::new(),
        "import { Controller } from '@nestjs/common';\n\nexport class A {}\n".to_string(),
        "import * as express from 'express';\nimport { ApiTags } from '@nestjs/swagger';\n".to_string(),
    ])
}

/// module path -> symbols, asserting each path has a single named declaration
/// and no symbol repeats within it.
fn named_view(text: &str) -> BTreeMap<String, BTreeSet<String>> {
    let file = SourceFile::from_text("a.ts", text).unwrap();
    let mut view: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for import in existing_imports(&file) {
        if import.named.is_empty() {
            continue;
        }
        let unique: BTreeSet<String> = import.named.iter().cloned().collect();
        assert_eq!(unique.len(), import.named.len(), "duplicate symbol in {text}");
        assert!(
            view.insert(import.module_path.clone(), unique).is_none(),
            "two named declarations for {} in {text}",
            import.module_path
        );
    }
    view
}

fn merge(base: &str, reqs: Vec<ImportRequirement>) -> String {
    let mut file = SourceFile::from_text("a.ts", base).unwrap();
    reconcile_imports(&mut file, reqs).unwrap();
    file.text().to_string()
}

proptest! {
    #[test]
    fn merge_is_commutative(base in base_file(), a in requirement(), b in requirement()) {
        let ab = merge(&base, vec![a.clone(), b.clone()]);
        let ba = merge(&base, vec![b, a]);
        prop_assert_eq!(named_view(&ab), named_view(&ba));
    }

    #[test]
    fn sequential_merges_match_batched_merge(base in base_file(), a in requirement(), b in requirement()) {
        let batched = merge(&base, vec![a.clone(), b.clone()]);
        let sequential = merge(&merge(&base, vec![a]), vec![b]);
        prop_assert_eq!(named_view(&batched), named_view(&sequential));
    }

    #[test]
    fn merge_is_idempotent(base in base_file(), reqs in prop::collection::vec(requirement(), 1..4)) {
        let once = merge(&base, reqs.clone());
        let twice = merge(&once, reqs);
        prop_assert_eq!(once, twice);
    }
}
