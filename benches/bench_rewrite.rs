use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pyflyby::format::FormatParams;
use pyflyby::imports::db::{ImportDB, PathSpec};
use pyflyby::rewriter::{self, Verb};
use pyflyby::text::FileText;
use std::fs;
use std::sync::atomic::AtomicBool;
use tempfile::TempDir;

/// Generate a Python module with a mix of used, unused, and missing imports
/// so `tidy_imports` has real work to do in every pass: resolve names,
/// drop dead bindings, and re-render the prologue.
fn make_python_file(index: usize) -> String {
    format!(
        r#"import os
import sys
import re
from pathlib import Path
from collections import OrderedDict

CONSTANT_{i} = {i}

def used_function_{i}(x, y):
    result = x + y
    return result

class UsedClass_{i}:
    def __init__(self, value):
        self.value = value

    def compute(self):
        return self.value * 2

instance_{i} = UsedClass_{i}(CONSTANT_{i})
print(os.path.join("a", "b"))
_ = re.compile(r"\d+")
p = Path(".")
d: OrderedDict = OrderedDict()
arange(3)
"#,
        i = index
    )
}

fn bench_tidy_imports(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("known.py"),
        "from numpy import arange\n__mandatory_imports__ = ['from __future__ import print_function']\n",
    )
    .unwrap();
    let spec = PathSpec::from_roots(vec![dir.path().to_path_buf()]);
    let target = dir.path().join("target.py");
    let (db, _) = ImportDB::load(&spec, &target);
    let params = FormatParams::default();
    let cancel = AtomicBool::new(false);

    let files: Vec<FileText> = (0..50)
        .map(|i| FileText::from_string(make_python_file(i), None))
        .collect();

    c.bench_function("tidy_imports_single_module", |b| {
        b.iter(|| {
            let result = rewriter::tidy_imports(black_box(&files[0]), &db, &params, false, &cancel).unwrap();
            black_box(result);
        });
    });

    c.bench_function("tidy_imports_50_modules_sequential", |b| {
        b.iter(|| {
            for file in &files {
                let result = rewriter::tidy_imports(black_box(file), &db, &params, false, &cancel).unwrap();
                black_box(result);
            }
        });
    });

    let paths: Vec<_> = files
        .iter()
        .enumerate()
        .map(|(i, file)| {
            let path = dir.path().join(format!("module_{i}.py"));
            fs::write(&path, file.text()).unwrap();
            path
        })
        .collect();

    c.bench_function("collect_tidy_50_modules_parallel", |b| {
        b.iter(|| {
            let verb = Verb::Tidy { db: &db, include_doc_cross_references: false };
            let results = rewriter::collect(black_box(&paths), &verb, &params, &cancel);
            black_box(results);
        });
    });
}

criterion_group!(benches, bench_tidy_imports);
criterion_main!(benches);
