//! 性能基准测试
//!
//! 使用 criterion 测试结构提取、索引构建、差异解析和变更映射的性能

use ast_diff_core::{
    AnalyzerCache, ChangeMapper, DiffParser, FileVersion, JavaExtractor, MemoryContent,
    PythonExtractor, StructureExtractor, StructureIndex,
};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

/// 生成包含 `class_count` 个类、每个类若干方法的 Python 源码
fn generate_python_source(class_count: usize) -> String {
    let mut source = String::from("import os\n\n");
    for i in 0..class_count {
        source.push_str(&format!(
            r#"
class Service{i}:
    """Service number {i}."""

    def __init__(self, name):
        self.name = name
        self.items = []

    def add(self, item):
        if item is None:
            return False
        self.items.append(item)
        return True

    @property
    def size(self):
        return len(self.items)

    def process(self, factor=1):
        def scale(value):
            return value * factor
        return [scale(x) for x in self.items]


def helper_{i}(values):
    return sum(values) / max(len(values), 1)
"#
        ));
    }
    source
}

/// 生成包含 `class_count` 个类的 Java 源码
fn generate_java_source(class_count: usize) -> String {
    let mut source = String::from("package com.example.bench;\n\nimport java.util.List;\n");
    for i in 0..class_count {
        source.push_str(&format!(
            r#"
class Service{i} {{
    private final List<String> items;

    public Service{i}(List<String> items) {{
        this.items = items;
    }}

    public int size() {{
        return items.size();
    }}

    public boolean add(String item) {{
        if (item == null || item.isEmpty()) {{
            return false;
        }}
        return items.add(item);
    }}

    static class Entry {{
        String key = "{{";

        String key() {{ return key; }}
    }}
}}
"#
        ));
    }
    source
}

/// 把每隔 `step` 行的一行改写，生成新旧版本和对应的统一差异
fn generate_modified(source: &str, path: &str, step: usize) -> (String, String) {
    let lines: Vec<&str> = source.lines().collect();
    let mut modified = String::new();
    let mut diff = format!("--- a/{path}\n+++ b/{path}\n");

    for (index, line) in lines.iter().enumerate() {
        let changed = index % step == step - 1 && !line.trim().is_empty();
        if changed {
            modified.push_str(&format!("{line} # changed\n"));
            diff.push_str(&format!("@@ -{0},1 +{0},1 @@\n", index + 1));
            diff.push_str(&format!("-{line}\n+{line} # changed\n"));
        } else {
            modified.push_str(&format!("{line}\n"));
        }
    }

    (modified, diff)
}

/// 基准测试：结构提取
fn bench_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("extraction");

    for class_count in [10, 100] {
        let python = generate_python_source(class_count);
        group.throughput(Throughput::Bytes(python.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("python", class_count),
            &python,
            |b, source| {
                let mut extractor = PythonExtractor::new().unwrap();
                b.iter(|| black_box(extractor.extract(black_box(source)).unwrap()))
            },
        );

        let java = generate_java_source(class_count);
        group.throughput(Throughput::Bytes(java.len() as u64));
        group.bench_with_input(BenchmarkId::new("java", class_count), &java, |b, source| {
            let mut extractor = JavaExtractor::new().unwrap();
            b.iter(|| black_box(extractor.extract(black_box(source)).unwrap()))
        });
    }

    group.finish();
}

/// 基准测试：索引构建与查询
fn bench_index(c: &mut Criterion) {
    let source = generate_python_source(200);
    let structures = PythonExtractor::new().unwrap().extract(&source).unwrap();
    let line_count = source.lines().count() as u32;

    c.bench_function("index_build", |b| {
        b.iter(|| black_box(StructureIndex::build(black_box(structures.clone()))))
    });

    let index = StructureIndex::build(structures);
    c.bench_function("index_lookup_all_lines", |b| {
        b.iter(|| {
            for line in 1..=line_count {
                black_box(index.lookup_id(black_box(line)));
            }
        })
    });
}

/// 基准测试：差异解析
fn bench_diff_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff_parsing");

    for step in [2, 10] {
        let source = generate_python_source(200);
        let (_, diff) = generate_modified(&source, "service.py", step);
        group.throughput(Throughput::Bytes(diff.len() as u64));
        group.bench_with_input(BenchmarkId::new("every_nth_line", step), &diff, |b, diff| {
            b.iter(|| black_box(DiffParser::parse(black_box(diff))))
        });
    }

    group.finish();
}

/// 基准测试：完整映射（含读取和解析两个版本）
fn bench_change_mapping(c: &mut Criterion) {
    let source = generate_python_source(100);
    let (modified, diff) = generate_modified(&source, "service.py", 5);
    let files = DiffParser::parse(&diff);
    let old_version = FileVersion::Revision("HEAD".to_string());

    c.bench_function("change_mapping", |b| {
        b.iter(|| {
            let content = MemoryContent::new()
                .with_file("service.py", old_version.clone(), source.as_str())
                .with_file("service.py", FileVersion::WorkingTree, modified.as_str());
            let mut cache = AnalyzerCache::new(Box::new(content));
            let result =
                ChangeMapper::new(&mut cache, old_version.clone(), FileVersion::WorkingTree)
                    .map(black_box(&files));
            black_box(result);
        })
    });
}

criterion_group!(
    benches,
    bench_extraction,
    bench_index,
    bench_diff_parsing,
    bench_change_mapping
);

criterion_main!(benches);
