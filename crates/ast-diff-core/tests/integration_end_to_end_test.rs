//! 端到端集成测试
//!
//! 使用真实的 Git 仓库测试完整的工作流程：差异生成、修订读取、映射和输出

mod test_data;

use ast_diff_core::{
    AstDiffError, DiffAnalyzer, FormatterConfig, GitRevisionReader, OutputFormat, OutputRenderer,
    RunConfig, UNKNOWN_STRUCTURE, git_diff,
};
use pretty_assertions::assert_eq;
use test_data::{
    JAVA_SAMPLE, JAVA_SAMPLE_MODIFIED, PYTHON_SAMPLE, PYTHON_SAMPLE_MODIFIED, TestRepo,
};

fn group_summary(outcome: &ast_diff_core::AnalysisOutcome) -> Vec<(String, String, usize, usize)> {
    outcome
        .result
        .files
        .iter()
        .flat_map(|file| {
            file.groups.iter().map(|g| {
                (
                    file.file_path.clone(),
                    g.key.clone(),
                    g.additions,
                    g.deletions,
                )
            })
        })
        .collect()
}

#[test]
fn test_working_tree_against_head() {
    let repo = TestRepo::new().unwrap();
    repo.commit("app/service.py", PYTHON_SAMPLE, "add python sample")
        .unwrap();
    repo.commit("src/UserService.java", JAVA_SAMPLE, "add java sample")
        .unwrap();

    repo.write("app/service.py", PYTHON_SAMPLE_MODIFIED).unwrap();
    repo.write("src/UserService.java", JAVA_SAMPLE_MODIFIED)
        .unwrap();
    repo.write("README.md", "not analyzed\n").unwrap();

    let outcome = DiffAnalyzer::new(RunConfig::git(repo.path(), None, None))
        .run()
        .expect("git run succeeds");

    assert_eq!(
        group_summary(&outcome),
        vec![
            (
                "app/service.py".to_string(),
                "class UserService > method add_user".to_string(),
                1,
                1
            ),
            (
                "app/service.py".to_string(),
                "function calculate_total".to_string(),
                1,
                1
            ),
            (
                "app/service.py".to_string(),
                "function main".to_string(),
                1,
                1
            ),
            (
                "src/UserService.java".to_string(),
                "public class UserService > private static class User > public method getEmail"
                    .to_string(),
                1,
                1
            ),
            (
                "src/UserService.java".to_string(),
                "public class UserService > public method addUser".to_string(),
                1,
                1
            ),
        ]
    );
    assert_eq!(outcome.result.total_changes(), 10);
}

#[test]
fn test_commit_to_commit() {
    let repo = TestRepo::new().unwrap();
    let first = repo
        .commit("service.py", PYTHON_SAMPLE, "first")
        .unwrap();
    let second = repo
        .commit("service.py", PYTHON_SAMPLE_MODIFIED, "second")
        .unwrap();
    // 工作区的改动不影响两个提交之间的比较
    repo.write("service.py", "x = 1\n").unwrap();

    let outcome = DiffAnalyzer::new(RunConfig::git(repo.path(), Some(first), Some(second)))
        .run()
        .unwrap();

    let keys: Vec<String> = group_summary(&outcome)
        .into_iter()
        .map(|(_, key, _, _)| key)
        .collect();
    assert_eq!(
        keys,
        vec![
            "class UserService > method add_user",
            "function calculate_total",
            "function main",
        ]
    );
}

#[test]
fn test_new_file_uses_new_version_for_everything() {
    let repo = TestRepo::new().unwrap();
    let base = repo.commit("README.md", "# sample\n", "init").unwrap();
    let head = repo
        .commit("greet.py", "def greet(name):\n    return name\n", "add greet")
        .unwrap();

    let outcome = DiffAnalyzer::new(RunConfig::git(repo.path(), Some(base), Some(head)))
        .run()
        .unwrap();

    assert_eq!(
        group_summary(&outcome),
        vec![(
            "greet.py".to_string(),
            "function greet".to_string(),
            2,
            0
        )]
    );
}

#[test]
fn test_deleted_file_resolves_against_old_version() {
    let repo = TestRepo::new().unwrap();
    repo.commit("greet.py", "def greet(name):\n    return name\n", "add greet")
        .unwrap();
    std::fs::remove_file(repo.path().join("greet.py")).unwrap();

    let outcome = DiffAnalyzer::new(RunConfig::git(repo.path(), None, None))
        .run()
        .unwrap();

    let file = &outcome.result.files[0];
    assert_eq!(file.file_path, "greet.py");
    assert_eq!(file.new_path, None);
    assert_eq!(file.groups[0].key, "function greet");
    assert_eq!(file.groups[0].deletions, 2);
}

#[test]
fn test_run_from_repository_subdirectory() {
    let repo = TestRepo::new().unwrap();
    repo.commit("pkg/app.py", "def f():\n    return 1\n", "add app")
        .unwrap();
    repo.write("pkg/app.py", "def f():\n    return 2\n").unwrap();

    let outcome = DiffAnalyzer::new(RunConfig::git(repo.path().join("pkg"), None, None))
        .run()
        .unwrap();

    assert_eq!(
        group_summary(&outcome),
        vec![("pkg/app.py".to_string(), "function f".to_string(), 1, 1)]
    );
}

#[test]
fn test_quoted_non_ascii_path() {
    let repo = TestRepo::new().unwrap();
    repo.git(&["config", "core.quotePath", "true"]).unwrap();
    repo.commit("数据.py", "def load():\n    return 1\n", "add data")
        .unwrap();
    repo.write("数据.py", "def load():\n    return 2\n").unwrap();

    let outcome = DiffAnalyzer::new(RunConfig::git(repo.path(), None, None))
        .run()
        .unwrap();

    assert_eq!(
        group_summary(&outcome),
        vec![("数据.py".to_string(), "function load".to_string(), 1, 1)]
    );
}

#[test]
fn test_diff_prefix_config_is_ignored() {
    let repo = TestRepo::new().unwrap();
    repo.commit("app.py", "def f():\n    return 1\n", "add app")
        .unwrap();
    repo.write("app.py", "def f():\n    return 2\n").unwrap();
    repo.git(&["config", "diff.noprefix", "true"]).unwrap();
    repo.git(&["config", "diff.mnemonicPrefix", "true"]).unwrap();

    let outcome = DiffAnalyzer::new(RunConfig::git(repo.path(), None, None))
        .run()
        .unwrap();

    assert_eq!(
        group_summary(&outcome),
        vec![("app.py".to_string(), "function f".to_string(), 1, 1)]
    );
}

#[test]
fn test_clean_working_tree_reports_no_changes() {
    let repo = TestRepo::new().unwrap();
    repo.commit("service.py", PYTHON_SAMPLE, "init").unwrap();

    let outcome = DiffAnalyzer::new(RunConfig::git(repo.path(), None, None))
        .run()
        .unwrap();

    assert!(outcome.no_changes);
    assert!(outcome.result.is_empty());
}

#[test]
fn test_unknown_revision_is_fatal() {
    let repo = TestRepo::new().unwrap();
    repo.commit("service.py", PYTHON_SAMPLE, "init").unwrap();

    let result = git_diff(repo.path(), Some("no-such-revision"), None);
    assert!(matches!(result, Err(AstDiffError::ExternalToolFailure(_))));
}

#[test]
fn test_revision_reader_reads_committed_content() {
    let repo = TestRepo::new().unwrap();
    let hash = repo.commit("service.py", PYTHON_SAMPLE, "init").unwrap();
    repo.write("service.py", "changed\n").unwrap();

    let reader = GitRevisionReader::open(repo.path()).unwrap();
    assert_eq!(reader.read_blob(&hash, "service.py").unwrap(), PYTHON_SAMPLE);
    assert_eq!(reader.read_blob("HEAD", "service.py").unwrap(), PYTHON_SAMPLE);
    assert!(reader.read_blob("HEAD", "missing.py").is_err());
}

#[test]
fn test_rendered_report_for_repository() {
    let repo = TestRepo::new().unwrap();
    repo.commit("service.py", PYTHON_SAMPLE, "init").unwrap();
    repo.write(
        "service.py",
        &format!("{PYTHON_SAMPLE}\n\ndef shutdown():\n    print(\"bye\")\n"),
    )
    .unwrap();

    let outcome = DiffAnalyzer::new(RunConfig::git(repo.path(), None, None))
        .run()
        .unwrap();

    let config = FormatterConfig {
        enable_colors: false,
        show_statistics: true,
        ..FormatterConfig::default()
    };
    let text = OutputRenderer::new(config).render(&outcome.result).unwrap();
    assert!(text.content.contains("File: service.py"));
    assert!(text.content.contains("  ▸ function shutdown\n"));
    assert!(text.content.contains(&format!("  ▸ {UNKNOWN_STRUCTURE}\n")));
    assert!(text.content.contains("   1.   2 lines | function shutdown\n"));

    let config = FormatterConfig {
        output_format: OutputFormat::Json,
        ..FormatterConfig::default()
    };
    let json = OutputRenderer::new(config).render(&outcome.result).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json.content).unwrap();
    assert_eq!(value["metadata"]["additions"], 4);
    assert_eq!(value["metadata"]["deletions"], 0);
}
