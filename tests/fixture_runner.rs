use nestlang::interpreter::parse_and_run;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Every `tests/fixtures/<name>/program.nl` must print exactly the contents
/// of the sibling `expected.txt`. A failing program is expected to print
/// `ERROR`, like the command line tool does.
#[test]
fn run_fixtures() {
    let fixtures_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures");
    let mut count = 0;
    let mut failures = Vec::new();

    for entry in WalkDir::new(&fixtures_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_name() == "program.nl")
    {
        let path = entry.path();
        let dir = path.parent().unwrap();
        let name = dir.file_name().unwrap().to_string_lossy().to_string();

        let source = fs::read_to_string(path).unwrap_or_else(|e| panic!("Failed to read {path:?}: {e}"));
        let expected = fs::read_to_string(dir.join("expected.txt"))
            .unwrap_or_else(|e| panic!("Missing expected.txt for {name}: {e}"));

        let actual = match parse_and_run(&source) {
            Ok(output) => output,
            Err(e) => {
                eprintln!("fixture {name} failed: {e}");
                "ERROR\n".to_string()
            }
        };

        count += 1;
        if actual != expected {
            failures.push(format!("{name}: expected {expected:?}, got {actual:?}"));
        }
    }

    assert!(count > 0, "No fixtures found in {:?}", fixtures_dir);
    assert!(failures.is_empty(), "Fixture failures:\n{}", failures.join("\n"));
}
