use std::path::PathBuf;

use nbgrade::{
    Notebook,
    constants::{CODE_READ_ONLY_BANNER, MARKDOWN_READ_ONLY_BANNER},
    notebook::mark_read_only,
};

fn fixture_root(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(name)
}

fn scratch_copy(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("nbgrade-readonly-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join(name);
    std::fs::copy(fixture_root(name), &path).expect("copy fixture");
    path
}

#[test]
fn banners_are_added_once_and_survive_a_save() {
    let path = scratch_copy("hw01.ipynb");

    let mut nb = Notebook::load(&path).expect("load");
    assert_eq!(mark_read_only(&mut nb), 2);
    nb.save(&path).expect("save");

    let mut reloaded = Notebook::load(&path).expect("reload");
    let heading = reloaded.cell(0).expect("heading");
    assert!(heading.source_text().starts_with(MARKDOWN_READ_ONLY_BANNER));
    assert_eq!(heading.metadata.editable, Some(false));
    assert_eq!(heading.metadata.deletable, Some(false));
    assert!(
        reloaded
            .cell(1)
            .expect("import cell")
            .source_text()
            .starts_with(CODE_READ_ONLY_BANNER)
    );

    // A second pass still counts the cells but does not stack banners.
    let before = reloaded.clone();
    assert_eq!(mark_read_only(&mut reloaded), 2);
    assert_eq!(reloaded, before);

    // Untagged cells are untouched.
    assert_eq!(reloaded.cell(2).expect("problem").metadata.editable, None);

    let _ = std::fs::remove_dir_all(path.parent().expect("parent"));
}

#[test]
fn saved_notebooks_keep_unknown_fields() {
    let path = scratch_copy("hw01.ipynb");
    let nb = Notebook::load(&path).expect("load");
    nb.save(&path).expect("save");

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("json");
    assert_eq!(raw["nbformat"], 4);
    assert_eq!(raw["metadata"]["kernelspec"]["name"], "python3");
    assert_eq!(raw["cells"][8]["execution_count"], 1);
    assert_eq!(raw["cells"][8]["outputs"][0]["name"], "stdout");

    let _ = std::fs::remove_dir_all(path.parent().expect("parent"));
}
