use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

const TEMPLATE_SOURCE: &str = "assets/template";
const TEMPLATE_INDEX: &str = "index.html";
const CONTENT_PLACEHOLDER: &str = "{{markview:content}}";

fn main() {
    prepare_template_bundle().expect("failed to prepare template bundle");

    let source = Path::new(TEMPLATE_SOURCE);
    println!("cargo:rerun-if-changed={}", source.display());

    if source.is_dir() {
        for entry in WalkDir::new(source).into_iter().flatten() {
            println!("cargo:rerun-if-changed={}", entry.path().display());
        }
    }
}

fn prepare_template_bundle() -> Result<(), String> {
    let out_dir = PathBuf::from(env::var("OUT_DIR").map_err(|err| err.to_string())?);
    let source = Path::new(TEMPLATE_SOURCE);
    let dest = out_dir.join("template_bundle");

    if dest.exists() {
        fs::remove_dir_all(&dest)
            .map_err(|err| format!("failed to clean {}: {err}", dest.display()))?;
    }

    copy_dir(source, &dest)?;
    verify_placeholder(&dest.join(TEMPLATE_INDEX))
}

fn verify_placeholder(index: &Path) -> Result<(), String> {
    let template = fs::read_to_string(index)
        .map_err(|err| format!("failed to read {}: {err}", index.display()))?;

    match template.matches(CONTENT_PLACEHOLDER).count() {
        1 => Ok(()),
        count => Err(format!(
            "{} must contain `{CONTENT_PLACEHOLDER}` exactly once, found {count}",
            index.display()
        )),
    }
}

fn copy_dir(source: &Path, destination: &Path) -> Result<(), String> {
    fs::create_dir_all(destination)
        .map_err(|err| format!("failed to create {}: {err}", destination.display()))?;

    for entry in WalkDir::new(source).into_iter().flatten() {
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|err| format!("failed to strip prefix: {err}"))?;
        let target_path = destination.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target_path)
                .map_err(|err| format!("failed to create {}: {err}", target_path.display()))?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target_path.parent() {
                fs::create_dir_all(parent)
                    .map_err(|err| format!("failed to create {}: {err}", parent.display()))?;
            }
            fs::copy(entry.path(), &target_path)
                .map_err(|err| format!("failed to copy {}: {err}", target_path.display()))?;
        }
    }

    Ok(())
}
