use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Refuse to clobber the input or an existing output without `--force`.
pub(super) fn check_output_destination(input: &Path, output: &Path, force: bool) -> Result<()> {
    if same_file(input, output) {
        bail!(
            "Output path {} would overwrite the input file",
            output.display()
        );
    }

    if output.exists() && !force {
        bail!(
            "Output file {} already exists. Use --force to overwrite.",
            output.display()
        );
    }

    Ok(())
}

pub(super) fn prepare_output_destination(output: &Path) -> Result<()> {
    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory {}", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_equal_to_input_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("clip.mp4");
        fs::write(&input, b"x").unwrap();
        let aliased = dir.path().join(".").join("clip.mp4");
        assert!(check_output_destination(&input, &aliased, true).is_err());
    }

    #[test]
    fn existing_output_needs_force() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("clip.mp4");
        let output = dir.path().join("out.mkv");
        fs::write(&input, b"x").unwrap();
        fs::write(&output, b"y").unwrap();
        assert!(check_output_destination(&input, &output, false).is_err());
        assert!(check_output_destination(&input, &output, true).is_ok());
    }

    #[test]
    fn missing_output_directory_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("nested").join("out.mkv");
        prepare_output_destination(&output).unwrap();
        assert!(output.parent().unwrap().is_dir());
    }
}
