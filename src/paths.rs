use crate::error::InstallError;
use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const ILLEGAL_DIR_CHARS: [char; 10] = ['/', '\\', '?', '%', '*', ':', '|', '"', '<', '>'];

/// Directory layout of a single install run.
#[derive(Debug, Clone)]
pub struct RunLayout {
    pub output_root: PathBuf,
    pub run_dir: PathBuf,
    pub extracted: PathBuf,
    pub dot_minecraft: PathBuf,
    pub mods: PathBuf,
}

impl RunLayout {
    pub fn new(output_root: &Path, run_name: &str) -> Self {
        let run_dir = output_root.join(sanitize_dir_name(run_name));
        let extracted = run_dir.join("extracted");
        let dot_minecraft = run_dir.join(".minecraft");
        let mods = dot_minecraft.join("mods");
        Self {
            output_root: output_root.to_path_buf(),
            run_dir,
            extracted,
            dot_minecraft,
            mods,
        }
    }

    pub fn archive_path(&self, file_name: &str) -> PathBuf {
        self.run_dir.join(file_name)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.extracted.join(crate::manifest::MANIFEST_FILE_NAME)
    }

    /// Creates the output root if needed and the run directory, which must not exist yet.
    pub fn create_run_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.output_root).with_context(|| {
            format!(
                "can't create output folder {}; make sure the program can write to it",
                self.output_root.display()
            )
        })?;
        create_fresh_dir(&self.run_dir)
    }

    pub fn create_game_dirs(&self) -> Result<()> {
        create_fresh_dir(&self.dot_minecraft)?;
        create_fresh_dir(&self.mods)
    }
}

fn create_fresh_dir(path: &Path) -> Result<()> {
    match fs::create_dir(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::AlreadyExists => {
            Err(InstallError::AlreadyExists(path.to_path_buf()).into())
        }
        Err(err) => Err(err).with_context(|| format!("failed to create dir: {}", path.display())),
    }
}

/// Replaces every character that is illegal in a directory name with `-`.
pub fn sanitize_dir_name(name: &str) -> String {
    name.chars()
        .map(|ch| if ILLEGAL_DIR_CHARS.contains(&ch) { '-' } else { ch })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_illegal_characters() {
        assert_eq!(
            sanitize_dir_name(r#"Pack: 1/2\3?4%5*6|7"8<9>"#),
            "Pack- 1-2-3-4-5-6-7-8-9-"
        );
        assert_eq!(sanitize_dir_name("All the Mods 6-1.5"), "All the Mods 6-1.5");
    }

    #[test]
    fn sanitize_is_idempotent() {
        for input in ["a/b", r#"<>:"|?*%\/"#, "plain", "", "ünïcödé:name"] {
            let once = sanitize_dir_name(input);
            assert_eq!(sanitize_dir_name(&once), once);
            assert!(!once.chars().any(|c| ILLEGAL_DIR_CHARS.contains(&c)));
        }
    }

    #[test]
    fn layout_nests_game_dirs_under_run_dir() {
        let layout = RunLayout::new(Path::new("modpacks"), "Pack 1.0: final");
        assert_eq!(layout.run_dir, PathBuf::from("modpacks/Pack 1.0- final"));
        assert_eq!(
            layout.manifest_path(),
            PathBuf::from("modpacks/Pack 1.0- final/extracted/manifest.json")
        );
        assert_eq!(
            layout.mods,
            PathBuf::from("modpacks/Pack 1.0- final/.minecraft/mods")
        );
    }

    #[test]
    fn existing_run_dir_is_a_conflict() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = RunLayout::new(&tmp.path().join("modpacks"), "pack");
        layout.create_run_dir().unwrap();
        let err = layout.create_run_dir().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<InstallError>(),
            Some(InstallError::AlreadyExists(path)) if path == &layout.run_dir
        ));
    }

    #[test]
    fn game_dirs_must_be_fresh() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = RunLayout::new(tmp.path(), "pack");
        layout.create_run_dir().unwrap();
        layout.create_game_dirs().unwrap();
        assert!(layout.mods.is_dir());
        assert!(layout.create_game_dirs().is_err());
    }
}
