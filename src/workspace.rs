use glob::Pattern;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::config::AnalysisOptions;
use crate::error::{AnalysisError, AnalysisWarning, WarningKind};

/// A candidate source file selected by the file filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path relative to the analysis root, `/`-separated.
    pub relative_path: String,
    pub absolute_path: PathBuf,
}

/// The decoded contents of a [`SourceFile`].
#[derive(Debug, Clone)]
pub struct LoadedSource {
    pub relative_path: String,
    pub text: String,
}

#[derive(Debug, Default)]
pub struct DiscoveredSources {
    pub files: Vec<SourceFile>,
    pub warnings: Vec<AnalysisWarning>,
}

/// Compiled include/exclude globs for file paths and namespaces.
#[derive(Debug, Clone)]
pub struct SourceFilter {
    include_files: Vec<Pattern>,
    exclude_files: Vec<Pattern>,
    include_namespaces: Vec<Pattern>,
    exclude_namespaces: Vec<Pattern>,
}

impl SourceFilter {
    pub fn from_options(options: &AnalysisOptions) -> Self {
        Self {
            include_files: compile_patterns(&options.include_file_patterns),
            exclude_files: compile_patterns(&options.exclude_file_patterns),
            include_namespaces: compile_patterns(&options.include_namespaces),
            exclude_namespaces: compile_patterns(&options.exclude_namespaces),
        }
    }

    /// A file is selected when its name or relative path matches an include
    /// pattern and neither matches an exclude pattern.
    pub fn accepts_file(&self, relative_path: &str) -> bool {
        let file_name = relative_path.rsplit('/').next().unwrap_or(relative_path);
        let matches = |pattern: &Pattern| pattern.matches(file_name) || pattern.matches(relative_path);

        if !self.include_files.iter().any(matches) {
            return false;
        }
        !self.exclude_files.iter().any(matches)
    }

    /// An empty include list places no restriction on namespaces.
    pub fn accepts_namespace(&self, namespace: &str) -> bool {
        if !self.include_namespaces.is_empty()
            && !self.include_namespaces.iter().any(|p| p.matches(namespace))
        {
            return false;
        }
        !self.exclude_namespaces.iter().any(|p| p.matches(namespace))
    }
}

fn compile_patterns(raw: &[String]) -> Vec<Pattern> {
    raw.iter()
        .filter_map(|p| match Pattern::new(p) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                // An invalid glob still works as a literal match.
                debug!("Invalid glob '{}': {}, escaping", p, e);
                Pattern::new(&Pattern::escape(p)).ok()
            }
        })
        .collect()
}

/// Enumerates candidate files under an analysis root.
#[derive(Debug)]
pub struct SourceDiscovery {
    root: PathBuf,
    filter: SourceFilter,
}

impl SourceDiscovery {
    pub fn new<P: AsRef<Path>>(root: P, filter: SourceFilter) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            filter,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn filter(&self) -> &SourceFilter {
        &self.filter
    }

    /// Lists the selected files sorted by relative path. Only an inaccessible
    /// root is fatal; problems below it become warnings.
    pub fn discover(&self) -> Result<DiscoveredSources, AnalysisError> {
        let metadata = std::fs::metadata(&self.root).map_err(|e| AnalysisError::RootInaccessible {
            path: self.root.clone(),
            reason: e.to_string(),
        })?;

        let mut discovered = DiscoveredSources::default();

        if metadata.is_file() {
            let name = self
                .root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if self.filter.accepts_file(&name) {
                discovered.files.push(SourceFile {
                    relative_path: name,
                    absolute_path: self.root.clone(),
                });
            }
            return Ok(discovered);
        }

        std::fs::read_dir(&self.root).map_err(|e| AnalysisError::RootInaccessible {
            path: self.root.clone(),
            reason: e.to_string(),
        })?;

        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e
                        .path()
                        .map(|p| self.relative_path(p))
                        .unwrap_or_default();
                    discovered
                        .warnings
                        .push(AnalysisWarning::new(WarningKind::WalkError, path, e.to_string()));
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let relative = self.relative_path(entry.path());
            if self.filter.accepts_file(&relative) {
                discovered.files.push(SourceFile {
                    relative_path: relative,
                    absolute_path: entry.into_path(),
                });
            }
        }

        discovered.files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        debug!("Discovered {} candidate files under {}", discovered.files.len(), self.root.display());
        Ok(discovered)
    }

    fn relative_path(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Reads and decodes a file. A leading byte-order mark is dropped.
pub fn load_source(file: &SourceFile) -> Result<LoadedSource, AnalysisWarning> {
    let bytes = std::fs::read(&file.absolute_path).map_err(|e| {
        AnalysisWarning::new(WarningKind::UnreadableFile, &file.relative_path, e.to_string())
    })?;

    let mut text = String::from_utf8(bytes).map_err(|e| {
        AnalysisWarning::new(
            WarningKind::UnreadableFile,
            &file.relative_path,
            format!("not valid UTF-8: {}", e.utf8_error()),
        )
    })?;

    if text.starts_with('\u{feff}') {
        text.drain(..'\u{feff}'.len_utf8());
    }

    Ok(LoadedSource {
        relative_path: file.relative_path.clone(),
        text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn filter_with(exclude: &[&str]) -> SourceFilter {
        let mut options = AnalysisOptions::default();
        options.exclude_file_patterns = exclude.iter().map(|s| s.to_string()).collect();
        SourceFilter::from_options(&options)
    }

    #[test]
    fn test_file_filter_matches_name_or_path() {
        let filter = filter_with(&["*Test*", "Editor/*"]);
        assert!(filter.accepts_file("Scripts/Player.cs"));
        assert!(!filter.accepts_file("Scripts/PlayerTests.cs"));
        assert!(!filter.accepts_file("Editor/Inspector.cs"));
        assert!(!filter.accepts_file("Scripts/readme.md"));
    }

    #[test]
    fn test_namespace_filter() {
        let mut options = AnalysisOptions::default();
        options.include_namespaces = vec!["Game*".to_string()];
        options.exclude_namespaces = vec!["Game.Debug".to_string()];
        let filter = SourceFilter::from_options(&options);

        assert!(filter.accepts_namespace("Game.Core"));
        assert!(!filter.accepts_namespace("Game.Debug"));
        assert!(!filter.accepts_namespace(""));
        assert!(SourceFilter::from_options(&AnalysisOptions::default()).accepts_namespace(""));
    }

    #[test]
    fn test_discover_sorted_relative_paths() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("b")).unwrap();
        fs::create_dir_all(dir.path().join("a")).unwrap();
        fs::write(dir.path().join("b/Zed.cs"), "class Zed {}").unwrap();
        fs::write(dir.path().join("a/Alpha.cs"), "class Alpha {}").unwrap();
        fs::write(dir.path().join("a/notes.txt"), "ignored").unwrap();

        let discovery = SourceDiscovery::new(dir.path(), filter_with(&[]));
        let found = discovery.discover().unwrap();
        let paths: Vec<_> = found.files.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(paths, vec!["a/Alpha.cs", "b/Zed.cs"]);
        assert!(found.warnings.is_empty());
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let discovery = SourceDiscovery::new("/no/such/root/anywhere", filter_with(&[]));
        assert!(matches!(
            discovery.discover(),
            Err(AnalysisError::RootInaccessible { .. })
        ));
    }

    #[test]
    fn test_single_file_root() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("Solo.cs");
        fs::write(&file, "class Solo {}").unwrap();

        let found = SourceDiscovery::new(&file, filter_with(&[])).discover().unwrap();
        assert_eq!(found.files.len(), 1);
        assert_eq!(found.files[0].relative_path, "Solo.cs");
    }

    #[test]
    fn test_load_source_strips_bom_and_rejects_binary() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("Good.cs");
        let bad = dir.path().join("Bad.cs");
        fs::write(&good, "\u{feff}class Good {}").unwrap();
        fs::write(&bad, [0xff, 0xfe, 0x00, 0xc3]).unwrap();

        let loaded = load_source(&SourceFile {
            relative_path: "Good.cs".into(),
            absolute_path: good,
        })
        .unwrap();
        assert_eq!(loaded.text, "class Good {}");

        let warning = load_source(&SourceFile {
            relative_path: "Bad.cs".into(),
            absolute_path: bad,
        })
        .unwrap_err();
        assert_eq!(warning.kind, WarningKind::UnreadableFile);
    }
}
