use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::analyzer::component_classifier::{ComponentClassifier, ComponentInfo, UnitClassification};
use crate::analyzer::framework_patterns::FrameworkPatterns;
use crate::analyzer::global_index::{unit_order, SymbolIndex};
use crate::analyzer::pattern_detector::{PatternDetector, PatternFinding};
use crate::architecture::ArchitectureScorer;
use crate::config::AnalysisOptions;
use crate::error::{AnalysisError, AnalysisWarning, WarningKind};
use crate::parser::references::{DependencyEdge, DependencyExtractor};
use crate::parser::symbols::{EnumDecl, SourceUnit};
use crate::parser::CSharpParser;
use crate::report::{render_prompt, AnalysisResult};
use crate::workspace::{load_source, SourceDiscovery, SourceFile, SourceFilter};

/// Output of the per-file task. Pure function of the file contents.
#[derive(Debug, Default)]
struct FileOutcome {
    analyzed: bool,
    units: Vec<(SourceUnit, UnitClassification)>,
    enums: Vec<EnumDecl>,
    delegates: Vec<String>,
    warnings: Vec<AnalysisWarning>,
}

/// Merged per-file outcomes, in canonical order.
#[derive(Debug, Default)]
pub struct ProjectSnapshot {
    pub files_analyzed: usize,
    pub units: Vec<SourceUnit>,
    pub classifications: Vec<UnitClassification>,
    pub enums: Vec<EnumDecl>,
    pub warnings: Vec<AnalysisWarning>,
}

impl fmt::Display for ProjectSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files, {} units, {} namespace-level enums, {} warnings",
            self.files_analyzed,
            self.units.len(),
            self.enums.len(),
            self.warnings.len()
        )
    }
}

/// Runs one analysis over a directory tree or a single file.
pub struct ProjectAnalyzer {
    root: PathBuf,
    options: AnalysisOptions,
    parser: CSharpParser,
    patterns: FrameworkPatterns,
}

impl ProjectAnalyzer {
    pub fn new<P: AsRef<Path>>(root: P, options: AnalysisOptions) -> Result<Self, AnalysisError> {
        let parser = CSharpParser::new().map_err(|e| AnalysisError::Internal(format!("{:#}", e)))?;
        Ok(Self {
            root: root.as_ref().to_path_buf(),
            options,
            parser,
            patterns: FrameworkPatterns::default(),
        })
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// Full pipeline. Stage failures become `success = false`.
    pub fn run(&self) -> AnalysisResult {
        let timer = Instant::now();
        match self.run_stages() {
            Ok(mut result) => {
                result.duration_ms = elapsed_ms(timer);
                self.stage(format_args!("Analysis finished in {} ms: {}", result.duration_ms, result.summary()));
                result
            }
            Err(e) => {
                warn!("Analysis of {} failed: {}", self.root.display(), e);
                AnalysisResult::failure(&e, elapsed_ms(timer))
            }
        }
    }

    fn run_stages(&self) -> Result<AnalysisResult, AnalysisError> {
        let options = &self.options;

        let discovery = SourceDiscovery::new(&self.root, SourceFilter::from_options(options));
        let discovered = discovery.discover()?;
        self.stage(format_args!(
            "Discovered {} source files under {}",
            discovered.files.len(),
            self.root.display()
        ));

        let parse_timer = Instant::now();
        let mut snapshot = self.collect_units(&discovered.files, discovery.filter())?;
        snapshot.warnings.extend(discovered.warnings);
        self.stage(format_args!("Parsed {} in {:?}", snapshot, parse_timer.elapsed()));

        let ProjectSnapshot {
            files_analyzed,
            units,
            classifications,
            enums,
            mut warnings,
        } = snapshot;

        let index = SymbolIndex::build(units, enums);
        warnings.extend(index.collision_warnings());
        self.stage(format_args!("Symbol index: {}", index.stats()));

        let edges: Vec<DependencyEdge> = if options.analyze_dependencies {
            let extractor = DependencyExtractor::new(&index, &self.patterns)
                .map_err(|e| AnalysisError::Internal(format!("{:#}", e)))?;
            extractor.extract_all()
        } else {
            Vec::new()
        };
        self.stage(format_args!("Extracted {} dependency edges", edges.len()));

        let findings: Vec<PatternFinding> = if options.detect_design_patterns {
            PatternDetector::new(&index, &edges, options.analyze_dependencies).detect_all()
        } else {
            Vec::new()
        };
        self.stage(format_args!("Detected {} pattern findings", findings.len()));

        let components = assemble_components(&index, classifications, &edges);
        warnings.sort();

        let assessment = ArchitectureScorer::assess(
            &components,
            &edges,
            &findings,
            &warnings,
            options.generate_metadata,
        );
        debug!("Quality penalties: {:?}", assessment.penalties);

        let mut result = AnalysisResult {
            success: true,
            error_message: String::new(),
            duration_ms: 0,
            architecture_label: assessment.architecture_label,
            quality_score: assessment.quality_score,
            complexity_level: assessment.complexity_level,
            project_type: assessment.project_type,
            files_analyzed,
            component_count: components.len(),
            dependency_count: edges.len(),
            unresolved_dependency_count: edges.iter().filter(|e| !e.resolved).count(),
            pattern_count: findings.len(),
            components,
            dependencies: edges,
            patterns: findings,
            warnings,
            prompt: String::new(),
        };

        if options.generate_context_summary {
            result.prompt = render_prompt(&result)?;
        }

        Ok(result)
    }

    /// Reads, parses, filters and classifies every file on the run's pool,
    /// then merges the outcomes in canonical unit order.
    pub fn collect_units(
        &self,
        files: &[SourceFile],
        filter: &SourceFilter,
    ) -> Result<ProjectSnapshot, AnalysisError> {
        let classifier = ComponentClassifier::new(&self.patterns)
            .map_err(|e| AnalysisError::Internal(format!("{:#}", e)))?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.worker_threads())
            .build()
            .map_err(|e| AnalysisError::Internal(format!("Failed to build worker pool: {}", e)))?;

        let outcomes: Vec<FileOutcome> = pool.install(|| {
            files
                .par_iter()
                .map(|file| self.process_file(file, filter, &classifier))
                .collect()
        });

        let mut snapshot = ProjectSnapshot::default();
        let mut pairs: Vec<(SourceUnit, UnitClassification)> = Vec::new();
        let mut delegates: Vec<String> = Vec::new();
        for outcome in outcomes {
            if outcome.analyzed {
                snapshot.files_analyzed += 1;
            }
            pairs.extend(outcome.units);
            snapshot.enums.extend(outcome.enums);
            delegates.extend(outcome.delegates);
            snapshot.warnings.extend(outcome.warnings);
        }

        // Delegate types declared in one file make fields in another event-like.
        delegates.sort();
        delegates.dedup();
        for (unit, _) in &mut pairs {
            unit.mark_delegate_members(&delegates);
        }

        // Same order SymbolIndex::build uses, so positions line up after the build.
        pairs.sort_by(|a, b| unit_order(&a.0, &b.0));
        let (units, classifications): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        snapshot.units = units;
        snapshot.classifications = classifications;
        Ok(snapshot)
    }

    fn process_file(&self, file: &SourceFile, filter: &SourceFilter, classifier: &ComponentClassifier) -> FileOutcome {
        let source = match load_source(file) {
            Ok(source) => source,
            Err(warning) => {
                debug!("Skipping {}: {}", file.relative_path, warning.message);
                return FileOutcome {
                    warnings: vec![warning],
                    ..Default::default()
                };
            }
        };

        let parsed = self.parser.parse_source(&source.text, &source.relative_path);
        if !filter.accepts_namespace(&parsed.namespace) {
            debug!("Namespace '{}' filtered out: {}", parsed.namespace, file.relative_path);
            return FileOutcome::default();
        }

        let warnings = parsed
            .problems
            .iter()
            .map(|problem| AnalysisWarning::new(WarningKind::UnparsableUnit, &file.relative_path, problem.as_str()))
            .collect();

        let units = parsed
            .units
            .into_iter()
            .map(|unit| {
                let classification = classifier.classify(&unit, &self.options);
                (unit, classification)
            })
            .collect();

        FileOutcome {
            analyzed: true,
            units,
            enums: parsed.enums,
            delegates: parsed.delegates,
            warnings,
        }
    }

    fn stage(&self, message: fmt::Arguments<'_>) {
        if self.options.verbose_logging {
            info!("{}", message);
        } else {
            debug!("{}", message);
        }
    }
}

/// Pairs each indexed unit with its classification and outgoing targets,
/// ordered by (file path, start line). `classifications` must be in index order.
fn assemble_components(
    index: &SymbolIndex,
    classifications: Vec<UnitClassification>,
    edges: &[DependencyEdge],
) -> Vec<ComponentInfo> {
    let mut targets: BTreeMap<(&str, &str), Vec<String>> = BTreeMap::new();
    for edge in edges {
        targets
            .entry((edge.source.as_str(), edge.source_file.as_str()))
            .or_default()
            .push(edge.target.clone());
    }

    let mut components: Vec<ComponentInfo> = index
        .units()
        .iter()
        .zip(classifications)
        .map(|(unit, classification)| {
            let deps = targets
                .get(&(unit.qualified_name.as_str(), unit.file_path.as_str()))
                .cloned()
                .unwrap_or_default();
            ComponentInfo::assemble(unit, classification, deps)
        })
        .collect();

    components.sort_by(|a, b| {
        a.file_path
            .cmp(&b.file_path)
            .then_with(|| a.line_start.cmp(&b.line_start))
            .then_with(|| a.name.cmp(&b.name))
    });
    components
}

fn elapsed_ms(timer: Instant) -> u64 {
    u64::try_from(timer.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Analyzes every matching source file under `root`.
///
/// Never fails outright: an inaccessible root or an internal error yields a
/// result with `success == false` and `error_message` set.
pub fn analyze<P: AsRef<Path>>(root: P, options: &AnalysisOptions) -> AnalysisResult {
    let timer = Instant::now();
    match ProjectAnalyzer::new(root, options.clone()) {
        Ok(analyzer) => analyzer.run(),
        Err(e) => AnalysisResult::failure(&e, elapsed_ms(timer)),
    }
}
