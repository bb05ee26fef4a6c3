//! End-to-end annotation runs.
//!
//! A run has two phases. Parsing turns the template into an
//! [`AnnotationModel`] without touching anything else. Processing then
//! resolves the dataset, materializes the TRIPLES section, applies the
//! mappings, checks value use and finally serializes the graph.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::builder::TriplesBuilder;
use crate::condition::Coercion;
use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::fetch;
use crate::graph::Graph;
use crate::mapping::{MappingEngine, MappingSummary};
use crate::model::AnnotationModel;
use crate::serializer::{self, Syntax};
use crate::template::Template;
use crate::term::Token;
use crate::tracker::ValueTracker;

/// Settings of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Path of the annotation template.
    pub template: PathBuf,
    /// Process only the first N dataset rows.
    pub row_limit: Option<usize>,
    /// Output file; defaults to [`RunConfig::output_path`].
    pub output: Option<PathBuf>,
    /// Output syntax.
    pub syntax: Syntax,
    /// Where remote datasets are cached; defaults to the template's directory.
    pub cache_dir: Option<PathBuf>,
    /// How condition comparands are compared.
    pub coercion: Coercion,
}

impl RunConfig {
    /// Default settings for `template`.
    #[must_use]
    pub fn new(template: impl Into<PathBuf>) -> Self {
        Self {
            template: template.into(),
            row_limit: None,
            output: None,
            syntax: Syntax::default(),
            cache_dir: None,
            coercion: Coercion::default(),
        }
    }

    /// Limits processing to the first `limit` rows.
    #[must_use]
    pub fn with_row_limit(mut self, limit: Option<usize>) -> Self {
        self.row_limit = limit;
        self
    }

    /// Writes output to `path` instead of next to the template.
    #[must_use]
    pub fn with_output(mut self, path: Option<PathBuf>) -> Self {
        self.output = path;
        self
    }

    /// Selects the output syntax.
    #[must_use]
    pub fn with_syntax(mut self, syntax: Syntax) -> Self {
        self.syntax = syntax;
        self
    }

    /// Caches remote datasets in `dir`.
    #[must_use]
    pub fn with_cache_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.cache_dir = dir;
        self
    }

    /// Selects the comparand coercion.
    #[must_use]
    pub fn with_coercion(mut self, coercion: Coercion) -> Self {
        self.coercion = coercion;
        self
    }

    /// The explicit output path, or the template path with its extension
    /// replaced by the syntax's.
    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.template.with_extension(self.syntax.extension()))
    }

    /// Directory relative dataset paths and the default cache resolve
    /// against.
    #[must_use]
    pub fn template_dir(&self) -> PathBuf {
        match self.template.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

/// The result of processing a template.
#[derive(Debug, Clone)]
pub struct Annotation {
    /// The parsed template.
    pub template: Template,
    /// All emitted triples.
    pub graph: Graph,
    /// Dataset rows processed (after the row limit), zero without a dataset.
    pub rows: usize,
    /// Mapping counters.
    pub summary: MappingSummary,
}

impl Annotation {
    /// The parsed annotation model.
    #[must_use]
    pub fn model(&self) -> &AnnotationModel {
        &self.template.model
    }

    /// Renders the graph with the template's namespaces registered.
    ///
    /// # Errors
    ///
    /// [`Error::Json`] if JSON-LD rendering fails.
    pub fn serialize(&self, syntax: Syntax) -> Result<String> {
        serializer::serialize(&self.graph, &self.model().namespaces, syntax)
    }
}

/// What [`run`] wrote.
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// The processed annotation.
    pub annotation: Annotation,
    /// File the graph was written to.
    pub path: PathBuf,
    /// Syntax of that file.
    pub syntax: Syntax,
}

/// Drives the phases of a run for one configuration.
#[derive(Debug, Clone)]
pub struct Annotator {
    config: RunConfig,
}

impl Annotator {
    /// Creates an annotator.
    #[must_use]
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Parses the template.
    ///
    /// # Errors
    ///
    /// See [`Template::from_path`].
    pub fn parse(&self) -> Result<Template> {
        let template = Template::from_path(&self.config.template)?;
        let model = &template.model;
        info!(
            template = %self.config.template.display(),
            observations = model.observation_count(),
            measurements = model.measurement_count(),
            mappings = model.mappings.len(),
            triples = model.static_triples.len(),
            skipped = template.skipped.len(),
            "template parsed"
        );
        Ok(template)
    }

    /// Processes an already parsed template.
    ///
    /// # Errors
    ///
    /// Dataset resolution errors (see [`resolve_dataset`]), term resolution
    /// errors from the TRIPLES section or the mappings, and
    /// [`Error::DuplicateUse`] / [`Error::CountMismatch`] from value-use
    /// validation.
    pub fn process(&self, template: Template) -> Result<Annotation> {
        let model = &template.model;
        let dataset = resolve_dataset(model, &self.config)?;

        let mut builder = TriplesBuilder::new(&model.namespaces);
        materialize_static(model, &mut builder)?;

        let (rows, summary) = match &dataset {
            Some(dataset) => {
                let mut tracker = ValueTracker::new();
                let summary = MappingEngine::new(model, dataset)
                    .with_coercion(self.config.coercion)
                    .run(&mut builder, &mut tracker)?;
                tracker.validate(dataset.row_count())?;
                (dataset.row_count(), summary)
            }
            None => (0, MappingSummary::default()),
        };

        let graph = builder.into_graph();
        info!(triples = graph.len(), "graph complete");
        Ok(Annotation {
            template,
            graph,
            rows,
            summary,
        })
    }

    /// Parses and processes the template.
    ///
    /// # Errors
    ///
    /// See [`Annotator::parse`] and [`Annotator::process`].
    pub fn annotate(&self) -> Result<Annotation> {
        let template = self.parse()?;
        self.process(template)
    }
}

/// Parses, processes and writes the output file for `config`.
///
/// # Errors
///
/// Any error of [`Annotator::annotate`], serialization errors, and
/// [`Error::Io`] if the output cannot be written.
pub fn run(config: &RunConfig) -> Result<RunOutput> {
    let annotation = Annotator::new(config.clone()).annotate()?;
    let path = config.output_path();
    let text = annotation.serialize(config.syntax)?;
    std::fs::write(&path, text).map_err(|e| Error::io(&path, e))?;
    info!(output = %path.display(), syntax = %config.syntax, "annotation written");
    Ok(RunOutput {
        annotation,
        path,
        syntax: config.syntax,
    })
}

/// Locates and loads the dataset named by `meta.data_identifier`.
///
/// Returns `None` when the template declares neither a dataset nor any
/// mapping. The row limit of `config` is applied to the loaded dataset.
///
/// # Errors
///
/// [`Error::MissingDataset`] if mappings exist without a dataset or the
/// declared local file does not exist; [`Error::Fetch`] for a failed
/// download; read and parse errors from [`Dataset::from_path`].
pub fn resolve_dataset(model: &AnnotationModel, config: &RunConfig) -> Result<Option<Dataset>> {
    let Some(identifier) = model.data_identifier() else {
        if model.mappings.is_empty() {
            return Ok(None);
        }
        return Err(Error::MissingDataset {
            mappings: model.mappings.len(),
            reason: "META has no data_identifier".to_owned(),
        });
    };
    let identifier = identifier.trim();

    let path = if fetch::is_remote(identifier) {
        let cache_dir = config
            .cache_dir
            .clone()
            .unwrap_or_else(|| config.template_dir());
        fetch::fetch_cached(identifier, &cache_dir)?
    } else {
        let path = local_path(identifier, &config.template_dir());
        if !path.is_file() {
            return Err(Error::MissingDataset {
                mappings: model.mappings.len(),
                reason: format!("{} does not exist", path.display()),
            });
        }
        path
    };

    let mut dataset = Dataset::from_path(&path)?;
    if let Some(limit) = config.row_limit {
        dataset.truncate(limit);
    }
    info!(
        dataset = %path.display(),
        columns = dataset.column_names().count(),
        rows = dataset.row_count(),
        "dataset resolved"
    );
    Ok(Some(dataset))
}

fn local_path(identifier: &str, template_dir: &Path) -> PathBuf {
    let path = Path::new(identifier);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        template_dir.join(path)
    }
}

/// Adds every TRIPLES row to the graph, in template order.
fn materialize_static(model: &AnnotationModel, builder: &mut TriplesBuilder<'_>) -> Result<()> {
    for t in &model.static_triples {
        let added = builder.add(
            Token::parse(&t.subject)?,
            Token::parse(&t.predicate)?,
            Token::parse(&t.object)?,
        )?;
        if !added {
            debug!(subject = %t.subject, predicate = %t.predicate, "duplicate static triple");
        }
    }
    info!(count = model.static_triples.len(), "static triples materialized");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn output_path_replaces_extension() {
        let config = RunConfig::new("data/fish.csv");
        assert_eq!(config.output_path(), PathBuf::from("data/fish.ttl"));
        let config = config.with_syntax(Syntax::NTriples);
        assert_eq!(config.output_path(), PathBuf::from("data/fish.nt"));
        let config = config.with_output(Some(PathBuf::from("out.nt")));
        assert_eq!(config.output_path(), PathBuf::from("out.nt"));
        assert_eq!(RunConfig::new("t.csv").template_dir(), PathBuf::from("."));
    }

    #[test]
    fn mappings_without_dataset_are_fatal() {
        let template = Template::from_rows(vec![vec!["MAPPINGS"], vec!["len", "m1"]]);
        let result = resolve_dataset(&template.model, &RunConfig::new("t.csv"));
        assert!(matches!(result, Err(Error::MissingDataset { mappings: 1, .. })));
    }

    #[test]
    fn no_dataset_and_no_mappings_is_fine() {
        let template = Template::from_rows(vec![vec!["META"], vec!["title", "x"]]);
        let result = resolve_dataset(&template.model, &RunConfig::new("t.csv"));
        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn relative_dataset_resolves_against_template_dir() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "catch.csv", "spp,len\nshad,1\nbass,2\nshad,3\n");
        let template_path = write(
            dir.path(),
            "t.csv",
            "META\ndata_identifier,catch.csv\n",
        );
        let template = Template::from_path(&template_path).unwrap();
        let config = RunConfig::new(&template_path).with_row_limit(Some(2));
        let dataset = resolve_dataset(&template.model, &config).unwrap().unwrap();
        assert_eq!(dataset.row_count(), 2);
        assert!(dataset.has_column("len"));
    }

    #[test]
    fn declared_but_missing_local_dataset_is_fatal() {
        let template = Template::from_rows(vec![vec!["META"], vec!["data_identifier", "nope.csv"]]);
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfig::new(dir.path().join("t.csv"));
        let result = resolve_dataset(&template.model, &config);
        assert!(matches!(result, Err(Error::MissingDataset { mappings: 0, .. })));
    }

    #[test]
    fn run_writes_next_to_template() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "catch.csv", "id,len\na,1\nb,2\n");
        let template_path = write(
            dir.path(),
            "fish.csv",
            "META\ndata_identifier,catch.csv\n\
             OBSERVATIONS\nobservation,o1\n,measurement,m1\n\
             MAPPINGS\nlen,m1\n",
        );
        let output = run(&RunConfig::new(&template_path)).unwrap();
        assert_eq!(output.path, dir.path().join("fish.ttl"));
        assert_eq!(output.annotation.rows, 2);
        // 3 measurement + 3 observation triples per row
        assert_eq!(output.annotation.graph.len(), 12);
        let text = std::fs::read_to_string(&output.path).unwrap();
        assert!(text.contains("_:m1_row1"));
    }

    #[test]
    fn row_limit_sets_expected_count() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "catch.csv", "spp,len\nshad,1\nbass,2\nshad,3\n");
        let template_path = write(
            dir.path(),
            "fish.csv",
            "META\ndata_identifier,catch.csv\n\
             OBSERVATIONS\nobservation,o1\n,measurement,m1\n\
             MAPPINGS\nlen,m1,spp eq shad\n",
        );
        let annotator = Annotator::new(RunConfig::new(&template_path));
        // rows 0 and 2 only: one value of 'len' is never used
        assert!(matches!(
            annotator.annotate(),
            Err(Error::CountMismatch { expected: 3, actual: 2, .. })
        ));

        let limited = Annotator::new(RunConfig::new(&template_path).with_row_limit(Some(1)));
        let annotation = limited.annotate().unwrap();
        assert_eq!(annotation.rows, 1);
        assert_eq!(annotation.summary.measurements, 1);
    }
}
