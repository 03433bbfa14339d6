use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::ast::{AstNode, NodeKind};
use crate::config::{CompilerOptions, ConfigError};
use crate::database::{CompilationDatabase, CompilationUnit, FileHandle, SourceFile};
use crate::diagnostics::{Diagnostic, DiagnosticCollection, DiagnosticError, DiagnosticSink};
use crate::dispatch::Reducer;
use crate::grammar::{load_grammar, CommandSpec, GrammarError};
use crate::rules::register_standard_rules;
use crate::serialize::Serializer;
use crate::syntax::{LeafParser, Parser};

// ============================================================================
// PIPELINE STEPS
// ============================================================================

pub const PARSE_STEP: usize = 0;
pub const TRANSFORM_STEP: usize = 1;
pub const LINT_STEP: usize = 2;
pub const SERIALIZE_STEP: usize = 3;

pub fn step_name(step: usize) -> &'static str {
    match step {
        PARSE_STEP => "parse",
        TRANSFORM_STEP => "transform",
        LINT_STEP => "lint",
        SERIALIZE_STEP => "serialize",
        _ => "unknown",
    }
}

/// Failures while setting up a compiler, before any file is processed.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Grammar(#[from] GrammarError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ============================================================================
// PASS CONTEXT
// ============================================================================

/// What transform and lint rules see while a unit is being reduced.
///
/// The database moves into the context for the duration of the pass, so
/// rules can look up other units and schedule new ones.
pub struct PassContext {
    pub database: CompilationDatabase,
    /// Diagnostics of the current unit.
    pub diagnostics: DiagnosticCollection,
    pub step: usize,
}

impl PassContext {
    pub fn current(&self) -> Option<FileHandle> {
        self.database.current
    }

    pub fn resource_name(&self) -> Option<&str> {
        self.database
            .current_unit()
            .and_then(|unit| unit.resource_name.as_deref())
    }

    /// Adds a unit and schedules it at `step`.
    pub fn add_unit(&mut self, unit: CompilationUnit, step: usize) -> FileHandle {
        let handle = self.database.add(unit);
        self.database.enqueue(handle, step, 0);
        handle
    }
}

impl DiagnosticSink for PassContext {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.add(diagnostic);
    }
}

// ============================================================================
// BUILD REPORT
// ============================================================================

#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub handle: FileHandle,
    pub file: SourceFile,
}

#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub outputs: Vec<BuildOutput>,
    /// Every diagnostic of the build, warnings included.
    pub diagnostics: DiagnosticCollection,
}

impl BuildReport {
    pub fn output(&self, handle: FileHandle) -> Option<&SourceFile> {
        self.outputs
            .iter()
            .find(|output| output.handle == handle)
            .map(|output| &output.file)
    }

    pub fn output_named(&self, resource_name: &str) -> Option<&SourceFile> {
        self.outputs
            .iter()
            .map(|output| &output.file)
            .find(|file| file.resource_name.as_deref() == Some(resource_name))
    }
}

// ============================================================================
// COMPILER
// ============================================================================

/// The compiler: parses, transforms, lints and serializes every unit in the
/// database, one step at a time.
pub struct Mecha {
    pub database: CompilationDatabase,
    /// Build-wide diagnostics, accumulated across runs.
    pub diagnostics: DiagnosticCollection,
    spec: Arc<CommandSpec>,
    parser: Parser,
    serializer: Serializer,
    transforms: Reducer<PassContext>,
    lints: Reducer<PassContext>,
    options: CompilerOptions,
}

impl Mecha {
    /// Builds a compiler over the bundled grammar extended with the
    /// configured grammar files.
    pub fn new(options: CompilerOptions) -> Result<Self, EngineError> {
        let grammars = options
            .grammars
            .iter()
            .map(|path| load_grammar(path))
            .collect::<Result<Vec<_>, _>>()?;
        let spec = CommandSpec::with_grammars(&grammars, options.legacy_root_redirect)?;
        Self::with_spec(spec, options)
    }

    /// Builds a compiler over an already resolved grammar. The grammar
    /// fields of `options` are not consulted.
    pub fn with_spec(spec: CommandSpec, options: CompilerOptions) -> Result<Self, EngineError> {
        let spec = Arc::new(spec);
        let mut transforms = Reducer::new();
        let mut lints = Reducer::new();
        register_standard_rules(&mut transforms, &mut lints, &options)?;
        Ok(Self {
            database: CompilationDatabase::new(),
            diagnostics: DiagnosticCollection::new(),
            parser: Parser::new(spec.clone(), options.parse_options()),
            serializer: Serializer::new(spec.clone(), options.indent),
            spec,
            transforms,
            lints,
            options,
        })
    }

    pub fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    pub fn serializer(&self) -> &Serializer {
        &self.serializer
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn register_leaf(&mut self, name: impl Into<String>, parser: LeafParser) -> Option<LeafParser> {
        self.parser.register_leaf(name, parser)
    }

    /// Registers a transform rule, applied after the standard transforms.
    pub fn transform<F>(&mut self, name: &str, kinds: &[NodeKind], predicates: &[(&str, &str)], handler: F)
    where
        F: Fn(&AstNode, &mut PassContext) -> Result<Option<AstNode>, Diagnostic> + Send + Sync + 'static,
    {
        self.transforms.register(name, kinds, predicates, handler);
    }

    /// Registers a lint rule, applied after the standard lints.
    pub fn lint<F>(&mut self, name: &str, kinds: &[NodeKind], predicates: &[(&str, &str)], handler: F)
    where
        F: Fn(&AstNode, &mut PassContext) -> Result<Option<AstNode>, Diagnostic> + Send + Sync + 'static,
    {
        self.lints.register(name, kinds, predicates, handler);
    }

    /// Adds a source file and schedules it for parsing.
    pub fn add(&mut self, file: SourceFile) -> FileHandle {
        let handle = self.database.add(CompilationUnit::from_source(&file));
        self.database.enqueue(handle, PARSE_STEP, 0);
        debug!(%handle, filename = ?file.filename, "added source file");
        handle
    }

    /// Runs every scheduled step.
    ///
    /// Each step processes all of its units before the next step starts. If
    /// a step produced error diagnostics, the build stops after it and the
    /// remaining work stays scheduled.
    pub fn run(&mut self) -> Result<BuildReport, DiagnosticError> {
        while let Some(step) = self.database.next_step() {
            debug!(step = step_name(step), "running step");
            let mut failed = false;
            while let Some(handle) = self.database.pop_step(step) {
                failed |= self.process(handle, step);
            }
            self.database.current = None;
            if failed {
                warn!(step = step_name(step), "step failed");
                return Err(DiagnosticError::new(self.diagnostics.clone()));
            }
        }
        Ok(self.report())
    }

    /// Compiles a single file together with everything already scheduled.
    pub fn compile(&mut self, file: SourceFile) -> Result<SourceFile, DiagnosticError> {
        let handle = self.add(file);
        self.run()?;
        self.output(handle).ok_or_else(|| {
            DiagnosticError::new(Diagnostic::error(format!("Unit {handle} was removed during the build.")).into())
        })
    }

    /// The current text of a unit: the serialized output once the unit went
    /// through the pipeline, its source before.
    pub fn output(&self, handle: FileHandle) -> Option<SourceFile> {
        let unit = self.database.get(handle)?;
        Some(SourceFile {
            text: unit
                .output
                .as_ref()
                .or(unit.source.as_ref())
                .cloned()
                .unwrap_or_default(),
            filename: unit.filename.clone(),
            resource_name: unit.resource_name.clone(),
        })
    }

    pub fn report(&self) -> BuildReport {
        BuildReport {
            outputs: self
                .database
                .handles()
                .filter_map(|handle| {
                    Some(BuildOutput {
                        handle,
                        file: self.output(handle)?,
                    })
                })
                .collect(),
            diagnostics: self.diagnostics.clone(),
        }
    }

    /// Runs one step on one unit. Returns whether it produced an error.
    fn process(&mut self, handle: FileHandle, step: usize) -> bool {
        let Some(unit) = self.database.get_mut(handle) else {
            warn!(%handle, "scheduled unit no longer exists");
            return false;
        };
        let mut diagnostics = std::mem::take(&mut unit.diagnostics);
        let before = diagnostics.len();
        self.database.current = Some(handle);
        trace!(%handle, step = step_name(step), "processing unit");

        let next = match step {
            PARSE_STEP => self.parse(handle, &mut diagnostics),
            TRANSFORM_STEP | LINT_STEP => self.reduce(handle, step, &mut diagnostics),
            SERIALIZE_STEP => self.serialize(handle, &mut diagnostics),
            _ => {
                warn!(step, "unknown pipeline step");
                None
            }
        };

        let produced = diagnostics.exceptions[before..].to_vec();
        let failed = produced.iter().any(Diagnostic::is_error);
        for diagnostic in produced {
            self.diagnostics.add(diagnostic);
        }
        if let Some(unit) = self.database.get_mut(handle) {
            unit.diagnostics = diagnostics;
        }
        if let Some(next) = next {
            self.database.enqueue(handle, next, 0);
        }
        failed
    }

    fn parse(&mut self, handle: FileHandle, diagnostics: &mut DiagnosticCollection) -> Option<usize> {
        let unit = self.database.get_mut(handle)?;
        let Some(source) = unit.source.as_deref() else {
            // Units built from a tree skip parsing.
            return unit.ast.is_some().then_some(TRANSFORM_STEP);
        };
        match self.parser.parse(source) {
            Ok(ast) => {
                debug!(%handle, commands = ast.ast().children().len(), "parsed unit");
                unit.ast = Some(ast);
                Some(TRANSFORM_STEP)
            }
            Err(error) => {
                debug!(%handle, %error, "syntax error");
                diagnostics.add(error.into_diagnostic());
                None
            }
        }
    }

    fn reduce(&mut self, handle: FileHandle, step: usize, diagnostics: &mut DiagnosticCollection) -> Option<usize> {
        let ast = self.database.get(handle)?.ast.clone()?;
        let reducer = if step == TRANSFORM_STEP {
            &self.transforms
        } else {
            &self.lints
        };
        if reducer.is_empty() {
            return Some(step + 1);
        }

        let mut context = PassContext {
            database: std::mem::take(&mut self.database),
            diagnostics: std::mem::take(diagnostics),
            step,
        };
        let reduced = reducer.invoke(&ast, &mut context);
        self.database = context.database;
        *diagnostics = context.diagnostics;

        if !reduced.ptr_eq(&ast) {
            trace!(%handle, step = step_name(step), "tree rewritten");
            if let Some(unit) = self.database.get_mut(handle) {
                unit.ast = Some(reduced);
            }
        }
        Some(step + 1)
    }

    fn serialize(&mut self, handle: FileHandle, diagnostics: &mut DiagnosticCollection) -> Option<usize> {
        let unit = self.database.get_mut(handle)?;
        let ast = unit.ast.as_ref()?;
        match self.serializer.serialize(ast) {
            Ok(text) => {
                debug!(%handle, bytes = text.len(), "serialized unit");
                unit.output = Some(text);
            }
            Err(diagnostic) => diagnostics.add(diagnostic),
        }
        None
    }
}
