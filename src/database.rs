//! Compilation database.
//!
//! Holds every compilation unit of a build, indexed by handle, filename and
//! resource name, together with the queue that schedules units through the
//! pipeline steps.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ast::AstNode;
use crate::diagnostics::DiagnosticCollection;

/// Stable identity of a source file inside one database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileHandle(pub usize);

impl fmt::Display for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A function file as it enters or leaves the compiler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceFile {
    pub text: String,
    pub filename: Option<String>,
    /// Resource name such as `demo:foo`.
    pub resource_name: Option<String>,
}

impl SourceFile {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_resource_name(mut self, name: impl Into<String>) -> Self {
        self.resource_name = Some(name.into());
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct CompilationUnit {
    pub ast: Option<AstNode>,
    /// Original source text, if the unit came from a file.
    pub source: Option<String>,
    /// Text produced by the serialize step.
    pub output: Option<String>,
    pub filename: Option<String>,
    pub resource_name: Option<String>,
    pub diagnostics: DiagnosticCollection,
}

impl CompilationUnit {
    pub fn from_source(file: &SourceFile) -> Self {
        Self {
            ast: None,
            source: Some(file.text.clone()),
            output: None,
            filename: file.filename.clone(),
            resource_name: file.resource_name.clone(),
            diagnostics: DiagnosticCollection::for_file(
                None,
                file.filename.clone(),
                file.resource_name.clone(),
            ),
        }
    }

    /// A unit with an already built tree and no source text.
    pub fn from_ast(ast: AstNode, resource_name: impl Into<String>) -> Self {
        let resource_name = resource_name.into();
        Self {
            ast: Some(ast),
            source: None,
            output: None,
            filename: None,
            resource_name: Some(resource_name.clone()),
            diagnostics: DiagnosticCollection::for_file(None, None, Some(resource_name)),
        }
    }
}

/// A scheduled visit of a unit at a pipeline step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct QueueEntry {
    step: usize,
    priority: i32,
    sequence: u64,
    handle: FileHandle,
}

#[derive(Debug, Default)]
pub struct CompilationDatabase {
    units: HashMap<FileHandle, CompilationUnit>,
    index: HashMap<String, FileHandle>,
    order: Vec<FileHandle>,
    queue: BinaryHeap<Reverse<QueueEntry>>,
    sequence: u64,
    next_handle: usize,
    /// The unit the running pass is working on.
    pub current: Option<FileHandle>,
}

impl CompilationDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh handle and inserts `unit` under it.
    pub fn add(&mut self, unit: CompilationUnit) -> FileHandle {
        let handle = FileHandle(self.next_handle);
        self.next_handle += 1;
        self.insert(handle, unit);
        handle
    }

    /// Inserts or replaces the unit at `handle`, keeping the index consistent.
    pub fn insert(&mut self, handle: FileHandle, mut unit: CompilationUnit) {
        if let Some(previous) = self.units.remove(&handle) {
            self.unindex(handle, &previous);
        } else {
            self.order.push(handle);
        }
        self.next_handle = self.next_handle.max(handle.0 + 1);
        unit.diagnostics.file = Some(handle);
        for key in unit.filename.iter().chain(unit.resource_name.iter()) {
            self.index.insert(key.clone(), handle);
        }
        self.units.insert(handle, unit);
    }

    pub fn remove(&mut self, handle: FileHandle) -> Option<CompilationUnit> {
        let unit = self.units.remove(&handle)?;
        self.unindex(handle, &unit);
        self.order.retain(|&h| h != handle);
        if self.current == Some(handle) {
            self.current = None;
        }
        Some(unit)
    }

    fn unindex(&mut self, handle: FileHandle, unit: &CompilationUnit) {
        for key in unit.filename.iter().chain(unit.resource_name.iter()) {
            if self.index.get(key) == Some(&handle) {
                self.index.remove(key);
            }
        }
    }

    pub fn get(&self, handle: FileHandle) -> Option<&CompilationUnit> {
        self.units.get(&handle)
    }

    pub fn get_mut(&mut self, handle: FileHandle) -> Option<&mut CompilationUnit> {
        self.units.get_mut(&handle)
    }

    /// Finds a unit by filename or resource name.
    pub fn lookup(&self, name: &str) -> Option<FileHandle> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, handle: FileHandle) -> bool {
        self.units.contains_key(&handle)
    }

    /// Handles in insertion order.
    pub fn handles(&self) -> impl Iterator<Item = FileHandle> + '_ {
        self.order.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// The unit the running pass is working on.
    pub fn current_unit(&self) -> Option<&CompilationUnit> {
        self.current.and_then(|handle| self.get(handle))
    }

    // === Scheduling ===

    /// Schedules `handle` to (re-)enter the pipeline at `step`.
    ///
    /// Units pop by step, then priority, then insertion order.
    pub fn enqueue(&mut self, handle: FileHandle, step: usize, priority: i32) {
        tracing::trace!(%handle, step, priority, "enqueue");
        self.queue.push(Reverse(QueueEntry {
            step,
            priority,
            sequence: self.sequence,
            handle,
        }));
        self.sequence += 1;
    }

    /// Step of the next scheduled unit.
    pub fn next_step(&self) -> Option<usize> {
        self.queue.peek().map(|Reverse(entry)| entry.step)
    }

    /// Pops the next scheduled unit if it belongs to `step`.
    pub fn pop_step(&mut self, step: usize) -> Option<FileHandle> {
        match self.queue.peek() {
            Some(Reverse(entry)) if entry.step == step => {
                self.queue.pop().map(|Reverse(entry)| entry.handle)
            }
            _ => None,
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}
