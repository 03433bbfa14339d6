pub use crate::database::{CompilationDatabase, CompilationUnit, FileHandle, SourceFile};
pub use crate::diagnostics::{Diagnostic, DiagnosticCollection, DiagnosticError, Level};
pub use crate::engine::{BuildReport, Mecha, PassContext};

pub mod ast;
pub mod cli;
pub mod config;
pub mod database;
pub mod diagnostics;
pub mod dispatch;
pub mod engine;
pub mod grammar;
pub mod rules;
pub mod serialize;
pub mod syntax;
