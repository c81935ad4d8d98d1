// File: ./src/model/mod.rs
pub mod item;
pub mod matcher;
pub mod validator;

pub use item::{Task, TaskInput};
pub use matcher::{CompileError, CompiledMatcher, MatchSpan};
pub use validator::{
    Field, FieldValidationError, FieldValidationResult, FormField, FormValidationResult,
    ImportStructureError, ImportValidation,
};
