#![deny(rust_2018_idioms)]

pub mod checks;
pub mod io;
pub mod report;
pub mod schema;
pub mod validate;

pub use checks::{Finding, Severity, run_checks};
pub use io::{DocumentFormat, OutputDestination, load_document, parse_document_str, write_payload};
pub use report::{Report, ReportFormat};
pub use schema::{compile_schema, load_schema_file, looks_like_json_schema};
pub use validate::{SchemaViolation, validate_document};

pub mod prelude {
    pub use super::{
        DocumentFormat, Finding, Report, ReportFormat, SchemaViolation, Severity, run_checks,
        validate_document,
    };
}
