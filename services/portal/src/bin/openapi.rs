//! services/portal/src/bin/openapi.rs
//!
//! Dumps the portal's OpenAPI document. With no argument, or `-`, the JSON
//! goes to stdout; any other argument is taken as the output file.

use portal_lib::{error::PortalError, web::rest::ApiDoc};
use std::io::Write;
use std::path::PathBuf;
use utoipa::OpenApi;

#[derive(Debug, PartialEq)]
enum Output {
    Stdout,
    File(PathBuf),
}

fn output_from_args(mut args: impl Iterator<Item = String>) -> Output {
    match args.next() {
        None => Output::Stdout,
        Some(arg) if arg == "-" => Output::Stdout,
        Some(path) => Output::File(PathBuf::from(path)),
    }
}

/// The API document stamped with this build's version.
fn render_document() -> Result<String, PortalError> {
    let mut doc = ApiDoc::openapi();
    doc.info.title = "Campus360 Portal".to_string();
    doc.info.version = env!("CARGO_PKG_VERSION").to_string();
    doc.to_pretty_json()
        .map_err(|e| PortalError::Internal(format!("Failed to serialize the API document: {e}")))
}

fn main() -> Result<(), PortalError> {
    let json = render_document()?;
    match output_from_args(std::env::args().skip(1)) {
        Output::Stdout => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}")?;
        }
        Output::File(path) => {
            std::fs::write(&path, json)?;
            eprintln!("API document written to {}", path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn dash_and_nothing_mean_stdout() {
        assert_eq!(output_from_args(args(&[])), Output::Stdout);
        assert_eq!(output_from_args(args(&["-"])), Output::Stdout);
        assert_eq!(
            output_from_args(args(&["docs/api.json"])),
            Output::File(PathBuf::from("docs/api.json"))
        );
    }

    #[test]
    fn document_lists_the_attendance_routes() {
        let json = render_document().unwrap();
        let doc: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(doc["info"]["version"], env!("CARGO_PKG_VERSION"));
        assert!(doc["paths"]["/attendance/scan"].is_object());
        assert!(doc["paths"]["/attendance/reports/export"].is_object());
    }
}
