//! Open a file with the handler its extension selects

use colored::Colorize;
use storage_core::{ContentError, ContentKind, ContentResult, extension_of, join_path, split_path};

use crate::context::Context;
use crate::error::{CliError, Result};

/// Run the open command
pub async fn run_open(ctx: &Context, id: &str, path: &str) -> Result<()> {
    let segments = split_path(path);
    let Some(name) = segments.last() else {
        return Err(CliError::user("Choose a file to open, not the storage root."));
    };
    let kind = ContentKind::for_extension(extension_of(name));

    let storages = ctx.load()?;
    let storage = ctx.open(&storages, id).await?;
    let text = storage.read_text(&segments).await?;
    let shown = join_path(&segments);

    println!(
        "{} {} as {}",
        "Opening".green().bold(),
        shown,
        kind.label().cyan()
    );
    println!();
    println!("{}", render(kind, &shown, &text)?);

    if kind.supports_synthesis() {
        println!();
        println!(
            "{} synthesis and place-and-route can be run on this file.",
            "hint:".yellow().bold()
        );
    }
    Ok(())
}

/// Body shown for `text` under the handler for `kind`.
fn render(kind: ContentKind, path: &str, text: &str) -> ContentResult<String> {
    match kind {
        ContentKind::Circuit => {
            let netlist: serde_json::Value =
                serde_json::from_str(text).map_err(|source| ContentError::Parse {
                    path: path.to_string(),
                    source,
                })?;
            serde_json::to_string_pretty(&netlist).map_err(|source| ContentError::Serialize {
                path: path.to_string(),
                source,
            })
        }
        ContentKind::Graph | ContentKind::Verilog | ContentKind::Text => {
            Ok(text.trim_end_matches('\n').to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circuits_are_pretty_printed() {
        let body = render(ContentKind::Circuit, "alu.json", r#"{"cells":[]}"#).unwrap();
        assert_eq!(body, "{\n  \"cells\": []\n}");
    }

    #[test]
    fn malformed_circuit_is_a_parse_error() {
        let err = render(ContentKind::Circuit, "alu.json", "{cells").unwrap_err();
        assert!(err.is_parse());
        assert!(err.to_string().contains("alu.json"));
    }

    #[test]
    fn text_is_shown_verbatim() {
        let body = render(ContentKind::Verilog, "top.v", "module top; endmodule\n").unwrap();
        assert_eq!(body, "module top; endmodule");
    }
}
