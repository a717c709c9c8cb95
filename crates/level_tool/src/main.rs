use std::env;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use level_tool::{run, CommandKind};

fn main() -> ExitCode {
    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::from(1)
        }
    }
}

fn run_cli() -> Result<(), String> {
    let args = env::args().skip(1).collect::<Vec<_>>();
    if args.is_empty() {
        return Err(usage_text());
    }
    if args[0] == "-h" || args[0] == "--help" {
        print_usage();
        return Ok(());
    }

    let command = args[0].as_str();
    let command_args = &args[1..];

    let kind = match command {
        "inspect" => match command_args {
            [level] => CommandKind::Inspect {
                level: PathBuf::from(level),
            },
            _ => return Err("inspect requires exactly one level path".to_string()),
        },
        "to-json" => match command_args {
            [level] => CommandKind::ToJson {
                level: PathBuf::from(level),
                output: None,
            },
            [level, output] => CommandKind::ToJson {
                level: PathBuf::from(level),
                output: Some(PathBuf::from(output)),
            },
            _ => {
                return Err("to-json requires a level path and an optional output path".to_string())
            }
        },
        "from-json" => match command_args {
            [input, output] => CommandKind::FromJson {
                input: PathBuf::from(input),
                output: PathBuf::from(output),
            },
            _ => {
                return Err(
                    "from-json requires an input json path and an output level path".to_string(),
                )
            }
        },
        other => return Err(format!("unknown subcommand '{other}'\n\n{}", usage_text())),
    };

    run(kind, &mut io::stdout()).map_err(|error| error.to_string())
}

fn print_usage() {
    println!("{}", usage_text());
}

fn usage_text() -> String {
    [
        "level_tool - inspect and convert platformer level files",
        "",
        "Usage:",
        "  level_tool inspect <level>",
        "  level_tool to-json <level> [out.json]",
        "  level_tool from-json <in.json> <out-level>",
    ]
    .join("\n")
}
