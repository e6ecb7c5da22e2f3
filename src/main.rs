use csvgen::form::Action;
use csvgen::view;
use csvgen::{
    Config, Controller, DirectorySaver, ExportKind, HttpApi, RowField, SaveBytes, StdoutSaver,
};
use std::env;
use std::fmt;
use std::io::{self, Write};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, PartialEq)]
enum Command {
    Help,
    Quit,
    Show,
    Add,
    Set {
        index: usize,
        field: RowField,
        value: String,
    },
    Delete(usize),
    Ticker(String),
    Export(ExportKind),
    Query,
}

/// Row numbers on screen start at 1.
fn parse_row(arg: Option<&str>) -> Result<usize, String> {
    arg.and_then(|a| a.parse::<usize>().ok())
        .and_then(|n| n.checked_sub(1))
        .ok_or_else(|| "invalid row".to_string())
}

fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim_start();

    match word {
        "help" => Ok(Command::Help),
        "q" | "quit" => Ok(Command::Quit),
        "show" => Ok(Command::Show),
        "add" => Ok(Command::Add),
        "del" => Ok(Command::Delete(parse_row(rest.split_whitespace().next())?)),
        "set" => {
            let mut parts = rest.splitn(3, char::is_whitespace);
            let index = parse_row(parts.next())?;
            let field = parts
                .next()
                .ok_or("missing field")?
                .parse::<RowField>()
                .map_err(|e| e.to_string())?;
            let value = parts.next().unwrap_or("").to_string();
            Ok(Command::Set {
                index,
                field,
                value,
            })
        }
        "ticker" => Ok(Command::Ticker(rest.to_string())),
        "csv" => Ok(Command::Export(ExportKind::Generic)),
        "dte" => Ok(Command::Query),
        "dte-csv" => Ok(Command::Export(ExportKind::DebtToEquity)),
        "cf-csv" => Ok(Command::Export(ExportKind::CashFlow)),
        "" => Err("invalid command".to_string()),
        _ => Err(format!("unknown command: {word}")),
    }
}

const HELP: &str = "\
Commands:
  show                      Show the table and results
  add                       Add a blank row
  set <row> <field> <value> Edit a cell (field: name, email, age)
  del <row>                 Delete a row
  ticker <symbol>           Set the ticker
  csv                       Generate CSV from the table
  dte                       Fetch debt-to-equity ratios for the ticker
  dte-csv                   Download debt-to-equity CSV for the ticker
  cf-csv                    Download cash flow CSV for the ticker
  q                         Quit";

/// Where help, tables, messages and the prompt are written. When downloads
/// stream to stdout, everything else goes to stderr so stdout carries only
/// CSV bytes.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Console {
    Stdout,
    Stderr,
}

impl Console {
    fn for_download_dir(dir: &Path) -> Self {
        if dir == Path::new("-") {
            Console::Stderr
        } else {
            Console::Stdout
        }
    }

    fn writer(self) -> Box<dyn Write> {
        match self {
            Console::Stdout => Box::new(io::stdout()),
            Console::Stderr => Box::new(io::stderr()),
        }
    }

    fn say(self, text: impl fmt::Display) {
        if let Err(e) = writeln!(self.writer(), "{text}") {
            log::error!("failed to write to terminal: {e}");
        }
    }

    fn prompt(self, status: &str) -> io::Result<()> {
        let mut out = self.writer();
        write!(out, "({status}) > ")?;
        out.flush()
    }
}

type App = Controller<HttpApi, Box<dyn SaveBytes + Send + Sync>>;

/// Run one command. Returns the status shown in the prompt.
async fn execute(controller: &App, console: Console, command: Command) -> String {
    let result = match command {
        Command::Help => {
            console.say(HELP);
            return "ok".to_string();
        }
        Command::Quit => return "bye".to_string(),
        Command::Show => Ok(()),
        Command::Add => {
            controller.add_row();
            Ok(())
        }
        Command::Set {
            index,
            field,
            value,
        } => controller.update_row(index, field, &value),
        Command::Delete(index) => controller.delete_row(index),
        Command::Ticker(input) => {
            controller.set_ticker(&input);
            Ok(())
        }
        Command::Export(kind) => {
            console.say(Action::Export(kind).loading_label());
            controller.submit_export(kind).await.map(|saved| match saved.path {
                Some(path) => console.say(format!("Saved {}", path.display())),
                None => console.say(format!("Saved {} ({} bytes)", saved.name, saved.len)),
            })
        }
        Command::Query => {
            console.say(Action::Query.loading_label());
            controller.submit_query().await.map(|_| ())
        }
    };

    console.say(view::render_form(&controller.snapshot()));
    match result {
        Ok(()) => "ok".to_string(),
        Err(e) => controller
            .snapshot()
            .error()
            .map(str::to_string)
            .unwrap_or_else(|| e.to_string()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Usage: csvgen [BASE_URL] [DOWNLOAD_DIR|-]
    let args: Vec<String> = env::args().collect();
    let mut config = Config::from_env();
    if let Some(url) = args.get(1) {
        config = config.with_base_url(url.as_str());
    }
    if let Some(dir) = args.get(2) {
        config = config.with_download_dir(dir.as_str());
    }

    let console = Console::for_download_dir(&config.download_dir);
    let saver: Box<dyn SaveBytes + Send + Sync> = match console {
        Console::Stderr => Box::new(StdoutSaver),
        Console::Stdout => Box::new(DirectorySaver::new(&config.download_dir)),
    };
    let controller = Controller::new(HttpApi::new(&config)?, saver);

    if !controller.backend_ready().await {
        log::warn!(
            "backend at {} is not reachable, actions will fail until it is up",
            config.base_url
        );
    }

    console.say(HELP);
    console.say(view::render_form(&controller.snapshot()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut status = String::from("ok");
    loop {
        console.prompt(&status)?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        status = match parse_command(&line) {
            Ok(Command::Quit) => break,
            Ok(command) => execute(&controller, console, command).await,
            Err(message) => message,
        };
    }

    Ok(())
}
